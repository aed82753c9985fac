use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize, Serializer};
use utoipa::{IntoParams, ToSchema};

use crate::db::{
    DayRecordFilter, DayRecordStore, DbError, PageRequest, WeatherDayRow, WeatherStatsRow,
    YearStatsFilter, YearStatsStore,
};

pub const DEFAULT_LIMIT: i64 = 100;
pub const MAX_LIMIT: i64 = 1000;

// Query types (used by API)
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct WeatherQuery {
    /// Only records for this station code
    #[serde(rename = "station__code")]
    pub station_code: Option<String>,
    /// Only records for this date (YYYY-MM-DD)
    pub date: Option<NaiveDate>,
    /// Page size, 1 to 1000 (default 100)
    pub limit: Option<i64>,
    /// Rows to skip (default 0)
    pub offset: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StatsQuery {
    /// Only stats for this station code
    #[serde(rename = "station__code")]
    pub station_code: Option<String>,
    /// Only stats for this calendar year
    pub year: Option<i32>,
    /// Page size, 1 to 1000 (default 100)
    pub limit: Option<i64>,
    /// Rows to skip (default 0)
    pub offset: Option<i64>,
}

/// Clamp raw limit/offset parameters into a valid window
pub fn page_request(limit: Option<i64>, offset: Option<i64>) -> PageRequest {
    PageRequest {
        limit: limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT),
        offset: offset.unwrap_or(0).max(0),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct StationRef {
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct WeatherDayResponse {
    pub station: StationRef,
    pub date: NaiveDate,
    /// Tenths of a degree Celsius
    pub temperature_max: Option<i32>,
    /// Tenths of a degree Celsius
    pub temperature_min: Option<i32>,
    /// Tenths of a millimeter
    pub precipitation: Option<i32>,
}

impl From<WeatherDayRow> for WeatherDayResponse {
    fn from(row: WeatherDayRow) -> Self {
        Self {
            station: StationRef {
                code: row.station_code,
            },
            date: row.date,
            temperature_max: row.temperature_max,
            temperature_min: row.temperature_min,
            precipitation: row.precipitation,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct WeatherStatsResponse {
    pub station: StationRef,
    pub year: i32,
    /// Degrees Celsius
    #[serde(serialize_with = "fixed_two_places")]
    #[schema(value_type = Option<String>, example = "15.55")]
    pub avg_temperature_max: Option<Decimal>,
    /// Degrees Celsius
    #[serde(serialize_with = "fixed_two_places")]
    #[schema(value_type = Option<String>, example = "-4.40")]
    pub avg_temperature_min: Option<Decimal>,
    /// Centimeters
    #[serde(serialize_with = "fixed_two_places")]
    #[schema(value_type = Option<String>, example = "0.53")]
    pub total_precipitation: Option<Decimal>,
}

impl From<WeatherStatsRow> for WeatherStatsResponse {
    fn from(row: WeatherStatsRow) -> Self {
        Self {
            station: StationRef {
                code: row.station_code,
            },
            year: row.year,
            avg_temperature_max: row.avg_temperature_max,
            avg_temperature_min: row.avg_temperature_min,
            total_precipitation: row.total_precipitation,
        }
    }
}

fn fixed_two_places<S: Serializer>(value: &Option<Decimal>, serializer: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(v) => serializer.serialize_str(&format!("{:.2}", v)),
        None => serializer.serialize_none(),
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct WeatherDayPage {
    /// Total rows matching the filters
    pub count: i64,
    pub results: Vec<WeatherDayResponse>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct WeatherStatsPage {
    /// Total rows matching the filters
    pub count: i64,
    pub results: Vec<WeatherStatsResponse>,
}

/// Read-only listings behind the HTTP API
#[derive(Clone)]
pub struct QueryService {
    days: Arc<dyn DayRecordStore>,
    stats: Arc<dyn YearStatsStore>,
}

impl QueryService {
    pub fn new(days: Arc<dyn DayRecordStore>, stats: Arc<dyn YearStatsStore>) -> Self {
        Self { days, stats }
    }

    /// Daily records ordered by station code then date
    pub async fn list_weather(&self, query: &WeatherQuery) -> Result<WeatherDayPage, DbError> {
        let filter = DayRecordFilter {
            station_code: query.station_code.clone(),
            date: query.date,
        };
        let page = self
            .days
            .list(&filter, page_request(query.limit, query.offset))
            .await?;

        Ok(WeatherDayPage {
            count: page.count,
            results: page.results.into_iter().map(Into::into).collect(),
        })
    }

    /// Yearly stats ordered by station code then year
    pub async fn list_stats(&self, query: &StatsQuery) -> Result<WeatherStatsPage, DbError> {
        let filter = YearStatsFilter {
            station_code: query.station_code.clone(),
            year: query.year,
        };
        let page = self
            .stats
            .list(&filter, page_request(query.limit, query.offset))
            .await?;

        Ok(WeatherStatsPage {
            count: page.count,
            results: page.results.into_iter().map(Into::into).collect(),
        })
    }
}
