use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;

// Database entity models
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Station {
    pub id: i64,
    pub code: String,
}

/// One day of measurements for a station.
///
/// The station is carried by the batch a record travels in (see
/// `DayRecordStore::upsert_all`), so the record only holds the key date and
/// the three measurements. `None` means the source marked the value missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRow)]
pub struct DayRecord {
    pub date: NaiveDate,
    /// Tenths of a degree Celsius
    pub temperature_max: Option<i32>,
    /// Tenths of a degree Celsius
    pub temperature_min: Option<i32>,
    /// Tenths of a millimeter
    pub precipitation: Option<i32>,
}

/// Yearly aggregates derived from a station's day records
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearStats {
    pub station_id: i64,
    pub year: i32,
    /// Degrees Celsius
    pub avg_temperature_max: Option<Decimal>,
    /// Degrees Celsius
    pub avg_temperature_min: Option<Decimal>,
    /// Centimeters
    pub total_precipitation: Option<Decimal>,
}

// Read-side rows joined with the station code
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct WeatherDayRow {
    pub station_code: String,
    pub date: NaiveDate,
    pub temperature_max: Option<i32>,
    pub temperature_min: Option<i32>,
    pub precipitation: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct WeatherStatsRow {
    pub station_code: String,
    pub year: i32,
    pub avg_temperature_max: Option<Decimal>,
    pub avg_temperature_min: Option<Decimal>,
    pub total_precipitation: Option<Decimal>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DayRecordFilter {
    pub station_code: Option<String>,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct YearStatsFilter {
    pub station_code: Option<String>,
    pub year: Option<i32>,
}

/// Limit/offset window over an ordered listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub limit: i64,
    pub offset: i64,
}

/// One page of a listing plus the total number of matching rows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paginated<T> {
    pub count: i64,
    pub results: Vec<T>,
}
