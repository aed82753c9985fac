use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use tokio::sync::Mutex;
use tracing::debug;

use crate::db::{
    DayRecord, DayRecordFilter, DayRecordStore, DbError, PageRequest, Paginated, Station,
    StationStore, WeatherDayRow, WeatherStatsRow, YearStats, YearStatsFilter, YearStatsStore,
};

/// Process-local implementation of all three stores.
///
/// Mirrors the Postgres constraints: unique station codes, one day record per
/// (station, date) and one stats row per (station, year). Used for dry runs
/// and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    stations: Vec<Station>,
    days: BTreeMap<(i64, NaiveDate), DayRecord>,
    stats: BTreeMap<(i64, i32), YearStats>,
}

impl MemoryState {
    fn station_code(&self, station_id: i64) -> &str {
        self.stations
            .iter()
            .find(|s| s.id == station_id)
            .map(|s| s.code.as_str())
            .unwrap_or_default()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn stations(&self) -> Vec<Station> {
        self.state.lock().await.stations.clone()
    }

    /// Every stored day record for a station code, ordered by date
    pub async fn day_records(&self, code: &str) -> Vec<DayRecord> {
        let state = self.state.lock().await;
        state
            .days
            .iter()
            .filter(|((station_id, _), _)| state.station_code(*station_id) == code)
            .map(|(_, record)| *record)
            .collect()
    }

    /// Every stored yearly stats row for a station code, ordered by year
    pub async fn year_stats(&self, code: &str) -> Vec<YearStats> {
        let state = self.state.lock().await;
        state
            .stats
            .iter()
            .filter(|((station_id, _), _)| state.station_code(*station_id) == code)
            .map(|(_, stats)| stats.clone())
            .collect()
    }
}

fn paginate<T>(mut rows: Vec<T>, page: PageRequest) -> Paginated<T> {
    let count = rows.len() as i64;
    let offset = page.offset.clamp(0, count) as usize;
    let limit = page.limit.max(0) as usize;
    let results = rows.drain(offset..).take(limit).collect();
    Paginated { count, results }
}

#[async_trait]
impl StationStore for MemoryStore {
    async fn resolve(&self, code: &str) -> Result<Station, DbError> {
        let mut state = self.state.lock().await;
        if let Some(existing) = state.stations.iter().find(|s| s.code == code) {
            return Ok(existing.clone());
        }

        let station = Station {
            id: state.stations.len() as i64 + 1,
            code: code.to_string(),
        };
        debug!("Created in-memory station {} ({})", station.code, station.id);
        state.stations.push(station.clone());
        Ok(station)
    }
}

#[async_trait]
impl DayRecordStore for MemoryStore {
    async fn upsert_all(&self, station: &Station, records: &[DayRecord]) -> Result<u64, DbError> {
        let mut state = self.state.lock().await;
        for record in records {
            state.days.insert((station.id, record.date), *record);
        }
        Ok(records.len() as u64)
    }

    async fn find_by_station_year(
        &self,
        station: &Station,
        year: i32,
    ) -> Result<Vec<DayRecord>, DbError> {
        let state = self.state.lock().await;
        Ok(state
            .days
            .iter()
            .filter(|((station_id, date), _)| *station_id == station.id && date.year() == year)
            .map(|(_, record)| *record)
            .collect())
    }

    async fn list(
        &self,
        filter: &DayRecordFilter,
        page: PageRequest,
    ) -> Result<Paginated<WeatherDayRow>, DbError> {
        let state = self.state.lock().await;
        let mut rows: Vec<WeatherDayRow> = state
            .days
            .iter()
            .map(|((station_id, _), record)| WeatherDayRow {
                station_code: state.station_code(*station_id).to_string(),
                date: record.date,
                temperature_max: record.temperature_max,
                temperature_min: record.temperature_min,
                precipitation: record.precipitation,
            })
            .filter(|row| {
                filter
                    .station_code
                    .as_ref()
                    .is_none_or(|code| &row.station_code == code)
                    && filter.date.is_none_or(|date| row.date == date)
            })
            .collect();
        rows.sort_by(|a, b| (&a.station_code, a.date).cmp(&(&b.station_code, b.date)));

        Ok(paginate(rows, page))
    }
}

#[async_trait]
impl YearStatsStore for MemoryStore {
    async fn upsert_all(&self, stats: &[YearStats]) -> Result<u64, DbError> {
        let mut state = self.state.lock().await;
        for entry in stats {
            state
                .stats
                .insert((entry.station_id, entry.year), entry.clone());
        }
        Ok(stats.len() as u64)
    }

    async fn list(
        &self,
        filter: &YearStatsFilter,
        page: PageRequest,
    ) -> Result<Paginated<WeatherStatsRow>, DbError> {
        let state = self.state.lock().await;
        let mut rows: Vec<WeatherStatsRow> = state
            .stats
            .values()
            .map(|stats| WeatherStatsRow {
                station_code: state.station_code(stats.station_id).to_string(),
                year: stats.year,
                avg_temperature_max: stats.avg_temperature_max,
                avg_temperature_min: stats.avg_temperature_min,
                total_precipitation: stats.total_precipitation,
            })
            .filter(|row| {
                filter
                    .station_code
                    .as_ref()
                    .is_none_or(|code| &row.station_code == code)
                    && filter.year.is_none_or(|year| row.year == year)
            })
            .collect();
        rows.sort_by(|a, b| (&a.station_code, a.year).cmp(&(&b.station_code, b.year)));

        Ok(paginate(rows, page))
    }
}
