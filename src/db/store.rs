//! Storage seams used by the ingestion pipeline and the read API.
//!
//! The Postgres repositories in this module tree are the production
//! implementations; `MemoryStore` backs tests and dry runs.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;

use crate::db::{
    DayRecord, DayRecordFilter, DayRecordRepository, DbError, MemoryStore, PageRequest,
    Paginated, Station, StationRepository, WeatherDayRow, WeatherStatsRow, YearStats,
    YearStatsFilter, YearStatsRepository,
};

#[async_trait]
pub trait StationStore: Send + Sync {
    /// Get-or-create the station with this code. Safe to race.
    async fn resolve(&self, code: &str) -> Result<Station, DbError>;
}

#[async_trait]
pub trait DayRecordStore: Send + Sync {
    /// Insert or overwrite every record for `station` in one atomic batch.
    ///
    /// Records must already be unique by date. On a (station, date) conflict
    /// only the three measurement fields are replaced. Returns inserted +
    /// updated rows.
    async fn upsert_all(&self, station: &Station, records: &[DayRecord]) -> Result<u64, DbError>;

    /// All stored records for one station and calendar year, ordered by date
    async fn find_by_station_year(
        &self,
        station: &Station,
        year: i32,
    ) -> Result<Vec<DayRecord>, DbError>;

    async fn list(
        &self,
        filter: &DayRecordFilter,
        page: PageRequest,
    ) -> Result<Paginated<WeatherDayRow>, DbError>;
}

#[async_trait]
pub trait YearStatsStore: Send + Sync {
    /// Insert or overwrite yearly stats keyed by (station, year) in one batch
    async fn upsert_all(&self, stats: &[YearStats]) -> Result<u64, DbError>;

    async fn list(
        &self,
        filter: &YearStatsFilter,
        page: PageRequest,
    ) -> Result<Paginated<WeatherStatsRow>, DbError>;
}

/// Bundle of the three stores, cheap to clone
#[derive(Clone)]
pub struct WeatherStores {
    pub stations: Arc<dyn StationStore>,
    pub days: Arc<dyn DayRecordStore>,
    pub stats: Arc<dyn YearStatsStore>,
}

impl WeatherStores {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            stations: Arc::new(StationRepository::new(pool.clone())),
            days: Arc::new(DayRecordRepository::new(pool.clone())),
            stats: Arc::new(YearStatsRepository::new(pool)),
        }
    }

    pub fn in_memory(store: Arc<MemoryStore>) -> Self {
        Self {
            stations: store.clone(),
            days: store.clone(),
            stats: store,
        }
    }
}

