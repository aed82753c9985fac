pub mod day_record_repository;
pub mod error;
pub mod memory_store;
pub mod models;
pub mod pool;
pub mod station_repository;
pub mod store;
pub mod year_stats_repository;

pub use day_record_repository::DayRecordRepository;
pub use error::DbError;
pub use memory_store::MemoryStore;
pub use models::*;
pub use pool::connect_and_migrate;
pub use station_repository::StationRepository;
pub use store::{DayRecordStore, StationStore, WeatherStores, YearStatsStore};
pub use year_stats_repository::YearStatsRepository;
