pub mod ingest_service;
pub mod query_service;
pub mod stats_aggregator;

pub use ingest_service::{FileOutcome, IngestError, IngestService};
pub use query_service::QueryService;
pub use stats_aggregator::StatsAggregator;
