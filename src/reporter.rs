//! Structured run events for one ingestion invocation.
//!
//! The ingestion pipeline never logs directly; it reports through an
//! `IngestReporter` handed to it by the caller. `TracingReporter` turns the
//! events into `tracing` events with structured fields.

use std::path::Path;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

/// A measurement column that was marked missing in the source file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MissingField {
    TemperatureMax,
    TemperatureMin,
    Precipitation,
}

impl MissingField {
    pub fn as_str(&self) -> &'static str {
        match self {
            MissingField::TemperatureMax => "temperature_max",
            MissingField::TemperatureMin => "temperature_min",
            MissingField::Precipitation => "precipitation",
        }
    }
}

/// Counters for one finished run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestSummary {
    pub files_processed: usize,
    /// Day records inserted or overwritten
    pub records_ingested: u64,
    /// Yearly stats rows recomputed
    pub stats_updated: usize,
}

pub trait IngestReporter: Send + Sync {
    fn run_started(&self, path: &Path);

    fn subdirectory_skipped(&self, path: &Path);

    fn missing_fields(&self, station_code: &str, date: NaiveDate, fields: &[MissingField]);

    fn duplicate_date_discarded(&self, station_code: &str, date: NaiveDate, line: usize);

    fn file_ingested(&self, path: &Path, station_code: &str, records_written: u64, years: &[i32]);

    fn run_completed(&self, path: &Path, summary: &IngestSummary);
}

/// Default reporter backed by the process `tracing` subscriber
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl IngestReporter for TracingReporter {
    fn run_started(&self, path: &Path) {
        info!(path = %path.display(), "Starting weather history ingestion");
    }

    fn subdirectory_skipped(&self, path: &Path) {
        warn!(path = %path.display(), "Skipping subdirectory");
    }

    fn missing_fields(&self, station_code: &str, date: NaiveDate, fields: &[MissingField]) {
        let fields: Vec<&str> = fields.iter().map(MissingField::as_str).collect();
        warn!(
            station = %station_code,
            date = %date,
            missing = ?fields,
            "Day record has missing data"
        );
    }

    fn duplicate_date_discarded(&self, station_code: &str, date: NaiveDate, line: usize) {
        debug!(
            station = %station_code,
            date = %date,
            line,
            "Discarding duplicate date, keeping first occurrence"
        );
    }

    fn file_ingested(&self, path: &Path, station_code: &str, records_written: u64, years: &[i32]) {
        info!(
            path = %path.display(),
            station = %station_code,
            records = records_written,
            years = ?years,
            "Ingested station file"
        );
    }

    fn run_completed(&self, path: &Path, summary: &IngestSummary) {
        info!(
            path = %path.display(),
            records_ingested = summary.records_ingested,
            files_processed = summary.files_processed,
            stats_updated = summary.stats_updated,
            "✓ Weather history ingestion complete"
        );
    }
}
