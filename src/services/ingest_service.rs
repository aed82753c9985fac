use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Datelike;
use tracing::{debug, instrument};

use crate::db::{DayRecord, DayRecordStore, DbError, StationStore, WeatherStores};
use crate::importers::record_normalizer::RowError;
use crate::importers::{
    station_code_for, FilesToIngest, NormalizeError, PathResolveError, RecordNormalizer,
    RowScanner,
};
use crate::reporter::{IngestReporter, IngestSummary};
use crate::services::stats_aggregator::StatsAggregator;

/// Error types for weather history ingestion
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("provided path does not exist: {}", .0.display())]
    PathNotFound(PathBuf),

    #[error("Cannot derive a station code from {}", .0.display())]
    InvalidFileName(PathBuf),

    #[error("Malformed row in {} at line {line}: {source}", .path.display())]
    MalformedRow {
        path: PathBuf,
        line: usize,
        source: RowError,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Database(#[from] DbError),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl From<PathResolveError> for IngestError {
    fn from(err: PathResolveError) -> Self {
        match err {
            PathResolveError::NotFound(path) => IngestError::PathNotFound(path),
            PathResolveError::ListDir { source, .. } => IngestError::Io(source),
        }
    }
}

impl IngestError {
    fn from_normalize(path: &Path, err: NormalizeError) -> Self {
        match err {
            NormalizeError::MalformedRow { line, source } => IngestError::MalformedRow {
                path: path.to_path_buf(),
                line,
                source,
            },
            NormalizeError::Io(e) => IngestError::Io(e),
        }
    }
}

/// Result of ingesting one station file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOutcome {
    pub station_code: String,
    pub records_written: u64,
    pub years: BTreeSet<i32>,
    pub stats_updated: usize,
}

/// Service that loads station files into the day record store and keeps
/// the yearly stats in step with it
#[derive(Clone)]
pub struct IngestService {
    stations: Arc<dyn StationStore>,
    days: Arc<dyn DayRecordStore>,
    aggregator: StatsAggregator,
    reporter: Arc<dyn IngestReporter>,
}

impl IngestService {
    pub fn new(stores: &WeatherStores, reporter: Arc<dyn IngestReporter>) -> Self {
        Self {
            stations: stores.stations.clone(),
            days: stores.days.clone(),
            aggregator: StatsAggregator::new(stores.days.clone(), stores.stats.clone()),
            reporter,
        }
    }

    /// Ingest a station file, or every file directly inside a directory.
    ///
    /// Files are processed one at a time in listing order. Any error stops
    /// the run before the next file; earlier files stay committed.
    #[instrument(skip(self))]
    pub async fn ingest(&self, path: &Path) -> Result<IngestSummary, IngestError> {
        let files = FilesToIngest::resolve(path, self.reporter.clone())?;
        self.reporter.run_started(path);

        let mut summary = IngestSummary::default();
        for file in files {
            let file = file?;
            let outcome = self.ingest_file(&file).await?;

            summary.files_processed += 1;
            summary.records_ingested += outcome.records_written;
            summary.stats_updated += outcome.stats_updated;
        }

        self.reporter.run_completed(path, &summary);
        Ok(summary)
    }

    /// Ingest one station file.
    ///
    /// The whole file is parsed before anything is written, so a malformed
    /// row leaves the store untouched for this file.
    #[instrument(skip(self))]
    pub async fn ingest_file(&self, file: &Path) -> Result<FileOutcome, IngestError> {
        let code =
            station_code_for(file).ok_or_else(|| IngestError::InvalidFileName(file.to_path_buf()))?;

        let records = self.read_records(file, &code).await?;
        debug!("Parsed {} day records from {}", records.len(), file.display());

        let station = self.stations.resolve(&code).await?;
        let records_written = self.days.upsert_all(&station, &records).await?;

        let years = years_touched(&records);
        let stats = self.aggregator.recompute(&station, &years).await?;

        let year_list: Vec<i32> = years.iter().copied().collect();
        self.reporter
            .file_ingested(file, &station.code, records_written, &year_list);

        Ok(FileOutcome {
            station_code: station.code,
            records_written,
            years,
            stats_updated: stats.len(),
        })
    }

    /// Scan and normalize a file on the blocking pool
    async fn read_records(&self, file: &Path, code: &str) -> Result<Vec<DayRecord>, IngestError> {
        let path = file.to_path_buf();
        let normalizer = RecordNormalizer::new(code, self.reporter.clone());

        tokio::task::spawn_blocking(move || {
            let rows = RowScanner::open(&path)?;
            normalizer
                .normalize(rows)
                .map_err(|e| IngestError::from_normalize(&path, e))
        })
        .await?
    }
}

/// Calendar years covered by a batch of records
pub fn years_touched(records: &[DayRecord]) -> BTreeSet<i32> {
    records.iter().map(|r| r.date.year()).collect()
}
