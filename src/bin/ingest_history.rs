use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, info};

use weather_history_service::db::{connect_and_migrate, MemoryStore, WeatherStores};
use weather_history_service::reporter::{
    IngestReporter, IngestSummary, MissingField, TracingReporter,
};
use weather_history_service::services::{IngestError, IngestService};

#[derive(Parser)]
#[command(name = "ingest-history")]
#[command(about = "Ingest weather station history files into the database", long_about = None)]
struct Cli {
    /// Station file, or a directory whose files are ingested one by one
    path: PathBuf,

    /// Database connection string
    #[arg(long, env, required_unless_present = "dry_run")]
    database_url: Option<String>,

    /// Parse and aggregate into memory only, without touching the database
    #[arg(long)]
    dry_run: bool,

    /// Maximum database connections
    #[arg(long, env = "DB_MAX_CONNECTIONS", default_value = "5")]
    max_connections: u32,
}

/// Tracing reporter that also drives a terminal spinner
struct ProgressReporter {
    inner: TracingReporter,
    spinner: ProgressBar,
}

impl ProgressReporter {
    fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
        spinner.enable_steady_tick(Duration::from_millis(100));
        Ok(Self {
            inner: TracingReporter,
            spinner,
        })
    }
}

impl IngestReporter for ProgressReporter {
    fn run_started(&self, path: &Path) {
        self.spinner
            .set_message(format!("Ingesting {}...", path.display()));
        self.inner.run_started(path);
    }

    fn subdirectory_skipped(&self, path: &Path) {
        self.inner.subdirectory_skipped(path);
    }

    fn missing_fields(&self, station_code: &str, date: NaiveDate, fields: &[MissingField]) {
        self.inner.missing_fields(station_code, date, fields);
    }

    fn duplicate_date_discarded(&self, station_code: &str, date: NaiveDate, line: usize) {
        self.inner.duplicate_date_discarded(station_code, date, line);
    }

    fn file_ingested(&self, path: &Path, station_code: &str, records_written: u64, years: &[i32]) {
        self.spinner.set_message(format!(
            "✓ {station_code}: {records_written} records"
        ));
        self.inner
            .file_ingested(path, station_code, records_written, years);
    }

    fn run_completed(&self, path: &Path, summary: &IngestSummary) {
        self.spinner.finish_with_message(format!(
            "✓ Ingested {} records from {} files",
            summary.records_ingested, summary.files_processed
        ));
        self.inner.run_completed(path, summary);
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if it exists (ignore errors if not found)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    // Fail on a bad path before touching the database
    if !cli.path.exists() {
        let e = IngestError::PathNotFound(cli.path.clone());
        error!("Ingestion of {} failed: {}", cli.path.display(), e);
        return Err(e.into());
    }

    let memory = Arc::new(MemoryStore::new());
    let stores = match (&cli.database_url, cli.dry_run) {
        (Some(url), false) => {
            WeatherStores::postgres(connect_and_migrate(url, cli.max_connections).await?)
        }
        _ => {
            info!("Dry run: records are kept in memory only");
            WeatherStores::in_memory(memory.clone())
        }
    };

    let reporter = Arc::new(ProgressReporter::new()?);
    let service = IngestService::new(&stores, reporter.clone());

    let start = Instant::now();
    match service.ingest(&cli.path).await {
        Ok(summary) => {
            info!(
                "Ingestion finished in {:.2}s: {} files, {} records, {} yearly stats",
                start.elapsed().as_secs_f64(),
                summary.files_processed,
                summary.records_ingested,
                summary.stats_updated
            );
            if cli.dry_run {
                for station in memory.stations().await {
                    let days = memory.day_records(&station.code).await.len();
                    let years = memory.year_stats(&station.code).await.len();
                    println!("{}: {} day records, {} yearly stats", station.code, days, years);
                }
            }
            Ok(())
        }
        Err(e) => {
            reporter.spinner.abandon_with_message("✗ Ingestion failed");
            error!("Ingestion of {} failed: {}", cli.path.display(), e);
            Err(e.into())
        }
    }
}
