#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use weather_history_service::db::{MemoryStore, WeatherStores};
use weather_history_service::reporter::{IngestReporter, IngestSummary, MissingField};
use weather_history_service::services::IngestService;

/// Events captured by `RecordingReporter`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    RunStarted(PathBuf),
    SubdirectorySkipped(PathBuf),
    MissingFields(String, NaiveDate, Vec<MissingField>),
    DuplicateDiscarded(String, NaiveDate, usize),
    FileIngested(String, u64, Vec<i32>),
    RunCompleted(IngestSummary),
}

/// Reporter that keeps every event for later assertions
#[derive(Debug, Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<Event>>,
}

impl RecordingReporter {
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    fn push(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

impl IngestReporter for RecordingReporter {
    fn run_started(&self, path: &Path) {
        self.push(Event::RunStarted(path.to_path_buf()));
    }

    fn subdirectory_skipped(&self, path: &Path) {
        self.push(Event::SubdirectorySkipped(path.to_path_buf()));
    }

    fn missing_fields(&self, station_code: &str, date: NaiveDate, fields: &[MissingField]) {
        self.push(Event::MissingFields(
            station_code.to_string(),
            date,
            fields.to_vec(),
        ));
    }

    fn duplicate_date_discarded(&self, station_code: &str, date: NaiveDate, line: usize) {
        self.push(Event::DuplicateDiscarded(station_code.to_string(), date, line));
    }

    fn file_ingested(&self, _path: &Path, station_code: &str, records_written: u64, years: &[i32]) {
        self.push(Event::FileIngested(
            station_code.to_string(),
            records_written,
            years.to_vec(),
        ));
    }

    fn run_completed(&self, _path: &Path, summary: &IngestSummary) {
        self.push(Event::RunCompleted(*summary));
    }
}

pub fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Ingest service over a fresh in-memory store
pub struct TestHarness {
    pub store: Arc<MemoryStore>,
    pub stores: WeatherStores,
    pub reporter: Arc<RecordingReporter>,
    pub service: IngestService,
}

impl TestHarness {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let stores = WeatherStores::in_memory(store.clone());
        let reporter = Arc::new(RecordingReporter::default());
        let service = IngestService::new(&stores, reporter.clone());
        Self {
            store,
            stores,
            reporter,
            service,
        }
    }
}
