/// Conversion of raw token rows into typed day records
///
/// Expected row layout (no header row):
/// - Token 0: date as `YYYYMMDD`
/// - Token 1: maximum temperature, tenths of a degree Celsius
/// - Token 2: minimum temperature, tenths of a degree Celsius
/// - Token 3: precipitation, tenths of a millimeter (never negative)
///
/// Any of tokens 1-3 may be the missing marker. A row that does not fit this
/// layout aborts normalization of the whole file.
use std::collections::HashSet;
use std::io;
use std::sync::Arc;

use chrono::NaiveDate;
use thiserror::Error;

use crate::db::DayRecord;
use crate::importers::row_scanner::{RawRow, RawToken};
use crate::reporter::{IngestReporter, MissingField};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RowError {
    #[error("expected 4 tokens, found {0}")]
    WrongTokenCount(usize),

    #[error("date is marked missing")]
    MissingDate,

    #[error("invalid date: {0}")]
    InvalidDate(String),

    #[error("invalid {field} value: {token}")]
    InvalidNumber { field: &'static str, token: String },

    #[error("negative precipitation: {0}")]
    NegativePrecipitation(i32),
}

#[derive(Error, Debug)]
pub enum NormalizeError {
    #[error("malformed row at line {line}: {source}")]
    MalformedRow { line: usize, source: RowError },

    #[error("Failed to read row: {0}")]
    Io(#[from] io::Error),
}

/// Parse an 8-digit `YYYYMMDD` token
pub fn parse_date(token: &str) -> Result<NaiveDate, RowError> {
    if token.len() != 8 || !token.bytes().all(|b| b.is_ascii_digit()) {
        return Err(RowError::InvalidDate(token.to_string()));
    }
    NaiveDate::parse_from_str(token, "%Y%m%d").map_err(|_| RowError::InvalidDate(token.to_string()))
}

fn parse_measurement(token: &RawToken, field: MissingField) -> Result<Option<i32>, RowError> {
    match token {
        RawToken::Missing => Ok(None),
        RawToken::Value(value) => {
            value
                .parse::<i32>()
                .map(Some)
                .map_err(|_| RowError::InvalidNumber {
                    field: field.as_str(),
                    token: value.clone(),
                })
        }
    }
}

/// Parse a single row into a day record
pub fn parse_row(row: &RawRow) -> Result<DayRecord, RowError> {
    let [date, max, min, precipitation] = row.as_slice() else {
        return Err(RowError::WrongTokenCount(row.len()));
    };

    let date = match date {
        RawToken::Missing => return Err(RowError::MissingDate),
        RawToken::Value(token) => parse_date(token)?,
    };

    let precipitation = parse_measurement(precipitation, MissingField::Precipitation)?;
    if let Some(value) = precipitation.filter(|v| *v < 0) {
        return Err(RowError::NegativePrecipitation(value));
    }

    Ok(DayRecord {
        date,
        temperature_max: parse_measurement(max, MissingField::TemperatureMax)?,
        temperature_min: parse_measurement(min, MissingField::TemperatureMin)?,
        precipitation,
    })
}

/// Fields of a record that the source marked missing
pub fn missing_fields(record: &DayRecord) -> Vec<MissingField> {
    let mut missing = Vec::new();
    if record.temperature_max.is_none() {
        missing.push(MissingField::TemperatureMax);
    }
    if record.temperature_min.is_none() {
        missing.push(MissingField::TemperatureMin);
    }
    if record.precipitation.is_none() {
        missing.push(MissingField::Precipitation);
    }
    missing
}

/// Turns one file's rows into day records for a station
pub struct RecordNormalizer {
    station_code: String,
    reporter: Arc<dyn IngestReporter>,
}

impl RecordNormalizer {
    pub fn new(station_code: impl Into<String>, reporter: Arc<dyn IngestReporter>) -> Self {
        Self {
            station_code: station_code.into(),
            reporter,
        }
    }

    /// Normalize every row, keeping only the first record for each date.
    ///
    /// Records come back in file order. Records with missing fields are kept
    /// and reported. The first malformed row stops normalization.
    pub fn normalize<I>(&self, rows: I) -> Result<Vec<DayRecord>, NormalizeError>
    where
        I: IntoIterator<Item = io::Result<RawRow>>,
    {
        let mut seen_dates = HashSet::new();
        let mut records = Vec::new();

        for (index, row) in rows.into_iter().enumerate() {
            let line = index + 1;
            let row = row?;
            let record =
                parse_row(&row).map_err(|source| NormalizeError::MalformedRow { line, source })?;

            if !seen_dates.insert(record.date) {
                self.reporter
                    .duplicate_date_discarded(&self.station_code, record.date, line);
                continue;
            }

            let missing = missing_fields(&record);
            if !missing.is_empty() {
                self.reporter
                    .missing_fields(&self.station_code, record.date, &missing);
            }

            records.push(record);
        }

        Ok(records)
    }
}
