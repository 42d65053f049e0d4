//! Meter readings and the CSV parser that produces them.
//!
//! # CSV format
//!
//! - **Delimiter:** comma
//! - **Header row:** required, must name `timestamp` and `kwh` (any case, any order)
//! - **Timestamp:** local wall-clock time, `YYYY-MM-DD HH:MM[:SS]` or with a `T` separator
//! - **Energy:** decimal kWh consumed during the hour starting at the timestamp
//!
//! Rows that cannot be read are skipped and reported in [`ParsedReadings::skipped`].

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use csv::{ReaderBuilder, StringRecord, Trim};
use serde::Serialize;
use thiserror::Error;

use crate::prelude::*;

const TIMESTAMP_COLUMN: &str = "timestamp";
const KWH_COLUMN: &str = "kwh";

const TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

/// Energy consumed during one hour.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Reading {
    pub timestamp: NaiveDateTime,
    pub kwh: f64,
}

impl Reading {
    #[must_use]
    pub const fn new(timestamp: NaiveDateTime, kwh: f64) -> Self {
        Self { timestamp, kwh }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("missing required column(s): {}", .0.join(", "))]
    MissingColumns(Vec<&'static str>),
}

/// Why a data row was dropped.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SkipReason {
    #[error("too few columns")]
    TooFewColumns,

    #[error("invalid timestamp `{0}`")]
    InvalidTimestamp(String),

    #[error("invalid energy value `{0}`")]
    InvalidEnergy(String),

    #[error("malformed row: {0}")]
    Malformed(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SkippedRow {
    /// 1-based line number in the input text, leading blank lines included.
    pub line: u64,
    pub reason: SkipReason,
}

#[derive(Debug, Error)]
#[error("{count} row(s) could not be parsed, the first one at line {first_line}: {first_reason}")]
pub struct StrictError {
    pub count: usize,
    pub first_line: u64,
    pub first_reason: SkipReason,
}

/// Parser output: accepted readings in file order, plus every dropped row.
#[derive(Debug, Default)]
pub struct ParsedReadings {
    pub readings: Vec<Reading>,
    pub skipped: Vec<SkippedRow>,
}

impl ParsedReadings {
    pub fn skipped_lines(&self) -> impl Iterator<Item = u64> + '_ {
        self.skipped.iter().map(|row| row.line)
    }

    /// Treat any skipped row as fatal.
    pub fn into_strict(self) -> Result<Vec<Reading>, StrictError> {
        match self.skipped.first() {
            None => Ok(self.readings),
            Some(first) => Err(StrictError {
                count: self.skipped.len(),
                first_line: first.line,
                first_reason: first.reason.clone(),
            }),
        }
    }
}

/// Parse the CSV text into readings.
///
/// Fails only when the header lacks a required column. Individual bad rows are skipped.
pub fn parse(text: &str) -> Result<ParsedReadings, SchemaError> {
    let text = text.trim_start_matches('\u{feff}');
    let body = text.trim_start();
    let leading_lines = text[..text.len() - body.len()].matches('\n').count() as u64;

    // Quotes are ordinary characters: a field always ends at the next comma or line break.
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .quoting(false)
        .trim(Trim::All)
        .from_reader(body.trim_end().as_bytes());

    let headers = reader.headers().cloned().unwrap_or_default();
    let timestamp_index = column_index(&headers, TIMESTAMP_COLUMN);
    let kwh_index = column_index(&headers, KWH_COLUMN);
    let (timestamp_index, kwh_index) = match (timestamp_index, kwh_index) {
        (Some(timestamp_index), Some(kwh_index)) => (timestamp_index, kwh_index),
        _ => {
            let missing = [(TIMESTAMP_COLUMN, timestamp_index), (KWH_COLUMN, kwh_index)]
                .into_iter()
                .filter(|(_, index)| index.is_none())
                .map(|(name, _)| name)
                .collect();
            return Err(SchemaError::MissingColumns(missing));
        }
    };

    let mut parsed = ParsedReadings::default();
    for result in reader.records() {
        let (line, outcome) = match result {
            Ok(record) => (
                record.position().map_or(0, csv::Position::line),
                parse_record(&record, timestamp_index, kwh_index),
            ),
            Err(error) => (
                error.position().map_or(0, csv::Position::line),
                Err(SkipReason::Malformed(error.to_string())),
            ),
        };
        let line = line + leading_lines;
        match outcome {
            Ok(reading) => parsed.readings.push(reading),
            Err(reason) => {
                debug!(line, %reason, "skipping row");
                parsed.skipped.push(SkippedRow { line, reason });
            }
        }
    }

    info!(n_readings = parsed.readings.len(), n_skipped = parsed.skipped.len(), "parsed readings");
    Ok(parsed)
}

fn column_index(headers: &StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|header| header.trim().eq_ignore_ascii_case(name))
}

fn parse_record(
    record: &StringRecord,
    timestamp_index: usize,
    kwh_index: usize,
) -> Result<Reading, SkipReason> {
    if record.len() < 2 {
        return Err(SkipReason::TooFewColumns);
    }
    let (Some(timestamp), Some(kwh)) = (record.get(timestamp_index), record.get(kwh_index)) else {
        return Err(SkipReason::TooFewColumns);
    };
    let timestamp = parse_timestamp(timestamp)
        .ok_or_else(|| SkipReason::InvalidTimestamp(timestamp.to_string()))?;
    let kwh = kwh
        .parse::<f64>()
        .ok()
        .filter(|kwh| kwh.is_finite() && *kwh >= 0.0)
        .ok_or_else(|| SkipReason::InvalidEnergy(kwh.to_string()))?;
    Ok(Reading::new(timestamp, kwh))
}

/// Parse a local date-time.
///
/// A space and a `T` are both accepted between date and time. A bare date means
/// midnight. An explicit UTC offset is dropped and the wall-clock time kept as written.
#[must_use]
pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    let normalized = text.replacen(' ', "T", 1);
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(&normalized, format).ok())
        .or_else(|| DateTime::parse_from_rfc3339(&normalized).ok().map(|dt| dt.naive_local()))
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .map(|date| date.and_time(NaiveTime::MIN))
        })
}

/// Inclusive range of calendar days.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Days from the earliest to the latest reading.
    #[must_use]
    pub fn spanning(readings: &[Reading]) -> Option<Self> {
        let start = readings.iter().map(|reading| reading.timestamp.date()).min()?;
        let end = readings.iter().map(|reading| reading.timestamp.date()).max()?;
        Some(Self { start, end })
    }

    #[must_use]
    pub fn contains(&self, timestamp: NaiveDateTime) -> bool {
        (self.start..=self.end).contains(&timestamp.date())
    }

    #[must_use]
    pub fn filter(&self, readings: &[Reading]) -> Vec<Reading> {
        readings.iter().filter(|reading| self.contains(reading.timestamp)).copied().collect()
    }
}
