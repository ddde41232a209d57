//! CSV import of hourly utility usage exports.
//!
//! The utility's "hourly usage" download starts with two free-text
//! disclaimer lines before the real header, and malformed rows (blank
//! readings, "no data" markers) appear mid-file. Bad rows are dropped, never
//! zero-filled, so averages stay honest.

use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;

use crate::billing::types::HourlyReading;

/// Number of disclaimer lines before the CSV header.
const PREAMBLE_LINES: usize = 2;

/// Timestamp formats observed in exports, tried in order.
const TIMESTAMP_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%m/%d/%Y %H:%M"];

/// One raw CSV row. `kwh` stays a string so empty cells and "no data"
/// markers deserialize instead of aborting the whole file.
#[derive(Debug, Deserialize)]
struct UsageRow {
    #[serde(rename = "Hour")]
    hour: String,
    #[serde(rename = "kWh")]
    kwh: String,
    #[serde(rename = "Temp", default)]
    temp: Option<String>,
}

/// Parsed usage data plus how many rows were dropped along the way.
#[derive(Debug)]
pub struct UsageData {
    /// Readings in file order.
    pub readings: Vec<HourlyReading>,
    /// Rows dropped for unparseable timestamps or readings.
    pub skipped_rows: usize,
}

/// Why an import produced no usable data.
#[derive(Debug)]
pub enum ImportError {
    Io(io::Error),
    /// Every row was dropped, or the file held no data rows at all.
    NoReadings { skipped_rows: usize },
}

impl fmt::Display for ImportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "cannot read usage file: {e}"),
            Self::NoReadings { skipped_rows } => write!(
                f,
                "usage file contained no usable readings ({skipped_rows} rows skipped)"
            ),
        }
    }
}

impl From<io::Error> for ImportError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

/// Reads an hourly usage CSV file.
///
/// # Errors
///
/// Returns an [`ImportError`] if the file cannot be opened or no row
/// survives parsing. Individual bad rows are counted, not fatal.
pub fn read_usage_csv(path: &Path) -> Result<UsageData, ImportError> {
    let file = File::open(path)?;
    read_usage(BufReader::new(file))
}

/// Reads hourly usage CSV from any reader. Skips the disclaimer preamble,
/// then parses the header and data rows.
pub fn read_usage(reader: impl Read) -> Result<UsageData, ImportError> {
    let mut buf = BufReader::new(reader);
    let mut line = String::new();
    for _ in 0..PREAMBLE_LINES {
        line.clear();
        if buf.read_line(&mut line)? == 0 {
            return Err(ImportError::NoReadings { skipped_rows: 0 });
        }
    }

    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(buf);

    let mut readings = Vec::new();
    let mut skipped_rows = 0usize;
    for result in rdr.deserialize::<UsageRow>() {
        let Ok(row) = result else {
            skipped_rows += 1;
            continue;
        };
        match parse_row(&row) {
            Some(reading) => readings.push(reading),
            None => skipped_rows += 1,
        }
    }

    if readings.is_empty() {
        return Err(ImportError::NoReadings { skipped_rows });
    }
    Ok(UsageData {
        readings,
        skipped_rows,
    })
}

fn parse_row(row: &UsageRow) -> Option<HourlyReading> {
    let timestamp = parse_timestamp(row.hour.trim())?;
    let energy_kwh: f64 = row.kwh.trim().parse().ok()?;
    if !energy_kwh.is_finite() || energy_kwh < 0.0 {
        return None;
    }
    let temperature = row
        .temp
        .as_deref()
        .and_then(|t| t.trim().parse::<f64>().ok())
        .filter(|t| t.is_finite());
    let mut reading = HourlyReading::new(timestamp, energy_kwh);
    reading.temperature = temperature;
    Some(reading)
}

fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    for fmt in TIMESTAMP_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(ts);
        }
    }
    // A bare date means the top of that day's first hour.
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()?.and_hms_opt(0, 0, 0)
}
