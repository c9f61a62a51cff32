//! CSV candle file adapter.
//!
//! Expects a header row followed by `date,open,high,low,close,volume`
//! records, dates as `YYYY-MM-DD`.

use crate::domain::candle::Candle;
use crate::domain::error::EngineError;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

pub struct CsvAdapter {
    path: PathBuf,
}

impl CsvAdapter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

fn data_error(reason: impl Into<String>) -> EngineError {
    EngineError::Data {
        reason: reason.into(),
    }
}

fn field<'r>(
    record: &'r csv::StringRecord,
    index: usize,
    name: &str,
    line: u64,
) -> Result<&'r str, EngineError> {
    record
        .get(index)
        .map(str::trim)
        .ok_or_else(|| data_error(format!("line {}: missing {} column", line, name)))
}

fn parse_field<T: FromStr>(raw: &str, name: &str, line: u64) -> Result<T, EngineError>
where
    T::Err: std::fmt::Display,
{
    raw.parse().map_err(|e| {
        data_error(format!(
            "line {}: invalid {} value '{}': {}",
            line, name, raw, e
        ))
    })
}

fn parse_price(
    record: &csv::StringRecord,
    index: usize,
    name: &str,
    line: u64,
) -> Result<f64, EngineError> {
    let value: f64 = parse_field(field(record, index, name, line)?, name, line)?;
    if !value.is_finite() {
        return Err(data_error(format!("line {}: {} must be finite", line, name)));
    }
    Ok(value)
}

/// Volumes exported as `1234.0` are accepted when integral.
fn parse_volume(record: &csv::StringRecord, line: u64) -> Result<u64, EngineError> {
    let raw = field(record, 5, "volume", line)?;
    if let Ok(volume) = raw.parse::<u64>() {
        return Ok(volume);
    }
    let value: f64 = parse_field(raw, "volume", line)?;
    if value.is_finite() && value >= 0.0 && value.fract() == 0.0 {
        Ok(value as u64)
    } else {
        Err(data_error(format!(
            "line {}: volume must be a non-negative integer, found '{}'",
            line, raw
        )))
    }
}

fn parse_record(record: &csv::StringRecord) -> Result<Candle, EngineError> {
    let line = record.position().map(|p| p.line()).unwrap_or(0);

    let date_str = field(record, 0, "date", line)?;
    let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|e| {
        data_error(format!("line {}: invalid date '{}': {}", line, date_str, e))
    })?;

    Ok(Candle {
        date,
        open: parse_price(record, 1, "open", line)?,
        high: parse_price(record, 2, "high", line)?,
        low: parse_price(record, 3, "low", line)?,
        close: parse_price(record, 4, "close", line)?,
        volume: parse_volume(record, line)?,
    })
}

impl DataPort for CsvAdapter {
    fn load_candles(&self) -> Result<Vec<Candle>, EngineError> {
        let content = fs::read_to_string(&self.path)
            .map_err(|e| data_error(format!("failed to read {}: {}", self.path.display(), e)))?;

        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());

        let mut candles = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| data_error(format!("CSV parse error: {}", e)))?;
            candles.push(parse_record(&record)?);
        }

        candles.sort_by_key(|c| c.date);
        tracing::debug!(path = %self.path.display(), candles = candles.len(), "loaded candles");
        Ok(candles)
    }
}
