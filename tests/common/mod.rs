#![allow(dead_code)]

use chrono::{Duration, NaiveDate};
pub use quantsim::domain::candle::Candle;
use quantsim::domain::error::EngineError;
use quantsim::domain::execution::ExecutionParams;
use quantsim::ports::data_port::DataPort;
use std::io::Write;

pub fn base_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

pub fn date(day: i64) -> NaiveDate {
    base_date() + Duration::days(day)
}

pub fn make_candle(day: i64, open: f64, high: f64, low: f64, close: f64) -> Candle {
    Candle {
        date: date(day),
        open,
        high,
        low,
        close,
        volume: 1_000,
    }
}

/// Bar whose open, high, low and close are all `price`.
pub fn flat_candle(day: i64, price: f64) -> Candle {
    make_candle(day, price, price, price, price)
}

/// One bar per close, each with a 1-unit range around open = close.
pub fn series_from_closes(closes: &[f64]) -> Vec<Candle> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| make_candle(i as i64, c, c + 1.0, c - 1.0, c))
        .collect()
}

pub fn constant_series(len: usize, price: f64) -> Vec<Candle> {
    (0..len).map(|i| flat_candle(i as i64, price)).collect()
}

/// No commission or slippage, full allocation.
pub fn frictionless_params() -> ExecutionParams {
    ExecutionParams {
        initial_capital: 10_000.0,
        commission_pct: 0.0,
        slippage_bps: 0.0,
        max_position_pct: 100.0,
        ..ExecutionParams::default()
    }
}

pub fn write_temp_file(content: &str, suffix: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

pub fn candles_to_csv(candles: &[Candle]) -> String {
    let mut out = String::from("date,open,high,low,close,volume\n");
    for c in candles {
        out.push_str(&format!(
            "{},{},{},{},{},{}\n",
            c.date, c.open, c.high, c.low, c.close, c.volume
        ));
    }
    out
}

pub struct MockDataPort {
    pub candles: Vec<Candle>,
    pub error: Option<String>,
}

impl MockDataPort {
    pub fn new(candles: Vec<Candle>) -> Self {
        Self {
            candles,
            error: None,
        }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            candles: Vec::new(),
            error: Some(reason.to_string()),
        }
    }
}

impl DataPort for MockDataPort {
    fn load_candles(&self) -> Result<Vec<Candle>, EngineError> {
        if let Some(reason) = &self.error {
            return Err(EngineError::Data {
                reason: reason.clone(),
            });
        }
        Ok(self.candles.clone())
    }
}
