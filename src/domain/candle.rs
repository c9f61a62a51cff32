//! Daily OHLCV candle.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// Column views over a candle slice, extracted once per backtest.
#[derive(Debug, Clone, Default)]
pub struct PriceColumns {
    pub highs: Vec<f64>,
    pub lows: Vec<f64>,
    pub closes: Vec<f64>,
}

impl PriceColumns {
    pub fn from_candles(candles: &[Candle]) -> Self {
        Self {
            highs: candles.iter().map(|c| c.high).collect(),
            lows: candles.iter().map(|c| c.low).collect(),
            closes: candles.iter().map(|c| c.close).collect(),
        }
    }
}

/// Index of the first candle whose date is not strictly after its predecessor.
pub fn first_out_of_order(candles: &[Candle]) -> Option<usize> {
    candles
        .windows(2)
        .position(|w| w[1].date <= w[0].date)
        .map(|i| i + 1)
}
