//! Bollinger Bands indicator.
//!
//! Middle = SMA(n), Upper/Lower = Middle ± k·σ, with σ the population
//! standard deviation of the trailing n closes.
//! Default parameters: n=20, k=2.0. Warmup: first (n-1) bars are undefined.

use super::{calculate_sma, IndicatorSeries};

pub const DEFAULT_PERIOD: usize = 20;
pub const DEFAULT_STDDEV_MULT: f64 = 2.0;

#[derive(Debug, Clone, PartialEq)]
pub struct BollingerSeries {
    pub upper: IndicatorSeries,
    pub middle: IndicatorSeries,
    pub lower: IndicatorSeries,
}

pub fn calculate_bollinger(closes: &[f64], period: usize, stddev_mult: f64) -> BollingerSeries {
    let middle = calculate_sma(closes, period);
    let mut upper = Vec::with_capacity(closes.len());
    let mut lower = Vec::with_capacity(closes.len());

    for (i, mean) in middle.iter().enumerate() {
        match mean {
            Some(mean) => {
                let window = &closes[i + 1 - period..=i];
                let variance = window
                    .iter()
                    .map(|v| {
                        let diff = v - mean;
                        diff * diff
                    })
                    .sum::<f64>()
                    / period as f64;
                let std = variance.sqrt();
                upper.push(Some(mean + stddev_mult * std));
                lower.push(Some(mean - stddev_mult * std));
            }
            None => {
                upper.push(None);
                lower.push(None);
            }
        }
    }

    BollingerSeries {
        upper,
        middle,
        lower,
    }
}
