//! Technical indicator implementations.
//!
//! Every indicator takes the full price columns and returns series aligned
//! index-for-index with the input; `None` marks bars still inside the
//! indicator's warm-up window.
//!
//! - `IndicatorSeries`: one optional value per bar
//! - `IndicatorKey`: indicator identity + parameters (serves as HashMap key)
//! - `ComputedIndicator`: output shape of one computed indicator
//! - `IndicatorSet`: all indicators a strategy references, computed once

pub mod adx;
pub mod atr;
pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;
pub mod stochastic;

use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::domain::candle::PriceColumns;

pub use adx::calculate_adx;
pub use atr::calculate_atr;
pub use bollinger::{calculate_bollinger, BollingerSeries};
pub use ema::calculate_ema;
pub use macd::{calculate_macd, MacdSeries};
pub use rsi::calculate_rsi;
pub use sma::calculate_sma;
pub use stochastic::{calculate_stochastic, StochasticSeries};

pub type IndicatorSeries = Vec<Option<f64>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorKey {
    Sma(usize),
    Ema(usize),
    Rsi(usize),
    Atr(usize),
    Adx(usize),
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
    },
    Bollinger {
        period: usize,
        stddev_mult_x100: u32,
    },
    Stochastic {
        k_period: usize,
        d_period: usize,
    },
}

impl fmt::Display for IndicatorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorKey::Sma(period) => write!(f, "SMA({})", period),
            IndicatorKey::Ema(period) => write!(f, "EMA({})", period),
            IndicatorKey::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorKey::Atr(period) => write!(f, "ATR({})", period),
            IndicatorKey::Adx(period) => write!(f, "ADX({})", period),
            IndicatorKey::Macd { fast, slow, signal } => {
                write!(f, "MACD({},{},{})", fast, slow, signal)
            }
            IndicatorKey::Bollinger {
                period,
                stddev_mult_x100,
            } => {
                let mult = *stddev_mult_x100 as f64 / 100.0;
                write!(f, "BOLLINGER({},{})", period, mult)
            }
            IndicatorKey::Stochastic { k_period, d_period } => {
                write!(f, "STOCHASTIC({},{})", k_period, d_period)
            }
        }
    }
}

/// Parameters for the indicators whose equation names carry no arguments
/// (`MACD_*`, `BB_*`, `STOCH_*`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorSettings {
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub bb_period: usize,
    pub bb_stddev: f64,
    pub stoch_k: usize,
    pub stoch_d: usize,
}

impl Default for IndicatorSettings {
    fn default() -> Self {
        IndicatorSettings {
            macd_fast: macd::DEFAULT_FAST,
            macd_slow: macd::DEFAULT_SLOW,
            macd_signal: macd::DEFAULT_SIGNAL,
            bb_period: bollinger::DEFAULT_PERIOD,
            bb_stddev: bollinger::DEFAULT_STDDEV_MULT,
            stoch_k: stochastic::DEFAULT_K_PERIOD,
            stoch_d: stochastic::DEFAULT_D_PERIOD,
        }
    }
}

impl IndicatorSettings {
    pub fn macd_key(&self) -> IndicatorKey {
        IndicatorKey::Macd {
            fast: self.macd_fast,
            slow: self.macd_slow,
            signal: self.macd_signal,
        }
    }

    pub fn bollinger_key(&self) -> IndicatorKey {
        IndicatorKey::Bollinger {
            period: self.bb_period,
            stddev_mult_x100: (self.bb_stddev * 100.0).round() as u32,
        }
    }

    pub fn stochastic_key(&self) -> IndicatorKey {
        IndicatorKey::Stochastic {
            k_period: self.stoch_k,
            d_period: self.stoch_d,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ComputedIndicator {
    Single(IndicatorSeries),
    Macd(MacdSeries),
    Bollinger(BollingerSeries),
    Stochastic(StochasticSeries),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndicatorSet {
    series: HashMap<IndicatorKey, ComputedIndicator>,
}

impl IndicatorSet {
    pub fn get(&self, key: &IndicatorKey) -> Option<&ComputedIndicator> {
        self.series.get(key)
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

pub fn compute_indicator(columns: &PriceColumns, key: IndicatorKey) -> ComputedIndicator {
    let PriceColumns {
        highs,
        lows,
        closes,
    } = columns;
    match key {
        IndicatorKey::Sma(period) => ComputedIndicator::Single(calculate_sma(closes, period)),
        IndicatorKey::Ema(period) => ComputedIndicator::Single(calculate_ema(closes, period)),
        IndicatorKey::Rsi(period) => ComputedIndicator::Single(calculate_rsi(closes, period)),
        IndicatorKey::Atr(period) => {
            ComputedIndicator::Single(calculate_atr(highs, lows, closes, period))
        }
        IndicatorKey::Adx(period) => {
            ComputedIndicator::Single(calculate_adx(highs, lows, closes, period))
        }
        IndicatorKey::Macd { fast, slow, signal } => {
            ComputedIndicator::Macd(calculate_macd(closes, fast, slow, signal))
        }
        IndicatorKey::Bollinger {
            period,
            stddev_mult_x100,
        } => ComputedIndicator::Bollinger(calculate_bollinger(
            closes,
            period,
            stddev_mult_x100 as f64 / 100.0,
        )),
        IndicatorKey::Stochastic { k_period, d_period } => ComputedIndicator::Stochastic(
            calculate_stochastic(highs, lows, closes, k_period, d_period),
        ),
    }
}

/// Compute every requested indicator once.
pub fn compute_indicators(columns: &PriceColumns, keys: &HashSet<IndicatorKey>) -> IndicatorSet {
    let series = keys
        .iter()
        .map(|key| (*key, compute_indicator(columns, *key)))
        .collect();
    IndicatorSet { series }
}

/// Apply `f` to the defined values of `series` as a contiguous array and map
/// the results back onto the original indices.
///
/// Used where one indicator smooths another (MACD signal, stochastic %D, ADX),
/// so the inner warm-up does not count against the outer period.
pub(crate) fn map_over_defined<F>(series: &[Option<f64>], f: F) -> IndicatorSeries
where
    F: FnOnce(&[f64]) -> IndicatorSeries,
{
    let defined: Vec<f64> = series.iter().flatten().copied().collect();
    let smoothed = f(&defined);
    let mut next = 0;
    series
        .iter()
        .map(|v| match v {
            Some(_) => {
                let out = smoothed.get(next).copied().flatten();
                next += 1;
                out
            }
            None => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns(closes: &[f64]) -> PriceColumns {
        PriceColumns {
            highs: closes.iter().map(|c| c + 1.0).collect(),
            lows: closes.iter().map(|c| c - 1.0).collect(),
            closes: closes.to_vec(),
        }
    }

    #[test]
    fn key_display() {
        assert_eq!(IndicatorKey::Sma(20).to_string(), "SMA(20)");
        assert_eq!(IndicatorSettings::default().macd_key().to_string(), "MACD(12,26,9)");
        assert_eq!(
            IndicatorSettings::default().bollinger_key().to_string(),
            "BOLLINGER(20,2)"
        );
        assert_eq!(
            IndicatorSettings::default().stochastic_key().to_string(),
            "STOCHASTIC(14,3)"
        );
    }

    #[test]
    fn key_hash_eq() {
        let mut map = HashMap::new();
        map.insert(IndicatorKey::Sma(20), "sma20");
        map.insert(IndicatorKey::Sma(50), "sma50");
        assert_eq!(map.get(&IndicatorKey::Sma(20)), Some(&"sma20"));
        assert_eq!(map.get(&IndicatorKey::Ema(20)), None);
    }

    #[test]
    fn compute_indicators_builds_requested_keys_only() {
        let cols = columns(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let keys: HashSet<IndicatorKey> = [IndicatorKey::Sma(2), IndicatorKey::Ema(3)]
            .into_iter()
            .collect();
        let set = compute_indicators(&cols, &keys);
        assert_eq!(set.len(), 2);
        assert!(set.get(&IndicatorKey::Rsi(14)).is_none());
        match set.get(&IndicatorKey::Sma(2)) {
            Some(ComputedIndicator::Single(s)) => {
                assert_eq!(s.len(), 5);
                assert_eq!(s[0], None);
                assert_eq!(s[1], Some(1.5));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn every_output_is_length_aligned() {
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + (i as f64).sin() * 5.0).collect();
        let cols = columns(&closes);
        let settings = IndicatorSettings::default();
        let keys = [
            IndicatorKey::Sma(5),
            IndicatorKey::Ema(5),
            IndicatorKey::Rsi(14),
            IndicatorKey::Atr(14),
            IndicatorKey::Adx(14),
            settings.macd_key(),
            settings.bollinger_key(),
            settings.stochastic_key(),
        ];
        for key in keys {
            match compute_indicator(&cols, key) {
                ComputedIndicator::Single(s) => assert_eq!(s.len(), 40, "{}", key),
                ComputedIndicator::Macd(m) => {
                    assert_eq!(m.line.len(), 40);
                    assert_eq!(m.signal.len(), 40);
                    assert_eq!(m.histogram.len(), 40);
                }
                ComputedIndicator::Bollinger(b) => {
                    assert_eq!(b.upper.len(), 40);
                    assert_eq!(b.middle.len(), 40);
                    assert_eq!(b.lower.len(), 40);
                }
                ComputedIndicator::Stochastic(s) => {
                    assert_eq!(s.k.len(), 40);
                    assert_eq!(s.d.len(), 40);
                }
            }
        }
    }

    #[test]
    fn map_over_defined_realigns() {
        let series = vec![None, None, Some(1.0), Some(3.0), Some(5.0)];
        let out = map_over_defined(&series, |vals| calculate_sma(vals, 2));
        assert_eq!(out, vec![None, None, None, Some(2.0), Some(4.0)]);
    }

    #[test]
    fn map_over_defined_all_none() {
        let series = vec![None, None];
        let out = map_over_defined(&series, |vals| calculate_sma(vals, 2));
        assert_eq!(out, vec![None, None]);
    }
}
