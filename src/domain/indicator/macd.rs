//! MACD (Moving Average Convergence Divergence) indicator.
//!
//! MACD Line = EMA(fast) - EMA(slow)
//! Signal Line = EMA(signal) over the defined part of the MACD line
//! Histogram = MACD Line - Signal Line
//!
//! Default parameters: fast=12, slow=26, signal=9
//! Warmup: line from max(fast, slow) - 1, signal and histogram a further
//! signal - 1 bars later.

use super::{calculate_ema, map_over_defined, IndicatorSeries};

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

#[derive(Debug, Clone, PartialEq)]
pub struct MacdSeries {
    pub line: IndicatorSeries,
    pub signal: IndicatorSeries,
    pub histogram: IndicatorSeries,
}

pub fn calculate_macd(
    closes: &[f64],
    fast: usize,
    slow: usize,
    signal_period: usize,
) -> MacdSeries {
    let ema_fast = calculate_ema(closes, fast);
    let ema_slow = calculate_ema(closes, slow);

    let line: IndicatorSeries = ema_fast
        .iter()
        .zip(&ema_slow)
        .map(|(f, s)| Some((*f)? - (*s)?))
        .collect();

    let signal = map_over_defined(&line, |defined| calculate_ema(defined, signal_period));

    let histogram = line
        .iter()
        .zip(&signal)
        .map(|(l, s)| Some((*l)? - (*s)?))
        .collect();

    MacdSeries {
        line,
        signal,
        histogram,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trending(n: usize) -> Vec<f64> {
        (0..n).map(|i| 100.0 + i as f64 * 0.5 + ((i % 3) as f64)).collect()
    }

    #[test]
    fn macd_warmup_defaults() {
        let closes = trending(60);
        let m = calculate_macd(&closes, DEFAULT_FAST, DEFAULT_SLOW, DEFAULT_SIGNAL);

        // line defined from slow - 1 = 25
        assert!(m.line[..25].iter().all(Option::is_none));
        assert!(m.line[25].is_some());

        // signal defined from 25 + 9 - 1 = 33
        assert!(m.signal[..33].iter().all(Option::is_none));
        assert!(m.signal[33].is_some());
        assert!(m.histogram[32].is_none());
        assert!(m.histogram[33].is_some());
    }

    #[test]
    fn macd_line_is_ema_difference() {
        let closes = trending(40);
        let m = calculate_macd(&closes, 3, 6, 4);
        let fast = calculate_ema(&closes, 3);
        let slow = calculate_ema(&closes, 6);
        for i in 5..40 {
            let expected = fast[i].unwrap() - slow[i].unwrap();
            assert!((m.line[i].unwrap() - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn signal_seed_is_mean_of_first_defined_lines() {
        let closes = trending(30);
        let m = calculate_macd(&closes, 3, 6, 4);
        let seed: f64 = m.line[5..9].iter().map(|v| v.unwrap()).sum::<f64>() / 4.0;
        assert!((m.signal[8].unwrap() - seed).abs() < 1e-12);
    }

    #[test]
    fn histogram_is_line_minus_signal() {
        let closes = trending(50);
        let m = calculate_macd(&closes, 3, 6, 4);
        for i in 8..50 {
            let expected = m.line[i].unwrap() - m.signal[i].unwrap();
            assert!((m.histogram[i].unwrap() - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn macd_flat_prices_are_zero() {
        let m = calculate_macd(&[100.0; 40], 3, 6, 4);
        assert_eq!(m.line[10], Some(0.0));
        assert_eq!(m.signal[10], Some(0.0));
        assert_eq!(m.histogram[10], Some(0.0));
    }

    #[test]
    fn macd_short_series_undefined() {
        let m = calculate_macd(&[1.0, 2.0, 3.0], DEFAULT_FAST, DEFAULT_SLOW, DEFAULT_SIGNAL);
        assert!(m.line.iter().all(Option::is_none));
        assert!(m.signal.iter().all(Option::is_none));
    }
}
