//! Simple Moving Average.
//!
//! SMA(n)[i] = sum(P[i-n+1..=i]) / n
//! Warmup: first (n-1) bars are undefined.

use super::IndicatorSeries;

pub fn calculate_sma(values: &[f64], period: usize) -> IndicatorSeries {
    if period == 0 {
        return vec![None; values.len()];
    }

    (0..values.len())
        .map(|i| {
            if i + 1 < period {
                None
            } else {
                let window = &values[i + 1 - period..=i];
                Some(window.iter().sum::<f64>() / period as f64)
            }
        })
        .collect()
}
