//! Exponential Moving Average indicator.
//!
//! k = 2/(n+1), seed with the SMA of the first n values, then
//! EMA[i] = (P[i] - EMA[i-1]) * k + EMA[i-1].
//! Warmup: first (n-1) bars are undefined.

use super::IndicatorSeries;

pub fn calculate_ema(values: &[f64], period: usize) -> IndicatorSeries {
    if period == 0 {
        return vec![None; values.len()];
    }

    let k = 2.0 / (period as f64 + 1.0);
    let mut out = Vec::with_capacity(values.len());
    let mut ema = 0.0;

    for (i, &value) in values.iter().enumerate() {
        if i + 1 < period {
            out.push(None);
        } else if i + 1 == period {
            ema = values[..period].iter().sum::<f64>() / period as f64;
            out.push(Some(ema));
        } else {
            ema = (value - ema) * k + ema;
            out.push(Some(ema));
        }
    }

    out
}
