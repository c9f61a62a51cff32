//! Average True Range: SMA(n) of the true range.
//!
//! TR[0] = H[0] - L[0]; TR[i] = max(H-L, |H-C[i-1]|, |L-C[i-1]|).

use super::{calculate_sma, IndicatorSeries};

pub fn true_ranges(highs: &[f64], lows: &[f64], closes: &[f64]) -> Vec<f64> {
    (0..closes.len())
        .map(|i| {
            let hl = highs[i] - lows[i];
            if i == 0 {
                hl
            } else {
                let prev_close = closes[i - 1];
                hl.max((highs[i] - prev_close).abs())
                    .max((lows[i] - prev_close).abs())
            }
        })
        .collect()
}

pub fn calculate_atr(highs: &[f64], lows: &[f64], closes: &[f64], period: usize) -> IndicatorSeries {
    calculate_sma(&true_ranges(highs, lows, closes), period)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn first_true_range_is_high_minus_low() {
        let tr = true_ranges(&[110.0, 115.0], &[100.0, 105.0], &[105.0, 110.0]);
        assert_relative_eq!(tr[0], 10.0);
    }

    #[test]
    fn true_range_handles_gaps() {
        // gap up: prev close 105, bar 130/120 → |130-105| = 25
        let tr = true_ranges(&[110.0, 130.0], &[100.0, 120.0], &[105.0, 125.0]);
        assert_relative_eq!(tr[1], 25.0);
    }

    #[test]
    fn atr_is_sma_of_true_range() {
        let highs = [110.0, 115.0, 120.0, 125.0];
        let lows = [100.0, 105.0, 110.0, 115.0];
        let closes = [105.0, 110.0, 115.0, 120.0];
        let atr = calculate_atr(&highs, &lows, &closes, 3);
        assert_eq!(atr[0], None);
        assert_eq!(atr[1], None);
        assert_relative_eq!(atr[2].unwrap(), 10.0);
        assert_relative_eq!(atr[3].unwrap(), 10.0);
    }

    #[test]
    fn atr_insufficient_bars() {
        let atr = calculate_atr(&[110.0, 110.0], &[90.0, 90.0], &[100.0, 100.0], 5);
        assert_eq!(atr, vec![None, None]);
    }
}
