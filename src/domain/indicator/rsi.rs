//! RSI (Relative Strength Index) indicator.
//!
//! Average gain/loss are the means of the last n per-bar changes:
//! - gain[i] = max(P[i] - P[i-1], 0), loss[i] = max(P[i-1] - P[i], 0)
//! - RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//! - If avg_loss == 0: RSI = 100
//!
//! Warmup: first n bars are undefined (n price changes are needed).

use super::IndicatorSeries;

pub fn calculate_rsi(values: &[f64], period: usize) -> IndicatorSeries {
    let mut out = vec![None; values.len()];
    if period == 0 || values.len() <= period {
        return out;
    }

    let mut gains = vec![0.0; values.len()];
    let mut losses = vec![0.0; values.len()];
    for i in 1..values.len() {
        let change = values[i] - values[i - 1];
        if change > 0.0 {
            gains[i] = change;
        } else if change < 0.0 {
            losses[i] = -change;
        }
    }

    for i in period..values.len() {
        let window = i + 1 - period..=i;
        let avg_gain = gains[window.clone()].iter().sum::<f64>() / period as f64;
        let avg_loss = losses[window].iter().sum::<f64>() / period as f64;

        out[i] = Some(if avg_loss == 0.0 {
            100.0
        } else {
            let rs = avg_gain / avg_loss;
            100.0 - (100.0 / (1.0 + rs))
        });
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn rsi_warmup_is_period_bars() {
        let prices: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        let s = calculate_rsi(&prices, 14);
        assert!(s[..14].iter().all(Option::is_none));
        assert!(s[14..].iter().all(Option::is_some));
    }

    #[test]
    fn rsi_all_gains_is_100() {
        let prices: Vec<f64> = (0..10).map(|i| 10.0 + i as f64).collect();
        let s = calculate_rsi(&prices, 5);
        assert_relative_eq!(s[9].unwrap(), 100.0);
    }

    #[test]
    fn rsi_flat_is_100() {
        let s = calculate_rsi(&[50.0; 10], 3);
        assert_relative_eq!(s[5].unwrap(), 100.0);
    }

    #[test]
    fn rsi_all_losses_is_0() {
        let prices: Vec<f64> = (0..10).map(|i| 100.0 - i as f64).collect();
        let s = calculate_rsi(&prices, 5);
        assert_relative_eq!(s[9].unwrap(), 0.0);
    }

    #[test]
    fn rsi_mixed_changes() {
        // changes: +2, -1, +2, -1 → with period 4, avg gain 1.0, avg loss 0.5
        let s = calculate_rsi(&[10.0, 12.0, 11.0, 13.0, 12.0], 4);
        let expected = 100.0 - 100.0 / (1.0 + 2.0);
        assert_relative_eq!(s[4].unwrap(), expected, epsilon = 1e-12);
    }

    #[test]
    fn rsi_uses_trailing_window_only() {
        // a large early drop falls out of the window
        let s = calculate_rsi(&[100.0, 50.0, 51.0, 52.0, 53.0], 3);
        // bar 3: gains [0, 1, 1], losses [50, 0, 0] → rs = 2 / 50
        assert_relative_eq!(s[3].unwrap(), 100.0 - 100.0 / 1.04, epsilon = 1e-9);
        assert_relative_eq!(s[4].unwrap(), 100.0);
    }

    #[test]
    fn rsi_short_series() {
        assert_eq!(calculate_rsi(&[1.0, 2.0], 14), vec![None, None]);
        assert_eq!(calculate_rsi(&[1.0, 2.0], 0), vec![None, None]);
    }
}
