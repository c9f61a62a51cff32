//! Stochastic Oscillator (%K / %D).
//!
//! %K[i] = 100 * (C[i] - LL) / (HH - LL) over the trailing k bars, 50 when
//! HH == LL. %D is the SMA(d) of the defined %K values.
//! Default parameters: k=14, d=3.

use super::{calculate_sma, map_over_defined, IndicatorSeries};

pub const DEFAULT_K_PERIOD: usize = 14;
pub const DEFAULT_D_PERIOD: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct StochasticSeries {
    pub k: IndicatorSeries,
    pub d: IndicatorSeries,
}

pub fn calculate_stochastic(
    highs: &[f64],
    lows: &[f64],
    closes: &[f64],
    k_period: usize,
    d_period: usize,
) -> StochasticSeries {
    let k: IndicatorSeries = (0..closes.len())
        .map(|i| {
            if k_period == 0 || i + 1 < k_period {
                return None;
            }
            let start = i + 1 - k_period;
            let highest = highs[start..=i]
                .iter()
                .copied()
                .fold(f64::NEG_INFINITY, f64::max);
            let lowest = lows[start..=i].iter().copied().fold(f64::INFINITY, f64::min);

            if highest == lowest {
                Some(50.0)
            } else {
                Some((closes[i] - lowest) / (highest - lowest) * 100.0)
            }
        })
        .collect();

    let d = map_over_defined(&k, |defined| calculate_sma(defined, d_period));

    StochasticSeries { k, d }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn k_at_top_of_range_is_100() {
        let s = calculate_stochastic(&[10.0, 12.0, 14.0], &[8.0, 9.0, 10.0], &[9.0, 11.0, 14.0], 3, 1);
        assert_relative_eq!(s.k[2].unwrap(), 100.0);
    }

    #[test]
    fn k_mid_range() {
        // HH 20, LL 10, close 15
        let s = calculate_stochastic(&[20.0, 18.0], &[10.0, 12.0], &[14.0, 15.0], 2, 1);
        assert_relative_eq!(s.k[1].unwrap(), 50.0);
    }

    #[test]
    fn zero_range_is_50() {
        let s = calculate_stochastic(&[5.0; 4], &[5.0; 4], &[5.0; 4], 2, 2);
        assert_eq!(s.k[1], Some(50.0));
        assert_eq!(s.d[2], Some(50.0));
    }

    #[test]
    fn d_warmup_starts_after_k() {
        let highs = [10.0, 11.0, 12.0, 13.0, 14.0, 15.0];
        let lows = [9.0, 9.5, 10.0, 11.0, 12.0, 13.0];
        let closes = [9.5, 10.5, 11.5, 12.5, 13.5, 14.5];
        let s = calculate_stochastic(&highs, &lows, &closes, 3, 2);
        assert!(s.k[..2].iter().all(Option::is_none));
        assert!(s.k[2].is_some());
        assert!(s.d[..3].iter().all(Option::is_none));
        let expected = (s.k[2].unwrap() + s.k[3].unwrap()) / 2.0;
        assert_relative_eq!(s.d[3].unwrap(), expected);
    }
}
