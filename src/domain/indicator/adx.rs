//! Average Directional Index.
//!
//! Per bar (bar 0 contributes +DM = -DM = 0, TR = H - L):
//! - up = H[i] - H[i-1], down = L[i-1] - L[i]
//! - +DM = up if up > down && up > 0, else 0; -DM symmetric
//!
//! +DM, -DM and TR are smoothed with the EMA recurrence, then
//! +DI = 100·+DM/TR, -DI = 100·-DM/TR, DX = 100·|+DI - -DI| / (+DI + -DI)
//! (0 when the DI sum is 0, undefined when smoothed TR is 0).
//! ADX is the EMA(n) of the defined DX values.

use super::atr::true_ranges;
use super::{calculate_ema, map_over_defined, IndicatorSeries};

pub fn calculate_adx(highs: &[f64], lows: &[f64], closes: &[f64], period: usize) -> IndicatorSeries {
    let len = closes.len();
    let mut plus_dm = vec![0.0; len];
    let mut minus_dm = vec![0.0; len];

    for i in 1..len {
        let up = highs[i] - highs[i - 1];
        let down = lows[i - 1] - lows[i];
        if up > down && up > 0.0 {
            plus_dm[i] = up;
        }
        if down > up && down > 0.0 {
            minus_dm[i] = down;
        }
    }

    let smooth_plus = calculate_ema(&plus_dm, period);
    let smooth_minus = calculate_ema(&minus_dm, period);
    let smooth_tr = calculate_ema(&true_ranges(highs, lows, closes), period);

    let dx: IndicatorSeries = (0..len)
        .map(|i| {
            let tr = smooth_tr[i]?;
            if tr == 0.0 {
                return None;
            }
            let plus_di = smooth_plus[i]? / tr * 100.0;
            let minus_di = smooth_minus[i]? / tr * 100.0;
            let di_sum = plus_di + minus_di;
            if di_sum == 0.0 {
                Some(0.0)
            } else {
                Some((plus_di - minus_di).abs() / di_sum * 100.0)
            }
        })
        .collect();

    map_over_defined(&dx, |defined| calculate_ema(defined, period))
}
