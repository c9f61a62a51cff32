//! Performance metrics.
//!
//! Percentages and the Sharpe ratio are rounded to two decimals, halves
//! toward positive infinity.

use serde::{Deserialize, Serialize};

use crate::domain::trade::{ExitReason, Trade};

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    pub total_return_pct: f64,
    pub sharpe_ratio: f64,
    pub max_drawdown_pct: f64,
    pub win_rate_pct: f64,
    pub cagr_pct: f64,
    pub num_trades: usize,
    pub stop_loss_hits: usize,
    pub take_profit_hits: usize,
    pub trailing_stop_hits: usize,
}

impl Metrics {
    pub fn compute(equity: &[f64], trades: &[Trade], initial_capital: f64) -> Self {
        let count_reason =
            |reason: ExitReason| trades.iter().filter(|t| t.exit_reason == Some(reason)).count();

        let mut metrics = Metrics {
            num_trades: trades.len(),
            stop_loss_hits: count_reason(ExitReason::StopLoss),
            take_profit_hits: count_reason(ExitReason::TakeProfit),
            trailing_stop_hits: count_reason(ExitReason::TrailingStop),
            ..Metrics::default()
        };

        let Some(&final_equity) = equity.last() else {
            return metrics;
        };

        let total_return = if initial_capital > 0.0 {
            (final_equity - initial_capital) / initial_capital * 100.0
        } else {
            0.0
        };

        let years = equity.len() as f64 / TRADING_DAYS_PER_YEAR;
        let growth = final_equity / initial_capital;
        let cagr = if initial_capital > 0.0 && growth >= 0.0 {
            (growth.powf(1.0 / years) - 1.0) * 100.0
        } else {
            0.0
        };

        let sells = trades.iter().filter(|t| t.is_sell()).count();
        let winners = trades.iter().filter(|t| t.is_sell() && t.is_winner()).count();
        let win_rate = if sells > 0 {
            winners as f64 / sells as f64 * 100.0
        } else {
            0.0
        };

        metrics.total_return_pct = round_to_cents(total_return);
        metrics.sharpe_ratio = round_to_cents(sharpe_ratio(equity));
        metrics.max_drawdown_pct = round_to_cents(max_drawdown_pct(equity));
        metrics.win_rate_pct = round_to_cents(win_rate);
        metrics.cagr_pct = round_to_cents(cagr);
        metrics
    }
}

/// Two-decimal rounding with halves toward +∞; non-finite values become 0.
pub fn round_to_cents(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    (value * 100.0 + 0.5).floor() / 100.0
}

/// Annualized mean over population standard deviation of bar returns.
pub fn sharpe_ratio(equity: &[f64]) -> f64 {
    if equity.len() < 2 {
        return 0.0;
    }

    let returns: Vec<f64> = equity
        .windows(2)
        .map(|w| if w[0] != 0.0 { (w[1] - w[0]) / w[0] } else { 0.0 })
        .collect();

    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    let stddev = variance.sqrt();

    if stddev > 0.0 {
        mean / stddev * TRADING_DAYS_PER_YEAR.sqrt()
    } else {
        0.0
    }
}

/// Largest peak-to-trough decline, as a percentage of the running peak.
pub fn max_drawdown_pct(equity: &[f64]) -> f64 {
    let Some(&first) = equity.first() else {
        return 0.0;
    };

    let mut peak = first;
    let mut max_dd = 0.0_f64;
    for &value in equity {
        if value > peak {
            peak = value;
        } else if peak > 0.0 {
            max_dd = max_dd.max((peak - value) / peak * 100.0);
        }
    }
    max_dd
}
