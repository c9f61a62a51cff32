//! Fill simulation and risk checks.
//!
//! Implements entry sizing with slippage and commission, exits at a given
//! price, and the stop-loss / trailing-stop / take-profit overlay.

use chrono::NaiveDate;

use crate::domain::candle::Candle;
use crate::domain::indicator::IndicatorSettings;
use crate::domain::position::Position;
use crate::domain::trade::{ExitReason, Side, Trade};

/// Cost, sizing and risk parameters of one backtest run.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionParams {
    pub initial_capital: f64,
    pub commission_pct: f64,
    pub slippage_bps: f64,
    pub max_position_pct: f64,
    pub stop_loss_pct: Option<f64>,
    pub take_profit_pct: Option<f64>,
    pub trailing_stop_pct: Option<f64>,
    pub indicators: IndicatorSettings,
}

impl Default for ExecutionParams {
    fn default() -> Self {
        ExecutionParams {
            initial_capital: 100_000.0,
            commission_pct: 0.1,
            slippage_bps: 5.0,
            max_position_pct: 10.0,
            stop_loss_pct: None,
            take_profit_pct: None,
            trailing_stop_pct: None,
            indicators: IndicatorSettings::default(),
        }
    }
}

/// Overlay percentages that are absent or non-positive are disabled.
fn active(pct: Option<f64>) -> Option<f64> {
    pct.filter(|p| *p > 0.0)
}

pub fn calculate_commission(trade_value: f64, commission_pct: f64) -> f64 {
    trade_value * (commission_pct / 100.0)
}

/// Buy fill: price + price * (bps / 10_000)
pub fn apply_slippage_buy(price: f64, slippage_bps: f64) -> f64 {
    price + price * (slippage_bps / 10_000.0)
}

/// Sell fill: price - price * (bps / 10_000)
pub fn apply_slippage_sell(price: f64, slippage_bps: f64) -> f64 {
    price - price * (slippage_bps / 10_000.0)
}

#[derive(Debug, Clone, PartialEq)]
pub enum EntryResult {
    Entered { position: Position, trade: Trade },
    InsufficientFunds,
}

/// Enter a long position at the bar's close.
///
/// 1. Budget = cash * (max_position_pct / 100)
/// 2. Fill price = close plus slippage
/// 3. Quantity = whole shares the budget buys at the fill price
/// 4. Reject when quantity is 0 or cost + commission exceeds cash
/// 5. Debit cash and open the position
pub fn enter_long(cash: &mut f64, bar: &Candle, params: &ExecutionParams) -> EntryResult {
    let budget = *cash * (params.max_position_pct / 100.0);
    let fill_price = apply_slippage_buy(bar.close, params.slippage_bps);
    if fill_price <= 0.0 || !fill_price.is_finite() || !budget.is_finite() {
        return EntryResult::InsufficientFunds;
    }

    let quantity = (budget / fill_price).floor() as u64;
    if quantity == 0 {
        return EntryResult::InsufficientFunds;
    }

    let notional_value = quantity as f64 * fill_price;
    let commission = calculate_commission(notional_value, params.commission_pct);
    if notional_value + commission > *cash {
        return EntryResult::InsufficientFunds;
    }

    *cash -= notional_value + commission;

    EntryResult::Entered {
        position: Position::open(quantity, fill_price),
        trade: Trade {
            date: bar.date,
            side: Side::Buy,
            price: fill_price,
            quantity,
            notional_value,
            commission,
            pnl: None,
            exit_reason: None,
        },
    }
}

/// Close `position` at `exit_price` (before slippage) and credit cash.
///
/// PnL is net of the exit commission only; the entry commission was already
/// taken from cash at entry.
pub fn exit_long(
    cash: &mut f64,
    position: &Position,
    date: NaiveDate,
    exit_price: f64,
    reason: ExitReason,
    params: &ExecutionParams,
) -> Trade {
    let fill_price = apply_slippage_sell(exit_price, params.slippage_bps);
    let proceeds = position.quantity as f64 * fill_price;
    let commission = calculate_commission(proceeds, params.commission_pct);
    let pnl = proceeds - commission - position.quantity as f64 * position.entry_price;

    *cash += proceeds - commission;

    Trade {
        date,
        side: Side::Sell,
        price: fill_price,
        quantity: position.quantity,
        notional_value: proceeds,
        commission,
        pnl: Some(pnl),
        exit_reason: Some(reason),
    }
}

/// A protective exit triggered on this bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayTrigger {
    pub reason: ExitReason,
    /// Threshold price the exit fills at, before slippage.
    pub price: f64,
}

/// Check the risk overlay against this bar's range.
///
/// Priority, first match wins: stop-loss, trailing stop, take-profit.
/// `position.highest_price_since_entry` must already include this bar's high.
pub fn check_risk_overlay(
    position: &Position,
    bar: &Candle,
    params: &ExecutionParams,
) -> Option<OverlayTrigger> {
    if let Some(pct) = active(params.stop_loss_pct) {
        let stop = position.entry_price * (1.0 - pct / 100.0);
        if bar.low <= stop {
            return Some(OverlayTrigger {
                reason: ExitReason::StopLoss,
                price: stop,
            });
        }
    }

    if let Some(pct) = active(params.trailing_stop_pct) {
        let stop = position.highest_price_since_entry * (1.0 - pct / 100.0);
        if bar.low <= stop {
            return Some(OverlayTrigger {
                reason: ExitReason::TrailingStop,
                price: stop,
            });
        }
    }

    if let Some(pct) = active(params.take_profit_pct) {
        let target = position.entry_price * (1.0 + pct / 100.0);
        if bar.high >= target {
            return Some(OverlayTrigger {
                reason: ExitReason::TakeProfit,
                price: target,
            });
        }
    }

    None
}
