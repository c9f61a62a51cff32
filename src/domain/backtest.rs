//! Backtest engine and bar loop.
//!
//! Per bar, in order:
//! 1. Flat: evaluate the entry equation and try to fill a long entry
//! 2. Long (including a position opened in step 1): raise the trailing peak,
//!    check the risk overlay, then the exit equation
//! 3. Mark equity to the bar's close
//!
//! A bar can therefore open and close a position, but never re-enters after
//! an exit.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::domain::candle::{first_out_of_order, Candle, PriceColumns};
use crate::domain::config_validation::validate_execution_params;
use crate::domain::equation::{Equation, Expr};
use crate::domain::equation_eval::{evaluate_condition, EvalError};
use crate::domain::error::{EngineError, EquationSide};
use crate::domain::execution::{
    check_risk_overlay, enter_long, exit_long, EntryResult, ExecutionParams,
};
use crate::domain::indicator::{compute_indicators, IndicatorKey, IndicatorSettings};
use crate::domain::metrics::Metrics;
use crate::domain::position::PositionState;
use crate::domain::trade::{ExitReason, Trade};
use crate::domain::variables::VariableTable;

/// Non-fatal counters collected during a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostics {
    /// Entry signals that could not be filled with the available cash.
    pub skipped_funds_count: usize,
    /// Evaluations that read a variable still in warm-up.
    pub undefined_evaluations: usize,
    /// Evaluations that failed for any other reason (division by zero).
    pub eval_errors: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BacktestResult {
    pub dates: Vec<NaiveDate>,
    pub equity: Vec<f64>,
    pub trades: Vec<Trade>,
    pub metrics: Metrics,
    pub diagnostics: Diagnostics,
}

/// Entry and exit equations parsed once and reusable across runs.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledStrategy {
    entry: Equation,
    exit: Equation,
}

impl CompiledStrategy {
    pub fn compile(entry: &str, exit: &str) -> Result<Self, EngineError> {
        let entry = Equation::parse(entry).map_err(|source| EngineError::Grammar {
            side: EquationSide::Entry,
            source,
        })?;
        let exit = Equation::parse(exit).map_err(|source| EngineError::Grammar {
            side: EquationSide::Exit,
            source,
        })?;
        Ok(Self { entry, exit })
    }

    pub fn entry(&self) -> &Equation {
        &self.entry
    }

    pub fn exit(&self) -> &Equation {
        &self.exit
    }

    /// Every indicator either equation reads.
    pub fn indicator_keys(&self, settings: &IndicatorSettings) -> HashSet<IndicatorKey> {
        self.entry
            .indicator_keys(settings)
            .into_iter()
            .chain(self.exit.indicator_keys(settings))
            .collect()
    }

    pub fn run(
        &self,
        candles: &[Candle],
        params: &ExecutionParams,
    ) -> Result<BacktestResult, EngineError> {
        validate_execution_params(params)?;
        if let Some(index) = first_out_of_order(candles) {
            return Err(EngineError::UnorderedCandles {
                index,
                date: candles[index].date,
            });
        }

        let columns = PriceColumns::from_candles(candles);
        let keys = self.indicator_keys(&params.indicators);
        let indicators = compute_indicators(&columns, &keys);
        debug!(
            bars = candles.len(),
            indicators = indicators.len(),
            entry = %self.entry,
            exit = %self.exit,
            "starting backtest"
        );

        let mut cash = params.initial_capital;
        let mut state = PositionState::Flat;
        let mut dates = Vec::with_capacity(candles.len());
        let mut equity = Vec::with_capacity(candles.len());
        let mut trades = Vec::new();
        let mut diagnostics = Diagnostics::default();

        for (i, bar) in candles.iter().enumerate() {
            let vars = VariableTable::new(bar, &indicators, &params.indicators, i);

            if matches!(state, PositionState::Flat)
                && signal(self.entry.expr(), &vars, bar.date, &mut diagnostics)
            {
                match enter_long(&mut cash, bar, params) {
                    EntryResult::Entered { position, trade } => {
                        debug!(
                            date = %bar.date,
                            quantity = position.quantity,
                            price = position.entry_price,
                            "entered long"
                        );
                        trades.push(trade);
                        state = PositionState::Long(position);
                    }
                    EntryResult::InsufficientFunds => {
                        diagnostics.skipped_funds_count += 1;
                        debug!(date = %bar.date, cash, "entry skipped: insufficient funds");
                    }
                }
            }

            state = match std::mem::take(&mut state) {
                PositionState::Flat => PositionState::Flat,
                PositionState::Long(mut position) => {
                    position.observe_high(bar.high);

                    let exit = match check_risk_overlay(&position, bar, params) {
                        Some(trigger) => {
                            debug!(
                                date = %bar.date,
                                reason = %trigger.reason,
                                entry = position.entry_price,
                                peak = position.highest_price_since_entry,
                                threshold = trigger.price,
                                "risk overlay triggered"
                            );
                            Some((trigger.reason, trigger.price))
                        }
                        None => signal(self.exit.expr(), &vars, bar.date, &mut diagnostics)
                            .then_some((ExitReason::Signal, bar.close)),
                    };

                    match exit {
                        Some((reason, price)) => {
                            let trade =
                                exit_long(&mut cash, &position, bar.date, price, reason, params);
                            debug!(date = %bar.date, %reason, pnl = ?trade.pnl, "exited long");
                            trades.push(trade);
                            PositionState::Flat
                        }
                        None => PositionState::Long(position),
                    }
                }
            };

            dates.push(bar.date);
            equity.push(cash + state.market_value(bar.close));
        }

        let metrics = Metrics::compute(&equity, &trades, params.initial_capital);
        debug!(
            trades = trades.len(),
            skipped = diagnostics.skipped_funds_count,
            "backtest complete"
        );

        Ok(BacktestResult {
            dates,
            equity,
            trades,
            metrics,
            diagnostics,
        })
    }
}

/// Evaluate a condition, failing closed and counting why it failed.
fn signal(
    expr: &Expr,
    vars: &VariableTable<'_>,
    date: NaiveDate,
    diagnostics: &mut Diagnostics,
) -> bool {
    match evaluate_condition(expr, vars) {
        Ok(holds) => holds,
        Err(err) => {
            match err {
                EvalError::Undefined(_) => diagnostics.undefined_evaluations += 1,
                EvalError::DivisionByZero => diagnostics.eval_errors += 1,
            }
            trace!(%date, error = %err, "condition treated as false");
            false
        }
    }
}

/// Parse both equations and run them over `candles`.
pub fn run_backtest(
    candles: &[Candle],
    entry: &str,
    exit: &str,
    params: &ExecutionParams,
) -> Result<BacktestResult, EngineError> {
    CompiledStrategy::compile(entry, exit)?.run(candles, params)
}
