//! Execution parameter validation.
//!
//! Runs before any simulation state exists.

use crate::domain::equation_parser::MAX_PERIOD;
use crate::domain::error::EngineError;
use crate::domain::execution::ExecutionParams;
use crate::domain::indicator::IndicatorSettings;

pub fn validate_execution_params(params: &ExecutionParams) -> Result<(), EngineError> {
    validate_initial_capital(params.initial_capital)?;
    non_negative("commission_pct", params.commission_pct)?;
    non_negative("slippage_bps", params.slippage_bps)?;
    validate_max_position(params.max_position_pct)?;
    validate_overlay("stop_loss_pct", params.stop_loss_pct)?;
    validate_overlay("trailing_stop_pct", params.trailing_stop_pct)?;
    validate_overlay("take_profit_pct", params.take_profit_pct)?;
    validate_indicator_settings(&params.indicators)?;
    Ok(())
}

fn invalid(key: &str, reason: impl Into<String>) -> EngineError {
    EngineError::InvalidParam {
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn validate_initial_capital(value: f64) -> Result<(), EngineError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(invalid(
            "initial_capital",
            "initial_capital must be a positive number",
        ));
    }
    Ok(())
}

fn non_negative(key: &str, value: f64) -> Result<(), EngineError> {
    if !value.is_finite() || value < 0.0 {
        return Err(invalid(key, format!("{} must be non-negative", key)));
    }
    Ok(())
}

fn validate_max_position(value: f64) -> Result<(), EngineError> {
    if !value.is_finite() || value <= 0.0 || value > 100.0 {
        return Err(invalid(
            "max_position_pct",
            "max_position_pct must be in (0, 100]",
        ));
    }
    Ok(())
}

/// A non-positive overlay is disabled. A stop at or beyond 100% puts its
/// threshold at or below zero and is accepted. Only non-finite values are
/// rejected.
fn validate_overlay(key: &str, value: Option<f64>) -> Result<(), EngineError> {
    match value {
        Some(pct) if !pct.is_finite() => {
            Err(invalid(key, format!("{} must be a finite number", key)))
        }
        _ => Ok(()),
    }
}

fn period(key: &str, value: usize) -> Result<(), EngineError> {
    if value == 0 || value > MAX_PERIOD {
        return Err(invalid(
            key,
            format!("{} must be between 1 and {}", key, MAX_PERIOD),
        ));
    }
    Ok(())
}

fn validate_indicator_settings(settings: &IndicatorSettings) -> Result<(), EngineError> {
    period("macd_fast", settings.macd_fast)?;
    period("macd_slow", settings.macd_slow)?;
    period("macd_signal", settings.macd_signal)?;
    period("bb_period", settings.bb_period)?;
    period("stoch_k", settings.stoch_k)?;
    period("stoch_d", settings.stoch_d)?;
    non_negative("bb_stddev", settings.bb_stddev)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_invalid(params: ExecutionParams, expected_key: &str) {
        match validate_execution_params(&params) {
            Err(EngineError::InvalidParam { key, .. }) => assert_eq!(key, expected_key),
            other => panic!("expected InvalidParam({expected_key}), got {other:?}"),
        }
    }

    #[test]
    fn defaults_are_valid() {
        assert!(validate_execution_params(&ExecutionParams::default()).is_ok());
    }

    #[test]
    fn initial_capital_must_be_positive() {
        for bad in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert_invalid(
                ExecutionParams {
                    initial_capital: bad,
                    ..ExecutionParams::default()
                },
                "initial_capital",
            );
        }
    }

    #[test]
    fn costs_must_be_non_negative() {
        assert_invalid(
            ExecutionParams {
                commission_pct: -0.1,
                ..ExecutionParams::default()
            },
            "commission_pct",
        );
        assert_invalid(
            ExecutionParams {
                slippage_bps: f64::NAN,
                ..ExecutionParams::default()
            },
            "slippage_bps",
        );
    }

    #[test]
    fn max_position_bounds() {
        assert_invalid(
            ExecutionParams {
                max_position_pct: 150.0,
                ..ExecutionParams::default()
            },
            "max_position_pct",
        );
        let full = ExecutionParams {
            max_position_pct: 100.0,
            ..ExecutionParams::default()
        };
        assert!(validate_execution_params(&full).is_ok());
    }

    #[test]
    fn disabled_overlays_are_accepted() {
        let params = ExecutionParams {
            stop_loss_pct: Some(0.0),
            take_profit_pct: Some(-5.0),
            trailing_stop_pct: None,
            ..ExecutionParams::default()
        };
        assert!(validate_execution_params(&params).is_ok());
    }

    #[test]
    fn full_loss_stops_are_accepted() {
        let wide = ExecutionParams {
            stop_loss_pct: Some(100.0),
            trailing_stop_pct: Some(150.0),
            take_profit_pct: Some(250.0),
            ..ExecutionParams::default()
        };
        assert!(validate_execution_params(&wide).is_ok());
        assert_invalid(
            ExecutionParams {
                trailing_stop_pct: Some(f64::INFINITY),
                ..ExecutionParams::default()
            },
            "trailing_stop_pct",
        );
    }

    #[test]
    fn indicator_periods_must_be_positive() {
        let params = ExecutionParams {
            indicators: IndicatorSettings {
                stoch_d: 0,
                ..IndicatorSettings::default()
            },
            ..ExecutionParams::default()
        };
        assert_invalid(params, "stoch_d");
    }
}
