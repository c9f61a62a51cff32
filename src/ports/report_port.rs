//! Report output port trait.

use crate::domain::backtest::BacktestResult;
use crate::domain::error::EngineError;
use crate::domain::strategy::Strategy;

/// Port for writing backtest reports.
pub trait ReportPort {
    fn write(
        &self,
        result: &BacktestResult,
        strategy: &Strategy,
        output_path: &str,
    ) -> Result<(), EngineError>;
}
