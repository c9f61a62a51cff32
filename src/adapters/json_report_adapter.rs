//! JSON report adapter.
//!
//! The document carries the strategy definition alongside the flattened
//! [`BacktestResult`] fields.

use crate::domain::backtest::BacktestResult;
use crate::domain::error::EngineError;
use crate::domain::strategy::Strategy;
use crate::ports::report_port::ReportPort;
use serde::Serialize;
use std::fs;
use std::path::Path;

#[derive(Serialize)]
struct StrategySection<'a> {
    name: &'a str,
    entry: &'a str,
    exit: &'a str,
}

#[derive(Serialize)]
struct ReportDocument<'a> {
    strategy: StrategySection<'a>,
    #[serde(flatten)]
    result: &'a BacktestResult,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct JsonReportAdapter;

impl JsonReportAdapter {
    pub fn new() -> Self {
        Self
    }

    /// Pretty-printed report document.
    pub fn render(result: &BacktestResult, strategy: &Strategy) -> Result<String, EngineError> {
        let doc = ReportDocument {
            strategy: StrategySection {
                name: &strategy.name,
                entry: &strategy.entry,
                exit: &strategy.exit,
            },
            result,
        };
        serde_json::to_string_pretty(&doc).map_err(|e| EngineError::Report {
            reason: format!("failed to serialize report: {}", e),
        })
    }
}

impl ReportPort for JsonReportAdapter {
    fn write(
        &self,
        result: &BacktestResult,
        strategy: &Strategy,
        output_path: &str,
    ) -> Result<(), EngineError> {
        let json = Self::render(result, strategy)?;

        if let Some(parent) = Path::new(output_path).parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                return Err(EngineError::Report {
                    reason: format!("output directory {} does not exist", parent.display()),
                });
            }
        }

        fs::write(output_path, json + "\n").map_err(|e| EngineError::Report {
            reason: format!("failed to write {}: {}", output_path, e),
        })?;
        tracing::debug!(path = output_path, "report written");
        Ok(())
    }
}
