//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_report_adapter::JsonReportAdapter;
use crate::domain::backtest::{BacktestResult, CompiledStrategy};
use crate::domain::config_validation::validate_execution_params;
use crate::domain::error::{EngineError, EquationSide};
use crate::domain::execution::ExecutionParams;
use crate::domain::indicator::IndicatorSettings;
use crate::domain::strategy::Strategy;
use crate::domain::validation::{validate_equation, ValidationReport};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

const DEFAULT_OUTPUT: &str = "result.json";

#[derive(Parser, Debug)]
#[command(name = "quantsim", about = "Equation-driven strategy backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Candle CSV, overriding [simulation] data
        #[arg(short, long)]
        data: Option<PathBuf>,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(short, long)]
        verbose: bool,
    },
    /// Validate an equation, or the entry and exit equations of a config
    Validate {
        #[arg(short, long, conflicts_with = "config", required_unless_present = "config")]
        equation: Option<String>,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            data,
            output,
            verbose,
        } => {
            init_tracing(verbose);
            run_backtest(&config, data.as_deref(), output.as_deref())
        }
        Command::Validate { equation, config } => match (equation, config) {
            (Some(equation), _) => run_validate_equation(&equation),
            (None, Some(config)) => run_validate_config(&config),
            (None, None) => {
                eprintln!("error: either --equation or --config is required");
                ExitCode::from(2)
            }
        },
    }
}

/// `RUST_LOG` wins when set; `-v` raises the default from warn to debug.
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("warn,quantsim=debug")
        } else {
            EnvFilter::new("warn")
        }
    });

    // A second init in the same process keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .with(filter)
        .try_init();
}

fn fail(err: &EngineError) -> ExitCode {
    eprintln!("error: {err}");
    ExitCode::from(err)
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = EngineError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        fail(&err)
    })
}

fn run_backtest(config_path: &Path, data: Option<&Path>, output: Option<&Path>) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let params = match build_execution_params(&config) {
        Ok(p) => p,
        Err(e) => return fail(&e),
    };
    let strategy = match build_strategy(&config) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };

    eprintln!("Strategy: {}", strategy.name);
    let compiled = match compile_strategy(&strategy) {
        Ok(c) => c,
        Err(code) => return code,
    };
    eprintln!("  entry: {}", compiled.entry());
    eprintln!("  exit:  {}", compiled.exit());

    let data_path = match resolve_data_path(data, &config, config_path) {
        Ok(p) => p,
        Err(e) => return fail(&e),
    };
    eprintln!("Loading candles from {}", data_path.display());
    let candles = match CsvAdapter::new(&data_path).load_candles() {
        Ok(c) => c,
        Err(e) => return fail(&e),
    };
    match (candles.first(), candles.last()) {
        (Some(first), Some(last)) => eprintln!(
            "  {} bars ({} to {})",
            candles.len(),
            first.date,
            last.date
        ),
        _ => eprintln!("  0 bars"),
    }

    let result = match compiled.run(&candles, &params) {
        Ok(r) => r,
        Err(e) => return fail(&e),
    };
    print_summary(&result, params.initial_capital);

    let output = output.unwrap_or(Path::new(DEFAULT_OUTPUT));
    let output_str = output.to_string_lossy();
    match JsonReportAdapter::new().write(&result, &strategy, &output_str) {
        Ok(()) => {
            eprintln!("\nReport written to: {}", output.display());
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}

fn compile_strategy(strategy: &Strategy) -> Result<CompiledStrategy, ExitCode> {
    strategy.compile().map_err(|err| {
        if let EngineError::Grammar { side, source } = &err {
            let text = match side {
                EquationSide::Entry => &strategy.entry,
                EquationSide::Exit => &strategy.exit,
            };
            eprintln!(
                "error: failed to parse {} equation:\n{}",
                side,
                source.display_with_context(text)
            );
            ExitCode::from(&err)
        } else {
            fail(&err)
        }
    })
}

/// `-d` is taken as given; a relative `[simulation] data` path is resolved
/// against the config file's directory.
fn resolve_data_path(
    data: Option<&Path>,
    config: &dyn ConfigPort,
    config_path: &Path,
) -> Result<PathBuf, EngineError> {
    if let Some(path) = data {
        return Ok(path.to_path_buf());
    }
    let configured = config
        .get_string("simulation", "data")
        .ok_or_else(|| EngineError::ConfigMissing {
            section: "simulation".into(),
            key: "data".into(),
        })?;
    let configured = PathBuf::from(configured);
    if configured.is_absolute() {
        return Ok(configured);
    }
    Ok(config_path
        .parent()
        .map(|dir| dir.join(&configured))
        .unwrap_or(configured))
}

fn invalid_value(section: &str, key: &str, reason: impl Into<String>) -> EngineError {
    EngineError::ConfigInvalid {
        section: section.into(),
        key: key.into(),
        reason: reason.into(),
    }
}

fn read_double(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<f64>, EngineError> {
    config
        .get_double(section, key)
        .map_err(|reason| invalid_value(section, key, reason))
}

fn read_period(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: usize,
) -> Result<usize, EngineError> {
    match config
        .get_int(section, key)
        .map_err(|reason| invalid_value(section, key, reason))?
    {
        None => Ok(default),
        Some(n) => usize::try_from(n)
            .map_err(|_| invalid_value(section, key, format!("expected a period, found {}", n))),
    }
}

/// Reads `[simulation]` and `[indicators]`; absent keys take the defaults.
pub fn build_execution_params(config: &dyn ConfigPort) -> Result<ExecutionParams, EngineError> {
    let defaults = ExecutionParams::default();
    let ind = IndicatorSettings::default();

    Ok(ExecutionParams {
        initial_capital: read_double(config, "simulation", "initial_capital")?
            .unwrap_or(defaults.initial_capital),
        commission_pct: read_double(config, "simulation", "commission_pct")?
            .unwrap_or(defaults.commission_pct),
        slippage_bps: read_double(config, "simulation", "slippage_bps")?
            .unwrap_or(defaults.slippage_bps),
        max_position_pct: read_double(config, "simulation", "max_position_pct")?
            .unwrap_or(defaults.max_position_pct),
        stop_loss_pct: read_double(config, "simulation", "stop_loss_pct")?,
        take_profit_pct: read_double(config, "simulation", "take_profit_pct")?,
        trailing_stop_pct: read_double(config, "simulation", "trailing_stop_pct")?,
        indicators: IndicatorSettings {
            macd_fast: read_period(config, "indicators", "macd_fast", ind.macd_fast)?,
            macd_slow: read_period(config, "indicators", "macd_slow", ind.macd_slow)?,
            macd_signal: read_period(config, "indicators", "macd_signal", ind.macd_signal)?,
            bb_period: read_period(config, "indicators", "bb_period", ind.bb_period)?,
            bb_stddev: read_double(config, "indicators", "bb_stddev")?.unwrap_or(ind.bb_stddev),
            stoch_k: read_period(config, "indicators", "stoch_k", ind.stoch_k)?,
            stoch_d: read_period(config, "indicators", "stoch_d", ind.stoch_d)?,
        },
    })
}

pub fn build_strategy(config: &dyn ConfigPort) -> Result<Strategy, EngineError> {
    let name = config
        .get_string("strategy", "name")
        .unwrap_or_else(|| "Unnamed".to_string());
    let required = |key: &str| {
        config
            .get_string("strategy", key)
            .ok_or_else(|| EngineError::ConfigMissing {
                section: "strategy".into(),
                key: key.into(),
            })
    };
    Ok(Strategy::new(name, required("entry")?, required("exit")?))
}

fn print_summary(result: &BacktestResult, initial_capital: f64) {
    let m = &result.metrics;
    let final_equity = result.equity.last().copied().unwrap_or(initial_capital);

    eprintln!("\n=== Results ===");
    eprintln!("Final Equity:     {:.2}", final_equity);
    eprintln!("Total Return:     {:.2}%", m.total_return_pct);
    eprintln!("CAGR:             {:.2}%", m.cagr_pct);
    eprintln!("Sharpe Ratio:     {:.2}", m.sharpe_ratio);
    eprintln!("Max Drawdown:     -{:.2}%", m.max_drawdown_pct);
    eprintln!("Total Trades:     {}", m.num_trades);
    eprintln!("Win Rate:         {:.2}%", m.win_rate_pct);
    eprintln!(
        "Risk Exits:       {} stop-loss, {} take-profit, {} trailing",
        m.stop_loss_hits, m.take_profit_hits, m.trailing_stop_hits
    );

    let diag = &result.diagnostics;
    if diag.skipped_funds_count > 0 {
        eprintln!(
            "warning: {} entry signals skipped for insufficient funds",
            diag.skipped_funds_count
        );
    }
    if diag.eval_errors > 0 {
        eprintln!(
            "warning: {} evaluations failed (division by zero) and were treated as false",
            diag.eval_errors
        );
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), ExitCode> {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{}", json);
            Ok(())
        }
        Err(e) => Err(fail(&EngineError::Report {
            reason: format!("failed to serialize validation report: {}", e),
        })),
    }
}

fn print_report_errors(report: &ValidationReport) {
    for err in &report.errors {
        eprintln!("  error: {}", err);
    }
    for hint in &report.suggestions {
        eprintln!("  hint: {}", hint);
    }
    for warning in &report.warnings {
        eprintln!("  warning: {}", warning);
    }
}

fn run_validate_equation(equation: &str) -> ExitCode {
    let report = validate_equation(equation);
    print_report_errors(&report);
    if let Err(code) = print_json(&report) {
        return code;
    }
    if report.is_valid {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(4)
    }
}

#[derive(Serialize)]
struct StrategyValidation<'a> {
    name: &'a str,
    entry: ValidationReport,
    exit: ValidationReport,
}

fn run_validate_config(config_path: &Path) -> ExitCode {
    eprintln!("Validating strategy in {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let strategy = match build_strategy(&config) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };
    if let Err(e) = build_execution_params(&config)
        .and_then(|p| validate_execution_params(&p))
    {
        return fail(&e);
    }

    let validation = StrategyValidation {
        name: &strategy.name,
        entry: validate_equation(&strategy.entry),
        exit: validate_equation(&strategy.exit),
    };

    for (label, text, report) in [
        ("Entry", &strategy.entry, &validation.entry),
        ("Exit", &strategy.exit, &validation.exit),
    ] {
        eprintln!("\n{} Equation:", label);
        eprintln!("  Raw:    {}", text);
        print_report_errors(report);
    }

    if let Err(code) = print_json(&validation) {
        return code;
    }
    if validation.entry.is_valid && validation.exit.is_valid {
        eprintln!("\nStrategy configuration is valid.");
        ExitCode::SUCCESS
    } else {
        ExitCode::from(4)
    }
}
