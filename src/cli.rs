//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use crate::adapters::binance_adapter::BinanceAdapter;
use crate::adapters::csv_cache_adapter::CsvCacheAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::text_report_adapter::{render_summary, TextReportAdapter};
use crate::domain::candle::{AssetSpec, Timeframe};
use crate::domain::config_validation::validate_run_config;
use crate::domain::error::SignalbenchError;
use crate::domain::evaluation::{evaluate_all, EvaluationConfig};
use crate::domain::strategy::{self, SignalStrategy};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::CandleSource;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "signalbench", about = "Trading heuristic evaluation harness")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Evaluate one strategy, or every registered one
    Evaluate {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        strategy: Option<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Serve candles from the cache only; never touch the network
        #[arg(long)]
        offline: bool,
    },
    /// Fetch candles into the cache
    Fetch {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: String,
        #[arg(long, default_value = "1h")]
        timeframe: String,
    },
    /// List registered strategies
    ListStrategies,
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Evaluate {
            config,
            strategy,
            output,
            offline,
        } => run_evaluate(&config, strategy.as_deref(), output.as_ref(), offline),
        Command::Fetch {
            config,
            symbol,
            timeframe,
        } => run_fetch(&config, &symbol, &timeframe),
        Command::ListStrategies => run_list_strategies(),
        Command::Validate { config } => run_validate(&config),
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = SignalbenchError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

/// Build the evaluation window and account parameters from config, with the
/// standard defaults for anything absent.
pub fn build_evaluation_config(
    adapter: &dyn ConfigPort,
) -> Result<EvaluationConfig, SignalbenchError> {
    let defaults = EvaluationConfig::default();

    let start = match adapter.get_string("data", "start_date") {
        Some(s) => parse_date(&s, "start_date")?,
        None => defaults.start,
    };
    let end = match adapter.get_string("data", "end_date") {
        Some(s) => parse_date(&s, "end_date")?,
        None => defaults.end,
    };

    Ok(EvaluationConfig {
        initial_capital: adapter.get_double("simulation", "initial_capital", 1000.0),
        fee_rate: adapter.get_double("simulation", "fee_rate", 0.001),
        start,
        end,
    })
}

fn parse_date(s: &str, key: &str) -> Result<chrono::NaiveDateTime, SignalbenchError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map(|d| d.and_hms_opt(0, 0, 0).unwrap())
        .map_err(|_| SignalbenchError::ConfigInvalid {
            section: "data".to_string(),
            key: key.to_string(),
            reason: "invalid date format (expected YYYY-MM-DD)".to_string(),
        })
}

/// Resolve which strategies to run: the CLI override, else the configured
/// list, else the whole registry.
pub fn resolve_strategies(
    strategy_override: Option<&str>,
    config: &dyn ConfigPort,
) -> Result<Vec<Box<dyn SignalStrategy>>, SignalbenchError> {
    if let Some(name) = strategy_override {
        return Ok(vec![strategy::lookup(name)?]);
    }

    if let Some(list) = config.get_string("evaluation", "strategies") {
        let names: Vec<&str> = list
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();
        if !names.is_empty() {
            return names.iter().map(|name| strategy::lookup(name)).collect();
        }
    }

    Ok(strategy::registry())
}

fn cache_dir(config: &dyn ConfigPort) -> PathBuf {
    PathBuf::from(
        config
            .get_string("data", "cache_dir")
            .unwrap_or_else(|| "candle_data".to_string()),
    )
}

fn run_evaluate(
    config_path: &PathBuf,
    strategy_override: Option<&str>,
    output_path: Option<&PathBuf>,
    offline: bool,
) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if let Err(e) = validate_run_config(&adapter) {
        eprintln!("error: {e}");
        return (&e).into();
    }

    let eval_config = match build_evaluation_config(&adapter) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let strategies = match resolve_strategies(strategy_override, &adapter) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let cache = cache_dir(&adapter);
    let source: Box<dyn CandleSource + Sync> = if offline {
        Box::new(CsvCacheAdapter::new(cache))
    } else {
        Box::new(BinanceAdapter::new(cache))
    };

    eprintln!(
        "Evaluating {} strategies, {} to {}",
        strategies.len(),
        eval_config.start.date(),
        eval_config.end.date(),
    );

    let reports = evaluate_all(&strategies, source.as_ref(), &eval_config);

    for report in &reports {
        eprintln!();
        eprint!("{}", render_summary(report));
    }

    let failed = reports.iter().filter(|r| !r.is_completed()).count();
    eprintln!();
    eprintln!(
        "{} of {} runs completed",
        reports.len() - failed,
        reports.len()
    );

    let output = output_path
        .cloned()
        .or_else(|| adapter.get_string("report", "output_dir").map(PathBuf::from));
    if let Some(dir) = output {
        if let Err(e) = TextReportAdapter.write(&reports, &dir) {
            eprintln!("error: failed to write reports: {e}");
            return (&e).into();
        }
        eprintln!("Reports written to: {}", dir.display());
    }

    if failed == reports.len() && !reports.is_empty() {
        return ExitCode::from(5);
    }
    ExitCode::SUCCESS
}

fn run_fetch(config_path: &PathBuf, symbol: &str, timeframe: &str) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let Some(timeframe) = Timeframe::parse(timeframe) else {
        eprintln!("error: unknown timeframe {timeframe} (expected 1h, 4h or 1d)");
        return ExitCode::from(2);
    };

    let eval_config = match build_evaluation_config(&adapter) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let spec = AssetSpec::new(symbol, timeframe);
    let binance = BinanceAdapter::new(cache_dir(&adapter));

    eprintln!(
        "Fetching {} {} from {} to {}",
        spec.symbol,
        spec.timeframe,
        eval_config.start.date(),
        eval_config.end.date(),
    );

    match binance.refresh(&spec, eval_config.start, eval_config.end) {
        Ok(candles) => {
            eprintln!("Cached {} candles", candles.len());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn run_list_strategies() -> ExitCode {
    for strategy in strategy::registry() {
        let meta = strategy.metadata();
        let anchors: Vec<String> = meta
            .anchors
            .iter()
            .map(|a| format!("{} {}", a.symbol, a.timeframe))
            .collect();
        println!(
            "{}: target {} {}, anchors {}",
            strategy.name(),
            meta.target.symbol,
            meta.target.timeframe,
            anchors.join(", "),
        );
    }
    ExitCode::SUCCESS
}

fn run_validate(config_path: &PathBuf) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if let Err(e) = validate_run_config(&adapter) {
        eprintln!("error: {e}");
        return (&e).into();
    }

    let eval_config = match build_evaluation_config(&adapter) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let strategies = match resolve_strategies(None, &adapter) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    eprintln!(
        "Config is valid: {} strategies, {} to {}, capital {:.2}, fee {:.4}",
        strategies.len(),
        eval_config.start.date(),
        eval_config.end.date(),
        eval_config.initial_capital,
        eval_config.fee_rate,
    );
    ExitCode::SUCCESS
}
