//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::alpha::{FactorKind, FactorSettings};
use crate::domain::backtest::{run_backtest, BacktestConfig};
use crate::domain::benchmark::BenchmarkSeries;
use crate::domain::calendar::{business_days_before, TradeRange};
use crate::domain::config_validation::{
    enabled_alphas, factor_settings, parse_date, staleness_window, validate_backtest_config,
};
use crate::domain::error::AlphatraderError;
use crate::domain::instrument::{InstrumentSeries, MarketData};
use crate::domain::metrics::RunReport;
use crate::domain::strategy::{strategy_batch, Strategy};
use crate::domain::universe::{load_universe, parse_codes};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_OUTPUT: &str = "report";

#[derive(Parser, Debug)]
#[command(name = "alphatrader", about = "Cross-sectional alpha backtester")]
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
        /// Output path stem for report files
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        code: Option<String>,
        #[arg(long)]
        exchange: Option<String>,
        #[arg(long)]
        dry_run: bool,
    },
    /// List available symbols on an exchange
    ListSymbols {
        #[arg(long)]
        exchange: String,
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show data range for symbol(s)
    Info {
        #[arg(long)]
        code: Option<String>,
        #[arg(long)]
        exchange: Option<String>,
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            output,
            code,
            exchange,
            dry_run,
        } => {
            if dry_run {
                run_dry_run(&config)
            } else {
                run_backtest_command(&config, output.as_ref(), code.as_deref(), exchange.as_deref())
            }
        }
        Command::ListSymbols { exchange, config } => run_list_symbols(&exchange, &config),
        Command::Validate { config } => run_validate(&config),
        Command::Info {
            code,
            exchange,
            config,
        } => run_info(code.as_deref(), exchange.as_deref(), &config),
    }
}

fn fail(err: AlphatraderError) -> ExitCode {
    eprintln!("error: {err}");
    (&err).into()
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(fail)
}

/// Everything a backtest run needs, resolved from config and overrides.
#[derive(Debug, Clone)]
pub struct BacktestPlan {
    pub config: BacktestConfig,
    pub codes: Vec<String>,
    pub exchange: String,
    pub benchmark: Option<String>,
    pub alphas: Vec<FactorKind>,
    pub run_individual: bool,
    pub settings: FactorSettings,
}

impl BacktestPlan {
    pub fn strategies(&self) -> Vec<Strategy> {
        strategy_batch(&self.alphas, self.run_individual)
    }

    fn needs_benchmark(&self) -> bool {
        self.alphas.contains(&FactorKind::Regime)
    }
}

pub fn build_backtest_config(adapter: &dyn ConfigPort) -> Result<BacktestConfig, AlphatraderError> {
    Ok(BacktestConfig {
        start_date: parse_date(adapter, "start_date")?,
        end_date: parse_date(adapter, "end_date")?,
        initial_capital: adapter.get_double("backtest", "initial_capital", 100_000.0),
        staleness_window: staleness_window(adapter)?,
    })
}

pub fn build_plan(
    adapter: &dyn ConfigPort,
    code_override: Option<&str>,
    exchange_override: Option<&str>,
) -> Result<BacktestPlan, AlphatraderError> {
    let codes = resolve_codes(code_override, adapter)?;
    if codes.is_empty() {
        return Err(AlphatraderError::missing("backtest", "code"));
    }

    let exchange = resolve_exchange(exchange_override, adapter)?;

    Ok(BacktestPlan {
        config: build_backtest_config(adapter)?,
        codes,
        exchange,
        benchmark: adapter
            .get_string("backtest", "benchmark")
            .map(|b| b.trim().to_uppercase())
            .filter(|b| !b.is_empty()),
        alphas: enabled_alphas(adapter)?,
        run_individual: adapter.get_bool("alphas", "run_individual", true),
        settings: factor_settings(adapter)?,
    })
}

fn data_adapter(config: &dyn ConfigPort) -> CsvAdapter {
    let dir = config
        .get_string("data", "directory")
        .unwrap_or_else(|| DEFAULT_DATA_DIR.to_string());
    CsvAdapter::new(PathBuf::from(dir))
}

fn run_backtest_command(
    config_path: &Path,
    output_path: Option<&PathBuf>,
    code_override: Option<&str>,
    exchange_override: Option<&str>,
) -> ExitCode {
    // Stage 1: Load and validate config
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    if let Err(e) = validate_backtest_config(&adapter) {
        return fail(e);
    }

    // Stage 2: Resolve plan
    let plan = match build_plan(&adapter, code_override, exchange_override) {
        Ok(p) => p,
        Err(e) => return fail(e),
    };
    let output = output_path
        .map(|p| p.display().to_string())
        .or_else(|| adapter.get_string("report", "output"))
        .unwrap_or_else(|| DEFAULT_OUTPUT.to_string());

    eprintln!(
        "Backtesting {} codes on {} with alphas: {}",
        plan.codes.len(),
        plan.exchange,
        alpha_names(&plan.alphas)
    );

    // Stages 3-6: data, simulation, statistics, reports
    let data_port = data_adapter(&adapter);
    let reports = match run_backtest_pipeline(&data_port, &plan) {
        Ok(r) => r,
        Err(e) => return fail(e),
    };

    print_summary(&reports);

    match CsvReportAdapter::new().write_all(&reports, &output) {
        Ok(()) => {
            eprintln!("\nReports written to: {}_*.csv", output);
            ExitCode::SUCCESS
        }
        Err(e) => fail(e),
    }
}

/// Loads the universe and aligns every code onto the business-day range.
pub fn build_market_data(
    data_port: &dyn DataPort,
    plan: &BacktestPlan,
) -> Result<MarketData, AlphatraderError> {
    let config = &plan.config;
    let loaded = load_universe(
        data_port,
        plan.codes.clone(),
        &plan.exchange,
        config.start_date,
        config.end_date,
    )?;

    let range = TradeRange::business_days(config.start_date, config.end_date);
    if range.is_empty() {
        return Err(AlphatraderError::EmptyUniverse {
            reason: format!("no business days between {} and {}", config.start_date, config.end_date),
        });
    }

    let instruments = loaded
        .bars
        .into_iter()
        .map(|(code, bars)| {
            InstrumentSeries::align(&code, &plan.exchange, bars, &range, config.staleness_window)
        })
        .collect();

    Ok(MarketData::new(range, instruments))
}

/// Benchmark series when one is configured. Failing to load it is fatal
/// only when an enabled alpha depends on it.
///
/// History before the start date is fetched so the moving average is warm on
/// the first trade date when the data goes back far enough.
pub fn load_benchmark(
    data_port: &dyn DataPort,
    plan: &BacktestPlan,
) -> Result<Option<BenchmarkSeries>, AlphatraderError> {
    let Some(code) = plan.benchmark.as_deref() else {
        return Ok(None);
    };

    let period = plan.settings.regime_trend_period;
    // the extra tenth covers exchange holidays missing from the data
    let fetch_start = business_days_before(plan.config.start_date, period + period / 10);

    let bars = data_port
        .fetch_ohlcv(code, &plan.exchange, fetch_start, plan.config.end_date)
        .and_then(|bars| {
            if bars.is_empty() {
                Err(AlphatraderError::NoData {
                    code: code.to_string(),
                    exchange: plan.exchange.clone(),
                })
            } else {
                Ok(bars)
            }
        });

    match bars {
        Ok(bars) => {
            log::info!("benchmark {}: {} bars", code, bars.len());
            Ok(Some(BenchmarkSeries::from_bars(
                code,
                bars,
                plan.settings.regime_trend_period,
            )))
        }
        Err(e) if plan.needs_benchmark() => Err(e),
        Err(e) => {
            log::warn!("benchmark {} unavailable ({}), not needed by enabled alphas", code, e);
            Ok(None)
        }
    }
}

/// Runs every strategy of the plan over one shared market snapshot.
pub fn run_backtest_pipeline(
    data_port: &dyn DataPort,
    plan: &BacktestPlan,
) -> Result<Vec<RunReport>, AlphatraderError> {
    let data = build_market_data(data_port, plan)?;
    let benchmark = load_benchmark(data_port, plan)?;

    eprintln!(
        "Running backtest: {} codes, {} to {}, {} dates",
        data.instruments.len(),
        plan.config.start_date,
        plan.config.end_date,
        data.len()
    );

    let mut reports = Vec::new();
    for strategy in plan.strategies() {
        let factors = strategy.build_factors(&plan.settings, benchmark.as_ref())?;
        let result = run_backtest(&strategy.name, &data, factors, &plan.config);
        reports.push(RunReport::from_equity_curve(
            &result.strategy,
            &result.portfolio.equity_curve,
        ));
    }
    Ok(reports)
}

fn print_summary(reports: &[RunReport]) {
    for report in reports {
        eprintln!("\n=== {} ===", report.strategy());
        match report {
            RunReport::Completed {
                final_equity,
                statistics,
                ..
            } => {
                eprintln!("{:<28}{:.2}", "Final Equity:", final_equity);
                for (key, value) in statistics {
                    eprintln!("{:<28}{:.2}", format!("{}:", key), value);
                }
            }
            RunReport::Failed { error, .. } => {
                eprintln!("failed: {}", error);
            }
        }
    }
}

fn alpha_names(alphas: &[FactorKind]) -> String {
    alphas
        .iter()
        .map(|a| a.name())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Validates the config and prints what a backtest would run.
fn describe_config(adapter: &dyn ConfigPort) -> Result<(), AlphatraderError> {
    validate_backtest_config(adapter)?;
    let plan = build_plan(adapter, None, None)?;

    eprintln!("Config validated successfully");
    eprintln!("\nAlphas:");
    for alpha in &plan.alphas {
        eprintln!("  {}", alpha);
    }
    eprintln!("\nStrategies:");
    for strategy in plan.strategies() {
        eprintln!("  {} ({})", strategy.name, alpha_names(&strategy.alphas));
    }
    eprintln!("\nUniverse:");
    eprintln!("  exchange: {}", plan.exchange);
    eprintln!("  codes: {}", plan.codes.join(", "));
    if let Some(benchmark) = &plan.benchmark {
        eprintln!("  benchmark: {}", benchmark);
    }
    eprintln!(
        "\nPeriod: {} to {}, initial capital {:.2}",
        plan.config.start_date, plan.config.end_date, plan.config.initial_capital
    );
    Ok(())
}

pub fn run_dry_run(config_path: &Path) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    if let Err(e) = describe_config(&adapter) {
        return fail(e);
    }
    eprintln!("\nDry run complete: configuration is valid");
    ExitCode::SUCCESS
}

fn run_validate(config_path: &Path) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    if let Err(e) = describe_config(&adapter) {
        return fail(e);
    }
    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}

fn run_list_symbols(exchange: &str, config_path: &Path) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let symbols = match data_adapter(&config).list_symbols(exchange) {
        Ok(s) => s,
        Err(e) => return fail(e),
    };

    if symbols.is_empty() {
        eprintln!("No symbols found for exchange {}", exchange);
    } else {
        for symbol in &symbols {
            println!("{}", symbol);
        }
        eprintln!("{} symbols found", symbols.len());
    }
    ExitCode::SUCCESS
}

fn run_info(code: Option<&str>, exchange: Option<&str>, config_path: &Path) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let codes = match resolve_codes(code, &config) {
        Ok(c) => c,
        Err(e) => return fail(e),
    };
    let exchange = match resolve_exchange(exchange, &config) {
        Ok(e) => e,
        Err(e) => return fail(e),
    };

    let adapter = data_adapter(&config);
    for c in &codes {
        match adapter.get_data_range(c, &exchange) {
            Ok(Some((min_date, max_date, count))) => {
                println!(
                    "{}.{}: {} bars, {} to {}",
                    c, exchange, count, min_date, max_date
                );
            }
            Ok(None) => {
                eprintln!("{}.{}: no data found", c, exchange);
            }
            Err(e) => {
                eprintln!("error querying {}.{}: {}", c, exchange, e);
            }
        }
    }
    ExitCode::SUCCESS
}

/// The `--code` override, else `[backtest] codes`, else `[backtest] code`.
pub fn resolve_codes(
    code_override: Option<&str>,
    config: &dyn ConfigPort,
) -> Result<Vec<String>, AlphatraderError> {
    if let Some(c) = code_override {
        return Ok(vec![c.trim().to_uppercase()]);
    }

    let (key, value) = match config.get_string("backtest", "codes") {
        Some(codes) => ("codes", codes),
        None => match config.get_string("backtest", "code") {
            Some(code) => ("code", code),
            None => return Ok(Vec::new()),
        },
    };

    parse_codes(&value).map_err(|e| AlphatraderError::invalid("backtest", key, e.to_string()))
}

pub fn resolve_exchange(
    exchange_override: Option<&str>,
    config: &dyn ConfigPort,
) -> Result<String, AlphatraderError> {
    exchange_override
        .map(str::to_string)
        .or_else(|| config.get_string("backtest", "exchange"))
        .map(|e| e.trim().to_string())
        .filter(|e| !e.is_empty())
        .ok_or_else(|| AlphatraderError::missing("backtest", "exchange"))
}
