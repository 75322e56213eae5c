//! CLI definition and dispatch.
//!
//! Each subcommand is split into an `execute_*` function returning typed
//! results, and a thin `run_*` wrapper that prints them and maps errors to an
//! exit code.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::warn;

use crate::adapters::csv_adapter::CsvMarketData;
use crate::adapters::csv_trade_store::CsvTradeStore;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::{run_backtest, BacktestConfig, BacktestResult};
use crate::domain::config_validation::{
    account_size, build_backtest_config, build_risk_config, build_scan_config, build_signal_config,
};
use crate::domain::error::TradecoreError;
use crate::domain::risk::{BlacklistReason, RiskConfig, RiskManager};
use crate::domain::scanner::{MarketScanner, ScanConfig, ScanReport};
use crate::domain::signal::{SignalConfig, SignalGenerator, SignalOutcome};
use crate::domain::strategy::BuiltinStrategy;
use crate::domain::universe::{parse_universe, Universe, UniverseEntry, DEFAULT_SECTOR};
use crate::ports::config_port::ConfigPort;
use crate::ports::trade_store_port::TradeStore;

#[derive(Parser, Debug)]
#[command(
    name = "tradecore",
    about = "Technical indicators, trade signals, backtesting and risk management"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Replay a built-in strategy over historical candles
    Backtest {
        /// Directory of <SYMBOL>.csv files
        #[arg(short, long)]
        data: PathBuf,
        /// Comma-separated symbols; defaults to every CSV in the data directory
        #[arg(long)]
        symbols: Option<String>,
        /// rsi, sma or macd
        #[arg(short, long, default_value = "rsi", value_parser = parse_strategy)]
        strategy: BuiltinStrategy,
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Write each symbol's simulated trades to this directory
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Evaluate the signal filters for each symbol
    Signal {
        #[arg(short, long)]
        data: PathBuf,
        #[arg(long)]
        symbols: Option<String>,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Screen, signal and risk-plan a symbol universe
    Scan {
        #[arg(short, long)]
        data: PathBuf,
        /// Comma-separated `SYMBOL` or `SYMBOL:sector` entries
        #[arg(long)]
        symbols: Option<String>,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Run the blacklist screen over each symbol's history
    Screen {
        #[arg(short, long)]
        data: PathBuf,
        #[arg(long)]
        symbols: Option<String>,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

fn parse_strategy(name: &str) -> Result<BuiltinStrategy, String> {
    BuiltinStrategy::from_name(name)
        .ok_or_else(|| format!("unknown strategy {name:?} (expected rsi, sma or macd)"))
}

/// Every typed configuration section, read once per command.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub account_size: f64,
    pub risk: RiskConfig,
    pub signal: SignalConfig,
    pub backtest: BacktestConfig,
    pub scan: ScanConfig,
    /// `[scan] universe`, used when no symbols are given on the command line.
    pub universe: Option<String>,
}

impl Settings {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, TradecoreError> {
        Ok(Settings {
            account_size: account_size(config)?,
            risk: build_risk_config(config)?,
            signal: build_signal_config(config)?,
            backtest: build_backtest_config(config)?,
            scan: build_scan_config(config)?,
            universe: config
                .get_string("scan", "universe")
                .filter(|u| !u.trim().is_empty()),
        })
    }

    /// Settings from `path`, or documented defaults without a file.
    pub fn load(path: Option<&Path>) -> Result<Self, TradecoreError> {
        match path {
            Some(path) => Self::from_config(&FileConfigAdapter::from_file(path)?),
            None => Self::from_config(&FileConfigAdapter::from_string("")?),
        }
    }
}

/// Symbols from the command line, then `[scan] universe`, then the data directory.
pub fn resolve_universe(
    symbols: Option<&str>,
    settings: &Settings,
    data: &CsvMarketData,
) -> Result<Universe, TradecoreError> {
    let listed = symbols.or(settings.universe.as_deref());
    let universe = match listed {
        Some(list) => parse_universe(list).map_err(|e| TradecoreError::Universe {
            reason: e.to_string(),
        })?,
        None => Universe {
            entries: data
                .list_symbols()?
                .into_iter()
                .map(|symbol| UniverseEntry {
                    symbol,
                    sector: DEFAULT_SECTOR.to_string(),
                })
                .collect(),
        },
    };
    if universe.count() == 0 {
        return Err(TradecoreError::Universe {
            reason: "no symbols to process".to_string(),
        });
    }
    Ok(universe)
}

/// Backtest each symbol. Symbols that cannot be tested are skipped with a
/// warning; if none succeed the last error is returned.
pub fn execute_backtest(
    data: &CsvMarketData,
    universe: &Universe,
    strategy: &BuiltinStrategy,
    config: &BacktestConfig,
    store: Option<&dyn TradeStore>,
) -> Result<Vec<BacktestResult>, TradecoreError> {
    let requirements = strategy.requirements();
    let mut results = Vec::new();
    let mut last_error = None;

    for symbol in universe.symbols() {
        let outcome = data
            .load(&symbol)
            .and_then(|candles| run_backtest(&symbol, &candles, strategy, &requirements, config));
        match outcome {
            Ok(result) => {
                if let Some(store) = store {
                    store.save_simulated_trades(&symbol, &result.trades)?;
                }
                results.push(result);
            }
            Err(e) => {
                warn!(symbol = %symbol, error = %e, "skipping symbol");
                last_error = Some(e);
            }
        }
    }

    match (results.is_empty(), last_error) {
        (true, Some(e)) => Err(e),
        _ => Ok(results),
    }
}

pub async fn execute_signals(
    data: CsvMarketData,
    universe: &Universe,
    config: SignalConfig,
) -> Vec<(String, Result<SignalOutcome, TradecoreError>)> {
    let generator = SignalGenerator::new(data, config);
    let mut outcomes = Vec::new();
    for symbol in universe.symbols() {
        let outcome = generator.generate(&symbol).await;
        outcomes.push((symbol, outcome));
    }
    outcomes
}

/// Screen every symbol into a fresh risk manager, then scan with it attached
/// so blacklisted symbols are rejected at planning time.
pub async fn execute_scan(
    data_dir: &Path,
    universe: &Universe,
    settings: &Settings,
) -> Result<ScanReport, TradecoreError> {
    let data = CsvMarketData::new(data_dir.to_path_buf());
    let mut manager = RiskManager::new(settings.account_size, settings.risk.clone());
    for symbol in universe.symbols() {
        match data.load(&symbol) {
            Ok(candles) => {
                manager.evaluate_blacklist(&symbol, &candles, None);
            }
            Err(e) => warn!(symbol = %symbol, error = %e, "screen skipped"),
        }
    }

    let scanner = MarketScanner::new(data, settings.signal.clone(), settings.scan.clone())
        .with_risk_manager(manager.shared());
    Ok(scanner.scan_universe(universe).await)
}

pub fn execute_screen(
    data: &CsvMarketData,
    universe: &Universe,
    settings: &Settings,
) -> Vec<(String, Result<Option<BlacklistReason>, TradecoreError>)> {
    let mut manager = RiskManager::new(settings.account_size, settings.risk.clone());
    universe
        .symbols()
        .into_iter()
        .map(|symbol| {
            let verdict = data
                .load(&symbol)
                .map(|candles| manager.evaluate_blacklist(&symbol, &candles, None));
            (symbol, verdict)
        })
        .collect()
}

pub fn run(cli: Cli) -> ExitCode {
    let outcome = match cli.command {
        Command::Backtest {
            data,
            symbols,
            strategy,
            config,
            output,
        } => run_backtest_command(&data, symbols.as_deref(), &strategy, config.as_deref(), output),
        Command::Signal {
            data,
            symbols,
            config,
        } => run_signal(&data, symbols.as_deref(), config.as_deref()),
        Command::Scan {
            data,
            symbols,
            config,
        } => run_scan(&data, symbols.as_deref(), config.as_deref()),
        Command::Screen {
            data,
            symbols,
            config,
        } => run_screen(&data, symbols.as_deref(), config.as_deref()),
        Command::Validate { config } => run_validate(&config),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn run_backtest_command(
    data_dir: &Path,
    symbols: Option<&str>,
    strategy: &BuiltinStrategy,
    config: Option<&Path>,
    output: Option<PathBuf>,
) -> Result<(), TradecoreError> {
    let settings = Settings::load(config)?;
    let data = CsvMarketData::new(data_dir.to_path_buf());
    let universe = resolve_universe(symbols, &settings, &data)?;
    let store = output.map(CsvTradeStore::new);

    eprintln!("Backtesting {} symbols with {strategy}", universe.count());
    let results = execute_backtest(
        &data,
        &universe,
        strategy,
        &settings.backtest,
        store.as_ref().map(|s| s as &dyn TradeStore),
    )?;
    for result in &results {
        println!("{}", format_backtest(result));
    }
    Ok(())
}

fn run_signal(
    data_dir: &Path,
    symbols: Option<&str>,
    config: Option<&Path>,
) -> Result<(), TradecoreError> {
    let settings = Settings::load(config)?;
    let data = CsvMarketData::new(data_dir.to_path_buf());
    let universe = resolve_universe(symbols, &settings, &data)?;

    let runtime = tokio::runtime::Runtime::new()?;
    let outcomes = runtime.block_on(execute_signals(data, &universe, settings.signal));
    for (symbol, outcome) in outcomes {
        match outcome {
            Ok(outcome) => println!("{}", format_outcome(&outcome)),
            Err(e) => println!("{symbol:<8} error: {e}"),
        }
    }
    Ok(())
}

fn run_scan(
    data_dir: &Path,
    symbols: Option<&str>,
    config: Option<&Path>,
) -> Result<(), TradecoreError> {
    let settings = Settings::load(config)?;
    let data = CsvMarketData::new(data_dir.to_path_buf());
    let universe = resolve_universe(symbols, &settings, &data)?;

    let runtime = tokio::runtime::Runtime::new()?;
    let report = runtime.block_on(execute_scan(data_dir, &universe, &settings))?;

    for result in &report.results {
        println!("{}", format_outcome(&result.outcome));
        match &result.plan {
            Some(Ok(plan)) => println!(
                "         plan: {} shares ({:.1}% of equity), stop {:.2}, target {:.2}",
                plan.size.shares,
                plan.size.fraction * 100.0,
                plan.levels.stop_loss,
                plan.levels.take_profit
            ),
            Some(Err(reason)) => println!("         risk: {reason}"),
            None => {}
        }
    }
    for failure in &report.failures {
        println!("{:<8} error: {}", failure.symbol, failure.reason);
    }
    eprintln!(
        "Scanned {}: {} signals, {} approved, {} failed",
        report.scanned(),
        report.signals().count(),
        report.approved_plans().count(),
        report.failures.len()
    );
    Ok(())
}

fn run_screen(
    data_dir: &Path,
    symbols: Option<&str>,
    config: Option<&Path>,
) -> Result<(), TradecoreError> {
    let settings = Settings::load(config)?;
    let data = CsvMarketData::new(data_dir.to_path_buf());
    let universe = resolve_universe(symbols, &settings, &data)?;

    for (symbol, verdict) in execute_screen(&data, &universe, &settings) {
        match verdict {
            Ok(None) => println!("{symbol:<8} ok"),
            Ok(Some(reason)) => println!("{symbol:<8} blacklisted: {reason}"),
            Err(e) => println!("{symbol:<8} error: {e}"),
        }
    }
    Ok(())
}

fn run_validate(config: &Path) -> Result<(), TradecoreError> {
    let settings = Settings::load(Some(config))?;
    eprintln!("Configuration is valid");
    eprintln!("  account size:       {:.2}", settings.account_size);
    eprintln!(
        "  max position size:  {:.1}%",
        settings.risk.limits.max_position_size * 100.0
    );
    eprintln!(
        "  drawdown tolerance: {:.1}%",
        settings.risk.limits.max_drawdown_tolerance * 100.0
    );
    eprintln!("  signal history:     {} bars", settings.signal.history_bars);
    eprintln!("  scan batch size:    {}", settings.scan.batch_size);
    Ok(())
}

pub fn format_backtest(result: &BacktestResult) -> String {
    format!(
        "{:<8} trades {:>3}  win rate {:>5.1}%  P&L {:>10.2}  avg win {:>8.2}  avg loss {:>8.2}",
        result.symbol,
        result.total_trades,
        result.win_rate * 100.0,
        result.total_profit_loss,
        result.average_win,
        result.average_loss
    )
}

pub fn format_outcome(outcome: &SignalOutcome) -> String {
    match outcome {
        SignalOutcome::Emitted(signal) => format!(
            "{:<8} {} @ {:.2}  stop {:.2}  target {:.2}  confidence {:.2}",
            signal.symbol,
            signal.direction,
            signal.entry_price,
            signal.stop_loss,
            signal.take_profit,
            signal.confidence
        ),
        SignalOutcome::Rejected { symbol, reason, .. } => {
            format!("{symbol:<8} no signal: {reason}")
        }
        SignalOutcome::InsufficientData {
            symbol,
            bars,
            minimum,
        } => format!("{symbol:<8} insufficient data: {bars} of {minimum} bars"),
    }
}
