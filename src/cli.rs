//! CLI definition and dispatch.

use chrono::Local;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::thread;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::adapters::csv_adapter::CsvPriceSource;
use crate::adapters::csv_journal_adapter::CsvSignalJournal;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::sim_executor::SimulatedExecutor;
use crate::adapters::synthetic_adapter::SyntheticPriceSource;
use crate::domain::config::{DataSource, TraderConfig, build_trader_config};
use crate::domain::config_validation::validate_trader_config;
use crate::domain::decision::{CycleOutcome, DayTracker, DecisionLoop};
use crate::domain::error::TraderError;
use crate::domain::risk::{RiskManager, RiskState};
use crate::domain::strategy;
use crate::ports::metrics_port::MetricsSink;
use crate::ports::order_port::OrderExecutor;
use crate::ports::price_port::PriceSource;

#[derive(Parser, Debug)]
#[command(name = "argoth", about = "Risk-gated EMA/oscillator trading loop")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run decision cycles against the configured price source and executor
    Run {
        #[arg(short, long)]
        config: PathBuf,
        /// Stop after this many cycles (overrides [loop] max_cycles)
        #[arg(long)]
        max_cycles: Option<u64>,
    },
    /// Validate a config file and print the resolved risk parameters
    Check {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Print the lot size the risk manager would use at a given price
    Lot {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        price: f64,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Run { config, max_cycles } => run_trader(&config, max_cycles),
        Command::Check { config } => run_check(&config),
        Command::Lot { config, price } => run_lot(&config, price),
    }
}

fn fail(err: TraderError) -> ExitCode {
    eprintln!("error: {err}");
    (&err).into()
}

/// Reads, builds and validates the typed configuration.
pub fn load_config(path: &PathBuf) -> Result<TraderConfig, TraderError> {
    let adapter = FileConfigAdapter::from_file(path)?;
    let config = build_trader_config(&adapter)?;
    validate_trader_config(&config)?;
    Ok(config)
}

fn build_price_source(config: &TraderConfig) -> Box<dyn PriceSource> {
    match &config.data.source {
        DataSource::Synthetic => Box::new(SyntheticPriceSource::new(config.data.seed)),
        DataSource::Csv { dir } => Box::new(CsvPriceSource::new(dir.clone())),
    }
}

#[cfg(feature = "sqlite")]
fn build_metrics_sink(config: &TraderConfig) -> Result<Option<Box<dyn MetricsSink>>, TraderError> {
    use crate::adapters::sqlite_adapter::SqliteMetricsSink;

    match &config.metrics_sqlite_path {
        Some(path) => Ok(Some(Box::new(SqliteMetricsSink::open(path)?))),
        None => Ok(None),
    }
}

#[cfg(not(feature = "sqlite"))]
fn build_metrics_sink(config: &TraderConfig) -> Result<Option<Box<dyn MetricsSink>>, TraderError> {
    if config.metrics_sqlite_path.is_some() {
        warn!("[metrics] sqlite_path is set but the sqlite feature is disabled");
    }
    Ok(None)
}

/// Risk manager seeded from the executor's live balance when asked for and
/// available, otherwise from the configured capital.
pub fn bootstrap_risk(config: &TraderConfig, executor: &dyn OrderExecutor) -> RiskManager {
    if !config.use_broker_balance {
        return RiskManager::new(&config.risk);
    }
    match executor.account_balance() {
        Ok(Some(balance)) if balance > 0.0 => {
            info!(balance, "using broker balance as initial capital");
            RiskManager::with_initial_capital(&config.risk, balance)
        }
        Ok(_) => {
            warn!("broker reported no usable balance, using configured capital");
            RiskManager::new(&config.risk)
        }
        Err(e) => {
            warn!(error = %e, "balance lookup failed, using configured capital");
            RiskManager::new(&config.risk)
        }
    }
}

/// Wires the configured collaborators into a ready decision loop.
pub fn build_decision_loop(config: &TraderConfig) -> Result<DecisionLoop, TraderError> {
    let strategy = strategy::from_config(&config.strategy)?;
    let executor = SimulatedExecutor::new(&config.execution);
    let risk = bootstrap_risk(config, &executor);

    let mut decision_loop = DecisionLoop::new(
        config,
        strategy,
        risk,
        build_price_source(config),
        Box::new(executor),
    );
    if let Some(sink) = build_metrics_sink(config)? {
        decision_loop = decision_loop.with_metrics(sink);
    }
    if let Some(path) = &config.journal_path {
        decision_loop = decision_loop.with_journal(Box::new(CsvSignalJournal::new(path.clone())));
    }
    Ok(decision_loop)
}

#[derive(Debug, Default)]
struct RunTally {
    cycles: u64,
    held: u64,
    blocked: u64,
    rejected: u64,
    executed: u64,
    failed: u64,
    last_failure: Option<ExitCode>,
}

impl RunTally {
    fn count(&mut self, result: &Result<CycleOutcome, TraderError>) {
        self.cycles += 1;
        match result {
            Ok(CycleOutcome::Hold { .. }) => self.held += 1,
            Ok(CycleOutcome::Blocked { .. }) => self.blocked += 1,
            Ok(CycleOutcome::Rejected { .. }) => self.rejected += 1,
            Ok(CycleOutcome::Executed { .. }) => self.executed += 1,
            Err(e) => {
                self.failed += 1;
                self.last_failure = Some(e.into());
            }
        }
    }

    /// Success unless every cycle aborted, in which case the last error decides.
    fn exit_code(&self) -> ExitCode {
        match self.last_failure {
            Some(code) if self.failed == self.cycles => code,
            _ => ExitCode::SUCCESS,
        }
    }
}

fn run_trader(config_path: &PathBuf, max_cycles_override: Option<u64>) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(e) => return fail(e),
    };

    let mut decision_loop = match build_decision_loop(&config) {
        Ok(l) => l,
        Err(e) => return fail(e),
    };
    print_risk_summary(&config, &decision_loop.risk().snapshot());

    let max_cycles = max_cycles_override.or(config.run_loop.max_cycles);
    let interval = Duration::from_secs(config.run_loop.interval_seconds);
    let mut days = DayTracker::new();
    let mut tally = RunTally::default();

    info!(
        symbol = %config.symbol,
        strategy = decision_loop.strategy_name(),
        interval_seconds = config.run_loop.interval_seconds,
        "starting decision loop"
    );

    loop {
        if days.roll(Local::now().date_naive()) {
            info!("new trading day, resetting daily P&L");
            decision_loop.reset_daily();
        }

        let result = decision_loop.run_cycle();
        tally.count(&result);
        match &result {
            Ok(outcome) => eprintln!(
                "[{}] cycle {}: {} | capital {:.2}",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                tally.cycles,
                outcome.label(),
                decision_loop.risk().capital()
            ),
            Err(e) => error!(cycle = tally.cycles, error = %e, "cycle aborted"),
        }

        if max_cycles.is_some_and(|max| tally.cycles >= max) {
            break;
        }
        thread::sleep(interval);
    }

    let risk = decision_loop.risk();
    eprintln!("\nRun complete");
    eprintln!("  Cycles:    {}", tally.cycles);
    eprintln!("  Executed:  {}", tally.executed);
    eprintln!("  Blocked:   {}", tally.blocked);
    eprintln!("  Rejected:  {}", tally.rejected);
    eprintln!("  Held:      {}", tally.held);
    eprintln!("  Failed:    {}", tally.failed);
    eprintln!("  Capital:   {:.2}", risk.capital());
    eprintln!("  Peak:      {:.2}", risk.equity_high());
    eprintln!("  Drawdown:  {:.2}%", risk.snapshot().drawdown() * 100.0);
    tally.exit_code()
}

fn print_risk_summary(config: &TraderConfig, state: &RiskState) {
    eprintln!("\nRisk parameters ({}):", config.symbol);
    for (key, value) in state.to_map() {
        eprintln!("  {:<16} {}", key, value);
    }
    let pips = |v: Option<f64>| v.map_or_else(|| "none".to_string(), |v| v.to_string());
    eprintln!("  {:<16} {}", "stop_loss_pips", pips(config.risk.stop_loss_pips));
    eprintln!("  {:<16} {}", "pip_value", pips(config.risk.pip_value));
    eprintln!(
        "  {:<16} {}",
        "adaptive",
        if config.risk.adaptive { "on" } else { "off" }
    );
    eprintln!(
        "\nStrategy: {} (EMA {}/{}, oscillator {}, buy > {}, sell < {})",
        config.strategy.name,
        config.strategy.ema_fast,
        config.strategy.ema_slow,
        config.strategy.oscillator_period,
        config.strategy.thresholds.buy,
        config.strategy.thresholds.sell
    );
}

fn run_check(config_path: &PathBuf) -> ExitCode {
    eprintln!("Checking config {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(e) => return fail(e),
    };
    if let Err(e) = strategy::from_config(&config.strategy) {
        eprintln!("available strategies: {}", strategy::available().join(", "));
        return fail(e);
    }

    print_risk_summary(&config, &RiskManager::new(&config.risk).snapshot());
    match metrics_history(&config, 5) {
        Ok(Some(history)) => print_metrics_history(&history),
        Ok(None) => {}
        Err(e) => warn!(error = %e, "could not read metrics history"),
    }
    eprintln!("\nConfig OK");
    ExitCode::SUCCESS
}

/// Rows recorded by earlier runs, newest first.
#[derive(Debug, PartialEq)]
pub struct MetricsHistory {
    pub path: PathBuf,
    pub total: usize,
    /// `(capital, equity_high, daily_pnl)`
    pub recent: Vec<(f64, f64, f64)>,
}

/// Reads the configured metrics database without creating it.
#[cfg(feature = "sqlite")]
pub fn metrics_history(
    config: &TraderConfig,
    limit: usize,
) -> Result<Option<MetricsHistory>, TraderError> {
    use crate::adapters::sqlite_adapter::SqliteMetricsSink;

    let Some(path) = config.metrics_sqlite_path.as_ref().filter(|p| p.exists()) else {
        return Ok(None);
    };
    let sink = SqliteMetricsSink::open(path)?;
    Ok(Some(MetricsHistory {
        path: path.clone(),
        total: sink.count()?,
        recent: sink.recent(limit)?,
    }))
}

#[cfg(not(feature = "sqlite"))]
pub fn metrics_history(
    _config: &TraderConfig,
    _limit: usize,
) -> Result<Option<MetricsHistory>, TraderError> {
    Ok(None)
}

fn print_metrics_history(history: &MetricsHistory) {
    eprintln!(
        "\nMetrics history: {} rows in {}",
        history.total,
        history.path.display()
    );
    for (capital, equity_high, daily_pnl) in &history.recent {
        eprintln!(
            "  capital {:>12.2} | peak {:>12.2} | daily {:>10.2}",
            capital, equity_high, daily_pnl
        );
    }
}

fn run_lot(config_path: &PathBuf, price: f64) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(e) => return fail(e),
    };
    let risk = RiskManager::new(&config.risk);
    match risk.calculate_lot_size(price, config.risk.stop_loss_pips, config.risk.pip_value) {
        Ok(lot) => {
            println!("{lot:.4}");
            ExitCode::SUCCESS
        }
        Err(e) => fail(e),
    }
}
