//! Typed trader configuration.
//!
//! Built once from a [`ConfigPort`] at startup and handed to each component's
//! constructor by reference. Every key has a default.

use std::path::PathBuf;

use crate::domain::error::TraderError;
use crate::domain::signal::SignalThresholds;
use crate::ports::config_port::ConfigPort;

#[derive(Debug, Clone, PartialEq)]
pub struct RiskConfig {
    pub capital: f64,
    pub risk_per_trade: f64,
    pub min_lot: f64,
    pub max_lot: f64,
    pub max_daily_loss: f64,
    pub max_drawdown: f64,
    pub stop_loss_pips: Option<f64>,
    pub pip_value: Option<f64>,
    pub volatility_threshold: f64,
    pub volatility_period: usize,
    pub adaptive: bool,
}

impl Default for RiskConfig {
    fn default() -> Self {
        RiskConfig {
            capital: 1000.0,
            risk_per_trade: 0.01,
            min_lot: 0.01,
            max_lot: 10.0,
            max_daily_loss: 0.05,
            max_drawdown: 0.20,
            stop_loss_pips: Some(50.0),
            pip_value: Some(10.0),
            volatility_threshold: 0.01,
            volatility_period: 14,
            adaptive: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StrategyConfig {
    pub name: String,
    pub ema_fast: usize,
    pub ema_slow: usize,
    pub oscillator_period: usize,
    pub thresholds: SignalThresholds,
    /// Take-profit distance as a fraction of entry price.
    pub take_profit: f64,
    /// Stop-loss distance as a fraction of entry price.
    pub stop_loss: f64,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        StrategyConfig {
            name: "ema_rsi".to_string(),
            ema_fast: 50,
            ema_slow: 200,
            oscillator_period: 14,
            thresholds: SignalThresholds::default(),
            take_profit: 0.01,
            stop_loss: 0.01,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DataSource {
    Synthetic,
    Csv { dir: PathBuf },
}

#[derive(Debug, Clone, PartialEq)]
pub struct DataConfig {
    pub source: DataSource,
    pub bar_count: usize,
    pub seed: Option<u64>,
}

impl Default for DataConfig {
    fn default() -> Self {
        DataConfig {
            source: DataSource::Synthetic,
            bar_count: 500,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionConfig {
    pub win_rate: f64,
    pub contract_size: f64,
    pub seed: Option<u64>,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        ExecutionConfig {
            win_rate: 0.5,
            contract_size: 100_000.0,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoopConfig {
    pub interval_seconds: u64,
    /// `None` runs until stopped.
    pub max_cycles: Option<u64>,
}

impl Default for LoopConfig {
    fn default() -> Self {
        LoopConfig {
            interval_seconds: 10,
            max_cycles: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TraderConfig {
    pub symbol: String,
    pub use_broker_balance: bool,
    pub risk: RiskConfig,
    pub strategy: StrategyConfig,
    pub data: DataConfig,
    pub execution: ExecutionConfig,
    pub run_loop: LoopConfig,
    pub journal_path: Option<PathBuf>,
    pub metrics_sqlite_path: Option<PathBuf>,
}

impl Default for TraderConfig {
    fn default() -> Self {
        TraderConfig {
            symbol: "EURUSD".to_string(),
            use_broker_balance: false,
            risk: RiskConfig::default(),
            strategy: StrategyConfig::default(),
            data: DataConfig::default(),
            execution: ExecutionConfig::default(),
            run_loop: LoopConfig::default(),
            journal_path: None,
            metrics_sqlite_path: None,
        }
    }
}

pub fn build_trader_config(config: &dyn ConfigPort) -> Result<TraderConfig, TraderError> {
    let defaults = TraderConfig::default();

    let symbol = config
        .get_string("account", "symbol")
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .unwrap_or(defaults.symbol);

    let risk_defaults = defaults.risk;
    let risk = RiskConfig {
        capital: double(config, "account", "capital", risk_defaults.capital)?,
        risk_per_trade: double(
            config,
            "risk",
            "risk_per_trade",
            risk_defaults.risk_per_trade,
        )?,
        min_lot: double(config, "risk", "min_lot", risk_defaults.min_lot)?,
        max_lot: double(config, "risk", "max_lot", risk_defaults.max_lot)?,
        max_daily_loss: double(
            config,
            "risk",
            "max_daily_loss",
            risk_defaults.max_daily_loss,
        )?,
        max_drawdown: double(config, "risk", "max_drawdown", risk_defaults.max_drawdown)?,
        stop_loss_pips: optional_double(
            config,
            "risk",
            "stop_loss_pips",
            risk_defaults.stop_loss_pips,
        )?,
        pip_value: optional_double(config, "risk", "pip_value", risk_defaults.pip_value)?,
        volatility_threshold: double(
            config,
            "risk",
            "volatility_threshold",
            risk_defaults.volatility_threshold,
        )?,
        volatility_period: count(
            config,
            "risk",
            "volatility_period",
            risk_defaults.volatility_period,
        )?,
        adaptive: config.get_bool("risk", "adaptive", risk_defaults.adaptive),
    };

    let strategy_defaults = defaults.strategy;
    let strategy = StrategyConfig {
        name: config
            .get_string("strategy", "name")
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .unwrap_or(strategy_defaults.name),
        ema_fast: count(config, "strategy", "ema_fast", strategy_defaults.ema_fast)?,
        ema_slow: count(config, "strategy", "ema_slow", strategy_defaults.ema_slow)?,
        oscillator_period: count(
            config,
            "strategy",
            "oscillator_period",
            strategy_defaults.oscillator_period,
        )?,
        thresholds: SignalThresholds {
            buy: double(
                config,
                "strategy",
                "buy_threshold",
                strategy_defaults.thresholds.buy,
            )?,
            sell: double(
                config,
                "strategy",
                "sell_threshold",
                strategy_defaults.thresholds.sell,
            )?,
        },
        take_profit: double(config, "strategy", "take_profit", strategy_defaults.take_profit)?,
        stop_loss: double(config, "strategy", "stop_loss", strategy_defaults.stop_loss)?,
    };

    let data = DataConfig {
        source: data_source(config)?,
        bar_count: count(config, "data", "bar_count", defaults.data.bar_count)?,
        seed: seed(config, "data")?,
    };

    let execution = ExecutionConfig {
        win_rate: double(config, "execution", "win_rate", defaults.execution.win_rate)?,
        contract_size: double(
            config,
            "execution",
            "contract_size",
            defaults.execution.contract_size,
        )?,
        seed: seed(config, "execution")?,
    };

    let max_cycles = count(config, "loop", "max_cycles", 0)? as u64;
    let run_loop = LoopConfig {
        interval_seconds: count(
            config,
            "loop",
            "interval_seconds",
            defaults.run_loop.interval_seconds as usize,
        )? as u64,
        max_cycles: (max_cycles > 0).then_some(max_cycles),
    };

    Ok(TraderConfig {
        symbol,
        use_broker_balance: config.get_bool("account", "use_broker_balance", false),
        risk,
        strategy,
        data,
        execution,
        run_loop,
        journal_path: path(config, "journal", "path"),
        metrics_sqlite_path: path(config, "metrics", "sqlite_path"),
    })
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> TraderError {
    TraderError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

/// Non-negative integer; rejects negatives and non-numeric text instead of
/// silently falling back to the default.
fn count(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: usize,
) -> Result<usize, TraderError> {
    match config.get_string(section, key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<usize>()
            .map_err(|_| invalid(section, key, "expected a non-negative integer")),
    }
}

fn double(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: f64,
) -> Result<f64, TraderError> {
    match config.get_string(section, key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<f64>()
            .map_err(|_| invalid(section, key, "expected a number")),
    }
}

/// A float that may be switched off with `none` or an empty value.
fn optional_double(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: Option<f64>,
) -> Result<Option<f64>, TraderError> {
    match config.get_string(section, key) {
        None => Ok(default),
        Some(raw) => {
            let raw = raw.trim();
            if raw.is_empty() || raw.eq_ignore_ascii_case("none") {
                return Ok(None);
            }
            raw.parse::<f64>()
                .map(Some)
                .map_err(|_| invalid(section, key, "expected a number or 'none'"))
        }
    }
}

fn seed(config: &dyn ConfigPort, section: &str) -> Result<Option<u64>, TraderError> {
    match config.get_string(section, "seed") {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|_| invalid(section, "seed", "expected an unsigned integer")),
    }
}

fn path(config: &dyn ConfigPort, section: &str, key: &str) -> Option<PathBuf> {
    config
        .get_string(section, key)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
}

fn data_source(config: &dyn ConfigPort) -> Result<DataSource, TraderError> {
    let source = config
        .get_string("data", "source")
        .map(|s| s.trim().to_lowercase())
        .unwrap_or_else(|| "synthetic".to_string());

    match source.as_str() {
        "synthetic" | "sim" => Ok(DataSource::Synthetic),
        "csv" => {
            let dir = path(config, "data", "csv_dir").ok_or_else(|| TraderError::ConfigMissing {
                section: "data".to_string(),
                key: "csv_dir".to_string(),
            })?;
            Ok(DataSource::Csv { dir })
        }
        other => Err(invalid(
            "data",
            "source",
            format!("unknown source '{}' (expected synthetic or csv)", other),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    fn build(content: &str) -> Result<TraderConfig, TraderError> {
        build_trader_config(&FileConfigAdapter::from_string(content).unwrap())
    }

    #[test]
    fn empty_file_yields_defaults() {
        let config = build("").unwrap();
        assert_eq!(config, TraderConfig::default());
        assert_eq!(config.strategy.ema_fast, 50);
        assert_eq!(config.strategy.ema_slow, 200);
        assert_eq!(config.strategy.oscillator_period, 14);
        assert_eq!(config.risk.stop_loss_pips, Some(50.0));
    }

    #[test]
    fn reads_all_sections() {
        let config = build(
            r#"
[account]
symbol = gbpusd
capital = 5000

[risk]
risk_per_trade = 0.02
max_lot = 5
stop_loss_pips = none

[strategy]
ema_fast = 12
ema_slow = 26
buy_threshold = 60

[data]
source = csv
csv_dir = /tmp/prices
bar_count = 300
seed = 7

[loop]
interval_seconds = 60
max_cycles = 3

[journal]
path = signals.csv
"#,
        )
        .unwrap();

        assert_eq!(config.symbol, "GBPUSD");
        assert_eq!(config.risk.capital, 5000.0);
        assert_eq!(config.risk.risk_per_trade, 0.02);
        assert_eq!(config.risk.max_lot, 5.0);
        assert_eq!(config.risk.stop_loss_pips, None);
        assert_eq!(config.risk.pip_value, Some(10.0));
        assert_eq!(config.strategy.ema_fast, 12);
        assert_eq!(config.strategy.thresholds.buy, 60.0);
        assert_eq!(config.strategy.thresholds.sell, 45.0);
        assert_eq!(
            config.data.source,
            DataSource::Csv {
                dir: PathBuf::from("/tmp/prices")
            }
        );
        assert_eq!(config.data.bar_count, 300);
        assert_eq!(config.data.seed, Some(7));
        assert_eq!(config.run_loop.interval_seconds, 60);
        assert_eq!(config.run_loop.max_cycles, Some(3));
        assert_eq!(config.journal_path, Some(PathBuf::from("signals.csv")));
    }

    #[test]
    fn csv_source_requires_dir() {
        let err = build("[data]\nsource = csv\n").unwrap_err();
        assert!(matches!(err, TraderError::ConfigMissing { key, .. } if key == "csv_dir"));
    }

    #[test]
    fn unknown_source_rejected() {
        let err = build("[data]\nsource = bloomberg\n").unwrap_err();
        assert!(matches!(err, TraderError::ConfigInvalid { key, .. } if key == "source"));
    }

    #[test]
    fn negative_span_rejected() {
        let err = build("[strategy]\nema_fast = -5\n").unwrap_err();
        assert!(matches!(err, TraderError::ConfigInvalid { key, .. } if key == "ema_fast"));
    }

    #[test]
    fn bad_pip_value_rejected() {
        let err = build("[risk]\npip_value = ten\n").unwrap_err();
        assert!(matches!(err, TraderError::ConfigInvalid { key, .. } if key == "pip_value"));
    }

    #[test]
    fn malformed_risk_limit_rejected() {
        let err = build("[risk]\nmax_drawdown = 5%\n").unwrap_err();
        assert!(matches!(err, TraderError::ConfigInvalid { key, .. } if key == "max_drawdown"));
        let err = build("[risk]\nrisk_per_trade = 0,02\n").unwrap_err();
        assert!(matches!(err, TraderError::ConfigInvalid { key, .. } if key == "risk_per_trade"));
        let err = build("[account]\ncapital = 2 000\n").unwrap_err();
        assert!(matches!(err, TraderError::ConfigInvalid { section, .. } if section == "account"));
    }

    #[test]
    fn zero_max_cycles_is_unbounded() {
        let config = build("[loop]\nmax_cycles = 0\n").unwrap();
        assert_eq!(config.run_loop.max_cycles, None);
    }
}
