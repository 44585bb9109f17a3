//! Configuration validation.
//!
//! Runs on the typed config before any component is built, so a bad file
//! fails at startup rather than on the first signal.

use crate::domain::config::{
    DataConfig, ExecutionConfig, RiskConfig, StrategyConfig, TraderConfig,
};
use crate::domain::error::TraderError;
use crate::domain::indicator::frame;

pub fn validate_trader_config(config: &TraderConfig) -> Result<(), TraderError> {
    validate_risk_config(&config.risk)?;
    validate_strategy_config(&config.strategy)?;
    validate_data_config(&config.data, &config.strategy)?;
    validate_execution_config(&config.execution)?;
    Ok(())
}

pub fn validate_risk_config(risk: &RiskConfig) -> Result<(), TraderError> {
    if !(risk.capital > 0.0) {
        return Err(invalid("account", "capital", "capital must be positive"));
    }
    fraction("risk", "risk_per_trade", risk.risk_per_trade)?;
    if !(risk.min_lot > 0.0) {
        return Err(invalid("risk", "min_lot", "min_lot must be positive"));
    }
    if !(risk.max_lot >= risk.min_lot) {
        return Err(invalid(
            "risk",
            "max_lot",
            "max_lot must be at least min_lot",
        ));
    }
    fraction("risk", "max_daily_loss", risk.max_daily_loss)?;
    fraction("risk", "max_drawdown", risk.max_drawdown)?;
    if let Some(pips) = risk.stop_loss_pips {
        if !(pips > 0.0) {
            return Err(invalid(
                "risk",
                "stop_loss_pips",
                "stop_loss_pips must be positive or 'none'",
            ));
        }
    }
    if let Some(value) = risk.pip_value {
        if !(value > 0.0) {
            return Err(invalid(
                "risk",
                "pip_value",
                "pip_value must be positive or 'none'",
            ));
        }
    }
    if !(risk.volatility_threshold > 0.0) {
        return Err(invalid(
            "risk",
            "volatility_threshold",
            "volatility_threshold must be positive",
        ));
    }
    if risk.volatility_period == 0 {
        return Err(invalid(
            "risk",
            "volatility_period",
            "volatility_period must be at least 1",
        ));
    }
    Ok(())
}

pub fn validate_strategy_config(strategy: &StrategyConfig) -> Result<(), TraderError> {
    if strategy.ema_fast == 0 {
        return Err(invalid("strategy", "ema_fast", "ema_fast must be at least 1"));
    }
    if strategy.ema_slow <= strategy.ema_fast {
        return Err(invalid(
            "strategy",
            "ema_slow",
            "ema_slow must be greater than ema_fast",
        ));
    }
    if strategy.oscillator_period == 0 {
        return Err(invalid(
            "strategy",
            "oscillator_period",
            "oscillator_period must be at least 1",
        ));
    }

    let thresholds = strategy.thresholds;
    for (key, value) in [
        ("buy_threshold", thresholds.buy),
        ("sell_threshold", thresholds.sell),
    ] {
        if !(0.0..=100.0).contains(&value) {
            return Err(invalid(
                "strategy",
                key,
                format!("{key} must be between 0 and 100"),
            ));
        }
    }
    if thresholds.sell > thresholds.buy {
        return Err(invalid(
            "strategy",
            "sell_threshold",
            "sell_threshold must not exceed buy_threshold",
        ));
    }

    for (key, value) in [
        ("take_profit", strategy.take_profit),
        ("stop_loss", strategy.stop_loss),
    ] {
        if !(0.0..1.0).contains(&value) {
            return Err(invalid(
                "strategy",
                key,
                format!("{key} must be a fraction in [0, 1)"),
            ));
        }
    }
    Ok(())
}

pub fn validate_data_config(
    data: &DataConfig,
    strategy: &StrategyConfig,
) -> Result<(), TraderError> {
    let warmup = frame::warmup(strategy.ema_slow, strategy.oscillator_period);
    if data.bar_count <= warmup {
        return Err(invalid(
            "data",
            "bar_count",
            format!("bar_count must exceed the indicator warmup of {warmup} bars"),
        ));
    }
    Ok(())
}

pub fn validate_execution_config(execution: &ExecutionConfig) -> Result<(), TraderError> {
    if !(0.0..=1.0).contains(&execution.win_rate) {
        return Err(invalid(
            "execution",
            "win_rate",
            "win_rate must be between 0 and 1",
        ));
    }
    if !(execution.contract_size > 0.0) {
        return Err(invalid(
            "execution",
            "contract_size",
            "contract_size must be positive",
        ));
    }
    Ok(())
}

/// Value in (0, 1].
fn fraction(section: &str, key: &str, value: f64) -> Result<(), TraderError> {
    if value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(invalid(
            section,
            key,
            format!("{key} must be between 0 (exclusive) and 1"),
        ))
    }
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> TraderError {
    TraderError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}
