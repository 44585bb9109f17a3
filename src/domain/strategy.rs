//! Strategy interface and the name → implementation registry.
//!
//! Strategies are resolved once at startup from `[strategy] name`.

use crate::domain::bar::PriceBar;
use crate::domain::config::StrategyConfig;
use crate::domain::error::TraderError;
use crate::domain::indicator::{self, IndicatorFrame, frame};
use crate::domain::signal::{self, Signal, SignalThresholds};

pub trait Strategy {
    fn name(&self) -> &'static str;

    /// Bars needed before `compute` yields at least one row.
    fn min_bars(&self) -> usize;

    fn compute(&self, bars: &[PriceBar]) -> Result<IndicatorFrame, TraderError>;

    fn generate(&self, frame: &IndicatorFrame) -> Signal;
}

/// Fast/slow EMA crossover confirmed by the RSI-style oscillator.
#[derive(Debug, Clone, PartialEq)]
pub struct EmaRsiStrategy {
    pub fast_span: usize,
    pub slow_span: usize,
    pub osc_period: usize,
    pub thresholds: SignalThresholds,
}

impl EmaRsiStrategy {
    pub fn from_config(config: &StrategyConfig) -> Self {
        EmaRsiStrategy {
            fast_span: config.ema_fast,
            slow_span: config.ema_slow,
            osc_period: config.oscillator_period,
            thresholds: config.thresholds,
        }
    }
}

impl Strategy for EmaRsiStrategy {
    fn name(&self) -> &'static str {
        "ema_rsi"
    }

    fn min_bars(&self) -> usize {
        frame::warmup(self.slow_span, self.osc_period) + 1
    }

    fn compute(&self, bars: &[PriceBar]) -> Result<IndicatorFrame, TraderError> {
        indicator::compute(bars, self.fast_span, self.slow_span, self.osc_period)
    }

    fn generate(&self, frame: &IndicatorFrame) -> Signal {
        signal::generate(frame, &self.thresholds)
    }
}

type Constructor = fn(&StrategyConfig) -> Box<dyn Strategy>;

const REGISTRY: &[(&str, Constructor)] = &[("ema_rsi", build_ema_rsi)];

fn build_ema_rsi(config: &StrategyConfig) -> Box<dyn Strategy> {
    Box::new(EmaRsiStrategy::from_config(config))
}

/// Registered strategy names.
pub fn available() -> Vec<&'static str> {
    REGISTRY.iter().map(|(name, _)| *name).collect()
}

pub fn from_config(config: &StrategyConfig) -> Result<Box<dyn Strategy>, TraderError> {
    REGISTRY
        .iter()
        .find(|(name, _)| *name == config.name)
        .map(|(_, build)| build(config))
        .ok_or_else(|| TraderError::UnknownStrategy {
            name: config.name.clone(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_resolves_ema_rsi() {
        let strategy = from_config(&StrategyConfig::default()).unwrap();
        assert_eq!(strategy.name(), "ema_rsi");
        assert_eq!(strategy.min_bars(), 201);
    }

    #[test]
    fn unknown_strategy_rejected() {
        let config = StrategyConfig {
            name: "martingale".into(),
            ..StrategyConfig::default()
        };
        let err = from_config(&config).err().unwrap();
        assert!(matches!(err, TraderError::UnknownStrategy { name } if name == "martingale"));
    }

    #[test]
    fn available_lists_registered_names() {
        assert_eq!(available(), vec!["ema_rsi"]);
    }

    #[test]
    fn strategy_carries_configured_parameters() {
        let config = StrategyConfig {
            ema_fast: 12,
            ema_slow: 26,
            oscillator_period: 30,
            ..StrategyConfig::default()
        };
        let strategy = EmaRsiStrategy::from_config(&config);
        assert_eq!(strategy.fast_span, 12);
        assert_eq!(strategy.slow_span, 26);
        assert_eq!(strategy.min_bars(), 31);
    }
}
