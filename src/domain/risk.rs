//! Capital bookkeeping, position sizing and the trading gate.
//!
//! [`RiskManager`] exclusively owns [`RiskState`]. Sizing and gating only read it;
//! mutation happens in `update_capital`, the `reset_*` operations and the
//! `adjust_*` rules. The manager does no I/O beyond `tracing` events.

use std::collections::BTreeMap;
use std::fmt;

use tracing::{debug, info, warn};

use crate::domain::config::RiskConfig;
use crate::domain::error::TraderError;

const PERFORMANCE_UPPER_RATIO: f64 = 1.10;
const PERFORMANCE_LOWER_RATIO: f64 = 0.90;
const SCALE_UP: f64 = 1.15;
const SCALE_DOWN: f64 = 0.8;
const RISK_CAP: f64 = 0.05;
const RISK_FLOOR: f64 = 0.002;
const VOLATILITY_SCALE: f64 = 0.7;
const VOLATILITY_FLOOR: f64 = 0.001;

#[derive(Debug, Clone, PartialEq)]
pub struct RiskState {
    pub capital: f64,
    pub initial_capital: f64,
    pub risk_per_trade: f64,
    pub daily_pnl: f64,
    pub equity_high: f64,
    pub min_lot: f64,
    pub max_lot: f64,
    pub max_daily_loss: f64,
    pub max_drawdown: f64,
}

impl RiskState {
    /// Field name → value view for reporting sinks.
    pub fn to_map(&self) -> BTreeMap<&'static str, f64> {
        BTreeMap::from([
            ("capital", self.capital),
            ("initial_capital", self.initial_capital),
            ("risk_per_trade", self.risk_per_trade),
            ("daily_pnl", self.daily_pnl),
            ("equity_high", self.equity_high),
            ("min_lot", self.min_lot),
            ("max_lot", self.max_lot),
            ("max_daily_loss", self.max_daily_loss),
            ("max_drawdown", self.max_drawdown),
        ])
    }

    /// 1 - capital / equity_high, or 0 when no positive high has been set.
    pub fn drawdown(&self) -> f64 {
        if self.equity_high > 0.0 {
            1.0 - self.capital / self.equity_high
        } else {
            0.0
        }
    }

    /// Absolute daily loss allowance, always non-negative.
    pub fn daily_loss_limit(&self) -> f64 {
        (self.initial_capital * self.max_daily_loss).abs()
    }
}

/// Why the gate refused a trade.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BlockReason {
    Drawdown { drawdown: f64, limit: f64 },
    DailyLoss { daily_pnl: f64, limit: f64 },
}

impl fmt::Display for BlockReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockReason::Drawdown { drawdown, limit } => {
                write!(f, "drawdown {:.3} > max_drawdown {:.3}", drawdown, limit)
            }
            BlockReason::DailyLoss { daily_pnl, limit } => {
                write!(f, "daily_pnl {:.2} < -{:.2}", daily_pnl, limit)
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct RiskManager {
    state: RiskState,
    volatility_threshold: f64,
    /// Set once the performance rule has scaled risk for the current capital.
    performance_adjusted: bool,
}

impl RiskManager {
    pub fn new(config: &RiskConfig) -> Self {
        Self::with_initial_capital(config, config.capital)
    }

    /// Uses `initial_capital` (e.g. a live account balance) instead of the
    /// configured capital as the baseline.
    pub fn with_initial_capital(config: &RiskConfig, initial_capital: f64) -> Self {
        RiskManager {
            state: RiskState {
                capital: initial_capital,
                initial_capital,
                risk_per_trade: config.risk_per_trade,
                daily_pnl: 0.0,
                equity_high: initial_capital,
                min_lot: config.min_lot,
                max_lot: config.max_lot,
                max_daily_loss: config.max_daily_loss,
                max_drawdown: config.max_drawdown,
            },
            volatility_threshold: config.volatility_threshold,
            performance_adjusted: false,
        }
    }

    pub fn capital(&self) -> f64 {
        self.state.capital
    }

    pub fn risk_per_trade(&self) -> f64 {
        self.state.risk_per_trade
    }

    pub fn equity_high(&self) -> f64 {
        self.state.equity_high
    }

    pub fn daily_pnl(&self) -> f64 {
        self.state.daily_pnl
    }

    /// Read-only copy of the current state.
    pub fn snapshot(&self) -> RiskState {
        self.state.clone()
    }

    /// Lot size risking `capital * risk_per_trade`.
    ///
    /// With both `stop_loss_pips` and `pip_value` the risk amount is spread over the
    /// stop distance; otherwise it is divided by `price`. The result is rounded to
    /// four decimals and clamped to `[min_lot, max_lot]`. Any supplied
    /// stop/pip value that is not positive is rejected rather than ignored.
    pub fn calculate_lot_size(
        &self,
        price: f64,
        stop_loss_pips: Option<f64>,
        pip_value: Option<f64>,
    ) -> Result<f64, TraderError> {
        if !(price.is_finite() && price > 0.0) {
            return Err(TraderError::invalid_input(format!(
                "price must be positive, got {}",
                price
            )));
        }
        for (name, value) in [("stop_loss_pips", stop_loss_pips), ("pip_value", pip_value)] {
            if let Some(v) = value {
                if !(v.is_finite() && v > 0.0) {
                    return Err(TraderError::invalid_input(format!(
                        "{} must be positive, got {}",
                        name, v
                    )));
                }
            }
        }

        let state = &self.state;
        if state.capital <= 0.0 {
            debug!(capital = state.capital, "no capital, using minimum lot");
            return Ok(state.min_lot);
        }

        let risk_amount = state.capital * state.risk_per_trade;
        let raw = match (stop_loss_pips, pip_value) {
            (Some(pips), Some(value)) => risk_amount / (pips * value),
            _ => risk_amount / price,
        };
        let lot = round_to(raw, 4).clamp(state.min_lot, state.max_lot);

        debug!(lot, price, risk_amount, "calculated lot size");
        Ok(lot)
    }

    /// Evaluates the drawdown and daily-loss limits.
    pub fn check_limits(&self) -> Result<(), BlockReason> {
        let state = &self.state;
        let floor = state.equity_high * (1.0 - state.max_drawdown);
        if state.equity_high > 0.0 && state.capital < floor {
            return Err(BlockReason::Drawdown {
                drawdown: state.drawdown(),
                limit: state.max_drawdown,
            });
        }
        let limit = state.daily_loss_limit();
        if state.daily_pnl < -limit {
            return Err(BlockReason::DailyLoss {
                daily_pnl: state.daily_pnl,
                limit,
            });
        }
        Ok(())
    }

    pub fn can_trade(&self) -> bool {
        match self.check_limits() {
            Ok(()) => true,
            Err(reason) => {
                warn!(%reason, "trading blocked");
                false
            }
        }
    }

    /// Books a realized trade result. Call once per closed trade.
    pub fn update_capital(&mut self, pnl: f64) -> Result<(), TraderError> {
        if !pnl.is_finite() {
            return Err(TraderError::invalid_input(format!(
                "realized pnl must be finite, got {}",
                pnl
            )));
        }
        let state = &mut self.state;
        state.capital += pnl;
        state.daily_pnl += pnl;
        if state.capital > state.equity_high {
            state.equity_high = state.capital;
        }
        self.performance_adjusted = false;
        info!(capital = state.capital, pnl, "capital updated");
        Ok(())
    }

    pub fn reset_daily(&mut self) {
        info!(previous = self.state.daily_pnl, "daily pnl reset");
        self.state.daily_pnl = 0.0;
    }

    /// Restores the baseline capital; sandbox and test use only.
    pub fn reset_capital(&mut self) {
        let state = &mut self.state;
        state.capital = state.initial_capital;
        state.equity_high = state.initial_capital;
        state.daily_pnl = 0.0;
        self.performance_adjusted = false;
        info!(capital = state.capital, "capital reset to initial");
    }

    /// Scales risk up after a 10% gain (capped at 5%) or down after a 10% loss
    /// (floored at 0.2%). Applies at most once per capital level; returns whether
    /// risk changed.
    pub fn adjust_risk_based_on_performance(&mut self) -> bool {
        if self.performance_adjusted || self.state.initial_capital <= 0.0 {
            return false;
        }
        let ratio = self.state.capital / self.state.initial_capital;
        let old = self.state.risk_per_trade;
        let new = if ratio >= PERFORMANCE_UPPER_RATIO {
            (old * SCALE_UP).min(RISK_CAP)
        } else if ratio <= PERFORMANCE_LOWER_RATIO {
            (old * SCALE_DOWN).max(RISK_FLOOR)
        } else {
            return false;
        };

        self.performance_adjusted = true;
        self.state.risk_per_trade = new;
        if new != old {
            info!(old, new, ratio, "risk adjusted for performance");
        }
        new != old
    }

    /// Cuts risk by 30% (floored at 0.1%) when `metric` exceeds the configured
    /// volatility threshold. Returns whether risk changed.
    pub fn adjust_for_volatility(&mut self, metric: Option<f64>) -> bool {
        let Some(metric) = metric else {
            return false;
        };
        if metric.is_nan() || metric <= self.volatility_threshold {
            return false;
        }
        let old = self.state.risk_per_trade;
        let new = (old * VOLATILITY_SCALE).max(VOLATILITY_FLOOR);
        self.state.risk_per_trade = new;
        if new != old {
            info!(metric, old, new, "risk reduced for volatility");
        }
        new != old
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
