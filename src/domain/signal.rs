//! Crossover + oscillator signal generation.
//!
//! Only the last two frame rows are inspected. BUY needs a fresh upward cross of
//! the fast EMA through the slow EMA with the oscillator above the buy threshold;
//! SELL is the mirrored rule below the sell threshold. Anything else is HOLD.

use std::fmt;

use chrono::NaiveDateTime;

use crate::domain::indicator::{IndicatorFrame, IndicatorRow};
use crate::domain::order::Side;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    Buy,
    Sell,
    Hold,
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalKind::Buy => write!(f, "BUY"),
            SignalKind::Sell => write!(f, "SELL"),
            SignalKind::Hold => write!(f, "HOLD"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalReason {
    BullishCross,
    BearishCross,
    /// Fast EMA crossed but the oscillator did not confirm.
    Unconfirmed,
    NoCross,
    /// Fewer than two rows; a cross cannot be observed.
    NotEnoughRows,
}

impl fmt::Display for SignalReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SignalReason::BullishCross => "bullish cross confirmed by oscillator",
            SignalReason::BearishCross => "bearish cross confirmed by oscillator",
            SignalReason::Unconfirmed => "cross without oscillator confirmation",
            SignalReason::NoCross => "no crossover",
            SignalReason::NotEnoughRows => "not enough rows",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    pub kind: SignalKind,
    /// Close of the last row; `None` only for an empty frame.
    pub price: Option<f64>,
    pub timestamp: Option<NaiveDateTime>,
    pub reason: SignalReason,
}

impl Signal {
    fn hold(row: Option<&IndicatorRow>, reason: SignalReason) -> Self {
        Signal {
            kind: SignalKind::Hold,
            price: row.map(|r| r.bar.close),
            timestamp: row.map(|r| r.bar.timestamp),
            reason,
        }
    }

    /// Order side for BUY/SELL, `None` for HOLD.
    pub fn side(&self) -> Option<Side> {
        match self.kind {
            SignalKind::Buy => Some(Side::Buy),
            SignalKind::Sell => Some(Side::Sell),
            SignalKind::Hold => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalThresholds {
    pub buy: f64,
    pub sell: f64,
}

impl Default for SignalThresholds {
    fn default() -> Self {
        SignalThresholds {
            buy: 55.0,
            sell: 45.0,
        }
    }
}

pub fn generate(frame: &IndicatorFrame, thresholds: &SignalThresholds) -> Signal {
    let Some((prev, cur)) = frame.last_two() else {
        return Signal::hold(frame.last(), SignalReason::NotEnoughRows);
    };

    let crossed_up = prev.ema_fast <= prev.ema_slow && cur.ema_fast > cur.ema_slow;
    let crossed_down = prev.ema_fast >= prev.ema_slow && cur.ema_fast < cur.ema_slow;

    let (kind, reason) = if crossed_up && cur.oscillator > thresholds.buy {
        (SignalKind::Buy, SignalReason::BullishCross)
    } else if crossed_down && cur.oscillator < thresholds.sell {
        (SignalKind::Sell, SignalReason::BearishCross)
    } else if crossed_up || crossed_down {
        (SignalKind::Hold, SignalReason::Unconfirmed)
    } else {
        (SignalKind::Hold, SignalReason::NoCross)
    };

    Signal {
        kind,
        price: Some(cur.bar.close),
        timestamp: Some(cur.bar.timestamp),
        reason,
    }
}
