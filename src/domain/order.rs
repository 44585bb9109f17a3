//! Order intents and execution reports.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Buy,
    Sell,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderRequest {
    pub symbol: String,
    pub side: Side,
    pub price: f64,
    pub size: f64,
    pub take_profit: Option<f64>,
    pub stop_loss: Option<f64>,
}

impl OrderRequest {
    /// Builds an order with absolute take-profit/stop-loss levels from fractional
    /// distances. A zero distance leaves that level unset.
    pub fn bracket(
        symbol: &str,
        side: Side,
        price: f64,
        size: f64,
        take_profit_pct: f64,
        stop_loss_pct: f64,
    ) -> Self {
        let (tp_sign, sl_sign) = match side {
            Side::Buy => (1.0, -1.0),
            Side::Sell => (-1.0, 1.0),
        };
        let take_profit =
            (take_profit_pct > 0.0).then(|| price * (1.0 + tp_sign * take_profit_pct));
        let stop_loss = (stop_loss_pct > 0.0).then(|| price * (1.0 + sl_sign * stop_loss_pct));

        OrderRequest {
            symbol: symbol.to_string(),
            side,
            price,
            size,
            take_profit,
            stop_loss,
        }
    }
}

/// Executor's answer to a submitted order.
#[derive(Debug, Clone, PartialEq)]
pub enum Fill {
    /// Order accepted; `realized_pnl` is present once the position is closed.
    Filled { realized_pnl: Option<f64> },
    Rejected { reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buy_bracket_levels() {
        let order = OrderRequest::bracket("EURUSD", Side::Buy, 1.1, 0.02, 0.01, 0.02);
        assert!((order.take_profit.unwrap() - 1.111).abs() < 1e-12);
        assert!((order.stop_loss.unwrap() - 1.078).abs() < 1e-12);
    }

    #[test]
    fn sell_bracket_levels_are_mirrored() {
        let order = OrderRequest::bracket("EURUSD", Side::Sell, 1.1, 0.02, 0.01, 0.02);
        assert!((order.take_profit.unwrap() - 1.089).abs() < 1e-12);
        assert!((order.stop_loss.unwrap() - 1.122).abs() < 1e-12);
    }

    #[test]
    fn zero_distance_omits_level() {
        let order = OrderRequest::bracket("EURUSD", Side::Buy, 1.1, 0.02, 0.0, 0.01);
        assert!(order.take_profit.is_none());
        assert!(order.stop_loss.is_some());
    }

    #[test]
    fn side_display() {
        assert_eq!(Side::Buy.to_string(), "BUY");
        assert_eq!(Side::Sell.to_string(), "SELL");
    }
}
