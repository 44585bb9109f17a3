//! Simulated order executor.
//!
//! Every order is accepted and closed on the spot at either its take-profit or
//! its stop-loss level, chosen by a Bernoulli draw with the configured win
//! rate. An order missing the drawn level stays open and realizes nothing.

use crate::domain::config::ExecutionConfig;
use crate::domain::error::TraderError;
use crate::domain::order::{Fill, OrderRequest};
use crate::ports::order_port::OrderExecutor;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

pub struct SimulatedExecutor {
    rng: StdRng,
    win_rate: f64,
    contract_size: f64,
}

impl SimulatedExecutor {
    pub fn new(config: &ExecutionConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            rng,
            win_rate: config.win_rate.clamp(0.0, 1.0),
            contract_size: config.contract_size,
        }
    }
}

impl OrderExecutor for SimulatedExecutor {
    fn submit(&mut self, order: &OrderRequest) -> Result<Fill, TraderError> {
        if !(order.size > 0.0) || !order.price.is_finite() {
            return Ok(Fill::Rejected {
                reason: format!("invalid order size {} at {}", order.size, order.price),
            });
        }

        let won = self.rng.gen_bool(self.win_rate);
        let (level, sign) = if won {
            (order.take_profit, 1.0)
        } else {
            (order.stop_loss, -1.0)
        };

        let realized_pnl =
            level.map(|level| sign * order.size * (level - order.price).abs() * self.contract_size);

        info!(
            symbol = %order.symbol,
            side = %order.side,
            size = order.size,
            outcome = if won { "take-profit" } else { "stop-loss" },
            pnl = realized_pnl.unwrap_or(0.0),
            "simulated fill"
        );
        Ok(Fill::Filled { realized_pnl })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::Side;
    use approx::assert_relative_eq;

    fn executor(win_rate: f64) -> SimulatedExecutor {
        SimulatedExecutor::new(&ExecutionConfig {
            win_rate,
            contract_size: 100_000.0,
            seed: Some(3),
        })
    }

    fn order() -> OrderRequest {
        OrderRequest::bracket("EURUSD", Side::Buy, 1.1, 0.02, 0.01, 0.005)
    }

    fn pnl(fill: Fill) -> Option<f64> {
        match fill {
            Fill::Filled { realized_pnl } => realized_pnl,
            Fill::Rejected { reason } => panic!("unexpected rejection: {reason}"),
        }
    }

    #[test]
    fn certain_win_books_take_profit_distance() {
        let realized = pnl(executor(1.0).submit(&order()).unwrap()).unwrap();
        // 0.02 lots * 0.011 * 100k
        assert_relative_eq!(realized, 22.0, epsilon = 1e-9);
    }

    #[test]
    fn certain_loss_books_stop_distance() {
        let realized = pnl(executor(0.0).submit(&order()).unwrap()).unwrap();
        assert_relative_eq!(realized, -11.0, epsilon = 1e-9);
    }

    #[test]
    fn sell_profit_is_positive() {
        let sell = OrderRequest::bracket("EURUSD", Side::Sell, 1.1, 0.02, 0.01, 0.005);
        let realized = pnl(executor(1.0).submit(&sell).unwrap()).unwrap();
        assert!(realized > 0.0);
    }

    #[test]
    fn missing_level_realizes_nothing() {
        let open_ended = OrderRequest::bracket("EURUSD", Side::Buy, 1.1, 0.02, 0.0, 0.005);
        assert_eq!(pnl(executor(1.0).submit(&open_ended).unwrap()), None);
    }

    #[test]
    fn zero_size_is_rejected() {
        let mut bad = order();
        bad.size = 0.0;
        let fill = executor(1.0).submit(&bad).unwrap();
        assert!(matches!(fill, Fill::Rejected { .. }));
    }

    #[test]
    fn no_live_balance() {
        assert_eq!(executor(0.5).account_balance().unwrap(), None);
    }
}
