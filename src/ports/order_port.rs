//! Order execution port trait.

use crate::domain::error::TraderError;
use crate::domain::order::{Fill, OrderRequest};

pub trait OrderExecutor {
    /// `Err` means the executor could not be reached; a broker refusal is
    /// `Ok(Fill::Rejected { .. })`.
    fn submit(&mut self, order: &OrderRequest) -> Result<Fill, TraderError>;

    /// Live account balance, when the executor is connected to one.
    fn account_balance(&self) -> Result<Option<f64>, TraderError> {
        Ok(None)
    }
}
