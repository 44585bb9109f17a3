//! Risk metrics sink port trait.

use crate::domain::error::TraderError;
use crate::domain::risk::RiskState;

/// Fire-and-forget recorder; callers log failures and carry on.
pub trait MetricsSink {
    fn record(&self, snapshot: &RiskState) -> Result<(), TraderError>;
}
