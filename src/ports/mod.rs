//! Port traits for the collaborators the decision core talks to.

pub mod config_port;
pub mod journal_port;
pub mod metrics_port;
pub mod order_port;
pub mod price_port;
