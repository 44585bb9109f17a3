//! Concrete adapter implementations for ports.

pub mod csv_adapter;
pub mod csv_journal_adapter;
pub mod file_config_adapter;
pub mod sim_executor;
#[cfg(feature = "sqlite")]
pub mod sqlite_adapter;
pub mod synthetic_adapter;
