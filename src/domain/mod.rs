//! Core domain types and logic.

pub mod bar;
pub mod config;
pub mod config_validation;
pub mod decision;
pub mod error;
pub mod indicator;
pub mod order;
pub mod risk;
pub mod signal;
pub mod strategy;
