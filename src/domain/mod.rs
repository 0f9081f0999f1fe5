//! Core domain types and the pure dashboard engine.

pub mod error;
pub mod period;
pub mod record;
pub mod filter;
pub mod metric;
pub mod geography;
pub mod aggregate;
pub mod breakdown;
pub mod regional;
pub mod state_table;
pub mod headline;
pub mod forecast;
pub mod engine;
pub mod config_validation;
