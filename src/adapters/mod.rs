//! Concrete adapter implementations for ports.

pub mod csv_adapter;
pub mod csv_report;
pub mod file_config_adapter;
pub mod format;
