//! sabia: quarterly analytics over Brazilian small-business credit data.
//!
//! Hexagonal architecture: the pure engine lives in [`domain`], port traits in
//! [`ports`], concrete implementations in [`adapters`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;
pub mod log;
