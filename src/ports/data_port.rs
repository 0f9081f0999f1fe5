//! Data access port trait.

use crate::domain::error::SabiaError;
use crate::domain::record::{BorrowerRecord, GrantRecord, RowStore, StockRecord};

/// Rows parsed from one source plus how many were rejected as malformed.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadOutcome<T> {
    pub rows: Vec<T>,
    pub skipped: usize,
}

impl<T> LoadOutcome<T> {
    pub fn new(rows: Vec<T>, skipped: usize) -> Self {
        Self { rows, skipped }
    }
}

impl<T> Default for LoadOutcome<T> {
    fn default() -> Self {
        Self::new(Vec::new(), 0)
    }
}

pub trait DataPort {
    fn load_borrowers(&self) -> Result<LoadOutcome<BorrowerRecord>, SabiaError>;

    fn load_stock(&self) -> Result<LoadOutcome<StockRecord>, SabiaError>;

    fn load_grants(&self) -> Result<LoadOutcome<GrantRecord>, SabiaError>;

    /// Loads all three collections into a [`RowStore`], discarding skip counts.
    fn load_store(&self) -> Result<RowStore, SabiaError> {
        Ok(RowStore::new(
            self.load_borrowers()?.rows,
            self.load_stock()?.rows,
            self.load_grants()?.rows,
        ))
    }
}
