//! Filter state and row matching.
//!
//! A [`FilterState`] holds one accepted-value set per [`Dimension`]. An empty
//! set places no restriction on that dimension. A row whose value for a
//! restricted dimension is missing never matches.

use crate::domain::record::{Dimension, Dimensioned};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FilterState {
    pub size: BTreeSet<String>,
    pub gender: BTreeSet<String>,
    pub region: BTreeSet<String>,
    pub state: BTreeSet<String>,
    pub origin: BTreeSet<String>,
    pub modality: BTreeSet<String>,
}

impl FilterState {
    /// A filter that accepts every row.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn accepted(&self, dimension: Dimension) -> &BTreeSet<String> {
        match dimension {
            Dimension::Size => &self.size,
            Dimension::Gender => &self.gender,
            Dimension::Region => &self.region,
            Dimension::State => &self.state,
            Dimension::Origin => &self.origin,
            Dimension::Modality => &self.modality,
        }
    }

    fn accepted_mut(&mut self, dimension: Dimension) -> &mut BTreeSet<String> {
        match dimension {
            Dimension::Size => &mut self.size,
            Dimension::Gender => &mut self.gender,
            Dimension::Region => &mut self.region,
            Dimension::State => &mut self.state,
            Dimension::Origin => &mut self.origin,
            Dimension::Modality => &mut self.modality,
        }
    }

    /// Builder: replace the accepted set for `dimension`.
    pub fn with<I, S>(mut self, dimension: Dimension, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        *self.accepted_mut(dimension) = values.into_iter().map(Into::into).collect();
        self
    }

    pub fn is_unrestricted(&self) -> bool {
        Dimension::ALL
            .iter()
            .all(|&d| self.accepted(d).is_empty())
    }

    /// Intersects this filter with a single-value restriction on `dimension`.
    ///
    /// Returns `None` when the intersection is empty, i.e. the caller already
    /// excludes `value` and the restricted filter could match nothing.
    pub fn restricted_to(&self, dimension: Dimension, value: &str) -> Option<Self> {
        let current = self.accepted(dimension);
        if !current.is_empty() && !current.contains(value) {
            return None;
        }
        let mut restricted = self.clone();
        let slot = restricted.accepted_mut(dimension);
        slot.clear();
        slot.insert(value.to_string());
        Some(restricted)
    }
}

/// True when `row` passes every non-empty dimension of `filter`.
pub fn matches<R: Dimensioned + ?Sized>(row: &R, filter: &FilterState) -> bool {
    Dimension::ALL.iter().all(|&dimension| {
        let accepted = filter.accepted(dimension);
        accepted.is_empty()
            || row
                .dimension(dimension)
                .is_some_and(|value| accepted.contains(value))
    })
}
