//! Per-state table: latest value of one metric plus trailing deltas.

use crate::domain::aggregate::{aggregate, metric_series};
use crate::domain::filter::FilterState;
use crate::domain::metric::MetricKey;
use crate::domain::record::{BorrowerRecord, Dimension, Dimensioned, GrantRecord, StockRecord};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Quarters back for the 3-, 6- and 12-month deltas.
pub const LOOKBACK_3M: usize = 1;
pub const LOOKBACK_6M: usize = 2;
pub const LOOKBACK_12M: usize = 4;

#[derive(Debug, Clone, PartialEq)]
pub struct StateRow {
    pub code: String,
    pub name: String,
    pub current: Option<f64>,
    pub var_3m: Option<f64>,
    pub var_6m: Option<f64>,
    pub var_12m: Option<f64>,
    /// Deltas are percentage-point differences rather than relative changes.
    pub is_rate: bool,
}

/// Builds one row per state code found in the data, ordered by code.
///
/// States excluded by a state restriction in `filter` are left out. Names
/// come from `names`, falling back to the code itself.
pub fn state_table(
    metric: MetricKey,
    borrowers: &[BorrowerRecord],
    stock: &[StockRecord],
    grants: &[GrantRecord],
    filter: &FilterState,
    names: &BTreeMap<String, String>,
) -> Vec<StateRow> {
    let mut codes: BTreeSet<&str> = BTreeSet::new();
    codes.extend(borrowers.iter().filter_map(|r| r.dimension(Dimension::State)));
    codes.extend(stock.iter().filter_map(|r| r.dimension(Dimension::State)));
    codes.extend(grants.iter().filter_map(|r| r.dimension(Dimension::State)));

    let kind = metric.delta_kind();
    let rows: Vec<StateRow> = codes
        .into_iter()
        .filter_map(|code| {
            let restricted = filter.restricted_to(Dimension::State, code)?;
            let series = aggregate(borrowers, stock, grants, &restricted);
            let values = metric_series(&series, metric);
            Some(StateRow {
                code: code.to_string(),
                name: names.get(code).cloned().unwrap_or_else(|| code.to_string()),
                current: values.last().copied().flatten(),
                var_3m: kind.delta_back(&values, LOOKBACK_3M),
                var_6m: kind.delta_back(&values, LOOKBACK_6M),
                var_12m: kind.delta_back(&values, LOOKBACK_12M),
                is_rate: metric.is_rate(),
            })
        })
        .collect();

    debug!(%metric, states = rows.len(), "built state table");
    rows
}
