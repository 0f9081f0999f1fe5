//! Wide per-quarter table of one metric, one column per dimension value.

use crate::domain::aggregate::aggregate;
use crate::domain::filter::FilterState;
use crate::domain::geography;
use crate::domain::metric::MetricKey;
use crate::domain::period::Quarter;
use crate::domain::record::{BorrowerRecord, Dimension, Dimensioned, GrantRecord, StockRecord};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub struct RegionalRow {
    pub quarter: Quarter,
    /// Column name to value. Every column is present in every row.
    pub values: BTreeMap<String, f64>,
}

impl RegionalRow {
    pub fn get(&self, column: &str) -> f64 {
        self.values.get(column).copied().unwrap_or(0.0)
    }
}

/// Reference values for `dimension` plus any other value seen in the rows.
fn columns(
    dimension: Dimension,
    borrowers: &[BorrowerRecord],
    stock: &[StockRecord],
    grants: &[GrantRecord],
) -> BTreeSet<String> {
    let mut columns: BTreeSet<String> = geography::known_values(dimension)
        .into_iter()
        .map(str::to_string)
        .collect();
    columns.extend(borrowers.iter().filter_map(|r| r.dimension(dimension)).map(str::to_string));
    columns.extend(stock.iter().filter_map(|r| r.dimension(dimension)).map(str::to_string));
    columns.extend(grants.iter().filter_map(|r| r.dimension(dimension)).map(str::to_string));
    columns
}

/// Runs the quarter aggregation once per value of `dimension` and pivots the
/// results into one row per quarter.
///
/// The quarter axis is the one of the unrestricted aggregation. A column with
/// no matching rows in a quarter, or whose ratio is undefined, reads 0.
pub fn regional_series(
    metric: MetricKey,
    borrowers: &[BorrowerRecord],
    stock: &[StockRecord],
    grants: &[GrantRecord],
    filter: &FilterState,
    dimension: Dimension,
) -> Vec<RegionalRow> {
    let axis = aggregate(borrowers, stock, grants, filter);
    let columns = columns(dimension, borrowers, stock, grants);

    let mut table: BTreeMap<Quarter, BTreeMap<String, f64>> = axis
        .iter()
        .map(|p| {
            let zeros = columns.iter().map(|c| (c.clone(), 0.0)).collect();
            (p.quarter, zeros)
        })
        .collect();

    for column in &columns {
        let Some(restricted) = filter.restricted_to(dimension, column) else {
            continue;
        };
        for point in aggregate(borrowers, stock, grants, &restricted) {
            if let Some(row) = table.get_mut(&point.quarter) {
                row.insert(column.clone(), point.value(metric).unwrap_or(0.0));
            }
        }
    }

    debug!(
        %metric,
        %dimension,
        quarters = table.len(),
        columns = columns.len(),
        "built regional series"
    );

    table
        .into_iter()
        .map(|(quarter, values)| RegionalRow { quarter, values })
        .collect()
}
