//! Quarter aggregation: row collections to one ordered series of indicators.
//!
//! The quarter axis is every quarter present in any of the three collections
//! before filtering. Filtering only decides which rows contribute, so a filter
//! that matches nothing still yields the full axis with zero totals and
//! undefined ratios.

use crate::domain::filter::{matches, FilterState};
use crate::domain::metric::MetricKey;
use crate::domain::period::Quarter;
use crate::domain::record::{BorrowerRecord, Dimensioned, GrantRecord, StockRecord};
use std::collections::BTreeMap;
use tracing::debug;

/// Trailing window of the chart overlay moving average.
pub const MOVING_AVERAGE_WINDOW: usize = 3;

/// One optional value per [`MetricKey`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MetricValues([Option<f64>; 7]);

impl MetricValues {
    pub fn get(&self, metric: MetricKey) -> Option<f64> {
        self.0[metric as usize]
    }

    pub fn set(&mut self, metric: MetricKey, value: Option<f64>) {
        self.0[metric as usize] = value;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedPoint {
    pub quarter: Quarter,
    pub borrowers: f64,
    pub operations: f64,
    pub granted: f64,
    pub balance: f64,
    pub delinquent: f64,
    /// `sum(numerator) / sum(denominator)`; `None` when the denominator is zero.
    pub interest_rate: Option<f64>,
    /// `delinquent / balance`; `None` when the balance is zero.
    pub delinquency_rate: Option<f64>,
    pub moving_average: MetricValues,
}

impl AggregatedPoint {
    pub fn value(&self, metric: MetricKey) -> Option<f64> {
        match metric {
            MetricKey::Borrowers => Some(self.borrowers),
            MetricKey::Operations => Some(self.operations),
            MetricKey::Granted => Some(self.granted),
            MetricKey::Balance => Some(self.balance),
            MetricKey::Delinquent => Some(self.delinquent),
            MetricKey::InterestRate => self.interest_rate,
            MetricKey::DelinquencyRate => self.delinquency_rate,
        }
    }
}

pub(crate) fn ratio(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator == 0.0 {
        None
    } else {
        Some(numerator / denominator)
    }
}

/// Running sums for one group of rows (a quarter, a size tier, ...).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct Totals {
    pub borrowers: f64,
    pub operations: f64,
    pub granted: f64,
    pub balance: f64,
    pub delinquent: f64,
    pub rate_numerator: f64,
    pub rate_denominator: f64,
}

impl Totals {
    pub fn add_borrower(&mut self, row: &BorrowerRecord) {
        self.borrowers += row.borrowers;
    }

    pub fn add_stock(&mut self, row: &StockRecord) {
        self.operations += row.operations;
        self.balance += row.balance;
        self.delinquent += row.delinquent;
        self.rate_numerator += row.rate_numerator;
        self.rate_denominator += row.rate_denominator;
    }

    pub fn add_grant(&mut self, row: &GrantRecord) {
        self.granted += row.granted;
    }

    pub fn value(&self, metric: MetricKey) -> Option<f64> {
        match metric {
            MetricKey::Borrowers => Some(self.borrowers),
            MetricKey::Operations => Some(self.operations),
            MetricKey::Granted => Some(self.granted),
            MetricKey::Balance => Some(self.balance),
            MetricKey::Delinquent => Some(self.delinquent),
            MetricKey::InterestRate => ratio(self.rate_numerator, self.rate_denominator),
            MetricKey::DelinquencyRate => ratio(self.delinquent, self.balance),
        }
    }

    fn into_point(self, quarter: Quarter) -> AggregatedPoint {
        AggregatedPoint {
            quarter,
            borrowers: self.borrowers,
            operations: self.operations,
            granted: self.granted,
            balance: self.balance,
            delinquent: self.delinquent,
            interest_rate: self.value(MetricKey::InterestRate),
            delinquency_rate: self.value(MetricKey::DelinquencyRate),
            moving_average: MetricValues::default(),
        }
    }
}

/// Trailing simple mean over the current and up to `window - 1` preceding
/// values. Undefined values are skipped; a window with no defined value is
/// undefined.
pub fn trailing_mean(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    let window = window.max(1);
    (0..values.len())
        .map(|i| {
            let start = (i + 1).saturating_sub(window);
            let (sum, count) = values[start..=i]
                .iter()
                .flatten()
                .fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
            if count == 0 {
                None
            } else {
                Some(sum / count as f64)
            }
        })
        .collect()
}

/// Aggregates the three collections into one point per quarter, ascending,
/// with the default moving-average window.
pub fn aggregate(
    borrowers: &[BorrowerRecord],
    stock: &[StockRecord],
    grants: &[GrantRecord],
    filter: &FilterState,
) -> Vec<AggregatedPoint> {
    aggregate_with_window(borrowers, stock, grants, filter, MOVING_AVERAGE_WINDOW)
}

pub fn aggregate_with_window(
    borrowers: &[BorrowerRecord],
    stock: &[StockRecord],
    grants: &[GrantRecord],
    filter: &FilterState,
    window: usize,
) -> Vec<AggregatedPoint> {
    let mut by_quarter: BTreeMap<Quarter, Totals> = BTreeMap::new();

    for row in borrowers {
        let totals = by_quarter.entry(row.quarter()).or_default();
        if matches(row, filter) {
            totals.add_borrower(row);
        }
    }
    for row in stock {
        let totals = by_quarter.entry(row.quarter()).or_default();
        if matches(row, filter) {
            totals.add_stock(row);
        }
    }
    for row in grants {
        let totals = by_quarter.entry(row.quarter()).or_default();
        if matches(row, filter) {
            totals.add_grant(row);
        }
    }

    let mut series: Vec<AggregatedPoint> = by_quarter
        .into_iter()
        .map(|(quarter, totals)| totals.into_point(quarter))
        .collect();

    for metric in MetricKey::ALL {
        let values: Vec<Option<f64>> = series.iter().map(|p| p.value(metric)).collect();
        for (point, mean) in series.iter_mut().zip(trailing_mean(&values, window)) {
            point.moving_average.set(metric, mean);
        }
    }

    debug!(
        quarters = series.len(),
        borrower_rows = borrowers.len(),
        stock_rows = stock.len(),
        grant_rows = grants.len(),
        "aggregated quarterly series"
    );

    series
}

/// Values of one metric along a series, in order.
pub fn metric_series(series: &[AggregatedPoint], metric: MetricKey) -> Vec<Option<f64>> {
    series.iter().map(|p| p.value(metric)).collect()
}
