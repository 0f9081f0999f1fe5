//! Single-quarter distribution of one metric by size tier and by gender.

use crate::domain::aggregate::Totals;
use crate::domain::filter::{matches, FilterState};
use crate::domain::metric::{MetricKey, Source};
use crate::domain::period::Quarter;
use crate::domain::record::{BorrowerRecord, Dimension, Dimensioned, GrantRecord, StockRecord};
use std::collections::BTreeMap;
use tracing::debug;

/// How the target quarter is chosen when none is given explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BreakdownMode {
    /// Most recent quarter with matching rows for the metric's source.
    #[default]
    Latest,
    /// Earliest quarter with matching rows for the metric's source.
    Earliest,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Slice {
    pub name: String,
    /// `None` for a rate metric whose denominator is zero within the group.
    pub value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Breakdown {
    pub quarter: Option<Quarter>,
    pub by_size: Vec<Slice>,
    pub by_gender: Vec<Slice>,
}

#[derive(Default)]
struct Groups {
    by_size: BTreeMap<String, Totals>,
    by_gender: BTreeMap<String, Totals>,
}

impl Groups {
    fn entries<'a, R: Dimensioned>(&'a mut self, row: &R) -> Vec<&'a mut Totals> {
        let mut out = Vec::with_capacity(2);
        if let Some(size) = row.dimension(Dimension::Size) {
            out.push(self.by_size.entry(size.to_string()).or_default());
        }
        if let Some(gender) = row.dimension(Dimension::Gender) {
            out.push(self.by_gender.entry(gender.to_string()).or_default());
        }
        out
    }

    fn slices(groups: BTreeMap<String, Totals>, metric: MetricKey) -> Vec<Slice> {
        groups
            .into_iter()
            .map(|(name, totals)| Slice {
                name,
                value: totals.value(metric),
            })
            .collect()
    }
}

fn matching_quarters<R: Dimensioned>(rows: &[R], filter: &FilterState) -> Vec<Quarter> {
    rows.iter()
        .filter(|r| matches(*r, filter))
        .map(|r| r.quarter())
        .collect()
}

fn in_scope<R: Dimensioned>(row: &R, quarter: Quarter, filter: &FilterState) -> bool {
    row.quarter() == quarter && matches(row, filter)
}

fn resolve_target(
    metric: MetricKey,
    borrowers: &[BorrowerRecord],
    stock: &[StockRecord],
    grants: &[GrantRecord],
    filter: &FilterState,
    mode: BreakdownMode,
) -> Option<Quarter> {
    let quarters: Vec<Quarter> = match metric.source() {
        Source::Borrowers => matching_quarters(borrowers, filter),
        Source::Stock => matching_quarters(stock, filter),
        Source::Grants => matching_quarters(grants, filter),
    };
    match mode {
        BreakdownMode::Latest => quarters.into_iter().max(),
        BreakdownMode::Earliest => quarters.into_iter().min(),
    }
}

/// Groups the rows behind `metric` in one quarter by size tier and by gender.
///
/// `target` wins over `mode` when given. Groups without matching rows are
/// omitted. With no resolvable quarter both groupings are empty.
pub fn breakdown(
    metric: MetricKey,
    borrowers: &[BorrowerRecord],
    stock: &[StockRecord],
    grants: &[GrantRecord],
    filter: &FilterState,
    mode: BreakdownMode,
    target: Option<Quarter>,
) -> Breakdown {
    let Some(quarter) =
        target.or_else(|| resolve_target(metric, borrowers, stock, grants, filter, mode))
    else {
        debug!(%metric, "no target quarter for breakdown");
        return Breakdown::default();
    };

    let mut groups = Groups::default();

    match metric.source() {
        Source::Borrowers => {
            for row in borrowers.iter().filter(|r| in_scope(*r, quarter, filter)) {
                for totals in groups.entries(row) {
                    totals.add_borrower(row);
                }
            }
        }
        Source::Stock => {
            for row in stock.iter().filter(|r| in_scope(*r, quarter, filter)) {
                for totals in groups.entries(row) {
                    totals.add_stock(row);
                }
            }
        }
        Source::Grants => {
            for row in grants.iter().filter(|r| in_scope(*r, quarter, filter)) {
                for totals in groups.entries(row) {
                    totals.add_grant(row);
                }
            }
        }
    }

    debug!(
        %metric,
        %quarter,
        sizes = groups.by_size.len(),
        genders = groups.by_gender.len(),
        "computed breakdown"
    );

    Breakdown {
        quarter: Some(quarter),
        by_size: Groups::slices(groups.by_size, metric),
        by_gender: Groups::slices(groups.by_gender, metric),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn q(year: i32, index: u8) -> Quarter {
        Quarter::new(year, index).unwrap()
    }

    fn borrower(quarter: Quarter, size: &str, gender: &str, count: f64) -> BorrowerRecord {
        BorrowerRecord {
            quarter,
            size: size.into(),
            gender: gender.into(),
            region: "Nordeste".into(),
            state: "BA".into(),
            borrowers: count,
        }
    }

    fn stock(quarter: Quarter, size: &str, gender: &str, num: f64, den: f64) -> StockRecord {
        StockRecord {
            quarter,
            size: size.into(),
            gender: gender.into(),
            region: "Nordeste".into(),
            state: "BA".into(),
            origin: "Recursos Direcionados".into(),
            modality: "Investimento".into(),
            balance: 100.0,
            delinquent: 10.0,
            operations: 1.0,
            rate_numerator: num,
            rate_denominator: den,
        }
    }

    fn value(slices: &[Slice], name: &str) -> Option<f64> {
        slices.iter().find(|s| s.name == name).and_then(|s| s.value)
    }

    #[test]
    fn latest_mode_groups_latest_quarter() {
        let borrowers = vec![
            borrower(q(2024, 1), "MEI", "Feminino", 100.0),
            borrower(q(2024, 2), "MEI", "Feminino", 10.0),
            borrower(q(2024, 2), "MEI", "Masculino", 20.0),
            borrower(q(2024, 2), "Micro", "Feminino", 5.0),
        ];
        let result = breakdown(
            MetricKey::Borrowers,
            &borrowers,
            &[],
            &[],
            &FilterState::all(),
            BreakdownMode::Latest,
            None,
        );

        assert_eq!(result.quarter, Some(q(2024, 2)));
        assert_eq!(result.by_size.len(), 2);
        assert_relative_eq!(value(&result.by_size, "MEI").unwrap(), 30.0);
        assert_relative_eq!(value(&result.by_size, "Micro").unwrap(), 5.0);
        assert_relative_eq!(value(&result.by_gender, "Feminino").unwrap(), 15.0);
        assert_relative_eq!(value(&result.by_gender, "Masculino").unwrap(), 20.0);
    }

    #[test]
    fn explicit_target_wins() {
        let borrowers = vec![
            borrower(q(2024, 1), "MEI", "Feminino", 100.0),
            borrower(q(2024, 2), "MEI", "Feminino", 10.0),
        ];
        let result = breakdown(
            MetricKey::Borrowers,
            &borrowers,
            &[],
            &[],
            &FilterState::all(),
            BreakdownMode::Latest,
            Some(q(2024, 1)),
        );
        assert_relative_eq!(value(&result.by_size, "MEI").unwrap(), 100.0);
    }

    #[test]
    fn earliest_mode() {
        let borrowers = vec![
            borrower(q(2023, 4), "Grande", "Feminino", 1.0),
            borrower(q(2024, 2), "MEI", "Feminino", 10.0),
        ];
        let result = breakdown(
            MetricKey::Borrowers,
            &borrowers,
            &[],
            &[],
            &FilterState::all(),
            BreakdownMode::Earliest,
            None,
        );
        assert_eq!(result.quarter, Some(q(2023, 4)));
        assert_eq!(result.by_size.len(), 1);
        assert_eq!(result.by_size[0].name, "Grande");
    }

    #[test]
    fn groups_without_rows_are_omitted() {
        let borrowers = vec![
            borrower(q(2024, 1), "MEI", "Feminino", 10.0),
            borrower(q(2024, 1), "Grande", "Masculino", 10.0),
        ];
        let filter = FilterState::all().with(Dimension::Gender, ["Feminino"]);
        let result = breakdown(
            MetricKey::Borrowers,
            &borrowers,
            &[],
            &[],
            &filter,
            BreakdownMode::Latest,
            None,
        );
        assert_eq!(result.by_size.len(), 1);
        assert_eq!(result.by_gender.len(), 1);
        assert_eq!(value(&result.by_size, "Grande"), None);
    }

    #[test]
    fn rate_metric_uses_weighted_ratio_per_group() {
        let stock = vec![
            stock(q(2024, 1), "MEI", "Feminino", 10.0, 100.0),
            stock(q(2024, 1), "MEI", "Masculino", 30.0, 100.0),
            stock(q(2024, 1), "Micro", "Feminino", 0.0, 0.0),
        ];
        let result = breakdown(
            MetricKey::InterestRate,
            &[],
            &stock,
            &[],
            &FilterState::all(),
            BreakdownMode::Latest,
            None,
        );
        assert_relative_eq!(value(&result.by_size, "MEI").unwrap(), 0.2);
        let micro = result.by_size.iter().find(|s| s.name == "Micro").unwrap();
        assert_eq!(micro.value, None);
        assert_relative_eq!(value(&result.by_gender, "Feminino").unwrap(), 0.1);
    }

    #[test]
    fn no_rows_gives_empty_groupings() {
        let result = breakdown(
            MetricKey::Granted,
            &[],
            &[],
            &[],
            &FilterState::all(),
            BreakdownMode::Latest,
            None,
        );
        assert_eq!(result, Breakdown::default());
    }

    #[test]
    fn target_without_rows_gives_empty_groupings() {
        let borrowers = vec![borrower(q(2024, 1), "MEI", "Feminino", 10.0)];
        let result = breakdown(
            MetricKey::Borrowers,
            &borrowers,
            &[],
            &[],
            &FilterState::all(),
            BreakdownMode::Latest,
            Some(q(2020, 1)),
        );
        assert!(result.by_size.is_empty());
        assert!(result.by_gender.is_empty());
    }

    #[test]
    fn slices_are_sorted_by_name() {
        let borrowers = vec![
            borrower(q(2024, 1), "Pequeno", "Masculino", 1.0),
            borrower(q(2024, 1), "MEI", "Feminino", 1.0),
            borrower(q(2024, 1), "Micro", "Feminino", 1.0),
        ];
        let result = breakdown(
            MetricKey::Borrowers,
            &borrowers,
            &[],
            &[],
            &FilterState::all(),
            BreakdownMode::Latest,
            None,
        );
        let names: Vec<&str> = result.by_size.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["MEI", "Micro", "Pequeno"]);
    }
}
