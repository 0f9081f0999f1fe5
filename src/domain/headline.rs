//! Headline figures: latest value with quarter-on-quarter and year-on-year change.

use crate::domain::aggregate::{metric_series, AggregatedPoint};
use crate::domain::metric::MetricKey;
use crate::domain::period::Quarter;

/// Quarters back for the year-on-year comparison.
pub const YEAR_LOOKBACK: usize = 4;

#[derive(Debug, Clone, PartialEq)]
pub struct Headline {
    pub metric: MetricKey,
    pub quarter: Option<Quarter>,
    pub latest: Option<f64>,
    pub quarter_on_quarter: Option<f64>,
    pub year_on_year: Option<f64>,
}

pub fn headline(series: &[AggregatedPoint], metric: MetricKey) -> Headline {
    let values = metric_series(series, metric);
    let kind = metric.delta_kind();
    Headline {
        metric,
        quarter: series.last().map(|p| p.quarter),
        latest: values.last().copied().flatten(),
        quarter_on_quarter: kind.delta_back(&values, 1),
        year_on_year: kind.delta_back(&values, YEAR_LOOKBACK),
    }
}

/// Headlines for every metric, in [`MetricKey::ALL`] order.
pub fn headlines(series: &[AggregatedPoint]) -> Vec<Headline> {
    MetricKey::ALL.iter().map(|&m| headline(series, m)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregate::aggregate;
    use crate::domain::filter::FilterState;
    use crate::domain::record::StockRecord;
    use approx::assert_relative_eq;

    fn stock_series(balances: &[f64]) -> Vec<StockRecord> {
        balances
            .iter()
            .enumerate()
            .map(|(i, &balance)| StockRecord {
                quarter: Quarter::new(2023, 1).unwrap().offset(i as i64),
                size: "Micro".into(),
                gender: "Masculino".into(),
                region: "Sul".into(),
                state: "SC".into(),
                origin: "Recursos Livres".into(),
                modality: "Outros".into(),
                balance,
                delinquent: balance / 10.0,
                operations: 1.0,
                rate_numerator: 0.0,
                rate_denominator: 0.0,
            })
            .collect()
    }

    #[test]
    fn quarter_and_year_changes() {
        let series = aggregate(
            &[],
            &stock_series(&[100.0, 100.0, 100.0, 100.0, 120.0]),
            &[],
            &FilterState::all(),
        );
        let h = headline(&series, MetricKey::Balance);
        assert_eq!(h.quarter, Quarter::new(2024, 1));
        assert_relative_eq!(h.latest.unwrap(), 120.0);
        assert_relative_eq!(h.quarter_on_quarter.unwrap(), 20.0, epsilon = 1e-9);
        assert_relative_eq!(h.year_on_year.unwrap(), 20.0, epsilon = 1e-9);
    }

    #[test]
    fn short_series_has_no_year_on_year() {
        let series = aggregate(&[], &stock_series(&[100.0, 110.0]), &[], &FilterState::all());
        let h = headline(&series, MetricKey::Balance);
        assert!(h.quarter_on_quarter.is_some());
        assert_eq!(h.year_on_year, None);
    }

    #[test]
    fn rate_headline_uses_points() {
        let series = aggregate(&[], &stock_series(&[100.0, 200.0]), &[], &FilterState::all());
        let h = headline(&series, MetricKey::DelinquencyRate);
        assert_relative_eq!(h.latest.unwrap(), 0.1);
        assert_relative_eq!(h.quarter_on_quarter.unwrap(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn rate_changes_are_in_percentage_points() {
        let mut stock = stock_series(&[100.0; 5]);
        for (row, numerator) in stock.iter_mut().zip([18.0, 20.0, 20.0, 20.0, 25.0]) {
            row.rate_numerator = numerator;
            row.rate_denominator = 100.0;
        }
        let series = aggregate(&[], &stock, &[], &FilterState::all());
        let h = headline(&series, MetricKey::InterestRate);
        assert_relative_eq!(h.latest.unwrap(), 0.25);
        assert_relative_eq!(h.quarter_on_quarter.unwrap(), 5.0, epsilon = 1e-9);
        assert_relative_eq!(h.year_on_year.unwrap(), 7.0, epsilon = 1e-9);
    }

    #[test]
    fn empty_series() {
        let all = headlines(&[]);
        assert_eq!(all.len(), MetricKey::ALL.len());
        assert!(all.iter().all(|h| h.latest.is_none() && h.quarter.is_none()));
    }
}
