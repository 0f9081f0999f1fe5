//! CSV report adapter.
//!
//! Machine-readable output for every engine result. Undefined values are
//! written as empty cells.

use crate::domain::aggregate::AggregatedPoint;
use crate::domain::breakdown::{Breakdown, Slice};
use crate::domain::error::SabiaError;
use crate::domain::forecast::Forecast;
use crate::domain::metric::MetricKey;
use crate::domain::regional::RegionalRow;
use crate::domain::state_table::StateRow;
use crate::ports::report_port::ReportPort;
use csv::Writer;
use serde::Serialize;
use std::fs::File;
use std::path::Path;
use tracing::info;

#[derive(Debug, Default, Clone, Copy)]
pub struct CsvReportAdapter;

impl CsvReportAdapter {
    pub fn new() -> Self {
        Self
    }
}

#[derive(Serialize)]
struct SeriesRow {
    quarter: String,
    tomadores: f64,
    operacoes: f64,
    concessao: f64,
    saldo: f64,
    inadimplencia: f64,
    #[serde(rename = "taxaJuros")]
    interest_rate: Option<f64>,
    #[serde(rename = "inadRate")]
    delinquency_rate: Option<f64>,
    ma_tomadores: Option<f64>,
    ma_operacoes: Option<f64>,
    ma_concessao: Option<f64>,
    ma_saldo: Option<f64>,
    ma_inadimplencia: Option<f64>,
    #[serde(rename = "ma_taxaJuros")]
    ma_interest_rate: Option<f64>,
    #[serde(rename = "ma_inadRate")]
    ma_delinquency_rate: Option<f64>,
}

impl From<&AggregatedPoint> for SeriesRow {
    fn from(p: &AggregatedPoint) -> Self {
        let ma = |m| p.moving_average.get(m);
        Self {
            quarter: p.quarter.to_string(),
            tomadores: p.borrowers,
            operacoes: p.operations,
            concessao: p.granted,
            saldo: p.balance,
            inadimplencia: p.delinquent,
            interest_rate: p.interest_rate,
            delinquency_rate: p.delinquency_rate,
            ma_tomadores: ma(MetricKey::Borrowers),
            ma_operacoes: ma(MetricKey::Operations),
            ma_concessao: ma(MetricKey::Granted),
            ma_saldo: ma(MetricKey::Balance),
            ma_inadimplencia: ma(MetricKey::Delinquent),
            ma_interest_rate: ma(MetricKey::InterestRate),
            ma_delinquency_rate: ma(MetricKey::DelinquencyRate),
        }
    }
}

#[derive(Serialize)]
struct ForecastRow<'a> {
    quarter: String,
    metric: &'a str,
    observed: Option<f64>,
    central: Option<f64>,
    lower: Option<f64>,
    upper: Option<f64>,
    projected: bool,
}

#[derive(Serialize)]
struct BreakdownRow {
    quarter: String,
    metric: &'static str,
    dimension: &'static str,
    name: String,
    value: Option<f64>,
}

#[derive(Serialize)]
struct StateCsvRow<'a> {
    uf: &'a str,
    name: &'a str,
    metric: &'a str,
    current: Option<f64>,
    var_3m: Option<f64>,
    var_6m: Option<f64>,
    var_12m: Option<f64>,
    is_rate: bool,
}

fn report_error(output: &Path, e: impl std::fmt::Display) -> SabiaError {
    SabiaError::Report {
        reason: format!("failed to write {}: {}", output.display(), e),
    }
}

fn writer(output: &Path) -> Result<Writer<File>, SabiaError> {
    Writer::from_path(output).map_err(|e| report_error(output, e))
}

fn finish(mut wtr: Writer<File>, output: &Path, rows: usize) -> Result<(), SabiaError> {
    wtr.flush().map_err(|e| report_error(output, e))?;
    info!(file = %output.display(), rows, "wrote report");
    Ok(())
}

fn write_rows<T: Serialize>(
    output: &Path,
    rows: impl IntoIterator<Item = T>,
) -> Result<(), SabiaError> {
    let mut wtr = writer(output)?;
    let mut count = 0;
    for row in rows {
        wtr.serialize(row).map_err(|e| report_error(output, e))?;
        count += 1;
    }
    finish(wtr, output, count)
}

impl ReportPort for CsvReportAdapter {
    fn write_series(&self, series: &[AggregatedPoint], output: &Path) -> Result<(), SabiaError> {
        write_rows(output, series.iter().map(SeriesRow::from))
    }

    fn write_forecast(&self, forecast: &Forecast, output: &Path) -> Result<(), SabiaError> {
        let metric = forecast.metric.key();
        write_rows(
            output,
            forecast.points.iter().map(|p| ForecastRow {
                quarter: p.quarter.to_string(),
                metric,
                observed: p.observed.as_ref().and_then(|o| o.value(forecast.metric)),
                central: p.central,
                lower: p.lower,
                upper: p.upper,
                projected: p.projected,
            }),
        )
    }

    fn write_breakdown(
        &self,
        breakdown: &Breakdown,
        metric: MetricKey,
        output: &Path,
    ) -> Result<(), SabiaError> {
        let quarter = breakdown
            .quarter
            .map(|q| q.to_string())
            .unwrap_or_default();
        let row = |dimension: &'static str, slice: &Slice| BreakdownRow {
            quarter: quarter.clone(),
            metric: metric.key(),
            dimension,
            name: slice.name.clone(),
            value: slice.value,
        };
        let sizes = breakdown.by_size.iter().map(|s| row("porte", s));
        let genders = breakdown.by_gender.iter().map(|s| row("sexo", s));
        write_rows(output, sizes.chain(genders))
    }

    fn write_regional(
        &self,
        rows: &[RegionalRow],
        metric: MetricKey,
        output: &Path,
    ) -> Result<(), SabiaError> {
        let mut wtr = writer(output)?;
        let columns: Vec<&String> = rows
            .first()
            .map(|r| r.values.keys().collect())
            .unwrap_or_default();

        let mut header = vec!["quarter".to_string(), "metric".to_string()];
        header.extend(columns.iter().map(|c| c.to_string()));
        wtr.write_record(&header)
            .map_err(|e| report_error(output, e))?;

        for row in rows {
            let mut record = vec![row.quarter.to_string(), metric.key().to_string()];
            record.extend(columns.iter().map(|c| row.get(c).to_string()));
            wtr.write_record(&record)
                .map_err(|e| report_error(output, e))?;
        }
        finish(wtr, output, rows.len())
    }

    fn write_states(
        &self,
        rows: &[StateRow],
        metric: MetricKey,
        output: &Path,
    ) -> Result<(), SabiaError> {
        write_rows(
            output,
            rows.iter().map(|r| StateCsvRow {
                uf: &r.code,
                name: &r.name,
                metric: metric.key(),
                current: r.current,
                var_3m: r.var_3m,
                var_6m: r.var_6m,
                var_12m: r.var_12m,
                is_rate: r.is_rate,
            }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregate::aggregate;
    use crate::domain::filter::FilterState;
    use crate::domain::forecast::forecast;
    use crate::domain::period::Quarter;
    use crate::domain::record::StockRecord;
    use std::collections::BTreeMap;
    use std::fs;
    use tempfile::TempDir;

    fn q(year: i32, index: u8) -> Quarter {
        Quarter::new(year, index).unwrap()
    }

    fn series() -> Vec<AggregatedPoint> {
        let stock: Vec<StockRecord> = [100.0, 110.0, 125.0]
            .iter()
            .enumerate()
            .map(|(i, &balance)| StockRecord {
                quarter: q(2024, 1).offset(i as i64),
                size: "MEI".into(),
                gender: "Feminino".into(),
                region: "Sul".into(),
                state: "SC".into(),
                origin: "Recursos Livres".into(),
                modality: "Outros".into(),
                balance,
                delinquent: 0.0,
                operations: 1.0,
                rate_numerator: 0.0,
                rate_denominator: 0.0,
            })
            .collect();
        aggregate(&[], &stock, &[], &FilterState::all())
    }

    fn lines(path: &Path) -> Vec<String> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn series_has_header_and_one_row_per_quarter() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("series.csv");
        CsvReportAdapter::new().write_series(&series(), &path).unwrap();

        let lines = lines(&path);
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("quarter,tomadores,operacoes,concessao,saldo"));
        assert!(lines[0].contains("taxaJuros"));
        // Undefined interest rate is an empty cell.
        assert!(lines[1].starts_with("2024-Q1,0.0,1.0,0.0,100.0,0.0,,0.0,"));
    }

    #[test]
    fn forecast_marks_projections() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("forecast.csv");
        let result = forecast(&series(), MetricKey::Balance, 2).unwrap();
        CsvReportAdapter::new().write_forecast(&result, &path).unwrap();

        let lines = lines(&path);
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[0], "quarter,metric,observed,central,lower,upper,projected");
        assert!(lines[1].ends_with("false"));
        assert!(lines[5].starts_with("2025-Q1,saldo,,"));
        assert!(lines[5].ends_with("true"));
    }

    #[test]
    fn regional_is_wide() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("regional.csv");
        let mut values = BTreeMap::new();
        values.insert("Norte".to_string(), 1.5);
        values.insert("Sul".to_string(), 0.0);
        let rows = vec![RegionalRow {
            quarter: q(2024, 1),
            values,
        }];
        CsvReportAdapter::new()
            .write_regional(&rows, MetricKey::Balance, &path)
            .unwrap();
        assert_eq!(lines(&path), vec!["quarter,metric,Norte,Sul", "2024-Q1,saldo,1.5,0"]);
    }

    #[test]
    fn breakdown_lists_both_groupings() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("breakdown.csv");
        let breakdown = Breakdown {
            quarter: Some(q(2024, 2)),
            by_size: vec![Slice {
                name: "MEI".into(),
                value: Some(3.0),
            }],
            by_gender: vec![Slice {
                name: "Feminino".into(),
                value: None,
            }],
        };
        CsvReportAdapter::new()
            .write_breakdown(&breakdown, MetricKey::InterestRate, &path)
            .unwrap();
        assert_eq!(
            lines(&path),
            vec![
                "quarter,metric,dimension,name,value",
                "2024-Q2,taxaJuros,porte,MEI,3.0",
                "2024-Q2,taxaJuros,sexo,Feminino,",
            ]
        );
    }

    #[test]
    fn states_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("states.csv");
        let rows = vec![StateRow {
            code: "SP".into(),
            name: "São Paulo".into(),
            current: Some(10.0),
            var_3m: Some(5.0),
            var_6m: None,
            var_12m: None,
            is_rate: false,
        }];
        CsvReportAdapter::new()
            .write_states(&rows, MetricKey::Borrowers, &path)
            .unwrap();
        let lines = lines(&path);
        assert_eq!(lines[0], "uf,name,metric,current,var_3m,var_6m,var_12m,is_rate");
        assert_eq!(lines[1], "SP,São Paulo,tomadores,10.0,5.0,,,false");
    }

    #[test]
    fn unwritable_path_is_a_report_error() {
        let err = CsvReportAdapter::new()
            .write_series(&series(), Path::new("/nonexistent/dir/out.csv"))
            .unwrap_err();
        assert!(matches!(err, SabiaError::Report { .. }));
    }
}
