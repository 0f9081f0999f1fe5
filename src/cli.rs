//! CLI definition and dispatch.

use clap::{Args, Parser, Subcommand};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::debug;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::format::{format_delta, format_metric, quarter_label};
use crate::domain::breakdown::{BreakdownMode, Slice};
use crate::domain::config_validation::{build_engine_settings, build_filter, validate_config};
use crate::domain::engine::DashboardEngine;
use crate::domain::error::SabiaError;
use crate::domain::filter::FilterState;
use crate::domain::metric::MetricKey;
use crate::domain::period::parse_quarter;
use crate::domain::record::{Dimension, RowStore};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(
    name = "sabia",
    version,
    about = "Quarterly analytics over small-business credit data"
)]
pub struct Cli {
    /// INI configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
    /// Directory holding the CSV extracts, overriding `[data] dir`
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,
    /// Debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Command,
}

/// Per-dimension filter overrides. A dimension given here replaces the
/// `[filter]` list from the config file.
#[derive(Args, Debug, Default, Clone)]
pub struct FilterArgs {
    #[arg(long = "porte", value_delimiter = ',')]
    pub size: Vec<String>,
    #[arg(long = "sexo", value_delimiter = ',')]
    pub gender: Vec<String>,
    #[arg(long = "regiao", value_delimiter = ',')]
    pub region: Vec<String>,
    #[arg(long = "uf", value_delimiter = ',')]
    pub state: Vec<String>,
    #[arg(long = "origem", value_delimiter = ',')]
    pub origin: Vec<String>,
    #[arg(long = "modalidade", value_delimiter = ',')]
    pub modality: Vec<String>,
}

impl FilterArgs {
    pub fn apply(&self, base: FilterState) -> FilterState {
        [
            (Dimension::Size, &self.size),
            (Dimension::Gender, &self.gender),
            (Dimension::Region, &self.region),
            (Dimension::State, &self.state),
            (Dimension::Origin, &self.origin),
            (Dimension::Modality, &self.modality),
        ]
        .into_iter()
        .fold(base, |filter, (dimension, values)| {
            if values.is_empty() {
                filter
            } else {
                filter.with(dimension, values.iter().map(|v| v.trim().to_string()))
            }
        })
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Quarterly series of every metric with headline changes
    Summary {
        #[command(flatten)]
        filter: FilterArgs,
        /// Write the series as CSV
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Distribution of one metric by size tier and by gender in one quarter
    Breakdown {
        #[arg(short, long, default_value = "saldo")]
        metric: String,
        /// Target quarter (e.g. 2024-Q3); defaults to the latest with data
        #[arg(short, long)]
        quarter: Option<String>,
        /// Use the earliest quarter with data instead of the latest
        #[arg(long)]
        earliest: bool,
        #[command(flatten)]
        filter: FilterArgs,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// One metric per quarter, one column per value of a dimension
    Regional {
        #[arg(short, long, default_value = "saldo")]
        metric: String,
        /// Dimension to split by
        #[arg(long, default_value = "regiao")]
        by: String,
        #[command(flatten)]
        filter: FilterArgs,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Per-state table of one metric with trailing changes
    States {
        #[arg(short, long, default_value = "saldo")]
        metric: String,
        #[command(flatten)]
        filter: FilterArgs,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Linear-trend projection of one metric
    Forecast {
        #[arg(short, long, default_value = "saldo")]
        metric: String,
        /// Quarters to project, overriding `[forecast] horizon`
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        horizon: Option<u64>,
        #[command(flatten)]
        filter: FilterArgs,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Check the configuration and the input files
    Validate,
}

pub fn run(cli: Cli) -> ExitCode {
    let stdout = io::stdout();
    match execute(&cli, &mut stdout.lock()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

/// Loads configuration and data sources for `cli`, then runs its command.
pub fn execute(cli: &Cli, out: &mut dyn Write) -> Result<(), SabiaError> {
    let config = load_config(cli.config.as_deref())?;
    let data = CsvAdapter::from_config(&config, cli.data_dir.as_deref())?;
    run_command(&cli.command, &data, &config, &CsvReportAdapter::new(), out)
}

/// Reads the INI file at `path`; no path means every setting takes its default.
pub fn load_config(path: Option<&Path>) -> Result<FileConfigAdapter, SabiaError> {
    match path {
        Some(path) => {
            debug!(path = %path.display(), "loading config");
            FileConfigAdapter::from_file(path)
        }
        None => Ok(FileConfigAdapter::empty()),
    }
}

pub fn run_command(
    command: &Command,
    data: &dyn DataPort,
    config: &dyn ConfigPort,
    report: &dyn ReportPort,
    out: &mut dyn Write,
) -> Result<(), SabiaError> {
    validate_config(config)?;

    match command {
        Command::Validate => run_validate(data, out),
        Command::Summary { filter, output } => {
            let filter = filter.apply(build_filter(config));
            let mut engine = open_engine(data, config, None)?;
            run_summary(&mut engine, &filter, report, output.as_deref(), out)
        }
        Command::Breakdown {
            metric,
            quarter,
            earliest,
            filter,
            output,
        } => {
            let metric: MetricKey = metric.parse()?;
            let target = quarter.as_deref().map(parse_quarter).transpose()?;
            let mode = if *earliest {
                BreakdownMode::Earliest
            } else {
                BreakdownMode::Latest
            };
            let filter = filter.apply(build_filter(config));
            let engine = open_engine(data, config, None)?;
            let breakdown = engine.breakdown(metric, &filter, mode, target);

            match breakdown.quarter {
                None => writeln!(out, "no {metric} data matches the filter")?,
                Some(q) => {
                    writeln!(out, "{metric} in {}", quarter_label(q))?;
                    print_slices(out, "porte", &breakdown.by_size, metric)?;
                    print_slices(out, "sexo", &breakdown.by_gender, metric)?;
                }
            }
            if let Some(path) = output {
                report.write_breakdown(&breakdown, metric, path)?;
            }
            Ok(())
        }
        Command::Regional {
            metric,
            by,
            filter,
            output,
        } => {
            let metric: MetricKey = metric.parse()?;
            let dimension: Dimension = by.parse()?;
            let filter = filter.apply(build_filter(config));
            let engine = open_engine(data, config, None)?;
            let rows = engine.regional(metric, &filter, dimension);

            let columns: Vec<&String> = rows
                .first()
                .map(|r| r.values.keys().collect())
                .unwrap_or_default();
            write!(out, "{:<8}", "")?;
            for column in &columns {
                write!(out, " {column:>20}")?;
            }
            writeln!(out)?;
            for row in &rows {
                write!(out, "{:<8}", quarter_label(row.quarter))?;
                for column in &columns {
                    write!(out, " {:>20}", format_metric(Some(row.get(column)), metric))?;
                }
                writeln!(out)?;
            }
            if let Some(path) = output {
                report.write_regional(&rows, metric, path)?;
            }
            Ok(())
        }
        Command::States {
            metric,
            filter,
            output,
        } => {
            let metric: MetricKey = metric.parse()?;
            let filter = filter.apply(build_filter(config));
            let engine = open_engine(data, config, None)?;
            let rows = engine.states(metric, &filter);
            let kind = metric.delta_kind();

            writeln!(
                out,
                "{:<4} {:<22} {:>20} {:>14} {:>14} {:>14}",
                "UF", "", metric.key(), "3m", "6m", "12m"
            )?;
            for row in &rows {
                writeln!(
                    out,
                    "{:<4} {:<22} {:>20} {:>14} {:>14} {:>14}",
                    row.code,
                    row.name,
                    format_metric(row.current, metric),
                    format_delta(row.var_3m, kind),
                    format_delta(row.var_6m, kind),
                    format_delta(row.var_12m, kind),
                )?;
            }
            if let Some(path) = output {
                report.write_states(&rows, metric, path)?;
            }
            Ok(())
        }
        Command::Forecast {
            metric,
            horizon,
            filter,
            output,
        } => {
            let metric: MetricKey = metric.parse()?;
            let filter = filter.apply(build_filter(config));
            let horizon = horizon.map(|h| h as usize);
            let mut engine = open_engine(data, config, horizon)?;
            let forecast = engine.forecast(metric, &filter)?;

            writeln!(out, "{}", forecast.model_info())?;
            for point in &forecast.points {
                writeln!(
                    out,
                    "{:<6} {:>20} {:>20} {:>20} {}",
                    quarter_label(point.quarter),
                    format_metric(point.central, metric),
                    format_metric(point.lower, metric),
                    format_metric(point.upper, metric),
                    if point.projected { "*" } else { "" },
                )?;
            }
            if let Some(path) = output {
                report.write_forecast(&forecast, path)?;
            }
            Ok(())
        }
    }
}

/// Loads every collection and builds an engine with the configured settings.
/// `horizon` overrides `[forecast] horizon`.
pub fn open_engine(
    data: &dyn DataPort,
    config: &dyn ConfigPort,
    horizon: Option<usize>,
) -> Result<DashboardEngine, SabiaError> {
    let store = data.load_store()?;
    let mut settings = build_engine_settings(config);
    if let Some(h) = horizon {
        settings.forecast.horizon = h;
    }
    debug!(rows = store.row_count(), "opened engine");
    Ok(DashboardEngine::new(store, settings))
}

fn run_summary(
    engine: &mut DashboardEngine,
    filter: &FilterState,
    report: &dyn ReportPort,
    output: Option<&Path>,
    out: &mut dyn Write,
) -> Result<(), SabiaError> {
    let series = engine.series(filter).to_vec();
    if series.is_empty() {
        writeln!(out, "no data loaded")?;
        return Ok(());
    }

    write!(out, "{:<6}", "")?;
    for metric in MetricKey::ALL {
        write!(out, " {:>20}", metric.key())?;
    }
    writeln!(out)?;
    for point in &series {
        write!(out, "{:<6}", quarter_label(point.quarter))?;
        for metric in MetricKey::ALL {
            write!(out, " {:>20}", format_metric(point.value(metric), metric))?;
        }
        writeln!(out)?;
    }

    writeln!(out)?;
    for headline in engine.headlines(filter) {
        let kind = headline.metric.delta_kind();
        writeln!(
            out,
            "{:<14} {:>20}  QoQ {:>14}  YoY {:>14}",
            headline.metric.key(),
            format_metric(headline.latest, headline.metric),
            format_delta(headline.quarter_on_quarter, kind),
            format_delta(headline.year_on_year, kind),
        )?;
    }

    if let Some(path) = output {
        report.write_series(&series, path)?;
    }
    Ok(())
}

fn print_slices(
    out: &mut dyn Write,
    title: &str,
    slices: &[Slice],
    metric: MetricKey,
) -> Result<(), SabiaError> {
    writeln!(out, "  {title}")?;
    for slice in slices {
        writeln!(out, "    {:<20} {:>20}", slice.name, format_metric(slice.value, metric))?;
    }
    Ok(())
}

fn run_validate(data: &dyn DataPort, out: &mut dyn Write) -> Result<(), SabiaError> {
    let borrowers = data.load_borrowers()?;
    let stock = data.load_stock()?;
    let grants = data.load_grants()?;

    writeln!(out, "configuration ok")?;
    for (name, loaded, skipped) in [
        ("tomadores", borrowers.rows.len(), borrowers.skipped),
        ("estoque", stock.rows.len(), stock.skipped),
        ("concessao", grants.rows.len(), grants.skipped),
    ] {
        writeln!(out, "{name:<10} {loaded:>8} rows {skipped:>6} skipped")?;
    }

    let mut engine = DashboardEngine::new(
        RowStore::new(borrowers.rows, stock.rows, grants.rows),
        Default::default(),
    );
    let series = engine.series(&FilterState::all());
    if let (Some(first), Some(last)) = (series.first(), series.last()) {
        writeln!(
            out,
            "quarters   {} to {} ({})",
            first.quarter,
            last.quarter,
            series.len()
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_summary_with_filters() {
        let cli = Cli::parse_from([
            "sabia",
            "--data-dir",
            "/tmp/dados",
            "summary",
            "--porte",
            "MEI,Micro",
            "--uf",
            "SP",
        ]);
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/dados")));
        let Command::Summary { filter, output } = cli.command else {
            panic!("expected summary");
        };
        assert_eq!(filter.size, vec!["MEI", "Micro"]);
        assert_eq!(filter.state, vec!["SP"]);
        assert!(output.is_none());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::parse_from(["sabia", "states", "-m", "taxaJuros", "--verbose"]);
        assert!(cli.verbose);
        let Command::States { metric, .. } = cli.command else {
            panic!("expected states");
        };
        assert_eq!(metric, "taxaJuros");
    }

    #[test]
    fn zero_horizon_rejected_by_parser() {
        assert!(Cli::try_parse_from(["sabia", "forecast", "--horizon", "0"]).is_err());
    }

    #[test]
    fn filter_args_override_config_per_dimension() {
        let base = FilterState::all()
            .with(Dimension::Size, ["Grande"])
            .with(Dimension::Region, ["Sul"]);
        let args = FilterArgs {
            size: vec!["MEI".into()],
            ..FilterArgs::default()
        };
        let filter = args.apply(base);
        assert!(filter.accepted(Dimension::Size).contains("MEI"));
        assert!(!filter.accepted(Dimension::Size).contains("Grande"));
        assert!(filter.accepted(Dimension::Region).contains("Sul"));
    }

    #[test]
    fn missing_config_file_is_config_error() {
        let err = load_config(Some(Path::new("/nonexistent/sabia.ini")))
            .err()
            .unwrap();
        assert!(matches!(err, SabiaError::ConfigParse { .. }));
    }
}
