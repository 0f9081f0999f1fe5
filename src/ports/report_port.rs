//! Report output port trait.

use crate::domain::aggregate::AggregatedPoint;
use crate::domain::breakdown::Breakdown;
use crate::domain::error::SabiaError;
use crate::domain::forecast::Forecast;
use crate::domain::metric::MetricKey;
use crate::domain::regional::RegionalRow;
use crate::domain::state_table::StateRow;
use std::path::Path;

/// Port for writing engine results to a file.
pub trait ReportPort {
    /// Every metric of every quarter, with its moving average.
    fn write_series(&self, series: &[AggregatedPoint], output: &Path) -> Result<(), SabiaError>;

    fn write_forecast(&self, forecast: &Forecast, output: &Path) -> Result<(), SabiaError>;

    fn write_breakdown(
        &self,
        breakdown: &Breakdown,
        metric: MetricKey,
        output: &Path,
    ) -> Result<(), SabiaError>;

    fn write_regional(
        &self,
        rows: &[RegionalRow],
        metric: MetricKey,
        output: &Path,
    ) -> Result<(), SabiaError>;

    fn write_states(
        &self,
        rows: &[StateRow],
        metric: MetricKey,
        output: &Path,
    ) -> Result<(), SabiaError>;
}
