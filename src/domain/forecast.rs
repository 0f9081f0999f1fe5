//! Linear-trend forecast with a widening confidence band.
//!
//! An ordinary least-squares line is fitted to `(period index, value)` over the
//! quarters where the metric is defined. Each projected quarter `h` steps past
//! the last observed one gets
//!
//! ```text
//! central = intercept + slope * x
//! band    = confidence_z * s * (1 + widening_per_step * h)
//! ```
//!
//! where `s` is the residual standard error of the fit. The band is symmetric
//! around the fitted line and is never clipped, so a declining trend may
//! project below zero.

use crate::domain::aggregate::AggregatedPoint;
use crate::domain::error::SabiaError;
use crate::domain::metric::MetricKey;
use crate::domain::period::Quarter;
use tracing::debug;

/// Fewest defined historical points a trend can be fitted to.
pub const MIN_HISTORY: usize = 2;

pub const DEFAULT_HORIZON: usize = 4;
pub const DEFAULT_CONFIDENCE_Z: f64 = 1.96;
pub const DEFAULT_WIDENING_PER_STEP: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecastConfig {
    pub horizon: usize,
    pub confidence_z: f64,
    pub widening_per_step: f64,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            horizon: DEFAULT_HORIZON,
            confidence_z: DEFAULT_CONFIDENCE_Z,
            widening_per_step: DEFAULT_WIDENING_PER_STEP,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendFit {
    pub slope: f64,
    pub intercept: f64,
    pub residual_std_error: f64,
    /// `None` when the observed values have no variance.
    pub r_squared: Option<f64>,
    pub points: usize,
}

impl TrendFit {
    pub fn predict(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }
}

/// Ordinary least squares over `(x, y)` pairs. `None` with fewer than two
/// points or when every `x` is the same.
pub fn fit_trend(observations: &[(f64, f64)]) -> Option<TrendFit> {
    if observations.len() < MIN_HISTORY {
        return None;
    }

    let n = observations.len() as f64;
    let mean_x = observations.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = observations.iter().map(|(_, y)| y).sum::<f64>() / n;

    let (sxx, sxy) = observations.iter().fold((0.0, 0.0), |(sxx, sxy), (x, y)| {
        (sxx + (x - mean_x).powi(2), sxy + (x - mean_x) * (y - mean_y))
    });
    if sxx == 0.0 {
        return None;
    }

    let slope = sxy / sxx;
    let intercept = mean_y - slope * mean_x;

    let sst: f64 = observations.iter().map(|(_, y)| (y - mean_y).powi(2)).sum();
    let sum_sq: f64 = observations.iter().map(|(_, y)| y * y).sum();
    let mut sse: f64 = observations
        .iter()
        .map(|(x, y)| (y - (intercept + slope * x)).powi(2))
        .sum();
    // Rounding noise on an exact fit.
    if sse <= f64::EPSILON * sum_sq {
        sse = 0.0;
    }

    let dof = observations.len() - MIN_HISTORY;
    let residual_std_error = if dof > 0 { (sse / dof as f64).sqrt() } else { 0.0 };
    let r_squared = if sst > 0.0 { Some(1.0 - sse / sst) } else { None };

    Some(TrendFit {
        slope,
        intercept,
        residual_std_error,
        r_squared,
        points: observations.len(),
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForecastPoint {
    pub quarter: Quarter,
    /// The aggregated point behind a historical entry; `None` when projected.
    pub observed: Option<AggregatedPoint>,
    pub central: Option<f64>,
    pub upper: Option<f64>,
    pub lower: Option<f64>,
    pub projected: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Forecast {
    pub metric: MetricKey,
    pub fit: TrendFit,
    pub points: Vec<ForecastPoint>,
}

impl Forecast {
    pub fn projections(&self) -> impl Iterator<Item = &ForecastPoint> {
        self.points.iter().filter(|p| p.projected)
    }

    /// One-line description of the fitted model.
    pub fn model_info(&self) -> String {
        let r2 = self
            .fit
            .r_squared
            .map(|r| format!("{r:.3}"))
            .unwrap_or_else(|| "n/a".to_string());
        format!(
            "linear trend (OLS) on {} quarters of {}: slope {:.4}/quarter, R² {}, residual s.e. {:.4}",
            self.fit.points, self.metric, self.fit.slope, r2, self.fit.residual_std_error
        )
    }
}

/// Projects `horizon` quarters past `series` with the default band settings.
pub fn forecast(
    series: &[AggregatedPoint],
    metric: MetricKey,
    horizon: usize,
) -> Result<Forecast, SabiaError> {
    let config = ForecastConfig {
        horizon,
        ..ForecastConfig::default()
    };
    forecast_with(series, metric, &config)
}

pub fn forecast_with(
    series: &[AggregatedPoint],
    metric: MetricKey,
    config: &ForecastConfig,
) -> Result<Forecast, SabiaError> {
    let observations: Vec<(f64, f64)> = series
        .iter()
        .enumerate()
        .filter_map(|(i, p)| p.value(metric).map(|v| (i as f64, v)))
        .collect();

    let insufficient = || SabiaError::InsufficientHistory {
        metric: metric.to_string(),
        points: observations.len(),
        minimum: MIN_HISTORY,
    };
    let fit = fit_trend(&observations).ok_or_else(insufficient)?;
    let last = series.last().ok_or_else(insufficient)?;
    let last_index = (series.len() - 1) as f64;

    let mut points: Vec<ForecastPoint> = series
        .iter()
        .map(|p| {
            let value = p.value(metric);
            ForecastPoint {
                quarter: p.quarter,
                observed: Some(p.clone()),
                central: value,
                upper: value,
                lower: value,
                projected: false,
            }
        })
        .collect();

    for step in 1..=config.horizon {
        let raw = fit.predict(last_index + step as f64);
        let half_width = config.confidence_z
            * fit.residual_std_error
            * (1.0 + config.widening_per_step * step as f64);
        points.push(ForecastPoint {
            quarter: last.quarter.offset(step as i64),
            observed: None,
            central: Some(raw),
            upper: Some(raw + half_width),
            lower: Some(raw - half_width),
            projected: true,
        });
    }

    debug!(
        %metric,
        history = fit.points,
        horizon = config.horizon,
        slope = fit.slope,
        "fitted forecast"
    );

    Ok(Forecast {
        metric,
        fit,
        points,
    })
}
