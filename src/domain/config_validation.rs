//! Configuration validation and the typed settings built from it.
//!
//! Validates every `[engine]`, `[forecast]` and `[filter]` value before any
//! command touches the data.

use crate::domain::aggregate::MOVING_AVERAGE_WINDOW;
use crate::domain::engine::EngineSettings;
use crate::domain::error::SabiaError;
use crate::domain::filter::FilterState;
use crate::domain::forecast::{
    ForecastConfig, DEFAULT_CONFIDENCE_Z, DEFAULT_HORIZON, DEFAULT_WIDENING_PER_STEP,
};
use crate::domain::record::Dimension;
use crate::ports::config_port::ConfigPort;

pub fn validate_config(config: &dyn ConfigPort) -> Result<(), SabiaError> {
    validate_moving_average_window(config)?;
    validate_horizon(config)?;
    validate_confidence_z(config)?;
    validate_widening(config)?;
    validate_filter_lists(config)?;
    Ok(())
}

fn validate_moving_average_window(config: &dyn ConfigPort) -> Result<(), SabiaError> {
    let value = config.get_int("engine", "moving_average_window", MOVING_AVERAGE_WINDOW as i64);
    if value < 1 {
        return Err(SabiaError::ConfigInvalid {
            section: "engine".to_string(),
            key: "moving_average_window".to_string(),
            reason: "moving_average_window must be at least 1".to_string(),
        });
    }
    Ok(())
}

fn validate_horizon(config: &dyn ConfigPort) -> Result<(), SabiaError> {
    let value = config.get_int("forecast", "horizon", DEFAULT_HORIZON as i64);
    if value < 1 {
        return Err(SabiaError::ConfigInvalid {
            section: "forecast".to_string(),
            key: "horizon".to_string(),
            reason: "horizon must be at least 1".to_string(),
        });
    }
    Ok(())
}

fn validate_confidence_z(config: &dyn ConfigPort) -> Result<(), SabiaError> {
    let value = config.get_double("forecast", "confidence_z", DEFAULT_CONFIDENCE_Z);
    if value <= 0.0 || !value.is_finite() {
        return Err(SabiaError::ConfigInvalid {
            section: "forecast".to_string(),
            key: "confidence_z".to_string(),
            reason: "confidence_z must be positive".to_string(),
        });
    }
    Ok(())
}

fn validate_widening(config: &dyn ConfigPort) -> Result<(), SabiaError> {
    let value = config.get_double("forecast", "widening_per_step", DEFAULT_WIDENING_PER_STEP);
    if value < 0.0 || !value.is_finite() {
        return Err(SabiaError::ConfigInvalid {
            section: "forecast".to_string(),
            key: "widening_per_step".to_string(),
            reason: "widening_per_step must be non-negative".to_string(),
        });
    }
    Ok(())
}

/// A filter key that is set but lists nothing (e.g. `porte = ,`) is a typo,
/// not a request for "all".
fn validate_filter_lists(config: &dyn ConfigPort) -> Result<(), SabiaError> {
    for dimension in Dimension::ALL {
        let key = dimension.key();
        let Some(raw) = config.get_string("filter", key) else {
            continue;
        };
        if !raw.trim().is_empty() && config.get_list("filter", key).is_empty() {
            return Err(SabiaError::ConfigInvalid {
                section: "filter".to_string(),
                key: key.to_string(),
                reason: "filter list has no values".to_string(),
            });
        }
    }
    Ok(())
}

pub fn build_forecast_config(config: &dyn ConfigPort) -> ForecastConfig {
    ForecastConfig {
        horizon: config.get_int("forecast", "horizon", DEFAULT_HORIZON as i64).max(1) as usize,
        confidence_z: config.get_double("forecast", "confidence_z", DEFAULT_CONFIDENCE_Z),
        widening_per_step: config.get_double(
            "forecast",
            "widening_per_step",
            DEFAULT_WIDENING_PER_STEP,
        ),
    }
}

pub fn build_engine_settings(config: &dyn ConfigPort) -> EngineSettings {
    let window = config
        .get_int("engine", "moving_average_window", MOVING_AVERAGE_WINDOW as i64)
        .max(1) as usize;
    EngineSettings {
        moving_average_window: window,
        forecast: build_forecast_config(config),
    }
}

/// The `[filter]` section as a [`FilterState`]; absent or blank keys accept all.
pub fn build_filter(config: &dyn ConfigPort) -> FilterState {
    Dimension::ALL
        .iter()
        .fold(FilterState::all(), |filter, &dimension| {
            filter.with(dimension, config.get_list("filter", dimension.key()))
        })
}
