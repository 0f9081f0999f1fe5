//! Memoising facade over the pure engine functions.
//!
//! Aggregated series are cached per `(store version, filter)`. Replacing the
//! row store bumps the version and drops the cache; [`DashboardEngine::invalidate`]
//! drops it explicitly.

use crate::domain::aggregate::{aggregate_with_window, AggregatedPoint, MOVING_AVERAGE_WINDOW};
use crate::domain::breakdown::{breakdown, Breakdown, BreakdownMode};
use crate::domain::error::SabiaError;
use crate::domain::filter::FilterState;
use crate::domain::forecast::{forecast_with, Forecast, ForecastConfig};
use crate::domain::geography::default_state_names;
use crate::domain::headline::{headlines, Headline};
use crate::domain::metric::MetricKey;
use crate::domain::period::Quarter;
use crate::domain::record::{Dimension, RowStore};
use crate::domain::regional::{regional_series, RegionalRow};
use crate::domain::state_table::{state_table, StateRow};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineSettings {
    pub moving_average_window: usize,
    pub forecast: ForecastConfig,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            moving_average_window: MOVING_AVERAGE_WINDOW,
            forecast: ForecastConfig::default(),
        }
    }
}

#[derive(Debug)]
pub struct DashboardEngine {
    store: RowStore,
    version: u64,
    settings: EngineSettings,
    state_names: BTreeMap<String, String>,
    series_cache: HashMap<(u64, FilterState), Vec<AggregatedPoint>>,
}

impl DashboardEngine {
    pub fn new(store: RowStore, settings: EngineSettings) -> Self {
        Self {
            store,
            version: 0,
            settings,
            state_names: default_state_names(),
            series_cache: HashMap::new(),
        }
    }

    pub fn with_state_names(mut self, names: BTreeMap<String, String>) -> Self {
        self.state_names = names;
        self
    }

    pub fn store(&self) -> &RowStore {
        &self.store
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn cached_series(&self) -> usize {
        self.series_cache.len()
    }

    pub fn replace_store(&mut self, store: RowStore) {
        self.store = store;
        self.version += 1;
        self.invalidate();
    }

    pub fn invalidate(&mut self) {
        debug!(entries = self.series_cache.len(), "invalidating series cache");
        self.series_cache.clear();
    }

    /// The aggregated quarterly series for `filter`, computed at most once per
    /// store version.
    pub fn series(&mut self, filter: &FilterState) -> &[AggregatedPoint] {
        let store = &self.store;
        let window = self.settings.moving_average_window;
        self.series_cache
            .entry((self.version, filter.clone()))
            .or_insert_with(|| {
                trace!("series cache miss");
                aggregate_with_window(&store.borrowers, &store.stock, &store.grants, filter, window)
            })
    }

    pub fn headlines(&mut self, filter: &FilterState) -> Vec<Headline> {
        headlines(self.series(filter))
    }

    pub fn breakdown(
        &self,
        metric: MetricKey,
        filter: &FilterState,
        mode: BreakdownMode,
        target: Option<Quarter>,
    ) -> Breakdown {
        breakdown(
            metric,
            &self.store.borrowers,
            &self.store.stock,
            &self.store.grants,
            filter,
            mode,
            target,
        )
    }

    pub fn regional(
        &self,
        metric: MetricKey,
        filter: &FilterState,
        dimension: Dimension,
    ) -> Vec<RegionalRow> {
        regional_series(
            metric,
            &self.store.borrowers,
            &self.store.stock,
            &self.store.grants,
            filter,
            dimension,
        )
    }

    pub fn states(&self, metric: MetricKey, filter: &FilterState) -> Vec<StateRow> {
        state_table(
            metric,
            &self.store.borrowers,
            &self.store.stock,
            &self.store.grants,
            filter,
            &self.state_names,
        )
    }

    pub fn forecast(
        &mut self,
        metric: MetricKey,
        filter: &FilterState,
    ) -> Result<Forecast, SabiaError> {
        let config = self.settings.forecast;
        forecast_with(self.series(filter), metric, &config)
    }
}
