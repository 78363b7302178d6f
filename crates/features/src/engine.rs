//! Feature computation engine.
//!
//! Runs a configured list of feature requests against a record store and
//! collects one outcome per request.

use crate::{
    calendar::{datetime_component, time_of_day_activity},
    card::{card_bin, card_check_digit},
    delta::GroupedDelta,
    executor::{CancelFlag, Executor},
    nth_interval::NthInterval,
    series::FeatureColumn,
    window::WindowCounter,
};
use fraud_core::config::{FeatureRequest, WindowStrategy};
use fraud_core::{Config, RecordStore, Result};
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Result of one feature request.
#[derive(Debug)]
pub struct FeatureOutcome {
    /// Requested output name.
    pub name: String,
    /// Computed column, or the error that stopped it.
    pub result: Result<FeatureColumn>,
    /// Wall time spent on the request.
    pub elapsed: Duration,
}

/// Outcomes of a full engine run, in request order.
#[derive(Debug, Default)]
pub struct FeatureReport {
    outcomes: Vec<FeatureOutcome>,
}

impl FeatureReport {
    /// All outcomes in request order.
    pub fn outcomes(&self) -> &[FeatureOutcome] {
        &self.outcomes
    }

    /// Successfully computed columns.
    pub fn columns(&self) -> impl Iterator<Item = &FeatureColumn> + '_ {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().ok())
    }

    /// Failed requests with their errors.
    pub fn failures(&self) -> impl Iterator<Item = (&str, &fraud_core::Error)> + '_ {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.name.as_str(), e)))
    }

    /// Column by output name.
    pub fn get(&self, name: &str) -> Option<&FeatureColumn> {
        self.outcomes
            .iter()
            .find(|o| o.name == name)
            .and_then(|o| o.result.as_ref().ok())
    }

    /// Whether every request succeeded.
    pub fn is_complete(&self) -> bool {
        self.outcomes.iter().all(|o| o.result.is_ok())
    }

    /// Join every successful column onto `store` as a new field.
    pub fn into_store(self, store: &RecordStore) -> Result<RecordStore> {
        let mut out = store.clone();
        for column in self.columns() {
            out = out.with_column(column.name(), column.to_field_values())?;
        }
        Ok(out)
    }
}

/// Feature computation engine.
pub struct FeatureEngine {
    /// Requests to run.
    requests: Vec<FeatureRequest>,
    /// Window counting strategy.
    strategy: WindowStrategy,
    /// Worker pool settings and cancel flag.
    executor: Executor,
}

impl FeatureEngine {
    /// Create a new feature engine from configuration.
    pub fn new(config: &Config) -> Self {
        Self {
            requests: config.features.clone(),
            strategy: config.window.strategy,
            executor: Executor::from_config(&config.parallel),
        }
    }

    /// Share a cancel flag with the caller.
    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.executor = self.executor.with_cancel(cancel);
        self
    }

    /// Configured requests.
    pub fn requests(&self) -> &[FeatureRequest] {
        &self.requests
    }

    /// Executor used for parallel work.
    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    /// Compute a single request. The column takes the request's name.
    pub fn compute_request(
        &self,
        store: &RecordStore,
        request: &FeatureRequest,
    ) -> Result<FeatureColumn> {
        request.validate()?;
        let column: FeatureColumn = match request {
            FeatureRequest::TimeDelta {
                time_field,
                group_field,
                ..
            } => GroupedDelta::new(time_field.as_str(), group_field.as_str())
                .compute(store, &self.executor)?
                .into(),
            FeatureRequest::WindowCount {
                time_field,
                key_fields,
                interval_minutes,
                ..
            } => WindowCounter::new(
                time_field.as_str(),
                key_fields.clone(),
                *interval_minutes,
                self.strategy,
            )?
            .count(store, &self.executor)?
            .into(),
            FeatureRequest::NthInterval { time_field, n, .. } => {
                NthInterval::new(time_field.as_str(), *n)?
                    .compute(store, &self.executor)?
                    .into()
            }
            FeatureRequest::DatetimeComponent {
                time_field,
                component,
                ..
            } => datetime_component(store, time_field, *component)?,
            FeatureRequest::TimeOfDayActivity { time_field, .. } => {
                time_of_day_activity(store, time_field)?.into()
            }
            FeatureRequest::CardBin { card_field, .. } => card_bin(store, card_field)?.into(),
            FeatureRequest::CardCheckDigit { card_field, .. } => {
                card_check_digit(store, card_field)?.into()
            }
        };
        Ok(column.with_name(request.name()))
    }

    /// Run every configured request.
    ///
    /// A failing request is reported in its own outcome and doesn't stop
    /// the others.
    pub fn compute(&self, store: &RecordStore) -> FeatureReport {
        let mut outcomes = Vec::with_capacity(self.requests.len());
        for request in &self.requests {
            let start = Instant::now();
            let result = self.compute_request(store, request);
            let elapsed = start.elapsed();
            match &result {
                Ok(column) => info!(
                    feature = request.name(),
                    records = column.len(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    "computed feature"
                ),
                Err(e) => warn!(feature = request.name(), error = %e, "feature failed"),
            }
            outcomes.push(FeatureOutcome {
                name: request.name().to_string(),
                result,
                elapsed,
            });
        }
        FeatureReport { outcomes }
    }
}
