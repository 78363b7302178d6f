//! PyO3 bindings for the fraud-features engine.
//!
//! Exposes the Rust feature computations to Python:
//! - Record store construction from columns of strings
//! - Grouped time deltas
//! - Trailing-window counts
//! - N-th transaction intervals
//! - The configured feature engine

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::PyDict;

use fraud_core::{
    config::{ParsePolicy, WindowStrategy},
    Config, Error as RustError, RecordStore,
};
use fraud_features::{
    Executor, FeatureColumn, FeatureEngine, GroupedDelta, NthInterval, WindowCounter,
};
use fraud_ingestion::{ColumnKind, IngestStats, StoreBuilder};

fn to_py_err(e: RustError) -> PyErr {
    PyValueError::new_err(e.to_string())
}

fn policy_from_str(s: &str) -> PyResult<ParsePolicy> {
    match s {
        "reject" => Ok(ParsePolicy::Reject),
        "exclude" => Ok(ParsePolicy::Exclude),
        "sort_last" => Ok(ParsePolicy::SortLast),
        other => Err(PyValueError::new_err(format!(
            "invalid parse policy '{other}', expected reject, exclude or sort_last"
        ))),
    }
}

fn strategy_from_str(s: &str) -> PyResult<WindowStrategy> {
    match s {
        "by_group" => Ok(WindowStrategy::ByGroup),
        "sequential" => Ok(WindowStrategy::Sequential),
        other => Err(PyValueError::new_err(format!(
            "invalid window strategy '{other}', expected by_group or sequential"
        ))),
    }
}

fn column_to_py(py: Python<'_>, column: &FeatureColumn) -> PyObject {
    match column {
        FeatureColumn::Seconds(s) => s.values().to_vec().into_py(py),
        FeatureColumn::Integer(s) => s.values().to_vec().into_py(py),
        FeatureColumn::Ratio(s) => s.values().to_vec().into_py(py),
        FeatureColumn::Text(s) => s.values().to_vec().into_py(py),
    }
}

// ============================================================================
// Record Store
// ============================================================================

/// In-memory batch of transaction records.
#[pyclass]
pub struct PyRecordStore {
    inner: RecordStore,
    stats: IngestStats,
}

#[pymethods]
impl PyRecordStore {
    /// Build a store from a record id list, timestamp strings and key columns.
    ///
    /// `keys` is a list of `(name, values)` pairs. Missing values are `None`.
    #[new]
    #[pyo3(signature = (ids, timestamps, keys, time_field = "created", parse_policy = "sort_last"))]
    fn new(
        ids: Vec<u64>,
        timestamps: Vec<Option<String>>,
        keys: Vec<(String, Vec<Option<String>>)>,
        time_field: &str,
        parse_policy: &str,
    ) -> PyResult<Self> {
        if timestamps.len() != ids.len() {
            return Err(PyValueError::new_err(format!(
                "{} timestamps for {} ids",
                timestamps.len(),
                ids.len()
            )));
        }
        if let Some((name, values)) = keys.iter().find(|(_, v)| v.len() != ids.len()) {
            return Err(PyValueError::new_err(format!(
                "key column '{name}' has {} values for {} ids",
                values.len(),
                ids.len()
            )));
        }

        let mut builder = keys.iter().fold(
            StoreBuilder::new(policy_from_str(parse_policy)?)
                .column(time_field, ColumnKind::Timestamp),
            |b, (name, _)| b.column(name.as_str(), ColumnKind::Key),
        );

        for (row, &id) in ids.iter().enumerate() {
            let mut cells: Vec<Option<&str>> = Vec::with_capacity(keys.len() + 1);
            cells.push(timestamps[row].as_deref());
            cells.extend(keys.iter().map(|(_, v)| v[row].as_deref()));
            builder.push_row(id, &cells).map_err(to_py_err)?;
        }

        let (inner, stats) = builder.build().map_err(to_py_err)?;
        Ok(PyRecordStore { inner, stats })
    }

    fn __len__(&self) -> usize {
        self.inner.len()
    }

    /// Column names.
    #[getter]
    fn columns(&self) -> Vec<String> {
        self.inner.columns().to_vec()
    }

    /// Record ids in store order.
    #[getter]
    fn ids(&self) -> Vec<u64> {
        self.inner.ids().map(|id| id.0).collect()
    }

    /// Ingestion statistics: (seen, kept, excluded, missing, unparseable).
    fn stats(&self) -> (u64, u64, u64, u64, u64) {
        let s = &self.stats;
        (
            s.rows_seen,
            s.rows_kept,
            s.rows_excluded,
            s.missing_timestamps,
            s.unparseable_timestamps,
        )
    }

    fn __repr__(&self) -> String {
        format!(
            "PyRecordStore(records={}, columns={:?})",
            self.inner.len(),
            self.inner.columns()
        )
    }
}

// ============================================================================
// Single Features
// ============================================================================

/// Seconds since the previous record of the same group.
#[pyfunction]
#[pyo3(signature = (store, time_field, group_field, workers = 0))]
fn time_delta(
    py: Python<'_>,
    store: &PyRecordStore,
    time_field: &str,
    group_field: &str,
    workers: usize,
) -> PyResult<Vec<Option<f64>>> {
    let calc = GroupedDelta::new(time_field, group_field);
    py.allow_threads(|| calc.compute(&store.inner, &Executor::new(workers)))
        .map(|s| s.into_values())
        .map_err(to_py_err)
}

/// Records of the same composite key within a trailing interval.
#[pyfunction]
#[pyo3(signature = (store, time_field, key_fields, interval_minutes, strategy = "by_group", workers = 0))]
fn window_count(
    py: Python<'_>,
    store: &PyRecordStore,
    time_field: &str,
    key_fields: Vec<String>,
    interval_minutes: f64,
    strategy: &str,
    workers: usize,
) -> PyResult<Vec<Option<u32>>> {
    let counter = WindowCounter::new(
        time_field,
        key_fields,
        interval_minutes,
        strategy_from_str(strategy)?,
    )
    .map_err(to_py_err)?;
    py.allow_threads(|| counter.count(&store.inner, &Executor::new(workers)))
        .map(|s| s.into_values())
        .map_err(to_py_err)
}

/// Seconds spanned by the last `n` records in global time order.
#[pyfunction]
#[pyo3(signature = (store, time_field, n, workers = 0))]
fn nth_interval(
    py: Python<'_>,
    store: &PyRecordStore,
    time_field: &str,
    n: usize,
    workers: usize,
) -> PyResult<Vec<Option<f64>>> {
    let calc = NthInterval::new(time_field, n).map_err(to_py_err)?;
    py.allow_threads(|| calc.compute(&store.inner, &Executor::new(workers)))
        .map(|s| s.into_values())
        .map_err(to_py_err)
}

// ============================================================================
// Engine
// ============================================================================

/// Feature engine driven by a JSON configuration.
#[pyclass]
pub struct PyFeatureEngine {
    inner: FeatureEngine,
}

#[pymethods]
impl PyFeatureEngine {
    #[new]
    fn new(config_json: &str) -> PyResult<Self> {
        let config = Config::from_json_str(config_json).map_err(to_py_err)?;
        Ok(PyFeatureEngine {
            inner: FeatureEngine::new(&config),
        })
    }

    /// Create from a JSON configuration file.
    #[staticmethod]
    fn from_file(path: &str) -> PyResult<Self> {
        let config = Config::from_file(path).map_err(to_py_err)?;
        Ok(PyFeatureEngine {
            inner: FeatureEngine::new(&config),
        })
    }

    /// Names of the configured features.
    fn feature_names(&self) -> Vec<String> {
        self.inner
            .requests()
            .iter()
            .map(|r| r.name().to_string())
            .collect()
    }

    /// Compute every feature.
    ///
    /// Returns `(columns, failures)`: a dict of name to values in store
    /// order, and a dict of name to error message.
    fn compute<'py>(
        &self,
        py: Python<'py>,
        store: &PyRecordStore,
    ) -> PyResult<(Bound<'py, PyDict>, Bound<'py, PyDict>)> {
        let report = py.allow_threads(|| self.inner.compute(&store.inner));

        let columns = PyDict::new_bound(py);
        for column in report.columns() {
            columns.set_item(column.name(), column_to_py(py, column))?;
        }
        let failures = PyDict::new_bound(py);
        for (name, err) in report.failures() {
            failures.set_item(name, err.to_string())?;
        }
        Ok((columns, failures))
    }
}

/// Install a global `tracing` subscriber. Returns false if one is already set.
#[pyfunction]
#[pyo3(signature = (level = "info"))]
fn init_logging(level: &str) -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(level))
        .try_init()
        .is_ok()
}

// ============================================================================
// Module Definition
// ============================================================================

/// Fraud Features Core - temporal feature computation in Rust.
#[pymodule]
fn fraud_features_core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyRecordStore>()?;
    m.add_class::<PyFeatureEngine>()?;

    m.add_function(wrap_pyfunction!(time_delta, m)?)?;
    m.add_function(wrap_pyfunction!(window_count, m)?)?;
    m.add_function(wrap_pyfunction!(nth_interval, m)?)?;
    m.add_function(wrap_pyfunction!(init_logging, m)?)?;

    tracing::debug!("fraud_features_core module loaded");
    Ok(())
}
