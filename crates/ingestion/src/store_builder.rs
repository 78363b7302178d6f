//! Record store assembly.
//!
//! Takes rows from the cleaning layer, parses declared timestamp columns and
//! applies the configured policy to timestamps that are missing or can't be
//! parsed.

use crate::parser::TimestampParser;
use fraud_core::config::{IngestConfig, ParsePolicy};
use fraud_core::{Error, FieldValue, Record, RecordStore, Result};
use serde::Serialize;
use tracing::{debug, info, warn};

/// How a column's text is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Parsed into a timestamp.
    Timestamp,
    /// Kept as a categorical string.
    Key,
}

/// Statistics about store construction.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestStats {
    /// Rows offered to the builder.
    pub rows_seen: u64,
    /// Rows that made it into the store.
    pub rows_kept: u64,
    /// Rows dropped under `ParsePolicy::Exclude`.
    pub rows_excluded: u64,
    /// Timestamp values that were empty or null markers.
    pub missing_timestamps: u64,
    /// Timestamp values that matched no known layout.
    pub unparseable_timestamps: u64,
}

impl IngestStats {
    /// Fraction of offered rows that were excluded.
    pub fn excluded_frac(&self) -> f64 {
        if self.rows_seen > 0 {
            self.rows_excluded as f64 / self.rows_seen as f64
        } else {
            0.0
        }
    }
}

/// Builder for a [`RecordStore`].
pub struct StoreBuilder {
    /// Declared columns.
    columns: Vec<(String, ColumnKind)>,
    /// Timestamp parser.
    parser: TimestampParser,
    /// Unparseable timestamp policy.
    policy: ParsePolicy,
    /// Accepted records.
    records: Vec<Record>,
    /// Construction statistics.
    stats: IngestStats,
}

impl StoreBuilder {
    /// Create a new builder with the given parse policy.
    pub fn new(policy: ParsePolicy) -> Self {
        Self {
            columns: Vec::new(),
            parser: TimestampParser::new(),
            policy,
            records: Vec::new(),
            stats: IngestStats::default(),
        }
    }

    /// Create a builder from configuration.
    pub fn from_config(config: &IngestConfig) -> Self {
        Self::new(config.parse_policy)
    }

    /// Declare a column.
    pub fn column(mut self, name: impl Into<String>, kind: ColumnKind) -> Self {
        self.columns.push((name.into(), kind));
        self
    }

    /// Replace the timestamp parser.
    pub fn with_parser(mut self, parser: TimestampParser) -> Self {
        self.parser = parser;
        self
    }

    /// Add a text row. `None` cells are missing values.
    pub fn push_row<S: AsRef<str>>(&mut self, id: u64, row: &[Option<S>]) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(Error::validation(format!(
                "row #{id} has {} cells, expected {}",
                row.len(),
                self.columns.len()
            )));
        }
        self.stats.rows_seen += 1;

        let mut values = Vec::with_capacity(row.len());
        let mut keep = true;

        for ((name, kind), cell) in self.columns.iter().zip(row) {
            let cell = cell.as_ref().map(|c| c.as_ref());
            let value = match kind {
                ColumnKind::Key => cell.map(FieldValue::from).unwrap_or(FieldValue::Null),
                ColumnKind::Timestamp => {
                    let parsed = match cell {
                        Some(text) => self.parser.parse(text),
                        None => Ok(None),
                    };
                    match parsed {
                        Ok(Some(ts)) => FieldValue::Timestamp(ts),
                        Ok(None) => {
                            self.stats.missing_timestamps += 1;
                            if self.policy == ParsePolicy::Exclude {
                                keep = false;
                            }
                            FieldValue::Null
                        }
                        Err(err) => {
                            self.stats.unparseable_timestamps += 1;
                            match self.policy {
                                ParsePolicy::Reject => {
                                    return Err(Error::parse(format!(
                                        "column '{name}' of row #{id}: {err}"
                                    )));
                                }
                                ParsePolicy::Exclude => {
                                    debug!(row = id, column = %name, "excluding row: {err}");
                                    keep = false;
                                }
                                ParsePolicy::SortLast => {}
                            }
                            FieldValue::Null
                        }
                    }
                }
            };
            values.push(value);
        }

        if keep {
            self.records.push(Record::new(id, values));
            self.stats.rows_kept += 1;
        } else {
            self.stats.rows_excluded += 1;
        }
        Ok(())
    }

    /// Add an already typed record.
    pub fn push_record(&mut self, record: Record) -> Result<()> {
        if record.values.len() != self.columns.len() {
            return Err(Error::validation(format!(
                "record {} has {} values, expected {}",
                record.id,
                record.values.len(),
                self.columns.len()
            )));
        }
        self.stats.rows_seen += 1;
        self.stats.rows_kept += 1;
        self.records.push(record);
        Ok(())
    }

    /// Get construction statistics so far.
    pub fn stats(&self) -> &IngestStats {
        &self.stats
    }

    /// Finish construction.
    pub fn build(self) -> Result<(RecordStore, IngestStats)> {
        if self.stats.rows_excluded > 0 {
            warn!(
                excluded = self.stats.rows_excluded,
                seen = self.stats.rows_seen,
                excluded_frac = self.stats.excluded_frac(),
                "rows excluded for missing or unparseable timestamps"
            );
        }
        info!(
            rows = self.stats.rows_kept,
            columns = self.columns.len(),
            "record store built"
        );

        let columns = self.columns.into_iter().map(|(name, _)| name).collect();
        let store = RecordStore::new(columns, self.records)?;
        Ok((store, self.stats))
    }
}
