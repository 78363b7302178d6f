//! Temporal feature computation for the fraud-features system.
//!
//! This crate handles:
//! - Ordering records by group key and timestamp
//! - Per-group time deltas
//! - Trailing-window counts per composite key
//! - N-th transaction intervals
//! - Calendar and card number features
//! - Reattaching derived values to the original record order

pub mod ordering;
pub mod partition;
pub mod executor;
pub mod series;
pub mod reattach;
pub mod delta;
pub mod window;
pub mod nth_interval;
pub mod calendar;
pub mod card;
pub mod engine;

pub use ordering::{normalize, normalize_by_time, OrderedView};
pub use executor::{CancelFlag, Executor};
pub use series::{FeatureColumn, FeatureSeries};
pub use reattach::Reattacher;
pub use delta::GroupedDelta;
pub use window::WindowCounter;
pub use nth_interval::NthInterval;
pub use engine::{FeatureEngine, FeatureOutcome, FeatureReport};
