//! Record store construction for the fraud-features system.
//!
//! This crate handles:
//! - Timestamp parsing from the cleaning layer's text output
//! - The unparseable-timestamp policy (reject, exclude, sort last)
//! - Record store assembly with identity checks

pub mod parser;
pub mod store_builder;

pub use parser::TimestampParser;
pub use store_builder::{ColumnKind, IngestStats, StoreBuilder};
