//! Core types and configuration for the fraud-features system.
//!
//! This crate provides shared types used across all other crates:
//! - Record, field value and grouping-key types
//! - The in-memory record store
//! - Configuration structures
//! - Common error types

pub mod config;
pub mod error;
pub mod store;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};
pub use store::RecordStore;
pub use types::*;
