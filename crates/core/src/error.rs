//! Error types for the fraud-features system.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the fraud-features system.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid parameters or missing/mistyped fields.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Record identities missing, duplicated or unknown.
    #[error("Data integrity error: {0}")]
    DataIntegrity(String),

    /// Unparseable field value.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Computation stopped through a cancel flag.
    #[error("Computation cancelled")]
    Cancelled,

    /// Worker pool could not be set up.
    #[error("Parallelism error: {0}")]
    Parallelism(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }

    /// Create a data integrity error.
    pub fn data_integrity(msg: impl Into<String>) -> Self {
        Error::DataIntegrity(msg.into())
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Error::Parse(msg.into())
    }

    /// Create a parallelism error.
    pub fn parallelism(msg: impl Into<String>) -> Self {
        Error::Parallelism(msg.into())
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = Error::validation("interval must be positive");
        assert_eq!(err.to_string(), "Validation error: interval must be positive");

        let err = Error::data_integrity("record 7 appears twice");
        assert_eq!(err.to_string(), "Data integrity error: record 7 appears twice");

        assert_eq!(Error::Cancelled.to_string(), "Computation cancelled");
    }

    #[test]
    fn test_json_conversion() {
        let parse: std::result::Result<u32, _> = serde_json::from_str("not json");
        let err: Error = parse.unwrap_err().into();
        assert!(matches!(err, Error::Json(_)));
    }
}
