//! Schema errors

use thiserror::Error;

/// Schema result type
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Schema errors
#[derive(Error, Debug)]
pub enum SchemaError {
    /// Document rejects the submitted data
    #[error("Schema validation failed: {0}")]
    SchemaInvalid(String),

    /// URL scheme has no loader
    #[error("No loader for scheme '{0}'")]
    UnsupportedScheme(String),

    /// Malformed document URL
    #[error("Invalid schema URL: {0}")]
    InvalidUrl(String),

    /// Transport failure
    #[error("Schema fetch failed: {0}")]
    Fetch(#[from] reqwest::Error),

    /// Document is not valid JSON
    #[error("Schema document is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Operation cancelled
    #[error("Operation cancelled")]
    Cancelled,
}
