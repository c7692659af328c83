//! Chain errors

use thiserror::Error;

/// Chain result type
pub type ChainResult<T> = Result<T, ChainError>;

/// Chain errors
#[derive(Error, Debug)]
pub enum ChainError {
    /// Publish requested with identical roots
    #[error("State has not changed")]
    StateUnchanged,

    /// RPC or transaction failure
    #[error("Chain IO error: {0}")]
    ChainIO(String),

    /// Operator key bytes malformed
    #[error("Invalid operator key: {0}")]
    InvalidKey(String),

    /// Operation cancelled
    #[error("Operation cancelled")]
    Cancelled,
}
