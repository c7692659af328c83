//! Tree errors

use thiserror::Error;

/// Tree result type
pub type SmtResult<T> = Result<T, SmtError>;

/// Tree errors
#[derive(Error, Debug)]
pub enum SmtError {
    /// Insert of an already-present key
    #[error("Key already exists in the tree")]
    KeyExists,

    /// Update or lookup of an absent key
    #[error("Key not found in the tree")]
    KeyNotFound,

    /// Two keys share all low-order bits up to the tree depth
    #[error("Tree depth {0} exceeded: keys share the full path prefix")]
    DepthExceeded(usize),

    /// Value outside the field
    #[error(transparent)]
    Hash(#[from] sigil_hash::HashError),

    /// Persistence failure
    #[error(transparent)]
    Store(#[from] sigil_store::StoreError),

    /// Stored node bytes malformed
    #[error("Corrupt node encoding: {0}")]
    CorruptNode(String),
}
