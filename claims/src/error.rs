//! Claim errors

use thiserror::Error;

/// Claim result type
pub type ClaimResult<T> = Result<T, ClaimError>;

/// Claim errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClaimError {
    /// Slot bytes outside the field
    #[error("Slot is not a canonical BN254 field element")]
    NotInField,

    /// Identifier bytes malformed
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// Schema hash bytes malformed
    #[error("Invalid schema hash: {0}")]
    InvalidSchemaHash(String),

    /// Hashing failed
    #[error(transparent)]
    Hash(#[from] sigil_hash::HashError),
}
