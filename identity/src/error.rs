//! Identity errors

use thiserror::Error;

/// Identity result type
pub type IdentityResult<T> = Result<T, IdentityError>;

/// Identity errors
#[derive(Error, Debug)]
pub enum IdentityError {
    /// Insert of an already-present claim
    #[error("Claim already exists")]
    Duplicate,

    /// Revocation nonce already present
    #[error("Nonce {0} is already revoked")]
    AlreadyRevoked(u64),

    /// Claim record lookup failed
    #[error("Claim not found: {0}")]
    ClaimNotFound(String),

    /// Tree operation failed
    #[error(transparent)]
    Smt(#[from] sigil_smt::SmtError),

    /// Persistence failed
    #[error(transparent)]
    Store(#[from] sigil_store::StoreError),

    /// Claim encoding failed
    #[error(transparent)]
    Claim(#[from] sigil_claims::ClaimError),

    /// Schema processing failed
    #[error(transparent)]
    Schema(#[from] sigil_schema::SchemaError),

    /// Signing failed
    #[error(transparent)]
    Signer(#[from] sigil_babyjub::SignerError),

    /// Hashing failed
    #[error(transparent)]
    Hash(#[from] sigil_hash::HashError),

    /// Stored state malformed
    #[error("Corrupt identity state: {0}")]
    Corrupt(String),
}
