//! Hashing errors

use thiserror::Error;

/// Hash result type
pub type HashResult<T> = Result<T, HashError>;

/// Hashing errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HashError {
    /// Input count outside the supported 1..=16 range
    #[error("Poseidon arity {0} outside supported range 1..=16")]
    DomainOverflow(usize),

    /// Bytes do not encode a canonical field element
    #[error("Value is not a canonical BN254 field element")]
    NotInField,
}
