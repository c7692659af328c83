//! Signer errors

use thiserror::Error;

/// Signer result type
pub type SignerResult<T> = Result<T, SignerError>;

/// Signer errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignerError {
    /// Message is not a canonical field element
    #[error("Message is not a canonical BN254 field element")]
    NotInField,

    /// Bytes do not encode a curve point
    #[error("Bytes do not encode a Baby Jubjub point")]
    InvalidPoint,

    /// Signature bytes malformed
    #[error("Malformed signature: {0}")]
    InvalidSignature(String),
}

impl From<sigil_hash::HashError> for SignerError {
    fn from(_: sigil_hash::HashError) -> Self {
        SignerError::NotInField
    }
}
