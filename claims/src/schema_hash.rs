//! Truncated Keccak schema hashes

use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};

use crate::{ClaimError, ClaimResult};

/// 16-byte schema hash embedded in a claim's first index slot
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaHash([u8; 16]);

impl SchemaHash {
    /// Wrap raw bytes
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Low 16 bytes of `Keccak256(schema_bytes || type)`
    pub fn compute(schema_bytes: &[u8], credential_type: &str) -> Self {
        let mut hasher = Keccak256::new();
        hasher.update(schema_bytes);
        hasher.update(credential_type.as_bytes());
        let digest = hasher.finalize();

        let mut out = [0u8; 16];
        out.copy_from_slice(&digest[16..]);
        Self(out)
    }

    /// Parse from 32 hex characters
    pub fn from_hex(s: &str) -> ClaimResult<Self> {
        let bytes = hex::decode(s).map_err(|e| ClaimError::InvalidSchemaHash(e.to_string()))?;
        let arr: [u8; 16] = bytes
            .try_into()
            .map_err(|_| ClaimError::InvalidSchemaHash("expected 16 bytes".into()))?;
        Ok(Self(arr))
    }

    /// Underlying bytes
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// Hex form
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_is_deterministic() {
        let a = SchemaHash::compute(b"{}", "KYCAgeCredential");
        let b = SchemaHash::compute(b"{}", "KYCAgeCredential");
        assert_eq!(a, b);
    }

    #[test]
    fn test_type_participates() {
        let a = SchemaHash::compute(b"{}", "KYCAgeCredential");
        let b = SchemaHash::compute(b"{}", "KYCCountryCredential");
        assert_ne!(a, b);
    }

    #[test]
    fn test_hex_roundtrip() {
        let h = SchemaHash::compute(b"schema", "T");
        assert_eq!(SchemaHash::from_hex(&h.to_hex()).unwrap(), h);
    }

    #[test]
    fn test_rejects_short_hex() {
        assert!(SchemaHash::from_hex("abcd").is_err());
    }
}
