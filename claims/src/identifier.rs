//! Issuer identifiers
//!
//! A 31-byte value fixed at genesis: 2-byte type tag, the low 27 bytes of
//! the genesis state hash, and a 2-byte additive checksum. The identifier
//! never changes afterwards even as the state hash evolves.

use serde::{Deserialize, Serialize};

use sigil_hash::{fr_to_le_bytes, Fr};

use crate::{ClaimError, ClaimResult};

/// Default identity type tag
pub const TYPE_DEFAULT: [u8; 2] = [0x00, 0x00];

/// 31-byte issuer identifier
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identifier([u8; 31]);

impl Identifier {
    /// Derive the identifier from a genesis state hash
    pub fn from_genesis(type_tag: [u8; 2], genesis_state: &Fr) -> Self {
        let state_bytes = fr_to_le_bytes(genesis_state);

        let mut out = [0u8; 31];
        out[..2].copy_from_slice(&type_tag);
        out[2..29].copy_from_slice(&state_bytes[..27]);

        let checksum = checksum(&out[..29]);
        out[29..].copy_from_slice(&checksum);
        Self(out)
    }

    /// Wrap raw bytes, verifying the checksum
    pub fn from_bytes(bytes: &[u8]) -> ClaimResult<Self> {
        let arr: [u8; 31] = bytes
            .try_into()
            .map_err(|_| ClaimError::InvalidIdentifier("expected 31 bytes".into()))?;

        if checksum(&arr[..29]) != arr[29..] {
            return Err(ClaimError::InvalidIdentifier("checksum mismatch".into()));
        }
        Ok(Self(arr))
    }

    /// Parse the hex text form
    pub fn from_hex(s: &str) -> ClaimResult<Self> {
        let bytes = hex::decode(s).map_err(|e| ClaimError::InvalidIdentifier(e.to_string()))?;
        Self::from_bytes(&bytes)
    }

    /// Underlying bytes
    pub fn as_bytes(&self) -> &[u8; 31] {
        &self.0
    }

    /// Hex text form
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl std::fmt::Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Additive 16-bit checksum over the type tag and genesis bytes
fn checksum(bytes: &[u8]) -> [u8; 2] {
    let mut sum: u16 = 0;
    for b in bytes {
        sum = sum.wrapping_add(*b as u16);
    }
    sum.to_le_bytes()
}
