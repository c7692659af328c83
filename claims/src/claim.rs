//! Core claim slot layout
//!
//! Eight 32-byte slots: index group `i_0..i_3` and value group `v_0..v_3`.
//!
//! - `i_0`: schema hash (16B) | flags (1B) | zero (3B) | version u32 LE (4B) | zero (8B)
//! - `i_1`: subject identifier (31B zero-padded) when the subject sits in the index
//! - `i_2`, `i_3`: index data
//! - `v_0`: revocation nonce u64 LE (8B) | expiration u64 LE (8B) | zero (16B)
//! - `v_1`: subject identifier when the subject sits in the value
//! - `v_2`, `v_3`: value data
//!
//! Flags byte: bits 0-1 subject position (0 none, 1 index, 2 value), bit 2
//! expiration present, bit 3 merklized-root present. Every slot must be a
//! canonical field element.

use serde::{Deserialize, Serialize};

use sigil_hash::{check_in_field, fr_from_le_bytes, fr_to_hex, poseidon_hash, Fr};

use crate::{ClaimError, ClaimResult, Identifier, SchemaHash};

const FLAG_SUBJECT_MASK: u8 = 0b0000_0011;
const FLAG_EXPIRATION: u8 = 0b0000_0100;

/// Where the subject identifier lives inside the claim
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubjectPosition {
    /// Self-claim: no subject slot
    #[default]
    None,
    /// Subject in `i_1`
    Index,
    /// Subject in `v_1`
    Value,
}

/// Data slots produced by the schema processor
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedSlots {
    /// Claim slot `i_2`
    pub index_a: [u8; 32],
    /// Claim slot `i_3`
    pub index_b: [u8; 32],
    /// Claim slot `v_2`
    pub value_a: [u8; 32],
    /// Claim slot `v_3`
    pub value_b: [u8; 32],
}

/// Inputs for building a core claim
#[derive(Clone, Debug)]
pub struct CoreClaimData {
    /// Schema hash
    pub schema_hash: SchemaHash,
    /// Data slots
    pub slots: ParsedSlots,
    /// Subject identifier, if any
    pub subject_id: Option<Identifier>,
    /// Subject placement
    pub subject_position: SubjectPosition,
    /// Expiration (unix seconds)
    pub expiration: Option<u64>,
    /// Claim version
    pub version: u32,
    /// Revocation nonce, unique per issuer
    pub revocation_nonce: u64,
}

/// The eight-slot on-chain claim shape
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoreClaim {
    /// Index slot group
    pub index: [[u8; 32]; 4],
    /// Value slot group
    pub value: [[u8; 32]; 4],
}

impl CoreClaim {
    /// Pack claim data into the slot layout
    pub fn encode(data: &CoreClaimData) -> ClaimResult<Self> {
        if data.subject_position != SubjectPosition::None && data.subject_id.is_none() {
            return Err(ClaimError::InvalidIdentifier(
                "subject position set without a subject id".into(),
            ));
        }

        let mut index = [[0u8; 32]; 4];
        let mut value = [[0u8; 32]; 4];

        index[0][..16].copy_from_slice(data.schema_hash.as_bytes());
        index[0][16] = flags_byte(data);
        index[0][20..24].copy_from_slice(&data.version.to_le_bytes());

        value[0][..8].copy_from_slice(&data.revocation_nonce.to_le_bytes());
        if let Some(expiration) = data.expiration {
            value[0][8..16].copy_from_slice(&expiration.to_le_bytes());
        }

        if let Some(subject) = &data.subject_id {
            match data.subject_position {
                SubjectPosition::Index => {
                    index[1][..31].copy_from_slice(subject.as_bytes());
                }
                SubjectPosition::Value => {
                    value[1][..31].copy_from_slice(subject.as_bytes());
                }
                SubjectPosition::None => {}
            }
        }

        index[2] = data.slots.index_a;
        index[3] = data.slots.index_b;
        value[2] = data.slots.value_a;
        value[3] = data.slots.value_b;

        let claim = Self { index, value };
        claim.check_slots()?;
        Ok(claim)
    }

    /// Build the issuer's auth claim, binding its public key coordinates
    /// into the index data slots
    pub fn new_auth(pk_x: &Fr, pk_y: &Fr) -> ClaimResult<Self> {
        let schema_hash = SchemaHash::from_hex(crate::AUTH_BJJ_SCHEMA_HASH)?;

        CoreClaim::encode(&CoreClaimData {
            schema_hash,
            slots: ParsedSlots {
                index_a: sigil_hash::fr_to_le_bytes(pk_x),
                index_b: sigil_hash::fr_to_le_bytes(pk_y),
                value_a: [0u8; 32],
                value_b: [0u8; 32],
            },
            subject_id: None,
            subject_position: SubjectPosition::None,
            expiration: None,
            version: 0,
            revocation_nonce: 0,
        })
    }

    /// Poseidon digest of the index slot group
    pub fn h_index(&self) -> ClaimResult<Fr> {
        Ok(poseidon_hash(&self.slot_elements(&self.index)?)?)
    }

    /// Poseidon digest of the value slot group
    pub fn h_value(&self) -> ClaimResult<Fr> {
        Ok(poseidon_hash(&self.slot_elements(&self.value)?)?)
    }

    /// Hex form of `h_index`, the claim's record key
    pub fn h_index_hex(&self) -> ClaimResult<String> {
        Ok(fr_to_hex(&self.h_index()?))
    }

    /// Schema hash from `i_0`
    pub fn schema_hash(&self) -> SchemaHash {
        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&self.index[0][..16]);
        SchemaHash::from_bytes(bytes)
    }

    /// Revocation nonce from `v_0`
    pub fn revocation_nonce(&self) -> u64 {
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&self.value[0][..8]);
        u64::from_le_bytes(bytes)
    }

    /// Claim version from `i_0`
    pub fn version(&self) -> u32 {
        let mut bytes = [0u8; 4];
        bytes.copy_from_slice(&self.index[0][20..24]);
        u32::from_le_bytes(bytes)
    }

    /// Expiration from `v_0`, if flagged
    pub fn expiration(&self) -> Option<u64> {
        if self.index[0][16] & FLAG_EXPIRATION == 0 {
            return None;
        }
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&self.value[0][8..16]);
        Some(u64::from_le_bytes(bytes))
    }

    /// Subject placement from the flags byte
    pub fn subject_position(&self) -> SubjectPosition {
        match self.index[0][16] & FLAG_SUBJECT_MASK {
            1 => SubjectPosition::Index,
            2 => SubjectPosition::Value,
            _ => SubjectPosition::None,
        }
    }

    /// Subject identifier, if any
    pub fn subject_id(&self) -> ClaimResult<Option<Identifier>> {
        let slot = match self.subject_position() {
            SubjectPosition::None => return Ok(None),
            SubjectPosition::Index => &self.index[1],
            SubjectPosition::Value => &self.value[1],
        };
        Identifier::from_bytes(&slot[..31]).map(Some)
    }

    fn slot_elements(&self, group: &[[u8; 32]; 4]) -> ClaimResult<Vec<Fr>> {
        group
            .iter()
            .map(|slot| fr_from_le_bytes(slot).map_err(|_| ClaimError::NotInField))
            .collect()
    }

    fn check_slots(&self) -> ClaimResult<()> {
        for slot in self.index.iter().chain(self.value.iter()) {
            if !check_in_field(slot) {
                return Err(ClaimError::NotInField);
            }
        }
        Ok(())
    }
}

fn flags_byte(data: &CoreClaimData) -> u8 {
    let mut flags = match data.subject_position {
        SubjectPosition::None => 0,
        SubjectPosition::Index => 1,
        SubjectPosition::Value => 2,
    };
    if data.expiration.is_some() {
        flags |= FLAG_EXPIRATION;
    }
    flags
}
