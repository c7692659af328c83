//! Tree nodes and their persisted encoding
//!
//! Node bytes are `[tag:1][payload]`: tag 1 = middle `{left, right}`,
//! tag 2 = leaf `{key, value}`, both payloads canonical little-endian.
//! Empty nodes hash to zero and are never stored.

use ark_ff::Zero;

use sigil_hash::{fr_from_le_bytes, fr_to_le_bytes, poseidon_hash, Fr};

use crate::{SmtError, SmtResult};

const TAG_MIDDLE: u8 = 1;
const TAG_LEAF: u8 = 2;

/// A single tree node
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Node {
    /// Absent subtree
    Empty,
    /// Terminal entry
    Leaf {
        /// Entry key
        key: Fr,
        /// Entry value
        value: Fr,
    },
    /// Internal node holding child hashes
    Middle {
        /// Left child hash
        left: Fr,
        /// Right child hash
        right: Fr,
    },
}

impl Node {
    /// Node hash: 0 / Poseidon(key, value, 1) / Poseidon(left, right)
    pub fn hash(&self) -> SmtResult<Fr> {
        match self {
            Node::Empty => Ok(Fr::zero()),
            Node::Leaf { key, value } => {
                Ok(poseidon_hash(&[*key, *value, Fr::from(1u64)])?)
            }
            Node::Middle { left, right } => Ok(poseidon_hash(&[*left, *right])?),
        }
    }

    /// Persisted encoding
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Node::Empty => Vec::new(),
            Node::Leaf { key, value } => {
                let mut out = Vec::with_capacity(65);
                out.push(TAG_LEAF);
                out.extend_from_slice(&fr_to_le_bytes(key));
                out.extend_from_slice(&fr_to_le_bytes(value));
                out
            }
            Node::Middle { left, right } => {
                let mut out = Vec::with_capacity(65);
                out.push(TAG_MIDDLE);
                out.extend_from_slice(&fr_to_le_bytes(left));
                out.extend_from_slice(&fr_to_le_bytes(right));
                out
            }
        }
    }

    /// Decode a persisted node
    pub fn from_bytes(bytes: &[u8]) -> SmtResult<Self> {
        if bytes.len() != 65 {
            return Err(SmtError::CorruptNode(format!(
                "expected 65 bytes, got {}",
                bytes.len()
            )));
        }

        let a = fr_from_le_bytes(&bytes[1..33])?;
        let b = fr_from_le_bytes(&bytes[33..65])?;

        match bytes[0] {
            TAG_MIDDLE => Ok(Node::Middle { left: a, right: b }),
            TAG_LEAF => Ok(Node::Leaf { key: a, value: b }),
            tag => Err(SmtError::CorruptNode(format!("unknown tag {}", tag))),
        }
    }
}
