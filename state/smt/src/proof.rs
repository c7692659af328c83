//! Inclusion and exclusion proofs

use ark_ff::Zero;
use serde::{Deserialize, Serialize};

use sigil_hash::{fr_bit, fr_from_le_bytes, fr_to_hex, poseidon_hash, Fr};

use crate::{SmtError, SmtResult};

/// Leaf occupying the queried path in an exclusion proof
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NodeAux {
    /// Key of the occupying leaf
    pub key: Fr,
    /// Value of the occupying leaf
    pub value: Fr,
}

/// Merkle proof for one key
///
/// `siblings` runs from the root down to the level above the terminal node;
/// its length never exceeds the tree depth. For exclusion proofs `node_aux`
/// carries the leaf found on the path, if any.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Proof {
    /// Whether the key is present
    pub existence: bool,
    /// Sibling hashes along the path
    pub siblings: Vec<Fr>,
    /// Occupying leaf for exclusion proofs
    pub node_aux: Option<NodeAux>,
}

impl Proof {
    /// Verify the proof against a root
    ///
    /// `value` participates only in inclusion proofs; exclusion proofs
    /// prove the absence of `key` regardless of value.
    pub fn verify(&self, root: Fr, key: Fr, value: Fr) -> bool {
        let mut mid = if self.existence {
            match poseidon_hash(&[key, value, Fr::from(1u64)]) {
                Ok(h) => h,
                Err(_) => return false,
            }
        } else {
            match self.node_aux {
                Some(aux) => {
                    // An exclusion proof whose occupying leaf matches the
                    // queried key proves nothing.
                    if aux.key == key {
                        return false;
                    }
                    match poseidon_hash(&[aux.key, aux.value, Fr::from(1u64)]) {
                        Ok(h) => h,
                        Err(_) => return false,
                    }
                }
                None => Fr::zero(),
            }
        };

        for level in (0..self.siblings.len()).rev() {
            let sibling = self.siblings[level];
            let pair = if fr_bit(&key, level) {
                [sibling, mid]
            } else {
                [mid, sibling]
            };
            mid = match poseidon_hash(&pair) {
                Ok(h) => h,
                Err(_) => return false,
            };
        }

        mid == root
    }

    /// Wire form with hex-encoded hashes
    pub fn to_wire(&self) -> ProofWire {
        ProofWire {
            existence: self.existence,
            siblings: self.siblings.iter().map(fr_to_hex).collect(),
            node_aux: self.node_aux.map(|aux| NodeAuxWire {
                key: fr_to_hex(&aux.key),
                value: fr_to_hex(&aux.value),
            }),
        }
    }
}

/// JSON-serializable proof
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProofWire {
    /// Whether the key is present
    pub existence: bool,
    /// Sibling hashes, canonical little-endian hex
    pub siblings: Vec<String>,
    /// Occupying leaf for exclusion proofs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_aux: Option<NodeAuxWire>,
}

/// JSON-serializable occupying leaf
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct NodeAuxWire {
    /// Key, canonical little-endian hex
    pub key: String,
    /// Value, canonical little-endian hex
    pub value: String,
}

impl ProofWire {
    /// Parse back into a verifiable proof
    pub fn to_proof(&self) -> SmtResult<Proof> {
        let siblings = self
            .siblings
            .iter()
            .map(|s| decode_fr(s))
            .collect::<SmtResult<Vec<_>>>()?;

        let node_aux = match &self.node_aux {
            Some(aux) => Some(NodeAux {
                key: decode_fr(&aux.key)?,
                value: decode_fr(&aux.value)?,
            }),
            None => None,
        };

        Ok(Proof {
            existence: self.existence,
            siblings,
            node_aux,
        })
    }
}

fn decode_fr(s: &str) -> SmtResult<Fr> {
    let bytes = hex::decode(s).map_err(|e| SmtError::CorruptNode(e.to_string()))?;
    Ok(fr_from_le_bytes(&bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_tree_exclusion() {
        // Exclusion against the zero root with no siblings and no aux
        let proof = Proof {
            existence: false,
            siblings: Vec::new(),
            node_aux: None,
        };
        assert!(proof.verify(Fr::zero(), Fr::from(5u64), Fr::zero()));
    }

    #[test]
    fn test_wire_roundtrip() {
        let proof = Proof {
            existence: false,
            siblings: vec![Fr::from(1u64), Fr::from(2u64)],
            node_aux: Some(NodeAux {
                key: Fr::from(3u64),
                value: Fr::from(4u64),
            }),
        };

        let wire = proof.to_wire();
        assert_eq!(wire.to_proof().unwrap(), proof);
    }
}
