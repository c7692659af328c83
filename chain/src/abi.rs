//! `transitState` call encoding
//!
//! All parameters are statically sized, so the call data is the 4-byte
//! selector followed by twelve 32-byte words. The Groth16 `b` matrix is
//! encoded with its inner coordinates swapped — the pairing-curve
//! convention the verifier contract expects; dropping the swap makes
//! on-chain verification fail silently.

use sha3::{Digest, Keccak256};

use sigil_claims::Identifier;
use sigil_hash::{fr_to_le_bytes, Fr};

/// 32-byte big-endian ABI word
pub type Word = [u8; 32];

/// Groth16-style proof triple
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ZkProof {
    /// Proof point A
    pub a: [Word; 2],
    /// Proof point B
    pub b: [[Word; 2]; 2],
    /// Proof point C
    pub c: [Word; 2],
}

/// One state transition to anchor
#[derive(Clone, Debug)]
pub struct Transition {
    /// Identity being transitioned
    pub identifier: Identifier,
    /// State currently anchored (or the genesis state)
    pub old_state: Fr,
    /// State to anchor
    pub new_state: Fr,
    /// Whether `old_state` is the genesis state (not yet anchored)
    pub is_old_state_genesis: bool,
    /// Validity proof of the transition
    pub proof: ZkProof,
}

const TRANSIT_STATE_SIGNATURE: &str =
    "transitState(uint256,uint256,uint256,bool,uint256[2],uint256[2][2],uint256[2])";

/// Field element as a big-endian ABI word
pub fn fr_to_word(e: &Fr) -> Word {
    let mut word = fr_to_le_bytes(e);
    word.reverse();
    word
}

/// Identifier as a big-endian ABI word
///
/// The 31 identifier bytes are little-endian; the integer form reverses
/// them into the low bytes of the word.
pub fn id_to_word(id: &Identifier) -> Word {
    let mut word = [0u8; 32];
    for (i, byte) in id.as_bytes().iter().enumerate() {
        word[31 - i] = *byte;
    }
    word
}

/// ABI-encode a `transitState` call
pub fn encode_transit_state(transition: &Transition) -> Vec<u8> {
    let mut out = Vec::with_capacity(4 + 12 * 32);
    out.extend_from_slice(&selector(TRANSIT_STATE_SIGNATURE));

    out.extend_from_slice(&id_to_word(&transition.identifier));
    out.extend_from_slice(&fr_to_word(&transition.old_state));
    out.extend_from_slice(&fr_to_word(&transition.new_state));

    let mut genesis_word = [0u8; 32];
    genesis_word[31] = transition.is_old_state_genesis as u8;
    out.extend_from_slice(&genesis_word);

    out.extend_from_slice(&transition.proof.a[0]);
    out.extend_from_slice(&transition.proof.a[1]);

    // Pairing layout: b' = [[b01, b00], [b11, b10]]
    out.extend_from_slice(&transition.proof.b[0][1]);
    out.extend_from_slice(&transition.proof.b[0][0]);
    out.extend_from_slice(&transition.proof.b[1][1]);
    out.extend_from_slice(&transition.proof.b[1][0]);

    out.extend_from_slice(&transition.proof.c[0]);
    out.extend_from_slice(&transition.proof.c[1]);

    out
}

/// First four bytes of the Keccak-256 of a function signature
pub fn selector(signature: &str) -> [u8; 4] {
    let digest = Keccak256::digest(signature.as_bytes());
    let mut out = [0u8; 4];
    out.copy_from_slice(&digest[..4]);
    out
}
