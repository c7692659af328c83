//! Poseidon Hashing over the BN254 Scalar Field
//!
//! Every tree key, tree value, and state hash in the issuer is an element of
//! the BN254 scalar field. This crate owns the canonical byte encoding of
//! field elements and the fixed-width Poseidon hash used for leaf hashing,
//! node hashing, claim digests, and state commitments.

mod error;
mod field;
mod poseidon;

pub use error::{HashError, HashResult};
pub use field::{check_in_field, fr_bit, fr_from_le_bytes, fr_to_hex, fr_to_le_bytes};
pub use poseidon::{poseidon_hash, MAX_INPUTS};

pub use ark_bn254::Fr;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_hash_shape() {
        // H(claims_root, revocations_root, roots_root) is a single element
        let h = poseidon_hash(&[Fr::from(1u64), Fr::from(0u64), Fr::from(0u64)]).unwrap();
        assert_ne!(h, Fr::from(0u64));
    }
}
