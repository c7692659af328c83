//! Canonical field element encoding
//!
//! Field elements serialize as 32-byte little-endian integers. Decoders
//! reject non-canonical input (values >= p) instead of reducing, so a byte
//! string round-trips to exactly one element or fails.

use ark_bn254::Fr;
use ark_ff::{BigInteger, BigInteger256, PrimeField};

use crate::{HashError, HashResult};

/// Serialize a field element as canonical 32-byte little-endian
pub fn fr_to_le_bytes(e: &Fr) -> [u8; 32] {
    let bytes = e.into_bigint().to_bytes_le();

    let mut out = [0u8; 32];
    out[..bytes.len()].copy_from_slice(&bytes);
    out
}

/// Parse up to 32 little-endian bytes as a canonical field element
///
/// Fails with `NotInField` when the value is >= p or the input is longer
/// than 32 bytes.
pub fn fr_from_le_bytes(bytes: &[u8]) -> HashResult<Fr> {
    if bytes.len() > 32 {
        return Err(HashError::NotInField);
    }

    let mut padded = [0u8; 32];
    padded[..bytes.len()].copy_from_slice(bytes);

    let mut limbs = [0u64; 4];
    for (i, limb) in limbs.iter_mut().enumerate() {
        let mut chunk = [0u8; 8];
        chunk.copy_from_slice(&padded[i * 8..(i + 1) * 8]);
        *limb = u64::from_le_bytes(chunk);
    }

    Fr::from_bigint(BigInteger256::new(limbs)).ok_or(HashError::NotInField)
}

/// Check whether 32 little-endian bytes encode a value < p
pub fn check_in_field(bytes: &[u8; 32]) -> bool {
    fr_from_le_bytes(bytes).is_ok()
}

/// Bit `i` of the canonical integer form (low-order first)
///
/// Sparse-Merkle-tree paths consume these bits from index 0 downward.
pub fn fr_bit(e: &Fr, i: usize) -> bool {
    e.into_bigint().get_bit(i)
}

/// Lowercase hex of the canonical little-endian encoding
pub fn fr_to_hex(e: &Fr) -> String {
    hex::encode(fr_to_le_bytes(e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_ff::{One, Zero};

    #[test]
    fn test_roundtrip() {
        let e = Fr::from(0xdead_beefu64);
        let bytes = fr_to_le_bytes(&e);
        assert_eq!(fr_from_le_bytes(&bytes).unwrap(), e);
    }

    #[test]
    fn test_zero_and_one() {
        assert_eq!(fr_to_le_bytes(&Fr::zero()), [0u8; 32]);

        let mut one = [0u8; 32];
        one[0] = 1;
        assert_eq!(fr_to_le_bytes(&Fr::one()), one);
    }

    #[test]
    fn test_rejects_modulus() {
        // p itself, little-endian: the smallest non-canonical value
        let p_le = {
            let mut out = [0u8; 32];
            for (i, limb) in Fr::MODULUS.0.iter().enumerate() {
                out[i * 8..(i + 1) * 8].copy_from_slice(&limb.to_le_bytes());
            }
            out
        };
        assert_eq!(fr_from_le_bytes(&p_le), Err(HashError::NotInField));
        assert!(!check_in_field(&p_le));
    }

    #[test]
    fn test_rejects_oversized_input() {
        assert_eq!(fr_from_le_bytes(&[0u8; 33]), Err(HashError::NotInField));
    }

    #[test]
    fn test_short_input_zero_extends() {
        assert_eq!(fr_from_le_bytes(&[5u8]).unwrap(), Fr::from(5u64));
    }

    #[test]
    fn test_bits_low_order_first() {
        let e = Fr::from(0b1010u64);
        assert!(!fr_bit(&e, 0));
        assert!(fr_bit(&e, 1));
        assert!(!fr_bit(&e, 2));
        assert!(fr_bit(&e, 3));
    }
}
