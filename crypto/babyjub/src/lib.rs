//! Baby Jubjub EdDSA-Poseidon
//!
//! Key handling and signing for the issuer identity. Baby Jubjub is the
//! twisted Edwards curve defined over the BN254 scalar field, so public-key
//! coordinates are themselves field elements and embed directly into claim
//! slots. Signatures bind a single field element (a claim's index hash)
//! with a Poseidon-derived challenge.

mod error;
mod point;
mod signer;

pub use error::{SignerError, SignerResult};
pub use point::{pack_point, unpack_point};
pub use signer::{PrivateKey, PublicKey, Signature};

/// Base field of the curve (the BN254 scalar field)
pub type BaseField = ark_bn254::Fr;

/// Prime-order subgroup scalar field
pub type SubgroupScalar = ark_ed_on_bn254::Fr;

#[cfg(test)]
mod tests {
    use super::*;
    use sigil_hash::Fr;

    #[test]
    fn test_sign_verify_roundtrip() {
        let sk = PrivateKey::from_bytes([7u8; 32]);
        let pk = sk.public();

        let msg = Fr::from(42u64);
        let sig = sk.sign(msg).unwrap();

        assert!(pk.verify(&sig, msg));
        assert!(!pk.verify(&sig, Fr::from(43u64)));
    }

    #[test]
    fn test_signature_compressed_roundtrip() {
        let sk = PrivateKey::from_bytes([9u8; 32]);
        let sig = sk.sign(Fr::from(1u64)).unwrap();

        let bytes = sig.to_bytes();
        let restored = Signature::from_bytes(&bytes).unwrap();
        assert!(sk.public().verify(&restored, Fr::from(1u64)));
    }
}
