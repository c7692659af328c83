//! Key pairs and EdDSA-Poseidon signing

use ark_ec::{AffineRepr, CurveGroup};
use ark_ed_on_bn254::EdwardsAffine;
use ark_ff::{BigInteger, PrimeField};
use zeroize::{Zeroize, ZeroizeOnDrop};

use sigil_hash::{fr_from_le_bytes, fr_to_le_bytes, poseidon_hash, Fr};

use crate::point::{pack_point, unpack_point};
use crate::{SignerError, SignerResult, SubgroupScalar};

/// Issuer private key
///
/// The 32-byte seed expands to a subgroup scalar; the seed is wiped on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct PrivateKey {
    seed: [u8; 32],
}

/// Public point on Baby Jubjub
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PublicKey {
    /// x coordinate
    pub x: Fr,
    /// y coordinate
    pub y: Fr,
}

/// EdDSA-Poseidon signature
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Signature {
    /// Commitment point R = r * G
    pub r: EdwardsAffine,
    /// Response scalar s = r + c * k
    pub s: SubgroupScalar,
}

impl PrivateKey {
    /// Wrap 32 key bytes
    pub fn from_bytes(seed: [u8; 32]) -> Self {
        Self { seed }
    }

    /// Generate a fresh random key
    pub fn random<R: rand::RngCore>(rng: &mut R) -> Self {
        let mut seed = [0u8; 32];
        rng.fill_bytes(&mut seed);
        Self { seed }
    }

    /// Secret subgroup scalar derived from the seed
    fn scalar(&self) -> SubgroupScalar {
        let expanded = blake3::derive_key("sigil-babyjub-key-v1", &self.seed);
        SubgroupScalar::from_le_bytes_mod_order(&expanded)
    }

    /// Public point
    pub fn public(&self) -> PublicKey {
        let point = (EdwardsAffine::generator() * self.scalar()).into_affine();
        PublicKey {
            x: point.x,
            y: point.y,
        }
    }

    /// Sign a field element
    pub fn sign(&self, z: Fr) -> SignerResult<Signature> {
        let k = self.scalar();
        let pk = self.public();

        // Deterministic nonce from the secret scalar and the message
        let mut nonce_input = [0u8; 64];
        nonce_input[..32].copy_from_slice(&fr_to_le_bytes(&scalar_to_fr(&k)));
        nonce_input[32..].copy_from_slice(&fr_to_le_bytes(&z));
        let r_scalar =
            SubgroupScalar::from_le_bytes_mod_order(blake3::hash(&nonce_input).as_bytes());

        let r_point = (EdwardsAffine::generator() * r_scalar).into_affine();
        let c = challenge(&r_point, &pk, z)?;

        Ok(Signature {
            r: r_point,
            s: r_scalar + c * k,
        })
    }

    /// Sign up to 32 little-endian bytes interpreted as a field element
    pub fn sign_bytes(&self, le_bytes: &[u8]) -> SignerResult<Signature> {
        let z = fr_from_le_bytes(le_bytes)?;
        self.sign(z)
    }
}

impl PublicKey {
    /// Verify a signature over a field element: s*G == R + c*A
    pub fn verify(&self, sig: &Signature, z: Fr) -> bool {
        let a = EdwardsAffine::new_unchecked(self.x, self.y);
        if !a.is_on_curve() || !a.is_in_correct_subgroup_assuming_on_curve() {
            return false;
        }

        let c = match challenge(&sig.r, self, z) {
            Ok(c) => c,
            Err(_) => return false,
        };

        let lhs = EdwardsAffine::generator() * sig.s;
        let rhs = sig.r.into_group() + a * c;
        lhs.into_affine() == rhs.into_affine()
    }

    /// Compressed 32-byte form
    pub fn to_bytes(&self) -> [u8; 32] {
        pack_point(&EdwardsAffine::new_unchecked(self.x, self.y))
    }
}

impl Signature {
    /// Compressed 64-byte form: packed R followed by s little-endian
    pub fn to_bytes(&self) -> [u8; 64] {
        let mut out = [0u8; 64];
        out[..32].copy_from_slice(&pack_point(&self.r));

        let s_bytes = self.s.into_bigint().to_bytes_le();
        out[32..32 + s_bytes.len()].copy_from_slice(&s_bytes);
        out
    }

    /// Parse the compressed 64-byte form
    pub fn from_bytes(bytes: &[u8]) -> SignerResult<Self> {
        if bytes.len() != 64 {
            return Err(SignerError::InvalidSignature(format!(
                "expected 64 bytes, got {}",
                bytes.len()
            )));
        }

        let mut r_bytes = [0u8; 32];
        r_bytes.copy_from_slice(&bytes[..32]);
        let r = unpack_point(&r_bytes)?;

        let s = SubgroupScalar::from_le_bytes_mod_order(&bytes[32..]);
        Ok(Self { r, s })
    }
}

/// Challenge scalar c = Poseidon(R.x, R.y, A.x, A.y, z) reduced into the subgroup
fn challenge(r: &EdwardsAffine, pk: &PublicKey, z: Fr) -> SignerResult<SubgroupScalar> {
    let digest = poseidon_hash(&[r.x, r.y, pk.x, pk.y, z])?;
    Ok(SubgroupScalar::from_le_bytes_mod_order(&fr_to_le_bytes(
        &digest,
    )))
}

fn scalar_to_fr(s: &SubgroupScalar) -> Fr {
    let bytes = s.into_bigint().to_bytes_le();
    // The subgroup order is smaller than the base field modulus, so this
    // conversion cannot fail.
    fr_from_le_bytes(&bytes).unwrap_or_else(|_| Fr::from(0u64))
}

impl std::fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrivateKey").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_key_on_curve() {
        let sk = PrivateKey::from_bytes([1u8; 32]);
        let pk = sk.public();

        let point = EdwardsAffine::new_unchecked(pk.x, pk.y);
        assert!(point.is_on_curve());
        assert!(point.is_in_correct_subgroup_assuming_on_curve());
    }

    #[test]
    fn test_deterministic_signatures() {
        let sk = PrivateKey::from_bytes([3u8; 32]);
        let a = sk.sign(Fr::from(5u64)).unwrap();
        let b = sk.sign(Fr::from(5u64)).unwrap();
        assert_eq!(a.to_bytes(), b.to_bytes());
    }

    #[test]
    fn test_sign_bytes_rejects_noncanonical() {
        let sk = PrivateKey::from_bytes([3u8; 32]);
        assert_eq!(sk.sign_bytes(&[0xffu8; 33]), Err(SignerError::NotInField));
    }

    #[test]
    fn test_wrong_key_fails_verification() {
        let sk = PrivateKey::from_bytes([3u8; 32]);
        let other = PrivateKey::from_bytes([4u8; 32]);

        let sig = sk.sign(Fr::from(5u64)).unwrap();
        assert!(!other.public().verify(&sig, Fr::from(5u64)));
    }
}
