//! Point compression
//!
//! A point packs into 32 bytes: the y coordinate in canonical little-endian
//! with the top bit carrying the parity of x. Unpacking solves the curve
//! equation `a*x^2 + y^2 = 1 + d*x^2*y^2` for x and picks the recorded
//! parity.

use ark_ec::twisted_edwards::TECurveConfig;
use ark_ed_on_bn254::{EdwardsAffine, EdwardsConfig};
use ark_ff::{BigInteger, Field, PrimeField};

use sigil_hash::{fr_from_le_bytes, fr_to_le_bytes};

use crate::{SignerError, SignerResult};

/// Compress a point to 32 bytes
pub fn pack_point(point: &EdwardsAffine) -> [u8; 32] {
    let mut out = fr_to_le_bytes(&point.y);
    if point.x.into_bigint().is_odd() {
        out[31] |= 0x80;
    }
    out
}

/// Decompress 32 bytes to a point
pub fn unpack_point(bytes: &[u8; 32]) -> SignerResult<EdwardsAffine> {
    let x_odd = bytes[31] & 0x80 != 0;

    let mut y_bytes = *bytes;
    y_bytes[31] &= 0x7f;
    let y = fr_from_le_bytes(&y_bytes).map_err(|_| SignerError::InvalidPoint)?;

    // x^2 = (1 - y^2) / (a - d * y^2)
    let y2 = y * y;
    let numerator = ark_bn254::Fr::from(1u64) - y2;
    let denominator = EdwardsConfig::COEFF_A - EdwardsConfig::COEFF_D * y2;
    let x2 = numerator * denominator.inverse().ok_or(SignerError::InvalidPoint)?;

    let mut x = x2.sqrt().ok_or(SignerError::InvalidPoint)?;
    if x.into_bigint().is_odd() != x_odd {
        x = -x;
    }

    let point = EdwardsAffine::new_unchecked(x, y);
    if !point.is_on_curve() || !point.is_in_correct_subgroup_assuming_on_curve() {
        return Err(SignerError::InvalidPoint);
    }

    Ok(point)
}
