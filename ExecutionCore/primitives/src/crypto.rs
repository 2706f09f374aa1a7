//! Ed25519 curve helpers for the `Ed25519` computation.
//!
//! Scalars are 32-byte canonical little-endian encodings (reduced mod ℓ).
//! Points are 32-byte compressed Edwards Y encodings.

use curve25519_dalek::edwards::EdwardsPoint;
use curve25519_dalek::scalar::Scalar;

/// Multiply the Ed25519 base point by a canonical scalar.
///
/// Returns `None` if `scalar` is not a canonical encoding.
pub fn ec_mul_base(scalar: &[u8]) -> Option<[u8; 32]> {
    let bytes: [u8; 32] = scalar.try_into().ok()?;
    let scalar = Option::<Scalar>::from(Scalar::from_canonical_bytes(bytes))?;
    Some(EdwardsPoint::mul_base(&scalar).compress().to_bytes())
}

/// Reduce 64 uniformly random bytes into a canonical scalar encoding.
pub fn scalar_from_wide(bytes: &[u8; 64]) -> [u8; 32] {
    Scalar::from_bytes_mod_order_wide(bytes).to_bytes()
}

/// Canonical encoding of a small scalar.
pub fn scalar_from_u64(v: u64) -> [u8; 32] {
    Scalar::from(v).to_bytes()
}
