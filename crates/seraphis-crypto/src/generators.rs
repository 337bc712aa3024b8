//! The three (four, counting the Ed25519 basepoint) independent generators
//! the composition proof and amount commitments are built over: `G` (the
//! Ed25519 basepoint), and `X`, `U`, `H` obtained by hashing fixed
//! domain-separated strings to a curve point via the Elligator 2 map.

use curve25519_dalek::constants::ED25519_BASEPOINT_POINT;
use curve25519_dalek::edwards::EdwardsPoint;
use curve25519_dalek::scalar::Scalar;
use std::sync::OnceLock;

use crate::{elligator2::ge_fromfe_frombytes_vartime, keccak256};

fn hash_to_point(domain: &[u8]) -> EdwardsPoint {
    let hash = keccak256(domain);
    let point = ge_fromfe_frombytes_vartime(&hash);
    // clear the cofactor: the map's image is not guaranteed to land in the
    // prime-order subgroup.
    point * Scalar::from(8u8)
}

/// `G`, the standard Ed25519 basepoint.
pub fn basepoint() -> EdwardsPoint {
    ED25519_BASEPOINT_POINT
}

/// `X`, the second independent generator used by the composition proof.
pub fn x_gen() -> EdwardsPoint {
    static X: OnceLock<EdwardsPoint> = OnceLock::new();
    *X.get_or_init(|| hash_to_point(b"seraphis x generator"))
}

/// `U`, the third independent generator used by the composition proof and
/// key images.
pub fn u_gen() -> EdwardsPoint {
    static U: OnceLock<EdwardsPoint> = OnceLock::new();
    *U.get_or_init(|| hash_to_point(b"seraphis u generator"))
}

/// `H`, the generator amount commitments blind against (`C = y*G + a*H`).
pub fn h_gen() -> EdwardsPoint {
    static H: OnceLock<EdwardsPoint> = OnceLock::new();
    *H.get_or_init(|| hash_to_point(b"seraphis h generator"))
}
