//! Single-signer composition proof: a Schnorr-like proof of knowledge of
//! `(x, y, z)` such that `K = x*G + y*X + z*U` and `KI = (z/y)*U`, with
//! `x` allowed to be zero (§4.7). The multisig variant lives in
//! `seraphis-multisig`, sharing this module's transcript and response
//! math but replacing the single-signer nonce with a merged MuSig2-style
//! bi-nonce.

use curve25519_dalek::edwards::EdwardsPoint;
use curve25519_dalek::scalar::Scalar;
use curve25519_dalek::traits::IsIdentity;

use crate::generators::{basepoint, u_gen, x_gen};
use crate::transcript::Transcript;
use crate::CryptoError;

/// A completed composition proof: `K_t1` is stored pre-multiplied by
/// `1/8` the way an on-wire proof element is, matching the cofactor
/// convention the rest of the curve handling in this crate uses.
#[derive(Debug, Clone)]
pub struct CompositionProof {
    pub c: Scalar,
    pub r_t1: Scalar,
    pub r_t2: Scalar,
    pub r_ki: Scalar,
    pub k_t1: EdwardsPoint,
}

fn inv8() -> Scalar {
    Scalar::from(8u8).invert()
}

fn challenge_message(message: &[u8; 32], k: &EdwardsPoint, ki: &EdwardsPoint, k_t1: &EdwardsPoint) -> Scalar {
    let mut t = Transcript::new();
    t.push_domain("spcomp-transcript")
        .push_point(&x_gen())
        .push_point(&u_gen())
        .push_bytes(message)
        .push_point(k)
        .push_point(ki)
        .push_point(k_t1);
    t.finish_scalar(&[])
}

fn challenge(m: &Scalar, k_t1_pub: &EdwardsPoint, k_t2_pub: &EdwardsPoint, ki_pub: &EdwardsPoint) -> Scalar {
    let mut t = Transcript::new();
    t.push_domain("spcomp-challenge")
        .push_scalar(m)
        .push_point(k_t1_pub)
        .push_point(k_t2_pub)
        .push_point(ki_pub);
    t.finish_scalar(&[])
}

/// `KI = (z/y) * U`.
pub fn key_image(y: &Scalar, z: &Scalar) -> EdwardsPoint {
    (z * y.invert()) * u_gen()
}

fn spendbase(x: &Scalar, y: &Scalar, z: &Scalar) -> EdwardsPoint {
    x * basepoint() + y * x_gen() + z * u_gen()
}

/// Prove knowledge of `(x, y, z)` for `K = x*G + y*X + z*U`. `x == 0` is
/// a legitimate private key (a Seraphis output with no onetime-address
/// `g`-component extension); `y` and `z` must be nonzero.
pub fn prove(
    message: &[u8; 32],
    k: &EdwardsPoint,
    x: &Scalar,
    y: &Scalar,
    z: &Scalar,
    nonce_t1: &Scalar,
    nonce_t2: &Scalar,
    nonce_ki: &Scalar,
) -> Result<CompositionProof, CryptoError> {
    if k.is_identity() {
        return Err(CryptoError::InvalidProof);
    }
    if *y == Scalar::ZERO || *z == Scalar::ZERO {
        return Err(CryptoError::InvalidProof);
    }
    if spendbase(x, y, z) != *k {
        return Err(CryptoError::InvalidProof);
    }

    let ki = key_image(y, z);
    let k_t1 = (y.invert() * inv8()) * k;

    let alpha_t1_pub = nonce_t1 * k;
    let alpha_t2_pub = nonce_t2 * basepoint();
    let alpha_ki_pub = nonce_ki * u_gen();

    let m = challenge_message(message, k, &ki, &k_t1);
    let c = challenge(&m, &alpha_t1_pub, &alpha_t2_pub, &alpha_ki_pub);

    let r_t1 = nonce_t1 - c * y.invert();
    let r_t2 = nonce_t2 - c * (x * y.invert());
    let r_ki = nonce_ki - c * (z * y.invert());

    Ok(CompositionProof { c, r_t1, r_t2, r_ki, k_t1 })
}

/// Verify a composition proof against a public key `K` and key image `KI`.
pub fn verify(proof: &CompositionProof, message: &[u8; 32], k: &EdwardsPoint, ki: &EdwardsPoint) -> bool {
    if ki.is_identity() {
        return false;
    }

    let m = challenge_message(message, k, ki, &proof.k_t1);

    let k_t1_full = Scalar::from(8u8) * proof.k_t1;
    if k_t1_full.is_identity() {
        return false;
    }
    let k_t2 = k_t1_full - x_gen() - ki;

    let part_t1 = proof.r_t1 * k + proof.c * k_t1_full;
    let part_t2 = proof.r_t2 * basepoint() + proof.c * k_t2;
    let part_ki = proof.r_ki * u_gen() + proof.c * ki;

    let nominal = challenge(&m, &part_t1, &part_t2, &part_ki);
    nominal == proof.c
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scalar(seed: &[u8]) -> Scalar {
        Scalar::from_bytes_mod_order(crate::to32(seed))
    }

    #[test]
    fn prove_and_verify_roundtrip() {
        let x = scalar(b"composition test x scalar.......");
        let y = scalar(b"composition test y scalar.......");
        let z = scalar(b"composition test z scalar.......");
        let k = spendbase(&x, &y, &z);
        let ki = key_image(&y, &z);
        let message = [42u8; 32];

        let nonce_t1 = scalar(b"nonce t1........................");
        let nonce_t2 = scalar(b"nonce t2........................");
        let nonce_ki = scalar(b"nonce ki........................");

        let proof = prove(&message, &k, &x, &y, &z, &nonce_t1, &nonce_t2, &nonce_ki).unwrap();
        assert!(verify(&proof, &message, &k, &ki));
    }

    #[test]
    fn zero_x_is_permitted() {
        let x = Scalar::ZERO;
        let y = scalar(b"zero x test y scalar............");
        let z = scalar(b"zero x test z scalar............");
        let k = spendbase(&x, &y, &z);
        let ki = key_image(&y, &z);
        let message = [7u8; 32];

        let nonce_t1 = scalar(b"zero x nonce t1..................");
        let nonce_t2 = scalar(b"zero x nonce t2..................");
        let nonce_ki = scalar(b"zero x nonce ki..................");

        let proof = prove(&message, &k, &x, &y, &z, &nonce_t1, &nonce_t2, &nonce_ki).unwrap();
        assert!(verify(&proof, &message, &k, &ki));
    }

    #[test]
    fn wrong_message_fails_verification() {
        let x = scalar(b"wrong msg test x scalar..........");
        let y = scalar(b"wrong msg test y scalar..........");
        let z = scalar(b"wrong msg test z scalar..........");
        let k = spendbase(&x, &y, &z);
        let ki = key_image(&y, &z);
        let message = [1u8; 32];
        let other_message = [2u8; 32];

        let nonce_t1 = scalar(b"wrong msg nonce t1...............");
        let nonce_t2 = scalar(b"wrong msg nonce t2...............");
        let nonce_ki = scalar(b"wrong msg nonce ki...............");

        let proof = prove(&message, &k, &x, &y, &z, &nonce_t1, &nonce_t2, &nonce_ki).unwrap();
        assert!(!verify(&proof, &other_message, &k, &ki));
    }

    #[test]
    fn zero_y_rejected() {
        let x = scalar(b"zero y test x scalar.............");
        let y = Scalar::ZERO;
        let z = scalar(b"zero y test z scalar.............");
        let k = x * basepoint() + z * u_gen();
        let message = [3u8; 32];
        let nonce_t1 = scalar(b"zero y nonce t1..................");
        let nonce_t2 = scalar(b"zero y nonce t2..................");
        let nonce_ki = scalar(b"zero y nonce ki..................");
        assert!(prove(&message, &k, &x, &y, &z, &nonce_t1, &nonce_t2, &nonce_ki).is_err());
    }
}
