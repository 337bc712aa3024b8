//! Curve and hash primitives, Jamtis key hierarchy, address/tag codec,
//! enote records, and the composition proof (single-signer half of the
//! signature scheme — see `seraphis-multisig` for the threshold variant).

pub mod address;
pub mod composition_proof;
pub mod elligator2;
pub mod enote;
pub mod error;
pub mod generators;
pub mod keys;
pub mod opaque;
pub mod transcript;

pub use error::CryptoError;

use curve25519_dalek::edwards::{CompressedEdwardsY, EdwardsPoint};
use curve25519_dalek::scalar::Scalar;
use tiny_keccak::{Hasher, Keccak};

/// Keccak-256 hash (the CryptoNote/Ethereum variant, not NIST SHA3).
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut keccak = Keccak::v256();
    let mut output = [0u8; 32];
    keccak.update(data);
    keccak.finalize(&mut output);
    output
}

/// Unkeyed Blake2b with a caller-chosen output length.
pub fn blake2b_hash(data: &[u8], out_len: usize) -> Vec<u8> {
    blake2b_simd::Params::new()
        .hash_length(out_len)
        .hash(data)
        .as_bytes()
        .to_vec()
}

/// Keyed Blake2b (RFC 7693), used for every domain-separated jamtis hash.
pub fn blake2b_keyed(data: &[u8], out_len: usize, key: &[u8]) -> Vec<u8> {
    blake2b_simd::Params::new()
        .hash_length(out_len)
        .key(key)
        .hash(data)
        .as_bytes()
        .to_vec()
}

pub(crate) fn to32(bytes: &[u8]) -> [u8; 32] {
    let mut buf = [0u8; 32];
    let len = bytes.len().min(32);
    buf[..len].copy_from_slice(&bytes[..len]);
    buf
}

/// Decompress a 32-byte canonical point encoding, rejecting invalid points.
pub fn decompress_point(bytes: &[u8; 32]) -> Result<EdwardsPoint, CryptoError> {
    CompressedEdwardsY(*bytes)
        .decompress()
        .ok_or(CryptoError::InvalidPoint)
}

/// Reduce an arbitrary byte string to a canonical scalar mod L.
pub fn scalar_from_bytes_mod_order(bytes: &[u8]) -> Scalar {
    Scalar::from_bytes_mod_order(to32(bytes))
}

/// Reject scalar is invalid (not already reduced), true zero allowed.
pub fn scalar_is_canonical_nonzero(s: &Scalar) -> bool {
    *s != Scalar::ZERO
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keccak256_is_32_bytes() {
        assert_eq!(keccak256(b"hello").len(), 32);
    }

    #[test]
    fn blake2b_keyed_differs_from_unkeyed() {
        let a = blake2b_hash(b"msg", 32);
        let b = blake2b_keyed(b"msg", 32, b"key");
        assert_ne!(a, b);
    }

    #[test]
    fn scalar_reduction_is_deterministic() {
        let a = scalar_from_bytes_mod_order(b"some arbitrary input bytes......");
        let b = scalar_from_bytes_mod_order(b"some arbitrary input bytes......");
        assert_eq!(a, b);
    }
}
