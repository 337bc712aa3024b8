//! Fiat-Shamir transcript builder.
//!
//! A `Transcript` accumulates domain strings and fixed-width field
//! encodings into one byte buffer, then reduces that buffer to a scalar
//! or fixed-size digest via keyed Blake2b. Domain strings are
//! length-prefixed so two different decompositions of the same bytes
//! never collide; raw field/point encodings are appended without a
//! length prefix since every field this builder consumes is already a
//! fixed 32-byte value.

use curve25519_dalek::edwards::EdwardsPoint;
use curve25519_dalek::scalar::Scalar;

use crate::blake2b_keyed;

#[derive(Debug, Clone, Default)]
pub struct Transcript {
    buf: Vec<u8>,
}

impl Transcript {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Append a domain-separation label, length-prefixed.
    pub fn push_domain(&mut self, domain: &str) -> &mut Self {
        let bytes = domain.as_bytes();
        self.buf.push(bytes.len().min(255) as u8);
        self.buf.extend_from_slice(&bytes[..bytes.len().min(255)]);
        self
    }

    /// Append raw fixed-width bytes (point/scalar encodings) with no
    /// length prefix.
    pub fn push_bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    pub fn push_point(&mut self, point: &EdwardsPoint) -> &mut Self {
        self.push_bytes(&point.compress().to_bytes())
    }

    pub fn push_scalar(&mut self, scalar: &Scalar) -> &mut Self {
        self.push_bytes(&scalar.to_bytes())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// `H_n`: reduce the transcript to a scalar, keyed by an optional
    /// secret (pass `&[]` for the unkeyed variants).
    pub fn finish_scalar(&self, key: &[u8]) -> Scalar {
        let digest = blake2b_keyed(&self.buf, 32, key);
        Scalar::from_bytes_mod_order(crate::to32(&digest))
    }

    /// `H_32`: reduce to a 32-byte digest.
    pub fn finish_32(&self, key: &[u8]) -> [u8; 32] {
        crate::to32(&blake2b_keyed(&self.buf, 32, key))
    }

    /// `H_8`: reduce to an 8-byte digest (amount mask).
    pub fn finish_8(&self, key: &[u8]) -> [u8; 8] {
        let digest = blake2b_keyed(&self.buf, 8, key);
        let mut out = [0u8; 8];
        out.copy_from_slice(&digest);
        out
    }

    /// `H_1`: reduce to a single byte (view tag).
    pub fn finish_1(&self, key: &[u8]) -> u8 {
        blake2b_keyed(&self.buf, 1, key)[0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_prefix_disambiguates_concatenation() {
        let mut a = Transcript::new();
        a.push_domain("ab").push_domain("c");
        let mut b = Transcript::new();
        b.push_domain("a").push_domain("bc");
        assert_ne!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn finish_is_deterministic() {
        let mut t = Transcript::new();
        t.push_domain("test").push_bytes(&[1, 2, 3]);
        let s1 = t.finish_scalar(b"key");
        let s2 = t.finish_scalar(b"key");
        assert_eq!(s1, s2);
    }

    #[test]
    fn different_keys_give_different_output() {
        let mut t = Transcript::new();
        t.push_domain("test");
        assert_ne!(t.finish_scalar(b"key1"), t.finish_scalar(b"key2"));
    }
}
