//! Address indices, destination tuples, and enciphered on-chain tags.
//!
//! A jamtis address is identified by a 16-byte index `j`, never sent in
//! the clear: it is packed into a fixed-size tag with a 1-byte hint,
//! enciphered with a keystream keyed by `s_ct`, then XORed again with a
//! per-enote pad derived from the sender-receiver secret before being
//! embedded on-chain (`encrypted_address_tag`, §3.3).

use chacha20::cipher::{KeyIvInit, StreamCipher};
use chacha20::ChaCha20;
use curve25519_dalek::edwards::EdwardsPoint;
use curve25519_dalek::scalar::Scalar;

use crate::generators::{basepoint, u_gen, x_gen};
use crate::transcript::Transcript;
use crate::CryptoError;

pub const ADDRESS_INDEX_LEN: usize = 16;
pub const ADDRESS_TAG_LEN: usize = ADDRESS_INDEX_LEN + 1;

pub type AddressIndex = [u8; ADDRESS_INDEX_LEN];

/// A deciphered, in-the-clear address tag: the index plus a 1-byte hint
/// used to cheaply tell a plain destination from a self-send one
/// without re-deriving every candidate sender-receiver secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawAddressTag {
    pub index: AddressIndex,
    pub hint: u8,
}

impl RawAddressTag {
    fn encode(self) -> [u8; ADDRESS_TAG_LEN] {
        let mut out = [0u8; ADDRESS_TAG_LEN];
        out[..ADDRESS_INDEX_LEN].copy_from_slice(&self.index);
        out[ADDRESS_INDEX_LEN] = self.hint;
        out
    }

    fn decode(bytes: &[u8; ADDRESS_TAG_LEN]) -> Self {
        let mut index = [0u8; ADDRESS_INDEX_LEN];
        index.copy_from_slice(&bytes[..ADDRESS_INDEX_LEN]);
        Self {
            index,
            hint: bytes[ADDRESS_INDEX_LEN],
        }
    }
}

/// A plain (non-self-send) raw tag always carries `hint = 0`
/// (§4.3/§4.6: "plain path requires hint' == 0").
pub fn make_plain_raw_tag(index: AddressIndex) -> RawAddressTag {
    RawAddressTag { index, hint: 0 }
}

/// A self-send raw tag carries the (1-based) self-send type as its
/// hint, so the scanner can pick the matching `q` derivation directly
/// instead of exhaustively re-deriving `q` for every type.
pub fn make_selfsend_raw_tag(index: AddressIndex, self_send_type: u8) -> RawAddressTag {
    RawAddressTag {
        index,
        hint: self_send_type.wrapping_add(1),
    }
}

fn keystream(s_ct: &Scalar) -> ChaCha20 {
    let key = s_ct.to_bytes();
    let nonce = [0u8; 12];
    ChaCha20::new(&key.into(), &nonce.into())
}

/// `cipher_address_index`: enciphers a raw tag with a keystream keyed
/// by `s_ct`. Length-preserving, deterministic, its own inverse.
pub fn cipher_tag(s_ct: &Scalar, raw: RawAddressTag) -> [u8; ADDRESS_TAG_LEN] {
    let mut buf = raw.encode();
    keystream(s_ct).apply_keystream(&mut buf);
    buf
}

/// `try_decipher_address_index`: reverses `cipher_tag`. When `require_plain`
/// is set the call fails unless the recovered hint is zero.
pub fn try_decipher_tag(
    s_ct: &Scalar,
    tag: &[u8; ADDRESS_TAG_LEN],
    require_plain: bool,
) -> Result<RawAddressTag, CryptoError> {
    let mut buf = *tag;
    keystream(s_ct).apply_keystream(&mut buf);
    let raw = RawAddressTag::decode(&buf);
    if require_plain && raw.hint != 0 {
        return Err(CryptoError::AddressTagMismatch);
    }
    Ok(raw)
}

/// `encrypt_address_tag = cipher_tag ⊕ H("enc", q, Ko)`. Symmetric.
pub fn encrypt_tag(
    q: &[u8; 32],
    ko: &EdwardsPoint,
    cipher_tag: [u8; ADDRESS_TAG_LEN],
) -> [u8; ADDRESS_TAG_LEN] {
    let pad = tag_pad(q, ko);
    let mut out = cipher_tag;
    for (o, p) in out.iter_mut().zip(pad.iter()) {
        *o ^= p;
    }
    out
}

pub fn decrypt_tag(
    q: &[u8; 32],
    ko: &EdwardsPoint,
    encrypted: [u8; ADDRESS_TAG_LEN],
) -> [u8; ADDRESS_TAG_LEN] {
    // XOR is its own inverse.
    encrypt_tag(q, ko, encrypted)
}

fn tag_pad(q: &[u8; 32], ko: &EdwardsPoint) -> [u8; ADDRESS_TAG_LEN] {
    let mut t = Transcript::new();
    t.push_domain("enc").push_bytes(q).push_point(ko);
    // stretch the 32-byte digest out to ADDRESS_TAG_LEN bytes
    let mut out = [0u8; ADDRESS_TAG_LEN];
    let mut counter = 0u8;
    let mut filled = 0;
    while filled < ADDRESS_TAG_LEN {
        let mut tc = t.clone();
        tc.push_bytes(&[counter]);
        let chunk = tc.finish_32(&[]);
        let take = (ADDRESS_TAG_LEN - filled).min(chunk.len());
        out[filled..filled + take].copy_from_slice(&chunk[..take]);
        filled += take;
        counter += 1;
    }
    out
}

/// View tag: `H_1("vt", xK_d, Ko)`.
pub fn view_tag(x_k_d: &EdwardsPoint, ko: &EdwardsPoint) -> u8 {
    let mut t = Transcript::new();
    t.push_domain("vt").push_point(x_k_d).push_point(ko);
    t.finish_1(&[])
}

/// Per-index address generator point `G_addr^j = H_n("genaddr", s_ga, j) * G`.
pub(crate) fn addr_generator_scalar(s_ga: &Scalar, index: &AddressIndex) -> Scalar {
    let mut t = Transcript::new();
    t.push_domain("genaddr").push_bytes(index);
    t.finish_scalar(&s_ga.to_bytes())
}

fn spend_extension(label: &str, s_ga: &Scalar, index: &AddressIndex) -> Scalar {
    let mut t = Transcript::new();
    t.push_domain(label).push_bytes(index);
    t.finish_scalar(&s_ga.to_bytes())
}

/// The four public components of a jamtis address: `(K1^j, K2^j, K3^j,
/// cipher_tag(j))`.
#[derive(Debug, Clone)]
pub struct DestinationAddress {
    pub k1_j: EdwardsPoint,
    pub k2_j: EdwardsPoint,
    pub k3_j: EdwardsPoint,
    pub cipher_tag: [u8; ADDRESS_TAG_LEN],
}

/// The three per-index spend-key extensions (`k_g^j, k_x^j, k_u^j`),
/// needed by the receiver to recover the onetime address's private key
/// components.
#[derive(Debug, Clone, Copy)]
pub struct SpendKeyExtensions {
    pub k_g_j: Scalar,
    pub k_x_j: Scalar,
    pub k_u_j: Scalar,
}

pub fn spend_key_extensions(s_ga: &Scalar, index: &AddressIndex) -> SpendKeyExtensions {
    SpendKeyExtensions {
        k_g_j: spend_extension("g", s_ga, index),
        k_x_j: spend_extension("x", s_ga, index),
        k_u_j: spend_extension("u", s_ga, index),
    }
}

/// Build the full destination tuple for address index `j`.
pub fn make_destination(
    k1: &EdwardsPoint,
    xk_ua: &Scalar,
    xk_fr: &Scalar,
    s_ga: &Scalar,
    s_ct: &Scalar,
    index: AddressIndex,
) -> DestinationAddress {
    let k_gen_j = addr_generator_scalar(s_ga, &index);
    let g_addr_j = k_gen_j * basepoint();
    let k3_j = xk_ua * g_addr_j; // K_xr^j
    let k2_j = xk_fr * k3_j;

    let ext = spend_key_extensions(s_ga, &index);
    let k1_j = k1 + ext.k_g_j * basepoint() + ext.k_x_j * x_gen() + ext.k_u_j * u_gen();

    let raw = make_plain_raw_tag(index);
    DestinationAddress {
        k1_j,
        k2_j,
        k3_j,
        cipher_tag: cipher_tag(s_ct, raw),
    }
}

/// Derive `K1^j` for a known index, independent of the cipher_tag —
/// used by the receiver to validate a recovered index.
pub fn k1_j_for_index(k1: &EdwardsPoint, s_ga: &Scalar, index: &AddressIndex) -> EdwardsPoint {
    let ext = spend_key_extensions(s_ga, index);
    k1 + ext.k_g_j * basepoint() + ext.k_x_j * x_gen() + ext.k_u_j * u_gen()
}

/// `K3^j` for a known index, needed by the sender to compute `xK_e`.
pub fn k3_j_for_index(xk_ua: &Scalar, s_ga: &Scalar, index: &AddressIndex) -> EdwardsPoint {
    let k_gen_j = addr_generator_scalar(s_ga, index);
    xk_ua * (k_gen_j * basepoint())
}
