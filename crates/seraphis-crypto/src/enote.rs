//! Enote variants, the sender- and receiver-side derivations that build
//! and scan them, and the basic → intermediate → full scan-record
//! ladder (§3.5–§3.8, §4.4–§4.6).

use curve25519_dalek::edwards::EdwardsPoint;
use curve25519_dalek::scalar::Scalar;
use zeroize::{Zeroize, Zeroizing};

use crate::address::{
    self, addr_generator_scalar, k1_j_for_index, try_decipher_tag, AddressIndex, ADDRESS_TAG_LEN,
};
use crate::generators::{basepoint, h_gen, u_gen, x_gen};
use crate::keys::JamtisKeys;
use crate::transcript::Transcript;
use crate::CryptoError;

pub type InputContext = [u8; 32];

/// Identifies why an enote was sent to its own owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelfSendType {
    Dummy,
    Change,
    SelfSpend,
}

pub const SELF_SEND_TYPES: [SelfSendType; 3] =
    [SelfSendType::Dummy, SelfSendType::Change, SelfSendType::SelfSpend];

impl SelfSendType {
    fn as_u8(self) -> u8 {
        match self {
            SelfSendType::Dummy => 0,
            SelfSendType::Change => 1,
            SelfSendType::SelfSpend => 2,
        }
    }

    fn from_hint(hint: u8) -> Option<Self> {
        match hint.checked_sub(1)? {
            0 => Some(SelfSendType::Dummy),
            1 => Some(SelfSendType::Change),
            2 => Some(SelfSendType::SelfSpend),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnoteKind {
    Plain,
    SelfSend(SelfSendType),
}

#[derive(Debug, Clone)]
pub struct CoinbaseEnote {
    pub ko: EdwardsPoint,
    pub amount: u64,
    pub view_tag: u8,
    pub encrypted_address_tag: [u8; ADDRESS_TAG_LEN],
}

#[derive(Debug, Clone)]
pub struct StandardEnote {
    pub ko: EdwardsPoint,
    pub c: EdwardsPoint,
    pub encoded_amount: [u8; 8],
    pub view_tag: u8,
    pub encrypted_address_tag: [u8; ADDRESS_TAG_LEN],
}

fn hn(label: &str, q: &[u8; 32], c: &EdwardsPoint) -> Scalar {
    let mut t = Transcript::new();
    t.push_domain(label).push_bytes(q).push_point(c);
    t.finish_scalar(&[])
}

fn bf_scalar(q: &[u8; 32], baked_key: Option<&EdwardsPoint>) -> Scalar {
    let mut t = Transcript::new();
    t.push_domain("bf").push_bytes(q);
    if let Some(bk) = baked_key {
        t.push_point(bk);
    }
    t.finish_scalar(&[])
}

fn amt_mask(q: &[u8; 32], baked_key: Option<&EdwardsPoint>) -> [u8; 8] {
    let mut t = Transcript::new();
    t.push_domain("amt").push_bytes(q);
    if let Some(bk) = baked_key {
        t.push_point(bk);
    }
    t.finish_8(&[])
}

fn xor8(a: u64, mask: [u8; 8]) -> [u8; 8] {
    let a_bytes = a.to_le_bytes();
    let mut out = [0u8; 8];
    for i in 0..8 {
        out[i] = a_bytes[i] ^ mask[i];
    }
    out
}

fn onetime_address(q: &[u8; 32], c: &EdwardsPoint, k1_j: &EdwardsPoint) -> EdwardsPoint {
    hn("g", q, c) * basepoint() + hn("x", q, c) * x_gen() + hn("u", q, c) * u_gen() + k1_j
}

/// Sender-receiver secret for the plain path: `q = H_32("srp", xK_d, xK_e, input_context)`.
pub fn q_plain(x_k_d: &EdwardsPoint, x_k_e: &EdwardsPoint, input_context: &InputContext) -> [u8; 32] {
    let mut t = Transcript::new();
    t.push_domain("srp")
        .push_point(x_k_d)
        .push_point(x_k_e)
        .push_bytes(input_context);
    t.finish_32(&[])
}

/// Sender-receiver secret for a self-send: `q = H_32("srs", k_vb, xK_e, input_context, type)`.
pub fn q_selfsend(
    k_vb: &Scalar,
    x_k_e: &EdwardsPoint,
    input_context: &InputContext,
    kind: SelfSendType,
) -> [u8; 32] {
    let mut t = Transcript::new();
    t.push_domain("srs")
        .push_point(x_k_e)
        .push_bytes(input_context)
        .push_bytes(&[kind.as_u8()]);
    t.finish_32(&k_vb.to_bytes())
}

/// Sender side: build the standard enote for a plain destination.
pub fn build_plain_output(
    dest_k1_j: &EdwardsPoint,
    dest_k2_j: &EdwardsPoint,
    dest_k3_j: &EdwardsPoint,
    dest_cipher_tag: [u8; ADDRESS_TAG_LEN],
    amount: u64,
    xr: &Scalar,
    input_context: &InputContext,
) -> (StandardEnote, EdwardsPoint) {
    let x_k_e = xr * dest_k3_j;
    let x_k_d = xr * dest_k2_j;
    let q = Zeroizing::new(q_plain(&x_k_d, &x_k_e, input_context));

    let baked_key = Zeroizing::new(xr * basepoint());
    let y = Zeroizing::new(bf_scalar(&q, Some(&*baked_key)));
    let c = *y * basepoint() + Scalar::from(amount) * h_gen();
    let encoded_amount = xor8(amount, amt_mask(&q, Some(&*baked_key)));
    let ko = onetime_address(&q, &c, dest_k1_j);
    let view_tag = address::view_tag(&x_k_d, &ko);
    let encrypted_address_tag = address::encrypt_tag(&q, &ko, dest_cipher_tag);

    (
        StandardEnote {
            ko,
            c,
            encoded_amount,
            view_tag,
            encrypted_address_tag,
        },
        x_k_e,
    )
}

/// Sender side: build a self-send enote. The sender deciphers its own
/// destination's existing cipher tag (it knows its own `s_ct`) to
/// recover `j`, then re-enciphers a tag with the self-send hint.
pub fn build_selfsend_output(
    own_keys: &JamtisKeys,
    index: AddressIndex,
    kind: SelfSendType,
    amount: u64,
    xr: &Scalar,
    input_context: &InputContext,
) -> Result<(StandardEnote, EdwardsPoint), CryptoError> {
    let s_ga = own_keys.s_ga()?;
    let s_ct = own_keys.s_ct()?;
    let k_vb = own_keys.k_vb()?;
    let xk_ua = own_keys.xk_ua()?;

    let k3_j = address::k3_j_for_index(&xk_ua, &s_ga, &index);
    let x_k_e = xr * k3_j;
    let q = Zeroizing::new(q_selfsend(&k_vb, &x_k_e, input_context, kind));

    let y = Zeroizing::new(bf_scalar(&q, None));
    let c = *y * basepoint() + Scalar::from(amount) * h_gen();
    let encoded_amount = xor8(amount, amt_mask(&q, None));

    let k1_j = k1_j_for_index(&own_keys.k1, &s_ga, &index);
    let ko = onetime_address(&q, &c, &k1_j);

    let x_k_d = own_keys.xk_fr()? * x_k_e;
    let view_tag = address::view_tag(&x_k_d, &ko);

    let raw = address::make_selfsend_raw_tag(index, kind.as_u8());
    let cipher_tag = address::cipher_tag(&s_ct, raw);
    let encrypted_address_tag = address::encrypt_tag(&q, &ko, cipher_tag);

    Ok((
        StandardEnote {
            ko,
            c,
            encoded_amount,
            view_tag,
            encrypted_address_tag,
        },
        x_k_e,
    ))
}

#[derive(Debug, Clone)]
pub struct BasicRecord {
    pub enote: StandardEnote,
    pub x_k_e: EdwardsPoint,
    pub input_context: InputContext,
}

#[derive(Debug, Clone)]
pub struct IntermediateRecord {
    pub basic: BasicRecord,
    pub index: AddressIndex,
    pub amount: u64,
    pub blinding_factor: Scalar,
    pub kind: EnoteKind,
}

impl Drop for IntermediateRecord {
    fn drop(&mut self) {
        self.blinding_factor.zeroize();
    }
}

#[derive(Debug, Clone)]
pub struct FullRecord {
    pub intermediate: IntermediateRecord,
    pub k_g: Scalar,
    pub k_x: Scalar,
    pub k_u: Scalar,
    pub key_image: EdwardsPoint,
}

impl Drop for FullRecord {
    fn drop(&mut self) {
        self.k_g.zeroize();
        self.k_x.zeroize();
        self.k_u.zeroize();
    }
}

/// `KI = ((k_u + k_m) / (k_x + k_vb)) * U`.
pub fn key_image(k_u: &Scalar, k_m: &Scalar, k_x: &Scalar, k_vb: &Scalar) -> EdwardsPoint {
    let numerator = k_u + k_m;
    let denominator = k_x + k_vb;
    (numerator * denominator.invert()) * u_gen()
}

/// Attempt to scan an enote as a self-send of the given type.
pub fn try_scan_selfsend(
    keys: &JamtisKeys,
    enote: &StandardEnote,
    x_k_e: &EdwardsPoint,
    input_context: &InputContext,
    kind: SelfSendType,
) -> Result<FullRecord, CryptoError> {
    let xk_fr = keys.xk_fr()?;
    let x_k_d = xk_fr * x_k_e;
    if address::view_tag(&x_k_d, &enote.ko) != enote.view_tag {
        return Err(CryptoError::ViewTagMismatch);
    }

    let k_vb = keys.k_vb()?;
    let q = Zeroizing::new(q_selfsend(&k_vb, x_k_e, input_context, kind));

    let cipher_tag = address::decrypt_tag(&q, &enote.ko, enote.encrypted_address_tag);
    let s_ct = keys.s_ct()?;
    let raw = try_decipher_tag(&s_ct, &cipher_tag, false)?;
    if SelfSendType::from_hint(raw.hint) != Some(kind) {
        return Err(CryptoError::AddressTagMismatch);
    }

    let s_ga = keys.s_ga()?;
    let expected_k1_j = k1_j_for_index(&keys.k1, &s_ga, &raw.index);
    let implied_k1_j = enote.ko
        - (hn("g", &q, &enote.c) * basepoint()
            + hn("x", &q, &enote.c) * x_gen()
            + hn("u", &q, &enote.c) * u_gen());
    if implied_k1_j != expected_k1_j {
        return Err(CryptoError::OnetimeAddressMismatch);
    }

    let mut amount_bytes = [0u8; 8];
    amount_bytes.copy_from_slice(&enote.encoded_amount);
    let mask = amt_mask(&q, None);
    let amount = u64::from_le_bytes(xor8(u64::from_le_bytes(amount_bytes), mask));
    let y = bf_scalar(&q, None);
    let expected_c = y * basepoint() + Scalar::from(amount) * h_gen();
    if expected_c != enote.c {
        return Err(CryptoError::Other("amount commitment mismatch".into()));
    }

    let index = raw.index;
    let ext = address::spend_key_extensions(&s_ga, &index);

    let k_g = hn("g", &q, &enote.c) + ext.k_g_j;
    let k_x = hn("x", &q, &enote.c) + ext.k_x_j;
    let k_u = hn("u", &q, &enote.c) + ext.k_u_j;
    let k_m = keys.k_m()?;
    let ki = key_image(&k_u, &k_m, &k_x, &k_vb);

    Ok(FullRecord {
        intermediate: IntermediateRecord {
            basic: BasicRecord {
                enote: enote.clone(),
                x_k_e: *x_k_e,
                input_context: *input_context,
            },
            index,
            amount,
            blinding_factor: y,
            kind: EnoteKind::SelfSend(kind),
        },
        k_g,
        k_x,
        k_u,
        key_image: ki,
    })
}

/// Attempt to scan an enote on the plain path. Requires `xk_ua` (to
/// recover the amount-baking key) in addition to `xk_fr`/`s_ga`/`s_ct`.
pub fn try_scan_plain(keys: &JamtisKeys, enote: &StandardEnote, x_k_e: &EdwardsPoint, input_context: &InputContext) -> Result<FullRecord, CryptoError> {
    let xk_fr = keys.xk_fr()?;
    let x_k_d = xk_fr * x_k_e;
    if address::view_tag(&x_k_d, &enote.ko) != enote.view_tag {
        return Err(CryptoError::ViewTagMismatch);
    }

    let q = Zeroizing::new(q_plain(&x_k_d, x_k_e, input_context));

    // baked_key = xr*G, recovered as (xK_e * xk_ua^-1) * k_gen_j^-1; we
    // don't know j (and hence k_gen_j) until the tag is deciphered, so
    // decipher first against a provisional amount check using baked_key
    // solved per-candidate index is circular — instead we recover j
    // first (tag doesn't depend on baked_key), then compute baked_key.
    let cipher_tag = address::decrypt_tag(&q, &enote.ko, enote.encrypted_address_tag);
    let s_ct = keys.s_ct()?;
    let raw = try_decipher_tag(&s_ct, &cipher_tag, true)?;

    let s_ga = keys.s_ga()?;
    let xk_ua = keys.xk_ua()?;
    let k_gen_j = addr_generator_scalar(&s_ga, &raw.index);
    let baked_key = Zeroizing::new((xk_ua.invert() * k_gen_j.invert()) * x_k_e);

    let expected_k1_j = k1_j_for_index(&keys.k1, &s_ga, &raw.index);
    let implied_k1_j =
        enote.ko - (hn("g", &q, &enote.c) * basepoint() + hn("x", &q, &enote.c) * x_gen() + hn("u", &q, &enote.c) * u_gen());
    if implied_k1_j != expected_k1_j {
        return Err(CryptoError::OnetimeAddressMismatch);
    }

    let mask = amt_mask(&q, Some(&*baked_key));
    let mut amount_bytes = [0u8; 8];
    amount_bytes.copy_from_slice(&enote.encoded_amount);
    let amount = u64::from_le_bytes(xor8(u64::from_le_bytes(amount_bytes), mask));
    let y = bf_scalar(&q, Some(&*baked_key));
    let expected_c = y * basepoint() + Scalar::from(amount) * h_gen();
    if expected_c != enote.c {
        return Err(CryptoError::Other("amount commitment mismatch".into()));
    }

    let ext = address::spend_key_extensions(&s_ga, &raw.index);
    let k_g = hn("g", &q, &enote.c) + ext.k_g_j;
    let k_x = hn("x", &q, &enote.c) + ext.k_x_j;
    let k_u = hn("u", &q, &enote.c) + ext.k_u_j;
    let k_vb = keys.k_vb()?;
    let k_m = keys.k_m()?;
    let ki = key_image(&k_u, &k_m, &k_x, &k_vb);

    Ok(FullRecord {
        intermediate: IntermediateRecord {
            basic: BasicRecord {
                enote: enote.clone(),
                x_k_e: *x_k_e,
                input_context: *input_context,
            },
            index: raw.index,
            amount,
            blinding_factor: y,
            kind: EnoteKind::Plain,
        },
        k_g,
        k_x,
        k_u,
        key_image: ki,
    })
}

/// Top-level scan orchestration. Self-send is attempted before plain
/// (the measured-common-case ordering the spec calls out explicitly).
pub fn scan_enote(
    keys: &JamtisKeys,
    enote: &StandardEnote,
    x_k_e: &EdwardsPoint,
    input_context: &InputContext,
) -> Option<FullRecord> {
    for kind in SELF_SEND_TYPES {
        if let Ok(record) = try_scan_selfsend(keys, enote, x_k_e, input_context, kind) {
            return Some(record);
        }
    }
    try_scan_plain(keys, enote, x_k_e, input_context).ok()
}
