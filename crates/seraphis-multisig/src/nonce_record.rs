//! Nonce record: tracks the bi-nonces this signer has generated for
//! each `(proof_message, proof_key)` pair it has been asked to help
//! sign, indexed further by the `filter` (bitmask of participating
//! signers) so a nonce generated for one candidate signer subset is
//! never reused for another (§4.7.2).
//!
//! A filter's expected arity is `C(available_signers - 1, threshold -
//! 1)`: the number of distinct subsets of the remaining signers that
//! could complete a valid threshold quorum together with this one.

use std::collections::BTreeMap;

use curve25519_dalek::scalar::Scalar;
use serde::{Deserialize, Serialize};

/// A bitmask over a fixed signer ordering: bit `i` set means signer `i`
/// participates in this candidate quorum.
pub type SignerFilter = u64;

/// `C(n, k)`, used to compute the number of distinct filters a signer
/// should expect to generate nonces for.
pub fn binomial(n: u64, k: u64) -> u64 {
    if k > n {
        return 0;
    }
    let k = k.min(n - k);
    let mut result: u128 = 1;
    for i in 0..k {
        result = result * (n - i) as u128 / (i + 1) as u128;
    }
    result as u64
}

/// The number of filters a signer with `available_signers - 1` peers
/// should expect to generate nonces for, threshold `t`.
pub fn expected_filter_count(available_signers: u64, threshold: u64) -> u64 {
    if available_signers == 0 || threshold == 0 {
        return 0;
    }
    binomial(available_signers - 1, threshold - 1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct RecordKey {
    proof_message: [u8; 32],
    proof_key: [u8; 32],
    filter: SignerFilter,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct NonceEntry {
    pub nonce_1_priv: Scalar,
    pub nonce_2_priv: Scalar,
}

/// Tracks unused nonces per `(message, key, filter)`, and removes an
/// entry as soon as it's consumed so a nonce can never be reused across
/// two signing attempts (reuse would leak the signer's private key
/// share through the linear response equations).
#[derive(Debug, Default)]
pub struct NonceRecord {
    entries: BTreeMap<RecordKey, NonceEntry>,
}

impl NonceRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_record(&self, proof_message: [u8; 32], proof_key: [u8; 32], filter: SignerFilter) -> bool {
        self.entries.contains_key(&RecordKey { proof_message, proof_key, filter })
    }

    /// Insert a freshly generated nonce pair. Returns an error if a
    /// record already exists for this key — overwriting it would let
    /// the same nonces back two different signing attempts.
    pub fn add_record(
        &mut self,
        proof_message: [u8; 32],
        proof_key: [u8; 32],
        filter: SignerFilter,
        entry: NonceEntry,
    ) -> Result<(), String> {
        let key = RecordKey { proof_message, proof_key, filter };
        if self.entries.contains_key(&key) {
            return Err("nonce record already exists for this (message, key, filter)".into());
        }
        self.entries.insert(key, entry);
        Ok(())
    }

    /// Consume (remove and return) the record for a key, called once a
    /// partial signature using it has been produced.
    pub fn try_remove_record(
        &mut self,
        proof_message: [u8; 32],
        proof_key: [u8; 32],
        filter: SignerFilter,
    ) -> Option<NonceEntry> {
        self.entries.remove(&RecordKey { proof_message, proof_key, filter })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> NonceEntry {
        NonceEntry {
            nonce_1_priv: Scalar::from(1u64),
            nonce_2_priv: Scalar::from(2u64),
        }
    }

    #[test]
    fn binomial_matches_known_values() {
        assert_eq!(binomial(4, 2), 6);
        assert_eq!(binomial(5, 1), 5);
        assert_eq!(binomial(5, 5), 1);
        assert_eq!(binomial(5, 0), 1);
    }

    #[test]
    fn expected_filter_count_for_2_of_3() {
        // 2 peers remain for a 2-of-3 group once this signer is fixed;
        // a threshold of 2 needs 1 more signer, so C(2,1) = 2 filters.
        assert_eq!(expected_filter_count(3, 2), 2);
    }

    #[test]
    fn duplicate_insert_is_rejected_and_consume_removes() {
        let mut record = NonceRecord::new();
        let msg = [1u8; 32];
        let key = [2u8; 32];
        record.add_record(msg, key, 0b011, entry()).unwrap();
        assert!(record.add_record(msg, key, 0b011, entry()).is_err());
        assert!(record.has_record(msg, key, 0b011));

        let removed = record.try_remove_record(msg, key, 0b011);
        assert!(removed.is_some());
        assert!(!record.has_record(msg, key, 0b011));
        assert!(record.is_empty());
    }
}
