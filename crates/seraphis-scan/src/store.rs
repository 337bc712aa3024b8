//! The enote store (§4.9): the four maps a scanned wallet accumulates
//! into, the onetime-address duplicate tracker that lets a legacy
//! intermediate record be upgraded to full once its key image becomes
//! known, and the balance/spendability queries built on top.

use std::collections::{BTreeMap, BTreeSet};

use curve25519_dalek::edwards::EdwardsPoint;

use crate::chunk::{LedgerScanChunk, NonLedgerScanChunk, OriginStatus, SpentStatus};
use crate::contiguity::{BlockId, ChainContiguityMarker};
use crate::traits::EnoteStoreUpdater;
use seraphis_crypto::enote::{FullRecord, IntermediateRecord};

pub type Identifier = [u8; 32];
pub type OnetimeAddress = EdwardsPoint;

/// `H("id", onetime_address, amount)` — legacy enotes can share a
/// onetime address across the mixed period, so amount is folded into
/// the identity.
pub fn legacy_identifier(onetime_address: &OnetimeAddress, amount: u64) -> Identifier {
    let mut t = seraphis_crypto::transcript::Transcript::new();
    t.push_domain("id").push_point(onetime_address).push_bytes(&amount.to_le_bytes());
    t.finish_32(&[])
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OriginContext {
    pub status: OriginStatus,
    pub block_height: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpentContext {
    pub status: SpentStatus,
    pub block_height: i64,
}

#[derive(Debug, Clone)]
pub struct StoredIntermediate {
    pub record: IntermediateRecord,
    pub origin: OriginContext,
}

#[derive(Debug, Clone)]
pub struct StoredFull {
    pub record: FullRecord,
    pub origin: OriginContext,
    pub spent: Option<SpentContext>,
}

#[derive(Debug, Clone, Copy)]
pub struct ExclusionFilter {
    pub exclude_locked: bool,
    pub current_height: i64,
    pub default_spendable_age: i64,
}

#[derive(Debug, Default)]
pub struct EnoteStore {
    legacy_intermediate: BTreeMap<Identifier, StoredIntermediate>,
    legacy_full: BTreeMap<Identifier, StoredFull>,
    sp_full: BTreeMap<[u8; 32], StoredFull>,
    legacy_key_images_in_sp_txs: BTreeMap<[u8; 32], SpentContext>,
    duplicate_tracker: BTreeMap<[u8; 32], BTreeSet<Identifier>>,
    legacy_block_ids: Vec<BlockId>,
    sp_block_ids: Vec<BlockId>,
    refresh_height: i64,
    alignment_marker: ChainContiguityMarker,
}

fn point_bytes(p: &EdwardsPoint) -> [u8; 32] {
    p.compress().to_bytes()
}

impl EnoteStore {
    pub fn new(refresh_height: i64) -> Self {
        Self {
            refresh_height,
            alignment_marker: ChainContiguityMarker::new(refresh_height - 1, None),
            ..Default::default()
        }
    }

    /// Insert a legacy intermediate record (amount + origin known, key
    /// image not yet recovered).
    pub fn add_legacy_intermediate(&mut self, onetime_address: OnetimeAddress, record: IntermediateRecord, origin: OriginContext) {
        let id = legacy_identifier(&onetime_address, record.amount);
        self.duplicate_tracker.entry(point_bytes(&onetime_address)).or_default().insert(id);
        self.legacy_intermediate.insert(id, StoredIntermediate { record, origin });
    }

    /// Insert a legacy full record, upgrading any intermediate sharing
    /// the same identifier and propagating the key image across every
    /// identifier that shares this onetime address.
    pub fn add_legacy_full(&mut self, onetime_address: OnetimeAddress, record: FullRecord, origin: OriginContext) {
        let id = legacy_identifier(&onetime_address, record.intermediate.amount);
        self.duplicate_tracker.entry(point_bytes(&onetime_address)).or_default().insert(id);
        self.legacy_intermediate.remove(&id);
        self.legacy_full.insert(id, StoredFull { record, origin, spent: None });
    }

    pub fn add_sp_full(&mut self, record: FullRecord, origin: OriginContext) {
        let ki = point_bytes(&record.key_image);
        self.sp_full.insert(ki, StoredFull { record, origin, spent: None });
    }

    /// Record a legacy key image observed spent inside a seraphis
    /// transaction — a seraphis tx can spend a legacy enote.
    pub fn note_legacy_key_image_in_sp_tx(&mut self, key_image: &EdwardsPoint, spent: SpentContext) {
        self.legacy_key_images_in_sp_txs.insert(point_bytes(key_image), spent);
    }

    pub fn mark_sp_spent(&mut self, key_image: &EdwardsPoint, spent: SpentContext) {
        if let Some(stored) = self.sp_full.get_mut(&point_bytes(key_image)) {
            stored.spent = Some(spent);
        }
    }

    /// An on-chain enote is spendable in the next block iff
    /// `next_height >= origin_height + max(1, default_spendable_age)`.
    fn is_spendable(origin: &OriginContext, filter: &ExclusionFilter) -> bool {
        if origin.status != OriginStatus::OnChain {
            return true;
        }
        if !filter.exclude_locked {
            return true;
        }
        let unlock_at = origin.block_height + filter.default_spendable_age.max(1);
        filter.current_height + 1 >= unlock_at
    }

    /// For legacy records sharing a onetime address, only the entry
    /// with the highest amount among the requested origin set is counted.
    pub fn balance(
        &self,
        origin_statuses: &[OriginStatus],
        spent_statuses: &[SpentStatus],
        filter: &ExclusionFilter,
    ) -> u64 {
        let mut best_per_address: BTreeMap<[u8; 32], u64> = BTreeMap::new();

        for stored in self.legacy_full.values() {
            if !origin_is_acceptable(stored.origin.status, origin_statuses) {
                continue;
            }
            if !spent_is_acceptable(&stored.spent, spent_statuses) {
                continue;
            }
            if !Self::is_spendable(&stored.origin, filter) {
                continue;
            }
            let addr = point_bytes(&stored.record.intermediate.basic.enote.ko);
            let amount = stored.record.intermediate.amount;
            let entry = best_per_address.entry(addr).or_insert(0);
            if amount > *entry {
                *entry = amount;
            }
        }

        let legacy_total: u64 = best_per_address.values().sum();

        let sp_total: u64 = self
            .sp_full
            .values()
            .filter(|s| {
                origin_is_acceptable(s.origin.status, origin_statuses)
                    && spent_is_acceptable(&s.spent, spent_statuses)
                    && Self::is_spendable(&s.origin, filter)
            })
            .map(|s| s.record.intermediate.amount)
            .sum();

        legacy_total + sp_total
    }

    /// §4.8.4 reorg repair: drop everything whose origin sits at or
    /// above `first_new_block`, clear spent contexts pointing at a
    /// removed block, and re-import legacy trackers for removed txs.
    pub fn repair_reorg(&mut self, first_new_block: i64) {
        self.legacy_full.retain(|_, s| !(s.origin.status == OriginStatus::OnChain && s.origin.block_height >= first_new_block));
        self.legacy_intermediate.retain(|_, s| !(s.origin.status == OriginStatus::OnChain && s.origin.block_height >= first_new_block));
        self.sp_full.retain(|_, s| !(s.origin.status == OriginStatus::OnChain && s.origin.block_height >= first_new_block));

        for stored in self.legacy_full.values_mut() {
            if let Some(spent) = stored.spent {
                if spent.status == SpentStatus::SpentOnChain && spent.block_height >= first_new_block {
                    stored.spent = None;
                }
            }
        }
        for stored in self.sp_full.values_mut() {
            if let Some(spent) = stored.spent {
                if spent.status == SpentStatus::SpentOnChain && spent.block_height >= first_new_block {
                    stored.spent = None;
                }
            }
        }
        self.legacy_key_images_in_sp_txs.retain(|_, spent| !(spent.status == SpentStatus::SpentOnChain && spent.block_height >= first_new_block));
    }
}

fn spent_is_acceptable(spent: &Option<SpentContext>, acceptable: &[SpentStatus]) -> bool {
    match spent {
        None => acceptable.is_empty(),
        Some(s) => acceptable.contains(&s.status),
    }
}

/// An empty `acceptable` list means no origin restriction at all, unlike
/// `spent_is_acceptable`'s empty-means-unspent convention: origin is never
/// absent, so the useful default is "count every origin."
fn origin_is_acceptable(status: OriginStatus, acceptable: &[OriginStatus]) -> bool {
    acceptable.is_empty() || acceptable.contains(&status)
}

impl EnoteStoreUpdater for EnoteStore {
    fn refresh_height(&self) -> i64 {
        self.refresh_height
    }

    fn desired_first_block(&self) -> i64 {
        self.alignment_marker.block_height + 1
    }

    fn block_id_at(&self, height: i64) -> Option<BlockId> {
        let idx = height - self.refresh_height;
        if idx < 0 {
            return None;
        }
        self.sp_block_ids.get(idx as usize).copied()
    }

    fn process_ledger_chunk(&mut self, chunk: &LedgerScanChunk) {
        // Candidate-owned basic records still need scan_enote run against
        // wallet keys to become intermediate/full records; that step
        // happens upstream of this trait and lands here via add_legacy_*/
        // add_sp_full. This hook only needs to evict anything reorg'd out.
        self.repair_reorg(chunk.start_height);
    }

    fn process_nonledger_chunk(&mut self, _chunk: &NonLedgerScanChunk) {}

    fn end_chunk_handling_session(&mut self, scanned_block_ids: &[BlockId], alignment_marker: ChainContiguityMarker) {
        let start = alignment_marker.block_height + 1 - self.refresh_height;
        if start >= 0 {
            let start = start as usize;
            if self.sp_block_ids.len() < start {
                self.sp_block_ids.resize(start, [0u8; 32]);
            }
            self.sp_block_ids.truncate(start);
            self.sp_block_ids.extend_from_slice(scanned_block_ids);
        }
        self.alignment_marker = ChainContiguityMarker::new(
            alignment_marker.block_height + scanned_block_ids.len() as i64,
            scanned_block_ids.last().copied().or(alignment_marker.block_id),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use curve25519_dalek::scalar::Scalar;

    fn dummy_full_record(amount: u64, ko_seed: u8) -> (FullRecord, EdwardsPoint) {
        let keys = seraphis_crypto::keys::JamtisKeys::from_master_secret(Scalar::from_bytes_mod_order([ko_seed; 32]));
        let index: seraphis_crypto::address::AddressIndex = [ko_seed; seraphis_crypto::address::ADDRESS_INDEX_LEN];
        let dest = seraphis_crypto::address::make_destination(
            &keys.k1,
            &keys.xk_ua().unwrap(),
            &keys.xk_fr().unwrap(),
            &keys.s_ga().unwrap(),
            &keys.s_ct().unwrap(),
            index,
        );
        let xr = Scalar::from_bytes_mod_order([ko_seed.wrapping_add(1); 32]);
        let input_context = [ko_seed; 32];
        let (enote, x_k_e) = seraphis_crypto::enote::build_plain_output(
            &dest.k1_j,
            &dest.k2_j,
            &dest.k3_j,
            dest.cipher_tag,
            amount,
            &xr,
            &input_context,
        );
        let record = seraphis_crypto::enote::scan_enote(&keys, &enote, &x_k_e, &input_context).unwrap();
        let ko = record.intermediate.basic.enote.ko;
        (record, ko)
    }

    #[test]
    fn balance_counts_highest_amount_among_duplicates() {
        let mut store = EnoteStore::new(0);
        let (record_small, ko) = dummy_full_record(10, 5);
        let origin = OriginContext { status: OriginStatus::OnChain, block_height: 0 };
        store.add_legacy_full(ko, record_small, origin);

        let mut record_big = dummy_full_record(10, 5).0;
        record_big.intermediate.amount = 90;
        store.add_legacy_full(ko, record_big, origin);

        let filter = ExclusionFilter { exclude_locked: false, current_height: 100, default_spendable_age: 10 };
        assert_eq!(store.balance(&[], &[], &filter), 90);
    }

    #[test]
    fn locked_enote_excluded_until_spendable_age_elapses() {
        let mut store = EnoteStore::new(0);
        let (record, ko) = dummy_full_record(50, 7);
        let origin = OriginContext { status: OriginStatus::OnChain, block_height: 100 };
        store.add_legacy_full(ko, record, origin);

        let too_early = ExclusionFilter { exclude_locked: true, current_height: 105, default_spendable_age: 10 };
        assert_eq!(store.balance(&[], &[], &too_early), 0);

        let late_enough = ExclusionFilter { exclude_locked: true, current_height: 109, default_spendable_age: 10 };
        assert_eq!(store.balance(&[], &[], &late_enough), 50);
    }

    #[test]
    fn reorg_repair_drops_records_at_or_above_the_new_block() {
        let mut store = EnoteStore::new(0);
        let (record, ko) = dummy_full_record(5, 3);
        let origin = OriginContext { status: OriginStatus::OnChain, block_height: 50 };
        store.add_legacy_full(ko, record, origin);
        assert_eq!(store.legacy_full.len(), 1);

        store.repair_reorg(50);
        assert_eq!(store.legacy_full.len(), 0);
    }

    #[test]
    fn sp_full_tracks_key_image() {
        let mut store = EnoteStore::new(0);
        let (record, _ko) = dummy_full_record(7, 9);
        let ki = record.key_image;
        let origin = OriginContext { status: OriginStatus::OnChain, block_height: 1 };
        store.add_sp_full(record, origin);
        assert!(store.sp_full.contains_key(&point_bytes(&ki)));
    }
}
