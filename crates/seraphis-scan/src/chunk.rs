//! Scan chunk types returned by a ledger or off-chain enote-finding
//! context, and the semantics checks that validate a chunk's internal
//! consistency before the refresh loop is allowed to act on it
//! (§4.8.2).

use crate::contiguity::BlockId;
use seraphis_crypto::enote::BasicRecord;

pub type TxId = [u8; 32];
pub type KeyImage = curve25519_dalek::edwards::EdwardsPoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OriginStatus {
    Offchain,
    Unconfirmed,
    OnChain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpentStatus {
    SpentOffchain,
    SpentUnconfirmed,
    SpentOnChain,
}

/// A candidate-owned record found by scanning a single enote, paired
/// with the context needed to place it in the ledger (or reject it).
#[derive(Debug, Clone)]
pub struct ContextualBasicRecord {
    pub record: BasicRecord,
    pub origin_status: OriginStatus,
    pub origin_tx_id: TxId,
}

/// Key images spent by a single transaction, tagged with the status
/// under which they were observed spent.
#[derive(Debug, Clone)]
pub struct ContextualKeyImageSet {
    pub tx_id: TxId,
    pub spent_status: SpentStatus,
    pub key_images: Vec<KeyImage>,
}

/// A chunk of on-chain scan results: a contiguous range of blocks plus
/// every candidate-owned record and spent key image found within it.
#[derive(Debug, Clone)]
pub struct LedgerScanChunk {
    pub start_height: i64,
    pub end_height: i64,
    pub prefix_block_id: Option<BlockId>,
    pub block_ids: Vec<BlockId>,
    pub basic_records_per_tx: Vec<(TxId, Vec<ContextualBasicRecord>)>,
    pub contextual_key_images: Vec<ContextualKeyImageSet>,
}

/// A chunk of off-chain (mempool) scan results: no height range, since
/// off-chain data has no persistent position in the chain.
#[derive(Debug, Clone, Default)]
pub struct NonLedgerScanChunk {
    pub basic_records_per_tx: Vec<(TxId, Vec<ContextualBasicRecord>)>,
    pub contextual_key_images: Vec<ContextualKeyImageSet>,
}

fn records_have_status(records: &[(TxId, Vec<ContextualBasicRecord>)], expected: OriginStatus) -> bool {
    records
        .iter()
        .all(|(_, recs)| recs.iter().all(|r| r.origin_status == expected))
}

fn key_images_have_status(sets: &[ContextualKeyImageSet], expected: SpentStatus) -> bool {
    sets.iter().all(|s| s.spent_status == expected)
}

/// Every key-image set's tx id must be mirrored in the basic-records
/// map — a key image is only ever surfaced for a tx this scanner also
/// produced at least one (possibly ownerless, placeholder) basic-record
/// entry for.
fn key_image_tx_ids_covered(
    records: &[(TxId, Vec<ContextualBasicRecord>)],
    sets: &[ContextualKeyImageSet],
) -> bool {
    sets.iter()
        .all(|s| records.iter().any(|(tx_id, _)| *tx_id == s.tx_id))
}

/// Validate a ledger chunk's internal consistency: height/id-count
/// agreement, expected origin/spent status for the range's phase, and
/// key-image/basic-record tx coverage.
pub fn check_ledger_chunk_semantics(chunk: &LedgerScanChunk, expected_prefix_height: i64) -> bool {
    if chunk.start_height - 1 != expected_prefix_height {
        return false;
    }
    let block_count = chunk.end_height - chunk.start_height + 1;
    if block_count < 1 || chunk.block_ids.len() as i64 != block_count {
        return false;
    }
    if !records_have_status(&chunk.basic_records_per_tx, OriginStatus::OnChain) {
        return false;
    }
    if !key_images_have_status(&chunk.contextual_key_images, SpentStatus::SpentOnChain) {
        return false;
    }
    key_image_tx_ids_covered(&chunk.basic_records_per_tx, &chunk.contextual_key_images)
}

/// Validate an off-chain chunk: everything must carry off-chain origin
/// and spent status, and key images must be tx-covered the same way as
/// on the ledger path.
pub fn check_nonledger_chunk_semantics(chunk: &NonLedgerScanChunk) -> bool {
    if !records_have_status(&chunk.basic_records_per_tx, OriginStatus::Offchain) {
        return false;
    }
    if !key_images_have_status(&chunk.contextual_key_images, SpentStatus::SpentOffchain) {
        return false;
    }
    key_image_tx_ids_covered(&chunk.basic_records_per_tx, &chunk.contextual_key_images)
}
