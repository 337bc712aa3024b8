//! Interfaces the refresh loop drives: a source of ledger/off-chain scan
//! chunks, and a store that absorbs them (§4.8, §6).

use crate::chunk::{LedgerScanChunk, NonLedgerScanChunk};
use crate::contiguity::{BlockId, ChainContiguityMarker};
use crate::error::ScanError;

/// A read-only view onto the chain the refresh loop consults to detect
/// reorgs and to recover a block id for a marker it doesn't already
/// have one for.
pub trait LedgerView {
    fn top_block_height(&self) -> i64;
    fn block_id(&self, height: i64) -> Option<BlockId>;
}

/// Supplies scan chunks. A single session spans one refresh attempt;
/// starting a new session lets an implementation pin a consistent view
/// of the remote ledger for the duration of that attempt.
pub trait ScanContext {
    fn start_chunk_handling_session(&mut self, start_height: i64) -> Result<(), ScanError>;
    fn end_chunk_handling_session(&mut self);

    /// Fetch the next on-chain chunk starting at `start_height`. A
    /// chunk with `start_height > end_height` (empty range) signals the
    /// current chain tip.
    fn next_ledger_chunk(&mut self, start_height: i64, max_chunk_size: u64) -> Result<LedgerScanChunk, ScanError>;

    /// Fetch the single available unconfirmed (mempool) chunk, if any.
    fn next_unconfirmed_chunk(&mut self) -> Result<Option<NonLedgerScanChunk>, ScanError>;

    /// Fetch the single available off-chain chunk, if any.
    fn next_offchain_chunk(&mut self) -> Result<Option<NonLedgerScanChunk>, ScanError>;
}

/// Absorbs validated scan chunks into a persistent enote store.
pub trait EnoteStoreUpdater {
    fn refresh_height(&self) -> i64;

    /// The first height the next refresh attempt should resume scanning
    /// from (the store's alignment marker plus one).
    fn desired_first_block(&self) -> i64;

    /// The store's own recorded block id at `height`, if it has scanned
    /// that far already.
    fn block_id_at(&self, height: i64) -> Option<BlockId>;

    /// Absorb one validated on-chain chunk mid-session (called once per
    /// chunk, before the session's contiguity marker advances again).
    fn process_ledger_chunk(&mut self, chunk: &LedgerScanChunk);

    /// Absorb a validated off-chain or unconfirmed chunk immediately
    /// (no session semantics apply to non-ledger data).
    fn process_nonledger_chunk(&mut self, chunk: &NonLedgerScanChunk);

    /// Commit everything accumulated by `process_ledger_chunk` calls
    /// since the session opened, recording the alignment marker and the
    /// (already walk-forward-cropped) block ids scanned this attempt.
    fn end_chunk_handling_session(&mut self, scanned_block_ids: &[BlockId], alignment_marker: ChainContiguityMarker);
}
