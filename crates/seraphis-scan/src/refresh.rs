//! The synchronous ledger/off-chain refresh loops (§4.8.3, §4.8.4):
//! fetch chunks from a `ScanContext`, validate and classify their
//! contiguity, and hand validated data to an `EnoteStoreUpdater`,
//! retrying with exponential reorg-avoidance backoff when a reorg is
//! detected.

use crate::chunk::check_ledger_chunk_semantics;
use crate::chunk::check_nonledger_chunk_semantics;
use crate::contiguity::{chunk_contiguity_status, ChainContiguityMarker, ScanStatus};
use crate::error::ScanError;
use crate::traits::{EnoteStoreUpdater, LedgerView, ScanContext};
use seraphis_types::ScanConfig;

/// One full onchain pass: fetch chunks starting at `contiguity_marker.block_height + 1`
/// until the terminal empty chunk (representing the current chain tip),
/// validating semantics and contiguity on each and handing validated
/// chunks to the updater. Returns the scanned block ids (oldest first)
/// and the terminal status.
fn process_ledger_for_full_refresh_onchain_pass(
    scan_context: &mut dyn ScanContext,
    updater: &mut dyn EnoteStoreUpdater,
    contiguity_marker: &mut ChainContiguityMarker,
    first_contiguity_height: i64,
    config: &ScanConfig,
) -> Result<(Vec<[u8; 32]>, ScanStatus), ScanError> {
    let mut scanned_block_ids = Vec::new();

    loop {
        let chunk = scan_context.next_ledger_chunk(contiguity_marker.block_height + 1, config.max_chunk_size)?;

        if chunk.start_height > chunk.end_height {
            // Terminal empty chunk: re-verify contiguity against it in
            // case a reorg dropped blocks below the marker without
            // replacing them.
            let terminal_prefix = ChainContiguityMarker::new(chunk.start_height - 1, chunk.prefix_block_id);
            let status = chunk_contiguity_status(contiguity_marker, &terminal_prefix, first_contiguity_height);
            return Ok((scanned_block_ids, status));
        }

        if !check_ledger_chunk_semantics(&chunk, contiguity_marker.block_height) {
            return Err(ScanError::InvalidChunk);
        }

        let chunk_prefix = ChainContiguityMarker::new(chunk.start_height - 1, chunk.prefix_block_id);
        let status = chunk_contiguity_status(contiguity_marker, &chunk_prefix, first_contiguity_height);
        if status != ScanStatus::Success {
            return Ok((scanned_block_ids, status));
        }

        updater.process_ledger_chunk(&chunk);
        scanned_block_ids.extend_from_slice(&chunk.block_ids);
        *contiguity_marker = ChainContiguityMarker::new(chunk.end_height, chunk.block_ids.last().copied());
    }
}

/// Run an onchain pass; if it succeeds, optionally fold in one
/// unconfirmed-mempool chunk, then run a second onchain follow-up pass
/// to catch transactions that landed between the first pass and the
/// mempool fetch (it's acceptable for mempool results to go briefly
/// stale, not for onchain results to).
fn process_ledger_for_full_refresh(
    scan_context: &mut dyn ScanContext,
    updater: &mut dyn EnoteStoreUpdater,
    contiguity_marker: &mut ChainContiguityMarker,
    first_contiguity_height: i64,
    config: &ScanConfig,
) -> Result<(Vec<[u8; 32]>, ScanStatus), ScanError> {
    let (mut scanned, status) = process_ledger_for_full_refresh_onchain_pass(
        scan_context,
        updater,
        contiguity_marker,
        first_contiguity_height,
        config,
    )?;
    if status != ScanStatus::Success {
        return Ok((scanned, status));
    }

    if let Some(chunk) = scan_context.next_unconfirmed_chunk()? {
        if !check_nonledger_chunk_semantics(&chunk) {
            return Err(ScanError::InvalidChunk);
        }
        updater.process_nonledger_chunk(&chunk);
    }

    let (more, status) = process_ledger_for_full_refresh_onchain_pass(
        scan_context,
        updater,
        contiguity_marker,
        first_contiguity_height,
        config,
    )?;
    scanned.extend(more);
    Ok((scanned, status))
}

/// Drop the prefix of `scanned_block_ids` that the store already knows
/// about, advancing `alignment_marker` as long as consecutive ids keep
/// matching the store's own record at that height.
fn update_alignment_marker(
    updater: &dyn EnoteStoreUpdater,
    mut alignment_marker: ChainContiguityMarker,
    scanned_block_ids: &[[u8; 32]],
    scan_start_height: i64,
) -> (ChainContiguityMarker, usize) {
    let mut cropped_from = 0;
    for (i, id) in scanned_block_ids.iter().enumerate() {
        let height = scan_start_height + i as i64;
        match updater.block_id_at(height) {
            Some(known) if known == *id => {
                alignment_marker = ChainContiguityMarker::new(height, Some(*id));
                cropped_from = i + 1;
            }
            _ => break,
        }
    }
    (alignment_marker, cropped_from)
}

/// The main synchronous ledger refresh loop (§4.8.3). Restarts from
/// scratch (discarding all data gathered this iteration) on
/// `NEED_FULLSCAN`; bounded retries on `NEED_PARTIALSCAN`.
pub fn refresh_enote_store_ledger(
    ledger: &dyn LedgerView,
    scan_context: &mut dyn ScanContext,
    updater: &mut dyn EnoteStoreUpdater,
    config: &ScanConfig,
) -> Result<(), ScanError> {
    let mut desired_first_block = updater.desired_first_block();
    let mut partialscan_attempts: u32 = 0;
    let mut fullscan_attempts: u32 = 0;

    loop {
        if fullscan_attempts >= config.max_fullscan_attempts {
            return Err(ScanError::TooManyFullscans(fullscan_attempts));
        }
        if partialscan_attempts > config.max_partialscan_attempts {
            return Err(ScanError::TooManyPartialscans(partialscan_attempts));
        }

        let base_depth = config.reorg_avoidance_depth as i64;
        let reorg_avoidance_depth = if fullscan_attempts > 1 {
            10i64.pow(fullscan_attempts - 1) * base_depth
        } else {
            base_depth
        };

        let initial_refresh_height = (desired_first_block - reorg_avoidance_depth).max(updater.refresh_height());

        let start_prefix_height = initial_refresh_height - 1;
        let start_prefix_id = if start_prefix_height < updater.refresh_height() {
            None
        } else {
            ledger.block_id(start_prefix_height)
        };
        let mut contiguity_marker = ChainContiguityMarker::new(start_prefix_height, start_prefix_id);
        let first_contiguity_height = contiguity_marker.block_height;

        scan_context.start_chunk_handling_session(initial_refresh_height)?;
        let result = process_ledger_for_full_refresh(
            scan_context,
            updater,
            &mut contiguity_marker,
            first_contiguity_height,
            config,
        );
        let (scanned_block_ids, status) = match result {
            Ok(v) => v,
            Err(e) => {
                scan_context.end_chunk_handling_session();
                return Err(e);
            }
        };

        desired_first_block = contiguity_marker.block_height + 1;

        match status {
            ScanStatus::Fail => {
                scan_context.end_chunk_handling_session();
                return Err(ScanError::Other("scan context reported failure".into()));
            }
            ScanStatus::NeedFullscan => {
                scan_context.end_chunk_handling_session();
                fullscan_attempts += 1;
                continue;
            }
            ScanStatus::NeedPartialscan => {
                scan_context.end_chunk_handling_session();
                partialscan_attempts += 1;
                continue;
            }
            ScanStatus::Success => {
                let alignment_marker = ChainContiguityMarker::new(initial_refresh_height - 1, start_prefix_id);
                let (alignment_marker, cropped_from) =
                    update_alignment_marker(updater, alignment_marker, &scanned_block_ids, initial_refresh_height);

                if initial_refresh_height > alignment_marker.block_height + 1 {
                    scan_context.end_chunk_handling_session();
                    return Err(ScanError::AlignmentInconsistent);
                }

                let new_ids = &scanned_block_ids[cropped_from..];
                updater.end_chunk_handling_session(new_ids, alignment_marker);
                scan_context.end_chunk_handling_session();
                return Ok(());
            }
        }
    }
}

/// Off-chain refresh is simpler than the ledger loop: fetch at most one
/// chunk and hand it straight to the updater. Off-chain data has no
/// persistent height ordering, so there is no contiguity tracking or
/// session bracketing.
pub fn refresh_enote_store_offchain(
    scan_context: &mut dyn ScanContext,
    updater: &mut dyn EnoteStoreUpdater,
) -> Result<(), ScanError> {
    if let Some(chunk) = scan_context.next_offchain_chunk()? {
        if !check_nonledger_chunk_semantics(&chunk) {
            return Err(ScanError::InvalidChunk);
        }
        updater.process_nonledger_chunk(&chunk);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::{LedgerScanChunk, NonLedgerScanChunk};
    use std::collections::BTreeMap;

    struct FakeLedger {
        ids: BTreeMap<i64, [u8; 32]>,
        top: i64,
    }

    impl LedgerView for FakeLedger {
        fn top_block_height(&self) -> i64 {
            self.top
        }
        fn block_id(&self, height: i64) -> Option<[u8; 32]> {
            self.ids.get(&height).copied()
        }
    }

    /// A scan context that serves a fixed chain of blocks (one empty
    /// "tip" record per block) and then a terminal empty chunk.
    struct FakeScanContext {
        chain: Vec<[u8; 32]>, // index 0 == height 1
    }

    impl ScanContext for FakeScanContext {
        fn start_chunk_handling_session(&mut self, _start_height: i64) -> Result<(), ScanError> {
            Ok(())
        }
        fn end_chunk_handling_session(&mut self) {}

        fn next_ledger_chunk(&mut self, start_height: i64, max_chunk_size: u64) -> Result<LedgerScanChunk, ScanError> {
            let chain_top = self.chain.len() as i64;
            if start_height > chain_top {
                let prefix_block_id = if start_height >= 2 {
                    self.chain.get((start_height - 2) as usize).copied()
                } else {
                    None
                };
                return Ok(LedgerScanChunk {
                    start_height,
                    end_height: start_height - 1,
                    prefix_block_id,
                    block_ids: vec![],
                    basic_records_per_tx: vec![],
                    contextual_key_images: vec![],
                });
            }
            let end_height = (start_height + max_chunk_size as i64 - 1).min(chain_top);
            let block_ids: Vec<[u8; 32]> = ((start_height)..=(end_height))
                .map(|h| self.chain[(h - 1) as usize])
                .collect();
            let prefix_block_id = if start_height >= 2 {
                Some(self.chain[(start_height - 2) as usize])
            } else {
                None
            };
            Ok(LedgerScanChunk {
                start_height,
                end_height,
                prefix_block_id,
                block_ids,
                basic_records_per_tx: vec![],
                contextual_key_images: vec![],
            })
        }

        fn next_unconfirmed_chunk(&mut self) -> Result<Option<NonLedgerScanChunk>, ScanError> {
            Ok(None)
        }

        fn next_offchain_chunk(&mut self) -> Result<Option<NonLedgerScanChunk>, ScanError> {
            Ok(None)
        }
    }

    struct FakeUpdater {
        refresh_height: i64,
        known_ids: BTreeMap<i64, [u8; 32]>,
        last_end: Option<(Vec<[u8; 32]>, ChainContiguityMarker)>,
    }

    impl EnoteStoreUpdater for FakeUpdater {
        fn refresh_height(&self) -> i64 {
            self.refresh_height
        }
        fn desired_first_block(&self) -> i64 {
            self.known_ids.keys().next_back().map(|h| h + 1).unwrap_or(self.refresh_height)
        }
        fn block_id_at(&self, height: i64) -> Option<[u8; 32]> {
            self.known_ids.get(&height).copied()
        }
        fn process_ledger_chunk(&mut self, _chunk: &LedgerScanChunk) {}
        fn process_nonledger_chunk(&mut self, _chunk: &NonLedgerScanChunk) {}
        fn end_chunk_handling_session(&mut self, scanned_block_ids: &[[u8; 32]], alignment_marker: ChainContiguityMarker) {
            for (i, id) in scanned_block_ids.iter().enumerate() {
                self.known_ids.insert(alignment_marker.block_height + 1 + i as i64, *id);
            }
            self.last_end = Some((scanned_block_ids.to_vec(), alignment_marker));
        }
    }

    fn chain_of(n: usize) -> Vec<[u8; 32]> {
        (0..n)
            .map(|i| {
                let mut id = [0u8; 32];
                id[0] = (i + 1) as u8;
                id[1] = ((i + 1) >> 8) as u8;
                id
            })
            .collect()
    }

    #[test]
    fn fresh_store_scans_the_whole_fake_chain() {
        let chain = chain_of(5);
        let ledger = FakeLedger { ids: BTreeMap::new(), top: 5 };
        let mut scan_context = FakeScanContext { chain: chain.clone() };
        let mut updater = FakeUpdater { refresh_height: 1, known_ids: BTreeMap::new(), last_end: None };
        let config = ScanConfig::default();

        refresh_enote_store_ledger(&ledger, &mut scan_context, &mut updater, &config).unwrap();

        assert_eq!(updater.known_ids.len(), 5);
        assert_eq!(updater.known_ids[&5], chain[4]);
    }

    #[test]
    fn already_known_prefix_is_cropped_out_of_the_final_commit() {
        let chain = chain_of(5);
        let ledger = FakeLedger { ids: BTreeMap::new(), top: 5 };
        let mut scan_context = FakeScanContext { chain: chain.clone() };
        let mut known = BTreeMap::new();
        known.insert(1, chain[0]);
        known.insert(2, chain[1]);
        let mut updater = FakeUpdater { refresh_height: 1, known_ids: known, last_end: None };
        let config = ScanConfig { reorg_avoidance_depth: 10, ..Default::default() };

        refresh_enote_store_ledger(&ledger, &mut scan_context, &mut updater, &config).unwrap();

        let (cropped, marker) = updater.last_end.clone().unwrap();
        assert!(marker.block_height >= 2);
        assert!(!cropped.contains(&chain[0]));
    }
}
