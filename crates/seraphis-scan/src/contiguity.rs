//! Chain contiguity marker and the status classification used to decide
//! whether a freshly-fetched chunk can simply be appended, or whether a
//! reorg means the refresh loop needs a partial or full rescan
//! (§4.8.1).

pub type BlockId = [u8; 32];

/// Marks the end of a contiguous run of known blocks. A marker with no
/// block id is contiguous with every marker at or below its height —
/// this lets scanning start above the chain's current tip without that
/// looking like a reorg.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainContiguityMarker {
    pub block_height: i64,
    pub block_id: Option<BlockId>,
}

impl ChainContiguityMarker {
    pub fn new(block_height: i64, block_id: Option<BlockId>) -> Self {
        Self { block_height, block_id }
    }
}

pub fn contiguity_check(a: &ChainContiguityMarker, b: &ChainContiguityMarker) -> bool {
    if a.block_id.is_none() && b.block_height <= a.block_height {
        return true;
    }
    if b.block_id.is_none() && a.block_height <= b.block_height {
        return true;
    }
    if a.block_height != b.block_height {
        return false;
    }
    match (a.block_id, b.block_id) {
        (Some(x), Some(y)) => x == y,
        _ => true,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanStatus {
    NeedFullscan,
    NeedPartialscan,
    Success,
    Fail,
}

/// Classify a chunk's contiguity against the running marker. `NeedFullscan`
/// fires when the break happens at or below the very first contiguity
/// point of this refresh attempt — a reorg reaching further back than
/// anything this attempt has scanned so far, which a partial rescan
/// cannot repair since there is no known-good point above it to resume
/// from.
pub fn chunk_contiguity_status(
    marker: &ChainContiguityMarker,
    chunk_prefix: &ChainContiguityMarker,
    first_contiguity_height: i64,
) -> ScanStatus {
    if contiguity_check(marker, chunk_prefix) {
        return ScanStatus::Success;
    }
    if first_contiguity_height >= marker.block_height {
        ScanStatus::NeedFullscan
    } else {
        ScanStatus::NeedPartialscan
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unspecified_marker_is_contiguous_below_and_at_its_height() {
        let a = ChainContiguityMarker::new(100, None);
        assert!(contiguity_check(&a, &ChainContiguityMarker::new(100, Some([1u8; 32]))));
        assert!(contiguity_check(&a, &ChainContiguityMarker::new(50, Some([1u8; 32]))));
        assert!(!contiguity_check(&a, &ChainContiguityMarker::new(101, Some([1u8; 32]))));
    }

    #[test]
    fn matching_heights_require_matching_ids() {
        let a = ChainContiguityMarker::new(100, Some([1u8; 32]));
        let b = ChainContiguityMarker::new(100, Some([2u8; 32]));
        assert!(!contiguity_check(&a, &b));
        assert!(contiguity_check(&a, &ChainContiguityMarker::new(100, Some([1u8; 32]))));
    }

    #[test]
    fn break_at_first_contiguity_point_forces_fullscan() {
        let marker = ChainContiguityMarker::new(100, Some([1u8; 32]));
        let mismatched_prefix = ChainContiguityMarker::new(100, Some([9u8; 32]));
        let status = chunk_contiguity_status(&marker, &mismatched_prefix, 100);
        assert_eq!(status, ScanStatus::NeedFullscan);
    }

    #[test]
    fn break_above_first_contiguity_point_allows_partialscan() {
        let marker = ChainContiguityMarker::new(150, Some([1u8; 32]));
        let mismatched_prefix = ChainContiguityMarker::new(150, Some([9u8; 32]));
        let status = chunk_contiguity_status(&marker, &mismatched_prefix, 100);
        assert_eq!(status, ScanStatus::NeedPartialscan);
    }
}
