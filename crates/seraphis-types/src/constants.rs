//! Config structs and tuning constants shared across the enote core crates.
//!
//! Mirrors the shape of a network-config struct: plain data, a `Default`
//! impl holding the numbers the rest of the workspace reaches for, and no
//! behavior of its own.

use serde::{Deserialize, Serialize};

/// Scanning/refresh tuning knobs for `seraphis-scan`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Number of blocks to back off by on a detected reorg, before the
    /// exponential back-off multiplier is applied.
    pub reorg_avoidance_depth: u64,
    /// Upper bound on chunk size requested from a ledger view per call.
    pub max_chunk_size: u64,
    /// Hard cap on full-refresh attempts before giving up (mirrors the
    /// original implementation's `<50` guard).
    pub max_fullscan_attempts: u32,
    /// Cap on partial-refresh attempts per call.
    pub max_partialscan_attempts: u32,
    /// Number of confirmations before an enote is considered unlocked
    /// (ignoring any additional per-output unlock time).
    pub default_spendable_age: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            reorg_avoidance_depth: 10,
            max_chunk_size: 1000,
            max_fullscan_attempts: 50,
            max_partialscan_attempts: 50,
            default_spendable_age: 10,
        }
    }
}

/// Task pool tuning knobs for `seraphis-pool`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Number of priority levels, highest priority first.
    pub num_priority_levels: usize,
    /// Soft cap on queued tasks per (priority, worker) queue before
    /// `try_push` starts reporting `QueueFull`.
    pub max_queue_size: usize,
    /// Number of submission cycles a caller's `submit` loop attempts
    /// across the worker grid before giving up and force-pushing.
    pub num_submit_cycle_attempts: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            num_priority_levels: 3,
            max_queue_size: 4096,
            num_submit_cycle_attempts: 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_config_defaults_match_reference() {
        let cfg = ScanConfig::default();
        assert_eq!(cfg.reorg_avoidance_depth, 10);
        assert!(cfg.max_fullscan_attempts < 50 + 1);
    }

    #[test]
    fn pool_config_defaults_nonzero() {
        let cfg = PoolConfig::default();
        assert!(cfg.num_priority_levels > 0);
        assert!(cfg.max_queue_size > 0);
    }
}
