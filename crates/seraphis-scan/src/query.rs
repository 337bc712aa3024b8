//! Balance/selection query presets, adapted from output-row filtering
//! (the teacher's `OutputQuery` factories) to contextual-record
//! filtering over [`EnoteStore`](crate::store::EnoteStore).

use crate::chunk::{OriginStatus, SpentStatus};
use crate::store::ExclusionFilter;

/// Only unspent records, respecting the spendable-age lock. Unrestricted
/// by origin: on-chain, unconfirmed, and off-chain outputs all count.
pub fn unspent(current_height: i64, default_spendable_age: i64) -> (Vec<OriginStatus>, Vec<SpentStatus>, ExclusionFilter) {
    (
        vec![],
        vec![],
        ExclusionFilter { exclude_locked: true, current_height, default_spendable_age },
    )
}

/// Unspent records, ignoring the spendable-age lock — useful for
/// reporting total (not-yet-spendable-included) balance.
pub fn unspent_including_locked(current_height: i64) -> (Vec<OriginStatus>, Vec<SpentStatus>, ExclusionFilter) {
    (
        vec![],
        vec![],
        ExclusionFilter { exclude_locked: false, current_height, default_spendable_age: 0 },
    )
}

/// Records spent anywhere (on-chain, unconfirmed, or off-chain).
pub fn spent_any(current_height: i64) -> (Vec<OriginStatus>, Vec<SpentStatus>, ExclusionFilter) {
    (
        vec![],
        vec![SpentStatus::SpentOnChain, SpentStatus::SpentUnconfirmed, SpentStatus::SpentOffchain],
        ExclusionFilter { exclude_locked: false, current_height, default_spendable_age: 0 },
    )
}

/// Records confirmed spent on-chain only.
pub fn spent_onchain(current_height: i64) -> (Vec<OriginStatus>, Vec<SpentStatus>, ExclusionFilter) {
    (
        vec![],
        vec![SpentStatus::SpentOnChain],
        ExclusionFilter { exclude_locked: false, current_height, default_spendable_age: 0 },
    )
}

/// Unspent and already past the spendable-age lock at `current_height`.
pub fn spendable_at_height(current_height: i64, default_spendable_age: i64) -> (Vec<OriginStatus>, Vec<SpentStatus>, ExclusionFilter) {
    (
        vec![],
        vec![],
        ExclusionFilter { exclude_locked: true, current_height, default_spendable_age },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unspent_preset_excludes_locked() {
        let (origins, statuses, filter) = unspent(100, 10);
        assert!(origins.is_empty());
        assert!(statuses.is_empty());
        assert!(filter.exclude_locked);
        assert_eq!(filter.current_height, 100);
        assert_eq!(filter.default_spendable_age, 10);
    }

    #[test]
    fn unspent_including_locked_does_not_exclude() {
        let (_, _, filter) = unspent_including_locked(50);
        assert!(!filter.exclude_locked);
    }

    #[test]
    fn spent_any_covers_all_three_statuses() {
        let (_, statuses, _) = spent_any(0);
        assert_eq!(statuses.len(), 3);
        assert!(statuses.contains(&SpentStatus::SpentOnChain));
        assert!(statuses.contains(&SpentStatus::SpentUnconfirmed));
        assert!(statuses.contains(&SpentStatus::SpentOffchain));
    }

    #[test]
    fn spent_onchain_is_a_single_status() {
        let (_, statuses, _) = spent_onchain(0);
        assert_eq!(statuses, vec![SpentStatus::SpentOnChain]);
    }
}
