//! Off-chain distribution queue and challenge state machine.
//!
//! Queued Merkle roots sit in a challenge window. A challenger can strike
//! still-challengeable roots; anyone can promote the newest root that
//! outlived its window past the currently approved one. Entries that outlive
//! the window without being challenged are swept, winner and losers alike,
//! in the same approval pass.

use crate::error::{DistributionError, Result};
use serde::{Deserialize, Serialize};

/// A queued off-chain distribution root
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OffChainDistribution {
    /// Enqueue time, Unix seconds
    pub timestamp: i64,
    /// Merkle root of cumulative entitlements
    pub merkle_root: [u8; 32],
}

/// The currently claimable root. `timestamp == 0` means none was ever
/// approved; approvals must strictly increase the timestamp.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovedDistribution {
    pub timestamp: i64,
    pub merkle_root: [u8; 32],
}

/// Pending-root queue with challenge/approval transitions
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct OffChainQueue {
    entries: Vec<OffChainDistribution>,
    approved: ApprovedDistribution,
}

impl OffChainQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queued entries in insertion order
    pub fn entries(&self) -> &[OffChainDistribution] {
        &self.entries
    }

    /// The approved singleton
    pub fn approved(&self) -> ApprovedDistribution {
        self.approved
    }

    /// Whether any root has ever been approved
    pub fn has_approved(&self) -> bool {
        self.approved.timestamp != 0
    }

    /// Append a root at `now`
    pub fn enqueue(&mut self, merkle_root: [u8; 32], now: i64) -> Result<()> {
        if merkle_root == [0u8; 32] {
            return Err(DistributionError::NullMerkleRoot);
        }
        self.entries.push(OffChainDistribution {
            timestamp: now,
            merkle_root,
        });
        Ok(())
    }

    /// Drop every queued entry
    pub fn reset(&mut self) {
        self.entries.clear();
    }

    /// Remove every entry that is still inside its challenge window and
    /// older than `before_timestamp`. Entries already past the window are
    /// left for the approval sweep. Returns the number removed.
    pub fn challenge(&mut self, before_timestamp: i64, now: i64, challenge_period: u64) -> usize {
        let mut to_remove: Vec<usize> = Vec::new();
        for (i, entry) in self.entries.iter().enumerate() {
            let age = now.saturating_sub(entry.timestamp);
            let still_challengeable = age <= challenge_period as i64;
            if still_challengeable && entry.timestamp < before_timestamp {
                to_remove.push(i);
            }
        }

        // Back-to-front so earlier indices stay valid across swap_remove.
        for &i in to_remove.iter().rev() {
            self.entries.swap_remove(i);
        }
        to_remove.len()
    }

    /// Promote the newest expired entry past the approved timestamp and
    /// sweep every expired entry out of the queue. Fails without touching
    /// the queue when no candidate beats the approved root.
    pub fn approve(&mut self, now: i64, challenge_period: u64) -> Result<ApprovedDistribution> {
        let mut expired: Vec<usize> = Vec::new();
        let mut winner: Option<OffChainDistribution> = None;

        for (i, entry) in self.entries.iter().enumerate() {
            let age = now.saturating_sub(entry.timestamp);
            if age <= challenge_period as i64 {
                continue;
            }
            expired.push(i);

            if entry.timestamp > self.approved.timestamp
                && winner.map_or(true, |w| entry.timestamp > w.timestamp)
            {
                winner = Some(*entry);
            }
        }

        let winner = winner.ok_or(DistributionError::NoDistributionToApprove)?;

        for &i in expired.iter().rev() {
            self.entries.swap_remove(i);
        }

        self.approved = ApprovedDistribution {
            timestamp: winner.timestamp,
            merkle_root: winner.merkle_root,
        };
        Ok(self.approved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PERIOD: u64 = 2_000;

    fn root(tag: u8) -> [u8; 32] {
        let mut r = [0u8; 32];
        r[0] = tag;
        r
    }

    #[test]
    fn test_zero_root_rejected() {
        let mut q = OffChainQueue::new();
        assert!(matches!(
            q.enqueue([0u8; 32], 10),
            Err(DistributionError::NullMerkleRoot)
        ));
        assert!(q.entries().is_empty());
    }

    #[test]
    fn test_approve_needs_expiry() {
        let mut q = OffChainQueue::new();
        q.enqueue(root(1), 1_000).unwrap();

        // Exactly at the window edge: age == period is still protected.
        assert!(matches!(
            q.approve(3_000, PERIOD),
            Err(DistributionError::NoDistributionToApprove)
        ));
        assert_eq!(q.entries().len(), 1);

        // One second past the window the root wins.
        let approved = q.approve(3_001, PERIOD).unwrap();
        assert_eq!(approved.timestamp, 1_000);
        assert_eq!(approved.merkle_root, root(1));
        assert!(q.entries().is_empty());
    }

    #[test]
    fn test_challenge_spares_younger_entries() {
        let mut q = OffChainQueue::new();
        q.enqueue(root(1), 0).unwrap();
        q.enqueue(root(2), 1_000).unwrap();

        // Strike only roots older than t=500: A goes, B stays.
        let removed = q.challenge(500, 1_800, PERIOD);
        assert_eq!(removed, 1);
        assert_eq!(q.entries().len(), 1);
        assert_eq!(q.entries()[0].merkle_root, root(2));

        // B survives its window and gets approved.
        let approved = q.approve(3_001, PERIOD).unwrap();
        assert_eq!(approved.merkle_root, root(2));
    }

    #[test]
    fn test_challenge_strikes_all_older_challengeable() {
        let mut q = OffChainQueue::new();
        q.enqueue(root(1), 0).unwrap();
        q.enqueue(root(2), 1_000).unwrap();

        // Both roots are younger than the window and older than t=1500.
        let removed = q.challenge(1_500, 1_800, PERIOD);
        assert_eq!(removed, 2);
        assert!(q.entries().is_empty());
    }

    #[test]
    fn test_challenge_leaves_expired_entries() {
        let mut q = OffChainQueue::new();
        q.enqueue(root(1), 0).unwrap();

        // At t=2500 the entry is past its window; challenge skips it.
        let removed = q.challenge(1_000, 2_500, PERIOD);
        assert_eq!(removed, 0);
        assert_eq!(q.entries().len(), 1);
    }

    #[test]
    fn test_approve_monotonic() {
        let mut q = OffChainQueue::new();
        q.enqueue(root(1), 1_000).unwrap();
        q.approve(3_001, PERIOD).unwrap();

        // An older root can never supersede the approved one, even after
        // its own window passes.
        q.enqueue(root(2), 500).unwrap();
        assert!(matches!(
            q.approve(10_000, PERIOD),
            Err(DistributionError::NoDistributionToApprove)
        ));
        // Failed approval leaves the queue untouched.
        assert_eq!(q.entries().len(), 1);
        assert_eq!(q.approved().merkle_root, root(1));
    }

    #[test]
    fn test_approve_sweeps_expired_losers() {
        let mut q = OffChainQueue::new();
        q.enqueue(root(1), 100).unwrap();
        q.enqueue(root(2), 200).unwrap();
        q.enqueue(root(3), 300).unwrap();
        q.enqueue(root(4), 9_000).unwrap(); // still inside its window

        let approved = q.approve(5_000, PERIOD).unwrap();
        assert_eq!(approved.timestamp, 300);
        assert_eq!(approved.merkle_root, root(3));

        // The three expired entries were all removed in the same pass; the
        // unexpired one remains.
        assert_eq!(q.entries().len(), 1);
        assert_eq!(q.entries()[0].merkle_root, root(4));
    }

    #[test]
    fn test_reset_clears_queue() {
        let mut q = OffChainQueue::new();
        q.enqueue(root(1), 100).unwrap();
        q.enqueue(root(2), 200).unwrap();
        q.reset();
        assert!(q.entries().is_empty());
    }
}
