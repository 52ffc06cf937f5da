//! Claim ledger, mint cap, and payout redirection.
//!
//! Claims are cumulative high-water marks: a leaf proves the total ever
//! allocated to an account, and payouts cover only the delta above what was
//! already claimed. The mint cap bounds the sum of all deltas. Redirection
//! is a two-phase initiate → delay → accept transition; payout follows
//! exactly one hop.

use crate::error::{DistributionError, Result};
use crate::ports::{AccountId, ZERO_ACCOUNT};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use usual_math::{hash_blake3, verify_proof};

/// A redirection awaiting its acceptance delay
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingRedirection {
    pub target: AccountId,
    pub initiated_at: i64,
}

/// Claim-side state: high-water marks, mint cap, redirections
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ClaimBook {
    /// Cumulative amount already paid per account, never decreasing
    claimed: HashMap<AccountId, u128>,
    /// Remaining mintable through off-chain claims
    mint_cap: u128,
    /// Initiated redirections inside their delay window
    pending: HashMap<AccountId, PendingRedirection>,
    /// Finalized redirections
    active: HashMap<AccountId, AccountId>,
}

/// Leaf for a claim proof: double-hashed account ‖ big-endian amount
pub fn claim_leaf(account: &AccountId, cumulative_amount: u128) -> [u8; 32] {
    let mut data = Vec::with_capacity(48);
    data.extend_from_slice(account);
    data.extend_from_slice(&cumulative_amount.to_be_bytes());
    hash_blake3(&hash_blake3(&data))
}

impl ClaimBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remaining off-chain mint capacity
    pub fn mint_cap(&self) -> u128 {
        self.mint_cap
    }

    /// Cumulative amount already claimed by an account
    pub fn claimed_by(&self, account: &AccountId) -> u128 {
        self.claimed.get(account).copied().unwrap_or(0)
    }

    /// Active redirect target, if any
    pub fn active_redirection(&self, account: &AccountId) -> Option<AccountId> {
        self.active.get(account).copied()
    }

    /// Pending redirection, if any
    pub fn pending_redirection(&self, account: &AccountId) -> Option<PendingRedirection> {
        self.pending.get(account).copied()
    }

    /// Grow the mint cap when the allocator funds the off-chain bucket
    pub fn increase_mint_cap(&mut self, amount: u128) {
        self.mint_cap += amount;
    }

    /// Verify a claim against `root` without touching any state. Returns
    /// `(recipient, delta)` exactly as [`Self::commit_claim`] will settle
    /// it; the recipient differs from the account when a redirection is
    /// active.
    pub fn verify_claim(
        &self,
        account: &AccountId,
        cumulative_amount: u128,
        proof: &[[u8; 32]],
        root: [u8; 32],
    ) -> Result<(AccountId, u128)> {
        let leaf = claim_leaf(account, cumulative_amount);
        if !verify_proof(leaf, proof, root) {
            return Err(DistributionError::InvalidProof);
        }

        let already = self.claimed_by(account);
        if cumulative_amount <= already {
            return Err(DistributionError::NoTokensToClaim);
        }
        let delta = cumulative_amount - already;
        if delta > self.mint_cap {
            return Err(DistributionError::NoTokensToClaim);
        }

        let recipient = self.active_redirection(account).unwrap_or(*account);
        Ok((recipient, delta))
    }

    /// Settle a claim previously checked by [`Self::verify_claim`]. Kept
    /// separate so the caller can place the external payout between the
    /// check and the commit; a failed payout then leaves the entitlement
    /// claimable.
    pub fn commit_claim(&mut self, account: &AccountId, cumulative_amount: u128, delta: u128) {
        self.mint_cap -= delta;
        self.claimed.insert(*account, cumulative_amount);
    }

    /// Verify and settle in one step
    pub fn claim(
        &mut self,
        account: &AccountId,
        cumulative_amount: u128,
        proof: &[[u8; 32]],
        root: [u8; 32],
    ) -> Result<(AccountId, u128)> {
        let (recipient, delta) = self.verify_claim(account, cumulative_amount, proof, root)?;
        self.commit_claim(account, cumulative_amount, delta);
        Ok((recipient, delta))
    }

    /// Record a redirection initiation
    pub fn initiate_redirection(
        &mut self,
        account: &AccountId,
        target: AccountId,
        now: i64,
    ) -> Result<()> {
        if *account == ZERO_ACCOUNT || target == ZERO_ACCOUNT {
            return Err(DistributionError::NullAccount);
        }
        if target == *account {
            return Err(DistributionError::SameAccount);
        }
        if self.pending.contains_key(account) || self.active.contains_key(account) {
            return Err(DistributionError::RedirectionAlreadyExists);
        }
        self.pending.insert(
            *account,
            PendingRedirection {
                target,
                initiated_at: now,
            },
        );
        Ok(())
    }

    /// Drop a pending initiation
    pub fn cancel_redirection(&mut self, account: &AccountId) -> Result<()> {
        self.pending
            .remove(account)
            .map(|_| ())
            .ok_or(DistributionError::NoPendingRedirection)
    }

    /// Promote pending → active once `delay_secs` fully elapsed
    pub fn accept_redirection(
        &mut self,
        account: &AccountId,
        now: i64,
        delay_secs: u64,
    ) -> Result<AccountId> {
        let pending = self
            .pending
            .get(account)
            .copied()
            .ok_or(DistributionError::NoPendingRedirection)?;

        let elapsed = now.saturating_sub(pending.initiated_at);
        if elapsed < delay_secs as i64 {
            return Err(DistributionError::RedirectDelayNotElapsed {
                remaining_secs: (delay_secs as i64 - elapsed) as u64,
            });
        }

        self.pending.remove(account);
        self.active.insert(*account, pending.target);
        Ok(pending.target)
    }

    /// Clear an active redirection
    pub fn remove_redirection(&mut self, account: &AccountId) -> Result<()> {
        self.active
            .remove(account)
            .map(|_| ())
            .ok_or(DistributionError::NoActiveRedirection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use usual_math::{compute_root, generate_proof};

    const DELAY: u64 = 1_000;

    fn account(tag: u8) -> AccountId {
        let mut a = [0u8; 32];
        a[0] = tag;
        a
    }

    /// Build a root over (account, cumulative) pairs and a proof accessor
    fn build_tree(pairs: &[(AccountId, u128)]) -> ([u8; 32], Vec<Vec<[u8; 32]>>) {
        let leaves: Vec<[u8; 32]> = pairs.iter().map(|(a, v)| claim_leaf(a, *v)).collect();
        let root = compute_root(&leaves);
        let proofs = (0..leaves.len()).map(|i| generate_proof(&leaves, i)).collect();
        (root, proofs)
    }

    #[test]
    fn test_claim_pays_delta() {
        let alice = account(1);
        let bob = account(2);
        let (root, proofs) = build_tree(&[(alice, 100), (bob, 250)]);

        let mut book = ClaimBook::new();
        book.increase_mint_cap(1_000);

        let (recipient, delta) = book.claim(&alice, 100, &proofs[0], root).unwrap();
        assert_eq!(recipient, alice);
        assert_eq!(delta, 100);
        assert_eq!(book.claimed_by(&alice), 100);
        assert_eq!(book.mint_cap(), 900);
    }

    #[test]
    fn test_double_claim_rejected() {
        let alice = account(1);
        let (root, proofs) = build_tree(&[(alice, 100), (account(2), 50)]);

        let mut book = ClaimBook::new();
        book.increase_mint_cap(1_000);
        book.claim(&alice, 100, &proofs[0], root).unwrap();

        assert!(matches!(
            book.claim(&alice, 100, &proofs[0], root),
            Err(DistributionError::NoTokensToClaim)
        ));
        assert_eq!(book.mint_cap(), 900);
    }

    #[test]
    fn test_high_water_mark_pays_only_growth() {
        let alice = account(1);
        let (root1, proofs1) = build_tree(&[(alice, 100), (account(2), 50)]);

        let mut book = ClaimBook::new();
        book.increase_mint_cap(1_000);
        book.claim(&alice, 100, &proofs1[0], root1).unwrap();

        // A newer root proves a larger cumulative total; only the delta
        // is paid.
        let (root2, proofs2) = build_tree(&[(alice, 160), (account(2), 50)]);
        let (_, delta) = book.claim(&alice, 160, &proofs2[0], root2).unwrap();
        assert_eq!(delta, 60);
        assert_eq!(book.claimed_by(&alice), 160);
        assert_eq!(book.mint_cap(), 840);
    }

    #[test]
    fn test_verify_claim_leaves_state_untouched() {
        let alice = account(1);
        let (root, proofs) = build_tree(&[(alice, 100), (account(2), 50)]);

        let mut book = ClaimBook::new();
        book.increase_mint_cap(1_000);

        let (recipient, delta) = book.verify_claim(&alice, 100, &proofs[0], root).unwrap();
        assert_eq!(recipient, alice);
        assert_eq!(delta, 100);
        assert_eq!(book.claimed_by(&alice), 0);
        assert_eq!(book.mint_cap(), 1_000);

        book.commit_claim(&alice, 100, delta);
        assert_eq!(book.claimed_by(&alice), 100);
        assert_eq!(book.mint_cap(), 900);
    }

    #[test]
    fn test_redirect_rejects_zero_accounts() {
        let mut book = ClaimBook::new();
        assert!(matches!(
            book.initiate_redirection(&ZERO_ACCOUNT, account(3), 0),
            Err(DistributionError::NullAccount)
        ));
        assert!(matches!(
            book.initiate_redirection(&account(1), ZERO_ACCOUNT, 0),
            Err(DistributionError::NullAccount)
        ));
        assert!(book.pending_redirection(&account(1)).is_none());
    }

    #[test]
    fn test_invalid_proof_rejected() {
        let alice = account(1);
        let (root, proofs) = build_tree(&[(alice, 100), (account(2), 50)]);

        let mut book = ClaimBook::new();
        book.increase_mint_cap(1_000);

        // Claiming a different amount than proven fails.
        assert!(matches!(
            book.claim(&alice, 500, &proofs[0], root),
            Err(DistributionError::InvalidProof)
        ));
        assert_eq!(book.mint_cap(), 1_000);
    }

    #[test]
    fn test_mint_cap_conservation() {
        let alice = account(1);
        let (root, proofs) = build_tree(&[(alice, 100), (account(2), 50)]);

        let mut book = ClaimBook::new();
        book.increase_mint_cap(60);

        // Delta 100 exceeds the remaining cap of 60.
        assert!(matches!(
            book.claim(&alice, 100, &proofs[0], root),
            Err(DistributionError::NoTokensToClaim)
        ));
        assert_eq!(book.mint_cap(), 60);
        assert_eq!(book.claimed_by(&alice), 0);
    }

    #[test]
    fn test_redirection_round_trip() {
        let alice = account(1);
        let carol = account(3);
        let mut book = ClaimBook::new();

        book.initiate_redirection(&alice, carol, 0).unwrap();

        // Accept before the delay fails.
        assert!(matches!(
            book.accept_redirection(&alice, DELAY as i64 - 1, DELAY),
            Err(DistributionError::RedirectDelayNotElapsed { .. })
        ));

        // At the boundary the delay has fully elapsed.
        let target = book.accept_redirection(&alice, DELAY as i64, DELAY).unwrap();
        assert_eq!(target, carol);
        assert_eq!(book.active_redirection(&alice), Some(carol));
        assert!(book.pending_redirection(&alice).is_none());
    }

    #[test]
    fn test_claim_follows_active_redirect_one_hop() {
        let alice = account(1);
        let carol = account(3);
        let dave = account(4);
        let (root, proofs) = build_tree(&[(alice, 100), (carol, 50)]);

        let mut book = ClaimBook::new();
        book.increase_mint_cap(1_000);

        book.initiate_redirection(&alice, carol, 0).unwrap();
        book.accept_redirection(&alice, DELAY as i64, DELAY).unwrap();

        // Carol redirecting to Dave must not chain Alice's payout.
        book.initiate_redirection(&carol, dave, 0).unwrap();
        book.accept_redirection(&carol, DELAY as i64, DELAY).unwrap();

        let (recipient, _) = book.claim(&alice, 100, &proofs[0], root).unwrap();
        assert_eq!(recipient, carol);
    }

    #[test]
    fn test_cancel_clears_pending() {
        let alice = account(1);
        let mut book = ClaimBook::new();

        book.initiate_redirection(&alice, account(3), 0).unwrap();
        book.cancel_redirection(&alice).unwrap();
        assert!(book.pending_redirection(&alice).is_none());

        // A later initiation with a different target succeeds.
        book.initiate_redirection(&alice, account(4), 10).unwrap();
        assert_eq!(book.pending_redirection(&alice).unwrap().target, account(4));
    }

    #[test]
    fn test_redirection_exclusivity() {
        let alice = account(1);
        let mut book = ClaimBook::new();

        assert!(matches!(
            book.initiate_redirection(&alice, alice, 0),
            Err(DistributionError::SameAccount)
        ));

        book.initiate_redirection(&alice, account(3), 0).unwrap();
        assert!(matches!(
            book.initiate_redirection(&alice, account(4), 0),
            Err(DistributionError::RedirectionAlreadyExists)
        ));

        book.accept_redirection(&alice, DELAY as i64, DELAY).unwrap();
        assert!(matches!(
            book.initiate_redirection(&alice, account(4), 0),
            Err(DistributionError::RedirectionAlreadyExists)
        ));

        book.remove_redirection(&alice).unwrap();
        assert!(book.initiate_redirection(&alice, account(4), 0).is_ok());
    }

    #[test]
    fn test_remove_requires_active() {
        let mut book = ClaimBook::new();
        assert!(matches!(
            book.remove_redirection(&account(1)),
            Err(DistributionError::NoActiveRedirection)
        ));
    }
}
