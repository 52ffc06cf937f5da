//! Typed audit events.
//!
//! The engine records one event per observable state change into an internal
//! log the caller drains with [`crate::DistributionEngine::take_events`].
//! Events also land on `tracing` at debug level.

use crate::ports::AccountId;
use serde::{Deserialize, Serialize};

/// Observable state changes of the distribution engine
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum DistributionEvent {
    /// A distribution parameter was updated
    ParameterUpdated { name: String, value: u128 },

    /// All nine bucket shares were replaced atomically
    BucketSharesSet { shares: [u64; 9] },

    /// Treasury/UsualX fee rates were replaced
    FeeRatesSet { treasury_bps: u64, usual_x_bps: u64 },

    /// The cached vault share of the LBT bucket changed
    VaultShareOfLbtUpdated { share_wad: u128 },

    /// Emission added to the off-chain mint cap
    OffChainBucketAllocated { amount: u128, mint_cap: u128 },

    /// Emission + fee cut sent to the yield vault
    UsualXBucketAllocated { emission: u128, fee_cut: u128 },

    /// Emission minted and approved for the staking contract
    UsualStarBucketAllocated { amount: u128 },

    /// Fee cut transferred to the yield treasury
    TreasuryFeeAllocated { amount: u128 },

    /// Residual fee dust burned
    FeeRemainderBurned { amount: u128 },

    /// A distribution cycle completed
    UsualDistributed {
        timestamp: i64,
        usual_dist: u128,
        fee_swept: u128,
    },

    /// A Merkle root entered the off-chain queue
    DistributionQueued {
        timestamp: i64,
        merkle_root: [u8; 32],
    },

    /// Still-challengeable roots older than `before_timestamp` were removed
    DistributionChallenged {
        before_timestamp: i64,
        removed: usize,
    },

    /// A root survived its challenge window and became claimable
    DistributionApproved {
        timestamp: i64,
        merkle_root: [u8; 32],
    },

    /// The whole off-chain queue was cleared
    QueueReset,

    /// Tokens paid out against the approved root
    OffChainClaimed {
        account: AccountId,
        recipient: AccountId,
        amount: u128,
        cumulative: u128,
    },

    /// Redirection lifecycle
    RedirectionInitiated {
        account: AccountId,
        target: AccountId,
    },
    RedirectionCancelled { account: AccountId },
    RedirectionAccepted {
        account: AccountId,
        target: AccountId,
    },
    RedirectionRemoved { account: AccountId },

    /// Emergency control
    EnginePaused,
    EngineUnpaused,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serde_round_trip() {
        let event = DistributionEvent::OffChainClaimed {
            account: [1u8; 32],
            recipient: [2u8; 32],
            amount: 100,
            cumulative: 160,
        };

        let json = serde_json::to_string(&event).unwrap();
        let back: DistributionEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_parameter_update_serializes_name() {
        let event = DistributionEvent::ParameterUpdated {
            name: "base_gamma".to_string(),
            value: 9_000,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("base_gamma"));
    }
}
