//! # Usual Distribution - Emission & Off-Chain Claim Engine
//!
//! The distribution engine for the USUAL token: computes a daily emission
//! amount from market signals, fans it out across protocol buckets, and runs
//! the queued, challengeable Merkle-claim channel for off-chain allocations.
//!
//! ## Components
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                        DISTRIBUTION ENGINE                           │
//! ├──────────────────────────────────────────────────────────────────────┤
//! │  Emission Formula     St → Rt → Gamma → Kappa → Mt → UsualDist       │
//! │  Bucket Allocator     9 shares (bps, sum = 10 000) + fee split       │
//! │  Off-Chain Queue      enqueue → challenge window → approve sweep     │
//! │  Claim & Redirect     Merkle proofs, high-water marks, mint cap      │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Daily cycle
//!
//! | Bucket | Destination | Trigger |
//! |--------|-------------|---------|
//! | Off-chain (LBT/LYT/IYT/Bribe/Eco/DAO/MM) | mint cap for Merkle claims | - |
//! | UsualX | minted to the yield vault | `start_yield_distribution` |
//! | UsualStar | minted to the engine, allowance approved | `start_reward_distribution` |
//! | Treasury | fee cut transferred | - |
//! | Burn | residual fee dust | - |
//!
//! Every public operation is atomic: it either fully applies or fails with a
//! named [`DistributionError`] and leaves state untouched. Time never comes
//! from the environment; callers pass Unix-second timestamps.

pub mod buckets;
pub mod claims;
pub mod engine;
pub mod error;
pub mod events;
pub mod formula;
pub mod params;
pub mod ports;
pub mod queue;

// Re-exports
pub use buckets::{BucketShares, FeeRates};
pub use claims::{ClaimBook, PendingRedirection};
pub use engine::{DistributionEngine, DistributionOutcome, EngineConfig};
pub use error::DistributionError;
pub use events::DistributionEvent;
pub use formula::FormulaInputs;
pub use params::DistributionParameters;
pub use ports::{
    AccountId, BackingToken, Collaborators, MintableToken, PortError, PriceOracle, RateSource,
    Role, RoleAuthorizer, StakingRewards, Vault,
};
pub use queue::{ApprovedDistribution, OffChainDistribution, OffChainQueue};

/// USUAL token and protocol constants
pub mod constants {
    /// Decimal places (same as ETH)
    pub const DECIMALS: u8 = 18;

    /// One USUAL in smallest unit
    pub const ONE_USUAL: u128 = 1_000_000_000_000_000_000; // 10^18

    /// Fixed-point scale for formula intermediates
    pub const WAD: u128 = 1_000_000_000_000_000_000; // 10^18

    /// Basis-point scale: 10 000 bps = 100%
    pub const BPS: u64 = 10_000;

    /// Minimum interval between on-chain distribution cycles: 1 day
    pub const DISTRIBUTION_FREQUENCY_SECS: u64 = 86_400;

    /// Challenge window for queued off-chain roots: 1 week
    pub const CHALLENGE_PERIOD_SECS: u64 = 7 * 86_400;

    /// Delay before a pending payout redirection can be accepted: 1 week
    pub const REDIRECT_DELAY_SECS: u64 = 7 * 86_400;

    /// Days in the emission year
    pub const DAYS_PER_YEAR: u128 = 365;
}

pub use constants::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wad_matches_token_unit() {
        assert_eq!(WAD, ONE_USUAL);
    }

    #[test]
    fn test_challenge_and_redirect_windows() {
        assert_eq!(CHALLENGE_PERIOD_SECS, 604_800);
        assert_eq!(REDIRECT_DELAY_SECS, 604_800);
    }
}
