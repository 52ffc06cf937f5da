//! Collaborator ports.
//!
//! The engine owns its own state exclusively. Everything else (rate feed,
//! price oracle, vault, tokens, staking contract, role storage) is reached
//! through the narrow capability traits below. Methods take `&self`;
//! implementations are expected to use interior mutability, and none of them
//! is trusted beyond its declared contract.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Account identifier (32 bytes)
pub type AccountId = [u8; 32];

/// The zero account, never a valid participant
pub const ZERO_ACCOUNT: AccountId = [0u8; 32];

/// Failure surfaced by a collaborator call
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum PortError {
    #[error("Oracle query failed: {0}")]
    Oracle(String),

    #[error("Rate source query failed: {0}")]
    RateSource(String),

    #[error("Token operation rejected: {0}")]
    Token(String),

    #[error("Vault operation rejected: {0}")]
    Vault(String),

    #[error("Staking operation rejected: {0}")]
    Staking(String),
}

/// Privileged roles recognized by the engine
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Governance admin: redirect lifecycle, emergency control
    Admin,
    /// May mutate distribution parameters, shares, and fee rates
    DistributionAllocator,
    /// May trigger cycles and manage the off-chain queue
    DistributionOperator,
    /// May invalidate still-challengeable queued roots
    DistributionChallenger,
    /// May pause and unpause the engine
    Pauser,
}

/// Supplies blended and 90th-percentile interest rates in basis points
pub trait RateSource: Send + Sync {
    fn blended_weekly_interest(&self) -> Result<u64, PortError>;
    fn p90_interest_rate(&self) -> Result<u64, PortError>;
}

/// Fallible price feed. Prices are WAD-scaled USD.
pub trait PriceOracle: Send + Sync {
    fn price(&self, asset: AccountId) -> Result<u128, PortError>;
}

/// The yield-bearing vault collaborator
pub trait Vault: Send + Sync {
    fn total_assets(&self) -> u128;
    fn asset(&self) -> AccountId;
    fn asset_decimals(&self) -> u8;
    fn sweep_fees(&self) -> Result<u128, PortError>;
    fn start_yield_distribution(&self, amount: u128, start: i64, end: i64)
        -> Result<(), PortError>;
}

/// Mint/burn/transfer surface of the USUAL token
pub trait MintableToken: Send + Sync {
    fn mint(&self, to: AccountId, amount: u128) -> Result<(), PortError>;
    fn burn(&self, from: AccountId, amount: u128) -> Result<(), PortError>;
    fn transfer(&self, from: AccountId, to: AccountId, amount: u128) -> Result<(), PortError>;
    fn approve(&self, owner: AccountId, spender: AccountId, amount: u128)
        -> Result<(), PortError>;
}

/// Staking contract reward scheduler
pub trait StakingRewards: Send + Sync {
    fn start_reward_distribution(&self, amount: u128, start: i64, end: i64)
        -> Result<(), PortError>;
}

/// The backing-asset token (supply read, fee sweep, circuit breaker)
pub trait BackingToken: Send + Sync {
    fn total_supply(&self) -> u128;
    fn sweep_fees(&self) -> Result<u128, PortError>;
    /// WAD price coefficient while the circuit breaker is active, else `None`
    fn circuit_breaker_coefficient(&self) -> Option<u128>;
}

/// Role lookup; absence of a grant means rejection (fail closed)
pub trait RoleAuthorizer: Send + Sync {
    fn has_role(&self, account: AccountId, role: Role) -> bool;
}

/// The full set of collaborators wired into the engine
#[derive(Clone)]
pub struct Collaborators {
    pub rate_source: Arc<dyn RateSource>,
    pub oracle: Arc<dyn PriceOracle>,
    /// Optional: a missing vault contributes zero value and zero fees
    pub vault: Option<Arc<dyn Vault>>,
    pub token: Arc<dyn MintableToken>,
    pub staking: Arc<dyn StakingRewards>,
    pub backing: Arc<dyn BackingToken>,
    pub auth: Arc<dyn RoleAuthorizer>,
}
