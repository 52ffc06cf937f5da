//! Error types for the distribution engine.
//!
//! Every rejection is a distinct named variant so callers can branch on
//! cause. Timing variants ("not yet", "nothing to do") are deliberately
//! separate from hard input errors.

use crate::ports::{PortError, Role};
use usual_math::MathError;

/// Result type alias for distribution operations
pub type Result<T> = std::result::Result<T, DistributionError>;

/// Errors that can occur in distribution engine operations
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum DistributionError {
    // === Input validation ===
    /// Zero account where a real account is required
    #[error("Account is the zero account")]
    NullAccount,

    /// Zero amount where a positive amount is required
    #[error("Amount is zero")]
    AmountIsZero,

    /// Zero Merkle root cannot be queued
    #[error("Merkle root is zero")]
    NullMerkleRoot,

    /// Write would not change the stored value
    #[error("Value is identical to the current one")]
    SameValue,

    /// Parameter must be non-zero
    #[error("Parameter {0} must be non-zero")]
    ZeroParameter(&'static str),

    /// Interest rate outside (0, 10000] bps
    #[error("Rate {0} bps is out of range (0, 10000]")]
    RateOutOfRange(u64),

    /// Bucket shares must sum to exactly 10 000 bps
    #[error("Bucket shares sum to {0} bps, expected 10000")]
    SharesSumMismatch(u64),

    /// Fee rates may not exceed 10 000 bps combined
    #[error("Fee rates sum to {0} bps, cap is 10000")]
    FeeRatesExceedCap(u64),

    // === Authorization ===
    /// Caller lacks the required role
    #[error("Caller is missing role {0:?}")]
    MissingRole(Role),

    /// Engine is paused
    #[error("Engine is paused")]
    Paused,

    /// Engine is not paused
    #[error("Engine is not paused")]
    NotPaused,

    // === Timing / ordering ===
    /// A full distribution period has not elapsed since the last cycle
    #[error("Distribution frequency not met: {remaining_secs}s remaining")]
    DistributionFrequencyNotMet { remaining_secs: u64 },

    /// No queued root is past its challenge period and newer than the
    /// approved one
    #[error("No off-chain distribution to approve")]
    NoDistributionToApprove,

    /// Redirect acceptance attempted before the delay elapsed
    #[error("Redirect delay not elapsed: {remaining_secs}s remaining")]
    RedirectDelayNotElapsed { remaining_secs: u64 },

    /// Claims are not open yet
    #[error("Claiming has not started")]
    ClaimingNotStarted,

    // === State machine ===
    /// No root has ever been approved
    #[error("No approved off-chain distribution")]
    NoApprovedDistribution,

    /// Account already has a pending or active redirection
    #[error("Redirection already exists for account")]
    RedirectionAlreadyExists,

    /// No pending redirection for account
    #[error("No pending redirection for account")]
    NoPendingRedirection,

    /// No active redirection for account
    #[error("No active redirection for account")]
    NoActiveRedirection,

    /// Redirection target equals the source account
    #[error("Cannot redirect an account to itself")]
    SameAccount,

    // === Proof / claim ===
    /// Merkle proof does not verify against the approved root
    #[error("Invalid Merkle proof")]
    InvalidProof,

    /// Nothing claimable: amount at or below the high-water mark, or the
    /// delta exceeds the remaining mint cap
    #[error("No tokens to claim")]
    NoTokensToClaim,

    // === Arithmetic ===
    /// Fixed-point arithmetic failure
    #[error(transparent)]
    Math(#[from] MathError),

    // === External collaborators ===
    /// Collaborator call failed (all paths except the oracle price read,
    /// which degrades to zero instead)
    #[error(transparent)]
    Port(#[from] PortError),
}
