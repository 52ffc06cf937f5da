//! Bucket shares and fee rates.
//!
//! Nine named shares split each day's emission. Seven of them (LBT through
//! market makers) are paid through the off-chain Merkle channel; UsualX and
//! UsualStar settle on-chain. The whole set is replaced atomically and must
//! sum to exactly 10 000 bps.

use crate::constants::BPS;
use crate::error::{DistributionError, Result};
use serde::{Deserialize, Serialize};

/// Emission split across protocol buckets, basis points
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketShares {
    /// Liquidity bootstrapping
    pub lbt: u64,
    /// Liquidity yield
    pub lyt: u64,
    /// Insider yield
    pub iyt: u64,
    /// Bribe pool
    pub bribe: u64,
    /// Ecosystem fund
    pub eco: u64,
    /// DAO treasury
    pub dao: u64,
    /// Market makers
    pub market_makers: u64,
    /// UsualX yield vault (on-chain)
    pub usual_x: u64,
    /// UsualStar staking rewards (on-chain)
    pub usual_star: u64,
}

impl BucketShares {
    /// Build a share set, rejecting any that does not sum to 10 000 bps
    pub fn new(values: [u64; 9]) -> Result<Self> {
        // Saturating so an adversarial set can never wrap back to 10 000.
        let sum = values.iter().fold(0u64, |acc, v| acc.saturating_add(*v));
        if sum != BPS {
            return Err(DistributionError::SharesSumMismatch(sum));
        }
        let [lbt, lyt, iyt, bribe, eco, dao, market_makers, usual_x, usual_star] = values;
        Ok(Self {
            lbt,
            lyt,
            iyt,
            bribe,
            eco,
            dao,
            market_makers,
            usual_x,
            usual_star,
        })
    }

    /// Shares as the ordered array they were set from
    pub fn as_array(&self) -> [u64; 9] {
        [
            self.lbt,
            self.lyt,
            self.iyt,
            self.bribe,
            self.eco,
            self.dao,
            self.market_makers,
            self.usual_x,
            self.usual_star,
        ]
    }

    /// Combined share of the off-chain Merkle channel
    pub fn off_chain_bps(&self) -> u64 {
        BPS - self.usual_x - self.usual_star
    }
}

impl Default for BucketShares {
    fn default() -> Self {
        // Mainnet genesis split
        Self::new([3_552, 1_026, 1_026, 1_026, 1_026, 1_026, 318, 500, 500])
            .expect("genesis shares sum to 10000")
    }
}

/// Fee split applied to swept collaborator fees, basis points.
/// The burn rate is implied: `10000 - treasury - usual_x`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeRates {
    pub treasury_bps: u64,
    pub usual_x_bps: u64,
}

impl FeeRates {
    pub fn new(treasury_bps: u64, usual_x_bps: u64) -> Result<Self> {
        let sum = treasury_bps.saturating_add(usual_x_bps);
        if sum > BPS {
            return Err(DistributionError::FeeRatesExceedCap(sum));
        }
        Ok(Self {
            treasury_bps,
            usual_x_bps,
        })
    }

    /// Implied burn rate
    pub fn burn_bps(&self) -> u64 {
        BPS - self.treasury_bps - self.usual_x_bps
    }
}

impl Default for FeeRates {
    fn default() -> Self {
        Self {
            treasury_bps: 4_000,
            usual_x_bps: 4_000,
        }
    }
}
