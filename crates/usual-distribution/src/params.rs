//! Emission formula parameters.
//!
//! A single governance-owned record. Every field is non-zero; setters reject
//! redundant writes so each accepted change corresponds to exactly one
//! emitted change record.

use crate::constants::{BPS, ONE_USUAL, WAD};
use crate::error::{DistributionError, Result};
use serde::{Deserialize, Serialize};

/// Parameters of the daily emission formula
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionParameters {
    /// Distribution-rate coefficient, basis points
    pub d: u64,
    /// Base emission multiplier, WAD
    pub m0: u128,
    /// Baseline backing-asset price at epoch, WAD
    pub p0: u128,
    /// Baseline interest rate at epoch, WAD
    pub rate0: u128,
    /// Floor applied to the live rate, basis points
    pub rate_min: u64,
    /// Base time-decay factor, basis points
    pub base_gamma: u64,
    /// Backing-asset supply at epoch, token units
    pub initial_supply: u128,
}

impl DistributionParameters {
    /// Parameters at mainnet epoch: 5% coefficient, unit multiplier and
    /// baselines, 1% rate floor, full gamma.
    pub fn mainnet(initial_supply: u128) -> Self {
        Self {
            d: 500,
            m0: WAD,
            p0: WAD,
            rate0: WAD,
            rate_min: 100,
            base_gamma: BPS,
            initial_supply,
        }
    }

    fn ensure_changed_u64(current: u64, next: u64) -> Result<()> {
        if current == next {
            return Err(DistributionError::SameValue);
        }
        Ok(())
    }

    fn ensure_changed_u128(current: u128, next: u128) -> Result<()> {
        if current == next {
            return Err(DistributionError::SameValue);
        }
        Ok(())
    }

    /// Set the distribution-rate coefficient (bps)
    pub fn set_d(&mut self, d: u64) -> Result<()> {
        if d == 0 {
            return Err(DistributionError::ZeroParameter("d"));
        }
        Self::ensure_changed_u64(self.d, d)?;
        self.d = d;
        Ok(())
    }

    /// Set the base multiplier (WAD)
    pub fn set_m0(&mut self, m0: u128) -> Result<()> {
        if m0 == 0 {
            return Err(DistributionError::ZeroParameter("m0"));
        }
        Self::ensure_changed_u128(self.m0, m0)?;
        self.m0 = m0;
        Ok(())
    }

    /// Set the rate floor (bps)
    pub fn set_rate_min(&mut self, rate_min: u64) -> Result<()> {
        if rate_min == 0 {
            return Err(DistributionError::ZeroParameter("rate_min"));
        }
        Self::ensure_changed_u64(self.rate_min, rate_min)?;
        self.rate_min = rate_min;
        Ok(())
    }

    /// Set the base gamma (bps)
    pub fn set_base_gamma(&mut self, base_gamma: u64) -> Result<()> {
        if base_gamma == 0 {
            return Err(DistributionError::ZeroParameter("base_gamma"));
        }
        Self::ensure_changed_u64(self.base_gamma, base_gamma)?;
        self.base_gamma = base_gamma;
        Ok(())
    }
}

impl Default for DistributionParameters {
    fn default() -> Self {
        Self::mainnet(1_000_000 * ONE_USUAL)
    }
}
