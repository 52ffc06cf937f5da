//! Emission formula.
//!
//! Six staged calculations produce the raw daily emission from stored
//! parameters and live market reads:
//!
//! ```text
//! St    = min(1, initial_supply·p0 / (total_supply·price))
//! Rt    = clamp(rate, rate_min, p90) / rate0
//! Gamma = base_gamma, linearly decayed when the gap exceeds one period
//! Kappa = m0·max(rate, rate_min) / (Gamma·rate0)
//! Mt    = min(m0·St·Rt / Gamma, Kappa)
//! Dist  = d·Mt·total_supply·price / 365
//! ```
//!
//! All stages are WAD fixed-point and floor-rounded through
//! [`usual_math::mul_div_floor`]; results are bit-for-bit reproducible.

use crate::constants::{BPS, DAYS_PER_YEAR, WAD};
use crate::error::{DistributionError, Result};
use crate::params::DistributionParameters;
use serde::{Deserialize, Serialize};
use usual_math::mul_div_floor;

/// Live inputs to one formula evaluation
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct FormulaInputs {
    /// Backing supply plus vault-adjusted USD value, token units
    pub total_supply: u128,
    /// Backing-asset price, WAD (circuit-breaker coefficient when active)
    pub price: u128,
    /// Blended weekly interest rate, bps
    pub rate: u64,
    /// 90th-percentile interest rate, bps
    pub p90_rate: u64,
}

fn bps_to_wad(bps: u64) -> Result<u128> {
    Ok(mul_div_floor(bps as u128, WAD, BPS as u128)?)
}

fn ensure_rate_in_range(rate: u64) -> Result<()> {
    if rate == 0 || rate > BPS {
        return Err(DistributionError::RateOutOfRange(rate));
    }
    Ok(())
}

/// St: supply/price ratio factor, clamped to [0, WAD]
pub fn calculate_st(params: &DistributionParameters, total_supply: u128, price: u128) -> Result<u128> {
    let baseline_value = mul_div_floor(params.initial_supply, params.p0, WAD)?;
    let current_value = mul_div_floor(total_supply, price, WAD)?;
    if current_value == 0 {
        return Err(DistributionError::AmountIsZero);
    }

    let st = mul_div_floor(baseline_value, WAD, current_value)?;
    Ok(st.min(WAD))
}

/// Rt: rate factor. The live rate is floored at `rate_min` first, then
/// capped by the 90th percentile.
pub fn calculate_rt(params: &DistributionParameters, rate: u64, p90_rate: u64) -> Result<u128> {
    ensure_rate_in_range(rate)?;
    ensure_rate_in_range(p90_rate)?;

    let effective = rate.max(params.rate_min).min(p90_rate);
    let effective_wad = bps_to_wad(effective)?;
    Ok(mul_div_floor(effective_wad, WAD, params.rate0)?)
}

/// Gamma: full `base_gamma` within one period of the previous distribution
/// (or when none happened yet), scaled down by `period / elapsed` for longer
/// gaps.
pub fn calculate_gamma(
    params: &DistributionParameters,
    last_distribution: i64,
    now: i64,
    period_secs: u64,
) -> Result<u128> {
    let base = bps_to_wad(params.base_gamma)?;

    if last_distribution == 0 {
        return Ok(base);
    }

    let elapsed = now.saturating_sub(last_distribution);
    if elapsed <= period_secs as i64 {
        return Ok(base);
    }

    Ok(mul_div_floor(base, period_secs as u128, elapsed as u128)?)
}

/// Kappa: cap on the emission multiplier
pub fn calculate_kappa(params: &DistributionParameters, rate: u64, gamma: u128) -> Result<u128> {
    ensure_rate_in_range(rate)?;

    let floored_rate_wad = bps_to_wad(rate.max(params.rate_min))?;
    let denominator = mul_div_floor(gamma, params.rate0, WAD)?;
    if denominator == 0 {
        return Err(DistributionError::AmountIsZero);
    }
    Ok(mul_div_floor(params.m0, floored_rate_wad, denominator)?)
}

/// Mt: bounded emission multiplier
pub fn calculate_mt(
    params: &DistributionParameters,
    st: u128,
    rt: u128,
    gamma: u128,
    kappa: u128,
) -> Result<u128> {
    if gamma == 0 {
        return Err(DistributionError::AmountIsZero);
    }
    let scaled = mul_div_floor(params.m0, st, WAD)?;
    let mt = mul_div_floor(scaled, rt, gamma)?;
    Ok(mt.min(kappa))
}

/// UsualDist: raw daily emission in token units
pub fn calculate_usual_dist(
    params: &DistributionParameters,
    mt: u128,
    total_supply: u128,
    price: u128,
) -> Result<u128> {
    let usd_value = mul_div_floor(total_supply, price, WAD)?;
    let scaled = mul_div_floor(usd_value, mt, WAD)?;
    let with_coefficient = mul_div_floor(scaled, params.d as u128, BPS as u128)?;
    Ok(with_coefficient / DAYS_PER_YEAR)
}

/// Run the full chain for one cycle
pub fn evaluate(
    params: &DistributionParameters,
    inputs: &FormulaInputs,
    last_distribution: i64,
    now: i64,
    period_secs: u64,
) -> Result<u128> {
    let st = calculate_st(params, inputs.total_supply, inputs.price)?;
    let rt = calculate_rt(params, inputs.rate, inputs.p90_rate)?;
    let gamma = calculate_gamma(params, last_distribution, now, period_secs)?;
    let kappa = calculate_kappa(params, inputs.rate, gamma)?;
    let mt = calculate_mt(params, st, rt, gamma, kappa)?;
    calculate_usual_dist(params, mt, inputs.total_supply, inputs.price)
}
