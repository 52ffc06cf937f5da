//! The distribution engine.
//!
//! Owns every piece of protocol state (parameters, shares, fee rates,
//! emission gate, off-chain queue, claim book) and reaches collaborators
//! only through the ports in [`crate::ports`]. Each public operation is
//! atomic: validation happens before any mutation, and the distribution
//! gate advances before external mint/transfer calls so a reentrant cycle
//! sees the already-updated timestamp.

use crate::buckets::{BucketShares, FeeRates};
use crate::claims::{ClaimBook, PendingRedirection};
use crate::constants::{
    BPS, CHALLENGE_PERIOD_SECS, DISTRIBUTION_FREQUENCY_SECS, REDIRECT_DELAY_SECS, WAD,
};
use crate::error::{DistributionError, Result};
use crate::events::DistributionEvent;
use crate::formula::{self, FormulaInputs};
use crate::params::DistributionParameters;
use crate::ports::{AccountId, Collaborators, Role, ZERO_ACCOUNT};
use crate::queue::{ApprovedDistribution, OffChainDistribution, OffChainQueue};
use serde::{Deserialize, Serialize};
use usual_math::mul_div_floor;

/// Static engine configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Minimum seconds between distribution cycles
    pub distribution_frequency_secs: u64,
    /// Challenge window for queued off-chain roots
    pub challenge_period_secs: u64,
    /// Delay before a pending redirection can be accepted
    pub redirect_delay_secs: u64,
    /// Claims revert before this Unix timestamp
    pub claim_start_time: i64,
    /// The engine's own token account (holds swept fees and UsualStar mints)
    pub engine_account: AccountId,
    /// Destination of the UsualX bucket
    pub vault_account: AccountId,
    /// Destination of the treasury fee cut
    pub treasury_account: AccountId,
    /// Spender approved for UsualStar rewards
    pub staking_account: AccountId,
}

impl EngineConfig {
    /// Mainnet configuration; claiming opens December 1, 2024 UTC.
    pub fn mainnet(
        engine_account: AccountId,
        vault_account: AccountId,
        treasury_account: AccountId,
        staking_account: AccountId,
    ) -> Self {
        let claim_start_time = chrono::NaiveDate::from_ymd_opt(2024, 12, 1)
            .expect("valid date")
            .and_hms_opt(0, 0, 0)
            .expect("valid time")
            .and_utc()
            .timestamp();
        Self {
            distribution_frequency_secs: DISTRIBUTION_FREQUENCY_SECS,
            challenge_period_secs: CHALLENGE_PERIOD_SECS,
            redirect_delay_secs: REDIRECT_DELAY_SECS,
            claim_start_time,
            engine_account,
            vault_account,
            treasury_account,
            staking_account,
        }
    }
}

/// Summary of one completed distribution cycle
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionOutcome {
    pub timestamp: i64,
    pub usual_dist: u128,
    pub fee_swept: u128,
    pub off_chain_amount: u128,
    pub usual_x_emission: u128,
    pub usual_x_fee: u128,
    pub usual_star_amount: u128,
    pub treasury_fee: u128,
    pub burned: u128,
}

/// Central distribution engine
pub struct DistributionEngine {
    config: EngineConfig,
    collaborators: Collaborators,
    params: DistributionParameters,
    shares: BucketShares,
    fees: FeeRates,
    /// Last successful cycle, 0 = never
    last_on_chain_distribution: i64,
    /// Cached vault share of the LBT bucket, WAD
    vault_share_of_lbt: u128,
    queue: OffChainQueue,
    claims: ClaimBook,
    paused: bool,
    events: Vec<DistributionEvent>,
}

impl DistributionEngine {
    pub fn new(
        config: EngineConfig,
        collaborators: Collaborators,
        params: DistributionParameters,
    ) -> Self {
        Self {
            config,
            collaborators,
            params,
            shares: BucketShares::default(),
            fees: FeeRates::default(),
            last_on_chain_distribution: 0,
            vault_share_of_lbt: 0,
            queue: OffChainQueue::new(),
            claims: ClaimBook::new(),
            paused: false,
            events: Vec::new(),
        }
    }

    // === Read surface ===

    pub fn params(&self) -> &DistributionParameters {
        &self.params
    }

    pub fn bucket_shares(&self) -> BucketShares {
        self.shares
    }

    pub fn fee_rates(&self) -> FeeRates {
        self.fees
    }

    pub fn last_on_chain_distribution(&self) -> i64 {
        self.last_on_chain_distribution
    }

    pub fn vault_share_of_lbt(&self) -> u128 {
        self.vault_share_of_lbt
    }

    pub fn off_chain_mint_cap(&self) -> u128 {
        self.claims.mint_cap()
    }

    pub fn claimed_by(&self, account: &AccountId) -> u128 {
        self.claims.claimed_by(account)
    }

    pub fn approved_distribution(&self) -> ApprovedDistribution {
        self.queue.approved()
    }

    pub fn queued_distributions(&self) -> &[OffChainDistribution] {
        self.queue.entries()
    }

    pub fn pending_redirection(&self, account: &AccountId) -> Option<PendingRedirection> {
        self.claims.pending_redirection(account)
    }

    pub fn active_redirection(&self, account: &AccountId) -> Option<AccountId> {
        self.claims.active_redirection(account)
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Drain the accumulated audit events
    pub fn take_events(&mut self) -> Vec<DistributionEvent> {
        std::mem::take(&mut self.events)
    }

    // === Internal helpers ===

    fn emit(&mut self, event: DistributionEvent) {
        tracing::debug!(?event, "distribution event");
        self.events.push(event);
    }

    fn ensure_role(&self, caller: &AccountId, role: Role) -> Result<()> {
        if self.collaborators.auth.has_role(*caller, role) {
            Ok(())
        } else {
            Err(DistributionError::MissingRole(role))
        }
    }

    /// Admin, or the named account itself
    fn ensure_admin_or(&self, caller: &AccountId, account: &AccountId) -> Result<()> {
        if caller == account || self.collaborators.auth.has_role(*caller, Role::Admin) {
            Ok(())
        } else {
            Err(DistributionError::MissingRole(Role::Admin))
        }
    }

    fn ensure_not_paused(&self) -> Result<()> {
        if self.paused {
            return Err(DistributionError::Paused);
        }
        Ok(())
    }

    /// Backing-asset price: WAD unless the circuit breaker pins a coefficient
    fn current_price(&self) -> u128 {
        self.collaborators
            .backing
            .circuit_breaker_coefficient()
            .unwrap_or(WAD)
    }

    /// USD value of the vault's assets. A missing vault, a failing oracle,
    /// or a non-positive price all degrade to zero; the oracle must never
    /// abort a cycle.
    fn vault_adjusted_value(&self) -> u128 {
        let Some(vault) = &self.collaborators.vault else {
            return 0;
        };
        let assets = vault.total_assets();
        if assets == 0 {
            return 0;
        }
        let price = match self.collaborators.oracle.price(vault.asset()) {
            Ok(p) if p > 0 => p,
            _ => return 0,
        };
        let Some(scale) = 10u128.checked_pow(vault.asset_decimals() as u32) else {
            return 0;
        };
        mul_div_floor(assets, price, scale).unwrap_or(0)
    }

    fn ensure_rate_in_range(rate: u64) -> Result<()> {
        if rate == 0 || rate > BPS {
            return Err(DistributionError::RateOutOfRange(rate));
        }
        Ok(())
    }

    // === View calculators ===

    /// Supply used by the formula: backing supply plus vault-adjusted value
    pub fn formula_total_supply(&self) -> u128 {
        self.collaborators
            .backing
            .total_supply()
            .saturating_add(self.vault_adjusted_value())
    }

    pub fn calculate_st(&self) -> Result<u128> {
        formula::calculate_st(&self.params, self.formula_total_supply(), self.current_price())
    }

    pub fn calculate_rt(&self) -> Result<u128> {
        let rate = self.collaborators.rate_source.blended_weekly_interest()?;
        let p90 = self.collaborators.rate_source.p90_interest_rate()?;
        formula::calculate_rt(&self.params, rate, p90)
    }

    pub fn calculate_gamma(&self, now: i64) -> Result<u128> {
        formula::calculate_gamma(
            &self.params,
            self.last_on_chain_distribution,
            now,
            self.config.distribution_frequency_secs,
        )
    }

    pub fn calculate_kappa(&self, now: i64) -> Result<u128> {
        let rate = self.collaborators.rate_source.blended_weekly_interest()?;
        let gamma = self.calculate_gamma(now)?;
        formula::calculate_kappa(&self.params, rate, gamma)
    }

    pub fn calculate_mt(&self, now: i64) -> Result<u128> {
        let st = self.calculate_st()?;
        let rt = self.calculate_rt()?;
        let gamma = self.calculate_gamma(now)?;
        let kappa = self.calculate_kappa(now)?;
        formula::calculate_mt(&self.params, st, rt, gamma, kappa)
    }

    pub fn calculate_usual_dist(&self, now: i64) -> Result<u128> {
        let mt = self.calculate_mt(now)?;
        formula::calculate_usual_dist(
            &self.params,
            mt,
            self.formula_total_supply(),
            self.current_price(),
        )
    }

    // === Governance setters ===

    pub fn set_d(&mut self, caller: &AccountId, d: u64) -> Result<()> {
        self.ensure_role(caller, Role::DistributionAllocator)?;
        self.params.set_d(d)?;
        self.emit(DistributionEvent::ParameterUpdated {
            name: "d".to_string(),
            value: d as u128,
        });
        Ok(())
    }

    pub fn set_m0(&mut self, caller: &AccountId, m0: u128) -> Result<()> {
        self.ensure_role(caller, Role::DistributionAllocator)?;
        self.params.set_m0(m0)?;
        self.emit(DistributionEvent::ParameterUpdated {
            name: "m0".to_string(),
            value: m0,
        });
        Ok(())
    }

    pub fn set_rate_min(&mut self, caller: &AccountId, rate_min: u64) -> Result<()> {
        self.ensure_role(caller, Role::DistributionAllocator)?;
        self.params.set_rate_min(rate_min)?;
        self.emit(DistributionEvent::ParameterUpdated {
            name: "rate_min".to_string(),
            value: rate_min as u128,
        });
        Ok(())
    }

    pub fn set_base_gamma(&mut self, caller: &AccountId, base_gamma: u64) -> Result<()> {
        self.ensure_role(caller, Role::DistributionAllocator)?;
        self.params.set_base_gamma(base_gamma)?;
        self.emit(DistributionEvent::ParameterUpdated {
            name: "base_gamma".to_string(),
            value: base_gamma as u128,
        });
        Ok(())
    }

    /// Replace all nine bucket shares atomically
    pub fn set_buckets_distribution(&mut self, caller: &AccountId, values: [u64; 9]) -> Result<()> {
        self.ensure_role(caller, Role::DistributionAllocator)?;
        self.shares = BucketShares::new(values)?;
        self.emit(DistributionEvent::BucketSharesSet { shares: values });
        Ok(())
    }

    pub fn set_fee_rates(
        &mut self,
        caller: &AccountId,
        treasury_bps: u64,
        usual_x_bps: u64,
    ) -> Result<()> {
        self.ensure_role(caller, Role::DistributionAllocator)?;
        let next = FeeRates::new(treasury_bps, usual_x_bps)?;
        if next == self.fees {
            return Err(DistributionError::SameValue);
        }
        self.fees = next;
        self.emit(DistributionEvent::FeeRatesSet {
            treasury_bps,
            usual_x_bps,
        });
        Ok(())
    }

    pub fn pause(&mut self, caller: &AccountId) -> Result<()> {
        self.ensure_role(caller, Role::Pauser)?;
        self.ensure_not_paused()?;
        self.paused = true;
        self.emit(DistributionEvent::EnginePaused);
        Ok(())
    }

    pub fn unpause(&mut self, caller: &AccountId) -> Result<()> {
        self.ensure_role(caller, Role::Pauser)?;
        if !self.paused {
            return Err(DistributionError::NotPaused);
        }
        self.paused = false;
        self.emit(DistributionEvent::EngineUnpaused);
        Ok(())
    }

    // === Distribution cycle ===

    /// Run one daily cycle: compute the emission, sweep fees, refresh the
    /// vault share, and fan everything out across the buckets.
    pub fn distribute_usual_to_buckets(
        &mut self,
        caller: &AccountId,
        now: i64,
    ) -> Result<DistributionOutcome> {
        self.ensure_role(caller, Role::DistributionOperator)?;

        let rate = self.collaborators.rate_source.blended_weekly_interest()?;
        let p90 = self.collaborators.rate_source.p90_interest_rate()?;
        Self::ensure_rate_in_range(rate)?;
        Self::ensure_rate_in_range(p90)?;

        let last = self.last_on_chain_distribution;
        let frequency = self.config.distribution_frequency_secs;
        if last != 0 {
            let elapsed = now.saturating_sub(last);
            if elapsed < frequency as i64 {
                return Err(DistributionError::DistributionFrequencyNotMet {
                    remaining_secs: (frequency as i64 - elapsed) as u64,
                });
            }
        }

        let backing_supply = self.collaborators.backing.total_supply();
        let vault_value = self.vault_adjusted_value();
        let total_supply = backing_supply.saturating_add(vault_value);
        let price = self.current_price();

        let inputs = FormulaInputs {
            total_supply,
            price,
            rate,
            p90_rate: p90,
        };
        let usual_dist = formula::evaluate(&self.params, &inputs, last, now, frequency)?;

        let vault_fees = match &self.collaborators.vault {
            Some(vault) => vault.sweep_fees()?,
            None => 0,
        };
        let backing_fees = self.collaborators.backing.sweep_fees()?;
        let fee_swept = vault_fees.saturating_add(backing_fees);

        let share = if vault_value == 0 {
            0
        } else {
            mul_div_floor(vault_value, WAD, total_supply)?
        };
        if share != self.vault_share_of_lbt {
            self.vault_share_of_lbt = share;
            self.emit(DistributionEvent::VaultShareOfLbtUpdated { share_wad: share });
        }

        // Gate advances before any external mint/transfer so a reentrant
        // call fails the frequency check.
        self.last_on_chain_distribution = now;

        let mut outcome = DistributionOutcome {
            timestamp: now,
            usual_dist,
            fee_swept,
            ..Default::default()
        };
        let period_end = now + frequency as i64;
        let engine = self.config.engine_account;
        let token = self.collaborators.token.clone();

        // Off-chain bucket: everything not settled on-chain feeds the
        // Merkle-claim mint cap.
        let off_chain_bps = self.shares.off_chain_bps();
        if off_chain_bps > 0 {
            let amount = mul_div_floor(usual_dist, off_chain_bps as u128, BPS as u128)?;
            if amount > 0 {
                self.claims.increase_mint_cap(amount);
                outcome.off_chain_amount = amount;
                let mint_cap = self.claims.mint_cap();
                self.emit(DistributionEvent::OffChainBucketAllocated { amount, mint_cap });
            }
        }

        // UsualX: emission minted to the vault plus its fee cut, then the
        // vault streams yield over the next period.
        let usual_x_emission = mul_div_floor(usual_dist, self.shares.usual_x as u128, BPS as u128)?;
        let usual_x_fee = mul_div_floor(fee_swept, self.fees.usual_x_bps as u128, BPS as u128)?;
        if usual_x_emission > 0 || usual_x_fee > 0 {
            if usual_x_emission > 0 {
                token.mint(self.config.vault_account, usual_x_emission)?;
            }
            if usual_x_fee > 0 {
                token.transfer(engine, self.config.vault_account, usual_x_fee)?;
            }
            if let Some(vault) = &self.collaborators.vault {
                vault.start_yield_distribution(usual_x_emission + usual_x_fee, now, period_end)?;
            }
            outcome.usual_x_emission = usual_x_emission;
            outcome.usual_x_fee = usual_x_fee;
            self.emit(DistributionEvent::UsualXBucketAllocated {
                emission: usual_x_emission,
                fee_cut: usual_x_fee,
            });
        }

        // UsualStar: minted to the engine, allowance approved, staking
        // contract pulls over the next period.
        let usual_star_amount =
            mul_div_floor(usual_dist, self.shares.usual_star as u128, BPS as u128)?;
        if usual_star_amount > 0 {
            token.mint(engine, usual_star_amount)?;
            token.approve(engine, self.config.staking_account, usual_star_amount)?;
            self.collaborators.staking.start_reward_distribution(
                usual_star_amount,
                now,
                period_end,
            )?;
            outcome.usual_star_amount = usual_star_amount;
            self.emit(DistributionEvent::UsualStarBucketAllocated {
                amount: usual_star_amount,
            });
        }

        // Treasury fee cut, then the residual dust is burned.
        let treasury_fee = mul_div_floor(fee_swept, self.fees.treasury_bps as u128, BPS as u128)?;
        if treasury_fee > 0 {
            token.transfer(engine, self.config.treasury_account, treasury_fee)?;
            outcome.treasury_fee = treasury_fee;
            self.emit(DistributionEvent::TreasuryFeeAllocated {
                amount: treasury_fee,
            });
        }
        let burned = fee_swept - usual_x_fee - treasury_fee;
        if burned > 0 {
            token.burn(engine, burned)?;
            outcome.burned = burned;
            self.emit(DistributionEvent::FeeRemainderBurned { amount: burned });
        }

        tracing::info!(
            timestamp = now,
            usual_dist,
            fee_swept,
            "distribution cycle completed"
        );
        self.emit(DistributionEvent::UsualDistributed {
            timestamp: now,
            usual_dist,
            fee_swept,
        });
        Ok(outcome)
    }

    // === Off-chain queue ===

    pub fn queue_off_chain_usual_distribution(
        &mut self,
        caller: &AccountId,
        merkle_root: [u8; 32],
        now: i64,
    ) -> Result<()> {
        self.ensure_role(caller, Role::DistributionOperator)?;
        self.queue.enqueue(merkle_root, now)?;
        tracing::info!(
            root = %hex::encode(&merkle_root[..8]),
            timestamp = now,
            "off-chain distribution queued"
        );
        self.emit(DistributionEvent::DistributionQueued {
            timestamp: now,
            merkle_root,
        });
        Ok(())
    }

    pub fn reset_off_chain_distribution_queue(&mut self, caller: &AccountId) -> Result<()> {
        self.ensure_role(caller, Role::DistributionOperator)?;
        self.queue.reset();
        self.emit(DistributionEvent::QueueReset);
        Ok(())
    }

    pub fn challenge_off_chain_distribution(
        &mut self,
        caller: &AccountId,
        before_timestamp: i64,
        now: i64,
    ) -> Result<usize> {
        self.ensure_role(caller, Role::DistributionChallenger)?;
        let removed =
            self.queue
                .challenge(before_timestamp, now, self.config.challenge_period_secs);
        tracing::info!(before_timestamp, removed, "off-chain distributions challenged");
        self.emit(DistributionEvent::DistributionChallenged {
            before_timestamp,
            removed,
        });
        Ok(removed)
    }

    /// Callable by anyone while not paused
    pub fn approve_unchallenged_off_chain_distribution(
        &mut self,
        now: i64,
    ) -> Result<ApprovedDistribution> {
        self.ensure_not_paused()?;
        let approved = self.queue.approve(now, self.config.challenge_period_secs)?;
        tracing::info!(
            root = %hex::encode(&approved.merkle_root[..8]),
            timestamp = approved.timestamp,
            "off-chain distribution approved"
        );
        self.emit(DistributionEvent::DistributionApproved {
            timestamp: approved.timestamp,
            merkle_root: approved.merkle_root,
        });
        Ok(approved)
    }

    // === Claims ===

    /// Prove a cumulative entitlement against the approved root and mint
    /// the delta to the account, or to its redirect target.
    pub fn claim_off_chain_distribution(
        &mut self,
        account: &AccountId,
        cumulative_amount: u128,
        proof: &[[u8; 32]],
        now: i64,
    ) -> Result<u128> {
        self.ensure_not_paused()?;
        if *account == ZERO_ACCOUNT {
            return Err(DistributionError::NullAccount);
        }
        if cumulative_amount == 0 {
            return Err(DistributionError::AmountIsZero);
        }
        if now < self.config.claim_start_time {
            return Err(DistributionError::ClaimingNotStarted);
        }
        if !self.queue.has_approved() {
            return Err(DistributionError::NoApprovedDistribution);
        }

        let root = self.queue.approved().merkle_root;
        let (recipient, delta) = self
            .claims
            .verify_claim(account, cumulative_amount, proof, root)?;
        // The ledger commits only after the mint lands; a failed mint
        // leaves the entitlement claimable.
        self.collaborators.token.mint(recipient, delta)?;
        self.claims.commit_claim(account, cumulative_amount, delta);

        self.emit(DistributionEvent::OffChainClaimed {
            account: *account,
            recipient,
            amount: delta,
            cumulative: cumulative_amount,
        });
        Ok(delta)
    }

    // === Redirection lifecycle ===

    pub fn redirect_off_chain_distribution(
        &mut self,
        caller: &AccountId,
        account: &AccountId,
        new_account: &AccountId,
        now: i64,
    ) -> Result<()> {
        self.ensure_role(caller, Role::Admin)?;
        self.claims.initiate_redirection(account, *new_account, now)?;
        self.emit(DistributionEvent::RedirectionInitiated {
            account: *account,
            target: *new_account,
        });
        Ok(())
    }

    pub fn cancel_initiated_redirected_off_chain_distribution(
        &mut self,
        caller: &AccountId,
        account: &AccountId,
    ) -> Result<()> {
        self.ensure_admin_or(caller, account)?;
        self.claims.cancel_redirection(account)?;
        self.emit(DistributionEvent::RedirectionCancelled { account: *account });
        Ok(())
    }

    pub fn accept_redirected_off_chain_distribution(
        &mut self,
        caller: &AccountId,
        account: &AccountId,
        now: i64,
    ) -> Result<()> {
        // The pending target may accept for itself; the admin may accept
        // on its behalf.
        let pending = self
            .claims
            .pending_redirection(account)
            .ok_or(DistributionError::NoPendingRedirection)?;
        self.ensure_admin_or(caller, &pending.target)?;

        let target = self
            .claims
            .accept_redirection(account, now, self.config.redirect_delay_secs)?;
        self.emit(DistributionEvent::RedirectionAccepted {
            account: *account,
            target,
        });
        Ok(())
    }

    pub fn remove_redirected_off_chain_distribution(
        &mut self,
        caller: &AccountId,
        account: &AccountId,
    ) -> Result<()> {
        self.ensure_admin_or(caller, account)?;
        self.claims.remove_redirection(account)?;
        self.emit(DistributionEvent::RedirectionRemoved { account: *account });
        Ok(())
    }
}
