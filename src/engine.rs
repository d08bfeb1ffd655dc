//! # Arbitrage Engine
//!
//! The invocation surface. An [`ArbEngine`] owns its settings, its guard
//! state and its quoting strategy; the host is passed to every call.
//!
//! Every executing entry point is all-or-nothing: the deadline, ownership,
//! pause flag, path shapes and rate limit are checked before anything is
//! touched, then the whole invocation runs inside one journal checkpoint
//! that is committed only if every path succeeded. A committed invocation
//! counts once against the caller's rate limit, whatever the number of
//! paths it carried; a rejected one does not count.

use alloy::primitives::{Address, U256};
use log::{info, warn};

use crate::arb::impact::relative_impact_ppm;
use crate::arb::path::{EvaluateOptions, PathController};
use crate::arb::pool::PoolState;
use crate::arb::quote::{ConstantProductQuoter, Quoter};
use crate::arb::trace::{PathMetrics, PathTrace};
use crate::arb::types::{Hop, PathRequest, TokenAddress};
use crate::chain::{Chain, Ledger, Pools};
use crate::config::EngineConfig;
use crate::error::ArbError;
use crate::guard::{Guard, MevProtection, RiskParameters};
use crate::utils::constants::PRECISION;

/// A multi-hop circular arbitrage engine
pub struct ArbEngine {
    /// Identity and tunables
    config: EngineConfig,
    /// Pause flag, blacklist, risk parameters and rate limiter
    guard: Guard,
    /// Pricing strategy used for every hop
    quoter: Box<dyn Quoter>,
}

impl ArbEngine {
    /// Creates an engine quoting with the constant-product formula.
    ///
    /// # Errors
    /// * `InvalidRiskParameters` if the configured limits are out of bounds
    /// * `InvalidPathLength` if the longest path is outside `2..=5`
    pub fn new(config: EngineConfig) -> Result<Self, ArbError> {
        config.validate()?;
        let guard = Guard::new(config.risk, config.mev)?;
        Ok(Self {
            config,
            guard,
            quoter: Box::new(ConstantProductQuoter),
        })
    }

    /// Replace the pricing strategy
    #[must_use]
    pub fn with_quoter(mut self, quoter: Box<dyn Quoter>) -> Self {
        self.quoter = quoter;
        self
    }

    /// Run one path, keeping the proceeds in the engine.
    ///
    /// # Errors
    /// * Any rejection, see [`ArbError`]; nothing is changed in that case
    pub fn execute_path<C: Chain + ?Sized>(
        &mut self,
        chain: &mut C,
        caller: Address,
        request: &PathRequest,
        deadline: u64,
    ) -> Result<U256, ArbError> {
        let recipient = self.config.address;
        let outputs = self.invoke(chain, caller, &[(request, recipient)], deadline)?;
        Ok(outputs.into_iter().next().unwrap_or_default())
    }

    /// Run independent paths, all of which must succeed.
    ///
    /// # Errors
    /// * The first rejection, see [`ArbError`]; nothing is changed in that case
    pub fn execute_paths<C: Chain + ?Sized>(
        &mut self,
        chain: &mut C,
        caller: Address,
        requests: &[PathRequest],
        deadline: u64,
    ) -> Result<Vec<U256>, ArbError> {
        let recipient = self.config.address;
        let batch: Vec<_> = requests.iter().map(|r| (r, recipient)).collect();
        self.invoke(chain, caller, &batch, deadline)
    }

    /// Run paths that each pay a distinct recipient, all of which must succeed.
    ///
    /// # Errors
    /// * The first rejection, see [`ArbError`]; nothing is changed in that case
    pub fn execute_batch<C: Chain + ?Sized>(
        &mut self,
        chain: &mut C,
        caller: Address,
        batch: &[(PathRequest, Address)],
        deadline: u64,
    ) -> Result<Vec<U256>, ArbError> {
        let batch: Vec<_> = batch.iter().map(|(r, to)| (r, *to)).collect();
        self.invoke(chain, caller, &batch, deadline)
    }

    /// Shared body of the executing entry points
    fn invoke<C: Chain + ?Sized>(
        &mut self,
        chain: &mut C,
        caller: Address,
        batch: &[(&PathRequest, Address)],
        deadline: u64,
    ) -> Result<Vec<U256>, ArbError> {
        let block = chain.block();
        let result = self.precheck(caller, batch, deadline, block.timestamp).and_then(|()| {
            self.guard.rate_limiter().check(caller, block)?;
            let checkpoint = chain.checkpoint();
            match self.run_all(chain, batch) {
                Ok(outputs) => {
                    chain.commit(checkpoint);
                    Ok(outputs)
                }
                Err(e) => {
                    chain.revert_to(checkpoint);
                    Err(e)
                }
            }
        });

        match result {
            Ok(outputs) => {
                self.guard.rate_limiter_mut().record(caller, block);
                info!(
                    "engine: {} path(s) committed in block {} for {caller}: {outputs:?}",
                    batch.len(),
                    block.number
                );
                Ok(outputs)
            }
            Err(e) => {
                warn!("engine: invocation by {caller} rejected: {e}");
                Err(e)
            }
        }
    }

    /// Rejections that need no host state besides the clock
    fn precheck(
        &self,
        caller: Address,
        batch: &[(&PathRequest, Address)],
        deadline: u64,
        now: u64,
    ) -> Result<(), ArbError> {
        if now > deadline {
            return Err(ArbError::DeadlineExpired { deadline, now });
        }
        self.ensure_owner(caller)?;
        self.guard.ensure_active()?;
        if batch.is_empty() {
            return Err(ArbError::EmptyBatch);
        }
        let controller = self.controller();
        batch
            .iter()
            .try_for_each(|(request, _)| controller.validate(request))
    }

    /// Run every path of a batch in order
    fn run_all<C: Chain + ?Sized>(
        &self,
        chain: &mut C,
        batch: &[(&PathRequest, Address)],
    ) -> Result<Vec<U256>, ArbError> {
        let controller = self.controller();
        batch
            .iter()
            .map(|(request, recipient)| {
                controller
                    .run(chain, request, *recipient, EvaluateOptions::default())
                    .map(|trace| trace.amount_out)
            })
            .collect()
    }

    /// Dry run of `request` returning the per-hop trace. The host is left
    /// exactly as it was, whatever the outcome, and the rate limiter is not
    /// consulted.
    ///
    /// # Errors
    /// * Any rejection `execute_path` would report, except deadline,
    ///   ownership and rate limiting
    pub fn evaluate<C: Chain + ?Sized>(
        &self,
        chain: &mut C,
        request: &PathRequest,
        options: EvaluateOptions,
    ) -> Result<PathTrace, ArbError> {
        let checkpoint = chain.checkpoint();
        let result = self
            .controller()
            .run(chain, request, self.config.address, options);
        chain.revert_to(checkpoint);
        result
    }

    /// Quote `hops` from reserves alone, without guards or transfers.
    ///
    /// # Errors
    /// * `PairNotInPath`, `NumericalInstability` or `Chain` if a pool cannot
    ///   be quoted, `ZeroAmount` for a zero input
    pub fn path_metrics<C: Pools + ?Sized>(
        &self,
        chain: &C,
        hops: &[Hop],
        amount_in: U256,
    ) -> Result<PathMetrics, ArbError> {
        if amount_in.is_zero() {
            return Err(ArbError::ZeroAmount);
        }
        let mut token = self.config.base_token;
        let mut amount = amount_in;
        let mut price_impact_ppm = U256::ZERO;
        for (index, hop) in hops.iter().enumerate() {
            let pool = PoolState::analyze(chain, hop.pool, token, amount)?;
            price_impact_ppm = price_impact_ppm.saturating_add(relative_impact_ppm(pool.price_impact));
            let committed = self
                .config
                .allocation
                .committed_amount(amount, hops.len(), index);
            amount = self
                .quoter
                .quote(committed, pool.reserve_in, pool.reserve_out, hop.fee_bps)?;
            token = pool.token_out;
        }
        Ok(PathMetrics {
            expected_out: amount,
            price_impact_ppm,
            optimality_score: amount.saturating_mul(PRECISION) / amount_in,
        })
    }

    /// Replace the risk parameters.
    ///
    /// # Errors
    /// * `Unauthorized` unless called by the owner
    /// * `InvalidRiskParameters` if a value is out of bounds
    pub fn set_risk_parameters(
        &mut self,
        caller: Address,
        risk: RiskParameters,
    ) -> Result<(), ArbError> {
        self.ensure_owner(caller)?;
        self.guard.set_risk(risk)?;
        self.config.risk = risk;
        Ok(())
    }

    /// Replace the rate limiting settings.
    ///
    /// # Errors
    /// * `Unauthorized` unless called by the owner
    /// * `InvalidRiskParameters` if enabled with a zero per-block allowance
    pub fn configure_mev_protection(
        &mut self,
        caller: Address,
        protection: MevProtection,
    ) -> Result<(), ArbError> {
        self.ensure_owner(caller)?;
        protection.validate()?;
        info!("engine: mev protection set to {protection:?}");
        self.guard.rate_limiter_mut().configure(protection);
        self.config.mev = protection;
        Ok(())
    }

    /// Exclude a pool from, or readmit it to, every path.
    ///
    /// # Errors
    /// * `Unauthorized` unless called by the owner
    pub fn set_pool_blacklisted(
        &mut self,
        caller: Address,
        pool: Address,
        blacklisted: bool,
    ) -> Result<(), ArbError> {
        self.ensure_owner(caller)?;
        self.guard.set_blacklisted(pool, blacklisted);
        Ok(())
    }

    /// Suspend path execution.
    ///
    /// # Errors
    /// * `Unauthorized` unless called by the owner
    pub fn pause(&mut self, caller: Address) -> Result<(), ArbError> {
        self.ensure_owner(caller)?;
        self.guard.set_paused(true);
        Ok(())
    }

    /// Resume path execution.
    ///
    /// # Errors
    /// * `Unauthorized` unless called by the owner
    pub fn unpause(&mut self, caller: Address) -> Result<(), ArbError> {
        self.ensure_owner(caller)?;
        self.guard.set_paused(false);
        Ok(())
    }

    /// Hand administration over to `new_owner`.
    ///
    /// # Errors
    /// * `Unauthorized` unless called by the owner
    pub fn transfer_ownership(
        &mut self,
        caller: Address,
        new_owner: Address,
    ) -> Result<(), ArbError> {
        self.ensure_owner(caller)?;
        info!("engine: ownership transferred from {caller} to {new_owner}");
        self.config.owner = new_owner;
        Ok(())
    }

    /// Withdraw a stray balance held by the engine.
    ///
    /// # Errors
    /// * `Unauthorized` unless called by the owner
    /// * `NotPaused` unless the engine is paused
    /// * `Chain` if the engine does not hold `amount`
    pub fn recover_tokens<L: Ledger + ?Sized>(
        &self,
        chain: &mut L,
        caller: Address,
        token: TokenAddress,
        amount: U256,
        to: Address,
    ) -> Result<(), ArbError> {
        self.ensure_owner(caller)?;
        if !self.guard.is_paused() {
            return Err(ArbError::NotPaused);
        }
        chain.transfer(token, self.config.address, to, amount)?;
        warn!("engine: recovered {amount} of {token} to {to}");
        Ok(())
    }

    /// Current risk parameters
    #[must_use]
    pub const fn risk_parameters(&self) -> &RiskParameters {
        self.guard.risk()
    }

    /// Current rate limiting settings
    #[must_use]
    pub const fn mev_protection(&self) -> MevProtection {
        self.guard.rate_limiter().protection()
    }

    /// Asset every path starts and ends in
    #[must_use]
    pub const fn base_token(&self) -> TokenAddress {
        self.config.base_token
    }

    /// Current administrator
    #[must_use]
    pub const fn owner(&self) -> Address {
        self.config.owner
    }

    /// Whether path execution is suspended
    #[must_use]
    pub const fn is_paused(&self) -> bool {
        self.guard.is_paused()
    }

    /// Whether `pool` is excluded from every path
    #[must_use]
    pub fn is_blacklisted(&self, pool: Address) -> bool {
        self.guard.is_blacklisted(pool)
    }

    /// Engine settings
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Controller bound to this engine's settings
    fn controller(&self) -> PathController<'_> {
        PathController::new(&self.config, &self.guard, self.quoter.as_ref())
    }

    /// # Errors
    /// * `Unauthorized` unless `caller` is the owner
    fn ensure_owner(&self, caller: Address) -> Result<(), ArbError> {
        if caller != self.config.owner {
            return Err(ArbError::Unauthorized(caller));
        }
        Ok(())
    }
}
