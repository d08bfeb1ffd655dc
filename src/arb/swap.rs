//! # Swap Step Executor
//!
//! Runs one hop of a path against the host: re-reads the pool, applies every
//! per-hop guard, quotes the committed amount, asks the pool for the output
//! and measures what the beneficiary actually received. The measured amount,
//! not the quote, is what the next hop works with, so fee-on-transfer tokens
//! are accounted for.

use alloy::primitives::{Address, U256};
use log::debug;

use super::impact::{incremental_impact, relative_impact_ppm};
use super::pool::{query, PoolState};
use super::quote::Quoter;
use super::trace::HopTrace;
use super::types::{Hop, SwapState};
use crate::chain::Chain;
use crate::config::{EngineConfig, ProfitCheck};
use crate::error::ArbError;
use crate::guard::Guard;
use crate::utils::constants::{BIPS, PRECISION};

/// Executes single hops with the settings of one engine
pub struct SwapStepExecutor<'a> {
    /// Engine settings
    config: &'a EngineConfig,
    /// Pause flag, blacklist and risk parameters
    guard: &'a Guard,
    /// Pricing strategy
    quoter: &'a dyn Quoter,
}

impl<'a> SwapStepExecutor<'a> {
    /// Creates an executor
    #[must_use]
    pub fn new(config: &'a EngineConfig, guard: &'a Guard, quoter: &'a dyn Quoter) -> Self {
        Self {
            config,
            guard,
            quoter,
        }
    }

    /// Execute hop `index` of `hops`.
    ///
    /// The input is expected to already sit in the hop's pool: `amount_sent`
    /// is what the previous step sent, `state.current_amount` what the pool
    /// was measured to receive. The output goes to the next hop's pool, or to
    /// `recipient` on the last hop.
    ///
    /// # Errors
    /// * `Paused`, `PairNotInPath` if the engine is paused or the pool excluded
    /// * `InsufficientLiquidity`, `ExcessiveSlippage`, `ExcessivePriceImpact`,
    ///   `TradeVolumeExceeded` if a risk limit is exceeded
    /// * `MinimumProfitNotMet` at the second-to-last hop
    /// * `NumericalInstability`, `Chain` if the quote or the swap fails
    pub fn execute<C: Chain + ?Sized>(
        &self,
        chain: &mut C,
        state: &mut SwapState,
        hops: &[Hop],
        index: usize,
        recipient: Address,
        amount_sent: U256,
    ) -> Result<HopTrace, ArbError> {
        let hop = hops[index];
        let path_length = state.path_length;
        let risk = self.guard.risk();
        let token_in = state.transit_token;
        let current = state.current_amount;

        self.guard.ensure_active()?;
        if self.guard.is_blacklisted(hop.pool) {
            return Err(ArbError::PairNotInPath {
                pool: hop.pool,
                token: token_in,
            });
        }

        let oriented = query(chain, hop.pool, token_in)?;
        if oriented.reserve_in < risk.min_pool_liquidity
            || oriented.reserve_out < risk.min_pool_liquidity
        {
            return Err(ArbError::InsufficientLiquidity { pool: hop.pool });
        }
        let pool = PoolState::score(hop.pool, oriented, current)?;

        if risk.sandwich_protection_bips > 0 {
            let deviation = sandwich_deviation_bips(current, pool.reserve_in, pool.reserve_out)?;
            let limit = U256::from(risk.sandwich_protection_bips);
            if deviation > limit {
                return Err(ArbError::ExcessiveSlippage {
                    hop: index,
                    value: deviation,
                    limit,
                });
            }
        }

        let impact_ppm = relative_impact_ppm(pool.price_impact);
        let impact_limit = U256::from(risk.max_price_impact);
        if impact_ppm > impact_limit {
            return Err(ArbError::ExcessivePriceImpact {
                hop: index,
                impact_ppm,
                limit_ppm: impact_limit,
            });
        }

        let allocation = self.config.allocation;
        let committed = allocation.committed_amount(current, path_length, index);
        if committed > risk.max_trade_volume {
            return Err(ArbError::TradeVolumeExceeded {
                amount: committed,
                limit: risk.max_trade_volume,
            });
        }
        let amount_in_with_fee =
            allocation.calculate_optimal_amount(current, hop.fee_bps, path_length, index)?;
        let amount_out =
            self.quoter
                .quote(committed, pool.reserve_in, pool.reserve_out, hop.fee_bps)?;

        let slippage = incremental_impact(pool.price_impact)
            .checked_mul(current)
            .ok_or(ArbError::NumericalInstability("hop slippage overflow"))?
            / PRECISION;
        let ceiling = slippage_ceiling(self.config.max_slippage_unit, index, path_length);
        if slippage > ceiling {
            return Err(ArbError::ExcessiveSlippage {
                hop: index,
                value: slippage,
                limit: ceiling,
            });
        }

        if index + 2 == path_length {
            let threshold = profit_threshold(self.config, path_length)?;
            if current <= threshold {
                return Err(ArbError::MinimumProfitNotMet {
                    required: threshold,
                    actual: current,
                });
            }
        }

        let beneficiary = hops.get(index + 1).map_or(recipient, |next| next.pool);
        let before = chain.balance_of(pool.token_out, beneficiary);
        let (amount0_out, amount1_out) = pool.direction().amounts_out(amount_out);
        chain.swap(hop.pool, amount0_out, amount1_out, beneficiary, &[])?;
        let measured_out = chain
            .balance_of(pool.token_out, beneficiary)
            .saturating_sub(before);

        debug!(
            "hop[{index}]: {} {current} {token_in} -> {measured_out} {} (quoted {amount_out}, impact {})",
            pool.direction(),
            pool.token_out,
            pool.price_impact
        );

        state.transit_token = pool.token_out;
        state.current_amount = measured_out;
        state.amount_in_with_fee = amount_in_with_fee;
        state.amount_out = amount_out;
        state.slippage = slippage;
        state.cumulative_impact = state
            .cumulative_impact
            .checked_add(slippage)
            .ok_or(ArbError::NumericalInstability("cumulative impact overflow"))?;
        state.amounts.push(measured_out);

        Ok(HopTrace {
            index,
            pool: hop.pool,
            token_in,
            token_out: pool.token_out,
            reserve_in: pool.reserve_in,
            reserve_out: pool.reserve_out,
            fee_ppm: hop.fee_ppm(),
            amount_sent,
            amount_in: current,
            committed,
            amount_in_with_fee,
            price_impact: pool.price_impact,
            quoted_out: amount_out,
            measured_out,
            slippage,
        })
    }
}

/// How far the execution price of selling `amount_in` lands below the spot
/// price, in basis points of the spot price.
///
/// # Errors
/// * `NumericalInstability` on overflow
pub fn sandwich_deviation_bips(
    amount_in: U256,
    reserve_in: U256,
    reserve_out: U256,
) -> Result<U256, ArbError> {
    let scaled_out = reserve_out
        .checked_mul(PRECISION)
        .ok_or(ArbError::NumericalInstability("spot price overflow"))?;
    let grown_in = reserve_in
        .checked_add(amount_in)
        .ok_or(ArbError::NumericalInstability("implied price overflow"))?;
    if reserve_in.is_zero() {
        return Err(ArbError::NumericalInstability("zero reserve in spot price"));
    }
    let spot = scaled_out / reserve_in;
    if spot.is_zero() {
        return Ok(U256::ZERO);
    }
    let implied = scaled_out / grown_in;
    (spot - implied)
        .checked_mul(BIPS)
        .map(|deviation| deviation / spot)
        .ok_or(ArbError::NumericalInstability("price deviation overflow"))
}

/// Largest slippage hop `index` of `path_length` may charge:
/// `max_slippage_unit × (index + 1) / path_length`
#[must_use]
pub fn slippage_ceiling(max_slippage_unit: U256, index: usize, path_length: usize) -> U256 {
    let position = U256::from(index + 1);
    let length = U256::from(path_length.max(1));
    max_slippage_unit
        .checked_mul(position)
        .map_or_else(|| max_slippage_unit / length * position, |v| v / length)
}

/// Amount the second-to-last hop must hold more than.
///
/// # Errors
/// * `NumericalInstability` on overflow
pub fn profit_threshold(config: &EngineConfig, path_length: usize) -> Result<U256, ArbError> {
    match config.profit_check {
        ProfitCheck::BeforeCost => Ok(config.min_profit_floor),
        ProfitCheck::AfterCost => config
            .hop_cost_estimate
            .checked_mul(U256::from(path_length))
            .and_then(|cost| cost.checked_add(config.min_profit_floor))
            .ok_or(ArbError::NumericalInstability("profit threshold overflow")),
    }
}
