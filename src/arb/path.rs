//! # Path Controller
//!
//! Drives a whole path: validates its shape, sends the base asset into the
//! first pool, runs every hop in order and applies the final checks. The
//! controller has no notion of atomicity, callers wrap it in a journal
//! checkpoint and revert on any error.

use alloy::primitives::{Address, U256};
use log::debug;

use super::quote::Quoter;
use super::swap::SwapStepExecutor;
use super::trace::PathTrace;
use super::types::{PathRequest, SwapState};
use crate::chain::Chain;
use crate::config::EngineConfig;
use crate::error::ArbError;
use crate::guard::Guard;
use crate::math::geometric_mean;
use crate::utils::constants::{MAX_FEE_BPS, MIN_PATH_LENGTH, PHI, PRECISION};

/// Options of a dry run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvaluateOptions {
    /// Stop after this hop, skipping the remaining hops and the final checks
    pub stop_after: Option<usize>,
}

impl EvaluateOptions {
    /// Stop after hop `index`
    #[must_use]
    pub const fn stop_after(index: usize) -> Self {
        Self {
            stop_after: Some(index),
        }
    }
}

/// Runs paths with the settings of one engine
pub struct PathController<'a> {
    /// Engine settings
    config: &'a EngineConfig,
    /// Hop runner sharing the same settings
    executor: SwapStepExecutor<'a>,
}

impl<'a> PathController<'a> {
    /// Creates a controller
    #[must_use]
    pub fn new(config: &'a EngineConfig, guard: &'a Guard, quoter: &'a dyn Quoter) -> Self {
        Self {
            config,
            executor: SwapStepExecutor::new(config, guard, quoter),
        }
    }

    /// Checks that can be made without touching the host.
    ///
    /// # Errors
    /// * `InvalidPathLength` outside `2..=max_path_length`
    /// * `ZeroAmount` if nothing is committed
    /// * `InvalidFee` if a hop declares more than 100%
    pub fn validate(&self, request: &PathRequest) -> Result<(), ArbError> {
        let len = request.len();
        if !(MIN_PATH_LENGTH..=self.config.max_path_length).contains(&len) {
            return Err(ArbError::InvalidPathLength {
                len,
                min: MIN_PATH_LENGTH,
                max: self.config.max_path_length,
            });
        }
        if request.amount_in.is_zero() {
            return Err(ArbError::ZeroAmount);
        }
        if let Some((hop, fee)) = request
            .hops
            .iter()
            .enumerate()
            .find(|(_, hop)| hop.fee_bps > MAX_FEE_BPS)
        {
            return Err(ArbError::InvalidFee {
                hop,
                fee_bps: fee.fee_bps,
            });
        }
        Ok(())
    }

    /// Run `request`, paying the proceeds to `recipient`.
    ///
    /// With `options.stop_after` set the run ends after that hop and the
    /// returned trace is partial.
    ///
    /// # Errors
    /// * Any validation, guard, market or profitability failure, see [`ArbError`]
    pub fn run<C: Chain + ?Sized>(
        &self,
        chain: &mut C,
        request: &PathRequest,
        recipient: Address,
        options: EvaluateOptions,
    ) -> Result<PathTrace, ArbError> {
        self.validate(request)?;
        let base = self.config.base_token;
        let path_length = request.len();

        let available = chain.balance_of(base, self.config.address);
        if request.amount_in > available {
            return Err(ArbError::InsufficientFunds {
                required: request.amount_in,
                available,
            });
        }

        let first = request.hops[0].pool;
        let before = chain.balance_of(base, first);
        chain.transfer(base, self.config.address, first, request.amount_in)?;
        let received = chain.balance_of(base, first).saturating_sub(before);
        debug!(
            "path: {path_length} hops, sent {} received {received}",
            request.amount_in
        );

        let mut state = SwapState::new(base, received, path_length);
        let mut hops = Vec::with_capacity(path_length);
        let mut amount_sent = request.amount_in;
        for index in 0..path_length {
            let hop = self.executor.execute(
                chain,
                &mut state,
                &request.hops,
                index,
                recipient,
                amount_sent,
            )?;
            amount_sent = hop.quoted_out;
            hops.push(hop);

            if index >= 1 && self.config.suboptimal_guard {
                self.check_suboptimal(&state, index)?;
            }
            if options.stop_after == Some(index) && index + 1 < path_length {
                return Ok(PathTrace {
                    hops,
                    amount_in: request.amount_in,
                    amount_out: state.current_amount,
                    cumulative_impact: state.cumulative_impact,
                    completed: false,
                });
            }
        }

        self.finalize(&state, request)?;
        Ok(PathTrace {
            hops,
            amount_in: request.amount_in,
            amount_out: state.current_amount,
            cumulative_impact: state.cumulative_impact,
            completed: true,
        })
    }

    /// Output of hop `index` against the golden-ratio floor of the two
    /// amounts before it
    fn check_suboptimal(&self, state: &SwapState, index: usize) -> Result<(), ArbError> {
        let floor = geometric_mean(state.amounts[index - 1], state.amounts[index])
            .checked_mul(PHI)
            .ok_or(ArbError::NumericalInstability("suboptimal floor overflow"))?
            / PRECISION;
        let actual = state.amounts[index + 1];
        if actual < floor {
            return Err(ArbError::SuboptimalPath {
                hop: index,
                actual,
                floor,
            });
        }
        Ok(())
    }

    /// Circularity, target and cumulative slippage
    fn finalize(&self, state: &SwapState, request: &PathRequest) -> Result<(), ArbError> {
        if state.transit_token != self.config.base_token {
            return Err(ArbError::NonCircularPath {
                token: state.transit_token,
            });
        }
        if state.current_amount < request.min_amount_out {
            return Err(ArbError::MinimumProfitNotMet {
                required: request.min_amount_out,
                actual: state.current_amount,
            });
        }
        let limit = self
            .config
            .max_slippage_unit
            .saturating_mul(U256::from(state.path_length));
        if state.cumulative_impact > limit {
            return Err(ArbError::ExcessiveSlippage {
                hop: state.path_length,
                value: state.cumulative_impact,
                limit,
            });
        }
        Ok(())
    }
}
