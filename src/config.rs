//! Engine settings and process configuration.
//!
//! [`EngineConfig`] is the context object one engine owns: who it is, who
//! administers it, what it trades from and how cautiously it trades.
//! [`Config`] is read from the environment (and a `.env` file, if present)
//! and carries the optional overrides applied on top of a scenario.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use alloy::primitives::{Address, U256};
use eyre::{eyre, Error, Result};
use serde::Deserialize;

use crate::arb::optimizer::AllocationPolicy;
use crate::error::ArbError;
use crate::guard::{MevProtection, RiskParameters};
use crate::utils::constants::{DEFAULT_MAX_PATH_LENGTH, MAX_PATH_LENGTH, MIN_PATH_LENGTH};

/// Threshold the amount held at the second-to-last hop must clear
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProfitCheck {
    /// `min_profit_floor`
    BeforeCost,
    /// `min_profit_floor + hop_cost_estimate × pathLength`
    #[default]
    AfterCost,
}

impl FromStr for ProfitCheck {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "before-cost" => Ok(Self::BeforeCost),
            "after-cost" => Ok(Self::AfterCost),
            other => Err(eyre!("unknown profit check: {other}")),
        }
    }
}

/// Everything one engine instance is configured with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Asset every path starts and ends in
    pub base_token: Address,
    /// Address holding the engine's funds and receiving path proceeds
    pub address: Address,
    /// Administrator and sole operator
    pub owner: Address,
    /// Limits read by every hop
    pub risk: RiskParameters,
    /// Rate limiting settings
    pub mev: MevProtection,
    /// Longest path accepted
    pub max_path_length: usize,
    /// Slippage allowance per hop position
    pub max_slippage_unit: U256,
    /// How much of the held amount each hop commits
    pub allocation: AllocationPolicy,
    /// Threshold used by the second-to-last hop
    pub profit_check: ProfitCheck,
    /// Estimated execution cost of one hop, in base asset
    pub hop_cost_estimate: U256,
    /// Profit floor added to the cost threshold
    pub min_profit_floor: U256,
    /// Whether hops are checked against the golden-ratio floor
    pub suboptimal_guard: bool,
}

impl EngineConfig {
    /// Default settings for an engine trading `base_token` from `address`
    #[must_use]
    pub fn new(base_token: Address, address: Address, owner: Address) -> Self {
        Self {
            base_token,
            address,
            owner,
            risk: RiskParameters::default(),
            mev: MevProtection::default(),
            max_path_length: DEFAULT_MAX_PATH_LENGTH,
            max_slippage_unit: U256::from(10).pow(U256::from(18)),
            allocation: AllocationPolicy::default(),
            profit_check: ProfitCheck::default(),
            hop_cost_estimate: U256::ZERO,
            min_profit_floor: U256::ZERO,
            suboptimal_guard: true,
        }
    }

    /// # Errors
    /// * `InvalidPathLength` if `max_path_length` is outside `2..=5`
    pub fn validate(&self) -> Result<(), ArbError> {
        if !(MIN_PATH_LENGTH..=MAX_PATH_LENGTH).contains(&self.max_path_length) {
            return Err(ArbError::InvalidPathLength {
                len: self.max_path_length,
                min: MIN_PATH_LENGTH,
                max: MAX_PATH_LENGTH,
            });
        }
        Ok(())
    }

    /// Overwrite the tunables set in `config`
    pub fn apply_overrides(&mut self, config: &Config) {
        if let Some(unit) = config.max_slippage_unit {
            self.max_slippage_unit = unit;
        }
        if let Some(cost) = config.hop_cost_estimate {
            self.hop_cost_estimate = cost;
        }
        if let Some(check) = config.profit_check {
            self.profit_check = check;
        }
        if let Some(allocation) = config.allocation {
            self.allocation = allocation;
        }
        if let Some(length) = config.max_path_length {
            self.max_path_length = length;
        }
    }
}

/// Process configuration read from the environment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    /// Scenario used when the CLI is given none (`ARBLOOP_SCENARIO`)
    pub scenario: Option<PathBuf>,
    /// `ARBLOOP_MAX_SLIPPAGE_UNIT`
    pub max_slippage_unit: Option<U256>,
    /// `ARBLOOP_HOP_COST`
    pub hop_cost_estimate: Option<U256>,
    /// `ARBLOOP_PROFIT_CHECK`, `before-cost` or `after-cost`
    pub profit_check: Option<ProfitCheck>,
    /// `ARBLOOP_ALLOCATION`, `golden-ratio` or `full`
    pub allocation: Option<AllocationPolicy>,
    /// `ARBLOOP_MAX_PATH_LENGTH`
    pub max_path_length: Option<usize>,
}

impl Config {
    /// Loads `.env` if present and reads the `ARBLOOP_*` variables.
    ///
    /// # Errors
    /// * If a variable is set to a value that does not parse
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Ok(Self {
            scenario: env::var("ARBLOOP_SCENARIO").ok().map(PathBuf::from),
            max_slippage_unit: parse_var("ARBLOOP_MAX_SLIPPAGE_UNIT")?,
            hop_cost_estimate: parse_var("ARBLOOP_HOP_COST")?,
            profit_check: parse_var("ARBLOOP_PROFIT_CHECK")?,
            allocation: parse_var("ARBLOOP_ALLOCATION")?,
            max_path_length: parse_var("ARBLOOP_MAX_PATH_LENGTH")?,
        })
    }
}

/// Parses an optional environment variable
fn parse_var<T>(name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    env::var(name).ok().map_or(Ok(None), |value| {
        value
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| eyre!("invalid {name}={value}: {e}"))
    })
}
