use std::str::FromStr;

use alloy::primitives::{Address, U256};
use eyre::{eyre, Report};
use serde::Deserialize;

use crate::arb::optimizer::AllocationPolicy;
use crate::arb::types::{Hop, PathRequest};
use crate::config::{EngineConfig, ProfitCheck};
use crate::guard::{MevProtection, RiskParameters};
use crate::utils::constants::UNISWAP_V2_FEE_BPS;

/// A scenario file: a host to build and the paths to run against it
#[derive(Debug, Deserialize)]
pub struct ScenarioFile {
    /// Engine identity and tunables
    pub engine: EngineSpec,
    /// Block the scenario starts in
    #[serde(default)]
    pub block: Option<BlockSpec>,
    /// Pairs to register
    pub pools: Vec<PoolSpec>,
    /// Balances to mint
    #[serde(default)]
    pub balances: Vec<BalanceSpec>,
    /// Fee-on-transfer tokens
    #[serde(default)]
    pub transfer_fees: Vec<TransferFeeSpec>,
    /// Paths to evaluate or execute
    #[serde(default)]
    pub paths: Vec<PathSpec>,
    /// Deadline of the invocation, defaults to one minute after the block
    #[serde(default)]
    pub deadline: Option<u64>,
}

/// Engine section
#[derive(Debug, Deserialize)]
pub struct EngineSpec {
    /// Base asset
    pub base_token: String,
    /// Holding address
    pub address: String,
    /// Administrator
    pub owner: String,
    /// Risk limits
    #[serde(default)]
    pub risk: Option<RiskSpec>,
    /// Rate limiting
    #[serde(default)]
    pub mev: Option<MevSpec>,
    /// Longest path accepted
    #[serde(default)]
    pub max_path_length: Option<usize>,
    /// Slippage allowance per hop position
    #[serde(default)]
    pub max_slippage_unit: Option<String>,
    /// Committed amount policy
    #[serde(default)]
    pub allocation: Option<AllocationPolicy>,
    /// Second-to-last hop threshold policy
    #[serde(default)]
    pub profit_check: Option<ProfitCheck>,
    /// Estimated cost of one hop
    #[serde(default)]
    pub hop_cost_estimate: Option<String>,
    /// Profit floor
    #[serde(default)]
    pub min_profit_floor: Option<String>,
    /// Golden-ratio floor between hops
    #[serde(default)]
    pub suboptimal_guard: Option<bool>,
}

/// Risk limits, amounts as decimal or `0x` strings
#[derive(Debug, Deserialize)]
pub struct RiskSpec {
    /// Largest amount a hop may commit
    pub max_trade_volume: Option<String>,
    /// Smallest reserve a pool may hold
    pub min_pool_liquidity: Option<String>,
    /// Largest relative impact, in PPM
    pub max_price_impact: Option<u32>,
    /// Largest sandwich deviation, in basis points
    pub sandwich_protection_bips: Option<u16>,
}

/// Rate limiting
#[derive(Debug, Deserialize)]
pub struct MevSpec {
    /// Whether callers are limited
    pub enabled: bool,
    /// Invocations per caller and block
    pub max_tx_per_block: u32,
    /// Seconds between invocations
    pub min_delay: u64,
}

impl From<MevSpec> for MevProtection {
    fn from(spec: MevSpec) -> Self {
        Self {
            enabled: spec.enabled,
            max_tx_per_block: spec.max_tx_per_block,
            min_delay: spec.min_delay,
        }
    }
}

/// Starting block
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct BlockSpec {
    /// Block number
    pub number: u64,
    /// Timestamp in seconds
    pub timestamp: u64,
}

/// A pair to register
#[derive(Debug, Deserialize)]
pub struct PoolSpec {
    /// Pool address
    pub address: String,
    /// First token
    pub token0: String,
    /// Second token
    pub token1: String,
    /// Reserve of `token0`
    pub reserve0: String,
    /// Reserve of `token1`
    pub reserve1: String,
    /// Fee enforced by the pool, defaults to 30 bps
    #[serde(default)]
    pub fee_bps: Option<u16>,
}

/// A balance to mint
#[derive(Debug, Deserialize)]
pub struct BalanceSpec {
    /// Token
    pub token: String,
    /// Holder
    pub holder: String,
    /// Amount
    pub amount: String,
}

/// A fee-on-transfer token
#[derive(Debug, Deserialize)]
pub struct TransferFeeSpec {
    /// Token
    pub token: String,
    /// Fee burned on every transfer
    pub fee_bps: u16,
}

/// A hop of a path
#[derive(Debug, Deserialize)]
pub struct HopSpec {
    /// Pool to swap through
    pub pool: String,
    /// Fee to quote with, defaults to 30 bps
    #[serde(default)]
    pub fee_bps: Option<u16>,
}

/// A path to run
#[derive(Debug, Deserialize)]
pub struct PathSpec {
    /// Hops in order
    pub hops: Vec<HopSpec>,
    /// Base asset committed
    pub amount_in: String,
    /// Minimum base asset returned
    #[serde(default)]
    pub min_amount_out: Option<String>,
    /// Who receives the proceeds, defaults to the engine
    #[serde(default)]
    pub recipient: Option<String>,
}

/// Parses a hex address
///
/// # Errors
/// * If `value` is not a 20-byte hex string
pub fn parse_address(value: &str) -> Result<Address, Report> {
    Address::from_str(value.trim()).map_err(|e| eyre!("invalid address {value}: {e}"))
}

/// Parses a decimal or `0x` amount
///
/// # Errors
/// * If `value` is not a 256-bit unsigned integer
pub fn parse_amount(value: &str) -> Result<U256, Report> {
    U256::from_str(value.trim()).map_err(|e| eyre!("invalid amount {value}: {e}"))
}

/// Parses an optional amount
fn parse_optional(value: Option<&String>) -> Result<Option<U256>, Report> {
    value.map(|v| parse_amount(v)).transpose()
}

impl TryFrom<RiskSpec> for RiskParameters {
    type Error = Report;

    fn try_from(spec: RiskSpec) -> Result<Self, Self::Error> {
        let defaults = Self::default();
        Ok(Self {
            max_trade_volume: parse_optional(spec.max_trade_volume.as_ref())?
                .unwrap_or(defaults.max_trade_volume),
            min_pool_liquidity: parse_optional(spec.min_pool_liquidity.as_ref())?
                .unwrap_or(defaults.min_pool_liquidity),
            max_price_impact: spec.max_price_impact.unwrap_or(defaults.max_price_impact),
            sandwich_protection_bips: spec
                .sandwich_protection_bips
                .unwrap_or(defaults.sandwich_protection_bips),
        })
    }
}

impl TryFrom<EngineSpec> for EngineConfig {
    type Error = Report;

    fn try_from(spec: EngineSpec) -> Result<Self, Self::Error> {
        let mut config = Self::new(
            parse_address(&spec.base_token)?,
            parse_address(&spec.address)?,
            parse_address(&spec.owner)?,
        );
        if let Some(risk) = spec.risk {
            config.risk = risk.try_into()?;
        }
        if let Some(mev) = spec.mev {
            config.mev = mev.into();
        }
        if let Some(length) = spec.max_path_length {
            config.max_path_length = length;
        }
        if let Some(unit) = parse_optional(spec.max_slippage_unit.as_ref())? {
            config.max_slippage_unit = unit;
        }
        if let Some(allocation) = spec.allocation {
            config.allocation = allocation;
        }
        if let Some(check) = spec.profit_check {
            config.profit_check = check;
        }
        if let Some(cost) = parse_optional(spec.hop_cost_estimate.as_ref())? {
            config.hop_cost_estimate = cost;
        }
        if let Some(floor) = parse_optional(spec.min_profit_floor.as_ref())? {
            config.min_profit_floor = floor;
        }
        if let Some(guard) = spec.suboptimal_guard {
            config.suboptimal_guard = guard;
        }
        config.validate()?;
        Ok(config)
    }
}

impl TryFrom<&PathSpec> for PathRequest {
    type Error = Report;

    fn try_from(spec: &PathSpec) -> Result<Self, Self::Error> {
        let hops = spec
            .hops
            .iter()
            .map(|hop| {
                Ok(Hop::new(
                    parse_address(&hop.pool)?,
                    hop.fee_bps.unwrap_or(UNISWAP_V2_FEE_BPS),
                ))
            })
            .collect::<Result<Vec<_>, Report>>()?;
        Ok(Self::new(
            hops,
            parse_amount(&spec.amount_in)?,
            parse_optional(spec.min_amount_out.as_ref())?.unwrap_or_default(),
        ))
    }
}
