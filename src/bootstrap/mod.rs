//! Scenario loading.
//!
//! A scenario is a JSON file describing an in-memory host (pairs, balances,
//! fee-on-transfer tokens, starting block), the engine settings and the
//! paths to run. Amounts are strings so they can exceed 64 bits.

/// Serde layout of scenario files
pub mod types;

use std::fs;
use std::path::Path;

use alloy::primitives::Address;
use eyre::{bail, Report, WrapErr};
use log::info;

use crate::arb::types::PathRequest;
use crate::chain::{BlockContext, Clock, MemoryChain};
use crate::config::EngineConfig;
use crate::utils::constants::{MAX_FEE_BPS, UNISWAP_V2_FEE_BPS};
use types::{parse_address, parse_amount, ScenarioFile};

/// Seconds a scenario without an explicit deadline stays valid
const DEFAULT_DEADLINE_WINDOW: u64 = 60;

/// A host ready to run paths against
#[derive(Debug)]
pub struct Scenario {
    /// In-memory host
    pub chain: MemoryChain,
    /// Engine settings
    pub config: EngineConfig,
    /// Paths with their recipient
    pub paths: Vec<(PathRequest, Address)>,
    /// Deadline of the invocation
    pub deadline: u64,
}

/// Reads and builds a scenario file
///
/// # Errors
/// * If the file cannot be read or parsed
/// * If an address or amount is malformed
pub fn load_scenario(path: &Path) -> Result<Scenario, Report> {
    let raw = fs::read_to_string(path)
        .wrap_err_with(|| format!("reading scenario {}", path.display()))?;
    let scenario = parse_scenario(&raw)?;
    info!(
        "Loaded scenario {} with {} path(s)",
        path.display(),
        scenario.paths.len()
    );
    Ok(scenario)
}

/// Builds a scenario from its JSON text
///
/// # Errors
/// * If the JSON does not match the scenario layout
/// * If an address or amount is malformed
pub fn parse_scenario(raw: &str) -> Result<Scenario, Report> {
    let file: ScenarioFile = serde_json::from_str(raw).wrap_err("parsing scenario")?;
    build_scenario(file)
}

/// Builds the host and the engine settings described by `file`
///
/// # Errors
/// * If an address or amount is malformed
pub fn build_scenario(file: ScenarioFile) -> Result<Scenario, Report> {
    let mut chain = MemoryChain::new();
    if let Some(block) = file.block {
        chain.set_block(BlockContext {
            number: block.number,
            timestamp: block.timestamp,
        });
    }

    for pool in &file.pools {
        chain.add_pair_with_fee(
            parse_address(&pool.address)?,
            parse_address(&pool.token0)?,
            parse_address(&pool.token1)?,
            parse_amount(&pool.reserve0)?,
            parse_amount(&pool.reserve1)?,
            pool.fee_bps.unwrap_or(UNISWAP_V2_FEE_BPS),
        );
    }
    for balance in &file.balances {
        chain.mint(
            parse_address(&balance.token)?,
            parse_address(&balance.holder)?,
            parse_amount(&balance.amount)?,
        );
    }
    for fee in &file.transfer_fees {
        if fee.fee_bps > MAX_FEE_BPS {
            bail!("transfer fee of {} is {} bps, above 100%", fee.token, fee.fee_bps);
        }
        chain.set_transfer_fee(parse_address(&fee.token)?, fee.fee_bps);
    }

    let config: EngineConfig = file.engine.try_into()?;
    let paths = file
        .paths
        .iter()
        .map(|spec| {
            let recipient = spec
                .recipient
                .as_deref()
                .map_or(Ok(config.address), parse_address)?;
            Ok((PathRequest::try_from(spec)?, recipient))
        })
        .collect::<Result<Vec<_>, Report>>()?;

    let deadline = file
        .deadline
        .unwrap_or_else(|| chain.block().timestamp + DEFAULT_DEADLINE_WINDOW);

    Ok(Scenario {
        chain,
        config,
        paths,
        deadline,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::arb::optimizer::AllocationPolicy;
    use crate::chain::{Ledger, Pools};
    use crate::config::ProfitCheck;
    use alloy::primitives::{address, U256};

    const SCENARIO: &str = r#"{
        "engine": {
            "base_token": "0x00000000000000000000000000000000000000a1",
            "address": "0x00000000000000000000000000000000000000e0",
            "owner": "0x00000000000000000000000000000000000000f0",
            "risk": { "min_pool_liquidity": "5000", "sandwich_protection_bips": 20 },
            "mev": { "enabled": false, "max_tx_per_block": 1, "min_delay": 0 },
            "allocation": "full",
            "profit_check": "before-cost",
            "hop_cost_estimate": "0x10"
        },
        "block": { "number": 100, "timestamp": 1000 },
        "pools": [
            { "address": "0x0000000000000000000000000000000000000001",
              "token0": "0x00000000000000000000000000000000000000a1",
              "token1": "0x00000000000000000000000000000000000000b2",
              "reserve0": "1000000000000000000000", "reserve1": "2000000" },
            { "address": "0x0000000000000000000000000000000000000002",
              "token0": "0x00000000000000000000000000000000000000b2",
              "token1": "0x00000000000000000000000000000000000000a1",
              "reserve0": "2000000", "reserve1": "1000000", "fee_bps": 25 }
        ],
        "balances": [
            { "token": "0x00000000000000000000000000000000000000a1",
              "holder": "0x00000000000000000000000000000000000000e0",
              "amount": "5000" }
        ],
        "transfer_fees": [
            { "token": "0x00000000000000000000000000000000000000b2", "fee_bps": 10 }
        ],
        "paths": [
            { "hops": [
                { "pool": "0x0000000000000000000000000000000000000001" },
                { "pool": "0x0000000000000000000000000000000000000002", "fee_bps": 25 }
              ],
              "amount_in": "1000" },
            { "hops": [
                { "pool": "0x0000000000000000000000000000000000000001" },
                { "pool": "0x0000000000000000000000000000000000000002" }
              ],
              "amount_in": "1000", "min_amount_out": "1001",
              "recipient": "0x00000000000000000000000000000000000000c3" }
        ]
    }"#;

    #[test]
    fn test_parse_scenario() {
        let scenario = parse_scenario(SCENARIO).unwrap();
        let base = address!("00000000000000000000000000000000000000a1");
        let engine = address!("00000000000000000000000000000000000000e0");
        let pool = address!("0000000000000000000000000000000000000001");

        assert_eq!(scenario.config.base_token, base);
        assert_eq!(scenario.config.risk.min_pool_liquidity, U256::from(5_000));
        assert_eq!(scenario.config.risk.sandwich_protection_bips, 20);
        assert!(!scenario.config.mev.enabled);
        assert_eq!(scenario.config.allocation, AllocationPolicy::Full);
        assert_eq!(scenario.config.profit_check, ProfitCheck::BeforeCost);
        assert_eq!(scenario.config.hop_cost_estimate, U256::from(16));
        assert_eq!(scenario.deadline, 1_060);

        let reserves = scenario.chain.get_reserves(pool).unwrap();
        assert_eq!(reserves.reserve0, U256::from(10).pow(U256::from(21)));
        assert_eq!(scenario.chain.balance_of(base, engine), U256::from(5_000));

        assert_eq!(scenario.paths.len(), 2);
        let (first, recipient) = &scenario.paths[0];
        assert_eq!(*recipient, engine);
        assert_eq!(first.hops[0].fee_bps, 30);
        assert_eq!(first.hops[1].fee_bps, 25);
        assert_eq!(first.min_amount_out, U256::ZERO);
        let (second, recipient) = &scenario.paths[1];
        assert_eq!(*recipient, address!("00000000000000000000000000000000000000c3"));
        assert_eq!(second.min_amount_out, U256::from(1_001));
    }

    #[test]
    fn test_demo_triangle() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("demos/triangle.json");
        let mut scenario = load_scenario(&path).unwrap();
        let mut engine = crate::engine::ArbEngine::new(scenario.config.clone()).unwrap();
        let owner = engine.owner();
        let outputs = engine
            .execute_batch(&mut scenario.chain, owner, &scenario.paths, scenario.deadline)
            .unwrap();
        assert_eq!(outputs.len(), 2);
        assert_eq!(outputs[0], U256::from(1_143_653));
        assert!(outputs[1] > U256::from(500_000));
    }

    #[test]
    fn test_malformed_scenarios() {
        for (from, to) in [
            (r#""amount_in": "1000" }"#, r#""amount_in": "ten" }"#),
            (
                "0x00000000000000000000000000000000000000f0",
                "0xnot-an-address",
            ),
            (r#""allocation": "full""#, r#""allocation": "greedy""#),
            (r#""fee_bps": 10 }"#, r#""fee_bps": 20000 }"#),
            (
                r#""allocation": "full""#,
                r#""allocation": "full", "max_path_length": 9"#,
            ),
        ] {
            let raw = SCENARIO.replacen(from, to, 1);
            assert_ne!(raw, SCENARIO);
            assert!(parse_scenario(&raw).is_err(), "{to}");
        }
    }
}
