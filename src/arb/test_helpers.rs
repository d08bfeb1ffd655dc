use alloy::primitives::{keccak256, Address, U256};

use super::types::{Hop, PathRequest};
use crate::chain::MemoryChain;
use crate::config::EngineConfig;
use crate::engine::ArbEngine;
use crate::utils::constants::UNISWAP_V2_FEE_BPS;

/// Deterministic address for a readable label
#[allow(dead_code)]
pub fn addr(label: &str) -> Address {
    Address::from_slice(&keccak256(label.as_bytes())[12..])
}

/// Token the test engines trade from
#[allow(dead_code)]
pub fn base() -> Address {
    addr("A")
}

/// Holding address of the test engines
#[allow(dead_code)]
pub fn engine_address() -> Address {
    addr("engine")
}

/// Owner of the test engines
#[allow(dead_code)]
pub fn owner() -> Address {
    addr("owner")
}

/// A chain with the given pairs and base asset held by the engine
#[allow(dead_code)]
pub fn chain(pairs: &[(&str, &str, &str, u64, u64)], engine_balance: u64) -> MemoryChain {
    let mut chain = MemoryChain::new();
    for (pool, token0, token1, reserve0, reserve1) in pairs {
        chain.add_pair(
            addr(pool),
            addr(token0),
            addr(token1),
            U256::from(*reserve0),
            U256::from(*reserve1),
        );
    }
    chain.mint(base(), engine_address(), U256::from(engine_balance));
    chain
}

/// Three pools, each paying 5% over parity: A -> B -> C -> A
#[allow(dead_code)]
pub fn triangle(engine_balance: u64) -> MemoryChain {
    chain(
        &[
            ("P1", "A", "B", 1_000_000_000, 1_050_000_000),
            ("P2", "B", "C", 1_000_000_000, 1_050_000_000),
            ("P3", "C", "A", 1_000_000_000, 1_050_000_000),
        ],
        engine_balance,
    )
}

/// Hops through the labelled pools at the canonical fee
#[allow(dead_code)]
pub fn hops(pools: &[&str]) -> Vec<Hop> {
    pools
        .iter()
        .map(|pool| Hop::new(addr(pool), UNISWAP_V2_FEE_BPS))
        .collect()
}

/// A request through the labelled pools
#[allow(dead_code)]
pub fn request(pools: &[&str], amount_in: u64, min_amount_out: u64) -> PathRequest {
    PathRequest::new(hops(pools), U256::from(amount_in), U256::from(min_amount_out))
}

/// Engine settings used across tests
#[allow(dead_code)]
pub fn config() -> EngineConfig {
    EngineConfig::new(base(), engine_address(), owner())
}

/// An engine with the test settings
#[allow(dead_code)]
pub fn engine() -> ArbEngine {
    engine_with(config())
}

/// An engine with custom settings
#[allow(dead_code)]
pub fn engine_with(config: EngineConfig) -> ArbEngine {
    #[allow(clippy::unwrap_used)]
    ArbEngine::new(config).unwrap()
}

/// Balance of the labelled token held by the labelled address
#[allow(dead_code)]
pub fn balance(chain: &MemoryChain, token: &str, holder: Address) -> U256 {
    use crate::chain::Ledger;
    chain.balance_of(addr(token), holder)
}
