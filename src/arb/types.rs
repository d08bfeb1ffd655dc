use alloy::primitives::{Address, U256};
use derive_more::Display;

use crate::chain::Factory;

/// Type alias for a pool address.
pub type PoolAddress = Address;

/// Type alias for a token address.
pub type TokenAddress = Address;

/// One hop of a path: the pool to swap through and the fee to quote with
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
#[display("{pool}@{fee_bps}bps")]
pub struct Hop {
    /// Pool to swap through
    pub pool: PoolAddress,
    /// Fee charged by the pool, in basis points
    pub fee_bps: u16,
}

impl Hop {
    /// Creates a hop
    #[must_use]
    pub const fn new(pool: PoolAddress, fee_bps: u16) -> Self {
        Self { pool, fee_bps }
    }

    /// Fee in parts per million
    #[must_use]
    pub fn fee_ppm(&self) -> U256 {
        U256::from(self.fee_bps) * U256::from(100)
    }
}

/// A request to run one circular path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathRequest {
    /// Ordered hops, the first one is entered with the base asset
    pub hops: Vec<Hop>,
    /// Base asset committed at path entry
    pub amount_in: U256,
    /// Minimum base asset the path must return
    pub min_amount_out: U256,
}

impl PathRequest {
    /// Creates a request
    #[must_use]
    pub const fn new(hops: Vec<Hop>, amount_in: U256, min_amount_out: U256) -> Self {
        Self {
            hops,
            amount_in,
            min_amount_out,
        }
    }

    /// Resolves the pools of a token route through a factory.
    ///
    /// `route` lists the tokens visited after `base`; a circular route ends
    /// with `base` again. Returns `None` if any leg has no pool.
    #[must_use]
    pub fn from_route<F: Factory + ?Sized>(
        factory: &F,
        base: TokenAddress,
        route: &[TokenAddress],
        fee_bps: u16,
        amount_in: U256,
        min_amount_out: U256,
    ) -> Option<Self> {
        let mut token_in = base;
        let mut hops = Vec::with_capacity(route.len());
        for &token_out in route {
            hops.push(Hop::new(factory.get_pair(token_in, token_out)?, fee_bps));
            token_in = token_out;
        }
        Some(Self::new(hops, amount_in, min_amount_out))
    }

    /// Number of hops
    #[must_use]
    pub fn len(&self) -> usize {
        self.hops.len()
    }

    /// Whether the request has no hops
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hops.is_empty()
    }
}

/// The cursor threaded through one path execution.
///
/// Created once per invocation, mutated by every hop, dropped when the
/// invocation resolves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapState {
    /// Token currently held
    pub transit_token: TokenAddress,
    /// Amount of `transit_token` available for the next hop
    pub current_amount: U256,
    /// Number of hops in the path
    pub path_length: usize,
    /// Fee-adjusted, `PRECISION`-scaled input of the last hop
    pub amount_in_with_fee: U256,
    /// Quoted output of the last hop
    pub amount_out: U256,
    /// Slippage of the last hop
    pub slippage: U256,
    /// Running total of hop slippage
    pub cumulative_impact: U256,
    /// Measured amount entering the path followed by every hop's measured output
    pub amounts: Vec<U256>,
}

impl SwapState {
    /// Starts a path holding `amount` of `base`
    #[must_use]
    pub fn new(base: TokenAddress, amount: U256, path_length: usize) -> Self {
        let mut amounts = Vec::with_capacity(path_length + 1);
        amounts.push(amount);
        Self {
            transit_token: base,
            current_amount: amount,
            path_length,
            amount_in_with_fee: U256::ZERO,
            amount_out: U256::ZERO,
            slippage: U256::ZERO,
            cumulative_impact: U256::ZERO,
            amounts,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::arb::test_helpers::*;
    use crate::chain::MemoryChain;

    #[test]
    fn test_hop_display_and_fee() {
        let hop = Hop::new(addr("P1"), 30);
        assert_eq!(hop.fee_ppm(), U256::from(3_000));
        assert!(hop.to_string().ends_with("@30bps"));
    }

    #[test]
    fn test_from_route() {
        let mut chain = MemoryChain::new();
        chain.add_pair(addr("P1"), addr("A"), addr("B"), U256::from(10), U256::from(10));
        chain.add_pair(addr("P2"), addr("A"), addr("B"), U256::from(10), U256::from(10));
        chain.add_pair(addr("P3"), addr("C"), addr("B"), U256::from(10), U256::from(10));
        chain.add_pair(addr("P4"), addr("C"), addr("A"), U256::from(10), U256::from(10));

        let request = PathRequest::from_route(
            &chain,
            addr("A"),
            &[addr("B"), addr("C"), addr("A")],
            30,
            U256::from(1),
            U256::ZERO,
        )
        .unwrap();
        let pools: Vec<_> = request.hops.iter().map(|h| h.pool).collect();
        // first registered pair wins
        assert_eq!(pools, vec![addr("P1"), addr("P3"), addr("P4")]);

        assert!(PathRequest::from_route(&chain, addr("A"), &[addr("D")], 30, U256::from(1), U256::ZERO).is_none());
    }
}
