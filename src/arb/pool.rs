/// Pool oracle: resolves a pool's reserves and swap direction relative to the
/// token being sold, and derives the per-hop `PoolState` snapshot.
use std::fmt::{self, Debug, Display};

use alloy::primitives::U256;

use super::impact::price_impact;
use super::types::{PoolAddress, TokenAddress};
use crate::chain::Pools;
use crate::error::ArbError;
use crate::math::geometric_mean;
use crate::utils::constants::PRECISION;

/// The direction of a swap in a liquidity pool.
///
/// In a standard liquidity pool with two tokens (token0 and token1),
/// a swap can go in either direction: from token0 to token1 or from token1 to token0.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum Direction {
    /// Swap from token0 to token1 in the pool
    ZeroForOne,
    /// Swap from token1 to token0 in the pool
    OneForZero,
}

impl Direction {
    /// Whether the swap sells the pool's token0
    #[must_use]
    pub const fn selling_token0(self) -> bool {
        matches!(self, Self::ZeroForOne)
    }

    /// `(amount0Out, amount1Out)` arguments of the pool's `swap` for an output amount
    #[must_use]
    pub const fn amounts_out(self, amount_out: U256) -> (U256, U256) {
        match self {
            Self::ZeroForOne => (U256::ZERO, amount_out),
            Self::OneForZero => (amount_out, U256::ZERO),
        }
    }
}

impl Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

impl Debug for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroForOne => write!(f, "0>1"),
            Self::OneForZero => write!(f, "1>0"),
        }
    }
}

/// Reserves of a pool oriented from the input token's side
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrientedReserves {
    /// Reserve of the token being sold
    pub reserve_in: U256,
    /// Reserve of the token being bought
    pub reserve_out: U256,
    /// Token being bought
    pub token_out: TokenAddress,
    /// Which way the pool is traversed
    pub direction: Direction,
}

/// Query a pool from `token_in`'s perspective.
///
/// # Errors
/// * `PairNotInPath` if `token_in` is neither of the pool's tokens
/// * `Chain` if the pool is unknown to the host
pub fn query<C: Pools + ?Sized>(
    chain: &C,
    pool: PoolAddress,
    token_in: TokenAddress,
) -> Result<OrientedReserves, ArbError> {
    let token0 = chain.token0(pool)?;
    let token1 = chain.token1(pool)?;
    let reserves = chain.get_reserves(pool)?;

    if token_in == token0 {
        Ok(OrientedReserves {
            reserve_in: reserves.reserve0,
            reserve_out: reserves.reserve1,
            token_out: token1,
            direction: Direction::ZeroForOne,
        })
    } else if token_in == token1 {
        Ok(OrientedReserves {
            reserve_in: reserves.reserve1,
            reserve_out: reserves.reserve0,
            token_out: token0,
            direction: Direction::OneForZero,
        })
    } else {
        Err(ArbError::PairNotInPath {
            pool,
            token: token_in,
        })
    }
}

/// Snapshot of one pool as seen by one hop. Recomputed every hop, never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolState {
    /// Pool queried
    pub pool: PoolAddress,
    /// Reserve of the token being sold
    pub reserve_in: U256,
    /// Reserve of the token being bought
    pub reserve_out: U256,
    /// Whether the hop sells the pool's token0
    pub selling_token0: bool,
    /// Token being bought
    pub token_out: TokenAddress,
    /// `sqrt(reserveIn·reserveOut)`
    pub depth: U256,
    /// Cube-root impact score of the hop's amount
    pub price_impact: U256,
    /// Hop amount relative to depth, `PRECISION`-scaled
    pub volatility: U256,
}

impl PoolState {
    /// Query the pool and score a trade of `amount_in`.
    ///
    /// # Errors
    /// * `PairNotInPath` if `token_in` does not trade in the pool
    /// * `NumericalInstability` if the pool is empty
    pub fn analyze<C: Pools + ?Sized>(
        chain: &C,
        pool: PoolAddress,
        token_in: TokenAddress,
        amount_in: U256,
    ) -> Result<Self, ArbError> {
        Self::score(pool, query(chain, pool, token_in)?, amount_in)
    }

    /// Score a trade of `amount_in` against reserves already read.
    ///
    /// # Errors
    /// * `NumericalInstability` if the pool is empty
    pub fn score(
        pool: PoolAddress,
        oriented: OrientedReserves,
        amount_in: U256,
    ) -> Result<Self, ArbError> {
        let depth = geometric_mean(oriented.reserve_in, oriented.reserve_out);
        let impact = price_impact(amount_in, oriented.reserve_in, oriented.reserve_out)?;
        let volatility = if depth.is_zero() {
            U256::MAX
        } else {
            amount_in.saturating_mul(PRECISION) / depth
        };

        Ok(Self {
            pool,
            reserve_in: oriented.reserve_in,
            reserve_out: oriented.reserve_out,
            selling_token0: oriented.direction.selling_token0(),
            token_out: oriented.token_out,
            depth,
            price_impact: impact,
            volatility,
        })
    }

    /// Direction the hop traverses the pool
    #[must_use]
    pub const fn direction(&self) -> Direction {
        if self.selling_token0 {
            Direction::ZeroForOne
        } else {
            Direction::OneForZero
        }
    }
}
