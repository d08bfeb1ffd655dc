use std::fmt::{self, Display};

use alloy::primitives::{I256, U256};
use itertools::Itertools;

use super::types::{PoolAddress, TokenAddress};
use crate::utils::constants::BIPS;

/// What one hop saw and did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HopTrace {
    /// Position in the path
    pub index: usize,
    /// Pool swapped through
    pub pool: PoolAddress,
    /// Token sold
    pub token_in: TokenAddress,
    /// Token bought
    pub token_out: TokenAddress,
    /// Reserve of `token_in` before the swap
    pub reserve_in: U256,
    /// Reserve of `token_out` before the swap
    pub reserve_out: U256,
    /// Hop fee in PPM
    pub fee_ppm: U256,
    /// Amount sent towards the pool by the previous step
    pub amount_sent: U256,
    /// Amount the pool actually received
    pub amount_in: U256,
    /// Part of `amount_in` the quote was computed on
    pub committed: U256,
    /// Fee-adjusted, `PRECISION`-scaled `committed`
    pub amount_in_with_fee: U256,
    /// Cube-root impact score
    pub price_impact: U256,
    /// Output asked from the pool
    pub quoted_out: U256,
    /// Output the beneficiary actually received
    pub measured_out: U256,
    /// Slippage charged to this hop
    pub slippage: U256,
}

impl Display for HopTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} {} -> {} {}",
            self.index, self.amount_in, self.token_in, self.measured_out, self.token_out
        )
    }
}

/// Outcome of running a path, hop by hop.
///
/// A trace stopped early by `EvaluateOptions::stop_after` is not `completed`
/// and its `amount_out` is denominated in the last hop's output token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTrace {
    /// Hops executed, in order
    pub hops: Vec<HopTrace>,
    /// Base asset committed at entry
    pub amount_in: U256,
    /// Amount held after the last executed hop
    pub amount_out: U256,
    /// Sum of hop slippage
    pub cumulative_impact: U256,
    /// Whether every hop ran and the final checks passed
    pub completed: bool,
}

impl Display for PathTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {} ({})",
            self.amount_in,
            self.amount_out,
            self.hops.iter().join(", ")
        )
    }
}

impl PathTrace {
    /// Profit of the path, negative on a loss
    #[must_use]
    pub fn profit(&self) -> I256 {
        I256::from_raw(self.amount_out).saturating_sub(I256::from_raw(self.amount_in))
    }

    /// Profit margin in basis points (10,000 = 100%)
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn profit_margin(&self) -> i32 {
        if self.amount_in.is_zero() {
            return 0;
        }
        let profit = self.profit();
        let margin = profit.unsigned_abs().saturating_mul(BIPS) / self.amount_in;
        let result = if margin > U256::from(i32::MAX) {
            i32::MAX
        } else {
            // fits, checked above
            margin.as_limbs()[0] as i32
        };
        if profit.is_negative() {
            -result
        } else {
            result
        }
    }

    /// Whether the path returns more than it takes
    #[must_use]
    pub fn is_profitable(&self) -> bool {
        self.profit().is_positive()
    }
}

/// Expected behaviour of a path, computed from reserves alone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathMetrics {
    /// Output quoted hop by hop
    pub expected_out: U256,
    /// Sum of the hops' relative price impact, in PPM
    pub price_impact_ppm: U256,
    /// `expected_out × PRECISION / amount_in`
    pub optimality_score: U256,
}
