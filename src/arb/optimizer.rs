//! # Amount Optimizer
//!
//! Decides how much of the amount held at a hop is committed to the quote.
//!
//! The golden-ratio policy is a tunable heuristic, not a proven optimum: it
//! front-loads capital on longer paths on the assumption that later hops
//! compound price impact. Paths of up to three hops commit everything. A
//! four-hop path commits `φ` at its first hop, tapering linearly to `φ²` at
//! its last; five hops and more start at `φ²` and taper to `φ⁴`.

use std::str::FromStr;

use alloy::primitives::U256;
use serde::Deserialize;

use super::quote::ConstantProductQuoter;
use crate::error::ArbError;
use crate::utils::constants::{PHI, PHI_SQUARED, PRECISION};

/// How the committed amount is chosen at each hop
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AllocationPolicy {
    /// Golden-ratio taper keyed to path length and hop position
    #[default]
    GoldenRatio,
    /// Commit the whole amount at every hop
    Full,
}

impl FromStr for AllocationPolicy {
    type Err = eyre::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "golden-ratio" => Ok(Self::GoldenRatio),
            "full" => Ok(Self::Full),
            other => Err(eyre::eyre!("unknown allocation policy: {other}")),
        }
    }
}

impl AllocationPolicy {
    /// Fraction of the held amount committed at hop `position`, scaled by `PRECISION`
    #[must_use]
    pub fn weight(self, path_length: usize, position: usize) -> U256 {
        let (start, end) = match (self, path_length) {
            (Self::Full, _) | (Self::GoldenRatio, 0..=3) => return PRECISION,
            (Self::GoldenRatio, 4) => (PHI, PHI_SQUARED),
            (Self::GoldenRatio, _) => (PHI_SQUARED, PHI_SQUARED * PHI_SQUARED / PRECISION),
        };
        let last = U256::from(path_length - 1);
        let position = U256::from(position).min(last);
        start - (start - end) * position / last
    }

    /// Amount of the held `current_amount` committed at hop `position`
    #[must_use]
    pub fn committed_amount(self, current_amount: U256, path_length: usize, position: usize) -> U256 {
        let weight = self.weight(path_length, position);
        current_amount
            .checked_mul(weight)
            .map_or_else(|| current_amount / PRECISION * weight, |v| v / PRECISION)
    }

    /// Fee-adjusted, `PRECISION`-scaled input the hop is quoted with.
    ///
    /// # Errors
    /// * `NumericalInstability` on overflow
    pub fn calculate_optimal_amount(
        self,
        current_amount: U256,
        fee_bps: u16,
        path_length: usize,
        position: usize,
    ) -> Result<U256, ArbError> {
        ConstantProductQuoter::amount_in_with_fee(
            self.committed_amount(current_amount, path_length, position),
            fee_bps,
        )
    }
}
