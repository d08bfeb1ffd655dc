//! # Price Impact Model
//!
//! Scores a hypothetical trade by how much it grows the pool invariant:
//! `cbrt(k'·PRECISION² / (k·PRECISION))` with `k = reserveIn·reserveOut` and
//! `k' = (reserveIn + amountIn)·reserveOut`. A zero-size trade scores
//! `cbrt(PRECISION)`, the baseline, and larger trades score monotonically
//! higher.

use alloy::primitives::U256;

use crate::error::ArbError;
use crate::math::cbrt;
use crate::utils::constants::{PRECISION, PRECISION_SQUARED};

/// Impact score of a zero-size trade, `cbrt(PRECISION)`
pub const BASELINE_IMPACT: U256 = U256::from_limbs([100, 0, 0, 0]);

/// Cube-root impact score of trading `amount_in` against the reserves.
///
/// # Errors
/// * `NumericalInstability` if either reserve is zero or the invariant overflows
pub fn price_impact(amount_in: U256, reserve_in: U256, reserve_out: U256) -> Result<U256, ArbError> {
    if reserve_in.is_zero() || reserve_out.is_zero() {
        return Err(ArbError::NumericalInstability("empty reserves in impact model"));
    }
    let grown_in = reserve_in
        .checked_add(amount_in)
        .ok_or(ArbError::NumericalInstability("reserve overflow in impact model"))?;

    let k = reserve_in.checked_mul(reserve_out);
    let k_grown = grown_in.checked_mul(reserve_out);
    let ratio = match (
        k_grown.and_then(|k| k.checked_mul(PRECISION_SQUARED)),
        k.and_then(|k| k.checked_mul(PRECISION)),
    ) {
        (Some(numerator), Some(denominator)) => numerator / denominator,
        // reserveOut cancels out of k'/k, scale both sides down to fit
        _ => {
            let shift = grown_in.bit_len().saturating_sub(200);
            let denominator = reserve_in >> shift;
            if denominator.is_zero() {
                U256::MAX
            } else {
                (grown_in >> shift) * PRECISION / denominator
            }
        }
    };
    Ok(cbrt(ratio))
}

/// Impact above the zero-trade baseline
#[must_use]
pub fn incremental_impact(impact: U256) -> U256 {
    impact.saturating_sub(BASELINE_IMPACT)
}

/// Incremental impact relative to the baseline, in PPM
#[must_use]
pub fn relative_impact_ppm(impact: U256) -> U256 {
    incremental_impact(impact) * PRECISION / BASELINE_IMPACT
}
