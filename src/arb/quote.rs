use alloy::primitives::U256;

use crate::error::ArbError;
use crate::utils::constants::PRECISION;

/// Pricing strategy of a hop.
///
/// The engine is agnostic of the AMM curve: it asks its quoter how much a
/// pool pays for `amount_in` given the oriented reserves and the hop fee.
pub trait Quoter: Send + Sync {
    /// Output paid by the pool for `amount_in`
    ///
    /// # Errors
    /// * `NumericalInstability` if the quote overflows or divides by zero
    fn quote(
        &self,
        amount_in: U256,
        reserve_in: U256,
        reserve_out: U256,
        fee_bps: u16,
    ) -> Result<U256, ArbError>;
}

/// `x·y = k` quoting, as Uniswap V2 pairs do
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConstantProductQuoter;

impl ConstantProductQuoter {
    /// `amount_in × (PRECISION − feePPM)`, the fee-adjusted input scaled by `PRECISION`
    ///
    /// # Errors
    /// * `NumericalInstability` on overflow
    pub fn amount_in_with_fee(amount_in: U256, fee_bps: u16) -> Result<U256, ArbError> {
        let fee_ppm = U256::from(fee_bps) * U256::from(100);
        amount_in
            .checked_mul(PRECISION.saturating_sub(fee_ppm))
            .ok_or(ArbError::NumericalInstability("amount in with fee overflow"))
    }

    /// `amountInWithFee·reserveOut / (reserveIn·PRECISION + amountInWithFee)`
    ///
    /// # Errors
    /// * `NumericalInstability` on overflow or a zero denominator
    pub fn amount_out(
        amount_in_with_fee: U256,
        reserve_in: U256,
        reserve_out: U256,
    ) -> Result<U256, ArbError> {
        let numerator = amount_in_with_fee
            .checked_mul(reserve_out)
            .ok_or(ArbError::NumericalInstability("quote numerator overflow"))?;
        let denominator = reserve_in
            .checked_mul(PRECISION)
            .and_then(|r| r.checked_add(amount_in_with_fee))
            .ok_or(ArbError::NumericalInstability("quote denominator overflow"))?;
        if denominator.is_zero() {
            return Err(ArbError::NumericalInstability("zero quote denominator"));
        }
        Ok(numerator / denominator)
    }
}

impl Quoter for ConstantProductQuoter {
    fn quote(
        &self,
        amount_in: U256,
        reserve_in: U256,
        reserve_out: U256,
        fee_bps: u16,
    ) -> Result<U256, ArbError> {
        Self::amount_out(
            Self::amount_in_with_fee(amount_in, fee_bps)?,
            reserve_in,
            reserve_out,
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_closed_form() {
        // floor(10 * 0.997 * 2000 / (1000 + 10 * 0.997)) = floor(19.743...)
        let out = ConstantProductQuoter
            .quote(U256::from(10), U256::from(1_000), U256::from(2_000), 30)
            .unwrap();
        assert_eq!(out, U256::from(19));
    }

    #[test]
    fn test_quotes() {
        for (amount_in, reserve_in, reserve_out, fee_bps, expected) in &[
            // in, reserve in, reserve out, fee, out
            (10u64, 100u64, 200u64, 30u16, 18u64),
            (25, 100, 200, 30, 39),
            (1_000, 1_000_000, 2_000_000, 30, 1_992),
            (1_000, 1_000_000, 2_000_000, 0, 1_998),
            (1_000_000, 1_000_000_000, 1_000_000_000, 25, 996_505),
        ] {
            let out = ConstantProductQuoter
                .quote(
                    U256::from(*amount_in),
                    U256::from(*reserve_in),
                    U256::from(*reserve_out),
                    *fee_bps,
                )
                .unwrap();
            assert_eq!(out, U256::from(*expected), "{amount_in} in {reserve_in}/{reserve_out}");
        }
    }

    #[test]
    fn test_full_fee_quotes_nothing() {
        let out = ConstantProductQuoter
            .quote(U256::from(10), U256::from(100), U256::from(100), 10_000)
            .unwrap();
        assert_eq!(out, U256::ZERO);
    }

    #[test]
    fn test_zero_denominator() {
        assert_eq!(
            ConstantProductQuoter::amount_out(U256::ZERO, U256::ZERO, U256::from(5)),
            Err(ArbError::NumericalInstability("zero quote denominator"))
        );
    }
}
