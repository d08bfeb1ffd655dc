//! # Guard Layer
//!
//! Engine-wide switches consulted around and during every invocation: the
//! pause flag, the pool blacklist, the bounded risk parameters and the
//! per-caller rate limiter.

use std::collections::HashSet;

use alloy::primitives::{Address, U256};
use log::info;

use crate::error::ArbError;
use crate::utils::constants::{MAX_PRICE_IMPACT_LIMIT, MAX_SANDWICH_PROTECTION_BIPS};

/// Per-caller rate limiting
pub mod rate_limit;

pub use rate_limit::{MevProtection, RateLimitState, RateLimiter};

/// Limits read by every hop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RiskParameters {
    /// Largest amount a single hop may commit
    pub max_trade_volume: U256,
    /// Smallest reserve a pool may hold on either side
    pub min_pool_liquidity: U256,
    /// Largest relative price impact of a hop, in PPM
    pub max_price_impact: u32,
    /// Largest spot-to-execution price deviation of a hop, in basis points.
    /// Zero turns the sandwich guard off.
    pub sandwich_protection_bips: u16,
}

impl Default for RiskParameters {
    fn default() -> Self {
        Self {
            max_trade_volume: U256::MAX,
            min_pool_liquidity: U256::from(1_000),
            max_price_impact: 100_000,
            sandwich_protection_bips: 50,
        }
    }
}

impl RiskParameters {
    /// # Errors
    /// * `InvalidRiskParameters` if a value is outside its bounds
    pub fn validate(&self) -> Result<(), ArbError> {
        if self.max_price_impact > MAX_PRICE_IMPACT_LIMIT {
            return Err(ArbError::InvalidRiskParameters("max price impact above 20%"));
        }
        if self.sandwich_protection_bips > MAX_SANDWICH_PROTECTION_BIPS {
            return Err(ArbError::InvalidRiskParameters(
                "sandwich protection above 100 bips",
            ));
        }
        if self.max_trade_volume.is_zero() {
            return Err(ArbError::InvalidRiskParameters("max trade volume is zero"));
        }
        Ok(())
    }
}

/// Mutable guard state owned by one engine
#[derive(Debug, Clone, Default)]
pub struct Guard {
    /// Global pause switch
    paused: bool,
    /// Pools excluded from every path
    blacklist: HashSet<Address>,
    /// Limits read by every hop
    risk: RiskParameters,
    /// Per-caller transaction accounting
    rate_limiter: RateLimiter,
}

impl Guard {
    /// Creates an unpaused guard with an empty blacklist.
    ///
    /// # Errors
    /// * `InvalidRiskParameters` if either set of limits is out of bounds
    pub fn new(risk: RiskParameters, mev: MevProtection) -> Result<Self, ArbError> {
        risk.validate()?;
        mev.validate()?;
        Ok(Self {
            paused: false,
            blacklist: HashSet::new(),
            risk,
            rate_limiter: RateLimiter::new(mev),
        })
    }

    /// # Errors
    /// * `Paused` while the engine is paused
    pub const fn ensure_active(&self) -> Result<(), ArbError> {
        if self.paused {
            return Err(ArbError::Paused);
        }
        Ok(())
    }

    /// Whether path execution is suspended
    #[must_use]
    pub const fn is_paused(&self) -> bool {
        self.paused
    }

    /// Suspend or resume path execution
    pub fn set_paused(&mut self, paused: bool) {
        info!("guard: paused = {paused}");
        self.paused = paused;
    }

    /// Whether `pool` is excluded from every path
    #[must_use]
    pub fn is_blacklisted(&self, pool: Address) -> bool {
        self.blacklist.contains(&pool)
    }

    /// Exclude `pool` from, or readmit it to, every path
    pub fn set_blacklisted(&mut self, pool: Address, blacklisted: bool) {
        info!("guard: pool {pool} blacklisted = {blacklisted}");
        if blacklisted {
            self.blacklist.insert(pool);
        } else {
            self.blacklist.remove(&pool);
        }
    }

    /// Current risk parameters
    #[must_use]
    pub const fn risk(&self) -> &RiskParameters {
        &self.risk
    }

    /// Replace the risk parameters.
    ///
    /// # Errors
    /// * `InvalidRiskParameters` if a value is outside its bounds
    pub fn set_risk(&mut self, risk: RiskParameters) -> Result<(), ArbError> {
        risk.validate()?;
        info!("guard: risk parameters set to {risk:?}");
        self.risk = risk;
        Ok(())
    }

    /// Per-caller rate limiter
    #[must_use]
    pub const fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }

    /// Per-caller rate limiter, for recording and reconfiguration
    pub fn rate_limiter_mut(&mut self) -> &mut RateLimiter {
        &mut self.rate_limiter
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::arb::test_helpers::addr;

    #[test]
    fn test_risk_bounds() {
        for (risk, valid) in [
            (RiskParameters::default(), true),
            (
                RiskParameters {
                    max_price_impact: MAX_PRICE_IMPACT_LIMIT,
                    sandwich_protection_bips: MAX_SANDWICH_PROTECTION_BIPS,
                    ..RiskParameters::default()
                },
                true,
            ),
            (
                RiskParameters {
                    max_price_impact: MAX_PRICE_IMPACT_LIMIT + 1,
                    ..RiskParameters::default()
                },
                false,
            ),
            (
                RiskParameters {
                    sandwich_protection_bips: MAX_SANDWICH_PROTECTION_BIPS + 1,
                    ..RiskParameters::default()
                },
                false,
            ),
            (
                RiskParameters {
                    max_trade_volume: U256::ZERO,
                    ..RiskParameters::default()
                },
                false,
            ),
        ] {
            assert_eq!(risk.validate().is_ok(), valid, "{risk:?}");
        }
    }

    #[test]
    fn test_set_risk_keeps_previous_on_error() {
        let mut guard = Guard::default();
        let bad = RiskParameters {
            max_price_impact: 300_000,
            ..RiskParameters::default()
        };
        assert!(guard.set_risk(bad).is_err());
        assert_eq!(guard.risk(), &RiskParameters::default());
    }

    #[test]
    fn test_pause_and_blacklist() {
        let mut guard = Guard::default();
        assert!(guard.ensure_active().is_ok());
        guard.set_paused(true);
        assert_eq!(guard.ensure_active(), Err(ArbError::Paused));
        guard.set_paused(false);

        guard.set_blacklisted(addr("P1"), true);
        assert!(guard.is_blacklisted(addr("P1")));
        assert!(!guard.is_blacklisted(addr("P2")));
        guard.set_blacklisted(addr("P1"), false);
        assert!(!guard.is_blacklisted(addr("P1")));
    }
}
