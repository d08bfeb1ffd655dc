use std::collections::HashMap;

use alloy::primitives::Address;
use log::debug;

use crate::chain::BlockContext;
use crate::error::ArbError;

/// MEV protection settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MevProtection {
    /// Whether callers are rate limited at all
    pub enabled: bool,
    /// Committed invocations one caller may land in a single block
    pub max_tx_per_block: u32,
    /// Seconds a caller must wait between committed invocations
    pub min_delay: u64,
}

impl Default for MevProtection {
    fn default() -> Self {
        Self {
            enabled: true,
            max_tx_per_block: 3,
            min_delay: 12,
        }
    }
}

impl MevProtection {
    /// # Errors
    /// * `InvalidRiskParameters` if enabled with a zero per-block allowance
    pub const fn validate(&self) -> Result<(), ArbError> {
        if self.enabled && self.max_tx_per_block == 0 {
            return Err(ArbError::InvalidRiskParameters(
                "max tx per block must be non-zero",
            ));
        }
        Ok(())
    }
}

/// What the limiter remembers about one caller
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RateLimitState {
    /// Block of the caller's last committed invocation
    pub last_block: u64,
    /// Committed invocations in `last_block`
    pub transactions_this_block: u32,
    /// Timestamp of the caller's last committed invocation
    pub last_timestamp: u64,
}

/// Per-caller rate limiter.
///
/// Only committed invocations are recorded: an invocation that is rejected
/// or unwound never counts against its caller.
#[derive(Debug, Clone, Default)]
pub struct RateLimiter {
    /// Active settings
    protection: MevProtection,
    /// Accounting by caller
    callers: HashMap<Address, RateLimitState>,
}

impl RateLimiter {
    /// Creates a limiter with no history
    #[must_use]
    pub fn new(protection: MevProtection) -> Self {
        Self {
            protection,
            callers: HashMap::new(),
        }
    }

    /// Active settings
    #[must_use]
    pub const fn protection(&self) -> MevProtection {
        self.protection
    }

    /// Replace the settings, keeping the callers' history
    pub fn configure(&mut self, protection: MevProtection) {
        self.protection = protection;
    }

    /// What is remembered about `caller`
    #[must_use]
    pub fn state(&self, caller: Address) -> Option<&RateLimitState> {
        self.callers.get(&caller)
    }

    /// Whether `caller` may transact in `block`.
    ///
    /// # Errors
    /// * `FlashLoanDetected` once the per-block allowance is used up
    /// * `RateLimitExceeded` before the minimum delay has elapsed
    pub fn check(&self, caller: Address, block: BlockContext) -> Result<(), ArbError> {
        if !self.protection.enabled {
            return Ok(());
        }
        let Some(state) = self.callers.get(&caller) else {
            return Ok(());
        };
        if state.last_block == block.number
            && state.transactions_this_block >= self.protection.max_tx_per_block
        {
            return Err(ArbError::FlashLoanDetected {
                caller,
                block: block.number,
            });
        }
        let next_allowed = state.last_timestamp.saturating_add(self.protection.min_delay);
        if block.timestamp < next_allowed {
            return Err(ArbError::RateLimitExceeded {
                caller,
                next_allowed,
            });
        }
        Ok(())
    }

    /// Count a committed invocation of `caller` in `block`
    pub fn record(&mut self, caller: Address, block: BlockContext) {
        let state = self.callers.entry(caller).or_default();
        if state.last_block == block.number {
            state.transactions_this_block = state.transactions_this_block.saturating_add(1);
        } else {
            state.last_block = block.number;
            state.transactions_this_block = 1;
        }
        state.last_timestamp = block.timestamp;
        debug!(
            "guard: {caller} has {} tx in block {}",
            state.transactions_this_block, block.number
        );
    }
}
