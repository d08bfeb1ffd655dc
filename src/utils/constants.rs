use alloy::primitives::U256;

/// Fixed-point scale shared by every ratio, weight and impact score (1e6)
pub const PRECISION: U256 = U256::from_limbs([1_000_000, 0, 0, 0]);

/// `PRECISION²`, used by the impact model
pub const PRECISION_SQUARED: U256 = U256::from_limbs([1_000_000_000_000, 0, 0, 0]);

/// Golden ratio conjugate φ ≈ 0.618034, scaled by `PRECISION`
pub const PHI: U256 = U256::from_limbs([618_034, 0, 0, 0]);

/// φ² ≈ 0.381966, scaled by `PRECISION`
pub const PHI_SQUARED: U256 = U256::from_limbs([381_966, 0, 0, 0]);

/// ln(2), scaled by `PRECISION`
pub const LN2: U256 = U256::from_limbs([693_147, 0, 0, 0]);

/// Basis points denominator (10_000 = 100%)
pub const BIPS: U256 = U256::from_limbs([10_000, 0, 0, 0]);

/// Highest fee a hop may declare, in basis points (100%)
pub const MAX_FEE_BPS: u16 = 10_000;

/// Upper bound of `RiskParameters::max_price_impact`, in PPM (20%)
pub const MAX_PRICE_IMPACT_LIMIT: u32 = 200_000;

/// Upper bound of `RiskParameters::sandwich_protection_bips` (1%)
pub const MAX_SANDWICH_PROTECTION_BIPS: u16 = 100;

/// Shortest supported path
pub const MIN_PATH_LENGTH: usize = 2;

/// Longest path any engine may be configured for
pub const MAX_PATH_LENGTH: usize = 5;

/// Default longest supported path
pub const DEFAULT_MAX_PATH_LENGTH: usize = 5;

/// Fee charged by a canonical Uniswap V2 pair, in basis points
pub const UNISWAP_V2_FEE_BPS: u16 = 30;
