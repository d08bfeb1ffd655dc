//! # Math Kernel
//!
//! Integer approximations used by the impact model, the optimizer and the
//! path guards. Inputs and outputs are plain `U256` integers unless noted;
//! `log2` and the `exp2` exponent are fixed-point values scaled by
//! [`PRECISION`]. Nothing here touches floating point.

use alloy::primitives::U256;

use crate::utils::constants::{LN2, PRECISION, PRECISION_SQUARED};

/// Iteration cap of the cube root Newton loop
const CBRT_MAX_ITERATIONS: usize = 7;

/// Integer square root (floor) via Babylonian iteration.
///
/// Starts from `ceil(x / 2)` and stops as soon as the next iterate would not
/// decrease.
#[must_use]
pub fn sqrt(x: U256) -> U256 {
    if x.is_zero() {
        return U256::ZERO;
    }
    // ceil(x / 2) without the x + 1 overflow
    let mut z = (x >> 1) + (x & U256::from(1));
    let mut y = x;
    while z < y {
        y = z;
        z = (x / z + z) >> 1;
    }
    y
}

/// Integer cube root (floor) via Newton's method.
///
/// The first guess is the power of two just above the root, so the sequence
/// decreases monotonically. The loop runs at most seven times and exits early
/// once an iterate stops improving.
#[must_use]
pub fn cbrt(x: U256) -> U256 {
    if x.is_zero() {
        return U256::ZERO;
    }
    let three = U256::from(3);
    let mut z = U256::from(1) << x.bit_len().div_ceil(3);
    for _ in 0..CBRT_MAX_ITERATIONS {
        let next = (z * U256::from(2) + x / (z * z)) / three;
        if next >= z {
            break;
        }
        z = next;
    }
    // Settle whatever the iteration cap left above the floor
    while cube_exceeds(z, x) {
        z -= U256::from(1);
    }
    z
}

/// `z³ > x`, treating an overflowing cube as larger than any `x`
fn cube_exceeds(z: U256, x: U256) -> bool {
    z.checked_mul(z)
        .and_then(|sq| sq.checked_mul(z))
        .map_or(true, |cube| cube > x)
}

/// Geometric mean `floor(sqrt(a·b))`.
///
/// When `a·b` does not fit in 256 bits the mean is approximated in log space
/// as `exp2((log2(a) + log2(b)) / 2)`.
#[must_use]
pub fn geometric_mean(a: U256, b: U256) -> U256 {
    match a.checked_mul(b) {
        Some(product) => sqrt(product),
        None => exp2((log2(a) + log2(b)) >> 1),
    }
}

/// Position of the highest set bit, scaled by `PRECISION`. Zero for zero.
#[must_use]
pub fn log2(x: U256) -> U256 {
    if x.is_zero() {
        return U256::ZERO;
    }
    U256::from(x.bit_len() - 1) * PRECISION
}

/// `2^(x / PRECISION)` as a plain integer.
///
/// The integer part of the exponent is a left shift; the fractional part is
/// corrected with the first four Taylor terms of `e^(f·ln2)`. Saturates at
/// `U256::MAX`.
#[must_use]
pub fn exp2(x: U256) -> U256 {
    let whole = x / PRECISION;
    if whole >= U256::from(256) {
        return U256::MAX;
    }
    let fraction = x % PRECISION;
    let base = U256::from(1) << whole.to::<usize>();
    if fraction.is_zero() {
        return base;
    }

    // y = f·ln2, every term scaled by PRECISION
    let y = fraction * LN2 / PRECISION;
    let y2 = y * y;
    let factor = PRECISION + y + y2 / (U256::from(2) * PRECISION)
        + y2 * y / (U256::from(6) * PRECISION_SQUARED);

    match base.checked_mul(factor) {
        Some(scaled) => scaled / PRECISION,
        // split base so its low bits still contribute
        None => (base / PRECISION)
            .saturating_mul(factor)
            .saturating_add((base % PRECISION) * factor / PRECISION),
    }
}
