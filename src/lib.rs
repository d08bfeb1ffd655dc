/*!
 * # Arbloop - Circular Arbitrage Path Engine
 *
 * Arbloop evaluates and executes multi-hop circular swaps of a base asset
 * through constant-product pools. A path commits some base asset, visits
 * two to five pools and must come back to the base asset with more than it
 * started with, net of fees, price impact and transfer taxes.
 *
 * ## Core Features
 *
 * - **Path Execution**: Hop-by-hop swaps that measure what was actually received
 * - **Dry Runs**: Full per-hop traces without leaving any effect on the host
 * - **Risk Management**: Liquidity floors, sandwich and impact limits, slippage budgets
 * - **MEV Protection**: Per-caller rate limiting and flash loan detection
 * - **Atomicity**: Every invocation commits entirely or not at all
 *
 * ## Module Structure
 *
 * - `arb`: Path evaluation and swap execution logic
 * - `bootstrap`: Scenario loading for the CLI and demos
 * - `chain`: Host collaborator traits and the in-memory host
 * - `config`: Engine settings and environment configuration
 * - `engine`: Invocation and administration surface
 * - `error`: Typed rejections
 * - `guard`: Pause flag, blacklist, risk parameters and rate limiting
 * - `math`: Fixed-point integer math kernel
 * - `utils`: Constants and logging
 */

/// Path evaluation and swap execution logic
pub mod arb;
/// Scenario loading for the CLI and demos
pub mod bootstrap;
/// Host collaborator traits and the in-memory host
pub mod chain;
/// Engine settings and environment configuration
pub mod config;
/// Invocation and administration surface
pub mod engine;
/// Typed rejections
pub mod error;
/// Pause flag, blacklist, risk parameters and rate limiting
pub mod guard;
/// Fixed-point integer math kernel
pub mod math;
/// Utility functions and helpers
pub mod utils;
