//! # Arbitrage Module
//!
//! Path evaluation and execution: the per-hop pool snapshot and impact
//! model, the amount optimizer and quoter, the swap step executor and the
//! controller driving a whole circular path.

/// Price impact scoring
pub mod impact;
/// Committed amount per hop
pub mod optimizer;
/// Whole-path control flow
pub mod path;
/// Pool queries and per-hop snapshots
pub mod pool;
/// Pluggable AMM quoting
pub mod quote;
/// Single hop execution
pub mod swap;
/// Test helpers and utilities
#[cfg(test)]
pub(crate) mod test_helpers;
/// Per-hop and per-path traces
pub mod trace;
/// Common type definitions
pub mod types;
