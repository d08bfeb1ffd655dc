//! Typed errors for path evaluation and execution.
//!
//! Every rejection names the invariant that failed. Variants are grouped in
//! the order the engine checks them: input validation, market state,
//! risk guards, then profitability.

use alloy::primitives::{Address, U256};
use thiserror::Error;

/// Failures reported by the host collaborators (ledger, pools, factory).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    /// The address is not a known pool
    #[error("unknown pool {0}")]
    UnknownPool(Address),
    /// The holder does not have enough of the token
    #[error("insufficient balance of {token} held by {holder}: {available} < {required}")]
    InsufficientBalance {
        /// Token being moved
        token: Address,
        /// Holder being debited
        holder: Address,
        /// Amount requested
        required: U256,
        /// Amount held
        available: U256,
    },
    /// `transfer_from` exceeded the approved amount
    #[error("insufficient allowance of {token} for {spender}: {available} < {required}")]
    InsufficientAllowance {
        /// Token being moved
        token: Address,
        /// Spender attempting the transfer
        spender: Address,
        /// Amount requested
        required: U256,
        /// Amount approved
        available: U256,
    },
    /// A pool swap asked for nothing or for more than its reserves
    #[error("insufficient output amount requested from {0}")]
    InsufficientOutputAmount(Address),
    /// A pool swap was attempted without paying anything in
    #[error("insufficient input amount received by {0}")]
    InsufficientInputAmount(Address),
    /// The fee-adjusted constant product decreased
    #[error("constant product violated by swap on {0}")]
    ConstantProductViolated(Address),
    /// A token charges more than the whole transfer as fee
    #[error("transfer fee of {token} is {fee_bps} bps, above 100%")]
    InvalidTransferFee {
        /// Token being moved
        token: Address,
        /// Configured fee
        fee_bps: u16,
    },
    /// Arithmetic overflow inside the host
    #[error("overflow in host arithmetic")]
    Overflow,
}

/// Every way a path invocation or an administrative call can be rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArbError {
    /// Path length outside the supported range
    #[error("invalid path length {len}, supported range is {min}..={max}")]
    InvalidPathLength {
        /// Requested number of hops
        len: usize,
        /// Shortest supported path
        min: usize,
        /// Longest supported path
        max: usize,
    },
    /// Zero input amount
    #[error("amount in must be non-zero")]
    ZeroAmount,
    /// Hop fee outside [0, 100%]
    #[error("invalid fee {fee_bps} bps on hop {hop}")]
    InvalidFee {
        /// Hop position
        hop: usize,
        /// Declared fee
        fee_bps: u16,
    },
    /// An invocation carried no path at all
    #[error("empty batch")]
    EmptyBatch,
    /// The request arrived after its deadline
    #[error("deadline {deadline} expired at {now}")]
    DeadlineExpired {
        /// Caller supplied deadline
        deadline: u64,
        /// Current block timestamp
        now: u64,
    },
    /// The engine does not hold enough base asset
    #[error("insufficient funds: {available} < {required}")]
    InsufficientFunds {
        /// Amount the path needs
        required: U256,
        /// Base asset held by the engine
        available: U256,
    },
    /// The pool does not trade the transit token or is excluded
    #[error("pool {pool} does not belong to the path for token {token}")]
    PairNotInPath {
        /// Offending pool
        pool: Address,
        /// Transit token at that hop
        token: Address,
    },
    /// One of the pool reserves is below the liquidity floor
    #[error("insufficient liquidity in pool {pool}")]
    InsufficientLiquidity {
        /// Offending pool
        pool: Address,
    },
    /// Sandwich deviation, hop slippage or cumulative impact too high
    #[error("excessive slippage at hop {hop}: {value} > {limit}")]
    ExcessiveSlippage {
        /// Hop position, or the path length for the final cumulative check
        hop: usize,
        /// Measured value
        value: U256,
        /// Allowed value
        limit: U256,
    },
    /// The impact score exceeds the configured maximum
    #[error("excessive price impact at hop {hop}: {impact_ppm} ppm > {limit_ppm} ppm")]
    ExcessivePriceImpact {
        /// Hop position
        hop: usize,
        /// Relative impact in PPM
        impact_ppm: U256,
        /// Configured maximum in PPM
        limit_ppm: U256,
    },
    /// The committed amount exceeds the maximum trade volume
    #[error("trade volume {amount} exceeds maximum {limit}")]
    TradeVolumeExceeded {
        /// Committed amount
        amount: U256,
        /// Configured maximum
        limit: U256,
    },
    /// Overflow or division by zero in the swap math
    #[error("numerical instability: {0}")]
    NumericalInstability(&'static str),
    /// Output below the requested minimum or the profit threshold
    #[error("minimum profit not met: {actual} <= {required}")]
    MinimumProfitNotMet {
        /// Threshold the amount had to clear
        required: U256,
        /// Amount observed
        actual: U256,
    },
    /// A hop returned less than the golden-ratio tolerance allows
    #[error("suboptimal path at hop {hop}: {actual} < {floor}")]
    SuboptimalPath {
        /// Hop position
        hop: usize,
        /// Realized output
        actual: U256,
        /// Tolerated floor
        floor: U256,
    },
    /// The path does not end in the base asset
    #[error("non circular path: ends in {token}")]
    NonCircularPath {
        /// Terminal token
        token: Address,
    },
    /// Path execution while paused
    #[error("engine is paused")]
    Paused,
    /// Token recovery while not paused
    #[error("engine is not paused")]
    NotPaused,
    /// Administrative call from someone other than the owner
    #[error("caller {0} is not the owner")]
    Unauthorized(Address),
    /// The caller transacts again before the minimum delay
    #[error("rate limit exceeded for {caller}: next allowed at {next_allowed}")]
    RateLimitExceeded {
        /// Rate-limited caller
        caller: Address,
        /// Earliest timestamp accepted
        next_allowed: u64,
    },
    /// Too many transactions from one caller in one block
    #[error("flash loan detected for {caller} in block {block}")]
    FlashLoanDetected {
        /// Offending caller
        caller: Address,
        /// Block number
        block: u64,
    },
    /// Risk parameters outside their documented bounds
    #[error("invalid risk parameters: {0}")]
    InvalidRiskParameters(&'static str),
    /// A collaborator call failed
    #[error(transparent)]
    Chain(#[from] ChainError),
}
