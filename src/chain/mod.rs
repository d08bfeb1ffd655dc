//! # Host Collaborators
//!
//! The engine never moves tokens or reads pool state directly. It talks to
//! its host through the traits in this module: a token [`Ledger`], the
//! constant-product [`Pools`], an optional pair [`Factory`], the block
//! [`Clock`], and a [`Journal`] that gives each invocation all-or-nothing
//! semantics.
//!
//! [`MemoryChain`] implements all of them in memory with Uniswap V2 pair
//! semantics and is what the tests, the CLI and the benchmark run against.

use alloy::primitives::{Address, U256};

use crate::error::ChainError;

/// In-memory host
pub mod memory;

pub use memory::MemoryChain;

/// Reserves of a pool as returned by `getReserves`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reserves {
    /// Reserve 0
    pub reserve0: U256,
    /// Reserve 1
    pub reserve1: U256,
    /// Timestamp of the block that last synced the reserves
    pub block_timestamp_last: u64,
}

/// Block the current invocation executes in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BlockContext {
    /// Block number
    pub number: u64,
    /// Block timestamp in seconds
    pub timestamp: u64,
}

/// Opaque handle returned by [`Journal::checkpoint`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint(pub(crate) usize);

/// Token ledger: balances and transfers of any token.
pub trait Ledger {
    /// Balance of `token` held by `holder`
    fn balance_of(&self, token: Address, holder: Address) -> U256;

    /// Move `amount` of `token` from `from` to `to`.
    ///
    /// The recipient may be credited less than `amount` for fee-on-transfer
    /// tokens; callers that care measure balances before and after.
    ///
    /// # Errors
    /// * If `from` does not hold `amount`
    fn transfer(
        &mut self,
        token: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), ChainError>;

    /// Amount of `token` that `spender` may move on behalf of `owner`
    fn allowance(&self, token: Address, owner: Address, spender: Address) -> U256;

    /// Move `amount` of `token` from `from` to `to` using `spender`'s allowance.
    ///
    /// # Errors
    /// * If the allowance or the balance is insufficient
    fn transfer_from(
        &mut self,
        token: Address,
        spender: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), ChainError>;
}

/// Constant-product pools.
pub trait Pools {
    /// First token of the pool
    ///
    /// # Errors
    /// * If the pool is unknown
    fn token0(&self, pool: Address) -> Result<Address, ChainError>;

    /// Second token of the pool
    ///
    /// # Errors
    /// * If the pool is unknown
    fn token1(&self, pool: Address) -> Result<Address, ChainError>;

    /// Current reserves of the pool
    ///
    /// # Errors
    /// * If the pool is unknown
    fn get_reserves(&self, pool: Address) -> Result<Reserves, ChainError>;

    /// Pay out `amount0_out`/`amount1_out` to `to`, expecting the input to
    /// have been transferred to the pool beforehand.
    ///
    /// # Errors
    /// * If the pool is unknown, nothing is paid in, or the fee-adjusted
    ///   constant product would decrease
    fn swap(
        &mut self,
        pool: Address,
        amount0_out: U256,
        amount1_out: U256,
        to: Address,
        data: &[u8],
    ) -> Result<(), ChainError>;
}

/// Pool resolver.
pub trait Factory {
    /// Pool trading `token_a` against `token_b`, in either order
    fn get_pair(&self, token_a: Address, token_b: Address) -> Option<Address>;
}

/// Source of the current block.
pub trait Clock {
    /// Block the next invocation executes in
    fn block(&self) -> BlockContext;
}

/// Invocation-level atomicity.
///
/// Every effect performed after [`Journal::checkpoint`] is undone by
/// [`Journal::revert_to`] and kept by [`Journal::commit`]. Checkpoints nest.
pub trait Journal {
    /// Open a checkpoint
    fn checkpoint(&mut self) -> Checkpoint;

    /// Undo every effect since `checkpoint`
    fn revert_to(&mut self, checkpoint: Checkpoint);

    /// Keep every effect since `checkpoint`
    fn commit(&mut self, checkpoint: Checkpoint);
}

/// Everything the engine needs from its host.
pub trait Chain: Ledger + Pools + Factory + Clock + Journal {}

impl<T: Ledger + Pools + Factory + Clock + Journal> Chain for T {}
