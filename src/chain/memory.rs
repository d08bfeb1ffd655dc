use std::collections::HashMap;

use alloy::primitives::{Address, U256};
use log::trace;

use super::{BlockContext, Checkpoint, Clock, Factory, Journal, Ledger, Pools, Reserves};
use crate::error::ChainError;
use crate::utils::constants::{BIPS, UNISWAP_V2_FEE_BPS};

/// A Uniswap V2 style pair
#[derive(Debug, Clone, PartialEq, Eq)]
struct Pair {
    /// The address of the first token in the pair
    token0: Address,
    /// The address of the second token in the pair
    token1: Address,
    /// Reserve of the first token as of the last sync
    reserve0: U256,
    /// Reserve of the second token as of the last sync
    reserve1: U256,
    /// Swap fee enforced by the `K` check, in basis points
    fee_bps: u16,
    /// Timestamp of the last sync
    block_timestamp_last: u64,
}

/// Journaled part of the chain
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct State {
    /// Balances keyed by (token, holder)
    balances: HashMap<(Address, Address), U256>,
    /// Allowances keyed by (token, owner, spender)
    allowances: HashMap<(Address, Address, Address), U256>,
    /// Pairs keyed by pool address
    pairs: HashMap<Address, Pair>,
}

/// In-memory host with Uniswap V2 pair semantics.
///
/// Tokens may charge a transfer fee (the recipient is credited less than
/// was sent and the difference is burned), which is how deflationary tokens
/// show up to the engine.
#[derive(Debug, Clone, Default)]
pub struct MemoryChain {
    /// Current balances, allowances and pairs
    state: State,
    /// Snapshots taken by open checkpoints
    snapshots: Vec<State>,
    /// Fee-on-transfer rates by token, in basis points
    transfer_fees: HashMap<Address, u16>,
    /// Pair registry keyed by sorted token pair
    registry: HashMap<(Address, Address), Address>,
    /// Current block
    block: BlockContext,
}

impl MemoryChain {
    /// Creates an empty chain at block 1, timestamp 1
    #[must_use]
    pub fn new() -> Self {
        Self {
            block: BlockContext {
                number: 1,
                timestamp: 1,
            },
            ..Self::default()
        }
    }

    /// Registers a pair charging the canonical 0.3% fee and mints its reserves.
    pub fn add_pair(
        &mut self,
        pool: Address,
        token0: Address,
        token1: Address,
        reserve0: U256,
        reserve1: U256,
    ) {
        self.add_pair_with_fee(pool, token0, token1, reserve0, reserve1, UNISWAP_V2_FEE_BPS);
    }

    /// Registers a pair with an explicit fee and mints its reserves.
    pub fn add_pair_with_fee(
        &mut self,
        pool: Address,
        token0: Address,
        token1: Address,
        reserve0: U256,
        reserve1: U256,
        fee_bps: u16,
    ) {
        self.state.pairs.insert(
            pool,
            Pair {
                token0,
                token1,
                reserve0,
                reserve1,
                fee_bps,
                block_timestamp_last: self.block.timestamp,
            },
        );
        self.mint(token0, pool, reserve0);
        self.mint(token1, pool, reserve1);
        self.registry.entry(sorted(token0, token1)).or_insert(pool);
    }

    /// Credits `amount` of `token` to `holder` out of thin air.
    pub fn mint(&mut self, token: Address, holder: Address, amount: U256) {
        let balance = self.state.balances.entry((token, holder)).or_default();
        *balance = balance.saturating_add(amount);
    }

    /// Lets `spender` move up to `amount` of `owner`'s `token`.
    pub fn approve(&mut self, token: Address, owner: Address, spender: Address, amount: U256) {
        self.state.allowances.insert((token, owner, spender), amount);
    }

    /// Makes `token` charge `fee_bps` on every transfer.
    pub fn set_transfer_fee(&mut self, token: Address, fee_bps: u16) {
        self.transfer_fees.insert(token, fee_bps);
    }

    /// Overwrites a pair's reserves and balances, e.g. to model another
    /// trader moving the price between two invocations.
    ///
    /// # Errors
    /// * If the pool is unknown
    pub fn set_reserves(
        &mut self,
        pool: Address,
        reserve0: U256,
        reserve1: U256,
    ) -> Result<(), ChainError> {
        let pair = self
            .state
            .pairs
            .get_mut(&pool)
            .ok_or(ChainError::UnknownPool(pool))?;
        pair.reserve0 = reserve0;
        pair.reserve1 = reserve1;
        let (token0, token1) = (pair.token0, pair.token1);
        self.state.balances.insert((token0, pool), reserve0);
        self.state.balances.insert((token1, pool), reserve1);
        Ok(())
    }

    /// Moves the clock forward.
    pub fn advance(&mut self, blocks: u64, seconds: u64) {
        self.block.number += blocks;
        self.block.timestamp += seconds;
    }

    /// Jumps to an explicit block.
    pub fn set_block(&mut self, block: BlockContext) {
        self.block = block;
    }

    /// Debits `from` and credits `to` net of the token's transfer fee.
    fn move_balance(
        &mut self,
        token: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), ChainError> {
        let available = self.balance_of(token, from);
        if available < amount {
            return Err(ChainError::InsufficientBalance {
                token,
                holder: from,
                required: amount,
                available,
            });
        }
        let fee_bps = self.transfer_fees.get(&token).copied().unwrap_or_default();
        let fee = amount
            .checked_mul(U256::from(fee_bps))
            .ok_or(ChainError::Overflow)?
            / BIPS;
        let net = amount
            .checked_sub(fee)
            .ok_or(ChainError::InvalidTransferFee { token, fee_bps })?;

        self.state.balances.insert((token, from), available - amount);
        let credited = self.state.balances.entry((token, to)).or_default();
        *credited = credited.saturating_add(net);
        trace!("memory: {amount} of {token} from {from} to {to} (fee {fee})");
        Ok(())
    }

    /// Pair by address
    fn pair(&self, pool: Address) -> Result<&Pair, ChainError> {
        self.state
            .pairs
            .get(&pool)
            .ok_or(ChainError::UnknownPool(pool))
    }

    /// Optimistic payout, input measurement, `K` check and reserve sync
    fn settle_swap(
        &mut self,
        pool: Address,
        pair: &Pair,
        amount0_out: U256,
        amount1_out: U256,
        to: Address,
    ) -> Result<(), ChainError> {
        // Optimistic transfer, the input is checked against balances afterwards
        if !amount0_out.is_zero() {
            self.move_balance(pair.token0, pool, to, amount0_out)?;
        }
        if !amount1_out.is_zero() {
            self.move_balance(pair.token1, pool, to, amount1_out)?;
        }

        let balance0 = self.balance_of(pair.token0, pool);
        let balance1 = self.balance_of(pair.token1, pool);
        let amount0_in = amount_in(balance0, pair.reserve0, amount0_out);
        let amount1_in = amount_in(balance1, pair.reserve1, amount1_out);
        if amount0_in.is_zero() && amount1_in.is_zero() {
            return Err(ChainError::InsufficientInputAmount(pool));
        }

        let adjusted0 = adjusted_balance(balance0, amount0_in, pair.fee_bps)?;
        let adjusted1 = adjusted_balance(balance1, amount1_in, pair.fee_bps)?;
        let k_after = adjusted0
            .checked_mul(adjusted1)
            .ok_or(ChainError::Overflow)?;
        let k_before = pair
            .reserve0
            .checked_mul(pair.reserve1)
            .and_then(|k| k.checked_mul(BIPS * BIPS))
            .ok_or(ChainError::Overflow)?;
        if k_after < k_before {
            return Err(ChainError::ConstantProductViolated(pool));
        }

        let timestamp = self.block.timestamp;
        if let Some(pair) = self.state.pairs.get_mut(&pool) {
            pair.reserve0 = balance0;
            pair.reserve1 = balance1;
            pair.block_timestamp_last = timestamp;
        }
        trace!("memory: swap on {pool} synced reserves to {balance0}/{balance1}");
        Ok(())
    }
}

/// Registry key for a token pair, independent of order
fn sorted(a: Address, b: Address) -> (Address, Address) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Input implied by a post-swap balance
fn amount_in(balance: U256, reserve: U256, amount_out: U256) -> U256 {
    balance.saturating_sub(reserve - amount_out)
}

/// `balance·BIPS − amount_in·fee`, the fee-adjusted balance of the `K` check
fn adjusted_balance(balance: U256, amount_in: U256, fee_bps: u16) -> Result<U256, ChainError> {
    balance
        .checked_mul(BIPS)
        .and_then(|b| b.checked_sub(amount_in * U256::from(fee_bps)))
        .ok_or(ChainError::Overflow)
}

impl Ledger for MemoryChain {
    fn balance_of(&self, token: Address, holder: Address) -> U256 {
        self.state
            .balances
            .get(&(token, holder))
            .copied()
            .unwrap_or_default()
    }

    fn transfer(
        &mut self,
        token: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), ChainError> {
        self.move_balance(token, from, to, amount)
    }

    fn allowance(&self, token: Address, owner: Address, spender: Address) -> U256 {
        self.state
            .allowances
            .get(&(token, owner, spender))
            .copied()
            .unwrap_or_default()
    }

    fn transfer_from(
        &mut self,
        token: Address,
        spender: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), ChainError> {
        let available = self.allowance(token, from, spender);
        if available < amount {
            return Err(ChainError::InsufficientAllowance {
                token,
                spender,
                required: amount,
                available,
            });
        }
        self.move_balance(token, from, to, amount)?;
        self.approve(token, from, spender, available - amount);
        Ok(())
    }
}

impl Pools for MemoryChain {
    fn token0(&self, pool: Address) -> Result<Address, ChainError> {
        Ok(self.pair(pool)?.token0)
    }

    fn token1(&self, pool: Address) -> Result<Address, ChainError> {
        Ok(self.pair(pool)?.token1)
    }

    fn get_reserves(&self, pool: Address) -> Result<Reserves, ChainError> {
        let pair = self.pair(pool)?;
        Ok(Reserves {
            reserve0: pair.reserve0,
            reserve1: pair.reserve1,
            block_timestamp_last: pair.block_timestamp_last,
        })
    }

    fn swap(
        &mut self,
        pool: Address,
        amount0_out: U256,
        amount1_out: U256,
        to: Address,
        _data: &[u8],
    ) -> Result<(), ChainError> {
        let pair = self.pair(pool)?.clone();
        if amount0_out.is_zero() && amount1_out.is_zero()
            || amount0_out >= pair.reserve0
            || amount1_out >= pair.reserve1
        {
            return Err(ChainError::InsufficientOutputAmount(pool));
        }

        // a failed swap leaves no trace, like a reverted pair call
        let touched = [
            (pair.token0, pool),
            (pair.token1, pool),
            (pair.token0, to),
            (pair.token1, to),
        ];
        let saved = touched.map(|key| (key, self.state.balances.get(&key).copied()));
        let result = self.settle_swap(pool, &pair, amount0_out, amount1_out, to);
        if result.is_err() {
            for (key, balance) in saved {
                match balance {
                    Some(balance) => self.state.balances.insert(key, balance),
                    None => self.state.balances.remove(&key),
                };
            }
        }
        result
    }
}

impl Factory for MemoryChain {
    fn get_pair(&self, token_a: Address, token_b: Address) -> Option<Address> {
        self.registry.get(&sorted(token_a, token_b)).copied()
    }
}

impl Clock for MemoryChain {
    fn block(&self) -> BlockContext {
        self.block
    }
}

impl Journal for MemoryChain {
    fn checkpoint(&mut self) -> Checkpoint {
        self.snapshots.push(self.state.clone());
        Checkpoint(self.snapshots.len() - 1)
    }

    fn revert_to(&mut self, checkpoint: Checkpoint) {
        if checkpoint.0 >= self.snapshots.len() {
            return;
        }
        self.snapshots.truncate(checkpoint.0 + 1);
        if let Some(state) = self.snapshots.pop() {
            self.state = state;
        }
    }

    fn commit(&mut self, checkpoint: Checkpoint) {
        self.snapshots.truncate(checkpoint.0);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::arb::test_helpers::addr;

    fn chain_with_pair() -> MemoryChain {
        let mut chain = MemoryChain::new();
        chain.add_pair(
            addr("P1"),
            addr("A"),
            addr("B"),
            U256::from(1_000_000),
            U256::from(2_000_000),
        );
        chain.mint(addr("A"), addr("alice"), U256::from(100_000));
        chain
    }

    #[test]
    fn test_transfer_with_fee() {
        let mut chain = chain_with_pair();
        chain.set_transfer_fee(addr("A"), 100); // 1%
        chain
            .transfer(addr("A"), addr("alice"), addr("bob"), U256::from(10_000))
            .unwrap();
        assert_eq!(chain.balance_of(addr("A"), addr("alice")), U256::from(90_000));
        assert_eq!(chain.balance_of(addr("A"), addr("bob")), U256::from(9_900));
    }

    #[test]
    fn test_transfer_fee_above_whole_amount() {
        let mut chain = chain_with_pair();
        chain.set_transfer_fee(addr("A"), 20_000);
        assert_eq!(
            chain.transfer(addr("A"), addr("alice"), addr("bob"), U256::from(100)),
            Err(ChainError::InvalidTransferFee {
                token: addr("A"),
                fee_bps: 20_000,
            })
        );
        assert_eq!(chain.balance_of(addr("A"), addr("alice")), U256::from(100_000));
        assert_eq!(chain.balance_of(addr("A"), addr("bob")), U256::ZERO);
    }

    #[test]
    fn test_transfer_insufficient_balance() {
        let mut chain = chain_with_pair();
        let err = chain
            .transfer(addr("A"), addr("alice"), addr("bob"), U256::from(100_001))
            .unwrap_err();
        assert!(matches!(err, ChainError::InsufficientBalance { .. }));
    }

    #[test]
    fn test_transfer_from_consumes_allowance() {
        let mut chain = chain_with_pair();
        chain.approve(addr("A"), addr("alice"), addr("bob"), U256::from(500));
        chain
            .transfer_from(addr("A"), addr("bob"), addr("alice"), addr("carol"), U256::from(300))
            .unwrap();
        assert_eq!(chain.allowance(addr("A"), addr("alice"), addr("bob")), U256::from(200));
        assert!(chain
            .transfer_from(addr("A"), addr("bob"), addr("alice"), addr("carol"), U256::from(300))
            .is_err());
    }

    #[test]
    fn test_swap_enforces_constant_product() {
        let mut chain = chain_with_pair();
        chain
            .transfer(addr("A"), addr("alice"), addr("P1"), U256::from(1_000))
            .unwrap();
        // 1000 * 0.997 * 2_000_000 / (1_000_000 + 997) = 1992.01...
        let greedy = chain.swap(addr("P1"), U256::ZERO, U256::from(1_993), addr("alice"), &[]);
        assert_eq!(greedy, Err(ChainError::ConstantProductViolated(addr("P1"))));
        // the rejected payout was taken back
        assert_eq!(chain.balance_of(addr("B"), addr("alice")), U256::ZERO);
        assert_eq!(chain.balance_of(addr("B"), addr("P1")), U256::from(2_000_000));

        chain
            .swap(addr("P1"), U256::ZERO, U256::from(1_992), addr("alice"), &[])
            .unwrap();
        let reserves = chain.get_reserves(addr("P1")).unwrap();
        assert_eq!(reserves.reserve0, U256::from(1_001_000));
        assert_eq!(reserves.reserve1, U256::from(2_000_000 - 1_992));
        assert_eq!(chain.balance_of(addr("B"), addr("alice")), U256::from(1_992));
    }

    #[test]
    fn test_swap_without_input() {
        let mut chain = chain_with_pair();
        let err = chain.swap(addr("P1"), U256::ZERO, U256::from(10), addr("alice"), &[]);
        assert_eq!(err, Err(ChainError::InsufficientInputAmount(addr("P1"))));
        assert_eq!(chain.balance_of(addr("B"), addr("alice")), U256::ZERO);
        assert_eq!(chain.balance_of(addr("B"), addr("P1")), U256::from(2_000_000));
    }

    #[test]
    fn test_checkpoint_revert_and_commit() {
        let mut chain = chain_with_pair();
        let outer = chain.checkpoint();
        chain
            .transfer(addr("A"), addr("alice"), addr("bob"), U256::from(1))
            .unwrap();
        let inner = chain.checkpoint();
        chain
            .transfer(addr("A"), addr("alice"), addr("bob"), U256::from(2))
            .unwrap();
        chain.revert_to(inner);
        assert_eq!(chain.balance_of(addr("A"), addr("bob")), U256::from(1));
        chain.commit(outer);
        assert_eq!(chain.balance_of(addr("A"), addr("bob")), U256::from(1));

        let cp = chain.checkpoint();
        chain
            .transfer(addr("A"), addr("alice"), addr("bob"), U256::from(5))
            .unwrap();
        chain.revert_to(cp);
        assert_eq!(chain.balance_of(addr("A"), addr("bob")), U256::from(1));
    }

    #[test]
    fn test_get_pair_any_order() {
        let chain = chain_with_pair();
        assert_eq!(chain.get_pair(addr("A"), addr("B")), Some(addr("P1")));
        assert_eq!(chain.get_pair(addr("B"), addr("A")), Some(addr("P1")));
        assert_eq!(chain.get_pair(addr("A"), addr("C")), None);
    }
}
