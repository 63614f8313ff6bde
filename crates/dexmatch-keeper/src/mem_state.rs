//! Block-scoped in-memory order state.
//!
//! Orders and cancellations submitted during a block are collected here per
//! `(contract, pair)` before execution. During parallel execution each pair
//! task takes its own entry out and hands it back once it finished, so no
//! two tasks ever share a mutable collection.

use std::collections::BTreeMap;

use dexmatch_types::{Cancellation, ContractAddress, Order, Pair, PairString};

/// Orders and cancellations of one pair in the current block.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlockPairState {
    pub orders: Vec<Order>,
    pub cancels: Vec<Cancellation>,
}

#[derive(Debug, Clone, Default)]
pub struct MemState {
    pairs: BTreeMap<(ContractAddress, PairString), BlockPairState>,
}

impl MemState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// File an order under its own contract and pair.
    pub fn add_order(&mut self, order: Order) {
        let key = (order.contract.clone(), order.pair().pair_string());
        self.pairs.entry(key).or_default().orders.push(order);
    }

    pub fn add_cancel(&mut self, cancel: Cancellation) {
        let pair = Pair::new(cancel.price_denom.clone(), cancel.asset_denom.clone());
        let key = (cancel.contract.clone(), pair.pair_string());
        self.pairs.entry(key).or_default().cancels.push(cancel);
    }

    #[must_use]
    pub fn block_orders(&self, contract: &ContractAddress, pair: &PairString) -> &[Order] {
        self.pairs
            .get(&(contract.clone(), pair.clone()))
            .map_or(&[], |state| state.orders.as_slice())
    }

    #[must_use]
    pub fn block_cancels(&self, contract: &ContractAddress, pair: &PairString) -> &[Cancellation] {
        self.pairs
            .get(&(contract.clone(), pair.clone()))
            .map_or(&[], |state| state.cancels.as_slice())
    }

    /// Move a pair's block state out, leaving it empty.
    pub fn take_pair(&mut self, contract: &ContractAddress, pair: &PairString) -> BlockPairState {
        self.pairs
            .remove(&(contract.clone(), pair.clone()))
            .unwrap_or_default()
    }

    /// Put a pair's (possibly updated) block state back.
    pub fn put_pair(&mut self, contract: &ContractAddress, pair: &PairString, state: BlockPairState) {
        self.pairs.insert((contract.clone(), pair.clone()), state);
    }

    /// Every block order of a contract, in pair-string order.
    pub fn all_block_orders(&self, contract: &ContractAddress) -> impl Iterator<Item = &Order> {
        self.pairs
            .iter()
            .filter(move |((c, _), _)| c == contract)
            .flat_map(|(_, state)| state.orders.iter())
    }
}
