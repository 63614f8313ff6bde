//! Execution contexts: one per block, one derived per pair.

use std::sync::Arc;

use dexmatch_keeper::{CacheStore, DexKeeper, EventManager, KvStore, ScopedStore};
use dexmatch_types::{BlockInfo, ContractAddress, EngineConfig, Pair, PairString, Result};

use crate::metrics::{MetricsSink, TracingMetrics};

/// Block-wide execution state owned by the caller.
pub struct BlockContext {
    pub block: BlockInfo,
    pub config: EngineConfig,
    /// Parent event log; pair events land here only after a clean run.
    pub events: EventManager,
    pub metrics: Arc<dyn MetricsSink>,
}

impl BlockContext {
    #[must_use]
    pub fn new(block: BlockInfo, config: EngineConfig) -> Self {
        Self {
            block,
            config,
            events: EventManager::new(),
            metrics: Arc::new(TracingMetrics),
        }
    }

    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsSink>) -> Self {
        self.metrics = metrics;
        self
    }
}

/// Isolated view handed to one pair's execution task.
///
/// Writes go through a [`ScopedStore`] (the pair's whitelist) into a private
/// [`CacheStore`]; nothing reaches the parent keeper's store until
/// [`commit`](Self::commit). Events go to a private [`EventManager`].
pub struct PairContext {
    pub block: BlockInfo,
    pub contract: ContractAddress,
    pub pair: Pair,
    pub keeper: DexKeeper,
    pub events: EventManager,
    cache: Arc<CacheStore>,
}

impl PairContext {
    /// Derive a pair context from the parent keeper's store.
    #[must_use]
    pub fn derive(block: BlockInfo, parent: &DexKeeper, contract: &ContractAddress, pair: &Pair) -> Self {
        let cache = Arc::new(CacheStore::new(Arc::clone(parent.store())));
        let whitelist = parent.layout().pair_whitelist(contract, pair);
        let scoped: Arc<dyn KvStore> = Arc::new(ScopedStore::new(cache.clone(), whitelist));
        Self {
            block,
            contract: contract.clone(),
            pair: pair.clone(),
            keeper: parent.with_store(scoped),
            events: EventManager::new(),
            cache,
        }
    }

    #[must_use]
    pub fn pair_string(&self) -> PairString {
        self.pair.pair_string()
    }

    /// Apply the cached writes to the parent keeper's store as one batch.
    /// Returns the write count.
    pub fn commit(&self) -> Result<usize> {
        self.cache.commit()
    }

    pub fn pending_writes(&self) -> Result<usize> {
        self.cache.pending_len()
    }
}

#[cfg(test)]
mod tests {
    use dexmatch_keeper::MemStore;
    use dexmatch_types::*;

    use super::*;

    #[test]
    fn pair_context_writes_stay_private_until_commit() {
        let parent_store = Arc::new(MemStore::new());
        let parent = DexKeeper::new(parent_store.clone(), KeyLayout::default());
        let contract = ContractAddress::new("sei1contract");
        let pair = Pair::new("USDC", "ATOM");
        let ctx = PairContext::derive(BlockInfo::dummy(1), &parent, &contract, &pair);

        let entry = BookEntry::Long(OrderBookEntry::new(rust_decimal::Decimal::ONE, "USDC", "ATOM"));
        ctx.keeper.set_orderbook_entry(&contract, &pair, &entry).unwrap();
        assert_eq!(ctx.pending_writes().unwrap(), 1);
        assert!(parent_store.is_empty().unwrap());

        assert_eq!(ctx.commit().unwrap(), 1);
        assert_eq!(parent_store.len().unwrap(), 1);
    }

    #[test]
    fn pair_context_is_scoped_to_its_pair() {
        let parent = DexKeeper::new(Arc::new(MemStore::new()), KeyLayout::default());
        let contract = ContractAddress::new("sei1contract");
        let ctx = PairContext::derive(BlockInfo::dummy(1), &parent, &contract, &Pair::new("USDC", "ATOM"));
        let other = Pair::new("USDC", "OSMO");
        assert!(matches!(
            ctx.keeper.populate_orderbook(&contract, &other),
            Err(DexError::KeyOutOfScope { .. })
        ));
    }
}
