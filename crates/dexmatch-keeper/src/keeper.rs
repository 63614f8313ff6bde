//! Typed access to the dex module's state.
//!
//! `DexKeeper` turns raw store rows into orderbooks, price snapshots and
//! match results. Values are JSON-encoded; keys follow [`KeyLayout`].

use std::sync::Arc;

use dexmatch_matchcore::{OrderBook, PendingWrite};
use dexmatch_types::{
    BookEntry, ContractAddress, DexError, KeyLayout, MatchResult, OrderBookEntry, Pair,
    PositionDirection, PriceSnapshot, Result,
};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::store::KvStore;

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(value)?)
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Store adapter for one view of the state (the parent store, or a
/// pair-scoped cache during parallel execution).
#[derive(Clone)]
pub struct DexKeeper {
    store: Arc<dyn KvStore>,
    layout: KeyLayout,
}

impl DexKeeper {
    #[must_use]
    pub fn new(store: Arc<dyn KvStore>, layout: KeyLayout) -> Self {
        Self { store, layout }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn KvStore> {
        &self.store
    }

    #[must_use]
    pub fn layout(&self) -> &KeyLayout {
        &self.layout
    }

    /// Same layout over a different store.
    #[must_use]
    pub fn with_store(&self, store: Arc<dyn KvStore>) -> Self {
        Self {
            store,
            layout: self.layout,
        }
    }

    // =================================================================
    // Orderbook
    // =================================================================

    fn load_side(&self, direction: PositionDirection, contract: &ContractAddress, pair: &Pair) -> Result<Vec<OrderBookEntry>> {
        let prefix = self.layout.book_pair_prefix(direction, contract, pair);
        self.store
            .prefix_scan(&prefix)?
            .into_iter()
            .map(|(key, value)| {
                let row: BookEntry = decode(&value)?;
                if row.direction() != direction {
                    return Err(DexError::CorruptOrderbookEntry {
                        reason: format!("row {} stored under the {direction} side", hex::encode(&key)),
                    });
                }
                let entry = row.into_entry();
                if entry.price_denom != pair.price_denom || entry.asset_denom != pair.asset_denom {
                    return Err(DexError::CorruptOrderbookEntry {
                        reason: format!("row {} belongs to {}/{}", hex::encode(&key), entry.asset_denom, entry.price_denom),
                    });
                }
                entry.validate()?;
                Ok(entry)
            })
            .collect()
    }

    /// Load both sides of a pair's book, sorted ascending, with no dirty keys.
    pub fn populate_orderbook(&self, contract: &ContractAddress, pair: &Pair) -> Result<OrderBook> {
        let longs = self.load_side(PositionDirection::Long, contract, pair)?;
        let shorts = self.load_side(PositionDirection::Short, contract, pair)?;
        tracing::debug!(
            contract = %contract,
            pair = %pair,
            long_levels = longs.len(),
            short_levels = shorts.len(),
            "Orderbook loaded"
        );
        Ok(OrderBook::from_entries(pair.clone(), longs, shorts))
    }

    /// Persist one book row.
    pub fn set_orderbook_entry(&self, contract: &ContractAddress, pair: &Pair, entry: &BookEntry) -> Result<()> {
        let key = self
            .layout
            .book_key(entry.direction(), contract, pair, entry.entry().price);
        self.store.set(&key, encode(entry)?)
    }

    pub fn remove_orderbook_entry(
        &self,
        contract: &ContractAddress,
        pair: &Pair,
        direction: PositionDirection,
        price: rust_decimal::Decimal,
    ) -> Result<()> {
        let key = self.layout.book_key(direction, contract, pair, price);
        self.store.delete(&key)
    }

    /// Write every dirty level back to the store, then clear the dirty sets.
    ///
    /// Empty or removed levels are deleted, never stored as zero rows.
    /// Returns `(upserts, deletes)`.
    pub fn flush_orderbook(&self, contract: &ContractAddress, orderbook: &mut OrderBook) -> Result<(usize, usize)> {
        let (mut upserts, mut deletes) = (0, 0);
        for write in orderbook.pending_writes() {
            match write {
                PendingWrite::Upsert(entry) => {
                    self.set_orderbook_entry(contract, &orderbook.pair, &entry)?;
                    upserts += 1;
                }
                PendingWrite::Delete { direction, price } => {
                    self.remove_orderbook_entry(contract, &orderbook.pair, direction, price)?;
                    deletes += 1;
                }
            }
        }
        orderbook.clear_dirty();
        tracing::debug!(contract = %contract, pair = %orderbook.pair, upserts, deletes, "Orderbook flushed");
        Ok((upserts, deletes))
    }

    // =================================================================
    // Price state
    // =================================================================

    pub fn set_price_snapshot(&self, contract: &ContractAddress, snapshot: &PriceSnapshot) -> Result<()> {
        let key = self
            .layout
            .price_state_key(contract, &snapshot.pair, snapshot.height);
        self.store.set(&key, encode(snapshot)?)
    }

    pub fn get_price_snapshot(&self, contract: &ContractAddress, pair: &Pair, height: u64) -> Result<Option<PriceSnapshot>> {
        let key = self.layout.price_state_key(contract, pair, height);
        self.store.get(&key)?.map(|bytes| decode(&bytes)).transpose()
    }

    /// Every stored snapshot of a pair, oldest first.
    pub fn get_price_snapshots(&self, contract: &ContractAddress, pair: &Pair) -> Result<Vec<PriceSnapshot>> {
        let prefix = self.layout.price_state_pair_prefix(contract, pair);
        self.store
            .prefix_scan(&prefix)?
            .into_iter()
            .map(|(_, value)| decode(&value))
            .collect()
    }

    // =================================================================
    // Match result
    // =================================================================

    /// Store the contract's result for the block, replacing the previous one.
    pub fn set_match_result(&self, result: &MatchResult) -> Result<()> {
        let key = self.layout.match_result_key(&result.contract);
        self.store.set(&key, encode(result)?)
    }

    pub fn get_match_result(&self, contract: &ContractAddress) -> Result<Option<MatchResult>> {
        let key = self.layout.match_result_key(contract);
        self.store.get(&key)?.map(|bytes| decode(&bytes)).transpose()
    }
}
