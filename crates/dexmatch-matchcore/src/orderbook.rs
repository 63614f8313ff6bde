//! The per-pair orderbook arena used during one block's matching.
//!
//! Each side is a `BTreeMap<Decimal, OrderBookEntry>`: the map is both the
//! price-sorted sequence and the key → level index, so a level exists exactly
//! once. Mutated prices are queued in a `BTreeSet` of dirty keys; write-back
//! reads the live level for each dirty key, so no stale copy can be persisted.
//!
//! - **Longs** (bids): best = highest price (iterated from the back)
//! - **Shorts** (asks): best = lowest price (iterated from the front)

use std::collections::{BTreeMap, BTreeSet};

use dexmatch_types::{Allocation, BookEntry, OrderBookEntry, OrderId, Pair, PositionDirection};
use rust_decimal::Decimal;

/// One pending persistence action produced by a dirty key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingWrite {
    Upsert(BookEntry),
    Delete {
        direction: PositionDirection,
        price: Decimal,
    },
}

/// One side of one pair's book with dirty tracking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedSortedOrderBookEntries {
    direction: PositionDirection,
    levels: BTreeMap<Decimal, OrderBookEntry>,
    dirty: BTreeSet<Decimal>,
}

impl CachedSortedOrderBookEntries {
    #[must_use]
    pub fn new(direction: PositionDirection) -> Self {
        Self {
            direction,
            levels: BTreeMap::new(),
            dirty: BTreeSet::new(),
        }
    }

    /// Build a side from persisted rows. Rows that normalize to the same
    /// price are folded into one level; empty rows are dropped.
    #[must_use]
    pub fn from_entries(direction: PositionDirection, entries: Vec<OrderBookEntry>) -> Self {
        let mut side = Self::new(direction);
        for entry in entries {
            if entry.is_empty() {
                continue;
            }
            match side.levels.get_mut(&entry.price) {
                Some(level) => {
                    for alloc in entry.allocations {
                        level.add_allocation(alloc.order_id, &alloc.account, alloc.quantity);
                    }
                }
                None => {
                    side.levels.insert(entry.price, entry);
                }
            }
        }
        side
    }

    #[must_use]
    pub fn direction(&self) -> PositionDirection {
        self.direction
    }

    // =================================================================
    // Queries
    // =================================================================

    /// Best level: highest bid or lowest ask.
    #[must_use]
    pub fn best(&self) -> Option<&OrderBookEntry> {
        match self.direction {
            PositionDirection::Long => self.levels.values().next_back(),
            PositionDirection::Short => self.levels.values().next(),
        }
    }

    #[must_use]
    pub fn best_price(&self) -> Option<Decimal> {
        self.best().map(|level| level.price)
    }

    /// Levels from best to worst.
    pub fn levels_best_first(&self) -> Box<dyn Iterator<Item = &OrderBookEntry> + '_> {
        match self.direction {
            PositionDirection::Long => Box::new(self.levels.values().rev()),
            PositionDirection::Short => Box::new(self.levels.values()),
        }
    }

    /// Levels in ascending price order.
    pub fn levels_ascending(&self) -> impl Iterator<Item = &OrderBookEntry> {
        self.levels.values()
    }

    #[must_use]
    pub fn get(&self, price: Decimal) -> Option<&OrderBookEntry> {
        self.levels.get(&price)
    }

    /// Quantity reachable walking best-first while `accepts(price)` holds.
    pub fn available_quantity(&self, accepts: impl Fn(Decimal) -> bool) -> Decimal {
        self.levels_best_first()
            .take_while(|level| accepts(level.price))
            .map(|level| level.quantity)
            .sum()
    }

    #[must_use]
    pub fn total_quantity(&self) -> Decimal {
        self.levels.values().map(|level| level.quantity).sum()
    }

    /// Number of price levels.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    // =================================================================
    // Mutation (every path marks the touched key dirty)
    // =================================================================

    /// Record that the level at `price` changed. Idempotent.
    pub fn mark_dirty(&mut self, price: Decimal) {
        self.dirty.insert(price);
    }

    /// Rest an order at `price`, creating the level if needed.
    pub fn add_order(
        &mut self,
        pair: &Pair,
        price: Decimal,
        order_id: OrderId,
        account: &str,
        quantity: Decimal,
    ) {
        self.levels
            .entry(price)
            .or_insert_with(|| OrderBookEntry::new(price, pair.price_denom.clone(), pair.asset_denom.clone()))
            .add_allocation(order_id, account, quantity);
        self.mark_dirty(price);
    }

    /// Pull a resting order out of the level at `price`.
    ///
    /// Returns `None` (and leaves the side untouched) if no such order rests.
    pub fn remove_order(&mut self, price: Decimal, order_id: OrderId) -> Option<Allocation> {
        let level = self.levels.get_mut(&price)?;
        let removed = level.remove_allocation(order_id)?;
        if level.is_empty() {
            self.levels.remove(&price);
        }
        self.mark_dirty(price);
        Some(removed)
    }

    /// Consume up to `quantity` from the best level, FIFO within it.
    ///
    /// Returns the level price and the consumed allocation pieces, or `None`
    /// if the side is empty.
    pub fn fill_best(&mut self, quantity: Decimal) -> Option<(Decimal, Vec<Allocation>)> {
        let price = self.best_price()?;
        let level = self.levels.get_mut(&price)?;
        let fills = level.fill(quantity);
        if level.is_empty() {
            self.levels.remove(&price);
        }
        self.mark_dirty(price);
        Some((price, fills))
    }

    // =================================================================
    // Write-back
    // =================================================================

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    /// Dirty keys in ascending price order.
    pub fn dirty_keys(&self) -> impl Iterator<Item = &Decimal> {
        self.dirty.iter()
    }

    /// Resolve every dirty key against the live levels.
    #[must_use]
    pub fn pending_writes(&self) -> Vec<PendingWrite> {
        self.dirty
            .iter()
            .map(|price| match self.levels.get(price) {
                Some(level) if !level.is_empty() => {
                    PendingWrite::Upsert(BookEntry::new(self.direction, level.clone()))
                }
                _ => PendingWrite::Delete {
                    direction: self.direction,
                    price: *price,
                },
            })
            .collect()
    }

    /// Forget dirty keys once they have been persisted.
    pub fn clear_dirty(&mut self) {
        self.dirty.clear();
    }
}

/// Both sides of one pair's book.
///
/// `Clone` is a deep copy: each concurrent pair execution gets its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBook {
    pub pair: Pair,
    pub longs: CachedSortedOrderBookEntries,
    pub shorts: CachedSortedOrderBookEntries,
}

impl OrderBook {
    /// Create a new empty order book for the given pair.
    #[must_use]
    pub fn new(pair: Pair) -> Self {
        Self {
            pair,
            longs: CachedSortedOrderBookEntries::new(PositionDirection::Long),
            shorts: CachedSortedOrderBookEntries::new(PositionDirection::Short),
        }
    }

    #[must_use]
    pub fn from_entries(pair: Pair, longs: Vec<OrderBookEntry>, shorts: Vec<OrderBookEntry>) -> Self {
        Self {
            pair,
            longs: CachedSortedOrderBookEntries::from_entries(PositionDirection::Long, longs),
            shorts: CachedSortedOrderBookEntries::from_entries(PositionDirection::Short, shorts),
        }
    }

    #[must_use]
    pub fn side(&self, direction: PositionDirection) -> &CachedSortedOrderBookEntries {
        match direction {
            PositionDirection::Long => &self.longs,
            PositionDirection::Short => &self.shorts,
        }
    }

    pub fn side_mut(&mut self, direction: PositionDirection) -> &mut CachedSortedOrderBookEntries {
        match direction {
            PositionDirection::Long => &mut self.longs,
            PositionDirection::Short => &mut self.shorts,
        }
    }

    /// Best (highest) bid price, or `None` if no bids.
    #[must_use]
    pub fn best_bid(&self) -> Option<Decimal> {
        self.longs.best_price()
    }

    /// Best (lowest) ask price, or `None` if no asks.
    #[must_use]
    pub fn best_ask(&self) -> Option<Decimal> {
        self.shorts.best_price()
    }

    /// Whether the best bid meets or exceeds the best ask.
    #[must_use]
    pub fn is_crossed(&self) -> bool {
        matches!((self.best_bid(), self.best_ask()), (Some(bid), Some(ask)) if bid >= ask)
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.longs.is_dirty() || self.shorts.is_dirty()
    }

    /// Long writes first, then short, each in ascending price order.
    #[must_use]
    pub fn pending_writes(&self) -> Vec<PendingWrite> {
        let mut writes = self.longs.pending_writes();
        writes.extend(self.shorts.pending_writes());
        writes
    }

    pub fn clear_dirty(&mut self) {
        self.longs.clear_dirty();
        self.shorts.clear_dirty();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair() -> Pair {
        Pair::new("USDC", "ATOM")
    }

    fn dec(n: i64) -> Decimal {
        Decimal::new(n, 0)
    }

    fn row(price: i64, order: u64, qty: i64) -> OrderBookEntry {
        let mut entry = OrderBookEntry::new(dec(price), "USDC", "ATOM");
        entry.add_allocation(OrderId(order), "acct", dec(qty));
        entry
    }

    #[test]
    fn best_prices_per_side() {
        let book = OrderBook::from_entries(
            pair(),
            vec![row(99, 1, 1), row(100, 2, 1), row(95, 3, 1)],
            vec![row(105, 4, 1), row(101, 5, 1)],
        );
        assert_eq!(book.best_bid(), Some(dec(100)));
        assert_eq!(book.best_ask(), Some(dec(101)));
        assert!(!book.is_crossed());
        assert!(!book.is_dirty(), "loading must not mark anything dirty");
    }

    #[test]
    fn levels_best_first_per_side() {
        let book = OrderBook::from_entries(
            pair(),
            vec![row(90, 1, 1), row(100, 2, 1), row(95, 3, 1)],
            vec![row(110, 4, 1), row(101, 5, 1)],
        );
        let bids: Vec<Decimal> = book.longs.levels_best_first().map(|l| l.price).collect();
        assert_eq!(bids, vec![dec(100), dec(95), dec(90)]);
        let asks: Vec<Decimal> = book.shorts.levels_best_first().map(|l| l.price).collect();
        assert_eq!(asks, vec![dec(101), dec(110)]);
        let ascending: Vec<Decimal> = book.longs.levels_ascending().map(|l| l.price).collect();
        assert_eq!(ascending, vec![dec(90), dec(95), dec(100)]);
    }

    #[test]
    fn same_price_rows_are_aggregated() {
        let side = CachedSortedOrderBookEntries::from_entries(
            PositionDirection::Short,
            vec![row(100, 1, 2), row(100, 2, 3)],
        );
        assert_eq!(side.depth(), 1);
        let level = side.get(dec(100)).unwrap();
        assert_eq!(level.quantity, dec(5));
        assert_eq!(level.allocations.len(), 2);
    }

    #[test]
    fn add_order_marks_dirty_and_aggregates() {
        let mut side = CachedSortedOrderBookEntries::new(PositionDirection::Long);
        side.add_order(&pair(), dec(100), OrderId(1), "a", dec(2));
        side.add_order(&pair(), Decimal::new(1000, 1), OrderId(2), "b", dec(3));
        assert_eq!(side.depth(), 1, "100 and 100.0 are one level");
        assert_eq!(side.total_quantity(), dec(5));
        assert_eq!(side.dirty_keys().count(), 1);
    }

    #[test]
    fn mark_dirty_is_idempotent() {
        let mut side = CachedSortedOrderBookEntries::new(PositionDirection::Long);
        side.mark_dirty(dec(1));
        side.mark_dirty(dec(1));
        assert_eq!(side.dirty_keys().count(), 1);
    }

    #[test]
    fn fill_best_drains_level_and_queues_delete() {
        let mut book = OrderBook::from_entries(pair(), vec![], vec![row(101, 1, 2), row(102, 2, 5)]);
        let (price, fills) = book.shorts.fill_best(dec(2)).unwrap();
        assert_eq!(price, dec(101));
        assert_eq!(fills.len(), 1);
        assert_eq!(book.best_ask(), Some(dec(102)));
        assert_eq!(
            book.pending_writes(),
            vec![PendingWrite::Delete {
                direction: PositionDirection::Short,
                price: dec(101)
            }]
        );
    }

    #[test]
    fn pending_writes_upsert_live_level() {
        let mut book = OrderBook::from_entries(pair(), vec![row(100, 1, 5)], vec![]);
        book.longs.fill_best(dec(2)).unwrap();
        let writes = book.pending_writes();
        assert_eq!(writes.len(), 1);
        match &writes[0] {
            PendingWrite::Upsert(BookEntry::Long(entry)) => assert_eq!(entry.quantity, dec(3)),
            other => panic!("unexpected write {other:?}"),
        }
    }

    #[test]
    fn remove_unknown_order_is_noop() {
        let mut book = OrderBook::from_entries(pair(), vec![row(100, 1, 5)], vec![]);
        assert!(book.longs.remove_order(dec(100), OrderId(9)).is_none());
        assert!(book.longs.remove_order(dec(50), OrderId(1)).is_none());
        assert!(!book.is_dirty());
    }

    #[test]
    fn available_quantity_respects_bound() {
        let side = CachedSortedOrderBookEntries::from_entries(
            PositionDirection::Short,
            vec![row(101, 1, 2), row(102, 2, 3), row(110, 3, 7)],
        );
        assert_eq!(side.available_quantity(|p| p <= dec(102)), dec(5));
        assert_eq!(side.available_quantity(|_| true), dec(12));
    }

    #[test]
    fn clone_is_deep() {
        let book = OrderBook::from_entries(pair(), vec![row(100, 1, 5)], vec![]);
        let mut copy = book.clone();
        copy.longs.fill_best(dec(5)).unwrap();
        assert_eq!(book.best_bid(), Some(dec(100)));
        assert_eq!(copy.best_bid(), None);
        assert!(!book.is_dirty());
    }

    #[test]
    fn clear_dirty_empties_queue() {
        let mut book = OrderBook::new(pair());
        book.longs.add_order(&pair(), dec(100), OrderId(1), "a", dec(1));
        assert!(book.is_dirty());
        book.clear_dirty();
        assert!(!book.is_dirty());
        assert!(book.pending_writes().is_empty());
    }
}
