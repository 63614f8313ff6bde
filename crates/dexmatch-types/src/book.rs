//! Persistent orderbook rows.
//!
//! One [`OrderBookEntry`] aggregates every resting order at a single price on
//! one side of one pair. The individual orders are kept as FIFO
//! [`Allocation`]s so fills at a level honour time priority.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Account, DexError, OrderId, PositionDirection, Result};

/// One resting order's share of a price level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    pub order_id: OrderId,
    pub account: Account,
    pub quantity: Decimal,
}

/// A single price level. `quantity` always equals the allocation sum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBookEntry {
    pub price: Decimal,
    pub quantity: Decimal,
    pub price_denom: String,
    pub asset_denom: String,
    /// Front = oldest = filled first.
    pub allocations: Vec<Allocation>,
}

impl OrderBookEntry {
    #[must_use]
    pub fn new(price: Decimal, price_denom: impl Into<String>, asset_denom: impl Into<String>) -> Self {
        Self {
            price,
            quantity: Decimal::ZERO,
            price_denom: price_denom.into(),
            asset_denom: asset_denom.into(),
            allocations: Vec::new(),
        }
    }

    /// Append an order at the back of the level.
    ///
    /// Re-adding an order id already present tops up its allocation
    /// without losing its queue position.
    pub fn add_allocation(&mut self, order_id: OrderId, account: &str, quantity: Decimal) {
        self.quantity += quantity;
        if let Some(existing) = self.allocations.iter_mut().find(|a| a.order_id == order_id) {
            existing.quantity += quantity;
            return;
        }
        self.allocations.push(Allocation {
            order_id,
            account: account.to_string(),
            quantity,
        });
    }

    /// Remove an order from the level. Returns `None` if it isn't resting here.
    pub fn remove_allocation(&mut self, order_id: OrderId) -> Option<Allocation> {
        let pos = self.allocations.iter().position(|a| a.order_id == order_id)?;
        let removed = self.allocations.remove(pos);
        self.quantity -= removed.quantity;
        Some(removed)
    }

    /// Consume up to `quantity` from the front of the level.
    ///
    /// Returns the consumed pieces in fill order. Fully drained allocations
    /// are removed.
    pub fn fill(&mut self, quantity: Decimal) -> Vec<Allocation> {
        let mut left = quantity.min(self.quantity);
        let mut filled = Vec::new();
        while left > Decimal::ZERO {
            let Some(front) = self.allocations.first_mut() else {
                break;
            };
            let take = left.min(front.quantity);
            front.quantity -= take;
            left -= take;
            self.quantity -= take;
            filled.push(Allocation {
                order_id: front.order_id,
                account: front.account.clone(),
                quantity: take,
            });
            if front.quantity.is_zero() {
                self.allocations.remove(0);
            }
        }
        filled
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.quantity.is_zero()
    }

    #[must_use]
    pub fn contains_order(&self, order_id: OrderId) -> bool {
        self.allocations.iter().any(|a| a.order_id == order_id)
    }

    /// Check a persisted level: non-empty, positive allocations with unique
    /// ids, and `quantity` equal to their sum.
    pub fn validate(&self) -> Result<()> {
        let corrupt = |reason: String| {
            Err(DexError::CorruptOrderbookEntry {
                reason: format!("level {}: {reason}", self.price),
            })
        };
        if self.allocations.is_empty() {
            return corrupt("no allocations".into());
        }
        let mut total = Decimal::ZERO;
        for (i, alloc) in self.allocations.iter().enumerate() {
            if alloc.quantity <= Decimal::ZERO {
                return corrupt(format!("order {} has quantity {}", alloc.order_id, alloc.quantity));
            }
            if self.allocations[..i].iter().any(|a| a.order_id == alloc.order_id) {
                return corrupt(format!("order {} allocated twice", alloc.order_id));
            }
            total += alloc.quantity;
        }
        if total != self.quantity {
            return corrupt(format!("quantity {} but allocations sum to {total}", self.quantity));
        }
        Ok(())
    }
}

/// A level tagged with the side it rests on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookEntry {
    Long(OrderBookEntry),
    Short(OrderBookEntry),
}

impl BookEntry {
    #[must_use]
    pub fn new(direction: PositionDirection, entry: OrderBookEntry) -> Self {
        match direction {
            PositionDirection::Long => Self::Long(entry),
            PositionDirection::Short => Self::Short(entry),
        }
    }

    #[must_use]
    pub fn direction(&self) -> PositionDirection {
        match self {
            Self::Long(_) => PositionDirection::Long,
            Self::Short(_) => PositionDirection::Short,
        }
    }

    #[must_use]
    pub fn entry(&self) -> &OrderBookEntry {
        match self {
            Self::Long(entry) | Self::Short(entry) => entry,
        }
    }

    #[must_use]
    pub fn into_entry(self) -> OrderBookEntry {
        match self {
            Self::Long(entry) | Self::Short(entry) => entry,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level() -> OrderBookEntry {
        let mut entry = OrderBookEntry::new(Decimal::new(100, 0), "USDC", "ATOM");
        entry.add_allocation(OrderId(1), "alice", Decimal::new(3, 0));
        entry.add_allocation(OrderId(2), "bob", Decimal::new(5, 0));
        entry
    }

    #[test]
    fn quantity_tracks_allocations() {
        let entry = level();
        assert_eq!(entry.quantity, Decimal::new(8, 0));
        assert_eq!(entry.allocations.len(), 2);
    }

    #[test]
    fn fill_is_fifo() {
        let mut entry = level();
        let fills = entry.fill(Decimal::new(4, 0));
        assert_eq!(fills.len(), 2);
        assert_eq!(fills[0].order_id, OrderId(1));
        assert_eq!(fills[0].quantity, Decimal::new(3, 0));
        assert_eq!(fills[1].order_id, OrderId(2));
        assert_eq!(fills[1].quantity, Decimal::ONE);
        assert_eq!(entry.quantity, Decimal::new(4, 0));
        assert_eq!(entry.allocations.len(), 1);
    }

    #[test]
    fn fill_never_exceeds_level() {
        let mut entry = level();
        let fills = entry.fill(Decimal::new(100, 0));
        let total: Decimal = fills.iter().map(|a| a.quantity).sum();
        assert_eq!(total, Decimal::new(8, 0));
        assert!(entry.is_empty());
        assert!(entry.allocations.is_empty());
    }

    #[test]
    fn validate_checks_allocation_sum() {
        let mut entry = level();
        entry.validate().unwrap();

        entry.quantity = Decimal::new(9, 0);
        assert!(matches!(entry.validate(), Err(DexError::CorruptOrderbookEntry { .. })));

        let mut zero = level();
        zero.allocations[1].quantity = Decimal::ZERO;
        zero.quantity = Decimal::new(3, 0);
        assert!(zero.validate().is_err());

        let empty = OrderBookEntry::new(Decimal::ONE, "USDC", "ATOM");
        assert!(empty.validate().is_err());
    }

    #[test]
    fn remove_allocation_decrements() {
        let mut entry = level();
        let removed = entry.remove_allocation(OrderId(2)).unwrap();
        assert_eq!(removed.account, "bob");
        assert_eq!(entry.quantity, Decimal::new(3, 0));
        assert!(entry.remove_allocation(OrderId(42)).is_none());
    }

    #[test]
    fn re_adding_tops_up_in_place() {
        let mut entry = level();
        entry.add_allocation(OrderId(1), "alice", Decimal::ONE);
        assert_eq!(entry.allocations.len(), 2);
        assert_eq!(entry.allocations[0].quantity, Decimal::new(4, 0));
        assert_eq!(entry.quantity, Decimal::new(9, 0));
    }

    #[test]
    fn book_entry_tags_side() {
        let tagged = BookEntry::new(PositionDirection::Short, level());
        assert_eq!(tagged.direction(), PositionDirection::Short);
        assert_eq!(tagged.entry().price, Decimal::new(100, 0));
    }
}
