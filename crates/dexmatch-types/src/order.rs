//! Block-scoped order model.
//!
//! Orders are created when a user or contract submits them within the block
//! window, mutated in place by matching (`remaining_quantity`, `status`) and
//! either persisted as resting allocations or discarded at block end.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Account, ContractAddress, DexError, OrderId, Pair, Result};

/// Which side of the book an order or level is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum PositionDirection {
    /// Bid.
    Long,
    /// Ask.
    Short,
}

impl PositionDirection {
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Self::Long => Self::Short,
            Self::Short => Self::Long,
        }
    }
}

impl std::fmt::Display for PositionDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Long => write!(f, "LONG"),
            Self::Short => write!(f, "SHORT"),
        }
    }
}

/// The type of order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum OrderType {
    Limit,
    Market,
    /// Fill-or-kill market order: executes in full or not at all.
    FokMarket,
}

impl OrderType {
    #[must_use]
    pub fn is_market(self) -> bool {
        matches!(self, Self::Market | Self::FokMarket)
    }
}

impl std::fmt::Display for OrderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Limit => write!(f, "LIMIT"),
            Self::Market => write!(f, "MARKET"),
            Self::FokMarket => write!(f, "FOKMARKET"),
        }
    }
}

/// Lifecycle status of a block order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum OrderStatus {
    Placed,
    FailedToPlace,
    Cancelled,
    Fulfilled,
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Placed => write!(f, "PLACED"),
            Self::FailedToPlace => write!(f, "FAILED_TO_PLACE"),
            Self::Cancelled => write!(f, "CANCELLED"),
            Self::Fulfilled => write!(f, "FULFILLED"),
        }
    }
}

/// An incoming order for one pair in the current block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub account: Account,
    pub contract: ContractAddress,
    pub price_denom: String,
    pub asset_denom: String,
    pub direction: PositionDirection,
    pub order_type: OrderType,
    /// Limit price, or the worst acceptable price for market orders
    /// (zero means no bound).
    pub price: Decimal,
    /// Quantity requested at placement.
    pub quantity: Decimal,
    /// Quantity not yet filled or cancelled.
    pub remaining_quantity: Decimal,
    pub status: OrderStatus,
    pub status_description: String,
}

impl Order {
    #[must_use]
    pub fn pair(&self) -> Pair {
        Pair::new(self.price_denom.clone(), self.asset_denom.clone())
    }

    /// Whether matching should consider this order at all.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.status == OrderStatus::Placed && self.remaining_quantity > Decimal::ZERO
    }

    /// Price bound a market order may not cross, if any.
    #[must_use]
    pub fn worst_price(&self) -> Option<Decimal> {
        if self.price.is_zero() {
            None
        } else {
            Some(self.price)
        }
    }

    /// Whether a resting level at `level_price` is acceptable to this order.
    #[must_use]
    pub fn accepts_price(&self, level_price: Decimal) -> bool {
        match (self.worst_price(), self.direction) {
            (None, _) => true,
            (Some(bound), PositionDirection::Long) => level_price <= bound,
            (Some(bound), PositionDirection::Short) => level_price >= bound,
        }
    }

    #[must_use]
    pub fn filled_quantity(&self) -> Decimal {
        self.quantity - self.remaining_quantity
    }

    #[must_use]
    pub fn is_filled(&self) -> bool {
        self.remaining_quantity.is_zero()
    }

    /// Check that the order is well formed for `pair`.
    ///
    /// Limit prices must be positive; a market bound may be zero (unbounded)
    /// but never negative.
    pub fn validate(&self, pair: &Pair) -> Result<()> {
        let reason = if self.price_denom != pair.price_denom || self.asset_denom != pair.asset_denom {
            format!("denoms {}/{} do not belong to pair {pair}", self.asset_denom, self.price_denom)
        } else if self.quantity <= Decimal::ZERO {
            format!("non-positive quantity {}", self.quantity)
        } else if self.remaining_quantity < Decimal::ZERO || self.remaining_quantity > self.quantity {
            format!("remaining quantity {} outside 0..={}", self.remaining_quantity, self.quantity)
        } else if self.order_type == OrderType::Limit && self.price <= Decimal::ZERO {
            format!("non-positive limit price {}", self.price)
        } else if self.price < Decimal::ZERO {
            format!("negative price bound {}", self.price)
        } else {
            return Ok(());
        };
        Err(DexError::InvalidOrder { id: self.id, reason })
    }
}

/// Who requested a cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CancellationInitiator {
    User,
    Contract,
}

/// Reference to a resting or block order that should be voided.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cancellation {
    pub id: OrderId,
    pub initiator: CancellationInitiator,
    pub creator: Account,
    pub contract: ContractAddress,
    pub price_denom: String,
    pub asset_denom: String,
    pub direction: PositionDirection,
    pub price: Decimal,
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl Order {
    pub fn dummy(
        id: u64,
        direction: PositionDirection,
        order_type: OrderType,
        price: Decimal,
        quantity: Decimal,
    ) -> Self {
        Self {
            id: OrderId(id),
            account: format!("acct{id}"),
            contract: ContractAddress::new("sei1contract"),
            price_denom: "USDC".to_string(),
            asset_denom: "ATOM".to_string(),
            direction,
            order_type,
            price,
            quantity,
            remaining_quantity: quantity,
            status: OrderStatus::Placed,
            status_description: String::new(),
        }
    }

    pub fn dummy_limit(id: u64, direction: PositionDirection, price: Decimal, quantity: Decimal) -> Self {
        Self::dummy(id, direction, OrderType::Limit, price, quantity)
    }

    pub fn dummy_market(id: u64, direction: PositionDirection, quantity: Decimal) -> Self {
        Self::dummy(id, direction, OrderType::Market, Decimal::ZERO, quantity)
    }

    #[must_use]
    pub fn for_pair(mut self, pair: &Pair) -> Self {
        self.price_denom.clone_from(&pair.price_denom);
        self.asset_denom.clone_from(&pair.asset_denom);
        self
    }
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl Cancellation {
    pub fn dummy(id: u64, direction: PositionDirection, price: Decimal) -> Self {
        Self {
            id: OrderId(id),
            initiator: CancellationInitiator::User,
            creator: format!("acct{id}"),
            contract: ContractAddress::new("sei1contract"),
            price_denom: "USDC".to_string(),
            asset_denom: "ATOM".to_string(),
            direction,
            price,
        }
    }

    #[must_use]
    pub fn for_pair(mut self, pair: &Pair) -> Self {
        self.price_denom.clone_from(&pair.price_denom);
        self.asset_denom.clone_from(&pair.asset_denom);
        self
    }
}
