//! Settlement entries produced by matching.
//!
//! Every match yields one entry per side with identical quantity: the
//! taker/long fill and the maker/short fill. Entries are immutable once
//! created.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Account, BlockInfo, OrderId, OrderType, PositionDirection};

/// One side of one fill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementEntry {
    /// The order being credited with this fill.
    pub order_id: OrderId,
    pub account: Account,
    pub price_denom: String,
    pub asset_denom: String,
    pub quantity: Decimal,
    /// Price the fill actually executed at.
    pub execution_price: Decimal,
    /// Price the order asked for (limit price or market worst price).
    pub expected_price: Decimal,
    pub direction: PositionDirection,
    pub order_type: OrderType,
    /// The order on the other side of this fill.
    pub counterparty_order_id: OrderId,
    pub height: u64,
    pub timestamp: i64,
}

impl SettlementEntry {
    /// Price-denominated value of the fill.
    #[must_use]
    pub fn notional(&self) -> Decimal {
        self.execution_price * self.quantity
    }
}

/// Fields shared by both sides of one fill.
#[derive(Debug, Clone, Copy)]
pub struct Fill<'a> {
    pub price_denom: &'a str,
    pub asset_denom: &'a str,
    pub quantity: Decimal,
    pub execution_price: Decimal,
    pub block: BlockInfo,
}

/// One party to a fill.
#[derive(Debug, Clone, Copy)]
pub struct FillParty<'a> {
    pub order_id: OrderId,
    pub account: &'a str,
    pub direction: PositionDirection,
    pub order_type: OrderType,
    pub expected_price: Decimal,
}

/// Build the two settlement entries for one fill, `first` then `second`.
#[must_use]
pub fn settlement_pair(fill: &Fill<'_>, first: &FillParty<'_>, second: &FillParty<'_>) -> [SettlementEntry; 2] {
    let make = |party: &FillParty<'_>, counterparty: OrderId| SettlementEntry {
        order_id: party.order_id,
        account: party.account.to_string(),
        price_denom: fill.price_denom.to_string(),
        asset_denom: fill.asset_denom.to_string(),
        quantity: fill.quantity,
        execution_price: fill.execution_price,
        expected_price: party.expected_price,
        direction: party.direction,
        order_type: party.order_type,
        counterparty_order_id: counterparty,
        height: fill.block.height,
        timestamp: fill.block.timestamp_secs(),
    };
    [make(first, second.order_id), make(second, first.order_id)]
}

impl std::fmt::Display for SettlementEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Settlement[order {}] {} {} {}/{} @ {}",
            self.order_id,
            self.direction,
            self.quantity,
            self.asset_denom,
            self.price_denom,
            self.execution_price,
        )
    }
}
