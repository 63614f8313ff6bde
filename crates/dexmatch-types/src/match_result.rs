//! Durable per-block results consumed by contract-result reporting.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    Account, Cancellation, ContractAddress, Order, OrderId, OrderStatus, OrderType, Pair,
    PositionDirection, SettlementEntry,
};

/// Everything one contract's matching touched in one block.
///
/// Written once at the end of the block's parallel execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub height: u64,
    pub contract: ContractAddress,
    pub orders: Vec<Order>,
    pub cancellations: Vec<Cancellation>,
    pub settlements: Vec<SettlementEntry>,
}

impl MatchResult {
    #[must_use]
    pub fn new(
        height: u64,
        contract: ContractAddress,
        orders: Vec<Order>,
        cancellations: Vec<Cancellation>,
        settlements: Vec<SettlementEntry>,
    ) -> Self {
        Self {
            height,
            contract,
            orders,
            cancellations,
            settlements,
        }
    }
}

/// Per-pair price statistics for a block that had executions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceSnapshot {
    pub height: u64,
    pub timestamp: i64,
    pub pair: Pair,
    /// Volume-weighted average execution price.
    pub average_price: Decimal,
    pub min_price: Decimal,
    pub max_price: Decimal,
    pub volume: Decimal,
}

/// How a block order fared at placement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPlacementResult {
    pub order_id: OrderId,
    pub status: OrderStatus,
    pub status_description: String,
}

/// One fill reported back to the order's owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderExecutionResult {
    pub order_id: OrderId,
    pub execution_price: Decimal,
    pub quantity: Decimal,
    pub direction: PositionDirection,
    pub order_type: OrderType,
}

/// Per-account report handed to the contract after execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractOrderResult {
    pub contract: ContractAddress,
    pub order_placement_results: Vec<OrderPlacementResult>,
    pub order_execution_results: Vec<OrderExecutionResult>,
}

impl ContractOrderResult {
    #[must_use]
    pub fn new(contract: ContractAddress) -> Self {
        Self {
            contract,
            order_placement_results: Vec::new(),
            order_execution_results: Vec::new(),
        }
    }
}

/// Results keyed by account, iterated in a stable order.
pub type ContractOrderResults = BTreeMap<Account, ContractOrderResult>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn match_result_serde_roundtrip() {
        let order = Order::dummy_limit(1, PositionDirection::Long, Decimal::new(100, 0), Decimal::ONE);
        let result = MatchResult::new(
            7,
            ContractAddress::new("sei1contract"),
            vec![order],
            vec![Cancellation::dummy(2, PositionDirection::Short, Decimal::new(101, 0))],
            vec![],
        );
        let json = serde_json::to_string(&result).unwrap();
        let back: MatchResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, result);
    }

    #[test]
    fn contract_order_result_starts_empty() {
        let result = ContractOrderResult::new(ContractAddress::new("sei1contract"));
        assert!(result.order_placement_results.is_empty());
        assert!(result.order_execution_results.is_empty());
    }
}
