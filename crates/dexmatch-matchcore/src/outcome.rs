//! Aggregate output of one matching call.

use dexmatch_types::SettlementEntry;
use rust_decimal::Decimal;

/// Settlements plus price/volume aggregates of one matching pass.
///
/// [`merge`](Self::merge) is associative and commutative on everything but
/// the order of `settlements`, which carries no meaning across passes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionOutcome {
    pub settlements: Vec<SettlementEntry>,
    /// Sum of `price × quantity` over executions.
    pub total_notional: Decimal,
    /// Executed quantity, counted once per fill.
    pub total_quantity: Decimal,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
}

impl ExecutionOutcome {
    /// Fold one execution into the aggregates.
    pub fn record_execution(&mut self, price: Decimal, quantity: Decimal) {
        self.total_notional += price * quantity;
        self.total_quantity += quantity;
        self.min_price = Some(self.min_price.map_or(price, |p| p.min(price)));
        self.max_price = Some(self.max_price.map_or(price, |p| p.max(price)));
    }

    #[must_use]
    pub fn merge(mut self, other: Self) -> Self {
        self.settlements.extend(other.settlements);
        self.total_notional += other.total_notional;
        self.total_quantity += other.total_quantity;
        self.min_price = match (self.min_price, other.min_price) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        self.max_price = match (self.max_price, other.max_price) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
        self
    }

    /// Volume-weighted average execution price.
    #[must_use]
    pub fn average_price(&self) -> Option<Decimal> {
        if self.total_quantity.is_zero() {
            None
        } else {
            Some(self.total_notional / self.total_quantity)
        }
    }

    #[must_use]
    pub fn has_executions(&self) -> bool {
        !self.total_quantity.is_zero()
    }
}
