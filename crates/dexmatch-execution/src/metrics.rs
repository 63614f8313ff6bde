//! Fire-and-forget metrics.
//!
//! Metrics never feed back into matching; a sink that drops everything is a
//! valid sink.

use std::collections::BTreeMap;
use std::sync::RwLock;

use dexmatch_types::SettlementEntry;
use dexmatch_types::constants::MODULE_NAME;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

pub trait MetricsSink: Send + Sync {
    fn set_gauge(&self, name: &str, value: f64);

    fn incr_counter(&self, name: &str, value: u64);
}

/// Emits every metric as a `debug` event on the `dexmatch::metrics` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingMetrics;

impl MetricsSink for TracingMetrics {
    fn set_gauge(&self, name: &str, value: f64) {
        tracing::debug!(target: "dexmatch::metrics", module = MODULE_NAME, metric = name, value, "gauge");
    }

    fn incr_counter(&self, name: &str, value: u64) {
        tracing::debug!(target: "dexmatch::metrics", module = MODULE_NAME, metric = name, value, "counter");
    }
}

/// Keeps the latest gauge values and counter totals, for inspection.
#[derive(Debug, Default)]
pub struct InMemoryMetrics {
    gauges: RwLock<BTreeMap<String, f64>>,
    counters: RwLock<BTreeMap<String, u64>>,
}

impl InMemoryMetrics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gauge(&self, name: &str) -> Option<f64> {
        self.gauges.read().ok()?.get(name).copied()
    }

    pub fn counter(&self, name: &str) -> u64 {
        self.counters
            .read()
            .ok()
            .and_then(|c| c.get(name).copied())
            .unwrap_or(0)
    }
}

impl MetricsSink for InMemoryMetrics {
    fn set_gauge(&self, name: &str, value: f64) {
        if let Ok(mut gauges) = self.gauges.write() {
            gauges.insert(name.to_string(), value);
        }
    }

    fn incr_counter(&self, name: &str, value: u64) {
        if let Ok(mut counters) = self.counters.write() {
            *counters.entry(name.to_string()).or_default() += value;
        }
    }
}

/// Report the block's settlements: their count, per-dimension counters and
/// total settled quantity. Nothing is emitted for an empty block.
#[allow(clippy::cast_precision_loss)]
pub fn emit_settlement_metrics(settlements: &[SettlementEntry], sink: &dyn MetricsSink) {
    if settlements.is_empty() {
        return;
    }
    sink.set_gauge("num_settlements", settlements.len() as f64);

    let mut total_quantity = Decimal::ZERO;
    for s in settlements {
        total_quantity += s.quantity;
        sink.incr_counter(&format!("num_settlements_order_type_{}", s.order_type), 1);
        sink.incr_counter(&format!("num_settlements_position_direction_{}", s.direction), 1);
        sink.incr_counter(&format!("num_settlements_asset_denom_{}", s.asset_denom), 1);
        sink.incr_counter(&format!("num_settlements_price_denom_{}", s.price_denom), 1);
    }
    sink.set_gauge(
        "num_total_order_quantity_in_settlements",
        total_quantity.to_f64().unwrap_or(f64::MAX),
    );
}

#[cfg(test)]
mod tests {
    use dexmatch_types::*;

    use super::*;

    fn settlements() -> Vec<SettlementEntry> {
        let fill = Fill {
            price_denom: "USDC",
            asset_denom: "ATOM",
            quantity: Decimal::new(25, 1),
            execution_price: Decimal::new(100, 0),
            block: BlockInfo::dummy(1),
        };
        let taker = FillParty {
            order_id: OrderId(1),
            account: "alice",
            direction: PositionDirection::Long,
            order_type: OrderType::Market,
            expected_price: Decimal::ZERO,
        };
        let maker = FillParty {
            order_id: OrderId(2),
            account: "bob",
            direction: PositionDirection::Short,
            order_type: OrderType::Limit,
            expected_price: Decimal::new(100, 0),
        };
        settlement_pair(&fill, &taker, &maker).to_vec()
    }

    #[test]
    fn counts_every_dimension() {
        let sink = InMemoryMetrics::new();
        emit_settlement_metrics(&settlements(), &sink);

        assert_eq!(sink.gauge("num_settlements"), Some(2.0));
        assert_eq!(sink.gauge("num_total_order_quantity_in_settlements"), Some(5.0));
        assert_eq!(sink.counter("num_settlements_order_type_MARKET"), 1);
        assert_eq!(sink.counter("num_settlements_order_type_LIMIT"), 1);
        assert_eq!(sink.counter("num_settlements_position_direction_LONG"), 1);
        assert_eq!(sink.counter("num_settlements_asset_denom_ATOM"), 2);
        assert_eq!(sink.counter("num_settlements_price_denom_USDC"), 2);
    }

    #[test]
    fn empty_block_emits_nothing() {
        let sink = InMemoryMetrics::new();
        emit_settlement_metrics(&[], &sink);
        assert_eq!(sink.gauge("num_settlements"), None);
    }

    #[test]
    fn counters_accumulate_across_blocks() {
        let sink = InMemoryMetrics::new();
        emit_settlement_metrics(&settlements(), &sink);
        emit_settlement_metrics(&settlements(), &sink);
        assert_eq!(sink.counter("num_settlements_asset_denom_ATOM"), 4);
        assert_eq!(sink.gauge("num_settlements"), Some(2.0));
    }
}
