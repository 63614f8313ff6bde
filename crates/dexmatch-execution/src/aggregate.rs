//! Per-pair result aggregation after matching.

use std::collections::{BTreeMap, BTreeSet};

use dexmatch_keeper::BlockPairState;
use dexmatch_types::{
    Cancellation, CancellationInitiator, ContractAddress, Order, OrderId, OrderStatus, SettlementEntry,
};
use rust_decimal::Decimal;

/// Total settled quantity per order id.
#[must_use]
pub fn get_order_id_to_settled_quantities(settlements: &[SettlementEntry]) -> BTreeMap<OrderId, Decimal> {
    let mut settled = BTreeMap::new();
    for s in settlements {
        *settled.entry(s.order_id).or_insert(Decimal::ZERO) += s.quantity;
    }
    settled
}

/// Queue a cancellation for every placed market order that did not settle
/// its full quantity. Market orders never rest, so the remainder is void.
///
/// Orders that already carry a cancellation in this block are skipped.
/// Returns the synthesized cancellations, which are also appended to
/// `state.cancels`.
pub fn prepare_cancel_unfulfilled_market_orders(
    contract: &ContractAddress,
    state: &mut BlockPairState,
    settled: &BTreeMap<OrderId, Decimal>,
) -> Vec<Cancellation> {
    let already: BTreeSet<OrderId> = state.cancels.iter().map(|c| c.id).collect();
    let synthesized: Vec<Cancellation> = state
        .orders
        .iter()
        .filter(|o| o.order_type.is_market() && o.status == OrderStatus::Placed)
        .filter(|o| settled.get(&o.id).copied().unwrap_or(Decimal::ZERO) < o.quantity)
        .filter(|o| !already.contains(&o.id))
        .map(|o| Cancellation {
            id: o.id,
            initiator: CancellationInitiator::User,
            creator: o.account.clone(),
            contract: contract.clone(),
            price_denom: o.price_denom.clone(),
            asset_denom: o.asset_denom.clone(),
            direction: o.direction,
            price: o.price,
        })
        .collect();

    for cancel in &synthesized {
        tracing::debug!(contract = %contract, order = %cancel.id, "Cancelling unfulfilled market order");
    }
    state.cancels.extend(synthesized.iter().cloned());
    synthesized
}

/// Final order and cancellation records of a pair for the match result.
///
/// Placed orders with nothing remaining become [`OrderStatus::Fulfilled`];
/// every block order is returned, whether it was placed or not.
pub fn get_match_results(state: &mut BlockPairState) -> (Vec<Order>, Vec<Cancellation>) {
    for order in &mut state.orders {
        if order.status == OrderStatus::Placed && order.remaining_quantity.is_zero() {
            order.status = OrderStatus::Fulfilled;
        }
    }
    (state.orders.clone(), state.cancels.clone())
}
