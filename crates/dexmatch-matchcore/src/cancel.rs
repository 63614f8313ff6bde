//! Cancellation processing, run before any matching in a block.

use dexmatch_types::{Cancellation, Order};
use rust_decimal::Decimal;

use crate::OrderBook;

/// Apply a block's cancellations to the resting book and to the block's
/// incoming orders.
///
/// A cancel that names a resting order removes its allocation from the level
/// at `cancel.price` on `cancel.direction` (the level is dropped once empty,
/// and marked dirty either way). A cancel that names an incoming order zeroes
/// its remaining quantity so it neither matches nor rests. References to
/// unknown orders are ignored: stale cancels are expected, for instance for
/// orders fully filled in an earlier block.
///
/// Returns the cancellations that removed something.
pub fn cancel_orders(
    cancels: &[Cancellation],
    orderbook: &mut OrderBook,
    block_orders: &mut [Order],
) -> Vec<Cancellation> {
    let mut applied = Vec::new();
    for cancel in cancels {
        let resting = orderbook
            .side_mut(cancel.direction)
            .remove_order(cancel.price, cancel.id)
            .is_some();

        let mut incoming = false;
        for order in block_orders.iter_mut().filter(|o| o.id == cancel.id && o.is_live()) {
            order.remaining_quantity = Decimal::ZERO;
            order.status_description = "cancelled before matching".to_string();
            incoming = true;
        }

        if resting || incoming {
            tracing::debug!(
                order = %cancel.id,
                direction = %cancel.direction,
                price = %cancel.price,
                resting,
                incoming,
                "Order cancelled"
            );
            applied.push(cancel.clone());
        } else {
            tracing::debug!(order = %cancel.id, "Ignoring cancel for unknown order");
        }
    }
    applied
}
