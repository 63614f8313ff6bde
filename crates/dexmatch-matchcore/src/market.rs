//! Market order matching.
//!
//! Market orders of one direction walk the *resting* opposite side only,
//! best price outward, and never rest themselves: whatever is left unfilled
//! is cancelled after matching by the caller.
//!
//! ## Priority
//!
//! Orders with the most generous price bound go first (unbounded orders
//! before everything else, then buys by descending and sells by ascending
//! worst price). Ties keep block order.

use std::cmp::Ordering;

use dexmatch_types::{
    BlockInfo, Fill, FillParty, Order, OrderType, PositionDirection, settlement_pair,
};
use rust_decimal::Decimal;

use crate::{CachedSortedOrderBookEntries, ExecutionOutcome};

fn priority(direction: PositionDirection, a: &Order, b: &Order) -> Ordering {
    match (a.worst_price(), b.worst_price()) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(pa), Some(pb)) => match direction {
            PositionDirection::Long => pb.cmp(&pa),
            PositionDirection::Short => pa.cmp(&pb),
        },
    }
}

/// Match every live market order of `direction` in `orders` against
/// `resting`, which must be the opposite side of the book.
///
/// Fills are taken FIFO within each level at the level's price. One taker
/// and one maker settlement is produced per resting allocation touched.
/// Each order's `remaining_quantity` is decremented in place.
/// [`OrderType::FokMarket`] orders fill completely or not at all.
pub fn match_market_orders(
    orders: &mut [Order],
    resting: &mut CachedSortedOrderBookEntries,
    direction: PositionDirection,
    block: BlockInfo,
) -> ExecutionOutcome {
    debug_assert_eq!(resting.direction(), direction.opposite());

    let mut queue: Vec<usize> = orders
        .iter()
        .enumerate()
        .filter(|(_, o)| o.direction == direction && o.order_type.is_market() && o.is_live())
        .map(|(i, _)| i)
        .collect();
    queue.sort_by(|&a, &b| priority(direction, &orders[a], &orders[b]));

    let mut outcome = ExecutionOutcome::default();
    for idx in queue {
        let order = &mut orders[idx];

        if order.order_type == OrderType::FokMarket {
            let reachable = resting.available_quantity(|price| order.accepts_price(price));
            if reachable < order.remaining_quantity {
                tracing::debug!(
                    order = %order.id,
                    wanted = %order.remaining_quantity,
                    reachable = %reachable,
                    "FOK market order not fillable, skipping"
                );
                continue;
            }
        }

        while order.remaining_quantity > Decimal::ZERO {
            let Some(level) = resting.best() else {
                break;
            };
            if !order.accepts_price(level.price) {
                break;
            }
            let executed = order.remaining_quantity.min(level.quantity);
            let Some((price, fills)) = resting.fill_best(executed) else {
                break;
            };

            let taker = FillParty {
                order_id: order.id,
                account: &order.account,
                direction,
                order_type: order.order_type,
                expected_price: order.price,
            };
            for alloc in &fills {
                let fill = Fill {
                    price_denom: &order.price_denom,
                    asset_denom: &order.asset_denom,
                    quantity: alloc.quantity,
                    execution_price: price,
                    block,
                };
                let maker = FillParty {
                    order_id: alloc.order_id,
                    account: &alloc.account,
                    direction: direction.opposite(),
                    order_type: OrderType::Limit,
                    expected_price: price,
                };
                outcome.settlements.extend(settlement_pair(&fill, &taker, &maker));
            }
            outcome.record_execution(price, executed);
            order.remaining_quantity -= executed;

            tracing::debug!(
                order = %order.id,
                direction = %direction,
                price = %price,
                qty = %executed,
                "Market order filled"
            );
        }
    }
    outcome
}
