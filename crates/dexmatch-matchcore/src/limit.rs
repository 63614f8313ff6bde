//! Limit order matching.
//!
//! All live limit orders of the block are first rested on their side of the
//! book, then the best bid and best ask levels are crossed while
//! `bid >= ask`. Each crossing executes `min(bid level, ask level)` at the
//! midpoint of the two level prices; allocations fill FIFO on both sides.
//! Whatever remains after the crossing loop simply stays on the book.

use std::collections::HashMap;

use dexmatch_types::{
    Allocation, BlockInfo, Fill, FillParty, Order, OrderId, OrderType, PositionDirection,
    SettlementEntry, settlement_pair,
};
use rust_decimal::Decimal;

use crate::{ExecutionOutcome, OrderBook};

/// Match the block's limit orders against each other and the resting book.
///
/// Mutates `orderbook` directly (every touched level is marked dirty) and
/// decrements `remaining_quantity` of incoming orders that got filled.
pub fn match_limit_orders(orders: &mut [Order], orderbook: &mut OrderBook, block: BlockInfo) -> ExecutionOutcome {
    let pair = orderbook.pair.clone();
    let mut incoming: HashMap<OrderId, usize> = HashMap::new();

    for direction in [PositionDirection::Long, PositionDirection::Short] {
        for (idx, order) in orders.iter().enumerate() {
            if order.direction != direction || order.order_type != OrderType::Limit || !order.is_live() {
                continue;
            }
            orderbook
                .side_mut(direction)
                .add_order(&pair, order.price, order.id, &order.account, order.remaining_quantity);
            incoming.insert(order.id, idx);
        }
    }

    let mut outcome = ExecutionOutcome::default();
    while let (Some(long), Some(short)) = (orderbook.longs.best(), orderbook.shorts.best()) {
        if long.price < short.price {
            break;
        }
        let executed = long.quantity.min(short.quantity);
        let Some((long_price, long_fills)) = orderbook.longs.fill_best(executed) else {
            break;
        };
        let Some((short_price, short_fills)) = orderbook.shorts.fill_best(executed) else {
            break;
        };
        let price = (long_price + short_price) / Decimal::TWO;

        let fill = Fill {
            price_denom: &pair.price_denom,
            asset_denom: &pair.asset_denom,
            quantity: Decimal::ZERO,
            execution_price: price,
            block,
        };
        settle_from_book(&fill, (long_price, &long_fills), (short_price, &short_fills), &mut outcome.settlements);
        outcome.record_execution(price, executed);

        tracing::debug!(
            pair = %pair,
            bid = %long_price,
            ask = %short_price,
            price = %price,
            qty = %executed,
            "Limit levels crossed"
        );
    }

    for settlement in &outcome.settlements {
        if let Some(&idx) = incoming.get(&settlement.order_id) {
            let order = &mut orders[idx];
            if order.direction == settlement.direction {
                order.remaining_quantity -= settlement.quantity;
            }
        }
    }
    outcome
}

/// Pair up the allocation pieces consumed from both sides, producing one
/// long and one short settlement per overlapping piece.
fn settle_from_book(
    fill: &Fill<'_>,
    (long_price, long_fills): (Decimal, &[Allocation]),
    (short_price, short_fills): (Decimal, &[Allocation]),
    out: &mut Vec<SettlementEntry>,
) {
    let mut long_left: Vec<Decimal> = long_fills.iter().map(|a| a.quantity).collect();
    let mut short_left: Vec<Decimal> = short_fills.iter().map(|a| a.quantity).collect();
    let (mut i, mut j) = (0, 0);
    while i < long_fills.len() && j < short_fills.len() {
        let quantity = long_left[i].min(short_left[j]);
        let long = FillParty {
            order_id: long_fills[i].order_id,
            account: &long_fills[i].account,
            direction: PositionDirection::Long,
            order_type: OrderType::Limit,
            expected_price: long_price,
        };
        let short = FillParty {
            order_id: short_fills[j].order_id,
            account: &short_fills[j].account,
            direction: PositionDirection::Short,
            order_type: OrderType::Limit,
            expected_price: short_price,
        };
        out.extend(settlement_pair(&Fill { quantity, ..*fill }, &long, &short));

        long_left[i] -= quantity;
        short_left[j] -= quantity;
        if long_left[i].is_zero() {
            i += 1;
        }
        if short_left[j].is_zero() {
            j += 1;
        }
    }
}
