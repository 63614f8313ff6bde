//! Admission checks on a block's incoming orders.

use dexmatch_types::{Order, OrderId, OrderStatus, Pair};

/// Mark every malformed live order of `pair` as [`OrderStatus::FailedToPlace`].
///
/// Rejected orders keep their quantities, carry the reason in
/// `status_description` and are skipped by every later stage. The pair
/// itself carries on. Returns the rejected ids in block order.
pub fn reject_invalid_orders(pair: &Pair, orders: &mut [Order]) -> Vec<OrderId> {
    let mut rejected = Vec::new();
    for order in orders.iter_mut().filter(|o| o.status == OrderStatus::Placed) {
        if let Err(err) = order.validate(pair) {
            tracing::warn!(pair = %pair, order = %order.id, error = %err, "Order rejected");
            order.status = OrderStatus::FailedToPlace;
            order.status_description = err.to_string();
            rejected.push(order.id);
        }
    }
    rejected
}

#[cfg(test)]
mod tests {
    use dexmatch_types::*;
    use rust_decimal::Decimal;

    use super::*;
    use crate::{OrderBook, match_limit_orders};

    fn dec(n: i64) -> Decimal {
        Decimal::new(n, 0)
    }

    #[test]
    fn negative_limit_prices_never_match() {
        let pair = Pair::new("USDC", "ATOM");
        let mut book = OrderBook::new(pair.clone());
        let mut orders = vec![
            Order::dummy_limit(1, PositionDirection::Long, dec(-5), dec(1)),
            Order::dummy_limit(2, PositionDirection::Short, dec(-10), dec(1)),
            Order::dummy_limit(3, PositionDirection::Long, dec(100), dec(1)),
        ];

        let rejected = reject_invalid_orders(&pair, &mut orders);
        assert_eq!(rejected, vec![OrderId(1), OrderId(2)]);
        assert_eq!(orders[0].status, OrderStatus::FailedToPlace);
        assert!(orders[0].status_description.contains("DEX_ERR_100"));
        assert_eq!(orders[2].status, OrderStatus::Placed);

        let out = match_limit_orders(&mut orders, &mut book, BlockInfo::dummy(1));
        assert!(out.settlements.is_empty());
        assert_eq!(book.best_bid(), Some(dec(100)));
        assert!(book.best_ask().is_none(), "rejected short never rests");
    }

    #[test]
    fn orders_of_another_pair_are_rejected() {
        let pair = Pair::new("USDC", "ATOM");
        let mut orders = vec![
            Order::dummy_market(1, PositionDirection::Long, dec(1)).for_pair(&Pair::new("USDC", "OSMO")),
            Order::dummy_market(2, PositionDirection::Long, dec(0)),
        ];
        assert_eq!(reject_invalid_orders(&pair, &mut orders), vec![OrderId(1), OrderId(2)]);
        assert!(orders.iter().all(|o| !o.is_live()));
    }

    #[test]
    fn already_failed_orders_untouched() {
        let pair = Pair::new("USDC", "ATOM");
        let mut order = Order::dummy_limit(1, PositionDirection::Long, dec(0), dec(1));
        order.status = OrderStatus::FailedToPlace;
        order.status_description = "rejected by contract".into();
        let mut orders = vec![order];
        assert!(reject_invalid_orders(&pair, &mut orders).is_empty());
        assert_eq!(orders[0].status_description, "rejected by contract");
    }
}
