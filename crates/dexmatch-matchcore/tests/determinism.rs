//! Integration test: matching determinism
//!
//! Every validator replays the same block against the same book. The
//! resulting settlements, and the book left behind, must be identical.

use dexmatch_matchcore::*;
use dexmatch_types::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;

fn dec(n: i64) -> Decimal {
    Decimal::new(n, 0)
}

fn random_block(seed: u64, count: u64) -> (OrderBook, Vec<Order>, Vec<Cancellation>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let pair = Pair::new("USDC", "ATOM");
    let mut book = OrderBook::new(pair.clone());
    for id in 1000..1020 {
        let direction = if rng.gen_bool(0.5) { PositionDirection::Long } else { PositionDirection::Short };
        let price = match direction {
            PositionDirection::Long => dec(rng.gen_range(90..100)),
            PositionDirection::Short => dec(rng.gen_range(101..111)),
        };
        book.side_mut(direction)
            .add_order(&pair, price, OrderId(id), &format!("maker{id}"), dec(rng.gen_range(1..10)));
    }
    book.clear_dirty();

    let mut orders = Vec::new();
    for id in 1..=count {
        let direction = if rng.gen_bool(0.5) { PositionDirection::Long } else { PositionDirection::Short };
        let qty = dec(rng.gen_range(1..8));
        let order = if rng.gen_bool(0.3) {
            Order::dummy_market(id, direction, qty)
        } else {
            Order::dummy_limit(id, direction, dec(rng.gen_range(92..109)), qty)
        };
        orders.push(order);
    }

    let cancels = (0..3)
        .map(|_| {
            let id = rng.gen_range(1000..1020);
            let located = [PositionDirection::Long, PositionDirection::Short].into_iter().find_map(|dir| {
                book.side(dir)
                    .levels_ascending()
                    .find(|l| l.contains_order(OrderId(id)))
                    .map(|l| (dir, l.price))
            });
            // an id that never rested turns into a stale cancel
            let (direction, price) = located.unwrap_or((PositionDirection::Long, dec(1)));
            Cancellation::dummy(id, direction, price)
        })
        .collect();
    (book, orders, cancels)
}

/// Cancels, then market (buys then sells), then limit.
fn run_block(mut book: OrderBook, mut orders: Vec<Order>, cancels: &[Cancellation]) -> (OrderBook, Vec<Order>, ExecutionOutcome) {
    let block = BlockInfo::dummy(7);
    cancel_orders(cancels, &mut book, &mut orders);
    let buys = match_market_orders(&mut orders, &mut book.shorts, PositionDirection::Long, block);
    let sells = match_market_orders(&mut orders, &mut book.longs, PositionDirection::Short, block);
    let limits = match_limit_orders(&mut orders, &mut book, block);
    (book, orders, buys.merge(sells).merge(limits))
}

#[test]
fn two_replays_same_result() {
    for seed in 0..20 {
        let (book, orders, cancels) = random_block(seed, 30);
        let (book_a, orders_a, out_a) = run_block(book.clone(), orders.clone(), &cancels);
        let (book_b, orders_b, out_b) = run_block(book, orders, &cancels);

        assert_eq!(
            compute_settlement_root(&out_a.settlements),
            compute_settlement_root(&out_b.settlements),
            "seed {seed}: same input must produce the same settlement root"
        );
        assert_eq!(book_a, book_b);
        assert_eq!(book_a.pending_writes(), book_b.pending_writes());
        assert_eq!(orders_a, orders_b);
    }
}

#[test]
fn settlements_balance_and_book_uncrossed() {
    for seed in 100..120 {
        let (book, orders, cancels) = random_block(seed, 40);
        let (book, orders, out) = run_block(book, orders, &cancels);
        assert!(out.settlements.iter().any(|s| orders.iter().any(|o| o.id == s.order_id)), "seed {seed}: block orders traded");

        let long: Decimal = out
            .settlements
            .iter()
            .filter(|s| s.direction == PositionDirection::Long)
            .map(|s| s.quantity)
            .sum();
        let short: Decimal = out
            .settlements
            .iter()
            .filter(|s| s.direction == PositionDirection::Short)
            .map(|s| s.quantity)
            .sum();
        assert_eq!(long, short, "seed {seed}: both sides of every fill carry the same quantity");
        assert_eq!(long, out.total_quantity);
        assert!(!book.is_crossed(), "seed {seed}: limit matching leaves no crossed book");

        for order in orders.iter().filter(|o| cancels.iter().all(|c| c.id != o.id)) {
            assert!(order.remaining_quantity >= Decimal::ZERO);
            let settled: Decimal = out
                .settlements
                .iter()
                .filter(|s| s.order_id == order.id)
                .map(|s| s.quantity)
                .sum();
            assert_eq!(
                settled,
                order.filled_quantity(),
                "seed {seed}: order {} settlements disagree with its remaining quantity",
                order.id
            );
        }
    }
}

#[test]
fn clone_of_book_is_independent() {
    let (book, orders, cancels) = random_block(42, 30);
    let snapshot = book.clone();
    let _ = run_block(book.clone(), orders, &cancels);
    assert_eq!(book, snapshot, "matching a deep copy never touches the original");
}

#[test]
fn outcome_serializes_settlements() {
    let (book, orders, cancels) = random_block(9, 30);
    let (_, _, out) = run_block(book, orders, &cancels);
    let json = serde_json::to_string(&out.settlements).unwrap();
    let back: Vec<SettlementEntry> = serde_json::from_str(&json).unwrap();
    assert_eq!(compute_settlement_root(&back), compute_settlement_root(&out.settlements));
}
