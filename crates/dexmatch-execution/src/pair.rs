//! Execution of a single trading pair for one block.
//!
//! Stage order is fixed: admission checks, cancellations, market orders (buys against the
//! short side, then sells against the long side), limit orders. The merged
//! outcome is recorded as the pair's price snapshot and the book's dirty
//! levels are flushed through the pair context.

use dexmatch_keeper::{BlockPairState, Event};
use dexmatch_matchcore::{
    ExecutionOutcome, OrderBook, cancel_orders, match_limit_orders, match_market_orders, reject_invalid_orders,
};
use dexmatch_types::{Cancellation, Order, PositionDirection, PriceSnapshot, Result, SettlementEntry};

use crate::aggregate::{get_match_results, get_order_id_to_settled_quantities, prepare_cancel_unfulfilled_market_orders};
use crate::context::PairContext;

/// Everything a finished pair hands back to the scheduler.
#[derive(Debug, Clone)]
pub struct PairOutcome {
    pub settlements: Vec<SettlementEntry>,
    pub orders: Vec<Order>,
    pub cancellations: Vec<Cancellation>,
}

/// Apply the pair's block cancellations to its book and block orders.
pub fn cancel_for_pair(ctx: &mut PairContext, state: &mut BlockPairState, orderbook: &mut OrderBook) -> Vec<Cancellation> {
    let applied = cancel_orders(&state.cancels, orderbook, &mut state.orders);
    let pair = ctx.pair_string();
    for cancel in &applied {
        ctx.events.emit(
            Event::new("cancel_order")
                .attr("contract", &ctx.contract)
                .attr("pair", &pair)
                .attr("order_id", cancel.id),
        );
    }
    applied
}

pub fn match_market_order_for_pair(ctx: &PairContext, state: &mut BlockPairState, orderbook: &mut OrderBook) -> ExecutionOutcome {
    let buys = match_market_orders(&mut state.orders, &mut orderbook.shorts, PositionDirection::Long, ctx.block);
    let sells = match_market_orders(&mut state.orders, &mut orderbook.longs, PositionDirection::Short, ctx.block);
    buys.merge(sells)
}

pub fn match_limit_order_for_pair(ctx: &PairContext, state: &mut BlockPairState, orderbook: &mut OrderBook) -> ExecutionOutcome {
    match_limit_orders(&mut state.orders, orderbook, ctx.block)
}

/// Store the block's price statistics for the pair, if anything executed.
pub fn set_price_state_from_outcome(ctx: &PairContext, outcome: &ExecutionOutcome) -> Result<Option<PriceSnapshot>> {
    let (Some(average_price), Some(min_price), Some(max_price)) =
        (outcome.average_price(), outcome.min_price, outcome.max_price)
    else {
        return Ok(None);
    };
    let snapshot = PriceSnapshot {
        height: ctx.block.height,
        timestamp: ctx.block.timestamp_secs(),
        pair: ctx.pair.clone(),
        average_price,
        min_price,
        max_price,
        volume: outcome.total_quantity,
    };
    ctx.keeper.set_price_snapshot(&ctx.contract, &snapshot)?;
    Ok(Some(snapshot))
}

/// Reject malformed orders, run cancel, market and limit matching, record
/// prices and flush the book. Returns the pair's settlements.
pub fn execute_pair(ctx: &mut PairContext, state: &mut BlockPairState, orderbook: &mut OrderBook) -> Result<Vec<SettlementEntry>> {
    reject_invalid_orders(&ctx.pair, &mut state.orders);
    cancel_for_pair(ctx, state, orderbook);
    let market = match_market_order_for_pair(ctx, state, orderbook);
    let limit = match_limit_order_for_pair(ctx, state, orderbook);
    let outcome = market.merge(limit);

    set_price_state_from_outcome(ctx, &outcome)?;
    ctx.keeper.flush_orderbook(&ctx.contract, orderbook)?;

    if outcome.has_executions() {
        let pair = ctx.pair_string();
        ctx.events.emit(
            Event::new("match_pair")
                .attr("contract", &ctx.contract)
                .attr("pair", pair)
                .attr("settlements", outcome.settlements.len())
                .attr("volume", outcome.total_quantity),
        );
    }
    Ok(outcome.settlements)
}

/// The full per-pair pipeline run inside a scheduler task: execution, then
/// voiding of unfilled market orders, then result collection.
pub fn run_pair(ctx: &mut PairContext, state: &mut BlockPairState, mut orderbook: OrderBook) -> Result<PairOutcome> {
    let settlements = execute_pair(ctx, state, &mut orderbook)?;
    let settled = get_order_id_to_settled_quantities(&settlements);
    prepare_cancel_unfulfilled_market_orders(&ctx.contract, state, &settled);
    let (orders, cancellations) = get_match_results(state);

    tracing::debug!(
        contract = %ctx.contract,
        pair = %ctx.pair,
        settlements = settlements.len(),
        orders = orders.len(),
        cancellations = cancellations.len(),
        "Pair executed"
    );
    Ok(PairOutcome {
        settlements,
        orders,
        cancellations,
    })
}
