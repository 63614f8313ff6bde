//! Per-contract block execution and the results reported back to it.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;

use dexmatch_keeper::{DexKeeper, MemState};
use dexmatch_matchcore::OrderBook;
use dexmatch_types::{
    Cancellation, ContractAddress, ContractOrderResult, ContractOrderResults, Order, OrderExecutionResult,
    OrderId, OrderPlacementResult, OrderStatus, Pair, PairString, Result, SettlementEntry,
};

use crate::context::BlockContext;
use crate::hooks::{PreExecutionHook, call_pre_execution_hooks};
use crate::metrics::emit_settlement_metrics;
use crate::scheduler::execute_pairs_in_parallel;

/// Record a placement result for each order, under its owner's account.
/// Orders named by a cancellation are reported [`OrderStatus::Cancelled`].
pub fn populate_order_placement_results(
    contract: &ContractAddress,
    orders: &[&Order],
    cancellations: &[Cancellation],
    results: &mut ContractOrderResults,
) {
    let cancelled: BTreeSet<OrderId> = cancellations.iter().map(|c| c.id).collect();
    for order in orders {
        let status = if cancelled.contains(&order.id) {
            OrderStatus::Cancelled
        } else {
            order.status
        };
        results
            .entry(order.account.clone())
            .or_insert_with(|| ContractOrderResult::new(contract.clone()))
            .order_placement_results
            .push(OrderPlacementResult {
                order_id: order.id,
                status,
                status_description: order.status_description.clone(),
            });
    }
}

/// Record one execution result per settlement entry, under its account.
pub fn populate_order_execution_results(
    contract: &ContractAddress,
    settlements: &[SettlementEntry],
    results: &mut ContractOrderResults,
) {
    for s in settlements {
        results
            .entry(s.account.clone())
            .or_insert_with(|| ContractOrderResult::new(contract.clone()))
            .order_execution_results
            .push(OrderExecutionResult {
                order_id: s.order_id,
                execution_price: s.execution_price,
                quantity: s.quantity,
                direction: s.direction,
                order_type: s.order_type,
            });
    }
}

/// Run one contract's block: hooks, parallel pair execution, metrics, and
/// the per-account results handed back to the contract.
///
/// A hook failure returns before any pair is matched. A pair failure
/// returns [`DexError::PairExecutionFailed`](dexmatch_types::DexError) with
/// nothing committed.
pub async fn handle_execution_for_contract(
    ctx: &mut BlockContext,
    contract: &ContractAddress,
    keeper: &DexKeeper,
    pairs: &[Pair],
    orderbooks: &BTreeMap<PairString, OrderBook>,
    mem_state: &mut MemState,
    hooks: &[Box<dyn PreExecutionHook>],
) -> Result<(ContractOrderResults, Vec<SettlementEntry>)> {
    let started = Instant::now();

    call_pre_execution_hooks(hooks, contract, pairs, mem_state)?;

    let (settlements, cancellations) =
        execute_pairs_in_parallel(ctx, contract, keeper, pairs, orderbooks, mem_state).await?;

    if ctx.config.emit_metrics {
        emit_settlement_metrics(&settlements, ctx.metrics.as_ref());
    }

    let mut results = ContractOrderResults::new();
    let orders: Vec<&Order> = mem_state.all_block_orders(contract).collect();
    populate_order_placement_results(contract, &orders, &cancellations, &mut results);
    populate_order_execution_results(contract, &settlements, &mut results);

    let elapsed = started.elapsed();
    if ctx.config.emit_metrics {
        #[allow(clippy::cast_precision_loss)]
        ctx.metrics
            .set_gauge("handle_execution_for_contract_ms", elapsed.as_millis() as f64);
    }
    tracing::info!(
        contract = %contract,
        height = ctx.block.height,
        accounts = results.len(),
        settlements = settlements.len(),
        elapsed_ms = elapsed.as_millis(),
        "Contract executed"
    );
    Ok((results, settlements))
}

#[cfg(test)]
mod tests {
    use dexmatch_types::*;
    use rust_decimal::Decimal;

    use super::*;

    fn dec(n: i64) -> Decimal {
        Decimal::new(n, 0)
    }

    #[test]
    fn placement_results_mark_cancelled_ids() {
        let contract = ContractAddress::new("sei1contract");
        let a = Order::dummy_limit(1, PositionDirection::Long, dec(100), dec(1));
        let b = Order::dummy_market(2, PositionDirection::Long, dec(1));
        let cancels = vec![Cancellation::dummy(2, PositionDirection::Long, Decimal::ZERO)];
        let mut results = ContractOrderResults::new();
        populate_order_placement_results(&contract, &[&a, &b], &cancels, &mut results);

        assert_eq!(results["acct1"].order_placement_results[0].status, OrderStatus::Placed);
        assert_eq!(results["acct2"].order_placement_results[0].status, OrderStatus::Cancelled);
    }

    #[test]
    fn execution_results_grouped_by_account() {
        let contract = ContractAddress::new("sei1contract");
        let fill = Fill {
            price_denom: "USDC",
            asset_denom: "ATOM",
            quantity: dec(3),
            execution_price: dec(100),
            block: BlockInfo::dummy(1),
        };
        let party = |id, account| FillParty {
            order_id: OrderId(id),
            account,
            direction: PositionDirection::Long,
            order_type: OrderType::Limit,
            expected_price: dec(100),
        };
        let mut settlements = settlement_pair(&fill, &party(1, "alice"), &party(2, "bob")).to_vec();
        settlements.extend(settlement_pair(&fill, &party(3, "alice"), &party(4, "carol")));

        let mut results = ContractOrderResults::new();
        populate_order_execution_results(&contract, &settlements, &mut results);
        assert_eq!(results.len(), 3);
        assert_eq!(results["alice"].order_execution_results.len(), 2);
        assert_eq!(results["bob"].order_execution_results[0].quantity, dec(3));
        assert!(results["bob"].order_placement_results.is_empty());
    }
}
