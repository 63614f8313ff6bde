//! Parallel per-pair execution with failure isolation.
//!
//! Every registered pair runs as its own blocking task in a
//! [`JoinSet`]. A task owns a deep copy of its pair's book, its pair's block
//! orders and cancels, and a [`PairContext`] whose writes are buffered in a
//! private cache. Errors and panics are collected per pair; siblings always
//! run to completion.
//!
//! Only when every pair succeeded are the caches merged, in pair-string
//! order, into a block cache together with the contract's [`MatchResult`].
//! The block cache reaches the parent store as a single batch; the events
//! are replayed after it landed. A pair fault or a rejected batch leaves the
//! parent store, the parent event log and the block's [`MemState`] exactly
//! as they were.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use dexmatch_keeper::{BlockPairState, CacheStore, DexKeeper, Event, MemState};
use dexmatch_matchcore::OrderBook;
use dexmatch_types::{
    Cancellation, ContractAddress, DexError, MatchResult, Pair, PairString, Result, SettlementEntry,
};
use tokio::task::{Id, JoinError, JoinSet};

use crate::context::{BlockContext, PairContext};
use crate::pair::{PairOutcome, run_pair};

fn panic_reason(err: JoinError) -> String {
    if !err.is_panic() {
        return err.to_string();
    }
    let payload = err.into_panic();
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Run one blocking job per key and wait for all of them.
///
/// Returns the successful results keyed (and therefore ordered) by key, and
/// every failure. A panicking job is reported as [`DexError::PairPanicked`].
pub async fn run_isolated<T, F>(jobs: Vec<(PairString, F)>) -> (BTreeMap<PairString, T>, Vec<(PairString, DexError)>)
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    let mut set = JoinSet::new();
    let mut keys: HashMap<Id, PairString> = HashMap::new();
    for (key, job) in jobs {
        let handle = set.spawn_blocking(job);
        keys.insert(handle.id(), key);
    }

    let mut done = BTreeMap::new();
    let mut faults = Vec::new();
    while let Some(joined) = set.join_next_with_id().await {
        match joined {
            Ok((id, Ok(value))) => {
                if let Some(key) = keys.remove(&id) {
                    done.insert(key, value);
                }
            }
            Ok((id, Err(err))) => {
                if let Some(key) = keys.remove(&id) {
                    faults.push((key, err));
                }
            }
            Err(err) => {
                let Some(key) = keys.remove(&err.id()) else {
                    continue;
                };
                let reason = panic_reason(err);
                faults.push((key.clone(), DexError::PairPanicked { pair: key, reason }));
            }
        }
    }
    faults.sort_by(|a, b| a.0.cmp(&b.0));
    (done, faults)
}

struct FinishedPair {
    ctx: PairContext,
    state: BlockPairState,
    outcome: PairOutcome,
}

#[derive(Default)]
struct MergedBlock {
    events: Vec<Event>,
    states: Vec<(PairString, BlockPairState)>,
    settlements: Vec<SettlementEntry>,
    cancellations: Vec<Cancellation>,
}

/// Fold every pair's writes and the contract's [`MatchResult`] into the
/// block cache, in pair-string order, then hand the whole block to the
/// parent store as one batch.
fn commit_block(
    height: u64,
    contract: &ContractAddress,
    block_keeper: &DexKeeper,
    block_cache: &CacheStore,
    finished: BTreeMap<PairString, FinishedPair>,
) -> Result<MergedBlock> {
    let mut merged = MergedBlock::default();
    let mut orders = Vec::new();
    for (pair_str, done) in finished {
        let writes = done.ctx.commit()?;
        tracing::debug!(contract = %contract, pair = %pair_str, writes, "Pair writes merged");
        merged.events.extend(done.ctx.events.into_events());
        orders.extend(done.outcome.orders);
        merged.cancellations.extend(done.outcome.cancellations);
        merged.settlements.extend(done.outcome.settlements);
        merged.states.push((pair_str, done.state));
    }

    block_keeper.set_match_result(&MatchResult::new(
        height,
        contract.clone(),
        orders,
        merged.cancellations.clone(),
        merged.settlements.clone(),
    ))?;
    let writes = block_cache.commit()?;
    tracing::debug!(contract = %contract, height, writes, "Block writes committed");
    Ok(merged)
}

/// Execute every pair of `contract` concurrently and merge the results.
///
/// A pair listed more than once runs once. Returns the block's settlements
/// and cancellations (user requests plus voided market remainders), both in
/// pair-string order.
pub async fn execute_pairs_in_parallel(
    ctx: &mut BlockContext,
    contract: &ContractAddress,
    keeper: &DexKeeper,
    pairs: &[Pair],
    orderbooks: &BTreeMap<PairString, OrderBook>,
    mem_state: &mut MemState,
) -> Result<(Vec<SettlementEntry>, Vec<Cancellation>)> {
    let block_cache = Arc::new(CacheStore::new(Arc::clone(keeper.store())));
    let block_keeper = keeper.with_store(block_cache.clone());
    let mut originals: BTreeMap<PairString, BlockPairState> = BTreeMap::new();
    let mut jobs = Vec::with_capacity(pairs.len());

    for pair in pairs {
        let pair_str = pair.pair_string();
        if originals.contains_key(&pair_str) {
            tracing::warn!(contract = %contract, pair = %pair_str, "Duplicate pair skipped");
            continue;
        }
        let state = mem_state.take_pair(contract, &pair_str);
        originals.insert(pair_str.clone(), state.clone());

        let orderbook = orderbooks.get(&pair_str).cloned();
        let mut pair_ctx = PairContext::derive(ctx.block, &block_keeper, contract, pair);
        let missing = pair_str.clone();
        let mut state = state;
        jobs.push((pair_str, move || -> Result<FinishedPair> {
            let orderbook = orderbook.ok_or(DexError::OrderbookNotFound(missing))?;
            let outcome = run_pair(&mut pair_ctx, &mut state, orderbook)?;
            Ok(FinishedPair {
                ctx: pair_ctx,
                state,
                outcome,
            })
        }));
    }
    let pair_count = originals.len();

    let (finished, faults) = run_isolated(jobs).await;

    if !faults.is_empty() {
        for (pair, err) in &faults {
            tracing::error!(contract = %contract, pair = %pair, error = %err, "Pair execution failed");
        }
        restore(mem_state, contract, originals);
        return Err(DexError::PairExecutionFailed {
            contract: contract.clone(),
            pairs: faults.into_iter().map(|(pair, _)| pair).collect(),
        });
    }

    let merged = match commit_block(ctx.block.height, contract, &block_keeper, &block_cache, finished) {
        Ok(merged) => merged,
        Err(err) => {
            tracing::error!(contract = %contract, error = %err, "Block commit failed");
            restore(mem_state, contract, originals);
            return Err(err);
        }
    };

    ctx.events.emit_events(merged.events);
    for (pair_str, state) in merged.states {
        mem_state.put_pair(contract, &pair_str, state);
    }

    tracing::info!(
        contract = %contract,
        height = ctx.block.height,
        pairs = pair_count,
        settlements = merged.settlements.len(),
        cancellations = merged.cancellations.len(),
        "Pairs executed"
    );
    Ok((merged.settlements, merged.cancellations))
}

fn restore(mem_state: &mut MemState, contract: &ContractAddress, originals: BTreeMap<PairString, BlockPairState>) {
    for (pair_str, state) in originals {
        mem_state.put_pair(contract, &pair_str, state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> PairString {
        PairString(s.to_string())
    }

    #[tokio::test]
    async fn isolated_jobs_report_each_outcome() {
        let jobs: Vec<(PairString, Box<dyn FnOnce() -> Result<u32> + Send>)> = vec![
            (key("b"), Box::new(|| Ok(2))),
            (key("a"), Box::new(|| Ok(1))),
            (key("c"), Box::new(|| Err(DexError::Internal("boom".into())))),
        ];
        let (done, faults) = run_isolated(jobs).await;
        assert_eq!(done.into_iter().collect::<Vec<_>>(), vec![(key("a"), 1), (key("b"), 2)]);
        assert_eq!(faults.len(), 1);
        assert_eq!(faults[0].0, key("c"));
    }

    #[tokio::test]
    async fn panic_is_captured_and_siblings_finish() {
        let jobs: Vec<(PairString, Box<dyn FnOnce() -> Result<u32> + Send>)> = vec![
            (key("ok"), Box::new(|| Ok(7))),
            (key("bad"), Box::new(|| -> Result<u32> { panic!("matching invariant broken") })),
        ];
        let (done, faults) = run_isolated(jobs).await;
        assert_eq!(done.get(&key("ok")), Some(&7));
        match &faults[..] {
            [(pair, DexError::PairPanicked { reason, .. })] => {
                assert_eq!(pair, &key("bad"));
                assert!(reason.contains("matching invariant broken"));
            }
            other => panic!("unexpected faults: {other:?}"),
        }
    }
}
