//! # dexmatch-execution
//!
//! **Block execution plane**: runs every registered pair of a contract for
//! one block and turns the outcome into state, results and metrics.
//!
//! ## Architecture
//!
//! 1. **Hooks**: contract bookkeeping ahead of matching
//! 2. **Scheduler**: one isolated task per pair, all-or-nothing commit
//! 3. **Pair**: cancel → market → limit → price state → flush
//! 4. **Aggregate**: settled quantities, voided market remainders, results
//! 5. **Contract**: per-account placement and execution results
//! 6. **Metrics / Telemetry**: settlement metrics and `tracing` setup
//!
//! ```text
//! hooks → execute_pairs_in_parallel ─┬─ pair A ─┐
//!                                    ├─ pair B ─┼→ commit (pair order) → MatchResult
//!                                    └─ pair C ─┘
//! ```

pub mod aggregate;
pub mod context;
pub mod contract;
pub mod hooks;
pub mod metrics;
pub mod pair;
pub mod scheduler;
pub mod telemetry;

pub use aggregate::{get_match_results, get_order_id_to_settled_quantities, prepare_cancel_unfulfilled_market_orders};
pub use context::{BlockContext, PairContext};
pub use contract::{handle_execution_for_contract, populate_order_execution_results, populate_order_placement_results};
pub use hooks::{PreExecutionHook, call_pre_execution_hooks};
pub use metrics::{InMemoryMetrics, MetricsSink, TracingMetrics, emit_settlement_metrics};
pub use pair::{PairOutcome, execute_pair, run_pair};
pub use scheduler::{execute_pairs_in_parallel, run_isolated};
pub use telemetry::init_tracing;
