//! # dexmatch-matchcore
//!
//! **Pure deterministic matching for one trading pair.**
//!
//! MatchCore takes a pair's cached orderbook plus the block's orders and
//! cancellations and produces settlements. It has:
//!
//! - **Zero side effects**: no store access, the book is mutated in memory
//!   and dirty levels are reported for the caller to flush
//! - **Deterministic output**: same book and same block input yield the same
//!   settlements on every validator
//! - **Fixed stage order**: admission checks, cancels, then market orders,
//!   then limit orders

pub mod cancel;
pub mod determinism;
pub mod limit;
pub mod market;
pub mod orderbook;
pub mod outcome;
pub mod validate;

pub use cancel::cancel_orders;
pub use determinism::{compute_settlement_root, compute_settlement_set_root, root_hex, verify_settlement_root};
pub use limit::match_limit_orders;
pub use market::match_market_orders;
pub use orderbook::{CachedSortedOrderBookEntries, OrderBook, PendingWrite};
pub use outcome::ExecutionOutcome;
pub use validate::reject_invalid_orders;
