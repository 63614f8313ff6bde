//! # dexmatch-types
//!
//! Shared types, errors, and configuration for the **dexmatch** engine.
//!
//! This crate is the leaf dependency of the workspace. Every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`OrderId`], [`ContractAddress`], [`Pair`], [`PairString`], [`Account`]
//! - **Order model**: [`Order`], [`PositionDirection`], [`OrderType`], [`OrderStatus`], [`Cancellation`]
//! - **Orderbook rows**: [`OrderBookEntry`], [`Allocation`], [`BookEntry`]
//! - **Settlement model**: [`SettlementEntry`]
//! - **Results**: [`MatchResult`], [`PriceSnapshot`], [`ContractOrderResult`]
//! - **Block metadata**: [`BlockInfo`]
//! - **Configuration**: [`EngineConfig`], [`KeyLayout`]
//! - **Errors**: [`DexError`] with `DEX_ERR_` prefix codes
//! - **Constants**: store prefixes and defaults

pub mod block;
pub mod book;
pub mod config;
pub mod constants;
pub mod error;
pub mod ids;
pub mod keys;
pub mod match_result;
pub mod order;
pub mod settlement;

// Re-export all primary types at crate root for ergonomic imports:
//   use dexmatch_types::{Order, PositionDirection, SettlementEntry, ...};

pub use block::*;
pub use book::*;
pub use config::*;
pub use error::*;
pub use ids::*;
pub use keys::*;
pub use match_result::*;
pub use order::*;
pub use settlement::*;

// Constants are accessed via `dexmatch_types::constants::FOO`
// (not re-exported to avoid name collisions).
