//! Error types for the dexmatch engine.
//!
//! All errors use the `DEX_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Order errors
//! - 2xx: Orderbook errors
//! - 3xx: Store errors
//! - 4xx: Execution errors
//! - 9xx: General / internal errors

use thiserror::Error;

use crate::{ContractAddress, OrderId, PairString};

/// Central error enum for all dexmatch operations.
#[derive(Debug, Error)]
pub enum DexError {
    // =================================================================
    // Order Errors (1xx)
    // =================================================================
    /// The order failed validation (bad quantity, wrong pair, etc.).
    #[error("DEX_ERR_100: Invalid order {id}: {reason}")]
    InvalidOrder { id: OrderId, reason: String },

    // =================================================================
    // Orderbook Errors (2xx)
    // =================================================================
    /// A registered pair has no loaded orderbook.
    #[error("DEX_ERR_200: Orderbook not found for {0}")]
    OrderbookNotFound(PairString),

    /// A persisted level could not be decoded.
    #[error("DEX_ERR_201: Corrupt orderbook row: {reason}")]
    CorruptOrderbookEntry { reason: String },

    // =================================================================
    // Store Errors (3xx)
    // =================================================================
    /// The underlying store rejected a write.
    #[error("DEX_ERR_300: Store write failed: {reason}")]
    StoreWrite { reason: String },

    /// The underlying store failed a read.
    #[error("DEX_ERR_301: Store read failed: {reason}")]
    StoreRead { reason: String },

    /// A scoped store view was asked for a key outside its whitelist.
    #[error("DEX_ERR_302: Key outside permitted scope: {key_hex}")]
    KeyOutOfScope { key_hex: String },

    // =================================================================
    // Execution Errors (4xx)
    // =================================================================
    /// One or more pair tasks faulted; the contract's block is void.
    #[error("DEX_ERR_400: Pair execution failed for contract {contract}: {pairs:?}")]
    PairExecutionFailed {
        contract: ContractAddress,
        pairs: Vec<PairString>,
    },

    /// A pre-execution hook returned an error.
    #[error("DEX_ERR_401: Pre-execution hook failed for contract {contract}: {reason}")]
    HookFailed {
        contract: ContractAddress,
        reason: String,
    },

    /// A pair task panicked.
    #[error("DEX_ERR_402: Pair task panicked for {pair}: {reason}")]
    PairPanicked { pair: PairString, reason: String },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("DEX_ERR_900: Internal error: {0}")]
    Internal(String),

    /// Serialization / deserialization error.
    #[error("DEX_ERR_901: Serialization error: {0}")]
    Serialization(String),

    /// Configuration error (invalid config file, missing fields, etc.).
    #[error("DEX_ERR_902: Configuration error: {0}")]
    Configuration(String),

    /// I/O error.
    #[error("DEX_ERR_903: I/O error: {0}")]
    Io(String),
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, DexError>;

impl From<std::io::Error> for DexError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for DexError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
