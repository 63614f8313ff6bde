//! System-wide constants for the dexmatch engine.

/// Store prefix of resting long (bid) levels.
pub const LONG_BOOK_PREFIX: u8 = 0x01;

/// Store prefix of resting short (ask) levels.
pub const SHORT_BOOK_PREFIX: u8 = 0x02;

/// Store prefix of per-pair price snapshots.
pub const PRICE_STATE_PREFIX: u8 = 0x03;

/// Store prefix of per-contract match results.
pub const MATCH_RESULT_PREFIX: u8 = 0x04;

/// Default `tracing` filter directive.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Module name used for metric keys.
pub const MODULE_NAME: &str = "dex";

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "dexmatch";
