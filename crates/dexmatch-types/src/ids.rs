//! Identifiers used throughout the DEX matching pipeline.
//!
//! Order ids are chain-assigned `u64` counters; contracts and accounts are
//! bech32-style address strings that this crate treats as opaque.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// OrderId
// ---------------------------------------------------------------------------

/// Chain-assigned order identifier, unique within a contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct OrderId(pub u64);

impl OrderId {
    #[must_use]
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl From<u64> for OrderId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// ContractAddress
// ---------------------------------------------------------------------------

/// Address of the exchange contract that owns a set of pairs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct ContractAddress(pub String);

impl ContractAddress {
    #[must_use]
    pub fn new(addr: impl Into<String>) -> Self {
        Self(addr.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContractAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Account that placed an order or receives a settlement.
pub type Account = String;

// ---------------------------------------------------------------------------
// Pair
// ---------------------------------------------------------------------------

/// A tradable asset / price-denom combination registered under a contract.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct Pair {
    pub price_denom: String,
    pub asset_denom: String,
}

impl Pair {
    #[must_use]
    pub fn new(price_denom: impl Into<String>, asset_denom: impl Into<String>) -> Self {
        Self {
            price_denom: price_denom.into(),
            asset_denom: asset_denom.into(),
        }
    }

    /// Canonical string form used to key per-pair state.
    #[must_use]
    pub fn pair_string(&self) -> PairString {
        PairString(format!("{}|{}", self.price_denom, self.asset_denom))
    }
}

impl fmt::Display for Pair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.asset_denom, self.price_denom)
    }
}

/// `price_denom|asset_denom`, the map key for per-pair block state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct PairString(pub String);

impl PairString {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&Pair> for PairString {
    fn from(pair: &Pair) -> Self {
        pair.pair_string()
    }
}

impl fmt::Display for PairString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
