//! Key-space layout of the DEX module's rows in the ledger store.
//!
//! The layout is a fixed table handed to the store adapter at construction
//! rather than global prefix constants, so tests and alternative deployments
//! can relocate the module without touching the keeper.
//!
//! Pair-scoped keys have the shape
//! `prefix | contract | 0x00 | price_denom '|' asset_denom | 0x00 | suffix`,
//! which makes `prefix | contract | 0x00 | pair | 0x00` a prefix that covers
//! exactly one pair's rows.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{ContractAddress, Pair, PositionDirection, constants};

const SEPARATOR: u8 = 0x00;

/// One-byte prefixes for every row family this engine reads or writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyLayout {
    pub long_book_prefix: u8,
    pub short_book_prefix: u8,
    pub price_state_prefix: u8,
    pub match_result_prefix: u8,
}

impl Default for KeyLayout {
    fn default() -> Self {
        Self {
            long_book_prefix: constants::LONG_BOOK_PREFIX,
            short_book_prefix: constants::SHORT_BOOK_PREFIX,
            price_state_prefix: constants::PRICE_STATE_PREFIX,
            match_result_prefix: constants::MATCH_RESULT_PREFIX,
        }
    }
}

impl KeyLayout {
    fn book_prefix(&self, direction: PositionDirection) -> u8 {
        match direction {
            PositionDirection::Long => self.long_book_prefix,
            PositionDirection::Short => self.short_book_prefix,
        }
    }

    fn pair_scoped(prefix: u8, contract: &ContractAddress, pair: &Pair) -> Vec<u8> {
        let pair_str = pair.pair_string();
        let mut key = Vec::with_capacity(3 + contract.as_str().len() + pair_str.as_str().len());
        key.push(prefix);
        key.extend_from_slice(contract.as_str().as_bytes());
        key.push(SEPARATOR);
        key.extend_from_slice(pair_str.as_str().as_bytes());
        key.push(SEPARATOR);
        key
    }

    /// Prefix covering every level of one side of one pair.
    #[must_use]
    pub fn book_pair_prefix(&self, direction: PositionDirection, contract: &ContractAddress, pair: &Pair) -> Vec<u8> {
        Self::pair_scoped(self.book_prefix(direction), contract, pair)
    }

    /// Row key of the level at `price`.
    #[must_use]
    pub fn book_key(
        &self,
        direction: PositionDirection,
        contract: &ContractAddress,
        pair: &Pair,
        price: Decimal,
    ) -> Vec<u8> {
        let mut key = self.book_pair_prefix(direction, contract, pair);
        key.extend_from_slice(price_key(price).as_bytes());
        key
    }

    /// Prefix covering every price snapshot of one pair.
    #[must_use]
    pub fn price_state_pair_prefix(&self, contract: &ContractAddress, pair: &Pair) -> Vec<u8> {
        Self::pair_scoped(self.price_state_prefix, contract, pair)
    }

    /// Snapshot key; big-endian height keeps snapshots in block order.
    #[must_use]
    pub fn price_state_key(&self, contract: &ContractAddress, pair: &Pair, height: u64) -> Vec<u8> {
        let mut key = self.price_state_pair_prefix(contract, pair);
        key.extend_from_slice(&height.to_be_bytes());
        key
    }

    #[must_use]
    pub fn match_result_key(&self, contract: &ContractAddress) -> Vec<u8> {
        let mut key = Vec::with_capacity(1 + contract.as_str().len());
        key.push(self.match_result_prefix);
        key.extend_from_slice(contract.as_str().as_bytes());
        key
    }

    /// Every key range a single pair's execution may touch.
    #[must_use]
    pub fn pair_whitelist(&self, contract: &ContractAddress, pair: &Pair) -> Vec<Vec<u8>> {
        vec![
            self.book_pair_prefix(PositionDirection::Long, contract, pair),
            self.book_pair_prefix(PositionDirection::Short, contract, pair),
            self.price_state_pair_prefix(contract, pair),
        ]
    }
}

/// Canonical textual price: `100`, `100.0` and `100.00` share one row.
#[must_use]
pub fn price_key(price: Decimal) -> String {
    price.normalize().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contract() -> ContractAddress {
        ContractAddress::new("sei1contract")
    }

    #[test]
    fn price_key_is_normalized() {
        assert_eq!(price_key(Decimal::new(10_000, 2)), "100");
        assert_eq!(price_key(Decimal::new(1_050, 1)), "105");
        assert_eq!(price_key(Decimal::new(105, 1)), "10.5");
    }

    #[test]
    fn book_key_lives_under_pair_prefix() {
        let layout = KeyLayout::default();
        let pair = Pair::new("USDC", "ATOM");
        let prefix = layout.book_pair_prefix(PositionDirection::Long, &contract(), &pair);
        let key = layout.book_key(PositionDirection::Long, &contract(), &pair, Decimal::new(100, 0));
        assert!(key.starts_with(&prefix));
        assert!(key.ends_with(b"100"));
    }

    #[test]
    fn sides_do_not_overlap() {
        let layout = KeyLayout::default();
        let pair = Pair::new("USDC", "ATOM");
        let long = layout.book_pair_prefix(PositionDirection::Long, &contract(), &pair);
        let short = layout.book_pair_prefix(PositionDirection::Short, &contract(), &pair);
        assert_ne!(long[0], short[0]);
    }

    #[test]
    fn pair_prefixes_do_not_cover_each_other() {
        let layout = KeyLayout::default();
        let atom = layout.book_pair_prefix(PositionDirection::Long, &contract(), &Pair::new("USDC", "ATOM"));
        let atom2 = layout.book_pair_prefix(PositionDirection::Long, &contract(), &Pair::new("USDC", "ATOM2"));
        assert!(!atom2.starts_with(&atom));
        assert!(!atom.starts_with(&atom2));
    }

    #[test]
    fn whitelist_excludes_match_result() {
        let layout = KeyLayout::default();
        let pair = Pair::new("USDC", "ATOM");
        let whitelist = layout.pair_whitelist(&contract(), &pair);
        let result_key = layout.match_result_key(&contract());
        assert_eq!(whitelist.len(), 3);
        assert!(whitelist.iter().all(|p| !result_key.starts_with(p)));
    }

    #[test]
    fn price_state_keys_sort_by_height() {
        let layout = KeyLayout::default();
        let pair = Pair::new("USDC", "ATOM");
        let k1 = layout.price_state_key(&contract(), &pair, 9);
        let k2 = layout.price_state_key(&contract(), &pair, 10);
        assert!(k1 < k2);
    }
}
