//! Settlement root hashing for cross-node consistency checks.
//!
//! Every validator running the same block must produce the same
//! settlements. The settlement root is a SHA-256 digest over them that lets
//! nodes (and tests) compare results without diffing full payloads.

use dexmatch_types::SettlementEntry;
use sha2::{Digest, Sha256};

fn hash_entry(hasher: &mut Sha256, entry: &SettlementEntry) {
    hasher.update(entry.order_id.0.to_le_bytes());
    hasher.update(entry.counterparty_order_id.0.to_le_bytes());
    hasher.update(entry.account.as_bytes());
    hasher.update([0u8]);
    hasher.update(entry.price_denom.as_bytes());
    hasher.update([0u8]);
    hasher.update(entry.asset_denom.as_bytes());
    hasher.update([0u8]);
    hasher.update(entry.direction.to_string().as_bytes());
    hasher.update(entry.order_type.to_string().as_bytes());
    hasher.update(entry.quantity.normalize().to_string().as_bytes());
    hasher.update([0u8]);
    hasher.update(entry.execution_price.normalize().to_string().as_bytes());
    hasher.update([0u8]);
    hasher.update(entry.expected_price.normalize().to_string().as_bytes());
    hasher.update(entry.height.to_le_bytes());
    hasher.update(entry.timestamp.to_le_bytes());
}

fn finish(hasher: Sha256) -> [u8; 32] {
    let result = hasher.finalize();
    let mut root = [0u8; 32];
    root.copy_from_slice(&result);
    root
}

/// Hash settlements in the order given.
///
/// Within one pair the order of settlements is part of the result, so this
/// is the root to compare for a single pair's matching output.
#[must_use]
pub fn compute_settlement_root(settlements: &[SettlementEntry]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(b"dexmatch:settlement_root:v1:");
    hasher.update((settlements.len() as u64).to_le_bytes());
    for entry in settlements {
        hash_entry(&mut hasher, entry);
    }
    finish(hasher)
}

/// Hash settlements as a multiset: the input is sorted canonically first.
///
/// Use this to compare whole-contract results where pairs may have been
/// processed in any order.
#[must_use]
pub fn compute_settlement_set_root(settlements: &[SettlementEntry]) -> [u8; 32] {
    let mut sorted: Vec<&SettlementEntry> = settlements.iter().collect();
    sorted.sort_by(|a, b| {
        (&a.price_denom, &a.asset_denom, a.order_id, a.counterparty_order_id, a.direction.to_string())
            .cmp(&(&b.price_denom, &b.asset_denom, b.order_id, b.counterparty_order_id, b.direction.to_string()))
            .then(a.execution_price.cmp(&b.execution_price))
            .then(a.quantity.cmp(&b.quantity))
    });

    let mut hasher = Sha256::new();
    hasher.update(b"dexmatch:settlement_set_root:v1:");
    hasher.update((sorted.len() as u64).to_le_bytes());
    for entry in sorted {
        hash_entry(&mut hasher, entry);
    }
    finish(hasher)
}

#[must_use]
pub fn verify_settlement_root(settlements: &[SettlementEntry], expected_root: &[u8; 32]) -> bool {
    compute_settlement_root(settlements) == *expected_root
}

/// Hex form of a root, as it appears in logs.
#[must_use]
pub fn root_hex(root: &[u8; 32]) -> String {
    hex::encode(root)
}

#[cfg(test)]
mod tests {
    use dexmatch_types::*;
    use rust_decimal::Decimal;

    use super::*;

    fn make_pair(taker: u64, maker: u64, qty: i64) -> [SettlementEntry; 2] {
        let fill = Fill {
            price_denom: "USDC",
            asset_denom: "ATOM",
            quantity: Decimal::new(qty, 0),
            execution_price: Decimal::new(100, 0),
            block: BlockInfo::dummy(1),
        };
        let t = FillParty {
            order_id: OrderId(taker),
            account: "alice",
            direction: PositionDirection::Long,
            order_type: OrderType::Market,
            expected_price: Decimal::ZERO,
        };
        let m = FillParty {
            order_id: OrderId(maker),
            account: "bob",
            direction: PositionDirection::Short,
            order_type: OrderType::Limit,
            expected_price: Decimal::new(100, 0),
        };
        settlement_pair(&fill, &t, &m)
    }

    #[test]
    fn empty_settlements_deterministic() {
        assert_eq!(compute_settlement_root(&[]), compute_settlement_root(&[]));
    }

    #[test]
    fn different_settlements_different_root() {
        let a = make_pair(1, 2, 1);
        let b = make_pair(1, 2, 2);
        assert_ne!(compute_settlement_root(&a), compute_settlement_root(&b));
    }

    #[test]
    fn order_matters_for_sequence_root() {
        let [t, m] = make_pair(1, 2, 1);
        let ab = compute_settlement_root(&[t.clone(), m.clone()]);
        let ba = compute_settlement_root(&[m, t]);
        assert_ne!(ab, ba);
    }

    #[test]
    fn set_root_ignores_order() {
        let mut all: Vec<SettlementEntry> = make_pair(1, 2, 1).into_iter().chain(make_pair(3, 4, 5)).collect();
        let forward = compute_settlement_set_root(&all);
        all.reverse();
        assert_eq!(forward, compute_settlement_set_root(&all));
    }

    #[test]
    fn trailing_zeros_do_not_change_root() {
        let [mut t, m] = make_pair(1, 2, 1);
        let before = compute_settlement_root(&[t.clone(), m.clone()]);
        t.quantity = Decimal::new(100, 2);
        assert_eq!(before, compute_settlement_root(&[t, m]));
    }

    #[test]
    fn verify_roots() {
        let entries = make_pair(1, 2, 1);
        let root = compute_settlement_root(&entries);
        assert!(verify_settlement_root(&entries, &root));
        assert!(!verify_settlement_root(&entries, &[0xAB; 32]));
        assert_eq!(root_hex(&root).len(), 64);
    }
}
