//! Key-value state store collaborator and its layered views.
//!
//! The ledger store itself lives outside the engine; it is reached through
//! [`KvStore`]. Three implementations are layered during block execution:
//!
//! ```text
//! ScopedStore (pair whitelist) → CacheStore (write-back overlay) → parent
//! ```
//!
//! - [`MemStore`]: in-memory reference store, ordered by key
//! - [`CacheStore`]: buffers writes and deletes until [`CacheStore::commit`],
//!   which hands them to the parent as one [`WriteBatch`]
//! - [`ScopedStore`]: rejects any key outside its permitted prefixes

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use dexmatch_types::{DexError, Result};

/// Ordered writes (`None` deletes) applied together by [`KvStore::write_batch`].
pub type WriteBatch = Vec<(Vec<u8>, Option<Vec<u8>>)>;

/// Raw ordered key-value access. Implementations use interior mutability
/// so one store can be shared as `Arc<dyn KvStore>` across pair tasks.
pub trait KvStore: Send + Sync {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;

    fn set(&self, key: &[u8], value: Vec<u8>) -> Result<()>;

    fn delete(&self, key: &[u8]) -> Result<()>;

    /// All entries whose key starts with `prefix`, in ascending key order.
    fn prefix_scan(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>>;

    /// Apply every write of `batch`, or none of them.
    ///
    /// The default applies entries one by one and is only atomic if the
    /// store cannot fail halfway; stores that can should override it.
    fn write_batch(&self, batch: WriteBatch) -> Result<()> {
        for (key, value) in batch {
            match value {
                Some(value) => self.set(&key, value)?,
                None => self.delete(&key)?,
            }
        }
        Ok(())
    }
}

fn read_lock<T>(lock: &RwLock<T>) -> Result<RwLockReadGuard<'_, T>> {
    lock.read()
        .map_err(|_| DexError::StoreRead { reason: "store lock poisoned".into() })
}

fn write_lock<T>(lock: &RwLock<T>) -> Result<RwLockWriteGuard<'_, T>> {
    lock.write()
        .map_err(|_| DexError::StoreWrite { reason: "store lock poisoned".into() })
}

// =====================================================================
// MemStore
// =====================================================================

/// In-memory ordered store.
#[derive(Debug, Default)]
pub struct MemStore {
    entries: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl MemStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub fn len(&self) -> Result<usize> {
        Ok(read_lock(&self.entries)?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Copy of every entry, for state comparisons.
    pub fn snapshot(&self) -> Result<BTreeMap<Vec<u8>, Vec<u8>>> {
        Ok(read_lock(&self.entries)?.clone())
    }
}

impl KvStore for MemStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(read_lock(&self.entries)?.get(key).cloned())
    }

    fn set(&self, key: &[u8], value: Vec<u8>) -> Result<()> {
        write_lock(&self.entries)?.insert(key.to_vec(), value);
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> Result<()> {
        write_lock(&self.entries)?.remove(key);
        Ok(())
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        let entries = read_lock(&self.entries)?;
        Ok(entries
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn write_batch(&self, batch: WriteBatch) -> Result<()> {
        let mut entries = write_lock(&self.entries)?;
        for (key, value) in batch {
            match value {
                Some(value) => {
                    entries.insert(key, value);
                }
                None => {
                    entries.remove(&key);
                }
            }
        }
        Ok(())
    }
}

// =====================================================================
// CacheStore
// =====================================================================

/// Write-back overlay over a parent store.
///
/// Reads see the overlay first (`None` in the overlay is a pending delete).
/// Nothing reaches the parent until [`commit`](Self::commit); dropping the
/// cache discards every pending write.
pub struct CacheStore {
    parent: Arc<dyn KvStore>,
    pending: RwLock<BTreeMap<Vec<u8>, Option<Vec<u8>>>>,
}

impl CacheStore {
    #[must_use]
    pub fn new(parent: Arc<dyn KvStore>) -> Self {
        Self {
            parent,
            pending: RwLock::new(BTreeMap::new()),
        }
    }

    /// Number of buffered writes and deletes.
    pub fn pending_len(&self) -> Result<usize> {
        Ok(read_lock(&self.pending)?.len())
    }

    /// Hand buffered writes to the parent as one batch in key order.
    ///
    /// They are cleared only once the parent accepted the batch; on error
    /// the cache still holds every write.
    pub fn commit(&self) -> Result<usize> {
        let mut pending = write_lock(&self.pending)?;
        let batch: WriteBatch = pending.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        let count = batch.len();
        self.parent.write_batch(batch)?;
        pending.clear();
        Ok(count)
    }
}

impl KvStore for CacheStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        if let Some(value) = read_lock(&self.pending)?.get(key) {
            return Ok(value.clone());
        }
        self.parent.get(key)
    }

    fn set(&self, key: &[u8], value: Vec<u8>) -> Result<()> {
        write_lock(&self.pending)?.insert(key.to_vec(), Some(value));
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> Result<()> {
        write_lock(&self.pending)?.insert(key.to_vec(), None);
        Ok(())
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        let mut merged: BTreeMap<Vec<u8>, Vec<u8>> = self.parent.prefix_scan(prefix)?.into_iter().collect();
        let pending = read_lock(&self.pending)?;
        for (key, value) in pending
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
        {
            match value {
                Some(value) => {
                    merged.insert(key.clone(), value.clone());
                }
                None => {
                    merged.remove(key);
                }
            }
        }
        Ok(merged.into_iter().collect())
    }

    fn write_batch(&self, batch: WriteBatch) -> Result<()> {
        write_lock(&self.pending)?.extend(batch);
        Ok(())
    }
}

// =====================================================================
// ScopedStore
// =====================================================================

/// A view that only permits keys under a fixed set of prefixes.
///
/// Every access outside the whitelist fails with
/// [`DexError::KeyOutOfScope`] before touching the inner store.
pub struct ScopedStore {
    inner: Arc<dyn KvStore>,
    permitted_prefixes: Vec<Vec<u8>>,
}

impl ScopedStore {
    #[must_use]
    pub fn new(inner: Arc<dyn KvStore>, permitted_prefixes: Vec<Vec<u8>>) -> Self {
        Self {
            inner,
            permitted_prefixes,
        }
    }

    fn check(&self, key: &[u8]) -> Result<()> {
        if self.permitted_prefixes.iter().any(|p| key.starts_with(p)) {
            Ok(())
        } else {
            Err(DexError::KeyOutOfScope { key_hex: hex::encode(key) })
        }
    }
}

impl KvStore for ScopedStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.check(key)?;
        self.inner.get(key)
    }

    fn set(&self, key: &[u8], value: Vec<u8>) -> Result<()> {
        self.check(key)?;
        self.inner.set(key, value)
    }

    fn delete(&self, key: &[u8]) -> Result<()> {
        self.check(key)?;
        self.inner.delete(key)
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        self.check(prefix)?;
        self.inner.prefix_scan(prefix)
    }

    fn write_batch(&self, batch: WriteBatch) -> Result<()> {
        for (key, _) in &batch {
            self.check(key)?;
        }
        self.inner.write_batch(batch)
    }
}
