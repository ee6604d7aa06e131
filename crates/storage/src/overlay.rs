//! Pending-write overlay
//!
//! Holds writes that transactions have staged on a node but not yet
//! committed. The primary map is `key → (txn → value)`, which is what reads
//! consult for read-your-own-writes. A secondary index `txn → keys` lets
//! prepare, commit and abort visit only the keys a transaction staged.
//!
//! Both maps are updated together and are always consistent: a key appears
//! under a transaction in the index exactly when the primary map holds a
//! value for that `(key, txn)` pair. Empty inner maps are removed.

use kvtx_core::TxnId;
use rustc_hash::{FxHashMap, FxHashSet};

/// Uncommitted, transaction-scoped writes on a single node
#[derive(Debug, Default)]
pub struct PendingWrites {
    by_key: FxHashMap<String, FxHashMap<TxnId, String>>,
    by_txn: FxHashMap<TxnId, FxHashSet<String>>,
}

impl PendingWrites {
    /// Create an empty overlay
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage `value` for `(key, txn_id)`, replacing any earlier staged value
    pub fn stage(&mut self, key: &str, txn_id: TxnId, value: &str) {
        self.by_key
            .entry(key.to_string())
            .or_default()
            .insert(txn_id, value.to_string());
        self.by_txn
            .entry(txn_id)
            .or_default()
            .insert(key.to_string());
    }

    /// Value staged by `txn_id` for `key`, if any
    pub fn get(&self, key: &str, txn_id: TxnId) -> Option<&str> {
        self.by_key
            .get(key)
            .and_then(|staged| staged.get(&txn_id))
            .map(String::as_str)
    }

    /// Whether `txn_id` has anything staged here
    pub fn has_txn(&self, txn_id: TxnId) -> bool {
        self.by_txn.contains_key(&txn_id)
    }

    /// Iterate `(key, value)` pairs staged by `txn_id`
    pub fn staged_by(&self, txn_id: TxnId) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.by_txn
            .get(&txn_id)
            .into_iter()
            .flatten()
            .filter_map(move |key| self.get(key, txn_id).map(|value| (key.as_str(), value)))
    }

    /// Remove and return every write staged by `txn_id`
    pub fn take(&mut self, txn_id: TxnId) -> Vec<(String, String)> {
        let keys = match self.by_txn.remove(&txn_id) {
            Some(keys) => keys,
            None => return Vec::new(),
        };

        let mut taken = Vec::with_capacity(keys.len());
        for key in keys {
            if let Some(staged) = self.by_key.get_mut(&key) {
                if let Some(value) = staged.remove(&txn_id) {
                    if staged.is_empty() {
                        self.by_key.remove(&key);
                    }
                    taken.push((key, value));
                }
            }
        }
        taken
    }

    /// Drop every write staged by `txn_id`, returning how many were dropped
    pub fn discard(&mut self, txn_id: TxnId) -> usize {
        self.take(txn_id).len()
    }

    /// Total number of staged `(key, txn)` entries
    pub fn entry_count(&self) -> usize {
        self.by_key.values().map(FxHashMap::len).sum()
    }

    /// Number of distinct transactions with staged writes
    pub fn txn_count(&self) -> usize {
        self.by_txn.len()
    }

    /// Number of keys with at least one staged write
    pub fn key_count(&self) -> usize {
        self.by_key.len()
    }

    /// Check if nothing is staged
    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}
