//! Transaction manager: id allocation, active registry, outcome metrics
//!
//! The manager is shared (behind an `Arc`) by the coordinator and by every
//! transaction handle it issues:
//! - `begin()` allocates the next id from a monotonic counter and registers
//!   the transaction as active
//! - `record_outcome()` removes it from the registry and counts the result
//!
//! # Memory Ordering
//!
//! The id counter uses `SeqCst` so ids are strictly increasing across
//! threads. The metric counters are observational only and use `Relaxed`.

use dashmap::DashMap;
use kvtx_core::TxnId;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::debug;

use crate::transaction::TransactionStatus;

/// Snapshot of transaction statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionMetrics {
    /// Transactions begun but not yet terminal
    pub active_count: u64,
    /// Transactions begun since the manager was created
    pub total_started: u64,
    /// Transactions that reached Committed
    pub total_committed: u64,
    /// Transactions that reached Aborted
    pub total_aborted: u64,
    /// `total_committed / total_started`, 0.0 when nothing started
    pub commit_rate: f64,
}

impl TransactionMetrics {
    /// Transactions that reached a terminal status
    pub fn total_completed(&self) -> u64 {
        self.total_committed + self.total_aborted
    }

    /// `total_aborted / total_started`, 0.0 when nothing started
    pub fn abort_rate(&self) -> f64 {
        if self.total_started > 0 {
            self.total_aborted as f64 / self.total_started as f64
        } else {
            0.0
        }
    }
}

/// Issues transaction ids and tracks active transactions
#[derive(Debug)]
pub struct TransactionManager {
    /// Next id to hand out
    next_txn_id: AtomicU64,
    /// Active transactions and when they began
    active: DashMap<TxnId, Instant>,
    total_started: AtomicU64,
    total_committed: AtomicU64,
    total_aborted: AtomicU64,
}

impl TransactionManager {
    /// Create a manager whose first transaction id is 1
    pub fn new() -> Self {
        Self::with_txn_id(0)
    }

    /// Create a manager that continues after `last_txn_id`
    pub fn with_txn_id(last_txn_id: u64) -> Self {
        Self {
            next_txn_id: AtomicU64::new(last_txn_id + 1),
            active: DashMap::new(),
            total_started: AtomicU64::new(0),
            total_committed: AtomicU64::new(0),
            total_aborted: AtomicU64::new(0),
        }
    }

    /// Allocate the next transaction id without registering it
    pub fn next_txn_id(&self) -> TxnId {
        TxnId::new(self.next_txn_id.fetch_add(1, Ordering::SeqCst))
    }

    /// Allocate an id and register the transaction as active
    pub fn begin(&self) -> TxnId {
        let txn_id = self.next_txn_id();
        self.active.insert(txn_id, Instant::now());
        self.total_started.fetch_add(1, Ordering::Relaxed);
        debug!(target: "kvtx::txn", %txn_id, "Transaction started");
        txn_id
    }

    /// Record that `txn_id` reached a terminal status
    ///
    /// Non-terminal statuses are ignored. Recording the same transaction
    /// twice only counts the first call.
    pub fn record_outcome(&self, txn_id: TxnId, status: TransactionStatus) {
        if !status.is_terminal() {
            return;
        }
        if self.active.remove(&txn_id).is_none() {
            return;
        }
        match status {
            TransactionStatus::Committed => {
                self.total_committed.fetch_add(1, Ordering::Relaxed);
            }
            TransactionStatus::Aborted => {
                self.total_aborted.fetch_add(1, Ordering::Relaxed);
            }
            TransactionStatus::Active | TransactionStatus::Prepared => {}
        }
    }

    /// Whether `txn_id` is registered as active
    pub fn is_active(&self, txn_id: TxnId) -> bool {
        self.active.contains_key(&txn_id)
    }

    /// Ids of all active transactions, ascending
    pub fn active_transactions(&self) -> Vec<TxnId> {
        let mut ids: Vec<TxnId> = self.active.iter().map(|entry| *entry.key()).collect();
        ids.sort_unstable();
        ids
    }

    /// Number of active transactions
    pub fn active_count(&self) -> u64 {
        self.active.len() as u64
    }

    /// The longest-running active transaction and its age
    pub fn oldest_active(&self) -> Option<(TxnId, Duration)> {
        self.active
            .iter()
            .min_by_key(|entry| (*entry.value(), *entry.key()))
            .map(|entry| (*entry.key(), entry.value().elapsed()))
    }

    /// Current statistics
    pub fn metrics(&self) -> TransactionMetrics {
        let started = self.total_started.load(Ordering::Relaxed);
        let committed = self.total_committed.load(Ordering::Relaxed);

        TransactionMetrics {
            active_count: self.active_count(),
            total_started: started,
            total_committed: committed,
            total_aborted: self.total_aborted.load(Ordering::Relaxed),
            commit_rate: if started > 0 {
                committed as f64 / started as f64
            } else {
                0.0
            },
        }
    }
}

impl Default for TransactionManager {
    fn default() -> Self {
        Self::new()
    }
}
