//! Memory-bounded cluster node
//!
//! A `Node` owns one slice of the key space:
//! - a committed store (authoritative once written)
//! - a memory counter and a fixed capacity
//! - a pending-write overlay of uncommitted, transaction-scoped writes
//!
//! # Thread Safety
//!
//! All state sits behind one `parking_lot::RwLock`. Reads take the shared
//! lock and may overlap; write, prepare, commit and abort take the exclusive
//! lock and serialize with each other and with reads. Each node has its own
//! lock, so transactions touching disjoint nodes never contend.
//!
//! # Memory Accounting
//!
//! Only committed entries are charged against capacity. Admission checks use
//! the net change relative to the committed store (see
//! [`kvtx_core::MemoryDelta`]), so re-staging a key within one transaction
//! never double-counts. `memory_used <= capacity` holds after every
//! successful operation.
//!
//! Concurrent transactions staging the same key are not detected as
//! conflicting; whichever commit reaches the node last wins.

use std::collections::BTreeMap;

use kvtx_core::{entry_size, KvError, KvResult, MemoryDelta, NodeId, Participant, TxnId};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use crate::overlay::PendingWrites;
use crate::stats::NodeStats;

/// Mutable node state, guarded by the node's lock
#[derive(Debug, Default)]
struct NodeState {
    committed: FxHashMap<String, String>,
    memory_used: u64,
    pending: PendingWrites,
}

impl NodeState {
    fn committed_value(&self, key: &str) -> Option<&str> {
        self.committed.get(key).map(String::as_str)
    }

    /// Aggregate net delta of everything `txn_id` staged here
    fn staged_delta(&self, txn_id: TxnId) -> MemoryDelta {
        let mut total = MemoryDelta::default();
        for (key, value) in self.pending.staged_by(txn_id) {
            total.combine(MemoryDelta::for_write(key, value, self.committed_value(key)));
        }
        total
    }
}

/// One node of the cluster
#[derive(Debug)]
pub struct Node {
    id: NodeId,
    capacity: u64,
    state: RwLock<NodeState>,
}

impl Node {
    /// Create an empty node with a fixed memory capacity
    pub fn new(id: NodeId, capacity: u64) -> Self {
        Self {
            id,
            capacity,
            state: RwLock::new(NodeState::default()),
        }
    }

    /// Node id inside its cluster
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Fixed memory capacity
    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Units currently charged by committed entries
    pub fn memory_used(&self) -> u64 {
        self.state.read().memory_used
    }

    /// Units still available for new committed data
    pub fn available(&self) -> u64 {
        self.capacity.saturating_sub(self.memory_used())
    }

    /// Whether `txn_id` currently has staged writes on this node
    pub fn has_pending(&self, txn_id: TxnId) -> bool {
        self.state.read().pending.has_txn(txn_id)
    }

    /// Copy of the committed store, ordered by key
    pub fn committed_snapshot(&self) -> BTreeMap<String, String> {
        self.state
            .read()
            .committed
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Point-in-time statistics
    pub fn stats(&self) -> NodeStats {
        let state = self.state.read();
        NodeStats {
            node_id: self.id,
            memory_used: state.memory_used,
            memory_capacity: self.capacity,
            committed_keys: state.committed.len(),
            pending_entries: state.pending.entry_count(),
            pending_transactions: state.pending.txn_count(),
        }
    }

    fn insufficient_memory(&self, required: u64) -> KvError {
        KvError::InsufficientMemory {
            node_id: self.id,
            required,
            capacity: self.capacity,
        }
    }
}

fn ensure_key(key: &str) -> KvResult<()> {
    if key.is_empty() {
        return Err(KvError::EmptyKey);
    }
    Ok(())
}

impl Participant for Node {
    fn node_id(&self) -> NodeId {
        self.id
    }

    fn read(&self, key: &str, txn_id: TxnId) -> KvResult<Option<String>> {
        ensure_key(key)?;
        let state = self.state.read();

        // Read-your-own-writes: the transaction's staged value shadows
        // the committed one. Other transactions' staged values are invisible.
        if let Some(staged) = state.pending.get(key, txn_id) {
            return Ok(Some(staged.to_string()));
        }
        Ok(state.committed_value(key).map(str::to_string))
    }

    fn write(&self, key: &str, value: &str, txn_id: TxnId) -> KvResult<()> {
        ensure_key(key)?;
        let mut guard = self.state.write();
        let state = &mut *guard;

        let delta = MemoryDelta::for_write(key, value, state.committed_value(key));
        if !delta.fits(state.memory_used, self.capacity) {
            let required = delta.projected(state.memory_used);
            debug!(
                target: "kvtx::node",
                node_id = self.id,
                %txn_id,
                required,
                capacity = self.capacity,
                "Write rejected: insufficient memory"
            );
            return Err(self.insufficient_memory(required));
        }

        state.pending.stage(key, txn_id, value);
        Ok(())
    }

    fn prepare(&self, txn_id: TxnId) -> KvResult<()> {
        // Exclusive lock: prepare must not interleave with commits that
        // change memory_used.
        let state = self.state.write();

        // Other transactions may have committed since the per-key checks in
        // write(), so the aggregate has to be re-validated here.
        let delta = state.staged_delta(txn_id);
        if !delta.fits(state.memory_used, self.capacity) {
            let required = delta.projected(state.memory_used);
            debug!(
                target: "kvtx::node",
                node_id = self.id,
                %txn_id,
                required,
                capacity = self.capacity,
                "Prepare rejected: insufficient memory"
            );
            return Err(self.insufficient_memory(required));
        }
        Ok(())
    }

    fn commit(&self, txn_id: TxnId) -> KvResult<()> {
        let mut guard = self.state.write();
        let state = &mut *guard;

        if !state.pending.has_txn(txn_id) {
            return Ok(());
        }

        // Capacity can still shrink between prepare and commit. Applying
        // anyway would break the capacity bound, so the staged writes are
        // dropped and the failure is reported to the transaction.
        let delta = state.staged_delta(txn_id);
        if !delta.fits(state.memory_used, self.capacity) {
            let required = delta.projected(state.memory_used);
            let discarded = state.pending.discard(txn_id);
            warn!(
                target: "kvtx::node",
                node_id = self.id,
                %txn_id,
                required,
                capacity = self.capacity,
                discarded,
                "Commit rejected after prepare: insufficient memory"
            );
            return Err(self.insufficient_memory(required));
        }

        for (key, value) in state.pending.take(txn_id) {
            let change = MemoryDelta {
                added: entry_size(&key, &value),
                released: state.committed_value(&key).map_or(0, |old| entry_size(&key, old)),
            };
            state.memory_used = change.projected(state.memory_used);
            state.committed.insert(key, value);
        }

        debug_assert!(state.memory_used <= self.capacity);
        Ok(())
    }

    fn abort(&self, txn_id: TxnId) {
        let discarded = self.state.write().pending.discard(txn_id);
        if discarded > 0 {
            debug!(target: "kvtx::node", node_id = self.id, %txn_id, discarded, "Staged writes discarded");
        }
    }
}
