//! Shared test utilities for all integration test suites.
//!
//! Import via `#[path = "../common/mod.rs"] mod common;` from any test's main.rs.

#![allow(dead_code)]
#![allow(unused_imports)]

use std::collections::BTreeMap;

pub use kvtx::{Coordinator, KvError, NodeId, Transaction, TransactionStatus, TxnId};

/// Cluster with `node_count` nodes of `capacity` units each.
pub fn cluster(node_count: usize, capacity: u64) -> Coordinator {
    Coordinator::new(node_count, capacity).expect("valid cluster config")
}

/// Commit a single key on one node in its own transaction.
pub fn put(coordinator: &Coordinator, node_id: NodeId, key: &str, value: &str) {
    let txn = coordinator.begin();
    txn.write(node_id, key, value).expect("write");
    txn.commit().expect("commit");
}

/// Read the committed value of `key` through a fresh transaction.
pub fn get(coordinator: &Coordinator, node_id: NodeId, key: &str) -> Option<String> {
    let txn = coordinator.begin();
    let value = txn.read(node_id, key).expect("read");
    txn.abort().expect("abort");
    value
}

/// Committed store and memory usage of every node.
pub fn cluster_state(coordinator: &Coordinator) -> Vec<(BTreeMap<String, String>, u64)> {
    coordinator
        .nodes()
        .iter()
        .map(|node| (node.committed_snapshot(), node.memory_used()))
        .collect()
}

/// `memory_used` equals the committed bytes and stays within capacity on
/// every node.
pub fn assert_capacity_invariant(coordinator: &Coordinator) {
    for node in coordinator.nodes() {
        let charged: u64 = node
            .committed_snapshot()
            .iter()
            .map(|(k, v)| kvtx::entry_size(k, v))
            .sum();
        assert_eq!(node.memory_used(), charged, "node {} accounting", node.id());
        assert!(
            node.memory_used() <= node.capacity(),
            "node {} over capacity: {} > {}",
            node.id(),
            node.memory_used(),
            node.capacity()
        );
    }
}

/// No node holds staged writes.
pub fn assert_no_pending(coordinator: &Coordinator) {
    for stats in coordinator.node_stats() {
        assert_eq!(stats.pending_entries, 0, "node {} has pending writes", stats.node_id);
    }
}
