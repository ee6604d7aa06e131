//! Cluster coordinator
//!
//! The coordinator owns a fixed array of nodes (ids `0..node_count`, never
//! resized) and the transaction manager, and hands out transaction handles
//! bound to both. It is an ordinary value: callers construct as many
//! independent clusters as they like.
//!
//! Handles keep the node array and the manager alive through `Arc`s, so a
//! transaction may outlive the coordinator that began it.

use std::sync::Arc;
use std::time::{Duration, Instant};

use kvtx_concurrency::{Transaction, TransactionManager, TransactionMetrics};
use kvtx_core::{KvError, KvResult, NodeId, TxnId};
use kvtx_storage::{Node, NodeStats};
use tracing::info;

use crate::config::ClusterConfig;

/// Owner of a cluster's nodes and transaction ids
#[derive(Debug)]
pub struct Coordinator {
    nodes: Arc<[Node]>,
    manager: Arc<TransactionManager>,
}

impl Coordinator {
    /// Build a cluster of `node_count` empty nodes, each with
    /// `node_capacity` units of memory
    ///
    /// # Errors
    /// `InvalidConfig` if either argument is zero.
    pub fn new(node_count: usize, node_capacity: u64) -> KvResult<Self> {
        Self::from_config(&ClusterConfig::new(node_count, node_capacity))
    }

    /// Build a cluster from a validated config
    pub fn from_config(config: &ClusterConfig) -> KvResult<Self> {
        config.validate()?;

        let nodes: Vec<Node> = (0..config.node_count)
            .map(|id| Node::new(id, config.node_capacity))
            .collect();

        info!(
            target: "kvtx::node",
            node_count = config.node_count,
            node_capacity = config.node_capacity,
            "Cluster created"
        );

        Ok(Self {
            nodes: Arc::from(nodes),
            manager: Arc::new(TransactionManager::new()),
        })
    }

    /// Start a new transaction
    ///
    /// Ids are strictly increasing across calls, from any thread.
    pub fn begin(&self) -> Transaction {
        Transaction::begin(Arc::clone(&self.nodes), Arc::clone(&self.manager))
    }

    /// Bounds-checked node lookup
    pub fn node(&self, node_id: NodeId) -> KvResult<&Node> {
        self.nodes
            .get(node_id)
            .ok_or_else(|| KvError::invalid_node(node_id, self.nodes.len()))
    }

    /// Number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// All nodes, indexed by id
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Point-in-time statistics for every node, in id order
    pub fn node_stats(&self) -> Vec<NodeStats> {
        self.nodes.iter().map(Node::stats).collect()
    }

    /// Ids of transactions begun but not yet committed or aborted, ascending
    pub fn active_transactions(&self) -> Vec<TxnId> {
        self.manager.active_transactions()
    }

    /// Number of active transactions
    pub fn active_count(&self) -> u64 {
        self.manager.active_count()
    }

    /// Transaction statistics since the cluster was created
    pub fn metrics(&self) -> TransactionMetrics {
        self.manager.metrics()
    }

    /// Wait until no transaction is active
    ///
    /// Returns `false` if `timeout` expired first.
    pub fn wait_for_idle(&self, timeout: Duration) -> bool {
        let start = Instant::now();
        let sleep_duration = Duration::from_millis(1);

        while self.manager.active_count() > 0 {
            if start.elapsed() > timeout {
                return false;
            }
            std::thread::sleep(sleep_duration);
        }
        true
    }
}
