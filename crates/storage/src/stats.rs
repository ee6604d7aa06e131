//! Node statistics for introspection

use kvtx_core::NodeId;
use serde::{Deserialize, Serialize};

/// Point-in-time view of a node's memory and overlay
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeStats {
    /// Node id inside its cluster
    pub node_id: NodeId,
    /// Units charged by committed entries
    pub memory_used: u64,
    /// Fixed capacity
    pub memory_capacity: u64,
    /// Number of committed keys
    pub committed_keys: usize,
    /// Staged `(key, txn)` entries awaiting commit or abort
    pub pending_entries: usize,
    /// Distinct transactions with staged entries
    pub pending_transactions: usize,
}

impl NodeStats {
    /// Fraction of capacity in use, in `[0.0, 1.0]`
    pub fn utilization(&self) -> f64 {
        if self.memory_capacity == 0 {
            return 0.0;
        }
        self.memory_used as f64 / self.memory_capacity as f64
    }
}
