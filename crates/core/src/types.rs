//! Core identifier types
//!
//! - TxnId: globally unique, strictly increasing transaction identifier
//! - NodeId: position of a node inside a cluster (`0..node_count`)

use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of a node inside a cluster
///
/// Nodes are created once and never added or removed, so a node id is
/// simply its position in the coordinator's node array.
pub type NodeId = usize;

/// Unique identifier for a transaction
///
/// Issued by the transaction manager from a monotonic counter. Ids are
/// strictly increasing across `begin` calls and are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TxnId(u64);

impl TxnId {
    /// Wrap a raw counter value
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw counter value
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl From<u64> for TxnId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for TxnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "txn-{}", self.0)
    }
}
