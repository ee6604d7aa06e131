//! Error types for kvtx
//!
//! Every fallible operation in the workspace returns [`KvError`]. The
//! variants fall into four groups:
//!
//! - Validation: `InvalidNodeId`, `EmptyKey` (caller misuse)
//! - Resource: `InsufficientMemory` (the caller may shrink or re-plan)
//! - Protocol misuse: `TransactionCompleted` (handle used after termination)
//! - Phase: `PrepareFailed`, `CommitFailed` (carry the node and the cause)
//!
//! Nothing in the workspace retries internally.

use crate::types::{NodeId, TxnId};
use thiserror::Error;

/// Result type alias for kvtx operations
pub type KvResult<T> = std::result::Result<T, KvError>;

/// Error taxonomy for nodes, transactions and the coordinator
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KvError {
    /// Node id outside `0..node_count`
    #[error("invalid node id {node_id}: cluster has {node_count} nodes")]
    InvalidNodeId {
        /// The id that was requested
        node_id: NodeId,
        /// Number of nodes in the cluster
        node_count: usize,
    },

    /// Keys must be non-empty
    #[error("key must not be empty")]
    EmptyKey,

    /// Admitting the change would push the node past its capacity
    #[error("insufficient memory on node {node_id}: needs {required} units, capacity is {capacity}")]
    InsufficientMemory {
        /// Node that rejected the change
        node_id: NodeId,
        /// Memory usage the node would reach if the change were admitted
        required: u64,
        /// Fixed capacity of the node
        capacity: u64,
    },

    /// The transaction already left the Active state
    #[error("transaction {txn_id} already completed ({status})")]
    TransactionCompleted {
        /// Transaction that was reused
        txn_id: TxnId,
        /// Status the transaction was in
        status: &'static str,
    },

    /// A participant refused to prepare; the transaction was aborted
    #[error("prepare failed on node {node_id}: {source}")]
    PrepareFailed {
        /// Node whose prepare failed
        node_id: NodeId,
        /// Underlying node error
        #[source]
        source: Box<KvError>,
    },

    /// A participant failed to apply during the commit phase
    ///
    /// Nodes that already committed are not rolled back.
    #[error("commit failed on node {node_id}: {source}")]
    CommitFailed {
        /// Node whose commit failed
        node_id: NodeId,
        /// Underlying node error
        #[source]
        source: Box<KvError>,
    },

    /// Cluster configuration is unusable
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl KvError {
    /// Build an `InvalidNodeId` error
    pub fn invalid_node(node_id: NodeId, node_count: usize) -> Self {
        KvError::InvalidNodeId {
            node_id,
            node_count,
        }
    }

    /// Build an `InvalidConfig` error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        KvError::InvalidConfig(message.into())
    }

    /// Wrap a node error raised during phase 1
    pub fn prepare_failed(node_id: NodeId, cause: KvError) -> Self {
        KvError::PrepareFailed {
            node_id,
            source: Box::new(cause),
        }
    }

    /// Wrap a node error raised during phase 2
    pub fn commit_failed(node_id: NodeId, cause: KvError) -> Self {
        KvError::CommitFailed {
            node_id,
            source: Box::new(cause),
        }
    }

    /// Stable name of the variant, suitable for logs and metrics labels
    pub fn error_code(&self) -> &'static str {
        match self {
            KvError::InvalidNodeId { .. } => "InvalidNodeId",
            KvError::EmptyKey => "EmptyKey",
            KvError::InsufficientMemory { .. } => "InsufficientMemory",
            KvError::TransactionCompleted { .. } => "TransactionCompleted",
            KvError::PrepareFailed { .. } => "PrepareFailed",
            KvError::CommitFailed { .. } => "CommitFailed",
            KvError::InvalidConfig(_) => "InvalidConfig",
        }
    }

    /// Whether the caller can reasonably retry with a different plan
    ///
    /// Only resource exhaustion qualifies, directly or as the cause of a
    /// failed prepare.
    pub fn is_retryable(&self) -> bool {
        match self {
            KvError::InsufficientMemory { .. } => true,
            KvError::PrepareFailed { source, .. } => source.is_retryable(),
            _ => false,
        }
    }

    /// Node named by a phase or capacity error
    pub fn node_id(&self) -> Option<NodeId> {
        match self {
            KvError::InvalidNodeId { node_id, .. }
            | KvError::InsufficientMemory { node_id, .. }
            | KvError::PrepareFailed { node_id, .. }
            | KvError::CommitFailed { node_id, .. } => Some(*node_id),
            _ => None,
        }
    }

    /// The underlying node error of a phase error
    pub fn cause(&self) -> Option<&KvError> {
        match self {
            KvError::PrepareFailed { source, .. } | KvError::CommitFailed { source, .. } => {
                Some(source.as_ref())
            }
            _ => None,
        }
    }
}
