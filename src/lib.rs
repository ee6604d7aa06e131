//! kvtx - memory-bounded transactional key-value store
//!
//! kvtx simulates a small cluster in one process: a fixed set of nodes, each
//! with its own key-value store and a hard memory budget, and transactions
//! that may span several nodes and commit atomically through two-phase
//! commit.
//!
//! # Quick Start
//!
//! ```
//! use kvtx::Coordinator;
//!
//! let cluster = Coordinator::new(3, 1024)?;
//!
//! let txn = cluster.begin();
//! txn.write(0, "user:1", "alice")?;
//! txn.write(2, "user:1:email", "alice@example.com")?;
//! txn.commit()?;
//!
//! let reader = cluster.begin();
//! assert_eq!(reader.read(0, "user:1")?.as_deref(), Some("alice"));
//! # Ok::<(), kvtx::KvError>(())
//! ```
//!
//! # Architecture
//!
//! - `kvtx-core`: ids, errors, memory accounting, the `Participant` trait
//! - `kvtx-storage`: `Node`, the per-node store and pending-write overlay
//! - `kvtx-concurrency`: `Transaction` and the two-phase commit driver
//! - `kvtx-engine`: `Coordinator` and `ClusterConfig`

pub use kvtx_concurrency::{Transaction, TransactionManager, TransactionMetrics, TransactionStatus};
pub use kvtx_core::{entry_size, KvError, KvResult, MemoryDelta, NodeId, Participant, TxnId};
pub use kvtx_engine::{ClusterConfig, Coordinator, CONFIG_FILE_NAME};
pub use kvtx_storage::{Node, NodeStats};
