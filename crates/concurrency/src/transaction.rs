//! Transaction handle and two-phase commit driver
//!
//! A `Transaction` routes reads and writes to cluster participants by node
//! id and remembers which participants it wrote to. `commit()` then runs
//! two-phase commit against exactly those participants:
//!
//! ```text
//! 1. Active → Prepared (exactly once, under the handle's lock)
//! 2. prepare() on every touched node
//!    - first failure: abort() on every touched node, → Aborted,
//!      return PrepareFailed { node_id, cause }
//! 3. commit() on every touched node, → Committed
//!    - any failure is returned as CommitFailed { node_id, cause };
//!      nodes that already committed are NOT rolled back
//! ```
//!
//! `abort()` moves Active → Aborted and discards staged writes on every
//! touched node.
//!
//! # Thread Safety
//!
//! All methods take `&self`. Status and the touched-node set live behind one
//! `parking_lot::Mutex`; read and write hold it for their whole call, so a
//! concurrent commit or abort either happens entirely before them (and they
//! fail with `TransactionCompleted`) or entirely after them (and sees their
//! touched node). A handle can be shared between threads via `Arc`.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use kvtx_core::{KvError, KvResult, NodeId, Participant, TxnId};
use kvtx_storage::Node;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::manager::TransactionManager;

/// Status of a transaction in its lifecycle
///
/// State transitions:
/// - `Active` → `Prepared` (commit started)
/// - `Prepared` → `Committed` (every participant prepared)
/// - `Prepared` → `Aborted` (a participant refused to prepare)
/// - `Active` → `Aborted` (explicit abort)
///
/// `Committed` and `Aborted` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionStatus {
    /// Accepting reads and writes
    Active,
    /// Commit in progress
    Prepared,
    /// Commit finished
    Committed,
    /// Aborted, staged writes discarded
    Aborted,
}

impl TransactionStatus {
    /// Stable name of the status
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Active => "Active",
            TransactionStatus::Prepared => "Prepared",
            TransactionStatus::Committed => "Committed",
            TransactionStatus::Aborted => "Aborted",
        }
    }

    /// Whether no further transitions are possible
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TransactionStatus::Committed | TransactionStatus::Aborted
        )
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug)]
struct TxnState {
    status: TransactionStatus,
    /// Nodes with staged writes; ordered so fan-out is deterministic
    touched: BTreeSet<NodeId>,
}

/// Client handle for one transaction
///
/// Generic over the participant type so the protocol can be exercised
/// against any [`Participant`]; clusters use [`Node`].
pub struct Transaction<P: Participant = Node> {
    id: TxnId,
    participants: Arc<[P]>,
    manager: Arc<TransactionManager>,
    state: Mutex<TxnState>,
    start_time: Instant,
}

impl<P: Participant> Transaction<P> {
    /// Begin a new transaction over `participants`
    ///
    /// Allocates the id from `manager` and registers the transaction as
    /// active there.
    pub fn begin(participants: Arc<[P]>, manager: Arc<TransactionManager>) -> Self {
        let id = manager.begin();
        Self {
            id,
            participants,
            manager,
            state: Mutex::new(TxnState {
                status: TransactionStatus::Active,
                touched: BTreeSet::new(),
            }),
            start_time: Instant::now(),
        }
    }

    /// Transaction id
    pub fn id(&self) -> TxnId {
        self.id
    }

    /// Current status
    pub fn status(&self) -> TransactionStatus {
        self.state.lock().status
    }

    /// Check if the transaction still accepts reads and writes
    pub fn is_active(&self) -> bool {
        self.status() == TransactionStatus::Active
    }

    /// Nodes this transaction has written to, ascending
    pub fn touched_nodes(&self) -> Vec<NodeId> {
        self.state.lock().touched.iter().copied().collect()
    }

    /// Time since the transaction began
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    // === Read/Write ===

    /// Read `key` from node `node_id`
    ///
    /// Sees this transaction's own staged writes and committed data, never
    /// other transactions' staged writes. A missing key is `Ok(None)`.
    ///
    /// # Errors
    /// - `TransactionCompleted` if the transaction is not Active
    /// - `InvalidNodeId` if `node_id` is out of range
    /// - `EmptyKey` if `key` is empty
    pub fn read(&self, node_id: NodeId, key: &str) -> KvResult<Option<String>> {
        let state = self.state.lock();
        self.ensure_active(&state)?;
        self.participant(node_id)?.read(key, self.id)
    }

    /// Stage `value` for `key` on node `node_id`
    ///
    /// Nothing is visible to other transactions until commit. The node is
    /// only recorded as touched if the write succeeds.
    ///
    /// # Errors
    /// - `TransactionCompleted` if the transaction is not Active
    /// - `InvalidNodeId` if `node_id` is out of range
    /// - `EmptyKey` if `key` is empty
    /// - `InsufficientMemory` if the node cannot admit the write
    pub fn write(&self, node_id: NodeId, key: &str, value: &str) -> KvResult<()> {
        let mut state = self.state.lock();
        self.ensure_active(&state)?;
        self.participant(node_id)?.write(key, value, self.id)?;
        state.touched.insert(node_id);
        Ok(())
    }

    // === Commit/Abort ===

    /// Commit through two-phase commit over every touched node
    ///
    /// # Errors
    /// - `TransactionCompleted` if the transaction is not Active
    /// - `PrepareFailed` if a node refused to prepare; the transaction is
    ///   then Aborted and no node keeps its staged writes
    /// - `CommitFailed` if a node failed while applying; the transaction is
    ///   still Committed and nodes that applied keep the writes
    pub fn commit(&self) -> KvResult<()> {
        let touched = self.leave_active(TransactionStatus::Prepared)?;

        // Phase 1: every participant must confirm
        for participant in self.resolve(&touched) {
            if let Err(cause) = participant.prepare(self.id) {
                let node_id = participant.node_id();
                warn!(
                    target: "kvtx::txn",
                    txn_id = %self.id,
                    node_id,
                    error = %cause,
                    "Prepare failed, aborting transaction"
                );
                self.broadcast_abort(&touched);
                self.finish(TransactionStatus::Aborted);
                return Err(KvError::prepare_failed(node_id, cause));
            }
        }

        // Phase 2: apply everywhere, report the first failure
        let mut failure = None;
        for participant in self.resolve(&touched) {
            if let Err(cause) = participant.commit(self.id) {
                let node_id = participant.node_id();
                error!(
                    target: "kvtx::txn",
                    txn_id = %self.id,
                    node_id,
                    error = %cause,
                    "Commit failed after successful prepare, other nodes are not rolled back"
                );
                if failure.is_none() {
                    failure = Some(KvError::commit_failed(node_id, cause));
                }
            }
        }

        self.finish(TransactionStatus::Committed);
        match failure {
            Some(err) => Err(err),
            None => {
                debug!(
                    target: "kvtx::txn",
                    txn_id = %self.id,
                    nodes = touched.len(),
                    "Transaction committed"
                );
                Ok(())
            }
        }
    }

    /// Abort and discard staged writes on every touched node
    ///
    /// # Errors
    /// `TransactionCompleted` if the transaction is not Active.
    pub fn abort(&self) -> KvResult<()> {
        let touched = self.leave_active(TransactionStatus::Aborted)?;
        self.broadcast_abort(&touched);
        self.manager.record_outcome(self.id, TransactionStatus::Aborted);
        debug!(target: "kvtx::txn", txn_id = %self.id, nodes = touched.len(), "Transaction aborted");
        Ok(())
    }

    // === Internals ===

    fn ensure_active(&self, state: &TxnState) -> KvResult<()> {
        if state.status == TransactionStatus::Active {
            Ok(())
        } else {
            Err(KvError::TransactionCompleted {
                txn_id: self.id,
                status: state.status.as_str(),
            })
        }
    }

    /// The single exit from Active; returns the touched nodes to fan out to
    fn leave_active(&self, next: TransactionStatus) -> KvResult<Vec<NodeId>> {
        let mut state = self.state.lock();
        self.ensure_active(&state)?;
        state.status = next;
        Ok(state.touched.iter().copied().collect())
    }

    fn finish(&self, status: TransactionStatus) {
        self.state.lock().status = status;
        self.manager.record_outcome(self.id, status);
    }

    fn participant(&self, node_id: NodeId) -> KvResult<&P> {
        self.participants
            .get(node_id)
            .ok_or_else(|| KvError::invalid_node(node_id, self.participants.len()))
    }

    /// Touched ids were validated by `write`, and the participant set never
    /// changes, so every id resolves.
    fn resolve<'a>(&'a self, touched: &'a [NodeId]) -> impl Iterator<Item = &'a P> + 'a {
        touched
            .iter()
            .filter_map(move |node_id| self.participants.get(*node_id))
    }

    fn broadcast_abort(&self, touched: &[NodeId]) {
        for participant in self.resolve(touched) {
            participant.abort(self.id);
        }
    }
}

impl<P: Participant> fmt::Debug for Transaction<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("Transaction")
            .field("id", &self.id)
            .field("status", &state.status)
            .field("touched", &state.touched)
            .finish()
    }
}

impl<P: Participant> Drop for Transaction<P> {
    /// A handle dropped while Active is aborted so its staged writes do not
    /// outlive it.
    fn drop(&mut self) {
        if self.state.get_mut().status == TransactionStatus::Active {
            debug!(target: "kvtx::txn", txn_id = %self.id, "Active transaction dropped, aborting");
            let _ = self.abort();
        }
    }
}
