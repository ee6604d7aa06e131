//! Participant trait for two-phase commit
//!
//! A participant is one node of the cluster as seen by a transaction. The
//! transaction routes reads and writes to participants by node id and, at
//! commit time, drives `prepare` then `commit` (or `abort`) on every
//! participant it wrote to.
//!
//! All methods take `&self`: implementations synchronize internally so that
//! reads may overlap while mutations on the same participant serialize.

use crate::error::KvResult;
use crate::types::{NodeId, TxnId};

/// Per-node operations keyed by transaction id
pub trait Participant: Send + Sync {
    /// Stable id of this participant inside its cluster
    fn node_id(&self) -> NodeId;

    /// Read `key` as seen by `txn_id`
    ///
    /// Returns the transaction's own staged value if it has one, otherwise
    /// the committed value. A missing key is `Ok(None)`.
    fn read(&self, key: &str, txn_id: TxnId) -> KvResult<Option<String>>;

    /// Stage `value` for `key` on behalf of `txn_id`
    ///
    /// Rejected up front if the net memory change would exceed capacity.
    fn write(&self, key: &str, value: &str, txn_id: TxnId) -> KvResult<()>;

    /// Phase 1: confirm every staged write of `txn_id` still fits
    ///
    /// Pure check, no state changes.
    fn prepare(&self, txn_id: TxnId) -> KvResult<()>;

    /// Phase 2: apply every staged write of `txn_id` to the committed store
    fn commit(&self, txn_id: TxnId) -> KvResult<()>;

    /// Discard every staged write of `txn_id`
    fn abort(&self, txn_id: TxnId);
}
