//! Transaction layer for kvtx
//!
//! This crate drives two-phase commit across cluster participants:
//! - Transaction: client handle routing reads/writes by node id, then
//!   prepare → commit (or abort) over the nodes it wrote to
//! - TransactionStatus: Active → Prepared → Committed | Aborted
//! - TransactionManager: id allocation, active registry, outcome metrics
//!
//! Isolation is read-committed: a transaction sees committed data plus its
//! own staged writes. There is no conflict detection; concurrent commits to
//! the same key resolve last-committer-wins.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod manager;
pub mod transaction;

pub use manager::{TransactionManager, TransactionMetrics};
pub use transaction::{Transaction, TransactionStatus};
