//! Core types and traits for kvtx
//!
//! This crate defines the foundational types shared by every layer:
//! - TxnId / NodeId: identifiers for transactions and cluster nodes
//! - KvError: error taxonomy (validation, resource, protocol, phase)
//! - Size accounting: how entries are charged against a node's memory budget
//! - Participant: the per-node operations a two-phase commit drives

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod size;
pub mod traits;
pub mod types;

pub use error::{KvError, KvResult};
pub use size::{entry_size, MemoryDelta};
pub use traits::Participant;
pub use types::{NodeId, TxnId};
