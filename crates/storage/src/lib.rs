//! Storage layer for kvtx
//!
//! This crate implements the cluster node:
//! - Node: committed store + memory budget + pending-write overlay
//! - PendingWrites: per-key, per-transaction staging area
//! - NodeStats: introspection snapshot
//!
//! Each node is guarded by its own `parking_lot::RwLock`; there is no
//! cross-node lock anywhere in this crate.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod node;
pub mod overlay;
pub mod stats;

pub use node::Node;
pub use overlay::PendingWrites;
pub use stats::NodeStats;
