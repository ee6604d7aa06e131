//! Cluster engine for kvtx
//!
//! This crate assembles the lower layers into a usable cluster:
//! - Coordinator: owns the nodes, hands out transactions, reports metrics
//! - ClusterConfig: node count and per-node capacity, loadable from TOML
//!
//! The coordinator is the only component that knows the full node set.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod coordinator;

pub use config::{ClusterConfig, CONFIG_FILE_NAME};
pub use coordinator::Coordinator;
