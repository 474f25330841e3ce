//! # dag-03-graph
//!
//! Graph metrics and stabilization over the stored DAG.
//!
//! - [`GraphInfoGetter`] scores a candidate parent list: level, best parent,
//!   witnessed level, last stable ball, missing ancestry for sync.
//! - [`MainChainUpdater`] locates the stability frontier below a new unit,
//!   decides whether it may advance, and writes each new stable layer.
//! - [`merkle`] hashes the stable units into a root with inclusion proofs.
//!
//! Both read through [`dag_01_storage::DagRead`], so they work the same on
//! committed state and on an open `StoreBatch`.

pub mod errors;
pub mod graph_info;
pub mod main_chain;
pub mod merkle;
pub mod ports;

#[cfg(test)]
pub(crate) mod test_utils;

pub use errors::{GraphError, GraphResult};
pub use graph_info::{compare_parents, GraphInfoGetter};
pub use main_chain::{locate, MainChainUpdater, StabilityPoint, StableLayer};
pub use merkle::{merkle_proof, merkle_root, verify_merkle_proof, Position, ProofNode};
pub use ports::{ManualTimeSource, SystemTimeSource, TimeSource};
