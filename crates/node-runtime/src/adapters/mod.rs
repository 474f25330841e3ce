//! # Adapter Implementations
//!
//! Concrete implementations of the ledger's outbound ports that live
//! outside the domain crates.

pub mod storage;

#[cfg(feature = "rocksdb")]
pub use storage::{RocksDbConfig, RocksDbStore};
