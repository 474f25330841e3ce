//! # Storage Adapters
//!
//! Backends for the ledger's `KeyValueStore` port.
//!
//! Enable the `rocksdb` feature for a durable store:
//!
//! ```toml
//! node-runtime = { path = "...", features = ["rocksdb"] }
//! ```
//!
//! Without it the node runs on the in-memory store and forgets everything on
//! exit.

#[cfg(feature = "rocksdb")]
pub mod rocksdb_adapter;

#[cfg(feature = "rocksdb")]
pub use rocksdb_adapter::{RocksDbConfig, RocksDbStore};

pub use dag_01_storage::InMemoryKVStore;
