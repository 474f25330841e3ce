//! # dag-01-storage
//!
//! Persistence layer for the witness-DAG ledger.
//!
//! ## Architecture
//!
//! - `ports::outbound::KeyValueStore` is the only thing a storage engine has
//!   to implement: point reads and writes, ordered prefix scans and atomic
//!   write groups.
//! - `keys` fixes the logical key layout every node agrees on.
//! - `DagStore` / `StoreBatch` add typed, bincode-encoded access on top.
//!
//! ## Atomicity
//!
//! Ledger code never writes to the backend directly. It stages changes in a
//! `StoreBatch` and commits once per logical step, so an I/O failure leaves
//! the previous state intact.

pub mod adapters;
pub mod batch;
pub mod errors;
pub mod keys;
pub mod ports;
pub mod repository;

pub use adapters::InMemoryKVStore;
pub use batch::StoreBatch;
pub use errors::{KVStoreError, StorageError, StorageResult};
pub use ports::{BatchOperation, KeyValueStore};
pub use repository::{DagRead, DagStore, KeyValueRead};
