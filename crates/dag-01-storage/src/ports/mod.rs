//! Ports for the storage layer.

pub mod outbound;

pub use outbound::{BatchOperation, KeyValueStore};
