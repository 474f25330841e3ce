//! Adapters implementing the storage ports.

pub mod codec;
pub mod memory;

pub use codec::{decode, encode};
pub use memory::InMemoryKVStore;
