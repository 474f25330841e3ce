//! # Node Runtime Library
//!
//! Wires storage, genesis and the transaction service into a running node.
//! The main entry point is the `main.rs` binary; the library is exposed so
//! integration tests can drive a node in-process.
//!
//! ## Modules
//!
//! - `adapters/` - storage backends for the key-value port
//! - `container/` - node configuration
//! - `runtime` - startup, background tasks and shutdown

#![allow(clippy::type_complexity)]

pub mod adapters;
pub mod container;
pub mod runtime;

pub use container::{ConfigError, NodeConfig, StorageBackend};
pub use runtime::{NodeRuntime, DEFAULT_RETRY_INTERVAL};
