//! # Node Container
//!
//! Configuration for everything the runtime wires together.

pub mod config;

pub use config::{ConfigError, LoggingConfig, NodeConfig, StorageBackend, StorageConfig};
