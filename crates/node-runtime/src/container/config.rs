//! # Node Configuration
//!
//! Defaults for a development node, overridable from the environment.
//!
//! ## Environment
//!
//! | Variable | Effect |
//! |----------|--------|
//! | `DAG_DATA_DIR` | data directory |
//! | `DAG_STORAGE_BACKEND` | `memory` or `rocksdb` |
//! | `DAG_LOG` | tracing filter, e.g. `info` or `dag_03_graph=debug` |
//! | `DAG_SUBMIT_QUEUE` | submission queue capacity |
//! | `DAG_WITNESSES` | comma-separated hex addresses for genesis |

use dag_04_ledger::GenesisConfig;
use dag_05_transaction::LedgerConfig;
use shared_types::Address;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// Complete node configuration.
#[derive(Debug, Clone, Default)]
pub struct NodeConfig {
    pub storage: StorageConfig,
    pub ledger: LedgerConfig,
    pub genesis: GenesisConfig,
    pub logging: LoggingConfig,
}

impl NodeConfig {
    /// Defaults with `DAG_*` overrides from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults with overrides from `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(dir) = lookup("DAG_DATA_DIR") {
            config.storage.data_dir = PathBuf::from(dir);
        }
        if let Some(backend) = lookup("DAG_STORAGE_BACKEND") {
            config.storage.backend = backend.parse()?;
        }
        if let Some(filter) = lookup("DAG_LOG") {
            config.logging.filter = filter;
        }
        if let Some(capacity) = lookup("DAG_SUBMIT_QUEUE") {
            config.ledger.submit_queue_capacity =
                capacity.parse().map_err(|_| ConfigError::InvalidValue {
                    var: "DAG_SUBMIT_QUEUE",
                    value: capacity.clone(),
                })?;
        }
        if let Some(list) = lookup("DAG_WITNESSES") {
            config.genesis.witnesses = parse_witnesses(&list)?;
        }
        Ok(config)
    }

    /// Reject configurations the node cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.genesis.witnesses.is_empty() {
            return Err(ConfigError::EmptyWitnessList);
        }
        if self.ledger.submit_queue_capacity == 0 {
            return Err(ConfigError::ZeroQueueCapacity);
        }
        if self.storage.backend == StorageBackend::RocksDb && !cfg!(feature = "rocksdb") {
            return Err(ConfigError::RocksDbUnavailable);
        }
        Ok(())
    }
}

fn parse_witnesses(list: &str) -> Result<Vec<Address>, ConfigError> {
    let mut witnesses = list
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            Address::from_str(s).map_err(|_| ConfigError::InvalidValue {
                var: "DAG_WITNESSES",
                value: s.to_string(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    witnesses.sort();
    witnesses.dedup();
    Ok(witnesses)
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Genesis needs at least one witness; set DAG_WITNESSES or keep the default list")]
    EmptyWitnessList,

    #[error("Submission queue capacity must be positive")]
    ZeroQueueCapacity,

    #[error("RocksDB backend requested but the node was built without the `rocksdb` feature")]
    RocksDbUnavailable,

    #[error("Invalid value {value:?} for {var}")]
    InvalidValue { var: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageBackend {
    #[default]
    Memory,
    RocksDb,
}

impl FromStr for StorageBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StorageBackend::Memory),
            "rocksdb" => Ok(StorageBackend::RocksDb),
            _ => Err(ConfigError::InvalidValue {
                var: "DAG_STORAGE_BACKEND",
                value: s.to_string(),
            }),
        }
    }
}

/// Storage configuration.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    pub backend: StorageBackend,
    /// fsync every write group (RocksDB only).
    pub sync_writes: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            backend: StorageBackend::Memory,
            sync_writes: true,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// `EnvFilter` directive.
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}
