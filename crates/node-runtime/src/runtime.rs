//! # Node Runtime
//!
//! Owns the store, the transaction service and the background tasks.
//!
//! ## Startup Sequence
//!
//! 1. Open the configured key-value backend
//! 2. Seed genesis if the store is empty
//! 3. Build the transaction service on a shared event bus
//! 4. Spawn the submission pipeline
//! 5. Spawn the retry loop and the finality logger
//!
//! Shutdown flips a watch channel, closes the queue and waits for the
//! pipeline to drain.

use crate::container::{NodeConfig, StorageBackend, StorageConfig};
use anyhow::{Context, Result};
use dag_01_storage::{DagStore, InMemoryKVStore, KeyValueStore};
use dag_04_ledger::GenesisBuilder;
use dag_05_transaction::{spawn_pipeline, SubmissionQueue, TransactionService};
use parking_lot::Mutex;
use shared_bus::{InMemoryEventBus, LedgerEvent};
use shared_types::Hash;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_stream::StreamExt;
use tracing::{error, info, warn};

/// How often cached units are offered to the ledger again.
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(5);

pub struct NodeRuntime {
    config: NodeConfig,
    genesis: Hash,
    service: Arc<TransactionService>,
    queue: Mutex<Option<SubmissionQueue>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    retry_interval: Duration,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl NodeRuntime {
    /// Open storage, seed genesis and build the service. Nothing runs yet.
    pub fn new(config: NodeConfig) -> Result<Self> {
        config.validate().context("invalid node configuration")?;

        let store = DagStore::new(open_backend(&config.storage)?);
        let genesis = GenesisBuilder::new(config.genesis.clone())
            .bootstrap(&store)
            .context("failed to seed genesis")?;

        let bus = Arc::new(InMemoryEventBus::new());
        let service = Arc::new(TransactionService::new(store, config.ledger.clone(), bus));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        info!(genesis = %genesis, backend = ?config.storage.backend, "node runtime created");
        Ok(Self {
            config,
            genesis,
            service,
            queue: Mutex::new(None),
            tasks: Mutex::new(Vec::new()),
            retry_interval: DEFAULT_RETRY_INTERVAL,
            shutdown_tx,
            shutdown_rx,
        })
    }

    pub fn with_retry_interval(mut self, interval: Duration) -> Self {
        self.retry_interval = interval;
        self
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn genesis(&self) -> Hash {
        self.genesis
    }

    pub fn service(&self) -> &Arc<TransactionService> {
        &self.service
    }

    /// Submission handle; `None` before `start` and after `shutdown`.
    pub fn queue(&self) -> Option<SubmissionQueue> {
        self.queue.lock().clone()
    }

    /// Spawn the pipeline and background loops. Calling twice is a no-op.
    pub async fn start(&self) -> Result<()> {
        if self.queue.lock().is_some() {
            warn!("node runtime already started");
            return Ok(());
        }

        let (queue, pipeline) = spawn_pipeline(Arc::clone(&self.service));
        let retry = self.spawn_retry_loop();
        let logger = self.spawn_finality_logger();

        *self.queue.lock() = Some(queue);
        self.tasks.lock().extend([pipeline, retry, logger]);

        let witnesses = self
            .service
            .witness_set()
            .witnesses()
            .context("failed to read witness list")?;
        info!(
            witnesses = witnesses.len(),
            data_dir = ?self.config.storage.data_dir,
            "node runtime started"
        );
        Ok(())
    }

    /// Stop background loops and let the pipeline finish queued units.
    pub async fn shutdown(&self) {
        info!("initiating graceful shutdown");
        if let Err(e) = self.shutdown_tx.send(true) {
            error!("failed to send shutdown signal: {}", e);
        }
        // The pipeline exits once the last queue handle is gone.
        drop(self.queue.lock().take());

        let tasks: Vec<JoinHandle<()>> = self.tasks.lock().drain(..).collect();
        for task in tasks {
            if let Err(e) = task.await {
                warn!("background task ended abnormally: {}", e);
            }
        }
        info!("shutdown complete");
    }

    fn spawn_retry_loop(&self) -> JoinHandle<()> {
        let service = Arc::clone(&self.service);
        let mut shutdown = self.shutdown_rx.clone();
        let period = self.retry_interval;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        match service.retry_cached().await {
                            Ok(report) if !report.accepted.is_empty() || !report.dropped.is_empty() => info!(
                                accepted = report.accepted.len(),
                                dropped = report.dropped.len(),
                                waiting = report.waiting.len(),
                                "cached units retried"
                            ),
                            Ok(_) => {}
                            Err(e) => error!("retry of cached units failed: {}", e),
                        }
                    }
                    _ = shutdown.changed() => break,
                }
            }
        })
    }

    fn spawn_finality_logger(&self) -> JoinHandle<()> {
        let mut events = self.service.subscribe_finalized();
        let mut shutdown = self.shutdown_rx.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    event = events.next() => match event {
                        Some(LedgerEvent::BatchFinalized(batch)) => info!(
                            mci = batch.main_chain_index,
                            main_chain_unit = %batch.main_chain_unit,
                            units = batch.units.len(),
                            invalid = batch.invalid.len(),
                            "layer finalized"
                        ),
                        Some(_) => {}
                        None => break,
                    },
                    _ = shutdown.changed() => break,
                }
            }
        })
    }
}

fn open_backend(storage: &StorageConfig) -> Result<Arc<dyn KeyValueStore>> {
    match storage.backend {
        StorageBackend::Memory => Ok(Arc::new(InMemoryKVStore::new())),
        StorageBackend::RocksDb => open_rocksdb(storage),
    }
}

#[cfg(feature = "rocksdb")]
fn open_rocksdb(storage: &StorageConfig) -> Result<Arc<dyn KeyValueStore>> {
    use crate::adapters::{RocksDbConfig, RocksDbStore};

    std::fs::create_dir_all(&storage.data_dir)
        .with_context(|| format!("failed to create {:?}", storage.data_dir))?;
    let config = RocksDbConfig {
        path: storage.data_dir.join("ledger").to_string_lossy().to_string(),
        sync_writes: storage.sync_writes,
        ..RocksDbConfig::default()
    };
    let store = RocksDbStore::open(config).context("failed to open RocksDB")?;
    Ok(Arc::new(store))
}

#[cfg(not(feature = "rocksdb"))]
fn open_rocksdb(_storage: &StorageConfig) -> Result<Arc<dyn KeyValueStore>> {
    Err(crate::container::ConfigError::RocksDbUnavailable.into())
}
