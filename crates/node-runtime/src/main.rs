//! # DAG Ledger Node
//!
//! Starts a single ledger node and runs until interrupted.
//!
//! ## Startup Sequence
//!
//! 1. Load configuration from `DAG_*` environment variables
//! 2. Install the tracing subscriber
//! 3. Open storage and seed genesis (if not exists)
//! 4. Start the submission pipeline and background tasks
//! 5. Wait for Ctrl+C, then drain and stop

use anyhow::{Context, Result};
use node_runtime::{NodeConfig, NodeRuntime};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    let config = NodeConfig::from_env().context("failed to load configuration")?;

    let filter = EnvFilter::try_new(&config.logging.filter)
        .with_context(|| format!("invalid log filter {:?}", config.logging.filter))?;
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("starting DAG ledger node");
    let runtime = NodeRuntime::new(config)?;
    runtime.start().await?;

    info!("node running, press Ctrl+C to stop");
    tokio::signal::ctrl_c().await?;

    runtime.shutdown().await;
    Ok(())
}
