//! # Submission Queue
//!
//! Units from every source go through one bounded queue and are processed
//! strictly in arrival order by a single worker task. Pending outputs can
//! only be spent by units that arrive after the unit creating them, so the
//! order matters.

use crate::errors::{TransactionError, TransactionResult};
use crate::service::{Accepted, TransactionService};
use shared_types::Unit;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

struct SubmitRequest {
    unit: Unit,
    reply: oneshot::Sender<TransactionResult<Accepted>>,
}

/// Sending half of the pipeline. Cheap to clone.
#[derive(Clone)]
pub struct SubmissionQueue {
    sender: mpsc::Sender<SubmitRequest>,
}

impl SubmissionQueue {
    /// Enqueue `unit` and wait for its outcome. Waits for room when the
    /// queue is full.
    pub async fn submit(&self, unit: Unit) -> TransactionResult<Accepted> {
        let (reply, outcome) = oneshot::channel();
        self.sender
            .send(SubmitRequest { unit, reply })
            .await
            .map_err(|_| TransactionError::QueueClosed)?;
        outcome.await.map_err(|_| TransactionError::QueueClosed)?
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

/// Start the worker. It stops once every [`SubmissionQueue`] is dropped.
pub fn spawn_pipeline(service: Arc<TransactionService>) -> (SubmissionQueue, JoinHandle<()>) {
    let capacity = service.config().submit_queue_capacity.max(1);
    let (sender, mut receiver) = mpsc::channel::<SubmitRequest>(capacity);

    let handle = tokio::spawn(async move {
        info!(capacity, "submission pipeline started");
        while let Some(request) = receiver.recv().await {
            let hash = request.unit.hash;
            let outcome = service.submit_unit(request.unit).await;
            if request.reply.send(outcome).is_err() {
                debug!(unit = %hash, "submitter went away before the outcome");
            }
        }
        info!("submission pipeline stopped");
    });

    (SubmissionQueue { sender }, handle)
}
