//! # Node Runtime
//!
//! Drives a node through its submission queue, as the binary does.

#[cfg(test)]
mod tests {
    use node_runtime::{NodeConfig, NodeRuntime};
    use shared_bus::LedgerEvent;
    use std::time::Duration;
    use tokio::time::timeout;
    use tokio_stream::StreamExt;

    #[tokio::test]
    async fn test_payment_through_queue_reaches_finality() {
        let runtime = NodeRuntime::new(NodeConfig::default())
            .unwrap()
            .with_retry_interval(Duration::from_millis(50));
        runtime.start().await.unwrap();

        let service = runtime.service().clone();
        let queue = runtime.queue().unwrap();
        let witnesses = service.witness_set().witnesses().unwrap();
        let mut finalized = service.subscribe_finalized();

        let payment = service
            .compose_payment(witnesses[0], witnesses[1], 1000)
            .unwrap();
        queue.submit(payment.clone()).await.unwrap();
        for author in &witnesses[2..=9] {
            let unit = service.compose_payment(*author, *author, 1).unwrap();
            queue.submit(unit).await.unwrap();
        }

        let event = timeout(Duration::from_secs(5), finalized.next())
            .await
            .unwrap();
        let Some(LedgerEvent::BatchFinalized(batch)) = event else {
            panic!("expected a finalized batch");
        };
        assert_eq!(batch.main_chain_index, 1);
        assert_eq!(batch.main_chain_unit, payment.hash);

        drop(queue);
        runtime.shutdown().await;
        assert!(runtime.queue().is_none());
    }

    #[tokio::test]
    async fn test_queue_reports_rejections() {
        let runtime = NodeRuntime::new(NodeConfig::default()).unwrap();
        runtime.start().await.unwrap();

        let service = runtime.service().clone();
        let witnesses = service.witness_set().witnesses().unwrap();
        let mut unit = service
            .compose_payment(witnesses[0], witnesses[1], 10)
            .unwrap();
        unit.headers_commission = 0;

        let queue = runtime.queue().unwrap();
        assert!(queue.submit(unit).await.is_err());

        drop(queue);
        runtime.shutdown().await;
    }
}
