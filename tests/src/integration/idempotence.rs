//! # Replays and Restarts

#[cfg(test)]
mod tests {
    use crate::integration::fixtures::{witnesses, Ledger, BALANCE};
    use dag_01_storage::{DagRead, DagStore};
    use dag_04_ledger::{GenesisBuilder, GenesisConfig};
    use dag_05_transaction::{ErrorKind, RetryReport};

    #[tokio::test]
    async fn test_replayed_units_change_nothing() {
        let ledger = Ledger::new();
        let mut units = vec![ledger.pay(ledger.w[0], ledger.w[1], 1000).await.0];
        for author in &ledger.w[2..=10] {
            units.push(ledger.service.compose_payment(*author, *author, 1).unwrap());
            ledger
                .service
                .submit_unit(units.last().unwrap().clone())
                .await
                .unwrap();
        }
        let tips = ledger.service.tip_set().tips().unwrap();
        let balances: Vec<u128> = ledger
            .w
            .iter()
            .map(|w| ledger.service.balance_of(w).unwrap())
            .collect();
        let last_stable = ledger.last_stable_mci();

        for unit in &units {
            let err = ledger.service.submit_unit(unit.clone()).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Duplicate);
        }

        assert_eq!(ledger.service.tip_set().tips().unwrap(), tips);
        assert_eq!(ledger.last_stable_mci(), last_stable);
        for (w, balance) in ledger.w.iter().zip(&balances) {
            assert_eq!(ledger.service.balance_of(w).unwrap(), *balance);
        }
        assert!(ledger.service.store().cached_units().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_restart_resumes_from_store() {
        let ledger = Ledger::new();
        let (payment, _) = ledger.pay(ledger.w[0], ledger.w[1], 1000).await;
        for author in &ledger.w[2..=6] {
            ledger.heartbeat(*author).await;
        }
        let tips = ledger.service.tip_set().tips().unwrap();
        let pending = ledger.service.pending_balance_of(&ledger.w[0]).unwrap();
        let (kv, clock) = (ledger.kv.clone(), ledger.clock.clone());
        drop(ledger);

        // Seeding again is a no-op on a populated store.
        let store = DagStore::new(kv.clone());
        let genesis = store.main_chain_unit(0).unwrap().unwrap();
        let again = GenesisBuilder::new(GenesisConfig {
            witnesses: witnesses(),
            balance: BALANCE,
            timestamp: 0,
        })
        .bootstrap(&store)
        .unwrap();
        assert_eq!(again, genesis);

        let restarted = Ledger::on_store(kv, clock);
        assert_eq!(restarted.service.tip_set().tips().unwrap(), tips);
        assert_eq!(
            restarted.service.witness_set().witnesses().unwrap(),
            witnesses()
        );
        assert_eq!(
            restarted.service.pending_balance_of(&restarted.w[0]).unwrap(),
            pending
        );
        assert_eq!(
            restarted.service.retry_cached().await.unwrap(),
            RetryReport::default()
        );

        restarted
            .heartbeat_until(|l| l.is_stable(&payment.hash), 24)
            .await;
        assert_eq!(
            restarted.normal_balance(&restarted.w[1]),
            BALANCE as u128 + 1000
        );
    }
}
