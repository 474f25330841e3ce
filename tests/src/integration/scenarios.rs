//! # End-to-End Scenarios
//!
//! Settlement of a single payment, resolution of two payments racing for
//! the same output and of change built on the loser, rejection of a
//! shrunken witness list, and the lower bound of the missing-units query.

#[cfg(test)]
mod tests {
    use crate::integration::fixtures::{Ledger, BALANCE};
    use dag_01_storage::DagRead;
    use dag_03_graph::GraphInfoGetter;
    use dag_04_ledger::LedgerError;
    use dag_05_transaction::{ErrorKind, TransactionError};

    // =============================================================================
    // SETTLEMENT
    // =============================================================================

    #[tokio::test]
    async fn test_payment_settles_only_once_stable() {
        let ledger = Ledger::new();
        let (w0, w1) = (ledger.w[0], ledger.w[1]);

        let (payment, accepted) = ledger.pay(w0, w1, 1000).await;
        assert_eq!(payment.headers_commission, 100);
        assert_eq!(payment.payload_commission, 100);
        assert_eq!(accepted.level, 1);

        // Levels 2..=8: the payment is still pending.
        for author in &ledger.w[2..=8] {
            let accepted = ledger.heartbeat(*author).await;
            assert!(accepted.finalized.is_empty());
            assert_eq!(ledger.normal_balance(&w0), BALANCE as u128);
            assert_eq!(ledger.normal_balance(&w1), BALANCE as u128);
        }

        let accepted = ledger.heartbeat(ledger.w[9]).await;
        assert_eq!(accepted.finalized.len(), 1);
        assert_eq!(accepted.finalized[0].main_chain_unit, payment.hash);
        assert!(ledger.is_stable(&payment.hash));

        assert_eq!(ledger.normal_balance(&w0), BALANCE as u128 - 1200);
        assert_eq!(ledger.normal_balance(&w1), BALANCE as u128 + 1000);
        assert!(ledger
            .service
            .store()
            .pending_utxos(&w0)
            .unwrap()
            .iter()
            .all(|u| u.unit_hash != payment.hash));
    }

    // =============================================================================
    // DOUBLE SPEND
    // =============================================================================

    #[tokio::test]
    async fn test_first_stabilized_spend_wins() {
        let ledger = Ledger::new();
        let (w0, w1) = (ledger.w[0], ledger.w[1]);

        // Both claim w0's single genesis output.
        let a = ledger.service.compose_payment(w0, w1, 1000).unwrap();
        let b = ledger.service.compose_payment(w0, w1, 2000).unwrap();
        assert_eq!(
            a.messages[0].payload.inputs[0],
            b.messages[0].payload.inputs[0]
        );
        ledger.service.submit_unit(a.clone()).await.unwrap();
        ledger.service.submit_unit(b.clone()).await.unwrap();
        assert_eq!(ledger.service.tip_set().tips().unwrap().len(), 2);

        let finalized = ledger
            .heartbeat_until(|l| l.is_stable(&a.hash) && l.is_stable(&b.hash), 20)
            .await;

        let first = finalized
            .iter()
            .flat_map(|batch| batch.units.iter())
            .find(|h| **h == a.hash || **h == b.hash)
            .copied()
            .unwrap();
        let (winner, loser, paid) = if first == a.hash {
            (&a, &b, 1000u128)
        } else {
            (&b, &a, 2000u128)
        };

        assert!(!ledger.unit(&winner.hash).invalid);
        assert!(ledger.unit(&loser.hash).invalid);
        assert!(finalized.iter().any(|batch| batch.invalid.contains(&loser.hash)));
        assert!(finalized.iter().all(|batch| !batch.invalid.contains(&winner.hash)));

        assert_eq!(ledger.normal_balance(&w1), BALANCE as u128 + paid);
        assert_eq!(ledger.normal_balance(&w0), BALANCE as u128 - paid - 200);
        assert!(ledger
            .service
            .store()
            .pending_utxos(&w0)
            .unwrap()
            .iter()
            .all(|u| u.unit_hash != loser.hash));
    }

    #[tokio::test]
    async fn test_change_built_on_the_losing_spend_is_dropped() {
        let ledger = Ledger::new();
        let (w0, w3) = (ledger.w[0], ledger.w[3]);

        let a = ledger.service.compose_payment(w0, ledger.w[1], 9_000_000).unwrap();
        let b = ledger.service.compose_payment(w0, ledger.w[2], 1_000).unwrap();
        ledger.service.submit_unit(a.clone()).await.unwrap();
        ledger.service.submit_unit(b.clone()).await.unwrap();
        for author in &ledger.w[2..=8] {
            ledger.heartbeat(*author).await;
        }

        // Needs the change of both claims, and hangs off them directly so
        // it stabilizes well after they do.
        let mut follow = ledger.service.compose_payment(w0, w3, 10_000_000).unwrap();
        assert_eq!(follow.messages[0].payload.inputs.len(), 2);
        follow.parent_list = vec![a.hash, b.hash];
        let info = GraphInfoGetter::new(ledger.service.store(), &follow.parent_list, &follow.witness_list)
            .unwrap();
        follow.level = info.level();
        follow.best_parent_unit = info.best_parent_unit();
        follow.witnessed_level = info.witnessed_level().unwrap();
        follow.seal();
        ledger.service.submit_unit(follow.clone()).await.unwrap();
        assert!(ledger.service.pending_balance_of(&w0).unwrap() > 0);

        ledger
            .heartbeat_until(|l| l.is_stable(&a.hash) && l.is_stable(&b.hash), 12)
            .await;
        assert!(ledger.unit(&a.hash).invalid != ledger.unit(&b.hash).invalid);
        assert!(!ledger.is_stable(&follow.hash));

        let store = ledger.service.store();
        assert!(store.pending_utxos(&w0).unwrap().is_empty());
        assert_eq!(ledger.service.pending_balance_of(&w0).unwrap(), 0);
        let spendable = ledger.service.spendable_utxos(&w0).unwrap();
        assert!(spendable.iter().all(|u| u.unit_hash != follow.hash));
        assert!(spendable.iter().all(|u| store.has_stable_utxo(u).unwrap()));
    }

    #[tokio::test]
    async fn test_spending_a_stable_spent_output_conflicts() {
        let ledger = Ledger::new();
        let (w0, w1) = (ledger.w[0], ledger.w[1]);

        let late = ledger.service.compose_payment(w0, w1, 10).unwrap();
        let (payment, _) = ledger.pay(w0, w1, 1000).await;
        ledger
            .heartbeat_until(|l| l.is_stable(&payment.hash), 12)
            .await;

        let err = ledger.service.submit_unit(late.clone()).await.unwrap_err();
        assert!(matches!(
            err,
            TransactionError::Ledger(LedgerError::SpentByStableUnit { .. })
        ));
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert!(!err.is_retryable());
        assert!(!ledger.service.store().has_unit(&late.hash).unwrap());
        assert!(ledger.service.store().cached_units().unwrap().is_empty());
    }

    // =============================================================================
    // WITNESS QUORUM
    // =============================================================================

    #[tokio::test]
    async fn test_single_witness_list_cannot_stabilize() {
        let ledger = Ledger::new();
        let w0 = ledger.w[0];
        let (first, _) = ledger.pay(w0, ledger.w[1], 1000).await;

        // A self-declared one-witness list would reach majority on its own.
        let mut unit = ledger.service.compose_payment(w0, w0, 1).unwrap();
        unit.witness_list = vec![w0];
        let info = GraphInfoGetter::new(ledger.service.store(), &unit.parent_list, &unit.witness_list)
            .unwrap();
        unit.witnessed_level = info.witnessed_level().unwrap();
        unit.seal();

        let err = ledger.service.submit_unit(unit.clone()).await.unwrap_err();
        assert_eq!(
            err,
            TransactionError::WitnessListSize {
                unit: unit.hash,
                declared: 1,
                expected: 12,
            }
        );
        assert_eq!(err.kind(), ErrorKind::Structural);
        assert!(!ledger.service.store().has_unit(&unit.hash).unwrap());
        assert!(ledger.service.store().cached_units().unwrap().is_empty());
        assert!(!ledger.is_stable(&first.hash));
        assert_eq!(ledger.last_stable_mci(), 0);
    }

    // =============================================================================
    // SYNC BOUNDS
    // =============================================================================

    #[tokio::test]
    async fn test_peer_ahead_gets_nothing() {
        let ledger = Ledger::new();
        let (payment, _) = ledger.pay(ledger.w[0], ledger.w[1], 1000).await;
        ledger
            .heartbeat_until(|l| l.is_stable(&payment.hash), 12)
            .await;

        let (stable, unstable) = ledger.service.get_missing_units(5, 10).unwrap();
        assert!(stable.is_empty());
        assert!(unstable.is_empty());
        assert!(ledger
            .service
            .get_missing_main_chain_units(5, 10)
            .unwrap()
            .is_empty());
    }
}
