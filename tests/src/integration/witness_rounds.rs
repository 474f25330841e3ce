//! # Witness Rounds
//!
//! Closing vote windows and applying their results through the service.

#[cfg(test)]
mod tests {
    use crate::integration::fixtures::{Ledger, NOW};
    use dag_01_storage::DagRead;
    use dag_02_witness::WitnessError;
    use dag_05_transaction::TransactionError;
    use shared_bus::{EventFilter, EventTopic, LedgerEvent};
    use shared_types::{Address, VoteResult};

    const CAMPAIGNER: Address = Address([0xAA; 20]);

    /// Funds the campaigner, stabilizes the funding and lets it author three
    /// units at `NOW + 10`.
    async fn active_campaigner() -> Ledger {
        let ledger = Ledger::new();
        let (funding, _) = ledger.pay(ledger.w[0], CAMPAIGNER, 100_000).await;
        ledger
            .heartbeat_until(|l| l.is_stable(&funding.hash), 12)
            .await;

        ledger.clock.advance(10);
        for _ in 0..3 {
            ledger.heartbeat(CAMPAIGNER).await;
        }
        ledger
    }

    /// Lets the campaigner author three more units at `at` and closes the
    /// next round at `end`.
    async fn decide_next_round(ledger: &Ledger, at: u64, end: u64) -> VoteResult {
        ledger.clock.set(at);
        for _ in 0..3 {
            ledger.heartbeat(CAMPAIGNER).await;
        }
        ledger.service.close_vote_round(end, 2).unwrap().unwrap()
    }

    #[tokio::test]
    async fn test_first_stabilization_closes_round_zero() {
        let ledger = active_campaigner().await;
        let round0 = ledger.service.store().vote_result(0).unwrap().unwrap();
        assert_eq!(round0.end_time, NOW);
        assert_eq!(ledger.service.store().vote_round().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_vote_then_replace() {
        let ledger = active_campaigner().await;
        let mut governance = ledger
            .service
            .subscribe(EventFilter::topics(vec![EventTopic::Governance]));

        // Three units do not beat a threshold of three.
        assert_eq!(ledger.service.close_vote_round(NOW + 20, 3).unwrap(), None);
        assert_eq!(ledger.service.store().vote_round().unwrap(), 0);

        let result = ledger
            .service
            .close_vote_round(NOW + 20, 2)
            .unwrap()
            .unwrap();
        assert_eq!(result.round, 1);
        assert_eq!((result.start_time, result.end_time), (NOW, NOW + 20));
        assert_eq!(result.vote_result, CAMPAIGNER);
        // w[1] authored nothing and is listed before the other idle witnesses.
        assert_eq!(result.replaced_witness, ledger.w[1]);
        assert_eq!(ledger.service.store().vote_round().unwrap(), 1);

        // Saving a vote does not touch the membership, and the result only
        // takes effect once the following round is decided.
        assert!(ledger.service.witness_set().contains(&ledger.w[1]).unwrap());
        assert!(matches!(
            ledger.service.apply_witness_replacement(1).await,
            Err(TransactionError::Witness(WitnessError::NotYetEffective {
                round: 1,
                vote_round: 1,
                ..
            }))
        ));
        assert!(ledger.service.witness_set().contains(&ledger.w[1]).unwrap());

        let next = decide_next_round(&ledger, NOW + 25, NOW + 40).await;
        assert_eq!(next.round, 2);
        assert_eq!((next.start_time, next.end_time), (NOW + 20, NOW + 40));

        let applied = ledger.service.apply_witness_replacement(1).await.unwrap();
        assert_eq!(applied, result);
        let witnesses = ledger.service.witness_set().witnesses().unwrap();
        assert_eq!(witnesses.len(), 12);
        assert!(witnesses.contains(&CAMPAIGNER));
        assert!(!witnesses.contains(&ledger.w[1]));
        assert!(witnesses.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(ledger.service.store().replace_round().unwrap(), Some(0));

        match governance.recv().await.unwrap() {
            LedgerEvent::WitnessReplaced {
                round,
                replaced,
                replacement,
            } => {
                assert_eq!(round, 1);
                assert_eq!(replaced, ledger.w[1]);
                assert_eq!(replacement, CAMPAIGNER);
            }
            other => panic!("unexpected event {other:?}"),
        }

        // Units built on the new list still go through.
        let accepted = ledger.heartbeat(ledger.w[2]).await;
        assert!(accepted.level > 0);
    }

    #[tokio::test]
    async fn test_replacement_out_of_order_is_rejected() {
        let ledger = active_campaigner().await;
        assert!(matches!(
            ledger.service.apply_witness_replacement(1).await,
            Err(TransactionError::Witness(WitnessError::MissingVoteResult(1)))
        ));

        ledger.service.close_vote_round(NOW + 20, 2).unwrap().unwrap();
        decide_next_round(&ledger, NOW + 25, NOW + 40).await;
        ledger.service.apply_witness_replacement(1).await.unwrap();
        assert!(matches!(
            ledger.service.apply_witness_replacement(1).await,
            Err(TransactionError::Witness(WitnessError::RoundOutOfOrder { round: 1, .. }))
        ));
        assert!(matches!(
            ledger.service.apply_witness_replacement(2).await,
            Err(TransactionError::Witness(WitnessError::NotYetEffective { round: 2, .. }))
        ));
    }

    #[tokio::test]
    async fn test_restarted_node_decides_replacement_alike() {
        let ledger = active_campaigner().await;
        ledger.service.close_vote_round(NOW + 20, 2).unwrap().unwrap();

        let restarted = Ledger::on_store(ledger.kv.clone(), ledger.clock.clone());
        let running = ledger.service.apply_witness_replacement(1).await.unwrap_err();
        let fresh = restarted.service.apply_witness_replacement(1).await.unwrap_err();
        assert_eq!(running, fresh);

        decide_next_round(&ledger, NOW + 25, NOW + 40).await;
        let restarted = Ledger::on_store(ledger.kv.clone(), ledger.clock.clone());
        restarted.service.apply_witness_replacement(1).await.unwrap();
        assert_eq!(restarted.service.store().replace_round().unwrap(), Some(0));

        let reopened = Ledger::on_store(ledger.kv.clone(), ledger.clock.clone());
        let witnesses = reopened.service.witness_set().witnesses().unwrap();
        assert!(witnesses.contains(&CAMPAIGNER));
        assert!(matches!(
            reopened.service.apply_witness_replacement(1).await,
            Err(TransactionError::Witness(WitnessError::RoundOutOfOrder { round: 1, .. }))
        ));
    }

    #[tokio::test]
    async fn test_next_window_starts_where_the_last_ended() {
        let ledger = active_campaigner().await;
        ledger.service.close_vote_round(NOW + 20, 2).unwrap().unwrap();

        // Only a witness authors inside [NOW + 20, NOW + 30).
        ledger.clock.set(NOW + 25);
        ledger.heartbeat(ledger.w[3]).await;
        assert_eq!(ledger.service.close_vote_round(NOW + 30, 0).unwrap(), None);
        assert_eq!(ledger.service.store().vote_round().unwrap(), 1);
    }
}
