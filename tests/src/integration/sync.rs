//! # Catch-Up Sync
//!
//! A fresh node fed the output of `get_missing_units` from a busier node
//! must reach the same stable state, down to the Merkle root over its
//! stable units.

#[cfg(test)]
mod tests {
    use crate::integration::fixtures::Ledger;
    use dag_01_storage::DagRead;
    use dag_03_graph::verify_merkle_proof;
    use shared_types::Hash;

    async fn busy_ledger() -> Ledger {
        let ledger = Ledger::new();
        ledger.pay(ledger.w[0], ledger.w[1], 1000).await;
        for i in 0..11 {
            ledger.heartbeat(ledger.w[2 + i % 10]).await;
        }
        ledger
    }

    #[tokio::test]
    async fn test_fresh_node_catches_up() {
        let source = busy_ledger().await;
        let last_stable = source.last_stable_mci();
        assert!(last_stable >= 2);

        let (stable, unstable) = source.service.get_missing_units(last_stable, 0).unwrap();
        assert!(!stable.is_empty());
        assert!(!unstable.is_empty());
        assert!(stable.iter().all(|u| u.is_stable));
        assert!(stable.windows(2).all(|w| w[0].level <= w[1].level));
        let main_chain = source
            .service
            .get_missing_main_chain_units(last_stable, 0)
            .unwrap();
        assert_eq!(main_chain.len() as u64, last_stable + 1);

        let peer = Ledger::new();
        for unit in stable.iter().chain(unstable.iter()) {
            // Cached on failure; the retry below picks it up.
            let _ = peer.service.submit_unit(unit.clone()).await;
        }
        for _ in 0..3 {
            if peer.service.retry_cached().await.unwrap().waiting.is_empty() {
                break;
            }
        }

        assert!(peer.service.store().cached_units().unwrap().is_empty());
        assert_eq!(peer.last_stable_mci(), last_stable);
        assert_eq!(
            peer.service.tip_set().tips().unwrap(),
            source.service.tip_set().tips().unwrap()
        );
        for w in &source.w {
            assert_eq!(
                peer.service.balance_of(w).unwrap(),
                source.service.balance_of(w).unwrap()
            );
        }
        for mci in 0..=last_stable {
            assert_eq!(
                peer.service.store().main_chain_unit(mci).unwrap(),
                source.service.store().main_chain_unit(mci).unwrap()
            );
        }
        assert_eq!(
            peer.service.main_chain_merkle_root().unwrap(),
            source.service.main_chain_merkle_root().unwrap()
        );
    }

    #[tokio::test]
    async fn test_partial_catch_up_skips_known_layers() {
        let source = busy_ledger().await;
        let last_stable = source.last_stable_mci();

        let (stable, _) = source.service.get_missing_units(last_stable, 1).unwrap();
        assert!(stable.iter().all(|u| u.main_chain_index > 1));

        let main_chain = source
            .service
            .get_missing_main_chain_units(last_stable, 1)
            .unwrap();
        assert_eq!(main_chain.len() as u64, last_stable);
    }

    #[tokio::test]
    async fn test_stable_units_prove_membership() {
        let ledger = Ledger::new();
        assert_eq!(ledger.service.main_chain_merkle_root().unwrap(), Hash::ZERO);

        let (payment, _) = ledger.pay(ledger.w[0], ledger.w[1], 1000).await;
        assert!(!ledger.service.is_unit_in_merkle_tree(&payment.hash).unwrap());
        assert!(ledger.service.merkle_proof(&payment.hash).unwrap().is_none());

        ledger
            .heartbeat_until(|l| l.is_stable(&payment.hash), 12)
            .await;
        let root = ledger.service.main_chain_merkle_root().unwrap();
        assert_ne!(root, Hash::ZERO);
        assert!(ledger.service.is_unit_in_merkle_tree(&payment.hash).unwrap());
        let proof = ledger.service.merkle_proof(&payment.hash).unwrap().unwrap();
        assert!(verify_merkle_proof(&payment.hash, &proof, &root));

        let genesis = ledger.service.store().main_chain_unit(0).unwrap().unwrap();
        assert!(!ledger.service.is_unit_in_merkle_tree(&genesis).unwrap());

        // Each newly stable layer moves the root.
        let mci = ledger.last_stable_mci();
        ledger
            .heartbeat_until(|l| l.last_stable_mci() > mci, 12)
            .await;
        assert_ne!(ledger.service.main_chain_merkle_root().unwrap(), root);
        assert!(ledger.service.is_unit_in_merkle_tree(&payment.hash).unwrap());
    }
}
