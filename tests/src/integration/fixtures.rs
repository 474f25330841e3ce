//! Shared ledger fixture for the integration scenarios.

use dag_01_storage::{DagRead, DagStore, InMemoryKVStore};
use dag_03_graph::ManualTimeSource;
use dag_04_ledger::{GenesisBuilder, GenesisConfig};
use dag_05_transaction::{Accepted, LedgerConfig, TransactionService};
use shared_bus::{FinalizedBatch, InMemoryEventBus};
use shared_types::{Address, Hash, Unit, UtxoKind};
use std::sync::Arc;

pub const NOW: u64 = 1_700_000_000;
pub const BALANCE: u64 = 10_000_000;

/// Twelve witnesses `[1; 20]` through `[12; 20]`, in sorted order.
pub fn witnesses() -> Vec<Address> {
    (1..=12).map(|b| Address([b; 20])).collect()
}

pub struct Ledger {
    pub service: TransactionService,
    pub clock: Arc<ManualTimeSource>,
    pub kv: Arc<InMemoryKVStore>,
    pub w: Vec<Address>,
}

impl Ledger {
    pub fn new() -> Self {
        let kv = Arc::new(InMemoryKVStore::new());
        let store = DagStore::new(kv.clone());
        GenesisBuilder::new(GenesisConfig {
            witnesses: witnesses(),
            balance: BALANCE,
            timestamp: 0,
        })
        .bootstrap(&store)
        .unwrap();
        Self::on_store(kv, Arc::new(ManualTimeSource::new(NOW)))
    }

    /// A service over an existing store, as after a restart.
    pub fn on_store(kv: Arc<InMemoryKVStore>, clock: Arc<ManualTimeSource>) -> Self {
        let service = TransactionService::new(
            DagStore::new(kv.clone()),
            LedgerConfig::default(),
            Arc::new(InMemoryEventBus::new()),
        )
        .with_clock(clock.clone());
        Self {
            service,
            clock,
            kv,
            w: witnesses(),
        }
    }

    pub async fn pay(&self, from: Address, to: Address, amount: u64) -> (Unit, Accepted) {
        let unit = self.service.compose_payment(from, to, amount).unwrap();
        let accepted = self.service.submit_unit(unit.clone()).await.unwrap();
        (unit, accepted)
    }

    /// A minimal self-payment that only moves the DAG forward.
    pub async fn heartbeat(&self, author: Address) -> Accepted {
        self.pay(author, author, 1).await.1
    }

    /// Heartbeats by `w[2]..=w[11]` in turn until `done` holds. Returns
    /// every batch finalized on the way.
    pub async fn heartbeat_until<F>(&self, mut done: F, limit: usize) -> Vec<FinalizedBatch>
    where
        F: FnMut(&Self) -> bool,
    {
        let mut finalized = Vec::new();
        for i in 0..limit {
            if done(self) {
                return finalized;
            }
            let author = self.w[2 + i % 10];
            finalized.extend(self.heartbeat(author).await.finalized);
        }
        assert!(done(self), "condition not reached after {limit} heartbeats");
        finalized
    }

    /// Stable balance from plain outputs only, ignoring commissions.
    pub fn normal_balance(&self, address: &Address) -> u128 {
        self.service
            .store()
            .stable_utxos(address)
            .unwrap()
            .iter()
            .filter(|u| u.kind == UtxoKind::Normal)
            .map(|u| u.amount() as u128)
            .sum()
    }

    pub fn is_stable(&self, hash: &Hash) -> bool {
        self.service
            .store()
            .unit(hash)
            .unwrap()
            .map_or(false, |u| u.is_stable)
    }

    pub fn unit(&self, hash: &Hash) -> Unit {
        self.service.store().unit(hash).unwrap().unwrap()
    }

    pub fn last_stable_mci(&self) -> u64 {
        let store = self.service.store();
        let mut mci = 0;
        while store.main_chain_unit(mci + 1).unwrap().is_some() {
            mci += 1;
        }
        mci
    }
}
