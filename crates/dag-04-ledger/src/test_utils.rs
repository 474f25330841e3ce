//! Genesis-seeded ledger fixture shared by the unit tests.

use crate::genesis::{GenesisBuilder, GenesisConfig};
use dag_01_storage::{DagStore, InMemoryKVStore};
use dag_02_witness::{TipSet, WitnessSet};
use shared_types::{Address, Author, Hash, Message, Output, Payload, Unit, Utxo, UtxoKind};
use std::sync::Arc;

pub const FIXTURE_BALANCE: u64 = 1000;

pub struct LedgerFixture {
    pub store: DagStore,
    pub genesis: Hash,
    pub witnesses: Vec<Address>,
    pub witness_set: WitnessSet,
    pub tips: TipSet,
}

impl LedgerFixture {
    /// Four witnesses holding [`FIXTURE_BALANCE`] each.
    pub fn new() -> Self {
        let store = DagStore::new(Arc::new(InMemoryKVStore::new()));
        let witnesses: Vec<Address> = (1..=4).map(|b| Address([b; 20])).collect();
        let genesis = GenesisBuilder::new(GenesisConfig {
            witnesses: witnesses.clone(),
            balance: FIXTURE_BALANCE,
            timestamp: 0,
        })
        .bootstrap(&store)
        .unwrap();
        Self {
            witness_set: WitnessSet::new(store.clone(), 1),
            tips: TipSet::new(store.clone()),
            store,
            genesis,
            witnesses,
        }
    }

    pub fn witness(&self, i: usize) -> Address {
        self.witnesses[i]
    }

    pub fn genesis_utxo(&self, i: usize) -> Utxo {
        Utxo::new(
            self.genesis,
            0,
            i as u32,
            Output::new(self.witnesses[i], FIXTURE_BALANCE),
            UtxoKind::Normal,
        )
    }

    /// Seed one more stable output owned by `owner`, attributed to genesis.
    pub fn extra_stable_utxo(&self, owner: Address, i: u32, amount: u64) -> Utxo {
        let utxo = Utxo::new(
            self.genesis,
            0,
            100 + i,
            Output::new(owner, amount),
            UtxoKind::Normal,
        );
        let mut batch = self.store.batch();
        batch.put_stable_utxo(&utxo).unwrap();
        batch.commit().unwrap();
        utxo
    }
}

/// A sealed, fee-free payment unit.
pub fn payment(author: Address, inputs: Vec<Utxo>, outputs: Vec<Output>, parents: &[Hash]) -> Unit {
    let mut unit = Unit {
        parent_list: parents.to_vec(),
        authors: vec![Author::new(author)],
        messages: vec![Message::payment(Payload {
            inputs: inputs.iter().map(Into::into).collect(),
            outputs,
        })],
        headers_commission: 0,
        payload_commission: 0,
        ..Unit::default()
    };
    unit.seal();
    unit
}
