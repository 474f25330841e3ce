//! In-memory DAG fixture shared by the unit tests.

use crate::graph_info::GraphInfoGetter;
use crate::main_chain::{MainChainUpdater, StableLayer};
use dag_01_storage::{DagRead, DagStore, InMemoryKVStore};
use shared_types::{Address, Author, Hash, Message, Output, Payload, Unit};
use std::sync::Arc;

pub struct DagBuilder {
    store: DagStore,
    witnesses: Vec<Address>,
    genesis: Hash,
    last: Hash,
    next_author: usize,
    seq: u64,
}

impl DagBuilder {
    pub const NOW: u64 = 1_700_000_000;

    /// Genesis authored by witness 0, stable at MCI 0.
    pub fn new(witness_count: u8) -> Self {
        let store = DagStore::new(Arc::new(InMemoryKVStore::new()));
        let witnesses: Vec<Address> = (1..=witness_count).map(|b| Address([b; 20])).collect();
        let mut genesis = Unit {
            witness_list: witnesses.clone(),
            authors: vec![Author::new(witnesses[0])],
            is_stable: true,
            is_on_main_chain: true,
            ..Unit::default()
        };
        genesis.seal();

        let mut batch = store.batch();
        batch.put_unit(&genesis).unwrap();
        batch.put_tip(&genesis.hash).unwrap();
        batch.put_main_chain_index(0, &genesis.hash).unwrap();
        for w in &witnesses {
            batch.put_witness(w).unwrap();
        }
        batch.commit().unwrap();

        Self {
            store,
            witnesses,
            genesis: genesis.hash,
            last: genesis.hash,
            next_author: 1,
            seq: 0,
        }
    }

    pub fn store(&self) -> DagStore {
        self.store.clone()
    }

    pub fn witnesses(&self) -> &[Address] {
        &self.witnesses
    }

    pub fn genesis(&self) -> Hash {
        self.genesis
    }

    pub fn set_last(&mut self, hash: Hash) {
        self.last = hash;
    }

    /// Insert a unit authored by witness `author` on top of `parents`.
    pub fn add(&mut self, author: usize, parents: &[Hash]) -> Hash {
        self.seq += 1;
        let author = self.witnesses[author % self.witnesses.len()];
        let info = GraphInfoGetter::new(&self.store, parents, &self.witnesses).unwrap();
        let mut unit = Unit {
            witness_list: self.witnesses.clone(),
            timestamp: self.seq,
            parent_list: parents.to_vec(),
            authors: vec![Author::new(author)],
            messages: vec![Message::payment(Payload {
                inputs: vec![],
                outputs: vec![Output::new(author, self.seq)],
            })],
            level: info.level(),
            best_parent_unit: info.best_parent_unit(),
            witnessed_level: info.witnessed_level().unwrap(),
            ..Unit::default()
        };
        unit.seal();

        let mut batch = self.store.batch();
        batch.put_unit(&unit).unwrap();
        for parent in parents {
            batch.delete_tip(parent);
        }
        batch.put_tip(&unit.hash).unwrap();
        batch.commit().unwrap();
        unit.hash
    }

    /// Append `count` single-parent units, rotating through the witnesses.
    pub fn extend_chain(&mut self, count: usize) -> Hash {
        for _ in 0..count {
            let author = self.next_author;
            self.next_author += 1;
            self.last = self.add(author, &[self.last]);
        }
        self.last
    }

    /// Join `other` into the chain with a two-parent unit.
    pub fn merge(&mut self, other: Hash) -> Hash {
        let author = self.next_author;
        self.next_author += 1;
        self.last = self.add(author, &[self.last, other]);
        self.last
    }

    /// Run the stabilization loop for `unit` until it stalls.
    pub fn stabilize(&mut self, unit: Hash) -> Vec<StableLayer> {
        let unit = self.store.unit(&unit).unwrap().unwrap();
        let mut updater = MainChainUpdater::new(&self.store, &unit).unwrap();
        let mut layers = Vec::new();
        loop {
            let tips = self.store.tips().unwrap();
            if !updater.can_extend(&self.store, &tips).unwrap() {
                break;
            }
            let units = updater.next_batch(&self.store).unwrap();
            let mut batch = self.store.batch();
            layers.push(updater.extend(&mut batch, units, Self::NOW).unwrap());
            batch.commit().unwrap();
        }
        layers
    }
}
