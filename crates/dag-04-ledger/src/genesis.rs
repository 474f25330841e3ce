//! # Genesis
//!
//! Seeds an empty store with the genesis unit: stable, on the main chain at
//! index 0, crediting every witness with the configured balance.

use crate::errors::{LedgerError, LedgerResult};
use dag_01_storage::{DagRead, DagStore};
use serde::{Deserialize, Serialize};
use shared_types::{
    canonical_hash, Address, Author, Ball, Hash, Message, Output, Payload, Unit, Utxo, UtxoKind,
    VoteResult, GENESIS_WITNESS_BALANCE, GENESIS_WITNESS_COUNT,
};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisConfig {
    pub witnesses: Vec<Address>,
    /// Credited to every witness.
    pub balance: u64,
    pub timestamp: u64,
}

impl Default for GenesisConfig {
    fn default() -> Self {
        Self {
            witnesses: default_witnesses(GENESIS_WITNESS_COUNT),
            balance: GENESIS_WITNESS_BALANCE,
            timestamp: 0,
        }
    }
}

/// Deterministic development witness addresses.
pub fn default_witnesses(count: usize) -> Vec<Address> {
    let mut witnesses: Vec<Address> = (0..count)
        .map(|i| {
            let digest = canonical_hash(&format!("genesis-witness-{i}"));
            let mut bytes = [0u8; Address::LEN];
            bytes.copy_from_slice(&digest.as_bytes()[..Address::LEN]);
            Address(bytes)
        })
        .collect();
    witnesses.sort();
    witnesses
}

pub struct GenesisBuilder {
    config: GenesisConfig,
}

impl GenesisBuilder {
    pub fn new(config: GenesisConfig) -> Self {
        Self { config }
    }

    /// The genesis unit for this configuration.
    ///
    /// Witnesses are sorted by address; the first one authors the unit.
    pub fn build_unit(&self) -> LedgerResult<Unit> {
        let mut witnesses = self.config.witnesses.clone();
        witnesses.sort();
        witnesses.dedup();
        let author = *witnesses.first().ok_or(LedgerError::EmptyWitnessList)?;

        let payload = Payload {
            inputs: Vec::new(),
            outputs: witnesses
                .iter()
                .map(|w| Output::new(*w, self.config.balance))
                .collect(),
        };
        let mut unit = Unit {
            witness_list: witnesses,
            timestamp: self.config.timestamp,
            authors: vec![Author::new(author)],
            messages: vec![Message::payment(payload)],
            level: 0,
            witnessed_level: 0,
            is_stable: true,
            is_on_main_chain: true,
            main_chain_index: 0,
            ..Unit::default()
        };
        unit.seal();
        Ok(unit)
    }

    /// Write genesis into `store` unless it is already seeded. Returns the
    /// genesis hash either way.
    pub fn bootstrap(&self, store: &DagStore) -> LedgerResult<Hash> {
        if let Some(existing) = store.main_chain_unit(0)? {
            info!(genesis = %existing, "store already seeded");
            return Ok(existing);
        }

        let unit = self.build_unit()?;
        let mut batch = store.batch();
        batch.put_unit(&unit)?;
        batch.put_ball(&Ball::new(unit.hash, Vec::new(), false))?;
        batch.put_main_chain_index(0, &unit.hash)?;
        batch.put_stabilized(&unit.hash, &[unit.hash])?;
        batch.put_tip(&unit.hash)?;
        for witness in &unit.witness_list {
            batch.put_witness(witness)?;
        }
        for (mi, oi, output) in unit.indexed_outputs() {
            batch.put_stable_utxo(&Utxo::new(unit.hash, mi, oi, *output, UtxoKind::Normal))?;
        }
        batch.put_vote_round(0)?;
        batch.put_vote_result(&VoteResult::new(
            self.config.timestamp,
            self.config.timestamp,
            Address::ZERO,
            Address::ZERO,
            0,
        ))?;
        batch.commit()?;

        info!(
            genesis = %unit.hash,
            witnesses = unit.witness_list.len(),
            balance = self.config.balance,
            "genesis written"
        );
        Ok(unit.hash)
    }
}
