//! # Witness Set
//!
//! Ledger-owned cache of the current witness addresses and the governance
//! round counters. Hydrated from `wl.`, `vote_round.` and `replace_round.` on
//! first use and re-scanned whenever it is found empty.
//!
//! A store without `replace_round.` has never applied a replacement; its
//! replace round is `-stable_rounds`, so round 1 is the first applicable one.

use crate::errors::{WitnessError, WitnessResult};
use dag_01_storage::{DagRead, DagStore};
use parking_lot::RwLock;
use shared_types::{majority_of_witnesses, Address, VoteResult};
use tracing::{debug, info};

#[derive(Debug, Default)]
struct WitnessState {
    /// Sorted by address.
    witnesses: Vec<Address>,
    vote_round: i64,
    /// `round - stable_rounds` of the last applied vote result.
    replace_round: i64,
}

pub struct WitnessSet {
    store: DagStore,
    stable_rounds: i64,
    state: RwLock<WitnessState>,
}

impl WitnessSet {
    pub fn new(store: DagStore, stable_rounds: i64) -> Self {
        Self {
            store,
            stable_rounds,
            state: RwLock::new(WitnessState::default()),
        }
    }

    pub fn stable_rounds(&self) -> i64 {
        self.stable_rounds
    }

    /// Current witnesses in address order.
    pub fn witnesses(&self) -> WitnessResult<Vec<Address>> {
        {
            let state = self.state.read();
            if !state.witnesses.is_empty() {
                return Ok(state.witnesses.clone());
            }
        }
        self.hydrate()
    }

    pub fn contains(&self, address: &Address) -> WitnessResult<bool> {
        Ok(self.witnesses()?.binary_search(address).is_ok())
    }

    pub fn majority(&self) -> WitnessResult<usize> {
        Ok(majority_of_witnesses(self.witnesses()?.len()))
    }

    pub fn vote_round(&self) -> WitnessResult<i64> {
        self.witnesses()?;
        Ok(self.state.read().vote_round)
    }

    pub fn replace_round(&self) -> WitnessResult<i64> {
        self.witnesses()?;
        Ok(self.state.read().replace_round)
    }

    /// Record a newly saved vote round.
    pub fn set_vote_round(&self, round: i64) -> WitnessResult<()> {
        self.witnesses()?;
        self.state.write().vote_round = round;
        Ok(())
    }

    /// Drop the cached addresses; the next read re-scans storage.
    pub fn invalidate(&self) {
        self.state.write().witnesses.clear();
    }

    fn hydrate(&self) -> WitnessResult<Vec<Address>> {
        let mut state = self.state.write();
        if state.witnesses.is_empty() {
            let mut witnesses = self.store.witnesses()?;
            witnesses.sort();
            state.witnesses = witnesses;
            state.vote_round = self.store.vote_round()?;
            state.replace_round = self
                .store
                .replace_round()?
                .unwrap_or(-self.stable_rounds);
            debug!(
                witnesses = state.witnesses.len(),
                vote_round = state.vote_round,
                replace_round = state.replace_round,
                "witness set hydrated"
            );
        }
        Ok(state.witnesses.clone())
    }

    /// Apply a saved vote result to the membership.
    ///
    /// Results must be applied strictly in sequence, and only once the
    /// stored vote round is `stable_rounds` past the result's round.
    pub fn replace_witness_by_result(&self, result: &VoteResult) -> WitnessResult<()> {
        self.witnesses()?;
        let vote_round = self.store.vote_round()?;
        let mut state = self.state.write();

        if result.round - self.stable_rounds - state.replace_round != 1 {
            return Err(WitnessError::RoundOutOfOrder {
                round: result.round,
                replace_round: state.replace_round,
                stable_rounds: self.stable_rounds,
            });
        }
        if vote_round - result.round < self.stable_rounds {
            return Err(WitnessError::NotYetEffective {
                round: result.round,
                vote_round,
                stable_rounds: self.stable_rounds,
            });
        }
        let Ok(position) = state.witnesses.binary_search(&result.replaced_witness) else {
            return Err(WitnessError::NotAWitness(result.replaced_witness));
        };
        if state.witnesses.binary_search(&result.vote_result).is_ok() {
            return Err(WitnessError::AlreadyWitness(result.vote_result));
        }

        let mut batch = self.store.batch();
        batch.delete_witness(&result.replaced_witness);
        batch.put_witness(&result.vote_result)?;
        batch.put_replace_round(result.round - self.stable_rounds)?;
        batch.commit()?;

        state.witnesses.remove(position);
        let insert_at = state
            .witnesses
            .binary_search(&result.vote_result)
            .unwrap_or_else(|at| at);
        state.witnesses.insert(insert_at, result.vote_result);
        state.replace_round = result.round - self.stable_rounds;

        info!(
            round = result.round,
            replaced = %result.replaced_witness,
            replacement = %result.vote_result,
            "witness replaced"
        );
        Ok(())
    }
}
