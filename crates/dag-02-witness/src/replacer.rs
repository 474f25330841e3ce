//! # Witness Replacer
//!
//! Per-round activity accounting for witness rotation.
//!
//! A round's window is `[start, end)`: `start` is the end time stored for the
//! current vote round, `end` is supplied by the caller. Units are found by a
//! breadth-first walk from the current tips that does not expand units
//! outside the window.

use crate::errors::{WitnessError, WitnessResult};
use crate::tip_set::TipSet;
use crate::witness_set::WitnessSet;
use dag_01_storage::{DagRead, DagStore};
use shared_types::{Address, Hash, VoteResult};
use std::collections::{BTreeMap, HashSet, VecDeque};
use std::sync::Arc;
use tracing::{debug, info};

pub struct WitnessReplacer {
    store: DagStore,
    witnesses: Arc<WitnessSet>,
    start_time: u64,
    end_time: u64,
    round: i64,
    /// Units authored per address inside the window.
    authored: BTreeMap<Address, u64>,
}

impl WitnessReplacer {
    /// Open the window for the round after the current vote round and count
    /// authorship inside it.
    pub fn new(
        store: DagStore,
        witnesses: Arc<WitnessSet>,
        tips: &TipSet,
        end_time: u64,
    ) -> WitnessResult<Self> {
        let vote_round = store.vote_round()?;
        let start_time = store
            .vote_result(vote_round)?
            .map(|r| r.end_time)
            .unwrap_or(0);
        let authored = count_authors(&store, &tips.tips()?, start_time, end_time)?;
        debug!(
            round = vote_round + 1,
            start_time,
            end_time,
            authors = authored.len(),
            "witness window opened"
        );
        Ok(Self {
            store,
            witnesses,
            start_time,
            end_time,
            round: vote_round + 1,
            authored,
        })
    }

    pub fn round(&self) -> i64 {
        self.round
    }

    pub fn window(&self) -> (u64, u64) {
        (self.start_time, self.end_time)
    }

    /// The least active current witness and its unit count.
    ///
    /// Ties go to the witness listed first.
    pub fn get_replaced_witness(&self) -> WitnessResult<Option<(Address, u64)>> {
        let mut least: Option<(Address, u64)> = None;
        for witness in self.witnesses.witnesses()? {
            let count = self.authored.get(&witness).copied().unwrap_or(0);
            if least.map_or(true, |(_, best)| count < best) {
                least = Some((witness, count));
            }
        }
        Ok(least)
    }

    /// Non-witness authors with more than `min_times` units in the window,
    /// most active first.
    pub fn get_campaign_list(&self, min_times: u64) -> WitnessResult<Vec<Address>> {
        let witnesses = self.witnesses.witnesses()?;
        let mut campaigners: Vec<(Address, u64)> = self
            .authored
            .iter()
            .filter(|(addr, count)| **count > min_times && witnesses.binary_search(addr).is_err())
            .map(|(addr, count)| (*addr, *count))
            .collect();
        campaigners.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        Ok(campaigners.into_iter().map(|(addr, _)| addr).collect())
    }

    /// Persist the decision for this window and advance the vote round.
    pub fn save_vote_result(
        &self,
        campaigner: Address,
        replaced: Address,
    ) -> WitnessResult<VoteResult> {
        let result = VoteResult::new(
            self.start_time,
            self.end_time,
            campaigner,
            replaced,
            self.round,
        );
        let mut batch = self.store.batch();
        batch.put_vote_result(&result)?;
        batch.put_vote_round(self.round)?;
        batch.commit()?;
        self.witnesses.set_vote_round(self.round)?;

        info!(
            round = self.round,
            campaigner = %campaigner,
            replaced = %replaced,
            "vote result saved"
        );
        Ok(result)
    }

    /// Valid units `address` authored while stabilizing into `round`.
    pub fn activity(&self, round: i64, address: &Address) -> WitnessResult<u64> {
        Ok(self.store.round_activity(round, address)?)
    }
}

fn count_authors(
    store: &DagStore,
    tips: &[Hash],
    start: u64,
    end: u64,
) -> WitnessResult<BTreeMap<Address, u64>> {
    let in_window = |t: u64| t >= start && t < end;
    let mut authored = BTreeMap::new();
    let mut visited = HashSet::new();
    let mut queue = VecDeque::new();

    for tip in tips {
        let unit = store.unit(tip)?.ok_or(WitnessError::MissingUnit(*tip))?;
        if in_window(unit.timestamp) && visited.insert(unit.hash) {
            queue.push_back(unit);
        }
    }

    while let Some(unit) = queue.pop_front() {
        if let Some(author) = unit.author() {
            *authored.entry(author).or_insert(0) += 1;
        }
        for parent_hash in &unit.parent_list {
            if visited.contains(parent_hash) {
                continue;
            }
            let parent = store
                .unit(parent_hash)?
                .ok_or(WitnessError::MissingUnit(*parent_hash))?;
            if in_window(parent.timestamp) {
                visited.insert(parent.hash);
                queue.push_back(parent);
            }
        }
    }
    Ok(authored)
}
