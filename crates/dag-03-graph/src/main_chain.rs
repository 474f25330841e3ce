//! # Main Chain Stabilizer
//!
//! Tracks the stability frontier as seen from one newly inserted unit and
//! advances it one layer at a time.
//!
//! ## Locating the frontier
//!
//! From the new unit, follow best-parent links down to the first unit that is
//! both stable and on the main chain. That unit is `S`; the unit visited just
//! before it is `sub` (equal to `S` when the walk starts on `S`).
//!
//! ## Extending
//!
//! `sub` becomes the next main-chain unit `C` once
//!
//! 1. the new unit's witnessed level is above `C.level`, and
//! 2. it is above every competing branch: a tip whose own walk lands on the
//!    same `S` through a different `sub'` with `sub'.witnessed_level >
//!    S.witnessed_level` contributes `sub'.level`.
//!
//! Every unstable ancestor of `C` then stabilizes with index `S.mci + 1`.
//!
//! Callers must serialize extension per ledger; the frontier and balance
//! state are shared.

use crate::errors::{GraphError, GraphResult};
use crate::graph_info::load;
use dag_01_storage::{DagRead, StoreBatch};
use shared_types::{Address, Ball, Hash, Unit};
use std::collections::{BTreeMap, HashSet, VecDeque};
use tracing::{debug, info};

/// Where a best-parent walk met the stable main chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StabilityPoint {
    pub stable: Hash,
    pub stable_level: i64,
    pub stable_witnessed_level: i64,
    pub stable_mci: u64,
    /// Last unit visited before `stable`.
    pub sub: Hash,
}

/// One advance of the frontier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StableLayer {
    pub main_chain_index: u64,
    pub main_chain_unit: Hash,
    /// Stabilized units in `(level, hash)` order.
    pub units: Vec<Hash>,
    pub invalid: Vec<Hash>,
}

/// Walk best parents from `from` to the stable main chain.
pub fn locate<R: DagRead + ?Sized>(reader: &R, from: Hash) -> GraphResult<StabilityPoint> {
    let mut previous = from;
    let mut current = from;
    loop {
        let unit = load(reader, &current)?;
        if unit.is_stable && unit.is_on_main_chain {
            return Ok(StabilityPoint {
                stable: unit.hash,
                stable_level: unit.level,
                stable_witnessed_level: unit.witnessed_level,
                stable_mci: unit.main_chain_index,
                sub: previous,
            });
        }
        previous = current;
        current = unit
            .best_parent_unit
            .ok_or(GraphError::NoStableAncestor(from))?;
    }
}

pub struct MainChainUpdater {
    unit: Hash,
    witnessed_level: i64,
    point: StabilityPoint,
}

impl MainChainUpdater {
    pub fn new<R: DagRead + ?Sized>(reader: &R, unit: &Unit) -> GraphResult<Self> {
        let point = locate(reader, unit.hash)?;
        debug!(
            unit = %unit.hash,
            stable = %point.stable,
            sub = %point.sub,
            "stability point located"
        );
        Ok(Self {
            unit: unit.hash,
            witnessed_level: unit.witnessed_level,
            point,
        })
    }

    pub fn point(&self) -> &StabilityPoint {
        &self.point
    }

    /// Highest `sub'.level` among competing branches, or -1.
    pub fn max_competitor_level<R: DagRead + ?Sized>(
        &self,
        reader: &R,
        tips: &[Hash],
    ) -> GraphResult<i64> {
        let mut max_level = -1;
        for tip in tips {
            if *tip == self.unit {
                continue;
            }
            if load(reader, tip)?.is_stable {
                continue;
            }
            let other = locate(reader, *tip)?;
            if other.stable != self.point.stable || other.sub == self.point.sub {
                continue;
            }
            let sub = load(reader, &other.sub)?;
            if sub.witnessed_level > self.point.stable_witnessed_level {
                max_level = max_level.max(sub.level);
            }
        }
        Ok(max_level)
    }

    pub fn can_extend<R: DagRead + ?Sized>(&self, reader: &R, tips: &[Hash]) -> GraphResult<bool> {
        if self.point.sub == self.point.stable {
            return Ok(false);
        }
        let candidate = load(reader, &self.point.sub)?;
        if self.witnessed_level <= candidate.level {
            return Ok(false);
        }
        let competitor = self.max_competitor_level(reader, tips)?;
        Ok(self.witnessed_level > competitor)
    }

    /// Every unstable ancestor of the next main-chain unit, itself included,
    /// in `(level, hash)` order.
    pub fn next_batch<R: DagRead + ?Sized>(&self, reader: &R) -> GraphResult<Vec<Unit>> {
        let mut visited = HashSet::new();
        let mut queue = VecDeque::new();
        let mut batch = Vec::new();

        visited.insert(self.point.sub);
        queue.push_back(self.point.sub);
        while let Some(hash) = queue.pop_front() {
            let unit = load(reader, &hash)?;
            if unit.is_stable {
                continue;
            }
            for parent in &unit.parent_list {
                if visited.insert(*parent) {
                    queue.push_back(*parent);
                }
            }
            batch.push(unit);
        }
        batch.sort_by(|a, b| a.level.cmp(&b.level).then(a.hash.cmp(&b.hash)));
        Ok(batch)
    }

    /// Stabilize `units` (from [`MainChainUpdater::next_batch`], with any
    /// `invalid` flags already set) into `batch` and move to the next point.
    pub fn extend(
        &mut self,
        batch: &mut StoreBatch,
        units: Vec<Unit>,
        now: u64,
    ) -> GraphResult<StableLayer> {
        let mci = self.point.stable_mci + 1;
        let main_chain_unit = self.point.sub;
        let round = batch.vote_round()?;

        let mut hashes = Vec::with_capacity(units.len());
        let mut invalid = Vec::new();
        let mut activity: BTreeMap<Address, u64> = BTreeMap::new();

        for mut unit in units {
            unit.mark_stable(mci);
            unit.is_on_main_chain = unit.hash == main_chain_unit;
            batch.put_ball(&Ball::new(
                unit.hash,
                unit.parent_list.clone(),
                unit.invalid,
            ))?;
            if unit.invalid {
                invalid.push(unit.hash);
            } else if let Some(author) = unit.author() {
                if !activity.contains_key(&author) {
                    let stored = batch.round_activity(round + 1, &author)?;
                    activity.insert(author, stored);
                }
                *activity.entry(author).or_default() += 1;
            }
            batch.put_unit(&unit)?;
            hashes.push(unit.hash);
        }

        for (author, count) in &activity {
            batch.put_round_activity(round + 1, author, *count)?;
        }
        batch.put_stabilized(&main_chain_unit, &hashes)?;
        batch.put_main_chain_index(mci, &main_chain_unit)?;

        if let Some(mut current) = batch.vote_result(round)? {
            if current.end_time == 0 {
                current.end_time = now;
                batch.put_vote_result(&current)?;
                debug!(round, end_time = now, "vote round closed");
            }
        }

        info!(
            mci,
            main_chain_unit = %main_chain_unit,
            units = hashes.len(),
            invalid = invalid.len(),
            "stability frontier advanced"
        );

        self.point = locate(&*batch, self.unit)?;
        Ok(StableLayer {
            main_chain_index: mci,
            main_chain_unit,
            units: hashes,
            invalid,
        })
    }
}
