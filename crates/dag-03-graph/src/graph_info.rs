//! # Graph Metrics
//!
//! Everything a unit's position in the DAG is judged by: level, best parent,
//! witnessed level, the last stable ball visible from it, and the ancestry a
//! lagging peer is missing.
//!
//! ## Best parent
//!
//! Parents are ranked by `(witnessed_level desc, level asc, hash desc)`.
//! The final tie-break prefers the larger hash. Every node must use this
//! exact comparator or their main chains diverge.
//!
//! ## Walks
//!
//! All backward walks are iterative. Best-parent walks follow a single
//! pointer per step; ancestry walks use a queue and a visited set.

use crate::errors::{GraphError, GraphResult};
use crate::merkle::{merkle_proof, merkle_root, verify_merkle_proof, ProofNode};
use dag_01_storage::DagRead;
use shared_types::{majority_of_witnesses, Address, Hash, Unit};
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap, VecDeque};

/// Ranking used to pick the best parent. `Greater` means `a` wins.
pub fn compare_parents(a: &Unit, b: &Unit) -> Ordering {
    a.witnessed_level
        .cmp(&b.witnessed_level)
        .then_with(|| b.level.cmp(&a.level))
        .then_with(|| a.hash.cmp(&b.hash))
}

/// Load a unit or report it as a missing ancestor.
pub(crate) fn load<R: DagRead + ?Sized>(reader: &R, hash: &Hash) -> GraphResult<Unit> {
    reader.unit(hash)?.ok_or(GraphError::MissingUnit(*hash))
}

/// Metrics for a candidate parent list under a reference witness list.
pub struct GraphInfoGetter<'a, R: ?Sized> {
    reader: &'a R,
    parents: Vec<Unit>,
    witness_list: Vec<Address>,
    best_parent: Option<usize>,
}

impl<'a, R: DagRead + ?Sized> GraphInfoGetter<'a, R> {
    /// Load the parents and rank them. Fails if any parent is unknown.
    pub fn new(reader: &'a R, parent_list: &[Hash], witness_list: &[Address]) -> GraphResult<Self> {
        let parents = parent_list
            .iter()
            .map(|hash| load(reader, hash))
            .collect::<GraphResult<Vec<_>>>()?;
        let best_parent = parents
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| compare_parents(a, b))
            .map(|(index, _)| index);
        Ok(Self {
            reader,
            parents,
            witness_list: witness_list.to_vec(),
            best_parent,
        })
    }

    /// `1 + max(parent levels)`; 0 for an empty parent list.
    pub fn level(&self) -> i64 {
        self.parents
            .iter()
            .map(|p| p.level + 1)
            .max()
            .unwrap_or(0)
    }

    pub fn best_parent_unit(&self) -> Option<Hash> {
        self.best_parent.map(|i| self.parents[i].hash)
    }

    fn best_parent(&self) -> GraphResult<&Unit> {
        self.best_parent
            .map(|i| &self.parents[i])
            .ok_or(GraphError::NoParents)
    }

    /// Lowest level at which a majority of the reference witnesses appear
    /// along the best-parent chain. 0 if genesis is reached first, -1 without
    /// parents.
    pub fn witnessed_level(&self) -> GraphResult<i64> {
        let Ok(best_parent) = self.best_parent() else {
            return Ok(-1);
        };
        let reference: BTreeSet<&Address> = self.witness_list.iter().collect();
        let majority = majority_of_witnesses(self.witness_list.len());
        let mut seen = BTreeSet::new();
        let mut min_level = best_parent.level;

        let mut unit = best_parent.clone();
        loop {
            if let Some(author) = unit.author() {
                if reference.contains(&author) {
                    seen.insert(author);
                    min_level = min_level.min(unit.level);
                    if seen.len() >= majority {
                        return Ok(min_level);
                    }
                }
            }
            match unit.best_parent_unit {
                Some(next) if !unit.is_genesis() => unit = load(self.reader, &next)?,
                _ => return Ok(0),
            }
        }
    }

    fn last_stable_unit(&self) -> GraphResult<Unit> {
        let mut unit = self.best_parent()?.clone();
        loop {
            if unit.is_stable && unit.is_on_main_chain {
                return Ok(unit);
            }
            let next = unit
                .best_parent_unit
                .ok_or(GraphError::NoStableAncestor(unit.hash))?;
            unit = load(self.reader, &next)?;
        }
    }

    /// First stable main-chain unit on the best-parent chain.
    pub fn last_stable_ball(&self) -> GraphResult<Hash> {
        Ok(self.last_stable_unit()?.hash)
    }

    pub fn last_stable_ball_mci(&self) -> GraphResult<u64> {
        Ok(self.last_stable_unit()?.main_chain_index)
    }

    /// Ancestry a peer that has seen up to `last_known_mci` lacks, split into
    /// stable and unstable units, each sorted by level.
    pub fn missing_units(
        &self,
        last_stable_mci: u64,
        last_known_mci: u64,
    ) -> GraphResult<(Vec<Unit>, Vec<Unit>)> {
        if last_known_mci > last_stable_mci {
            return Ok((Vec::new(), Vec::new()));
        }

        let mut stable: HashMap<Hash, Unit> = HashMap::new();
        let mut unstable: HashMap<Hash, Unit> = HashMap::new();
        let mut queue: VecDeque<Unit> = VecDeque::new();

        let mut classify = |unit: Unit, queue: &mut VecDeque<Unit>| {
            let bucket = if unit.is_stable {
                if unit.main_chain_index <= last_known_mci {
                    return;
                }
                &mut stable
            } else {
                &mut unstable
            };
            if !bucket.contains_key(&unit.hash) {
                bucket.insert(unit.hash, unit.clone());
                queue.push_back(unit);
            }
        };

        for parent in &self.parents {
            classify(parent.clone(), &mut queue);
        }
        while let Some(unit) = queue.pop_front() {
            for parent_hash in &unit.parent_list {
                let parent = load(self.reader, parent_hash)?;
                classify(parent, &mut queue);
            }
        }

        Ok((sorted_by_level(stable), sorted_by_level(unstable)))
    }

    /// Main-chain units with an index in `[last_known_mci, last_stable_mci]`,
    /// ordered by level.
    pub fn missing_stable_units_on_main_chain(
        &self,
        last_stable_mci: u64,
        last_known_mci: u64,
    ) -> GraphResult<Vec<Hash>> {
        if last_known_mci > last_stable_mci {
            return Ok(Vec::new());
        }
        let mut found = Vec::new();
        let mut unit = self.best_parent()?.clone();
        loop {
            if unit.is_on_main_chain {
                if unit.main_chain_index < last_known_mci {
                    break;
                }
                if unit.main_chain_index <= last_stable_mci {
                    found.push((unit.level, unit.hash));
                }
            }
            match unit.best_parent_unit {
                Some(next) if !unit.is_genesis() => unit = load(self.reader, &next)?,
                _ => break,
            }
        }
        found.sort();
        Ok(found.into_iter().map(|(_, hash)| hash).collect())
    }

    /// Every stable unit above genesis, in level order: the leaves of the
    /// stable Merkle tree.
    pub fn stable_leaves(&self) -> GraphResult<Vec<Hash>> {
        let (stable, _) = self.missing_units(self.last_stable_ball_mci()?, 0)?;
        Ok(stable.into_iter().map(|unit| unit.hash).collect())
    }

    pub fn main_chain_merkle_root(&self) -> GraphResult<Hash> {
        Ok(merkle_root(&self.stable_leaves()?))
    }

    /// Inclusion proof for `unit` against [`Self::main_chain_merkle_root`],
    /// `None` when it is not a stable leaf.
    pub fn merkle_proof(&self, unit: &Hash) -> GraphResult<Option<Vec<ProofNode>>> {
        let leaves = self.stable_leaves()?;
        Ok(leaves
            .iter()
            .position(|leaf| leaf == unit)
            .and_then(|index| merkle_proof(&leaves, index)))
    }

    pub fn is_unit_in_merkle_tree(&self, unit: &Hash) -> GraphResult<bool> {
        let leaves = self.stable_leaves()?;
        let root = merkle_root(&leaves);
        Ok(leaves
            .iter()
            .position(|leaf| leaf == unit)
            .and_then(|index| merkle_proof(&leaves, index))
            .is_some_and(|proof| verify_merkle_proof(unit, &proof, &root)))
    }
}

fn sorted_by_level(units: HashMap<Hash, Unit>) -> Vec<Unit> {
    let mut units: Vec<Unit> = units.into_values().collect();
    units.sort_by(|a, b| a.level.cmp(&b.level).then(a.hash.cmp(&b.hash)));
    units
}
