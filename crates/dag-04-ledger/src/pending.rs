//! # Pending Pool
//!
//! Speculative application of a unit on arrival.
//!
//! Every input must name a spendable output: in the stable set when its
//! source unit is stable, in the pending set otherwise. A stable output that
//! is gone was spent for good; a pending one may still arrive through sync. On success the
//! consumed pending outputs are removed and the author's own change becomes
//! pending. Stable outputs are left alone until stabilization decides which
//! claimant wins.
//!
//! Input checks are independent reads, so units with many inputs check them
//! in parallel and join before deciding.
//!
//! ## Rebuild
//!
//! Change can be built on change: an author's pending outputs form chains
//! that end at stable outputs. When a double spend is settled, the loser's
//! change never becomes real and neither does anything built on it.
//! [`PendingPool::backtrack`] walks an author's chains down to their stable
//! roots; if one root is gone, [`PendingPool::rebuild`] drops the author's
//! pending set and replays their unstable units, keeping only those whose
//! claims still resolve.

use crate::balances::unstable_units;
use crate::errors::{LedgerError, LedgerResult};
use dag_01_storage::{DagRead, StoreBatch};
use rayon::prelude::*;
use shared_types::{Address, Hash, Input, Unit, Utxo, UtxoKind};
use std::collections::{HashSet, VecDeque};
use tracing::{debug, info};

/// Inputs below this count are checked sequentially.
pub const PARALLEL_THRESHOLD: usize = 4;

/// An input resolved against the unspent sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClaimedInput {
    pub utxo: Utxo,
    pub source_stable: bool,
}

/// Outcome of [`PendingPool::rebuild`] for one author.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingRebuild {
    pub author: Address,
    /// Pending outputs dropped before the replay.
    pub removed: usize,
    /// Unstable units whose change is pending again, in replay order.
    pub replayed: Vec<Hash>,
    /// Unstable units that can no longer settle.
    pub doomed: Vec<Hash>,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PendingPool;

impl PendingPool {
    pub fn new() -> Self {
        Self
    }

    /// Resolve every input of `unit`, in input order.
    pub fn check_inputs<R: DagRead + Sync + ?Sized>(
        &self,
        reader: &R,
        unit: &Unit,
    ) -> LedgerResult<Vec<ClaimedInput>> {
        let inputs: Vec<&Input> = unit.inputs().collect();
        let results: Vec<LedgerResult<ClaimedInput>> = if inputs.len() < PARALLEL_THRESHOLD {
            inputs
                .iter()
                .map(|input| check_input(reader, unit, input))
                .collect()
        } else {
            inputs
                .par_iter()
                .map(|input| check_input(reader, unit, input))
                .collect()
        };
        results.into_iter().collect()
    }

    /// Apply `unit` to the pending set. Returns the new pending change.
    pub fn apply(&self, batch: &mut StoreBatch, unit: &Unit) -> LedgerResult<Vec<Utxo>> {
        let author = unit.author().ok_or(LedgerError::NoAuthor(unit.hash))?;
        let claimed = self.check_inputs(&*batch, unit)?;

        for claim in claimed.iter().filter(|c| !c.source_stable) {
            batch.delete_pending_utxo(&claim.utxo);
        }

        let change: Vec<Utxo> = unit
            .indexed_outputs()
            .filter(|(_, _, output)| output.address == author)
            .map(|(mi, oi, output)| Utxo::new(unit.hash, mi, oi, *output, UtxoKind::Normal))
            .collect();
        for utxo in &change {
            batch.put_pending_utxo(utxo)?;
        }

        debug!(
            unit = %unit.hash,
            inputs = claimed.len(),
            change = change.len(),
            "pending apply"
        );
        Ok(change)
    }

    /// True when every pending output of `author` traces back to stable
    /// outputs that are still unspent.
    ///
    /// A chain is broken by an invalid unit, an unknown source unit, or a
    /// stable claim that is no longer in the stable set.
    pub fn backtrack<R: DagRead + ?Sized>(&self, reader: &R, author: &Address) -> LedgerResult<bool> {
        let mut visited = HashSet::new();
        let mut queue: VecDeque<Hash> = reader
            .pending_utxos(author)?
            .iter()
            .map(|utxo| utxo.unit_hash)
            .filter(|hash| visited.insert(*hash))
            .collect();

        while let Some(hash) = queue.pop_front() {
            let Some(unit) = reader.unit(&hash)? else {
                return Ok(false);
            };
            if unit.invalid {
                return Ok(false);
            }
            for input in unit.inputs() {
                let Some(source) = reader.unit(&input.unit)? else {
                    return Ok(false);
                };
                if source.is_stable {
                    if source.invalid || !reader.has_stable_utxo(&input.claimed_utxo())? {
                        debug!(unit = %hash, source = %source.hash, "pending chain broken");
                        return Ok(false);
                    }
                } else if visited.insert(source.hash) {
                    queue.push_back(source.hash);
                }
            }
        }
        Ok(true)
    }

    /// Drop the pending set of `author` and replay their unstable units
    /// reachable from `tips`, lowest level first.
    ///
    /// A unit may spend change from a unit at a higher level, so the replay
    /// repeats until a pass resolves nothing new.
    pub fn rebuild(
        &self,
        batch: &mut StoreBatch,
        tips: &[Hash],
        author: &Address,
    ) -> LedgerResult<PendingRebuild> {
        let stale = batch.pending_utxos(author)?;
        for utxo in &stale {
            batch.delete_pending_utxo(utxo);
        }

        let mut units: Vec<Unit> = unstable_units(&*batch, tips)?
            .into_iter()
            .filter(|unit| !unit.invalid && unit.author() == Some(*author))
            .collect();
        units.sort_by(|a, b| {
            a.level
                .cmp(&b.level)
                .then(a.timestamp.cmp(&b.timestamp))
                .then(a.hash.cmp(&b.hash))
        });

        let mut rebuild = PendingRebuild {
            author: *author,
            removed: stale.len(),
            ..PendingRebuild::default()
        };
        while !units.is_empty() {
            let before = units.len();
            let mut unresolved = Vec::new();
            for unit in units {
                match self.apply(batch, &unit) {
                    Ok(_) => rebuild.replayed.push(unit.hash),
                    Err(e @ LedgerError::Storage(_)) => return Err(e),
                    Err(_) => unresolved.push(unit),
                }
            }
            units = unresolved;
            if units.len() == before {
                break;
            }
        }
        rebuild.doomed = units.into_iter().map(|unit| unit.hash).collect();

        info!(
            author = %author,
            removed = rebuild.removed,
            replayed = rebuild.replayed.len(),
            doomed = rebuild.doomed.len(),
            "pending set rebuilt"
        );
        Ok(rebuild)
    }
}

fn check_input<R: DagRead + ?Sized>(
    reader: &R,
    unit: &Unit,
    input: &Input,
) -> LedgerResult<ClaimedInput> {
    let source = reader
        .unit(&input.unit)?
        .ok_or(LedgerError::MissingSourceUnit {
            unit: unit.hash,
            from_unit: input.unit,
        })?;
    let utxo = input.claimed_utxo();
    if source.is_stable {
        if !reader.has_stable_utxo(&utxo)? {
            return Err(LedgerError::SpentByStableUnit {
                unit: unit.hash,
                utxo: utxo.hash(),
            });
        }
    } else if !reader.has_pending_utxo(&utxo)? {
        return Err(LedgerError::UnspentNotFound {
            unit: unit.hash,
            utxo: utxo.hash(),
        });
    }
    Ok(ClaimedInput {
        utxo,
        source_stable: source.is_stable,
    })
}
