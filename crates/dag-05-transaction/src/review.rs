//! # Unit Review
//!
//! Checks a received unit before it touches the ledger. Nothing here writes.
//!
//! ## Order
//!
//! | # | Check | Kind |
//! |---|-------|------|
//! | 1 | hash not stored yet | Duplicate |
//! | 2 | shape: messages, one author, inputs, outputs, amounts, lists | Structural |
//! | 3 | author owns every input | Structural |
//! | 4 | inputs = outputs + commissions | Structural |
//! | 5 | content hash, then signature | Structural |
//! | 6 | witness list as long as ours and close to it | Structural |
//! | 7 | parents stored | Referential |
//! | 8 | timestamp not before parents, not too far ahead | Structural |
//! | 9 | level, best parent, witnessed level, last ball | Structural |
//!
//! The first failing check decides the error.

use crate::errors::{TransactionError, TransactionResult};
use dag_01_storage::DagRead;
use dag_03_graph::GraphInfoGetter;
use shared_types::{Address, Unit, Utxo};
use std::collections::HashSet;

/// Step 2: everything that can be checked on the unit alone.
pub fn check_shape(unit: &Unit) -> TransactionResult<()> {
    let malformed = |reason| TransactionError::Malformed {
        unit: unit.hash,
        reason,
    };

    if unit.messages.is_empty() {
        return Err(malformed("no messages"));
    }
    if unit.authors.len() != 1 {
        return Err(malformed("exactly one author required"));
    }
    if unit.witness_list.is_empty() {
        return Err(malformed("empty witness list"));
    }
    if !all_distinct(&unit.witness_list) {
        return Err(malformed("duplicate witness"));
    }
    if unit.parent_list.is_empty() {
        return Err(malformed("no parents"));
    }
    if !all_distinct(&unit.parent_list) {
        return Err(malformed("duplicate parent"));
    }

    let mut claimed: HashSet<Utxo> = HashSet::new();
    for message in &unit.messages {
        if message.payload.inputs.is_empty() {
            return Err(malformed("message without inputs"));
        }
        if message.payload.outputs.is_empty() {
            return Err(malformed("message without outputs"));
        }
        for input in &message.payload.inputs {
            if input.output.amount == 0 {
                return Err(malformed("zero input amount"));
            }
            if !claimed.insert(input.claimed_utxo()) {
                return Err(malformed("output spent twice"));
            }
        }
        if message.payload.outputs.iter().any(|o| o.amount == 0) {
            return Err(malformed("zero output amount"));
        }
    }
    Ok(())
}

/// Step 3.
pub fn check_ownership(unit: &Unit) -> TransactionResult<()> {
    let author = unit.author().ok_or(TransactionError::Malformed {
        unit: unit.hash,
        reason: "exactly one author required",
    })?;
    for input in unit.inputs() {
        if input.output.address != author {
            return Err(TransactionError::ForeignInput {
                unit: unit.hash,
                owner: input.output.address,
            });
        }
    }
    Ok(())
}

/// Step 4.
pub fn check_conservation(unit: &Unit) -> TransactionResult<()> {
    let inputs: u128 = unit.messages.iter().map(|m| m.payload.input_total()).sum();
    let outputs: u128 = unit.messages.iter().map(|m| m.payload.output_total()).sum();
    let commissions = unit.headers_commission as u128 + unit.payload_commission as u128;
    if inputs != outputs + commissions {
        return Err(TransactionError::Unbalanced {
            unit: unit.hash,
            inputs,
            outputs,
            commissions,
        });
    }
    Ok(())
}

/// Step 5, first half.
pub fn check_hash(unit: &Unit) -> TransactionResult<()> {
    let computed = unit.content_hash();
    if computed != unit.hash {
        return Err(TransactionError::HashMismatch {
            declared: unit.hash,
            computed,
        });
    }
    Ok(())
}

/// Step 6. `current` must be sorted.
///
/// The majority used for witnessed levels is taken from the declared list, so
/// a list of any other length than ours is rejected before mutations count.
pub fn check_witness_list(unit: &Unit, current: &[Address], max: usize) -> TransactionResult<()> {
    if unit.witness_list.len() != current.len() {
        return Err(TransactionError::WitnessListSize {
            unit: unit.hash,
            declared: unit.witness_list.len(),
            expected: current.len(),
        });
    }
    let mutations = unit
        .witness_list
        .iter()
        .filter(|w| current.binary_search(w).is_err())
        .count();
    if mutations > max {
        return Err(TransactionError::IncompatibleWitnessList {
            unit: unit.hash,
            mutations,
            max,
        });
    }
    Ok(())
}

/// Steps 7 and 8. Returns the parents.
pub fn check_parents<R: DagRead + ?Sized>(
    reader: &R,
    unit: &Unit,
    now: u64,
    max_future_drift: u64,
) -> TransactionResult<Vec<Unit>> {
    let mut parents = Vec::with_capacity(unit.parent_list.len());
    for hash in &unit.parent_list {
        let parent = reader
            .unit(hash)?
            .ok_or(TransactionError::MissingParent {
                unit: unit.hash,
                parent: *hash,
            })?;
        parents.push(parent);
    }
    for parent in &parents {
        if unit.timestamp < parent.timestamp {
            return Err(TransactionError::TimestampBeforeParent {
                unit: unit.hash,
                parent: parent.hash,
            });
        }
    }
    if max_future_drift > 0 && unit.timestamp > now.saturating_add(max_future_drift) {
        return Err(TransactionError::TimestampInFuture {
            unit: unit.hash,
            timestamp: unit.timestamp,
            now,
        });
    }
    Ok(parents)
}

/// Step 9: recompute what the author declared about the unit's position.
pub fn check_graph_position<R: DagRead + ?Sized>(
    reader: &R,
    unit: &Unit,
) -> TransactionResult<()> {
    let mismatch = |field| TransactionError::GraphMismatch {
        unit: unit.hash,
        field,
    };
    let info = GraphInfoGetter::new(reader, &unit.parent_list, &unit.witness_list)?;
    if info.level() != unit.level {
        return Err(mismatch("level"));
    }
    if info.best_parent_unit() != unit.best_parent_unit {
        return Err(mismatch("best parent"));
    }
    if info.witnessed_level()? != unit.witnessed_level {
        return Err(mismatch("witnessed level"));
    }

    let last_ball = reader
        .unit(&unit.last_ball_unit)?
        .ok_or(TransactionError::MissingLastBall {
            unit: unit.hash,
            last_ball: unit.last_ball_unit,
        })?;
    if !last_ball.is_stable {
        return Err(TransactionError::LastBallNotStable {
            unit: unit.hash,
            last_ball: last_ball.hash,
        });
    }
    Ok(())
}

fn all_distinct<T: Eq + std::hash::Hash>(items: &[T]) -> bool {
    let mut seen = HashSet::with_capacity(items.len());
    items.iter().all(|item| seen.insert(item))
}
