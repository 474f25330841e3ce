//! Balance queries over the unspent sets.

use crate::errors::LedgerResult;
use dag_01_storage::DagRead;
use shared_types::{Address, Hash, Unit, Utxo};
use std::collections::{HashSet, VecDeque};

/// Sum of the stable UTXOs owned by `address`.
pub fn balance_of<R: DagRead + ?Sized>(reader: &R, address: &Address) -> LedgerResult<u128> {
    Ok(total(&reader.stable_utxos(address)?))
}

/// Sum of the speculative change owned by `address`.
pub fn pending_balance_of<R: DagRead + ?Sized>(
    reader: &R,
    address: &Address,
) -> LedgerResult<u128> {
    Ok(total(&reader.pending_utxos(address)?))
}

pub fn total(utxos: &[Utxo]) -> u128 {
    utxos.iter().map(|u| u.amount() as u128).sum()
}

/// Units reachable from `tips` that have not stabilized yet.
pub fn unstable_units<R: DagRead + ?Sized>(reader: &R, tips: &[Hash]) -> LedgerResult<Vec<Unit>> {
    let mut visited: HashSet<Hash> = tips.iter().copied().collect();
    let mut queue: VecDeque<Hash> = tips.iter().copied().collect();
    let mut units = Vec::new();
    while let Some(hash) = queue.pop_front() {
        let Some(unit) = reader.unit(&hash)? else {
            continue;
        };
        if unit.is_stable {
            continue;
        }
        for parent in &unit.parent_list {
            if visited.insert(*parent) {
                queue.push_back(*parent);
            }
        }
        units.push(unit);
    }
    Ok(units)
}

/// Outputs `address` can put into a new unit right now: stable outputs no
/// unstable unit has claimed yet, then pending change.
pub fn spendable_utxos<R: DagRead + ?Sized>(
    reader: &R,
    tips: &[Hash],
    address: &Address,
) -> LedgerResult<Vec<Utxo>> {
    let claimed: HashSet<Utxo> = unstable_units(reader, tips)?
        .iter()
        .flat_map(|unit| unit.inputs().map(|i| i.claimed_utxo()).collect::<Vec<_>>())
        .collect();

    let mut spendable: Vec<Utxo> = reader
        .stable_utxos(address)?
        .into_iter()
        .filter(|utxo| !claimed.contains(utxo))
        .collect();
    spendable.extend(
        reader
            .pending_utxos(address)?
            .into_iter()
            .filter(|utxo| !claimed.contains(utxo)),
    );
    Ok(spendable)
}
