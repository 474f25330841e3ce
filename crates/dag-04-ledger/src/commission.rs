//! # Commission Distribution
//!
//! Fee payouts produced while a layer stabilizes.
//!
//! - **Witness commission** (`wc`): each valid unit's payload fee goes to the
//!   author of the layer's main-chain unit.
//! - **Miner commission** (`mc`): each valid unit's header fee goes to the
//!   author of its smallest child (see [`crate::stable::miner_commission`]).
//!
//! Payouts are grouped by payee and written into the layer's write group.

use crate::errors::LedgerResult;
use dag_01_storage::StoreBatch;
use shared_types::{Address, Commission, Output, Unit, Utxo, UtxoKind};
use std::collections::BTreeMap;
use tracing::debug;

/// Payload fees of `valid_units`, all paid to `main_chain_author`.
pub fn witness_commissions(main_chain_author: Address, valid_units: &[Unit]) -> Vec<Commission> {
    valid_units
        .iter()
        .filter(|unit| unit.payload_commission > 0)
        .map(|unit| {
            let utxo = Utxo::new(
                unit.hash,
                0,
                0,
                Output::new(main_chain_author, unit.payload_commission),
                UtxoKind::WitnessCommission,
            );
            Commission::new(main_chain_author, utxo)
        })
        .collect()
}

pub fn group_by_payee(commissions: Vec<Commission>) -> BTreeMap<Address, Vec<Commission>> {
    let mut grouped: BTreeMap<Address, Vec<Commission>> = BTreeMap::new();
    for commission in commissions {
        grouped.entry(commission.address).or_default().push(commission);
    }
    grouped
}

/// Write every payout as a stable UTXO. Returns the total paid.
pub fn distribute(
    batch: &mut StoreBatch,
    grouped: &BTreeMap<Address, Vec<Commission>>,
) -> LedgerResult<u128> {
    let mut total = 0u128;
    for (payee, commissions) in grouped {
        let mut paid = 0u128;
        for commission in commissions {
            batch.put_stable_utxo(&commission.utxo)?;
            paid += commission.utxo.amount() as u128;
        }
        debug!(payee = %payee, records = commissions.len(), paid, "commissions distributed");
        total += paid;
    }
    Ok(total)
}
