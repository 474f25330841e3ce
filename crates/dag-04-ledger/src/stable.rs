//! # Stable Process
//!
//! Irrevocable settlement of a unit that just stabilized.
//!
//! Each claimed input must still be in the stable set. If one is missing an
//! earlier stable unit already spent it: the unit is a double spend, becomes
//! `invalid` and changes no balance. Otherwise the claimed outputs are
//! removed, the unit's outputs become stable, and its header fee is paid to
//! the author of its smallest child.
//!
//! Outputs land in the batch as soon as each unit settles, so a later unit
//! of the same layer can spend them.

use crate::commission::{distribute, group_by_payee, witness_commissions};
use crate::errors::LedgerResult;
use dag_01_storage::{DagRead, StoreBatch};
use shared_types::{Address, Commission, Hash, Output, Unit, Utxo, UtxoKind};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Result of settling one unit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StableOutcome {
    pub valid: bool,
    /// One record per output; already written as stable UTXOs.
    pub outputs: Vec<Commission>,
    /// Fee payouts still to be distributed.
    pub commissions: Vec<Commission>,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct StableProcess;

impl StableProcess {
    pub fn new() -> Self {
        Self
    }

    /// Settle `unit`. Sets `unit.invalid` on a double spend.
    pub fn commit(&self, batch: &mut StoreBatch, unit: &mut Unit) -> LedgerResult<StableOutcome> {
        let claimed: Vec<Utxo> = unit.inputs().map(|i| i.claimed_utxo()).collect();

        for utxo in &claimed {
            if !batch.has_stable_utxo(utxo)? {
                warn!(
                    unit = %unit.hash,
                    utxo = %utxo.hash(),
                    owner = %utxo.owner(),
                    "stable output already spent, unit invalid"
                );
                unit.invalid = true;
                // Its speculative change can never settle.
                for (mi, oi, output) in unit.indexed_outputs() {
                    batch.delete_pending_utxo(&Utxo::new(
                        unit.hash,
                        mi,
                        oi,
                        *output,
                        UtxoKind::Normal,
                    ));
                }
                return Ok(StableOutcome::default());
            }
        }

        for utxo in &claimed {
            batch.delete_stable_utxo(utxo);
            batch.delete_pending_utxo(utxo);
        }

        let mut outputs = Vec::new();
        for utxo in unit.output_utxos() {
            batch.delete_pending_utxo(&utxo);
            batch.put_stable_utxo(&utxo)?;
            outputs.push(Commission::new(utxo.owner(), utxo));
        }

        let mut commissions = Vec::new();
        if let Some(miner) = miner_commission(unit) {
            commissions.push(miner);
        }

        debug!(
            unit = %unit.hash,
            spent = claimed.len(),
            outputs = outputs.len(),
            "unit settled"
        );
        Ok(StableOutcome {
            valid: true,
            outputs,
            commissions,
        })
    }
}

/// Settlement of one stable layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayerSettlement {
    pub valid: Vec<Hash>,
    pub invalid: Vec<Hash>,
    /// Fee payouts by payee, as written.
    pub commissions: BTreeMap<Address, Vec<Commission>>,
    pub paid: u128,
}

impl StableProcess {
    /// Settle every unit of a layer in order, then pay the layer's fees.
    ///
    /// `units` must be in stabilization order; `invalid` flags are set in
    /// place.
    pub fn settle_layer(
        &self,
        batch: &mut StoreBatch,
        units: &mut [Unit],
        main_chain_unit: &Hash,
    ) -> LedgerResult<LayerSettlement> {
        let mut settlement = LayerSettlement::default();
        let mut fees = Vec::new();
        let mut valid_units = Vec::new();
        let mut main_chain_author = None;

        for unit in units.iter_mut() {
            if unit.hash == *main_chain_unit {
                main_chain_author = unit.author();
            }
            let outcome = self.commit(batch, unit)?;
            if outcome.valid {
                settlement.valid.push(unit.hash);
                fees.extend(outcome.commissions);
                valid_units.push(unit.clone());
            } else {
                settlement.invalid.push(unit.hash);
            }
        }

        if let Some(author) = main_chain_author {
            fees.extend(witness_commissions(author, &valid_units));
        }
        settlement.commissions = group_by_payee(fees);
        settlement.paid = distribute(batch, &settlement.commissions)?;

        info!(
            main_chain_unit = %main_chain_unit,
            valid = settlement.valid.len(),
            invalid = settlement.invalid.len(),
            paid = settlement.paid as u64,
            "layer settled"
        );
        Ok(settlement)
    }
}

/// Header fee for the author of the smallest child of `unit`.
pub fn miner_commission(unit: &Unit) -> Option<Commission> {
    let author = unit.sub_stable_author?;
    if unit.headers_commission == 0 {
        return None;
    }
    let utxo = Utxo::new(
        unit.hash,
        0,
        0,
        Output::new(author, unit.headers_commission),
        UtxoKind::MinerCommission,
    );
    Some(Commission::new(author, utxo))
}
