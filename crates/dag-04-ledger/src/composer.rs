//! # Unit Composer
//!
//! Builds a fully positioned payment unit: coin selection, change, parents,
//! graph metrics, commissions and hash. The result still needs a signature
//! before submission.

use crate::balances::spendable_utxos;
use crate::errors::{LedgerError, LedgerResult};
use dag_01_storage::{DagRead, DagStore};
use dag_02_witness::{TipSet, WitnessSet};
use dag_03_graph::GraphInfoGetter;
use shared_types::{
    Address, Author, Input, Message, Output, Payload, Unit, HEADER_COMMISSION, PAYLOAD_COMMISSION,
};
use tracing::debug;

pub struct UnitComposer<'a> {
    store: &'a DagStore,
    witnesses: &'a WitnessSet,
    tips: &'a TipSet,
    header_commission: u64,
    payload_commission: u64,
    max_witness_list_mutations: usize,
}

impl<'a> UnitComposer<'a> {
    pub fn new(store: &'a DagStore, witnesses: &'a WitnessSet, tips: &'a TipSet) -> Self {
        Self {
            store,
            witnesses,
            tips,
            header_commission: HEADER_COMMISSION,
            payload_commission: PAYLOAD_COMMISSION,
            max_witness_list_mutations: 1,
        }
    }

    pub fn with_commissions(mut self, header: u64, payload: u64) -> Self {
        self.header_commission = header;
        self.payload_commission = payload;
        self
    }

    pub fn with_max_witness_list_mutations(mut self, max: usize) -> Self {
        self.max_witness_list_mutations = max;
        self
    }

    /// Pay `amount` from `from` to `to`, returning change to `from`.
    pub fn compose_payment(
        &self,
        from: Address,
        to: Address,
        amount: u64,
        timestamp: u64,
    ) -> LedgerResult<Unit> {
        if amount == 0 {
            return Err(LedgerError::ZeroAmount);
        }
        let fees = self.header_commission as u128 + self.payload_commission as u128;
        let required = amount as u128 + fees;

        let tips = self.tips.tips()?;
        let spendable = spendable_utxos(self.store, &tips, &from)?;
        let available: u128 = spendable.iter().map(|u| u.amount() as u128).sum();
        if available < amount as u128 {
            return Err(LedgerError::NotEnoughBalance {
                address: from,
                required: amount as u128,
                available,
            });
        }
        if available < required {
            return Err(LedgerError::NotEnoughCommission {
                address: from,
                required,
                available,
            });
        }

        let mut inputs = Vec::new();
        let mut gathered = 0u128;
        for utxo in &spendable {
            if gathered >= required {
                break;
            }
            gathered += utxo.amount() as u128;
            inputs.push(Input::from(utxo));
        }

        let mut outputs = vec![Output::new(to, amount)];
        let change = gathered - required;
        if change > 0 {
            // Change never exceeds the sum of u64 inputs already selected.
            outputs.push(Output::new(from, u64::try_from(change).unwrap_or(u64::MAX)));
        }

        let witness_list = self.witnesses.witnesses()?;
        let parent_list = self
            .tips
            .compatible_tips(&witness_list, self.max_witness_list_mutations)?;
        if parent_list.is_empty() {
            return Err(LedgerError::NoCompatibleParents);
        }

        let info = GraphInfoGetter::new(self.store, &parent_list, &witness_list)?;
        let mut parent_time = 0;
        for parent in &parent_list {
            if let Some(unit) = self.store.unit(parent)? {
                parent_time = parent_time.max(unit.timestamp);
            }
        }

        let mut unit = Unit {
            witness_list,
            last_ball_unit: info.last_stable_ball()?,
            headers_commission: self.header_commission,
            payload_commission: self.payload_commission,
            timestamp: timestamp.max(parent_time),
            authors: vec![Author::new(from)],
            messages: vec![Message::payment(Payload { inputs, outputs })],
            best_parent_unit: info.best_parent_unit(),
            level: info.level(),
            witnessed_level: info.witnessed_level()?,
            ..Unit::default()
        };
        unit.parent_list = parent_list;
        unit.seal();

        debug!(
            unit = %unit.hash,
            from = %from,
            to = %to,
            amount,
            level = unit.level,
            "payment composed"
        );
        Ok(unit)
    }
}
