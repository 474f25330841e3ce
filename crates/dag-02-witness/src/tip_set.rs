//! # Tip Set
//!
//! Units nobody references as a parent yet. New units pick their parents
//! from here, and the stabilizer scans it for competing branches.

use crate::errors::{WitnessError, WitnessResult};
use dag_01_storage::{DagRead, DagStore, StoreBatch};
use parking_lot::RwLock;
use shared_types::{Address, Hash, Unit};
use std::collections::BTreeSet;
use tracing::debug;

pub struct TipSet {
    store: DagStore,
    tips: RwLock<BTreeSet<Hash>>,
}

impl TipSet {
    pub fn new(store: DagStore) -> Self {
        Self {
            store,
            tips: RwLock::new(BTreeSet::new()),
        }
    }

    /// Current tips in hash order.
    pub fn tips(&self) -> WitnessResult<Vec<Hash>> {
        {
            let tips = self.tips.read();
            if !tips.is_empty() {
                return Ok(tips.iter().copied().collect());
            }
        }
        let mut tips = self.tips.write();
        if tips.is_empty() {
            tips.extend(self.store.tips()?);
            debug!(tips = tips.len(), "tip set hydrated");
        }
        Ok(tips.iter().copied().collect())
    }

    /// Queue the tip changes caused by inserting `unit`.
    pub fn stage(&self, batch: &mut StoreBatch, unit: &Unit) -> WitnessResult<()> {
        for parent in &unit.parent_list {
            batch.delete_tip(parent);
        }
        batch.put_tip(&unit.hash)?;
        Ok(())
    }

    /// Mirror a committed [`TipSet::stage`] into the cache.
    pub fn apply(&self, unit: &Unit) {
        let mut tips = self.tips.write();
        if tips.is_empty() {
            // Not hydrated yet; the next read scans storage.
            return;
        }
        for parent in &unit.parent_list {
            tips.remove(parent);
        }
        tips.insert(unit.hash);
    }

    pub fn invalidate(&self) {
        self.tips.write().clear();
    }

    /// Tips whose witness list differs from `witness_list` in at most
    /// `max_mutations` addresses.
    pub fn compatible_tips(
        &self,
        witness_list: &[Address],
        max_mutations: usize,
    ) -> WitnessResult<Vec<Hash>> {
        let reference: BTreeSet<&Address> = witness_list.iter().collect();
        let mut compatible = Vec::new();
        for hash in self.tips()? {
            let unit = self
                .store
                .unit(&hash)?
                .ok_or(WitnessError::MissingUnit(hash))?;
            let foreign = unit
                .witness_list
                .iter()
                .filter(|w| !reference.contains(w))
                .count();
            if foreign <= max_mutations {
                compatible.push(hash);
            }
        }
        Ok(compatible)
    }
}
