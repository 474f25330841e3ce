//! # Store Batch
//!
//! An atomic write group with read-your-writes semantics. Every logical ledger
//! step (accepting a unit, stabilizing a layer, seeding genesis) runs against
//! one `StoreBatch` and lands in the backend with a single
//! `atomic_batch_write`, or not at all.

use crate::adapters::codec::encode;
use crate::errors::StorageResult;
use crate::keys;
use crate::ports::outbound::{BatchOperation, KeyValueStore};
use crate::repository::KeyValueRead;
use serde::Serialize;
use shared_types::{Address, Ball, Hash, Unit, Utxo, VoteResult};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::trace;

pub struct StoreBatch {
    kv: Arc<dyn KeyValueStore>,
    /// `None` marks a pending delete.
    overlay: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
}

impl StoreBatch {
    pub(crate) fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self {
            kv,
            overlay: BTreeMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.overlay.is_empty()
    }

    pub fn len(&self) -> usize {
        self.overlay.len()
    }

    pub fn put_raw(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.overlay.insert(key, Some(value));
    }

    pub fn delete_raw(&mut self, key: Vec<u8>) {
        self.overlay.insert(key, None);
    }

    fn put<T: Serialize>(&mut self, key: Vec<u8>, value: &T) -> StorageResult<()> {
        let bytes = encode(&key, value)?;
        self.put_raw(key, bytes);
        Ok(())
    }

    pub fn put_unit(&mut self, unit: &Unit) -> StorageResult<()> {
        self.put(keys::unit(&unit.hash), unit)
    }

    pub fn put_ball(&mut self, ball: &Ball) -> StorageResult<()> {
        self.put(keys::ball(&ball.key()), ball)
    }

    pub fn put_tip(&mut self, hash: &Hash) -> StorageResult<()> {
        self.put(keys::tip(hash), hash)
    }

    pub fn delete_tip(&mut self, hash: &Hash) {
        self.delete_raw(keys::tip(hash));
    }

    pub fn put_witness(&mut self, address: &Address) -> StorageResult<()> {
        self.put(keys::witness(address), address)
    }

    pub fn delete_witness(&mut self, address: &Address) {
        self.delete_raw(keys::witness(address));
    }

    pub fn put_stable_utxo(&mut self, utxo: &Utxo) -> StorageResult<()> {
        self.put(keys::stable_utxo(&utxo.owner(), &utxo.hash()), utxo)
    }

    pub fn delete_stable_utxo(&mut self, utxo: &Utxo) {
        self.delete_raw(keys::stable_utxo(&utxo.owner(), &utxo.hash()));
    }

    pub fn put_pending_utxo(&mut self, utxo: &Utxo) -> StorageResult<()> {
        self.put(keys::pending_utxo(&utxo.owner(), &utxo.hash()), utxo)
    }

    pub fn delete_pending_utxo(&mut self, utxo: &Utxo) {
        self.delete_raw(keys::pending_utxo(&utxo.owner(), &utxo.hash()));
    }

    pub fn put_children(&mut self, parent: &Hash, children: &[Hash]) -> StorageResult<()> {
        self.put(keys::children(parent), &children.to_vec())
    }

    pub fn put_stabilized(&mut self, main_chain_unit: &Hash, units: &[Hash]) -> StorageResult<()> {
        self.put(keys::stabilized(main_chain_unit), &units.to_vec())
    }

    pub fn put_main_chain_index(&mut self, mci: u64, unit: &Hash) -> StorageResult<()> {
        self.put(keys::main_chain_index(mci), unit)
    }

    pub fn put_vote_round(&mut self, round: i64) -> StorageResult<()> {
        self.put(keys::vote_round(), &round)
    }

    pub fn put_replace_round(&mut self, round: i64) -> StorageResult<()> {
        self.put(keys::replace_round(), &round)
    }

    pub fn put_vote_result(&mut self, result: &VoteResult) -> StorageResult<()> {
        self.put(keys::vote_result(result.round), result)
    }

    pub fn put_round_activity(
        &mut self,
        round: i64,
        address: &Address,
        count: u64,
    ) -> StorageResult<()> {
        self.put(keys::round_activity(round, address), &(*address, count))
    }

    pub fn put_cached_unit(&mut self, unit: &Unit) -> StorageResult<()> {
        self.put(keys::cache(&unit.hash), unit)
    }

    pub fn delete_cached_unit(&mut self, hash: &Hash) {
        self.delete_raw(keys::cache(hash));
    }

    /// Drain the overlay into backend operations.
    pub fn into_operations(self) -> Vec<BatchOperation> {
        self.overlay
            .into_iter()
            .map(|(key, value)| match value {
                Some(value) => BatchOperation::Put { key, value },
                None => BatchOperation::Delete { key },
            })
            .collect()
    }

    /// Apply every queued write atomically.
    pub fn commit(self) -> StorageResult<()> {
        if self.overlay.is_empty() {
            return Ok(());
        }
        let kv = Arc::clone(&self.kv);
        let operations = self.into_operations();
        trace!(operations = operations.len(), "committing store batch");
        kv.atomic_batch_write(operations)?;
        Ok(())
    }
}

impl KeyValueRead for StoreBatch {
    fn read_raw(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
        match self.overlay.get(key) {
            Some(value) => Ok(value.clone()),
            None => Ok(self.kv.get(key)?),
        }
    }

    fn scan_raw(&self, prefix: &[u8]) -> StorageResult<Vec<(Vec<u8>, Vec<u8>)>> {
        let mut merged: BTreeMap<Vec<u8>, Vec<u8>> =
            self.kv.prefix_scan(prefix)?.into_iter().collect();
        for (key, value) in self
            .overlay
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
        {
            match value {
                Some(v) => {
                    merged.insert(key.clone(), v.clone());
                }
                None => {
                    merged.remove(key);
                }
            }
        }
        Ok(merged.into_iter().collect())
    }
}
