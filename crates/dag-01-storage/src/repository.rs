//! # Ledger Repository
//!
//! Typed access to the key layout in [`crate::keys`]. Reads are available on
//! both the committed store ([`DagStore`]) and an open [`StoreBatch`], so
//! code running inside a logical step sees its own earlier writes.

use crate::adapters::codec::decode;
use crate::batch::StoreBatch;
use crate::errors::StorageResult;
use crate::keys;
use crate::ports::outbound::KeyValueStore;
use serde::de::DeserializeOwned;
use shared_types::{Address, Ball, Hash, Unit, Utxo, VoteResult};
use std::sync::Arc;

/// Raw read access shared by the store and open batches.
pub trait KeyValueRead {
    fn read_raw(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>>;

    fn scan_raw(&self, prefix: &[u8]) -> StorageResult<Vec<(Vec<u8>, Vec<u8>)>>;
}

fn read<T: DeserializeOwned, R: KeyValueRead + ?Sized>(
    reader: &R,
    key: &[u8],
) -> StorageResult<Option<T>> {
    match reader.read_raw(key)? {
        Some(bytes) => decode(key, &bytes).map(Some),
        None => Ok(None),
    }
}

fn scan<T: DeserializeOwned, R: KeyValueRead + ?Sized>(
    reader: &R,
    prefix: &[u8],
) -> StorageResult<Vec<T>> {
    reader
        .scan_raw(prefix)?
        .into_iter()
        .map(|(k, v)| decode(&k, &v))
        .collect()
}

/// Typed reads over the ledger key layout.
pub trait DagRead: KeyValueRead {
    fn unit(&self, hash: &Hash) -> StorageResult<Option<Unit>> {
        read(self, &keys::unit(hash))
    }

    fn has_unit(&self, hash: &Hash) -> StorageResult<bool> {
        Ok(self.read_raw(&keys::unit(hash))?.is_some())
    }

    fn ball(&self, hash: &Hash) -> StorageResult<Option<Ball>> {
        read(self, &keys::ball(hash))
    }

    /// Current tips in hash order.
    fn tips(&self) -> StorageResult<Vec<Hash>> {
        scan(self, keys::TIP.as_bytes())
    }

    /// Current witnesses in address order.
    fn witnesses(&self) -> StorageResult<Vec<Address>> {
        scan(self, keys::WITNESS.as_bytes())
    }

    fn has_stable_utxo(&self, utxo: &Utxo) -> StorageResult<bool> {
        Ok(self
            .read_raw(&keys::stable_utxo(&utxo.owner(), &utxo.hash()))?
            .is_some())
    }

    fn has_pending_utxo(&self, utxo: &Utxo) -> StorageResult<bool> {
        Ok(self
            .read_raw(&keys::pending_utxo(&utxo.owner(), &utxo.hash()))?
            .is_some())
    }

    fn stable_utxos(&self, owner: &Address) -> StorageResult<Vec<Utxo>> {
        scan(self, &keys::stable_utxos_of(owner))
    }

    fn pending_utxos(&self, owner: &Address) -> StorageResult<Vec<Utxo>> {
        scan(self, &keys::pending_utxos_of(owner))
    }

    fn all_pending_utxos(&self) -> StorageResult<Vec<Utxo>> {
        scan(self, keys::PENDING_UTXO.as_bytes())
    }

    fn children(&self, hash: &Hash) -> StorageResult<Vec<Hash>> {
        Ok(read(self, &keys::children(hash))?.unwrap_or_default())
    }

    fn stabilized(&self, main_chain_unit: &Hash) -> StorageResult<Vec<Hash>> {
        Ok(read(self, &keys::stabilized(main_chain_unit))?.unwrap_or_default())
    }

    fn main_chain_unit(&self, mci: u64) -> StorageResult<Option<Hash>> {
        read(self, &keys::main_chain_index(mci))
    }

    /// Latest saved vote round; 0 before any vote.
    fn vote_round(&self) -> StorageResult<i64> {
        Ok(read(self, &keys::vote_round())?.unwrap_or(0))
    }

    /// Last applied replacement round, if any was recorded.
    fn replace_round(&self) -> StorageResult<Option<i64>> {
        read(self, &keys::replace_round())
    }

    fn vote_result(&self, round: i64) -> StorageResult<Option<VoteResult>> {
        read(self, &keys::vote_result(round))
    }

    fn round_activity(&self, round: i64, address: &Address) -> StorageResult<u64> {
        Ok(read::<(Address, u64), _>(self, &keys::round_activity(round, address))?
            .map(|(_, count)| count)
            .unwrap_or(0))
    }

    /// Every author counted in `round`, in address order.
    fn round_activities(&self, round: i64) -> StorageResult<Vec<(Address, u64)>> {
        scan(self, &keys::round_activity_of(round))
    }

    fn cached_units(&self) -> StorageResult<Vec<Unit>> {
        scan(self, keys::CACHE.as_bytes())
    }
}

impl<T: KeyValueRead + ?Sized> DagRead for T {}

/// Handle to the committed ledger state.
#[derive(Clone)]
pub struct DagStore {
    kv: Arc<dyn KeyValueStore>,
}

impl DagStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    /// Open a write group. Nothing is visible to other readers until
    /// [`StoreBatch::commit`].
    pub fn batch(&self) -> StoreBatch {
        StoreBatch::new(Arc::clone(&self.kv))
    }

    pub fn backend(&self) -> &Arc<dyn KeyValueStore> {
        &self.kv
    }
}

impl KeyValueRead for DagStore {
    fn read_raw(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
        Ok(self.kv.get(key)?)
    }

    fn scan_raw(&self, prefix: &[u8]) -> StorageResult<Vec<(Vec<u8>, Vec<u8>)>> {
        Ok(self.kv.prefix_scan(prefix)?)
    }
}
