//! Value codec for persisted records (bincode).

use crate::errors::{StorageError, StorageResult};
use serde::de::DeserializeOwned;
use serde::Serialize;

pub fn encode<T: Serialize>(key: &[u8], value: &T) -> StorageResult<Vec<u8>> {
    bincode::serialize(value).map_err(|e| StorageError::Codec {
        key: String::from_utf8_lossy(key).into_owned(),
        message: e.to_string(),
    })
}

pub fn decode<T: DeserializeOwned>(key: &[u8], bytes: &[u8]) -> StorageResult<T> {
    bincode::deserialize(bytes).map_err(|e| StorageError::Codec {
        key: String::from_utf8_lossy(key).into_owned(),
        message: e.to_string(),
    })
}
