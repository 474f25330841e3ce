//! # Storage Errors
//!
//! Everything here is a Resource error in ledger terms: callers abort the
//! current logical step and nothing partial is written.

use thiserror::Error;

/// Failures reported by a `KeyValueStore` backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KVStoreError {
    /// I/O error during read/write.
    #[error("KV store I/O error: {message}")]
    IOError { message: String },

    /// Data corruption in the store.
    #[error("KV store corruption: {message}")]
    CorruptionError { message: String },
}

/// Errors surfaced by the typed ledger store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error(transparent)]
    Backend(#[from] KVStoreError),

    /// A stored value could not be encoded or decoded.
    #[error("Codec error for key {key}: {message}")]
    Codec { key: String, message: String },
}

pub type StorageResult<T> = Result<T, StorageError>;
