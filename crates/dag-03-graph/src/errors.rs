//! Error types for graph walks and stabilization.

use dag_01_storage::StorageError;
use shared_types::Hash;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// An ancestor needed by a walk is not stored locally yet.
    #[error("Unit {0} not found")]
    MissingUnit(Hash),

    /// A best-parent walk ran out of parents before reaching a stable
    /// main-chain unit.
    #[error("No stable main-chain ancestor below {0}")]
    NoStableAncestor(Hash),

    #[error("Parent list is empty")]
    NoParents,
}

impl GraphError {
    /// True when the walk failed for lack of data that sync can deliver.
    pub fn is_missing_ancestor(&self) -> bool {
        matches!(self, GraphError::MissingUnit(_) | GraphError::NoStableAncestor(_))
    }
}

pub type GraphResult<T> = Result<T, GraphError>;
