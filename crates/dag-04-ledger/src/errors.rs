//! Error types for the UTXO ledger.

use dag_01_storage::StorageError;
use dag_02_witness::WitnessError;
use dag_03_graph::GraphError;
use shared_types::{Address, Hash};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Witness(#[from] WitnessError),

    /// An input names a unit that is not stored locally.
    #[error("Unit {unit} spends from unknown unit {from_unit}")]
    MissingSourceUnit { unit: Hash, from_unit: Hash },

    /// The claimed output is not in the unspent set it should be in.
    #[error("Unit {unit} claims unspent output {utxo} that was not found")]
    UnspentNotFound { unit: Hash, utxo: Hash },

    /// The claimed output came from a stable unit and a stable unit already
    /// spent it. More sync cannot change that.
    #[error("Unit {unit} claims output {utxo} that a stable unit already spent")]
    SpentByStableUnit { unit: Hash, utxo: Hash },

    #[error("Unit {0} has no author")]
    NoAuthor(Hash),

    #[error("Insufficient balance for {address}: required {required}, available {available}")]
    NotEnoughBalance {
        address: Address,
        required: u128,
        available: u128,
    },

    #[error("Balance of {address} covers the amount but not the commission: required {required}, available {available}")]
    NotEnoughCommission {
        address: Address,
        required: u128,
        available: u128,
    },

    #[error("Payment amount must be positive")]
    ZeroAmount,

    #[error("No tip is compatible with the current witness list")]
    NoCompatibleParents,

    #[error("Genesis needs at least one witness")]
    EmptyWitnessList,
}

impl LedgerError {
    /// Failures that more ancestry from sync may resolve.
    pub fn is_referential(&self) -> bool {
        match self {
            LedgerError::MissingSourceUnit { .. } | LedgerError::UnspentNotFound { .. } => true,
            LedgerError::Graph(e) => e.is_missing_ancestor(),
            _ => false,
        }
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;
