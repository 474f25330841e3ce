//! Error types for the submission pipeline.
//!
//! Every failure falls into one [`ErrorKind`]. Only referential failures are
//! worth retrying, and only once sync has delivered more ancestry.

use dag_01_storage::StorageError;
use dag_02_witness::WitnessError;
use dag_03_graph::GraphError;
use dag_04_ledger::LedgerError;
use shared_types::{Address, Hash};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed unit; rejected before any state changes.
    Structural,
    /// Depends on a unit or output this node does not have yet.
    Referential,
    /// Claims an output a stable unit already spent.
    Conflict,
    /// Operation applied out of sequence.
    Ordering,
    /// Persistence or pipeline failure.
    Resource,
    /// Unit already stored.
    Duplicate,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransactionError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Witness(#[from] WitnessError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("Unit {0} already exists")]
    AlreadyExists(Hash),

    #[error("Unit {unit} is malformed: {reason}")]
    Malformed { unit: Hash, reason: &'static str },

    #[error("Unit {unit} spends an output owned by {owner}")]
    ForeignInput { unit: Hash, owner: Address },

    #[error(
        "Unit {unit} does not balance: inputs {inputs}, outputs {outputs}, commissions {commissions}"
    )]
    Unbalanced {
        unit: Hash,
        inputs: u128,
        outputs: u128,
        commissions: u128,
    },

    #[error("Unit hash mismatch: declared {declared}, computed {computed}")]
    HashMismatch { declared: Hash, computed: Hash },

    #[error("Unit {0} has an invalid signature")]
    InvalidSignature(Hash),

    #[error("Unit {unit} declares {declared} witnesses, expected {expected}")]
    WitnessListSize {
        unit: Hash,
        declared: usize,
        expected: usize,
    },

    #[error("Unit {unit} witness list differs in {mutations} addresses (max {max})")]
    IncompatibleWitnessList {
        unit: Hash,
        mutations: usize,
        max: usize,
    },

    #[error("Unit {unit} references unknown parent {parent}")]
    MissingParent { unit: Hash, parent: Hash },

    #[error("Unit {unit} references unknown last ball {last_ball}")]
    MissingLastBall { unit: Hash, last_ball: Hash },

    #[error("Unit {unit} last ball {last_ball} is not stable")]
    LastBallNotStable { unit: Hash, last_ball: Hash },

    #[error("Unit {unit} is older than its parent {parent}")]
    TimestampBeforeParent { unit: Hash, parent: Hash },

    #[error("Unit {unit} timestamp {timestamp} is ahead of local time {now}")]
    TimestampInFuture { unit: Hash, timestamp: u64, now: u64 },

    #[error("Unit {unit} declares a wrong {field}")]
    GraphMismatch { unit: Hash, field: &'static str },

    #[error("Submission queue is closed")]
    QueueClosed,
}

impl TransactionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TransactionError::Storage(_) | TransactionError::QueueClosed => ErrorKind::Resource,
            TransactionError::Graph(e) => graph_kind(e),
            TransactionError::Witness(e) => witness_kind(e),
            TransactionError::Ledger(e) => ledger_kind(e),
            TransactionError::AlreadyExists(_) => ErrorKind::Duplicate,
            TransactionError::MissingParent { .. } | TransactionError::MissingLastBall { .. } => {
                ErrorKind::Referential
            }
            _ => ErrorKind::Structural,
        }
    }

    /// True when the unit may be accepted after sync delivers ancestry.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Referential
    }
}

fn graph_kind(e: &GraphError) -> ErrorKind {
    match e {
        GraphError::Storage(_) => ErrorKind::Resource,
        GraphError::NoParents => ErrorKind::Structural,
        _ if e.is_missing_ancestor() => ErrorKind::Referential,
        _ => ErrorKind::Ordering,
    }
}

fn witness_kind(e: &WitnessError) -> ErrorKind {
    match e {
        WitnessError::Storage(_) => ErrorKind::Resource,
        WitnessError::MissingUnit(_) => ErrorKind::Referential,
        _ => ErrorKind::Ordering,
    }
}

fn ledger_kind(e: &LedgerError) -> ErrorKind {
    match e {
        LedgerError::Storage(_) => ErrorKind::Resource,
        LedgerError::Graph(g) => graph_kind(g),
        LedgerError::Witness(w) => witness_kind(w),
        LedgerError::SpentByStableUnit { .. } => ErrorKind::Conflict,
        _ if e.is_referential() => ErrorKind::Referential,
        _ => ErrorKind::Structural,
    }
}

pub type TransactionResult<T> = Result<T, TransactionError>;
