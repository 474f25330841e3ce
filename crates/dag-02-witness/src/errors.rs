//! Error types for witness governance.

use dag_01_storage::StorageError;
use shared_types::Address;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WitnessError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Vote result applied out of sequence.
    #[error(
        "Vote round {round} out of order: last applied replace round is {replace_round}, \
         stable rounds {stable_rounds}"
    )]
    RoundOutOfOrder {
        round: i64,
        replace_round: i64,
        stable_rounds: i64,
    },

    /// Vote result not yet `stable_rounds` behind the current vote round.
    #[error(
        "Vote round {round} not effective yet: current vote round {vote_round}, \
         stable rounds {stable_rounds}"
    )]
    NotYetEffective {
        round: i64,
        vote_round: i64,
        stable_rounds: i64,
    },

    #[error("No vote result stored for round {0}")]
    MissingVoteResult(i64),

    #[error("Address {0} is not a current witness")]
    NotAWitness(Address),

    #[error("Address {0} is already a witness")]
    AlreadyWitness(Address),

    #[error("Unit {0} referenced by the tip set is missing")]
    MissingUnit(shared_types::Hash),
}

pub type WitnessResult<T> = Result<T, WitnessError>;
