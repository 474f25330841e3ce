//! # dag-02-witness
//!
//! Witness governance for the ledger.
//!
//! ## Components
//!
//! - [`WitnessSet`]: cached current witness list plus the vote and replace
//!   round counters.
//! - [`TipSet`]: cached set of unreferenced units.
//! - [`WitnessReplacer`]: counts authorship inside a time window, picks the
//!   least active witness and the strongest campaigners, and persists the
//!   round's [`shared_types::VoteResult`].
//!
//! Both caches hydrate lazily from storage and are only mutated after the
//! write group they mirror has committed.

pub mod errors;
pub mod replacer;
pub mod tip_set;
pub mod witness_set;

pub use errors::{WitnessError, WitnessResult};
pub use replacer::WitnessReplacer;
pub use tip_set::TipSet;
pub use witness_set::WitnessSet;
