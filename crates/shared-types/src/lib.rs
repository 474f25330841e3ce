//! # Shared Types Crate
//!
//! Data model shared by every layer of the witness-DAG ledger.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: units, balls, UTXOs and vote results are
//!   defined once here and persisted as-is by the storage layer.
//! - **Immutable Identity**: a unit's hash covers only the fields its author
//!   chose. Consensus fields (`level`, `is_stable`, ...) are derived locally
//!   and never change the hash.
//! - **Deterministic Ordering**: `Hash` and `Address` order by bytes so every
//!   node breaks ties identically.

pub mod constants;
pub mod entities;
pub mod errors;
pub mod primitives;

pub use constants::*;
pub use entities::*;
pub use errors::*;
pub use primitives::{Address, Hash};
