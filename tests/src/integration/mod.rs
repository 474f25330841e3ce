//! # Integration Tests
//!
//! | Module | Covers |
//! |--------|--------|
//! | `scenarios` | payment settlement, double-spend resolution, sync bounds |
//! | `sync` | catching up a fresh node from missing units |
//! | `witness_rounds` | vote windows and witness replacement |
//! | `idempotence` | replays and restarts |
//! | `runtime` | the node runtime's queue and background tasks |

#[cfg(test)]
pub(crate) mod fixtures;

pub mod idempotence;
pub mod runtime;
pub mod scenarios;
pub mod sync;
pub mod witness_rounds;
