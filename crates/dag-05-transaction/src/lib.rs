//! # dag-05-transaction
//!
//! The submission pipeline of a ledger instance.
//!
//! [`TransactionService`] reviews units, inserts them with their pending
//! effects, drives the stability frontier, and publishes the results on the
//! event bus. [`spawn_pipeline`] puts a bounded, strictly ordered queue in
//! front of it.
//!
//! ## Error policy
//!
//! | Kind | Effect |
//! |------|--------|
//! | Structural | rejected, nothing written |
//! | Referential | rejected, cached until sync delivers ancestry |
//! | Conflict | unit becomes `invalid` at stabilization, or rejected on arrival |
//! | Ordering | operation rejected, state untouched |
//! | Resource | surfaced to the caller |
//! | Duplicate | rejected, nothing written |

pub mod config;
pub mod errors;
pub mod ports;
pub mod queue;
pub mod review;
pub mod service;

pub use config::LedgerConfig;
pub use errors::{ErrorKind, TransactionError, TransactionResult};
pub use ports::{AcceptAllVerifier, SignatureVerifier};
pub use queue::{spawn_pipeline, SubmissionQueue};
pub use service::{Accepted, RetryReport, TransactionService};
