//! Ports consumed by the submission pipeline.

pub mod outbound;

pub use outbound::{AcceptAllVerifier, SignatureVerifier};
