//! Outbound (driven) ports.

use shared_types::Unit;

/// Checks the authors' signatures over [`Unit::signing_hash`].
pub trait SignatureVerifier: Send + Sync {
    fn verify(&self, unit: &Unit) -> bool;
}

/// Trusts every unit. Development nodes and tests only.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAllVerifier;

impl SignatureVerifier for AcceptAllVerifier {
    fn verify(&self, _unit: &Unit) -> bool {
        true
    }
}

/// Rejects every unit.
#[cfg(test)]
pub struct RejectAllVerifier;

#[cfg(test)]
impl SignatureVerifier for RejectAllVerifier {
    fn verify(&self, _unit: &Unit) -> bool {
        false
    }
}
