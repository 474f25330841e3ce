//! Ledger tuning knobs.

use serde::{Deserialize, Serialize};
use shared_types::{HEADER_COMMISSION, PAYLOAD_COMMISSION, STABLE_ROUNDS};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Units waiting in the submission queue before senders block.
    pub submit_queue_capacity: usize,
    /// Header fee put on composed units.
    pub header_commission: u64,
    /// Payload fee put on composed units.
    pub payload_commission: u64,
    /// Rounds a vote result waits before it changes membership.
    pub stable_rounds: i64,
    /// Addresses a unit's witness list may differ from ours in.
    pub max_witness_list_mutations: usize,
    /// Tolerated clock lead of a unit's timestamp; 0 disables the check.
    pub max_future_drift_secs: u64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            submit_queue_capacity: 16,
            header_commission: HEADER_COMMISSION,
            payload_commission: PAYLOAD_COMMISSION,
            stable_rounds: STABLE_ROUNDS,
            max_witness_list_mutations: 1,
            max_future_drift_secs: 0,
        }
    }
}
