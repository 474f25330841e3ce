//! # Ledger Events
//!
//! Everything the ledger announces to the outside world. The broadcast and
//! sync layers subscribe here instead of polling storage.

use serde::{Deserialize, Serialize};
use shared_types::{Address, Hash};

/// A stability layer committed in one atomic step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalizedBatch {
    /// Index shared by every unit of the batch.
    pub main_chain_index: u64,
    /// The unit that joined the main chain.
    pub main_chain_unit: Hash,
    /// Every unit stabilized by this step, in `(level, hash)` order.
    pub units: Vec<Hash>,
    /// Units of the batch classified as double-spends.
    pub invalid: Vec<Hash>,
}

/// All events that can be published to the bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum LedgerEvent {
    // =========================================================================
    // SUBMISSION
    // =========================================================================
    /// A unit passed review and was applied to the pending set.
    UnitAccepted {
        unit_hash: Hash,
        author: Address,
        level: i64,
    },

    /// A unit was turned away. `retryable` units wait for sync.
    UnitRejected {
        unit_hash: Hash,
        reason: String,
        retryable: bool,
    },

    // =========================================================================
    // STABILITY
    // =========================================================================
    /// The stability frontier advanced.
    BatchFinalized(FinalizedBatch),

    // =========================================================================
    // GOVERNANCE
    // =========================================================================
    /// A vote result was applied to the witness set.
    WitnessReplaced {
        round: i64,
        replaced: Address,
        replacement: Address,
    },
}

impl LedgerEvent {
    /// Get the topic for this event.
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            LedgerEvent::UnitAccepted { .. } | LedgerEvent::UnitRejected { .. } => {
                EventTopic::Submission
            }
            LedgerEvent::BatchFinalized(_) => EventTopic::Stability,
            LedgerEvent::WitnessReplaced { .. } => EventTopic::Governance,
        }
    }
}

/// Event topics for filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    Submission,
    Stability,
    Governance,
    /// All events (no filtering).
    All,
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<EventTopic>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self { topics }
    }

    #[must_use]
    pub fn matches(&self, event: &LedgerEvent) -> bool {
        self.topics.is_empty()
            || self.topics.contains(&EventTopic::All)
            || self.topics.contains(&event.topic())
    }
}
