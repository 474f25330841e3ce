//! # Shared Bus - Ledger Event Bus
//!
//! Decouples the ledger from whoever consumes its results (broadcast, sync,
//! wallets). The ledger publishes; consumers subscribe with a topic filter.
//!
//! ```text
//! ┌──────────────┐   publish()   ┌──────────────┐   subscribe()   ┌──────────────┐
//! │ Transaction  │ ────────────→ │  Event Bus   │ ──────────────→ │ Sync / P2P   │
//! │   service    │               │ (broadcast)  │                 │   layers     │
//! └──────────────┘               └──────────────┘                 └──────────────┘
//! ```

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod events;
pub mod publisher;
pub mod subscriber;

pub use events::{EventFilter, EventTopic, FinalizedBatch, LedgerEvent};
pub use publisher::{EventPublisher, InMemoryEventBus};
pub use subscriber::{EventStream, Subscription, SubscriptionError};

/// Maximum events to buffer per subscriber before it starts lagging.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;
