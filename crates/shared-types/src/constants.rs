//! # Protocol Constants
//!
//! Values every node must agree on. Changing any of these forks the ledger.

/// Rounds a vote result must wait before it may change witness membership.
pub const STABLE_ROUNDS: i64 = 1;

/// Default fee paid to the author of the smallest child of a stabilized unit.
pub const HEADER_COMMISSION: u64 = 100;

/// Default fee paid to the author of the main-chain unit that stabilizes a batch.
pub const PAYLOAD_COMMISSION: u64 = 100;

/// Witnesses seeded by the default genesis.
pub const GENESIS_WITNESS_COUNT: usize = 12;

/// Balance each genesis witness starts with.
pub const GENESIS_WITNESS_BALANCE: u64 = 10_000_000;

/// Application tag for value-transfer messages.
pub const PAYMENT_APP: &str = "payment";

/// Unit format version.
pub const UNIT_VERSION: &str = "1.0";

/// Number of distinct witnesses needed for a majority of `witness_count`.
///
/// `n/2 + 1` for even `n`, `ceil(n/2)` for odd `n`. Always derived from the
/// list in hand, never cached apart from it.
pub fn majority_of_witnesses(witness_count: usize) -> usize {
    if witness_count % 2 == 0 {
        witness_count / 2 + 1
    } else {
        witness_count.div_ceil(2)
    }
}
