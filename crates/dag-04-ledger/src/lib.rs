//! # UTXO Ledger
//!
//! Value accounting for the DAG.
//!
//! ## Two unspent sets
//!
//! | Set | Key prefix | Written by |
//! |-----|------------|------------|
//! | stable | `o.` | genesis, [`StableProcess`], commission payouts |
//! | pending | `pu.` | [`PendingPool`] on unit arrival |
//!
//! A unit is applied speculatively when it arrives and settled for good when
//! it stabilizes. Between the two, conflicting claims on the same stable
//! output may coexist; stabilization order picks the winner and marks the
//! rest invalid.
//!
//! ## Fees
//!
//! Every valid unit pays its header fee to the author of its smallest child
//! and its payload fee to the author of the main-chain unit of its layer.

pub mod balances;
pub mod commission;
pub mod composer;
pub mod errors;
pub mod genesis;
pub mod pending;
pub mod stable;

#[cfg(test)]
pub(crate) mod test_utils;

pub use balances::{balance_of, pending_balance_of, spendable_utxos, total, unstable_units};
pub use commission::{distribute, group_by_payee, witness_commissions};
pub use composer::UnitComposer;
pub use errors::{LedgerError, LedgerResult};
pub use genesis::{default_witnesses, GenesisBuilder, GenesisConfig};
pub use pending::{ClaimedInput, PendingPool, PendingRebuild, PARALLEL_THRESHOLD};
pub use stable::{miner_commission, LayerSettlement, StableOutcome, StableProcess};
