//! # Key Layout
//!
//! | Prefix | Suffix | Value |
//! |---|---|---|
//! | `u.` | unit hash | `Unit` |
//! | `b.` | unit hash | `Ball` |
//! | `pl.` | unit hash | `Hash` (current tips) |
//! | `wl.` | address | `Address` (current witnesses) |
//! | `o.` | address `.` utxo hash | stable `Utxo` |
//! | `pu.` | address `.` utxo hash | pending `Utxo` |
//! | `children.` | unit hash | `Vec<Hash>` |
//! | `su.` | main-chain unit hash | `Vec<Hash>` stabilized with it |
//! | `mci.` | padded index | main-chain unit `Hash` |
//! | `vote_round.` | (none) | `i64` |
//! | `replace_round.` | (none) | `i64` last applied replacement |
//! | `vote_result.` | padded round | `VoteResult` |
//! | `ra.` | padded round `.` address | `u64` activity counter |
//! | `cache.` | unit hash | `Unit` awaiting sync |
//!
//! Integers in keys are zero-padded to 20 digits so scans come back in
//! numeric order.

use shared_types::{Address, Hash};

pub const UNIT: &str = "u.";
pub const BALL: &str = "b.";
pub const TIP: &str = "pl.";
pub const WITNESS: &str = "wl.";
pub const STABLE_UTXO: &str = "o.";
pub const PENDING_UTXO: &str = "pu.";
pub const CHILDREN: &str = "children.";
pub const STABILIZED: &str = "su.";
pub const MAIN_CHAIN_INDEX: &str = "mci.";
pub const VOTE_ROUND: &str = "vote_round.";
pub const REPLACE_ROUND: &str = "replace_round.";
pub const VOTE_RESULT: &str = "vote_result.";
pub const ROUND_ACTIVITY: &str = "ra.";
pub const CACHE: &str = "cache.";

fn key(prefix: &str, suffix: impl std::fmt::Display) -> Vec<u8> {
    format!("{prefix}{suffix}").into_bytes()
}

/// Rounds may be negative in arithmetic but are never stored below zero.
fn padded(n: i64) -> String {
    format!("{:020}", n.max(0))
}

pub fn unit(hash: &Hash) -> Vec<u8> {
    key(UNIT, hash)
}

pub fn ball(hash: &Hash) -> Vec<u8> {
    key(BALL, hash)
}

pub fn tip(hash: &Hash) -> Vec<u8> {
    key(TIP, hash)
}

pub fn witness(address: &Address) -> Vec<u8> {
    key(WITNESS, address)
}

pub fn stable_utxo(address: &Address, utxo_hash: &Hash) -> Vec<u8> {
    format!("{STABLE_UTXO}{address}.{utxo_hash}").into_bytes()
}

pub fn stable_utxos_of(address: &Address) -> Vec<u8> {
    format!("{STABLE_UTXO}{address}.").into_bytes()
}

pub fn pending_utxo(address: &Address, utxo_hash: &Hash) -> Vec<u8> {
    format!("{PENDING_UTXO}{address}.{utxo_hash}").into_bytes()
}

pub fn pending_utxos_of(address: &Address) -> Vec<u8> {
    format!("{PENDING_UTXO}{address}.").into_bytes()
}

pub fn children(hash: &Hash) -> Vec<u8> {
    key(CHILDREN, hash)
}

pub fn stabilized(main_chain_unit: &Hash) -> Vec<u8> {
    key(STABILIZED, main_chain_unit)
}

pub fn main_chain_index(mci: u64) -> Vec<u8> {
    key(MAIN_CHAIN_INDEX, format!("{mci:020}"))
}

pub fn vote_round() -> Vec<u8> {
    VOTE_ROUND.as_bytes().to_vec()
}

pub fn replace_round() -> Vec<u8> {
    REPLACE_ROUND.as_bytes().to_vec()
}

pub fn vote_result(round: i64) -> Vec<u8> {
    key(VOTE_RESULT, padded(round))
}

pub fn round_activity(round: i64, address: &Address) -> Vec<u8> {
    format!("{ROUND_ACTIVITY}{}.{address}", padded(round)).into_bytes()
}

pub fn round_activity_of(round: i64) -> Vec<u8> {
    format!("{ROUND_ACTIVITY}{}.", padded(round)).into_bytes()
}

pub fn cache(hash: &Hash) -> Vec<u8> {
    key(CACHE, hash)
}
