//! # Ledger Entities
//!
//! Units, balls, UTXOs and the governance records built on top of them.
//!
//! ## Clusters
//!
//! - **Graph**: `Unit`, `Ball`
//! - **Value**: `Input`, `Output`, `Payload`, `Message`, `Utxo`, `Commission`
//! - **Governance**: `VoteResult`
//!
//! Identity hashes are sha3-256 over the JSON encoding of a fixed field
//! struct. Field order in those structs is part of the protocol.

use crate::constants::{PAYMENT_APP, UNIT_VERSION};
use crate::primitives::{Address, Hash};
use serde::{Deserialize, Serialize};
use serde_with::{hex::Hex, serde_as};
use sha3::{Digest, Sha3_256};

/// sha3-256 over the canonical JSON encoding of `value`.
pub fn canonical_hash<T: Serialize>(value: &T) -> Hash {
    // Serializing plain data structs to JSON cannot fail.
    let bytes = serde_json::to_vec(value).unwrap_or_default();
    Hash(Sha3_256::digest(&bytes).into())
}

// =============================================================================
// CLUSTER A: VALUE TRANSFER
// =============================================================================

/// A payment target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Output {
    pub address: Address,
    pub amount: u64,
}

impl Output {
    pub fn new(address: Address, amount: u64) -> Self {
        Self { address, amount }
    }
}

/// Origin of a spendable output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum UtxoKind {
    /// Regular payment output.
    #[default]
    #[serde(rename = "")]
    Normal,
    /// Payload fee paid to the author of the stabilizing main-chain unit.
    #[serde(rename = "wc")]
    WitnessCommission,
    /// Header fee paid to the author of the smallest child unit.
    #[serde(rename = "mc")]
    MinerCommission,
}

impl UtxoKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            UtxoKind::Normal => "",
            UtxoKind::WitnessCommission => "wc",
            UtxoKind::MinerCommission => "mc",
        }
    }
}

/// A claim on a previously created output.
///
/// The input carries the full output it spends so the claimed UTXO can be
/// rebuilt without loading the source unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Input {
    pub unit: Hash,
    pub message_index: u32,
    pub output_index: u32,
    #[serde(rename = "type")]
    pub kind: UtxoKind,
    pub output: Output,
}

impl Input {
    /// The UTXO this input consumes.
    pub fn claimed_utxo(&self) -> Utxo {
        Utxo {
            unit_hash: self.unit,
            message_index: self.message_index,
            output_index: self.output_index,
            output: self.output,
            kind: self.kind,
        }
    }
}

impl From<&Utxo> for Input {
    fn from(utxo: &Utxo) -> Self {
        Self {
            unit: utxo.unit_hash,
            message_index: utxo.message_index,
            output_index: utxo.output_index,
            kind: utxo.kind,
            output: utxo.output,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Payload {
    pub inputs: Vec<Input>,
    pub outputs: Vec<Output>,
}

impl Payload {
    pub fn hash(&self) -> Hash {
        canonical_hash(self)
    }

    pub fn input_total(&self) -> u128 {
        self.inputs.iter().map(|i| i.output.amount as u128).sum()
    }

    pub fn output_total(&self) -> u128 {
        self.outputs.iter().map(|o| o.amount as u128).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub app: String,
    pub payload_hash: Hash,
    pub payload: Payload,
}

impl Message {
    /// A payment message with its payload hash filled in.
    pub fn payment(payload: Payload) -> Self {
        Self {
            app: PAYMENT_APP.to_string(),
            payload_hash: payload.hash(),
            payload,
        }
    }
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub address: Address,
    #[serde_as(as = "Hex")]
    pub signature: Vec<u8>,
}

impl Author {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            signature: Vec::new(),
        }
    }
}

/// A spendable output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Utxo {
    pub unit_hash: Hash,
    pub message_index: u32,
    pub output_index: u32,
    pub output: Output,
    #[serde(rename = "type")]
    pub kind: UtxoKind,
}

impl Utxo {
    pub fn new(
        unit_hash: Hash,
        message_index: u32,
        output_index: u32,
        output: Output,
        kind: UtxoKind,
    ) -> Self {
        Self {
            unit_hash,
            message_index,
            output_index,
            output,
            kind,
        }
    }

    /// Identity used in `o.` and `pu.` keys.
    pub fn hash(&self) -> Hash {
        canonical_hash(self)
    }

    pub fn owner(&self) -> Address {
        self.output.address
    }

    pub fn amount(&self) -> u64 {
        self.output.amount
    }
}

/// A fee payout produced while stabilizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commission {
    pub address: Address,
    pub utxo: Utxo,
}

impl Commission {
    pub fn new(address: Address, utxo: Utxo) -> Self {
        Self { address, utxo }
    }
}

// =============================================================================
// CLUSTER B: THE GRAPH
// =============================================================================

/// A DAG vertex.
///
/// The first block of fields is covered by [`Unit::content_hash`]. The second
/// block is consensus state derived locally and never hashed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    pub hash: Hash,
    pub version: String,
    pub witness_list: Vec<Address>,
    pub last_ball_unit: Hash,
    pub headers_commission: u64,
    pub payload_commission: u64,
    pub timestamp: u64,
    pub parent_list: Vec<Hash>,
    pub authors: Vec<Author>,
    pub messages: Vec<Message>,

    pub best_parent_unit: Option<Hash>,
    pub main_chain_index: u64,
    pub is_stable: bool,
    pub is_on_main_chain: bool,
    pub level: i64,
    pub witnessed_level: i64,
    pub sub_stable_min_hash: Hash,
    pub sub_stable_author: Option<Address>,
    pub invalid: bool,
}

#[derive(Serialize)]
struct UnitContent<'a> {
    version: &'a str,
    messages: &'a [Message],
    authors: &'a [Author],
    last_ball_unit: &'a Hash,
    parent_list: &'a [Hash],
    witness_list: &'a [Address],
    headers_commission: u64,
    payload_commission: u64,
}

#[derive(Serialize)]
struct SigningContent<'a> {
    messages: &'a [Message],
    last_ball_unit: &'a Hash,
    parent_list: &'a [Hash],
    witness_list: &'a [Address],
}

impl Default for Unit {
    fn default() -> Self {
        Self {
            hash: Hash::ZERO,
            version: UNIT_VERSION.to_string(),
            witness_list: Vec::new(),
            last_ball_unit: Hash::ZERO,
            headers_commission: 0,
            payload_commission: 0,
            timestamp: 0,
            parent_list: Vec::new(),
            authors: Vec::new(),
            messages: Vec::new(),
            best_parent_unit: None,
            main_chain_index: 0,
            is_stable: false,
            is_on_main_chain: false,
            level: 0,
            witnessed_level: 0,
            sub_stable_min_hash: Hash::MAX,
            sub_stable_author: None,
            invalid: false,
        }
    }
}

impl Unit {
    /// Identity hash over the immutable fields.
    pub fn content_hash(&self) -> Hash {
        canonical_hash(&UnitContent {
            version: &self.version,
            messages: &self.messages,
            authors: &self.authors,
            last_ball_unit: &self.last_ball_unit,
            parent_list: &self.parent_list,
            witness_list: &self.witness_list,
            headers_commission: self.headers_commission,
            payload_commission: self.payload_commission,
        })
    }

    /// Digest authors sign. Excludes `authors` so signatures can be embedded.
    pub fn signing_hash(&self) -> Hash {
        canonical_hash(&SigningContent {
            messages: &self.messages,
            last_ball_unit: &self.last_ball_unit,
            parent_list: &self.parent_list,
            witness_list: &self.witness_list,
        })
    }

    /// Recompute and store the identity hash.
    pub fn seal(&mut self) -> Hash {
        self.hash = self.content_hash();
        self.hash
    }

    pub fn is_genesis(&self) -> bool {
        self.parent_list.is_empty()
    }

    /// Address of the first (and in practice only) author.
    pub fn author(&self) -> Option<Address> {
        self.authors.first().map(|a| a.address)
    }

    pub fn inputs(&self) -> impl Iterator<Item = &Input> {
        self.messages.iter().flat_map(|m| m.payload.inputs.iter())
    }

    /// Outputs with their `(message_index, output_index)` position.
    pub fn indexed_outputs(&self) -> impl Iterator<Item = (u32, u32, &Output)> {
        self.messages.iter().enumerate().flat_map(|(mi, m)| {
            m.payload
                .outputs
                .iter()
                .enumerate()
                .map(move |(oi, o)| (mi as u32, oi as u32, o))
        })
    }

    /// Stable UTXO created by each output of this unit.
    pub fn output_utxos(&self) -> Vec<Utxo> {
        self.indexed_outputs()
            .map(|(mi, oi, out)| Utxo::new(self.hash, mi, oi, *out, UtxoKind::Normal))
            .collect()
    }

    pub fn mark_stable(&mut self, main_chain_index: u64) {
        self.is_stable = true;
        self.main_chain_index = main_chain_index;
    }

    /// Drop any consensus state a sender may have attached.
    pub fn reset_stable_state(&mut self) {
        self.is_stable = false;
        self.main_chain_index = 0;
        self.is_on_main_chain = false;
    }

    /// Track the smallest child hash and its author. Returns true on change.
    pub fn update_sub_stable_min_hash(&mut self, child: Hash, author: Address) -> bool {
        if self.sub_stable_min_hash > child {
            self.sub_stable_min_hash = child;
            self.sub_stable_author = Some(author);
            true
        } else {
            false
        }
    }
}

/// Finalized wrapper around a stabilized unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ball {
    pub unit_hash: Hash,
    pub parent_balls: Vec<Hash>,
    pub is_invalid: bool,
}

impl Ball {
    pub fn new(unit_hash: Hash, parent_balls: Vec<Hash>, is_invalid: bool) -> Self {
        Self {
            unit_hash,
            parent_balls,
            is_invalid,
        }
    }

    /// Balls are keyed by the unit they wrap.
    pub fn key(&self) -> Hash {
        self.unit_hash
    }
}

// =============================================================================
// CLUSTER C: GOVERNANCE
// =============================================================================

/// One witness-replacement decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct VoteResult {
    pub start_time: u64,
    pub end_time: u64,
    pub vote_result: Address,
    pub replaced_witness: Address,
    pub round: i64,
}

impl VoteResult {
    pub fn new(
        start_time: u64,
        end_time: u64,
        vote_result: Address,
        replaced_witness: Address,
        round: i64,
    ) -> Self {
        Self {
            start_time,
            end_time,
            vote_result,
            replaced_witness,
            round,
        }
    }
}
