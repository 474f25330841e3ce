//! # Stable Merkle Tree
//!
//! Binary SHA3-256 tree over stable unit hashes, in the order
//! [`GraphInfoGetter::missing_units`](crate::GraphInfoGetter::missing_units)
//! returns them (level, then hash).
//!
//! | Leaves | Root |
//! |--------|------|
//! | none | [`Hash::ZERO`] |
//! | one | the leaf itself |
//! | odd count at any level | last node paired with itself |

use sha3::{Digest, Sha3_256};
use shared_types::Hash;

/// Side of the running hash a sibling sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    Left,
    Right,
}

/// One step of an inclusion proof.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProofNode {
    pub hash: Hash,
    pub position: Position,
}

impl ProofNode {
    pub fn left(hash: Hash) -> Self {
        Self {
            hash,
            position: Position::Left,
        }
    }

    pub fn right(hash: Hash) -> Self {
        Self {
            hash,
            position: Position::Right,
        }
    }
}

/// `SHA3-256(left || right)`.
pub fn hash_pair(left: &Hash, right: &Hash) -> Hash {
    let mut hasher = Sha3_256::new();
    hasher.update(left.0);
    hasher.update(right.0);
    Hash(hasher.finalize().into())
}

fn next_level(level: &[Hash]) -> Vec<Hash> {
    level
        .chunks(2)
        .map(|pair| hash_pair(&pair[0], pair.get(1).unwrap_or(&pair[0])))
        .collect()
}

pub fn merkle_root(leaves: &[Hash]) -> Hash {
    if leaves.is_empty() {
        return Hash::ZERO;
    }
    let mut level = leaves.to_vec();
    while level.len() > 1 {
        level = next_level(&level);
    }
    level[0]
}

/// Sibling path from the leaf at `index` up to the root, or `None` when
/// `index` is out of range.
pub fn merkle_proof(leaves: &[Hash], index: usize) -> Option<Vec<ProofNode>> {
    if index >= leaves.len() {
        return None;
    }
    let mut proof = Vec::new();
    let mut level = leaves.to_vec();
    let mut index = index;
    while level.len() > 1 {
        let node = if index % 2 == 0 {
            ProofNode::right(*level.get(index + 1).unwrap_or(&level[index]))
        } else {
            ProofNode::left(level[index - 1])
        };
        proof.push(node);
        level = next_level(&level);
        index /= 2;
    }
    Some(proof)
}

pub fn verify_merkle_proof(leaf: &Hash, proof: &[ProofNode], root: &Hash) -> bool {
    let computed = proof.iter().fold(*leaf, |current, node| match node.position {
        Position::Left => hash_pair(&node.hash, &current),
        Position::Right => hash_pair(&current, &node.hash),
    });
    computed == *root
}
