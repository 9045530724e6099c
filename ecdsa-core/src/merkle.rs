//! Binary SHA-256 hash tree over ordered leaves.
//!
//! Leaves are hashed as `H(0x00 || leaf)` and interior nodes as
//! `H(0x01 || left || right)`. A trailing node without a sibling is carried up
//! to the next level unchanged, so `[a, b, c]` and `[a, b, c, c]` commit to
//! different roots. Leaf order is significant.

use bitcoin::hashes::{sha256, Hash, HashEngine};

const LEAF_PREFIX: u8 = 0x00;
const NODE_PREFIX: u8 = 0x01;

pub type Digest = [u8; 32];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleTree {
    // levels[0] holds the leaf hashes, the last level holds the root
    levels: Vec<Vec<Digest>>,
}

impl MerkleTree {
    pub fn build<T: AsRef<[u8]>>(leaves: &[T]) -> Self {
        if leaves.is_empty() {
            return MerkleTree { levels: Vec::new() };
        }

        let mut levels = vec![leaves
            .iter()
            .map(|leaf| hash_leaf(leaf.as_ref()))
            .collect::<Vec<_>>()];

        while levels.last().map_or(0, Vec::len) > 1 {
            let next = levels
                .last()
                .map(|level| {
                    level
                        .chunks(2)
                        .map(|pair| match pair {
                            [left, right] => hash_node(left, right),
                            _ => pair[0],
                        })
                        .collect()
                })
                .unwrap_or_default();
            levels.push(next);
        }

        MerkleTree { levels }
    }

    /// Root digest; all zeroes for an empty tree.
    pub fn root(&self) -> Digest {
        self.levels
            .last()
            .and_then(|level| level.first())
            .copied()
            .unwrap_or([0u8; 32])
    }

    pub fn leaf_count(&self) -> usize {
        self.levels.first().map_or(0, Vec::len)
    }

    /// Inclusion proof for the leaf at `index`.
    pub fn proof(&self, index: usize) -> Option<MerkleProof> {
        if index >= self.leaf_count() {
            return None;
        }

        let mut steps = Vec::new();
        let mut idx = index;
        for level in &self.levels[..self.levels.len() - 1] {
            let sibling = idx ^ 1;
            if sibling < level.len() {
                steps.push(if idx % 2 == 0 {
                    Sibling::Right(level[sibling])
                } else {
                    Sibling::Left(level[sibling])
                });
            }
            idx /= 2;
        }

        Some(MerkleProof { steps })
    }
}

/// Position of a sibling hash relative to the running node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sibling {
    Left(Digest),
    Right(Digest),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleProof {
    steps: Vec<Sibling>,
}

impl MerkleProof {
    /// Root implied by this proof for `leaf`.
    pub fn compute_root(&self, leaf: &[u8]) -> Digest {
        self.steps
            .iter()
            .fold(hash_leaf(leaf), |acc, step| match step {
                Sibling::Left(left) => hash_node(left, &acc),
                Sibling::Right(right) => hash_node(&acc, right),
            })
    }

    pub fn verify(&self, root: &Digest, leaf: &[u8]) -> bool {
        &self.compute_root(leaf) == root
    }

    pub fn steps(&self) -> &[Sibling] {
        &self.steps
    }
}

fn hash_leaf(leaf: &[u8]) -> Digest {
    let mut engine = sha256::Hash::engine();
    engine.input(&[LEAF_PREFIX]);
    engine.input(leaf);
    sha256::Hash::from_engine(engine).to_byte_array()
}

fn hash_node(left: &Digest, right: &Digest) -> Digest {
    let mut engine = sha256::Hash::engine();
    engine.input(&[NODE_PREFIX]);
    engine.input(left);
    engine.input(right);
    sha256::Hash::from_engine(engine).to_byte_array()
}
