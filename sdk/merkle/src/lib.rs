//! zkzru Merkle trees
//!
//! A perfect binary tree over field-element leaves, hashed with whatever
//! [`FieldHasher`](zkzru_crypto::FieldHasher) the crypto context carries.
//!
//! ```text
//!                    Root            inner_nodes[0]
//!                   /    \
//!                 H01    H23         inner_nodes[1]
//!                /  \   /   \
//!               L0  L1 L2   L3       leaf_nodes
//! ```
//!
//! Proofs are ordered leaf-to-root. The position vector that comes with a
//! proof holds bit `k` of the leaf index at entry `k`: `1` means the node on
//! the path is the right child at that level.

pub mod math;
pub mod tree;
pub mod zero_cache;

use thiserror::Error;

pub use math::{
    affected_positions, binary_position, inner_nodes_from_leaf_and_path, pairwise_hash,
    proof_positions, root_from_leaf_and_path,
};
pub use tree::{MerkleLeaf, MerkleProof, MerkleTree};
pub use zero_cache::ZeroCache;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MerkleError {
    #[error("leaf count {0} is not a power of two of at least 2")]
    InvalidLeafCount(usize),
    #[error("proof has {actual} siblings but the tree depth is {expected}")]
    InvalidProof { expected: usize, actual: usize },
}
