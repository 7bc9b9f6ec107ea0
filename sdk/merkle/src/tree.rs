//! Merkle Tree
//!
//! Dense, fixed-depth binary tree. Built once from its full leaf sequence,
//! then mutated one leaf at a time in O(depth).

use std::fmt;
use std::sync::Arc;

use zkzru_crypto::{FieldElement, FieldHasher};

use crate::MerkleError;
use crate::math::{
    affected_positions, binary_position, inner_nodes_from_leaf_and_path, pairwise_hash,
    proof_positions, root_from_leaf_and_path,
};

/// Anything that can sit in a tree leaf.
pub trait MerkleLeaf {
    fn leaf_hash(&self) -> FieldElement;
}

impl MerkleLeaf for FieldElement {
    fn leaf_hash(&self) -> FieldElement {
        *self
    }
}

/// An authentication path plus the position bits that order it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleProof {
    /// Sibling hashes from leaf to root
    pub siblings: Vec<FieldElement>,
    /// Position bits (0 = left, 1 = right), leaf level first
    pub positions: Vec<u8>,
}

#[derive(Clone)]
pub struct MerkleTree {
    hasher: Arc<dyn FieldHasher>,
    depth: usize,
    leaf_nodes: Vec<FieldElement>,
    /// `inner_nodes[0]` holds the root, `inner_nodes[depth - 1]` the
    /// parents of the leaves.
    inner_nodes: Vec<Vec<FieldElement>>,
    root: FieldElement,
}

impl MerkleTree {
    /// Build the tree bottom-up from a power-of-two number of leaves.
    pub fn build(
        hasher: Arc<dyn FieldHasher>,
        leaves: Vec<FieldElement>,
    ) -> Result<Self, MerkleError> {
        let count = leaves.len();
        if count < 2 || !count.is_power_of_two() {
            return Err(MerkleError::InvalidLeafCount(count));
        }
        let depth = count.trailing_zeros() as usize;

        let mut inner_nodes = vec![Vec::new(); depth];
        inner_nodes[depth - 1] = pairwise_hash(hasher.as_ref(), &leaves);
        for level in (0..depth - 1).rev() {
            inner_nodes[level] = pairwise_hash(hasher.as_ref(), &inner_nodes[level + 1]);
        }
        let root = inner_nodes[0][0];
        log::trace!("built merkle tree of depth {} over {} leaves", depth, count);

        Ok(Self {
            hasher,
            depth,
            leaf_nodes: leaves,
            inner_nodes,
            root,
        })
    }

    /// Build from anything that hashes into a leaf.
    pub fn from_leaves<L: MerkleLeaf>(
        hasher: Arc<dyn FieldHasher>,
        leaves: &[L],
    ) -> Result<Self, MerkleError> {
        Self::build(hasher, leaves.iter().map(MerkleLeaf::leaf_hash).collect())
    }

    pub fn root(&self) -> FieldElement {
        self.root
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn len(&self) -> usize {
        self.leaf_nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leaf_nodes.is_empty()
    }

    pub fn leaves(&self) -> &[FieldElement] {
        &self.leaf_nodes
    }

    pub fn leaf(&self, index: usize) -> FieldElement {
        self.leaf_nodes[index]
    }

    pub fn inner_nodes(&self) -> &[Vec<FieldElement>] {
        &self.inner_nodes
    }

    pub fn hasher(&self) -> &Arc<dyn FieldHasher> {
        &self.hasher
    }

    /// Authentication path for the leaf at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not a leaf of this tree.
    pub fn proof(&self, index: usize) -> MerkleProof {
        self.assert_in_range(index);
        let siblings_at = proof_positions(index, self.depth);

        let mut siblings = Vec::with_capacity(self.depth);
        siblings.push(self.leaf_nodes[siblings_at[0]]);
        for level in 1..self.depth {
            siblings.push(self.inner_nodes[self.depth - level][siblings_at[level]]);
        }

        MerkleProof {
            siblings,
            positions: binary_position(index, self.depth),
        }
    }

    /// Check that `leaf` at `index` with `path` hashes to the current root.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not a leaf of this tree.
    pub fn verify_proof(
        &self,
        leaf: FieldElement,
        index: usize,
        path: &[FieldElement],
    ) -> Result<bool, MerkleError> {
        self.assert_in_range(index);
        self.check_path_len(path)?;
        Ok(root_from_leaf_and_path(self.hasher.as_ref(), leaf, index, path) == self.root)
    }

    /// Replace the leaf at `index` and recompute its `depth` ancestors.
    ///
    /// `path` must be the leaf's current authentication path. Siblings are
    /// untouched by a change to this leaf, so a path read before the change
    /// is still the right one.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not a leaf of this tree.
    pub fn update_inner_nodes(
        &mut self,
        leaf: FieldElement,
        index: usize,
        path: &[FieldElement],
    ) -> Result<(), MerkleError> {
        self.assert_in_range(index);
        self.check_path_len(path)?;

        let affected = affected_positions(&proof_positions(index, self.depth));
        let recomputed = inner_nodes_from_leaf_and_path(self.hasher.as_ref(), leaf, index, path);

        self.leaf_nodes[index] = leaf;
        for (i, (position, node)) in affected.into_iter().zip(recomputed).enumerate() {
            self.inner_nodes[self.depth - 1 - i][position] = node;
        }
        self.root = self.inner_nodes[0][0];
        Ok(())
    }

    /// Index of the first leaf equal to `leaf`.
    pub fn position_of(&self, leaf: FieldElement) -> Option<usize> {
        self.leaf_nodes.iter().position(|l| *l == leaf)
    }

    fn assert_in_range(&self, index: usize) {
        assert!(
            index < self.leaf_nodes.len(),
            "leaf index {} out of range for a tree of {} leaves",
            index,
            self.leaf_nodes.len()
        );
    }

    fn check_path_len(&self, path: &[FieldElement]) -> Result<(), MerkleError> {
        if path.len() != self.depth {
            return Err(MerkleError::InvalidProof {
                expected: self.depth,
                actual: path.len(),
            });
        }
        Ok(())
    }
}

impl fmt::Debug for MerkleTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MerkleTree")
            .field("depth", &self.depth)
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}
