//! Tree Math
//!
//! Index arithmetic and path hashing shared by tree construction, incremental
//! updates, and proof verification. Levels are counted from the leaves: level
//! `0` is the leaf level and level `depth` is the root.

use zkzru_crypto::{FieldElement, FieldHasher};

/// Bits of `index`, leaf level first. Entry `k` is `1` when the path node at
/// level `k` is a right child.
pub fn binary_position(index: usize, depth: usize) -> Vec<u8> {
    (0..depth).map(|level| ((index >> level) & 1) as u8).collect()
}

/// Index of the sibling needed at each level to authenticate `index`.
pub fn proof_positions(index: usize, depth: usize) -> Vec<usize> {
    (0..depth).map(|level| (index >> level) ^ 1).collect()
}

/// Index of the ancestor at each level above the leaf (parent first, root
/// last) that has to be recomputed when the leaf changes.
pub fn affected_positions(proof_positions: &[usize]) -> Vec<usize> {
    proof_positions.iter().map(|sibling| sibling >> 1).collect()
}

/// Hash a whole level pairwise into the level above it.
pub fn pairwise_hash(hasher: &dyn FieldHasher, nodes: &[FieldElement]) -> Vec<FieldElement> {
    nodes
        .chunks_exact(2)
        .map(|pair| hasher.hash_pair(pair[0], pair[1]))
        .collect()
}

/// Every ancestor of `leaf` implied by `path`, parent first, root last.
pub fn inner_nodes_from_leaf_and_path(
    hasher: &dyn FieldHasher,
    leaf: FieldElement,
    index: usize,
    path: &[FieldElement],
) -> Vec<FieldElement> {
    let bits = binary_position(index, path.len());
    let mut current = leaf;
    let mut nodes = Vec::with_capacity(path.len());

    for (sibling, is_right) in path.iter().zip(bits) {
        current = if is_right == 1 {
            hasher.hash_pair(*sibling, current)
        } else {
            hasher.hash_pair(current, *sibling)
        };
        nodes.push(current);
    }

    nodes
}

/// The root implied by `leaf` at `index` together with its authentication
/// path. An empty path makes the leaf its own root.
pub fn root_from_leaf_and_path(
    hasher: &dyn FieldHasher,
    leaf: FieldElement,
    index: usize,
    path: &[FieldElement],
) -> FieldElement {
    inner_nodes_from_leaf_and_path(hasher, leaf, index, path)
        .last()
        .copied()
        .unwrap_or(leaf)
}
