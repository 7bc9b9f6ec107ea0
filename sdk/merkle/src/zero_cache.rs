//! Zero Cache
//!
//! Roots of all-empty subtrees, one per height. An empty slot anywhere in a
//! sparse-looking tree is authenticated by these values alone, without
//! materializing the zero leaves underneath it.

use zkzru_crypto::{FieldElement, FieldHasher};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZeroCache {
    /// `roots[h]` is the root of an all-zero subtree of height `h`;
    /// `roots[0]` is the zero leaf itself.
    roots: Vec<FieldElement>,
}

impl ZeroCache {
    pub fn new(hasher: &dyn FieldHasher, zero_leaf: FieldElement, depth: usize) -> Self {
        let mut roots = Vec::with_capacity(depth + 1);
        roots.push(zero_leaf);
        for h in 0..depth {
            let below = roots[h];
            roots.push(hasher.hash_pair(below, below));
        }
        Self { roots }
    }

    pub fn depth(&self) -> usize {
        self.roots.len() - 1
    }

    pub fn zero_leaf(&self) -> FieldElement {
        self.roots[0]
    }

    /// Root of an empty subtree of the given height.
    pub fn zero_root(&self, height: usize) -> FieldElement {
        self.roots[height]
    }

    /// Root of the whole tree when every leaf is zero.
    pub fn empty_root(&self) -> FieldElement {
        self.roots[self.depth()]
    }

    /// Path from an empty subtree of `height` to the root of an otherwise
    /// empty tree: one zero root per level, lowest first.
    pub fn empty_subtree_proof(&self, height: usize) -> Vec<FieldElement> {
        self.roots[height..self.depth()].to_vec()
    }

    /// Path for a subtree of `height` at `position`, given the roots of every
    /// subtree of that height already filled to its left. Slots to the right
    /// are empty.
    ///
    /// # Panics
    ///
    /// Panics if `filled` does not hold exactly `position` roots.
    pub fn subtree_proof(
        &self,
        hasher: &dyn FieldHasher,
        height: usize,
        position: usize,
        filled: &[FieldElement],
    ) -> Vec<FieldElement> {
        assert_eq!(filled.len(), position, "one root per filled slot to the left");

        let mut level: Vec<FieldElement> = filled.to_vec();
        let mut proof = Vec::with_capacity(self.depth() - height);
        let mut index = position;

        for h in height..self.depth() {
            let sibling = index ^ 1;
            proof.push(level.get(sibling).copied().unwrap_or(self.roots[h]));

            // lift the filled prefix one level, padding the odd tail with zeros
            if level.len() % 2 == 1 {
                level.push(self.roots[h]);
            }
            level = level
                .chunks_exact(2)
                .map(|pair| hasher.hash_pair(pair[0], pair[1]))
                .collect();
            index >>= 1;
        }

        proof
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::root_from_leaf_and_path;
    use crate::tree::MerkleTree;
    use std::sync::Arc;
    use zkzru_crypto::Mimc7;

    #[test]
    fn test_each_level_hashes_the_one_below() {
        let mimc = Mimc7::new();
        let cache = ZeroCache::new(&mimc, FieldElement::from(0u64), 5);

        assert_eq!(cache.depth(), 5);
        for h in 0..5 {
            assert_eq!(
                mimc.hash_pair(cache.zero_root(h), cache.zero_root(h)),
                cache.zero_root(h + 1)
            );
        }
    }

    #[test]
    fn test_empty_subtree_self_consistency() {
        let mimc = Mimc7::new();
        let cache = ZeroCache::new(&mimc, FieldElement::from(11u64), 4);

        for h in 0..4 {
            let proof = cache.empty_subtree_proof(h);
            assert_eq!(proof.len(), 4 - h);
            let root = root_from_leaf_and_path(&mimc, cache.zero_root(h), 0, &proof);
            assert_eq!(root, cache.empty_root());

            // one level up the proof is just shorter
            let up = root_from_leaf_and_path(&mimc, cache.zero_root(h), 0, &proof[..1]);
            assert_eq!(up, cache.zero_root(h + 1));
        }
    }

    #[test]
    fn test_empty_root_matches_built_tree() {
        let mimc = Arc::new(Mimc7::new());
        let zero = FieldElement::from(3u64);
        let cache = ZeroCache::new(mimc.as_ref(), zero, 3);
        let tree = MerkleTree::build(mimc, vec![zero; 8]).unwrap();
        assert_eq!(cache.empty_root(), tree.root());
    }

    #[test]
    fn test_subtree_proof_for_second_slot() {
        let mimc = Mimc7::new();
        let cache = ZeroCache::new(&mimc, FieldElement::from(0u64), 4);
        let first = FieldElement::from(77u64);

        let proof = cache.subtree_proof(&mimc, 2, 1, &[first]);
        assert_eq!(proof, vec![first, cache.zero_root(3)]);
        assert_eq!(cache.subtree_proof(&mimc, 2, 0, &[]), cache.empty_subtree_proof(2));
    }
}
