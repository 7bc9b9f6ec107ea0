//! Deposit Subtrees
//!
//! Deposits land on-chain in fixed-size subtrees that are appended left to
//! right into the balance tree. This mirrors that bookkeeping off-chain: it
//! proves the next slot is still empty using the zero cache, then hashes the
//! new subtree root into place along the same path.
//!
//! ```text
//!                 root
//!               /      \
//!            s01        z
//!           /   \      / \
//!         s0    s1    z   z      s = filled subtree, z = empty subtree
//! ```

use std::fmt;
use std::sync::Arc;

use zkzru_account::{Account, BalanceKind};
use zkzru_crypto::{CryptoContext, FieldElement, FieldHasher};
use zkzru_merkle::{MerkleError, MerkleTree, ZeroCache, root_from_leaf_and_path};

use crate::error::StateError;

#[derive(Clone)]
pub struct DepositTree {
    hasher: Arc<dyn FieldHasher>,
    zero_cache: ZeroCache,
    subtree_height: usize,
    /// Roots of the subtrees inserted so far, in slot order
    filled: Vec<FieldElement>,
    root: FieldElement,
}

impl DepositTree {
    /// An empty tree of `depth` taking subtrees of `subtree_height`, whose
    /// empty leaves are the zero account of `kind`.
    pub fn new(
        ctx: &CryptoContext,
        depth: usize,
        subtree_height: usize,
        kind: BalanceKind,
    ) -> Result<Self, StateError> {
        if subtree_height > depth {
            return Err(StateError::DepositSubtreeTooLarge {
                height: subtree_height,
                depth,
            });
        }
        let zero_leaf = Account::empty(ctx, 0, kind).hash();
        let zero_cache = ZeroCache::new(ctx.hasher().as_ref(), zero_leaf, depth);
        let root = zero_cache.empty_root();

        Ok(Self {
            hasher: ctx.hasher().clone(),
            zero_cache,
            subtree_height,
            filled: Vec::new(),
            root,
        })
    }

    pub fn root(&self) -> FieldElement {
        self.root
    }

    pub fn zero_cache(&self) -> &ZeroCache {
        &self.zero_cache
    }

    pub fn subtree_height(&self) -> usize {
        self.subtree_height
    }

    /// Slot the next subtree goes into.
    pub fn next_position(&self) -> usize {
        self.filled.len()
    }

    pub fn capacity(&self) -> usize {
        1 << (self.zero_cache.depth() - self.subtree_height)
    }

    /// Root of a deposit subtree, with slots past `accounts` holding the
    /// zero leaf.
    pub fn subtree_root(&self, accounts: &[Account]) -> Result<FieldElement, StateError> {
        let width = 1usize << self.subtree_height;
        if accounts.len() > width {
            return Err(MerkleError::InvalidLeafCount(accounts.len()).into());
        }
        if self.subtree_height == 0 {
            return Ok(accounts
                .first()
                .map(Account::hash)
                .unwrap_or_else(|| self.zero_cache.zero_leaf()));
        }

        let mut leaves: Vec<FieldElement> = accounts.iter().map(Account::hash).collect();
        leaves.resize(width, self.zero_cache.zero_leaf());
        Ok(MerkleTree::build(self.hasher.clone(), leaves)?.root())
    }

    /// Path from the next slot to the root: filled subtrees on the left,
    /// zero-cache roots everywhere else.
    pub fn next_subtree_proof(&self) -> Vec<FieldElement> {
        self.zero_cache.subtree_proof(
            self.hasher.as_ref(),
            self.subtree_height,
            self.next_position(),
            &self.filled,
        )
    }

    /// Whether the slot at `position` holds an empty subtree under the
    /// current root.
    pub fn is_slot_empty(&self, position: usize, proof: &[FieldElement]) -> bool {
        let empty = self.zero_cache.zero_root(self.subtree_height);
        root_from_leaf_and_path(self.hasher.as_ref(), empty, position, proof) == self.root
    }

    /// Insert the next deposit subtree and return the new root.
    pub fn process_deposits(&mut self, accounts: &[Account]) -> Result<FieldElement, StateError> {
        let position = self.next_position();
        if position >= self.capacity() {
            return Err(StateError::DepositTreeFull);
        }

        let subtree_root = self.subtree_root(accounts)?;
        let proof = self.next_subtree_proof();
        if !self.is_slot_empty(position, &proof) {
            return Err(StateError::DepositSubtreeOccupied { position });
        }

        self.root = root_from_leaf_and_path(self.hasher.as_ref(), subtree_root, position, &proof);
        self.filled.push(subtree_root);
        log::info!(
            "absorbed {} deposits into subtree {}, new root {}",
            accounts.len(),
            position,
            self.root
        );
        Ok(self.root)
    }
}

impl fmt::Debug for DepositTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DepositTree")
            .field("subtree_height", &self.subtree_height)
            .field("filled", &self.filled.len())
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}
