//! Transaction Tree
//!
//! Commits a batch: a read-only Merkle tree over the batch's transaction
//! hashes, in application order.

use zkzru_crypto::{CryptoContext, FieldElement};
use zkzru_merkle::{MerkleProof, MerkleTree};
use zkzru_transaction::Transaction;

use crate::error::StateError;

#[derive(Debug, Clone)]
pub struct TxTree {
    tree: MerkleTree,
    txs: Vec<Transaction>,
}

impl TxTree {
    /// The batch length must be a power of two; pad with
    /// [`AccountTree::generate_empty_tx`](crate::AccountTree::generate_empty_tx).
    pub fn new(ctx: &CryptoContext, txs: Vec<Transaction>) -> Result<Self, StateError> {
        let leaves = txs.iter().map(|tx| tx.hash_tx(ctx)).collect();
        let tree = MerkleTree::build(ctx.hasher().clone(), leaves)?;
        log::debug!("committed batch of {} transactions, tx root {}", txs.len(), tree.root());
        Ok(Self { tree, txs })
    }

    pub fn root(&self) -> FieldElement {
        self.tree.root()
    }

    pub fn depth(&self) -> usize {
        self.tree.depth()
    }

    pub fn txs(&self) -> &[Transaction] {
        &self.txs
    }

    pub fn len(&self) -> usize {
        self.txs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.txs.is_empty()
    }

    /// Locate `tx` by content and return its index and proof.
    pub fn tx_proof(
        &self,
        ctx: &CryptoContext,
        tx: &Transaction,
    ) -> Result<(usize, MerkleProof), StateError> {
        let index = self
            .tree
            .position_of(tx.hash_tx(ctx))
            .ok_or(StateError::TxNotInBatch)?;
        Ok((index, self.tree.proof(index)))
    }

    /// Check that `tx` sits at `index` under the committed root.
    pub fn check_tx_existence(
        &self,
        ctx: &CryptoContext,
        tx: &Transaction,
        index: usize,
        path: &[FieldElement],
    ) -> Result<(), StateError> {
        if index < self.tree.len() && self.tree.verify_proof(tx.hash_tx(ctx), index, path)? {
            Ok(())
        } else {
            Err(StateError::TxNotInBatch)
        }
    }
}
