//! Account State Merkle Tree
//!
//! The balance tree: one [`Account`] per leaf, `accounts[i].hash()` always
//! equal to leaf `i`. Transactions are applied one account mutation at a
//! time so every intermediate root can be handed to the circuit.
//!
//! ```text
//!   lookup ─► sender proof ─► signature ─► token type ─► nonce
//!                                                          │
//!   root_from_new_receiver ◄─ credit ◄─ receiver proof ◄─ debit (root_from_new_sender)
//! ```

use zkzru_account::{Account, Balance, BalanceKind, SENTINEL_INDEX};
use zkzru_crypto::{CryptoContext, FieldElement, PublicKey, SecretKey};
use zkzru_merkle::{MerkleProof, MerkleTree};
use zkzru_transaction::Transaction;

use crate::error::{BatchError, StateError};
use crate::state::tx_tree::TxTree;

/// Everything one applied transaction contributes to the witness.
/// Balances, nonce and token type are the values before the transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxDelta {
    pub sender_index: u32,
    pub sender_balance: Balance,
    /// Sender path against the root before the transaction
    pub sender_proof: MerkleProof,
    pub root_from_new_sender: FieldElement,
    pub receiver_index: u32,
    pub receiver_balance: Balance,
    pub receiver_nonce: u64,
    pub receiver_token_type: u64,
    /// Receiver path against `root_from_new_sender`
    pub receiver_proof: MerkleProof,
    pub root_from_new_receiver: FieldElement,
}

/// A fully applied batch.
#[derive(Debug, Clone)]
pub struct BatchTransition {
    pub original_root: FieldElement,
    pub tx_root: FieldElement,
    pub txs: Vec<Transaction>,
    /// Inclusion proof of each transaction in the tx tree
    pub tx_proofs: Vec<MerkleProof>,
    pub deltas: Vec<TxDelta>,
    pub final_root: FieldElement,
}

#[derive(Debug, Clone)]
pub struct AccountTree {
    ctx: CryptoContext,
    tree: MerkleTree,
    accounts: Vec<Account>,
}

impl AccountTree {
    /// Build from a full, power-of-two account list. Account `i` must have
    /// index `i`, and all accounts must share one balance kind.
    pub fn new(ctx: &CryptoContext, accounts: Vec<Account>) -> Result<Self, StateError> {
        for (position, account) in accounts.iter().enumerate() {
            if account.index() as usize != position {
                return Err(StateError::IndexMismatch {
                    position,
                    index: account.index(),
                });
            }
        }
        if let Some(first) = accounts.first() {
            let kind = first.balance().kind();
            if accounts.iter().any(|a| a.balance().kind() != kind) {
                return Err(StateError::MixedBalanceKinds);
            }
        }

        let tree = MerkleTree::from_leaves(ctx.hasher().clone(), &accounts)?;
        log::debug!(
            "built account tree: {} leaves, depth {}, root {}",
            accounts.len(),
            tree.depth(),
            tree.root()
        );
        Ok(Self {
            ctx: ctx.clone(),
            tree,
            accounts,
        })
    }

    /// Build a tree of `depth`, filling every slot after `accounts` with an
    /// empty account.
    pub fn padded(
        ctx: &CryptoContext,
        mut accounts: Vec<Account>,
        depth: usize,
        kind: BalanceKind,
    ) -> Result<Self, StateError> {
        let capacity = 1usize << depth;
        for index in accounts.len()..capacity {
            accounts.push(Account::empty(ctx, index as u32, kind));
        }
        Self::new(ctx, accounts)
    }

    pub fn root(&self) -> FieldElement {
        self.tree.root()
    }

    pub fn depth(&self) -> usize {
        self.tree.depth()
    }

    pub fn tree(&self) -> &MerkleTree {
        &self.tree
    }

    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    pub fn account(&self, index: usize) -> Option<&Account> {
        self.accounts.get(index)
    }

    pub fn context(&self) -> &CryptoContext {
        &self.ctx
    }

    /// The zero key resolves to the sentinel; any other key to the first
    /// non-sentinel account that owns it.
    pub fn find_account_by_pubkey(&self, pubkey: &PublicKey) -> Result<&Account, StateError> {
        if pubkey.is_zero() {
            return self
                .accounts
                .first()
                .ok_or(StateError::AccountNotFound(*pubkey));
        }
        self.accounts
            .iter()
            .skip(1)
            .find(|a| a.pubkey() == pubkey)
            .ok_or(StateError::AccountNotFound(*pubkey))
    }

    pub fn account_proof(&self, index: usize) -> MerkleProof {
        self.tree.proof(index)
    }

    /// Check that the account's cached hash at `index` authenticates against
    /// the current root through `path`.
    pub fn check_account_existence(
        &self,
        index: usize,
        path: &[FieldElement],
    ) -> Result<(), StateError> {
        let account = &self.accounts[index];
        if self.tree.verify_proof(account.hash(), index, path)? {
            Ok(())
        } else {
            Err(StateError::AccountExistenceFailure {
                index: account.index(),
            })
        }
    }

    /// The tx token type must match both accounts, unless the receiver's
    /// token type is the withdrawal wildcard `0`.
    pub fn check_token_types(&self, tx: &Transaction) -> Result<(), StateError> {
        let sender = self.find_account_by_pubkey(&tx.from)?;
        let receiver = self.find_account_by_pubkey(&tx.to)?;
        let matches =
            tx.token_type == sender.token_type() && tx.token_type == receiver.token_type();
        if matches || receiver.token_type() == 0 {
            Ok(())
        } else {
            Err(StateError::TokenTypeMismatch {
                tx: tx.token_type,
                sender: sender.token_type(),
                receiver: receiver.token_type(),
            })
        }
    }

    /// Apply one transaction: debit the sender, update the tree, credit the
    /// receiver, update the tree again.
    ///
    /// Every check runs before the first mutation, so an `Err` leaves the
    /// tree untouched.
    pub fn process_tx(&mut self, tx: &Transaction) -> Result<TxDelta, StateError> {
        let sender = self.find_account_by_pubkey(&tx.from)?;
        let sender_index = sender.index() as usize;
        let sender_balance = *sender.balance();
        let sender_nonce = sender.nonce();

        let receiver = self.find_account_by_pubkey(&tx.to)?;
        let receiver_index = receiver.index() as usize;
        let receiver_balance = *receiver.balance();
        let receiver_nonce = receiver.nonce();
        let receiver_token_type = receiver.token_type();

        let sender_proof = self.account_proof(sender_index);
        self.check_account_existence(sender_index, &sender_proof.siblings)?;
        tx.check_signature(&self.ctx)?;
        self.check_token_types(tx)?;

        if tx.from_index as usize != sender_index {
            return Err(StateError::FromIndexMismatch {
                index: sender_index as u32,
                signed: tx.from_index,
            });
        }
        if tx.nonce != sender_nonce {
            return Err(StateError::NonceMismatch {
                index: sender_index as u32,
                expected: sender_nonce,
                actual: tx.nonce,
            });
        }
        // the credit must not fail once the sender has been debited
        let debited = sender_balance.checked_sub(&self.ctx, &tx.amount)?;
        let credited_from = if receiver_index == sender_index {
            debited
        } else {
            receiver_balance
        };
        if receiver_index != SENTINEL_INDEX as usize {
            credited_from.checked_add(&self.ctx, &tx.amount)?;
        }

        log::debug!(
            "applying tx {} -> {} (nonce {})",
            sender_index,
            receiver_index,
            tx.nonce
        );

        self.accounts[sender_index].debit(&self.ctx, &tx.amount)?;
        let sender_hash = self.accounts[sender_index].hash();
        self.tree
            .update_inner_nodes(sender_hash, sender_index, &sender_proof.siblings)?;
        let root_from_new_sender = self.tree.root();

        let receiver_proof = self.account_proof(receiver_index);
        self.check_account_existence(receiver_index, &receiver_proof.siblings)?;

        self.accounts[receiver_index].credit(&self.ctx, &tx.amount)?;
        let receiver_hash = self.accounts[receiver_index].hash();
        self.tree
            .update_inner_nodes(receiver_hash, receiver_index, &receiver_proof.siblings)?;
        let root_from_new_receiver = self.tree.root();

        Ok(TxDelta {
            sender_index: sender_index as u32,
            sender_balance,
            sender_proof,
            root_from_new_sender,
            receiver_index: receiver_index as u32,
            receiver_balance,
            receiver_nonce,
            receiver_token_type,
            receiver_proof,
            root_from_new_receiver,
        })
    }

    /// Apply a committed batch in order.
    ///
    /// All or nothing: if any transaction fails, the tree and accounts are
    /// restored to their state before the batch and the error names the
    /// failing position.
    pub fn process_batch(&mut self, batch: &TxTree) -> Result<BatchTransition, BatchError> {
        let original_root = self.root();
        let snapshot = (self.tree.clone(), self.accounts.clone());
        log::info!(
            "processing batch of {} transactions against root {}",
            batch.len(),
            original_root
        );

        match self.apply_batch(batch) {
            Ok((tx_proofs, deltas)) => {
                let final_root = self.root();
                log::info!("batch applied, new root {}", final_root);
                Ok(BatchTransition {
                    original_root,
                    tx_root: batch.root(),
                    txs: batch.txs().to_vec(),
                    tx_proofs,
                    deltas,
                    final_root,
                })
            }
            Err(err) => {
                log::warn!("rolling back batch: {}", err);
                (self.tree, self.accounts) = snapshot;
                Err(err)
            }
        }
    }

    fn apply_batch(
        &mut self,
        batch: &TxTree,
    ) -> Result<(Vec<MerkleProof>, Vec<TxDelta>), BatchError> {
        let mut tx_proofs = Vec::with_capacity(batch.len());
        let mut deltas = Vec::with_capacity(batch.len());

        for (position, tx) in batch.txs().iter().enumerate() {
            let at = |source| BatchError { position, source };

            let (index, proof) = batch.tx_proof(&self.ctx, tx).map_err(at)?;
            batch
                .check_tx_existence(&self.ctx, tx, index, &proof.siblings)
                .map_err(at)?;
            deltas.push(self.process_tx(tx).map_err(at)?);
            tx_proofs.push(proof);
        }

        Ok((tx_proofs, deltas))
    }

    /// A signed, zero-amount self-transfer at the account's current nonce,
    /// used to pad a batch to a power-of-two length.
    pub fn generate_empty_tx(
        &self,
        pubkey: &PublicKey,
        sk: &SecretKey,
    ) -> Result<Transaction, StateError> {
        let account = self.find_account_by_pubkey(pubkey)?;
        let zero = account.balance().kind().zero();
        Ok(Transaction::new(
            *pubkey,
            account.index(),
            *pubkey,
            account.nonce(),
            zero,
            account.token_type(),
        )
        .signed(&self.ctx, sk))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zkzru_account::AccountError;
    use zkzru_transaction::Amount;

    struct Fixture {
        ctx: CryptoContext,
        tree: AccountTree,
    }

    fn key(i: u64) -> SecretKey {
        SecretKey::from_index(i)
    }

    fn pk(ctx: &CryptoContext, i: u64) -> PublicKey {
        ctx.signer().derive_public_key(&key(i))
    }

    /// Sentinel, coordinator, then accounts 2..6 with token types 2, 1, 2, 1.
    fn fixture() -> Fixture {
        let ctx = CryptoContext::new();
        let mut accounts = vec![
            Account::empty(&ctx, 0, BalanceKind::Plain),
            Account::plain(&ctx, 1, pk(&ctx, 1), 0, 0, 0),
        ];
        let funded = [(1000, 2), (20, 1), (200, 2), (100, 1)];
        for (i, (balance, token)) in funded.into_iter().enumerate() {
            let index = i as u64 + 2;
            accounts.push(Account::plain(
                &ctx,
                index as u32,
                pk(&ctx, index),
                balance,
                0,
                token,
            ));
        }
        let tree = AccountTree::padded(&ctx, accounts, 3, BalanceKind::Plain).unwrap();
        Fixture { ctx, tree }
    }

    fn transfer(
        f: &Fixture,
        from: u64,
        to: Option<u64>,
        amount: u128,
        nonce: u64,
        token: u64,
    ) -> Transaction {
        let to = to.map(|i| pk(&f.ctx, i)).unwrap_or_else(PublicKey::zero);
        Transaction::new(pk(&f.ctx, from), from as u32, to, nonce, Amount::Plain(amount), token)
            .signed(&f.ctx, &key(from))
    }

    fn rebuilt_root(tree: &AccountTree) -> FieldElement {
        AccountTree::new(tree.context(), tree.accounts().to_vec())
            .unwrap()
            .root()
    }

    #[test]
    fn test_leaves_track_accounts() {
        let f = fixture();
        for (i, account) in f.tree.accounts().iter().enumerate() {
            assert_eq!(f.tree.tree().leaf(i), account.hash());
            assert_eq!(account.index() as usize, i);
        }
    }

    #[test]
    fn test_find_account_by_pubkey() {
        let f = fixture();
        assert_eq!(f.tree.find_account_by_pubkey(&PublicKey::zero()).unwrap().index(), 0);
        assert_eq!(f.tree.find_account_by_pubkey(&pk(&f.ctx, 4)).unwrap().index(), 4);

        let stranger = pk(&f.ctx, 42);
        assert_eq!(
            f.tree.find_account_by_pubkey(&stranger).unwrap_err(),
            StateError::AccountNotFound(stranger)
        );
    }

    #[test]
    fn test_transfer_updates_both_accounts() {
        let mut f = fixture();
        let tx = transfer(&f, 2, Some(4), 500, 0, 2);
        let before = f.tree.root();

        let delta = f.tree.process_tx(&tx).unwrap();

        assert_eq!(delta.sender_index, 2);
        assert_eq!(delta.receiver_index, 4);
        assert_eq!(delta.sender_balance, Balance::Plain(1000));
        assert_eq!(delta.receiver_balance, Balance::Plain(200));
        assert_ne!(delta.root_from_new_sender, before);
        assert_eq!(delta.root_from_new_receiver, f.tree.root());

        assert_eq!(f.tree.account(2).unwrap().balance(), &Balance::Plain(500));
        assert_eq!(f.tree.account(2).unwrap().nonce(), 1);
        assert_eq!(f.tree.account(4).unwrap().balance(), &Balance::Plain(700));
        assert_eq!(f.tree.account(4).unwrap().nonce(), 0);
        assert_eq!(f.tree.root(), rebuilt_root(&f.tree));
    }

    #[test]
    fn test_receiver_proof_is_against_intermediate_root() {
        let mut f = fixture();
        // 2 and 3 are siblings, so the receiver path contains the new sender leaf
        let tx = transfer(&f, 3, Some(5), 10, 0, 1);
        let delta = f.tree.process_tx(&tx).unwrap();

        let receiver_leaf_before = Account::plain(&f.ctx, 5, pk(&f.ctx, 5), 100, 0, 1).hash();
        let implied = zkzru_merkle::root_from_leaf_and_path(
            f.ctx.hasher().as_ref(),
            receiver_leaf_before,
            5,
            &delta.receiver_proof.siblings,
        );
        assert_eq!(implied, delta.root_from_new_sender);
    }

    #[test]
    fn test_withdrawal_ignores_token_type() {
        let mut f = fixture();
        let tx = transfer(&f, 4, None, 200, 0, 2);
        let delta = f.tree.process_tx(&tx).unwrap();

        assert_eq!(delta.receiver_index, 0);
        assert_eq!(delta.receiver_token_type, 0);
        assert_eq!(f.tree.account(0).unwrap().balance(), &Balance::Plain(0));
        assert_eq!(f.tree.account(4).unwrap().balance(), &Balance::Plain(0));
    }

    #[test]
    fn test_withdrawal_accepts_any_tx_token_type() {
        let mut f = fixture();
        // account 2 holds token 2
        let tx = transfer(&f, 2, None, 100, 0, 7);
        let delta = f.tree.process_tx(&tx).unwrap();

        assert_eq!(delta.receiver_index, 0);
        assert_eq!(f.tree.account(2).unwrap().balance(), &Balance::Plain(900));
        assert_eq!(f.tree.root(), rebuilt_root(&f.tree));
    }

    #[test]
    fn test_receiver_overflow_leaves_tree_untouched() {
        let ctx = CryptoContext::new();
        let accounts = vec![
            Account::empty(&ctx, 0, BalanceKind::Plain),
            Account::plain(&ctx, 1, pk(&ctx, 1), 100, 0, 1),
            Account::plain(&ctx, 2, pk(&ctx, 2), u128::MAX - 5, 0, 1),
        ];
        let mut tree = AccountTree::padded(&ctx, accounts, 2, BalanceKind::Plain).unwrap();
        let root = tree.root();

        let tx = Transaction::new(pk(&ctx, 1), 1, pk(&ctx, 2), 0, Amount::Plain(10), 1)
            .signed(&ctx, &key(1));
        assert_eq!(
            tree.process_tx(&tx).unwrap_err(),
            StateError::Account(AccountError::BalanceOverflow {
                balance: u128::MAX - 5,
                amount: 10,
            })
        );
        assert_eq!(tree.root(), root);
        assert_eq!(tree.account(1).unwrap().balance(), &Balance::Plain(100));
        assert_eq!(tree.account(1).unwrap().nonce(), 0);
    }

    #[test]
    fn test_from_index_mismatch() {
        let mut f = fixture();
        let root = f.tree.root();
        // account 2 signs as if it lived at leaf 6
        let tx = Transaction::new(pk(&f.ctx, 2), 6, pk(&f.ctx, 4), 0, Amount::Plain(5), 2)
            .signed(&f.ctx, &key(2));
        assert_eq!(
            f.tree.process_tx(&tx).unwrap_err(),
            StateError::FromIndexMismatch {
                index: 2,
                signed: 6
            }
        );
        assert_eq!(f.tree.root(), root);
    }

    #[test]
    fn test_token_type_mismatch() {
        let mut f = fixture();
        let root = f.tree.root();
        // 2 holds token 2, 3 holds token 1
        let tx = transfer(&f, 2, Some(3), 5, 0, 2);
        assert_eq!(
            f.tree.process_tx(&tx).unwrap_err(),
            StateError::TokenTypeMismatch {
                tx: 2,
                sender: 2,
                receiver: 1
            }
        );
        assert_eq!(f.tree.root(), root);
    }

    #[test]
    fn test_bad_signature_rejected() {
        let mut f = fixture();
        let mut tx = transfer(&f, 2, Some(4), 5, 0, 2);
        tx.amount = Amount::Plain(6);
        assert!(matches!(
            f.tree.process_tx(&tx),
            Err(StateError::InvalidSignature(_))
        ));
    }

    #[test]
    fn test_nonce_mismatch() {
        let mut f = fixture();
        let tx = transfer(&f, 2, Some(4), 5, 3, 2);
        assert_eq!(
            f.tree.process_tx(&tx).unwrap_err(),
            StateError::NonceMismatch {
                index: 2,
                expected: 0,
                actual: 3
            }
        );
    }

    #[test]
    fn test_overdraft_leaves_tree_untouched() {
        let mut f = fixture();
        let root = f.tree.root();
        let tx = transfer(&f, 3, Some(5), 21, 0, 1);
        assert_eq!(
            f.tree.process_tx(&tx).unwrap_err(),
            StateError::Account(AccountError::InsufficientBalance {
                available: 20,
                required: 21
            })
        );
        assert_eq!(f.tree.root(), root);
        assert_eq!(f.tree.account(3).unwrap().nonce(), 0);
    }

    #[test]
    fn test_unknown_sender() {
        let mut f = fixture();
        let tx = transfer(&f, 7, Some(4), 1, 0, 2);
        assert!(matches!(
            f.tree.process_tx(&tx),
            Err(StateError::AccountNotFound(_))
        ));
    }

    #[test]
    fn test_empty_tx_is_a_noop_except_nonce() {
        let mut f = fixture();
        let coordinator = pk(&f.ctx, 1);
        let tx = f.tree.generate_empty_tx(&coordinator, &key(1)).unwrap();
        assert_eq!(tx.from, tx.to);
        assert_eq!(tx.amount, Amount::Plain(0));

        f.tree.process_tx(&tx).unwrap();
        let account = f.tree.account(1).unwrap();
        assert_eq!(account.balance(), &Balance::Plain(0));
        assert_eq!(account.nonce(), 1);
        assert_eq!(f.tree.root(), rebuilt_root(&f.tree));
    }

    #[test]
    fn test_batch_rolls_back_on_failure() {
        let mut f = fixture();
        let root = f.tree.root();
        let accounts = f.tree.accounts().to_vec();

        let txs = vec![
            transfer(&f, 2, Some(4), 500, 0, 2),
            transfer(&f, 3, Some(5), 10, 0, 1),
            // replays nonce 0
            transfer(&f, 2, Some(4), 1, 0, 2),
            transfer(&f, 5, None, 1, 0, 1),
        ];
        let batch = TxTree::new(&f.ctx, txs).unwrap();

        let err = f.tree.process_batch(&batch).unwrap_err();
        assert_eq!(err.position, 2);
        assert!(matches!(err.source, StateError::NonceMismatch { .. }));
        assert_eq!(f.tree.root(), root);
        assert_eq!(f.tree.accounts(), accounts.as_slice());
    }

    #[test]
    fn test_index_mismatch_rejected() {
        let ctx = CryptoContext::new();
        let accounts = vec![
            Account::empty(&ctx, 0, BalanceKind::Plain),
            Account::empty(&ctx, 0, BalanceKind::Plain),
        ];
        assert_eq!(
            AccountTree::new(&ctx, accounts).unwrap_err(),
            StateError::IndexMismatch {
                position: 1,
                index: 0
            }
        );
    }

    #[test]
    fn test_mixed_kinds_rejected() {
        let ctx = CryptoContext::new();
        let accounts = vec![
            Account::empty(&ctx, 0, BalanceKind::Plain),
            Account::empty(&ctx, 1, BalanceKind::Confidential),
        ];
        assert_eq!(
            AccountTree::new(&ctx, accounts).unwrap_err(),
            StateError::MixedBalanceKinds
        );
    }
}
