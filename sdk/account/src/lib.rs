//! zkzru accounts
//!
//! One account per leaf of the balance tree. An account's leaf value is the
//! MiMC hash of its public fields, cached in the account and recomputed on
//! every mutation so the tree never sees a stale hash.
//!
//! ```text
//! plain:        H(pkX, pkY, balance, nonce, tokenType)
//! confidential: H(pkX, pkY, commX, commY, nonce, tokenType)
//! ```

pub mod balance;

use thiserror::Error;
use zkzru_crypto::{Commitment, CryptoContext, FieldElement, PublicKey};
use zkzru_merkle::MerkleLeaf;

pub use balance::{Balance, BalanceKind};

/// Leaf 0: the sentinel withdraw target, never credited.
pub const SENTINEL_INDEX: u32 = 0;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AccountError {
    #[error("insufficient balance: have {available}, need {required}")]
    InsufficientBalance { available: u128, required: u128 },
    #[error("balance overflow: {balance} + {amount}")]
    BalanceOverflow { balance: u128, amount: u128 },
    #[error("cannot apply a {amount:?} amount to a {balance:?} balance")]
    BalanceKindMismatch {
        balance: BalanceKind,
        amount: BalanceKind,
    },
}

/// The state of an account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    index: u32,
    pubkey: PublicKey,
    nonce: u64,
    token_type: u64,
    balance: Balance,
    hash: FieldElement,
}

impl Account {
    pub fn new(
        ctx: &CryptoContext,
        index: u32,
        pubkey: PublicKey,
        balance: Balance,
        nonce: u64,
        token_type: u64,
    ) -> Self {
        let mut account = Self {
            index,
            pubkey,
            nonce,
            token_type,
            balance,
            hash: FieldElement::from(0u64),
        };
        account.hash = account.compute_hash(ctx);
        account
    }

    /// An account holding a plaintext balance.
    pub fn plain(
        ctx: &CryptoContext,
        index: u32,
        pubkey: PublicKey,
        balance: u128,
        nonce: u64,
        token_type: u64,
    ) -> Self {
        Self::new(ctx, index, pubkey, Balance::Plain(balance), nonce, token_type)
    }

    /// An account whose balance is hidden behind a commitment.
    pub fn confidential(
        ctx: &CryptoContext,
        index: u32,
        pubkey: PublicKey,
        commitment: Commitment,
        nonce: u64,
        token_type: u64,
    ) -> Self {
        Self::new(
            ctx,
            index,
            pubkey,
            Balance::Commitment(commitment),
            nonce,
            token_type,
        )
    }

    /// An ownerless, zero-valued account. Index 0 is the sentinel; any other
    /// index is padding that hashes the same.
    pub fn empty(ctx: &CryptoContext, index: u32, kind: BalanceKind) -> Self {
        Self::new(ctx, index, PublicKey::zero(), kind.zero(), 0, 0)
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn pubkey(&self) -> &PublicKey {
        &self.pubkey
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    pub fn token_type(&self) -> u64 {
        self.token_type
    }

    pub fn balance(&self) -> &Balance {
        &self.balance
    }

    /// The cached leaf hash.
    pub fn hash(&self) -> FieldElement {
        self.hash
    }

    pub fn is_sentinel(&self) -> bool {
        self.index == SENTINEL_INDEX
    }

    pub fn compute_hash(&self, ctx: &CryptoContext) -> FieldElement {
        let mut inputs = Vec::with_capacity(6);
        inputs.push(self.pubkey.x);
        inputs.push(self.pubkey.y);
        inputs.extend(self.balance.hash_inputs());
        inputs.push(FieldElement::from(self.nonce));
        inputs.push(FieldElement::from(self.token_type));
        ctx.multi_hash(&inputs)
    }

    /// Take `amount` out of the balance and bump the nonce.
    ///
    /// Plain balances are checked for underflow. Commitments cannot be, the
    /// circuit's range check is what keeps them non-negative.
    pub fn debit(&mut self, ctx: &CryptoContext, amount: &Balance) -> Result<(), AccountError> {
        self.balance = self.balance.checked_sub(ctx, amount)?;
        self.nonce += 1;
        self.hash = self.compute_hash(ctx);
        log::trace!("debited account {}, nonce now {}", self.index, self.nonce);
        Ok(())
    }

    /// Add `amount` to the balance. The sentinel ignores credits.
    pub fn credit(&mut self, ctx: &CryptoContext, amount: &Balance) -> Result<(), AccountError> {
        if self.is_sentinel() {
            return Ok(());
        }
        self.balance = self.balance.checked_add(ctx, amount)?;
        self.hash = self.compute_hash(ctx);
        log::trace!("credited account {}", self.index);
        Ok(())
    }
}

impl MerkleLeaf for Account {
    fn leaf_hash(&self) -> FieldElement {
        self.hash
    }
}
