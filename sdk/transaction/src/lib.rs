//! zkzru transactions
//!
//! A transaction moves `amount` of one token from the sender's leaf to the
//! receiver's. Accounts are referenced by public key; a zero receiver key is
//! a withdrawal to the sentinel account.
//!
//! ```text
//! plain:        H(fromX, fromY, fromIndex, toX, toY, nonce, amount, tokenType)
//! confidential: H(fromX, fromY, fromIndex, toX, toY, nonce, commX, commY, tokenType)
//! ```
//!
//! The sender signs that hash. The signature is not part of it.

use thiserror::Error;
use zkzru_crypto::{CryptoContext, FieldElement, PublicKey, SecretKey, Signature};

pub use zkzru_account::Balance as Amount;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransactionError {
    #[error("transaction is not signed")]
    MissingSignature,
    #[error("signature does not verify against the sender key")]
    InvalidSignature,
}

/// The payload a user signs, plus the signature once there is one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub from: PublicKey,
    /// Sender leaf index; binds the signature to one slot of the tree.
    pub from_index: u32,
    pub to: PublicKey,
    pub nonce: u64,
    pub amount: Amount,
    pub token_type: u64,
    pub signature: Option<Signature>,
}

impl Transaction {
    pub fn new(
        from: PublicKey,
        from_index: u32,
        to: PublicKey,
        nonce: u64,
        amount: Amount,
        token_type: u64,
    ) -> Self {
        Self {
            from,
            from_index,
            to,
            nonce,
            amount,
            token_type,
            signature: None,
        }
    }

    /// Content hash over every field except the signature.
    pub fn hash_tx(&self, ctx: &CryptoContext) -> FieldElement {
        let mut inputs = Vec::with_capacity(9);
        inputs.push(self.from.x);
        inputs.push(self.from.y);
        inputs.push(FieldElement::from(self.from_index));
        inputs.push(self.to.x);
        inputs.push(self.to.y);
        inputs.push(FieldElement::from(self.nonce));
        inputs.extend(self.amount.hash_inputs());
        inputs.push(FieldElement::from(self.token_type));
        ctx.multi_hash(&inputs)
    }

    pub fn sign(&mut self, ctx: &CryptoContext, sk: &SecretKey) {
        let msg = self.hash_tx(ctx);
        self.signature = Some(ctx.signer().sign(sk, msg));
    }

    /// Builder form of [`Transaction::sign`].
    pub fn signed(mut self, ctx: &CryptoContext, sk: &SecretKey) -> Self {
        self.sign(ctx, sk);
        self
    }

    /// Verify the signature against the current field values.
    pub fn check_signature(&self, ctx: &CryptoContext) -> Result<(), TransactionError> {
        let sig = self.signature.as_ref().ok_or(TransactionError::MissingSignature)?;
        if ctx.signer().verify(&self.from, self.hash_tx(ctx), sig) {
            Ok(())
        } else {
            Err(TransactionError::InvalidSignature)
        }
    }

    pub fn is_withdrawal(&self) -> bool {
        self.to.is_zero()
    }
}
