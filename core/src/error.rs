use thiserror::Error;
use zkzru_account::AccountError;
use zkzru_crypto::PublicKey;
use zkzru_merkle::MerkleError;
use zkzru_transaction::TransactionError;

/// Why a transaction, batch or deposit could not be applied.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StateError {
    #[error(transparent)]
    Merkle(#[from] MerkleError),

    #[error("no account owns public key ({}, {})", .0.x, .0.y)]
    AccountNotFound(PublicKey),

    #[error("account {index} does not authenticate against the current root")]
    AccountExistenceFailure { index: u32 },

    #[error("invalid signature: {0}")]
    InvalidSignature(#[from] TransactionError),

    #[error("token type {tx} does not match sender {sender} / receiver {receiver}")]
    TokenTypeMismatch { tx: u64, sender: u64, receiver: u64 },

    #[error("transaction signed for index {signed}, sender is account {index}")]
    FromIndexMismatch { index: u32, signed: u32 },

    #[error("nonce {actual} does not match account {index} nonce {expected}")]
    NonceMismatch { index: u32, expected: u64, actual: u64 },

    /// Insufficient balance or a plain/confidential mix-up.
    #[error(transparent)]
    Account(#[from] AccountError),

    #[error("transaction is not part of the committed batch")]
    TxNotInBatch,

    #[error("account at position {position} has index {index}")]
    IndexMismatch { position: usize, index: u32 },

    #[error("plain and confidential accounts cannot share a tree")]
    MixedBalanceKinds,

    #[error("deposit subtree slot {position} is not empty")]
    DepositSubtreeOccupied { position: usize },

    #[error("deposit subtree of height {height} does not fit a tree of depth {depth}")]
    DepositSubtreeTooLarge { height: usize, depth: usize },

    #[error("deposit tree is full")]
    DepositTreeFull,
}

/// A batch failure, pinned to the transaction that caused it.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("transaction {position} of the batch failed: {source}")]
pub struct BatchError {
    pub position: usize,
    #[source]
    pub source: StateError,
}
