pub mod account_tree;
pub mod deposit;
pub mod tx_tree;

pub use account_tree::{AccountTree, BatchTransition, TxDelta};
pub use deposit::DepositTree;
pub use tx_tree::TxTree;
