//! zkzru state-transition engine
//!
//! Applies committed batches of signed transactions to the balance tree and
//! records every intermediate root and path the update-state circuit needs.
//!
//! ```text
//!   deposits ──► DepositTree ──► AccountTree ◄── TxTree ◄── batch
//!                                     │
//!                              BatchTransition ──► CircuitInput (input.json)
//! ```
//!
//! Everything is in memory and single-threaded per batch. A batch either
//! applies completely or leaves the tree as it was.

pub mod error;
pub mod state;
pub mod witness;

pub use error::{BatchError, StateError};
pub use state::{AccountTree, BatchTransition, DepositTree, TxDelta, TxTree};
pub use witness::{CircuitInput, ValueColumns};
