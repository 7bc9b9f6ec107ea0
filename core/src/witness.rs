//! Circuit Input
//!
//! Flattens a [`BatchTransition`] into the column-per-signal record the
//! update-state circuit reads. Every field value is a decimal string; proof
//! position bits stay small integers.

use serde::Serialize;
use zkzru_account::{Balance, BalanceKind};
use zkzru_crypto::{FieldElement, field_to_decimal};
use zkzru_merkle::MerkleProof;
use zkzru_transaction::TransactionError;

use crate::error::StateError;
use crate::state::BatchTransition;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CircuitInput {
    pub accounts_root: String,
    pub new_accounts_root: String,
    /// Root before the batch, then after every sender and receiver update
    pub intermediate_roots: Vec<String>,
    pub paths2root_from: Vec<Vec<String>>,
    pub paths2root_from_pos: Vec<Vec<u8>>,
    pub paths2root_to: Vec<Vec<String>>,
    pub paths2root_to_pos: Vec<Vec<u8>>,

    pub tx_root: String,
    pub paths2tx_root: Vec<Vec<String>>,
    pub paths2tx_root_pos: Vec<Vec<u8>>,

    pub from_x: Vec<String>,
    pub from_y: Vec<String>,
    pub from_index: Vec<String>,
    pub to_x: Vec<String>,
    pub to_y: Vec<String>,
    pub nonce_from: Vec<String>,
    pub token_type_from: Vec<String>,
    #[serde(rename = "R8x")]
    pub r8x: Vec<String>,
    #[serde(rename = "R8y")]
    pub r8y: Vec<String>,
    #[serde(rename = "S")]
    pub s: Vec<String>,

    pub nonce_to: Vec<String>,
    pub token_type_to: Vec<String>,

    #[serde(flatten)]
    pub values: ValueColumns,
}

/// Amount and pre-transaction balance columns, by balance kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ValueColumns {
    Plain {
        amount: Vec<String>,
        balance_from: Vec<String>,
        balance_to: Vec<String>,
    },
    Confidential {
        amount_comm_x: Vec<String>,
        amount_comm_y: Vec<String>,
        balance_comm_x_from: Vec<String>,
        balance_comm_y_from: Vec<String>,
        balance_comm_x_to: Vec<String>,
        balance_comm_y_to: Vec<String>,
    },
}

fn dec(value: &FieldElement) -> String {
    field_to_decimal(value)
}

fn path(proof: &MerkleProof) -> Vec<String> {
    proof.siblings.iter().map(dec).collect()
}

/// Plain balances render as one column, commitments as two.
#[derive(Default)]
struct Columns {
    a: Vec<String>,
    b: Vec<String>,
}

impl Columns {
    fn push(&mut self, kind: BalanceKind, value: &Balance) -> Result<(), StateError> {
        if value.kind() != kind {
            return Err(StateError::MixedBalanceKinds);
        }
        match value {
            Balance::Plain(v) => self.a.push(v.to_string()),
            _ => {
                let (x, y) = value
                    .commitment_coords()
                    .ok_or(StateError::MixedBalanceKinds)?;
                self.a.push(dec(&x));
                self.b.push(dec(&y));
            }
        }
        Ok(())
    }
}

impl CircuitInput {
    pub fn from_transition(transition: &BatchTransition) -> Result<Self, StateError> {
        let n = transition.txs.len();
        let kind = transition
            .txs
            .first()
            .map(|tx| tx.amount.kind())
            .unwrap_or(BalanceKind::Plain);

        let mut input = Self {
            accounts_root: dec(&transition.original_root),
            new_accounts_root: dec(&transition.final_root),
            intermediate_roots: Vec::with_capacity(2 * n + 1),
            paths2root_from: Vec::with_capacity(n),
            paths2root_from_pos: Vec::with_capacity(n),
            paths2root_to: Vec::with_capacity(n),
            paths2root_to_pos: Vec::with_capacity(n),
            tx_root: dec(&transition.tx_root),
            paths2tx_root: transition.tx_proofs.iter().map(path).collect(),
            paths2tx_root_pos: transition
                .tx_proofs
                .iter()
                .map(|p| p.positions.clone())
                .collect(),
            from_x: Vec::with_capacity(n),
            from_y: Vec::with_capacity(n),
            from_index: Vec::with_capacity(n),
            to_x: Vec::with_capacity(n),
            to_y: Vec::with_capacity(n),
            nonce_from: Vec::with_capacity(n),
            token_type_from: Vec::with_capacity(n),
            r8x: Vec::with_capacity(n),
            r8y: Vec::with_capacity(n),
            s: Vec::with_capacity(n),
            nonce_to: Vec::with_capacity(n),
            token_type_to: Vec::with_capacity(n),
            values: ValueColumns::Plain {
                amount: Vec::new(),
                balance_from: Vec::new(),
                balance_to: Vec::new(),
            },
        };

        let mut amounts = Columns::default();
        let mut from_balances = Columns::default();
        let mut to_balances = Columns::default();

        input.intermediate_roots.push(dec(&transition.original_root));
        for (tx, delta) in transition.txs.iter().zip(&transition.deltas) {
            let sig = tx
                .signature
                .as_ref()
                .ok_or(TransactionError::MissingSignature)?;

            input.intermediate_roots.push(dec(&delta.root_from_new_sender));
            input.intermediate_roots.push(dec(&delta.root_from_new_receiver));
            input.paths2root_from.push(path(&delta.sender_proof));
            input.paths2root_from_pos.push(delta.sender_proof.positions.clone());
            input.paths2root_to.push(path(&delta.receiver_proof));
            input.paths2root_to_pos.push(delta.receiver_proof.positions.clone());

            input.from_x.push(dec(&tx.from.x));
            input.from_y.push(dec(&tx.from.y));
            input.from_index.push(tx.from_index.to_string());
            input.to_x.push(dec(&tx.to.x));
            input.to_y.push(dec(&tx.to.y));
            input.nonce_from.push(tx.nonce.to_string());
            input.token_type_from.push(tx.token_type.to_string());
            input.r8x.push(dec(&sig.r8x));
            input.r8y.push(dec(&sig.r8y));
            input.s.push(field_to_decimal(&sig.s));
            input.nonce_to.push(delta.receiver_nonce.to_string());
            input.token_type_to.push(delta.receiver_token_type.to_string());

            amounts.push(kind, &tx.amount)?;
            from_balances.push(kind, &delta.sender_balance)?;
            to_balances.push(kind, &delta.receiver_balance)?;
        }

        input.values = match kind {
            BalanceKind::Plain => ValueColumns::Plain {
                amount: amounts.a,
                balance_from: from_balances.a,
                balance_to: to_balances.a,
            },
            BalanceKind::Confidential => ValueColumns::Confidential {
                amount_comm_x: amounts.a,
                amount_comm_y: amounts.b,
                balance_comm_x_from: from_balances.a,
                balance_comm_y_from: from_balances.b,
                balance_comm_x_to: to_balances.a,
                balance_comm_y_to: to_balances.b,
            },
        };
        Ok(input)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
