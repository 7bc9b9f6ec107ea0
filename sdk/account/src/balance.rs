use zkzru_crypto::{Commitment, CryptoContext, FieldElement};

use crate::AccountError;

/// An account balance or a transferred amount.
///
/// `Absent` is a commitment that has never been set: it hashes as `(0, 0)`,
/// which is not a curve point, and acts as the identity in commitment
/// arithmetic. Two absent values combine to absent, so untouched zero
/// accounts keep their original leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Balance {
    Plain(u128),
    Commitment(Commitment),
    Absent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BalanceKind {
    Plain,
    Confidential,
}

impl BalanceKind {
    /// The zero value of this kind.
    pub fn zero(self) -> Balance {
        match self {
            BalanceKind::Plain => Balance::Plain(0),
            BalanceKind::Confidential => Balance::Absent,
        }
    }
}

impl Balance {
    pub fn kind(&self) -> BalanceKind {
        match self {
            Balance::Plain(_) => BalanceKind::Plain,
            Balance::Commitment(_) | Balance::Absent => BalanceKind::Confidential,
        }
    }

    /// Field elements this value contributes to a leaf or transaction hash.
    pub fn hash_inputs(&self) -> Vec<FieldElement> {
        match self {
            Balance::Plain(v) => vec![FieldElement::from(*v)],
            Balance::Commitment(c) => vec![c.x, c.y],
            Balance::Absent => vec![FieldElement::from(0u64), FieldElement::from(0u64)],
        }
    }

    /// Commitment coordinates, with `Absent` read as `(0, 0)`.
    pub fn commitment_coords(&self) -> Option<(FieldElement, FieldElement)> {
        match self {
            Balance::Plain(_) => None,
            Balance::Commitment(c) => Some((c.x, c.y)),
            Balance::Absent => Some((FieldElement::from(0u64), FieldElement::from(0u64))),
        }
    }

    pub fn checked_sub(
        &self,
        ctx: &CryptoContext,
        amount: &Balance,
    ) -> Result<Balance, AccountError> {
        match (self, amount) {
            (Balance::Plain(b), Balance::Plain(a)) => {
                b.checked_sub(*a)
                    .map(Balance::Plain)
                    .ok_or(AccountError::InsufficientBalance {
                        available: *b,
                        required: *a,
                    })
            }
            _ => self.combine(amount, |x, y| ctx.commitments().sub(x, y)),
        }
    }

    pub fn checked_add(
        &self,
        ctx: &CryptoContext,
        amount: &Balance,
    ) -> Result<Balance, AccountError> {
        match (self, amount) {
            (Balance::Plain(b), Balance::Plain(a)) => b
                .checked_add(*a)
                .map(Balance::Plain)
                .ok_or(AccountError::BalanceOverflow {
                    balance: *b,
                    amount: *a,
                }),
            _ => self.combine(amount, |x, y| ctx.commitments().add(x, y)),
        }
    }

    fn combine<F>(&self, amount: &Balance, op: F) -> Result<Balance, AccountError>
    where
        F: FnOnce(&Commitment, &Commitment) -> Commitment,
    {
        if self.kind() != amount.kind() {
            return Err(AccountError::BalanceKindMismatch {
                balance: self.kind(),
                amount: amount.kind(),
            });
        }
        Ok(match (self.as_commitment(), amount.as_commitment()) {
            (None, None) => Balance::Absent,
            (lhs, rhs) => Balance::Commitment(op(
                &lhs.unwrap_or_else(Commitment::identity),
                &rhs.unwrap_or_else(Commitment::identity),
            )),
        })
    }

    fn as_commitment(&self) -> Option<Commitment> {
        match self {
            Balance::Commitment(c) => Some(*c),
            _ => None,
        }
    }
}
