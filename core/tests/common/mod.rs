#![allow(dead_code)]

use zkzru_account::{Account, BalanceKind};
use zkzru_core::{AccountTree, TxTree};
use zkzru_crypto::{CommitmentScheme, CryptoContext, PublicKey, SecretKey};
use zkzru_transaction::{Amount, Transaction};

pub const BALANCE_DEPTH: usize = 4;

/// A..F at indices 2..8
pub const BALANCES: [u128; 6] = [1000, 20, 200, 100, 500, 20];
pub const TOKEN_TYPES: [u64; 6] = [2, 1, 2, 1, 2, 1];

/// A -> C 500, C -> withdraw 200, B -> D 10, coordinator -> withdraw 0
pub const TX_FROM: [usize; 4] = [2, 4, 3, 1];
pub const TX_TO: [usize; 4] = [4, 0, 5, 0];
pub const TX_AMOUNTS: [u128; 4] = [500, 200, 10, 0];
pub const TX_TOKEN_TYPES: [u64; 4] = [2, 2, 1, 0];

pub fn key(index: usize) -> SecretKey {
    SecretKey::from_index(index as u64)
}

pub fn pubkey(ctx: &CryptoContext, index: usize) -> PublicKey {
    ctx.signer().derive_public_key(&key(index))
}

pub fn blinding(tag: u8) -> [u8; 32] {
    [tag; 32]
}

/// Sentinel, coordinator and A..F.
pub fn accounts(ctx: &CryptoContext, kind: BalanceKind) -> Vec<Account> {
    let mut accounts = vec![Account::empty(ctx, 0, kind)];
    accounts.push(Account::new(ctx, 1, pubkey(ctx, 1), kind.zero(), 0, 0));

    for (i, (balance, token)) in BALANCES.iter().zip(TOKEN_TYPES).enumerate() {
        let index = i + 2;
        let account = match kind {
            BalanceKind::Plain => {
                Account::plain(ctx, index as u32, pubkey(ctx, index), *balance, 0, token)
            }
            BalanceKind::Confidential => {
                let c = ctx.commitments().commit(*balance, &blinding(index as u8));
                Account::confidential(ctx, index as u32, pubkey(ctx, index), c, 0, token)
            }
        };
        accounts.push(account);
    }
    accounts
}

pub fn account_tree(ctx: &CryptoContext, kind: BalanceKind) -> AccountTree {
    AccountTree::padded(ctx, accounts(ctx, kind), BALANCE_DEPTH, kind).unwrap()
}

pub fn amount(ctx: &CryptoContext, kind: BalanceKind, value: u128, tag: u8) -> Amount {
    match kind {
        BalanceKind::Plain => Amount::Plain(value),
        BalanceKind::Confidential if value == 0 => Amount::Absent,
        BalanceKind::Confidential => {
            Amount::Commitment(ctx.commitments().commit(value, &blinding(tag)))
        }
    }
}

/// The four scenario transactions, signed, in batch order.
pub fn scenario_txs(
    ctx: &CryptoContext,
    tree: &AccountTree,
    kind: BalanceKind,
) -> Vec<Transaction> {
    (0..4)
        .map(|i| {
            let from = &tree.accounts()[TX_FROM[i]];
            let to = &tree.accounts()[TX_TO[i]];
            Transaction::new(
                *from.pubkey(),
                from.index(),
                *to.pubkey(),
                0,
                amount(ctx, kind, TX_AMOUNTS[i], 100 + i as u8),
                TX_TOKEN_TYPES[i],
            )
            .signed(ctx, &key(TX_FROM[i]))
        })
        .collect()
}

pub fn scenario_batch(ctx: &CryptoContext, tree: &AccountTree, kind: BalanceKind) -> TxTree {
    TxTree::new(ctx, scenario_txs(ctx, tree, kind)).unwrap()
}
