mod common;

use common::*;
use zkzru_account::{Balance, BalanceKind};
use zkzru_crypto::{Commitment, CommitmentScheme, CryptoContext};

fn commitment(balance: &Balance) -> Commitment {
    match balance {
        Balance::Commitment(c) => *c,
        Balance::Absent => Commitment::identity(),
        Balance::Plain(v) => panic!("plain balance {} in a confidential tree", v),
    }
}

#[test]
fn plain_transfer_conserves_value() {
    let ctx = CryptoContext::new();
    let mut tree = account_tree(&ctx, BalanceKind::Plain);
    let txs = scenario_txs(&ctx, &tree, BalanceKind::Plain);

    // A -> C
    let plain = |b: &Balance| match b {
        Balance::Plain(v) => *v,
        other => panic!("expected a plain balance, got {:?}", other),
    };
    let total = |tree: &zkzru_core::AccountTree| {
        plain(tree.account(2).unwrap().balance()) + plain(tree.account(4).unwrap().balance())
    };
    let before = total(&tree);
    tree.process_tx(&txs[0]).unwrap();
    let after = total(&tree);

    assert_eq!(before, after);
    assert_eq!(after, 1200);
}

#[test]
fn confidential_transfer_conserves_commitments() {
    let ctx = CryptoContext::new();
    let pedersen = ctx.commitments();
    let mut tree = account_tree(&ctx, BalanceKind::Confidential);
    let txs = scenario_txs(&ctx, &tree, BalanceKind::Confidential);

    let sum = |tree: &zkzru_core::AccountTree| {
        pedersen.add(
            &commitment(tree.account(2).unwrap().balance()),
            &commitment(tree.account(4).unwrap().balance()),
        )
    };

    let before = sum(&tree);
    tree.process_tx(&txs[0]).unwrap();
    let after = sum(&tree);

    assert_eq!(before, after);
    // and the sum still opens to 1000 + 200 under the combined blinding
    let a = pedersen.commit(1000, &blinding(2));
    let c = pedersen.commit(200, &blinding(4));
    assert_eq!(after, pedersen.add(&a, &c));
}

#[test]
fn confidential_withdrawal_removes_amount() {
    let ctx = CryptoContext::new();
    let pedersen = ctx.commitments();
    let mut tree = account_tree(&ctx, BalanceKind::Confidential);
    let txs = scenario_txs(&ctx, &tree, BalanceKind::Confidential);

    tree.process_tx(&txs[0]).unwrap();
    let c_before = commitment(tree.account(4).unwrap().balance());
    tree.process_tx(&txs[1]).unwrap();
    let c_after = commitment(tree.account(4).unwrap().balance());

    let withdrawn = commitment(&txs[1].amount);
    assert_eq!(pedersen.add(&c_after, &withdrawn), c_before);
    // the sentinel swallows the credit
    assert_eq!(tree.account(0).unwrap().balance(), &Balance::Absent);
}
