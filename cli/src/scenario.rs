//! Reference Scenario
//!
//! Six users deposit into an empty rollup, then one batch moves funds between
//! them and out through the withdraw sentinel:
//!
//! ```text
//! index  0: sentinel      1: coordinator
//!        2: A 1000 (t2)   3: B 20 (t1)   4: C 200 (t2)
//!        5: D 100 (t1)    6: E 500 (t2)  7: F 20 (t1)
//!
//! A -> C 500, C -> withdraw 200, B -> D 10, coordinator -> withdraw 0
//! ```

use anyhow::{Context, Result, ensure};
use rand::RngCore;
use zkzru_account::{Account, BalanceKind};
use zkzru_config::RollupConfig;
use zkzru_core::{AccountTree, BatchTransition, CircuitInput, DepositTree, TxTree};
use zkzru_crypto::{CryptoContext, FieldElement, Pedersen, PublicKey, SecretKey};
use zkzru_transaction::{Amount, Transaction};

const COORDINATOR: usize = 1;
const USERS: [(u128, u64); 6] = [(1000, 2), (20, 1), (200, 2), (100, 1), (500, 2), (20, 1)];
/// (from, to, amount, token type)
const TRANSFERS: [(usize, usize, u128, u64); 4] =
    [(2, 4, 500, 2), (4, 0, 200, 2), (3, 5, 10, 1), (1, 0, 0, 0)];

pub struct ScenarioReport {
    pub deposit_root: FieldElement,
    pub transition: BatchTransition,
    pub input: CircuitInput,
}

pub fn run<R: RngCore>(config: &RollupConfig, rng: &mut R) -> Result<ScenarioReport> {
    let ctx = CryptoContext::with_params(
        &config.crypto.mimc_seed,
        config.crypto.mimc_rounds,
        &config.crypto.pedersen_seed,
    );
    let kind = if config.witness.confidential {
        BalanceKind::Confidential
    } else {
        BalanceKind::Plain
    };
    let depth = config.tree.balance_depth;
    let account_count = USERS.len() + 2;
    ensure!(
        account_count <= 1 << depth,
        "balance_depth {} cannot hold {} accounts",
        depth,
        account_count
    );
    ensure!(
        TRANSFERS.len() <= 1 << config.tree.tx_depth,
        "tx_depth {} cannot hold {} transactions",
        config.tree.tx_depth,
        TRANSFERS.len()
    );

    let accounts = genesis_accounts(&ctx, kind, rng);

    let mut deposits = DepositTree::new(&ctx, depth, config.tree.deposit_subtree_depth, kind)?;
    for chunk in accounts.chunks(1 << config.tree.deposit_subtree_depth) {
        deposits
            .process_deposits(chunk)
            .context("Failed to process deposit subtree")?;
    }
    let deposit_root = deposits.root();

    let mut tree = AccountTree::padded(&ctx, accounts, depth, kind)?;
    ensure!(
        tree.root() == deposit_root,
        "account tree does not match the deposit root"
    );

    let txs = batch(&ctx, &tree, kind, 1 << config.tree.tx_depth, rng);
    let batch = TxTree::new(&ctx, txs)?;
    let transition = tree.process_batch(&batch)?;
    let input = CircuitInput::from_transition(&transition)?;

    Ok(ScenarioReport {
        deposit_root,
        transition,
        input,
    })
}

fn key(index: usize) -> SecretKey {
    SecretKey::from_index(index as u64)
}

fn pubkey(ctx: &CryptoContext, index: usize) -> PublicKey {
    ctx.signer().derive_public_key(&key(index))
}

fn genesis_accounts<R: RngCore>(
    ctx: &CryptoContext,
    kind: BalanceKind,
    rng: &mut R,
) -> Vec<Account> {
    let mut accounts = vec![
        Account::empty(ctx, 0, kind),
        Account::new(ctx, COORDINATOR as u32, pubkey(ctx, COORDINATOR), kind.zero(), 0, 0),
    ];
    for (i, &(balance, token_type)) in USERS.iter().enumerate() {
        let index = i + 2;
        let balance = amount(ctx, kind, balance, rng);
        accounts.push(Account::new(
            ctx,
            index as u32,
            pubkey(ctx, index),
            balance,
            0,
            token_type,
        ));
    }
    accounts
}

fn amount<R: RngCore>(ctx: &CryptoContext, kind: BalanceKind, value: u128, rng: &mut R) -> Amount {
    match kind {
        BalanceKind::Plain => Amount::Plain(value),
        BalanceKind::Confidential if value == 0 => Amount::Absent,
        BalanceKind::Confidential => {
            let blinding = Pedersen::random_blinding(rng);
            Amount::Commitment(ctx.commitments().commit(value, &blinding))
        }
    }
}

/// The scenario transfers, then coordinator withdrawals of zero until the
/// batch fills the transaction tree.
fn batch<R: RngCore>(
    ctx: &CryptoContext,
    tree: &AccountTree,
    kind: BalanceKind,
    size: usize,
    rng: &mut R,
) -> Vec<Transaction> {
    let sentinel = *tree.accounts()[0].pubkey();
    let mut txs = Vec::with_capacity(size);

    for &(from, to, value, token_type) in &TRANSFERS {
        let sender = &tree.accounts()[from];
        let receiver = tree.accounts()[to].pubkey();
        txs.push(
            Transaction::new(
                *sender.pubkey(),
                sender.index(),
                *receiver,
                sender.nonce(),
                amount(ctx, kind, value, rng),
                token_type,
            )
            .signed(ctx, &key(from)),
        );
    }

    let coordinator = &tree.accounts()[COORDINATOR];
    let mut coordinator_nonce = coordinator.nonce()
        + TRANSFERS.iter().filter(|t| t.0 == COORDINATOR).count() as u64;
    while txs.len() < size {
        txs.push(
            Transaction::new(
                *coordinator.pubkey(),
                coordinator.index(),
                sentinel,
                coordinator_nonce,
                kind.zero(),
                0,
            )
            .signed(ctx, &key(COORDINATOR)),
        );
        coordinator_nonce += 1;
    }
    log::debug!(
        "built batch of {} transactions ({} padding)",
        txs.len(),
        size - TRANSFERS.len()
    );
    txs
}
