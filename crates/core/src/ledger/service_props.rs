//! Property-based tests for TransactionService.
//!
//! - Balance derivation: balance equals deposits minus withdrawals
//! - No negative balance: rejected withdrawals write nothing
//! - Idempotent replay: one ledger entry per key

use std::sync::Arc;

use proptest::prelude::*;
use rust_decimal::Decimal;
use wallet_shared::LedgerConfig;
use wallet_shared::types::{Amount, UserId};

use super::balance::{apply_entry, find_chain_break, replay_balance};
use super::error::LedgerError;
use super::memory::InMemoryLedgerStore;
use super::repository::LedgerRepository;
use super::service::{CreateTransactionCommand, TransactionService};
use super::types::TransactionType;

/// Strategy to generate positive decimal amounts (0.01 to 10,000.00).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy to generate a transaction type, biased toward withdrawals to hit the floor.
fn kind_strategy() -> impl Strategy<Value = TransactionType> {
    prop_oneof![
        2 => Just(TransactionType::Deposit),
        3 => Just(TransactionType::Withdrawal),
    ]
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

fn service() -> (TransactionService, Arc<InMemoryLedgerStore>) {
    let store = Arc::new(InMemoryLedgerStore::new());
    let service = TransactionService::new(
        store.clone(),
        store.clone(),
        store.clone(),
        LedgerConfig::default(),
    );
    (service, store)
}

fn command(
    user_id: UserId,
    kind: TransactionType,
    amount: Decimal,
    key: Option<String>,
) -> CreateTransactionCommand {
    CreateTransactionCommand {
        user_id,
        kind,
        amount,
        description: None,
        idempotency_key: key,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// A withdrawal succeeds iff it does not exceed the balance, and the
    /// balance after any sequence equals the model balance.
    #[test]
    fn prop_balance_matches_model(
        ops in prop::collection::vec((kind_strategy(), positive_amount()), 1..40),
    ) {
        let rt = runtime();
        let (service, store) = service();
        let user = UserId::new();
        let mut model = Decimal::ZERO;
        let mut accepted = 0usize;

        for (kind, amount) in ops {
            let result = rt.block_on(service.create_transaction(command(user, kind, amount, None)));
            match kind {
                TransactionType::Deposit => {
                    prop_assert!(result.is_ok());
                    model += amount;
                    accepted += 1;
                }
                TransactionType::Withdrawal if amount <= model => {
                    prop_assert!(result.is_ok());
                    model -= amount;
                    accepted += 1;
                }
                TransactionType::Withdrawal => {
                    let is_insufficient = matches!(result, Err(LedgerError::InsufficientBalance { .. }));
                    prop_assert!(is_insufficient);
                }
            }
        }

        let balance = rt.block_on(service.get_balance(user)).unwrap().balance;
        let entries = rt.block_on(store.entries_for_user(user)).unwrap();

        prop_assert_eq!(balance, model);
        prop_assert_eq!(entries.len(), accepted);
        prop_assert_eq!(replay_balance(&entries), model);
        prop_assert_eq!(find_chain_break(&entries), None);
    }

    /// Repeating a key any number of times, with any amounts, creates one entry.
    #[test]
    fn prop_replay_creates_single_entry(
        amounts in prop::collection::vec(positive_amount(), 1..10),
    ) {
        let rt = runtime();
        let (service, store) = service();
        let user = UserId::new();
        let key = Some("prop-key".to_string());

        let mut ids = Vec::new();
        for amount in &amounts {
            let created = rt
                .block_on(service.create_transaction(command(user, TransactionType::Deposit, *amount, key.clone())))
                .unwrap();
            ids.push(created.transaction.id);
        }

        prop_assert!(ids.iter().all(|id| *id == ids[0]));
        let entries = rt.block_on(store.entries_for_user(user)).unwrap();
        prop_assert_eq!(entries.len(), 1);
        prop_assert_eq!(entries[0].running_balance, amounts[0]);
    }

    /// `apply_entry` never produces a negative balance.
    #[test]
    fn prop_apply_entry_never_negative(
        current in (0i64..1_000_000i64).prop_map(|c| Decimal::new(c, 2)),
        kind in kind_strategy(),
        amount in positive_amount(),
    ) {
        let amount = Amount::new(amount).unwrap();
        match apply_entry(current, kind, amount) {
            Ok(next) => {
                prop_assert!(next >= Decimal::ZERO);
                let delta = if kind == TransactionType::Deposit { amount.value() } else { -amount.value() };
                prop_assert_eq!(next, current + delta);
            }
            Err(LedgerError::InsufficientBalance { balance, requested }) => {
                prop_assert_eq!(kind, TransactionType::Withdrawal);
                prop_assert_eq!(balance, current);
                prop_assert!(requested > current);
            }
            Err(other) => prop_assert!(false, "unexpected error: {other}"),
        }
    }
}
