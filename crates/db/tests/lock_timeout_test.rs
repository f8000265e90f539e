//! Lock contention tests for the PostgreSQL ledger store.
//!
//! A second connection holds the user's advisory lock so the locked unit of
//! work has to wait. These tests verify that:
//! - A create that cannot get the lock fails with a retryable error
//! - Such a create leaves no transaction or ledger row behind
//! - Lock waits are retried and succeed once the lock is released

mod common;

use std::time::{Duration, Instant};

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbBackend, EntityTrait,
    PaginatorTrait, QueryFilter, Statement, TransactionTrait,
};
use wallet_core::ledger::{CreateTransactionCommand, LedgerError, TransactionType};
use wallet_db::entities::{ledger_entries, transactions};
use wallet_shared::LedgerConfig;
use wallet_shared::types::UserId;

fn deposit(user_id: UserId, amount: Decimal) -> CreateTransactionCommand {
    CreateTransactionCommand {
        user_id,
        kind: TransactionType::Deposit,
        amount,
        description: None,
        idempotency_key: None,
    }
}

/// Takes the user's advisory lock on its own connection and keeps it until
/// the returned transaction ends.
async fn hold_user_lock(db: &DatabaseConnection, user_id: UserId) -> DatabaseTransaction {
    let holder = db.begin().await.unwrap();
    holder
        .execute(Statement::from_sql_and_values(
            DbBackend::Postgres,
            "SELECT pg_advisory_xact_lock(hashtextextended($1, 0))",
            [user_id.to_string().into()],
        ))
        .await
        .unwrap();
    holder
}

async fn row_counts(db: &DatabaseConnection, user_id: UserId) -> (u64, u64) {
    let transactions = transactions::Entity::find()
        .filter(transactions::Column::UserId.eq(user_id.into_inner()))
        .count(db)
        .await
        .unwrap();
    let entries = ledger_entries::Entity::find()
        .filter(ledger_entries::Column::UserId.eq(user_id.into_inner()))
        .count(db)
        .await
        .unwrap();
    (transactions, entries)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_blocked_create_times_out_and_writes_nothing() {
    let config = LedgerConfig {
        unit_of_work_timeout_ms: 200,
        max_retries: 0,
        ..LedgerConfig::default()
    };
    let Some(fx) = common::fixture_with(config).await else {
        return;
    };
    let user = UserId::new();
    let holder = hold_user_lock(&fx.db, user).await;

    let err = fx
        .service
        .create_transaction(deposit(user, dec!(100)))
        .await
        .unwrap_err();
    assert!(
        matches!(err, LedgerError::Timeout(_) | LedgerError::Transient(_)),
        "unexpected error: {err:?}"
    );
    assert!(err.is_retryable());

    holder.rollback().await.unwrap();
    assert_eq!(row_counts(&fx.db, user).await, (0, 0));
    assert_eq!(fx.service.get_balance(user).await.unwrap().balance, Decimal::ZERO);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_lock_wait_exhausts_retries() {
    let config = LedgerConfig {
        unit_of_work_timeout_ms: 2_000,
        lock_timeout_ms: 50,
        max_retries: 2,
        retry_backoff_ms: 10,
        ..LedgerConfig::default()
    };
    let Some(fx) = common::fixture_with(config).await else {
        return;
    };
    let user = UserId::new();
    let holder = hold_user_lock(&fx.db, user).await;

    let err = fx
        .service
        .create_transaction(deposit(user, dec!(100)))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::Transient(_)), "unexpected error: {err:?}");

    holder.rollback().await.unwrap();
    assert_eq!(row_counts(&fx.db, user).await, (0, 0));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_lock_wait_retried_until_released() {
    let config = LedgerConfig {
        unit_of_work_timeout_ms: 2_000,
        lock_timeout_ms: 100,
        max_retries: 20,
        retry_backoff_ms: 10,
        ..LedgerConfig::default()
    };
    let Some(fx) = common::fixture_with(config).await else {
        return;
    };
    let user = UserId::new();
    let holder = hold_user_lock(&fx.db, user).await;

    let started = Instant::now();
    let release = async {
        tokio::time::sleep(Duration::from_millis(300)).await;
        holder.rollback().await.unwrap();
    };
    let (created, ()) = tokio::join!(
        fx.service.create_transaction(deposit(user, dec!(100))),
        release
    );

    let created = created.unwrap();
    assert!(!created.replayed);
    assert!(started.elapsed() >= Duration::from_millis(250));
    assert_eq!(row_counts(&fx.db, user).await, (1, 1));
    assert_eq!(fx.service.get_balance(user).await.unwrap().balance, dec!(100));
}
