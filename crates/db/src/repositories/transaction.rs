//! Transaction repository: the locked append path and transaction reads.
//!
//! A create runs as one READ COMMITTED database transaction:
//! 1. `SET LOCAL statement_timeout` / `lock_timeout`
//! 2. `pg_advisory_xact_lock` keyed by user id
//! 3. `SELECT ... FOR UPDATE` of the user's latest ledger entry
//! 4. balance check, then insert transaction and ledger entry
//! 5. commit
//!
//! Both locks are released at commit or rollback. Different users hash to
//! different advisory keys and never wait on each other.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    DbBackend, EntityTrait, NotSet, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select,
    Set, Statement, TransactionTrait,
};
use tracing::warn;
use wallet_core::ledger::{
    LedgerEntry, LedgerError, NewTransaction, Transaction, TransactionFilter,
    TransactionRepository, apply_entry,
};
use wallet_shared::LedgerConfig;
use wallet_shared::types::{PageBounds, TransactionId, UserId};

use crate::entities::sea_orm_active_enums::TransactionType as DbTransactionType;
use crate::entities::{ledger_entries, transactions};
use crate::error::{classify, classify_read, is_unique_violation};

const ADVISORY_LOCK_SQL: &str = "SELECT pg_advisory_xact_lock(hashtextextended($1, 0))";

impl From<transactions::Model> for Transaction {
    fn from(model: transactions::Model) -> Self {
        Self {
            id: TransactionId::from_uuid(model.id),
            user_id: UserId::from_uuid(model.user_id),
            kind: model.transaction_type.into(),
            amount: model.amount,
            description: model.description,
            idempotency_key: model.idempotency_key,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

/// `transactions` repository with the locked create unit of work.
#[derive(Debug, Clone)]
pub struct PgTransactionRepository {
    db: DatabaseConnection,
    config: LedgerConfig,
}

impl PgTransactionRepository {
    /// Creates a new transaction repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection, config: LedgerConfig) -> Self {
        Self { db, config }
    }

    fn deadline(&self) -> Duration {
        self.config.unit_of_work_timeout()
    }

    /// One attempt at the locked unit of work. Dropping `txn` on any early
    /// return rolls it back.
    async fn append_once(
        &self,
        input: &NewTransaction,
    ) -> Result<(Transaction, LedgerEntry), LedgerError> {
        let deadline = self.deadline();
        let fail = |e: sea_orm::DbErr| classify(e, deadline);

        let txn = self.db.begin().await.map_err(fail)?;
        Self::set_local_timeouts(&txn, &self.config)
            .await
            .map_err(fail)?;

        txn.execute(Statement::from_sql_and_values(
            DbBackend::Postgres,
            ADVISORY_LOCK_SQL,
            [input.user_id.to_string().into()],
        ))
        .await
        .map_err(fail)?;

        let latest = ledger_entries::Entity::find()
            .filter(ledger_entries::Column::UserId.eq(input.user_id.into_inner()))
            .order_by_desc(ledger_entries::Column::Id)
            .lock_exclusive()
            .one(&txn)
            .await
            .map_err(fail)?;

        let current = latest.as_ref().map_or(Decimal::ZERO, |e| e.running_balance);
        let now = Utc::now();
        // Keep created_at non-decreasing per user even if the wall clock steps back.
        let created_at = latest
            .as_ref()
            .map_or(now, |e| e.created_at.with_timezone(&Utc).max(now));

        let running_balance = apply_entry(current, input.kind, input.amount)?;
        let kind = DbTransactionType::from(input.kind);

        let transaction = transactions::ActiveModel {
            id: Set(TransactionId::new().into_inner()),
            user_id: Set(input.user_id.into_inner()),
            transaction_type: Set(kind),
            amount: Set(input.amount.value()),
            description: Set(input.description.clone()),
            idempotency_key: Set(input.idempotency_key.clone()),
            created_at: Set(created_at.into()),
        }
        .insert(&txn)
        .await
        .map_err(|e| match &input.idempotency_key {
            Some(key) if is_unique_violation(&e) => {
                LedgerError::DuplicateIdempotencyKey(key.clone())
            }
            _ => classify(e, deadline),
        })?;

        let entry = ledger_entries::ActiveModel {
            id: NotSet,
            transaction_id: Set(transaction.id),
            user_id: Set(transaction.user_id),
            entry_type: Set(kind),
            amount: Set(transaction.amount),
            running_balance: Set(running_balance),
            created_at: Set(transaction.created_at),
        }
        .insert(&txn)
        .await
        .map_err(fail)?;

        txn.commit().await.map_err(fail)?;

        Ok((transaction.into(), entry.into()))
    }

    /// A lock wait past `lock_timeout` raises 55P03 and is retried; a
    /// statement past `statement_timeout` raises 57014 and ends the create.
    async fn set_local_timeouts(
        txn: &DatabaseTransaction,
        config: &LedgerConfig,
    ) -> Result<(), sea_orm::DbErr> {
        txn.execute_unprepared(&format!(
            "SET LOCAL statement_timeout = {}",
            config.unit_of_work_timeout_ms
        ))
        .await?;
        txn.execute_unprepared(&format!(
            "SET LOCAL lock_timeout = {}",
            config.effective_lock_timeout_ms()
        ))
        .await?;
        Ok(())
    }

    fn user_query(user_id: UserId, filter: TransactionFilter) -> Select<transactions::Entity> {
        let query = transactions::Entity::find()
            .filter(transactions::Column::UserId.eq(user_id.into_inner()));
        match filter.kind {
            Some(kind) => {
                query.filter(transactions::Column::TransactionType.eq(DbTransactionType::from(kind)))
            }
            None => query,
        }
    }
}

#[async_trait]
impl TransactionRepository for PgTransactionRepository {
    async fn create_with_ledger(
        &self,
        input: NewTransaction,
    ) -> Result<(Transaction, LedgerEntry), LedgerError> {
        let deadline = self.deadline();
        let mut attempt = 0;
        loop {
            // Timing out drops the in-flight transaction, which rolls it back.
            let result = tokio::time::timeout(deadline, self.append_once(&input))
                .await
                .unwrap_or(Err(LedgerError::Timeout(deadline)));

            match result {
                Err(LedgerError::Transient(reason)) if attempt < self.config.max_retries => {
                    attempt += 1;
                    warn!(user_id = %input.user_id, attempt, %reason, "retrying ledger unit of work");
                    tokio::time::sleep(self.config.retry_backoff(attempt)).await;
                }
                other => return other,
            }
        }
    }

    async fn find_by_id(&self, id: TransactionId) -> Result<Option<Transaction>, LedgerError> {
        let model = transactions::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(classify_read)?;
        Ok(model.map(Into::into))
    }

    async fn find_by_idempotency_key(
        &self,
        key: &str,
    ) -> Result<Option<Transaction>, LedgerError> {
        let model = transactions::Entity::find()
            .filter(transactions::Column::IdempotencyKey.eq(key))
            .one(&self.db)
            .await
            .map_err(classify_read)?;
        Ok(model.map(Into::into))
    }

    async fn find_by_user_id(
        &self,
        user_id: UserId,
        filter: TransactionFilter,
        bounds: PageBounds,
    ) -> Result<Vec<Transaction>, LedgerError> {
        let models = Self::user_query(user_id, filter)
            .order_by_desc(transactions::Column::CreatedAt)
            .order_by_desc(transactions::Column::Id)
            .offset(bounds.offset)
            .limit(bounds.limit)
            .all(&self.db)
            .await
            .map_err(classify_read)?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn count(&self, user_id: UserId, filter: TransactionFilter) -> Result<u64, LedgerError> {
        Self::user_query(user_id, filter)
            .count(&self.db)
            .await
            .map_err(classify_read)
    }
}
