//! In-process ledger store.
//!
//! Serializes writers per user with a `tokio::sync::Mutex` kept in a
//! `DashMap`, and applies each unit of work to a shared table in one step.
//! Used by tests and local development; state is lost on drop.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::{Mutex, RwLock};
use wallet_shared::types::{PageBounds, TransactionId, UserId};

use super::balance::apply_entry;
use super::error::LedgerError;
use super::repository::{IdempotencyRepository, LedgerRepository, TransactionRepository};
use super::types::{IdempotencyRecord, LedgerEntry, NewTransaction, Transaction, TransactionFilter};

#[derive(Default)]
struct LedgerState {
    transactions: HashMap<TransactionId, Transaction>,
    by_idempotency_key: HashMap<String, TransactionId>,
    entries: HashMap<UserId, Vec<LedgerEntry>>,
    idempotency_records: HashMap<(String, UserId), IdempotencyRecord>,
}

/// In-memory implementation of every ledger repository trait.
pub struct InMemoryLedgerStore {
    user_locks: DashMap<UserId, Arc<Mutex<()>>>,
    state: RwLock<LedgerState>,
    next_entry_id: AtomicI64,
    lock_timeout: Duration,
}

impl Default for InMemoryLedgerStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryLedgerStore {
    /// Creates an empty store with a 10 second lock deadline.
    #[must_use]
    pub fn new() -> Self {
        Self::with_lock_timeout(Duration::from_secs(10))
    }

    /// Creates an empty store with a custom lock deadline.
    #[must_use]
    pub fn with_lock_timeout(lock_timeout: Duration) -> Self {
        Self {
            user_locks: DashMap::new(),
            state: RwLock::new(LedgerState::default()),
            next_entry_id: AtomicI64::new(1),
            lock_timeout,
        }
    }

    fn user_lock(&self, user_id: UserId) -> Arc<Mutex<()>> {
        self.user_locks
            .entry(user_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    fn matches(tx: &Transaction, user_id: UserId, filter: TransactionFilter) -> bool {
        tx.user_id == user_id && filter.kind.is_none_or(|kind| tx.kind == kind)
    }
}

#[async_trait]
impl TransactionRepository for InMemoryLedgerStore {
    async fn create_with_ledger(
        &self,
        input: NewTransaction,
    ) -> Result<(Transaction, LedgerEntry), LedgerError> {
        let lock = self.user_lock(input.user_id);
        let _guard = tokio::time::timeout(self.lock_timeout, lock.lock_owned())
            .await
            .map_err(|_| LedgerError::Timeout(self.lock_timeout))?;

        let mut state = self.state.write().await;

        if let Some(key) = &input.idempotency_key
            && state.by_idempotency_key.contains_key(key)
        {
            return Err(LedgerError::DuplicateIdempotencyKey(key.clone()));
        }

        let latest = state.entries.get(&input.user_id).and_then(|e| e.last());
        let current = latest.map_or(rust_decimal::Decimal::ZERO, |e| e.running_balance);
        // Keep created_at non-decreasing per user even if the wall clock steps back.
        let created_at = latest.map_or_else(Utc::now, |e| e.created_at.max(Utc::now()));

        let running_balance = apply_entry(current, input.kind, input.amount)?;

        let transaction = Transaction {
            id: TransactionId::new(),
            user_id: input.user_id,
            kind: input.kind,
            amount: input.amount.value(),
            description: input.description,
            idempotency_key: input.idempotency_key,
            created_at,
        };
        let entry = LedgerEntry {
            id: self.next_entry_id.fetch_add(1, Ordering::SeqCst),
            transaction_id: transaction.id,
            user_id: transaction.user_id,
            kind: transaction.kind,
            amount: transaction.amount,
            running_balance,
            created_at,
        };

        if let Some(key) = &transaction.idempotency_key {
            state.by_idempotency_key.insert(key.clone(), transaction.id);
        }
        state.transactions.insert(transaction.id, transaction.clone());
        state
            .entries
            .entry(transaction.user_id)
            .or_default()
            .push(entry.clone());

        Ok((transaction, entry))
    }

    async fn find_by_id(&self, id: TransactionId) -> Result<Option<Transaction>, LedgerError> {
        Ok(self.state.read().await.transactions.get(&id).cloned())
    }

    async fn find_by_idempotency_key(
        &self,
        key: &str,
    ) -> Result<Option<Transaction>, LedgerError> {
        let state = self.state.read().await;
        Ok(state
            .by_idempotency_key
            .get(key)
            .and_then(|id| state.transactions.get(id))
            .cloned())
    }

    async fn find_by_user_id(
        &self,
        user_id: UserId,
        filter: TransactionFilter,
        bounds: PageBounds,
    ) -> Result<Vec<Transaction>, LedgerError> {
        let state = self.state.read().await;
        let mut matching: Vec<&Transaction> = state
            .transactions
            .values()
            .filter(|tx| Self::matches(tx, user_id, filter))
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let offset = usize::try_from(bounds.offset).unwrap_or(usize::MAX);
        let limit = usize::try_from(bounds.limit).unwrap_or(usize::MAX);
        Ok(matching
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn count(&self, user_id: UserId, filter: TransactionFilter) -> Result<u64, LedgerError> {
        let state = self.state.read().await;
        let count = state
            .transactions
            .values()
            .filter(|tx| Self::matches(tx, user_id, filter))
            .count();
        Ok(count as u64)
    }
}

#[async_trait]
impl LedgerRepository for InMemoryLedgerStore {
    async fn latest_entry(&self, user_id: UserId) -> Result<Option<LedgerEntry>, LedgerError> {
        let state = self.state.read().await;
        Ok(state
            .entries
            .get(&user_id)
            .and_then(|entries| entries.last())
            .cloned())
    }

    async fn entries_for_user(&self, user_id: UserId) -> Result<Vec<LedgerEntry>, LedgerError> {
        let state = self.state.read().await;
        Ok(state.entries.get(&user_id).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl IdempotencyRepository for InMemoryLedgerStore {
    async fn find_by_key(
        &self,
        key: &str,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<Option<IdempotencyRecord>, LedgerError> {
        let state = self.state.read().await;
        Ok(state
            .idempotency_records
            .get(&(key.to_string(), user_id))
            .filter(|record| record.is_live(now))
            .cloned())
    }

    async fn save(&self, record: IdempotencyRecord) -> Result<(), LedgerError> {
        let mut state = self.state.write().await;
        state
            .idempotency_records
            .entry((record.key.clone(), record.user_id))
            .or_insert(record);
        Ok(())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, LedgerError> {
        let mut state = self.state.write().await;
        let before = state.idempotency_records.len();
        state
            .idempotency_records
            .retain(|_, record| record.is_live(now));
        Ok((before - state.idempotency_records.len()) as u64)
    }
}
