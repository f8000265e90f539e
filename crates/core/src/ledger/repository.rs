//! Storage seams for the ledger engine.
//!
//! Implementations must run [`TransactionRepository::create_with_ledger`] as a
//! single unit of work serialized per user, and classify their failures into
//! [`LedgerError`] variants.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use wallet_shared::types::{PageBounds, TransactionId, UserId};

use super::error::LedgerError;
use super::types::{IdempotencyRecord, LedgerEntry, NewTransaction, Transaction, TransactionFilter};

/// Transactions and the locked append path.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TransactionRepository: Send + Sync {
    /// Appends a transaction and its ledger entry while holding the user's lock.
    ///
    /// # Errors
    ///
    /// - `InsufficientBalance` when a withdrawal exceeds the locked balance (nothing written)
    /// - `BalanceLimitExceeded` when a deposit would overflow the stored balance (nothing written)
    /// - `DuplicateIdempotencyKey` when another transaction already holds the key
    /// - `Transient` / `Timeout` when the unit of work could not complete
    async fn create_with_ledger(
        &self,
        input: NewTransaction,
    ) -> Result<(Transaction, LedgerEntry), LedgerError>;

    /// Looks up a transaction by id, regardless of owner.
    async fn find_by_id(&self, id: TransactionId) -> Result<Option<Transaction>, LedgerError>;

    /// Looks up the transaction holding an idempotency key, regardless of owner.
    async fn find_by_idempotency_key(&self, key: &str)
    -> Result<Option<Transaction>, LedgerError>;

    /// Returns a user's transactions, newest first.
    async fn find_by_user_id(
        &self,
        user_id: UserId,
        filter: TransactionFilter,
        bounds: PageBounds,
    ) -> Result<Vec<Transaction>, LedgerError>;

    /// Counts a user's transactions matching `filter`.
    async fn count(&self, user_id: UserId, filter: TransactionFilter) -> Result<u64, LedgerError>;
}

/// Read access to ledger entries.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LedgerRepository: Send + Sync {
    /// Returns the user's entry with the greatest id.
    async fn latest_entry(&self, user_id: UserId) -> Result<Option<LedgerEntry>, LedgerError>;

    /// Returns all of a user's entries, oldest first.
    async fn entries_for_user(&self, user_id: UserId) -> Result<Vec<LedgerEntry>, LedgerError>;
}

/// Stored responses for keyed create requests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdempotencyRepository: Send + Sync {
    /// Returns the record for `(key, user_id)` if it has not expired at `now`.
    async fn find_by_key(
        &self,
        key: &str,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<Option<IdempotencyRecord>, LedgerError>;

    /// Persists a record. An existing record for the same `(key, user_id)` is kept.
    async fn save(&self, record: IdempotencyRecord) -> Result<(), LedgerError>;

    /// Deletes records that expired before `now`, returning how many were removed.
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, LedgerError>;
}
