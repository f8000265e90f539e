//! Transaction use cases.
//!
//! [`TransactionService`] validates requests, short-circuits keyed retries,
//! and delegates the locked balance update to a [`TransactionRepository`].

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};
use wallet_shared::LedgerConfig;
use wallet_shared::types::{Page, PageRequest, TransactionId, UserId};

use super::error::LedgerError;
use super::repository::{IdempotencyRepository, LedgerRepository, TransactionRepository};
use super::types::{
    Balance, CreatedTransaction, IdempotencyRecord, NewTransaction, Transaction,
    TransactionFilter, TransactionType,
};
use super::validation::{
    capitalize, normalize_description, validate_amount, validate_idempotency_key,
};

/// Raw input for [`TransactionService::create_transaction`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTransactionCommand {
    /// Authenticated caller.
    pub user_id: UserId,
    /// Deposit or withdrawal.
    pub kind: TransactionType,
    /// Requested amount, validated by the service.
    pub amount: Decimal,
    /// Optional note.
    pub description: Option<String>,
    /// Optional client deduplication key.
    pub idempotency_key: Option<String>,
}

/// Wallet use cases over injected repositories.
#[derive(Clone)]
pub struct TransactionService {
    transactions: Arc<dyn TransactionRepository>,
    ledger: Arc<dyn LedgerRepository>,
    idempotency: Arc<dyn IdempotencyRepository>,
    config: LedgerConfig,
}

impl std::fmt::Debug for TransactionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionService")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl TransactionService {
    /// Creates a service from its repositories.
    #[must_use]
    pub fn new(
        transactions: Arc<dyn TransactionRepository>,
        ledger: Arc<dyn LedgerRepository>,
        idempotency: Arc<dyn IdempotencyRepository>,
        config: LedgerConfig,
    ) -> Self {
        Self {
            transactions,
            ledger,
            idempotency,
            config,
        }
    }

    /// Returns the ledger configuration in use.
    #[must_use]
    pub const fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Creates a transaction, or replays the one already created with the same key.
    ///
    /// Steps:
    /// 1. Validate amount, description and key without touching storage
    /// 2. If a key is present, return a live stored response or the transaction
    ///    already holding the key
    /// 3. Run the locked append unit of work
    /// 4. Store the idempotency record (best effort)
    ///
    /// # Errors
    ///
    /// - `Validation` for malformed input
    /// - `InsufficientBalance` when a withdrawal exceeds the balance
    /// - `BalanceLimitExceeded` when a deposit would overflow the balance
    /// - `IdempotencyKeyConflict` when the key belongs to another user
    /// - `Transient`, `Timeout`, `Database`, `Internal` from storage
    #[tracing::instrument(
        skip(self, command),
        fields(user_id = %command.user_id, kind = %command.kind, keyed = command.idempotency_key.is_some())
    )]
    pub async fn create_transaction(
        &self,
        command: CreateTransactionCommand,
    ) -> Result<CreatedTransaction, LedgerError> {
        let amount = validate_amount(command.amount)?;
        let description = normalize_description(command.description)?;
        let idempotency_key = validate_idempotency_key(command.idempotency_key)?;

        if let Some(key) = &idempotency_key
            && let Some(existing) = self.find_replay(key, command.user_id).await?
        {
            debug!(transaction_id = %existing.id, "replaying keyed request");
            return Ok(CreatedTransaction {
                transaction: existing,
                replayed: true,
            });
        }

        let input = NewTransaction {
            user_id: command.user_id,
            kind: command.kind,
            amount,
            description,
            idempotency_key: idempotency_key.clone(),
        };

        let transaction = match self.transactions.create_with_ledger(input).await {
            Ok((transaction, entry)) => {
                info!(
                    transaction_id = %transaction.id,
                    entry_id = entry.id,
                    running_balance = %entry.running_balance,
                    "transaction committed"
                );
                transaction
            }
            Err(LedgerError::DuplicateIdempotencyKey(key)) => {
                // Lost the race against a concurrent request carrying the same key.
                let winner = self.owned_by_key(&key, command.user_id).await?.ok_or_else(|| {
                    LedgerError::Internal(format!("transaction for key {key} vanished"))
                })?;
                return Ok(CreatedTransaction {
                    transaction: winner,
                    replayed: true,
                });
            }
            Err(err) => {
                if matches!(
                    err,
                    LedgerError::InsufficientBalance { .. } | LedgerError::BalanceLimitExceeded { .. }
                ) {
                    warn!(error = %err, "entry rejected");
                }
                return Err(err);
            }
        };

        if let Some(key) = idempotency_key {
            self.remember(key, &transaction).await;
        }

        Ok(CreatedTransaction {
            transaction,
            replayed: false,
        })
    }

    /// Returns one page of the user's transactions, newest first, plus the total count.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::Validation` if the limit is outside `1..=max_page_size`.
    pub async fn list_transactions(
        &self,
        user_id: UserId,
        kind: Option<TransactionType>,
        page: PageRequest,
    ) -> Result<Page<Transaction>, LedgerError> {
        let bounds = page
            .resolve(self.config.default_page_size, self.config.max_page_size)
            .map_err(|e| LedgerError::Validation(capitalize(&e.to_string())))?;
        let filter = TransactionFilter { kind };

        let (items, total) = tokio::try_join!(
            self.transactions.find_by_user_id(user_id, filter, bounds),
            self.transactions.count(user_id, filter),
        )?;

        Ok(Page::new(items, total, bounds))
    }

    /// Returns a transaction owned by `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::TransactionNotFound` if it does not exist or has another owner.
    pub async fn find_transaction_by_id(
        &self,
        id: TransactionId,
        user_id: UserId,
    ) -> Result<Transaction, LedgerError> {
        self.transactions
            .find_by_id(id)
            .await?
            .filter(|tx| tx.user_id == user_id)
            .ok_or(LedgerError::TransactionNotFound(id))
    }

    /// Returns the running balance of the user's latest ledger entry, or zero.
    pub async fn get_balance(&self, user_id: UserId) -> Result<Balance, LedgerError> {
        let balance = self
            .ledger
            .latest_entry(user_id)
            .await?
            .map_or(Decimal::ZERO, |entry| entry.running_balance);
        Ok(Balance { user_id, balance })
    }

    /// Deletes idempotency records whose expiry has passed.
    pub async fn purge_expired_idempotency_records(&self) -> Result<u64, LedgerError> {
        let removed = self.idempotency.delete_expired(Utc::now()).await?;
        info!(removed, "purged expired idempotency records");
        Ok(removed)
    }

    async fn find_replay(
        &self,
        key: &str,
        user_id: UserId,
    ) -> Result<Option<Transaction>, LedgerError> {
        if let Some(record) = self.idempotency.find_by_key(key, user_id, Utc::now()).await? {
            match serde_json::from_value::<Transaction>(record.response_body) {
                Ok(transaction) => return Ok(Some(transaction)),
                Err(e) => warn!(key, error = %e, "unreadable idempotency record, falling back"),
            }
        }
        self.owned_by_key(key, user_id).await
    }

    /// Looks up the transaction holding `key` and checks it belongs to `user_id`.
    async fn owned_by_key(
        &self,
        key: &str,
        user_id: UserId,
    ) -> Result<Option<Transaction>, LedgerError> {
        match self.transactions.find_by_idempotency_key(key).await? {
            Some(tx) if tx.user_id == user_id => Ok(Some(tx)),
            Some(_) => {
                warn!(key, "idempotency key bound to another user");
                Err(LedgerError::IdempotencyKeyConflict(key.to_string()))
            }
            None => Ok(None),
        }
    }

    async fn remember(&self, key: String, transaction: &Transaction) {
        let record = match IdempotencyRecord::for_transaction(
            key,
            transaction,
            Utc::now(),
            self.config.idempotency_ttl(),
        ) {
            Ok(record) => record,
            Err(e) => {
                warn!(error = %e, "failed to serialize idempotency record");
                return;
            }
        };
        if let Err(e) = self.idempotency.save(record).await {
            warn!(transaction_id = %transaction.id, error = %e, "failed to store idempotency record");
        }
    }
}
