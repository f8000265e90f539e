//! Ledger domain types.
//!
//! Transactions and ledger entries are immutable once written. The balance of a
//! wallet is never stored as a mutable field; it is the running balance of the
//! user's most recent ledger entry.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use wallet_shared::types::{Amount, IdempotencyRecordId, TransactionId, UserId};

/// Direction of a balance change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionType {
    /// Adds funds.
    Deposit,
    /// Removes funds; never allowed to overdraw the wallet.
    Withdrawal,
}

impl TransactionType {
    /// Returns the canonical wire/storage name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Deposit => "DEPOSIT",
            Self::Withdrawal => "WITHDRAWAL",
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DEPOSIT" => Ok(Self::Deposit),
            "WITHDRAWAL" => Ok(Self::Withdrawal),
            _ => Err(format!("type must be DEPOSIT or WITHDRAWAL, got {s}")),
        }
    }
}

/// A committed transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Transaction ID (UUID v7).
    pub id: TransactionId,
    /// Owner of the wallet.
    pub user_id: UserId,
    /// Deposit or withdrawal.
    #[serde(rename = "type")]
    pub kind: TransactionType,
    /// Positive amount with at most two decimals.
    pub amount: Decimal,
    /// Free-form note.
    pub description: Option<String>,
    /// Client-supplied deduplication key.
    pub idempotency_key: Option<String>,
    /// Commit timestamp, stamped while the user's lock is held.
    pub created_at: DateTime<Utc>,
}

/// Append-only record of a balance change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    /// Monotonic ordering key.
    pub id: i64,
    /// The transaction this entry records (1:1).
    pub transaction_id: TransactionId,
    /// Owner of the wallet.
    pub user_id: UserId,
    /// Deposit or withdrawal.
    #[serde(rename = "type")]
    pub kind: TransactionType,
    /// Amount of the change.
    pub amount: Decimal,
    /// Balance after this entry.
    pub running_balance: Decimal,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Stored result of a successful keyed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdempotencyRecord {
    /// Record ID.
    pub id: IdempotencyRecordId,
    /// Client-supplied key.
    pub key: String,
    /// User the key belongs to.
    pub user_id: UserId,
    /// Serialized [`Transaction`] returned on replay.
    pub response_body: serde_json::Value,
    /// Status code of the original response.
    pub status_code: u16,
    /// When the record was written.
    pub created_at: DateTime<Utc>,
    /// After this instant the record is no longer replayed.
    pub expires_at: DateTime<Utc>,
}

impl IdempotencyRecord {
    /// Builds a record for a freshly created transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction cannot be serialized.
    pub fn for_transaction(
        key: String,
        transaction: &Transaction,
        now: DateTime<Utc>,
        ttl: chrono::Duration,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            id: IdempotencyRecordId::new(),
            key,
            user_id: transaction.user_id,
            response_body: serde_json::to_value(transaction)?,
            status_code: 201,
            created_at: now,
            expires_at: now + ttl,
        })
    }

    /// Returns true if the record may still be replayed at `now`.
    #[must_use]
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

/// Validated input for the locked create unit of work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransaction {
    /// Owner of the wallet.
    pub user_id: UserId,
    /// Deposit or withdrawal.
    pub kind: TransactionType,
    /// Validated amount.
    pub amount: Amount,
    /// Trimmed description.
    pub description: Option<String>,
    /// Validated idempotency key.
    pub idempotency_key: Option<String>,
}

/// Optional constraints on a transaction listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransactionFilter {
    /// Only return transactions of this type.
    pub kind: Option<TransactionType>,
}

/// Result of the create use case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedTransaction {
    /// The new or previously committed transaction.
    pub transaction: Transaction,
    /// True when the transaction was returned from an earlier request with the same key.
    pub replayed: bool,
}

/// Current balance of a wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Balance {
    /// Owner of the wallet.
    pub user_id: UserId,
    /// Running balance of the latest ledger entry, or zero.
    pub balance: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::str::FromStr;

    fn sample_transaction() -> Transaction {
        Transaction {
            id: TransactionId::new(),
            user_id: UserId::new(),
            kind: TransactionType::Deposit,
            amount: dec!(50.00),
            description: Some("Top up".to_string()),
            idempotency_key: Some("K1".to_string()),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_transaction_type_wire_names() {
        assert_eq!(
            serde_json::to_string(&TransactionType::Withdrawal).unwrap(),
            "\"WITHDRAWAL\""
        );
        assert_eq!(
            TransactionType::from_str("DEPOSIT").unwrap(),
            TransactionType::Deposit
        );
        assert!(TransactionType::from_str("deposit").is_err());
        assert!(TransactionType::from_str("TRANSFER").is_err());
    }

    #[test]
    fn test_transaction_json_shape() {
        let tx = sample_transaction();
        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(json["type"], "DEPOSIT");
        assert_eq!(json["amount"], "50.00");
        assert_eq!(json["userId"], tx.user_id.to_string());
        assert_eq!(json["idempotencyKey"], "K1");
        assert!(json.get("createdAt").is_some());
    }

    #[test]
    fn test_idempotency_record_replays_transaction() {
        let tx = sample_transaction();
        let now = Utc::now();
        let record =
            IdempotencyRecord::for_transaction("K1".into(), &tx, now, chrono::Duration::hours(24))
                .unwrap();

        assert_eq!(record.status_code, 201);
        assert_eq!(record.user_id, tx.user_id);
        assert!(record.is_live(now));
        assert!(!record.is_live(now + chrono::Duration::hours(25)));

        let replayed: Transaction = serde_json::from_value(record.response_body).unwrap();
        assert_eq!(replayed, tx);
    }
}
