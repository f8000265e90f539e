//! Ledger error types.
//!
//! Storage backends classify their own failures into these variants, so use
//! cases and transport layers never see raw driver errors.

use std::time::Duration;

use rust_decimal::Decimal;
use thiserror::Error;
use wallet_shared::types::TransactionId;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    // ========== Validation Errors ==========
    /// Malformed input: amount, description, key or page bounds.
    #[error("{0}")]
    Validation(String),

    // ========== Business Rule Errors ==========
    /// Withdrawal would make the balance negative.
    #[error("Insufficient balance: available {balance}, requested {requested}")]
    InsufficientBalance {
        /// Balance before the rejected withdrawal.
        balance: Decimal,
        /// Amount the caller tried to withdraw.
        requested: Decimal,
    },

    /// Deposit would push the balance past what the ledger can store.
    #[error("Balance limit exceeded: available {balance}, requested {requested}")]
    BalanceLimitExceeded {
        /// Balance before the rejected deposit.
        balance: Decimal,
        /// Amount the caller tried to deposit.
        requested: Decimal,
    },

    /// Transaction does not exist or belongs to another user.
    #[error("Transaction not found: {0}")]
    TransactionNotFound(TransactionId),

    /// Idempotency key is already bound to another user's transaction.
    #[error("Idempotency key already used: {0}")]
    IdempotencyKeyConflict(String),

    /// The store rejected a second transaction with the same key.
    ///
    /// Raised by repositories; the create use case resolves it into a replay.
    #[error("Duplicate idempotency key: {0}")]
    DuplicateIdempotencyKey(String),

    // ========== Concurrency Errors ==========
    /// Serialization failure, deadlock, lock timeout or lost connection.
    #[error("Transient storage failure, please retry: {0}")]
    Transient(String),

    /// The unit of work did not finish within its deadline.
    #[error("Unit of work timed out after {0:?}")]
    Timeout(Duration),

    // ========== Storage Errors ==========
    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl LedgerError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::InsufficientBalance { .. } => "INSUFFICIENT_BALANCE",
            Self::BalanceLimitExceeded { .. } => "BALANCE_LIMIT_EXCEEDED",
            Self::TransactionNotFound(_) => "TRANSACTION_NOT_FOUND",
            Self::IdempotencyKeyConflict(_) => "IDEMPOTENCY_KEY_CONFLICT",
            Self::DuplicateIdempotencyKey(_) => "DUPLICATE_IDEMPOTENCY_KEY",
            Self::Transient(_) => "TRANSIENT_FAILURE",
            Self::Timeout(_) => "TIMEOUT",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - validation errors
            Self::Validation(_) => 400,

            // 404 Not Found
            Self::TransactionNotFound(_) => 404,

            // 409 Conflict - key bound elsewhere
            Self::IdempotencyKeyConflict(_) | Self::DuplicateIdempotencyKey(_) => 409,

            // 422 Unprocessable - business rule
            Self::InsufficientBalance { .. } | Self::BalanceLimitExceeded { .. } => 422,

            // 503/504 - retry with the same idempotency key
            Self::Transient(_) => 503,
            Self::Timeout(_) => 504,

            // 500 Internal Server Error
            Self::Database(_) | Self::Internal(_) => 500,
        }
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient(_) | Self::Timeout(_))
    }
}
