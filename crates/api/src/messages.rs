//! Message pattern dispatch.
//!
//! Callers on a message bus address the wallet by pattern name. The dispatcher
//! decodes the camelCase payload, runs the matching use case and returns the
//! JSON result. No broker client lives here; a transport adapter hands each
//! message to [`MessageDispatcher::dispatch`] and serializes the outcome.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;
use wallet_core::ledger::{
    CreateTransactionCommand, LedgerError, TransactionService, TransactionType,
};
use wallet_shared::types::{PageRequest, TransactionId, UserId};

use crate::routes::transactions::TransactionListResponse;

/// Patterns the wallet answers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessagePattern {
    /// `wallet.create_transaction`
    CreateTransaction,
    /// `wallet.get_balance`
    GetBalance,
    /// `wallet.list_transactions`
    ListTransactions,
    /// `wallet.get_transaction`
    GetTransaction,
}

impl FromStr for MessagePattern {
    type Err = MessageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.strip_prefix("wallet.").unwrap_or(s) {
            "create_transaction" => Ok(Self::CreateTransaction),
            "get_balance" => Ok(Self::GetBalance),
            "list_transactions" => Ok(Self::ListTransactions),
            "get_transaction" => Ok(Self::GetTransaction),
            _ => Err(MessageError::bad_request(format!("Unknown message pattern: {s}"))),
        }
    }
}

/// A failed message, carrying the HTTP-equivalent status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{status_code}: {message}")]
pub struct MessageError {
    /// Status code the HTTP boundary would use for the same failure.
    pub status_code: u16,
    /// Human-readable message.
    pub message: String,
}

impl MessageError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status_code: 400,
            message: message.into(),
        }
    }
}

impl From<LedgerError> for MessageError {
    fn from(err: LedgerError) -> Self {
        let status_code = err.http_status_code();
        if status_code >= 500 {
            warn!(error = %err, code = err.error_code(), "message failed");
        }
        let message = match err {
            LedgerError::Database(_) | LedgerError::Internal(_) => {
                "An internal error occurred".to_string()
            }
            other => other.to_string(),
        };
        Self {
            status_code,
            message,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateTransactionPayload {
    user_id: Uuid,
    #[serde(rename = "type")]
    kind: TransactionType,
    amount: Decimal,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    idempotency_key: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BalancePayload {
    user_id: Uuid,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListTransactionsPayload {
    user_id: Uuid,
    #[serde(rename = "type", default)]
    kind: Option<TransactionType>,
    #[serde(default)]
    limit: Option<u64>,
    #[serde(default)]
    offset: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GetTransactionPayload {
    user_id: Uuid,
    id: Uuid,
}

fn decode<T: DeserializeOwned>(payload: Value) -> Result<T, MessageError> {
    serde_json::from_value(payload)
        .map_err(|e| MessageError::bad_request(format!("Invalid payload: {e}")))
}

fn encode<T: serde::Serialize>(value: &T) -> Result<Value, MessageError> {
    serde_json::to_value(value).map_err(|e| MessageError {
        status_code: 500,
        message: format!("Failed to encode response: {e}"),
    })
}

/// Routes pattern-addressed messages to the wallet use cases.
#[derive(Debug, Clone)]
pub struct MessageDispatcher {
    service: TransactionService,
}

impl MessageDispatcher {
    /// Creates a dispatcher over the wallet use cases.
    #[must_use]
    pub const fn new(service: TransactionService) -> Self {
        Self { service }
    }

    /// Handles one message.
    ///
    /// Both `wallet.<name>` and the bare `<name>` are accepted.
    pub async fn dispatch(&self, pattern: &str, payload: Value) -> Result<Value, MessageError> {
        let pattern: MessagePattern = pattern.parse()?;
        debug!(?pattern, "dispatching message");

        match pattern {
            MessagePattern::CreateTransaction => {
                let payload: CreateTransactionPayload = decode(payload)?;
                let created = self
                    .service
                    .create_transaction(CreateTransactionCommand {
                        user_id: UserId::from_uuid(payload.user_id),
                        kind: payload.kind,
                        amount: payload.amount,
                        description: payload.description,
                        idempotency_key: payload.idempotency_key,
                    })
                    .await?;
                encode(&created.transaction)
            }
            MessagePattern::GetBalance => {
                let payload: BalancePayload = decode(payload)?;
                let balance = self
                    .service
                    .get_balance(UserId::from_uuid(payload.user_id))
                    .await?;
                encode(&balance)
            }
            MessagePattern::ListTransactions => {
                let payload: ListTransactionsPayload = decode(payload)?;
                let page = self
                    .service
                    .list_transactions(
                        UserId::from_uuid(payload.user_id),
                        payload.kind,
                        PageRequest::new(payload.limit, payload.offset),
                    )
                    .await?;
                encode(&TransactionListResponse::from(page))
            }
            MessagePattern::GetTransaction => {
                let payload: GetTransactionPayload = decode(payload)?;
                let transaction = self
                    .service
                    .find_transaction_by_id(
                        TransactionId::from_uuid(payload.id),
                        UserId::from_uuid(payload.user_id),
                    )
                    .await?;
                encode(&transaction)
            }
        }
    }
}
