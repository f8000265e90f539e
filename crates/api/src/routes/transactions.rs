//! Transaction routes.

use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use wallet_core::ledger::{CreateTransactionCommand, Transaction, TransactionType};
use wallet_shared::types::{Page, PageRequest, TransactionId};

use crate::{AppState, error::ApiError, middleware::auth::AuthUser};

/// Request header carrying the client's idempotency key.
pub const IDEMPOTENCY_KEY_HEADER: &str = "idempotency-key";

/// Response header set when a keyed request was answered from an earlier result.
pub const IDEMPOTENT_REPLAYED_HEADER: &str = "idempotent-replayed";

/// Creates the transaction routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/transactions", post(create_transaction).get(list_transactions))
        .route("/transactions/{transaction_id}", get(get_transaction))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for creating a transaction.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransactionRequest {
    /// `DEPOSIT` or `WITHDRAWAL`.
    #[serde(rename = "type")]
    pub kind: TransactionType,
    /// Positive amount, JSON number or string.
    pub amount: Decimal,
    /// Optional free text.
    #[serde(default)]
    pub description: Option<String>,
    /// Used when the `Idempotency-Key` header is absent.
    #[serde(default)]
    pub idempotency_key: Option<String>,
}

/// Query parameters for listing transactions.
#[derive(Debug, Default, Deserialize)]
pub struct ListTransactionsQuery {
    /// Filter by transaction type.
    #[serde(rename = "type")]
    pub kind: Option<TransactionType>,
    /// Page size.
    pub limit: Option<u64>,
    /// Number of transactions to skip.
    pub offset: Option<u64>,
}

/// One page of transactions.
#[derive(Debug, Serialize, Deserialize)]
pub struct TransactionListResponse {
    /// Transactions, newest first.
    pub transactions: Vec<Transaction>,
    /// Total number of matching transactions.
    pub total: u64,
    /// Page size used.
    pub limit: u64,
    /// Offset used.
    pub offset: u64,
}

impl From<Page<Transaction>> for TransactionListResponse {
    fn from(page: Page<Transaction>) -> Self {
        Self {
            transactions: page.items,
            total: page.total,
            limit: page.limit,
            offset: page.offset,
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Reads the idempotency key header, if present.
fn idempotency_key(headers: &HeaderMap) -> Result<Option<String>, ApiError> {
    headers
        .get(IDEMPOTENCY_KEY_HEADER)
        .map(|value| {
            value
                .to_str()
                .map(str::to_owned)
                .map_err(|_| ApiError::bad_request("Idempotency-Key header must be visible ASCII"))
        })
        .transpose()
}

/// POST /transactions
pub(crate) async fn create_transaction(
    State(state): State<AppState>,
    auth: AuthUser,
    headers: HeaderMap,
    payload: Result<Json<CreateTransactionRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload?;
    let idempotency_key = idempotency_key(&headers)?.or(request.idempotency_key);

    let created = state
        .service
        .create_transaction(CreateTransactionCommand {
            user_id: auth.user_id(),
            kind: request.kind,
            amount: request.amount,
            description: request.description,
            idempotency_key,
        })
        .await?;

    let mut response = (StatusCode::CREATED, Json(created.transaction)).into_response();
    if created.replayed {
        response.headers_mut().insert(
            HeaderName::from_static(IDEMPOTENT_REPLAYED_HEADER),
            HeaderValue::from_static("true"),
        );
    }
    Ok(response)
}

/// GET /transactions
pub(crate) async fn list_transactions(
    State(state): State<AppState>,
    auth: AuthUser,
    query: Result<Query<ListTransactionsQuery>, QueryRejection>,
) -> Result<Json<TransactionListResponse>, ApiError> {
    let Query(query) = query?;

    let page = state
        .service
        .list_transactions(
            auth.user_id(),
            query.kind,
            PageRequest::new(query.limit, query.offset),
        )
        .await?;

    Ok(Json(page.into()))
}

/// GET /transactions/{transaction_id}
async fn get_transaction(
    State(state): State<AppState>,
    auth: AuthUser,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Transaction>, ApiError> {
    let Path(transaction_id) = path?;

    let transaction = state
        .service
        .find_transaction_by_id(TransactionId::from_uuid(transaction_id), auth.user_id())
        .await?;

    Ok(Json(transaction))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idempotency_key_header() {
        let mut headers = HeaderMap::new();
        assert_eq!(idempotency_key(&headers).unwrap(), None);

        headers.insert(IDEMPOTENCY_KEY_HEADER, HeaderValue::from_static("K1"));
        assert_eq!(idempotency_key(&headers).unwrap().as_deref(), Some("K1"));
    }

    #[test]
    fn test_non_ascii_idempotency_key_rejected() {
        let mut headers = HeaderMap::new();
        headers.insert(
            IDEMPOTENCY_KEY_HEADER,
            HeaderValue::from_bytes(&[0xE2, 0x82, 0xAC]).unwrap(),
        );
        let err = idempotency_key(&headers).unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_request_accepts_string_and_number_amounts() {
        let from_number: CreateTransactionRequest =
            serde_json::from_str(r#"{"type":"DEPOSIT","amount":10.25}"#).unwrap();
        let from_string: CreateTransactionRequest =
            serde_json::from_str(r#"{"type":"DEPOSIT","amount":"10.25"}"#).unwrap();
        assert_eq!(from_number.amount, from_string.amount);
        assert_eq!(from_number.kind, TransactionType::Deposit);
        assert!(from_number.description.is_none());
    }

    #[test]
    fn test_request_rejects_unknown_type() {
        let parsed = serde_json::from_str::<CreateTransactionRequest>(
            r#"{"type":"TRANSFER","amount":"1"}"#,
        );
        assert!(parsed.is_err());
    }
}
