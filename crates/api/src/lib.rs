//! HTTP and message boundary for the wallet ledger.
//!
//! This crate provides:
//! - REST API routes for transactions and balances
//! - Bearer token middleware for user and internal callers
//! - A transport-agnostic message pattern dispatcher
//! - Translation of ledger errors into status codes

pub mod error;
pub mod messages;
pub mod middleware;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::http::HeaderName;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use wallet_core::ledger::TransactionService;
use wallet_shared::JwtService;

pub use error::ApiError;
pub use messages::{MessageDispatcher, MessageError};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Wallet use cases.
    pub service: TransactionService,
    /// Verifies end-user bearer tokens.
    pub jwt_service: Arc<JwtService>,
    /// Verifies service-to-service bearer tokens.
    pub internal_jwt_service: Arc<JwtService>,
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    let request_id = HeaderName::from_static("x-request-id");

    Router::new()
        .merge(routes::health::routes())
        .nest("/api/v1", routes::user_routes(state.clone()))
        .nest("/internal", routes::internal::routes(state.clone()))
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
