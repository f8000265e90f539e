//! Service-to-service routes.
//!
//! Same handlers as the user routes, verified with the internal token secret.
//! The acting user is the `userId` claim of the calling service's token.

use axum::{
    Router, middleware,
    routing::{get, post},
};

use super::{balance, transactions};
use crate::{AppState, middleware::auth::internal_auth_middleware};

/// Creates the internal routes.
#[allow(clippy::needless_pass_by_value)]
pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/transactions",
            post(transactions::create_transaction).get(transactions::list_transactions),
        )
        .route("/balance", get(balance::get_balance))
        .layer(middleware::from_fn_with_state(state, internal_auth_middleware))
}
