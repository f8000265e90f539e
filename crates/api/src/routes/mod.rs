//! API route definitions.

use axum::{Router, middleware};

use crate::{AppState, middleware::auth::auth_middleware};

pub mod balance;
pub mod health;
pub mod internal;
pub mod transactions;

/// Creates the routes end users reach with their own access token.
#[allow(clippy::needless_pass_by_value)]
pub fn user_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .merge(transactions::routes())
        .merge(balance::routes())
        .layer(middleware::from_fn_with_state(state, auth_middleware))
}
