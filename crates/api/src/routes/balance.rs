//! Balance route.

use axum::{Json, Router, extract::State, routing::get};
use wallet_core::ledger::Balance;

use crate::{AppState, error::ApiError, middleware::auth::AuthUser};

/// Creates the balance routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/balance", get(get_balance))
}

/// GET /balance
pub(crate) async fn get_balance(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Balance>, ApiError> {
    let balance = state.service.get_balance(auth.user_id()).await?;
    Ok(Json(balance))
}
