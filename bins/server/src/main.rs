//! Wallet API Server
//!
//! Main entry point for the wallet ledger service.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wallet_api::{AppState, create_router};
use wallet_core::ledger::TransactionService;
use wallet_db::{PgIdempotencyRepository, PgLedgerRepository, PgTransactionRepository, connect};
use wallet_shared::{AppConfig, JwtService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wallet=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load().context("failed to load configuration")?;

    let db = connect(&config.database).await?;
    info!("Connected to database");

    let service = TransactionService::new(
        Arc::new(PgTransactionRepository::new(db.clone(), config.ledger.clone())),
        Arc::new(PgLedgerRepository::new(db.clone())),
        Arc::new(PgIdempotencyRepository::new(db)),
        config.ledger.clone(),
    );

    // Expired idempotency records are only swept at startup.
    if let Err(e) = service.purge_expired_idempotency_records().await {
        warn!(error = %e, "failed to purge expired idempotency records");
    }

    let state = AppState {
        service,
        jwt_service: Arc::new(JwtService::new(&config.jwt.secret)),
        internal_jwt_service: Arc::new(JwtService::new(&config.jwt.internal_secret)),
    };

    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
    }
}
