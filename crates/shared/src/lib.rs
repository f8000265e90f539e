//! Shared types, token verification, and configuration for the wallet service.
//!
//! This crate provides common types used across all other crates:
//! - Exact-decimal amounts for ledger arithmetic
//! - Typed IDs for type-safe entity references
//! - Limit/offset pagination types for list endpoints
//! - Bearer token claims and verification
//! - Configuration management

pub mod auth;
pub mod config;
pub mod jwt;
pub mod types;

pub use auth::Claims;
pub use config::{AppConfig, DatabaseConfig, JwtSettings, LedgerConfig, ServerConfig};
pub use jwt::{JwtError, JwtService};
