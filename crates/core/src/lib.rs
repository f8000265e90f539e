//! Core business logic for the wallet ledger.
//!
//! This crate holds the ledger engine with ZERO web or database dependencies.
//! Storage is reached through the repository traits in [`ledger::repository`];
//! the PostgreSQL implementations live in `wallet-db` and an in-process
//! implementation ([`ledger::InMemoryLedgerStore`]) lives here.
//!
//! # Modules
//!
//! - `ledger` - Running-balance ledger, idempotent transaction creation, use cases

pub mod ledger;
