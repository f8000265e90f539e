//! Per-user running-balance ledger.
//!
//! This module implements the wallet ledger engine:
//! - Domain types for transactions, ledger entries and idempotency records
//! - Running-balance arithmetic and the no-negative-balance rule
//! - Input validation for amounts, descriptions and idempotency keys
//! - Repository traits for the persistent store
//! - An in-memory store for tests and local development
//! - The transaction use-case service

pub mod balance;
pub mod error;
pub mod memory;
pub mod repository;
pub mod service;
pub mod types;
pub mod validation;

#[cfg(test)]
mod service_props;

pub use balance::{apply_entry, find_chain_break, replay_balance};
pub use error::LedgerError;
pub use memory::InMemoryLedgerStore;
pub use repository::{IdempotencyRepository, LedgerRepository, TransactionRepository};
pub use service::{CreateTransactionCommand, TransactionService};
pub use types::{
    Balance, CreatedTransaction, IdempotencyRecord, LedgerEntry, NewTransaction, Transaction,
    TransactionFilter, TransactionType,
};
