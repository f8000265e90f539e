//! Repository implementations for the ledger store.
//!
//! Each repository implements one of the `wallet-core` storage traits on top
//! of a `SeaORM` connection pool, hiding the `SeaORM` details from the rest of
//! the application.

pub mod idempotency;
pub mod ledger;
pub mod transaction;

pub use idempotency::PgIdempotencyRepository;
pub use ledger::PgLedgerRepository;
pub use transaction::PgTransactionRepository;
