//! Classification of storage failures into ledger errors.
//!
//! Postgres reports the failure class through SQLSTATE; the codes below are
//! the ones the locked unit of work can hit under contention.

use std::time::Duration;

use sea_orm::{DbErr, RuntimeErr};
use wallet_core::ledger::LedgerError;

/// `serialization_failure`
pub const SERIALIZATION_FAILURE: &str = "40001";
/// `deadlock_detected`
pub const DEADLOCK_DETECTED: &str = "40P01";
/// `lock_not_available` (raised when `lock_timeout` expires)
pub const LOCK_NOT_AVAILABLE: &str = "55P03";
/// `query_canceled` (raised when `statement_timeout` expires)
pub const QUERY_CANCELED: &str = "57014";
/// `unique_violation`
pub const UNIQUE_VIOLATION: &str = "23505";

/// Returns the SQLSTATE carried by a database error, if any.
#[must_use]
pub fn sqlstate(err: &DbErr) -> Option<String> {
    match err {
        DbErr::Exec(RuntimeErr::SqlxError(e))
        | DbErr::Query(RuntimeErr::SqlxError(e))
        | DbErr::Conn(RuntimeErr::SqlxError(e)) => driver_sqlstate(e),
        _ => None,
    }
}

fn driver_sqlstate(err: &sqlx::Error) -> Option<String> {
    err.as_database_error()
        .and_then(|db| db.code())
        .map(std::borrow::Cow::into_owned)
}

/// Returns true if the code marks a failure that may succeed on retry.
#[must_use]
pub fn is_transient_code(code: &str) -> bool {
    matches!(
        code,
        SERIALIZATION_FAILURE | DEADLOCK_DETECTED | LOCK_NOT_AVAILABLE
    )
}

/// Returns true if the error is a unique constraint violation.
#[must_use]
pub fn is_unique_violation(err: &DbErr) -> bool {
    sqlstate(err).as_deref() == Some(UNIQUE_VIOLATION)
}

/// Maps a `DbErr` to a `LedgerError`.
///
/// `deadline` is reported when the server cancelled a statement on timeout.
#[must_use]
pub fn classify(err: DbErr, deadline: Duration) -> LedgerError {
    if let Some(code) = sqlstate(&err) {
        if is_transient_code(&code) {
            return LedgerError::Transient(format!("{code}: {err}"));
        }
        if code == QUERY_CANCELED {
            return LedgerError::Timeout(deadline);
        }
    }
    match err {
        DbErr::ConnectionAcquire(_) | DbErr::Conn(_) => LedgerError::Transient(err.to_string()),
        other => LedgerError::Database(other.to_string()),
    }
}

/// Maps a `DbErr` raised outside the locked unit of work.
///
/// Reads run without a statement deadline, so a cancellation is reported as
/// a zero-length timeout.
#[must_use]
pub fn classify_read(err: DbErr) -> LedgerError {
    classify(err, Duration::ZERO)
}
