//! Running-balance arithmetic.
//!
//! For one user, ledger entries ordered by id form a chain where each
//! running balance equals the previous one plus a deposit or minus a
//! withdrawal, starting from zero. The chain never goes negative.

use rust_decimal::Decimal;
use wallet_shared::types::{AMOUNT_CEILING, Amount};

use super::error::LedgerError;
use super::types::{LedgerEntry, TransactionType};

/// Signed effect of an entry on the balance.
#[must_use]
pub fn signed_amount(kind: TransactionType, amount: Decimal) -> Decimal {
    match kind {
        TransactionType::Deposit => amount,
        TransactionType::Withdrawal => -amount,
    }
}

/// Computes the balance after applying one entry to `current`.
///
/// # Errors
///
/// Returns `LedgerError::InsufficientBalance` if a withdrawal exceeds `current`,
/// or `LedgerError::BalanceLimitExceeded` if a deposit would reach
/// [`AMOUNT_CEILING`].
pub fn apply_entry(
    current: Decimal,
    kind: TransactionType,
    amount: Amount,
) -> Result<Decimal, LedgerError> {
    let amount = amount.value();
    match kind {
        TransactionType::Withdrawal => {
            if amount > current {
                return Err(LedgerError::InsufficientBalance {
                    balance: current,
                    requested: amount,
                });
            }
            current
                .checked_sub(amount)
                .ok_or_else(|| LedgerError::Internal(format!("balance underflow at {current}")))
        }
        TransactionType::Deposit => current
            .checked_add(amount)
            .filter(|next| *next < AMOUNT_CEILING)
            .ok_or(LedgerError::BalanceLimitExceeded {
                balance: current,
                requested: amount,
            }),
    }
}

/// Sum of deposits minus withdrawals over a user's entries.
#[must_use]
pub fn replay_balance(entries: &[LedgerEntry]) -> Decimal {
    entries
        .iter()
        .map(|e| signed_amount(e.kind, e.amount))
        .sum()
}

/// Returns the id of the first entry whose running balance does not follow
/// from its predecessor, or that is negative.
///
/// `entries` must belong to one user and be sorted by id ascending.
#[must_use]
pub fn find_chain_break(entries: &[LedgerEntry]) -> Option<i64> {
    let mut previous = Decimal::ZERO;
    for entry in entries {
        let expected = previous + signed_amount(entry.kind, entry.amount);
        if entry.running_balance != expected || entry.running_balance < Decimal::ZERO {
            return Some(entry.id);
        }
        previous = entry.running_balance;
    }
    None
}
