//! Exact-decimal transaction amounts.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! Amounts wrap `rust_decimal::Decimal` and are stored as `NUMERIC(19,2)`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum number of fractional digits an amount may carry.
pub const AMOUNT_SCALE: u32 = 2;

/// Exclusive upper bound for amounts and balances (10^17).
///
/// `NUMERIC(19,2)` holds at most 17 integer digits.
pub const AMOUNT_CEILING: Decimal = Decimal::from_parts(0x5D8A_0000, 0x0163_4578, 0, false, 0);

/// Errors produced when constructing an [`Amount`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    /// Zero or negative value.
    #[error("amount must be greater than zero")]
    NotPositive,

    /// More than two fractional digits.
    #[error("amount must have at most 2 decimal places")]
    TooManyDecimals,

    /// Not below [`AMOUNT_CEILING`].
    #[error("amount must be less than 100000000000000000")]
    TooLarge,

    /// Not a decimal number.
    #[error("amount is not a valid decimal number")]
    Malformed,
}

/// A strictly positive monetary amount with at most two decimal places.
///
/// Deserializes from a JSON number or string and serializes as a string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    /// Validates and wraps a decimal value.
    ///
    /// # Errors
    ///
    /// Returns `AmountError` if the value is not positive, has more than two
    /// decimals, or reaches [`AMOUNT_CEILING`].
    pub fn new(value: Decimal) -> Result<Self, AmountError> {
        if value <= Decimal::ZERO {
            return Err(AmountError::NotPositive);
        }
        if value >= AMOUNT_CEILING {
            return Err(AmountError::TooLarge);
        }
        if value.normalize().scale() > AMOUNT_SCALE {
            return Err(AmountError::TooManyDecimals);
        }
        Ok(Self(value))
    }

    /// Returns the inner decimal.
    #[must_use]
    pub const fn value(self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = AmountError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl std::str::FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = Decimal::from_str_exact(s.trim()).map_err(|_| AmountError::Malformed)?;
        Self::new(value)
    }
}

impl std::fmt::Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
#[path = "money_tests.rs"]
mod tests;
