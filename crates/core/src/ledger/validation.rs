//! Input validation for the create use case.
//!
//! All checks here run before any storage access.

use rust_decimal::Decimal;
use wallet_shared::types::{Amount, AmountError};

use super::error::LedgerError;

/// Longest accepted idempotency key, in characters.
pub const MAX_IDEMPOTENCY_KEY_LEN: usize = 255;

/// Longest accepted description after trimming, in characters.
pub const MAX_DESCRIPTION_LEN: usize = 500;

/// Validates a raw amount.
///
/// # Errors
///
/// Returns `LedgerError::Validation` for non-positive, oversized or over-precise amounts.
pub fn validate_amount(value: Decimal) -> Result<Amount, LedgerError> {
    Amount::new(value).map_err(|e| match e {
        AmountError::NotPositive => LedgerError::Validation("Amount must be positive".to_string()),
        other => LedgerError::Validation(capitalize(&other.to_string())),
    })
}

/// Validates an optional idempotency key. The key is kept verbatim.
///
/// # Errors
///
/// Returns `LedgerError::Validation` for blank or overlong keys.
pub fn validate_idempotency_key(key: Option<String>) -> Result<Option<String>, LedgerError> {
    match key {
        None => Ok(None),
        Some(k) if k.trim().is_empty() => Err(LedgerError::Validation(
            "Idempotency key must not be blank".to_string(),
        )),
        Some(k) if k.chars().count() > MAX_IDEMPOTENCY_KEY_LEN => {
            Err(LedgerError::Validation(format!(
                "Idempotency key must be at most {MAX_IDEMPOTENCY_KEY_LEN} characters"
            )))
        }
        Some(k) => Ok(Some(k)),
    }
}

/// Trims a description; blank descriptions become `None`.
///
/// # Errors
///
/// Returns `LedgerError::Validation` if the trimmed text is too long.
pub fn normalize_description(description: Option<String>) -> Result<Option<String>, LedgerError> {
    let Some(text) = description else {
        return Ok(None);
    };
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    if trimmed.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(LedgerError::Validation(format!(
            "Description must be at most {MAX_DESCRIPTION_LEN} characters"
        )));
    }
    Ok(Some(trimmed.to_string()))
}

pub(crate) fn capitalize(message: &str) -> String {
    let mut chars = message.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case(dec!(0))]
    #[case(dec!(-10))]
    fn test_non_positive_amount(#[case] value: Decimal) {
        let err = validate_amount(value).unwrap_err();
        assert_eq!(err.to_string(), "Amount must be positive");
    }

    #[test]
    fn test_amount_scale() {
        let err = validate_amount(dec!(1.005)).unwrap_err();
        assert_eq!(err.to_string(), "Amount must have at most 2 decimal places");
        assert!(validate_amount(dec!(1.05)).is_ok());
    }

    #[test]
    fn test_amount_too_large() {
        let err = validate_amount(dec!(1000000000000000000)).unwrap_err();
        assert_eq!(err.to_string(), "Amount must be less than 100000000000000000");
        assert!(validate_amount(dec!(99999999999999999.99)).is_ok());
    }

    #[test]
    fn test_idempotency_key() {
        assert_eq!(validate_idempotency_key(None).unwrap(), None);
        assert_eq!(
            validate_idempotency_key(Some("K1".into())).unwrap(),
            Some("K1".to_string())
        );
        assert!(validate_idempotency_key(Some("   ".into())).is_err());
        assert!(validate_idempotency_key(Some("k".repeat(255))).is_ok());
        assert!(validate_idempotency_key(Some("k".repeat(256))).is_err());
    }

    #[test]
    fn test_description() {
        assert_eq!(normalize_description(None).unwrap(), None);
        assert_eq!(normalize_description(Some("  ".into())).unwrap(), None);
        assert_eq!(
            normalize_description(Some("  Initial deposit ".into())).unwrap(),
            Some("Initial deposit".to_string())
        );
        assert!(normalize_description(Some("d".repeat(500))).is_ok());
        assert!(normalize_description(Some("d".repeat(501))).is_err());
    }
}
