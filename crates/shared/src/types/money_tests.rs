use super::*;
use rstest::rstest;
use rust_decimal_macros::dec;
use std::str::FromStr;

#[rstest]
#[case(dec!(0.01))]
#[case(dec!(1))]
#[case(dec!(150.5))]
#[case(dec!(99999.99))]
#[case(dec!(10.500))]
#[case(dec!(99999999999999999.99))]
fn test_valid_amounts(#[case] value: Decimal) {
    assert_eq!(Amount::new(value).unwrap().value(), value);
}

#[rstest]
#[case(dec!(0), AmountError::NotPositive)]
#[case(dec!(-5), AmountError::NotPositive)]
#[case(dec!(-0.01), AmountError::NotPositive)]
#[case(dec!(1.001), AmountError::TooManyDecimals)]
#[case(dec!(0.005), AmountError::TooManyDecimals)]
#[case(dec!(100000000000000000), AmountError::TooLarge)]
#[case(dec!(1000000000000000000), AmountError::TooLarge)]
#[case(Decimal::MAX, AmountError::TooLarge)]
fn test_invalid_amounts(#[case] value: Decimal, #[case] expected: AmountError) {
    assert_eq!(Amount::new(value).unwrap_err(), expected);
}

#[test]
fn test_from_str() {
    assert_eq!(Amount::from_str("12.34").unwrap().value(), dec!(12.34));
    assert_eq!(Amount::from_str("abc").unwrap_err(), AmountError::Malformed);
    assert_eq!(Amount::from_str("0").unwrap_err(), AmountError::NotPositive);
}

#[test]
fn test_deserialize_number_and_string() {
    let from_number: Amount = serde_json::from_str("500").unwrap();
    let from_string: Amount = serde_json::from_str("\"150.25\"").unwrap();
    assert_eq!(from_number.value(), dec!(500));
    assert_eq!(from_string.value(), dec!(150.25));
}

#[test]
fn test_deserialize_rejects_invalid() {
    assert!(serde_json::from_str::<Amount>("-1").is_err());
    assert!(serde_json::from_str::<Amount>("\"0\"").is_err());
    assert!(serde_json::from_str::<Amount>("\"1.234\"").is_err());
}

#[test]
fn test_serializes_as_string() {
    let amount = Amount::new(dec!(350.00)).unwrap();
    assert_eq!(serde_json::to_string(&amount).unwrap(), "\"350.00\"");
}

#[test]
fn test_ceiling_is_ten_to_the_seventeenth() {
    assert_eq!(AMOUNT_CEILING, dec!(100000000000000000));
}
