//! Conversions between API amounts and stored minor units.
//!
//! Amounts travel as exact decimals and are persisted as integer hundredths
//! so the database can add them atomically without rounding.

use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{de, Deserialize, Deserializer};
use serde_json::Value;

/// Number of decimal places a stored amount carries.
pub const MINOR_UNIT_SCALE: u32 = 2;

/// Converts an amount to hundredths. Returns `None` for amounts with more
/// than two significant decimal places or that overflow an `i64`.
pub fn to_minor_units(amount: Decimal) -> Option<i64> {
    if amount.normalize().scale() > MINOR_UNIT_SCALE {
        return None;
    }
    amount.checked_mul(Decimal::ONE_HUNDRED)?.to_i64()
}

pub fn from_minor_units(minor: i64) -> Decimal {
    Decimal::new(minor, MINOR_UNIT_SCALE)
}

/// Formats an amount the way the gateway expects it: always two decimals.
pub fn format_gateway_amount(amount: Decimal) -> String {
    let mut rounded = amount.round_dp(MINOR_UNIT_SCALE);
    rounded.rescale(MINOR_UNIT_SCALE);
    rounded.to_string()
}

/// Reads an amount that may arrive as a JSON number or a numeric string.
pub fn parse_amount(value: &Value) -> Option<Decimal> {
    let text = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        _ => return None,
    };
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
}

/// Serde adapter for optional amounts given as numbers or strings.
pub fn deserialize_optional_amount<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(v) => parse_amount(&v)
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("invalid amount: {}", v))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_minor_units_round_trip_whole_and_fractional() {
        assert_eq!(to_minor_units(Decimal::from(500)), Some(50_000));
        assert_eq!(to_minor_units(Decimal::from_str("12.5").unwrap()), Some(1_250));
        assert_eq!(from_minor_units(1_250), Decimal::from_str("12.50").unwrap());
    }

    #[test]
    fn test_minor_units_rejects_sub_cent_amounts() {
        assert_eq!(to_minor_units(Decimal::from_str("0.001").unwrap()), None);
        // Trailing zeros are not extra precision.
        assert_eq!(to_minor_units(Decimal::from_str("1.2000").unwrap()), Some(120));
    }

    #[test]
    fn test_minor_units_rejects_amounts_that_overflow() {
        assert_eq!(to_minor_units(Decimal::MAX), None);
        assert_eq!(to_minor_units(Decimal::from_str("79228162514264337593543950335").unwrap()), None);
        assert_eq!(to_minor_units(Decimal::from(i64::MAX)), None);
    }

    #[test]
    fn test_gateway_amount_always_has_two_decimals() {
        assert_eq!(format_gateway_amount(Decimal::from(500)), "500.00");
        assert_eq!(format_gateway_amount(Decimal::from_str("9.5").unwrap()), "9.50");
    }

    #[test]
    fn test_parse_amount_accepts_numbers_and_strings() {
        assert_eq!(parse_amount(&json!(500)), Some(Decimal::from(500)));
        assert_eq!(parse_amount(&json!("500.00")), Some(Decimal::from(500)));
        assert_eq!(parse_amount(&json!(1.5)), Some(Decimal::from_str("1.5").unwrap()));
        assert_eq!(parse_amount(&json!("abc")), None);
        assert_eq!(parse_amount(&json!(null)), None);
    }
}
