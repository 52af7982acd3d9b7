use std::str::FromStr;

use bigdecimal::BigDecimal;
use serde::{Deserialize, Deserializer, Serializer};
use serde_json::Value;

/// Decimal places kept for cash amounts (balances, costs, totals).
pub const CASH_SCALE: i64 = 2;

/// Decimal places kept for quantities and unit prices. Crypto assets trade in
/// fractions far below a cent, so these carry more precision than cash.
pub const QUANTITY_SCALE: i64 = 8;

/// Largest number of integer digits an incoming amount may carry.
pub const MAX_INTEGER_DIGITS: i64 = 20;

/// Largest number of decimal places an incoming amount may carry before rounding.
pub const MAX_INPUT_SCALE: i64 = 32;

// Longest numeric text accepted from a request body.
const MAX_NUMBER_TEXT: usize = 64;

/// Rounds half away from zero and pins the result to `CASH_SCALE`.
pub fn round_cash(value: &BigDecimal) -> BigDecimal {
    value.round(CASH_SCALE).with_scale(CASH_SCALE)
}

/// Rounds half away from zero and pins the result to `QUANTITY_SCALE`.
pub fn round_quantity(value: &BigDecimal) -> BigDecimal {
    value.round(QUANTITY_SCALE).with_scale(QUANTITY_SCALE)
}

/// Rejects amounts whose magnitude or precision is out of range.
///
/// Rounding cost in `BigDecimal` grows with the exponent, so this must run
/// before `round_cash` or `round_quantity` sees client input.
pub fn check_bounds(value: &BigDecimal) -> Result<(), String> {
    let (digits, scale) = value.as_bigint_and_exponent();
    if scale > MAX_INPUT_SCALE {
        return Err(format!("amount has more than {} decimal places", MAX_INPUT_SCALE));
    }
    let digits = digits.to_string();
    let digit_count = digits.trim_start_matches('-').len() as i64;
    if digits != "0" && digit_count - scale > MAX_INTEGER_DIGITS {
        return Err(format!("amount has more than {} integer digits", MAX_INTEGER_DIGITS));
    }
    Ok(())
}

fn parse_bounded(text: &str) -> Result<BigDecimal, String> {
    if text.len() > MAX_NUMBER_TEXT {
        let head: String = text.chars().take(16).collect();
        return Err(format!("'{}...' is too long to be an amount", head));
    }
    let value = BigDecimal::from_str(text).map_err(|_| format!("'{}' is not a number", text))?;
    check_bounds(&value)?;
    Ok(value)
}

pub fn zero() -> BigDecimal {
    BigDecimal::from(0)
}

pub fn is_positive(value: &BigDecimal) -> bool {
    *value > zero()
}

pub fn is_negative(value: &BigDecimal) -> bool {
    *value < zero()
}

/// Serializes a decimal as a JSON number.
///
/// Storage and arithmetic never leave `BigDecimal`; the float conversion only
/// happens at the response boundary, where clients expect plain numbers.
pub fn serialize_as_number<S>(value: &BigDecimal, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    // Parsing the decimal text gives the float closest to the exact value.
    match value.to_string().parse::<f64>() {
        Ok(number) if number.is_finite() => serializer.serialize_f64(number),
        _ => Err(serde::ser::Error::custom(format!(
            "decimal {} cannot be represented as a number",
            value
        ))),
    }
}

/// Accepts a JSON number, a numeric string, or null/missing.
///
/// Blank strings read as missing so that presence checks treat them like any
/// other absent field.
pub fn deserialize_lenient<'de, D>(deserializer: D) -> Result<Option<BigDecimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(number)) => parse_bounded(&number.to_string())
            .map(Some)
            .map_err(serde::de::Error::custom),
        Some(Value::String(text)) => {
            let text = text.trim();
            if text.is_empty() {
                return Ok(None);
            }
            parse_bounded(text).map(Some).map_err(serde::de::Error::custom)
        }
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected a number, found {}",
            other
        ))),
    }
}
