use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::NaiveDateTime;

use crate::errors::FieldError;
use crate::models::{OrderSide, OrderStatus};

pub const REFERENCE_NUMBER_MAX_LEN: usize = 20;
pub const NAME_MAX_LEN: usize = 100;
pub const SYMBOL_MIN_LEN: usize = 3;
pub const SYMBOL_MAX_LEN: usize = 5;
pub const AMOUNT_SCALE: i64 = 2;
pub const AMOUNT_PRECISION: u64 = 18;
pub const TRANSACTION_DATE_FORMAT: &str = "%d/%m/%Y %H:%M:%S";
const TRANSACTION_DATE_PATTERN: &str = "dd/MM/yyyy HH:mm:ss";

fn is_alphanumeric(value: &str) -> bool {
    value.chars().all(char::is_alphanumeric)
}

pub fn reference_number(raw: &str) -> Result<String, FieldError> {
    if raw.trim().is_empty()
        || raw.chars().count() > REFERENCE_NUMBER_MAX_LEN
        || !is_alphanumeric(raw)
    {
        return Err(FieldError::ReferenceNumber);
    }
    Ok(raw.to_string())
}

pub fn quantity(raw: &str) -> Result<i64, FieldError> {
    raw.parse::<i64>()
        .map_err(|e| FieldError::Quantity(format!("'{}' ({})", raw, e)))
}

// Plain decimal notation only: optional sign, digits, optional fraction.
fn is_plain_decimal(raw: &str) -> bool {
    let unsigned = raw.strip_prefix(|c| c == '-' || c == '+').unwrap_or(raw);
    let (integer, fraction) = match unsigned.split_once('.') {
        Some((integer, fraction)) => (integer, fraction),
        None => (unsigned, ""),
    };
    !(integer.is_empty() && fraction.is_empty())
        && integer.chars().all(|c| c.is_ascii_digit())
        && fraction.chars().all(|c| c.is_ascii_digit())
}

/// Rounds to two fractional digits and enforces the `NUMERIC(18,2)` precision.
pub fn normalize_amount(amount: &BigDecimal) -> Result<BigDecimal, FieldError> {
    let rounded = amount.round(AMOUNT_SCALE).with_scale(AMOUNT_SCALE);
    if rounded.digits() > AMOUNT_PRECISION {
        return Err(FieldError::Amount(format!(
            "'{}' exceeds {} significant digits",
            amount, AMOUNT_PRECISION
        )));
    }
    Ok(rounded)
}

pub fn amount(raw: &str) -> Result<BigDecimal, FieldError> {
    if !is_plain_decimal(raw) {
        return Err(FieldError::Amount(format!("'{}' is not a valid decimal number", raw)));
    }
    let unsigned = raw.strip_prefix('+').unwrap_or(raw);
    let parsed = BigDecimal::from_str(unsigned)
        .map_err(|e| FieldError::Amount(format!("'{}' ({})", raw, e)))?;
    normalize_amount(&parsed)
}

pub fn name(raw: &str) -> Result<String, FieldError> {
    if raw.trim().is_empty() {
        return Err(FieldError::NameRequired);
    }
    Ok(raw.to_string())
}

// chrono accepts unpadded components and leap seconds, so the layout is
// checked byte by byte before parsing.
fn matches_date_layout(raw: &str) -> bool {
    let bytes = raw.as_bytes();
    if bytes.len() != TRANSACTION_DATE_PATTERN.len() {
        return false;
    }
    let layout_ok = bytes.iter().enumerate().all(|(i, b)| match i {
        2 | 5 => *b == b'/',
        10 => *b == b' ',
        13 | 16 => *b == b':',
        _ => b.is_ascii_digit(),
    });
    layout_ok && &raw[17..19] < "60"
}

pub fn transaction_date(raw: &str) -> Result<NaiveDateTime, FieldError> {
    if !matches_date_layout(raw) {
        return Err(FieldError::TransactionDate(format!(
            "'{}' does not match {}",
            raw, TRANSACTION_DATE_PATTERN
        )));
    }
    NaiveDateTime::parse_from_str(raw, TRANSACTION_DATE_FORMAT)
        .map_err(|e| FieldError::TransactionDate(format!("'{}' ({})", raw, e)))
}

pub fn symbol(raw: &str) -> Result<String, FieldError> {
    let len = raw.chars().count();
    if !(SYMBOL_MIN_LEN..=SYMBOL_MAX_LEN).contains(&len) || !is_alphanumeric(raw) {
        return Err(FieldError::Symbol);
    }
    Ok(raw.to_string())
}

pub fn order_side(raw: &str) -> Result<OrderSide, FieldError> {
    raw.parse()
}

pub fn order_status(raw: &str) -> Result<OrderStatus, FieldError> {
    raw.parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_reference_number_length_boundary() {
        let twenty = "A".repeat(20);
        let twenty_one = "A".repeat(21);
        assert_eq!(reference_number(&twenty), Ok(twenty.clone()));
        assert_eq!(reference_number(&twenty_one), Err(FieldError::ReferenceNumber));
    }

    #[test]
    fn test_reference_number_rejects_blank_and_symbols() {
        assert_eq!(reference_number(""), Err(FieldError::ReferenceNumber));
        assert_eq!(reference_number("AB-12"), Err(FieldError::ReferenceNumber));
        assert_eq!(reference_number("AB 12"), Err(FieldError::ReferenceNumber));
        assert!(reference_number("ab12XY").is_ok());
    }

    #[test]
    fn test_quantity() {
        assert_eq!(quantity("100"), Ok(100));
        assert_eq!(quantity("-5"), Ok(-5));
        assert_eq!(quantity("9223372036854775807"), Ok(i64::MAX));

        let err = quantity("12a").unwrap_err();
        assert_eq!(err.field(), "Quantity");
        assert!(err.to_string().starts_with("Invalid Quantity: '12a'"));
        assert!(quantity("").is_err());
        assert!(quantity("1.5").is_err());
        assert!(quantity("9223372036854775808").is_err());
    }

    #[test]
    fn test_amount_parses_and_rounds_to_two_places() {
        assert_eq!(amount("250.50").unwrap(), BigDecimal::from_str("250.50").unwrap());
        assert_eq!(amount("250.5").unwrap().to_string(), "250.50");
        assert_eq!(amount("7").unwrap().to_string(), "7.00");
        assert_eq!(amount("-1.25").unwrap().to_string(), "-1.25");
        assert_eq!(amount("+3.10").unwrap().to_string(), "3.10");
        assert_eq!(amount(".5").unwrap().to_string(), "0.50");
    }

    #[test]
    fn test_amount_rejects_malformed_input() {
        for raw in ["", "abc", "1e5", "1.2.3", "12 34", "-", ".", "$10"] {
            let err = amount(raw).unwrap_err();
            assert_eq!(err.field(), "Amount", "input {:?}", raw);
        }
    }

    #[test]
    fn test_amount_precision_limit() {
        assert!(amount("9999999999999999.99").is_ok());
        assert!(amount("99999999999999999.99").is_err());
    }

    #[test]
    fn test_name_required() {
        assert_eq!(name("John Doe"), Ok("John Doe".to_string()));
        assert_eq!(name(""), Err(FieldError::NameRequired));
        assert_eq!(name("   "), Err(FieldError::NameRequired));
        assert!(name(&"x".repeat(150)).is_ok());
    }

    #[test]
    fn test_transaction_date_exact_format() {
        let parsed = transaction_date("01/02/2024 13:05:09").unwrap();
        assert_eq!(parsed.day(), 1);
        assert_eq!(parsed.month(), 2);
        assert_eq!(parsed.year(), 2024);
        assert_eq!(parsed.hour(), 13);
        assert_eq!(parsed.minute(), 5);
        assert_eq!(parsed.second(), 9);
    }

    #[test]
    fn test_transaction_date_rejects_deviations() {
        for raw in [
            "2024-01-01 10:00:00",
            "1/1/2024 10:00:00",
            "01/01/2024 10:00",
            "01/01/2024 10:00:00 extra",
            "01-01-2024 10:00:00",
            "32/01/2024 10:00:00",
            "29/02/2023 10:00:00",
            "01/13/2024 10:00:00",
            "01/01/2024 24:00:00",
            "01/01/2024 10:60:00",
            "01/01/2024 10:00:60",
            "01/01/2024T10:00:00",
            "",
        ] {
            let err = transaction_date(raw).unwrap_err();
            assert_eq!(err.field(), "TransactionDate", "input {:?}", raw);
        }
        assert!(transaction_date("29/02/2024 23:59:59").is_ok());
    }

    #[test]
    fn test_symbol_length_boundary() {
        assert!(symbol("ABC").is_ok());
        assert!(symbol("ABCDE").is_ok());
        assert_eq!(symbol("AB"), Err(FieldError::Symbol));
        assert_eq!(symbol("ABCDEF"), Err(FieldError::Symbol));
        assert_eq!(symbol("AB.C"), Err(FieldError::Symbol));
    }

    #[test]
    fn test_order_side_is_case_sensitive() {
        assert_eq!(order_side("Buy"), Ok(OrderSide::Buy));
        assert_eq!(order_side("Sell"), Ok(OrderSide::Sell));
        assert_eq!(order_side("buy"), Err(FieldError::OrderSide));
        assert_eq!(order_side("SELL"), Err(FieldError::OrderSide));
    }

    #[test]
    fn test_order_status() {
        assert_eq!(order_status("Open"), Ok(OrderStatus::Open));
        assert_eq!(order_status("Matched"), Ok(OrderStatus::Matched));
        assert_eq!(order_status("Cancelled"), Ok(OrderStatus::Cancelled));
        assert_eq!(order_status("Canceled"), Err(FieldError::OrderStatus));
        assert_eq!(order_status("open"), Err(FieldError::OrderStatus));
    }
}
