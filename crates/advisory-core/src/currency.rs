//! Tolerant currency parsing.
//!
//! Persisted amounts arrive as JSON numbers, formatted text (`"$12,345.67"`),
//! `null`, or garbage. Every entry point here is total: anything that cannot
//! be read as a number becomes zero.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::debug;

use crate::types::Money;

/// Parse any JSON value into money, defaulting to zero.
pub fn parse_currency(value: &Value) -> Money {
    match value {
        Value::Number(n) => number_to_decimal(n),
        Value::String(s) => parse_currency_str(s),
        Value::Null => Decimal::ZERO,
        other => {
            debug!(value = %other, "non-scalar currency value coerced to zero");
            Decimal::ZERO
        }
    }
}

/// Like [`parse_currency`], but keeps "absent" distinct from zero.
///
/// `null`, empty text and text with no digits are `None`; everything else is
/// parsed.
pub fn parse_currency_opt(value: &Value) -> Option<Money> {
    match value {
        Value::Null => None,
        Value::String(s) if !s.chars().any(|c| c.is_ascii_digit()) => None,
        Value::Number(_) | Value::String(_) => Some(parse_currency(value)),
        _ => None,
    }
}

/// Parse formatted currency text.
///
/// Every character other than digits, `.` and `-` is dropped, then the
/// longest leading `-?digits[.digits]` run is read. `"1.2.3"` reads as 1.2,
/// `"-$50"` as -50.
pub fn parse_currency_str(raw: &str) -> Money {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();

    match leading_number(&cleaned) {
        Some(text) => Decimal::from_str(&text).unwrap_or_else(|_| {
            debug!(raw, "currency text out of range, coerced to zero");
            Decimal::ZERO
        }),
        None => {
            if !raw.trim().is_empty() {
                debug!(raw, "unparsable currency text coerced to zero");
            }
            Decimal::ZERO
        }
    }
}

/// Extract `-?int[.frac]` from the front of `s`, normalised so that
/// `Decimal::from_str` accepts it. `None` when no digit is present.
fn leading_number(s: &str) -> Option<String> {
    let mut chars = s.chars().peekable();
    let mut negative = false;
    if chars.peek() == Some(&'-') {
        negative = true;
        chars.next();
    }

    let mut int_part = String::new();
    while let Some(c) = chars.peek().copied() {
        if !c.is_ascii_digit() {
            break;
        }
        int_part.push(c);
        chars.next();
    }

    let mut frac_part = String::new();
    if chars.peek() == Some(&'.') {
        chars.next();
        while let Some(c) = chars.peek().copied() {
            if !c.is_ascii_digit() {
                break;
            }
            frac_part.push(c);
            chars.next();
        }
    }

    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }

    let mut out = String::with_capacity(int_part.len() + frac_part.len() + 3);
    if negative {
        out.push('-');
    }
    if int_part.is_empty() {
        out.push('0');
    } else {
        out.push_str(&int_part);
    }
    if !frac_part.is_empty() {
        out.push('.');
        out.push_str(&frac_part);
    }
    Some(out)
}

fn number_to_decimal(n: &serde_json::Number) -> Money {
    let text = n.to_string();
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .unwrap_or_else(|_| {
            debug!(number = %text, "numeric value outside decimal range, coerced to zero");
            Decimal::ZERO
        })
}

/// Serde adapter: deserialize any JSON value as money via [`parse_currency`].
pub fn lenient_money<'de, D>(deserializer: D) -> Result<Money, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(parse_currency(&value))
}

/// Serde adapter for optional amounts via [`parse_currency_opt`].
pub fn lenient_opt_money<'de, D>(deserializer: D) -> Result<Option<Money>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(parse_currency_opt(&value))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
