//! Signed duration literals for temporal predicates
//!
//! Accepts sequences of `<int><unit>` components with an optional leading
//! sign: `"10s"`, `"-24h"`, `"1h30m"`, `"500ms"`. Units are `h`, `m`, `s`,
//! `ms`.

use chrono::Duration;

use crate::error::ConditionError;

pub(crate) fn parse(literal: &str) -> Result<Duration, ConditionError> {
    let invalid = || ConditionError::InvalidDuration(literal.to_string());

    let (negative, rest) = match literal.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, literal.strip_prefix('+').unwrap_or(literal)),
    };
    if rest.is_empty() {
        return Err(invalid());
    }

    let mut total_ms: i64 = 0;
    let mut chars = rest.chars().peekable();

    while chars.peek().is_some() {
        let mut digits = String::new();
        while let Some(&c) = chars.peek() {
            if c.is_ascii_digit() {
                digits.push(c);
                chars.next();
            } else {
                break;
            }
        }
        let value: i64 = digits.parse().map_err(|_| invalid())?;

        let mut unit = String::new();
        while let Some(&c) = chars.peek() {
            if c.is_ascii_alphabetic() {
                unit.push(c);
                chars.next();
            } else {
                break;
            }
        }

        let component_ms = match unit.as_str() {
            "h" => value.checked_mul(3_600_000),
            "m" => value.checked_mul(60_000),
            "s" => value.checked_mul(1_000),
            "ms" => Some(value),
            _ => return Err(invalid()),
        }
        .ok_or_else(invalid)?;

        total_ms = total_ms.checked_add(component_ms).ok_or_else(invalid)?;
    }

    if negative {
        total_ms = -total_ms;
    }
    Ok(Duration::milliseconds(total_ms))
}
