//! GTIN (barcode) handling.
//!
//! Providers disagree on zero-padding: the same product may be reported as
//! UPC-A `602445790135`, EAN-13 `0602445790135` or GTIN-14 `00602445790135`.
//! All of these are equivalent and share the same check digit.

use crate::error::{LookupError, Result};

/// Compute the check digit for a GTIN body (all digits except the last).
pub fn check_digit(body: &str) -> Option<u32> {
    let mut sum = 0;
    for (index, c) in body.chars().rev().enumerate() {
        let digit = c.to_digit(10)?;
        sum += if index % 2 == 0 { digit * 3 } else { digit };
    }
    Some((10 - sum % 10) % 10)
}

/// Whether `value` is a well-formed GTIN with a valid check digit.
pub fn is_valid(value: &str) -> bool {
    if !(8..=14).contains(&value.len()) || !value.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    let (body, check) = value.split_at(value.len() - 1);
    check_digit(body) == check.chars().next().and_then(|c| c.to_digit(10))
}

/// Validate user input, trimming surrounding whitespace.
pub fn parse(value: &str) -> Result<String> {
    let trimmed = value.trim();
    if is_valid(trimmed) {
        Ok(trimmed.to_string())
    } else {
        Err(LookupError::invalid_input(format!(
            "'{}' is not a valid GTIN",
            value
        )))
    }
}

/// Zero-pad a GTIN to `length` digits. Longer values are returned unchanged.
pub fn pad(value: &str, length: usize) -> String {
    format!("{:0>width$}", value, width = length)
}

/// Whether two GTINs identify the same product.
pub fn equivalent(a: &str, b: &str) -> bool {
    a.trim_start_matches('0') == b.trim_start_matches('0')
}

/// Pick the longest (most zero-padded) representation; the first wins ties.
pub fn longest_variant<'a>(values: impl IntoIterator<Item = &'a str>) -> Option<&'a str> {
    values.into_iter().fold(None, |best, value| match best {
        Some(current) if current.len() >= value.len() => Some(current),
        _ => Some(value),
    })
}
