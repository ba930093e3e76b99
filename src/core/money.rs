//! Fixed-point decoding for NAV amounts.
//!
//! Amounts are kept as integers scaled by 10^4 so that prices never pass
//! through a floating-point representation.

use crate::core::error::RecordError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Number of implied fractional digits in a scaled amount.
pub const SCALE: u32 = 4;

const THOUSANDS_SEPARATOR: char = ',';
const DECIMAL_POINT: char = '.';

/// How malformed amounts are treated while tokenizing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum NumberPolicy {
    /// Malformed amounts become `None` and the line is still accepted.
    #[default]
    Lenient,
    /// Malformed amounts fail the whole line.
    Strict,
}

/// Converts a formatted amount such as `1,234.56` into `12345600`.
///
/// Only plain digits are accepted once separators and the decimal point are
/// removed, so signs, stray text and a second decimal point are rejected.
pub fn parse_scaled(raw: &str) -> Result<i64, RecordError> {
    let malformed = || RecordError::MalformedNumber {
        raw: raw.to_string(),
    };

    let cleaned: String = raw.chars().filter(|c| *c != THOUSANDS_SEPARATOR).collect();
    let point = cleaned.find(DECIMAL_POINT);
    let mut digits: String = cleaned.chars().filter(|c| *c != DECIMAL_POINT).collect();

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed());
    }
    if cleaned.len() - digits.len() > 1 {
        return Err(malformed());
    }

    let pad = match point {
        None => SCALE as usize,
        Some(index) => {
            let fraction = digits.len() - index;
            if fraction > SCALE as usize {
                return Err(malformed());
            }
            SCALE as usize - fraction
        }
    };
    digits.extend(std::iter::repeat_n('0', pad));

    digits.parse::<i64>().map_err(|_| malformed())
}

/// Decodes an amount under the given policy.
///
/// In lenient mode a malformed amount yields `Ok(None)`.
pub fn decode_amount(raw: &str, policy: NumberPolicy) -> Result<Option<i64>, RecordError> {
    match parse_scaled(raw) {
        Ok(value) => Ok(Some(value)),
        Err(e) => match policy {
            NumberPolicy::Lenient => {
                tracing::trace!("Treating amount as missing: {}", e);
                Ok(None)
            }
            NumberPolicy::Strict => Err(e),
        },
    }
}

/// Exact decimal view of a scaled amount, e.g. for display.
pub fn to_decimal(scaled: i64) -> Decimal {
    Decimal::new(scaled, SCALE)
}
