//! Decimal arithmetic utilities for financial calculations.

use crate::errors::ReportError;
use alloy::primitives::U256;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Deserializer};
use std::fmt::Display;
use std::str::FromStr;

/// Widest integer mantissa a `Decimal` can always hold.
const MAX_MANTISSA_DIGITS: usize = 28;

/// Truncate the fractional part of a decimal string to `decimals` digits.
///
/// Never rounds and never pads. A value without a fractional part comes back
/// unchanged, a missing integer part becomes `0`. Input is not validated:
/// anything that is not a number is split on the first `.` like any other
/// string.
pub fn trim_decimals(value: &str, decimals: usize) -> String {
    let mut parts = value.split('.');
    let whole = parts.next().unwrap_or_default();
    let fraction = match parts.next() {
        Some(fraction) if !fraction.is_empty() => fraction,
        _ => return value.to_string(),
    };

    let whole = if whole.is_empty() { "0" } else { whole };
    let fraction = match fraction.char_indices().nth(decimals) {
        Some((cut, _)) => &fraction[..cut],
        None => fraction,
    };

    format!("{}.{}", whole, fraction)
}

/// Trims every value it is given to a fixed number of decimals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trimmer {
    decimals: usize,
}

impl Trimmer {
    pub fn new(decimals: usize) -> Self {
        Self { decimals }
    }

    pub fn decimals(&self) -> usize {
        self.decimals
    }

    /// Trim anything that renders as a number.
    pub fn trim(&self, value: impl Display) -> String {
        trim_decimals(&value.to_string(), self.decimals)
    }
}

/// Interpret a raw on-chain integer string as a fixed-point value with `scale`
/// implied decimals (e.g. wei with scale 18, ray with scale 27).
///
/// Integers wider than a `Decimal` mantissa lose their least significant
/// digits rather than failing.
pub fn scaled_decimal(raw: &str, scale: u32) -> Result<Decimal, ReportError> {
    let raw = raw.trim();
    let (negative, digits) = match raw.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, raw),
    };

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ReportError::shape(format!(
            "expected an integer amount, got '{}'",
            raw
        )));
    }

    let digits = digits.trim_start_matches('0');
    if digits.is_empty() {
        return Ok(Decimal::ZERO);
    }

    let mut kept = digits;
    let mut scale = scale as i64;
    if kept.len() > MAX_MANTISSA_DIGITS {
        scale -= (kept.len() - MAX_MANTISSA_DIGITS) as i64;
        kept = &kept[..MAX_MANTISSA_DIGITS];
    }
    while scale > MAX_MANTISSA_DIGITS as i64 && !kept.is_empty() {
        kept = &kept[..kept.len() - 1];
        scale -= 1;
    }
    if kept.is_empty() {
        return Ok(Decimal::ZERO);
    }
    if scale < 0 {
        return Err(ReportError::shape(format!("amount out of range: {}", raw)));
    }

    let mantissa: i128 = kept
        .parse()
        .map_err(|e| ReportError::shape(format!("bad amount '{}': {}", raw, e)))?;
    let mantissa = if negative { -mantissa } else { mantissa };

    Decimal::try_from_i128_with_scale(mantissa, scale as u32)
        .map_err(|e| ReportError::shape(format!("amount out of range '{}': {}", raw, e)))
}

/// Ray (1e27) fixed-point string to a plain decimal.
pub fn ray_to_decimal(raw: &str) -> Result<Decimal, ReportError> {
    scaled_decimal(raw, 27)
}

/// Convert a contract uint to token units, dropping trailing zeros.
pub fn wei_to_decimal(value: U256, decimals: u32) -> Result<Decimal, ReportError> {
    scaled_decimal(&value.to_string(), decimals).map(|d| d.normalize())
}

/// Convert basis points to decimal rate
pub fn from_basis_points(bps: Decimal) -> Decimal {
    bps / dec!(10000)
}

/// Safe division that returns zero if divisor is zero.
pub fn safe_div(numerator: Decimal, denominator: Decimal) -> Decimal {
    if denominator == Decimal::ZERO {
        Decimal::ZERO
    } else {
        numerator / denominator
    }
}

/// Calculate weighted average.
pub fn weighted_average(values: &[(Decimal, Decimal)]) -> Decimal {
    let (sum, weight_sum) = values.iter().fold(
        (Decimal::ZERO, Decimal::ZERO),
        |(sum, weight_sum), (val, weight)| (sum + val * weight, weight_sum + weight),
    );

    safe_div(sum, weight_sum)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Str(String),
    Num(serde_json::Number),
}

impl NumberOrString {
    fn into_text(self) -> String {
        match self {
            NumberOrString::Str(s) => s,
            NumberOrString::Num(n) => n.to_string(),
        }
    }
}

fn parse_decimal_text(text: &str) -> Result<Decimal, rust_decimal::Error> {
    Decimal::from_str(text).or_else(|_| Decimal::from_scientific(text))
}

/// Accept a decimal written either as a JSON string or a JSON number.
pub fn deserialize_decimal_lenient<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let text = NumberOrString::deserialize(deserializer)?.into_text();
    parse_decimal_text(text.trim()).map_err(serde::de::Error::custom)
}

/// Accept an integer amount written either as a JSON string or a JSON number,
/// keeping its digits verbatim.
pub fn deserialize_integer_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(NumberOrString::deserialize(deserializer)?.into_text())
}
