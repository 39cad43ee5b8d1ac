// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Human-readable byte sizes (`1kb`, `4MB`, `1.5g`), powers of 1024.

use thiserror::Error;

const UNITS: [&str; 7] = ["B", "KB", "MB", "GB", "TB", "PB", "EB"];
const DIVISOR: f64 = 1024.0;
// 2^64 as a float; anything at or above it does not fit.
const U64_LIMIT: f64 = 18_446_744_073_709_551_616.0;

/// Failure to read a human-readable size.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SizeError {
    /// Nothing to parse.
    #[error("empty size")]
    Empty,
    /// The numeric part is not a non-negative decimal.
    #[error("can't read size `{0}` (try 64kb or 1.5mb)")]
    Invalid(String),
    /// The value does not fit in 64 bits.
    #[error("size `{0}` is too large")]
    Overflow(String),
}

/// Parses `<number>[unit]` where unit is one of `b k m g t p e`
/// (case-insensitive). Letters after the unit are ignored, so `kb`, `KiB`
/// and `k` are the same. The number may carry a fraction; the result is
/// truncated to whole bytes.
pub fn parse_size(input: &str) -> Result<u64, SizeError> {
    let s = input.trim();
    if s.is_empty() {
        return Err(SizeError::Empty);
    }
    let (number, exponent) = match s.find(|c: char| "bkmgtpe".contains(c.to_ascii_lowercase())) {
        Some(i) if i > 0 => (&s[..i], unit_exponent(s.as_bytes()[i])),
        _ => (s, 0),
    };
    let value: f64 = number
        .trim()
        .parse()
        .map_err(|_| SizeError::Invalid(input.to_owned()))?;
    if !value.is_finite() || value.is_sign_negative() {
        return Err(SizeError::Invalid(input.to_owned()));
    }
    let bytes = value * DIVISOR.powi(exponent);
    if bytes >= U64_LIMIT {
        return Err(SizeError::Overflow(input.to_owned()));
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let whole = bytes as u64;
    Ok(whole)
}

fn unit_exponent(unit: u8) -> i32 {
    match unit.to_ascii_lowercase() {
        b'k' => 1,
        b'm' => 2,
        b'g' => 3,
        b't' => 4,
        b'p' => 5,
        b'e' => 6,
        _ => 0,
    }
}

/// Formats `bytes` with the largest unit that keeps the value under 1024,
/// e.g. `format_size(1536, 2) == "1.50KB"`.
pub fn format_size(bytes: u64, precision: usize) -> String {
    #[allow(clippy::cast_precision_loss)]
    let mut n = bytes as f64;
    let mut unit = 0;
    while n >= DIVISOR && unit < UNITS.len() - 1 {
        n /= DIVISOR;
        unit += 1;
    }
    format!("{n:.precision$}{}", UNITS[unit])
}
