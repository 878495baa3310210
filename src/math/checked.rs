//! Checked `Decimal` arithmetic
//!
//! `Decimal` operators panic when a result leaves the 96-bit mantissa
//! range. Value derivation multiplies caller-supplied quantities and
//! prices, so every accumulation step goes through these helpers and
//! surfaces an error instead.

use rust_decimal::Decimal;

use crate::errors::EngineError;

/// Checked multiplication with a typed error
#[inline]
pub fn checked_mul(a: Decimal, b: Decimal) -> Result<Decimal, EngineError> {
    a.checked_mul(b).ok_or(EngineError::ValueOutOfRange)
}

/// Checked addition with a typed error
#[inline]
pub fn checked_add(a: Decimal, b: Decimal) -> Result<Decimal, EngineError> {
    a.checked_add(b).ok_or(EngineError::ValueOutOfRange)
}

/// Checked division with a typed error. Callers guard the divisor
/// against zero; what this catches is a quotient too large to
/// represent.
#[inline]
pub fn checked_div(a: Decimal, b: Decimal) -> Result<Decimal, EngineError> {
    a.checked_div(b).ok_or(EngineError::ValueOutOfRange)
}
