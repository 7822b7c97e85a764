//! Overflow-checked decimal arithmetic.
//!
//! `rust_decimal` panics when `+`, `-` or `*` leave its ~7.9e28 range. Every
//! amount derived from user-supplied quantities and prices goes through
//! these helpers so an out-of-range figure becomes an error instead.

use rust_decimal::Decimal;
use std::str::FromStr;

use crate::errors::{Result, ValidationError};

/// Parses plain (`187.25`) or exponent (`1.8725e2`) notation.
pub fn parse_decimal(value: &str) -> std::result::Result<Decimal, rust_decimal::Error> {
    let trimmed = value.trim();
    Decimal::from_str(trimmed).or_else(|_| Decimal::from_scientific(trimmed))
}

fn overflow(context: &str) -> crate::Error {
    ValidationError::AmountOverflow(context.to_string()).into()
}

pub fn checked_add(a: Decimal, b: Decimal, context: &str) -> Result<Decimal> {
    a.checked_add(b).ok_or_else(|| overflow(context))
}

pub fn checked_sub(a: Decimal, b: Decimal, context: &str) -> Result<Decimal> {
    a.checked_sub(b).ok_or_else(|| overflow(context))
}

pub fn checked_mul(a: Decimal, b: Decimal, context: &str) -> Result<Decimal> {
    a.checked_mul(b).ok_or_else(|| overflow(context))
}

pub fn checked_sum<I>(values: I, context: &str) -> Result<Decimal>
where
    I: IntoIterator<Item = Decimal>,
{
    values
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, v| checked_add(acc, v, context))
}

/// `amount × part / total`. Divides first when the product would overflow,
/// so a pro-rata share of a large amount still resolves.
pub fn pro_rata(amount: Decimal, part: Decimal, total: Decimal, context: &str) -> Result<Decimal> {
    if total.is_zero() {
        return Err(ValidationError::InvalidInput(format!("{}: division by zero", context)).into());
    }
    match amount.checked_mul(part) {
        Some(product) => product.checked_div(total),
        None => amount.checked_div(total).and_then(|share| share.checked_mul(part)),
    }
    .ok_or_else(|| overflow(context))
}

/// `gain / base × 100` rounded to 4 places, 0 when `base` is 0.
pub fn percentage_of(gain: Decimal, base: Decimal, context: &str) -> Result<Decimal> {
    if base.is_zero() {
        return Ok(Decimal::ZERO);
    }
    gain.checked_div(base)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .map(|pct| pct.round_dp(4))
        .ok_or_else(|| overflow(context))
}
