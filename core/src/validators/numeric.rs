#![deny(missing_docs)]

//! # Exact Numbers
//!
//! `multipleOf` and the bounds checks work on exact rationals, so that `0.3`
//! is a multiple of `0.1` and neither large `u64` values nor `1e40` lose
//! precision. A number's value is taken from the shortest decimal text
//! `serde_json` prints for it.

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{pow, Signed, Zero};
use serde_json::Number;
use std::cmp::Ordering;

/// The exact value of a decimal literal such as `-2.5e3`.
pub fn parse_decimal(text: &str) -> Option<BigRational> {
    let (body, exponent) = match text.find(['e', 'E']) {
        Some(idx) => (&text[..idx], text[idx + 1..].parse::<i64>().ok()?),
        None => (text, 0),
    };
    let (int_part, frac_part) = body.split_once('.').unwrap_or((body, ""));
    let digits = format!("{}{}", int_part, frac_part);
    let mantissa: BigInt = digits.parse().ok()?;

    let exponent = exponent.checked_sub(i64::try_from(frac_part.len()).ok()?)?;
    let scale = pow(BigInt::from(10), usize::try_from(exponent.unsigned_abs()).ok()?);
    Some(if exponent >= 0 {
        BigRational::from_integer(mantissa * scale)
    } else {
        BigRational::new(mantissa, scale)
    })
}

/// The exact value of a JSON number.
pub fn exact(number: &Number) -> Option<BigRational> {
    parse_decimal(&number.to_string())
}

/// True for numbers strictly above zero.
pub fn is_positive(number: &Number) -> bool {
    exact(number).is_some_and(|n| n.is_positive())
}

/// True when `value` is an integer multiple of `divisor`. A zero divisor
/// divides nothing.
pub fn is_multiple_of(value: &Number, divisor: &Number) -> bool {
    match (exact(value), exact(divisor)) {
        (Some(value), Some(divisor)) if !divisor.is_zero() => (value / divisor).is_integer(),
        _ => false,
    }
}

/// Orders two JSON numbers; `None` if either has no decimal form.
pub fn compare(left: &Number, right: &Number) -> Option<Ordering> {
    Some(exact(left)?.cmp(&exact(right)?))
}
