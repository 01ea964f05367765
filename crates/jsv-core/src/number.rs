//! # Exact Decimal Arithmetic for JSON Numbers
//!
//! `serde_json::Number` stores integers exactly but keeps fractional values
//! as binary `f64`. Its `Display` output is the shortest decimal string that
//! round-trips to the same `f64`, which is exactly the number the schema
//! author wrote. [`Decimal`] parses that string into an arbitrary-precision
//! base-10 mantissa and an exponent, so divisibility is decided without
//! binary rounding error at any magnitude: `0.3` is a multiple of `0.1`,
//! `0.0075` is a multiple of `0.0001`, and `1e308` is a multiple of `0.5`.
//!
//! ## Invariants
//!
//! - A `Decimal` is always normalized: the mantissa carries no trailing zero
//!   digits and zero is represented as `0e0`. Two `Decimal`s are equal if and
//!   only if they denote the same rational number, so derived `Eq`/`Hash` are
//!   numeric equality.
//! - No operation overflows. Divisibility never materializes `10^k` for the
//!   exponent gap `k`; it works modulo the divisor's mantissa.

use std::str::FromStr;

use num_bigint::{BigInt, BigUint};
use num_traits::Zero;
use serde_json::Number;

use crate::error::ParseDecimalError;

/// A normalized base-10 number: `mantissa * 10^exponent`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Decimal {
    mantissa: BigInt,
    exponent: i64,
}

impl Decimal {
    /// The number zero.
    pub fn zero() -> Self {
        Self {
            mantissa: BigInt::zero(),
            exponent: 0,
        }
    }

    /// Build a normalized decimal from a mantissa and a base-10 exponent.
    pub fn new(mantissa: impl Into<BigInt>, mut exponent: i64) -> Self {
        let mut mantissa = mantissa.into();
        if mantissa.is_zero() {
            return Self::zero();
        }
        while (&mantissa % 10u32).is_zero() {
            mantissa /= 10u32;
            exponent = exponent.saturating_add(1);
        }
        Self { mantissa, exponent }
    }

    /// Convert a JSON number. Integers convert directly; floats go through
    /// their shortest round-trip decimal text.
    pub fn from_number(number: &Number) -> Option<Self> {
        if let Some(i) = number.as_i64() {
            return Some(Self::new(i, 0));
        }
        if let Some(u) = number.as_u64() {
            return Some(Self::new(u, 0));
        }
        number.to_string().parse().ok()
    }

    /// The normalized mantissa.
    pub fn mantissa(&self) -> &BigInt {
        &self.mantissa
    }

    /// The normalized base-10 exponent.
    pub fn exponent(&self) -> i64 {
        self.exponent
    }

    /// Returns true if the value is zero.
    pub fn is_zero(&self) -> bool {
        self.mantissa.is_zero()
    }

    /// Returns true if the value has no fractional part.
    pub fn is_integer(&self) -> bool {
        self.exponent >= 0
    }

    /// Returns `Some(true)` if `self` is an exact integer multiple of
    /// `divisor`, `None` if `divisor` is zero.
    pub fn is_multiple_of(&self, divisor: &Decimal) -> Option<bool> {
        if divisor.is_zero() {
            return None;
        }
        if self.is_zero() {
            return Some(true);
        }
        // self / divisor = (m1 / m2) * 10^gap. With a negative gap the
        // quotient needs 10 | m1, which normalization rules out.
        let gap = i128::from(self.exponent) - i128::from(divisor.exponent);
        let Ok(gap) = u128::try_from(gap) else {
            return Some(false);
        };
        let modulus = divisor.mantissa.magnitude();
        let scale = BigUint::from(10u32).modpow(&BigUint::from(gap), modulus);
        Some((self.mantissa.magnitude() * scale % modulus).is_zero())
    }
}

impl FromStr for Decimal {
    type Err = ParseDecimalError;

    /// Parse JSON number grammar: `-? digits (. digits)? ([eE] [+-]? digits)?`.
    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let err = || ParseDecimalError(text.to_string());

        let (negative, rest) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text),
        };
        let (significand, exponent_text) = match rest.find(|c: char| c == 'e' || c == 'E') {
            Some(at) => (&rest[..at], Some(&rest[at + 1..])),
            None => (rest, None),
        };
        let (int_part, frac_part) = significand.split_once('.').unwrap_or((significand, ""));
        if int_part.is_empty() {
            return Err(err());
        }
        let digits: String = int_part.chars().chain(frac_part.chars()).collect();
        if !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(err());
        }

        let exponent: i64 = match exponent_text {
            Some(e) => e.parse().map_err(|_| err())?,
            None => 0,
        };
        let frac_len = i64::try_from(frac_part.len()).map_err(|_| err())?;

        // Strip trailing zeros on the text so huge literals normalize in one pass.
        let significant = digits.trim_end_matches('0');
        if significant.trim_start_matches('0').is_empty() {
            return Ok(Self::zero());
        }
        let zeros = i64::try_from(digits.len() - significant.len()).map_err(|_| err())?;
        let exponent = exponent
            .checked_sub(frac_len)
            .and_then(|e| e.checked_add(zeros))
            .ok_or_else(err)?;

        let mut mantissa: BigInt = significant.parse().map_err(|_| err())?;
        if negative {
            mantissa = -mantissa;
        }
        Ok(Self { mantissa, exponent })
    }
}
