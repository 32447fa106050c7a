//! Decimal rendering of arbitrary-precision rationals
//!
//! NUMERIC and BIGNUMERIC cells arrive as exact rationals. Values whose
//! decimal expansion terminates are rendered exactly with the fewest
//! fractional digits; anything else is rounded to the type's scale.

use num_bigint::BigUint;
use num_integer::Integer;
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};

/// Fractional digits of NUMERIC
pub const NUMERIC_SCALE_DIGITS: usize = 9;

/// Fractional digits of BIGNUMERIC
pub const BIGNUMERIC_SCALE_DIGITS: usize = 38;

/// Number of fractional digits needed to write `value` exactly, or `None`
/// if its decimal expansion does not terminate.
///
/// A reduced fraction terminates iff its denominator is `2^a * 5^b`; the
/// expansion then needs `max(a, b)` digits.
pub fn exact_fraction_digits(value: &BigRational) -> Option<usize> {
    let mut denom = value.denom().magnitude().clone();

    let twos = denom.trailing_zeros().unwrap_or(0);
    denom >>= twos;

    let five = BigUint::from(5u32);
    let mut fives = 0usize;
    while !denom.is_one() {
        let (quotient, remainder) = denom.div_rem(&five);
        if !remainder.is_zero() {
            return None;
        }
        denom = quotient;
        fives += 1;
    }

    Some((twos as usize).max(fives))
}

/// Render `value` with exactly `prec` fractional digits, rounding the last
/// digit to nearest with halves away from zero. No decimal point is written
/// when `prec` is zero.
pub fn float_string(value: &BigRational, prec: usize) -> String {
    let numer = value.numer();
    let denom = value.denom().magnitude();

    let (mut whole, remainder) = numer.magnitude().div_rem(denom);
    let scale = num_traits::pow(BigUint::from(10u32), prec);

    let (mut fraction, rest) = (remainder * &scale).div_rem(denom);
    if denom <= &(rest << 1u32) {
        fraction += 1u32;
        if fraction >= scale {
            whole += 1u32;
            fraction -= &scale;
        }
    }

    let mut out = String::new();
    if numer.is_negative() {
        out.push('-');
    }
    out.push_str(&whole.to_string());
    if prec > 0 {
        let digits = fraction.to_string();
        out.push('.');
        for _ in digits.len()..prec {
            out.push('0');
        }
        out.push_str(&digits);
    }
    out
}

/// Exact rendering when possible, otherwise `max_scale` fractional digits
pub fn rational_string(value: &BigRational, max_scale: usize) -> String {
    let prec = exact_fraction_digits(value).unwrap_or(max_scale);
    float_string(value, prec)
}

/// Render a NUMERIC value
#[inline]
pub fn numeric_string(value: &BigRational) -> String {
    rational_string(value, NUMERIC_SCALE_DIGITS)
}

/// Render a BIGNUMERIC value
#[inline]
pub fn bignumeric_string(value: &BigRational) -> String {
    rational_string(value, BIGNUMERIC_SCALE_DIGITS)
}
