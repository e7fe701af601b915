//! Canonicalization: normalizing an issued-currency mantissa back into
//! `[1e15, 1e16)` after an arithmetic operation has pushed it out of range.
//!
//! The discipline throughout this crate is: compute the full-precision
//! numerator and denominator first, then apply exactly one rounding
//! division at the end. Never chain truncating divisions — each one loses
//! up to a full unit in the last place, and a strand's two-pass algorithm
//! can compound that loss into a visible rounding bug.

use super::AmountError;

/// Smallest canonical mantissa (`1e15`).
pub const MIN_MANTISSA: i64 = 1_000_000_000_000_000;
/// Largest canonical mantissa (`1e16 - 1`).
pub const MAX_MANTISSA: i64 = 9_999_999_999_999_999;
/// Smallest representable exponent.
pub const MIN_EXPONENT: i32 = -96;
/// Largest representable exponent.
pub const MAX_EXPONENT: i32 = 80;
/// Significant digits carried by a canonical mantissa.
pub const PRECISION_DIGITS: usize = 16;

pub(crate) fn num_digits(mut x: u128) -> u32 {
    if x == 0 {
        return 1;
    }
    let mut digits = 0;
    while x > 0 {
        digits += 1;
        x /= 10;
    }
    digits
}

fn check_exponent(exponent: i64) -> Result<i32, AmountError> {
    if exponent < MIN_EXPONENT as i64 || exponent > MAX_EXPONENT as i64 {
        Err(AmountError::Overflow)
    } else {
        Ok(exponent as i32)
    }
}

/// Canonicalizes a signed `i64` mantissa/exponent pair, as produced directly
/// by a caller (e.g. `Amount::issued`).
pub fn canonicalize(mantissa: i64, exponent: i32, round_up: bool) -> Result<(i64, i32), AmountError> {
    if mantissa == 0 {
        return Ok((0, 0));
    }
    let negative = mantissa < 0;
    canonicalize_i128_wide(mantissa.unsigned_abs() as u128, exponent as i64, negative, round_up)
}

/// Canonicalizes a `u128` magnitude with an `i32`-range exponent. Used by
/// callers that already did their own wide-integer arithmetic and have a
/// magnitude that may be far outside `[1e15, 1e16)`.
pub fn canonicalize_i128(
    magnitude: u128,
    exponent: i32,
    negative: bool,
    round_up: bool,
) -> Result<(i64, i32), AmountError> {
    canonicalize_i128_wide(magnitude, exponent as i64, negative, round_up)
}

/// Canonicalizes a `u128` magnitude with an `i64`-range exponent (an
/// intermediate value before range-checking), rounding on the single
/// division this requires to shed excess digits.
pub fn canonicalize_i128_wide(
    mut magnitude: u128,
    mut exponent: i64,
    negative: bool,
    round_up: bool,
) -> Result<(i64, i32), AmountError> {
    if magnitude == 0 {
        return Ok((0, 0));
    }

    let digits = num_digits(magnitude);
    let target = PRECISION_DIGITS as u32;

    if digits < target {
        let shift = target - digits;
        magnitude *= 10u128.pow(shift);
        exponent -= shift as i64;
    } else if digits > target {
        let shift = digits - target;
        let divisor = 10u128.pow(shift);
        let quotient = magnitude / divisor;
        let remainder = magnitude % divisor;
        magnitude = if remainder != 0 && round_up {
            quotient + 1
        } else {
            quotient
        };
        exponent += shift as i64;
        // Rounding up a run of 9s can push the mantissa to 1e16 exactly;
        // shed one more digit rather than re-looping.
        if magnitude > MAX_MANTISSA as u128 {
            magnitude /= 10;
            exponent += 1;
        }
    }

    let exponent = check_exponent(exponent)?;
    let mantissa = i64::try_from(magnitude).map_err(|_| AmountError::Overflow)?;
    Ok((if negative { -mantissa } else { mantissa }, exponent))
}

/// Rescales a canonical mantissa/exponent pair to exponent `0`, as required
/// for a native (drops) result of a cross-currency multiplication or
/// division. Rounds on the single division this requires when `exponent`
/// is negative.
pub fn rescale_to_exponent_zero(mantissa: i64, exponent: i32, round_up: bool) -> Result<i64, AmountError> {
    if exponent == 0 {
        return Ok(mantissa);
    }
    let negative = mantissa < 0;
    let magnitude = mantissa.unsigned_abs() as u128;

    let magnitude = if exponent > 0 {
        let factor = 10u128.checked_pow(exponent as u32).ok_or(AmountError::Overflow)?;
        magnitude.checked_mul(factor).ok_or(AmountError::Overflow)?
    } else {
        let divisor = 10u128.pow((-exponent) as u32);
        let quotient = magnitude / divisor;
        let remainder = magnitude % divisor;
        if remainder != 0 && round_up {
            quotient + 1
        } else {
            quotient
        }
    };

    let signed = i64::try_from(magnitude).map_err(|_| AmountError::Overflow)?;
    Ok(if negative { -signed } else { signed })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn pads_small_mantissa_up_to_minimum() {
        let (mantissa, exponent) = canonicalize(1, 0, true).unwrap();
        assert_eq!(mantissa, MIN_MANTISSA);
        assert_eq!(exponent, -15);
    }

    #[test]
    fn shrinks_large_mantissa_with_rounding() {
        // 99999999999999995 has 17 digits; dropping one digit rounds up.
        let (mantissa, exponent) = canonicalize_i128(99_999_999_999_999_995, 0, false, true).unwrap();
        assert!(mantissa <= MAX_MANTISSA);
        assert_eq!(exponent, 1);
    }

    #[test]
    fn rejects_exponent_out_of_range() {
        assert_eq!(canonicalize(1, 100, true), Err(AmountError::Overflow));
        assert_eq!(canonicalize(1, -200, true), Err(AmountError::Overflow));
    }

    #[test]
    fn rescale_rounds_down_fraction() {
        let drops = rescale_to_exponent_zero(1_000_000_000_000_000, -14, true).unwrap();
        assert_eq!(drops, 100);
    }
}
