//! Exact arithmetic over the two value kinds a strand moves: native drops
//! and issued-currency mantissa/exponent pairs.
//!
//! Every operation here is closed-form: no floating point anywhere in the
//! crate, and every intermediate is a `u128`/`i128` computed once, with
//! rounding applied on the single final division rather than accumulated
//! across repeated truncating divides. That discipline is what keeps a
//! strand's reverse and forward passes from drifting apart by more than one
//! unit in the last place.

pub(crate) mod canonical;

use core::cmp::Ordering;
use serde::{Deserialize, Serialize};
use thiserror_no_std::Error;

use crate::types::Issue;

pub use canonical::{MAX_EXPONENT, MAX_MANTISSA, MIN_EXPONENT, MIN_MANTISSA};

#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
#[non_exhaustive]
pub enum AmountError {
    #[error("issued-currency mantissa/exponent out of representable range")]
    Overflow,
    #[error("division by zero")]
    DivideByZero,
    #[error("amounts belong to different issues and cannot be combined")]
    IssueMismatch,
    #[error("expected a native amount")]
    NotNative,
}

#[cfg(feature = "std")]
impl std::error::Error for AmountError {}

/// A value moved through a strand: native XRP (in drops) or an issued
/// currency (mantissa × 10^exponent, scoped to an issue).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Amount {
    Native(i64),
    Issued {
        mantissa: i64,
        exponent: i32,
        issue: Issue,
    },
}

impl Amount {
    pub fn native(drops: i64) -> Self {
        Amount::Native(drops)
    }

    /// Builds an issued amount, canonicalizing the mantissa into
    /// `[1e15, 1e16)` (or exactly zero) and checking the exponent range.
    pub fn issued(mantissa: i64, exponent: i32, issue: Issue) -> Result<Self, AmountError> {
        let (mantissa, exponent) = canonical::canonicalize(mantissa, exponent, true)?;
        Ok(Amount::Issued {
            mantissa,
            exponent,
            issue,
        })
    }

    pub fn zero_native() -> Self {
        Amount::Native(0)
    }

    pub fn zero_issued(issue: Issue) -> Self {
        Amount::Issued {
            mantissa: 0,
            exponent: 0,
            issue,
        }
    }

    /// A zero amount over the same issue as `self`.
    pub fn zero_like(&self) -> Self {
        match self {
            Amount::Native(_) => Amount::Native(0),
            Amount::Issued { issue, .. } => Amount::zero_issued(*issue),
        }
    }

    /// This amount's drops, if it is native.
    pub fn native_drops(&self) -> Result<i64, AmountError> {
        match self {
            Amount::Native(drops) => Ok(*drops),
            Amount::Issued { .. } => Err(AmountError::NotNative),
        }
    }

    pub fn issue(&self) -> Issue {
        match self {
            Amount::Native(_) => Issue::native(),
            Amount::Issued { issue, .. } => *issue,
        }
    }

    pub fn is_native(&self) -> bool {
        matches!(self, Amount::Native(_))
    }

    pub fn is_zero(&self) -> bool {
        match self {
            Amount::Native(drops) => *drops == 0,
            Amount::Issued { mantissa, .. } => *mantissa == 0,
        }
    }

    pub fn is_negative(&self) -> bool {
        match self {
            Amount::Native(drops) => *drops < 0,
            Amount::Issued { mantissa, .. } => *mantissa < 0,
        }
    }

    pub fn signum(&self) -> i32 {
        match self {
            Amount::Native(drops) => drops.signum() as i32,
            Amount::Issued { mantissa, .. } => mantissa.signum() as i32,
        }
    }

    pub fn negate(&self) -> Self {
        match self {
            Amount::Native(drops) => Amount::Native(-drops),
            Amount::Issued {
                mantissa,
                exponent,
                issue,
            } => Amount::Issued {
                mantissa: -mantissa,
                exponent: *exponent,
                issue: *issue,
            },
        }
    }

    /// Re-expresses this amount's decimal value in the shape of `template`
    /// (native drops, rounded to a whole number, or an issued amount tagged
    /// with `template`'s issue). Used where a rate computation produces a
    /// bare decimal magnitude that must be re-tagged as a specific leg of a
    /// strand (e.g. a quality-capped output amount).
    pub fn retagged_as(&self, template: &Amount, round_up: bool) -> Result<Amount, AmountError> {
        let (mantissa, exponent) = self.as_signed_decimal();
        match template {
            Amount::Native(_) => {
                let (mantissa, exponent) =
                    canonical::canonicalize(i64::try_from(mantissa).map_err(|_| AmountError::Overflow)?, exponent, round_up)?;
                let drops = canonical::rescale_to_exponent_zero(mantissa, exponent, round_up)?;
                Ok(Amount::Native(drops))
            }
            Amount::Issued { issue, .. } => {
                let (mantissa, exponent) =
                    canonical::canonicalize(i64::try_from(mantissa).map_err(|_| AmountError::Overflow)?, exponent, round_up)?;
                Ok(Amount::Issued {
                    mantissa,
                    exponent,
                    issue: *issue,
                })
            }
        }
    }

    fn same_issue(&self, other: &Amount) -> bool {
        match (self, other) {
            (Amount::Native(_), Amount::Native(_)) => true,
            (
                Amount::Issued { issue: a, .. },
                Amount::Issued { issue: b, .. },
            ) => a.same_issue(b),
            _ => false,
        }
    }

    /// Decimal digit-string components used by addition/subtraction/compare:
    /// `(signed_mantissa, exponent)`, with native drops treated as
    /// `(drops, 0)` so the same 128-bit path handles both kinds.
    fn as_signed_decimal(&self) -> (i128, i32) {
        match self {
            Amount::Native(drops) => (*drops as i128, 0),
            Amount::Issued {
                mantissa, exponent, ..
            } => (*mantissa as i128, *exponent),
        }
    }

    pub fn add(&self, other: &Amount) -> Result<Amount, AmountError> {
        if !self.same_issue(other) {
            return Err(AmountError::IssueMismatch);
        }
        let (a_mantissa, a_exp) = self.as_signed_decimal();
        let (b_mantissa, b_exp) = other.as_signed_decimal();
        let exp = a_exp.min(b_exp);
        let a_scaled = scale_up(a_mantissa, a_exp - exp);
        let b_scaled = scale_up(b_mantissa, b_exp - exp);
        let sum = a_scaled + b_scaled;

        match self {
            Amount::Native(_) => {
                let drops = i64::try_from(sum).map_err(|_| AmountError::Overflow)?;
                Ok(Amount::Native(drops))
            }
            Amount::Issued { issue, .. } => {
                if sum == 0 {
                    return Ok(Amount::zero_issued(*issue));
                }
                let negative = sum < 0;
                let (mantissa, exponent) =
                    canonical::canonicalize_i128(sum.unsigned_abs(), exp, negative, true)?;
                Ok(Amount::Issued {
                    mantissa,
                    exponent,
                    issue: *issue,
                })
            }
        }
    }

    pub fn sub(&self, other: &Amount) -> Result<Amount, AmountError> {
        self.add(&other.negate())
    }

    pub fn compare(&self, other: &Amount) -> Result<Ordering, AmountError> {
        if !self.same_issue(other) {
            return Err(AmountError::IssueMismatch);
        }
        let (a_mantissa, a_exp) = self.as_signed_decimal();
        let (b_mantissa, b_exp) = other.as_signed_decimal();
        let exp = a_exp.min(b_exp);
        let a_scaled = scale_up(a_mantissa, a_exp - exp);
        let b_scaled = scale_up(b_mantissa, b_exp - exp);
        Ok(a_scaled.cmp(&b_scaled))
    }

    /// Scales `self` by the exact ratio `numerator / denominator`, rounding
    /// at the single final division. `round_up` rounds away from zero
    /// (used on the reverse pass, where under-delivering breaks the
    /// strand's exactness invariant); otherwise rounds toward zero.
    pub fn mul_ratio(
        &self,
        numerator: u64,
        denominator: u64,
        round_up: bool,
    ) -> Result<Amount, AmountError> {
        if denominator == 0 {
            return Err(AmountError::DivideByZero);
        }
        if numerator == 0 || self.is_zero() {
            return Ok(self.zero_like());
        }
        let (mantissa, exponent) = self.as_signed_decimal();
        let negative = mantissa < 0;
        let magnitude = mantissa.unsigned_abs();

        let product = magnitude * numerator as u128;
        let quotient = product / denominator as u128;
        let remainder = product % denominator as u128;
        let rounded = if remainder != 0 && round_up {
            quotient + 1
        } else {
            quotient
        };

        match self {
            Amount::Native(_) => {
                let signed = if negative { -(rounded as i128) } else { rounded as i128 };
                let drops = i64::try_from(signed).map_err(|_| AmountError::Overflow)?;
                Ok(Amount::Native(drops))
            }
            Amount::Issued { issue, .. } => {
                if rounded == 0 {
                    return Ok(Amount::zero_issued(*issue));
                }
                let (mantissa, exponent) =
                    canonical::canonicalize_i128(rounded, exponent, negative, round_up)?;
                Ok(Amount::Issued {
                    mantissa,
                    exponent,
                    issue: *issue,
                })
            }
        }
    }

    /// `self * rhs`, exact product canonicalized with a single rounding
    /// division. Used for `quality × amount` conversions.
    pub fn mul_round(&self, rhs: &Amount, round_up: bool) -> Result<Amount, AmountError> {
        let (a_mantissa, a_exp) = self.as_signed_decimal();
        let (b_mantissa, b_exp) = rhs.as_signed_decimal();
        if a_mantissa == 0 || b_mantissa == 0 {
            return Ok(self.zero_like());
        }
        let negative = (a_mantissa < 0) ^ (b_mantissa < 0);
        let product = a_mantissa.unsigned_abs() * b_mantissa.unsigned_abs();
        let exponent = a_exp as i64 + b_exp as i64;

        match self {
            Amount::Native(_) => {
                let (mantissa, final_exp) =
                    canonical::canonicalize_i128_wide(product, exponent, negative, round_up)?;
                // A native result must land at exponent 0 (whole drops).
                let drops = canonical::rescale_to_exponent_zero(mantissa, final_exp, round_up)?;
                Ok(Amount::Native(drops))
            }
            Amount::Issued { issue, .. } => {
                let (mantissa, final_exp) =
                    canonical::canonicalize_i128_wide(product, exponent, negative, round_up)?;
                Ok(Amount::Issued {
                    mantissa,
                    exponent: final_exp,
                    issue: *issue,
                })
            }
        }
    }

    /// `self / rhs`, exact quotient canonicalized with a single rounding
    /// division.
    pub fn div_round(&self, rhs: &Amount, round_up: bool) -> Result<Amount, AmountError> {
        let (a_mantissa, a_exp) = self.as_signed_decimal();
        let (b_mantissa, b_exp) = rhs.as_signed_decimal();
        if b_mantissa == 0 {
            return Err(AmountError::DivideByZero);
        }
        if a_mantissa == 0 {
            return Ok(self.zero_like());
        }
        let negative = (a_mantissa < 0) ^ (b_mantissa < 0);
        let a_magnitude = a_mantissa.unsigned_abs();
        let b_magnitude = b_mantissa.unsigned_abs();
        // Scale the numerator up before dividing so the quotient keeps at
        // least `PRECISION_DIGITS` significant digits no matter how the two
        // operands' magnitudes compare (a native amount's mantissa can run
        // to 19 digits, far past an issued mantissa's fixed 16), while
        // staying within what `u128` can hold. A fixed scale sized for the
        // worst case of both operands at once overflows; this scale tracks
        // the operands' actual digit counts instead.
        let a_digits = canonical::num_digits(a_magnitude) as i64;
        let b_digits = canonical::num_digits(b_magnitude) as i64;
        let guard_digits = canonical::PRECISION_DIGITS as i64 + 2;
        let scale = (guard_digits + b_digits - a_digits).max(0) as u32;
        let scaled_numerator = a_magnitude * 10u128.pow(scale);
        let denominator = b_magnitude;
        let quotient = scaled_numerator / denominator;
        let remainder = scaled_numerator % denominator;
        let rounded = if remainder != 0 && round_up {
            quotient + 1
        } else {
            quotient
        };
        let exponent = a_exp as i64 - b_exp as i64 - scale as i64;

        match self {
            Amount::Native(_) => {
                let (mantissa, final_exp) =
                    canonical::canonicalize_i128_wide(rounded, exponent, negative, round_up)?;
                let drops = canonical::rescale_to_exponent_zero(mantissa, final_exp, round_up)?;
                Ok(Amount::Native(drops))
            }
            Amount::Issued { issue, .. } => {
                let (mantissa, final_exp) =
                    canonical::canonicalize_i128_wide(rounded, exponent, negative, round_up)?;
                Ok(Amount::Issued {
                    mantissa,
                    exponent: final_exp,
                    issue: *issue,
                })
            }
        }
    }
}

/// Canonicalizes a raw `(mantissa, exponent)` pair the way [`Quality`]
/// encoding needs: always rounding up, since a quality that understates the
/// true rate would let a strand accept a worse price than an offer
/// actually offers.
///
/// [`Quality`]: crate::quality::Quality
pub fn canonicalize_for_quality(mantissa: i64, exponent: i32) -> Result<(i64, i32), AmountError> {
    canonical::canonicalize(mantissa, exponent, true)
}

/// Scales a signed mantissa up by `shift` decimal places (shift is always
/// >= 0 by construction at call sites — the smaller exponent is the base).
fn scale_up(mantissa: i128, shift: i32) -> i128 {
    if shift <= 0 {
        mantissa
    } else {
        mantissa * 10i128.pow(shift as u32)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn usd_issue() -> Issue {
        use crate::types::{AccountId, Currency};
        let issuer = AccountId::from_classic_address("r9cZA1mLK5R5Am25ArfXFmqgNwjZgnfk59").unwrap();
        Issue::issued(Currency::iso("USD").unwrap(), issuer)
    }

    #[test]
    fn canonicalizes_into_range() {
        let issue = usd_issue();
        let amount = Amount::issued(1, 0, issue).unwrap();
        match amount {
            Amount::Issued { mantissa, exponent, .. } => {
                assert_eq!(mantissa, 1_000_000_000_000_000);
                assert_eq!(exponent, -15);
            }
            _ => panic!("expected issued"),
        }
    }

    #[test]
    fn add_same_issue() {
        let issue = usd_issue();
        let a = Amount::issued(1_000_000_000_000_000, -15, issue).unwrap(); // 1.0
        let b = Amount::issued(2_000_000_000_000_000, -15, issue).unwrap(); // 2.0
        let sum = a.add(&b).unwrap();
        assert_eq!(sum.compare(&Amount::issued(3_000_000_000_000_000, -15, issue).unwrap()).unwrap(), Ordering::Equal);
    }

    #[test]
    fn add_different_issue_errors() {
        let issue_a = usd_issue();
        use crate::types::{AccountId, Currency};
        let other_issuer = AccountId::from_classic_address("rpZc4mVfWUif9CRoHRKKcmhu1nx2xktxBo").unwrap();
        let issue_b = Issue::issued(Currency::iso("EUR").unwrap(), other_issuer);
        let a = Amount::issued(1_000_000_000_000_000, -15, issue_a).unwrap();
        let b = Amount::issued(1_000_000_000_000_000, -15, issue_b).unwrap();
        assert_eq!(a.add(&b), Err(AmountError::IssueMismatch));
    }

    #[test]
    fn mul_ratio_rounds_up() {
        let amount = Amount::native(10);
        let scaled = amount.mul_ratio(1, 3, true).unwrap();
        assert_eq!(scaled, Amount::Native(4));
        let scaled_down = amount.mul_ratio(1, 3, false).unwrap();
        assert_eq!(scaled_down, Amount::Native(3));
    }

    #[test]
    fn zero_is_zero_regardless_of_exponent() {
        let issue = usd_issue();
        let amount = Amount::issued(0, 50, issue).unwrap();
        assert!(amount.is_zero());
    }

    #[test]
    fn negate_flips_sign_only() {
        let amount = Amount::native(42);
        assert_eq!(amount.negate(), Amount::Native(-42));
        assert_eq!(amount.negate().negate(), amount);
    }
}
