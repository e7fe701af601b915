//! Exchange-rate encoding shared by offers and the strand executor's
//! quality-ordering pass.
//!
//! A `Quality` packs `mantissa × 10^exponent` into a single `u64` the way
//! rippled's own rate representation does: the top byte holds
//! `exponent + 100` (keeping it non-negative across the representable
//! exponent range) and the low 56 bits hold the canonical mantissa — which
//! fits, since the largest canonical mantissa (`1e16 - 1`) is well under
//! `2^56`. Packing into a single integer is what lets the strand executor
//! sort/compare qualities with ordinary integer comparison instead of
//! decimal arithmetic.

use serde::{Deserialize, Serialize};

use crate::amount::{Amount, AmountError};

const EXPONENT_BIAS: i64 = 100;
const MANTISSA_BITS: u32 = 56;
const MANTISSA_MASK: u64 = (1u64 << MANTISSA_BITS) - 1;

/// The neutral quality (`1.0`): every unit in produces a unit out.
pub const QUALITY_ONE: Quality = Quality(((EXPONENT_BIAS as u64) << MANTISSA_BITS) | 1_000_000_000_000_000);

/// A packed `mantissa × 10^exponent` exchange rate (`amount_out / amount_in`).
///
/// Ordered the same direction as the ratio it encodes: a strand consuming
/// offers in quality order iterates qualities from greatest to least to get
/// the best rate first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Quality(u64);

impl Quality {
    pub fn from_raw(raw: u64) -> Self {
        Quality(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }

    fn mantissa(&self) -> i64 {
        (self.0 & MANTISSA_MASK) as i64
    }

    fn exponent(&self) -> i32 {
        ((self.0 >> MANTISSA_BITS) as i64 - EXPONENT_BIAS) as i32
    }

    fn from_canonical(mantissa: i64, exponent: i32) -> Self {
        let biased = (exponent as i64 + EXPONENT_BIAS) as u64;
        Quality((biased << MANTISSA_BITS) | (mantissa as u64 & MANTISSA_MASK))
    }

    /// Encodes the rate `amount_out / amount_in`.
    ///
    /// Native amounts are treated as `(drops, exponent=0)` directly — never
    /// re-canonicalized through the issued-currency mantissa range — before
    /// the ratio is computed, so `compose` stays associative across strands
    /// that mix native and issued steps.
    pub fn from_amounts(amount_out: &Amount, amount_in: &Amount) -> Result<Self, AmountError> {
        let quotient = amount_out.div_round(amount_in, true)?;
        let (mantissa, exponent) = decimal_parts(&quotient);
        let (mantissa, exponent) =
            crate::amount::canonicalize_for_quality(mantissa, exponent)?;
        Ok(Quality::from_canonical(mantissa, exponent))
    }

    /// Composes two qualities along a strand: the quality of going through
    /// both steps back-to-back is the product of their individual
    /// qualities.
    pub fn compose(&self, other: &Quality) -> Result<Self, AmountError> {
        let a = self.mantissa() as i128;
        let b = other.mantissa() as i128;
        let product = a * b;
        // product has up to 32 significant digits; dividing by 1e14 (half
        // the mantissa width) brings it back near the 16-digit range in one
        // rounding step before final canonicalization.
        let divisor = 100_000_000_000_000i128;
        let quotient = product / divisor;
        let remainder = product % divisor;
        let rounded = if remainder != 0 { quotient + 1 } else { quotient };
        let exponent = self.exponent() as i64 + other.exponent() as i64 + 14;
        let negative = rounded < 0;
        let (mantissa, exponent) = crate::amount::canonical::canonicalize_i128_wide(
            rounded.unsigned_abs(),
            exponent,
            negative,
            true,
        )?;
        Ok(Quality::from_canonical(mantissa, exponent))
    }

    /// One quality unit above `self` — the smallest quality strictly better
    /// than this one, used to detect when a partial offer fill has
    /// exhausted the book at this rate.
    pub fn increment(&self) -> Self {
        if self.mantissa() < i64::MAX {
            Quality(self.0 + 1)
        } else {
            *self
        }
    }

    /// Caps `amount_out` so that, combined with `amount_in`, the implied
    /// quality does not exceed `self`. Used when a book step's offer would
    /// otherwise cross at a better rate than its stated quality allows.
    pub fn ceil_out(&self, amount_in: &Amount, amount_out_template: &Amount) -> Result<Amount, AmountError> {
        let quality_amount = self.as_amount();
        let capped = amount_in.mul_round(&quality_amount, false)?;
        capped.retagged_as(amount_out_template, false)
    }

    /// Caps `amount_in` so that, combined with `amount_out`, the implied
    /// quality does not exceed `self` (non-strict: equality is allowed).
    pub fn ceil_in(&self, amount_out: &Amount, amount_in_template: &Amount) -> Result<Amount, AmountError> {
        let quality_amount = self.as_amount();
        let capped = amount_out.div_round(&quality_amount, true)?;
        capped.retagged_as(amount_in_template, true)
    }

    /// As [`Quality::ceil_in`], but the resulting quality must be strictly
    /// better than `self` rather than merely not worse — used when an
    /// offer's quality must not be matched exactly (self-cross avoidance).
    pub fn ceil_in_strict(&self, amount_out: &Amount, amount_in_template: &Amount) -> Result<Amount, AmountError> {
        let capped = self.ceil_in(amount_out, amount_in_template)?;
        let implied = Quality::from_amounts(amount_out, &capped)?;
        if implied >= *self {
            // Nudge one quality-unit worse so the strict inequality holds.
            let nudged = self.increment();
            return nudged.ceil_in(amount_out, amount_in_template);
        }
        Ok(capped)
    }

    fn as_amount(&self) -> Amount {
        // A dimensionless rate, represented as a native-shaped amount
        // purely so the Amount arithmetic helpers can be reused; the
        // result of multiplying/dividing by it is never itself treated as
        // a standalone native amount.
        Amount::Issued {
            mantissa: self.mantissa(),
            exponent: self.exponent(),
            issue: crate::types::Issue::native(),
        }
    }
}

fn decimal_parts(amount: &Amount) -> (i64, i32) {
    match amount {
        Amount::Native(drops) => (*drops, 0),
        Amount::Issued {
            mantissa, exponent, ..
        } => (*mantissa, *exponent),
    }
}
