//! The result taxonomy the strand executor and flow driver report upward.
//!
//! Every internal fallibility (amount overflow, a malformed ledger object, a
//! step that cannot be constructed) is caught before it escapes a strand and
//! classified into one of these closed variants — callers never see a raw
//! `panic` or an open-ended string, only this enum plus whatever partial
//! [`crate::flow::FlowResult`] was produced before the failure.

use thiserror_no_std::Error;

use crate::amount::AmountError;

/// The outcome of attempting to execute one strand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ResultCode {
    /// The strand delivered the requested (or best-effort) amount.
    Success,
    /// The strand produced no liquidity at all; every step reported inactive
    /// or a quality-limit cut the strand off before any amount moved.
    PathDry,
    /// The strand delivered less than requested but more than zero, and
    /// partial payment was allowed.
    PathPartial,
    /// A step along the strand has no spendable balance.
    Unfunded,
    /// A direct step requires a trust line that does not exist and none may
    /// be auto-created for this strand position.
    NoLine,
    /// A trust line exists but the receiving side has not authorized it
    /// (`lsfRequireAuth` on the issuer's `AccountRoot`).
    NoAuth,
    /// Rippling through this trust line is blocked by `NoRipple`.
    NoRipple,
    /// An invariant the strand executor relies on was violated — a bug, not
    /// a liquidity condition. Never returned for ordinary unfunded/illiquid
    /// strands.
    Internal,
}

impl ResultCode {
    /// Whether this outcome moved any value at all.
    pub fn moved_value(&self) -> bool {
        matches!(self, ResultCode::Success | ResultCode::PathPartial)
    }
}

/// Top-level error surfaced by strand construction and execution.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FlowError {
    #[error("amount arithmetic error: {0}")]
    Amount(#[from] AmountError),
    #[error("strand is malformed: {0}")]
    MalformedStrand(&'static str),
    #[error("{0}")]
    Result(ResultCode),
}

#[cfg(feature = "std")]
impl std::error::Error for FlowError {}

impl core::fmt::Display for ResultCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            ResultCode::Success => "tesSUCCESS",
            ResultCode::PathDry => "tecPATH_DRY",
            ResultCode::PathPartial => "tecPATH_PARTIAL",
            ResultCode::Unfunded => "tecUNFUNDED_PAYMENT",
            ResultCode::NoLine => "tecNO_LINE",
            ResultCode::NoAuth => "tecNO_AUTH",
            ResultCode::NoRipple => "tecNO_RIPPLE",
            ResultCode::Internal => "tefINTERNAL",
        };
        write!(f, "{}", name)
    }
}
