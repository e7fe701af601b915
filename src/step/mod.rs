//! The uniform step contract (§ step interface) and the tagged-variant
//! dispatch (`StepKind`) the strand executor drives every step kind
//! through. Tagged variants are used instead of open-ended dynamic
//! dispatch: a strand is a short, linear `Vec<StepKind>` and every step is
//! small enough to be value-owned by it.

pub mod book;
pub mod direct;
pub mod endpoint;

use core::cmp::Ordering;

use hashbrown::HashSet;

use crate::amount::Amount;
use crate::error::FlowError;
use crate::ledger::{LedgerKey, Sandbox, View};

pub use book::BookStep;
pub use direct::DirectStep;
pub use endpoint::EndpointStep;

/// Whether a step reduces (`Redeems`) or creates (`Issues`) outstanding
/// issuer debt. Drives transfer-fee applicability in neighboring steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebtDirection {
    Redeems,
    Issues,
}

/// Keys of offers identified for removal (expired, unfunded, self-crossed)
/// during this payment. Owned by the driver, threaded by reference into
/// every strand; a strand may insert but never needs to read another
/// strand's insertions within one payment.
pub type OffersToRemove = HashSet<LedgerKey>;

/// The operation table every step kind presents.
pub trait Step {
    /// Work backward: given a desired `out`, mutate `sb` to reflect the
    /// minimum ledger state necessary, returning the `in` actually required
    /// to deliver the `out` actually produced (which may be less than
    /// requested if this step is limiting).
    fn rev(
        &mut self,
        sb: &mut Sandbox,
        af_view: &dyn View,
        offers_to_remove: &mut OffersToRemove,
        out: Amount,
    ) -> Result<(Amount, Amount), FlowError>;

    /// Work forward from an `in`; `inActual <= in`, and `outActual` is
    /// monotone in `in` and never exceeds the cached `out` from a prior
    /// `rev`.
    fn fwd(
        &mut self,
        sb: &mut Sandbox,
        af_view: &dyn View,
        offers_to_remove: &mut OffersToRemove,
        in_amount: Amount,
    ) -> Result<(Amount, Amount), FlowError>;

    fn cached_in(&self) -> Option<Amount>;
    fn cached_out(&self) -> Option<Amount>;

    /// Discards this step's cache — called by the strand executor as part
    /// of an inline sandbox reset, since a reset sandbox generation makes
    /// every cached `(in, out)` stale.
    fn clear_cache(&mut self);

    fn debt_direction(&self, sb: &Sandbox, strand_direction: DebtDirection) -> DebtDirection;

    /// Best-case rate for this step in isolation, used by the driver to
    /// order strands. `None` means the step has no visible liquidity at
    /// all (the strand is dry through here).
    fn quality_upper_bound(
        &self,
        sb: &Sandbox,
        prev_step_debt_dir: DebtDirection,
    ) -> Option<(crate::quality::Quality, DebtDirection)>;

    /// Sanity check for the forward pass after a reset: does not mutate
    /// the sandbox.
    fn valid_fwd(&self, sb: &Sandbox, af_view: &dyn View, in_amount: Amount) -> (bool, Amount);

    fn offers_used(&self) -> u32;
    fn inactive(&self) -> bool;
}

/// Clamps `value` to be no greater than `ceiling` (same issue required).
pub(crate) fn min_amount(value: Amount, ceiling: Amount) -> Amount {
    match value.compare(&ceiling) {
        Ok(Ordering::Greater) => ceiling,
        _ => value,
    }
}

/// One node in a strand: tagged-variant dispatch over the three step
/// kinds rather than a trait object, since a strand is always a short,
/// fully-known-at-construction-time sequence.
pub enum StepKind {
    Endpoint(EndpointStep),
    Direct(DirectStep),
    Book(BookStep),
}

impl Step for StepKind {
    fn rev(
        &mut self,
        sb: &mut Sandbox,
        af_view: &dyn View,
        offers_to_remove: &mut OffersToRemove,
        out: Amount,
    ) -> Result<(Amount, Amount), FlowError> {
        match self {
            StepKind::Endpoint(s) => s.rev(sb, af_view, offers_to_remove, out),
            StepKind::Direct(s) => s.rev(sb, af_view, offers_to_remove, out),
            StepKind::Book(s) => s.rev(sb, af_view, offers_to_remove, out),
        }
    }

    fn fwd(
        &mut self,
        sb: &mut Sandbox,
        af_view: &dyn View,
        offers_to_remove: &mut OffersToRemove,
        in_amount: Amount,
    ) -> Result<(Amount, Amount), FlowError> {
        match self {
            StepKind::Endpoint(s) => s.fwd(sb, af_view, offers_to_remove, in_amount),
            StepKind::Direct(s) => s.fwd(sb, af_view, offers_to_remove, in_amount),
            StepKind::Book(s) => s.fwd(sb, af_view, offers_to_remove, in_amount),
        }
    }

    fn cached_in(&self) -> Option<Amount> {
        match self {
            StepKind::Endpoint(s) => s.cached_in(),
            StepKind::Direct(s) => s.cached_in(),
            StepKind::Book(s) => s.cached_in(),
        }
    }

    fn cached_out(&self) -> Option<Amount> {
        match self {
            StepKind::Endpoint(s) => s.cached_out(),
            StepKind::Direct(s) => s.cached_out(),
            StepKind::Book(s) => s.cached_out(),
        }
    }

    fn clear_cache(&mut self) {
        match self {
            StepKind::Endpoint(s) => s.clear_cache(),
            StepKind::Direct(s) => s.clear_cache(),
            StepKind::Book(s) => s.clear_cache(),
        }
    }

    fn debt_direction(&self, sb: &Sandbox, strand_direction: DebtDirection) -> DebtDirection {
        match self {
            StepKind::Endpoint(s) => s.debt_direction(sb, strand_direction),
            StepKind::Direct(s) => s.debt_direction(sb, strand_direction),
            StepKind::Book(s) => s.debt_direction(sb, strand_direction),
        }
    }

    fn quality_upper_bound(
        &self,
        sb: &Sandbox,
        prev_step_debt_dir: DebtDirection,
    ) -> Option<(crate::quality::Quality, DebtDirection)> {
        match self {
            StepKind::Endpoint(s) => s.quality_upper_bound(sb, prev_step_debt_dir),
            StepKind::Direct(s) => s.quality_upper_bound(sb, prev_step_debt_dir),
            StepKind::Book(s) => s.quality_upper_bound(sb, prev_step_debt_dir),
        }
    }

    fn valid_fwd(&self, sb: &Sandbox, af_view: &dyn View, in_amount: Amount) -> (bool, Amount) {
        match self {
            StepKind::Endpoint(s) => s.valid_fwd(sb, af_view, in_amount),
            StepKind::Direct(s) => s.valid_fwd(sb, af_view, in_amount),
            StepKind::Book(s) => s.valid_fwd(sb, af_view, in_amount),
        }
    }

    fn offers_used(&self) -> u32 {
        match self {
            StepKind::Endpoint(s) => s.offers_used(),
            StepKind::Direct(s) => s.offers_used(),
            StepKind::Book(s) => s.offers_used(),
        }
    }

    fn inactive(&self) -> bool {
        match self {
            StepKind::Endpoint(s) => s.inactive(),
            StepKind::Direct(s) => s.inactive(),
            StepKind::Book(s) => s.inactive(),
        }
    }
}
