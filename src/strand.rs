//! The two-pass reverse/forward executor that drives one strand to a
//! consistent, committable set of sandbox mutations.
//!
//! Steps mutate the sandbox during the reverse pass to model the transfer
//! they'd make for a (possibly too-optimistic) downstream output. When a
//! step turns out to be binding, every mutation recorded by steps evaluated
//! so far assumed a larger amount than will actually move — so the sandbox
//! is reset and the binding step re-run, then every step ahead of it is
//! driven forward from the binding step's actual output.

use alloc::vec::Vec;

use crate::amount::Amount;
use crate::error::FlowError;
use crate::flow::FlowOptions;
use crate::ledger::{Sandbox, View};
use crate::step::{OffersToRemove, Step, StepKind};

/// One ordered, nonempty chain of steps from a payment's source issue to its
/// destination issue. Adjacent steps are expected (by construction, not
/// enforced here) to agree on issue at their shared boundary.
pub struct Strand {
    steps: Vec<StepKind>,
}

/// What one strand execution produced.
pub struct StrandResult {
    pub success: bool,
    pub in_amount: Amount,
    pub out_amount: Amount,
    pub offers_used: u32,
    pub inactive: bool,
}

impl Strand {
    pub fn new(steps: Vec<StepKind>) -> Result<Self, FlowError> {
        if steps.is_empty() {
            return Err(FlowError::MalformedStrand("strand has no steps"));
        }
        Ok(Strand { steps })
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Pushes the payment-wide amendment gates and fee knobs down onto every
    /// book step in this strand, overriding whatever each step was built
    /// with. Called once per payment before any strand executes, so `flow`'s
    /// `options` argument is the single authority a caller needs to set.
    pub fn apply_flow_options(&mut self, options: FlowOptions) {
        for step in &mut self.steps {
            if let StepKind::Book(book) = step {
                book.fix_reduced_offers_v1 = options.fix_reduced_offers_v1;
                book.fix_reduced_offers_v2 = options.fix_reduced_offers_v2;
                book.owner_pays_transfer_fee = options.owner_pays_transfer_fee;
                book.parent_close_time = options.parent_close_time;
                book.default_path = options.default_path;
            }
        }
    }

    /// Best-case composed quality for this strand in isolation, used by the
    /// flow driver to order strands before spending execution budget on
    /// them. `None` if any step reports no visible liquidity.
    pub fn quality_upper_bound(&self, sb: &Sandbox, initial_direction: crate::step::DebtDirection) -> Option<crate::quality::Quality> {
        let mut direction = initial_direction;
        let mut composed: Option<crate::quality::Quality> = None;
        for step in &self.steps {
            let (quality, next_direction) = step.quality_upper_bound(sb, direction)?;
            direction = next_direction;
            composed = Some(match composed {
                Some(acc) => acc.compose(&quality).ok()?,
                None => quality,
            });
        }
        composed
    }

    /// Runs this strand against `sb` (caller-owned, typically a fresh child
    /// of the payment's base view) to deliver up to `requested_out`,
    /// optionally capped by `max_in`.
    pub fn execute(
        &mut self,
        sb: &mut Sandbox,
        af_view: &dyn View,
        offers_to_remove: &mut OffersToRemove,
        max_in: Option<Amount>,
        requested_out: Amount,
    ) -> Result<StrandResult, FlowError> {
        let len = self.steps.len();
        let mut limiting_step = len;
        let mut step_out = requested_out;
        let mut limit_step_out = requested_out;

        let mut ran_since_reset: Vec<usize> = Vec::new();

        let mut i = len;
        while i > 0 {
            i -= 1;
            let (actual_in, actual_out) = self.steps[i].rev(sb, af_view, offers_to_remove, step_out)?;
            ran_since_reset.push(i);

            if actual_out.is_zero() {
                return Ok(StrandResult {
                    success: false,
                    in_amount: actual_in.zero_like(),
                    out_amount: actual_out.zero_like(),
                    offers_used: self.total_offers_used(),
                    inactive: self.any_inactive(),
                });
            }

            if i == 0 {
                if let Some(max_in) = max_in {
                    if max_in.compare(&actual_in).map_err(FlowError::Amount)? == core::cmp::Ordering::Less {
                        self.reset(sb, &ran_since_reset);
                        ran_since_reset.clear();
                        let (_, re_out) = self.steps[0].fwd(sb, af_view, offers_to_remove, max_in)?;
                        limiting_step = 0;
                        limit_step_out = re_out;
                        break;
                    }
                }
            }

            if actual_out.compare(&step_out).map_err(FlowError::Amount)? != core::cmp::Ordering::Equal {
                self.reset(sb, &ran_since_reset);
                ran_since_reset.clear();
                let (re_in, re_out) = self.steps[i].rev(sb, af_view, offers_to_remove, actual_out)?;
                ran_since_reset.push(i);
                limiting_step = i;
                limit_step_out = re_out;
                step_out = re_in;
                continue;
            }

            step_out = actual_in;
        }

        if limiting_step < len {
            let mut step_in = limit_step_out;
            for j in (limiting_step + 1)..len {
                let (_, out) = self.steps[j].fwd(sb, af_view, offers_to_remove, step_in)?;
                if out.is_zero() {
                    return Ok(StrandResult {
                        success: false,
                        in_amount: out.zero_like(),
                        out_amount: out.zero_like(),
                        offers_used: self.total_offers_used(),
                        inactive: self.any_inactive(),
                    });
                }
                step_in = out;
            }
        }

        let strand_in = self.steps[0].cached_in().ok_or(FlowError::MalformedStrand("first step never ran"))?;
        let strand_out = self.steps[len - 1].cached_out().ok_or(FlowError::MalformedStrand("last step never ran"))?;

        Ok(StrandResult {
            success: true,
            in_amount: strand_in,
            out_amount: strand_out,
            offers_used: self.total_offers_used(),
            inactive: self.any_inactive(),
        })
    }

    fn reset(&mut self, sb: &mut Sandbox, ran_since_reset: &[usize]) {
        sb.reset();
        for &idx in ran_since_reset {
            self.steps[idx].clear_cache();
        }
    }

    fn total_offers_used(&self) -> u32 {
        self.steps.iter().map(Step::offers_used).sum()
    }

    fn any_inactive(&self) -> bool {
        self.steps.iter().any(Step::inactive)
    }
}
