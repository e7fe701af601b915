//! The driver surface the strand executor is consumed through: strand
//! iteration in quality order, `removableOffers` aggregation, and the
//! `FlowResult` the core hands back to its caller.

use alloc::vec::Vec;

use crate::amount::Amount;
use crate::error::{FlowError, ResultCode};
use crate::ledger::{Sandbox, TransactionContext, View};
use crate::step::{DebtDirection, OffersToRemove};
use crate::strand::Strand;

/// Amendment gates and per-payment knobs threaded into book steps at
/// construction — never consulted from global state (§ design notes).
#[derive(Debug, Clone, Copy)]
pub struct FlowOptions {
    pub fix_reduced_offers_v1: bool,
    pub fix_reduced_offers_v2: bool,
    pub owner_pays_transfer_fee: bool,
    pub parent_close_time: u32,
    pub default_path: bool,
}

impl Default for FlowOptions {
    fn default() -> Self {
        FlowOptions {
            fix_reduced_offers_v1: true,
            fix_reduced_offers_v2: true,
            owner_pays_transfer_fee: false,
            parent_close_time: 0,
            default_path: true,
        }
    }
}

/// The outcome of driving one or more strands to satisfy a payment.
///
/// `sandbox` is every mutation every successful strand made, folded into one
/// overlay over `parent`; the enclosing transactor applies it (§6) rather
/// than this core owning a commit path of its own.
pub struct FlowResult<'a> {
    pub in_amount: Amount,
    pub out_amount: Amount,
    pub sandbox: Sandbox<'a>,
    pub removable_offers: OffersToRemove,
    pub result_code: ResultCode,
}

/// Drives `strands` in quality order until `requested_out` is satisfied (or
/// every strand has been tried), accumulating each successful strand's
/// sandbox into `FlowResult::sandbox` and unioning every strand's
/// `offersToRemove` into the result.
///
/// Each strand gets its own child sandbox over `parent`; on success that
/// sandbox's overlay, credits, and owner-count adjustments are folded into
/// the running result sandbox via [`Sandbox::absorb`]. `options` is applied
/// to every book step across every strand before any strand runs, so it is
/// the single authority for amendment gates and fee knobs for this payment —
/// a strand built with different defaults is overridden here, not left to
/// diverge silently.
pub fn flow<'a>(
    parent: &'a dyn View,
    strands: &mut [Strand],
    max_in: Option<Amount>,
    requested_out: Amount,
    context: TransactionContext,
    options: FlowOptions,
) -> Result<FlowResult<'a>, FlowError> {
    for strand in strands.iter_mut() {
        strand.apply_flow_options(options);
    }

    let mut committed = Sandbox::new(parent, context);
    let mut removable_offers: OffersToRemove = OffersToRemove::new();
    let mut remaining_out = requested_out;
    let mut remaining_in = max_in;
    let mut total_in = requested_out.zero_like();
    let mut total_out = requested_out.zero_like();
    let mut any_success = false;
    let mut any_inactive = false;

    let mut order: Vec<usize> = (0..strands.len()).collect();
    order.sort_by(|&a, &b| {
        let sb_a = Sandbox::new(parent, context);
        let sb_b = Sandbox::new(parent, context);
        let qa = strands[a].quality_upper_bound(&sb_a, DebtDirection::Issues);
        let qb = strands[b].quality_upper_bound(&sb_b, DebtDirection::Issues);
        match (qa, qb) {
            (Some(qa), Some(qb)) => qb.cmp(&qa),
            (Some(_), None) => core::cmp::Ordering::Less,
            (None, Some(_)) => core::cmp::Ordering::Greater,
            (None, None) => core::cmp::Ordering::Equal,
        }
    });

    for idx in order {
        if remaining_out.is_zero() {
            break;
        }
        let mut sb = Sandbox::new(parent, context);
        let mut offers_to_remove = OffersToRemove::new();
        let strand_max_in = remaining_in;

        let result = strands[idx].execute(&mut sb, parent, &mut offers_to_remove, strand_max_in, remaining_out)?;
        removable_offers.extend(offers_to_remove.iter().copied());

        if !result.success {
            continue;
        }

        any_success = true;
        any_inactive = any_inactive || result.inactive;
        total_in = total_in.add(&result.in_amount).map_err(FlowError::Amount)?;
        total_out = total_out.add(&result.out_amount).map_err(FlowError::Amount)?;
        remaining_out = remaining_out.sub(&result.out_amount).map_err(FlowError::Amount)?;
        if let Some(cap) = remaining_in {
            remaining_in = Some(cap.sub(&result.in_amount).map_err(FlowError::Amount)?);
        }
        committed.absorb(sb);
    }

    let result_code = if !any_success {
        ResultCode::PathDry
    } else if remaining_out.is_zero() {
        ResultCode::Success
    } else {
        ResultCode::PathPartial
    };

    let _ = any_inactive;
    Ok(FlowResult {
        in_amount: total_in,
        out_amount: total_out,
        sandbox: committed,
        removable_offers,
        result_code,
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::ledger::map_view::MapLedger;
    use crate::ledger::{AccountRoot, AccountRootFlags, LedgerEntry, LedgerKey};
    use crate::step::{EndpointStep, StepKind};
    use crate::types::AccountId;

    fn acct(address: &str) -> AccountId {
        AccountId::from_classic_address(address).unwrap()
    }

    fn put_account(ledger: &mut MapLedger, account: AccountId, balance: i64) {
        ledger.put(
            LedgerKey::Account(account),
            LedgerEntry::AccountRoot(AccountRoot {
                account,
                balance,
                owner_count: 0,
                transfer_rate: 0,
                flags: AccountRootFlags::default(),
            }),
        );
    }

    #[test]
    fn single_strand_success_reports_success_code() {
        let a = acct("r9cZA1mLK5R5Am25ArfXFmqgNwjZgnfk59");
        let b = acct("rpZc4mVfWUif9CRoHRKKcmhu1nx2xktxBo");
        let mut ledger = MapLedger::new();
        put_account(&mut ledger, a, 1_000_000_000);
        put_account(&mut ledger, b, 0);

        let mut strands = alloc::vec![Strand::new(alloc::vec![
            StepKind::Endpoint(EndpointStep::new(a, false, 0)),
            StepKind::Endpoint(EndpointStep::new(b, true, 0)),
        ])
        .unwrap()];

        let result = flow(
            &ledger,
            &mut strands,
            None,
            Amount::native(100),
            TransactionContext::default(),
            FlowOptions::default(),
        )
        .unwrap();

        assert_eq!(result.result_code, ResultCode::Success);
        assert_eq!(result.out_amount, Amount::native(100));

        let balance_a = result
            .sandbox
            .read(&LedgerKey::Account(a))
            .unwrap()
            .as_account_root()
            .unwrap()
            .balance;
        assert_eq!(balance_a, 1_000_000_000 - 100);
    }

    #[test]
    fn dry_strand_leaves_sandbox_untouched() {
        let a = acct("r9cZA1mLK5R5Am25ArfXFmqgNwjZgnfk59");
        let b = acct("rpZc4mVfWUif9CRoHRKKcmhu1nx2xktxBo");
        let mut ledger = MapLedger::new();
        put_account(&mut ledger, a, crate::constants::BASE_RESERVE);
        put_account(&mut ledger, b, 0);

        let mut strands = alloc::vec![Strand::new(alloc::vec![
            StepKind::Endpoint(EndpointStep::new(a, false, 0)),
            StepKind::Endpoint(EndpointStep::new(b, true, 0)),
        ])
        .unwrap()];

        let result = flow(
            &ledger,
            &mut strands,
            None,
            Amount::native(100),
            TransactionContext::default(),
            FlowOptions::default(),
        )
        .unwrap();

        assert_eq!(result.result_code, ResultCode::PathDry);
        let balance_a = result
            .sandbox
            .read(&LedgerKey::Account(a))
            .unwrap()
            .as_account_root()
            .unwrap()
            .balance;
        assert_eq!(balance_a, crate::constants::BASE_RESERVE);
    }
}
