//! IOU transfer across one trust line via rippling: in/out qualities,
//! transfer fees, freeze/auth/NoRipple checks, and auto-trust-line
//! creation.

use core::cmp::Ordering;

use crate::amount::{Amount, AmountError};
use crate::error::{FlowError, ResultCode};
use crate::ledger::objects::QUALITY_ONE_PPB;
use crate::ledger::{AccountRoot, LedgerEntry, LedgerKey, Sandbox, TrustLine, TrustLineSideFlags, View};
use crate::types::{AccountId, Currency, Issue};

use super::{min_amount, DebtDirection, OffersToRemove, Step};

/// One hop of IOU rippling between `src` and `dst` in `issue.currency()`.
pub struct DirectStep {
    pub src: AccountId,
    pub dst: AccountId,
    /// Shared across every step of a strand's leg in this currency — the
    /// strand-construction invariant that adjacent steps agree on issue
    /// means this is always the same `Issue` value the neighboring book
    /// step (if any) uses, so amounts never need re-tagging at the
    /// boundary.
    pub issue: Issue,
    pub is_last: bool,
    pub offer_crossing: bool,
    /// Whether the strand's previous step redeemed — src then pays the
    /// issuer's transfer fee on an issuing hop.
    pub prev_step_redeems: bool,
    /// Quality-in carried by the previous hop's trust line, when the
    /// previous step is itself a direct step redeeming through a shared
    /// middle account; `None` when there is no such constraint.
    pub prev_line_quality_in: Option<u32>,
    /// Precomputed by the strand builder: true when this step's middle
    /// account has `NoRipple` set on both the side facing the previous
    /// step and the side facing this one.
    pub no_ripple_conflict: bool,
    cache: Option<(Amount, Amount)>,
}

impl DirectStep {
    pub fn new(src: AccountId, dst: AccountId, issue: Issue, is_last: bool) -> Self {
        DirectStep {
            src,
            dst,
            issue,
            is_last,
            offer_crossing: false,
            prev_step_redeems: false,
            prev_line_quality_in: None,
            no_ripple_conflict: false,
            cache: None,
        }
    }

    fn currency(&self) -> Currency {
        self.issue.currency()
    }

    fn line_key(&self) -> LedgerKey {
        LedgerKey::line(self.src, self.dst, self.currency())
    }

    fn read_line(&self, sb: &Sandbox) -> Option<TrustLine> {
        sb.read(&self.line_key()).and_then(LedgerEntry::into_trust_line)
    }

    fn read_account(&self, sb: &Sandbox, account: AccountId) -> Result<AccountRoot, FlowError> {
        sb.read(&LedgerKey::Account(account))
            .and_then(LedgerEntry::into_account_root)
            .ok_or(FlowError::MalformedStrand("direct step account has no AccountRoot"))
    }

    fn zero(&self) -> Amount {
        Amount::zero_issued(self.issue)
    }

    fn direction(&self, line: &Option<TrustLine>, sb: &Sandbox) -> DebtDirection {
        match line {
            Some(line) => {
                let held = sb.balance_hook(self.src, self.issue, &line.balance_held_by(self.src));
                if held.is_negative() || held.is_zero() {
                    DebtDirection::Issues
                } else {
                    DebtDirection::Redeems
                }
            }
            // No line yet: nothing to redeem, so this hop is about to issue.
            None => DebtDirection::Issues,
        }
    }

    fn check(&self, sb: &Sandbox, line: &Option<TrustLine>) -> Result<(), FlowError> {
        if self.no_ripple_conflict {
            return Err(FlowError::Result(ResultCode::NoRipple));
        }
        match line {
            None => {
                if self.is_last {
                    Ok(())
                } else {
                    Err(FlowError::Result(ResultCode::NoLine))
                }
            }
            Some(line) => {
                if line.flags(self.src).freeze || line.flags(self.dst).freeze {
                    return Err(FlowError::Result(ResultCode::NoAuth));
                }
                let src_account = self.read_account(sb, self.src)?;
                if src_account.flags.require_auth
                    && !line.flags(self.src).auth
                    && line.balance_held_by(self.src).is_zero()
                {
                    return Err(FlowError::Result(ResultCode::NoAuth));
                }
                Ok(())
            }
        }
    }

    fn max_flow(&self, sb: &Sandbox, line: &Option<TrustLine>, direction: DebtDirection, unbounded: Amount) -> Result<Amount, FlowError> {
        match direction {
            DebtDirection::Redeems => {
                let line = line.as_ref().ok_or(FlowError::Result(ResultCode::NoLine))?;
                let held = sb.balance_hook(self.src, self.issue, &line.balance_held_by(self.src));
                Ok(if held.is_negative() { self.zero() } else { held })
            }
            DebtDirection::Issues => {
                if self.offer_crossing && self.is_last {
                    return Ok(unbounded);
                }
                match line {
                    Some(line) => {
                        let owed_to_dst = sb.balance_hook(self.dst, self.issue, &line.balance_held_by(self.dst));
                        let limit = *line.limit(self.dst);
                        let room = limit.sub(&owed_to_dst).unwrap_or_else(|_| self.zero());
                        Ok(if room.is_negative() { self.zero() } else { room })
                    }
                    None if self.is_last => Ok(unbounded),
                    None => Err(FlowError::Result(ResultCode::NoLine)),
                }
            }
        }
    }

    fn qualities(&self, sb: &Sandbox, direction: DebtDirection, line: &Option<TrustLine>) -> Result<(u32, u32), FlowError> {
        if self.offer_crossing {
            return Ok((QUALITY_ONE_PPB, QUALITY_ONE_PPB));
        }
        match direction {
            DebtDirection::Redeems => {
                let line = line.as_ref().ok_or(FlowError::Result(ResultCode::NoLine))?;
                let raw = line.quality_out(self.src);
                let normalized = if raw == 0 { QUALITY_ONE_PPB } else { raw };
                let src_q_out = normalized.max(self.prev_line_quality_in.unwrap_or(QUALITY_ONE_PPB));
                Ok((src_q_out, QUALITY_ONE_PPB))
            }
            DebtDirection::Issues => {
                let src_q_out = if self.prev_step_redeems {
                    self.read_account(sb, self.src)?.effective_transfer_rate()
                } else {
                    QUALITY_ONE_PPB
                };
                let raw = line.as_ref().map(|l| l.quality_in(self.dst)).unwrap_or(0);
                let normalized = if raw == 0 { QUALITY_ONE_PPB } else { raw };
                let dst_q_in = if self.is_last { normalized.min(QUALITY_ONE_PPB) } else { normalized };
                Ok((src_q_out, dst_q_in))
            }
        }
    }

    fn trust_create(&self, sb: &mut Sandbox) -> Result<TrustLine, FlowError> {
        if !self.is_last {
            return Err(FlowError::Result(ResultCode::NoLine));
        }
        let dst_account = self.read_account(sb, self.dst)?;
        let low = self.src.min(self.dst);
        let high = self.src.max(self.dst);
        let mut line = TrustLine {
            low,
            high,
            currency: self.currency(),
            balance: self.zero(),
            low_limit: self.zero(),
            high_limit: self.zero(),
            low_flags: TrustLineSideFlags::default(),
            high_flags: TrustLineSideFlags::default(),
            low_quality_in: 0,
            low_quality_out: 0,
            high_quality_in: 0,
            high_quality_out: 0,
        };
        line.flags_mut(self.dst).reserve = true;
        line.flags_mut(self.dst).no_ripple = dst_account.flags.default_ripple;
        sb.adjust_owner_count(self.dst, 1);
        sb.insert(self.line_key(), LedgerEntry::TrustLine(line.clone()))
            .map_err(|_| FlowError::MalformedStrand("trust line already exists during auto-create"))?;
        Ok(line)
    }

    /// Adjusts the trust-line balance by `delivered` (from `src` to `dst`)
    /// and applies the narrow auto-delete policy on crossing to zero.
    fn ripple_credit(&self, sb: &mut Sandbox, delivered: Amount) -> Result<(), FlowError> {
        if delivered.is_zero() {
            return Ok(());
        }
        let key = self.line_key();
        let mut line = match self.read_line(sb) {
            Some(line) => line,
            None => self.trust_create(sb)?,
        };

        let pre_balance = line.balance_held_by(self.src);
        sb.credit_hook(self.src, self.dst, &delivered);

        line.balance = if self.src < self.dst {
            line.balance.sub(&delivered).map_err(FlowError::Amount)?
        } else {
            line.balance.add(&delivered).map_err(FlowError::Amount)?
        };

        let post_balance = line.balance_held_by(self.src);
        let pre_positive = matches!(pre_balance.compare(&self.zero()), Ok(Ordering::Greater));
        let post_nonpositive = !matches!(post_balance.compare(&self.zero()), Ok(Ordering::Greater));

        if pre_positive && post_nonpositive {
            let flags = line.flags(self.src);
            let limit = *line.limit(self.src);
            let quality_in = line.quality_in(self.src);
            let quality_out = line.quality_out(self.src);
            let src_account = self.read_account(sb, self.src)?;
            let no_ripple_matches_default = flags.no_ripple == src_account.flags.default_ripple;
            if flags.reserve
                && limit.is_zero()
                && quality_in == 0
                && quality_out == 0
                && !flags.freeze
                && no_ripple_matches_default
            {
                line.flags_mut(self.src).reserve = false;
                sb.adjust_owner_count(self.src, -1);
            }
        }

        if line.both_sides_reserve_free() && line.balance.is_zero() {
            sb.erase(&key);
        } else {
            sb.update(key, LedgerEntry::TrustLine(line))
                .map_err(|_| FlowError::MalformedStrand("trust line vanished mid-credit"))?;
        }
        Ok(())
    }

    fn reverse_arithmetic(
        &self,
        line: &Option<TrustLine>,
        direction: DebtDirection,
        src_q_out: u32,
        dst_q_in: u32,
        max: Amount,
        out: Amount,
    ) -> Result<(Amount, Amount, Amount), AmountError> {
        let _ = (line, direction);
        let src_to_dst = out.mul_ratio(QUALITY_ONE_PPB as u64, dst_q_in as u64, true)?;
        if matches!(src_to_dst.compare(&max)?, Ordering::Less | Ordering::Equal) {
            let in_amount = src_to_dst.mul_ratio(src_q_out as u64, QUALITY_ONE_PPB as u64, true)?;
            Ok((in_amount, out, src_to_dst))
        } else {
            let in_amount = max.mul_ratio(src_q_out as u64, QUALITY_ONE_PPB as u64, true)?;
            let actual_out = max.mul_ratio(dst_q_in as u64, QUALITY_ONE_PPB as u64, false)?;
            Ok((in_amount, actual_out, max))
        }
    }

    fn forward_arithmetic(
        &self,
        src_q_out: u32,
        dst_q_in: u32,
        max: Amount,
        in_amount: Amount,
    ) -> Result<(Amount, Amount), AmountError> {
        let mut src_to_dst = in_amount.mul_ratio(QUALITY_ONE_PPB as u64, src_q_out as u64, false)?;
        src_to_dst = min_amount(src_to_dst, max);
        let out_amount = src_to_dst.mul_ratio(dst_q_in as u64, QUALITY_ONE_PPB as u64, false)?;
        Ok((src_to_dst, out_amount))
    }
}

impl Step for DirectStep {
    fn rev(
        &mut self,
        sb: &mut Sandbox,
        _af_view: &dyn View,
        _offers_to_remove: &mut OffersToRemove,
        out: Amount,
    ) -> Result<(Amount, Amount), FlowError> {
        let line = self.read_line(sb);
        self.check(sb, &line)?;
        let direction = self.direction(&line, sb);
        let (src_q_out, dst_q_in) = self.qualities(sb, direction, &line)?;
        let max = self.max_flow(sb, &line, direction, out)?;

        let (in_amount, out_amount, delivered) = self
            .reverse_arithmetic(&line, direction, src_q_out, dst_q_in, max, out)
            .map_err(FlowError::Amount)?;

        self.ripple_credit(sb, delivered)?;
        self.cache = Some((in_amount, out_amount));
        Ok((in_amount, out_amount))
    }

    fn fwd(
        &mut self,
        sb: &mut Sandbox,
        _af_view: &dyn View,
        _offers_to_remove: &mut OffersToRemove,
        in_amount: Amount,
    ) -> Result<(Amount, Amount), FlowError> {
        let line = self.read_line(sb);
        self.check(sb, &line)?;
        let direction = self.direction(&line, sb);
        let (src_q_out, dst_q_in) = self.qualities(sb, direction, &line)?;
        let max = self.max_flow(sb, &line, direction, in_amount)?;

        let (delivered, mut out_amount) = self
            .forward_arithmetic(src_q_out, dst_q_in, max, in_amount)
            .map_err(FlowError::Amount)?;
        let mut in_actual = in_amount;

        if let Some((cached_in, cached_out)) = self.cache {
            in_actual = min_amount(in_actual, cached_in);
            out_amount = min_amount(out_amount, cached_out);
        }

        self.ripple_credit(sb, delivered)?;
        self.cache = Some((in_actual, out_amount));
        Ok((in_actual, out_amount))
    }

    fn cached_in(&self) -> Option<Amount> {
        self.cache.map(|(i, _)| i)
    }

    fn cached_out(&self) -> Option<Amount> {
        self.cache.map(|(_, o)| o)
    }

    fn clear_cache(&mut self) {
        self.cache = None;
    }

    fn debt_direction(&self, sb: &Sandbox, _strand_direction: DebtDirection) -> DebtDirection {
        let line = self.read_line(sb);
        self.direction(&line, sb)
    }

    fn quality_upper_bound(
        &self,
        sb: &Sandbox,
        _prev_step_debt_dir: DebtDirection,
    ) -> Option<(crate::quality::Quality, DebtDirection)> {
        let line = self.read_line(sb);
        let direction = self.direction(&line, sb);
        let (src_q_out, dst_q_in) = self.qualities(sb, direction, &line).ok()?;
        let quality = crate::quality::Quality::from_amounts(
            &Amount::native(dst_q_in as i64),
            &Amount::native(src_q_out as i64),
        )
        .ok()?;
        Some((quality, direction))
    }

    fn valid_fwd(&self, sb: &Sandbox, _af_view: &dyn View, in_amount: Amount) -> (bool, Amount) {
        let line = self.read_line(sb);
        if self.check(sb, &line).is_err() {
            return (false, self.zero());
        }
        let direction = self.direction(&line, sb);
        let (src_q_out, dst_q_in) = match self.qualities(sb, direction, &line) {
            Ok(q) => q,
            Err(_) => return (false, self.zero()),
        };
        let max = match self.max_flow(sb, &line, direction, in_amount) {
            Ok(m) => m,
            Err(_) => return (false, self.zero()),
        };
        match self.forward_arithmetic(src_q_out, dst_q_in, max, in_amount) {
            Ok((_, out)) => (true, out),
            Err(_) => (false, self.zero()),
        }
    }

    fn offers_used(&self) -> u32 {
        0
    }

    fn inactive(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::ledger::map_view::MapLedger;
    use crate::ledger::sandbox::TransactionContext;
    use crate::ledger::AccountRootFlags;
    use crate::types::Currency;

    fn acct(address: &str) -> AccountId {
        AccountId::from_classic_address(address).unwrap()
    }

    fn put_account(ledger: &mut MapLedger, account: AccountId, default_ripple: bool) {
        ledger.put(
            LedgerKey::Account(account),
            LedgerEntry::AccountRoot(AccountRoot {
                account,
                balance: 10_000_000_000,
                owner_count: 0,
                transfer_rate: 0,
                flags: AccountRootFlags {
                    default_ripple,
                    ..Default::default()
                },
            }),
        );
    }

    fn usd_between(low: AccountId, high: AccountId) -> Issue {
        Issue::issued(Currency::iso("USD").unwrap(), low.min(high))
    }

    #[test]
    fn redeem_reduces_held_balance() {
        let a = acct("r9cZA1mLK5R5Am25ArfXFmqgNwjZgnfk59");
        let b = acct("rpZc4mVfWUif9CRoHRKKcmhu1nx2xktxBo");
        let issue = usd_between(a, b);
        let mut ledger = MapLedger::new();
        put_account(&mut ledger, a, true);
        put_account(&mut ledger, b, true);
        let (low, high) = if a < b { (a, b) } else { (b, a) };
        // b holds 10 USD against a (a owes b): from a's perspective balance_held_by(a) = -10 if a is low... set up so a redeems.
        let mut line = TrustLine {
            low,
            high,
            currency: Currency::iso("USD").unwrap(),
            balance: Amount::zero_issued(issue),
            low_limit: Amount::issued(1_000_000_000_000_000, 0, issue).unwrap(),
            high_limit: Amount::issued(1_000_000_000_000_000, 0, issue).unwrap(),
            low_flags: TrustLineSideFlags::default(),
            high_flags: TrustLineSideFlags::default(),
            low_quality_in: 0,
            low_quality_out: 0,
            high_quality_in: 0,
            high_quality_out: 0,
        };
        // Make `a` hold a positive claim against `b` (a redeems).
        let ten = Amount::issued(1_000_000_000_000_000, -14, issue).unwrap(); // 10.0
        line.balance = if a == low { ten } else { ten.negate() };
        ledger.put(LedgerKey::line(a, b, Currency::iso("USD").unwrap()), LedgerEntry::TrustLine(line));

        let mut sb = Sandbox::new(&ledger, TransactionContext::default());
        let mut step = DirectStep::new(a, b, issue, true);
        assert_eq!(step.debt_direction(&sb, DebtDirection::Issues), DebtDirection::Redeems);

        let five = Amount::issued(5_000_000_000_000_000, -15, issue).unwrap(); // 5.0
        let (in_amt, out_amt) = step.rev(&mut sb, &ledger, &mut OffersToRemove::new(), five).unwrap();
        assert_eq!(out_amt, five);
        assert_eq!(in_amt, five);
    }

    #[test]
    fn missing_line_on_non_last_step_is_no_line() {
        let a = acct("r9cZA1mLK5R5Am25ArfXFmqgNwjZgnfk59");
        let b = acct("rpZc4mVfWUif9CRoHRKKcmhu1nx2xktxBo");
        let issue = usd_between(a, b);
        let mut ledger = MapLedger::new();
        put_account(&mut ledger, a, true);
        put_account(&mut ledger, b, true);
        let mut sb = Sandbox::new(&ledger, TransactionContext::default());
        let mut step = DirectStep::new(a, b, issue, false);
        let result = step.rev(&mut sb, &ledger, &mut OffersToRemove::new(), Amount::issued(1_000_000_000_000_000, -15, issue).unwrap());
        assert!(matches!(result, Err(FlowError::Result(ResultCode::NoLine))));
    }

    #[test]
    fn auto_creates_line_on_last_step_issue() {
        let a = acct("r9cZA1mLK5R5Am25ArfXFmqgNwjZgnfk59");
        let b = acct("rpZc4mVfWUif9CRoHRKKcmhu1nx2xktxBo");
        let issue = usd_between(a, b);
        let mut ledger = MapLedger::new();
        put_account(&mut ledger, a, true);
        put_account(&mut ledger, b, false);
        let mut sb = Sandbox::new(&ledger, TransactionContext::default());
        let mut step = DirectStep::new(a, b, issue, true);
        let one = Amount::issued(1_000_000_000_000_000, -15, issue).unwrap();
        let (_, out_amt) = step.rev(&mut sb, &ledger, &mut OffersToRemove::new(), one).unwrap();
        assert_eq!(out_amt, one);
        let line = sb.read(&LedgerKey::line(a, b, Currency::iso("USD").unwrap())).unwrap().into_trust_line().unwrap();
        assert!(line.flags(b).reserve);
        assert_eq!(line.flags(b).no_ripple, false);
    }
}
