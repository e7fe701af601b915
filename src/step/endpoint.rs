//! The native-amount boundary of a strand: the source step that debits the
//! payer, or the sink step that credits the payee. Rate is always 1:1.

use crate::amount::Amount;
use crate::constants::{BASE_RESERVE, OWNER_RESERVE};
use crate::error::FlowError;
use crate::ledger::{AccountRoot, LedgerEntry, LedgerKey, Sandbox, View};
use crate::types::{AccountId, Issue};

use super::{min_amount, DebtDirection, OffersToRemove, Step};

/// First or last step of a strand carrying the native asset.
pub struct EndpointStep {
    pub account: AccountId,
    pub is_last: bool,
    /// `-1` when this is the source of an offer-crossing whose counterparty
    /// currency has no trust line yet: the line will be auto-created
    /// downstream, so the source may draw on the reserve slot it will
    /// come to occupy. `0` otherwise.
    pub reserve_reduction: i64,
    cache: Option<(Amount, Amount)>,
}

impl EndpointStep {
    pub fn new(account: AccountId, is_last: bool, reserve_reduction: i64) -> Self {
        EndpointStep {
            account,
            is_last,
            reserve_reduction,
            cache: None,
        }
    }

    fn read_account(&self, sb: &Sandbox) -> Result<AccountRoot, FlowError> {
        sb.read(&LedgerKey::Account(self.account))
            .and_then(LedgerEntry::into_account_root)
            .ok_or(FlowError::MalformedStrand("endpoint step's account has no AccountRoot"))
    }

    /// Native drops this account can still spend: balance (adjusted by any
    /// in-flight credits this sandbox generation) minus its reserve
    /// requirement (adjusted by any in-flight owner-count changes).
    fn liquid(&self, sb: &Sandbox, account: &AccountRoot) -> Result<i64, FlowError> {
        let adjusted_owner_count = sb.owner_count_hook(self.account, account.owner_count);
        let reserve_units = (adjusted_owner_count as i64 + self.reserve_reduction).max(0);
        let reserve = BASE_RESERVE + reserve_units * OWNER_RESERVE;
        let adjusted_balance = sb
            .balance_hook(self.account, Issue::native(), &Amount::native(account.balance))
            .native_drops()
            .map_err(FlowError::Amount)?;
        Ok((adjusted_balance - reserve).max(0))
    }

    fn debit_source(&mut self, sb: &mut Sandbox, requested: i64) -> Result<i64, FlowError> {
        let account = self.read_account(sb)?;
        let liquid = self.liquid(sb, &account)?;
        let delivered = liquid.min(requested.max(0));
        let mut updated = account;
        updated.balance -= delivered;
        sb.update(LedgerKey::Account(self.account), LedgerEntry::AccountRoot(updated))
            .map_err(|_| FlowError::MalformedStrand("endpoint step source account vanished"))?;
        Ok(delivered)
    }

    fn credit_sink(&mut self, sb: &mut Sandbox, amount: i64) -> Result<(), FlowError> {
        let mut account = self.read_account(sb)?;
        account.balance = account
            .balance
            .checked_add(amount)
            .ok_or(FlowError::Amount(crate::amount::AmountError::Overflow))?;
        sb.update(LedgerKey::Account(self.account), LedgerEntry::AccountRoot(account))
            .map_err(|_| FlowError::MalformedStrand("endpoint step sink account vanished"))?;
        Ok(())
    }
}

impl Step for EndpointStep {
    fn rev(
        &mut self,
        sb: &mut Sandbox,
        _af_view: &dyn View,
        _offers_to_remove: &mut OffersToRemove,
        out: Amount,
    ) -> Result<(Amount, Amount), FlowError> {
        let out_drops = out.native_drops().map_err(FlowError::Amount)?;
        let result = if self.is_last {
            self.credit_sink(sb, out_drops)?;
            (Amount::native(out_drops), Amount::native(out_drops))
        } else {
            let delivered = self.debit_source(sb, out_drops)?;
            (Amount::native(delivered), Amount::native(delivered))
        };
        self.cache = Some(result);
        Ok(result)
    }

    fn fwd(
        &mut self,
        sb: &mut Sandbox,
        _af_view: &dyn View,
        _offers_to_remove: &mut OffersToRemove,
        in_amount: Amount,
    ) -> Result<(Amount, Amount), FlowError> {
        let in_drops = in_amount.native_drops().map_err(FlowError::Amount)?;
        let (mut in_actual, mut out_actual) = if self.is_last {
            self.credit_sink(sb, in_drops)?;
            (Amount::native(in_drops), Amount::native(in_drops))
        } else {
            let delivered = self.debit_source(sb, in_drops)?;
            (Amount::native(delivered), Amount::native(delivered))
        };
        if let Some((cached_in, cached_out)) = self.cache {
            in_actual = min_amount(in_actual, cached_in);
            out_actual = min_amount(out_actual, cached_out);
        }
        self.cache = Some((in_actual, out_actual));
        Ok((in_actual, out_actual))
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

    fn debt_direction(&self, _sb: &Sandbox, strand_direction: DebtDirection) -> DebtDirection {
        // The native endpoint never carries issuer debt; it simply mirrors
        // the direction the rest of the strand is moving in.
        strand_direction
    }

    fn quality_upper_bound(
        &self,
        _sb: &Sandbox,
        prev_step_debt_dir: DebtDirection,
    ) -> Option<(crate::quality::Quality, DebtDirection)> {
        Some((crate::quality::QUALITY_ONE, prev_step_debt_dir))
    }

    fn valid_fwd(&self, sb: &Sandbox, _af_view: &dyn View, in_amount: Amount) -> (bool, Amount) {
        let in_drops = match in_amount.native_drops() {
            Ok(d) => d,
            Err(_) => return (false, Amount::zero_native()),
        };
        if self.is_last {
            return (true, Amount::native(in_drops));
        }
        match self.read_account(sb).and_then(|a| self.liquid(sb, &a)) {
            Ok(liquid) => (true, Amount::native(liquid.min(in_drops))),
            Err(_) => (false, Amount::zero_native()),
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
    use crate::ledger::{AccountRootFlags, LedgerEntry};

    fn acct(address: &str) -> AccountId {
        AccountId::from_classic_address(address).unwrap()
    }

    fn put_account(ledger: &mut MapLedger, account: AccountId, balance: i64, owner_count: u32) {
        ledger.put(
            LedgerKey::Account(account),
            LedgerEntry::AccountRoot(AccountRoot {
                account,
                balance,
                owner_count,
                transfer_rate: 0,
                flags: AccountRootFlags::default(),
            }),
        );
    }

    #[test]
    fn sink_credits_full_amount() {
        let dst = acct("r9cZA1mLK5R5Am25ArfXFmqgNwjZgnfk59");
        let mut ledger = MapLedger::new();
        put_account(&mut ledger, dst, 0, 0);
        let mut sb = Sandbox::new(&ledger, TransactionContext::default());
        let mut step = EndpointStep::new(dst, true, 0);
        let (in_amt, out_amt) = step.rev(&mut sb, &ledger, &mut OffersToRemove::new(), Amount::native(100)).unwrap();
        assert_eq!(in_amt, Amount::native(100));
        assert_eq!(out_amt, Amount::native(100));
        let account = sb.read(&LedgerKey::Account(dst)).unwrap().into_account_root().unwrap();
        assert_eq!(account.balance, 100);
    }

    #[test]
    fn source_is_capped_by_reserve() {
        let src = acct("r9cZA1mLK5R5Am25ArfXFmqgNwjZgnfk59");
        let mut ledger = MapLedger::new();
        put_account(&mut ledger, src, BASE_RESERVE + 500, 0);
        let mut sb = Sandbox::new(&ledger, TransactionContext::default());
        let mut step = EndpointStep::new(src, false, 0);
        let (in_amt, out_amt) = step.rev(&mut sb, &ledger, &mut OffersToRemove::new(), Amount::native(10_000)).unwrap();
        assert_eq!(in_amt, Amount::native(500));
        assert_eq!(out_amt, Amount::native(500));
    }

    #[test]
    fn depleted_source_delivers_zero() {
        let src = acct("r9cZA1mLK5R5Am25ArfXFmqgNwjZgnfk59");
        let mut ledger = MapLedger::new();
        put_account(&mut ledger, src, BASE_RESERVE, 0);
        let mut sb = Sandbox::new(&ledger, TransactionContext::default());
        let mut step = EndpointStep::new(src, false, 0);
        let (_, out_amt) = step.rev(&mut sb, &ledger, &mut OffersToRemove::new(), Amount::native(1)).unwrap();
        assert!(out_amt.is_zero());
    }
}
