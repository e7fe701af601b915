//! An `Issue` pairs a currency with the account responsible for it — the
//! identity a strand step actually trades in. Native issues have no issuer;
//! every issued currency must have one.

use core::fmt;

use serde::{Deserialize, Serialize};

use super::account_id::AccountId;
use super::currency::Currency;

/// A currency scoped to its issuer (or the native asset, which has none).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Issue {
    currency: Currency,
    issuer: Option<AccountId>,
}

impl Issue {
    /// The native issue (XRP).
    pub const fn native() -> Self {
        Issue {
            currency: Currency::Native,
            issuer: None,
        }
    }

    /// An issued-currency issue. Passing `Currency::Native` here is a
    /// programmer error the caller is expected not to make — construct
    /// native issues with [`Issue::native`] instead.
    pub fn issued(currency: Currency, issuer: AccountId) -> Self {
        debug_assert!(!currency.is_native(), "native currency cannot have an issuer");
        Issue {
            currency,
            issuer: Some(issuer),
        }
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    pub fn issuer(&self) -> Option<AccountId> {
        self.issuer
    }

    pub fn is_native(&self) -> bool {
        self.currency.is_native()
    }

    /// Two issues are the same liquidity source when both currency and
    /// issuer match (a native issue always matches another native issue).
    pub fn same_issue(&self, other: &Issue) -> bool {
        self.currency == other.currency && self.issuer == other.issuer
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.issuer {
            Some(issuer) => write!(f, "{}/{}", self.currency, issuer),
            None => write!(f, "{}", self.currency),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn native_issue_has_no_issuer() {
        let issue = Issue::native();
        assert!(issue.is_native());
        assert_eq!(issue.issuer(), None);
    }

    #[test]
    fn issued_currency_carries_issuer() {
        let issuer = AccountId::from_classic_address("r9cZA1mLK5R5Am25ArfXFmqgNwjZgnfk59").unwrap();
        let issue = Issue::issued(Currency::iso("USD").unwrap(), issuer);
        assert!(!issue.is_native());
        assert_eq!(issue.issuer(), Some(issuer));
    }

    #[test]
    fn same_issue_compares_currency_and_issuer() {
        let issuer = AccountId::from_classic_address("r9cZA1mLK5R5Am25ArfXFmqgNwjZgnfk59").unwrap();
        let other_issuer = AccountId::from_classic_address("rpZc4mVfWUif9CRoHRKKcmhu1nx2xktxBo").unwrap();
        let a = Issue::issued(Currency::iso("USD").unwrap(), issuer);
        let b = Issue::issued(Currency::iso("USD").unwrap(), issuer);
        let c = Issue::issued(Currency::iso("USD").unwrap(), other_issuer);
        assert!(a.same_issue(&b));
        assert!(!a.same_issue(&c));
        assert!(Issue::native().same_issue(&Issue::native()));
    }
}
