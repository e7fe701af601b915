//! Stable identifiers for ledger entries.
//!
//! The production ledger derives 32-byte hashed keys from these same
//! logical components (account, trust-line pair, offer owner + sequence,
//! book directory prefix, …). Deriving that hash is part of the binary
//! ledger codec this crate excludes (pathfinding/persistence/codec are all
//! out of scope). What the core actually needs is a stable, collision-free
//! identity for one entry within a sandbox's lifetime, which the enum
//! itself already gives us — so there is no hashing step to get wrong.

use crate::quality::Quality;
use crate::types::{AccountId, Currency, Issue};

/// A ledger entry's logical key, grouped by the kind of entry it names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LedgerKey {
    Account(AccountId),
    /// A trust line between two accounts for one currency. Always built via
    /// [`LedgerKey::line`] so the pair is canonicalized low/high.
    Line(AccountId, AccountId, Currency),
    Offer(AccountId, u32),
    OwnerDir(AccountId),
    /// A book directory page, keyed by the issue pair and one quality rung.
    BookDir(Issue, Issue, Quality),
    Fees,
}

impl LedgerKey {
    /// Builds a trust-line key, canonicalizing the account pair so a line
    /// between `a` and `b` always keys the same regardless of which side
    /// the caller names first — storage convention is low-account-first.
    pub fn line(a: AccountId, b: AccountId, currency: Currency) -> Self {
        let (low, high) = if a < b { (a, b) } else { (b, a) };
        LedgerKey::Line(low, high, currency)
    }

    pub fn offer(owner: AccountId, sequence: u32) -> Self {
        LedgerKey::Offer(owner, sequence)
    }

    pub fn book_dir(pays: Issue, gets: Issue, quality: Quality) -> Self {
        LedgerKey::BookDir(pays, gets, quality)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::types::AccountId;

    fn acct(address: &str) -> AccountId {
        AccountId::from_classic_address(address).unwrap()
    }

    #[test]
    fn line_key_is_order_independent() {
        let a = acct("r9cZA1mLK5R5Am25ArfXFmqgNwjZgnfk59");
        let b = acct("rpZc4mVfWUif9CRoHRKKcmhu1nx2xktxBo");
        let currency = Currency::iso("USD").unwrap();
        assert_eq!(
            LedgerKey::line(a, b, currency),
            LedgerKey::line(b, a, currency)
        );
    }
}
