//! The ledger-level identifiers the flow engine operates over: accounts,
//! currencies, and the (currency, issuer) pair a strand step trades in.

pub mod account_id;
pub mod currency;
pub mod issue;

pub use self::account_id::AccountId;
pub use self::currency::Currency;
pub use self::issue::Issue;
