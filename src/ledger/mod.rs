//! Ledger objects, key derivation, the read-only view contract, and the
//! mutable sandbox overlay a strand executes against.

pub mod exceptions;
pub mod keys;
pub mod map_view;
pub mod objects;
pub mod sandbox;
pub mod view;

pub use exceptions::LedgerError;
pub use keys::LedgerKey;
pub use objects::{AccountRoot, AccountRootFlags, LedgerEntry, Offer, TrustLine, TrustLineSideFlags};
pub use sandbox::{Sandbox, TransactionContext, TxHash};
pub use view::View;
