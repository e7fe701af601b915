//! The read-only ledger contract a sandbox layers over.
//!
//! `afView` in the step contract (§4.4 of the design notes) is always one
//! of these: the base ledger as it stood before the payment began, queried
//! by steps that need to see "the world without this strand's in-flight
//! mutations" (forward-pass validity checks, mainly).

use super::keys::LedgerKey;
use super::objects::LedgerEntry;

/// A read-only key/value ledger view.
pub trait View {
    fn read(&self, key: &LedgerKey) -> Option<LedgerEntry>;

    fn exists(&self, key: &LedgerKey) -> bool {
        self.read(key).is_some()
    }

    /// Visits every live entry. Order is unspecified beyond whatever the
    /// implementation happens to provide.
    fn for_each(&self, visitor: &mut dyn FnMut(&LedgerKey, &LedgerEntry));
}
