//! Collection of public constants for XRPL.

/// Regular expression for determining ISO currency codes.
pub const ISO_CURRENCY_REGEX: &str = r"^[A-Z0-9]{3}$";
/// Regular expression for determining hex currency codes.
pub const HEX_CURRENCY_REGEX: &str = r"^[A-F0-9]{40}$";

/// Length of an account id.
pub const ACCOUNT_ID_LENGTH: usize = 20;

/// Base reserve, in drops, an account must keep to exist on the ledger.
pub const BASE_RESERVE: i64 = 10_000_000;
/// Additional reserve, in drops, charged per owned ledger object
/// (trust line, offer, …).
pub const OWNER_RESERVE: i64 = 2_000_000;
