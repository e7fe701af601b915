//! Error taxonomy for ledger view / sandbox operations.

use thiserror_no_std::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
#[non_exhaustive]
pub enum LedgerError {
    #[error("entry already exists for this key")]
    AlreadyExists,
    #[error("update requires an existing entry")]
    NotFound,
    #[error("entry is not the expected kind for this key")]
    WrongKind,
}

#[cfg(feature = "std")]
impl std::error::Error for LedgerError {}
