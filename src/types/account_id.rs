//! 160-bit account identifiers, as they appear in `AccountRoot`, `TrustLine`,
//! and `Offer` ledger objects.

use alloc::string::String;
use core::convert::TryFrom;
use core::fmt;
use thiserror_no_std::Error;

use serde::{Deserialize, Serialize};

use crate::core::addresscodec::{decode_classic_address, encode_classic_address};
use crate::core::exceptions::XRPLCoreException;

/// Raw byte length of an `AccountId`.
pub const ACCOUNT_ID_LENGTH: usize = 20;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AccountIdException {
    #[error("address codec error: {0}")]
    Codec(#[from] XRPLCoreException),
    #[error("decoded address is {found} bytes, expected {expected}")]
    WrongLength { expected: usize, found: usize },
}

#[cfg(feature = "std")]
impl std::error::Error for AccountIdException {}

/// A 20-byte XRPL account identifier.
///
/// Ordered so accounts can key a `BTreeMap`/sort stably the way the ledger's
/// owner directories do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AccountId([u8; ACCOUNT_ID_LENGTH]);

impl AccountId {
    pub const ZERO: AccountId = AccountId([0u8; ACCOUNT_ID_LENGTH]);

    pub const fn from_bytes(bytes: [u8; ACCOUNT_ID_LENGTH]) -> Self {
        AccountId(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; ACCOUNT_ID_LENGTH] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; ACCOUNT_ID_LENGTH]
    }

    /// Parses a classic `r...` address.
    pub fn from_classic_address(address: &str) -> Result<Self, AccountIdException> {
        let decoded = decode_classic_address(address)?;
        let bytes: [u8; ACCOUNT_ID_LENGTH] =
            decoded
                .as_slice()
                .try_into()
                .map_err(|_| AccountIdException::WrongLength {
                    expected: ACCOUNT_ID_LENGTH,
                    found: decoded.len(),
                })?;
        Ok(AccountId(bytes))
    }

    /// Renders the classic `r...` address.
    pub fn to_classic_address(&self) -> Result<String, AccountIdException> {
        Ok(encode_classic_address(&self.0)?)
    }
}

impl TryFrom<&str> for AccountId {
    type Error = AccountIdException;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        AccountId::from_classic_address(value)
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_classic_address() {
            Ok(address) => write!(f, "{}", address),
            Err(_) => write!(f, "<invalid account id>"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn roundtrips_classic_address() {
        let address = "r9cZA1mLK5R5Am25ArfXFmqgNwjZgnfk59";
        let account = AccountId::from_classic_address(address).unwrap();
        assert_eq!(account.to_classic_address().unwrap(), address);
    }

    #[test]
    fn zero_account_is_zero() {
        assert!(AccountId::ZERO.is_zero());
        assert!(!AccountId::from_classic_address("r9cZA1mLK5R5Am25ArfXFmqgNwjZgnfk59")
            .unwrap()
            .is_zero());
    }

    #[test]
    fn rejects_malformed_address() {
        assert!(AccountId::from_classic_address("not-an-address").is_err());
    }
}
