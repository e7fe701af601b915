//! Currency codes: either the native asset (XRP, settled in drops) or a
//! 160-bit issued-currency code scoped to an issuer.

use alloc::string::{String, ToString};
use core::fmt;
use serde::{Deserialize, Serialize};
use thiserror_no_std::Error;

use crate::utils::{is_iso_code, is_iso_hex};

/// Raw byte length of a non-native currency code.
pub const CURRENCY_CODE_LENGTH: usize = 20;

#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum CurrencyException {
    #[error("currency code is neither a 3-char ISO code nor a 40-char hex code: {0}")]
    Malformed(String),
    #[error("\"XRP\" is reserved for the native currency and cannot be an issued-currency code")]
    ReservedCode,
}

#[cfg(feature = "std")]
impl std::error::Error for CurrencyException {}

/// A non-native currency code, stored in its canonical 160-bit form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CurrencyCode([u8; CURRENCY_CODE_LENGTH]);

impl CurrencyCode {
    /// Builds the 160-bit code from a 3-letter ISO code (`"USD"`, `"EUR"`, …),
    /// left-padded with zero bytes the way rippled serializes short codes.
    pub fn from_iso(code: &str) -> Result<Self, CurrencyException> {
        if !is_iso_code(code) {
            return Err(CurrencyException::Malformed(code.to_string()));
        }
        if code.eq_ignore_ascii_case("XRP") {
            return Err(CurrencyException::ReservedCode);
        }
        let mut bytes = [0u8; CURRENCY_CODE_LENGTH];
        bytes[12..15].copy_from_slice(code.as_bytes());
        Ok(CurrencyCode(bytes))
    }

    /// Builds the 160-bit code from its 40-char hex representation.
    pub fn from_hex(code: &str) -> Result<Self, CurrencyException> {
        if !is_iso_hex(code) {
            return Err(CurrencyException::Malformed(code.to_string()));
        }
        let decoded = hex::decode(code).map_err(|_| CurrencyException::Malformed(code.to_string()))?;
        let mut bytes = [0u8; CURRENCY_CODE_LENGTH];
        bytes.copy_from_slice(&decoded);
        Ok(CurrencyCode(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; CURRENCY_CODE_LENGTH] {
        &self.0
    }

    /// True if bytes 12..15 hold an ISO code and the rest is zero padding —
    /// the standard-format currency code rippled renders as 3 letters.
    fn iso_suffix(&self) -> Option<&str> {
        let is_standard_format = self.0[..12].iter().all(|b| *b == 0)
            && self.0[15..].iter().all(|b| *b == 0)
            && self.0[12..15].iter().all(|b| b.is_ascii_uppercase() || b.is_ascii_digit());
        if is_standard_format {
            core::str::from_utf8(&self.0[12..15]).ok()
        } else {
            None
        }
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.iso_suffix() {
            Some(iso) => write!(f, "{}", iso),
            None => write!(f, "{}", hex::encode_upper(self.0)),
        }
    }
}

/// A currency, native or issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Currency {
    Native,
    Issued(CurrencyCode),
}

impl Currency {
    pub fn is_native(&self) -> bool {
        matches!(self, Currency::Native)
    }

    pub fn iso(code: &str) -> Result<Self, CurrencyException> {
        Ok(Currency::Issued(CurrencyCode::from_iso(code)?))
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Currency::Native => write!(f, "XRP"),
            Currency::Issued(code) => write!(f, "{}", code),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn renders_standard_iso_code() {
        let usd = Currency::iso("USD").unwrap();
        assert_eq!(usd.to_string(), "USD");
    }

    #[test]
    fn rejects_xrp_as_issued_code() {
        assert_eq!(Currency::iso("XRP"), Err(CurrencyException::ReservedCode));
    }

    #[test]
    fn non_standard_code_renders_as_hex() {
        let code = CurrencyCode::from_hex("0158415500000000C1F76FF6ECB0BAC600000000").unwrap();
        let rendered = code.to_string();
        assert_eq!(rendered.len(), 40);
    }

    #[test]
    fn native_is_native() {
        assert!(Currency::Native.is_native());
        assert!(!Currency::iso("USD").unwrap().is_native());
    }
}
