//! Classic address encoding, the only address form the flow engine touches:
//! ledger objects key accounts by raw 20-byte `AccountId`, and `r...`
//! addresses are how those bytes round-trip through test fixtures.

pub mod exceptions;
#[cfg(test)]
pub mod test_cases;
pub mod utils;

use crate::core::addresscodec::exceptions::XRPLAddressCodecException;
use crate::core::addresscodec::utils::XRPL_ALPHABET;
use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;

use super::exceptions::XRPLCoreResult;

const CLASSIC_ADDRESS_PREFIX: [u8; 1] = [0x0];
const CLASSIC_ADDRESS_LENGTH: u8 = 20;

/// Returns the base58 encoding of the bytestring, with the given data
/// prefix (which indicates type) while ensuring the bytestring is the
/// expected length.
fn encode_base58(
    bytestring: &[u8],
    prefix: &[u8],
    expected_length: Option<usize>,
) -> XRPLCoreResult<String> {
    if expected_length != Some(bytestring.len()) {
        Err(XRPLAddressCodecException::UnexpectedPayloadLength {
            expected: expected_length.unwrap_or_default(),
            found: bytestring.len(),
        }
        .into())
    } else {
        let mut payload = vec![];
        payload.extend_from_slice(prefix);
        payload.extend_from_slice(bytestring);

        Ok(bs58::encode(payload)
            .with_alphabet(&XRPL_ALPHABET)
            .with_check()
            .into_string())
    }
}

/// Returns the byte decoding of the base58-encoded string.
fn decode_base58(b58_string: &str, prefix: &[u8]) -> XRPLCoreResult<Vec<u8>> {
    let prefix_len = prefix.len();
    let decoded = bs58::decode(b58_string)
        .with_alphabet(&XRPL_ALPHABET)
        .with_check(None)
        .into_vec()?;

    if &decoded[..prefix_len] != prefix {
        Err(XRPLAddressCodecException::InvalidEncodingPrefixLength.into())
    } else {
        Ok(decoded[prefix_len..].to_vec())
    }
}

/// Returns the classic address encoding of these bytes as a base58 string.
///
/// # Examples
///
/// ```
/// use xrpl_flow::core::addresscodec::encode_classic_address;
///
/// let bytes: &[u8] = &[
///     94, 123, 17, 37, 35, 246, 141, 47, 94, 135, 157, 180,
///     234, 197, 28, 102, 152, 166, 147, 4
/// ];
///
/// assert_eq!(
///     encode_classic_address(bytes).unwrap(),
///     "r9cZA1mLK5R5Am25ArfXFmqgNwjZgnfk59",
/// );
/// ```
pub fn encode_classic_address(bytestring: &[u8]) -> XRPLCoreResult<String> {
    encode_base58(
        bytestring,
        &CLASSIC_ADDRESS_PREFIX,
        Some(CLASSIC_ADDRESS_LENGTH.into()),
    )
}

/// Returns the decoded bytes of the classic address.
///
/// # Examples
///
/// ```
/// use xrpl_flow::core::addresscodec::decode_classic_address;
///
/// let address = "r9cZA1mLK5R5Am25ArfXFmqgNwjZgnfk59";
/// assert_eq!(decode_classic_address(address).unwrap().len(), 20);
/// ```
pub fn decode_classic_address(classic_address: &str) -> XRPLCoreResult<Vec<u8>> {
    decode_base58(classic_address, &CLASSIC_ADDRESS_PREFIX)
}

/// Returns whether `classic_address` is a valid classic address.
pub fn is_valid_classic_address(classic_address: &str) -> bool {
    decode_base58(classic_address, &CLASSIC_ADDRESS_PREFIX).is_ok()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::core::addresscodec::test_cases::*;

    #[test]
    fn test_encode_classic_address_roundtrip() {
        for case in ADDRESS_TEST_CASES {
            let decoded = decode_classic_address(case.address).unwrap();
            let encoded = encode_classic_address(&decoded).unwrap();
            assert_eq!(case.address, encoded);
        }
    }

    #[test]
    fn test_is_valid_classic_address() {
        for case in ADDRESS_TEST_CASES {
            assert!(is_valid_classic_address(case.address));
        }
    }

    #[test]
    fn test_invalid_classic_address_rejected() {
        assert!(!is_valid_classic_address("not-an-address"));
        assert!(!is_valid_classic_address(""));
    }
}
