//! General XRPL Address Codec Exception.

#[derive(Debug)]
#[non_exhaustive]
pub enum XRPLAddressCodecException {
    InvalidEncodingPrefixLength,
    UnexpectedPayloadLength { expected: usize, found: usize },
    Base58DecodeError(bs58::decode::Error),
}

impl From<bs58::decode::Error> for XRPLAddressCodecException {
    fn from(err: bs58::decode::Error) -> Self {
        XRPLAddressCodecException::Base58DecodeError(err)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for XRPLAddressCodecException {}
