use thiserror_no_std::Error;

use super::addresscodec::exceptions::XRPLAddressCodecException;

pub type XRPLCoreResult<T, E = XRPLCoreException> = core::result::Result<T, E>;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum XRPLCoreException {
    #[error("XRPL Address Codec error: {0}")]
    XRPLAddressCodecError(#[from] XRPLAddressCodecException),
    #[error("Base58 error: {0}")]
    Bs58Error(#[from] bs58::decode::Error),
}

#[cfg(feature = "std")]
impl std::error::Error for XRPLCoreException {}
