//! Crypto-layer error type.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("point is not a valid curve encoding")]
    InvalidPoint,

    #[error("scalar is not a valid field element")]
    InvalidScalar,

    #[error("required secret ({0}) is not present in this key set")]
    MissingSecret(&'static str),

    #[error("onetime address does not match the recomputed value")]
    OnetimeAddressMismatch,

    #[error("view tag does not match")]
    ViewTagMismatch,

    #[error("address tag failed to decipher")]
    AddressTagMismatch,

    #[error("address index out of range")]
    AddressIndexOutOfRange,

    #[error("composition proof transcript or response scalar was invalid")]
    InvalidProof,

    #[error("{0}")]
    Other(String),
}
