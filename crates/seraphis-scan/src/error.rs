//! Scan pipeline error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("crypto error during scan: {0}")]
    Crypto(#[from] seraphis_crypto::CryptoError),

    #[error("chunk failed semantics check")]
    InvalidChunk,

    #[error("ledger source unavailable: {0}")]
    LedgerUnavailable(String),

    #[error("exceeded max partialscan attempts ({0})")]
    TooManyPartialscans(u32),

    #[error("exceeded fullscan sanity cap ({0})")]
    TooManyFullscans(u32),

    #[error("scanned block ids inconsistent with alignment marker")]
    AlignmentInconsistent,

    #[error("{0}")]
    Other(String),
}
