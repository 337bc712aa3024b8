//! Threshold signing support for the Seraphis composition proof: nonce
//! bookkeeping (`nonce_record`) plus the MuSig2-style multisig
//! composition proof itself (`composition_multisig`).

pub mod composition_multisig;
pub mod constants;
pub mod nonce_record;
