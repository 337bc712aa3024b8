//! Shared types and constants for the seraphis enote core.
//!
//! This crate carries no cryptography of its own. It provides the
//! configuration structs and constants that `seraphis-crypto`,
//! `seraphis-multisig`, `seraphis-scan` and `seraphis-pool` all build
//! on top of.

pub mod constants;
pub mod error;
pub mod newtypes;

pub use constants::{PoolConfig, ScanConfig};
pub use error::CoreError;
pub use newtypes::{Amount, ScalarBytes};
