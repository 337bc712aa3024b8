//! Typed wrappers around the raw integers/bytes that cross crate
//! boundaries, so a caller can't accidentally hand an amount where a
//! block height is expected or vice versa. No cryptography lives here —
//! `ScalarBytes` is just the 32-byte wire form a scalar takes before
//! `seraphis-crypto` decodes it.

use serde::{Deserialize, Serialize};

/// An output amount, in atomic units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Amount(pub u64);

impl From<u64> for Amount {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<Amount> for u64 {
    fn from(value: Amount) -> Self {
        value.0
    }
}

impl std::fmt::Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The 32-byte canonical encoding of a scalar, carried at crate
/// boundaries that have no reason to depend on `seraphis-crypto`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScalarBytes(pub [u8; 32]);

impl From<[u8; 32]> for ScalarBytes {
    fn from(value: [u8; 32]) -> Self {
        Self(value)
    }
}

impl From<ScalarBytes> for [u8; 32] {
    fn from(value: ScalarBytes) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amount_round_trips_through_u64() {
        let a = Amount::from(42u64);
        assert_eq!(u64::from(a), 42);
        assert_eq!(a.to_string(), "42");
    }

    #[test]
    fn scalar_bytes_round_trips_through_array() {
        let bytes = [7u8; 32];
        let s = ScalarBytes::from(bytes);
        assert_eq!(<[u8; 32]>::from(s), bytes);
    }
}
