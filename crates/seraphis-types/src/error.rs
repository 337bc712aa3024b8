//! Shared error primitives usable from any crate in the workspace.

use thiserror::Error;

/// Errors that don't belong to a single crate's domain: bad config values,
/// conversions between the small shared newtypes, that kind of thing.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("{0}")]
    Other(String),
}
