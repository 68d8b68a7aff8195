//! Error types shared across feedsync crates.

use thiserror::Error;

/// Errors that can occur while addressing entities.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    /// Entity reference could not be parsed
    #[error("invalid entity reference: {0:?}")]
    InvalidId(String),
}
