//! Client error taxonomy.

use feedsync_types::SyncError;
use thiserror::Error;

use crate::timeout::Timed;
use crate::transport::TransportError;

/// Errors surfaced by stores and trackers.
///
/// `Clone` so that coalesced callers can all receive the leader's failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// Transport error.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Deadline elapsed before the remote call settled.
    #[error("request timed out")]
    Timeout,

    /// Server answered with a failure sentinel.
    #[error("server failure {code}: {}", reason.as_deref().unwrap_or("no reason given"))]
    Api {
        /// Sentinel code.
        code: i64,
        /// Optional reason.
        reason: Option<String>,
    },

    /// Payload did not match the expected shape.
    #[error("decode error: {0}")]
    Decode(String),

    /// Shared model error.
    #[error(transparent)]
    Sync(#[from] SyncError),

    /// The in-flight request this caller was waiting on went away unsettled.
    #[error("in-flight request abandoned")]
    Abandoned,
}

impl ClientError {
    /// Check whether retrying later might succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Timeout | Self::Abandoned | Self::Transport(_)
        )
    }
}

impl From<Timed<TransportError>> for ClientError {
    fn from(e: Timed<TransportError>) -> Self {
        match e {
            Timed::TimedOut => ClientError::Timeout,
            Timed::Failed(e) => ClientError::Transport(e),
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(e: serde_json::Error) -> Self {
        ClientError::Decode(e.to_string())
    }
}
