//! Network-level failures.

use thiserror::Error;

/// Failure reported by a [`Transport`](crate::Transport) for one exchange.
///
/// Transport errors are opaque to the call executor: they are passed through
/// into the envelope unchanged. [`TransportError::Cancelled`] is the
/// distinguished subtype that consumers filter out of user-visible error
/// handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The exchange did not complete within the configured timeout.
    #[error("Request timed out")]
    Timeout,

    /// The exchange was cancelled before it completed.
    #[error("Request cancelled")]
    Cancelled,

    /// The server could not be reached.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// A cache-only load found no stored response.
    #[error("Resource unavailable: no cached response")]
    ResourceUnavailable,

    /// The transport produced neither a response nor an error.
    #[error("Bad server response")]
    BadServerResponse,

    /// Any other protocol or I/O failure.
    #[error("Transport failure: {0}")]
    Other(String),
}

impl TransportError {
    /// Returns `true` if this error reports an intentional cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Returns `true` if the origin could not be reached at all, as opposed
    /// to a cancellation or a cache-only miss.
    pub fn is_offline(&self) -> bool {
        matches!(self, Self::Timeout | Self::Connection(_))
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_connect() {
            Self::Connection(err.to_string())
        } else {
            Self::Other(err.to_string())
        }
    }
}
