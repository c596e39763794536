//! The error slot of a call envelope.

use thiserror::Error;

use super::{ConfigError, ParseError, TransportError};

/// Why a single executed call did not produce a value.
///
/// Every failure path of the call executor resolves into one of these and is
/// stored in [`CallResult::error`](crate::CallResult::error); nothing is
/// raised past the executor.
#[derive(Debug, Error)]
pub enum CallFailure {
    /// The transport failed (timeout, connection, cancellation, cache miss).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A response arrived with a status outside the call's acceptable range.
    #[error("Unacceptable status {status}: {message}")]
    UnacceptableStatus {
        /// The HTTP status code returned.
        status: u16,
        /// The start of the response body, if it was text.
        message: String,
    },

    /// The response body did not match the declared output format.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The call could not be encoded into a request.
    #[error("Invalid request: {0}")]
    InvalidRequest(#[from] ConfigError),
}

impl CallFailure {
    /// Returns `true` if this failure is an intentional cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Transport(e) if e.is_cancelled())
    }

    /// Returns the transport error, if this is a transport failure.
    pub fn transport(&self) -> Option<&TransportError> {
        match self {
            Self::Transport(e) => Some(e),
            _ => None,
        }
    }

    /// Returns the HTTP status for unacceptable-status failures.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::UnacceptableStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancellation_is_detected_through_transport() {
        let err: CallFailure = TransportError::Cancelled.into();
        assert!(err.is_cancelled());
        assert_eq!(err.transport(), Some(&TransportError::Cancelled));

        let err: CallFailure = TransportError::Timeout.into();
        assert!(!err.is_cancelled());
    }

    #[test]
    fn status_code_only_for_unacceptable_status() {
        let err = CallFailure::UnacceptableStatus {
            status: 400,
            message: "bad request".into(),
        };
        assert_eq!(err.status_code(), Some(400));
        assert_eq!(err.to_string(), "Unacceptable status 400: bad request");

        let err: CallFailure = ParseError::EmptyBody.into();
        assert_eq!(err.status_code(), None);
    }

    #[test]
    fn transparent_display() {
        let err: CallFailure = TransportError::Timeout.into();
        assert_eq!(err.to_string(), "Request timed out");
    }
}
