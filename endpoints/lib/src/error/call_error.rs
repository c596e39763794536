//! Failures of an awaited call.

use thiserror::Error;

use super::CallFailure;
use crate::response::CallOutput;

/// Failure of an awaited [`PendingCall`](crate::PendingCall).
///
/// A live attempt that fails is never silently replaced by cached data on
/// this channel: when offline caching finds a stored response it is offered
/// through [`CallError::NoResponseWithCache`] next to the original failure.
///
/// ## Examples
///
/// ```rust,ignore
/// match session.call(&call, CachePolicy::Normal, true).await {
///     Ok(output) => render(output.value),
///     Err(CallError::NoResponseWithCache { cached, cause }) => {
///         warn!("showing cached data: {cause}");
///         render(cached.value)
///     }
///     Err(err) if err.is_cancelled() => {}
///     Err(err) => report(err),
/// }
/// ```
#[derive(Debug, Error)]
pub enum CallError<T> {
    /// The live attempt failed and offline caching was not requested.
    #[error("No response from origin")]
    NoResponse {
        /// The envelope error of the live attempt, if there was one.
        #[source]
        cause: Option<CallFailure>,
    },

    /// The live attempt failed and no cached response was available.
    #[error("No response from origin and no cached response")]
    NoResponseNoCache {
        /// The envelope error of the live attempt.
        #[source]
        cause: CallFailure,
    },

    /// The live attempt failed but a cached response is available.
    #[error("No response from origin, cached response available")]
    NoResponseWithCache {
        /// The cached result, tagged with its source.
        cached: Box<CallOutput<T>>,
        /// The envelope error of the live attempt.
        #[source]
        cause: CallFailure,
    },

    /// The caller cancelled the call.
    #[error("Call cancelled")]
    Cancelled,
}

impl<T> CallError<T> {
    /// Returns `true` if the call was cancelled by the caller, or the live
    /// attempt itself reported a cancellation.
    pub fn is_cancelled(&self) -> bool {
        match self {
            Self::Cancelled => true,
            Self::NoResponse { cause: Some(cause) } => cause.is_cancelled(),
            _ => false,
        }
    }

    /// Returns the cached result offered alongside the failure, if any.
    pub fn cached(&self) -> Option<&CallOutput<T>> {
        match self {
            Self::NoResponseWithCache { cached, .. } => Some(cached),
            _ => None,
        }
    }

    /// Consumes the error, returning the cached result if one was offered.
    pub fn into_cached(self) -> Option<CallOutput<T>> {
        match self {
            Self::NoResponseWithCache { cached, .. } => Some(*cached),
            _ => None,
        }
    }

    /// Returns the envelope error of the live attempt, if known.
    pub fn cause(&self) -> Option<&CallFailure> {
        match self {
            Self::NoResponse { cause } => cause.as_ref(),
            Self::NoResponseNoCache { cause } | Self::NoResponseWithCache { cause, .. } => {
                Some(cause)
            }
            Self::Cancelled => None,
        }
    }
}
