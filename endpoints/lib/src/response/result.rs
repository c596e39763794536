//! The uniform result envelope of one executed call.

use super::ResponseMetadata;
use crate::error::CallFailure;

/// Where the value of a delivered result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Source {
    /// Neither origin nor cache produced the result (failures, fakes).
    None,
    /// A live network exchange.
    Origin,
    /// A previously stored response.
    Cache,
}

/// Value-or-error plus response metadata for one completed call.
///
/// Fields are fixed at construction; `is_success` and `is_error` are derived
/// from the error slot and cannot be set independently.
///
/// ## Examples
///
/// ```rust,ignore
/// session.execute(&call, CachePolicy::Normal, false, Box::new(|result, source| {
///     result
///         .on_success(|value| println!("{value:?} from {source}"))
///         .on_error(|err| eprintln!("request failed: {err}"));
/// }));
/// ```
#[derive(Debug)]
pub struct CallResult<T> {
    value: Option<T>,
    error: Option<CallFailure>,
    response: Option<ResponseMetadata>,
}

impl<T> CallResult<T> {
    /// A successful envelope. Used by [`CallExecutor`](crate::CallExecutor)
    /// implementations.
    pub fn success(value: T, response: Option<ResponseMetadata>) -> Self {
        Self {
            value: Some(value),
            error: None,
            response,
        }
    }

    /// A failed envelope, optionally with the response that was received.
    pub fn failure(error: impl Into<CallFailure>, response: Option<ResponseMetadata>) -> Self {
        Self {
            value: None,
            error: Some(error.into()),
            response,
        }
    }

    pub fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub fn error(&self) -> Option<&CallFailure> {
        self.error.as_ref()
    }

    pub fn response(&self) -> Option<&ResponseMetadata> {
        self.response.as_ref()
    }

    /// Status code of the response, if one was received.
    pub fn status_code(&self) -> Option<u16> {
        self.response.as_ref().map(ResponseMetadata::status)
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn is_success(&self) -> bool {
        !self.is_error()
    }

    /// Returns `true` if the call failed because it was cancelled.
    pub fn was_cancelled(&self) -> bool {
        self.error.as_ref().is_some_and(CallFailure::is_cancelled)
    }

    /// Runs `reaction` with the value, if there is one.
    pub fn on_success(self, reaction: impl FnOnce(&T)) -> Self {
        if let Some(value) = &self.value {
            reaction(value);
        }
        self
    }

    /// Runs `reaction` with the error, unless the call was cancelled.
    pub fn on_error(self, reaction: impl FnOnce(&CallFailure)) -> Self {
        if let Some(error) = &self.error {
            if !error.is_cancelled() {
                reaction(error);
            }
        }
        self
    }

    /// Splits the envelope into its parts.
    pub fn into_parts(self) -> (Option<T>, Option<CallFailure>, Option<ResponseMetadata>) {
        (self.value, self.error, self.response)
    }

    /// Converts into a `Result`, dropping the metadata.
    ///
    /// A success envelope without a value (possible only from custom
    /// executors) is reported as [`TransportError::BadServerResponse`](crate::TransportError::BadServerResponse).
    pub fn into_result(self) -> Result<T, CallFailure> {
        match (self.value, self.error) {
            (_, Some(error)) => Err(error),
            (Some(value), None) => Ok(value),
            (None, None) => Err(crate::TransportError::BadServerResponse.into()),
        }
    }
}

/// The successful outcome of an awaited call.
#[derive(Debug, Clone, PartialEq)]
pub struct CallOutput<T> {
    pub value: T,
    pub response: ResponseMetadata,
    pub source: Source,
}
