//! Session, call and environment configuration errors.

use thiserror::Error;

/// Errors in session or call configuration.
///
/// These indicate programmer errors or bad environment values rather than
/// failures of a particular exchange.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// URL parsing or joining failed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// A header name or value could not be encoded.
    #[error("Invalid header {name}: {message}")]
    InvalidHeader {
        /// The offending header name.
        name: String,
        /// Why it was rejected.
        message: String,
    },

    /// A required configuration field is missing.
    #[error("Missing required field: {field}")]
    MissingField {
        /// The name of the missing field.
        field: &'static str,
    },

    /// An environment variable holds a value that cannot be used.
    #[error("Invalid value for {var}: {message}")]
    InvalidEnv {
        /// The environment variable name.
        var: &'static str,
        /// Why the value was rejected.
        message: String,
    },

    /// A session was built outside of a tokio runtime.
    #[error("No tokio runtime available to run calls")]
    NoRuntime,

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client construction failed: {0}")]
    Client(String),
}

impl ConfigError {
    /// Creates a missing field error.
    pub fn missing_field(field: &'static str) -> Self {
        Self::MissingField { field }
    }

    /// Creates an invalid header error.
    pub fn invalid_header(name: impl Into<String>, message: impl ToString) -> Self {
        Self::InvalidHeader {
            name: name.into(),
            message: message.to_string(),
        }
    }
}
