//! Session-level authorization.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::header::{HeaderName, HeaderValue, AUTHORIZATION};

use crate::error::ConfigError;
use crate::transport::TransportRequest;

/// How a session authenticates its requests.
///
/// The authorization is applied after a call is encoded, so it takes part in
/// the request's cache key and is shown (redacted) in curl dumps.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Authorization {
    /// No authentication.
    #[default]
    None,
    /// `Authorization: Bearer <token>`.
    Bearer(String),
    /// A key sent in a custom header, e.g. `X-API-Key`.
    ApiKey { header: String, key: String },
    /// A key appended as a query parameter.
    QueryParam { name: String, key: String },
    /// `Authorization: Basic base64(user:password)`.
    Basic { user: String, password: String },
}

impl Authorization {
    pub fn bearer(token: impl Into<String>) -> Self {
        Self::Bearer(token.into())
    }

    pub fn basic(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Basic {
            user: user.into(),
            password: password.into(),
        }
    }

    /// Applies the authorization to an encoded request.
    ///
    /// ## Errors
    ///
    /// Returns an error if the header name or credential cannot be sent as a
    /// header.
    pub fn apply(&self, request: &mut TransportRequest) -> Result<(), ConfigError> {
        match self {
            Self::None => {}
            Self::Bearer(token) => {
                let value = sensitive_value("authorization", &format!("Bearer {token}"))?;
                request.headers_mut().insert(AUTHORIZATION, value);
            }
            Self::ApiKey { header, key } => {
                let name = HeaderName::try_from(header.as_str())
                    .map_err(|e| ConfigError::invalid_header(header.as_str(), e))?;
                let value = sensitive_value(header, key)?;
                request.headers_mut().insert(name, value);
            }
            Self::QueryParam { name, key } => {
                request.url_mut().query_pairs_mut().append_pair(name, key);
            }
            Self::Basic { user, password } => {
                let encoded = STANDARD.encode(format!("{user}:{password}"));
                let value = sensitive_value("authorization", &format!("Basic {encoded}"))?;
                request.headers_mut().insert(AUTHORIZATION, value);
            }
        }
        Ok(())
    }
}

fn sensitive_value(name: &str, value: &str) -> Result<HeaderValue, ConfigError> {
    let mut value =
        HeaderValue::try_from(value).map_err(|e| ConfigError::invalid_header(name, e))?;
    value.set_sensitive(true);
    Ok(value)
}
