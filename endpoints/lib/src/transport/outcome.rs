use std::fmt;

use bytes::Bytes;

use crate::error::TransportError;
use crate::response::ResponseMetadata;

/// What a transport observed for one exchange.
///
/// Any combination of the three slots is possible; the executor decides
/// what it means. An error wins over a body when both are present.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransportOutcome {
    pub response: Option<ResponseMetadata>,
    pub body: Option<Bytes>,
    pub error: Option<TransportError>,
}

impl TransportOutcome {
    /// A response was received with the given body.
    pub fn received(response: ResponseMetadata, body: impl Into<Bytes>) -> Self {
        Self {
            response: Some(response),
            body: Some(body.into()),
            error: None,
        }
    }

    /// The exchange failed before a response arrived.
    pub fn failed(error: TransportError) -> Self {
        Self {
            response: None,
            body: None,
            error: Some(error),
        }
    }

    /// Attaches an error to an outcome, e.g. a body read that failed after
    /// the status line arrived.
    pub fn with_error(mut self, error: TransportError) -> Self {
        self.error = Some(error);
        self
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

// Debug dump used by session debug logging.
impl fmt::Display for TransportOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(response) = &self.response else {
            return match &self.error {
                Some(error) => write!(f, "no response. error: {error}"),
                None => write!(f, "no response. error: <no error>"),
            };
        };

        writeln!(f, "{}", response.status())?;
        for (name, value) in response.headers() {
            writeln!(f, "-{}: {}", name, String::from_utf8_lossy(value.as_bytes()))?;
        }

        let text = self
            .body
            .as_ref()
            .and_then(|body| response.text_encoding().decode(body).ok());
        match text {
            Some(text) if text.is_empty() => write!(f, "<empty>"),
            Some(text) => write!(f, "{text}"),
            None => write!(f, "<no data>"),
        }
    }
}
