//! Response metadata and text encodings.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use url::Url;

use crate::error::ParseError;

/// Status line and headers of a received (or cached) response.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseMetadata {
    status: u16,
    headers: HeaderMap,
    url: Option<Url>,
}

impl ResponseMetadata {
    /// Creates metadata with the given status and no headers.
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            url: None,
        }
    }

    /// Adds a header, replacing any previous value.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Sets the final URL the response was received from.
    pub fn with_url(mut self, url: Url) -> Self {
        self.url = Some(url);
        self
    }

    pub(crate) fn from_reqwest(response: &reqwest::Response) -> Self {
        Self {
            status: response.status().as_u16(),
            headers: response.headers().clone(),
            url: Some(response.url().clone()),
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn url(&self) -> Option<&Url> {
        self.url.as_ref()
    }

    /// Returns `true` for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Returns the media type of the `Content-Type` header, without parameters.
    pub fn content_type(&self) -> Option<&str> {
        let value = self.headers.get(CONTENT_TYPE)?.to_str().ok()?;
        value.split(';').next().map(str::trim)
    }

    /// Returns the text encoding named by the `charset` parameter of the
    /// `Content-Type` header, defaulting to UTF-8.
    pub fn text_encoding(&self) -> TextEncoding {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| {
                v.split(';').skip(1).find_map(|param| {
                    let (key, value) = param.split_once('=')?;
                    key.trim()
                        .eq_ignore_ascii_case("charset")
                        .then(|| TextEncoding::from_charset(value.trim().trim_matches('"')))
                        .flatten()
                })
            })
            .unwrap_or_default()
    }
}

/// Text encodings a response body may be decoded with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextEncoding {
    #[default]
    Utf8,
    /// ISO-8859-1.
    Latin1,
    /// US-ASCII.
    Ascii,
}

impl TextEncoding {
    /// Resolves a `charset` label. Unknown labels return `None`.
    pub fn from_charset(label: &str) -> Option<Self> {
        match label.to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" => Some(Self::Utf8),
            "iso-8859-1" | "latin1" | "iso_8859-1" => Some(Self::Latin1),
            "us-ascii" | "ascii" => Some(Self::Ascii),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Utf8 => "UTF-8",
            Self::Latin1 => "ISO-8859-1",
            Self::Ascii => "US-ASCII",
        }
    }

    /// Decodes `bytes` as text in this encoding.
    ///
    /// ## Errors
    ///
    /// Returns [`ParseError::Decoding`] if the bytes are not valid in this encoding.
    pub fn decode(&self, bytes: &[u8]) -> Result<String, ParseError> {
        let decoding = || ParseError::Decoding {
            encoding: self.name(),
        };
        match self {
            Self::Utf8 => String::from_utf8(bytes.to_vec()).map_err(|_| decoding()),
            // Every byte maps to the code point of the same value.
            Self::Latin1 => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
            Self::Ascii => {
                if bytes.is_ascii() {
                    Ok(bytes.iter().map(|&b| char::from(b)).collect())
                } else {
                    Err(decoding())
                }
            }
        }
    }
}
