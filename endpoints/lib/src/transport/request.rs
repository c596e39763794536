use std::fmt;
use std::time::Duration;

use bytes::Bytes;
use reqwest::header::{HeaderMap, ACCEPT, ACCEPT_LANGUAGE, AUTHORIZATION};
use url::Url;

use crate::cache::CachePolicy;
use crate::method::RestMethod;

/// Headers whose values select a different stored response.
const VARY_HEADERS: [reqwest::header::HeaderName; 3] = [ACCEPT, ACCEPT_LANGUAGE, AUTHORIZATION];

/// A fully encoded request, ready for a [`Transport`](super::Transport).
#[derive(Debug, Clone)]
pub struct TransportRequest {
    method: RestMethod,
    url: Url,
    headers: HeaderMap,
    body: Option<Bytes>,
    timeout: Option<Duration>,
    cache_policy: CachePolicy,
}

impl TransportRequest {
    pub fn new(method: RestMethod, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: None,
            timeout: None,
            cache_policy: CachePolicy::Normal,
        }
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_cache_policy(mut self, policy: CachePolicy) -> Self {
        self.cache_policy = policy;
        self
    }

    pub fn method(&self) -> RestMethod {
        self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn url_mut(&mut self) -> &mut Url {
        &mut self.url
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn cache_policy(&self) -> CachePolicy {
        self.cache_policy
    }

    /// Returns the key this request's response is stored under.
    pub fn key(&self) -> RequestKey {
        let mut vary: Vec<(String, String)> = VARY_HEADERS
            .iter()
            .filter_map(|name| {
                let value = self.headers.get(name)?;
                Some((
                    name.as_str().to_owned(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                ))
            })
            .collect();
        vary.sort();

        RequestKey {
            method: self.method,
            url: self.url.to_string(),
            vary,
        }
    }

    /// Renders the request as a `curl` command line.
    ///
    /// Sensitive header values (such as credentials) are redacted. A `-d`
    /// argument is always present so curl sends a `Content-Length`.
    ///
    /// ## Examples
    ///
    /// ```rust
    /// use endpoints::{RestMethod, TransportRequest};
    /// use url::Url;
    ///
    /// let request = TransportRequest::new(RestMethod::Get, Url::parse("http://httpbin.org/get")?);
    /// assert_eq!(
    ///     request.curl_representation(false),
    ///     r#"$ curl -i -X GET -d "" "http://httpbin.org/get""#
    /// );
    /// # Ok::<(), url::ParseError>(())
    /// ```
    pub fn curl_representation(&self, pretty: bool) -> String {
        let mut parts = vec!["$ curl -i".to_string(), format!("-X {}", self.method)];

        for (name, value) in &self.headers {
            let value = if value.is_sensitive() {
                "<redacted>".to_string()
            } else {
                String::from_utf8_lossy(value.as_bytes()).into_owned()
            };
            parts.push(format!("-H \"{name}: {value}\""));
        }

        let body = self
            .body
            .as_ref()
            .and_then(|b| std::str::from_utf8(b).ok())
            .map(|s| s.replace("\\\"", "\\\\\"").replace('"', "\\\""))
            .unwrap_or_default();
        parts.push(format!("-d \"{body}\""));
        parts.push(format!("\"{}\"", self.url));

        parts.join(if pretty { " \\\n\t" } else { " " })
    }
}

/// Identity of a request for caching purposes.
///
/// Two requests share a key when method, URL and the values of the
/// `Accept`, `Accept-Language` and `Authorization` headers match.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestKey {
    method: RestMethod,
    url: String,
    vary: Vec<(String, String)>,
}

impl RequestKey {
    pub fn method(&self) -> RestMethod {
        self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

// Header values stay out of the display form; it ends up in logs.
impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}
