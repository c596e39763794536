//! Call description with a type-state builder.
//!
//! A [`Call`] is a declarative description of one request: method, path,
//! query, headers, body and the acceptable status range. Its response format
//! `F` fixes the output type at compile time. The [`CallBuilder`] uses a
//! type-state pattern so a call cannot be built without a method and a path.

use std::marker::PhantomData;
use std::ops::RangeInclusive;
use std::time::Duration;

use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE};
use url::Url;

use crate::error::ConfigError;
use crate::method::RestMethod;
use crate::response::ResponseFormat;
use crate::transport::TransportRequest;

/// Marker types for builder state tracking.
pub mod builder_state {
    /// Marker for a field that has not been set.
    pub struct Missing;
    /// Marker for a field that has been set.
    pub struct Present;
}

use builder_state::{Missing, Present};

/// Statuses accepted when a call does not say otherwise.
pub const DEFAULT_ACCEPTABLE_STATUS: RangeInclusive<u16> = 200..=299;

/// A typed description of one HTTP request.
///
/// Calls are immutable once built and are only read by executors.
///
/// ## Examples
///
/// ```rust
/// use endpoints::{Call, RestMethod};
/// use endpoints::response::JsonObject;
///
/// let call: Call<JsonObject> = Call::builder()
///     .method(RestMethod::Get)
///     .path("/get")
///     .query("inputParam", "inputParamValue")
///     .build();
///
/// assert_eq!(call.method(), RestMethod::Get);
/// assert!(call.accepts(200));
/// assert!(!call.accepts(400));
/// ```
#[derive(Debug)]
pub struct Call<F: ResponseFormat> {
    id: Option<String>,
    method: RestMethod,
    path: String,
    query: Vec<(String, String)>,
    headers: Vec<(String, String)>,
    body: Option<Bytes>,
    acceptable_status: RangeInclusive<u16>,
    timeout: Option<Duration>,
    description: Option<String>,
    _format: PhantomData<fn() -> F>,
}

// Manual Clone: F itself need not be Clone.
impl<F: ResponseFormat> Clone for Call<F> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            method: self.method,
            path: self.path.clone(),
            query: self.query.clone(),
            headers: self.headers.clone(),
            body: self.body.clone(),
            acceptable_status: self.acceptable_status.clone(),
            timeout: self.timeout,
            description: self.description.clone(),
            _format: PhantomData,
        }
    }
}

impl<F: ResponseFormat> Call<F> {
    /// Creates a new call builder.
    pub fn builder() -> CallBuilder<Missing, Missing, F> {
        CallBuilder::new()
    }

    /// Starts a GET call for `path`.
    pub fn get(path: impl Into<String>) -> CallBuilder<Present, Present, F> {
        Self::builder().method(RestMethod::Get).path(path)
    }

    /// Starts a POST call for `path`.
    pub fn post(path: impl Into<String>) -> CallBuilder<Present, Present, F> {
        Self::builder().method(RestMethod::Post).path(path)
    }

    /// Optional identifier used in logs.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn method(&self) -> RestMethod {
        self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn acceptable_status(&self) -> &RangeInclusive<u16> {
        &self.acceptable_status
    }

    /// Returns `true` if `status` is within the acceptable status range.
    pub fn accepts(&self, status: u16) -> bool {
        self.acceptable_status.contains(&status)
    }

    /// Encodes the call into a transport request relative to `base_url`.
    ///
    /// The path is appended to the base URL's path (a leading `/` is
    /// ignored), query pairs are percent-encoded in order, and the format's
    /// content type is sent as `Accept` unless the call overrides it.
    ///
    /// ## Errors
    ///
    /// Returns an error if the URL cannot be joined or a header is invalid.
    pub fn encode(&self, base_url: &Url) -> Result<TransportRequest, ConfigError> {
        let mut url = join_path(base_url, &self.path)?;
        if !self.query.is_empty() {
            url.query_pairs_mut().extend_pairs(self.query.iter());
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(F::content_type()));
        for (name, value) in &self.headers {
            let header_name = HeaderName::try_from(name.as_str())
                .map_err(|e| ConfigError::invalid_header(name, e))?;
            let header_value = HeaderValue::try_from(value.as_str())
                .map_err(|e| ConfigError::invalid_header(name, e))?;
            headers.insert(header_name, header_value);
        }

        let mut request = TransportRequest::new(self.method, url).with_headers(headers);
        if let Some(body) = &self.body {
            request = request.with_body(body.clone());
        }
        if let Some(timeout) = self.timeout {
            request = request.with_timeout(timeout);
        }
        Ok(request)
    }
}

/// Appends `path` to the base URL's path instead of replacing its last segment.
fn join_path(base_url: &Url, path: &str) -> Result<Url, url::ParseError> {
    let mut base = base_url.clone();
    if !base.path().ends_with('/') {
        let with_slash = format!("{}/", base.path());
        base.set_path(&with_slash);
    }
    base.join(path.trim_start_matches('/'))
}

/// Type-state builder for [`Call`].
///
/// ## Type Parameters
///
/// - `M`: State of the method field (`Missing` or `Present`).
/// - `P`: State of the path field (`Missing` or `Present`).
/// - `F`: The response format type.
pub struct CallBuilder<M, P, F: ResponseFormat> {
    call: Call<F>,
    _state: PhantomData<(M, P)>,
}

impl<F: ResponseFormat> CallBuilder<Missing, Missing, F> {
    pub fn new() -> Self {
        Self {
            call: Call {
                id: None,
                method: RestMethod::Get,
                path: String::new(),
                query: Vec::new(),
                headers: Vec::new(),
                body: None,
                acceptable_status: DEFAULT_ACCEPTABLE_STATUS,
                timeout: None,
                description: None,
                _format: PhantomData,
            },
            _state: PhantomData,
        }
    }
}

impl<F: ResponseFormat> Default for CallBuilder<Missing, Missing, F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P, F: ResponseFormat> CallBuilder<Missing, P, F> {
    /// Sets the HTTP method.
    pub fn method(mut self, method: RestMethod) -> CallBuilder<Present, P, F> {
        self.call.method = method;
        CallBuilder {
            call: self.call,
            _state: PhantomData,
        }
    }
}

impl<M, F: ResponseFormat> CallBuilder<M, Missing, F> {
    /// Sets the path, relative to the session's base URL.
    ///
    /// The path may contain `{name}` placeholders filled by [`path_param`](CallBuilder::path_param).
    pub fn path(mut self, path: impl Into<String>) -> CallBuilder<M, Present, F> {
        self.call.path = path.into();
        CallBuilder {
            call: self.call,
            _state: PhantomData,
        }
    }
}

impl<M, F: ResponseFormat> CallBuilder<M, Present, F> {
    /// Replaces the `{name}` placeholder in the path with `value`.
    pub fn path_param(mut self, name: &str, value: impl AsRef<str>) -> Self {
        self.call.path = self
            .call
            .path
            .replace(&format!("{{{name}}}"), value.as_ref());
        self
    }
}

// Optional fields - available in any state
impl<M, P, F: ResponseFormat> CallBuilder<M, P, F> {
    /// Sets an identifier used in logs.
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.call.id = Some(id.into());
        self
    }

    /// Appends a query parameter. Order is preserved.
    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.call.query.push((name.into(), value.into()));
        self
    }

    /// Adds a request header. Names and values are validated when encoding.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.call.headers.push((name.into(), value.into()));
        self
    }

    /// Sets the raw request body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.call.body = Some(body.into());
        self
    }

    /// Serializes `body` as JSON and sets the `Content-Type` header.
    ///
    /// ## Errors
    ///
    /// Returns an error if `body` cannot be serialized.
    pub fn json_body<B: serde::Serialize>(self, body: &B) -> Result<Self, serde_json::Error> {
        let bytes = serde_json::to_vec(body)?;
        Ok(self
            .header(CONTENT_TYPE.as_str(), "application/json")
            .body(bytes))
    }

    /// Replaces the acceptable status range (default `200..=299`).
    pub fn acceptable_status(mut self, range: RangeInclusive<u16>) -> Self {
        self.call.acceptable_status = range;
        self
    }

    /// Sets a per-call timeout, overriding the session timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.call.timeout = Some(timeout);
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.call.description = Some(description.into());
        self
    }
}

impl<F: ResponseFormat> CallBuilder<Present, Present, F> {
    /// Builds the call. Only available once method and path are set.
    pub fn build(self) -> Call<F> {
        self.call
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::{BinaryFormat, JsonObject, TextFormat};

    fn base() -> Url {
        Url::parse("http://httpbin.org").unwrap()
    }

    #[test]
    fn builder_sets_required_fields_in_any_order() {
        let call: Call<JsonObject> = Call::builder()
            .path("/post")
            .description("Echo a body")
            .method(RestMethod::Post)
            .build();

        assert_eq!(call.method(), RestMethod::Post);
        assert_eq!(call.path(), "/post");
        assert_eq!(call.description(), Some("Echo a body"));
        assert_eq!(call.acceptable_status(), &DEFAULT_ACCEPTABLE_STATUS);
    }

    #[test]
    fn leading_slash_is_optional() {
        let with: Call<BinaryFormat> = Call::get("/get").build();
        let without: Call<BinaryFormat> = Call::get("get").build();

        assert_eq!(with.encode(&base()).unwrap().url().as_str(), "http://httpbin.org/get");
        assert_eq!(without.encode(&base()).unwrap().url().as_str(), "http://httpbin.org/get");
    }

    #[test]
    fn path_is_appended_to_base_path() {
        let base = Url::parse("https://api.example.com/v1").unwrap();
        let call: Call<BinaryFormat> = Call::get("users/{id}").path_param("id", "42").build();
        assert_eq!(
            call.encode(&base).unwrap().url().as_str(),
            "https://api.example.com/v1/users/42"
        );
    }

    #[test]
    fn query_is_percent_encoded_in_order() {
        let call: Call<BinaryFormat> = Call::get("get")
            .query("q", "Äin€uro")
            .query("a", "test")
            .build();

        let request = call.encode(&base()).unwrap();
        assert_eq!(
            request.url().as_str(),
            "http://httpbin.org/get?q=%C3%84in%E2%82%ACuro&a=test"
        );
    }

    #[test]
    fn accept_header_follows_format_unless_overridden() {
        let call: Call<TextFormat> = Call::get("get").build();
        let request = call.encode(&base()).unwrap();
        assert_eq!(request.headers()[ACCEPT], "text/plain");

        let call: Call<TextFormat> = Call::get("get").header("Accept", "text/html").build();
        let request = call.encode(&base()).unwrap();
        assert_eq!(request.headers()[ACCEPT], "text/html");
    }

    #[test]
    fn invalid_header_fails_encoding() {
        let call: Call<TextFormat> = Call::get("get").header("Bad Header", "x").build();
        assert!(matches!(
            call.encode(&base()),
            Err(ConfigError::InvalidHeader { .. })
        ));
    }

    #[test]
    fn json_body_sets_content_type() {
        let call: Call<JsonObject> = Call::post("post")
            .json_body(&["one", "two", "three"])
            .unwrap()
            .build();

        let request = call.encode(&base()).unwrap();
        assert_eq!(request.headers()[CONTENT_TYPE], "application/json");
        assert_eq!(request.body().unwrap().as_ref(), br#"["one","two","three"]"#);
    }

    #[test]
    fn acceptable_status_range() {
        let call: Call<TextFormat> = Call::get("status/400").acceptable_status(200..=200).build();
        assert!(call.accepts(200));
        assert!(!call.accepts(201));
        assert!(!call.accepts(400));
    }

    #[test]
    fn timeout_is_carried_to_request() {
        let call: Call<TextFormat> = Call::get("delay/1").timeout(Duration::from_millis(500)).build();
        let request = call.encode(&base()).unwrap();
        assert_eq!(request.timeout(), Some(Duration::from_millis(500)));
    }

    #[test]
    fn clone_keeps_fields() {
        let call: Call<TextFormat> = Call::get("get").id("echo").query("a", "b").build();
        let cloned = call.clone();
        assert_eq!(cloned.id(), Some("echo"));
        assert_eq!(cloned.query(), call.query());
    }
}
