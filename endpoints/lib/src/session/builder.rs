use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use tokio::runtime::Handle;
use url::Url;

use super::client::SessionInner;
use super::{DeliveryQueue, Session};
use crate::auth::Authorization;
use crate::cache::{CacheStore, MemoryCache};
use crate::error::ConfigError;
use crate::transport::http::DEFAULT_TIMEOUT_SECS;
use crate::transport::{HttpTransport, Transport};

enum CacheSetting {
    Memory(usize),
    Shared(Arc<dyn CacheStore>),
    Disabled,
}

/// Builder for configuring a [`Session`].
pub struct SessionBuilder {
    base_url: Url,
    timeout: Duration,
    default_headers: HeaderMap,
    auth: Authorization,
    debug: bool,
    cache: CacheSetting,
}

impl fmt::Debug for SessionBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cache = match &self.cache {
            CacheSetting::Memory(capacity) => format!("memory({capacity})"),
            CacheSetting::Shared(_) => "shared".to_string(),
            CacheSetting::Disabled => "disabled".to_string(),
        };
        f.debug_struct("SessionBuilder")
            .field("base_url", &self.base_url.as_str())
            .field("timeout", &self.timeout)
            .field("default_headers", &self.default_headers)
            .field("debug", &self.debug)
            .field("cache", &cache)
            .finish_non_exhaustive()
    }
}

impl SessionBuilder {
    pub(crate) fn new(base_url: Url) -> Self {
        Self {
            base_url,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            default_headers: HeaderMap::new(),
            auth: Authorization::None,
            debug: false,
            cache: CacheSetting::Memory(crate::cache::memory::DEFAULT_CAPACITY),
        }
    }

    /// Sets the timeout for calls that don't set their own.
    ///
    /// ## Examples
    ///
    /// ```rust,ignore
    /// use std::time::Duration;
    ///
    /// let session = Session::builder(base_url)
    ///     .timeout(Duration::from_secs(60))
    ///     .build()?;
    /// ```
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Adds a header sent with every call that doesn't set it itself.
    ///
    /// ## Errors
    ///
    /// Returns an error if the header name or value is invalid.
    pub fn default_header(
        mut self,
        name: impl AsRef<str>,
        value: impl AsRef<str>,
    ) -> Result<Self, ConfigError> {
        let header_name = HeaderName::try_from(name.as_ref())
            .map_err(|e| ConfigError::invalid_header(name.as_ref(), e))?;
        let header_value = HeaderValue::try_from(value.as_ref())
            .map_err(|e| ConfigError::invalid_header(name.as_ref(), e))?;
        self.default_headers.insert(header_name, header_value);
        Ok(self)
    }

    /// Sets how calls are authorized.
    ///
    /// ## Examples
    ///
    /// ```rust,ignore
    /// let session = Session::builder(base_url)
    ///     .auth(Authorization::bearer("sk-xxx"))
    ///     .build()?;
    /// ```
    pub fn auth(mut self, auth: Authorization) -> Self {
        self.auth = auth;
        self
    }

    /// Logs a curl representation of every request and a dump of every
    /// outcome at debug level.
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Uses a private in-memory cache holding up to `capacity` responses.
    pub fn cache_capacity(mut self, capacity: usize) -> Self {
        self.cache = CacheSetting::Memory(capacity);
        self
    }

    /// Uses `cache`, which may be shared with other sessions.
    pub fn cache(mut self, cache: Arc<dyn CacheStore>) -> Self {
        self.cache = CacheSetting::Shared(cache);
        self
    }

    /// Disables caching: nothing is stored and every lookup misses.
    pub fn without_cache(mut self) -> Self {
        self.cache = CacheSetting::Disabled;
        self
    }

    fn resolve_cache(&mut self) -> Option<Arc<dyn CacheStore>> {
        match std::mem::replace(&mut self.cache, CacheSetting::Disabled) {
            CacheSetting::Memory(capacity) => Some(Arc::new(MemoryCache::new(capacity))),
            CacheSetting::Shared(cache) => Some(cache),
            CacheSetting::Disabled => None,
        }
    }

    /// Builds a session over an [`HttpTransport`] that writes to the
    /// session's cache.
    ///
    /// ## Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed or this is
    /// called outside of a tokio runtime.
    pub fn build(mut self) -> Result<Session<HttpTransport>, ConfigError> {
        let cache = self.resolve_cache();
        let mut transport = HttpTransport::new(self.timeout)?;
        if let Some(cache) = &cache {
            transport = transport.with_cache(Arc::clone(cache));
        }
        self.finish(transport, cache)
    }

    /// Builds a session over a custom transport.
    ///
    /// The session reads from its cache; storing responses is up to the
    /// transport (see [`Session::cache`]).
    ///
    /// ## Errors
    ///
    /// Returns an error if this is called outside of a tokio runtime.
    pub fn build_with<T: Transport>(mut self, transport: T) -> Result<Session<T>, ConfigError> {
        let cache = self.resolve_cache();
        self.finish(transport, cache)
    }

    fn finish<T: Transport>(
        self,
        transport: T,
        cache: Option<Arc<dyn CacheStore>>,
    ) -> Result<Session<T>, ConfigError> {
        let runtime = Handle::try_current().map_err(|_| ConfigError::NoRuntime)?;
        let delivery = DeliveryQueue::spawn(&runtime);

        tracing::debug!(
            base_url = %self.base_url,
            timeout = ?self.timeout,
            cached = cache.is_some(),
            "Session created"
        );

        Ok(Session::from_inner(SessionInner {
            base_url: self.base_url,
            default_headers: self.default_headers,
            auth: self.auth,
            timeout: self.timeout,
            debug: self.debug,
            cache,
            transport,
            runtime,
            delivery,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::call::Call;
    use crate::cache::CachePolicy;
    use crate::response::TextFormat;
    use reqwest::header::{ACCEPT, AUTHORIZATION};

    fn base_url() -> Url {
        Url::parse("https://example.com/api").unwrap()
    }

    #[test]
    fn build_requires_runtime() {
        let result = Session::builder(base_url()).build();
        assert!(matches!(result, Err(ConfigError::NoRuntime)));
    }

    #[tokio::test]
    async fn defaults() {
        let session = Session::new(base_url()).unwrap();
        assert_eq!(session.timeout(), Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert!(!session.is_debug());
        assert!(session.cache().is_some());
        assert_eq!(session.base_url().as_str(), "https://example.com/api");
    }

    #[tokio::test]
    async fn without_cache_disables_cache() {
        let session = Session::builder(base_url()).without_cache().build().unwrap();
        assert!(session.cache().is_none());
    }

    #[tokio::test]
    async fn shared_cache_is_used_as_is() {
        let cache: Arc<dyn CacheStore> = Arc::new(MemoryCache::new(3));
        let session = Session::builder(base_url())
            .cache(Arc::clone(&cache))
            .build()
            .unwrap();
        assert!(Arc::ptr_eq(session.cache().unwrap(), &cache));
    }

    #[test]
    fn invalid_default_header_is_rejected() {
        let result = Session::builder(base_url()).default_header("Bad Header", "x");
        assert!(matches!(result, Err(ConfigError::InvalidHeader { .. })));
    }

    #[tokio::test]
    async fn encode_applies_defaults_auth_and_timeout() {
        let session = Session::builder(base_url())
            .default_header("Accept", "application/x-default")
            .unwrap()
            .default_header("X-Client", "endpoints")
            .unwrap()
            .auth(Authorization::bearer("token"))
            .timeout(Duration::from_secs(7))
            .build()
            .unwrap();

        let call: Call<TextFormat> = Call::get("users").build();
        let request = session.encode(&call, CachePolicy::ReloadIgnoringCache).unwrap();

        assert_eq!(request.url().as_str(), "https://example.com/api/users");
        // The call's own Accept wins over the default.
        assert_eq!(request.headers()[ACCEPT], "text/plain");
        assert_eq!(request.headers()["x-client"], "endpoints");
        assert_eq!(request.headers()[AUTHORIZATION], "Bearer token");
        assert_eq!(request.timeout(), Some(Duration::from_secs(7)));
        assert_eq!(request.cache_policy(), CachePolicy::ReloadIgnoringCache);
    }
}
