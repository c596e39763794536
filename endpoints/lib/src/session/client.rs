use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures::future::Abortable;
use reqwest::header::HeaderMap;
use tokio::runtime::Handle;
use tracing::{field, Instrument, Span};
use url::Url;

use super::{
    transform, CallExecutor, CallTask, Completion, CompletionGuard, DeliveryQueue, SessionBuilder,
    TaskId,
};
use crate::auth::Authorization;
use crate::cache::{CachePolicy, CacheStore, CachedResponse};
use crate::call::Call;
use crate::config::SessionConfig;
use crate::error::{ConfigError, TransportError};
use crate::response::{CallResult, ResponseFormat, Source};
use crate::transport::{HttpTransport, RequestKey, Transport, TransportOutcome, TransportRequest};

/// The production [`CallExecutor`].
///
/// A session owns a base URL, default headers, an authorization, a response
/// cache and a [`Transport`]. It is cheap to clone; clones share everything.
///
/// ## Examples
///
/// ```rust,ignore
/// use endpoints::{Call, CachePolicy, CallExecutor, Session};
/// use endpoints::response::JsonObject;
/// use url::Url;
///
/// let session = Session::builder(Url::parse("https://httpbin.org")?)
///     .debug(true)
///     .build()?;
///
/// let call: Call<JsonObject> = Call::get("/get").build();
/// session.start(&call, CachePolicy::Normal, true, |result, source| {
///     result.on_success(|json| println!("{json:?} from {source}"));
/// });
/// ```
pub struct Session<T: Transport = HttpTransport> {
    inner: Arc<SessionInner<T>>,
}

impl<T: Transport> Clone for Session<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Transport + fmt::Debug> fmt::Debug for Session<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("base_url", &self.inner.base_url.as_str())
            .field("timeout", &self.inner.timeout)
            .field("debug", &self.inner.debug)
            .field("cached", &self.inner.cache.is_some())
            .field("transport", &self.inner.transport)
            .finish()
    }
}

pub(super) struct SessionInner<T> {
    pub(super) base_url: Url,
    pub(super) default_headers: HeaderMap,
    pub(super) auth: Authorization,
    pub(super) timeout: Duration,
    pub(super) debug: bool,
    pub(super) cache: Option<Arc<dyn CacheStore>>,
    pub(super) transport: T,
    pub(super) runtime: Handle,
    pub(super) delivery: DeliveryQueue,
}

impl Session<HttpTransport> {
    /// Creates a new builder for configuring a session.
    ///
    /// ## Arguments
    ///
    /// * `base_url` - The base URL all call paths are relative to.
    pub fn builder(base_url: Url) -> SessionBuilder {
        SessionBuilder::new(base_url)
    }

    /// Creates a session with default settings.
    ///
    /// ## Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed or no tokio
    /// runtime is running.
    pub fn new(base_url: Url) -> Result<Self, ConfigError> {
        Self::builder(base_url).build()
    }

    /// Creates a session from a [`SessionConfig`].
    ///
    /// ## Errors
    ///
    /// Returns an error if the configuration is incomplete or invalid.
    pub fn from_config(config: &SessionConfig) -> Result<Self, ConfigError> {
        config.to_builder()?.build()
    }
}

impl<T: Transport> Session<T> {
    pub(super) fn from_inner(inner: SessionInner<T>) -> Self {
        Self {
            inner: Arc::new(inner),
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.inner.timeout
    }

    pub fn is_debug(&self) -> bool {
        self.inner.debug
    }

    /// The shared response cache, if caching is enabled.
    pub fn cache(&self) -> Option<&Arc<dyn CacheStore>> {
        self.inner.cache.as_ref()
    }

    pub fn transport(&self) -> &T {
        &self.inner.transport
    }

    /// Encodes `call` the way this session would send it: base URL, default
    /// headers, authorization and timeout applied.
    ///
    /// ## Errors
    ///
    /// Returns an error if the call cannot be encoded.
    pub fn encode<F: ResponseFormat>(
        &self,
        call: &Call<F>,
        cache_policy: CachePolicy,
    ) -> Result<TransportRequest, ConfigError> {
        self.inner.encode(call, cache_policy)
    }
}

impl<T: Transport> SessionInner<T> {
    fn encode<F: ResponseFormat>(
        &self,
        call: &Call<F>,
        cache_policy: CachePolicy,
    ) -> Result<TransportRequest, ConfigError> {
        let mut request = call.encode(&self.base_url)?.with_cache_policy(cache_policy);

        for (name, value) in &self.default_headers {
            if !request.headers().contains_key(name) {
                request.headers_mut().insert(name.clone(), value.clone());
            }
        }
        self.auth.apply(&mut request)?;

        if request.timeout().is_none() {
            request = request.with_timeout(self.timeout);
        }
        Ok(request)
    }

    fn lookup(&self, key: &RequestKey) -> Option<CachedResponse> {
        self.cache.as_ref()?.lookup(key)
    }

    /// One execution of a call, from encoding to the envelope. Never fails:
    /// every failure ends up in the returned result.
    async fn run<F: ResponseFormat>(
        &self,
        call: &Call<F>,
        cache_policy: CachePolicy,
        return_cached_if_origin_fails: bool,
        task: TaskId,
    ) -> (CallResult<F::Output>, Source) {
        let span = Span::current();

        let request = match self.encode(call, cache_policy) {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!(error = %e, "Call could not be encoded");
                return (CallResult::failure(e, None), Source::None);
            }
        };
        span.record("http.url", request.url().as_str());
        let key = request.key();

        if cache_policy.reads_cache_first() {
            match self.lookup(&key) {
                Some(hit) => {
                    tracing::debug!("Serving stored response");
                    span.record("source", "cache");
                    return (transform(call, cached_outcome(hit)), Source::Cache);
                }
                None if !cache_policy.allows_network() => {
                    tracing::debug!("No stored response for cache-only load");
                    span.record("source", "none");
                    return (
                        CallResult::failure(TransportError::ResourceUnavailable, None),
                        Source::None,
                    );
                }
                None => {}
            }
        }

        if self.debug {
            tracing::debug!(task = %task, "{}", request.curl_representation(true));
        }

        let outcome = self.transport.send(request).await;

        if let Some(response) = &outcome.response {
            span.record("http.status_code", response.status());
        }
        if self.debug {
            tracing::debug!(task = %task, "{outcome}");
        }

        if let Some(error) = &outcome.error {
            if return_cached_if_origin_fails && !error.is_cancelled() {
                return match self.lookup(&key) {
                    Some(hit) => {
                        tracing::info!(error = %error, "Origin failed, serving stored response");
                        span.record("source", "cache");
                        (transform(call, cached_outcome(hit)), Source::Cache)
                    }
                    None => {
                        tracing::debug!(error = %error, "Origin failed and nothing is stored");
                        span.record("source", "none");
                        (CallResult::failure(error.clone(), None), Source::None)
                    }
                };
            }
        }

        span.record("source", "origin");
        (transform(call, outcome), Source::Origin)
    }
}

fn cached_outcome(hit: CachedResponse) -> TransportOutcome {
    TransportOutcome::received(hit.metadata, hit.body)
}

impl<T: Transport> CallExecutor for Session<T> {
    fn execute<F: ResponseFormat>(
        &self,
        call: &Call<F>,
        cache_policy: CachePolicy,
        return_cached_if_origin_fails: bool,
        completion: Completion<F::Output>,
    ) -> CallTask {
        let (task, registration) = CallTask::new_pair();
        let task_id = task.id();
        let inner = Arc::clone(&self.inner);
        let call = call.clone();
        let completion = CompletionGuard::new(completion);

        let span = tracing::info_span!(
            "call",
            task = %task_id,
            call.id = call.id().unwrap_or_default(),
            http.method = %call.method(),
            http.url = field::Empty,
            http.status_code = field::Empty,
            source = field::Empty,
            otel.kind = "client",
        );

        self.inner.runtime.spawn(
            async move {
                let work = Abortable::new(
                    inner.run(&call, cache_policy, return_cached_if_origin_fails, task_id),
                    registration,
                );
                let (result, source) = match work.await {
                    Ok(delivered) => delivered,
                    Err(_aborted) => {
                        tracing::debug!("Call cancelled");
                        (
                            CallResult::failure(TransportError::Cancelled, None),
                            Source::None,
                        )
                    }
                };
                inner
                    .delivery
                    .deliver(move || completion.complete(result, source));
            }
            .instrument(span),
        );

        task
    }
}

#[cfg(test)]
mod tests {
    use std::future::Future;

    use tokio::sync::oneshot;

    use super::*;
    use crate::response::{ResponseMetadata, TextFormat};

    #[derive(Debug, Clone)]
    struct Echo;

    impl Transport for Echo {
        fn send(&self, request: TransportRequest) -> impl Future<Output = TransportOutcome> + Send {
            let body = request.url().path().to_string();
            async move { TransportOutcome::received(ResponseMetadata::new(200), body) }
        }
    }

    async fn run_once(session: &Session<Echo>, call: &Call<TextFormat>) -> (CallResult<String>, Source) {
        let (tx, rx) = oneshot::channel();
        session.execute(
            call,
            CachePolicy::Normal,
            false,
            Box::new(move |result, source| {
                let _ = tx.send((result, source));
            }),
        );
        rx.await.unwrap()
    }

    #[tokio::test]
    #[tracing_test::traced_test]
    async fn debug_mode_logs_request_and_outcome() {
        let session = Session::builder(Url::parse("http://echo.local").unwrap())
            .debug(true)
            .build_with(Echo)
            .unwrap();

        let call: Call<TextFormat> = Call::get("hello").build();
        let (result, source) = run_once(&session, &call).await;

        assert_eq!(result.value().map(String::as_str), Some("/hello"));
        assert_eq!(source, Source::Origin);
        assert!(logs_contain("$ curl -i"));
        assert!(logs_contain("http.method=GET"));
        assert!(logs_contain("http.status_code=200"));
    }

    #[tokio::test]
    #[tracing_test::traced_test]
    async fn quiet_mode_skips_dumps() {
        let session = Session::builder(Url::parse("http://echo.local").unwrap())
            .build_with(Echo)
            .unwrap();

        let call: Call<TextFormat> = Call::get("hello").build();
        run_once(&session, &call).await;

        assert!(!logs_contain("$ curl -i"));
    }

    #[tokio::test]
    async fn sessions_share_state_across_clones() {
        let session = Session::builder(Url::parse("http://echo.local").unwrap())
            .build_with(Echo)
            .unwrap();
        let clone = session.clone();
        assert!(Arc::ptr_eq(session.cache().unwrap(), clone.cache().unwrap()));
    }
}
