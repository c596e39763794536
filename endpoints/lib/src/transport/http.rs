use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::CACHE_CONTROL;
use tracing::{instrument, Span};

use super::{Transport, TransportOutcome, TransportRequest};
use crate::cache::{CacheStore, CachedResponse};
use crate::error::{ConfigError, TransportError};
use crate::response::ResponseMetadata;

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// [`Transport`] backed by a pooled `reqwest::Client`.
///
/// Successful responses to GET and HEAD requests are written to the shared
/// cache, unless the server sent `Cache-Control: no-store`.
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    cache: Option<Arc<dyn CacheStore>>,
}

impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransport")
            .field("client", &self.client)
            .field("cached", &self.cache.is_some())
            .finish()
    }
}

impl HttpTransport {
    /// Creates a transport whose requests time out after `timeout` unless
    /// the request carries its own.
    ///
    /// ## Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(timeout: Duration) -> Result<Self, ConfigError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(10)
            .build()
            .map_err(|e| ConfigError::Client(e.to_string()))?;

        Ok(Self {
            client,
            cache: None,
        })
    }

    /// Stores successful responses in `cache`.
    pub fn with_cache(mut self, cache: Arc<dyn CacheStore>) -> Self {
        self.cache = Some(cache);
        self
    }

    fn should_store(&self, request: &TransportRequest, metadata: &ResponseMetadata) -> bool {
        request.method().is_cacheable() && metadata.is_success() && !forbids_storing(metadata)
    }

    #[instrument(
        name = "http_exchange",
        skip(self, request),
        fields(
            http.method = %request.method(),
            http.url = %request.url(),
            http.status_code = tracing::field::Empty,
            otel.kind = "client",
        )
    )]
    async fn exchange(&self, request: TransportRequest) -> TransportOutcome {
        let mut builder = self
            .client
            .request(request.method().to_reqwest(), request.url().clone())
            .headers(request.headers().clone());
        if let Some(body) = request.body() {
            builder = builder.body(body.clone());
        }
        if let Some(timeout) = request.timeout() {
            builder = builder.timeout(timeout);
        }

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!(error = %e, "Exchange failed");
                return TransportOutcome::failed(e.into());
            }
        };

        let metadata = ResponseMetadata::from_reqwest(&response);
        Span::current().record("http.status_code", metadata.status());

        let body = match response.bytes().await {
            Ok(body) => body,
            Err(e) => {
                return TransportOutcome {
                    response: Some(metadata),
                    body: None,
                    error: Some(TransportError::from(e)),
                };
            }
        };

        if let Some(cache) = &self.cache {
            if self.should_store(&request, &metadata) {
                cache.store(
                    request.key(),
                    CachedResponse::new(metadata.clone(), body.clone()),
                );
            }
        }

        TransportOutcome::received(metadata, body)
    }
}

fn forbids_storing(metadata: &ResponseMetadata) -> bool {
    metadata
        .headers()
        .get_all(CACHE_CONTROL)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .any(|directive| directive.trim().eq_ignore_ascii_case("no-store"))
}

impl Transport for HttpTransport {
    fn send(&self, request: TransportRequest) -> impl Future<Output = TransportOutcome> + Send {
        self.exchange(request)
    }
}
