//! Deterministic stand-in for [`Session`](crate::Session) in tests.
//!
//! [`FakeSession`] encodes calls like a real session but asks a
//! [`FakeResultProvider`] for the transport outcome instead of touching the
//! network. Results are parsed the same way and delivered with
//! [`Source::None`].
//!
//! ## Examples
//!
//! ```rust,ignore
//! use endpoints::testing::FakeSession;
//! use endpoints::{ResponseMetadata, TransportOutcome};
//!
//! let session = FakeSession::new(base_url, |_request: &TransportRequest| {
//!     TransportOutcome::received(ResponseMetadata::new(200), r#"{"args":{}}"#)
//! })?;
//! let output = session.call(&call, CachePolicy::Normal, false).await?;
//! ```

use std::sync::Arc;

use futures::future::Abortable;
use tokio::runtime::Handle;
use tracing::Instrument;
use url::Url;

use crate::cache::CachePolicy;
use crate::call::Call;
use crate::error::{ConfigError, TransportError};
use crate::response::{CallResult, ResponseFormat, Source};
use crate::session::{
    transform, CallExecutor, CallTask, Completion, CompletionGuard, DeliveryQueue,
};
use crate::transport::{TransportOutcome, TransportRequest};

/// Supplies the transport outcome for a request.
///
/// The request carries the cache policy it was executed with, so a provider
/// can tell cache-only lookups ([`CachePolicy::ReturnCacheOnly`]) apart from
/// live attempts.
pub trait FakeResultProvider: Send + Sync + 'static {
    fn result_for(&self, request: &TransportRequest) -> TransportOutcome;
}

impl<P> FakeResultProvider for P
where
    P: Fn(&TransportRequest) -> TransportOutcome + Send + Sync + 'static,
{
    fn result_for(&self, request: &TransportRequest) -> TransportOutcome {
        self(request)
    }
}

/// [`CallExecutor`] answering from a [`FakeResultProvider`].
///
/// The `return_cached_if_origin_fails` flag is ignored: a fake session has
/// no cache of its own.
pub struct FakeSession<P> {
    base_url: Url,
    provider: Arc<P>,
    debug: bool,
    runtime: Handle,
    delivery: DeliveryQueue,
}

impl<P> Clone for FakeSession<P> {
    fn clone(&self) -> Self {
        Self {
            base_url: self.base_url.clone(),
            provider: Arc::clone(&self.provider),
            debug: self.debug,
            runtime: self.runtime.clone(),
            delivery: self.delivery.clone(),
        }
    }
}

impl<P: FakeResultProvider> FakeSession<P> {
    /// Creates a fake session on the current tokio runtime.
    ///
    /// ## Errors
    ///
    /// Returns [`ConfigError::NoRuntime`] outside of a tokio runtime.
    pub fn new(base_url: Url, provider: P) -> Result<Self, ConfigError> {
        let runtime = Handle::try_current().map_err(|_| ConfigError::NoRuntime)?;
        let delivery = DeliveryQueue::spawn(&runtime);
        Ok(Self {
            base_url,
            provider: Arc::new(provider),
            debug: false,
            runtime,
            delivery,
        })
    }

    /// Logs requests and outcomes like a debugging [`Session`](crate::Session).
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }
}

impl<P: FakeResultProvider> CallExecutor for FakeSession<P> {
    fn execute<F: ResponseFormat>(
        &self,
        call: &Call<F>,
        cache_policy: CachePolicy,
        _return_cached_if_origin_fails: bool,
        completion: Completion<F::Output>,
    ) -> CallTask {
        let (task, registration) = CallTask::new_pair();
        let request = call
            .encode(&self.base_url)
            .map(|request| request.with_cache_policy(cache_policy));
        let call = call.clone();
        let provider = Arc::clone(&self.provider);
        let delivery = self.delivery.clone();
        let debug = self.debug;
        let completion = CompletionGuard::new(completion);
        let span = tracing::debug_span!("fake_call", task = %task.id(), http.method = %call.method());

        self.runtime.spawn(
            async move {
                let work = Abortable::new(
                    async {
                        let request = match request {
                            Ok(request) => request,
                            Err(e) => return CallResult::failure(e, None),
                        };
                        if debug {
                            tracing::debug!("{}", request.curl_representation(true));
                        }
                        let outcome = provider.result_for(&request);
                        if debug {
                            tracing::debug!("{outcome}");
                        }
                        transform(&call, outcome)
                    },
                    registration,
                );
                let result = work
                    .await
                    .unwrap_or_else(|_| CallResult::failure(TransportError::Cancelled, None));
                delivery.deliver(move || completion.complete(result, Source::None));
            }
            .instrument(span),
        );

        task
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tokio::sync::oneshot;

    use super::*;
    use crate::error::CallFailure;
    use crate::response::{JsonObject, ResponseMetadata};

    fn base_url() -> Url {
        Url::parse("http://fake.local").unwrap()
    }

    #[tokio::test]
    async fn delivers_parsed_value_with_source_none() {
        let session = FakeSession::new(base_url(), |request: &TransportRequest| {
            assert_eq!(request.url().as_str(), "http://fake.local/get?inputParam=inputParamValue");
            TransportOutcome::received(
                ResponseMetadata::new(200),
                r#"{"args":{"inputParam":"inputParamValue"}}"#,
            )
        })
        .unwrap();

        let call: Call<JsonObject> = Call::get("get").query("inputParam", "inputParamValue").build();
        let (tx, rx) = oneshot::channel();
        session.start(&call, CachePolicy::Normal, false, move |result, source| {
            let _ = tx.send((result, source));
        });

        let (result, source) = rx.await.unwrap();
        assert_eq!(source, Source::None);
        assert_eq!(
            result.value().unwrap()["args"]["inputParam"],
            "inputParamValue"
        );
    }

    #[tokio::test]
    async fn provider_sees_cache_policy() {
        let session = FakeSession::new(base_url(), |request: &TransportRequest| {
            match request.cache_policy() {
                CachePolicy::ReturnCacheOnly => {
                    TransportOutcome::received(ResponseMetadata::new(200), "{}")
                }
                _ => TransportOutcome::failed(TransportError::Timeout),
            }
        })
        .unwrap();

        let call: Call<JsonObject> = Call::get("get").build();
        let (tx, rx) = oneshot::channel();
        session.start(&call, CachePolicy::ReturnCacheOnly, false, move |result, _| {
            let _ = tx.send(result.is_success());
        });
        assert!(rx.await.unwrap());
    }

    #[tokio::test]
    async fn encoding_failure_is_delivered() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let session = FakeSession::new(base_url(), move |_: &TransportRequest| {
            counter.fetch_add(1, Ordering::SeqCst);
            TransportOutcome::default()
        })
        .unwrap();

        let call: Call<JsonObject> = Call::get("get").header("bad header", "x").build();
        let (tx, rx) = oneshot::channel();
        session.start(&call, CachePolicy::Normal, false, move |result, source| {
            let _ = tx.send((result, source));
        });

        let (result, _) = rx.await.unwrap();
        assert!(matches!(result.error(), Some(CallFailure::InvalidRequest(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
