use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tokio::sync::oneshot;

use super::state::{Resolution, Shared};
use crate::cache::CachePolicy;
use crate::call::Call;
use crate::error::{CallError, CallFailure};
use crate::response::{CallOutput, CallResult, ResponseFormat, Source};
use crate::session::CallExecutor;

/// An awaitable call that resolves exactly once.
///
/// Created by [`CallExecutor::call`]. Nothing is sent until the future is
/// first polled. The live attempt never falls back to the cache on its own;
/// instead, when it fails and offline caching was requested, a second
/// cache-only attempt is made and its outcome is reported through the error
/// channel:
///
/// | live attempt | offline caching | cache | resolves to |
/// |---|---|---|---|
/// | success | - | - | `Ok(CallOutput)` |
/// | failure | off | - | [`CallError::NoResponse`] |
/// | failure | on | hit | [`CallError::NoResponseWithCache`] |
/// | failure | on | miss | [`CallError::NoResponseNoCache`] |
/// | cancelled | - | - | [`CallError::Cancelled`] |
///
/// Dropping a pending call cancels whatever task is in flight.
///
/// ## Examples
///
/// ```rust,ignore
/// let pending = session.call(&call, CachePolicy::Normal, true);
/// let canceller = pending.canceller();
/// tokio::spawn(async move {
///     tokio::time::sleep(Duration::from_secs(5)).await;
///     canceller.cancel();
/// });
///
/// match pending.await {
///     Ok(output) => println!("{:?} from {}", output.value, output.source),
///     Err(err) if err.is_cancelled() => {}
///     Err(err) => eprintln!("{err}"),
/// }
/// ```
#[must_use = "a pending call does nothing unless awaited"]
pub struct PendingCall<E: CallExecutor, F: ResponseFormat> {
    executor: E,
    call: Call<F>,
    cache_policy: CachePolicy,
    offline_caching: bool,
    started: bool,
    shared: Arc<Shared<F::Output>>,
    receiver: oneshot::Receiver<Resolution<F::Output>>,
}

// No field is ever pinned structurally.
impl<E: CallExecutor, F: ResponseFormat> Unpin for PendingCall<E, F> {}

impl<E: CallExecutor, F: ResponseFormat> fmt::Debug for PendingCall<E, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingCall")
            .field("method", &self.call.method())
            .field("path", &self.call.path())
            .field("cache_policy", &self.cache_policy)
            .field("offline_caching", &self.offline_caching)
            .field("started", &self.started)
            .finish()
    }
}

impl<E: CallExecutor, F: ResponseFormat> PendingCall<E, F> {
    pub(crate) fn new(
        executor: E,
        call: Call<F>,
        cache_policy: CachePolicy,
        offline_caching: bool,
    ) -> Self {
        let (shared, receiver) = Shared::new();
        Self {
            executor,
            call,
            cache_policy,
            offline_caching,
            started: false,
            shared: Arc::new(shared),
            receiver,
        }
    }

    /// Returns a handle that cancels this call from anywhere.
    pub fn canceller(&self) -> Canceller {
        Canceller {
            shared: Arc::clone(&self.shared) as Arc<dyn Cancel>,
        }
    }

    /// Cancels the call. Equivalent to `self.canceller().cancel()`.
    pub fn cancel(&self) {
        self.shared.cancel();
    }

    /// Returns `true` once the call has been resolved or cancelled.
    pub fn is_finished(&self) -> bool {
        self.shared.is_terminal()
    }

    fn start_live(&self) {
        if !self.shared.begin_live() {
            tracing::debug!("Pending call cancelled before start");
            return;
        }

        let fallback = FallbackContext {
            executor: self.executor.clone(),
            call: self.call.clone(),
            shared: Arc::clone(&self.shared),
        };
        let offline_caching = self.offline_caching;

        let task = self.executor.execute(
            &self.call,
            self.cache_policy,
            false,
            Box::new(move |result, source| fallback.on_live(result, source, offline_caching)),
        );
        self.shared.attach_live(task);
    }
}

impl<E: CallExecutor, F: ResponseFormat> Future for PendingCall<E, F> {
    type Output = Result<CallOutput<F::Output>, CallError<F::Output>>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        if !this.started {
            this.started = true;
            this.start_live();
        }

        match Pin::new(&mut this.receiver).poll(cx) {
            Poll::Ready(Ok(resolution)) => Poll::Ready(resolution),
            // Every resolver is either used or dropped with the shared state;
            // never leave the caller hanging either way.
            Poll::Ready(Err(_closed)) => Poll::Ready(Err(CallError::NoResponse { cause: None })),
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<E: CallExecutor, F: ResponseFormat> Drop for PendingCall<E, F> {
    fn drop(&mut self) {
        self.shared.cancel();
    }
}

/// Everything a completion needs to continue the call.
struct FallbackContext<E: CallExecutor, F: ResponseFormat> {
    executor: E,
    call: Call<F>,
    shared: Arc<Shared<F::Output>>,
}

impl<E: CallExecutor, F: ResponseFormat> FallbackContext<E, F> {
    fn on_live(self, result: CallResult<F::Output>, source: Source, offline_caching: bool) {
        if result.was_cancelled() {
            self.shared.resolve(Err(CallError::Cancelled));
            return;
        }

        let error = match result.into_parts() {
            (Some(value), None, Some(response)) => {
                self.shared.resolve(Ok(CallOutput {
                    value,
                    response,
                    source,
                }));
                return;
            }
            (_, None, _) => {
                self.shared.resolve(Err(CallError::NoResponse { cause: None }));
                return;
            }
            (_, Some(error), _) => error,
        };

        if !offline_caching {
            self.shared.resolve(Err(CallError::NoResponse { cause: Some(error) }));
            return;
        }

        if !self.shared.begin_fallback() {
            return;
        }
        tracing::debug!(error = %error, "Live attempt failed, checking cache");

        let shared = Arc::clone(&self.shared);
        let task = self.executor.execute(
            &self.call,
            CachePolicy::ReturnCacheOnly,
            false,
            Box::new(move |result, source| on_fallback(&shared, error, result, source)),
        );
        self.shared.attach_fallback(task);
    }
}

fn on_fallback<T>(shared: &Shared<T>, cause: CallFailure, result: CallResult<T>, source: Source) {
    let resolution = match result.into_parts() {
        (Some(value), None, Some(response)) => Err(CallError::NoResponseWithCache {
            cached: Box::new(CallOutput {
                value,
                response,
                source,
            }),
            cause,
        }),
        _ => Err(CallError::NoResponseNoCache { cause }),
    };
    shared.resolve(resolution);
}

trait Cancel: Send + Sync {
    fn cancel(&self) -> bool;
}

impl<T: Send> Cancel for Shared<T> {
    fn cancel(&self) -> bool {
        Shared::cancel(self)
    }
}

/// Cancels a [`PendingCall`] from another task or thread.
///
/// Cancelling before the call is first polled guarantees that no network
/// attempt is made. Cancelling a resolved call does nothing.
#[derive(Clone)]
pub struct Canceller {
    shared: Arc<dyn Cancel>,
}

impl fmt::Debug for Canceller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Canceller").finish_non_exhaustive()
    }
}

impl Canceller {
    /// Cancels the call. Returns `false` if it had already been resolved or
    /// cancelled.
    pub fn cancel(&self) -> bool {
        self.shared.cancel()
    }
}
