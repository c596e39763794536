use crate::bridge::PendingCall;
use crate::cache::CachePolicy;
use crate::call::Call;
use crate::error::TransportError;
use crate::response::{CallResult, ResponseFormat, Source};

use super::CallTask;

/// Callback receiving the single result of an executed call.
pub type Completion<T> = Box<dyn FnOnce(CallResult<T>, Source) + Send + 'static>;

/// Owns a completion until it is invoked.
///
/// If the guard is dropped unused (the runtime dropped the call's future, or
/// the delivery worker died with the job still queued) the completion runs
/// with a cancellation and [`Source::None`].
pub(crate) struct CompletionGuard<T> {
    completion: Option<Completion<T>>,
}

impl<T> CompletionGuard<T> {
    pub(crate) fn new(completion: Completion<T>) -> Self {
        Self {
            completion: Some(completion),
        }
    }

    pub(crate) fn complete(mut self, result: CallResult<T>, source: Source) {
        if let Some(completion) = self.completion.take() {
            completion(result, source);
        }
    }
}

impl<T> Drop for CompletionGuard<T> {
    fn drop(&mut self) {
        if let Some(completion) = self.completion.take() {
            tracing::debug!("Call dropped before completion, delivering cancellation");
            completion(
                CallResult::failure(TransportError::Cancelled, None),
                Source::None,
            );
        }
    }
}

/// Executes calls and delivers their results through a completion.
///
/// Implementations must invoke the completion exactly once per
/// [`execute`](CallExecutor::execute), on their delivery context, whatever
/// happens to the call (including cancellation through the returned
/// [`CallTask`]).
pub trait CallExecutor: Clone + Send + Sync + 'static {
    /// Executes `call` and delivers its result to `completion`.
    ///
    /// When `return_cached_if_origin_fails` is set and the live attempt fails
    /// at the transport level, a stored response is delivered instead, tagged
    /// [`Source::Cache`]; without one, the original error is delivered with
    /// [`Source::None`].
    fn execute<F: ResponseFormat>(
        &self,
        call: &Call<F>,
        cache_policy: CachePolicy,
        return_cached_if_origin_fails: bool,
        completion: Completion<F::Output>,
    ) -> CallTask;

    /// Completion-style entry point; `offline_caching` enables the cache
    /// fallback of [`execute`](CallExecutor::execute).
    ///
    /// ## Examples
    ///
    /// ```rust,ignore
    /// let task = session.start(&call, CachePolicy::Normal, true, |result, source| {
    ///     result
    ///         .on_success(|value| println!("{value:?} ({source})"))
    ///         .on_error(|err| eprintln!("failed: {err}"));
    /// });
    /// ```
    fn start<F, C>(
        &self,
        call: &Call<F>,
        cache_policy: CachePolicy,
        offline_caching: bool,
        completion: C,
    ) -> CallTask
    where
        F: ResponseFormat,
        C: FnOnce(CallResult<F::Output>, Source) + Send + 'static,
    {
        self.execute(call, cache_policy, offline_caching, Box::new(completion))
    }

    /// Awaitable entry point. See [`PendingCall`] for how failures and
    /// offline caching are reported.
    fn call<F: ResponseFormat>(
        &self,
        call: &Call<F>,
        cache_policy: CachePolicy,
        offline_caching: bool,
    ) -> PendingCall<Self, F> {
        PendingCall::new(self.clone(), call.clone(), cache_policy, offline_caching)
    }
}
