use tokio::runtime::Handle;
use tokio::sync::mpsc;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Serial delivery context for completions.
///
/// A single worker task runs queued completions one at a time, in the order
/// they were queued, so callers never observe two of their completions
/// running concurrently. If the worker is gone (runtime shutting down) the
/// completion runs inline on the caller's thread instead.
#[derive(Debug, Clone)]
pub(crate) struct DeliveryQueue {
    tx: mpsc::UnboundedSender<Job>,
}

impl DeliveryQueue {
    pub(crate) fn spawn(runtime: &Handle) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<Job>();
        runtime.spawn(async move {
            while let Some(job) = rx.recv().await {
                job();
            }
            tracing::trace!("Delivery queue closed");
        });
        Self { tx }
    }

    pub(crate) fn deliver(&self, job: impl FnOnce() + Send + 'static) {
        if let Err(mpsc::error::SendError(job)) = self.tx.send(Box::new(job)) {
            tracing::debug!("Delivery worker unavailable, running completion inline");
            job();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use tokio::sync::oneshot;

    use super::*;
    use crate::response::{CallResult, Source};
    use crate::session::CompletionGuard;

    #[tokio::test]
    async fn jobs_run_in_queue_order() {
        let queue = DeliveryQueue::spawn(&Handle::current());
        let seen = Arc::new(Mutex::new(Vec::new()));

        for i in 0..10 {
            let seen = seen.clone();
            queue.deliver(move || seen.lock().unwrap().push(i));
        }

        let (tx, rx) = oneshot::channel();
        queue.deliver(move || {
            let _ = tx.send(());
        });
        rx.await.unwrap();

        assert_eq!(*seen.lock().unwrap(), (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn runs_inline_without_worker() {
        let (tx, rx) = mpsc::unbounded_channel::<Job>();
        drop(rx);
        let queue = DeliveryQueue { tx };

        let ran = Arc::new(Mutex::new(false));
        let flag = ran.clone();
        queue.deliver(move || *flag.lock().unwrap() = true);

        assert!(*ran.lock().unwrap());
    }

    #[test]
    fn queued_completion_dropped_with_worker_is_cancelled() {
        let (tx, rx) = mpsc::unbounded_channel::<Job>();
        let queue = DeliveryQueue { tx };

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let completion = CompletionGuard::<u8>::new(Box::new(move |result, source| {
            sink.lock().unwrap().push((result.was_cancelled(), source));
        }));
        queue.deliver(move || completion.complete(CallResult::success(1, None), Source::Origin));
        assert!(seen.lock().unwrap().is_empty());

        // The worker goes away with the job still queued.
        drop(rx);

        assert_eq!(*seen.lock().unwrap(), vec![(true, Source::None)]);
    }

    #[test]
    fn completed_guard_fires_once() {
        let count = Arc::new(Mutex::new(0));
        let counter = count.clone();
        let completion = CompletionGuard::<u8>::new(Box::new(move |result, source| {
            assert!(result.is_success());
            assert_eq!(source, Source::Origin);
            *counter.lock().unwrap() += 1;
        }));

        completion.complete(CallResult::success(1, None), Source::Origin);
        assert_eq!(*count.lock().unwrap(), 1);
    }
}
