//! Shared helpers for integration tests.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use endpoints::{
    CachePolicy, CacheStore, CachedResponse, Call, CallExecutor, CallResult, MemoryCache,
    ResponseFormat, ResponseMetadata, Session, Source, Transport, TransportError,
    TransportOutcome, TransportRequest,
};
use tokio::sync::oneshot;
use url::Url;

pub fn base_url() -> Url {
    Url::parse("http://httpbin.test").unwrap()
}

/// What a scripted exchange does.
#[derive(Debug, Clone)]
pub enum Step {
    Reply(TransportOutcome),
    /// Never completes; records when its future is dropped.
    Hang,
}

/// Transport replaying scripted outcomes in order. Unscripted requests fail
/// with a connection error.
#[derive(Debug, Clone, Default)]
pub struct Scripted {
    steps: Arc<Mutex<VecDeque<Step>>>,
    sent: Arc<Mutex<Vec<TransportRequest>>>,
    dropped: Arc<AtomicUsize>,
}

impl Scripted {
    pub fn new(steps: impl IntoIterator<Item = Step>) -> Self {
        Self {
            steps: Arc::new(Mutex::new(steps.into_iter().collect())),
            ..Default::default()
        }
    }

    pub fn sent(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<TransportRequest> {
        self.sent.lock().unwrap().clone()
    }

    /// Number of hanging exchanges whose futures were dropped (aborted).
    pub fn dropped(&self) -> usize {
        self.dropped.load(Ordering::SeqCst)
    }
}

struct DropFlag(Arc<AtomicUsize>);

impl Drop for DropFlag {
    fn drop(&mut self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

impl Transport for Scripted {
    fn send(&self, request: TransportRequest) -> impl Future<Output = TransportOutcome> + Send {
        self.sent.lock().unwrap().push(request);
        let step = self.steps.lock().unwrap().pop_front();
        let dropped = Arc::clone(&self.dropped);
        async move {
            match step {
                Some(Step::Reply(outcome)) => outcome,
                Some(Step::Hang) => {
                    let _flag = DropFlag(dropped);
                    std::future::pending::<TransportOutcome>().await
                }
                None => TransportOutcome::failed(TransportError::Connection(
                    "connection refused".into(),
                )),
            }
        }
    }
}

pub fn ok(body: &'static str) -> Step {
    Step::Reply(TransportOutcome::received(
        ResponseMetadata::new(200),
        Bytes::from_static(body.as_bytes()),
    ))
}

pub fn status(code: u16, body: &'static str) -> Step {
    Step::Reply(TransportOutcome::received(
        ResponseMetadata::new(code),
        Bytes::from_static(body.as_bytes()),
    ))
}

pub fn fail(error: TransportError) -> Step {
    Step::Reply(TransportOutcome::failed(error))
}

pub fn session(transport: &Scripted, cache: &Arc<MemoryCache>) -> Session<Scripted> {
    Session::builder(base_url())
        .cache(Arc::clone(cache) as Arc<dyn CacheStore>)
        .build_with(transport.clone())
        .unwrap()
}

/// Stores `body` as the cached response for `call`.
pub fn seed<F: ResponseFormat>(
    session: &Session<Scripted>,
    cache: &MemoryCache,
    call: &Call<F>,
    body: &'static str,
) {
    let key = session.encode(call, CachePolicy::Normal).unwrap().key();
    cache.store(
        key,
        CachedResponse::new(ResponseMetadata::new(200), Bytes::from_static(body.as_bytes())),
    );
}

/// Runs `execute` and waits for its completion, checking it fires once.
pub async fn execute<E: CallExecutor, F: ResponseFormat>(
    executor: &E,
    call: &Call<F>,
    policy: CachePolicy,
    fallback: bool,
) -> (CallResult<F::Output>, Source) {
    let (tx, rx) = oneshot::channel();
    let fired = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&fired);
    executor.execute(
        call,
        policy,
        fallback,
        Box::new(move |result, source| {
            counter.fetch_add(1, Ordering::SeqCst);
            let _ = tx.send((result, source));
        }),
    );
    let delivered = rx.await.expect("completion delivered");
    tokio::task::yield_now().await;
    assert_eq!(fired.load(Ordering::SeqCst), 1);
    delivered
}
