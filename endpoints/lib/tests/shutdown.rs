//! Calls whose session runtime is gone still complete exactly once.

mod common;

use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

use endpoints::response::TextFormat;
use endpoints::{CachePolicy, Call, CallError, CallExecutor, MemoryCache, Session, Source};
use tokio::runtime::{Builder, Runtime};

use common::{session, Scripted, Step};

fn runtime() -> Runtime {
    Builder::new_current_thread().enable_all().build().unwrap()
}

/// Builds a session whose tasks and delivery worker live on `runtime`.
fn session_on(runtime: &Runtime, transport: &Scripted) -> Session<Scripted> {
    let _guard = runtime.enter();
    session(transport, &Arc::new(MemoryCache::default()))
}

/// Waits for exactly one delivery.
fn delivered_once<T>(rx: &mpsc::Receiver<T>) -> T {
    let first = rx.recv_timeout(Duration::from_secs(3)).expect("completion delivered");
    assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
    first
}

fn text_call() -> Call<TextFormat> {
    Call::get("/get").build()
}

#[test]
fn awaiting_after_session_runtime_shutdown_resolves_cancelled() {
    let transport = Scripted::default();
    let session_runtime = runtime();
    let session = session_on(&session_runtime, &transport);
    session_runtime.shutdown_timeout(Duration::from_millis(100));

    let caller = runtime();
    let resolution = caller.block_on(async {
        tokio::time::timeout(
            Duration::from_secs(3),
            session.call(&text_call(), CachePolicy::Normal, true),
        )
        .await
    });

    assert!(matches!(resolution, Ok(Err(CallError::Cancelled))));
    assert_eq!(transport.sent(), 0);
}

#[test]
fn start_after_session_runtime_shutdown_delivers_cancellation_once() {
    let transport = Scripted::default();
    let session_runtime = runtime();
    let session = session_on(&session_runtime, &transport);
    session_runtime.shutdown_timeout(Duration::from_millis(100));

    let (tx, rx) = mpsc::channel();
    session.start(&text_call(), CachePolicy::Normal, false, move |result, source| {
        let _ = tx.send((result.was_cancelled(), source));
    });

    assert_eq!(delivered_once(&rx), (true, Source::None));
    assert_eq!(transport.sent(), 0);
}

#[test]
fn shutdown_mid_flight_delivers_cancellation_once() {
    let transport = Scripted::new([Step::Hang]);
    let session_runtime = runtime();
    let session = session_on(&session_runtime, &transport);

    let (tx, rx) = mpsc::channel();
    session.start(&text_call(), CachePolicy::Normal, true, move |result, source| {
        let _ = tx.send((result.was_cancelled(), source));
    });
    session_runtime.block_on(async {
        while transport.sent() == 0 {
            tokio::task::yield_now().await;
        }
    });
    session_runtime.shutdown_timeout(Duration::from_millis(100));

    assert_eq!(delivered_once(&rx), (true, Source::None));
    assert_eq!(transport.dropped(), 1);
}
