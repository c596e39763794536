//! Transport abstraction.
//!
//! A [`Transport`] performs one network exchange for an encoded
//! [`TransportRequest`] and reports a [`TransportOutcome`]: optional response
//! metadata, optional body bytes and optional error. The call executor owns
//! everything above that (parsing, status checks, fallback, delivery).

pub(crate) mod http;
mod outcome;
mod request;

use std::future::Future;

pub use http::HttpTransport;
pub use outcome::TransportOutcome;
pub use request::{RequestKey, TransportRequest};

/// One network exchange per request.
///
/// Implementations never fail by returning early: every failure is reported
/// inside the outcome. Transports that keep a response cache should store
/// successful responses under [`TransportRequest::key`].
pub trait Transport: Send + Sync + 'static {
    fn send(&self, request: TransportRequest) -> impl Future<Output = TransportOutcome> + Send;
}
