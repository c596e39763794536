//! Typed HTTP calls over a pluggable transport.
//!
//! The `endpoints` crate turns a strongly-typed [`Call`] description into a
//! wire request, executes it, parses the response into the call's declared
//! output type and hands back a uniform [`CallResult`] envelope.
//!
//! ## Features
//!
//! - **Completion-based execution**: [`CallExecutor::execute`] delivers
//!   exactly one envelope per call on the session's delivery queue
//! - **Offline-cache fallback**: when the live attempt fails, a previously
//!   cached response can be served instead (tagged with [`Source::Cache`])
//! - **Awaitable calls**: [`CallExecutor::call`] returns a [`PendingCall`]
//!   future that resolves exactly once, including under cancellation
//! - **Typed parsing**: JSON, YAML, text, binary formats via [`ResponseFormat`]
//! - **Layered errors**: transport, status, parse and offline-cache failures
//!
//! ## Example
//!
//! ```rust,ignore
//! use endpoints::{Call, CachePolicy, CallExecutor, Session};
//! use endpoints::response::JsonObject;
//! use url::Url;
//!
//! let session = Session::builder(Url::parse("https://httpbin.org")?).build()?;
//!
//! let call: Call<JsonObject> = Call::get("/get")
//!     .query("inputParam", "inputParamValue")
//!     .build();
//!
//! let output = session.call(&call, CachePolicy::Normal, true).await?;
//! println!("{:?} from {:?}", output.value["args"], output.source);
//! ```

pub mod auth;
pub mod bridge;
pub mod cache;
pub mod call;
pub mod config;
pub mod error;
pub mod method;
pub mod response;
pub mod session;
pub mod testing;
pub mod transport;

// Re-exports for convenience
pub use auth::Authorization;
pub use bridge::{Canceller, PendingCall};
pub use cache::{CachePolicy, CacheStore, CachedResponse, MemoryCache};
pub use call::{Call, CallBuilder};
pub use config::SessionConfig;
pub use error::{CallError, CallFailure, ConfigError, ParseError, TransportError};
pub use method::RestMethod;
pub use response::{
    CallOutput, CallResult, ResponseFormat, ResponseMetadata, Source, TextEncoding,
};
pub use session::{CallExecutor, CallTask, Completion, Session, SessionBuilder, TaskId};
pub use transport::{HttpTransport, RequestKey, Transport, TransportOutcome, TransportRequest};
