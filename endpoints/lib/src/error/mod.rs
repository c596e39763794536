//! Layered error types.
//!
//! - [`TransportError`] - network-level failures reported by a transport
//! - [`ParseError`] - the response body did not match the declared format
//! - [`CallFailure`] - the error slot of a [`CallResult`](crate::CallResult)
//! - [`CallError`] - failures of an awaited [`PendingCall`](crate::PendingCall)
//! - [`ConfigError`] - session, call and environment configuration errors

mod call_error;
mod call_failure;
mod config_error;
mod parse_error;
mod transport_error;

pub use call_error::CallError;
pub use call_failure::CallFailure;
pub use config_error::ConfigError;
pub use parse_error::ParseError;
pub use transport_error::TransportError;
