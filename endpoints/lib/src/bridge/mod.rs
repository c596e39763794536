//! Awaitable calls on top of the completion-based executor.
//!
//! [`PendingCall`] turns one [`CallExecutor::execute`](crate::CallExecutor::execute)
//! (plus an optional cache-only retry) into a future that resolves exactly
//! once, whether the call succeeds, fails, falls back to the cache or is
//! cancelled. Resolution consumes a single-use token held in the shared
//! state, so no two paths can both resolve the same call.

mod pending;
mod state;

pub use pending::{Canceller, PendingCall};
