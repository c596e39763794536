//! The Call Executor.
//!
//! [`Session`] executes [`Call`](crate::Call)s against a [`Transport`](crate::Transport),
//! consults the response cache, falls back to it when the origin fails (if
//! asked to) and delivers exactly one [`CallResult`](crate::CallResult) per
//! call on its delivery queue.

mod builder;
mod client;
mod delivery;
mod executor;
mod task;
mod transform;

pub use builder::SessionBuilder;
pub use client::Session;
pub use executor::{CallExecutor, Completion};
pub use task::{CallTask, TaskId};

pub(crate) use delivery::DeliveryQueue;
pub(crate) use executor::CompletionGuard;
pub(crate) use transform::transform;
