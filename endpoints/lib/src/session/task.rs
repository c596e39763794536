use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use futures::future::{AbortHandle, AbortRegistration};

static NEXT_TASK_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identifier of one executed call, used in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

impl TaskId {
    fn next() -> Self {
        Self(NEXT_TASK_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Handle to one executing call.
///
/// Cancelling aborts the in-flight work; the call's completion is still
/// delivered exactly once, with a cancellation error, unless it had already
/// been committed.
#[derive(Debug, Clone)]
pub struct CallTask {
    id: TaskId,
    abort: AbortHandle,
    cancelled: Arc<AtomicBool>,
}

impl CallTask {
    /// Creates a task handle and the registration its work must be wrapped
    /// with (see [`futures::future::Abortable`]).
    ///
    /// Executors other than [`Session`](crate::Session) use this to hand out
    /// handles for their own work.
    pub fn new_pair() -> (Self, AbortRegistration) {
        let (abort, registration) = AbortHandle::new_pair();
        let task = Self {
            id: TaskId::next(),
            abort,
            cancelled: Arc::new(AtomicBool::new(false)),
        };
        (task, registration)
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Cancels the task. Repeated calls are no-ops.
    pub fn cancel(&self) {
        if !self.cancelled.swap(true, Ordering::AcqRel) {
            tracing::debug!(task = %self.id, "Cancelling call task");
            self.abort.abort();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}
