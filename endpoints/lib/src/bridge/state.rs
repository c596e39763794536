use std::sync::{Mutex, MutexGuard};

use tokio::sync::oneshot;

use crate::error::CallError;
use crate::response::CallOutput;
use crate::session::CallTask;

pub(crate) type Resolution<T> = Result<CallOutput<T>, CallError<T>>;

/// Where a pending call is in its lifecycle.
///
/// ```text
/// Idle -> Starting -> Live -> FallbackStarting -> Fallback -> Resolved
///   \________\__________\___________\________________\-----> Cancelled
/// ```
///
/// `Starting` and `FallbackStarting` cover the window in which the executor
/// is being called without the lock held and no task handle exists yet.
#[derive(Debug)]
pub(crate) enum Phase {
    Idle,
    Starting,
    Live(CallTask),
    FallbackStarting,
    Fallback(CallTask),
    Cancelled,
    Resolved,
}

impl Phase {
    fn task(&self) -> Option<&CallTask> {
        match self {
            Self::Live(task) | Self::Fallback(task) => Some(task),
            _ => None,
        }
    }

    pub(crate) fn is_terminal(&self) -> bool {
        matches!(self, Self::Cancelled | Self::Resolved)
    }
}

struct State<T> {
    phase: Phase,
    // Taking this is the only way to resolve the call.
    resolver: Option<oneshot::Sender<Resolution<T>>>,
}

/// State shared between a [`PendingCall`](super::PendingCall), its
/// completions and its [`Canceller`](super::Canceller)s.
pub(crate) struct Shared<T> {
    state: Mutex<State<T>>,
}

impl<T> Shared<T> {
    pub(crate) fn new() -> (Self, oneshot::Receiver<Resolution<T>>) {
        let (tx, rx) = oneshot::channel();
        let shared = Self {
            state: Mutex::new(State {
                phase: Phase::Idle,
                resolver: Some(tx),
            }),
        };
        (shared, rx)
    }

    fn lock(&self) -> MutexGuard<'_, State<T>> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Moves `Idle -> Starting`. Returns `false` if the call was cancelled
    /// (or otherwise left `Idle`) first.
    pub(crate) fn begin_live(&self) -> bool {
        let mut state = self.lock();
        if matches!(state.phase, Phase::Idle) {
            state.phase = Phase::Starting;
            true
        } else {
            false
        }
    }

    /// Records the live task handle.
    pub(crate) fn attach_live(&self, task: CallTask) {
        self.attach(task, Phase::Live, |p| matches!(p, Phase::Starting));
    }

    /// Moves to `FallbackStarting` if the call is still unresolved.
    pub(crate) fn begin_fallback(&self) -> bool {
        let mut state = self.lock();
        if state.resolver.is_some() && !state.phase.is_terminal() {
            state.phase = Phase::FallbackStarting;
            true
        } else {
            false
        }
    }

    /// Records the fallback task handle.
    pub(crate) fn attach_fallback(&self, task: CallTask) {
        self.attach(task, Phase::Fallback, |p| {
            matches!(p, Phase::FallbackStarting)
        });
    }

    fn attach(&self, task: CallTask, wrap: fn(CallTask) -> Phase, expected: fn(&Phase) -> bool) {
        let mut state = self.lock();
        if expected(&state.phase) {
            state.phase = wrap(task);
        } else if matches!(state.phase, Phase::Cancelled) {
            // Cancelled while the executor was being called.
            drop(state);
            task.cancel();
        }
        // Any other phase: the task already completed and moved us on.
    }

    /// Resolves the call with `resolution` unless it is already resolved or
    /// cancelled. Returns whether this call won.
    pub(crate) fn resolve(&self, resolution: Resolution<T>) -> bool {
        let resolver = {
            let mut state = self.lock();
            if state.phase.is_terminal() {
                return false;
            }
            let Some(resolver) = state.resolver.take() else {
                return false;
            };
            state.phase = Phase::Resolved;
            resolver
        };
        // The receiver may already be gone (pending call dropped).
        let _ = resolver.send(resolution);
        true
    }

    /// Cancels the call: resolves it with [`CallError::Cancelled`] and
    /// cancels any in-flight task. Returns `false` if it was already resolved.
    pub(crate) fn cancel(&self) -> bool {
        let (resolver, previous) = {
            let mut state = self.lock();
            let Some(resolver) = state.resolver.take() else {
                return false;
            };
            let previous = std::mem::replace(&mut state.phase, Phase::Cancelled);
            (resolver, previous)
        };

        if let Some(task) = previous.task() {
            task.cancel();
        }
        tracing::debug!(phase = ?previous, "Pending call cancelled");
        let _ = resolver.send(Err(CallError::Cancelled));
        true
    }

    pub(crate) fn is_terminal(&self) -> bool {
        self.lock().phase.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::{ResponseMetadata, Source};

    fn output() -> CallOutput<u8> {
        CallOutput {
            value: 1,
            response: ResponseMetadata::new(200),
            source: Source::Origin,
        }
    }

    #[test]
    fn resolves_only_once() {
        let (shared, mut rx) = Shared::<u8>::new();
        assert!(shared.begin_live());
        assert!(shared.resolve(Ok(output())));
        assert!(!shared.resolve(Err(CallError::NoResponse { cause: None })));
        assert!(!shared.cancel());

        assert_eq!(rx.try_recv().unwrap().unwrap().value, 1);
    }

    #[test]
    fn cancel_before_start_prevents_start() {
        let (shared, mut rx) = Shared::<u8>::new();
        assert!(shared.cancel());
        assert!(!shared.begin_live());
        assert!(shared.is_terminal());
        assert!(matches!(rx.try_recv().unwrap(), Err(CallError::Cancelled)));
    }

    #[test]
    fn task_attached_after_cancel_is_cancelled() {
        let (shared, _rx) = Shared::<u8>::new();
        assert!(shared.begin_live());
        shared.cancel();

        let (task, _registration) = CallTask::new_pair();
        shared.attach_live(task.clone());
        assert!(task.is_cancelled());
    }

    #[test]
    fn cancel_reaches_the_live_task() {
        let (shared, _rx) = Shared::<u8>::new();
        let (task, _registration) = CallTask::new_pair();
        shared.begin_live();
        shared.attach_live(task.clone());

        shared.cancel();
        assert!(task.is_cancelled());
    }

    #[test]
    fn late_attach_does_not_rewind_phase() {
        let (shared, mut rx) = Shared::<u8>::new();
        shared.begin_live();
        // Completion ran before the handle was attached.
        shared.resolve(Ok(output()));

        let (task, _registration) = CallTask::new_pair();
        shared.attach_live(task.clone());
        assert!(!task.is_cancelled());
        assert!(shared.is_terminal());
        assert!(rx.try_recv().unwrap().is_ok());
    }

    #[test]
    fn fallback_cannot_begin_after_cancel() {
        let (shared, _rx) = Shared::<u8>::new();
        shared.begin_live();
        shared.cancel();
        assert!(!shared.begin_fallback());
    }
}
