use std::sync::{Arc, Mutex};

use tracing::error;

use sluice_model::Task;

use crate::registry::{AwaitRegistry, Gate};

/// Where a token is in its one-shot life.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenState {
    /// Created for a dispatch that has not returned yet; a firing here is a
    /// synchronous completion.
    PendingSync,
    /// The dispatch returned `false`; the next firing comes from whatever
    /// thread finishes the remaining work.
    PendingAsync,
    /// Signaled. Any further firing is a contract violation.
    Fired,
}

struct ReleaseHook {
    registry: AwaitRegistry,
    task: Arc<Task>,
    gate: Arc<Gate>,
}

struct TokenInner {
    state: Mutex<TokenState>,
    release: Option<ReleaseHook>,
}

/// One-shot completion signal handed to a unit of work.
///
/// The unit must call [`done`](Self::done) exactly once when its work for the
/// task is finished, on whatever thread that happens: `done(true)` on the
/// dispatching call path, `done(false)` from anywhere else. A second call is
/// a bug in the unit; it is logged and ignored, and can never double-release
/// the caller because release happens only on the single `Pending* -> Fired`
/// transition.
#[derive(Clone)]
pub struct CompletionToken {
    inner: Arc<TokenInner>,
}

impl CompletionToken {
    /// Token with no blocked caller attached, for driving a purely
    /// asynchronous pipeline.
    pub fn detached() -> Self {
        Self {
            inner: Arc::new(TokenInner {
                state: Mutex::new(TokenState::PendingSync),
                release: None,
            }),
        }
    }

    /// Token whose asynchronous firing releases `gate` through `registry`.
    pub(crate) fn bound(registry: AwaitRegistry, task: Arc<Task>, gate: Arc<Gate>) -> Self {
        Self {
            inner: Arc::new(TokenInner {
                state: Mutex::new(TokenState::PendingSync),
                release: Some(ReleaseHook {
                    registry,
                    task,
                    gate,
                }),
            }),
        }
    }

    /// Signal that the unit's work for the task is finished.
    ///
    /// `done_sync` is `true` only when called on the dispatching call path,
    /// before `process_async` returns.
    pub fn done(&self, done_sync: bool) {
        {
            let mut state = self.inner.state.lock().unwrap();
            if *state == TokenState::Fired {
                error!(done_sync, "completion token fired twice; ignoring");
                return;
            }
            *state = TokenState::Fired;
        }

        if !done_sync
            && let Some(hook) = &self.inner.release
        {
            hook.registry.release(&hook.task, &hook.gate);
        }
    }

    /// Bridge-side note that the dispatch returned `false`.
    ///
    /// No-op when the completing thread already fired; the gate absorbs that
    /// race.
    pub(crate) fn mark_pending_async(&self) {
        let mut state = self.inner.state.lock().unwrap();
        if *state == TokenState::PendingSync {
            *state = TokenState::PendingAsync;
        }
    }

    pub fn state(&self) -> TokenState {
        *self.inner.state.lock().unwrap()
    }
}
