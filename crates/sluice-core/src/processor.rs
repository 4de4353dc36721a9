use std::sync::Arc;

use tracing::trace;

use sluice_model::Task;

use crate::service::Service;
use crate::token::CompletionToken;

/// A pluggable unit of work.
///
/// `process_async` either finishes everything before returning `true`
/// (synchronous completion), or schedules the remainder elsewhere and returns
/// `false`, guaranteeing the token is signaled exactly once when that work
/// finishes, on any thread. Failures are recorded on the task's error slot,
/// never raised from a call that returns `false`; the dispatching side reads
/// the slot after completion.
pub trait Processor: Send + Sync {
    fn process_async(&self, task: &Arc<Task>, token: CompletionToken) -> bool;

    /// Diagnostic label for logging.
    fn name(&self) -> &str {
        "processor"
    }

    /// Lifecycle capability discovery. Units without a lifecycle return
    /// `None` and lifecycle calls cascade past them as no-ops.
    fn as_service(&self) -> Option<&dyn Service> {
        None
    }
}

impl std::fmt::Debug for dyn Processor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Processor").field("name", &self.name()).finish()
    }
}

/// Read-only navigation over wrapped units, for diagnostic tree-walking
/// tools. Restartable and side-effect-free.
pub trait Navigate {
    fn has_next(&self) -> bool;

    /// Child units in order; empty when nothing is wrapped.
    fn next(&self) -> Vec<Arc<dyn Processor>>;
}

type TaskFn = dyn Fn(&Arc<Task>) -> Result<(), String> + Send + Sync;

/// Unit of work around a plain closure, always completing synchronously.
///
/// An `Err` from the closure lands on the task's error slot; the token is
/// signaled on the dispatching call path.
pub struct FnProcessor {
    name: &'static str,
    f: Box<TaskFn>,
}

impl FnProcessor {
    pub fn new(f: impl Fn(&Arc<Task>) -> Result<(), String> + Send + Sync + 'static) -> Self {
        Self {
            name: "fn",
            f: Box::new(f),
        }
    }

    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }
}

impl Processor for FnProcessor {
    fn process_async(&self, task: &Arc<Task>, token: CompletionToken) -> bool {
        if let Err(reason) = (self.f)(task) {
            task.fail(reason);
        }
        trace!(unit = self.name, task = %task.id(), "completed synchronously");
        token.done(true);
        true
    }

    fn name(&self) -> &str {
        self.name
    }
}
