use std::sync::{Arc, Mutex, RwLock};

use tracing::{instrument, warn};

use sluice_model::Task;

use crate::error::{BridgeError, LifecycleError};
use crate::processor::{Navigate, Processor};
use crate::registry::{AwaitRegistry, Gate, WaitOutcome};
use crate::service::{Op, Service, ServiceState, run_transition};
use crate::token::CompletionToken;

/// Wraps one inner unit of work and exposes it through both a blocking and a
/// non-blocking entry point.
///
/// The asynchronous path ([`process_async`](Self::process_async)) is the
/// natural one for chained pipelines and never blocks. The synchronous path
/// ([`process_sync`](Self::process_sync)) parks the calling thread in the
/// [`AwaitRegistry`] until the inner unit's completion token fires, however
/// many threads away that happens.
///
/// Ownership of the inner unit is shared with whoever constructed the bridge;
/// it may be swapped at runtime, and in-flight tasks keep running against the
/// unit they were dispatched to.
///
/// The blocking path must not be called from a thread the inner unit needs
/// for its completion (e.g. a single-threaded runtime worker).
pub struct Bridge {
    inner: RwLock<Option<Arc<dyn Processor>>>,
    registry: AwaitRegistry,
    state: Mutex<ServiceState>,
}

impl Bridge {
    pub fn new(inner: Arc<dyn Processor>, registry: AwaitRegistry) -> Arc<Self> {
        Arc::new(Self {
            inner: RwLock::new(Some(inner)),
            registry,
            state: Mutex::new(ServiceState::Created),
        })
    }

    /// Bridge with no inner unit yet; dispatching through it records a
    /// configuration failure on the task until one is installed.
    pub fn empty(registry: AwaitRegistry) -> Arc<Self> {
        Arc::new(Self {
            inner: RwLock::new(None),
            registry,
            state: Mutex::new(ServiceState::Created),
        })
    }

    pub fn registry(&self) -> &AwaitRegistry {
        &self.registry
    }

    /// Current wrapped unit.
    pub fn inner(&self) -> Option<Arc<dyn Processor>> {
        self.inner.read().unwrap().clone()
    }

    /// Replace the wrapped unit, returning the previous one.
    ///
    /// In-flight tasks continue against the unit they were dispatched to.
    /// Installing the bridge as its own inner unit would recurse without
    /// bound and is rejected.
    pub fn set_inner(
        self: &Arc<Self>,
        unit: Arc<dyn Processor>,
    ) -> Result<Option<Arc<dyn Processor>>, BridgeError> {
        if Arc::as_ptr(&unit) as *const () == Arc::as_ptr(self) as *const () {
            return Err(BridgeError::Configuration(
                "bridge cannot delegate to itself".to_string(),
            ));
        }
        Ok(self.inner.write().unwrap().replace(unit))
    }

    /// Block the calling thread until the inner unit has finished `task`.
    ///
    /// The thread blocks only when the unit completes asynchronously, and is
    /// unblocked exactly once — immediately on a synchronous completion, or
    /// by the registry when the completion token fires. Any failure the unit
    /// recorded on the task surfaces as [`BridgeError::Processing`]; an
    /// external interrupt as [`BridgeError::Interrupted`].
    #[instrument(level = "trace", skip_all, fields(task = %task.id()))]
    pub fn process_sync(&self, task: &Arc<Task>) -> Result<(), BridgeError> {
        let gate = Arc::new(Gate::new());
        let token = CompletionToken::bound(self.registry.clone(), Arc::clone(task), Arc::clone(&gate));

        let done_sync = self.process_async(task, token.clone());
        if !done_sync {
            token.mark_pending_async();
            match self.registry.await_completion(task, &gate) {
                WaitOutcome::Completed => {}
                WaitOutcome::Interrupted => {
                    return Err(BridgeError::Interrupted(task.id().clone()));
                }
            }
        }

        match task.error() {
            Some(reason) => Err(BridgeError::Processing {
                task: task.id().clone(),
                reason,
            }),
            None => Ok(()),
        }
    }

    /// Non-blocking dispatch; returns whatever the inner unit returns.
    pub fn process_async(&self, task: &Arc<Task>, token: CompletionToken) -> bool {
        match self.inner() {
            Some(unit) => unit.process_async(task, token),
            None => {
                warn!(task = %task.id(), "dispatch through bridge with no inner unit");
                task.fail("no inner unit installed");
                token.done(true);
                true
            }
        }
    }

    fn cascade(&self, op: Op) -> Result<(), LifecycleError> {
        let Some(unit) = self.inner() else {
            return Ok(());
        };
        let Some(svc) = unit.as_service() else {
            return Ok(());
        };
        let result = match op {
            Op::Start => svc.start(),
            Op::Stop => svc.stop(),
            Op::Shutdown => svc.shutdown(),
        };
        result.map_err(|e| LifecycleError::Cascade {
            op: op.name(),
            reason: e.to_string(),
        })
    }
}

impl Processor for Bridge {
    fn process_async(&self, task: &Arc<Task>, token: CompletionToken) -> bool {
        Bridge::process_async(self, task, token)
    }

    fn name(&self) -> &str {
        "bridge"
    }

    fn as_service(&self) -> Option<&dyn Service> {
        Some(self)
    }
}

impl Service for Bridge {
    fn start(&self) -> Result<(), LifecycleError> {
        run_transition(&self.state, Op::Start, || self.cascade(Op::Start))
    }

    fn stop(&self) -> Result<(), LifecycleError> {
        run_transition(&self.state, Op::Stop, || self.cascade(Op::Stop))
    }

    /// Terminal. Requests cooperative termination from the inner unit but
    /// never force-releases an in-flight wait.
    fn shutdown(&self) -> Result<(), LifecycleError> {
        run_transition(&self.state, Op::Shutdown, || self.cascade(Op::Shutdown))
    }

    fn state(&self) -> ServiceState {
        *self.state.lock().unwrap()
    }
}

impl Navigate for Bridge {
    fn has_next(&self) -> bool {
        self.inner.read().unwrap().is_some()
    }

    fn next(&self) -> Vec<Arc<dyn Processor>> {
        self.inner.read().unwrap().iter().cloned().collect()
    }
}
