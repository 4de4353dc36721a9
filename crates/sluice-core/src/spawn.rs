use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;
use tracing::trace;

use sluice_model::Task;

use crate::error::LifecycleError;
use crate::processor::Processor;
use crate::service::{Op, Service, ServiceState, run_transition};
use crate::token::CompletionToken;

/// Asynchronous body of work run by a [`SpawnProcessor`].
///
/// `cancel` is the unit's cooperative shutdown signal; long-running work
/// should select on it. An `Err` becomes the task's recorded failure.
#[async_trait]
pub trait AsyncWork: Send + Sync {
    async fn run(&self, task: Arc<Task>, cancel: CancellationToken) -> Result<(), String>;
}

#[async_trait]
impl<F, Fut> AsyncWork for F
where
    F: Fn(Arc<Task>, CancellationToken) -> Fut + Send + Sync,
    Fut: std::future::Future<Output = Result<(), String>> + Send + 'static,
{
    async fn run(&self, task: Arc<Task>, cancel: CancellationToken) -> Result<(), String> {
        self(task, cancel).await
    }
}

/// Unit of work that finishes on a tokio runtime, never on the dispatching
/// thread.
///
/// Dispatch spawns the [`AsyncWork`] onto the handle and returns `false`
/// immediately; the token is signaled from the runtime thread once the work
/// is done. `shutdown` cancels the unit's root token, which every in-flight
/// task observes through a child token — the unit decides how to wind down,
/// nothing force-releases its callers.
pub struct SpawnProcessor {
    name: &'static str,
    work: Arc<dyn AsyncWork>,
    handle: Handle,
    cancel: CancellationToken,
    state: Mutex<ServiceState>,
}

impl SpawnProcessor {
    pub fn new(work: Arc<dyn AsyncWork>, handle: Handle) -> Self {
        Self {
            name: "spawn",
            work,
            handle,
            cancel: CancellationToken::new(),
            state: Mutex::new(ServiceState::Created),
        }
    }

    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }
}

impl Processor for SpawnProcessor {
    fn process_async(&self, task: &Arc<Task>, token: CompletionToken) -> bool {
        let work = Arc::clone(&self.work);
        let task = Arc::clone(task);
        let cancel = self.cancel.child_token();
        let unit = self.name;

        self.handle.spawn(async move {
            if let Err(reason) = work.run(Arc::clone(&task), cancel).await {
                task.fail(reason);
            }
            trace!(unit, task = %task.id(), "completed asynchronously");
            token.done(false);
        });

        false
    }

    fn name(&self) -> &str {
        self.name
    }

    fn as_service(&self) -> Option<&dyn Service> {
        Some(self)
    }
}

impl Service for SpawnProcessor {
    fn start(&self) -> Result<(), LifecycleError> {
        run_transition(&self.state, Op::Start, || Ok(()))
    }

    fn stop(&self) -> Result<(), LifecycleError> {
        run_transition(&self.state, Op::Stop, || Ok(()))
    }

    fn shutdown(&self) -> Result<(), LifecycleError> {
        run_transition(&self.state, Op::Shutdown, || {
            self.cancel.cancel();
            Ok(())
        })
    }

    fn state(&self) -> ServiceState {
        *self.state.lock().unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenState;
    use serde_json::{Value, json};
    use std::time::Duration;

    fn sleepy_work(ms: u64) -> Arc<dyn AsyncWork> {
        Arc::new(
            move |task: Arc<Task>, cancel: CancellationToken| async move {
                tokio::select! {
                    _ = tokio::time::sleep(Duration::from_millis(ms)) => {
                        task.set_payload(json!("done"));
                        Ok(())
                    }
                    _ = cancel.cancelled() => Err("cancelled".to_string()),
                }
            },
        )
    }

    #[test]
    fn completes_on_runtime_thread() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let unit = SpawnProcessor::new(sleepy_work(10), rt.handle().clone());

        let task = Arc::new(Task::new(Value::Null));
        let token = CompletionToken::detached();

        assert!(!unit.process_async(&task, token.clone()));

        for _ in 0..200 {
            if token.state() == TokenState::Fired {
                break;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(token.state(), TokenState::Fired);
        assert_eq!(task.payload(), json!("done"));
    }

    #[test]
    fn shutdown_cancels_in_flight_work() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let unit = SpawnProcessor::new(sleepy_work(60_000), rt.handle().clone());
        unit.start().unwrap();

        let task = Arc::new(Task::new(Value::Null));
        let token = CompletionToken::detached();
        assert!(!unit.process_async(&task, token.clone()));

        unit.shutdown().unwrap();
        assert_eq!(unit.state(), ServiceState::Shutdown);

        for _ in 0..200 {
            if token.state() == TokenState::Fired {
                break;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(token.state(), TokenState::Fired);
        assert_eq!(task.error(), Some("cancelled".to_string()));
    }
}
