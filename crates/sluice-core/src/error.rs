use thiserror::Error;

use sluice_model::TaskId;

use crate::service::ServiceState;

/// A cascaded start/stop/shutdown call failed or was not legal.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("cannot {op} from state {from:?}")]
    InvalidTransition {
        op: &'static str,
        from: ServiceState,
    },
    #[error("inner unit failed during {op}: {reason}")]
    Cascade { op: &'static str, reason: String },
}

/// Failures surfaced by a [`Bridge`](crate::Bridge) to its immediate caller.
///
/// Nothing is swallowed: configuration mistakes fail at wiring time,
/// processing failures recorded by the inner unit surface after release, and
/// an externally interrupted wait leaves the task's outcome undefined.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Structurally invalid wiring (e.g. a bridge delegating to itself).
    /// Fatal, never retried.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The inner unit recorded a failure on the task's error slot.
    /// Retry policy belongs to the pipeline, not to the bridge.
    #[error("processing failed for task {task}: {reason}")]
    Processing { task: TaskId, reason: String },

    /// The blocking wait was cancelled externally. The task's outcome is
    /// undefined; it must not be reused without explicit compensation.
    #[error("blocking wait interrupted for task {0}")]
    Interrupted(TaskId),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
}
