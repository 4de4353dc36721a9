use std::collections::HashMap;
use std::sync::Mutex;
use std::time::SystemTime;

use serde_json::Value;

use crate::TaskId;

/// A unit of correlated work flowing through a pipeline.
///
/// A task is owned by the caller for its whole lifetime and shared by
/// reference (`Arc<Task>`) with whatever unit of work processes it. The unit
/// may finish on a different thread than the one that dispatched the task, so
/// the mutable parts (payload, headers, error slot) sit behind their own
/// locks. A task is never duplicated; correlation is by [`TaskId`].
///
/// Errors raised by a unit of work are not thrown across threads. They are
/// recorded into the error slot with [`Task::fail`] and discovered by the
/// dispatching side after completion.
#[derive(Debug)]
pub struct Task {
    id: TaskId,
    payload: Mutex<Value>,
    headers: Mutex<HashMap<String, Value>>,
    error: Mutex<Option<String>>,
    created_at: SystemTime,
}

impl Task {
    /// Create a task with a generated id.
    pub fn new(payload: Value) -> Self {
        Self::with_id(TaskId::new(), payload)
    }

    /// Create a task with an explicit correlation id.
    pub fn with_id(id: TaskId, payload: Value) -> Self {
        Self {
            id,
            payload: Mutex::new(payload),
            headers: Mutex::new(HashMap::new()),
            error: Mutex::new(None),
            created_at: SystemTime::now(),
        }
    }

    pub fn id(&self) -> &TaskId {
        &self.id
    }

    pub fn created_at(&self) -> SystemTime {
        self.created_at
    }

    /// Current payload (cloned out from under the lock).
    pub fn payload(&self) -> Value {
        self.payload.lock().unwrap().clone()
    }

    /// Replace the payload, returning the previous value.
    pub fn set_payload(&self, payload: Value) -> Value {
        std::mem::replace(&mut *self.payload.lock().unwrap(), payload)
    }

    /// Read a header by name.
    pub fn header(&self, name: &str) -> Option<Value> {
        self.headers.lock().unwrap().get(name).cloned()
    }

    /// Set a header, returning the previous value if any.
    pub fn set_header(&self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.headers.lock().unwrap().insert(name.into(), value)
    }

    /// Record a failure onto the error slot.
    ///
    /// A later failure overwrites an earlier one; the slot keeps the most
    /// recent reason.
    pub fn fail(&self, reason: impl Into<String>) {
        *self.error.lock().unwrap() = Some(reason.into());
    }

    /// Current contents of the error slot.
    pub fn error(&self) -> Option<String> {
        self.error.lock().unwrap().clone()
    }

    pub fn has_error(&self) -> bool {
        self.error.lock().unwrap().is_some()
    }

    /// Clear the error slot, e.g. before a compensating resend.
    pub fn clear_error(&self) -> Option<String> {
        self.error.lock().unwrap().take()
    }
}
