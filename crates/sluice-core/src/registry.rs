use std::collections::HashMap;
use std::sync::{Arc, Condvar, Mutex};
use std::time::Instant;

use tracing::{debug, trace, warn};

use sluice_model::{Task, TaskId, WaitSnapshot};

/// Outcome of one blocking wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The gate was released by the inner unit's completion.
    Completed,
    /// The wait was abandoned by an external interrupt. The task's outcome
    /// is undefined.
    Interrupted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GateState {
    Pending,
    Released,
    Interrupted,
}

/// Single-permit gate one blocked caller parks on.
///
/// A gate is resolved at most once: the first of `release`/`interrupt` wins
/// and later calls are no-ops. Releasing before anyone waits is fine; the
/// wait then returns immediately. The gate's mutex is what establishes the
/// happens-before edge between the completing thread's task mutations and the
/// unblocked caller.
pub struct Gate {
    state: Mutex<GateState>,
    cv: Condvar,
}

impl Gate {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(GateState::Pending),
            cv: Condvar::new(),
        }
    }

    fn resolve(&self, to: GateState) -> bool {
        let mut state = self.state.lock().unwrap();
        if *state != GateState::Pending {
            return false;
        }
        *state = to;
        self.cv.notify_one();
        true
    }

    fn wait(&self) -> WaitOutcome {
        let mut state = self.state.lock().unwrap();
        while *state == GateState::Pending {
            state = self.cv.wait(state).unwrap();
        }
        match *state {
            GateState::Released => WaitOutcome::Completed,
            _ => WaitOutcome::Interrupted,
        }
    }
}

impl Default for Gate {
    fn default() -> Self {
        Self::new()
    }
}

struct WaitEntry {
    gate: Arc<Gate>,
    since: Instant,
}

/// Coordination table matching blocked synchronous callers to their eventual
/// asynchronous completions.
///
/// Constructed once at process (or test-harness) startup and handed to every
/// bridge; cloning shares the same table. The map lock covers only
/// insert/remove/interrupt/enumerate — the blocking wait itself parks on the
/// entry's own [`Gate`], so unrelated tasks never serialize on it.
///
/// The registry never raises business errors. It blocks, releases, and
/// reports interruption; everything else belongs to the bridge.
#[derive(Clone, Default)]
pub struct AwaitRegistry {
    entries: Arc<Mutex<HashMap<TaskId, WaitEntry>>>,
}

impl AwaitRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block the calling thread on `gate` until released or interrupted.
    ///
    /// While blocked, the caller is visible to [`blocked`](Self::blocked) for
    /// diagnostics. The entry is removed on every exit path; an abandoned
    /// wait never leaks it.
    pub fn await_completion(&self, task: &Arc<Task>, gate: &Arc<Gate>) -> WaitOutcome {
        let id = task.id().clone();
        {
            let mut entries = self.entries.lock().unwrap();
            if entries.contains_key(&id) {
                // Ids are expected to be unique per in-flight task; a
                // duplicate wait still resolves through its own gate, but
                // only the latest one is visible to interrupt/enumerate.
                warn!(task = %id, "duplicate blocking wait registered");
            }
            entries.insert(
                id.clone(),
                WaitEntry {
                    gate: Arc::clone(gate),
                    since: Instant::now(),
                },
            );
        }
        trace!(task = %id, "caller blocked");

        let outcome = gate.wait();

        {
            let mut entries = self.entries.lock().unwrap();
            // Remove only our own entry; a duplicate registration may have
            // replaced it while we were parked.
            if entries
                .get(&id)
                .is_some_and(|e| Arc::ptr_eq(&e.gate, gate))
            {
                entries.remove(&id);
            }
        }
        trace!(task = %id, ?outcome, "caller unblocked");
        outcome
    }

    /// Release the caller blocked on `gate`.
    ///
    /// Goes straight to the gate, never through the id map, so one release
    /// can never wake the wrong waiter. Releasing before the wait is
    /// registered is a benign race; releasing a gate already abandoned by
    /// interruption is a no-op.
    pub fn release(&self, task: &Task, gate: &Gate) {
        if gate.resolve(GateState::Released) {
            trace!(task = %task.id(), "released blocked caller");
        } else {
            debug!(task = %task.id(), "release on already resolved gate ignored");
        }
    }

    /// Interrupt the caller blocked on `id`, if any.
    ///
    /// Returns `true` when a blocked entry existed. The woken caller observes
    /// [`WaitOutcome::Interrupted`] and removes its own entry.
    pub fn interrupt(&self, id: &TaskId) -> bool {
        let gate = {
            let entries = self.entries.lock().unwrap();
            entries.get(id).map(|e| Arc::clone(&e.gate))
        };
        match gate {
            Some(gate) => {
                let flipped = gate.resolve(GateState::Interrupted);
                debug!(task = %id, flipped, "interrupt requested");
                flipped
            }
            None => false,
        }
    }

    /// Snapshot of all currently blocked synchronous callers.
    pub fn blocked(&self) -> Vec<WaitSnapshot> {
        let entries = self.entries.lock().unwrap();
        entries
            .iter()
            .map(|(id, e)| WaitSnapshot {
                task_id: id.clone(),
                waited_ms: e.since.elapsed().as_millis() as u64,
            })
            .collect()
    }

    pub fn blocked_count(&self) -> usize {
        self.entries.lock().unwrap().len()
    }
}
