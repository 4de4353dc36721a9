use std::sync::Mutex;

use crate::error::LifecycleError;

/// Lifecycle state of a service-capable unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    /// Constructed, never started.
    Created,
    /// `start` in progress.
    Starting,
    /// Running.
    Started,
    /// `stop` in progress.
    Stopping,
    /// Stopped; may be started again.
    Stopped,
    /// `shutdown` in progress.
    ShuttingDown,
    /// Terminal. A shut-down unit never runs again.
    Shutdown,
}

impl ServiceState {
    /// Returns `true` if the state is terminal (won't transition further).
    pub fn is_terminal(&self) -> bool {
        matches!(self, ServiceState::ShuttingDown | ServiceState::Shutdown)
    }

    pub fn is_started(&self) -> bool {
        matches!(self, ServiceState::Started)
    }
}

/// Lifecycle capability of a unit of work.
///
/// `start` and `stop` are idempotent when the unit is already in the target
/// stable state. `shutdown` is terminal and non-reversible; it additionally
/// requests cooperative termination of any in-flight work the unit owns.
pub trait Service: Send + Sync {
    fn start(&self) -> Result<(), LifecycleError>;
    fn stop(&self) -> Result<(), LifecycleError>;
    fn shutdown(&self) -> Result<(), LifecycleError>;
    fn state(&self) -> ServiceState;
}

/// Lifecycle operations a state cell understands.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Op {
    Start,
    Stop,
    Shutdown,
}

impl Op {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            Op::Start => "start",
            Op::Stop => "stop",
            Op::Shutdown => "shutdown",
        }
    }
}

/// Drive one lifecycle transition through `cell`, running `cascade` between
/// the transitional and the stable state.
///
/// On cascade failure the cell is put back to the state it was attempting to
/// leave, so a failed `start` does not silently advance the unit.
pub(crate) fn run_transition(
    cell: &Mutex<ServiceState>,
    op: Op,
    cascade: impl FnOnce() -> Result<(), LifecycleError>,
) -> Result<(), LifecycleError> {
    let from = {
        let mut state = cell.lock().unwrap();
        let from = *state;
        let transitional = match op {
            Op::Start => match from {
                ServiceState::Started => return Ok(()),
                ServiceState::Created | ServiceState::Stopped => ServiceState::Starting,
                _ => return Err(LifecycleError::InvalidTransition { op: op.name(), from }),
            },
            Op::Stop => match from {
                ServiceState::Stopped | ServiceState::Created => return Ok(()),
                ServiceState::Started => ServiceState::Stopping,
                _ => return Err(LifecycleError::InvalidTransition { op: op.name(), from }),
            },
            Op::Shutdown => match from {
                ServiceState::Shutdown => return Ok(()),
                _ => ServiceState::ShuttingDown,
            },
        };
        *state = transitional;
        from
    };

    // The cell stays in the transitional state while the cascade runs; the
    // lock is not held across the inner unit's own lifecycle work.
    match cascade() {
        Ok(()) => {
            let stable = match op {
                Op::Start => ServiceState::Started,
                Op::Stop => ServiceState::Stopped,
                Op::Shutdown => ServiceState::Shutdown,
            };
            *cell.lock().unwrap() = stable;
            Ok(())
        }
        Err(e) => {
            *cell.lock().unwrap() = from;
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states() {
        assert!(ServiceState::ShuttingDown.is_terminal());
        assert!(ServiceState::Shutdown.is_terminal());

        assert!(!ServiceState::Created.is_terminal());
        assert!(!ServiceState::Started.is_terminal());
        assert!(!ServiceState::Stopped.is_terminal());
    }

    #[test]
    fn start_stop_cycle() {
        let cell = Mutex::new(ServiceState::Created);

        run_transition(&cell, Op::Start, || Ok(())).unwrap();
        assert_eq!(*cell.lock().unwrap(), ServiceState::Started);

        // idempotent
        run_transition(&cell, Op::Start, || Ok(())).unwrap();
        assert_eq!(*cell.lock().unwrap(), ServiceState::Started);

        run_transition(&cell, Op::Stop, || Ok(())).unwrap();
        assert_eq!(*cell.lock().unwrap(), ServiceState::Stopped);

        run_transition(&cell, Op::Start, || Ok(())).unwrap();
        assert_eq!(*cell.lock().unwrap(), ServiceState::Started);
    }

    #[test]
    fn shutdown_is_terminal() {
        let cell = Mutex::new(ServiceState::Started);

        run_transition(&cell, Op::Shutdown, || Ok(())).unwrap();
        assert_eq!(*cell.lock().unwrap(), ServiceState::Shutdown);

        // repeated shutdown is accepted, start is not
        run_transition(&cell, Op::Shutdown, || Ok(())).unwrap();
        let err = run_transition(&cell, Op::Start, || Ok(())).unwrap_err();
        assert!(matches!(err, LifecycleError::InvalidTransition { .. }));
    }

    #[test]
    fn failed_cascade_does_not_advance() {
        let cell = Mutex::new(ServiceState::Created);

        let err = run_transition(&cell, Op::Start, || {
            Err(LifecycleError::Cascade {
                op: "start",
                reason: "boom".into(),
            })
        })
        .unwrap_err();

        assert!(matches!(err, LifecycleError::Cascade { .. }));
        assert_eq!(*cell.lock().unwrap(), ServiceState::Created);
    }
}
