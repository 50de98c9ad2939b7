use super::{MachineId, Shared};
use crate::core::{EventId, StateId, TransitionHistory};
use crate::error::EngineError;
use std::fmt;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{trace, warn};

/// Cloneable, thread-safe access to a machine's event and query operations.
///
/// Every state callback receives the handle of the machine that owns the
/// state. Handles can also be cloned out with `Machine::handle` and moved to
/// other threads; they never keep the worker alive on their own.
#[derive(Clone)]
pub struct MachineHandle {
    shared: Arc<Shared>,
}

impl MachineHandle {
    pub(crate) fn new(shared: Arc<Shared>) -> Self {
        Self { shared }
    }

    /// Queue an event and return without waiting for it to be applied.
    ///
    /// Fails with `NotRunning` before `start`, once `stop` has been
    /// requested, and after the worker stopped on a fault.
    ///
    /// The one exception: a state callback that raises while the machine is shutting down gets
    /// `Ok`: the event is dropped with a warning and the worker carries on
    /// applying the events accepted before `stop`.
    pub fn raise(&self, event: impl Into<EventId>) -> Result<(), EngineError> {
        let event = event.into();
        trace!(machine = %self.shared.name, %event, "raising event");
        match self.shared.queue.enqueue(event.clone()) {
            Err(EngineError::NotRunning)
                if self.shared.queue.is_shutting_down() && self.shared.on_worker_thread() =>
            {
                warn!(machine = %self.shared.name, %event, "event raised during shutdown dropped");
                Ok(())
            }
            result => result,
        }
    }

    /// The state the machine currently occupies.
    pub fn active_state(&self) -> Result<StateId, EngineError> {
        self.shared
            .active
            .read()
            .clone()
            .ok_or(EngineError::NotInitialized)
    }

    /// Whether events are queued or being applied. The answer may be stale
    /// by the time it is returned; use it as a liveness hint only.
    pub fn has_pending_events(&self) -> bool {
        self.shared.queue.has_pending()
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }

    /// Snapshot of the recorded transitions.
    pub fn history(&self) -> TransitionHistory {
        self.shared.history.lock().clone()
    }

    pub fn id(&self) -> MachineId {
        self.shared.id
    }

    pub fn name(&self) -> &str {
        &self.shared.name
    }
}

impl fmt::Debug for MachineHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MachineHandle")
            .field("name", &self.shared.name)
            .field("id", &self.shared.id)
            .finish()
    }
}
