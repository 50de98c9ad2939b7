//! The worker loop: the single thread that applies queued events.

use super::registry::Registry;
use super::{MachineHandle, Shared};
use crate::core::{EventId, TransitionContext};
use crate::error::{CallbackPhase, EngineError};
use crate::queue::Batch;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread;
use tracing::{debug, error, info_span, trace, warn};

/// What the worker hands back when it is joined.
pub(crate) struct WorkerExit {
    pub(crate) registry: Registry,
    pub(crate) outcome: Result<(), EngineError>,
}

pub(crate) struct Worker {
    shared: Arc<Shared>,
    handle: MachineHandle,
    registry: Registry,
    active: usize,
}

/// Marks the machine stopped however the worker exits, panics included.
struct RunningGuard<'a>(&'a Shared);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.worker_thread.lock().take();
        self.0.queue.close();
        self.0.running.store(false, Ordering::Release);
    }
}

impl Worker {
    pub(crate) fn new(shared: Arc<Shared>, registry: Registry, active: usize) -> Self {
        let handle = MachineHandle::new(Arc::clone(&shared));
        Self {
            shared,
            handle,
            registry,
            active,
        }
    }

    pub(crate) fn run(mut self) -> WorkerExit {
        let shared = Arc::clone(&self.shared);
        let span = info_span!("fsm", machine = %shared.name, id = %shared.id);
        let _entered = span.enter();
        *shared.worker_thread.lock() = Some(thread::current().id());
        let _running = RunningGuard(&shared);

        debug!(state = %self.registry.ids[self.active], "worker started");
        let outcome = self.process();
        match &outcome {
            Ok(()) => debug!(state = %self.registry.ids[self.active], "worker finished"),
            Err(fault) => {
                let dropped = shared.queue.close();
                error!(%fault, dropped, "worker stopped on fault");
            }
        }

        self.registry.active = Some(self.active);
        WorkerExit {
            registry: self.registry,
            outcome,
        }
    }

    /// Apply batches until exit is requested and nothing is left to apply.
    fn process(&mut self) -> Result<(), EngineError> {
        loop {
            let Batch { mut events, exit } = self.shared.queue.drain_all();
            if events.is_empty() && exit {
                return Ok(());
            }

            while let Some(event) = events.pop_front() {
                let applied = self.apply(&event);
                let proceed = self.shared.queue.complete_one();
                applied?;
                if !proceed {
                    if !events.is_empty() {
                        warn!(dropped = events.len(), "discarding events on shutdown");
                    }
                    break;
                }
            }
        }
    }

    /// Apply one event: exit the old state, resolve the target, enter the
    /// new state. Events without a rule leave everything untouched.
    fn apply(&mut self, event: &EventId) -> Result<(), EngineError> {
        let from = self.registry.ids[self.active].clone();
        let Some(rule) = self.registry.table.lookup(from.as_str(), event.as_str()) else {
            trace!(state = %from, %event, "no rule for event, ignored");
            return Ok(());
        };

        self.registry.states[self.active]
            .on_exit(&self.handle)
            .map_err(|source| EngineError::Callback {
                state: from.clone(),
                phase: CallbackPhase::Exit,
                source,
            })?;

        let ctx = TransitionContext { from: &from, event };
        let to = rule.target().resolve(&ctx);
        let Some(next) = self.registry.position(to.as_str()) else {
            return Err(EngineError::ResolvedStateMissing {
                from,
                event: event.clone(),
                resolved: to,
            });
        };

        self.active = next;
        *self.shared.active.write() = Some(to.clone());
        let sequence = self
            .shared
            .history
            .lock()
            .record(from.clone(), event.clone(), to.clone());
        debug!(%from, %event, %to, sequence, "transition applied");

        self.registry.states[next]
            .on_entry(&self.handle)
            .map_err(|source| EngineError::Callback {
                state: to,
                phase: CallbackPhase::Entry,
                source,
            })
    }
}
