//! The machine facade.

use super::registry::Registry;
use super::worker::{Worker, WorkerExit};
use super::{MachineHandle, MachineId, Shared};
use crate::config::MachineConfig;
use crate::core::{EventId, State, StateId, Target, TransitionContext, TransitionHistory};
use crate::error::{CallbackPhase, ConfigError, EngineError};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{error, info, warn};

/// A finite state machine driven by a background worker thread.
///
/// Configure states and rules, `start` at an initial state, then `raise`
/// events from anywhere. Events are applied one at a time, in the order
/// they were queued, on the machine's worker thread.
///
/// # Shutdown
///
/// `stop` (and dropping the machine) closes the queue to new events and
/// joins the worker. With the default `ShutdownPolicy::Drain` every event
/// accepted before `stop` is applied first; with `ShutdownPolicy::Discard`
/// only the transition in progress completes. Events that callbacks raise
/// after `stop` was requested are dropped with a warning instead of failing
/// the callback. There is no way to interrupt a callback that blocks: `stop`
/// waits for it.
///
/// # Faults
///
/// If a callback fails, or a computed target names an unknown state, the
/// worker stops, pending events are dropped and `is_running` turns false.
/// The fault is returned by the next `stop`; a `start` issued before that
/// `stop` discards it with a warning. For an unknown computed target
/// the old state's `on_exit` has already run and the old state stays active;
/// for a failing `on_entry` the new state is already active.
///
/// # Example
///
/// ```rust
/// use waypoint::{FnState, Machine};
///
/// let mut machine = Machine::new("door");
/// machine.add_state(FnState::new("closed")).unwrap();
/// machine.add_state(FnState::new("open")).unwrap();
/// machine.add_rule("closed", "push", "open").unwrap();
/// machine.add_rule("open", "pull", "closed").unwrap();
///
/// machine.start("closed").unwrap();
/// machine.raise("push").unwrap();
/// machine.stop().unwrap();
///
/// assert_eq!(machine.active_state().unwrap(), "open");
/// assert!(!machine.is_running());
/// ```
pub struct Machine {
    config: MachineConfig,
    shared: Arc<Shared>,
    registry: Option<Registry>,
    state_ids: Vec<StateId>,
    worker: Option<JoinHandle<WorkerExit>>,
    fault: Option<EngineError>,
}

impl Machine {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_config(MachineConfig::new(name))
    }

    pub fn with_config(config: MachineConfig) -> Self {
        let shared = Shared::new(config.name.clone(), config.history_capacity);
        Self {
            config,
            shared: Arc::new(shared),
            registry: Some(Registry::default()),
            state_ids: Vec::new(),
            worker: None,
            fault: None,
        }
    }

    pub fn id(&self) -> MachineId {
        self.shared.id
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    /// A cloneable handle for raising events and querying from other threads.
    pub fn handle(&self) -> MachineHandle {
        MachineHandle::new(Arc::clone(&self.shared))
    }

    /// Register a state. Ids must be unique.
    pub fn add_state<S: State>(&mut self, state: S) -> Result<(), EngineError> {
        self.add_boxed_state(Box::new(state))
    }

    pub fn add_boxed_state(&mut self, state: Box<dyn State>) -> Result<(), EngineError> {
        let id = self.registry_mut()?.add_state(state)?;
        self.state_ids.push(id);
        Ok(())
    }

    /// Register a rule sending the machine from `from` to `to` on `event`.
    ///
    /// `to` is a state id or a [`Target`]; see [`Machine::add_computed_rule`]
    /// for targets decided when the rule fires.
    pub fn add_rule(
        &mut self,
        from: impl Into<StateId>,
        event: impl Into<EventId>,
        to: impl Into<Target>,
    ) -> Result<(), EngineError> {
        self.registry_mut()?
            .add_rule(from.into(), event.into(), to.into())?;
        Ok(())
    }

    /// Register a rule whose destination is computed when it fires.
    pub fn add_computed_rule<F, T>(
        &mut self,
        from: impl Into<StateId>,
        event: impl Into<EventId>,
        resolve: F,
    ) -> Result<(), EngineError>
    where
        F: Fn(&TransitionContext<'_>) -> T + Send + Sync + 'static,
        T: Into<StateId>,
    {
        self.add_rule(from, event, Target::computed(resolve))
    }

    /// Enter `initial` and launch the worker.
    ///
    /// The initial state's `on_entry` runs on the calling thread before the
    /// worker exists; events it raises are applied by the worker. When a
    /// stopped machine is restarted, the state it stopped in is exited first.
    ///
    /// A fault left by the previous run that no `stop` has reported yet is
    /// logged and cleared.
    pub fn start(&mut self, initial: impl Into<StateId>) -> Result<(), EngineError> {
        let initial = initial.into();
        if self.is_running() {
            return Err(EngineError::AlreadyRunning);
        }
        self.reap();
        if let Some(fault) = self.fault.take() {
            warn!(machine = %self.config.name, %fault, "clearing fault from previous run");
        }

        let mut registry = self.registry.take().ok_or(EngineError::Poisoned)?;
        let index = match self.activate(&mut registry, &initial) {
            Ok(index) => index,
            Err(err) => {
                self.registry = Some(registry);
                return Err(err);
            }
        };

        self.shared.running.store(true, Ordering::Release);
        let worker = Worker::new(Arc::clone(&self.shared), registry, index);
        let spawned = thread::Builder::new()
            .name(self.config.worker_thread_name())
            .spawn(move || worker.run());

        match spawned {
            Ok(handle) => {
                self.worker = Some(handle);
                info!(
                    machine = %self.config.name,
                    id = %self.shared.id,
                    initial = %initial,
                    "machine started"
                );
                Ok(())
            }
            Err(err) => {
                self.shared.queue.close();
                self.shared.running.store(false, Ordering::Release);
                Err(EngineError::Spawn(err))
            }
        }
    }

    /// Install `initial` as the active state and run its `on_entry`.
    fn activate(&self, registry: &mut Registry, initial: &StateId) -> Result<usize, EngineError> {
        let index = registry
            .position(initial.as_str())
            .ok_or_else(|| ConfigError::UnknownState(initial.clone()))?;
        let handle = self.handle();

        if let Some(previous) = registry.active.take() {
            registry.states[previous]
                .on_exit(&handle)
                .map_err(|source| EngineError::Callback {
                    state: registry.ids[previous].clone(),
                    phase: CallbackPhase::Exit,
                    source,
                })?;
        }

        self.shared.queue.open();
        registry.active = Some(index);
        *self.shared.active.write() = Some(initial.clone());

        if let Err(source) = registry.states[index].on_entry(&handle) {
            self.shared.queue.close();
            return Err(EngineError::Callback {
                state: initial.clone(),
                phase: CallbackPhase::Entry,
                source,
            });
        }
        Ok(index)
    }

    /// Close the queue, let the worker finish according to the shutdown
    /// policy and join it.
    ///
    /// Returns the fault that stopped the worker, if any. Stopping a stopped
    /// machine does nothing.
    pub fn stop(&mut self) -> Result<(), EngineError> {
        if self.worker.is_some() {
            let dropped = self.shared.queue.request_exit(self.config.shutdown);
            if dropped > 0 {
                warn!(machine = %self.config.name, dropped, "discarding queued events on stop");
            }
            self.reap();
            info!(machine = %self.config.name, id = %self.shared.id, "machine stopped");
        }
        match self.fault.take() {
            Some(fault) => Err(fault),
            None => Ok(()),
        }
    }

    /// Join a finished or finishing worker and take the registry back.
    fn reap(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };
        match worker.join() {
            Ok(exit) => {
                self.registry = Some(exit.registry);
                if let Err(fault) = exit.outcome {
                    self.fault = Some(fault);
                }
            }
            Err(_) => {
                error!(machine = %self.config.name, "worker thread panicked");
                self.fault = Some(EngineError::WorkerPanicked);
            }
        }
        self.shared.running.store(false, Ordering::Release);
    }

    fn registry_mut(&mut self) -> Result<&mut Registry, EngineError> {
        if self.is_running() {
            return Err(EngineError::AlreadyRunning);
        }
        self.reap();
        self.registry.as_mut().ok_or(EngineError::Poisoned)
    }

    /// Queue an event; see [`MachineHandle::raise`].
    pub fn raise(&self, event: impl Into<EventId>) -> Result<(), EngineError> {
        self.handle().raise(event)
    }

    /// The active state. Fails with `NotInitialized` before the first start.
    pub fn active_state(&self) -> Result<StateId, EngineError> {
        self.handle().active_state()
    }

    /// Racy snapshot of whether events are queued or being applied.
    pub fn has_pending_events(&self) -> bool {
        self.shared.queue.has_pending()
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }

    /// Ids of the registered states, in registration order.
    pub fn state_ids(&self) -> &[StateId] {
        &self.state_ids
    }

    pub fn history(&self) -> TransitionHistory {
        self.shared.history.lock().clone()
    }
}

impl Drop for Machine {
    fn drop(&mut self) {
        if let Err(fault) = self.stop() {
            error!(machine = %self.config.name, %fault, "machine dropped after a fault");
        }
    }
}

impl std::fmt::Debug for Machine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Machine")
            .field("name", &self.config.name)
            .field("id", &self.shared.id)
            .field("states", &self.state_ids)
            .field("running", &self.is_running())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::FnState;
    use std::time::{Duration, Instant};

    fn settle(machine: &Machine) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while machine.has_pending_events() {
            assert!(Instant::now() < deadline, "events were not applied in time");
            thread::sleep(Duration::from_millis(1));
        }
    }

    fn two_state_machine() -> Machine {
        let mut machine = Machine::new("toggle");
        machine.add_state(FnState::new("off")).unwrap();
        machine.add_state(FnState::new("on")).unwrap();
        machine.add_rule("off", "flip", "on").unwrap();
        machine.add_rule("on", "flip", "off").unwrap();
        machine
    }

    #[test]
    fn new_machine_is_stopped_and_uninitialised() {
        let machine = two_state_machine();
        assert!(!machine.is_running());
        assert!(!machine.has_pending_events());
        assert!(matches!(
            machine.active_state(),
            Err(EngineError::NotInitialized)
        ));
        assert_eq!(machine.state_ids(), &["off", "on"]);
        assert_eq!(machine.name(), "toggle");
    }

    #[test]
    fn configuration_is_rejected_while_running() {
        let mut machine = two_state_machine();
        machine.start("off").unwrap();

        assert!(matches!(
            machine.add_state(FnState::new("late")),
            Err(EngineError::AlreadyRunning)
        ));
        assert!(matches!(
            machine.add_rule("on", "late", "off"),
            Err(EngineError::AlreadyRunning)
        ));
        machine.stop().unwrap();

        machine.add_state(FnState::new("late")).unwrap();
        machine.add_rule("on", "late", "late").unwrap();
    }

    #[test]
    fn unknown_initial_state_leaves_machine_stopped() {
        let mut machine = two_state_machine();
        let err = machine.start("ghost").unwrap_err();

        assert!(matches!(
            err,
            EngineError::Config(ConfigError::UnknownState(ref id)) if id == "ghost"
        ));
        assert!(!machine.is_running());
        machine.start("off").unwrap();
        assert!(machine.is_running());
    }

    #[test]
    fn flips_are_applied_in_order() {
        let mut machine = two_state_machine();
        machine.start("off").unwrap();
        for _ in 0..3 {
            machine.raise("flip").unwrap();
        }
        settle(&machine);

        assert_eq!(machine.active_state().unwrap(), "on");
        let history = machine.history();
        let path: Vec<&str> = history.get_path().into_iter().map(|id| id.as_str()).collect();
        assert_eq!(path, vec!["off", "on", "off", "on"]);
    }

    #[test]
    fn restart_exits_the_previous_state() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let exits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&exits);
        let mut machine = Machine::new("restart");
        machine
            .add_state(FnState::new("only").with_exit(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }))
            .unwrap();

        machine.start("only").unwrap();
        machine.stop().unwrap();
        assert_eq!(exits.load(Ordering::SeqCst), 0);

        machine.start("only").unwrap();
        assert_eq!(exits.load(Ordering::SeqCst), 1);
        assert!(machine.is_running());
    }

    #[test]
    fn debug_output_names_the_machine() {
        let machine = two_state_machine();
        let debug = format!("{:?}", machine);
        assert!(debug.contains("toggle"));
        assert!(debug.contains("running: false"));
    }
}
