//! The `State` trait implemented by every state of a machine.
//!
//! A state is a named unit of behavior with two lifecycle callbacks. The
//! machine owns its states; callbacks receive a [`MachineHandle`] so a state
//! can raise follow-up events for the machine it belongs to.

use crate::core::StateId;
use crate::engine::MachineHandle;
use crate::error::CallbackError;

/// A single state of a machine.
///
/// # Blocking
///
/// Callbacks run synchronously on the machine's worker thread. While a
/// callback runs, no other queued event is applied, and there is no timeout
/// or preemption. A state that needs long-running work must hand it off
/// (to a thread, a task, a timer) and report completion by raising an event
/// through the handle rather than blocking inside `on_entry`.
///
/// # Raising events
///
/// Raising from `on_entry` is the usual way to drive self-triggered
/// transitions: the new state is already installed, so the follow-up event
/// is looked up against it. Raising from `on_exit` is legal, but the event
/// is queued before the next state is installed and is still applied after
/// the current transition finishes.
///
/// Once `stop` has been requested, raises from callbacks return `Ok` and the
/// event is dropped with a warning, so the `raise(..)?` idiom never turns a
/// shutdown into a fault.
///
/// # Example
///
/// ```rust
/// use waypoint::{CallbackError, MachineHandle, State};
///
/// struct PowerUp;
///
/// impl State for PowerUp {
///     fn id(&self) -> &str {
///         "power_up"
///     }
///
///     fn on_entry(&mut self, machine: &MachineHandle) -> Result<(), CallbackError> {
///         machine.raise("maintain_speed")?;
///         Ok(())
///     }
/// }
/// ```
pub trait State: Send + 'static {
    /// Unique id of this state within its machine.
    fn id(&self) -> &str;

    /// Called when the machine enters this state.
    fn on_entry(&mut self, machine: &MachineHandle) -> Result<(), CallbackError>;

    /// Called when the machine leaves this state.
    ///
    /// Default implementation does nothing.
    fn on_exit(&mut self, machine: &MachineHandle) -> Result<(), CallbackError> {
        let _ = machine;
        Ok(())
    }
}

type Callback = Box<dyn FnMut(&MachineHandle) -> Result<(), CallbackError> + Send>;

/// A state assembled from closures.
///
/// Handy for small machines and tests where a dedicated type per state is
/// more ceremony than it is worth.
///
/// ```rust
/// use waypoint::FnState;
///
/// let idle = FnState::new("idle")
///     .with_entry(|_| {
///         println!("[idle::on_entry]");
///         Ok(())
///     })
///     .with_exit(|_| {
///         println!("[idle::on_exit]");
///         Ok(())
///     });
/// ```
pub struct FnState {
    id: StateId,
    entry: Option<Callback>,
    exit: Option<Callback>,
}

impl FnState {
    pub fn new(id: impl Into<StateId>) -> Self {
        Self {
            id: id.into(),
            entry: None,
            exit: None,
        }
    }

    pub fn with_entry<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&MachineHandle) -> Result<(), CallbackError> + Send + 'static,
    {
        self.entry = Some(Box::new(callback));
        self
    }

    pub fn with_exit<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&MachineHandle) -> Result<(), CallbackError> + Send + 'static,
    {
        self.exit = Some(Box::new(callback));
        self
    }
}

impl State for FnState {
    fn id(&self) -> &str {
        self.id.as_str()
    }

    fn on_entry(&mut self, machine: &MachineHandle) -> Result<(), CallbackError> {
        match self.entry.as_mut() {
            Some(callback) => callback(machine),
            None => Ok(()),
        }
    }

    fn on_exit(&mut self, machine: &MachineHandle) -> Result<(), CallbackError> {
        match self.exit.as_mut() {
            Some(callback) => callback(machine),
            None => Ok(()),
        }
    }
}

impl std::fmt::Debug for FnState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnState")
            .field("id", &self.id)
            .field("entry", &self.entry.is_some())
            .field("exit", &self.exit.is_some())
            .finish()
    }
}
