//! Waypoint: an event-driven finite state machine engine
//!
//! A program models itself as a set of named states and a table of
//! event-triggered transitions. Events may be raised from any thread; a
//! single worker thread per machine applies them one at a time, in order,
//! running each state's exit and entry callbacks.
//!
//! # Core Concepts
//!
//! - **State**: a named unit of behavior with `on_entry`/`on_exit` callbacks
//! - **Rule**: `(state, event) -> target`, where the target is a fixed state
//!   or computed when the rule fires
//! - **Machine**: owns states and rules, queues events and runs the worker
//! - **Handle**: cloneable access for raising events from other threads and
//!   from inside callbacks
//!
//! # Example
//!
//! ```rust
//! use waypoint::{FnState, Machine};
//!
//! let mut motor = Machine::new("motor");
//! for id in ["idle", "power_up", "speed_control", "power_down"] {
//!     motor.add_state(FnState::new(id)).unwrap();
//! }
//! motor.add_rule("idle", "on", "power_up").unwrap();
//! motor.add_rule("power_up", "maintain_speed", "speed_control").unwrap();
//! motor.add_rule("speed_control", "off", "power_down").unwrap();
//! motor.add_rule("power_down", "has_shutdown", "idle").unwrap();
//!
//! motor.start("idle").unwrap();
//! motor.raise("on").unwrap();
//! motor.raise("maintain_speed").unwrap();
//!
//! // Stopping drains accepted events before the worker exits.
//! motor.stop().unwrap();
//! assert_eq!(motor.active_state().unwrap(), "speed_control");
//! ```

pub mod builder;
pub mod config;
pub mod core;
pub mod engine;
pub mod error;
mod queue;
pub mod table;

// Re-export commonly used types
pub use builder::{BuildErrors, MachineBuilder};
pub use config::{MachineConfig, ShutdownPolicy};
pub use crate::core::{
    EventId, FnState, Resolver, State, StateId, Target, TransitionContext, TransitionHistory,
    TransitionRecord,
};
pub use engine::{Machine, MachineHandle, MachineId};
pub use error::{CallbackError, CallbackPhase, ConfigError, EngineError};
pub use table::{Rule, TransitionTable};
