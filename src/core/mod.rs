//! Core machine vocabulary.
//!
//! This module holds the types every other part of the engine speaks in:
//! - State and event identifiers
//! - The `State` trait and a closure-backed implementation
//! - Transition targets, fixed or computed at firing time
//! - The bounded history of applied transitions

mod history;
mod id;
mod state;
mod target;

pub use history::{TransitionHistory, TransitionRecord};
pub use id::{EventId, StateId};
pub use state::{FnState, State};
pub use target::{Resolver, Target, TransitionContext};
