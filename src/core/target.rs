//! Transition targets: where a rule sends the machine when it fires.
//!
//! A target is either a fixed state id, checked when the rule is added, or a
//! resolver closure evaluated at the moment the rule fires. Resolvers enable
//! conditional transitions; the id they return is checked when they fire.

use crate::core::{EventId, StateId};
use std::fmt;

/// What a resolver sees when its rule fires.
#[derive(Debug, Clone, Copy)]
pub struct TransitionContext<'a> {
    /// The state being left.
    pub from: &'a StateId,
    /// The event that matched the rule.
    pub event: &'a EventId,
}

/// Computes the next state id at firing time.
///
/// Resolvers run on the worker thread after the old state's `on_exit`, so
/// the same no-blocking contract as state callbacks applies.
///
/// # Example
///
/// ```rust
/// use std::sync::atomic::{AtomicBool, Ordering};
/// use std::sync::Arc;
/// use waypoint::{EventId, Resolver, StateId, TransitionContext};
///
/// let overheated = Arc::new(AtomicBool::new(false));
/// let flag = Arc::clone(&overheated);
/// let resolver = Resolver::new(move |_ctx: &TransitionContext<'_>| {
///     if flag.load(Ordering::SeqCst) { "cool_down" } else { "speed_control" }
/// });
///
/// let from = StateId::from("power_up");
/// let event = EventId::from("maintain_speed");
/// let ctx = TransitionContext { from: &from, event: &event };
/// assert_eq!(resolver.resolve(&ctx), "speed_control");
///
/// overheated.store(true, Ordering::SeqCst);
/// assert_eq!(resolver.resolve(&ctx), "cool_down");
/// ```
pub struct Resolver {
    resolve: Box<dyn Fn(&TransitionContext<'_>) -> StateId + Send + Sync>,
}

impl Resolver {
    pub fn new<F, T>(resolve: F) -> Self
    where
        F: Fn(&TransitionContext<'_>) -> T + Send + Sync + 'static,
        T: Into<StateId>,
    {
        Resolver {
            resolve: Box::new(move |ctx: &TransitionContext<'_>| -> StateId {
                resolve(ctx).into()
            }),
        }
    }

    pub fn resolve(&self, ctx: &TransitionContext<'_>) -> StateId {
        (self.resolve)(ctx)
    }
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Resolver(..)")
    }
}

/// Destination of a transition rule.
#[derive(Debug)]
pub enum Target {
    Fixed(StateId),
    Computed(Resolver),
}

impl Target {
    pub fn fixed(id: impl Into<StateId>) -> Self {
        Target::Fixed(id.into())
    }

    pub fn computed<F, T>(resolve: F) -> Self
    where
        F: Fn(&TransitionContext<'_>) -> T + Send + Sync + 'static,
        T: Into<StateId>,
    {
        Target::Computed(Resolver::new(resolve))
    }

    /// The fixed destination, if this target is not computed.
    pub fn fixed_id(&self) -> Option<&StateId> {
        match self {
            Target::Fixed(id) => Some(id),
            Target::Computed(_) => None,
        }
    }

    pub fn is_computed(&self) -> bool {
        matches!(self, Target::Computed(_))
    }

    /// Produce the destination id for a firing rule.
    pub fn resolve(&self, ctx: &TransitionContext<'_>) -> StateId {
        match self {
            Target::Fixed(id) => id.clone(),
            Target::Computed(resolver) => resolver.resolve(ctx),
        }
    }
}

impl From<StateId> for Target {
    fn from(id: StateId) -> Self {
        Target::Fixed(id)
    }
}

impl From<&str> for Target {
    fn from(id: &str) -> Self {
        Target::Fixed(id.into())
    }
}

impl From<String> for Target {
    fn from(id: String) -> Self {
        Target::Fixed(id.into())
    }
}

impl From<Resolver> for Target {
    fn from(resolver: Resolver) -> Self {
        Target::Computed(resolver)
    }
}
