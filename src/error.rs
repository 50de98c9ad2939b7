//! Error types for machine configuration and the transition engine.
//!
//! Configuration mistakes (`ConfigError`) are caller bugs reported at the
//! call site of `add_state`/`add_rule`/`start`. Everything the engine can
//! report at runtime is an `EngineError`.

use crate::builder::BuildErrors;
use crate::core::{EventId, StateId};
use std::fmt;
use thiserror::Error;

/// Errors in the static definition of a machine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("State '{0}' is already registered")]
    DuplicateState(StateId),

    #[error("State '{0}' is not registered")]
    UnknownState(StateId),

    #[error("A rule from '{from}' on event '{event}' already exists")]
    DuplicateRule { from: StateId, event: EventId },
}

/// Which lifecycle callback of a state failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackPhase {
    Entry,
    Exit,
}

impl fmt::Display for CallbackPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Entry => f.write_str("on_entry"),
            Self::Exit => f.write_str("on_exit"),
        }
    }
}

/// Errors reported by a running or starting machine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    InvalidDefinition(#[from] BuildErrors),

    #[error("Machine is already running")]
    AlreadyRunning,

    #[error("Machine has not been started")]
    NotInitialized,

    #[error("Machine is not accepting events")]
    NotRunning,

    #[error("Resolver for event '{event}' in state '{from}' returned unknown state '{resolved}'")]
    ResolvedStateMissing {
        from: StateId,
        event: EventId,
        resolved: StateId,
    },

    #[error("{phase} callback of state '{state}' failed")]
    Callback {
        state: StateId,
        phase: CallbackPhase,
        #[source]
        source: CallbackError,
    },

    #[error("Failed to spawn worker thread")]
    Spawn(#[source] std::io::Error),

    #[error("Worker thread panicked")]
    WorkerPanicked,

    #[error("Machine lost its states after a worker panic")]
    Poisoned,
}

/// Failure returned from a state's `on_entry` or `on_exit`.
///
/// A failing callback stops the worker; the error is handed back by the next
/// call to `Machine::stop`.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct CallbackError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl CallbackError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Wrap an underlying error with context.
    pub fn with_source<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<String> for CallbackError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for CallbackError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<EngineError> for CallbackError {
    fn from(error: EngineError) -> Self {
        Self::with_source("machine operation failed", error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn config_errors_name_the_offending_ids() {
        let err = ConfigError::DuplicateRule {
            from: "idle".into(),
            event: "on".into(),
        };
        assert_eq!(
            err.to_string(),
            "A rule from 'idle' on event 'on' already exists"
        );

        let err = ConfigError::UnknownState("nowhere".into());
        assert_eq!(err.to_string(), "State 'nowhere' is not registered");
    }

    #[test]
    fn config_error_converts_transparently() {
        let err: EngineError = ConfigError::DuplicateState("idle".into()).into();
        assert!(matches!(
            err,
            EngineError::Config(ConfigError::DuplicateState(_))
        ));
        assert_eq!(err.to_string(), "State 'idle' is already registered");
    }

    #[test]
    fn callback_failure_keeps_source_chain() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "motor jammed");
        let err = EngineError::Callback {
            state: "power_up".into(),
            phase: CallbackPhase::Entry,
            source: CallbackError::with_source("spin up failed", io),
        };

        assert_eq!(err.to_string(), "on_entry callback of state 'power_up' failed");
        let source = err.source().expect("callback error is the source");
        assert_eq!(source.to_string(), "spin up failed");
        assert_eq!(
            source.source().map(|e| e.to_string()),
            Some("motor jammed".to_string())
        );
    }

    #[test]
    fn callback_error_from_strings() {
        let err: CallbackError = "boom".into();
        assert_eq!(err.message(), "boom");
        assert!(err.source().is_none());

        let err: CallbackError = String::from("bang").into();
        assert_eq!(err.to_string(), "bang");
    }

    #[test]
    fn engine_error_wraps_into_callback_error() {
        let err: CallbackError = EngineError::NotRunning.into();
        assert_eq!(
            err.source().map(|e| e.to_string()),
            Some("Machine is not accepting events".to_string())
        );
    }
}
