//! Builder API for declaring a whole machine up front.
//!
//! The builder collects states and rules and validates the complete
//! definition with Stillwater's `Validation`, so every mistake is reported
//! in one pass instead of one at a time.
//!
//! # Example
//!
//! ```rust
//! use waypoint::{ConfigError, EngineError, FnState, MachineBuilder};
//!
//! let err = MachineBuilder::new("motor")
//!     .state(FnState::new("idle"))
//!     .state(FnState::new("power_up"))
//!     .rule("idle", "on", "power_up")
//!     .rule("idle", "on", "power_up")
//!     .rule("power_up", "off", "power_down")
//!     .build()
//!     .unwrap_err();
//!
//! let EngineError::InvalidDefinition(errors) = err else {
//!     panic!("expected an invalid definition");
//! };
//! assert_eq!(errors.len(), 2);
//! assert!(errors
//!     .iter()
//!     .any(|e| matches!(e, ConfigError::DuplicateRule { .. })));
//! assert!(errors
//!     .iter()
//!     .any(|e| matches!(e, ConfigError::UnknownState(_))));
//! ```

mod error;
mod machine;

pub use error::BuildErrors;
pub use machine::MachineBuilder;
