//! Machine configuration.

use serde::{Deserialize, Serialize};

/// What `stop` does with events that were accepted but not yet applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShutdownPolicy {
    /// Apply every accepted event, then exit.
    #[default]
    Drain,

    /// Finish the transition in progress and drop the rest.
    Discard,
}

/// Settings for a single machine.
///
/// Deserializable with every field optional:
///
/// ```rust
/// use waypoint::{MachineConfig, ShutdownPolicy};
///
/// let config: MachineConfig =
///     serde_json::from_str(r#"{ "name": "motor", "shutdown": "discard" }"#).unwrap();
/// assert_eq!(config.name, "motor");
/// assert_eq!(config.shutdown, ShutdownPolicy::Discard);
/// assert_eq!(config.history_capacity, 64);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    /// Used in log output and the default worker thread name
    pub name: String,

    pub shutdown: ShutdownPolicy,

    /// Number of transition records retained; 0 disables history
    pub history_capacity: usize,

    /// Worker thread name; defaults to `fsm-<name>`
    pub thread_name: Option<String>,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            name: "fsm".to_string(),
            shutdown: ShutdownPolicy::Drain,
            history_capacity: 64,
            thread_name: None,
        }
    }
}

impl MachineConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn shutdown(mut self, policy: ShutdownPolicy) -> Self {
        self.shutdown = policy;
        self
    }

    pub fn history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity;
        self
    }

    pub fn thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = Some(name.into());
        self
    }

    pub(crate) fn worker_thread_name(&self) -> String {
        self.thread_name
            .clone()
            .unwrap_or_else(|| format!("fsm-{}", self.name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_drain_on_shutdown() {
        let config = MachineConfig::default();
        assert_eq!(config.name, "fsm");
        assert_eq!(config.shutdown, ShutdownPolicy::Drain);
        assert_eq!(config.history_capacity, 64);
        assert_eq!(config.worker_thread_name(), "fsm-fsm");
    }

    #[test]
    fn setters_override_defaults() {
        let config = MachineConfig::new("motor")
            .shutdown(ShutdownPolicy::Discard)
            .history_capacity(0)
            .thread_name("motor-worker");

        assert_eq!(config.name, "motor");
        assert_eq!(config.shutdown, ShutdownPolicy::Discard);
        assert_eq!(config.history_capacity, 0);
        assert_eq!(config.worker_thread_name(), "motor-worker");
    }

    #[test]
    fn empty_document_yields_defaults() {
        let config: MachineConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, MachineConfig::default());
    }

    #[test]
    fn policy_serializes_in_snake_case() {
        let json = serde_json::to_string(&ShutdownPolicy::Discard).unwrap();
        assert_eq!(json, "\"discard\"");
    }
}
