//! The transition table: `(state, event) -> rule`.
//!
//! Rules are keyed by the state they leave and the event that fires them.
//! The table rejects duplicate keys and rules naming states the machine
//! does not know. Looking up a pair with no rule is not an error: a machine
//! routinely receives events that mean nothing in its current state.

use crate::core::{EventId, StateId, Target};
use crate::error::ConfigError;
use std::collections::HashMap;

/// A registered transition rule.
#[derive(Debug)]
pub struct Rule {
    from: StateId,
    event: EventId,
    target: Target,
}

impl Rule {
    pub fn from(&self) -> &StateId {
        &self.from
    }

    pub fn event(&self) -> &EventId {
        &self.event
    }

    pub fn target(&self) -> &Target {
        &self.target
    }
}

/// Rules indexed by source state, then event.
#[derive(Debug, Default)]
pub struct TransitionTable {
    rules: HashMap<StateId, HashMap<EventId, Rule>>,
    len: usize,
}

impl TransitionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a rule.
    ///
    /// `is_known` answers whether a state id is registered with the machine.
    /// The source state must be known; a fixed target must be known too,
    /// while a computed target is checked when it fires.
    ///
    /// # Example
    ///
    /// ```rust
    /// use waypoint::{ConfigError, TransitionTable};
    ///
    /// let states = ["idle", "power_up"];
    /// let known = |id: &str| states.contains(&id);
    ///
    /// let mut table = TransitionTable::new();
    /// table.add_rule("idle".into(), "on".into(), "power_up".into(), known).unwrap();
    ///
    /// let err = table
    ///     .add_rule("idle".into(), "on".into(), "idle".into(), known)
    ///     .unwrap_err();
    /// assert!(matches!(err, ConfigError::DuplicateRule { .. }));
    ///
    /// assert!(table.lookup("idle", "on").is_some());
    /// assert!(table.lookup("idle", "off").is_none());
    /// ```
    pub fn add_rule<F>(
        &mut self,
        from: StateId,
        event: EventId,
        target: Target,
        is_known: F,
    ) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> bool,
    {
        if !is_known(from.as_str()) {
            return Err(ConfigError::UnknownState(from));
        }
        if let Some(to) = target.fixed_id() {
            if !is_known(to.as_str()) {
                return Err(ConfigError::UnknownState(to.clone()));
            }
        }
        if self.lookup(from.as_str(), event.as_str()).is_some() {
            return Err(ConfigError::DuplicateRule { from, event });
        }

        let rule = Rule {
            from: from.clone(),
            event: event.clone(),
            target,
        };
        self.rules.entry(from).or_default().insert(event, rule);
        self.len += 1;
        Ok(())
    }

    /// The rule for `event` while in `state`, if any.
    pub fn lookup(&self, state: &str, event: &str) -> Option<&Rule> {
        self.rules.get(state)?.get(event)
    }

    /// Events that have a rule leaving `state`.
    pub fn events_from<'a>(&'a self, state: &str) -> impl Iterator<Item = &'a EventId> + 'a {
        self.rules
            .get(state)
            .into_iter()
            .flat_map(|by_event| by_event.keys())
    }

    pub fn rules(&self) -> impl Iterator<Item = &Rule> {
        self.rules.values().flat_map(|by_event| by_event.values())
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATES: [&str; 4] = ["idle", "power_up", "speed_control", "power_down"];

    fn known(id: &str) -> bool {
        STATES.contains(&id)
    }

    fn motor_table() -> TransitionTable {
        let mut table = TransitionTable::new();
        for (from, event, to) in [
            ("idle", "on", "power_up"),
            ("power_up", "maintain_speed", "speed_control"),
            ("speed_control", "off", "power_down"),
            ("power_up", "off", "power_down"),
            ("power_down", "on", "power_up"),
            ("power_down", "has_shutdown", "idle"),
        ] {
            table
                .add_rule(from.into(), event.into(), to.into(), known)
                .unwrap();
        }
        table
    }

    #[test]
    fn lookup_finds_exact_pair() {
        let table = motor_table();
        assert_eq!(table.len(), 6);

        let rule = table.lookup("power_up", "off").unwrap();
        assert_eq!(rule.from(), &StateId::from("power_up"));
        assert_eq!(rule.event(), &EventId::from("off"));
        assert_eq!(rule.target().fixed_id(), Some(&StateId::from("power_down")));
    }

    #[test]
    fn lookup_misses_are_none() {
        let table = motor_table();
        assert!(table.lookup("idle", "off").is_none());
        assert!(table.lookup("nowhere", "on").is_none());
    }

    #[test]
    fn unknown_source_state_is_rejected() {
        let mut table = TransitionTable::new();
        let err = table
            .add_rule("ghost".into(), "on".into(), "idle".into(), known)
            .unwrap_err();
        assert_eq!(err, ConfigError::UnknownState("ghost".into()));
        assert!(table.is_empty());
    }

    #[test]
    fn unknown_fixed_target_is_rejected() {
        let mut table = TransitionTable::new();
        let err = table
            .add_rule("idle".into(), "on".into(), "ghost".into(), known)
            .unwrap_err();
        assert_eq!(err, ConfigError::UnknownState("ghost".into()));
    }

    #[test]
    fn computed_target_is_not_checked_at_registration() {
        let mut table = TransitionTable::new();
        table
            .add_rule(
                "idle".into(),
                "on".into(),
                Target::computed(|_| "ghost"),
                known,
            )
            .unwrap();
        assert!(table.lookup("idle", "on").unwrap().target().is_computed());
    }

    #[test]
    fn duplicate_pair_is_rejected_and_first_rule_kept() {
        let mut table = motor_table();
        let err = table
            .add_rule("idle".into(), "on".into(), "power_down".into(), known)
            .unwrap_err();

        assert_eq!(
            err,
            ConfigError::DuplicateRule {
                from: "idle".into(),
                event: "on".into(),
            }
        );
        assert_eq!(table.len(), 6);
        let rule = table.lookup("idle", "on").unwrap();
        assert_eq!(rule.target().fixed_id(), Some(&StateId::from("power_up")));
    }

    #[test]
    fn events_from_lists_outgoing_events() {
        let table = motor_table();
        let mut events: Vec<&str> = table.events_from("power_up").map(|e| e.as_str()).collect();
        events.sort_unstable();
        assert_eq!(events, vec!["maintain_speed", "off"]);
        assert_eq!(table.events_from("nowhere").count(), 0);
        assert_eq!(table.rules().count(), 6);
    }
}
