//! Builder for constructing machines from a complete definition.

use crate::builder::error::BuildErrors;
use crate::config::MachineConfig;
use crate::core::{EventId, State, StateId, Target};
use crate::engine::Machine;
use crate::error::{ConfigError, EngineError};
use std::collections::HashSet;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

type Check = Validation<(), NonEmptyVec<ConfigError>>;

struct PendingRule {
    from: StateId,
    event: EventId,
    target: Target,
}

/// Collects states and rules, then validates the whole definition at once.
///
/// Unlike calling `Machine::add_state`/`add_rule` one by one, which stops at
/// the first mistake, `build` reports every problem in the definition.
pub struct MachineBuilder {
    config: MachineConfig,
    states: Vec<Box<dyn State>>,
    rules: Vec<PendingRule>,
}

impl MachineBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            config: MachineConfig::new(name),
            states: Vec::new(),
            rules: Vec::new(),
        }
    }

    /// Replace the configuration (including the name).
    pub fn config(mut self, config: MachineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn state<S: State>(mut self, state: S) -> Self {
        self.states.push(Box::new(state));
        self
    }

    pub fn states(mut self, states: impl IntoIterator<Item = Box<dyn State>>) -> Self {
        self.states.extend(states);
        self
    }

    pub fn rule(
        mut self,
        from: impl Into<StateId>,
        event: impl Into<EventId>,
        to: impl Into<Target>,
    ) -> Self {
        self.rules.push(PendingRule {
            from: from.into(),
            event: event.into(),
            target: to.into(),
        });
        self
    }

    /// Check the definition, accumulating all violations.
    pub fn validate(&self) -> Result<(), BuildErrors> {
        into_result(self.checks(None))
    }

    /// Validate and assemble a stopped machine. Validation failures come
    /// back as `EngineError::InvalidDefinition`.
    pub fn build(self) -> Result<Machine, EngineError> {
        self.validate()?;
        self.assemble()
    }

    /// Validate (including the initial state), assemble and start.
    pub fn start(self, initial: impl Into<StateId>) -> Result<Machine, EngineError> {
        let initial = initial.into();
        into_result(self.checks(Some(&initial)))?;
        let mut machine = self.assemble()?;
        machine.start(initial)?;
        Ok(machine)
    }

    fn checks(&self, initial: Option<&StateId>) -> Check {
        let mut checks: Vec<Check> = Vec::new();
        let mut known: HashSet<&str> = HashSet::new();

        for state in &self.states {
            let check = if known.insert(state.id()) {
                Validation::success(())
            } else {
                Validation::fail(ConfigError::DuplicateState(state.id().into()))
            };
            checks.push(check);
        }

        let mut seen: HashSet<(&str, &str)> = HashSet::new();
        for rule in &self.rules {
            checks.push(require_known(&known, &rule.from));
            if let Some(to) = rule.target.fixed_id() {
                checks.push(require_known(&known, to));
            }
            let check = if seen.insert((rule.from.as_str(), rule.event.as_str())) {
                Validation::success(())
            } else {
                Validation::fail(ConfigError::DuplicateRule {
                    from: rule.from.clone(),
                    event: rule.event.clone(),
                })
            };
            checks.push(check);
        }

        if let Some(initial) = initial {
            checks.push(require_known(&known, initial));
        }

        Validation::all_vec(checks).map(|_| ())
    }

    fn assemble(self) -> Result<Machine, EngineError> {
        let mut machine = Machine::with_config(self.config);
        for state in self.states {
            machine.add_boxed_state(state)?;
        }
        for rule in self.rules {
            machine.add_rule(rule.from, rule.event, rule.target)?;
        }
        Ok(machine)
    }
}

fn require_known(known: &HashSet<&str>, id: &StateId) -> Check {
    if known.contains(id.as_str()) {
        Validation::success(())
    } else {
        Validation::fail(ConfigError::UnknownState(id.clone()))
    }
}

fn into_result(check: Check) -> Result<(), BuildErrors> {
    match check {
        Validation::Success(()) => Ok(()),
        Validation::Failure(errors) => Err(BuildErrors::new(errors.iter().cloned().collect())),
    }
}
