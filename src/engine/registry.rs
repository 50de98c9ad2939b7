use crate::core::{EventId, State, StateId, Target};
use crate::error::ConfigError;
use crate::table::TransitionTable;
use std::collections::HashMap;

/// Exclusive owner of a machine's states and rules.
///
/// The registry lives in the `Machine` while stopped and moves into the
/// worker for the duration of a run. The active state is an index into
/// `states`, never a second owner.
#[derive(Default)]
pub(crate) struct Registry {
    pub(crate) states: Vec<Box<dyn State>>,
    pub(crate) ids: Vec<StateId>,
    index: HashMap<StateId, usize>,
    pub(crate) table: TransitionTable,
    pub(crate) active: Option<usize>,
}

impl Registry {
    pub(crate) fn add_state(&mut self, state: Box<dyn State>) -> Result<StateId, ConfigError> {
        let id = StateId::from(state.id());
        if self.index.contains_key(&id) {
            return Err(ConfigError::DuplicateState(id));
        }
        self.index.insert(id.clone(), self.states.len());
        self.ids.push(id.clone());
        self.states.push(state);
        Ok(id)
    }

    pub(crate) fn add_rule(
        &mut self,
        from: StateId,
        event: EventId,
        target: Target,
    ) -> Result<(), ConfigError> {
        let index = &self.index;
        self.table
            .add_rule(from, event, target, |id| index.contains_key(id))
    }

    pub(crate) fn position(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }
}
