//! Accumulated errors from validating a machine definition.

use crate::error::ConfigError;
use thiserror::Error;

/// Every configuration error found while validating a definition.
///
/// Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid machine definition ({} error(s)){}", .0.len(), render(.0))]
pub struct BuildErrors(Vec<ConfigError>);

impl BuildErrors {
    pub(crate) fn new(errors: Vec<ConfigError>) -> Self {
        debug_assert!(!errors.is_empty());
        BuildErrors(errors)
    }

    pub fn errors(&self) -> &[ConfigError] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConfigError> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_vec(self) -> Vec<ConfigError> {
        self.0
    }
}

fn render(errors: &[ConfigError]) -> String {
    errors.iter().map(|error| format!("; {error}")).collect()
}

impl From<ConfigError> for BuildErrors {
    fn from(error: ConfigError) -> Self {
        BuildErrors(vec![error])
    }
}
