//! The ordered list of checks a run can choose from.

use std::sync::Arc;

use tracing::debug;

use super::Check;
use crate::error::SetupError;

/// Checks in the order they were registered. Built once at start up and
/// never modified, so an unfiltered run always dispatches the same set.
#[derive(Clone, Default)]
pub struct Registry {
    checks: Vec<Arc<dyn Check>>,
}

impl Registry {
    pub fn new(checks: Vec<Arc<dyn Check>>) -> Self {
        Self { checks }
    }

    pub fn all(&self) -> &[Arc<dyn Check>] {
        &self.checks
    }

    pub fn ids(&self) -> Vec<&'static str> {
        self.checks.iter().map(|check| check.id()).collect()
    }

    pub fn get(&self, id: &str) -> Option<&Arc<dyn Check>> {
        self.checks.iter().find(|check| check.id() == id)
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    /// Resolves the checks to run.
    ///
    /// An empty `ids` selects every registered check. Otherwise the checks are
    /// returned in the order requested, duplicates dropped. An unknown id or
    /// an empty outcome fails the run before anything is dispatched.
    pub fn select<S: AsRef<str>>(&self, ids: &[S]) -> Result<Vec<Arc<dyn Check>>, SetupError> {
        if ids.is_empty() {
            if self.checks.is_empty() {
                return Err(SetupError::NoChecks);
            }
            return Ok(self.checks.clone());
        }

        let mut selected: Vec<Arc<dyn Check>> = Vec::with_capacity(ids.len());
        for id in ids {
            let id = id.as_ref().trim();
            if id.is_empty() {
                continue;
            }

            let check = self.get(id).ok_or_else(|| SetupError::UnknownCheck {
                id: id.to_string(),
                available: self.ids().join(", "),
            })?;

            if selected.iter().any(|c| c.id() == check.id()) {
                debug!("check '{id}' selected twice, running it once");
                continue;
            }
            selected.push(Arc::clone(check));
        }

        if selected.is_empty() {
            return Err(SetupError::NoChecks);
        }
        Ok(selected)
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
