use serde::{Deserialize, Serialize};

use crate::types::Action;

/// aggregate result of a run, real or dry
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeReport {
    pub changed: bool,
    pub messages: Vec<String>,
}

impl ChangeReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// record an action that was (or would be) performed
    pub fn record(&mut self, action: &Action) {
        self.changed |= action.is_change();
        self.messages.push(action.description());
    }

    /// record a change that is not part of a plan
    pub fn push_change(&mut self, message: impl Into<String>) {
        self.changed = true;
        self.messages.push(message.into());
    }

    /// report for a list of actions, without performing any of them
    pub fn from_actions(actions: &[Action]) -> Self {
        let mut report = Self::new();
        for action in actions {
            report.record(action);
        }
        report
    }
}
