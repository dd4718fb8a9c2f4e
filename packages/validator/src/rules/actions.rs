use crate::diagnostic::Issue;
use crate::limits::ValidationLimits;
use crate::rules::SchemaRule;
use dui_common::is_known_action_type;
use dui_parser::Document;
use std::collections::HashSet;

/// Action ids are unique and action types come from the allowlist
pub struct ActionRule;

impl SchemaRule for ActionRule {
    fn name(&self) -> &'static str {
        "action"
    }

    fn description(&self) -> &'static str {
        "Action ids must be unique and action types must be allowlisted"
    }

    fn check(&self, document: &Document, _limits: &ValidationLimits) -> Vec<Issue> {
        let mut issues = Vec::new();
        let mut seen = HashSet::new();

        for (index, action) in document.actions.iter().enumerate() {
            if !seen.insert(action.id.as_str()) {
                issues.push(Issue::error(
                    "action.id_duplicate",
                    format!("Action id '{}' is duplicated", action.id),
                    format!("actions[{}].id", index),
                ));
            }
            if !is_known_action_type(&action.action_type) {
                issues.push(Issue::error(
                    "action.type_unknown",
                    format!("Action type '{}' is not in allowlist", action.action_type),
                    format!("actions[{}].type", index),
                ));
            }
        }

        issues
    }
}
