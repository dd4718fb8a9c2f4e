use crate::diagnostic::Issue;
use crate::limits::ValidationLimits;
use crate::rules::SchemaRule;
use dui_common::CAPABILITY_SOURCE_PREFIX;
use dui_parser::Document;
use std::collections::HashSet;

/// Binding ids are unique and every source reads from a capability
pub struct BindingRule;

impl SchemaRule for BindingRule {
    fn name(&self) -> &'static str {
        "binding"
    }

    fn description(&self) -> &'static str {
        "Binding ids must be unique and sources must start with 'capability:'"
    }

    fn check(&self, document: &Document, _limits: &ValidationLimits) -> Vec<Issue> {
        let mut issues = Vec::new();
        let mut seen = HashSet::new();

        for (index, binding) in document.bindings.iter().enumerate() {
            if !seen.insert(binding.id.as_str()) {
                issues.push(Issue::error(
                    "binding.id_duplicate",
                    format!("Binding id '{}' is duplicated", binding.id),
                    format!("bindings[{}].id", index),
                ));
            }
            if !binding.source.starts_with(CAPABILITY_SOURCE_PREFIX) {
                issues.push(Issue::error(
                    "binding.source_invalid",
                    format!("Binding source must start with '{}'", CAPABILITY_SOURCE_PREFIX),
                    format!("bindings[{}].source", index),
                ));
            }
        }

        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dui_parser::Binding;

    fn binding(id: &str, source: &str) -> Binding {
        Binding {
            id: id.into(),
            source: source.into(),
            select: "$".into(),
            args: Default::default(),
            cache: Default::default(),
        }
    }

    #[test]
    fn test_binding_source_prefix() {
        let mut doc = Document::new("s");
        doc.bindings.push(binding("progress", "capability:math.progress_overview"));
        doc.bindings.push(binding("remote", "http://example.com/data"));
        doc.bindings.push(binding("progress", "capability:math.learning_path"));

        let issues = BindingRule.check(&doc, &ValidationLimits::default());
        let codes: Vec<_> = issues.iter().map(|issue| issue.code.as_str()).collect();
        assert_eq!(codes, vec!["binding.source_invalid", "binding.id_duplicate"]);
        assert_eq!(issues[0].message, "Binding source must start with 'capability:'");
        assert_eq!(issues[1].path, "bindings[2].id");
    }
}
