use crate::diagnostic::Issue;
use crate::limits::ValidationLimits;
use crate::rules::SchemaRule;
use dui_common::DSL_VERSION;
use dui_parser::Document;

/// Schema version and document-wide size limits
pub struct DocumentRule;

impl SchemaRule for DocumentRule {
    fn name(&self) -> &'static str {
        "document"
    }

    fn description(&self) -> &'static str {
        "Document must use the supported dsl_version and stay under node/binding limits"
    }

    fn check(&self, document: &Document, limits: &ValidationLimits) -> Vec<Issue> {
        let mut issues = Vec::new();

        if document.dsl_version != DSL_VERSION {
            issues.push(Issue::error(
                "dsl.version_unsupported",
                format!("Unsupported dsl_version '{}'", document.dsl_version),
                "dsl_version",
            ));
        }

        if document.nodes.len() > limits.max_nodes {
            issues.push(Issue::error(
                "dsl.too_many_nodes",
                format!(
                    "Document has {} nodes, maximum is {}",
                    document.nodes.len(),
                    limits.max_nodes
                ),
                "nodes",
            ));
        }

        if document.bindings.len() > limits.max_bindings {
            issues.push(Issue::error(
                "dsl.too_many_bindings",
                format!(
                    "Document has {} bindings, maximum is {}",
                    document.bindings.len(),
                    limits.max_bindings
                ),
                "bindings",
            ));
        }

        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dui_parser::{Binding, Node};

    #[test]
    fn test_version_mismatch() {
        let mut doc = Document::new("s");
        doc.dsl_version = "dui-lang/0.9".to_string();
        let issues = DocumentRule.check(&doc, &ValidationLimits::default());
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].code, "dsl.version_unsupported");
    }

    #[test]
    fn test_limits_are_configurable() {
        let mut doc = Document::new("s");
        doc.nodes = (0..3).map(|i| Node::new(format!("node_{}", i), "layout.page")).collect();
        doc.bindings.push(Binding {
            id: "b1".into(),
            source: "capability:x".into(),
            select: "$".into(),
            args: Default::default(),
            cache: Default::default(),
        });
        let limits = ValidationLimits {
            max_nodes: 2,
            max_bindings: 0,
            ..ValidationLimits::default()
        };
        let codes: Vec<_> = DocumentRule
            .check(&doc, &limits)
            .into_iter()
            .map(|issue| issue.code)
            .collect();
        assert_eq!(codes, vec!["dsl.too_many_nodes", "dsl.too_many_bindings"]);
    }
}
