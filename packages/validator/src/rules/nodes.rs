use crate::diagnostic::Issue;
use crate::limits::ValidationLimits;
use crate::rules::SchemaRule;
use dui_common::{is_known_node_type, Zone};
use dui_parser::{Document, Value};
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

static NODE_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z][a-z0-9_\-.]{2,63}$").expect("node id pattern compiles"));

pub fn is_valid_node_id(id: &str) -> bool {
    NODE_ID_RE.is_match(id)
}

/// Per-node field checks: id, type, fan-out ceilings, zone and capability props
pub struct NodeRule;

impl SchemaRule for NodeRule {
    fn name(&self) -> &'static str {
        "node"
    }

    fn description(&self) -> &'static str {
        "Node ids are unique and well-formed, types are allowlisted, zone and capability props are valid"
    }

    fn check(&self, document: &Document, limits: &ValidationLimits) -> Vec<Issue> {
        let mut issues = Vec::new();
        let mut seen = HashSet::new();

        for (index, node) in document.nodes.iter().enumerate() {
            let path = format!("nodes[{}]", index);

            if !seen.insert(node.id.as_str()) {
                issues.push(Issue::error(
                    "node.id_duplicate",
                    format!("Node id '{}' is duplicated", node.id),
                    format!("{}.id", path),
                ));
            }

            if !is_valid_node_id(&node.id) {
                issues.push(Issue::error(
                    "node.id_invalid",
                    format!("Node id '{}' does not match allowed pattern", node.id),
                    format!("{}.id", path),
                ));
            }

            if !is_known_node_type(&node.node_type) {
                issues.push(Issue::error(
                    "node.type_unknown",
                    format!("Node type '{}' is not in allowlist", node.node_type),
                    format!("{}.type", path),
                ));
            }

            if node.children.len() > limits.max_children_per_node {
                issues.push(Issue::error(
                    "node.too_many_children",
                    format!("Node '{}' has too many children", node.id),
                    format!("{}.children", path),
                ));
            }

            if node.on.len() > limits.max_actions_per_node {
                issues.push(Issue::error(
                    "node.too_many_actions",
                    format!("Node '{}' has too many event handlers", node.id),
                    format!("{}.on", path),
                ));
            }

            match node.props.get("zone") {
                None | Some(Value::Null) => {}
                Some(Value::String(zone)) if zone.parse::<Zone>().is_ok() => {}
                Some(other) => issues.push(Issue::error(
                    "node.zone_invalid",
                    format!("Zone '{}' is not allowed", other.to_plain_string()),
                    format!("{}.props.zone", path),
                )),
            }

            match node.props.get("capability_id") {
                None | Some(Value::Null) | Some(Value::String(_)) => {}
                Some(_) => issues.push(Issue::error(
                    "node.capability_invalid",
                    "capability_id must be a string when provided",
                    format!("{}.props.capability_id", path),
                )),
            }
        }

        issues
    }
}

/// Every child and slot entry must name a declared node
pub struct NodeReferenceRule;

impl SchemaRule for NodeReferenceRule {
    fn name(&self) -> &'static str {
        "node-reference"
    }

    fn description(&self) -> &'static str {
        "Children and slot entries must reference declared node ids"
    }

    fn check(&self, document: &Document, _limits: &ValidationLimits) -> Vec<Issue> {
        let declared: HashSet<&str> = document.nodes.iter().map(|n| n.id.as_str()).collect();
        let mut issues = Vec::new();

        for (index, node) in document.nodes.iter().enumerate() {
            for (child_index, child) in node.children.iter().enumerate() {
                if !declared.contains(child.as_str()) {
                    issues.push(Issue::error(
                        "node.child_unknown",
                        format!("Unknown child node id '{}'", child),
                        format!("nodes[{}].children[{}]", index, child_index),
                    ));
                }
            }
            for (slot, children) in &node.slots {
                for (child_index, child) in children.iter().enumerate() {
                    if !declared.contains(child.as_str()) {
                        issues.push(Issue::error(
                            "node.slot_child_unknown",
                            format!("Unknown child node id '{}' in slot '{}'", child, slot),
                            format!("nodes[{}].slots.{}[{}]", index, slot, child_index),
                        ));
                    }
                }
            }
        }

        issues
    }
}

/// Every event handler must name a declared action
pub struct HandlerReferenceRule;

impl SchemaRule for HandlerReferenceRule {
    fn name(&self) -> &'static str {
        "handler-reference"
    }

    fn description(&self) -> &'static str {
        "Node event handlers must reference declared action ids"
    }

    fn check(&self, document: &Document, _limits: &ValidationLimits) -> Vec<Issue> {
        let actions: HashSet<&str> = document.actions.iter().map(|a| a.id.as_str()).collect();
        let mut issues = Vec::new();

        for (index, node) in document.nodes.iter().enumerate() {
            for (event, action) in &node.on {
                if !actions.contains(action.as_str()) {
                    issues.push(Issue::error(
                        "node.action_ref_unknown",
                        format!("Unknown action reference '{}' for event '{}'", action, event),
                        format!("nodes[{}].on.{}", index, event),
                    ));
                }
            }
        }

        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dui_parser::{Action, Node};

    fn codes(issues: Vec<Issue>) -> Vec<String> {
        issues.into_iter().map(|issue| issue.code).collect()
    }

    #[test]
    fn test_node_id_pattern() {
        assert!(is_valid_node_id("main_header"));
        assert!(is_valid_node_id("a.b-c"));
        assert!(!is_valid_node_id("ab"));
        assert!(!is_valid_node_id("Main"));
        assert!(!is_valid_node_id("1abc"));
        assert!(!is_valid_node_id(&"a".repeat(65)));
    }

    #[test]
    fn test_node_field_checks() {
        let mut doc = Document::new("s");
        doc.nodes.push(Node::new("root_page", "layout.page"));
        doc.nodes.push(
            Node::new("root_page", "html.iframe")
                .with_prop("zone", "middle")
                .with_prop("capability_id", 3i64),
        );
        doc.nodes.push(Node::new("kpi_card", "data.kpi_card").with_prop("zone", Value::Null));

        assert_eq!(
            codes(NodeRule.check(&doc, &ValidationLimits::default())),
            vec![
                "node.id_duplicate",
                "node.type_unknown",
                "node.zone_invalid",
                "node.capability_invalid",
            ]
        );
    }

    #[test]
    fn test_fan_out_ceilings() {
        let mut node = Node::new("busy_node", "layout.page").with_children(["a", "b", "c"]);
        node.on.insert("click".into(), "x".into());
        node.on.insert("hover".into(), "y".into());
        let mut doc = Document::new("s");
        doc.nodes.push(node);

        let limits = ValidationLimits {
            max_children_per_node: 2,
            max_actions_per_node: 1,
            ..ValidationLimits::default()
        };
        assert_eq!(
            codes(NodeRule.check(&doc, &limits)),
            vec!["node.too_many_children", "node.too_many_actions"]
        );
    }

    #[test]
    fn test_unknown_references() {
        let mut page = Node::new("page", "layout.page").with_children(["missing_a"]);
        page.slots.insert("aside".into(), vec!["missing_b".into()]);
        page.on.insert("load".into(), "open_lesson".into());
        let mut doc = Document::new("s");
        doc.nodes.push(page);

        let issues = NodeReferenceRule.check(&doc, &ValidationLimits::default());
        assert_eq!(issues[0].path, "nodes[0].children[0]");
        assert_eq!(issues[1].code, "node.slot_child_unknown");
        assert_eq!(issues[1].path, "nodes[0].slots.aside[0]");

        let issues = HandlerReferenceRule.check(&doc, &ValidationLimits::default());
        assert_eq!(issues[0].path, "nodes[0].on.load");

        doc.actions.push(Action {
            id: "open_lesson".into(),
            action_type: "nav.open_route".into(),
            params: Default::default(),
        });
        assert!(HandlerReferenceRule.check(&doc, &ValidationLimits::default()).is_empty());
    }
}
