use dui_common::{
    MAX_ACTIONS_PER_NODE, MAX_BINDINGS_PER_DOCUMENT, MAX_CHILDREN_PER_NODE,
    MAX_DEPTH_PER_DOCUMENT, MAX_NODES_PER_DOCUMENT,
};
use serde::{Deserialize, Serialize};

/// Size ceilings enforced during validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ValidationLimits {
    pub max_nodes: usize,
    pub max_bindings: usize,
    pub max_children_per_node: usize,
    /// Event handlers per node
    pub max_actions_per_node: usize,
    /// Longest root-to-leaf chain, counted in nodes
    pub max_depth: usize,
}

impl Default for ValidationLimits {
    fn default() -> Self {
        Self {
            max_nodes: MAX_NODES_PER_DOCUMENT,
            max_bindings: MAX_BINDINGS_PER_DOCUMENT,
            max_children_per_node: MAX_CHILDREN_PER_NODE,
            max_actions_per_node: MAX_ACTIONS_PER_NODE,
            max_depth: MAX_DEPTH_PER_DOCUMENT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_limits_fill_defaults() {
        let limits: ValidationLimits = serde_json::from_str(r#"{"maxDepth": 4}"#).unwrap();
        assert_eq!(limits.max_depth, 4);
        assert_eq!(limits.max_nodes, 200);
        assert_eq!(limits.max_actions_per_node, 8);
    }
}
