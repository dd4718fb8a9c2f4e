mod actions;
mod bindings;
mod document;
mod nodes;
mod theme;

pub use actions::ActionRule;
pub use bindings::BindingRule;
pub use document::DocumentRule;
pub use nodes::{HandlerReferenceRule, NodeReferenceRule, NodeRule};
pub use theme::ThemeTokenRule;

use crate::diagnostic::Issue;
use crate::limits::ValidationLimits;
use dui_parser::Document;

/// A schema/allowlist check over a whole document
pub trait SchemaRule {
    /// Unique identifier for this rule
    fn name(&self) -> &'static str;

    /// Human-readable description
    fn description(&self) -> &'static str;

    fn check(&self, document: &Document, limits: &ValidationLimits) -> Vec<Issue>;
}

/// Ordered set of schema rules; issues come out in registration order
pub struct RuleRegistry {
    rules: Vec<Box<dyn SchemaRule + Send + Sync>>,
}

impl RuleRegistry {
    /// Create a new registry with all built-in rules
    pub fn new() -> Self {
        Self {
            rules: vec![
                Box::new(DocumentRule),
                Box::new(NodeRule),
                Box::new(NodeReferenceRule),
                Box::new(ActionRule),
                Box::new(HandlerReferenceRule),
                Box::new(BindingRule),
                Box::new(ThemeTokenRule),
            ],
        }
    }

    /// Get all registered rules
    pub fn rules(&self) -> &[Box<dyn SchemaRule + Send + Sync>] {
        &self.rules
    }

    /// Create an empty registry
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Add a custom rule to the registry
    pub fn add_rule(&mut self, rule: Box<dyn SchemaRule + Send + Sync>) {
        self.rules.push(rule);
    }
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleRegistry")
            .field("rules", &format!("{} rules", self.rules.len()))
            .finish()
    }
}
