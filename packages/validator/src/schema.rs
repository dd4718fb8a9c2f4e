use crate::diagnostic::Issue;
use crate::limits::ValidationLimits;
use crate::rules::RuleRegistry;
use dui_parser::Document;

/// Run every built-in schema rule. All rules run; nothing short-circuits.
pub fn validate_schema(document: &Document, limits: &ValidationLimits) -> Vec<Issue> {
    validate_schema_with(document, limits, &RuleRegistry::new())
}

/// Run the rules of a custom registry, in registration order
pub fn validate_schema_with(
    document: &Document,
    limits: &ValidationLimits,
    registry: &RuleRegistry,
) -> Vec<Issue> {
    registry
        .rules()
        .iter()
        .flat_map(|rule| rule.check(document, limits))
        .collect()
}
