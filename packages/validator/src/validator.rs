use crate::diagnostic::Issue;
use crate::graph::validate_graph;
use crate::limits::ValidationLimits;
use crate::rules::RuleRegistry;
use crate::schema::validate_schema_with;
use dui_parser::Document;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ValidationStats {
    pub node_count: usize,
    pub action_count: usize,
    pub binding_count: usize,
    pub error_count: usize,
    pub warning_count: usize,
}

/// Outcome of validating one document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// True iff there are no error-severity issues
    pub valid: bool,
    pub errors: Vec<Issue>,
    pub warnings: Vec<Issue>,
    pub stats: ValidationStats,
}

impl ValidationResult {
    /// Errors followed by warnings
    pub fn issues(&self) -> impl Iterator<Item = &Issue> {
        self.errors.iter().chain(&self.warnings)
    }
}

/// Options for configuring validation
#[derive(Debug, Default)]
pub struct ValidateOptions {
    pub limits: ValidationLimits,
    /// Custom rule registry (uses default if None)
    pub registry: Option<RuleRegistry>,
}

/// Schema and graph validation with a fixed rule set and limits
#[derive(Debug, Default)]
pub struct Validator {
    registry: RuleRegistry,
    limits: ValidationLimits,
}

impl Validator {
    pub fn new(options: ValidateOptions) -> Self {
        Self {
            registry: options.registry.unwrap_or_default(),
            limits: options.limits,
        }
    }

    pub fn limits(&self) -> &ValidationLimits {
        &self.limits
    }

    pub fn validate(&self, document: &Document) -> ValidationResult {
        let mut issues = validate_schema_with(document, &self.limits, &self.registry);
        issues.extend(validate_graph(document, &self.limits));

        let (errors, warnings): (Vec<Issue>, Vec<Issue>) =
            issues.into_iter().partition(Issue::is_error);

        let stats = ValidationStats {
            node_count: document.nodes.len(),
            action_count: document.actions.len(),
            binding_count: document.bindings.len(),
            error_count: errors.len(),
            warning_count: warnings.len(),
        };

        debug!(
            surface = %document.surface.id,
            errors = stats.error_count,
            warnings = stats.warning_count,
            "validated document"
        );

        ValidationResult {
            valid: errors.is_empty(),
            errors,
            warnings,
            stats,
        }
    }
}

/// Validate a document with the built-in rules.
pub fn validate_document(document: &Document, limits: &ValidationLimits) -> ValidationResult {
    Validator::new(ValidateOptions {
        limits: *limits,
        registry: None,
    })
    .validate(document)
}
