//! Schema and graph validation for dui-lang documents.
//!
//! Validation never fails fast: every rule runs and contributes [`Issue`]s,
//! which are split into errors and warnings in a [`ValidationResult`].
//! A document is valid iff it produced no error-severity issue.

mod diagnostic;
mod graph;
mod limits;
mod rules;
mod schema;
mod validator;

pub use diagnostic::{Issue, Severity};
pub use graph::validate_graph;
pub use limits::ValidationLimits;
pub use rules::{
    ActionRule, BindingRule, DocumentRule, HandlerReferenceRule, NodeReferenceRule, NodeRule,
    RuleRegistry, SchemaRule, ThemeTokenRule,
};
pub use schema::{validate_schema, validate_schema_with};
pub use validator::{
    validate_document, ValidateOptions, ValidationResult, ValidationStats, Validator,
};
