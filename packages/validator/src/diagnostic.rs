use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity level of a validation issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

/// A single finding about a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    /// Error issues block compilation, warnings do not
    pub severity: Severity,

    /// Stable dotted code, e.g. `node.child_unknown`
    pub code: String,

    /// Human-readable message
    pub message: String,

    /// Location inside the document, e.g. `nodes[3].children[1]`
    pub path: String,
}

impl Issue {
    pub fn error(code: impl Into<String>, message: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code: code.into(),
            message: message.into(),
            path: path.into(),
        }
    }

    pub fn warning(code: impl Into<String>, message: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code: code.into(),
            message: message.into(),
            path: path.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} ({})", self.code, self.message, self.path)
    }
}
