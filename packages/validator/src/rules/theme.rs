use crate::diagnostic::Issue;
use crate::limits::ValidationLimits;
use crate::rules::SchemaRule;
use dui_common::is_theme_token;
use dui_parser::{Document, Value};

/// Theme token overrides use known keys and non-empty string values
pub struct ThemeTokenRule;

impl SchemaRule for ThemeTokenRule {
    fn name(&self) -> &'static str {
        "theme-token"
    }

    fn description(&self) -> &'static str {
        "Theme token keys must be allowlisted and values must be non-empty strings"
    }

    fn check(&self, document: &Document, _limits: &ValidationLimits) -> Vec<Issue> {
        let mut issues = Vec::new();

        for (key, value) in &document.theme.tokens {
            let path = format!("theme.tokens.{}", key);
            if !is_theme_token(key) {
                issues.push(Issue::error(
                    "theme.token_unknown",
                    format!("Theme token '{}' is not allowed", key),
                    path.clone(),
                ));
            }
            let non_empty = matches!(value, Value::String(s) if !s.trim().is_empty());
            if !non_empty {
                issues.push(Issue::error(
                    "theme.token_invalid",
                    format!("Theme token '{}' must be a non-empty string", key),
                    path,
                ));
            }
        }

        issues
    }
}
