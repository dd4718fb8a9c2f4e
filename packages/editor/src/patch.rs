//! # Patch Operations
//!
//! Typed, intent-level mutations of a manifest.
//!
//! ## Semantics
//!
//! - Operations apply strictly in order against a working copy; the input
//!   manifest is never touched.
//! - Profile and density changes reset the token map to the base set for the
//!   new pair, discarding custom overrides. Token and layout operations merge.
//! - Moving or removing a widget detaches it from every section.
//! - Adds never overwrite: an id collision makes the operation a no-op.
//! - `compose_section` upserts by section id.
//! - Operands that are present but empty (blank ids, empty maps) make the
//!   operation a no-op here; the policy gate rejects them beforehand.

use chrono::Utc;
use dui_common::{
    get_template, new_manifest_id, title_case, tokens_for, Density, Manifest, Section,
    ThemeProfile, ValueMap, Widget, Zone,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Kind tag of a [`PatchOperation`], as written in its `op` field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    SetThemeProfile,
    SetDensity,
    SetThemeTokens,
    SetLayoutConstraints,
    MoveWidget,
    RemoveWidget,
    AddWidget,
    AddWidgetFromTemplate,
    ComposeSection,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::SetThemeProfile => "set_theme_profile",
            OperationKind::SetDensity => "set_density",
            OperationKind::SetThemeTokens => "set_theme_tokens",
            OperationKind::SetLayoutConstraints => "set_layout_constraints",
            OperationKind::MoveWidget => "move_widget",
            OperationKind::RemoveWidget => "remove_widget",
            OperationKind::AddWidget => "add_widget",
            OperationKind::AddWidgetFromTemplate => "add_widget_from_template",
            OperationKind::ComposeSection => "compose_section",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One atomic mutation intent against a manifest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum PatchOperation {
    SetThemeProfile {
        profile: ThemeProfile,
    },

    SetDensity {
        density: Density,
    },

    /// Merge token overrides; values should be non-empty strings
    SetThemeTokens {
        tokens: ValueMap,
    },

    SetLayoutConstraints {
        layout_constraints: ValueMap,
    },

    MoveWidget {
        widget_id: String,
        zone: Zone,
    },

    RemoveWidget {
        widget_id: String,
    },

    /// Insert a fully specified widget
    AddWidget {
        widget: Widget,
    },

    /// Instantiate a catalog template under a new widget id
    AddWidgetFromTemplate {
        template_id: String,
        widget_id: String,
        zone: Zone,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        capability_id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        props: Option<ValueMap>,
    },

    /// Create or replace a section
    ComposeSection {
        section_id: String,
        zone: Zone,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        section_title: Option<String>,
        #[serde(default)]
        child_widget_ids: Vec<String>,
        #[serde(default)]
        section_layout: ValueMap,
    },
}

impl PatchOperation {
    pub fn kind(&self) -> OperationKind {
        match self {
            PatchOperation::SetThemeProfile { .. } => OperationKind::SetThemeProfile,
            PatchOperation::SetDensity { .. } => OperationKind::SetDensity,
            PatchOperation::SetThemeTokens { .. } => OperationKind::SetThemeTokens,
            PatchOperation::SetLayoutConstraints { .. } => OperationKind::SetLayoutConstraints,
            PatchOperation::MoveWidget { .. } => OperationKind::MoveWidget,
            PatchOperation::RemoveWidget { .. } => OperationKind::RemoveWidget,
            PatchOperation::AddWidget { .. } => OperationKind::AddWidget,
            PatchOperation::AddWidgetFromTemplate { .. } => OperationKind::AddWidgetFromTemplate,
            PatchOperation::ComposeSection { .. } => OperationKind::ComposeSection,
        }
    }

    /// Apply this operation to a working manifest in place
    fn apply_to(&self, manifest: &mut Manifest) {
        match self {
            PatchOperation::SetThemeProfile { profile } => {
                manifest.theme.profile = *profile;
                Self::reset_tokens(manifest);
            }

            PatchOperation::SetDensity { density } => {
                manifest.theme.density = *density;
                Self::reset_tokens(manifest);
            }

            PatchOperation::SetThemeTokens { tokens } => {
                for (key, value) in tokens {
                    manifest.theme.tokens.insert(key.clone(), value.to_plain_string());
                }
            }

            PatchOperation::SetLayoutConstraints { layout_constraints } => {
                for (key, value) in layout_constraints {
                    manifest.layout_constraints.insert(key.clone(), value.clone());
                }
            }

            PatchOperation::MoveWidget { widget_id, zone } => {
                if let Some(widget) = manifest.widget_mut(widget_id) {
                    widget.zone = *zone;
                    Self::detach_from_sections(manifest, widget_id);
                }
            }

            PatchOperation::RemoveWidget { widget_id } => {
                if widget_id.is_empty() {
                    return;
                }
                manifest.widgets.retain(|widget| &widget.id != widget_id);
                Self::detach_from_sections(manifest, widget_id);
            }

            PatchOperation::AddWidget { widget } => {
                if widget.id.is_empty() || manifest.widget(&widget.id).is_some() {
                    return;
                }
                manifest.widgets.push(widget.clone());
            }

            PatchOperation::AddWidgetFromTemplate {
                template_id,
                widget_id,
                zone,
                title,
                capability_id,
                props,
            } => {
                if widget_id.is_empty() || manifest.widget(widget_id).is_some() {
                    return;
                }
                let Some(template) = get_template(template_id) else {
                    return;
                };

                let mut widget_props = template.default_props();
                if let Some(props) = props {
                    for (key, value) in props {
                        widget_props.insert(key.clone(), value.clone());
                    }
                }

                manifest.widgets.push(Widget {
                    id: widget_id.clone(),
                    title: non_empty(title).unwrap_or(template.title).to_string(),
                    kind: template.kind,
                    zone: *zone,
                    capability_id: non_empty(capability_id)
                        .unwrap_or(template.capability_id)
                        .to_string(),
                    protected: false,
                    template_id: Some(template.template_id.to_string()),
                    props: widget_props,
                });
            }

            PatchOperation::ComposeSection {
                section_id,
                zone,
                section_title,
                child_widget_ids,
                section_layout,
            } => {
                if section_id.is_empty() {
                    return;
                }
                let section = Section {
                    id: section_id.clone(),
                    title: non_empty(section_title)
                        .map(String::from)
                        .unwrap_or_else(|| title_case(&section_id.replace('_', " "))),
                    zone: *zone,
                    child_widget_ids: child_widget_ids.clone(),
                    layout: section_layout.clone(),
                };
                match manifest.sections.iter_mut().find(|s| s.id == section.id) {
                    Some(existing) => *existing = section,
                    None => manifest.sections.push(section),
                }
            }
        }
    }

    fn reset_tokens(manifest: &mut Manifest) {
        manifest.theme.tokens = tokens_for(manifest.theme.profile, manifest.theme.density);
    }

    fn detach_from_sections(manifest: &mut Manifest, widget_id: &str) {
        for section in &mut manifest.sections {
            section.child_widget_ids.retain(|id| id != widget_id);
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

/// Apply `operations` in order and stamp the result as the next revision.
///
/// The returned manifest has a fresh id, `revision + 1` and a new timestamp.
pub fn apply_patch(manifest: &Manifest, operations: &[PatchOperation]) -> Manifest {
    let mut updated = manifest.clone();
    for operation in operations {
        operation.apply_to(&mut updated);
    }

    updated.manifest_id = new_manifest_id();
    updated.revision = manifest.revision + 1;
    updated.created_at = Utc::now();

    debug!(
        operations = operations.len(),
        revision = updated.revision,
        "applied patch"
    );
    updated
}

/// Copy of `manifest` re-stamped as `revision`, used when reverting.
pub fn clone_with_revision(manifest: &Manifest, revision: u64) -> Manifest {
    let mut cloned = manifest.clone();
    cloned.manifest_id = new_manifest_id();
    cloned.revision = revision;
    cloned.created_at = Utc::now();
    cloned
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_json_shape() {
        let json = r#"{"op": "move_widget", "widget_id": "practice_queue", "zone": "header"}"#;
        let operation: PatchOperation = serde_json::from_str(json).unwrap();
        assert_eq!(
            operation,
            PatchOperation::MoveWidget {
                widget_id: "practice_queue".into(),
                zone: Zone::Header,
            }
        );
        assert_eq!(operation.kind(), OperationKind::MoveWidget);

        let section: PatchOperation = serde_json::from_str(
            r#"{"op": "compose_section", "section_id": "practice_focus", "zone": "content"}"#,
        )
        .unwrap();
        let value = serde_json::to_value(&section).unwrap();
        assert_eq!(value["op"], "compose_section");
        assert!(value.get("section_title").is_none());
    }

    #[test]
    fn test_missing_required_field_is_a_decode_error() {
        let json = r#"{"op": "move_widget", "widget_id": "practice_queue"}"#;
        assert!(serde_json::from_str::<PatchOperation>(json).is_err());
    }
}
