//! Mode-based policy gate for patch batches.
//!
//! The gate never mutates anything. Checks run against a projection of the
//! widget set that follows the batch: widgets removed earlier in the batch are
//! gone, widgets added earlier are present, moves change zone population.

use crate::patch::{OperationKind, PatchOperation};
use dui_common::{get_template, Manifest, Value, ValueMap, Zone, THEME_TOKEN_KEYS};
use dui_parser::{Document, UnknownVariant};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Capability tier gating which operations are permitted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Safe,
    #[default]
    Extended,
    Experimental,
}

impl Mode {
    pub const ALL: [Mode; 3] = [Mode::Safe, Mode::Extended, Mode::Experimental];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Safe => "safe",
            Mode::Extended => "extended",
            Mode::Experimental => "experimental",
        }
    }

    pub fn profile(&self) -> &'static PolicyProfile {
        match self {
            Mode::Safe => &SAFE_PROFILE,
            Mode::Extended => &EXTENDED_PROFILE,
            Mode::Experimental => &EXPERIMENTAL_PROFILE,
        }
    }
}

impl FromStr for Mode {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| UnknownVariant {
                kind: "mode",
                value: s.to_string(),
            })
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable per-mode limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolicyProfile {
    pub allowed_operations: &'static [OperationKind],
    pub theme_token_allowlist: &'static [&'static str],
    pub layout_constraint_keys: &'static [&'static str],
    pub max_widgets_per_zone: usize,
    pub max_children_per_section: usize,
}

impl PolicyProfile {
    pub fn allows(&self, kind: OperationKind) -> bool {
        self.allowed_operations.contains(&kind)
    }

    pub fn allows_token(&self, key: &str) -> bool {
        self.theme_token_allowlist.contains(&key)
    }
}

const LAYOUT_CONSTRAINT_KEYS: &[&str] =
    &["max_columns", "sidebar_width", "content_density", "emphasis_zone"];

const SIDEBAR_WIDTHS: &[&str] = &["narrow", "normal", "wide"];
const CONTENT_DENSITIES: &[&str] = &["comfortable", "compact"];

pub static SAFE_PROFILE: PolicyProfile = PolicyProfile {
    allowed_operations: &[
        OperationKind::SetThemeProfile,
        OperationKind::SetDensity,
        OperationKind::MoveWidget,
        OperationKind::RemoveWidget,
    ],
    theme_token_allowlist: THEME_TOKEN_KEYS,
    layout_constraint_keys: LAYOUT_CONSTRAINT_KEYS,
    max_widgets_per_zone: 8,
    max_children_per_section: 6,
};

pub static EXTENDED_PROFILE: PolicyProfile = PolicyProfile {
    allowed_operations: &[
        OperationKind::SetThemeProfile,
        OperationKind::SetDensity,
        OperationKind::SetThemeTokens,
        OperationKind::SetLayoutConstraints,
        OperationKind::MoveWidget,
        OperationKind::RemoveWidget,
        OperationKind::AddWidgetFromTemplate,
        OperationKind::ComposeSection,
    ],
    theme_token_allowlist: THEME_TOKEN_KEYS,
    layout_constraint_keys: LAYOUT_CONSTRAINT_KEYS,
    max_widgets_per_zone: 8,
    max_children_per_section: 6,
};

pub static EXPERIMENTAL_PROFILE: PolicyProfile = PolicyProfile {
    allowed_operations: &[
        OperationKind::SetThemeProfile,
        OperationKind::SetDensity,
        OperationKind::SetThemeTokens,
        OperationKind::SetLayoutConstraints,
        OperationKind::MoveWidget,
        OperationKind::RemoveWidget,
        OperationKind::AddWidget,
        OperationKind::AddWidgetFromTemplate,
        OperationKind::ComposeSection,
    ],
    theme_token_allowlist: THEME_TOKEN_KEYS,
    layout_constraint_keys: LAYOUT_CONSTRAINT_KEYS,
    max_widgets_per_zone: 8,
    max_children_per_section: 6,
};

/// Verdict of the gate. Any error rejects the whole batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyResult {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl PolicyResult {
    pub fn is_accepted(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Widget placement as the batch progresses
struct Projection {
    zones: IndexMap<String, Zone>,
}

impl Projection {
    fn new(manifest: &Manifest) -> Self {
        Self {
            zones: manifest
                .widgets
                .iter()
                .map(|widget| (widget.id.clone(), widget.zone))
                .collect(),
        }
    }

    fn contains(&self, id: &str) -> bool {
        self.zones.contains_key(id)
    }

    fn zone_of(&self, id: &str) -> Option<Zone> {
        self.zones.get(id).copied()
    }

    fn population(&self, zone: Zone) -> usize {
        self.zones.values().filter(|z| **z == zone).count()
    }
}

struct PolicyCheck<'a> {
    profile: &'a PolicyProfile,
    protected: HashSet<&'a str>,
    projection: Projection,
    result: PolicyResult,
}

impl<'a> PolicyCheck<'a> {
    fn error(&mut self, message: impl Into<String>) {
        self.result.errors.push(message.into());
    }

    fn warning(&mut self, message: impl Into<String>) {
        self.result.warnings.push(message.into());
    }

    /// Reserve a slot in `zone`, reporting when it is full
    fn claim_zone(&mut self, zone: Zone) -> bool {
        if self.projection.population(zone) >= self.profile.max_widgets_per_zone {
            self.error(format!("Zone '{}' has reached widget limit", zone));
            return false;
        }
        true
    }

    fn check(&mut self, operation: &PatchOperation, mode: Mode) {
        let kind = operation.kind();
        if !self.profile.allows(kind) {
            self.error(format!(
                "Operation '{}' is not allowed in mode '{}'",
                kind, mode
            ));
        }

        match operation {
            PatchOperation::SetThemeProfile { .. } | PatchOperation::SetDensity { .. } => {}

            PatchOperation::SetThemeTokens { tokens } => {
                if tokens.is_empty() {
                    self.error("set_theme_tokens requires tokens");
                    return;
                }
                self.check_tokens(tokens);
            }

            PatchOperation::SetLayoutConstraints { layout_constraints } => {
                if layout_constraints.is_empty() {
                    self.error("set_layout_constraints requires layout_constraints");
                    return;
                }
                self.check_layout(layout_constraints);
            }

            PatchOperation::RemoveWidget { widget_id } => {
                if widget_id.is_empty() {
                    self.error("remove_widget requires widget_id");
                    return;
                }
                if self.protected.contains(widget_id.as_str()) {
                    self.error(format!(
                        "Widget '{}' is protected and cannot be removed",
                        widget_id
                    ));
                }
                if self.projection.zones.shift_remove(widget_id).is_none() {
                    self.warning(format!(
                        "Widget '{}' does not exist in current manifest",
                        widget_id
                    ));
                }
            }

            PatchOperation::MoveWidget { widget_id, zone } => {
                if widget_id.is_empty() {
                    self.error("move_widget requires widget_id and zone");
                    return;
                }
                match self.projection.zone_of(widget_id) {
                    None => self.error(format!("Cannot move unknown widget '{}'", widget_id)),
                    Some(current) if current == *zone => {}
                    Some(_) => {
                        if self.claim_zone(*zone) {
                            self.projection.zones.insert(widget_id.clone(), *zone);
                        }
                    }
                }
            }

            PatchOperation::AddWidget { widget } => {
                if widget.id.is_empty() {
                    self.error("add_widget requires widget payload");
                    return;
                }
                if self.projection.contains(&widget.id) {
                    self.error(format!("Widget '{}' already exists", widget.id));
                } else if self.claim_zone(widget.zone) {
                    self.projection.zones.insert(widget.id.clone(), widget.zone);
                }
            }

            PatchOperation::AddWidgetFromTemplate {
                template_id,
                widget_id,
                zone,
                ..
            } => {
                if template_id.is_empty() || widget_id.is_empty() {
                    self.error("add_widget_from_template requires template_id, widget_id, zone");
                    return;
                }
                if get_template(template_id).is_none() {
                    self.error(format!("Unknown template_id '{}'", template_id));
                }
                if self.projection.contains(widget_id) {
                    self.error(format!("Widget '{}' already exists", widget_id));
                } else if self.claim_zone(*zone) {
                    self.projection.zones.insert(widget_id.clone(), *zone);
                }
            }

            PatchOperation::ComposeSection {
                section_id,
                child_widget_ids,
                ..
            } => {
                if section_id.is_empty() {
                    self.error("compose_section requires section_id and zone");
                    return;
                }
                if child_widget_ids.is_empty() {
                    self.error("compose_section requires non-empty child_widget_ids");
                }
                if child_widget_ids.len() > self.profile.max_children_per_section {
                    self.error(format!(
                        "compose_section supports up to {} child widgets",
                        self.profile.max_children_per_section
                    ));
                }
                let unknown: Vec<&str> = child_widget_ids
                    .iter()
                    .map(String::as_str)
                    .filter(|id| !self.projection.contains(id))
                    .collect();
                if !unknown.is_empty() {
                    self.error(format!(
                        "compose_section references unknown child widget ids: {}",
                        unknown.join(", ")
                    ));
                }
            }
        }
    }

    fn check_tokens(&mut self, tokens: &ValueMap) {
        for (key, value) in tokens {
            if !self.profile.allows_token(key) {
                self.error(format!("Theme token '{}' is not allowed", key));
                continue;
            }
            let non_empty = matches!(value, Value::String(s) if !s.trim().is_empty());
            if !non_empty {
                self.error(format!("Theme token '{}' must be a non-empty string", key));
            }
        }
    }

    fn check_layout(&mut self, constraints: &ValueMap) {
        for (key, value) in constraints {
            if !self.profile.layout_constraint_keys.contains(&key.as_str()) {
                self.error(format!("Layout constraint '{}' is not allowed", key));
                continue;
            }
            let text = value.as_str();
            match key.as_str() {
                "max_columns" => {
                    if !matches!(value.as_i64(), Some(1..=4)) {
                        self.error("layout max_columns must be an integer in range 1..4");
                    }
                }
                "sidebar_width" => {
                    if !text.is_some_and(|t| SIDEBAR_WIDTHS.contains(&t)) {
                        self.error("layout sidebar_width must be one of narrow|normal|wide");
                    }
                }
                "content_density" => {
                    if !text.is_some_and(|t| CONTENT_DENSITIES.contains(&t)) {
                        self.error("layout content_density must be one of comfortable|compact");
                    }
                }
                "emphasis_zone" => {
                    if !text.is_some_and(|t| t.parse::<Zone>().is_ok()) {
                        self.error(
                            "layout emphasis_zone must be one of header|sidebar|content|footer",
                        );
                    }
                }
                _ => {}
            }
        }
    }
}

/// Check a batch of operations against `manifest` under `mode`.
pub fn check_patch(manifest: &Manifest, operations: &[PatchOperation], mode: Mode) -> PolicyResult {
    let mut check = PolicyCheck {
        profile: mode.profile(),
        protected: manifest
            .widgets
            .iter()
            .filter(|widget| widget.protected)
            .map(|widget| widget.id.as_str())
            .collect(),
        projection: Projection::new(manifest),
        result: PolicyResult::default(),
    };

    for operation in operations {
        check.check(operation, mode);
    }

    check.result
}

/// Mode gate for whole-document replacements: safe mode only lets the theme change.
pub fn check_document_change(current: &Document, next: &Document, mode: Mode) -> Vec<String> {
    if mode != Mode::Safe {
        return Vec::new();
    }

    let mut errors = Vec::new();
    let mut require_unchanged = |same: bool, part: &str| {
        if !same {
            errors.push(format!(
                "safe mode allows only theme updates ({} cannot change)",
                part
            ));
        }
    };
    require_unchanged(current.nodes == next.nodes, "nodes");
    require_unchanged(current.bindings == next.bindings, "bindings");
    require_unchanged(current.actions == next.actions, "actions");
    require_unchanged(
        current.layout_constraints == next.layout_constraints,
        "layout_constraints",
    );
    errors
}
