use crate::manifest::WidgetKind;
use dui_parser::{Value, ValueMap};

// Document limits
pub const MAX_NODES_PER_DOCUMENT: usize = 200;
pub const MAX_BINDINGS_PER_DOCUMENT: usize = 50;
pub const MAX_CHILDREN_PER_NODE: usize = 24;
pub const MAX_ACTIONS_PER_NODE: usize = 8;
pub const MAX_DEPTH_PER_DOCUMENT: usize = 8;

/// Bindings must read from a capability: `capability:<id>`.
pub const CAPABILITY_SOURCE_PREFIX: &str = "capability:";

pub const SECTION_NODE_TYPE: &str = "layout.section";
pub const PAGE_NODE_TYPE: &str = "layout.page";
pub const REGION_NODE_TYPE: &str = "layout.region";

/// How a node type compiles to a widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WidgetMapping {
    pub node_type: &'static str,
    pub kind: WidgetKind,
    pub capability_id: &'static str,
}

const fn mapping(node_type: &'static str, kind: WidgetKind, capability_id: &'static str) -> WidgetMapping {
    WidgetMapping {
        node_type,
        kind,
        capability_id,
    }
}

/// Node types that compile to widgets, in lookup order.
pub const WIDGET_COMPILATION_MAP: &[WidgetMapping] = &[
    mapping("data.kpi_card", WidgetKind::Kpi, "math.progress_overview"),
    mapping("data.data_table", WidgetKind::Table, "math.learning_path"),
    mapping("chart.line", WidgetKind::Chart, "math.mastery_trend"),
    mapping("data.activity_feed", WidgetKind::Activity, "math.practice_queue"),
    mapping("lms.lesson_objectives", WidgetKind::List, "math.lesson_objectives"),
    mapping("lms.theory_points", WidgetKind::Card, "math.lesson_theory"),
    mapping("lms.exercise_list", WidgetKind::Activity, "math.lesson_exercises"),
    mapping("lms.weak_topics_list", WidgetKind::List, "math.weak_topics"),
    mapping("layout.card", WidgetKind::Card, "ui.card"),
    mapping("layout.list", WidgetKind::List, "ui.list"),
    mapping("layout.panel", WidgetKind::Panel, "ui.panel"),
    mapping("layout.tabs", WidgetKind::Tabs, "ui.tabs"),
    mapping("form.form", WidgetKind::Form, "ui.form"),
];

/// Node types that structure the page but never become widgets.
pub const STRUCTURAL_NODE_TYPES: &[&str] = &[
    PAGE_NODE_TYPE,
    REGION_NODE_TYPE,
    SECTION_NODE_TYPE,
    "layout.stack",
    "text.heading",
    "text.body",
    "ui.button",
];

pub const ACTION_TYPE_ALLOWLIST: &[&str] = &[
    "nav.open_route",
    "data.refresh",
    "ui.toggle_panel",
    "ui.open_modal",
    "lms.start_lesson",
    "lms.submit_answer",
];

pub fn widget_mapping(node_type: &str) -> Option<&'static WidgetMapping> {
    WIDGET_COMPILATION_MAP
        .iter()
        .find(|mapping| mapping.node_type == node_type)
}

pub fn is_known_node_type(node_type: &str) -> bool {
    widget_mapping(node_type).is_some() || STRUCTURAL_NODE_TYPES.contains(&node_type)
}

pub fn is_known_action_type(action_type: &str) -> bool {
    ACTION_TYPE_ALLOWLIST.contains(&action_type)
}

/// Fallback node type for a widget kind when its capability matches no mapping.
pub fn node_type_for_kind(kind: WidgetKind) -> &'static str {
    match kind {
        WidgetKind::Kpi => "data.kpi_card",
        WidgetKind::Table => "data.data_table",
        WidgetKind::Activity => "data.activity_feed",
        WidgetKind::Chart => "chart.line",
        WidgetKind::Card => "layout.card",
        WidgetKind::List => "layout.list",
        WidgetKind::Panel => "layout.panel",
        WidgetKind::Tabs => "layout.tabs",
        WidgetKind::Form => "form.form",
    }
}

/// Pre-built widget a patch may instantiate by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WidgetTemplate {
    pub template_id: &'static str,
    pub title: &'static str,
    pub kind: WidgetKind,
    pub capability_id: &'static str,
    pub default_props: &'static [(&'static str, &'static str)],
}

impl WidgetTemplate {
    pub fn default_props(&self) -> ValueMap {
        self.default_props
            .iter()
            .map(|(k, v)| (k.to_string(), Value::from(*v)))
            .collect()
    }
}

pub const TEMPLATE_CATALOG: &[WidgetTemplate] = &[
    WidgetTemplate {
        template_id: "weak_topics_list",
        title: "Weak Topics",
        kind: WidgetKind::List,
        capability_id: "math.weak_topics",
        default_props: &[],
    },
    WidgetTemplate {
        template_id: "next_lesson_card",
        title: "Next Lesson",
        kind: WidgetKind::Card,
        capability_id: "math.next_lesson",
        default_props: &[],
    },
    WidgetTemplate {
        template_id: "study_streak_panel",
        title: "Study Streak",
        kind: WidgetKind::Panel,
        capability_id: "math.study_streak",
        default_props: &[],
    },
    WidgetTemplate {
        template_id: "formula_cheatsheet",
        title: "Formula Cheatsheet",
        kind: WidgetKind::List,
        capability_id: "math.formulas",
        default_props: &[],
    },
    WidgetTemplate {
        template_id: "quick_actions",
        title: "Quick Actions",
        kind: WidgetKind::Panel,
        capability_id: "math.quick_actions",
        default_props: &[],
    },
    WidgetTemplate {
        template_id: "assignment_calendar",
        title: "Assignment Calendar",
        kind: WidgetKind::Table,
        capability_id: "math.assignments",
        default_props: &[("range", "week")],
    },
    WidgetTemplate {
        template_id: "focus_timer",
        title: "Focus Timer",
        kind: WidgetKind::Card,
        capability_id: "math.focus_timer",
        default_props: &[("duration_minutes", "25")],
    },
];

pub fn get_template(template_id: &str) -> Option<&'static WidgetTemplate> {
    TEMPLATE_CATALOG
        .iter()
        .find(|template| template.template_id == template_id)
}

/// Template ids, sorted.
pub fn template_ids() -> Vec<&'static str> {
    let mut ids: Vec<_> = TEMPLATE_CATALOG.iter().map(|t| t.template_id).collect();
    ids.sort_unstable();
    ids
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_widget_mapping_lookup() {
        let mapping = widget_mapping("chart.line").unwrap();
        assert_eq!(mapping.kind, WidgetKind::Chart);
        assert!(widget_mapping("layout.section").is_none());
    }

    #[test]
    fn test_every_kind_fallback_compiles() {
        for mapping in WIDGET_COMPILATION_MAP {
            let fallback = node_type_for_kind(mapping.kind);
            assert_eq!(widget_mapping(fallback).map(|m| m.kind), Some(mapping.kind));
        }
    }

    #[test]
    fn test_node_type_allowlist() {
        assert!(is_known_node_type("layout.page"));
        assert!(is_known_node_type("data.kpi_card"));
        assert!(!is_known_node_type("html.iframe"));
    }

    #[test]
    fn test_templates() {
        assert_eq!(template_ids().first(), Some(&"assignment_calendar"));
        let timer = get_template("focus_timer").unwrap();
        assert_eq!(timer.default_props()["duration_minutes"], Value::from("25"));
        assert!(get_template("nope").is_none());
    }
}
