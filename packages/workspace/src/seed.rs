//! Seed surfaces every store starts from.

use dui_common::{Manifest, Value, ValueMap};
use dui_compiler::compile;
use dui_parser::{Document, Meta, Node, Surface};

pub const DEFAULT_SURFACE_ID: &str = "math_lms.dashboard";
pub const LESSON_SURFACE_ID: &str = "math_lms.lesson";
pub const DEFAULT_CATALOG_VERSION: &str = "math-lms-catalog-v1";
pub const SEED_DOMAIN: &str = "math-lms";

fn layout_constraints(max_columns: i64) -> ValueMap {
    let mut constraints = ValueMap::new();
    constraints.insert("max_columns".into(), Value::Int(max_columns));
    constraints.insert("sidebar_width".into(), Value::from("normal"));
    constraints.insert("content_density".into(), Value::from("comfortable"));
    constraints
}

fn columns(count: i64) -> ValueMap {
    let mut layout = ValueMap::new();
    layout.insert("columns".into(), Value::Int(count));
    layout
}

fn region(id: &str, zone: &str, children: &[&str]) -> Node {
    Node::new(id, "layout.region")
        .with_prop("zone", zone)
        .with_children(children.iter().copied())
}

fn widget(id: &str, node_type: &str, title: &str, zone: &str, capability_id: &str) -> Node {
    Node::new(id, node_type)
        .with_prop("title", title)
        .with_prop("zone", zone)
        .with_prop("capability_id", capability_id)
}

fn section(id: &str, title: &str, columns_count: i64, children: &[&str]) -> Node {
    let mut node = Node::new(id, "layout.section")
        .with_prop("title", title)
        .with_prop("zone", "content")
        .with_children(children.iter().copied());
    node.layout = columns(columns_count);
    node
}

fn seed_meta(document_id: &str) -> Meta {
    Meta {
        document_id: document_id.to_string(),
        revision: 1,
        created_by: "seed".to_string(),
        ..Meta::default()
    }
}

fn dashboard_document(surface_id: &str) -> Document {
    let mut document = Document::new(surface_id);
    document.surface = Surface {
        id: surface_id.to_string(),
        title: "Math Dashboard".to_string(),
        route: "/dashboard".to_string(),
    };
    document.meta = seed_meta("seed-dsl-dashboard-v1");
    document.layout_constraints = layout_constraints(2);
    document.nodes = vec![
        Node::new("root", "layout.page").with_children(["main_header", "main_content", "main_sidebar"]),
        region("main_header", "header", &["course_progress"]),
        region(
            "main_content",
            "content",
            &["learning_overview", "learning_path", "mastery_trend"],
        ),
        region("main_sidebar", "sidebar", &["practice_queue"]),
        widget(
            "course_progress",
            "data.kpi_card",
            "Course Progress",
            "header",
            "math.progress_overview",
        )
        .with_prop("protected", true),
        widget(
            "learning_path",
            "data.data_table",
            "Learning Path",
            "content",
            "math.learning_path",
        ),
        widget(
            "mastery_trend",
            "chart.line",
            "Mastery Trend",
            "content",
            "math.mastery_trend",
        ),
        widget(
            "practice_queue",
            "data.activity_feed",
            "Practice Queue",
            "sidebar",
            "math.practice_queue",
        ),
        section(
            "learning_overview",
            "Learning Overview",
            2,
            &["learning_path", "mastery_trend"],
        ),
    ];
    document
}

fn lesson_document() -> Document {
    let mut document = Document::new(LESSON_SURFACE_ID);
    document.surface = Surface {
        id: LESSON_SURFACE_ID.to_string(),
        title: "Lesson Surface".to_string(),
        route: "/lesson".to_string(),
    };
    document.meta = seed_meta("seed-dsl-lesson-v1");
    document.layout_constraints = layout_constraints(1);
    document.nodes = vec![
        Node::new("root", "layout.page").with_children(["lesson_header", "lesson_content", "lesson_sidebar"]),
        region("lesson_header", "header", &["lesson_progress"]),
        region(
            "lesson_content",
            "content",
            &["lesson_section", "lesson_objectives", "lesson_theory"],
        ),
        region("lesson_sidebar", "sidebar", &["lesson_exercises"]),
        widget(
            "lesson_progress",
            "data.kpi_card",
            "Lesson Progress",
            "header",
            "math.lesson_progress",
        )
        .with_prop("protected", true),
        widget(
            "lesson_objectives",
            "lms.lesson_objectives",
            "Objectives",
            "content",
            "math.lesson_objectives",
        ),
        widget(
            "lesson_theory",
            "lms.theory_points",
            "Theory Points",
            "content",
            "math.lesson_theory",
        ),
        widget(
            "lesson_exercises",
            "lms.exercise_list",
            "Exercises",
            "sidebar",
            "math.lesson_exercises",
        ),
        section(
            "lesson_section",
            "Lesson Content",
            1,
            &["lesson_objectives", "lesson_theory"],
        ),
    ];
    document
}

/// Seed document for a surface. Unknown surfaces get the dashboard layout.
pub fn seed_document(surface_id: &str) -> Document {
    if surface_id == LESSON_SURFACE_ID {
        lesson_document()
    } else {
        dashboard_document(surface_id)
    }
}

/// Revision 1 of a surface: its seed document compiled under a fixed id.
pub fn seed_manifest(surface_id: &str) -> Manifest {
    let manifest_id = if surface_id == LESSON_SURFACE_ID {
        "seed-lesson-manifest-v1"
    } else {
        "seed-manifest-v1"
    };
    let mut manifest = compile(&seed_document(surface_id), 1, Some(manifest_id));
    manifest.metadata.insert("seed".into(), "true".into());
    manifest.metadata.insert("domain".into(), SEED_DOMAIN.into());
    manifest.metadata.insert("surface_id".into(), surface_id.into());
    manifest
}
