use dui_parser::{parse, serialize, Density, ParseError, ThemeProfile, Value};

const DASHBOARD: &str = r##"
// Dashboard surface
surface math_lms.dashboard {
  surface_meta { title: "Math Dashboard", route: "/dashboard" }
  meta { document_id: seed-dsl-dashboard-v1, revision: 1, created_by: system }
  theme {
    profile: liquid_glass
    density: comfortable
    tokens { accent: "#0369a1" }
  }

  node root: layout.page { children: [main_header, main_content] }
  node main_header: layout.region { zone: header, children: [course_progress] }
  node main_content: layout.region { zone: content, children: [learning_path] }

  node course_progress: data.kpi_card {
    title: "Course Progress"
    zone: header
    capability_id: "math.progress_overview"
    protected: true
    on { click: open_path }
  }
  node learning_path: data.data_table {
    props { title: "Learning Path", zone: content }
    style { min_height: 240 }
  }

  binding progress_data { source: "capability:math.progress_overview", select: "$.items" }
  action open_path { type: nav.open_route, params { route: "/path" } }
}
"##;

#[test]
fn parses_full_surface() {
    let doc = parse(DASHBOARD).expect("dashboard parses");

    assert_eq!(doc.surface.id, "math_lms.dashboard");
    assert_eq!(doc.surface.route, "/dashboard");
    assert_eq!(doc.meta.document_id, "seed-dsl-dashboard-v1");
    assert_eq!(doc.theme.profile, ThemeProfile::LiquidGlass);
    assert_eq!(doc.theme.density, Density::Comfortable);
    assert_eq!(doc.nodes.len(), 5);
    assert_eq!(doc.bindings[0].select, "$.items");
    assert_eq!(doc.actions[0].action_type, "nav.open_route");

    let kpi = doc.node("course_progress").unwrap();
    assert_eq!(kpi.props["protected"], Value::Bool(true));
    assert_eq!(kpi.on["click"], "open_path");

    let table = doc.node("learning_path").unwrap();
    assert_eq!(table.style["min_height"], Value::Int(240));
}

#[test]
fn parser_does_not_resolve_references() {
    let doc = parse("surface s { node root: layout.page { children: [a,b] } }").unwrap();
    assert_eq!(doc.nodes[0].children, vec!["a", "b"]);
}

#[test]
fn errors_carry_line_and_column() {
    let source = "surface s {\n  node root: layout.page {\n    children: [a\n";
    let err = parse(source).unwrap_err();
    assert!(matches!(err, ParseError::UnexpectedEof { .. }));
    assert_eq!(err.line(), 4);

    let err = parse("surface s {\n  node root layout.page {}\n}").unwrap_err();
    assert_eq!((err.line(), err.column()), (2, 13));
}

#[test]
fn serializer_output_round_trips() {
    let doc = parse(DASHBOARD).unwrap();
    let mut again = parse(&serialize(&doc)).unwrap();
    again.meta.created_at = doc.meta.created_at;
    assert_eq!(again, doc);
}

#[cfg(feature = "pretty-errors")]
#[test]
fn pretty_error_includes_message() {
    let source = "surface s { @ }";
    let err = parse(source).unwrap_err();
    let report = dui_parser::format_error(source, "broken.dui", &err);
    assert!(report.contains("Unexpected character"));
}
