use criterion::{black_box, criterion_group, criterion_main, Criterion};
use dui_parser::{parse, serialize};

fn dashboard_source(widgets: usize) -> String {
    let mut source = String::from(
        r#"surface "math_lms.dashboard" {
  surface_meta { title: "Math Dashboard", route: "/dashboard" }
  theme { profile: default, density: comfortable }
  node root: layout.page { children: [main_content] }
"#,
    );
    let ids: Vec<String> = (0..widgets).map(|i| format!("widget_{}", i)).collect();
    source.push_str(&format!(
        "  node main_content: layout.region {{ zone: content, children: [{}] }}\n",
        ids.join(", ")
    ));
    for id in &ids {
        source.push_str(&format!(
            "  node {}: data.kpi_card {{ title: \"{}\", zone: content, capability_id: \"math.progress_overview\" }}\n",
            id, id
        ));
    }
    source.push_str("}\n");
    source
}

fn parse_small_surface(c: &mut Criterion) {
    let source = dashboard_source(4);
    c.bench_function("parse_small_surface", |b| b.iter(|| parse(black_box(&source))));
}

fn parse_large_surface(c: &mut Criterion) {
    let source = dashboard_source(150);
    c.bench_function("parse_large_surface", |b| b.iter(|| parse(black_box(&source))));
}

fn serialize_large_surface(c: &mut Criterion) {
    let doc = parse(&dashboard_source(150)).expect("bench source parses");
    c.bench_function("serialize_large_surface", |b| b.iter(|| serialize(black_box(&doc))));
}

criterion_group!(
    benches,
    parse_small_surface,
    parse_large_surface,
    serialize_large_surface
);
criterion_main!(benches);
