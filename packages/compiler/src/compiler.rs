use chrono::Utc;
use dui_common::{
    new_manifest_id, title_from_id, tokens_for, widget_mapping, Manifest, Section, ThemeConfig,
    Widget, Zone, MANIFEST_SCHEMA_VERSION, SECTION_NODE_TYPE,
};
use dui_parser::{Document, Node, Value, ValueMap};
use dui_validator::{validate_document, Issue, ValidationLimits};
use indexmap::IndexMap;
use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, instrument};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    #[error("Document has {} validation error(s); first: {}", .errors.len(), first_message(.errors))]
    Invalid { errors: Vec<Issue> },
}

fn first_message(errors: &[Issue]) -> String {
    errors
        .first()
        .map(ToString::to_string)
        .unwrap_or_default()
}

/// Layout constraints every manifest starts from
pub fn default_layout_constraints() -> ValueMap {
    let mut constraints = ValueMap::new();
    constraints.insert("max_columns".into(), Value::Int(2));
    constraints.insert("sidebar_width".into(), Value::from("normal"));
    constraints.insert("content_density".into(), Value::from("comfortable"));
    constraints
}

/// Zone named by a node's `zone` prop; anything unrecognized lands in content.
pub(crate) fn node_zone(node: &Node) -> Zone {
    node.props
        .get("zone")
        .and_then(Value::as_str)
        .and_then(|zone| zone.parse().ok())
        .unwrap_or(Zone::Content)
}

pub(crate) fn node_title(node: &Node) -> String {
    match node.props.get("title") {
        Some(title) if title.is_truthy() => title.to_plain_string(),
        _ => title_from_id(&node.id),
    }
}

fn compile_widget(node: &Node) -> Option<Widget> {
    let mapping = widget_mapping(&node.node_type)?;

    let capability_id = match node.props.get("capability_id") {
        Some(capability) if capability.is_truthy() => capability.to_plain_string(),
        _ => mapping.capability_id.to_string(),
    };

    Some(Widget {
        id: node.id.clone(),
        title: node_title(node),
        kind: mapping.kind,
        zone: node_zone(node),
        capability_id,
        protected: node.props.get("protected").is_some_and(Value::is_truthy),
        template_id: node
            .props
            .get("template_id")
            .and_then(Value::as_str)
            .map(String::from),
        props: node.props.clone(),
    })
}

fn auto_sections(widgets: &[Widget]) -> Vec<Section> {
    let mut layout = ValueMap::new();
    layout.insert("columns".into(), Value::Int(1));

    Zone::PAGE_ORDER
        .into_iter()
        .filter_map(|zone| {
            let children: Vec<String> = widgets
                .iter()
                .filter(|widget| widget.zone == zone)
                .map(|widget| widget.id.clone())
                .collect();
            if children.is_empty() {
                return None;
            }
            Some(Section {
                id: format!("auto_{}", zone),
                title: format!("{} Section", zone.label()),
                zone,
                child_widget_ids: children,
                layout: layout.clone(),
            })
        })
        .collect()
}

/// Compile a document into a manifest at `revision`.
///
/// Nodes whose type appears in the widget compilation map become widgets,
/// `layout.section` nodes become sections. When a document declares no
/// sections, one section per populated zone is derived.
#[instrument(skip(document), fields(surface = %document.surface.id))]
pub fn compile(document: &Document, revision: u64, manifest_id: Option<&str>) -> Manifest {
    let widgets: Vec<Widget> = document.nodes.iter().filter_map(compile_widget).collect();
    let widget_ids: HashSet<&str> = widgets.iter().map(|widget| widget.id.as_str()).collect();

    let mut sections: Vec<Section> = document
        .nodes
        .iter()
        .filter(|node| node.node_type == SECTION_NODE_TYPE)
        .map(|node| Section {
            id: node.id.clone(),
            title: node_title(node),
            zone: node_zone(node),
            child_widget_ids: node
                .children
                .iter()
                .filter(|child| widget_ids.contains(child.as_str()))
                .cloned()
                .collect(),
            layout: node.layout.clone(),
        })
        .collect();

    if sections.is_empty() && !widgets.is_empty() {
        sections = auto_sections(&widgets);
    }

    let mut tokens = tokens_for(document.theme.profile, document.theme.density);
    for (key, value) in &document.theme.tokens {
        tokens.insert(key.clone(), value.to_plain_string());
    }

    let mut layout_constraints = default_layout_constraints();
    for (key, value) in &document.layout_constraints {
        layout_constraints.insert(key.clone(), value.clone());
    }

    let mut metadata = IndexMap::new();
    metadata.insert("surface_id".to_string(), document.surface.id.clone());
    metadata.insert("dsl_document_id".to_string(), document.meta.document_id.clone());
    metadata.insert("dsl_version".to_string(), document.dsl_version.clone());
    metadata.insert("created_by".to_string(), document.meta.created_by.clone());

    debug!(
        widgets = widgets.len(),
        sections = sections.len(),
        revision,
        "compiled document"
    );

    Manifest {
        schema_version: MANIFEST_SCHEMA_VERSION,
        manifest_id: manifest_id.map_or_else(new_manifest_id, String::from),
        revision,
        created_at: Utc::now(),
        theme: ThemeConfig {
            profile: document.theme.profile,
            density: document.theme.density,
            tokens,
        },
        widgets,
        sections,
        layout_constraints,
        metadata,
    }
}

/// Validate first, then compile. Documents with error-severity issues are refused.
pub fn compile_checked(
    document: &Document,
    revision: u64,
    manifest_id: Option<&str>,
    limits: &ValidationLimits,
) -> Result<Manifest, CompileError> {
    let result = validate_document(document, limits);
    if !result.valid {
        return Err(CompileError::Invalid {
            errors: result.errors,
        });
    }
    Ok(compile(document, revision, manifest_id))
}
