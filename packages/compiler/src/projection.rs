use chrono::Utc;
use dui_common::{
    node_type_for_kind, tokens_for, Manifest, Widget, Zone, PAGE_NODE_TYPE, REGION_NODE_TYPE,
    SECTION_NODE_TYPE, WIDGET_COMPILATION_MAP,
};
use dui_parser::{new_document_id, Document, Meta, Node, Theme, Value, ValueMap};
use std::collections::HashSet;
use tracing::instrument;

/// Author recorded on documents projected after a patch
pub const DEFAULT_PROJECTION_AUTHOR: &str = "patch-sync";

pub const ROOT_NODE_ID: &str = "root";

/// Fixed region node id for a zone
pub fn region_id(zone: Zone) -> String {
    format!("main_{}", zone)
}

/// Node type for a widget: the catalog entry sharing its capability and kind,
/// otherwise the canonical type for its kind.
pub fn widget_node_type(widget: &Widget) -> &'static str {
    WIDGET_COMPILATION_MAP
        .iter()
        .find(|mapping| mapping.capability_id == widget.capability_id && mapping.kind == widget.kind)
        .map(|mapping| mapping.node_type)
        .unwrap_or_else(|| node_type_for_kind(widget.kind))
}

fn widget_node(widget: &Widget) -> Node {
    let mut node = Node::new(widget.id.as_str(), widget_node_type(widget));
    node.props = widget.props.clone();
    node.props.insert("title".into(), Value::from(widget.title.as_str()));
    node.props.insert("zone".into(), Value::from(widget.zone.as_str()));
    node.props
        .insert("capability_id".into(), Value::from(widget.capability_id.as_str()));
    node.props.insert("protected".into(), Value::Bool(widget.protected));
    if let Some(template_id) = &widget.template_id {
        node.props
            .insert("template_id".into(), Value::from(template_id.as_str()));
    }
    node
}

/// Token overrides relative to the profile/density base
fn token_overrides(manifest: &Manifest) -> ValueMap {
    let base = tokens_for(manifest.theme.profile, manifest.theme.density);
    manifest
        .theme
        .tokens
        .iter()
        .filter(|(key, value)| base.get(key.as_str()) != Some(*value))
        .map(|(key, value)| (key.clone(), Value::from(value.as_str())))
        .collect()
}

/// Rebuild a canonical document tree for `manifest`.
///
/// The tree is `root -> main_<zone> -> section -> widget`; widgets no section
/// references hang directly off their zone's region. Surface, state, bindings
/// and actions carry over from `current`. The result gets a new document id
/// and the revision after `current`'s.
#[instrument(skip(manifest, current), fields(surface = %current.surface.id))]
pub fn project(manifest: &Manifest, current: &Document, created_by: &str) -> Document {
    let widget_ids: HashSet<&str> = manifest.widgets.iter().map(|w| w.id.as_str()).collect();
    let sectioned: HashSet<&str> = manifest
        .sections
        .iter()
        .flat_map(|section| section.child_widget_ids.iter().map(String::as_str))
        .collect();

    let mut nodes = vec![Node::new(ROOT_NODE_ID, PAGE_NODE_TYPE)
        .with_children(Zone::PAGE_ORDER.into_iter().map(region_id))];

    for zone in Zone::PAGE_ORDER {
        let sections = manifest
            .sections
            .iter()
            .filter(|section| section.zone == zone)
            .map(|section| section.id.clone());
        let loose_widgets = manifest
            .widgets
            .iter()
            .filter(|widget| widget.zone == zone && !sectioned.contains(widget.id.as_str()))
            .map(|widget| widget.id.clone());

        nodes.push(
            Node::new(region_id(zone), REGION_NODE_TYPE)
                .with_prop("zone", zone.as_str())
                .with_children(sections.chain(loose_widgets)),
        );
    }

    for section in &manifest.sections {
        let mut node = Node::new(section.id.as_str(), SECTION_NODE_TYPE)
            .with_prop("title", section.title.as_str())
            .with_prop("zone", section.zone.as_str())
            .with_children(
                section
                    .child_widget_ids
                    .iter()
                    .filter(|id| widget_ids.contains(id.as_str())),
            );
        node.layout = section.layout.clone();
        nodes.push(node);
    }

    nodes.extend(manifest.widgets.iter().map(widget_node));

    Document {
        dsl_version: current.dsl_version.clone(),
        surface: current.surface.clone(),
        meta: Meta {
            document_id: new_document_id(),
            revision: current.meta.revision + 1,
            created_at: Utc::now(),
            created_by: created_by.to_string(),
        },
        theme: Theme {
            profile: manifest.theme.profile,
            density: manifest.theme.density,
            tokens: token_overrides(manifest),
        },
        state: current.state.clone(),
        nodes,
        bindings: current.bindings.clone(),
        actions: current.actions.clone(),
        layout_constraints: manifest.layout_constraints.clone(),
    }
}
