//! Seams for untrusted change producers.
//!
//! A producer turns a free-form prompt into candidate operations or a
//! candidate document. Its output is never trusted: services run it through
//! `check_patch` or `validate_document` before anything is stored. The
//! rule-based producers below recognise a handful of English keywords and
//! serve as the deterministic fallback.

use crate::errors::ProducerError;
use dui_common::{Manifest, Value, ValueMap, Zone, REGION_NODE_TYPE, SECTION_NODE_TYPE};
use dui_editor::{Mode, PatchOperation};
use dui_parser::{Density, Document, Node, ThemeProfile};

/// What a producer may look at
#[derive(Debug, Clone, Copy)]
pub struct ProducerContext<'a> {
    pub surface_id: &'a str,
    pub mode: Mode,
    pub manifest: &'a Manifest,
    pub document: &'a Document,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Proposal<T> {
    pub output: T,
    pub warnings: Vec<String>,
}

pub trait PatchProducer {
    fn propose_operations(
        &self,
        prompt: &str,
        context: &ProducerContext<'_>,
    ) -> Result<Proposal<Vec<PatchOperation>>, ProducerError>;
}

pub trait DocumentProducer {
    fn propose_document(
        &self,
        prompt: &str,
        context: &ProducerContext<'_>,
    ) -> Result<Proposal<Document>, ProducerError>;
}

fn mentions(prompt: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|keyword| prompt.contains(keyword))
}

fn wants_profile(prompt: &str) -> Vec<ThemeProfile> {
    let mut profiles = Vec::new();
    if mentions(prompt, &["minimal"]) {
        profiles.push(ThemeProfile::Minimal);
    }
    if mentions(prompt, &["liquid", "glass"]) {
        profiles.push(ThemeProfile::LiquidGlass);
    }
    if mentions(prompt, &["default", "classic"]) {
        profiles.push(ThemeProfile::Default);
    }
    profiles
}

fn wants_density(prompt: &str) -> Vec<Density> {
    let mut densities = Vec::new();
    if mentions(prompt, &["compact", "dense"]) {
        densities.push(Density::Compact);
    }
    if mentions(prompt, &["comfortable", "spacious"]) {
        densities.push(Density::Comfortable);
    }
    densities
}

fn wants_red_buttons(prompt: &str) -> bool {
    prompt.contains("button") && prompt.contains("red")
}

fn red_accent_tokens() -> ValueMap {
    let mut tokens = ValueMap::new();
    tokens.insert("accent".into(), Value::from("#dc2626"));
    tokens.insert("accent_container".into(), Value::from("#fee2e2"));
    tokens
}

fn structural_mode(mode: Mode) -> bool {
    matches!(mode, Mode::Extended | Mode::Experimental)
}

/// Keyword-driven operation producer.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleBasedPatchProducer;

impl PatchProducer for RuleBasedPatchProducer {
    fn propose_operations(
        &self,
        prompt: &str,
        context: &ProducerContext<'_>,
    ) -> Result<Proposal<Vec<PatchOperation>>, ProducerError> {
        let prompt = prompt.trim().to_lowercase();
        let mut operations = Vec::new();

        for profile in wants_profile(&prompt) {
            operations.push(PatchOperation::SetThemeProfile { profile });
        }
        for density in wants_density(&prompt) {
            operations.push(PatchOperation::SetDensity { density });
        }

        if mentions(&prompt, &["hide sidebar", "no sidebar"]) {
            operations.extend(
                context
                    .manifest
                    .widgets
                    .iter()
                    .filter(|widget| widget.zone == Zone::Sidebar && !widget.protected)
                    .map(|widget| PatchOperation::RemoveWidget {
                        widget_id: widget.id.clone(),
                    }),
            );
        }

        if mentions(&prompt, &["practice focus", "more practice"]) {
            operations.push(PatchOperation::MoveWidget {
                widget_id: "practice_queue".into(),
                zone: Zone::Content,
            });
            operations.push(PatchOperation::MoveWidget {
                widget_id: "learning_path".into(),
                zone: Zone::Sidebar,
            });
        }

        if structural_mode(context.mode) {
            if wants_red_buttons(&prompt) {
                operations.push(PatchOperation::SetThemeTokens {
                    tokens: red_accent_tokens(),
                });
            }

            if mentions(&prompt, &["weak topic"]) {
                operations.push(PatchOperation::AddWidgetFromTemplate {
                    template_id: "weak_topics_list".into(),
                    widget_id: "weak_topics_list_1".into(),
                    zone: Zone::Sidebar,
                    title: Some("Weak Topics".into()),
                    capability_id: None,
                    props: None,
                });
            }

            if mentions(&prompt, &["quick actions"]) {
                operations.push(PatchOperation::AddWidgetFromTemplate {
                    template_id: "quick_actions".into(),
                    widget_id: "quick_actions_1".into(),
                    zone: Zone::Header,
                    title: None,
                    capability_id: None,
                    props: None,
                });
            }

            if mentions(&prompt, &["practice section"]) {
                let mut layout = ValueMap::new();
                layout.insert("columns".into(), Value::Int(2));
                operations.push(PatchOperation::ComposeSection {
                    section_id: "practice_focus".into(),
                    zone: Zone::Content,
                    section_title: Some("Practice Focus".into()),
                    child_widget_ids: vec!["practice_queue".into(), "mastery_trend".into()],
                    section_layout: layout,
                });
            }
        }

        let mut warnings = Vec::new();
        if operations.is_empty() {
            warnings.push(
                "No known commands detected. Try: minimal, compact, hide sidebar, weak topics, practice section."
                    .to_string(),
            );
        }
        Ok(Proposal {
            output: operations,
            warnings,
        })
    }
}

/// Hands back a fixed list of operations, e.g. ones read from a file.
#[derive(Debug, Clone, Default)]
pub struct ProvidedOperations(pub Vec<PatchOperation>);

impl PatchProducer for ProvidedOperations {
    fn propose_operations(
        &self,
        _prompt: &str,
        _context: &ProducerContext<'_>,
    ) -> Result<Proposal<Vec<PatchOperation>>, ProducerError> {
        Ok(Proposal {
            output: self.0.clone(),
            warnings: Vec::new(),
        })
    }
}

/// Keyword-driven document producer. Edits a copy of the current document.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleBasedDocumentProducer;

impl DocumentProducer for RuleBasedDocumentProducer {
    fn propose_document(
        &self,
        prompt: &str,
        context: &ProducerContext<'_>,
    ) -> Result<Proposal<Document>, ProducerError> {
        let prompt = prompt.trim().to_lowercase();
        let mut document = context.document.clone();
        let mut changed = false;

        for profile in wants_profile(&prompt) {
            document.theme.profile = profile;
            changed = true;
        }
        for density in wants_density(&prompt) {
            document.theme.density = density;
            changed = true;
        }
        if wants_red_buttons(&prompt) {
            document.theme.tokens.extend(red_accent_tokens());
            changed = true;
        }

        if structural_mode(context.mode) {
            if mentions(&prompt, &["weak topic"]) {
                changed |= add_weak_topics(&mut document);
            }
            if mentions(&prompt, &["practice section"]) {
                changed |= add_practice_section(&mut document);
            }
            if mentions(&prompt, &["practice focus", "more practice"]) {
                changed |= move_practice_to_content(&mut document);
            }
        }

        let mut warnings = Vec::new();
        if !changed {
            warnings.push(
                "No known commands detected. Try: minimal, compact, weak topics, practice section.".to_string(),
            );
        }
        if context.mode == Mode::Safe {
            warnings.push("Safe mode keeps the surface structure unchanged.".to_string());
        }
        Ok(Proposal {
            output: document,
            warnings,
        })
    }
}

fn region_mut<'d>(document: &'d mut Document, zone: Zone) -> Option<&'d mut Node> {
    document.nodes.iter_mut().find(|node| {
        node.node_type == REGION_NODE_TYPE && node.props.get("zone").and_then(Value::as_str) == Some(zone.as_str())
    })
}

fn attach(document: &mut Document, zone: Zone, child: &str) -> bool {
    match region_mut(document, zone) {
        Some(region) if !region.children.iter().any(|id| id == child) => {
            region.children.push(child.to_string());
            true
        }
        _ => false,
    }
}

fn add_weak_topics(document: &mut Document) -> bool {
    const ID: &str = "weak_topics_list_1";
    if document.node(ID).is_some() {
        return false;
    }
    document.nodes.push(
        Node::new(ID, "lms.weak_topics_list")
            .with_prop("title", "Weak Topics")
            .with_prop("zone", Zone::Sidebar.as_str())
            .with_prop("capability_id", "math.weak_topics"),
    );
    attach(document, Zone::Sidebar, ID);
    true
}

fn add_practice_section(document: &mut Document) -> bool {
    const ID: &str = "practice_focus";
    let members = ["practice_queue", "mastery_trend"];
    if document.node(ID).is_some() || members.iter().any(|id| document.node(id).is_none()) {
        return false;
    }
    let mut section = Node::new(ID, SECTION_NODE_TYPE)
        .with_prop("title", "Practice Focus")
        .with_prop("zone", Zone::Content.as_str())
        .with_children(members);
    section.layout.insert("columns".into(), Value::Int(2));
    document.nodes.push(section);
    attach(document, Zone::Content, ID);
    true
}

fn move_practice_to_content(document: &mut Document) -> bool {
    const ID: &str = "practice_queue";
    let Some(node) = document.node_mut(ID) else {
        return false;
    };

    let mut changed = false;
    if node.props.get("zone").and_then(Value::as_str) != Some(Zone::Content.as_str()) {
        node.props.insert("zone".into(), Value::from(Zone::Content.as_str()));
        changed = true;
    }
    if let Some(sidebar) = region_mut(document, Zone::Sidebar) {
        let before = sidebar.children.len();
        sidebar.children.retain(|id| id != ID);
        changed |= sidebar.children.len() != before;
    }
    changed |= attach(document, Zone::Content, ID);
    changed
}
