use chrono::{DateTime, Utc};
use dui_parser::{Density, ThemeProfile, UnknownVariant, ValueMap};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const MANIFEST_SCHEMA_VERSION: u32 = 1;

/// Layout region a widget or section lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Zone {
    Header,
    Sidebar,
    Content,
    Footer,
}

impl Zone {
    pub const ALL: [Zone; 4] = [Zone::Header, Zone::Sidebar, Zone::Content, Zone::Footer];

    /// Order regions are laid out on a page.
    pub const PAGE_ORDER: [Zone; 4] = [Zone::Header, Zone::Content, Zone::Sidebar, Zone::Footer];

    pub fn as_str(&self) -> &'static str {
        match self {
            Zone::Header => "header",
            Zone::Sidebar => "sidebar",
            Zone::Content => "content",
            Zone::Footer => "footer",
        }
    }

    /// Capitalized name, e.g. `Sidebar`.
    pub fn label(&self) -> &'static str {
        match self {
            Zone::Header => "Header",
            Zone::Sidebar => "Sidebar",
            Zone::Content => "Content",
            Zone::Footer => "Footer",
        }
    }
}

impl FromStr for Zone {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|zone| zone.as_str() == s)
            .ok_or_else(|| UnknownVariant {
                kind: "zone",
                value: s.to_string(),
            })
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WidgetKind {
    Kpi,
    Table,
    Activity,
    Chart,
    Card,
    List,
    Panel,
    Tabs,
    Form,
}

impl WidgetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WidgetKind::Kpi => "kpi",
            WidgetKind::Table => "table",
            WidgetKind::Activity => "activity",
            WidgetKind::Chart => "chart",
            WidgetKind::Card => "card",
            WidgetKind::List => "list",
            WidgetKind::Panel => "panel",
            WidgetKind::Tabs => "tabs",
            WidgetKind::Form => "form",
        }
    }
}

impl fmt::Display for WidgetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ThemeConfig {
    #[serde(default)]
    pub profile: ThemeProfile,
    #[serde(default)]
    pub density: Density,
    #[serde(default)]
    pub tokens: IndexMap<String, String>,
}

/// Renderable unit of a manifest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Widget {
    pub id: String,
    pub title: String,
    pub kind: WidgetKind,
    pub zone: Zone,
    pub capability_id: String,
    #[serde(default)]
    pub protected: bool,
    #[serde(default)]
    pub template_id: Option<String>,
    #[serde(default)]
    pub props: ValueMap,
}

/// Ordered grouping of widgets within one zone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub id: String,
    pub title: String,
    pub zone: Zone,
    #[serde(default)]
    pub child_widget_ids: Vec<String>,
    #[serde(default)]
    pub layout: ValueMap,
}

fn default_schema_version() -> u32 {
    MANIFEST_SCHEMA_VERSION
}

/// Compiled, renderer-facing form of a surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub manifest_id: String,
    pub revision: u64,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    pub theme: ThemeConfig,
    pub widgets: Vec<Widget>,
    #[serde(default)]
    pub sections: Vec<Section>,
    #[serde(default)]
    pub layout_constraints: ValueMap,
    #[serde(default)]
    pub metadata: IndexMap<String, String>,
}

impl Manifest {
    pub fn widget(&self, id: &str) -> Option<&Widget> {
        self.widgets.iter().find(|widget| widget.id == id)
    }

    pub fn widget_mut(&mut self, id: &str) -> Option<&mut Widget> {
        self.widgets.iter_mut().find(|widget| widget.id == id)
    }

    pub fn section(&self, id: &str) -> Option<&Section> {
        self.sections.iter().find(|section| section.id == id)
    }

    pub fn zone_population(&self, zone: Zone) -> usize {
        self.widgets.iter().filter(|widget| widget.zone == zone).count()
    }
}

/// Fresh manifest identifier.
pub fn new_manifest_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_json_defaults() {
        let json = r#"{
            "manifest_id": "m1",
            "revision": 2,
            "theme": {"profile": "minimal"},
            "widgets": [{
                "id": "w1", "title": "W", "kind": "kpi",
                "zone": "header", "capability_id": "math.x"
            }]
        }"#;
        let manifest: Manifest = serde_json::from_str(json).unwrap();
        assert_eq!(manifest.schema_version, 1);
        assert_eq!(manifest.theme.profile, ThemeProfile::Minimal);
        assert_eq!(manifest.theme.density, Density::Comfortable);
        assert!(!manifest.widgets[0].protected);
        assert_eq!(manifest.widgets[0].template_id, None);
        assert!(manifest.sections.is_empty());
    }

    #[test]
    fn test_zone_names() {
        assert_eq!("sidebar".parse::<Zone>(), Ok(Zone::Sidebar));
        assert!("middle".parse::<Zone>().is_err());
        assert_eq!(Zone::Footer.label(), "Footer");
        assert_eq!(serde_json::to_string(&WidgetKind::Activity).unwrap(), "\"activity\"");
    }
}
