use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The only document schema version this toolchain accepts.
pub const DSL_VERSION: &str = "dui-lang/1.0";

/// Ordered string-keyed map used for every schema-less area of a document.
pub type ValueMap = IndexMap<String, Value>;

/// Dynamic value for props, style, layout, a11y, state and params.
///
/// Serialized untagged, so a `Value` round-trips through plain JSON.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    Map(ValueMap),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&ValueMap> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Loose truthiness: empty strings, empty collections, zero, false and null are falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(n) => *n != 0,
            Value::Float(f) => *f != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::List(items) => !items.is_empty(),
            Value::Map(map) => !map.is_empty(),
        }
    }

    /// Render as text: strings verbatim, everything else as compact JSON.
    pub fn to_plain_string(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            other => serde_json::to_string(other).unwrap_or_default(),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::List(value)
    }
}

impl From<ValueMap> for Value {
    fn from(value: ValueMap) -> Self {
        Value::Map(value)
    }
}

/// Error returned when a string does not name a known enum member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown {} '{}'", self.kind, self.value)
    }
}

impl std::error::Error for UnknownVariant {}

/// Visual theme profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThemeProfile {
    #[default]
    Default,
    Minimal,
    LiquidGlass,
}

impl ThemeProfile {
    pub const ALL: [ThemeProfile; 3] = [
        ThemeProfile::Default,
        ThemeProfile::Minimal,
        ThemeProfile::LiquidGlass,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ThemeProfile::Default => "default",
            ThemeProfile::Minimal => "minimal",
            ThemeProfile::LiquidGlass => "liquid_glass",
        }
    }
}

impl FromStr for ThemeProfile {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|profile| profile.as_str() == s)
            .ok_or_else(|| UnknownVariant {
                kind: "theme profile",
                value: s.to_string(),
            })
    }
}

impl fmt::Display for ThemeProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Spacing density
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Density {
    #[default]
    Comfortable,
    Compact,
}

impl Density {
    pub const ALL: [Density; 2] = [Density::Comfortable, Density::Compact];

    pub fn as_str(&self) -> &'static str {
        match self {
            Density::Comfortable => "comfortable",
            Density::Compact => "compact",
        }
    }
}

impl FromStr for Density {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|density| density.as_str() == s)
            .ok_or_else(|| UnknownVariant {
                kind: "density",
                value: s.to_string(),
            })
    }
}

impl fmt::Display for Density {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Root document: one declarative surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default = "default_dsl_version")]
    pub dsl_version: String,
    pub surface: Surface,
    #[serde(default)]
    pub meta: Meta,
    #[serde(default)]
    pub theme: Theme,
    #[serde(default)]
    pub state: State,
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub bindings: Vec<Binding>,
    #[serde(default)]
    pub actions: Vec<Action>,
    #[serde(default)]
    pub layout_constraints: ValueMap,
}

fn default_dsl_version() -> String {
    DSL_VERSION.to_string()
}

impl Document {
    /// Empty document for `surface_id` with default meta and theme.
    pub fn new(surface_id: impl Into<String>) -> Self {
        Self {
            dsl_version: default_dsl_version(),
            surface: Surface::new(surface_id),
            meta: Meta::default(),
            theme: Theme::default(),
            state: State::default(),
            nodes: Vec::new(),
            bindings: Vec::new(),
            actions: Vec::new(),
            layout_constraints: ValueMap::new(),
        }
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|node| node.id == id)
    }
}

/// Surface identity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Surface {
    pub id: String,
    #[serde(default = "default_surface_title")]
    pub title: String,
    #[serde(default = "default_surface_route")]
    pub route: String,
}

fn default_surface_title() -> String {
    "Untitled Surface".to_string()
}

fn default_surface_route() -> String {
    "/".to_string()
}

impl Surface {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: default_surface_title(),
            route: default_surface_route(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meta {
    #[serde(default = "new_document_id")]
    pub document_id: String,
    #[serde(default = "default_revision")]
    pub revision: u64,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "default_created_by")]
    pub created_by: String,
}

/// Fresh `doc_<hex>` identifier.
pub fn new_document_id() -> String {
    format!("doc_{}", uuid::Uuid::new_v4().simple())
}

fn default_revision() -> u64 {
    1
}

fn default_created_by() -> String {
    "system".to_string()
}

impl Default for Meta {
    fn default() -> Self {
        Self {
            document_id: new_document_id(),
            revision: default_revision(),
            created_at: Utc::now(),
            created_by: default_created_by(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Theme {
    #[serde(default)]
    pub profile: ThemeProfile,
    #[serde(default)]
    pub density: Density,
    /// Explicit token overrides; values are expected to be non-empty strings.
    #[serde(default)]
    pub tokens: ValueMap,
}

/// Opaque local state bag
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct State {
    #[serde(default)]
    pub locals: ValueMap,
}

/// A node in the surface graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default)]
    pub props: ValueMap,
    #[serde(default)]
    pub style: ValueMap,
    #[serde(default)]
    pub layout: ValueMap,
    #[serde(default)]
    pub a11y: ValueMap,
    #[serde(default)]
    pub visible_when: Option<ValueMap>,
    #[serde(default)]
    pub enabled_when: Option<ValueMap>,
    #[serde(default)]
    pub children: Vec<String>,
    #[serde(default)]
    pub slots: IndexMap<String, Vec<String>>,
    /// Event name -> action id
    #[serde(default)]
    pub on: IndexMap<String, String>,
}

impl Node {
    pub fn new(id: impl Into<String>, node_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            node_type: node_type.into(),
            props: ValueMap::new(),
            style: ValueMap::new(),
            layout: ValueMap::new(),
            a11y: ValueMap::new(),
            visible_when: None,
            enabled_when: None,
            children: Vec::new(),
            slots: IndexMap::new(),
            on: IndexMap::new(),
        }
    }

    pub fn with_prop(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.props.insert(key.into(), value.into());
        self
    }

    pub fn with_children<I, S>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.children = children.into_iter().map(Into::into).collect();
        self
    }

    /// Child ids from `children` followed by every slot, in declaration order.
    pub fn child_refs(&self) -> impl Iterator<Item = &str> {
        self.children
            .iter()
            .chain(self.slots.values().flatten())
            .map(String::as_str)
    }
}

/// Data binding to a capability source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Binding {
    pub id: String,
    #[serde(default)]
    pub source: String,
    #[serde(default = "default_select")]
    pub select: String,
    #[serde(default)]
    pub args: ValueMap,
    #[serde(default)]
    pub cache: ValueMap,
}

fn default_select() -> String {
    "$".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub id: String,
    #[serde(rename = "type", default)]
    pub action_type: String,
    #[serde(default)]
    pub params: ValueMap,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_json_is_untagged() {
        let json = r#"{"a": 1, "b": 1.5, "c": "x", "d": [true, null], "e": {}}"#;
        let value: Value = serde_json::from_str(json).unwrap();
        let map = value.as_map().unwrap();
        assert_eq!(map["a"], Value::Int(1));
        assert_eq!(map["b"], Value::Float(1.5));
        assert_eq!(map["c"], Value::from("x"));
        assert_eq!(map["d"], Value::List(vec![Value::Bool(true), Value::Null]));
        assert_eq!(map["e"], Value::Map(ValueMap::new()));

        let keys: Vec<_> = map.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn test_truthiness() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::from("").is_truthy());
        assert!(!Value::Int(0).is_truthy());
        assert!(Value::from("x").is_truthy());
        assert!(Value::Bool(true).is_truthy());
    }

    #[test]
    fn test_enum_names() {
        assert_eq!("liquid_glass".parse::<ThemeProfile>(), Ok(ThemeProfile::LiquidGlass));
        assert_eq!(Density::Compact.to_string(), "compact");
        assert!("huge".parse::<Density>().is_err());
        assert_eq!(
            serde_json::to_string(&ThemeProfile::LiquidGlass).unwrap(),
            "\"liquid_glass\""
        );
    }

    #[test]
    fn test_document_defaults_from_json() {
        let doc: Document = serde_json::from_str(r#"{"surface": {"id": "s1"}}"#).unwrap();
        assert_eq!(doc.dsl_version, DSL_VERSION);
        assert_eq!(doc.surface.title, "Untitled Surface");
        assert_eq!(doc.surface.route, "/");
        assert_eq!(doc.meta.revision, 1);
        assert_eq!(doc.meta.created_by, "system");
        assert!(doc.meta.document_id.starts_with("doc_"));
    }

    #[test]
    fn test_child_refs_include_slots() {
        let mut node = Node::new("page", "layout.page").with_children(["a", "b"]);
        node.slots.insert("aside".to_string(), vec!["c".to_string()]);
        let refs: Vec<_> = node.child_refs().collect();
        assert_eq!(refs, vec!["a", "b", "c"]);
    }
}
