use crate::ast::*;
use std::fmt::Write;

/// Serializer converts a document back to dui-lang source
///
/// Output is canonical: fixed section order, one entry per line, strings
/// always quoted. Parsing the output yields an equal document except for
/// `meta.created_at`, which the language does not carry.
pub struct Serializer {
    indent_level: usize,
    indent_string: String,
}

impl Serializer {
    pub fn new() -> Self {
        Self {
            indent_level: 0,
            indent_string: "  ".to_string(),
        }
    }

    pub fn with_indent(indent: &str) -> Self {
        Self {
            indent_level: 0,
            indent_string: indent.to_string(),
        }
    }

    /// Serialize a Document to source code
    pub fn serialize(&mut self, doc: &Document) -> String {
        let mut output = String::new();

        let _ = writeln!(output, "surface {} {{", word(&doc.surface.id));
        self.indent_level += 1;

        self.write_line(&mut output, "surface_meta {");
        self.indent_level += 1;
        self.write_entry(&mut output, "title", &Value::from(doc.surface.title.as_str()));
        self.write_entry(&mut output, "route", &Value::from(doc.surface.route.as_str()));
        self.indent_level -= 1;
        self.write_line(&mut output, "}");

        self.write_line(&mut output, "meta {");
        self.indent_level += 1;
        self.write_entry(
            &mut output,
            "document_id",
            &Value::from(doc.meta.document_id.as_str()),
        );
        self.write_line(&mut output, &format!("revision: {}", doc.meta.revision));
        self.write_entry(
            &mut output,
            "created_by",
            &Value::from(doc.meta.created_by.as_str()),
        );
        self.indent_level -= 1;
        self.write_line(&mut output, "}");

        self.write_line(&mut output, "theme {");
        self.indent_level += 1;
        self.write_line(&mut output, &format!("profile: {}", doc.theme.profile));
        self.write_line(&mut output, &format!("density: {}", doc.theme.density));
        if !doc.theme.tokens.is_empty() {
            self.write_block(&mut output, "tokens", &doc.theme.tokens);
        }
        self.indent_level -= 1;
        self.write_line(&mut output, "}");

        if !doc.state.locals.is_empty() {
            self.write_block(&mut output, "state", &doc.state.locals);
        }
        if !doc.layout_constraints.is_empty() {
            self.write_block(&mut output, "layout_constraints", &doc.layout_constraints);
        }

        for node in &doc.nodes {
            self.serialize_node(node, &mut output);
        }
        for binding in &doc.bindings {
            self.serialize_binding(binding, &mut output);
        }
        for action in &doc.actions {
            self.serialize_action(action, &mut output);
        }

        self.indent_level -= 1;
        output.push_str("}\n");
        output
    }

    fn serialize_node(&mut self, node: &Node, output: &mut String) {
        self.write_line(
            output,
            &format!("node {}: {} {{", word(&node.id), word(&node.node_type)),
        );
        self.indent_level += 1;

        for (key, map) in [
            ("props", &node.props),
            ("style", &node.style),
            ("layout", &node.layout),
            ("a11y", &node.a11y),
        ] {
            if !map.is_empty() {
                self.write_block(output, key, map);
            }
        }
        if let Some(visible_when) = &node.visible_when {
            self.write_block(output, "visible_when", visible_when);
        }
        if let Some(enabled_when) = &node.enabled_when {
            self.write_block(output, "enabled_when", enabled_when);
        }
        if !node.children.is_empty() {
            self.write_line(output, &format!("children: {}", id_list(&node.children)));
        }
        if !node.slots.is_empty() {
            self.write_line(output, "slots {");
            self.indent_level += 1;
            for (slot, ids) in &node.slots {
                self.write_line(output, &format!("{}: {}", key(slot), id_list(ids)));
            }
            self.indent_level -= 1;
            self.write_line(output, "}");
        }
        if !node.on.is_empty() {
            self.write_line(output, "on {");
            self.indent_level += 1;
            for (event, action) in &node.on {
                self.write_line(output, &format!("{}: {}", key(event), word(action)));
            }
            self.indent_level -= 1;
            self.write_line(output, "}");
        }

        self.indent_level -= 1;
        self.write_line(output, "}");
    }

    fn serialize_binding(&mut self, binding: &Binding, output: &mut String) {
        self.write_line(output, &format!("binding {} {{", word(&binding.id)));
        self.indent_level += 1;
        self.write_entry(output, "source", &Value::from(binding.source.as_str()));
        self.write_entry(output, "select", &Value::from(binding.select.as_str()));
        if !binding.args.is_empty() {
            self.write_block(output, "args", &binding.args);
        }
        if !binding.cache.is_empty() {
            self.write_block(output, "cache", &binding.cache);
        }
        self.indent_level -= 1;
        self.write_line(output, "}");
    }

    fn serialize_action(&mut self, action: &Action, output: &mut String) {
        self.write_line(output, &format!("action {} {{", word(&action.id)));
        self.indent_level += 1;
        self.write_entry(output, "type", &Value::from(action.action_type.as_str()));
        if !action.params.is_empty() {
            self.write_block(output, "params", &action.params);
        }
        self.indent_level -= 1;
        self.write_line(output, "}");
    }

    /// `name { entries }` spread over several lines
    fn write_block(&mut self, output: &mut String, name: &str, map: &ValueMap) {
        self.write_line(output, &format!("{} {{", key(name)));
        self.indent_level += 1;
        for (k, v) in map {
            self.write_entry(output, k, v);
        }
        self.indent_level -= 1;
        self.write_line(output, "}");
    }

    fn write_entry(&mut self, output: &mut String, name: &str, value: &Value) {
        match value {
            Value::Map(map) => self.write_block(output, name, map),
            other => self.write_line(output, &format!("{}: {}", key(name), inline_value(other))),
        }
    }

    fn write_line(&self, output: &mut String, line: &str) {
        self.write_indent(output);
        output.push_str(line);
        output.push('\n');
    }

    fn write_indent(&self, output: &mut String) {
        for _ in 0..self.indent_level {
            output.push_str(&self.indent_string);
        }
    }
}

impl Default for Serializer {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience function to serialize a document
pub fn serialize(doc: &Document) -> String {
    let mut serializer = Serializer::new();
    serializer.serialize(doc)
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
}

fn quoted(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| format!("\"{}\"", s))
}

/// Object keys: bare when the lexer reads them back as one identifier.
fn key(s: &str) -> String {
    if is_identifier(s) {
        s.to_string()
    } else {
        quoted(s)
    }
}

/// Ids and type names: like keys, but keywords that would parse as scalars are quoted.
fn word(s: &str) -> String {
    if is_identifier(s) && !matches!(s, "true" | "false" | "null") {
        s.to_string()
    } else {
        quoted(s)
    }
}

fn id_list(ids: &[String]) -> String {
    let items: Vec<String> = ids.iter().map(|id| word(id)).collect();
    format!("[{}]", items.join(", "))
}

fn inline_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Int(n) => n.to_string(),
        Value::Float(f) if f.is_finite() => {
            let text = f.to_string();
            if text.contains('.') {
                text
            } else {
                format!("{}.0", text)
            }
        }
        Value::Float(_) => "null".to_string(),
        Value::String(s) => quoted(s),
        Value::List(items) => {
            let items: Vec<String> = items.iter().map(inline_value).collect();
            format!("[{}]", items.join(", "))
        }
        Value::Map(map) => {
            let entries: Vec<String> = map
                .iter()
                .map(|(k, v)| format!("{}: {}", key(k), inline_value(v)))
                .collect();
            format!("{{ {} }}", entries.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;

    const SOURCE: &str = r##"
surface "math_lms.dashboard" {
  surface_meta { title: "Math Dashboard", route: "/dashboard" }
  meta { document_id: doc_1, revision: 3, created_by: "tester" }
  theme { profile: minimal, density: compact, tokens { accent: "#dc2626" } }
  state { tab: "overview", filters { level: 2, ratio: 0.5, tags: [a, { b: null }] } }
  layout_constraints { max_columns: 2 }
  node root: layout.page { children: [main_content] }
  node main_content: layout.region { zone: content, children: [kpi_a], slots { aside: [] } }
  node kpi_a: data.kpi_card {
    title: "It's \"quoted\""
    protected: true
    weight: 3.0
    on { click: open_lesson }
    enabled_when { online: true }
  }
  binding progress { source: "capability:math.progress", args { days: 7 } }
  action open_lesson { type: nav.open_route, params { route: "/lesson" } }
}
"##;

    #[test]
    fn test_serialize_reparses_to_same_document() {
        let doc = parse(SOURCE).unwrap();
        let text = serialize(&doc);
        let mut reparsed = parse(&text).unwrap();
        reparsed.meta.created_at = doc.meta.created_at;
        assert_eq!(reparsed, doc);
    }

    #[test]
    fn test_floats_keep_decimal_point() {
        assert_eq!(inline_value(&Value::Float(3.0)), "3.0");
        assert_eq!(inline_value(&Value::Float(-0.25)), "-0.25");
        assert_eq!(inline_value(&Value::Int(3)), "3");
    }

    #[test]
    fn test_keyword_like_ids_are_quoted() {
        assert_eq!(word("null"), "\"null\"");
        assert_eq!(word("data.kpi_card"), "data.kpi_card");
        assert_eq!(key("has space"), "\"has space\"");
    }

    #[test]
    fn test_custom_indent() {
        let doc = parse("surface s { }").unwrap();
        let text = Serializer::with_indent("\t").serialize(&doc);
        assert!(text.starts_with("surface s {\n\tsurface_meta {\n"));
        assert!(text.ends_with("}\n"));
    }
}
