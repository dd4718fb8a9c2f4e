use crate::ast::*;
use crate::error::{Location, ParseError, ParseResult};
use crate::tokenizer::{decode_string, tokenize, SpannedToken, Token};

/// Keys a node block understands; anything else is folded into `props`.
const NODE_KEYS: &[&str] = &[
    "props",
    "style",
    "layout",
    "a11y",
    "children",
    "slots",
    "on",
    "visibleWhen",
    "visible_when",
    "enabledWhen",
    "enabled_when",
];

/// Parser for dui-lang
pub struct Parser<'src> {
    tokens: Vec<SpannedToken<'src>>,
    eof: Location,
    pos: usize,
}

impl<'src> Parser<'src> {
    pub fn new(source: &'src str) -> ParseResult<Self> {
        let stream = tokenize(source)?;
        Ok(Self {
            tokens: stream.tokens,
            eof: stream.eof,
            pos: 0,
        })
    }

    /// Parse a complete document: one `surface` block followed by end of input
    pub fn parse_document(&mut self) -> ParseResult<Document> {
        self.expect_keyword("surface")?;
        let surface_id = self.parse_identifier_like()?;
        self.expect(Token::LBrace)?;

        let mut doc = Document::new(surface_id);

        while !self.check(Token::RBrace) {
            let (keyword, location) = match self.peek() {
                Some(SpannedToken {
                    token: Token::Ident(keyword),
                    location,
                }) => (*keyword, location.clone()),
                Some(other) => {
                    return Err(ParseError::unexpected_token(
                        other.location.clone(),
                        "section keyword",
                        other.token.to_string(),
                    ))
                }
                None => return Err(ParseError::unexpected_eof(self.eof.clone(), "'}'")),
            };

            match keyword {
                "meta" => self.parse_meta(&mut doc.meta)?,
                "theme" => doc.theme = self.parse_theme()?,
                "state" => {
                    self.advance();
                    doc.state = State {
                        locals: self.parse_object()?,
                    };
                }
                "surface_meta" => {
                    self.advance();
                    let payload = self.parse_object()?;
                    if let Some(title) = payload.get("title").and_then(Value::as_str) {
                        doc.surface.title = title.to_string();
                    }
                    if let Some(route) = payload.get("route").and_then(Value::as_str) {
                        doc.surface.route = route.to_string();
                    }
                }
                "layout_constraints" => {
                    self.advance();
                    doc.layout_constraints = self.parse_object()?;
                }
                "node" => doc.nodes.push(self.parse_node()?),
                "binding" => doc.bindings.push(self.parse_binding()?),
                "action" => doc.actions.push(self.parse_action()?),
                other => {
                    return Err(ParseError::invalid_syntax(
                        location,
                        format!("Unknown top-level section '{}'", other),
                    ))
                }
            }
        }

        self.expect(Token::RBrace)?;

        if let Some(extra) = self.peek() {
            return Err(ParseError::unexpected_token(
                extra.location.clone(),
                "end of input",
                extra.token.to_string(),
            ));
        }

        Ok(doc)
    }

    fn parse_meta(&mut self, meta: &mut Meta) -> ParseResult<()> {
        let location = self.expect_keyword("meta")?;
        let payload = self.parse_object()?;

        if let Some(document_id) = payload.get("document_id") {
            meta.document_id = document_id.to_plain_string();
        }
        if let Some(revision) = payload.get("revision") {
            meta.revision = revision
                .as_i64()
                .and_then(|n| u64::try_from(n).ok())
                .ok_or_else(|| {
                    ParseError::invalid_syntax(
                        location.clone(),
                        "meta revision must be a non-negative integer",
                    )
                })?;
        }
        if let Some(created_by) = payload.get("created_by") {
            meta.created_by = created_by.to_plain_string();
        }
        Ok(())
    }

    fn parse_theme(&mut self) -> ParseResult<Theme> {
        let location = self.expect_keyword("theme")?;
        let payload = self.parse_object()?;

        let profile = match payload.get("profile") {
            None => ThemeProfile::default(),
            Some(value) => value
                .to_plain_string()
                .parse::<ThemeProfile>()
                .map_err(|e| ParseError::invalid_syntax(location.clone(), e.to_string()))?,
        };
        let density = match payload.get("density") {
            None => Density::default(),
            Some(value) => value
                .to_plain_string()
                .parse::<Density>()
                .map_err(|e| ParseError::invalid_syntax(location.clone(), e.to_string()))?,
        };

        Ok(Theme {
            profile,
            density,
            tokens: map_or_empty(payload.get("tokens")),
        })
    }

    /// `node <id>: <type> { ... }`
    fn parse_node(&mut self) -> ParseResult<Node> {
        let location = self.expect_keyword("node")?;
        let id = self.parse_identifier_like()?;
        self.expect(Token::Colon)?;
        let node_type = self.parse_identifier_like()?;
        let payload = self.parse_object()?;

        let mut node = Node::new(id, node_type);
        node.props = map_or_empty(payload.get("props"));
        node.style = map_or_empty(payload.get("style"));
        node.layout = map_or_empty(payload.get("layout"));
        node.a11y = map_or_empty(payload.get("a11y"));
        node.visible_when = payload
            .get("visibleWhen")
            .or_else(|| payload.get("visible_when"))
            .and_then(Value::as_map)
            .cloned();
        node.enabled_when = payload
            .get("enabledWhen")
            .or_else(|| payload.get("enabled_when"))
            .and_then(Value::as_map)
            .cloned();

        if let Some(Value::List(children)) = payload.get("children") {
            node.children = string_list(children).ok_or_else(|| {
                ParseError::invalid_syntax(
                    location.clone(),
                    format!("Node '{}' children must be identifiers or strings", node.id),
                )
            })?;
        }

        if let Some(Value::Map(slots)) = payload.get("slots") {
            for (slot, entries) in slots {
                let ids = entries.as_list().and_then(string_list).ok_or_else(|| {
                    ParseError::invalid_syntax(
                        location.clone(),
                        format!("Node '{}' slot '{}' must be a list of ids", node.id, slot),
                    )
                })?;
                node.slots.insert(slot.clone(), ids);
            }
        }

        if let Some(Value::Map(handlers)) = payload.get("on") {
            for (event, target) in handlers {
                let action = target.as_str().ok_or_else(|| {
                    ParseError::invalid_syntax(
                        location.clone(),
                        format!("Node '{}' handler '{}' must name an action", node.id, event),
                    )
                })?;
                node.on.insert(event.clone(), action.to_string());
            }
        }

        for (key, value) in payload {
            if NODE_KEYS.contains(&key.as_str()) {
                continue;
            }
            node.props.entry(key).or_insert(value);
        }

        Ok(node)
    }

    fn parse_binding(&mut self) -> ParseResult<Binding> {
        self.expect_keyword("binding")?;
        let id = self.parse_identifier_like()?;
        let payload = self.parse_object()?;

        Ok(Binding {
            id,
            source: payload
                .get("source")
                .map(Value::to_plain_string)
                .unwrap_or_default(),
            select: payload
                .get("select")
                .map(Value::to_plain_string)
                .unwrap_or_else(|| "$".to_string()),
            args: map_or_empty(payload.get("args")),
            cache: map_or_empty(payload.get("cache")),
        })
    }

    fn parse_action(&mut self) -> ParseResult<Action> {
        self.expect_keyword("action")?;
        let id = self.parse_identifier_like()?;
        let payload = self.parse_object()?;

        Ok(Action {
            id,
            action_type: payload
                .get("type")
                .map(Value::to_plain_string)
                .unwrap_or_default(),
            params: map_or_empty(payload.get("params")),
        })
    }

    fn parse_value(&mut self) -> ParseResult<Value> {
        match self.peek().map(|t| &t.token) {
            Some(Token::LBrace) => Ok(Value::Map(self.parse_object()?)),
            Some(Token::LBracket) => self.parse_array(),
            _ => self.parse_scalar(),
        }
    }

    fn parse_scalar(&mut self) -> ParseResult<Value> {
        let Some(current) = self.peek().cloned() else {
            return Err(ParseError::unexpected_eof(self.eof.clone(), "value"));
        };

        let value = match current.token {
            Token::DoubleQuoted(raw) | Token::SingleQuoted(raw) => Value::String(
                decode_string(raw)
                    .map_err(|msg| ParseError::invalid_syntax(current.location.clone(), msg))?,
            ),
            Token::Number(raw) => {
                let parsed = if raw.contains('.') {
                    raw.parse::<f64>().map(Value::Float).ok()
                } else {
                    raw.parse::<i64>().map(Value::Int).ok()
                };
                parsed.ok_or_else(|| {
                    ParseError::invalid_syntax(
                        current.location.clone(),
                        format!("Number '{}' is out of range", raw),
                    )
                })?
            }
            Token::Ident("true") => Value::Bool(true),
            Token::Ident("false") => Value::Bool(false),
            Token::Ident("null") => Value::Null,
            Token::Ident(word) => Value::String(word.to_string()),
            other => {
                return Err(ParseError::unexpected_token(
                    current.location,
                    "scalar value",
                    other.to_string(),
                ))
            }
        };

        self.advance();
        Ok(value)
    }

    fn parse_array(&mut self) -> ParseResult<Value> {
        self.expect(Token::LBracket)?;
        let mut items = Vec::new();
        while !self.check(Token::RBracket) {
            if self.is_at_end() {
                return Err(ParseError::unexpected_eof(self.eof.clone(), "']'"));
            }
            items.push(self.parse_value()?);
            self.match_token(Token::Comma);
        }
        self.expect(Token::RBracket)?;
        Ok(Value::List(items))
    }

    /// `{ key: value, key { ... }, key [ ... ] }` with optional commas
    fn parse_object(&mut self) -> ParseResult<ValueMap> {
        self.expect(Token::LBrace)?;
        let mut map = ValueMap::new();
        while !self.check(Token::RBrace) {
            if self.is_at_end() {
                return Err(ParseError::unexpected_eof(self.eof.clone(), "'}'"));
            }
            let key = self.parse_identifier_like()?;
            let value = if self.match_token(Token::Colon) {
                self.parse_value()?
            } else if self.check(Token::LBrace) || self.check(Token::LBracket) {
                self.parse_value()?
            } else {
                return Err(ParseError::invalid_syntax(
                    self.peek_location(),
                    "Expected ':' or value block",
                ));
            };
            map.insert(key, value);
            self.match_token(Token::Comma);
        }
        self.expect(Token::RBrace)?;
        Ok(map)
    }

    fn parse_identifier_like(&mut self) -> ParseResult<String> {
        match self.peek().cloned() {
            Some(SpannedToken {
                token: Token::Ident(word),
                ..
            }) => {
                self.advance();
                Ok(word.to_string())
            }
            Some(SpannedToken {
                token: Token::DoubleQuoted(raw) | Token::SingleQuoted(raw),
                location,
            }) => {
                self.advance();
                decode_string(raw).map_err(|msg| ParseError::invalid_syntax(location, msg))
            }
            Some(other) => Err(ParseError::unexpected_token(
                other.location,
                "identifier or string",
                other.token.to_string(),
            )),
            None => Err(ParseError::unexpected_eof(
                self.eof.clone(),
                "identifier or string",
            )),
        }
    }

    // Helper methods

    fn peek(&self) -> Option<&SpannedToken<'src>> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<&SpannedToken<'src>> {
        let token = self.tokens.get(self.pos);
        self.pos += 1;
        token
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn check(&self, token: Token) -> bool {
        match self.peek() {
            Some(t) => std::mem::discriminant(&t.token) == std::mem::discriminant(&token),
            None => false,
        }
    }

    fn match_token(&mut self, token: Token) -> bool {
        if self.check(token) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: Token) -> ParseResult<()> {
        if self.check(token.clone()) {
            self.advance();
            return Ok(());
        }
        match self.peek() {
            Some(found) => Err(ParseError::unexpected_token(
                found.location.clone(),
                token.to_string(),
                found.token.to_string(),
            )),
            None => Err(ParseError::unexpected_eof(self.eof.clone(), token.to_string())),
        }
    }

    /// Consume a specific bare word and return where it was.
    fn expect_keyword(&mut self, keyword: &str) -> ParseResult<Location> {
        match self.peek() {
            Some(SpannedToken {
                token: Token::Ident(word),
                location,
            }) if *word == keyword => {
                let location = location.clone();
                self.advance();
                Ok(location)
            }
            Some(found) => Err(ParseError::unexpected_token(
                found.location.clone(),
                format!("'{}'", keyword),
                found.token.to_string(),
            )),
            None => Err(ParseError::unexpected_eof(
                self.eof.clone(),
                format!("'{}'", keyword),
            )),
        }
    }

    fn peek_location(&self) -> Location {
        self.peek()
            .map(|t| t.location.clone())
            .unwrap_or_else(|| self.eof.clone())
    }
}

fn map_or_empty(value: Option<&Value>) -> ValueMap {
    value.and_then(Value::as_map).cloned().unwrap_or_default()
}

fn string_list(items: &[Value]) -> Option<Vec<String>> {
    items
        .iter()
        .map(|item| item.as_str().map(str::to_string))
        .collect()
}

/// Parse dui-lang source into a document
pub fn parse(source: &str) -> ParseResult<Document> {
    let mut parser = Parser::new(source)?;
    parser.parse_document()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_surface() {
        let doc = parse("surface s1 { }").unwrap();
        assert_eq!(doc.surface.id, "s1");
        assert_eq!(doc.dsl_version, DSL_VERSION);
        assert!(doc.nodes.is_empty());
        assert_eq!(doc.meta.revision, 1);
    }

    #[test]
    fn test_objects_need_no_commas() {
        let doc = parse(
            r##"surface s { theme { profile: minimal density: compact tokens { accent: "#111111" } } }"##,
        )
        .unwrap();
        assert_eq!(doc.theme.profile, ThemeProfile::Minimal);
        assert_eq!(doc.theme.density, Density::Compact);
        assert_eq!(doc.theme.tokens["accent"], Value::from("#111111"));
    }

    #[test]
    fn test_scalars() {
        let doc = parse(
            "surface s { state { a: 1, b: 1.0, c: true, d: null, e: word, f: 'q', g: [1, 2,] } }",
        )
        .unwrap();
        let locals = &doc.state.locals;
        assert_eq!(locals["a"], Value::Int(1));
        assert_eq!(locals["b"], Value::Float(1.0));
        assert_eq!(locals["c"], Value::Bool(true));
        assert_eq!(locals["d"], Value::Null);
        assert_eq!(locals["e"], Value::from("word"));
        assert_eq!(locals["f"], Value::from("q"));
        assert_eq!(
            locals["g"],
            Value::List(vec![Value::Int(1), Value::Int(2)])
        );
    }

    #[test]
    fn test_node_unknown_keys_fold_into_props() {
        let doc = parse(
            r#"surface s {
                node card_1: layout.card {
                    title: "Outer"
                    zone: header
                    props { title: "Inner" }
                    children: [a_node, "b_node"]
                    on { click: open_it }
                    visibleWhen { flag: true }
                }
            }"#,
        )
        .unwrap();
        let node = &doc.nodes[0];
        assert_eq!(node.node_type, "layout.card");
        assert_eq!(node.props["title"], Value::from("Inner"));
        assert_eq!(node.props["zone"], Value::from("header"));
        assert_eq!(node.children, vec!["a_node", "b_node"]);
        assert_eq!(node.on["click"], "open_it");
        assert!(node.visible_when.is_some());
        assert!(node.enabled_when.is_none());
    }

    #[test]
    fn test_meta_merges_and_surface_meta() {
        let doc = parse(
            r#"surface s {
                meta { document_id: doc_a, revision: 4 }
                meta { created_by: "alice" }
                surface_meta { title: "Home", route: "/home" }
            }"#,
        )
        .unwrap();
        assert_eq!(doc.meta.document_id, "doc_a");
        assert_eq!(doc.meta.revision, 4);
        assert_eq!(doc.meta.created_by, "alice");
        assert_eq!(doc.surface.title, "Home");
        assert_eq!(doc.surface.route, "/home");
    }

    #[test]
    fn test_binding_and_action_defaults() {
        let doc = parse("surface s { binding b1 { } action a1 { params { x: 1 } } }").unwrap();
        assert_eq!(doc.bindings[0].source, "");
        assert_eq!(doc.bindings[0].select, "$");
        assert_eq!(doc.actions[0].action_type, "");
        assert_eq!(doc.actions[0].params["x"], Value::Int(1));
    }

    #[test]
    fn test_unknown_section_reports_position() {
        let err = parse("surface s {\n  widget x {}\n}").unwrap_err();
        assert_eq!((err.line(), err.column()), (2, 3));
        assert!(err.to_string().contains("Unknown top-level section 'widget'"));
    }

    #[test]
    fn test_missing_colon_or_block() {
        let err = parse("surface s { state { a 1 } }").unwrap_err();
        assert!(err.to_string().starts_with("Expected ':' or value block"));
        assert_eq!(err.column(), 23);
    }

    #[test]
    fn test_unterminated_block() {
        let err = parse("surface s { state { a: 1 }").unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedEof { .. }));
    }

    #[test]
    fn test_trailing_tokens_rejected() {
        let err = parse("surface s { } extra").unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedToken { .. }));
    }

    #[test]
    fn test_invalid_theme_profile() {
        let err = parse("surface s { theme { profile: neon } }").unwrap_err();
        assert!(err.to_string().contains("Unknown theme profile 'neon'"));
    }

    #[test]
    fn test_non_string_child_rejected() {
        let err = parse("surface s { node page: layout.page { children: [1] } }").unwrap_err();
        assert!(err.to_string().contains("children must be identifiers or strings"));
    }
}
