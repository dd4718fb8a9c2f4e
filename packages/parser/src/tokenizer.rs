use crate::error::{LineIndex, Location, ParseError, ParseResult};
use logos::Logos;
use std::fmt;

/// Token types for dui-lang
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip r"//[^\n]*")]
#[logos(skip r"#[^\n]*")]
pub enum Token<'src> {
    // String literals, quotes included
    #[regex(r#""([^"\\]|\\.)*""#, |lex| lex.slice())]
    DoubleQuoted(&'src str),

    #[regex(r#"'([^'\\]|\\.)*'"#, |lex| lex.slice())]
    SingleQuoted(&'src str),

    #[regex(r"-?[0-9]+(\.[0-9]+)?", |lex| lex.slice())]
    Number(&'src str),

    // Identifiers may carry dots and hyphens: `data.kpi_card`, `main-header`
    #[regex(r"[A-Za-z_][A-Za-z0-9_.\-]*", |lex| lex.slice())]
    Ident(&'src str),

    #[token("{")]
    LBrace,

    #[token("}")]
    RBrace,

    #[token("[")]
    LBracket,

    #[token("]")]
    RBracket,

    #[token(":")]
    Colon,

    #[token(",")]
    Comma,
}

impl<'src> fmt::Display for Token<'src> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::DoubleQuoted(s) | Token::SingleQuoted(s) => write!(f, "string {}", s),
            Token::Number(n) => write!(f, "number {}", n),
            Token::Ident(s) => write!(f, "identifier '{}'", s),
            Token::LBrace => write!(f, "'{{'"),
            Token::RBrace => write!(f, "'}}'"),
            Token::LBracket => write!(f, "'['"),
            Token::RBracket => write!(f, "']'"),
            Token::Colon => write!(f, "':'"),
            Token::Comma => write!(f, "','"),
        }
    }
}

/// A token together with where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct SpannedToken<'src> {
    pub token: Token<'src>,
    pub location: Location,
}

/// Token stream plus the location just past the last character.
#[derive(Debug, Clone)]
pub struct TokenStream<'src> {
    pub tokens: Vec<SpannedToken<'src>>,
    pub eof: Location,
}

/// Tokenize source text, failing on the first unrecognized character.
pub fn tokenize(source: &str) -> ParseResult<TokenStream<'_>> {
    let index = LineIndex::new(source);
    let mut tokens = Vec::new();
    let mut lexer = Token::lexer(source);

    while let Some(result) = lexer.next() {
        let location = index.locate(lexer.span());
        match result {
            Ok(token) => tokens.push(SpannedToken { token, location }),
            Err(()) => return Err(ParseError::lex(location)),
        }
    }

    let eof = index.locate(source.len()..source.len());
    Ok(TokenStream { tokens, eof })
}

/// Decode a quoted literal, quotes included, into its string value.
pub fn decode_string(raw: &str) -> Result<String, String> {
    if raw.len() < 2 {
        return Err("String literal is not terminated".to_string());
    }
    if raw.starts_with('"') {
        return serde_json::from_str::<String>(raw).map_err(|e| format!("Invalid string literal: {}", e));
    }

    let body = raw[1..raw.len() - 1].replace("\\'", "'");
    unescape(&body)
}

fn unescape(body: &str) -> Result<String, String> {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some('a') => out.push('\u{07}'),
            Some('b') => out.push('\u{08}'),
            Some('f') => out.push('\u{0c}'),
            Some('v') => out.push('\u{0b}'),
            Some('\\') => out.push('\\'),
            Some('"') => out.push('"'),
            Some('\'') => out.push('\''),
            Some('x') => out.push(hex_escape(&mut chars, 2)?),
            Some('u') => out.push(hex_escape(&mut chars, 4)?),
            Some('U') => out.push(hex_escape(&mut chars, 8)?),
            // Unknown escapes are kept verbatim
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }

    Ok(out)
}

fn hex_escape(chars: &mut std::str::Chars<'_>, digits: usize) -> Result<char, String> {
    let hex: String = chars.by_ref().take(digits).collect();
    if hex.chars().count() != digits {
        return Err(format!("Truncated escape sequence '{}'", hex));
    }
    u32::from_str_radix(&hex, 16)
        .ok()
        .and_then(char::from_u32)
        .ok_or_else(|| format!("Invalid escape value '{}'", hex))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<Token<'_>> {
        tokenize(source)
            .unwrap()
            .tokens
            .into_iter()
            .map(|t| t.token)
            .collect()
    }

    #[test]
    fn test_basic_tokens() {
        let tokens = kinds(r#"node kpi_1: data.kpi_card { zone: header, n: -1.5 }"#);
        assert_eq!(
            tokens,
            vec![
                Token::Ident("node"),
                Token::Ident("kpi_1"),
                Token::Colon,
                Token::Ident("data.kpi_card"),
                Token::LBrace,
                Token::Ident("zone"),
                Token::Colon,
                Token::Ident("header"),
                Token::Comma,
                Token::Ident("n"),
                Token::Colon,
                Token::Number("-1.5"),
                Token::RBrace,
            ]
        );
    }

    #[test]
    fn test_comments_are_skipped() {
        let tokens = kinds("// line comment\n# hash comment\nsurface # trailing\n");
        assert_eq!(tokens, vec![Token::Ident("surface")]);
    }

    #[test]
    fn test_hash_inside_string_is_not_a_comment() {
        let tokens = kinds(r##"accent: "#111111""##);
        assert_eq!(tokens[2], Token::DoubleQuoted(r##""#111111""##));
    }

    #[test]
    fn test_locations_are_one_based() {
        let stream = tokenize("surface s {\n  meta {}\n}").unwrap();
        let meta = &stream.tokens[3];
        assert_eq!(meta.token, Token::Ident("meta"));
        assert_eq!((meta.location.line, meta.location.column), (2, 3));
        assert_eq!((stream.eof.line, stream.eof.column), (3, 2));
    }

    #[test]
    fn test_unrecognized_character_fails() {
        let err = tokenize("surface s {\n  @\n}").unwrap_err();
        assert!(matches!(err, ParseError::Lex { .. }));
        assert_eq!((err.line(), err.column()), (2, 3));
    }

    #[test]
    fn test_unterminated_string_fails() {
        let err = tokenize("title: \"abc").unwrap_err();
        assert!(matches!(err, ParseError::Lex { .. }));
        assert_eq!(err.column(), 8);
    }

    #[test]
    fn test_decode_strings() {
        assert_eq!(decode_string(r#""a\"b\n""#).unwrap(), "a\"b\n");
        assert_eq!(decode_string(r"'it\'s'").unwrap(), "it's");
        assert_eq!(decode_string(r"'tab\there'").unwrap(), "tab\there");
        assert_eq!(decode_string(r"'é'").unwrap(), "é");
        assert_eq!(decode_string(r"'keep \q'").unwrap(), "keep \\q");
        assert!(decode_string(r"'\xZZ'").is_err());
    }
}
