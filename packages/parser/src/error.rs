use std::fmt;
use std::ops::Range;
use thiserror::Error;

pub type ParseResult<T> = Result<T, ParseError>;

/// Source location of a token: byte range plus 1-based line/column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub span: Range<usize>,
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// Maps byte offsets to line/column pairs.
pub(crate) struct LineIndex<'src> {
    source: &'src str,
    line_starts: Vec<usize>,
}

impl<'src> LineIndex<'src> {
    pub fn new(source: &'src str) -> Self {
        let line_starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(idx, _)| idx + 1))
            .collect();
        Self {
            source,
            line_starts,
        }
    }

    pub fn locate(&self, span: Range<usize>) -> Location {
        let line_idx = self
            .line_starts
            .partition_point(|start| *start <= span.start)
            .saturating_sub(1);
        let line_start = self.line_starts[line_idx];
        let column = self.source[line_start..span.start].chars().count() + 1;
        Location {
            span,
            line: line_idx + 1,
            column,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Unexpected character at {location}")]
    Lex { location: Location },

    #[error("Expected {expected}, found {found} at {location}")]
    UnexpectedToken {
        expected: String,
        found: String,
        location: Location,
    },

    #[error("Unexpected end of input: expected {expected} at {location}")]
    UnexpectedEof { expected: String, location: Location },

    #[error("{message} at {location}")]
    InvalidSyntax { message: String, location: Location },
}

impl ParseError {
    pub fn lex(location: Location) -> Self {
        Self::Lex { location }
    }

    pub fn unexpected_token(
        location: Location,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        Self::UnexpectedToken {
            expected: expected.into(),
            found: found.into(),
            location,
        }
    }

    pub fn unexpected_eof(location: Location, expected: impl Into<String>) -> Self {
        Self::UnexpectedEof {
            expected: expected.into(),
            location,
        }
    }

    pub fn invalid_syntax(location: Location, message: impl Into<String>) -> Self {
        Self::InvalidSyntax {
            message: message.into(),
            location,
        }
    }

    pub fn location(&self) -> &Location {
        match self {
            ParseError::Lex { location }
            | ParseError::UnexpectedToken { location, .. }
            | ParseError::UnexpectedEof { location, .. }
            | ParseError::InvalidSyntax { location, .. } => location,
        }
    }

    pub fn line(&self) -> usize {
        self.location().line
    }

    pub fn column(&self) -> usize {
        self.location().column
    }
}

/// Pretty-print a parse error with source context using ariadne
#[cfg(feature = "pretty-errors")]
pub fn format_error(source: &str, filename: &str, error: &ParseError) -> String {
    use ariadne::{Color, Label, Report, ReportKind, Source};

    let span = error.location().span.clone();
    let span = if span.is_empty() {
        let start = span.start.min(source.len());
        start..(start + 1).min(source.len().max(start))
    } else {
        span
    };

    let label_message = match error {
        ParseError::Lex { .. } => "unrecognized character".to_string(),
        ParseError::UnexpectedToken { expected, .. } | ParseError::UnexpectedEof { expected, .. } => {
            format!("expected {}", expected)
        }
        ParseError::InvalidSyntax { message, .. } => message.clone(),
    };

    let mut output = Vec::new();
    let written = Report::build(ReportKind::Error, filename, span.start)
        .with_message(error.to_string())
        .with_label(
            Label::new((filename, span))
                .with_color(Color::Red)
                .with_message(label_message),
        )
        .finish()
        .write((filename, Source::from(source)), &mut output);

    match written {
        Ok(()) => String::from_utf8(output).unwrap_or_else(|_| error.to_string()),
        Err(_) => error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_index_counts_chars() {
        let source = "ab\nçd x";
        let index = LineIndex::new(source);
        let x_offset = source.find('x').unwrap();
        let location = index.locate(x_offset..x_offset + 1);
        assert_eq!(location.line, 2);
        assert_eq!(location.column, 4);
    }

    #[test]
    fn test_error_message_mentions_position() {
        let location = Location {
            span: 0..1,
            line: 3,
            column: 7,
        };
        let err = ParseError::invalid_syntax(location, "Expected ':' or value block");
        assert_eq!(
            err.to_string(),
            "Expected ':' or value block at line 3, column 7"
        );
        assert_eq!(err.line(), 3);
        assert_eq!(err.column(), 7);
    }
}
