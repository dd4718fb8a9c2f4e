//! dui-lang front end: tokenizer, recursive-descent parser, document model
//! and a canonical source serializer.
//!
//! ```text
//! source text ──tokenize──► tokens ──parse──► Document ──serialize──► source text
//! ```

pub mod ast;
pub mod error;
pub mod parser;
pub mod serializer;
pub mod tokenizer;

pub use ast::*;
#[cfg(feature = "pretty-errors")]
pub use error::format_error;
pub use error::{Location, ParseError, ParseResult};
pub use parser::{parse, Parser};
pub use serializer::{serialize, Serializer};
pub use tokenizer::{tokenize, Token};
