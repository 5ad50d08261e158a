//! rcl-core: lexer, parser and AST for the RCL agent description language.
//!
//! The pipeline is two stages with separate error channels:
//!
//! - [`lexer::lex`] turns source text into [`Token`]s plus [`LexingError`]s
//! - [`parser::parse`] turns tokens into an [`RclFile`] plus [`ParseError`]s
//!
//! Neither stage fails on malformed input; both return everything they could
//! recognize alongside what went wrong. [`parse_document`] runs both.
//! [`validate::validate`] applies the semantic checks the parser leaves out.

pub mod ast;
pub mod error;
pub mod factory;
pub mod lexer;
pub mod parser;
pub mod position;
pub mod stream;
pub mod token;
pub mod validate;

// ── Convenience re-exports ───────────────────────────────────────────

pub use ast::{AgentDefinition, MessageEntry, RclFile, Value};
pub use error::{FactoryError, LexingError, ParseError};
pub use factory::AstFactory;
pub use lexer::{lex, LexResult, Lexer};
pub use parser::{parse, ParseOptions, ParseResult, DEFAULT_MAX_ERRORS};
pub use position::{Location, Position};
pub use token::{Token, TokenKind};
pub use validate::{validate, Severity, ValidationIssue};

use serde::Serialize;
use tracing::debug;

/// Output of [`parse_document`]: both stages, channels kept apart.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub tokens: Vec<Token>,
    pub lex_errors: Vec<LexingError>,
    pub ast: Option<RclFile>,
    pub parse_errors: Vec<ParseError>,
}

impl Document {
    pub fn has_errors(&self) -> bool {
        !self.lex_errors.is_empty() || !self.parse_errors.is_empty()
    }
}

/// Lex and parse `source`. The options' file label is attached to errors
/// from both stages.
pub fn parse_document(source: &str, options: &ParseOptions) -> Document {
    let lexed = lexer::lex_file(source, options.file.as_deref());
    let parsed = parser::parse(&lexed.tokens, options);
    debug!(
        tokens = lexed.tokens.len(),
        lex_errors = lexed.errors.len(),
        parse_errors = parsed.errors.len(),
        "parsed document"
    );
    Document {
        tokens: lexed.tokens,
        lex_errors: lexed.errors,
        ast: parsed.ast,
        parse_errors: parsed.errors,
    }
}
