//! Recursive-descent parser: token list → [`RclFile`].
//!
//! Productions return `Result<_, ParseError>`. Repetition loops (the items
//! of an indented block, the top level of the file) report a failed item,
//! synchronize to the next safe boundary and carry on, so one malformed line
//! never costs the rest of the document. The parser never fails as a whole:
//! it returns the best AST it could build plus every error it recorded.

mod flow;
mod messages;
mod recovery;
mod sections;
mod values;

use crate::ast::RclFile;
use crate::error::{FactoryError, ParseError};
use crate::factory::AstFactory;
use crate::position::{Location, Position};
use crate::stream::TokenStream;
use crate::token::{decode_string_literal, Token, TokenKind};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default cap on recorded parse errors before the parser stops.
pub const DEFAULT_MAX_ERRORS: usize = 100;

/// Caller-supplied parse settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParseOptions {
    /// Label attached to every error, usually the document path.
    pub file: Option<String>,
    /// Stop after this many parse errors; `0` disables the cap.
    pub max_errors: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            file: None,
            max_errors: DEFAULT_MAX_ERRORS,
        }
    }
}

impl ParseOptions {
    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    pub fn with_max_errors(mut self, max_errors: usize) -> Self {
        self.max_errors = max_errors;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParseResult {
    /// `None` only when no import or agent was recognized at all.
    pub ast: Option<RclFile>,
    pub errors: Vec<ParseError>,
}

pub fn parse(tokens: &[Token], options: &ParseOptions) -> ParseResult {
    let mut p = Parser::new(tokens, options);
    let ast = p.parse_file();
    debug!(
        errors = p.errors.len(),
        has_ast = ast.is_some(),
        "parsed document"
    );
    ParseResult {
        ast,
        errors: p.errors,
    }
}

type PResult<T> = Result<T, ParseError>;

// ──────────────────────────────────────────────
// Parser
// ──────────────────────────────────────────────

struct Parser<'a> {
    stream: TokenStream<'a>,
    factory: AstFactory,
    errors: Vec<ParseError>,
    file: Option<String>,
    max_errors: usize,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token], options: &ParseOptions) -> Self {
        Parser {
            stream: TokenStream::new(tokens),
            factory: AstFactory::new(),
            errors: Vec::new(),
            file: options.file.clone(),
            max_errors: options.max_errors,
        }
    }

    // -- Cursor --------------------------------------------------

    fn peek(&self) -> &Token {
        self.stream.current()
    }

    fn kind(&self) -> TokenKind {
        self.stream.current().kind
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.stream.check(kind)
    }

    fn check_at(&self, offset: usize, kind: TokenKind) -> bool {
        self.stream.check_at(offset, kind)
    }

    fn advance(&mut self) -> Token {
        self.stream.advance().clone()
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.stream.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> PResult<Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(what))
        }
    }

    /// The previous token ended a line (or nothing was consumed yet).
    fn at_line_start(&self) -> bool {
        self.stream.previous().map_or(true, |t| {
            matches!(
                t.kind,
                TokenKind::Newline | TokenKind::Indent | TokenKind::Dedent
            )
        })
    }

    /// Location from `start` to the end of the last consumed token that has
    /// source text.
    fn span_from(&self, start: Position) -> Location {
        let end = self
            .stream
            .last_significant()
            .map(|t| t.end)
            .filter(|end| *end >= start)
            .unwrap_or(start);
        Location::new(start, end)
    }

    // -- Token helpers -------------------------------------------

    fn take_string(&mut self, what: &str) -> PResult<String> {
        let tok = self.expect(TokenKind::String, what)?;
        Ok(decode_string_literal(&tok.text))
    }

    /// A name: proper noun, common noun, keyword or literal word, taken
    /// verbatim.
    fn take_name(&mut self, what: &str) -> PResult<String> {
        if self.kind().is_wordlike() {
            Ok(self.advance().text)
        } else {
            Err(self.unexpected(what))
        }
    }

    /// Optional shortcut name before the shortcut's arguments.
    fn take_optional_name(&mut self) -> Option<String> {
        let kind = self.kind();
        if matches!(kind, TokenKind::ProperWord | TokenKind::CommonNoun) || kind.is_literal_word() {
            Some(self.advance().text)
        } else {
            None
        }
    }

    // -- Errors --------------------------------------------------

    fn found(&self) -> String {
        let tok = self.peek();
        if tok.kind.is_structural() || tok.text.is_empty() {
            tok.kind.describe().to_owned()
        } else {
            format!("{} '{}'", tok.kind.describe(), tok.text)
        }
    }

    fn error_here(&self, message: impl Into<String>) -> ParseError {
        ParseError::at(message, self.peek().location())
    }

    fn unexpected(&self, what: &str) -> ParseError {
        self.error_here(format!("expected {}, found {}", what, self.found()))
    }

    fn factory_error(&self, err: FactoryError, location: Location) -> ParseError {
        ParseError::at(err.to_string(), location)
    }

    fn report(&mut self, error: ParseError) {
        if self.halted() {
            return;
        }
        let error = error.with_file(self.file.as_deref());
        debug!(message = %error.message, "parse error");
        self.errors.push(error);
    }

    /// The error cap has been reached; loops stop and unwind.
    fn halted(&self) -> bool {
        self.max_errors > 0 && self.errors.len() >= self.max_errors
    }

    // -- Lines and blocks ----------------------------------------

    /// End of a logical line. A line already closed by a nested block
    /// (previous token `NEWLINE`/`DEDENT`) or an enclosing block ending
    /// (`DEDENT`/`EOF` next) also counts.
    fn finish_line(&mut self) -> PResult<()> {
        if self.eat(TokenKind::Newline) {
            return Ok(());
        }
        if matches!(self.kind(), TokenKind::Dedent | TokenKind::Eof) {
            return Ok(());
        }
        if matches!(
            self.stream.previous().map(|t| t.kind),
            Some(TokenKind::Newline | TokenKind::Dedent)
        ) {
            return Ok(());
        }
        Err(self.unexpected("end of line"))
    }

    /// `NEWLINE (INDENT item* DEDENT)?`. The indented part is optional so an
    /// empty section is not an error here.
    fn parse_block<F>(&mut self, item: F) -> PResult<()>
    where
        F: FnMut(&mut Self) -> PResult<()>,
    {
        self.finish_line()?;
        if self.eat(TokenKind::Indent) {
            self.parse_indented(item);
        }
        Ok(())
    }

    /// Items of an already opened block, through its closing `DEDENT`.
    fn parse_indented<F>(&mut self, mut item: F)
    where
        F: FnMut(&mut Self) -> PResult<()>,
    {
        loop {
            while self.eat(TokenKind::Newline) {}
            if self.eat(TokenKind::Dedent) || self.stream.is_at_end() || self.halted() {
                return;
            }
            let before = self.stream.position();
            if let Err(e) = item(self) {
                self.report(e);
                self.synchronize();
            }
            if self.stream.position() == before && !self.check(TokenKind::Dedent) {
                self.stream.advance();
            }
        }
    }

    // -- File ----------------------------------------------------

    fn parse_file(&mut self) -> Option<RclFile> {
        let start = self.peek().start;
        let mut imports = Vec::new();
        let mut agent = None;
        let mut recognized = false;

        while !self.stream.is_at_end() && !self.halted() {
            let before = self.stream.position();
            match self.kind() {
                TokenKind::Newline => {
                    self.advance();
                }
                TokenKind::Import => {
                    recognized = true;
                    match self.parse_import() {
                        Ok(import) => imports.push(import),
                        Err(e) => {
                            self.report(e);
                            self.synchronize();
                        }
                    }
                }
                TokenKind::Agent => {
                    recognized = true;
                    let at = self.peek().location();
                    match self.parse_agent() {
                        Ok(parsed) if agent.is_none() => agent = Some(parsed),
                        Ok(_) => self.report(ParseError::at(
                            "only one agent definition is allowed per file",
                            at,
                        )),
                        Err(e) => {
                            self.report(e);
                            self.synchronize();
                        }
                    }
                }
                TokenKind::Indent => {
                    let e = self.error_here("unexpected indentation");
                    self.report(e);
                    self.skip_block();
                }
                _ => {
                    let e = self.unexpected("'import' or 'agent'");
                    self.report(e);
                    self.synchronize();
                }
            }
            if self.stream.position() == before && !self.stream.is_at_end() {
                self.stream.advance();
            }
        }

        if !recognized {
            if !self.halted() {
                self.report(ParseError::new("no agent definition or import found", None));
            }
            return None;
        }
        if agent.is_none() {
            self.report(ParseError::new("missing agent definition", None));
        }
        let location = self.span_from(start);
        Some(self.factory.rcl_file(imports, agent, Some(location)))
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer;

    pub(super) fn parse_src(src: &str) -> ParseResult {
        let lexed = lexer::lex(src);
        parse(&lexed.tokens, &ParseOptions::default())
    }

    #[test]
    fn empty_input_has_no_ast() {
        let result = parse_src("");
        assert!(result.ast.is_none());
        assert_eq!(result.errors.len(), 1);
    }

    #[test]
    fn garbage_only_has_no_ast() {
        let result = parse_src("\"just a string\"\n42\n");
        assert!(result.ast.is_none());
        assert!(!result.errors.is_empty());
    }

    #[test]
    fn imports_without_agent_report_missing_agent() {
        let result = parse_src("import Shared\n");
        let ast = result.ast.expect("imports are a recognized construct");
        assert_eq!(ast.imports.len(), 1);
        assert!(ast.agent_section.is_none());
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].message, "missing agent definition");
    }

    #[test]
    fn second_agent_is_an_error_and_first_is_kept() {
        let src = "agent One:\n  displayName: \"1\"\nagent Two:\n  displayName: \"2\"\n";
        let result = parse_src(src);
        let agent = result.ast.and_then(|a| a.agent_section).unwrap();
        assert_eq!(agent.name, "One");
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].message.contains("only one agent"));
    }

    #[test]
    fn stray_top_level_line_is_skipped() {
        let src = "oops here\nagent Bot:\n  displayName: \"Bot\"\n";
        let result = parse_src(src);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].message.starts_with("expected 'import' or 'agent'"));
        assert_eq!(
            result.ast.unwrap().agent_section.unwrap().display_name.as_deref(),
            Some("Bot")
        );
    }

    #[test]
    fn errors_carry_file_label() {
        let lexed = lexer::lex("agent Bot:\n  bogus: 1\n");
        let options = ParseOptions::default().with_file("bot.rcl");
        let result = parse(&lexed.tokens, &options);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].file.as_deref(), Some("bot.rcl"));
        assert!(result.errors[0].to_string().starts_with("bot.rcl:2:3: "));
    }

    #[test]
    fn max_errors_caps_the_error_list() {
        let src = "agent Bot:\n  a: 1\n  b: 2\n  c: 3\n  d: 4\n";
        let lexed = lexer::lex(src);
        let result = parse(&lexed.tokens, &ParseOptions::default().with_max_errors(2));
        assert_eq!(result.errors.len(), 2);
        assert!(result.ast.is_some());
    }

    #[test]
    fn options_deserialize_with_defaults() {
        let options: ParseOptions = serde_json::from_str(r#"{ "file": "a.rcl" }"#).unwrap();
        assert_eq!(options.file.as_deref(), Some("a.rcl"));
        assert_eq!(options.max_errors, DEFAULT_MAX_ERRORS);
    }

    #[test]
    fn parse_without_trailing_eof_token() {
        let mut tokens = lexer::lex("agent Bot:\n").tokens;
        tokens.pop();
        let result = parse(&tokens, &ParseOptions::default());
        assert!(result.ast.is_some());
    }
}
