//! Error types for the two independent channels: lexical errors and parse
//! errors. Both are plain data so hosting layers can map them 1:1 onto their
//! own diagnostics.

use crate::position::{Location, Position};
use serde::{Deserialize, Serialize};
use thiserror::Error;

fn file_prefix(file: &Option<String>) -> String {
    match file {
        Some(f) => format!("{}:", f),
        None => String::new(),
    }
}

fn location_prefix(file: &Option<String>, location: &Option<Location>) -> String {
    match location {
        Some(loc) => format!(
            "{}{}:{}: ",
            file_prefix(file),
            loc.start.line,
            loc.start.column
        ),
        None if file.is_some() => format!("{} ", file_prefix(file)),
        None => String::new(),
    }
}

/// A malformed token: unterminated string or type tag, unknown character,
/// indentation mismatch, unbalanced bracket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{}{}:{}: {}", file_prefix(.file), .line, .column, .message)]
pub struct LexingError {
    pub message: String,
    pub offset: usize,
    pub length: usize,
    pub line: u32,
    pub column: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

impl LexingError {
    pub fn location(&self) -> Location {
        let start = Position::new(self.line, self.column, self.offset);
        let end = Position::new(
            self.line,
            self.column + self.length as u32,
            self.offset + self.length,
        );
        Location::new(start, end)
    }
}

/// A structural error: a required keyword or punctuation was missing, or a
/// construct appeared where it is not allowed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{}{}", location_prefix(.file, .location), .message)]
pub struct ParseError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

impl ParseError {
    pub fn new(message: impl Into<String>, location: Option<Location>) -> Self {
        ParseError {
            message: message.into(),
            location,
            file: None,
        }
    }

    pub fn at(message: impl Into<String>, location: Location) -> Self {
        ParseError::new(message, Some(location))
    }

    pub fn with_file(mut self, file: Option<&str>) -> Self {
        self.file = file.map(str::to_owned);
        self
    }
}

/// Violations of node-shape invariants, raised by the AST factory.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FactoryError {
    #[error("flow rule needs a source and at least one destination, found {found} operand(s)")]
    IncompleteFlowRule { found: usize },
    #[error("when clause needs at least one destination")]
    IncompleteWhenClause,
    #[error("invalid number literal '{0}'")]
    InvalidNumber(String),
}

/// Accumulates lexical errors for one lex pass. Reporting never aborts the
/// pass; the lexer keeps going after each error.
#[derive(Debug, Default)]
pub struct ErrorHandler {
    file: Option<String>,
    errors: Vec<LexingError>,
}

impl ErrorHandler {
    pub fn new(file: Option<&str>) -> Self {
        ErrorHandler {
            file: file.map(str::to_owned),
            errors: Vec::new(),
        }
    }

    pub fn report(&mut self, message: impl Into<String>, at: Position, length: usize) {
        self.errors.push(LexingError {
            message: message.into(),
            offset: at.offset,
            length,
            line: at.line,
            column: at.column,
            file: self.file.clone(),
        });
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[LexingError] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<LexingError> {
        self.errors
    }
}
