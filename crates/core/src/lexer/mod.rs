//! Indentation-aware, multi-mode lexer for RCL source.
//!
//! Produces a flat token stream in which block structure is explicit:
//! `INDENT`/`DEDENT` open and close indentation levels, `NEWLINE` ends each
//! logical line. Multi-line strings and embedded code blocks are captured as
//! raw content tokens without RCL tokenization. Errors are collected and
//! lexing always runs to the end of the input.

mod block;
mod mode;

pub use mode::{LexMode, ModeStack};

use crate::error::{ErrorHandler, LexingError};
use crate::position::{Position, PositionTracker};
use crate::token::{Token, TokenKind};
use serde::Serialize;
use tracing::{debug, trace};

/// Output of one lex pass. Tokens are produced even when errors exist.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LexResult {
    pub tokens: Vec<Token>,
    pub errors: Vec<LexingError>,
}

pub fn lex(source: &str) -> LexResult {
    Lexer::new(source).tokenize()
}

/// Lex with `file` used as a label on every error.
pub fn lex_file(source: &str, file: Option<&str>) -> LexResult {
    Lexer::new(source).with_file(file).tokenize()
}

pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
    tracker: PositionTracker,
    /// Open indentation widths; the bottom `0` is a sentinel.
    indents: Vec<usize>,
    /// Indentation of the logical line being lexed.
    line_indent: usize,
    modes: ModeStack,
    /// Open brackets. While non-empty, line breaks are not significant.
    brackets: Vec<(char, Position)>,
    at_line_start: bool,
    tokens: Vec<Token>,
    errors: ErrorHandler,
}

fn classify_lowercase(word: &str, mode: LexMode) -> TokenKind {
    if mode.prefers_type_names() {
        TokenKind::TypeTagName
    } else if mode.recognizes_keywords() {
        TokenKind::keyword(word).unwrap_or(TokenKind::CommonNoun)
    } else {
        TokenKind::CommonNoun
    }
}

fn closer_for(open: char) -> char {
    match open {
        '(' => ')',
        '[' => ']',
        _ => '}',
    }
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Lexer {
            chars: source.chars().collect(),
            pos: 0,
            tracker: PositionTracker::new(),
            indents: vec![0],
            line_indent: 0,
            modes: ModeStack::new(),
            brackets: Vec::new(),
            at_line_start: true,
            tokens: Vec::new(),
            errors: ErrorHandler::default(),
        }
    }

    pub fn with_file(mut self, file: Option<&str>) -> Self {
        self.errors = ErrorHandler::new(file);
        self
    }

    pub fn tokenize(mut self) -> LexResult {
        while self.pos < self.chars.len() {
            if self.at_line_start && self.brackets.is_empty() {
                self.begin_line();
            } else {
                self.lex_token();
            }
        }
        self.finish();
        debug!(
            tokens = self.tokens.len(),
            errors = self.errors.len(),
            "lexed document"
        );
        LexResult {
            tokens: self.tokens,
            errors: self.errors.into_errors(),
        }
    }

    // -- Cursor helpers ------------------------------------------

    fn peek_at(&self, n: usize) -> Option<char> {
        self.chars.get(self.pos + n).copied()
    }

    fn current(&self) -> Option<char> {
        self.peek_at(0)
    }

    fn position(&self) -> Position {
        self.tracker.position()
    }

    fn bump(&mut self) {
        self.bump_n(1);
    }

    fn bump_n(&mut self, n: usize) {
        let n = n.min(self.chars.len() - self.pos);
        self.tracker.advance(&self.chars, self.pos, n);
        self.pos += n;
    }

    fn at_line_end(&self) -> bool {
        matches!(self.current(), None | Some('\n') | Some('\r'))
    }

    fn skip_to_line_end(&mut self) {
        while !self.at_line_end() {
            self.bump();
        }
    }

    fn skip_inline_space(&mut self) {
        while matches!(self.current(), Some(' ') | Some('\t')) {
            self.bump();
        }
    }

    fn consume_line_break(&mut self) {
        match self.current() {
            Some('\r') => {
                self.bump();
                if self.current() == Some('\n') {
                    self.bump();
                }
            }
            Some('\n') => self.bump(),
            _ => {}
        }
    }

    /// Width of the space/tab run starting at `from`.
    fn indentation_at(&self, from: usize) -> usize {
        self.chars
            .get(from..)
            .map_or(0, |rest| {
                rest.iter()
                    .take_while(|c| matches!(c, ' ' | '\t'))
                    .count()
            })
    }

    /// First character at or after `from` that is not a space or tab.
    fn next_significant(&self, from: usize) -> Option<char> {
        self.chars.get(from + self.indentation_at(from)).copied()
    }

    /// Nothing but whitespace or a comment remains on the line.
    fn rest_is_blank(&self, from: usize) -> bool {
        matches!(
            self.next_significant(from),
            None | Some('\n') | Some('\r') | Some('#')
        )
    }

    fn emit(&mut self, kind: TokenKind, start_idx: usize, start: Position) {
        let text: String = self.chars[start_idx..self.pos].iter().collect();
        self.tokens
            .push(Token::new(kind, text, start, self.position()));
    }

    /// Zero-width token at the current position.
    fn emit_marker(&mut self, kind: TokenKind) {
        let at = self.position();
        self.tokens.push(Token::new(kind, "", at, at));
    }

    fn lex_single(&mut self, kind: TokenKind) {
        let start_idx = self.pos;
        let start = self.position();
        self.bump();
        self.emit(kind, start_idx, start);
    }

    fn report_unexpected(&mut self) {
        let at = self.position();
        if let Some(c) = self.current() {
            self.bump();
            self.errors
                .report(format!("unexpected character '{}'", c), at, 1);
        }
    }

    // -- Line structure ------------------------------------------

    fn begin_line(&mut self) {
        let line_start = self.pos;
        let start = self.position();
        let width = self.indentation_at(self.pos);
        match self.chars.get(self.pos + width) {
            None => {
                self.bump_n(width);
                return;
            }
            Some('\n') | Some('\r') => {
                self.bump_n(width);
                self.consume_line_break();
                return;
            }
            Some('#') => {
                self.bump_n(width);
                self.skip_to_line_end();
                self.consume_line_break();
                return;
            }
            Some(_) => {}
        }
        self.bump_n(width);
        self.at_line_start = false;
        self.line_indent = width;
        self.apply_indentation(width, line_start, start);
    }

    fn apply_indentation(&mut self, width: usize, line_start: usize, start: Position) {
        let top = self.indents.last().copied().unwrap_or(0);
        if width > top {
            trace!(width, line = start.line, "indent");
            self.indents.push(width);
            self.emit(TokenKind::Indent, line_start, start);
            return;
        }
        if width == top {
            return;
        }

        let mut pops = self
            .indents
            .iter()
            .rev()
            .take_while(|&&level| level > width)
            .count();
        let landing = self
            .indents
            .len()
            .checked_sub(pops + 1)
            .and_then(|i| self.indents.get(i))
            .copied()
            .unwrap_or(0);
        if landing != width {
            // Keep the line inside the innermost block it still indents into.
            self.errors.report(
                "unindent does not match any outer indentation level",
                start,
                width,
            );
            pops = pops.saturating_sub(1);
        }
        trace!(width, pops, line = start.line, "dedent");
        for _ in 0..pops {
            self.indents.pop();
            self.emit_marker(TokenKind::Dedent);
        }
    }

    fn lex_line_break(&mut self) {
        let start_idx = self.pos;
        let start = self.position();
        self.consume_line_break();
        if !self.brackets.is_empty() {
            return;
        }
        self.emit(TokenKind::Newline, start_idx, start);
        self.modes.end_line();
        self.at_line_start = true;
    }

    fn finish(&mut self) {
        for (open, at) in std::mem::take(&mut self.brackets) {
            self.errors.report(format!("unclosed '{}'", open), at, 1);
        }
        if self
            .tokens
            .last()
            .is_some_and(|t| !t.kind.is_structural())
        {
            self.emit_marker(TokenKind::Newline);
        }
        while self.indents.len() > 1 {
            self.indents.pop();
            self.emit_marker(TokenKind::Dedent);
        }
        self.emit_marker(TokenKind::Eof);
    }

    // -- Tokens --------------------------------------------------

    fn lex_token(&mut self) {
        let Some(c) = self.current() else {
            return;
        };
        match c {
            ' ' | '\t' => self.bump(),
            '\n' | '\r' => self.lex_line_break(),
            '#' => self.skip_to_line_end(),
            '"' => self.lex_string(),
            '<' => self.lex_type_tag(),
            '$' => self.lex_embedded(),
            '|' | '+' => self.lex_pipe(),
            ':' => self.lex_colon(),
            '-' => self.lex_dash(),
            '(' | '[' | '{' => self.lex_open(c),
            ')' | ']' | '}' => self.lex_close(c),
            ',' => self.lex_single(TokenKind::Comma),
            '.' => self.lex_single(TokenKind::Dot),
            '/' => self.lex_single(TokenKind::Slash),
            '>' => self.lex_single(TokenKind::Gt),
            c if c.is_ascii_digit() => self.lex_number(),
            c if c.is_uppercase() => self.lex_proper_word(),
            c if c.is_lowercase() || c == '_' => self.lex_word(),
            _ => self.report_unexpected(),
        }
    }

    fn lex_string(&mut self) {
        let start_idx = self.pos;
        let start = self.position();
        self.bump();
        loop {
            match self.current() {
                None | Some('\n') | Some('\r') => {
                    self.errors.report(
                        "unterminated string literal",
                        start,
                        self.pos - start_idx,
                    );
                    return;
                }
                Some('\\') => {
                    self.bump();
                    if !self.at_line_end() {
                        self.bump();
                    }
                }
                Some('"') => {
                    self.bump();
                    break;
                }
                Some(_) => self.bump(),
            }
        }
        self.emit(TokenKind::String, start_idx, start);
    }

    fn lex_colon(&mut self) {
        let prev = self
            .pos
            .checked_sub(1)
            .and_then(|i| self.chars.get(i))
            .copied();
        let atom_context = prev.map_or(true, |p| {
            p.is_whitespace() || matches!(p, '(' | '[' | '{' | ',')
        });
        let starts_name = self
            .peek_at(1)
            .is_some_and(|n| n.is_alphabetic() || n == '_');

        let start_idx = self.pos;
        let start = self.position();
        self.bump();
        if atom_context && starts_name {
            while self
                .current()
                .is_some_and(|c| c.is_alphanumeric() || c == '_')
            {
                self.bump();
            }
            self.emit(TokenKind::Atom, start_idx, start);
            return;
        }

        self.emit(TokenKind::Colon, start_idx, start);
        self.modes.pop_if(LexMode::SectionName);
        if self.modes.current() != LexMode::BooleanContext && !self.rest_is_blank(self.pos) {
            self.modes.push(LexMode::BooleanContext);
        }
    }

    fn lex_dash(&mut self) {
        match self.peek_at(1) {
            Some('>') => {
                let start_idx = self.pos;
                let start = self.position();
                self.bump_n(2);
                self.emit(TokenKind::Arrow, start_idx, start);
            }
            Some(d) if d.is_ascii_digit() => self.lex_number(),
            None | Some(' ') | Some('\t') | Some('\n') | Some('\r') => {
                self.lex_single(TokenKind::Dash)
            }
            Some(_) => self.report_unexpected(),
        }
    }

    fn eat_digits(&mut self) {
        while self.current().is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
        }
    }

    fn lex_number(&mut self) {
        let start_idx = self.pos;
        let start = self.position();
        if self.current() == Some('-') {
            self.bump();
        }
        self.eat_digits();
        if self.current() == Some('.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
            self.eat_digits();
        }
        if matches!(self.current(), Some('e') | Some('E')) {
            let sign = usize::from(matches!(self.peek_at(1), Some('+') | Some('-')));
            if self.peek_at(1 + sign).is_some_and(|c| c.is_ascii_digit()) {
                self.bump_n(1 + sign);
                self.eat_digits();
            }
        }
        self.emit(TokenKind::Number, start_idx, start);
    }

    /// One capitalized segment: letters, digits, `_`, and `-` between
    /// alphanumerics.
    fn scan_segment(&mut self) {
        self.bump();
        loop {
            match self.current() {
                Some(c) if c.is_alphanumeric() || c == '_' => self.bump(),
                Some('-') if self.peek_at(1).is_some_and(|c| c.is_alphanumeric()) => self.bump(),
                _ => break,
            }
        }
    }

    fn lex_proper_word(&mut self) {
        let start_idx = self.pos;
        let start = self.position();
        let mode = self.modes.current();
        self.scan_segment();

        if mode.prefers_literals() {
            let first: String = self.chars[start_idx..self.pos].iter().collect();
            if let Some(kind) = TokenKind::literal_word(&first) {
                self.emit(kind, start_idx, start);
                return;
            }
        }

        while self.current() == Some(' ')
            && self
                .peek_at(1)
                .is_some_and(|c| c.is_uppercase() || c.is_ascii_digit())
        {
            self.bump();
            self.scan_segment();
        }

        let text: String = self.chars[start_idx..self.pos].iter().collect();
        let kind = if mode.recognizes_keywords() {
            TokenKind::literal_word(&text).unwrap_or(TokenKind::ProperWord)
        } else {
            TokenKind::ProperWord
        };
        self.tokens
            .push(Token::new(kind, text, start, self.position()));
    }

    fn lex_word(&mut self) {
        let start_idx = self.pos;
        let start = self.position();
        while self
            .current()
            .is_some_and(|c| c.is_alphanumeric() || c == '_')
        {
            self.bump();
        }
        let text: String = self.chars[start_idx..self.pos].iter().collect();
        let kind = classify_lowercase(&text, self.modes.current());
        self.tokens
            .push(Token::new(kind, text, start, self.position()));

        let names_follow = self
            .next_significant(self.pos)
            .is_some_and(|c| !matches!(c, ':' | '#' | '\n' | '\r'));
        if kind.is_section_keyword() && names_follow {
            self.modes.push(LexMode::SectionName);
        }
    }

    fn lex_open(&mut self, c: char) {
        let at = self.position();
        let kind = match c {
            '(' => TokenKind::LParen,
            '[' => TokenKind::LBracket,
            _ => TokenKind::LBrace,
        };
        self.lex_single(kind);
        self.brackets.push((c, at));
    }

    fn lex_close(&mut self, c: char) {
        let at = self.position();
        let kind = match c {
            ')' => TokenKind::RParen,
            ']' => TokenKind::RBracket,
            _ => TokenKind::RBrace,
        };
        self.lex_single(kind);
        match self.brackets.pop() {
            Some((open, _)) if closer_for(open) == c => {}
            Some((open, _)) => self.errors.report(
                format!("mismatched '{}', expected '{}'", c, closer_for(open)),
                at,
                1,
            ),
            None => self
                .errors
                .report(format!("unmatched '{}'", c), at, 1),
        }
    }

    // -- Type tags -----------------------------------------------

    fn lex_type_tag(&mut self) {
        let tag_idx = self.pos;
        let tag_start = self.position();
        self.lex_single(TokenKind::Lt);
        self.modes.push(LexMode::TypeTag);

        self.skip_inline_space();
        self.lex_type_tag_name();
        self.skip_inline_space();
        self.lex_type_tag_text(TokenKind::TypeTagValue);
        if self.current() == Some('|') {
            self.lex_single(TokenKind::Pipe);
            self.skip_inline_space();
            self.lex_type_tag_text(TokenKind::TypeTagModifier);
        }

        if self.current() == Some('>') {
            self.lex_single(TokenKind::Gt);
        } else {
            self.errors
                .report("unterminated type tag", tag_start, self.pos - tag_idx);
        }
        self.modes.pop_if(LexMode::TypeTag);
    }

    /// A leading word followed by whitespace, `|` or `>` names the type.
    /// Anything else (`<https://...>`) is a bare tag with no name.
    fn lex_type_tag_name(&mut self) {
        if !self.current().is_some_and(|c| c.is_alphabetic()) {
            return;
        }
        let mut end = self.pos;
        while self
            .chars
            .get(end)
            .is_some_and(|c| c.is_alphanumeric() || *c == '_')
        {
            end += 1;
        }
        if !matches!(
            self.chars.get(end),
            Some(' ') | Some('\t') | Some('|') | Some('>')
        ) {
            return;
        }
        let start_idx = self.pos;
        let start = self.position();
        self.bump_n(end - self.pos);
        let text: String = self.chars[start_idx..self.pos].iter().collect();
        let kind = classify_lowercase(&text, self.modes.current());
        self.tokens
            .push(Token::new(kind, text, start, self.position()));
    }

    /// Raw text up to the next delimiter, trailing whitespace excluded from
    /// the token. Values stop at `|`; modifiers run to `>`.
    fn lex_type_tag_text(&mut self, kind: TokenKind) {
        let stops_at_pipe = kind == TokenKind::TypeTagValue;
        let mut end = self.pos;
        while let Some(&c) = self.chars.get(end) {
            if matches!(c, '>' | '\n' | '\r') || (stops_at_pipe && c == '|') {
                break;
            }
            end += 1;
        }
        let mut trimmed = end;
        while trimmed > self.pos && self.chars[trimmed - 1].is_whitespace() {
            trimmed -= 1;
        }
        if trimmed > self.pos {
            let start_idx = self.pos;
            let start = self.position();
            self.bump_n(trimmed - self.pos);
            self.emit(kind, start_idx, start);
        }
        self.bump_n(end - self.pos);
    }

    // -- Embedded code and multi-line strings --------------------

    fn lex_embedded(&mut self) {
        let start_idx = self.pos;
        let start = self.position();
        let mut i = self.pos + 1;
        while self.chars.get(i).is_some_and(|c| c.is_ascii_alphabetic()) {
            i += 1;
        }
        let arrows = self
            .chars
            .get(i..)
            .map_or(0, |rest| rest.iter().take_while(|&&c| c == '>').count());
        let kind = match arrows {
            1 => TokenKind::EmbeddedMarker,
            3 => TokenKind::EmbeddedBlockMarker,
            _ => {
                self.bump();
                self.errors
                    .report("malformed embedded code marker", start, 1);
                return;
            }
        };

        let language: String = self.chars[start_idx + 1..i].iter().collect();
        self.bump_n(i + arrows - self.pos);
        self.emit(kind, start_idx, start);
        if !matches!(language.as_str(), "" | "js" | "ts") {
            self.errors.report(
                format!("unknown embedded language '{}'", language),
                start,
                self.pos - start_idx,
            );
        }

        if kind == TokenKind::EmbeddedMarker {
            self.lex_inline_code();
        } else {
            self.capture_block(TokenKind::EmbeddedCodeContent);
        }
    }

    /// Rest of the line up to an unquoted `->`, as one content token.
    fn lex_inline_code(&mut self) {
        self.skip_inline_space();
        let start_idx = self.pos;
        let start = self.position();
        let mut i = self.pos;
        let mut content_end = self.pos;
        let mut quote: Option<char> = None;
        while let Some(&c) = self.chars.get(i) {
            if c == '\n' || c == '\r' {
                break;
            }
            if let Some(q) = quote {
                if c == '\\' && self.chars.get(i + 1).is_some_and(|n| *n != '\n' && *n != '\r') {
                    i += 1;
                } else if c == q {
                    quote = None;
                }
            } else if c == '-' && self.chars.get(i + 1) == Some(&'>') {
                break;
            } else if matches!(c, '"' | '\'' | '`') {
                quote = Some(c);
            }
            i += 1;
            if !c.is_whitespace() {
                content_end = i;
            }
        }
        if content_end > self.pos {
            self.bump_n(content_end - self.pos);
            self.emit(TokenKind::EmbeddedCodeContent, start_idx, start);
        }
    }

    fn lex_pipe(&mut self) {
        let kind_and_len = match (self.current(), self.peek_at(1), self.peek_at(2)) {
            (Some('+'), Some('|'), Some('+')) => Some((TokenKind::MultilinePreserveAll, 3)),
            (Some('+'), Some('|'), _) => Some((TokenKind::MultilinePreserve, 2)),
            (Some('|'), Some('-'), _) => Some((TokenKind::MultilineStrip, 2)),
            (Some('|'), _, _) => Some((TokenKind::MultilineClean, 1)),
            _ => None,
        };
        let Some((kind, len)) = kind_and_len else {
            self.report_unexpected();
            return;
        };

        if !self.rest_is_blank(self.pos + len) {
            if self.current() == Some('|') {
                self.lex_single(TokenKind::Pipe);
            } else {
                self.report_unexpected();
            }
            return;
        }

        let start_idx = self.pos;
        let start = self.position();
        self.bump_n(len);
        self.emit(kind, start_idx, start);
        self.capture_block(TokenKind::StringContent);
    }
}
