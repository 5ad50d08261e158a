//! Random-access cursor over a token list with lookahead and backtracking.

use crate::position::Position;
use crate::token::{Token, TokenKind};
use std::borrow::Cow;

/// Saved cursor position, restored with [`TokenStream::reset`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Marker(usize);

/// Cursor over a token list that always ends in `EOF`.
///
/// Reads past the end clamp to the final `EOF`, so lookahead never fails.
/// A list without a trailing `EOF` gets one appended.
pub struct TokenStream<'a> {
    tokens: Cow<'a, [Token]>,
    pos: usize,
}

impl<'a> TokenStream<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        let tokens = match tokens.last() {
            Some(last) if last.kind == TokenKind::Eof => Cow::Borrowed(tokens),
            last => {
                let at = last.map_or(Position::START, |t| t.end);
                let mut owned = tokens.to_vec();
                owned.push(Token::new(TokenKind::Eof, "", at, at));
                Cow::Owned(owned)
            }
        };
        TokenStream { tokens, pos: 0 }
    }

    fn last_index(&self) -> usize {
        self.tokens.len() - 1
    }

    /// Token `offset` positions ahead of the cursor (0 is the current one).
    pub fn peek(&self, offset: usize) -> &Token {
        let idx = self.pos.saturating_add(offset).min(self.last_index());
        &self.tokens[idx]
    }

    pub fn current(&self) -> &Token {
        self.peek(0)
    }

    /// Return the current token and move past it. The cursor stays on `EOF`.
    pub fn advance(&mut self) -> &Token {
        let idx = self.pos.min(self.last_index());
        if self.pos < self.last_index() {
            self.pos += 1;
        }
        &self.tokens[idx]
    }

    pub fn previous(&self) -> Option<&Token> {
        self.pos.checked_sub(1).map(|i| &self.tokens[i])
    }

    /// Most recently consumed token that carries source text.
    pub fn last_significant(&self) -> Option<&Token> {
        self.tokens[..self.pos]
            .iter()
            .rev()
            .find(|t| !t.kind.is_structural())
    }

    pub fn is_at_end(&self) -> bool {
        self.current().kind == TokenKind::Eof
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn check(&self, kind: TokenKind) -> bool {
        self.current().kind == kind
    }

    pub fn check_at(&self, offset: usize, kind: TokenKind) -> bool {
        self.peek(offset).kind == kind
    }

    pub fn mark(&self) -> Marker {
        Marker(self.pos)
    }

    pub fn reset(&mut self, marker: Marker) {
        self.pos = marker.0.min(self.last_index());
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}
