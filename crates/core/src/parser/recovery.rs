//! Error recovery: skip to the next point where parsing can resume.

use super::Parser;
use crate::token::TokenKind;
use tracing::debug;

impl<'a> Parser<'a> {
    /// Skip the rest of a malformed line.
    ///
    /// Stops after the line's `NEWLINE` (also skipping an indented body that
    /// belongs to the broken line), before a `DEDENT`, before a section
    /// keyword that starts a line, or at end of input. The offending token
    /// itself is always consumed unless it is one of those boundaries.
    pub(super) fn synchronize(&mut self) {
        let from = self.stream.position();
        loop {
            match self.kind() {
                TokenKind::Eof | TokenKind::Dedent => break,
                TokenKind::Indent => {
                    self.skip_block();
                    break;
                }
                TokenKind::Newline => {
                    self.stream.advance();
                    if self.check(TokenKind::Indent) {
                        self.skip_block();
                    }
                    break;
                }
                kind if kind.is_section_keyword()
                    && self.at_line_start()
                    && self.stream.position() > from =>
                {
                    break
                }
                _ => {
                    self.stream.advance();
                }
            }
        }
        debug!(
            skipped = self.stream.position() - from,
            resume_at = ?self.kind(),
            "synchronized"
        );
    }

    /// Skip an indented block starting at its `INDENT`, through the matching
    /// `DEDENT`.
    pub(super) fn skip_block(&mut self) {
        if !self.eat(TokenKind::Indent) {
            return;
        }
        let mut depth = 1usize;
        while depth > 0 && !self.stream.is_at_end() {
            match self.advance().kind {
                TokenKind::Indent => depth += 1,
                TokenKind::Dedent => depth -= 1,
                _ => {}
            }
        }
    }
}
