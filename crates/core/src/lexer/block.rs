//! Raw capture of indented bodies after `|`-style string markers and
//! `$lang>>>` code markers. Captured lines never go through RCL tokenization.

use super::Lexer;
use crate::token::TokenKind;
use tracing::trace;

impl Lexer {
    /// Capture every following line that is blank or indented deeper than
    /// the marker line, one `content` token per line with its indentation
    /// intact. Ends the logical line with a zero-width `NEWLINE` unless a
    /// bracket is still open, as a plain line break would.
    pub(super) fn capture_block(&mut self, content: TokenKind) {
        let base = self.line_indent;
        if !self.rest_is_blank(self.pos) {
            let at = self.position();
            let from = self.pos;
            self.skip_to_line_end();
            self.errors
                .report("unexpected text after block marker", at, self.pos - from);
        }
        self.skip_to_line_end();
        self.consume_line_break();

        let mut captured = 0usize;
        while self.pos < self.chars.len() {
            let width = self.indentation_at(self.pos);
            let blank = matches!(
                self.chars.get(self.pos + width),
                None | Some('\n') | Some('\r')
            );
            if !blank && width <= base {
                break;
            }
            let start_idx = self.pos;
            let start = self.position();
            self.skip_to_line_end();
            self.emit(content, start_idx, start);
            self.consume_line_break();
            captured += 1;
        }
        trace!(lines = captured, base, "captured block body");

        if !self.brackets.is_empty() {
            return;
        }
        self.emit_marker(TokenKind::Newline);
        self.modes.end_line();
        self.at_line_start = true;
    }
}
