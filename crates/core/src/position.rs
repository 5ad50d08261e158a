//! Source positions and the tracker that computes them.
//!
//! Offsets count characters (not bytes) from the start of the document.
//! `\n`, `\r` and `\r\n` each end exactly one line.

use serde::{Deserialize, Serialize};

/// A point in the source text. `line` and `column` are 1-based, `offset` is
/// a 0-based character index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub column: u32,
    pub offset: usize,
}

impl Position {
    pub const START: Position = Position {
        line: 1,
        column: 1,
        offset: 0,
    };

    pub fn new(line: u32, column: u32, offset: usize) -> Self {
        Position {
            line,
            column,
            offset,
        }
    }
}

impl Default for Position {
    fn default() -> Self {
        Position::START
    }
}

/// A half-open source range from `start` to `end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub start: Position,
    pub end: Position,
}

impl Location {
    pub fn new(start: Position, end: Position) -> Self {
        Location { start, end }
    }

    /// Zero-width location at `at`.
    pub fn point(at: Position) -> Self {
        Location { start: at, end: at }
    }

    /// Smallest location covering both `self` and `other`.
    pub fn cover(self, other: Location) -> Location {
        Location {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    pub fn contains(&self, pos: Position) -> bool {
        self.start.offset <= pos.offset && pos.offset <= self.end.offset
    }
}

/// Converts character offsets into line/column positions.
///
/// Advancing over a text in one call or character by character yields the
/// same position; a `\r\n` pair split across two calls still counts as one
/// line break.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionTracker {
    current: Position,
    after_cr: bool,
}

impl Default for PositionTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl PositionTracker {
    pub fn new() -> Self {
        PositionTracker {
            current: Position::START,
            after_cr: false,
        }
    }

    pub fn position(&self) -> Position {
        self.current
    }

    /// Move forward over `length` characters of `text` starting at
    /// `start_offset`. Out-of-range slices are clamped.
    pub fn advance(&mut self, text: &[char], start_offset: usize, length: usize) {
        let end = start_offset.saturating_add(length).min(text.len());
        let start = start_offset.min(end);
        for &c in &text[start..end] {
            self.step(c);
        }
    }

    /// Position reached after consuming `text`, without moving the tracker.
    pub fn calculate_end_position(&self, text: &str) -> Position {
        let mut scratch = self.clone();
        for c in text.chars() {
            scratch.step(c);
        }
        scratch.current
    }

    fn step(&mut self, c: char) {
        self.current.offset += 1;
        match c {
            '\r' => {
                self.current.line += 1;
                self.current.column = 1;
                self.after_cr = true;
            }
            '\n' => {
                if !self.after_cr {
                    self.current.line += 1;
                    self.current.column = 1;
                }
                self.after_cr = false;
            }
            _ => {
                self.current.column += 1;
                self.after_cr = false;
            }
        }
    }
}
