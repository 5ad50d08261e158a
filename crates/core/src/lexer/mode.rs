//! Lexer modes: prioritized vocabularies for contexts where the same text
//! could lex as a literal word, a proper noun or a type-tag name.

/// Active lexing context. Each mode fixes which interpretation of an
/// ambiguous word wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexMode {
    /// Longest proper-noun run wins; a run that is exactly a literal word
    /// (`True`, `No`, `Null` ...) lexes as that literal.
    Default,
    /// Inside `<...>`: the leading word is a type-tag name.
    TypeTag,
    /// Value position: literal words win even when more capitalized words
    /// follow them.
    BooleanContext,
    /// After a section keyword: names are proper nouns, never literals or
    /// keywords.
    SectionName,
}

impl LexMode {
    /// Literal words beat proper-noun continuation.
    pub fn prefers_literals(self) -> bool {
        matches!(self, LexMode::BooleanContext)
    }

    /// Keywords and literal words are recognized at all.
    pub fn recognizes_keywords(self) -> bool {
        !matches!(self, LexMode::SectionName)
    }

    /// Lowercase words are type-tag names.
    pub fn prefers_type_names(self) -> bool {
        matches!(self, LexMode::TypeTag)
    }

    /// Modes that end with the logical line.
    fn is_line_scoped(self) -> bool {
        matches!(self, LexMode::BooleanContext | LexMode::SectionName)
    }
}

/// Stack of active modes. The bottom entry is always [`LexMode::Default`].
#[derive(Debug, Clone)]
pub struct ModeStack {
    stack: Vec<LexMode>,
}

impl Default for ModeStack {
    fn default() -> Self {
        Self::new()
    }
}

impl ModeStack {
    pub fn new() -> Self {
        ModeStack {
            stack: vec![LexMode::Default],
        }
    }

    pub fn current(&self) -> LexMode {
        self.stack.last().copied().unwrap_or(LexMode::Default)
    }

    pub fn push(&mut self, mode: LexMode) {
        self.stack.push(mode);
    }

    /// Pop the innermost mode. The bottom `Default` entry is never removed.
    pub fn pop(&mut self) -> Option<LexMode> {
        if self.stack.len() > 1 {
            self.stack.pop()
        } else {
            None
        }
    }

    /// Pop `mode` if it is the innermost one.
    pub fn pop_if(&mut self, mode: LexMode) -> bool {
        if self.stack.len() > 1 && self.current() == mode {
            self.stack.pop();
            true
        } else {
            false
        }
    }

    /// Leave every line-scoped mode at the end of a logical line.
    pub fn end_line(&mut self) {
        while self.stack.len() > 1 && self.current().is_line_scoped() {
            self.stack.pop();
        }
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bottom_mode_cannot_be_popped() {
        let mut modes = ModeStack::new();
        assert_eq!(modes.pop(), None);
        assert_eq!(modes.current(), LexMode::Default);
    }

    #[test]
    fn nested_modes_unwind_in_order() {
        let mut modes = ModeStack::new();
        modes.push(LexMode::BooleanContext);
        modes.push(LexMode::TypeTag);
        assert_eq!(modes.current(), LexMode::TypeTag);
        assert_eq!(modes.pop(), Some(LexMode::TypeTag));
        assert_eq!(modes.current(), LexMode::BooleanContext);
    }

    #[test]
    fn end_line_drops_line_scoped_modes() {
        let mut modes = ModeStack::new();
        modes.push(LexMode::SectionName);
        modes.push(LexMode::BooleanContext);
        modes.end_line();
        assert_eq!(modes.depth(), 1);
    }

    #[test]
    fn pop_if_only_matches_innermost() {
        let mut modes = ModeStack::new();
        modes.push(LexMode::SectionName);
        assert!(!modes.pop_if(LexMode::TypeTag));
        assert!(modes.pop_if(LexMode::SectionName));
        assert_eq!(modes.current(), LexMode::Default);
    }

    #[test]
    fn mode_priorities() {
        assert!(LexMode::BooleanContext.prefers_literals());
        assert!(!LexMode::Default.prefers_literals());
        assert!(!LexMode::SectionName.recognizes_keywords());
        assert!(LexMode::TypeTag.prefers_type_names());
    }
}
