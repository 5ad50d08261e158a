//! Token definitions: the closed vocabulary of RCL terminals.

use crate::position::{Location, Position};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenKind {
    // Structural
    Indent,
    Dedent,
    Newline,
    Eof,

    // Punctuation
    Colon,
    Comma,
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Arrow,
    Lt,
    Gt,
    Dot,
    Slash,
    /// `-` opening a block list item
    Dash,
    /// `|` separating a type-tag value from its modifier
    Pipe,

    // Multi-line string markers
    /// `|`
    MultilineClean,
    /// `|-`
    MultilineStrip,
    /// `+|`
    MultilinePreserve,
    /// `+|+`
    MultilinePreserveAll,

    // Literals
    String,
    Number,
    Atom,
    True,
    False,
    Null,

    // Identifier classes
    /// Capitalized identifier, may contain single internal spaces
    ProperWord,
    /// Lowercase attribute-style identifier
    CommonNoun,

    // Type tags
    TypeTagName,
    TypeTagValue,
    TypeTagModifier,

    // Embedded code
    /// `$js>`, `$ts>`, `$>`
    EmbeddedMarker,
    /// `$js>>>`, `$ts>>>`, `$>>>`
    EmbeddedBlockMarker,
    EmbeddedCodeContent,
    /// One captured line of a multi-line string
    StringContent,

    // Import keywords
    Import,
    As,
    From,

    // Section keywords
    Agent,
    AgentConfig,
    AgentDefaults,
    Flow,
    Messages,
    Message,

    // Flow and collection keywords
    With,
    When,
    List,
    Of,

    // Message shortcuts
    Text,
    RichCard,
    Carousel,
    RbmFile,
    File,

    // Suggestion shortcuts
    Reply,
    Dial,
    OpenUrl,
    ShareLocation,
    ViewLocation,
    SaveEvent,

    // Message traffic types
    Transactional,
    Promotional,
    Acknowledgement,
    Authentication,
    ServiceRequest,
}

const TRUE_WORDS: &[&str] = &["True", "Yes", "On", "Enabled", "Active", "true"];
const FALSE_WORDS: &[&str] = &["False", "No", "Off", "Disabled", "Inactive", "false"];
const NULL_WORDS: &[&str] = &["Null", "None", "Void", "null"];

impl TokenKind {
    /// Boolean and null literal words, in either capitalized or lowercase form.
    pub fn literal_word(word: &str) -> Option<TokenKind> {
        if TRUE_WORDS.contains(&word) {
            Some(TokenKind::True)
        } else if FALSE_WORDS.contains(&word) {
            Some(TokenKind::False)
        } else if NULL_WORDS.contains(&word) {
            Some(TokenKind::Null)
        } else {
            None
        }
    }

    /// Lowercase keywords (literal words included).
    pub fn keyword(word: &str) -> Option<TokenKind> {
        use TokenKind::*;
        let kind = match word {
            "import" => Import,
            "as" => As,
            "from" => From,
            "agent" => Agent,
            "agentConfig" => AgentConfig,
            "agentDefaults" => AgentDefaults,
            "flow" => Flow,
            "messages" => Messages,
            "message" => Message,
            "with" => With,
            "when" => When,
            "list" => List,
            "of" => Of,
            "text" => Text,
            "richCard" => RichCard,
            "carousel" => Carousel,
            "rbmFile" => RbmFile,
            "file" => File,
            "reply" => Reply,
            "dial" => Dial,
            "openUrl" => OpenUrl,
            "shareLocation" => ShareLocation,
            "viewLocation" => ViewLocation,
            "saveEvent" => SaveEvent,
            "transactional" => Transactional,
            "promotional" => Promotional,
            "acknowledgement" => Acknowledgement,
            "authentication" => Authentication,
            "serviceRequest" => ServiceRequest,
            other => return TokenKind::literal_word(other),
        };
        Some(kind)
    }

    pub fn is_keyword(self) -> bool {
        use TokenKind::*;
        matches!(
            self,
            Import
                | As
                | From
                | Agent
                | AgentConfig
                | AgentDefaults
                | Flow
                | Messages
                | Message
                | With
                | When
                | List
                | Of
        ) || self.is_message_shortcut()
            || self.is_suggestion_shortcut()
            || self.is_traffic_type()
    }

    pub fn is_literal_word(self) -> bool {
        matches!(self, TokenKind::True | TokenKind::False | TokenKind::Null)
    }

    /// Tokens whose text can serve as an attribute key or a name.
    pub fn is_wordlike(self) -> bool {
        matches!(self, TokenKind::ProperWord | TokenKind::CommonNoun)
            || self.is_keyword()
            || self.is_literal_word()
    }

    /// Keywords that open an agent-level section (and `agent` itself).
    pub fn is_section_keyword(self) -> bool {
        matches!(
            self,
            TokenKind::Agent
                | TokenKind::AgentConfig
                | TokenKind::AgentDefaults
                | TokenKind::Flow
                | TokenKind::Messages
        )
    }

    pub fn is_message_shortcut(self) -> bool {
        matches!(
            self,
            TokenKind::Text
                | TokenKind::RichCard
                | TokenKind::Carousel
                | TokenKind::RbmFile
                | TokenKind::File
        )
    }

    pub fn is_suggestion_shortcut(self) -> bool {
        matches!(
            self,
            TokenKind::Reply
                | TokenKind::Dial
                | TokenKind::OpenUrl
                | TokenKind::ShareLocation
                | TokenKind::ViewLocation
                | TokenKind::SaveEvent
        )
    }

    pub fn is_traffic_type(self) -> bool {
        matches!(
            self,
            TokenKind::Transactional
                | TokenKind::Promotional
                | TokenKind::Acknowledgement
                | TokenKind::Authentication
                | TokenKind::ServiceRequest
        )
    }

    pub fn is_multiline_marker(self) -> bool {
        matches!(
            self,
            TokenKind::MultilineClean
                | TokenKind::MultilineStrip
                | TokenKind::MultilinePreserve
                | TokenKind::MultilinePreserveAll
        )
    }

    /// Tokens with no source text of their own.
    pub fn is_structural(self) -> bool {
        matches!(
            self,
            TokenKind::Indent | TokenKind::Dedent | TokenKind::Newline | TokenKind::Eof
        )
    }

    pub fn describe(self) -> &'static str {
        use TokenKind::*;
        match self {
            Indent => "indentation",
            Dedent => "end of block",
            Newline => "end of line",
            Eof => "end of input",
            Colon => "':'",
            Comma => "','",
            LParen => "'('",
            RParen => "')'",
            LBracket => "'['",
            RBracket => "']'",
            LBrace => "'{'",
            RBrace => "'}'",
            Arrow => "'->'",
            Lt => "'<'",
            Gt => "'>'",
            Dot => "'.'",
            Slash => "'/'",
            Dash => "'-'",
            Pipe => "'|'",
            MultilineClean | MultilineStrip | MultilinePreserve | MultilinePreserveAll => {
                "multi-line string marker"
            }
            String => "string",
            Number => "number",
            Atom => "atom",
            True | False => "boolean",
            Null => "null",
            ProperWord => "proper noun",
            CommonNoun => "identifier",
            TypeTagName => "type tag name",
            TypeTagValue => "type tag value",
            TypeTagModifier => "type tag modifier",
            EmbeddedMarker => "embedded expression",
            EmbeddedBlockMarker => "embedded code block",
            EmbeddedCodeContent => "embedded code",
            StringContent => "string content",
            _ => "keyword",
        }
    }
}

/// A lexed terminal. `text` is the exact source slice (empty for
/// zero-width structural tokens).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub start: Position,
    pub end: Position,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, start: Position, end: Position) -> Self {
        Token {
            kind,
            text: text.into(),
            start,
            end,
        }
    }

    pub fn location(&self) -> Location {
        Location::new(self.start, self.end)
    }
}

/// Decode a quoted string lexeme into its content.
///
/// Recognized escapes are `\"`, `\\`, `\n`, `\t` and `\r`; any other escape
/// is kept as written. Surrounding quotes are optional so the function also
/// accepts the body of an unterminated literal.
pub fn decode_string_literal(lexeme: &str) -> String {
    let body = lexeme.strip_prefix('"').unwrap_or(lexeme);
    let body = if body.ends_with('"') && !ends_with_escaped_quote(body) {
        &body[..body.len() - 1]
    } else {
        body
    };

    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

fn ends_with_escaped_quote(body: &str) -> bool {
    let without_quote = &body[..body.len() - 1];
    let backslashes = without_quote.chars().rev().take_while(|&c| c == '\\').count();
    backslashes % 2 == 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_and_common_nouns() {
        assert_eq!(TokenKind::keyword("agent"), Some(TokenKind::Agent));
        assert_eq!(TokenKind::keyword("richCard"), Some(TokenKind::RichCard));
        assert_eq!(TokenKind::keyword("true"), Some(TokenKind::True));
        assert_eq!(TokenKind::keyword("displayName"), None);
    }

    #[test]
    fn literal_words_cover_capitalized_forms() {
        assert_eq!(TokenKind::literal_word("Yes"), Some(TokenKind::True));
        assert_eq!(TokenKind::literal_word("Disabled"), Some(TokenKind::False));
        assert_eq!(TokenKind::literal_word("None"), Some(TokenKind::Null));
        assert_eq!(TokenKind::literal_word("Story"), None);
    }

    #[test]
    fn keyword_classes() {
        assert!(TokenKind::Flow.is_section_keyword());
        assert!(!TokenKind::Message.is_section_keyword());
        assert!(TokenKind::Reply.is_suggestion_shortcut());
        assert!(TokenKind::Carousel.is_message_shortcut());
        assert!(TokenKind::Text.is_wordlike());
        assert!(TokenKind::Null.is_wordlike());
        assert!(!TokenKind::String.is_wordlike());
    }

    #[test]
    fn decodes_escaped_quote() {
        assert_eq!(decode_string_literal(r#""a\"b""#), "a\"b");
    }

    #[test]
    fn decodes_common_escapes_and_keeps_unknown_ones() {
        assert_eq!(decode_string_literal(r#""x\ny\t\\""#), "x\ny\t\\");
        assert_eq!(decode_string_literal(r#""\d+""#), "\\d+");
    }

    #[test]
    fn decodes_unterminated_body() {
        assert_eq!(decode_string_literal("\"open"), "open");
        assert_eq!(decode_string_literal(r#""ends\""#), "ends\"");
    }

    #[test]
    fn token_kind_serializes_screaming_snake() {
        let json = serde_json::to_value(TokenKind::ProperWord).unwrap();
        assert_eq!(json, serde_json::json!("PROPER_WORD"));
    }
}
