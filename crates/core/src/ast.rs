//! AST node families for RCL documents.
//!
//! Nodes are produced once by the [`crate::factory::AstFactory`] during a
//! parse pass and never mutated afterwards. Every node carries an optional
//! [`Location`]; it is absent only on nodes synthesized during recovery.
//! Serialized form uses a `type` discriminator on node enums and camelCase
//! field names.

use crate::position::Location;
use crate::token::TokenKind;
use serde::{Deserialize, Serialize};

// ──────────────────────────────────────────────
// Root
// ──────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RclFile {
    pub imports: Vec<ImportStatement>,
    pub agent_section: Option<AgentDefinition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

impl RclFile {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportStatement {
    /// Namespace segments in source order.
    pub import_path: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

// ──────────────────────────────────────────────
// Agent and its sections
// ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentDefinition {
    pub name: String,
    /// Required by the language, but kept optional so a partial agent is
    /// still representable. Absence is reported by validation.
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<ConfigSection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defaults: Option<DefaultsSection>,
    pub flows: Vec<FlowSection>,
    pub messages: Option<MessagesSection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

/// Body shared by `agentConfig` and `agentDefaults`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub attributes: Vec<Attribute>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mapped_types: Vec<MappedType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

pub type ConfigSection = SettingsSection;
pub type DefaultsSection = SettingsSection;

impl SettingsSection {
    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes
            .iter()
            .find(|a| a.key == key)
            .map(|a| &a.value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attribute {
    pub key: String,
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

// ──────────────────────────────────────────────
// Flows
// ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowSection {
    pub name: String,
    pub rules: Vec<FlowRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

/// `A -> B -> C with k: v`, optionally followed by an indented block of
/// `when` clauses. Always has at least two operands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowRule {
    pub operands: Vec<FlowOperand>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub with_clause: Option<WithClause>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub when_clauses: Vec<WhenClause>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

impl FlowRule {
    pub fn source(&self) -> Option<&FlowOperand> {
        self.operands.first()
    }

    /// Consecutive hops of the chain. The rule's `with` clause belongs to
    /// the final hop.
    pub fn transitions(&self) -> Vec<FlowTransition> {
        let hops = self.operands.len().saturating_sub(1);
        self.operands
            .windows(2)
            .enumerate()
            .map(|(i, pair)| FlowTransition {
                source: pair[0].clone(),
                destination: pair[1].clone(),
                with_clause: if i + 1 == hops {
                    self.with_clause.clone()
                } else {
                    None
                },
                location: self.location,
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowOperandType {
    Atom,
    String,
    Identifier,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowOperand {
    pub operand_type: FlowOperandType,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowTransition {
    pub source: FlowOperand,
    pub destination: FlowOperand,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub with_clause: Option<WithClause>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithClause {
    pub parameters: Vec<Attribute>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

/// A guarded branch. The condition is opaque data, never evaluated here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhenClause {
    pub condition: Value,
    pub operands: Vec<FlowOperand>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub with_clause: Option<WithClause>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

// ──────────────────────────────────────────────
// Messages
// ──────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagesSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub messages: Vec<MessageEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MessageTrafficType {
    Transactional,
    Promotional,
    Acknowledgement,
    Authentication,
    ServiceRequest,
}

impl MessageTrafficType {
    pub fn from_token(kind: TokenKind) -> Option<Self> {
        match kind {
            TokenKind::Transactional => Some(MessageTrafficType::Transactional),
            TokenKind::Promotional => Some(MessageTrafficType::Promotional),
            TokenKind::Acknowledgement => Some(MessageTrafficType::Acknowledgement),
            TokenKind::Authentication => Some(MessageTrafficType::Authentication),
            TokenKind::ServiceRequest => Some(MessageTrafficType::ServiceRequest),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum MessageEntry {
    #[serde(rename = "MessageDefinition")]
    Definition(MessageDefinition),
    #[serde(rename = "TextShortcut")]
    Text(TextShortcut),
    #[serde(rename = "RichCardShortcut")]
    RichCard(RichCardShortcut),
    #[serde(rename = "CarouselShortcut")]
    Carousel(CarouselShortcut),
    #[serde(rename = "RbmFileShortcut")]
    RbmFile(RbmFileShortcut),
    #[serde(rename = "FileShortcut")]
    File(FileShortcut),
}

impl MessageEntry {
    pub fn name(&self) -> Option<&str> {
        match self {
            MessageEntry::Definition(m) => Some(m.name.as_str()),
            MessageEntry::Text(m) => m.name.as_deref(),
            MessageEntry::RichCard(m) => m.name.as_deref(),
            MessageEntry::Carousel(m) => m.name.as_deref(),
            MessageEntry::RbmFile(m) => m.name.as_deref(),
            MessageEntry::File(m) => m.name.as_deref(),
        }
    }

    pub fn location(&self) -> Option<Location> {
        match self {
            MessageEntry::Definition(m) => m.location,
            MessageEntry::Text(m) => m.location,
            MessageEntry::RichCard(m) => m.location,
            MessageEntry::Carousel(m) => m.location,
            MessageEntry::RbmFile(m) => m.location,
            MessageEntry::File(m) => m.location,
        }
    }

    pub fn suggestions(&self) -> &[SuggestionShortcut] {
        match self {
            MessageEntry::Definition(m) => &m.suggestions,
            MessageEntry::Text(m) => &m.suggestions,
            MessageEntry::RichCard(m) => &m.suggestions,
            MessageEntry::Carousel(m) => &m.suggestions,
            MessageEntry::RbmFile(m) => &m.suggestions,
            MessageEntry::File(m) => &m.suggestions,
        }
    }
}

/// Block form: `Name:` followed by attributes and suggestions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageDefinition {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traffic_type: Option<MessageTrafficType>,
    pub attributes: Vec<Attribute>,
    pub suggestions: Vec<SuggestionShortcut>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextShortcut {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traffic_type: Option<MessageTrafficType>,
    pub text: String,
    pub suggestions: Vec<SuggestionShortcut>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardOrientation {
    Horizontal,
    Vertical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageAlignment {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaHeight {
    Short,
    Medium,
    Tall,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardWidth {
    Small,
    Medium,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RichCardShortcut {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traffic_type: Option<MessageTrafficType>,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orientation: Option<CardOrientation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alignment: Option<ImageAlignment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<MediaHeight>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub suggestions: Vec<SuggestionShortcut>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarouselShortcut {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traffic_type: Option<MessageTrafficType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_width: Option<CardWidth>,
    pub cards: Vec<RichCardShortcut>,
    pub suggestions: Vec<SuggestionShortcut>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RbmFileShortcut {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traffic_type: Option<MessageTrafficType>,
    pub file_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    pub suggestions: Vec<SuggestionShortcut>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileShortcut {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traffic_type: Option<MessageTrafficType>,
    pub url: String,
    pub suggestions: Vec<SuggestionShortcut>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

// ──────────────────────────────────────────────
// Suggestions
// ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SuggestionShortcut {
    #[serde(rename = "ReplyShortcut")]
    Reply(ReplyShortcut),
    #[serde(rename = "DialShortcut")]
    Dial(DialShortcut),
    #[serde(rename = "OpenUrlShortcut")]
    OpenUrl(OpenUrlShortcut),
    #[serde(rename = "ShareLocationShortcut")]
    ShareLocation(ShareLocationShortcut),
    #[serde(rename = "ViewLocationShortcut")]
    ViewLocation(ViewLocationShortcut),
    #[serde(rename = "SaveEventShortcut")]
    SaveEvent(SaveEventShortcut),
}

impl SuggestionShortcut {
    /// Label shown on the suggestion chip.
    pub fn text(&self) -> &str {
        match self {
            SuggestionShortcut::Reply(s) => &s.text,
            SuggestionShortcut::Dial(s) => &s.text,
            SuggestionShortcut::OpenUrl(s) => &s.text,
            SuggestionShortcut::ShareLocation(s) => &s.text,
            SuggestionShortcut::ViewLocation(s) => &s.text,
            SuggestionShortcut::SaveEvent(s) => &s.text,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyShortcut {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postback_data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialShortcut {
    pub text: String,
    pub phone_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpenUrlApplication {
    Browser,
    Webview,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WebviewMode {
    Full,
    Half,
    Tall,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenUrlShortcut {
    pub text: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application: Option<OpenUrlApplication>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webview_mode: Option<WebviewMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareLocationShortcut {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewLocationShortcut {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveEventShortcut {
    pub text: String,
    pub title: String,
    pub start_time: TypeTag,
    pub end_time: TypeTag,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

// ──────────────────────────────────────────────
// Values
// ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Value {
    #[serde(rename = "StringValue")]
    String(StringValue),
    #[serde(rename = "NumberValue")]
    Number(NumberValue),
    #[serde(rename = "BooleanValue")]
    Boolean(BooleanValue),
    #[serde(rename = "NullValue")]
    Null(NullValue),
    #[serde(rename = "IdentifierValue")]
    Identifier(IdentifierValue),
    #[serde(rename = "AtomValue")]
    Atom(AtomValue),
    TypeTag(TypeTag),
    #[serde(rename = "ListValue")]
    List(ListValue),
    #[serde(rename = "DictionaryValue")]
    Dictionary(DictionaryValue),
    EmbeddedExpression(EmbeddedExpression),
    EmbeddedCodeBlock(EmbeddedCodeBlock),
}

impl Value {
    pub fn location(&self) -> Option<Location> {
        match self {
            Value::String(v) => v.location,
            Value::Number(v) => v.location,
            Value::Boolean(v) => v.location,
            Value::Null(v) => v.location,
            Value::Identifier(v) => v.location,
            Value::Atom(v) => v.location,
            Value::TypeTag(v) => v.location,
            Value::List(v) => v.location,
            Value::Dictionary(v) => v.location,
            Value::EmbeddedExpression(v) => v.location,
            Value::EmbeddedCodeBlock(v) => v.location,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(&s.value),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StringValue {
    pub value: String,
    #[serde(default)]
    pub is_multiline: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chomping: Option<StringChomping>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumberValue {
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BooleanValue {
    pub value: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NullValue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentifierValue {
    pub name: String,
    /// `Choose Size` rather than `chooseSize`.
    #[serde(default)]
    pub is_space_separated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

/// `:name`, stored without the colon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtomValue {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

/// `<type value | modifier>`. Bare tags like `<https://...>` have no type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeTag {
    pub type_name: Option<String>,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListValue {
    pub items: Vec<Value>,
    /// Set by `(`/`[` openers; block lists are never inline.
    pub is_inline: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DictionaryValue {
    pub entries: Vec<DictionaryEntry>,
    pub is_inline: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

impl DictionaryValue {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|e| e.key == key).map(|e| &e.value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DictionaryEntry {
    pub key: String,
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

/// `Name list of (T1, T2):` followed by one row of values per line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappedType {
    pub name: String,
    pub schema: Vec<String>,
    pub items: Vec<MappedTypeItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappedTypeItem {
    pub values: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

// ──────────────────────────────────────────────
// Embedded code
// ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddedLanguage {
    JavaScript,
    TypeScript,
    /// `$>` / `$>>>`: host default.
    Default,
}

impl EmbeddedLanguage {
    /// Language of a `$js>`, `$ts>>>`, `$>` ... marker lexeme.
    pub fn from_marker(marker: &str) -> Self {
        let tag = marker.trim_start_matches('$').trim_end_matches('>');
        match tag {
            "js" => EmbeddedLanguage::JavaScript,
            "ts" => EmbeddedLanguage::TypeScript,
            _ => EmbeddedLanguage::Default,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddedExpression {
    pub language: EmbeddedLanguage,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddedCodeBlock {
    pub language: EmbeddedLanguage,
    pub content: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

// ──────────────────────────────────────────────
// Multi-line string chomping
// ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StringChomping {
    /// `|`: base indent stripped, one trailing newline.
    Clean,
    /// `|-`: base indent stripped, no trailing newline.
    Strip,
    /// `+|`: lines verbatim, one trailing newline.
    Preserve,
    /// `+|+`: lines verbatim, every trailing newline kept.
    PreserveAll,
}

impl StringChomping {
    pub fn from_marker(kind: TokenKind) -> Option<Self> {
        match kind {
            TokenKind::MultilineClean => Some(StringChomping::Clean),
            TokenKind::MultilineStrip => Some(StringChomping::Strip),
            TokenKind::MultilinePreserve => Some(StringChomping::Preserve),
            TokenKind::MultilinePreserveAll => Some(StringChomping::PreserveAll),
            _ => None,
        }
    }

    pub fn preserves_indentation(self) -> bool {
        matches!(self, StringChomping::Preserve | StringChomping::PreserveAll)
    }

    /// Build the string value from the raw captured lines.
    pub fn apply(self, lines: &[String]) -> String {
        let body_len = lines
            .iter()
            .rposition(|l| !is_blank(l))
            .map_or(0, |i| i + 1);
        let (body, trailing) = lines.split_at(body_len);

        let mut out = if self.preserves_indentation() {
            body.join("\n")
        } else {
            strip_common_indent(body).join("\n")
        };

        match self {
            StringChomping::Strip => {}
            StringChomping::Clean | StringChomping::Preserve => {
                if !body.is_empty() {
                    out.push('\n');
                }
            }
            StringChomping::PreserveAll => {
                if !body.is_empty() {
                    out.push('\n');
                }
                for _ in trailing {
                    out.push('\n');
                }
            }
        }
        out
    }
}

fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

fn indent_width(line: &str) -> usize {
    line.chars().take_while(|c| matches!(c, ' ' | '\t')).count()
}

/// Remove the smallest indentation shared by all non-blank lines. Blank
/// lines become empty.
pub(crate) fn strip_common_indent(lines: &[String]) -> Vec<String> {
    let base = lines
        .iter()
        .filter(|l| !is_blank(l))
        .map(|l| indent_width(l))
        .min()
        .unwrap_or(0);
    lines
        .iter()
        .map(|l| {
            if is_blank(l) {
                String::new()
            } else {
                // Indentation is ASCII, so the byte index is a char boundary.
                l[base..].to_owned()
            }
        })
        .collect()
}

/// Embedded block content: common indentation removed, trailing blank lines
/// dropped.
pub(crate) fn dedent_block(lines: &[String]) -> Vec<String> {
    let body_len = lines
        .iter()
        .rposition(|l| !is_blank(l))
        .map_or(0, |i| i + 1);
    strip_common_indent(&lines[..body_len])
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn lines(src: &[&str]) -> Vec<String> {
        src.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn clean_strips_base_indent_and_keeps_one_newline() {
        let body = lines(&["  Hello", "    world", "", ""]);
        assert_eq!(StringChomping::Clean.apply(&body), "Hello\n  world\n");
    }

    #[test]
    fn strip_removes_all_trailing_newlines() {
        let body = lines(&["  Hello", "  world", ""]);
        assert_eq!(StringChomping::Strip.apply(&body), "Hello\nworld");
    }

    #[test]
    fn preserve_keeps_indentation() {
        let body = lines(&["  Hello", "    world", "", ""]);
        assert_eq!(StringChomping::Preserve.apply(&body), "  Hello\n    world\n");
    }

    #[test]
    fn preserve_all_keeps_every_trailing_newline() {
        let body = lines(&["  Hello", "", ""]);
        assert_eq!(StringChomping::PreserveAll.apply(&body), "  Hello\n\n\n");
    }

    #[test]
    fn interior_blank_lines_survive() {
        let body = lines(&["  a", "", "  b"]);
        assert_eq!(StringChomping::Clean.apply(&body), "a\n\nb\n");
    }

    #[test]
    fn empty_body_is_empty_string() {
        assert_eq!(StringChomping::Clean.apply(&[]), "");
        assert_eq!(StringChomping::Strip.apply(&lines(&["", ""])), "");
    }

    #[test]
    fn dedent_block_drops_trailing_blank_lines() {
        let body = lines(&["    let a = 1;", "      return a;", "", "  "]);
        assert_eq!(dedent_block(&body), vec!["let a = 1;", "  return a;"]);
    }

    fn operand(value: &str) -> FlowOperand {
        FlowOperand {
            operand_type: FlowOperandType::Identifier,
            value: value.to_owned(),
            location: None,
        }
    }

    #[test]
    fn transitions_pair_consecutive_operands() {
        let rule = FlowRule {
            operands: vec![operand("A"), operand("B"), operand("C")],
            with_clause: Some(WithClause {
                parameters: Vec::new(),
                location: None,
            }),
            when_clauses: Vec::new(),
            location: None,
        };
        let hops = rule.transitions();
        assert_eq!(hops.len(), 2);
        assert_eq!(hops[0].source.value, "A");
        assert_eq!(hops[0].destination.value, "B");
        assert!(hops[0].with_clause.is_none());
        assert_eq!(hops[1].destination.value, "C");
        assert!(hops[1].with_clause.is_some());
    }

    #[test]
    fn values_serialize_with_type_tag() {
        let v = Value::Atom(AtomValue {
            name: "start".into(),
            location: None,
        });
        let json = serde_json::to_value(&v).unwrap();
        assert_eq!(json, serde_json::json!({ "type": "AtomValue", "name": "start" }));
    }

    #[test]
    fn embedded_language_from_marker() {
        assert_eq!(EmbeddedLanguage::from_marker("$js>"), EmbeddedLanguage::JavaScript);
        assert_eq!(EmbeddedLanguage::from_marker("$ts>>>"), EmbeddedLanguage::TypeScript);
        assert_eq!(EmbeddedLanguage::from_marker("$>"), EmbeddedLanguage::Default);
    }
}
