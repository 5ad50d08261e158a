//! AST Factory: the one place nodes are constructed.
//!
//! Constructors attach locations, decode literal lexemes and enforce the
//! node-shape invariants (flow rules have a source and a destination,
//! collection `is_inline` follows the opening delimiter). Everything else is
//! permissive; an agent with no flows or no display name is still built.

use crate::ast::*;
use crate::error::FactoryError;
use crate::position::Location;
use crate::token::{decode_string_literal, Token, TokenKind};

#[derive(Debug, Clone, Copy, Default)]
pub struct AstFactory;

/// Agent body as the parser collects it, before the node is built.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AgentParts {
    pub display_name: Option<String>,
    pub brand_name: Option<String>,
    pub config: Option<ConfigSection>,
    pub defaults: Option<DefaultsSection>,
    pub flows: Vec<FlowSection>,
    pub messages: Option<MessagesSection>,
}

/// Rich card options, image and block contents, collected before the card
/// is built.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CardParts {
    pub orientation: Option<CardOrientation>,
    pub alignment: Option<ImageAlignment>,
    pub height: Option<MediaHeight>,
    pub image_url: Option<String>,
    pub description: Option<String>,
    pub suggestions: Vec<SuggestionShortcut>,
}

impl AstFactory {
    pub fn new() -> Self {
        AstFactory
    }

    // -- Root and sections ---------------------------------------

    pub fn rcl_file(
        &self,
        imports: Vec<ImportStatement>,
        agent_section: Option<AgentDefinition>,
        location: Option<Location>,
    ) -> RclFile {
        RclFile {
            imports,
            agent_section,
            location,
        }
    }

    pub fn import_statement(
        &self,
        import_path: Vec<String>,
        alias: Option<String>,
        source: Option<String>,
        location: Location,
    ) -> ImportStatement {
        ImportStatement {
            import_path,
            alias,
            source,
            location: Some(location),
        }
    }

    /// Missing sections stay `None`; an agent without flows or a display
    /// name is still built.
    pub fn agent_definition(
        &self,
        name: impl Into<String>,
        parts: AgentParts,
        location: Location,
    ) -> AgentDefinition {
        AgentDefinition {
            name: name.into(),
            display_name: parts.display_name,
            brand_name: parts.brand_name,
            config: parts.config,
            defaults: parts.defaults,
            flows: parts.flows,
            messages: parts.messages,
            location: Some(location),
        }
    }

    pub fn settings_section(
        &self,
        name: Option<String>,
        attributes: Vec<Attribute>,
        mapped_types: Vec<MappedType>,
        location: Location,
    ) -> SettingsSection {
        SettingsSection {
            name,
            attributes,
            mapped_types,
            location: Some(location),
        }
    }

    pub fn attribute(
        &self,
        key: impl Into<String>,
        value: Value,
        location: Location,
    ) -> Attribute {
        Attribute {
            key: key.into(),
            value,
            location: Some(location),
        }
    }

    // -- Flows ---------------------------------------------------

    pub fn flow_section(
        &self,
        name: impl Into<String>,
        rules: Vec<FlowRule>,
        location: Location,
    ) -> FlowSection {
        FlowSection {
            name: name.into(),
            rules,
            location: Some(location),
        }
    }

    pub fn flow_rule(
        &self,
        operands: Vec<FlowOperand>,
        with_clause: Option<WithClause>,
        when_clauses: Vec<WhenClause>,
        location: Location,
    ) -> Result<FlowRule, FactoryError> {
        if operands.len() < 2 {
            return Err(FactoryError::IncompleteFlowRule {
                found: operands.len(),
            });
        }
        Ok(FlowRule {
            operands,
            with_clause,
            when_clauses,
            location: Some(location),
        })
    }

    pub fn when_clause(
        &self,
        condition: Value,
        operands: Vec<FlowOperand>,
        with_clause: Option<WithClause>,
        location: Location,
    ) -> Result<WhenClause, FactoryError> {
        if operands.is_empty() {
            return Err(FactoryError::IncompleteWhenClause);
        }
        Ok(WhenClause {
            condition,
            operands,
            with_clause,
            location: Some(location),
        })
    }

    pub fn with_clause(&self, parameters: Vec<Attribute>, location: Location) -> WithClause {
        WithClause {
            parameters,
            location: Some(location),
        }
    }

    /// Operand from a single token, or `None` if the token cannot name a
    /// flow state. Any word (keywords and literal words included) names a
    /// state, the same words a message name may use.
    pub fn flow_operand(&self, token: &Token) -> Option<FlowOperand> {
        let (operand_type, value) = match token.kind {
            TokenKind::Atom => (FlowOperandType::Atom, atom_name(&token.text)),
            TokenKind::String => (FlowOperandType::String, decode_string_literal(&token.text)),
            k if k.is_wordlike() => (FlowOperandType::Identifier, token.text.clone()),
            _ => return None,
        };
        Some(FlowOperand {
            operand_type,
            value,
            location: Some(token.location()),
        })
    }

    // -- Messages ------------------------------------------------

    pub fn messages_section(
        &self,
        name: Option<String>,
        messages: Vec<MessageEntry>,
        location: Location,
    ) -> MessagesSection {
        MessagesSection {
            name,
            messages,
            location: Some(location),
        }
    }

    pub fn message_definition(
        &self,
        name: impl Into<String>,
        traffic_type: Option<MessageTrafficType>,
        attributes: Vec<Attribute>,
        suggestions: Vec<SuggestionShortcut>,
        location: Location,
    ) -> MessageEntry {
        MessageEntry::Definition(MessageDefinition {
            name: name.into(),
            traffic_type,
            attributes,
            suggestions,
            location: Some(location),
        })
    }

    pub fn text_shortcut(
        &self,
        name: Option<String>,
        traffic_type: Option<MessageTrafficType>,
        text: String,
        suggestions: Vec<SuggestionShortcut>,
        location: Location,
    ) -> TextShortcut {
        TextShortcut {
            name,
            traffic_type,
            text,
            suggestions,
            location: Some(location),
        }
    }

    pub fn rich_card(
        &self,
        name: Option<String>,
        traffic_type: Option<MessageTrafficType>,
        title: String,
        parts: CardParts,
        location: Location,
    ) -> RichCardShortcut {
        RichCardShortcut {
            name,
            traffic_type,
            title,
            description: parts.description,
            orientation: parts.orientation,
            alignment: parts.alignment,
            height: parts.height,
            image_url: parts.image_url,
            suggestions: parts.suggestions,
            location: Some(location),
        }
    }

    pub fn carousel(
        &self,
        name: Option<String>,
        traffic_type: Option<MessageTrafficType>,
        card_width: Option<CardWidth>,
        cards: Vec<RichCardShortcut>,
        suggestions: Vec<SuggestionShortcut>,
        location: Location,
    ) -> CarouselShortcut {
        CarouselShortcut {
            name,
            traffic_type,
            card_width,
            cards,
            suggestions,
            location: Some(location),
        }
    }

    pub fn rbm_file(
        &self,
        name: Option<String>,
        traffic_type: Option<MessageTrafficType>,
        file_url: String,
        thumbnail_url: Option<String>,
        suggestions: Vec<SuggestionShortcut>,
        location: Location,
    ) -> RbmFileShortcut {
        RbmFileShortcut {
            name,
            traffic_type,
            file_url,
            thumbnail_url,
            suggestions,
            location: Some(location),
        }
    }

    pub fn file(
        &self,
        name: Option<String>,
        traffic_type: Option<MessageTrafficType>,
        url: String,
        suggestions: Vec<SuggestionShortcut>,
        location: Location,
    ) -> FileShortcut {
        FileShortcut {
            name,
            traffic_type,
            url,
            suggestions,
            location: Some(location),
        }
    }

    // -- Suggestions ---------------------------------------------

    pub fn reply(
        &self,
        text: String,
        postback_data: Option<String>,
        location: Location,
    ) -> SuggestionShortcut {
        SuggestionShortcut::Reply(ReplyShortcut {
            text,
            postback_data,
            location: Some(location),
        })
    }

    pub fn dial(
        &self,
        text: String,
        phone_number: String,
        location: Location,
    ) -> SuggestionShortcut {
        SuggestionShortcut::Dial(DialShortcut {
            text,
            phone_number,
            location: Some(location),
        })
    }

    pub fn open_url(
        &self,
        text: String,
        url: String,
        application: Option<OpenUrlApplication>,
        webview_mode: Option<WebviewMode>,
        location: Location,
    ) -> SuggestionShortcut {
        SuggestionShortcut::OpenUrl(OpenUrlShortcut {
            text,
            url,
            application,
            webview_mode,
            location: Some(location),
        })
    }

    pub fn share_location(&self, text: String, location: Location) -> SuggestionShortcut {
        SuggestionShortcut::ShareLocation(ShareLocationShortcut {
            text,
            location: Some(location),
        })
    }

    pub fn view_location(
        &self,
        text: String,
        query: Option<String>,
        location: Location,
    ) -> SuggestionShortcut {
        SuggestionShortcut::ViewLocation(ViewLocationShortcut {
            text,
            query,
            location: Some(location),
        })
    }

    pub fn save_event(
        &self,
        text: String,
        title: String,
        start_time: TypeTag,
        end_time: TypeTag,
        description: Option<String>,
        location: Location,
    ) -> SuggestionShortcut {
        SuggestionShortcut::SaveEvent(SaveEventShortcut {
            text,
            title,
            start_time,
            end_time,
            description,
            location: Some(location),
        })
    }

    // -- Values --------------------------------------------------

    /// Decoded content of a quoted `STRING` token.
    pub fn string_literal(&self, token: &Token) -> Value {
        Value::String(StringValue {
            value: decode_string_literal(&token.text),
            is_multiline: false,
            chomping: None,
            location: Some(token.location()),
        })
    }

    pub fn multiline_string(
        &self,
        chomping: StringChomping,
        lines: &[String],
        location: Location,
    ) -> Value {
        Value::String(StringValue {
            value: chomping.apply(lines),
            is_multiline: true,
            chomping: Some(chomping),
            location: Some(location),
        })
    }

    pub fn number(&self, token: &Token) -> Result<Value, FactoryError> {
        let value = token
            .text
            .parse::<f64>()
            .map_err(|_| FactoryError::InvalidNumber(token.text.clone()))?;
        Ok(Value::Number(NumberValue {
            value,
            location: Some(token.location()),
        }))
    }

    /// `True`/`Yes`/... or `False`/`No`/... or a null word, by token kind.
    pub fn literal_word(&self, token: &Token) -> Option<Value> {
        let location = Some(token.location());
        match token.kind {
            TokenKind::True => Some(Value::Boolean(BooleanValue {
                value: true,
                location,
            })),
            TokenKind::False => Some(Value::Boolean(BooleanValue {
                value: false,
                location,
            })),
            TokenKind::Null => Some(Value::Null(NullValue { location })),
            _ => None,
        }
    }

    pub fn identifier(&self, name: impl Into<String>, location: Location) -> Value {
        let name = name.into();
        Value::Identifier(IdentifierValue {
            is_space_separated: name.contains(' '),
            name,
            location: Some(location),
        })
    }

    pub fn atom(&self, token: &Token) -> Value {
        Value::Atom(AtomValue {
            name: atom_name(&token.text),
            location: Some(token.location()),
        })
    }

    pub fn type_tag(
        &self,
        type_name: Option<String>,
        value: String,
        modifier: Option<String>,
        location: Location,
    ) -> TypeTag {
        TypeTag {
            type_name,
            value,
            modifier,
            location: Some(location),
        }
    }

    /// `opener` is the token that started the list; `None` for block lists.
    pub fn list(
        &self,
        opener: Option<TokenKind>,
        items: Vec<Value>,
        location: Location,
    ) -> Value {
        Value::List(ListValue {
            items,
            is_inline: matches!(opener, Some(TokenKind::LParen | TokenKind::LBracket)),
            location: Some(location),
        })
    }

    /// `opener` is the token that started the dictionary; `None` for block
    /// dictionaries.
    pub fn dictionary(
        &self,
        opener: Option<TokenKind>,
        entries: Vec<DictionaryEntry>,
        location: Location,
    ) -> Value {
        Value::Dictionary(DictionaryValue {
            entries,
            is_inline: opener == Some(TokenKind::LBrace),
            location: Some(location),
        })
    }

    pub fn dictionary_entry(
        &self,
        key: impl Into<String>,
        value: Value,
        location: Location,
    ) -> DictionaryEntry {
        DictionaryEntry {
            key: key.into(),
            value,
            location: Some(location),
        }
    }

    pub fn mapped_type(
        &self,
        name: impl Into<String>,
        schema: Vec<String>,
        items: Vec<MappedTypeItem>,
        location: Location,
    ) -> MappedType {
        MappedType {
            name: name.into(),
            schema,
            items,
            location: Some(location),
        }
    }

    pub fn mapped_type_item(&self, values: Vec<Value>, location: Location) -> MappedTypeItem {
        MappedTypeItem {
            values,
            location: Some(location),
        }
    }

    pub fn embedded_expression(&self, marker: &Token, content: Option<&Token>) -> Value {
        let location = match content {
            Some(c) => marker.location().cover(c.location()),
            None => marker.location(),
        };
        Value::EmbeddedExpression(EmbeddedExpression {
            language: EmbeddedLanguage::from_marker(&marker.text),
            content: content.map(|c| c.text.clone()).unwrap_or_default(),
            location: Some(location),
        })
    }

    pub fn embedded_code_block(
        &self,
        marker: &Token,
        lines: &[String],
        location: Location,
    ) -> Value {
        Value::EmbeddedCodeBlock(EmbeddedCodeBlock {
            language: EmbeddedLanguage::from_marker(&marker.text),
            content: dedent_block(lines),
            location: Some(location),
        })
    }
}

fn atom_name(text: &str) -> String {
    text.strip_prefix(':').unwrap_or(text).to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::Position;

    fn tok(kind: TokenKind, text: &str) -> Token {
        let end = Position::new(1, 1 + text.len() as u32, text.len());
        Token::new(kind, text, Position::START, end)
    }

    fn operand(value: &str) -> FlowOperand {
        AstFactory.flow_operand(&tok(TokenKind::ProperWord, value)).unwrap()
    }

    fn loc() -> Location {
        Location::point(Position::START)
    }

    #[test]
    fn flow_rule_requires_two_operands() {
        let f = AstFactory::new();
        let err = f
            .flow_rule(vec![operand("A")], None, Vec::new(), loc())
            .unwrap_err();
        assert_eq!(err, FactoryError::IncompleteFlowRule { found: 1 });
        assert!(f
            .flow_rule(vec![operand("A"), operand("B")], None, Vec::new(), loc())
            .is_ok());
    }

    #[test]
    fn when_clause_requires_destination() {
        let f = AstFactory::new();
        let cond = f.identifier("ready", loc());
        assert_eq!(
            f.when_clause(cond, Vec::new(), None, loc()).unwrap_err(),
            FactoryError::IncompleteWhenClause
        );
    }

    #[test]
    fn operands_are_classified_by_token_kind() {
        let f = AstFactory::new();
        let atom = f.flow_operand(&tok(TokenKind::Atom, ":start")).unwrap();
        assert_eq!(atom.operand_type, FlowOperandType::Atom);
        assert_eq!(atom.value, "start");
        let s = f.flow_operand(&tok(TokenKind::String, "\"End\"")).unwrap();
        assert_eq!(s.operand_type, FlowOperandType::String);
        assert_eq!(s.value, "End");
        assert!(f.flow_operand(&tok(TokenKind::Colon, ":")).is_none());
    }

    #[test]
    fn keyword_words_name_flow_states() {
        let f = AstFactory::new();
        let file = f.flow_operand(&tok(TokenKind::File, "file")).unwrap();
        assert_eq!(file.operand_type, FlowOperandType::Identifier);
        assert_eq!(file.value, "file");
        let no = f.flow_operand(&tok(TokenKind::False, "No")).unwrap();
        assert_eq!(no.operand_type, FlowOperandType::Identifier);
    }

    #[test]
    fn collection_inline_flag_follows_opener() {
        let f = AstFactory::new();
        let inline = f.list(Some(TokenKind::LBracket), Vec::new(), loc());
        let block = f.list(None, Vec::new(), loc());
        assert!(matches!(inline, Value::List(ListValue { is_inline: true, .. })));
        assert!(matches!(block, Value::List(ListValue { is_inline: false, .. })));
        let dict = f.dictionary(Some(TokenKind::LBrace), Vec::new(), loc());
        assert!(matches!(dict, Value::Dictionary(DictionaryValue { is_inline: true, .. })));
    }

    #[test]
    fn string_literal_is_decoded() {
        let v = AstFactory.string_literal(&tok(TokenKind::String, r#""a\"b""#));
        assert_eq!(v.as_str(), Some("a\"b"));
    }

    #[test]
    fn identifier_records_space_separation() {
        let v = AstFactory.identifier("Choose Size", loc());
        assert!(matches!(
            v,
            Value::Identifier(IdentifierValue { is_space_separated: true, .. })
        ));
    }

    #[test]
    fn agent_without_flows_is_constructible() {
        let agent = AstFactory.agent_definition("Bot", AgentParts::default(), loc());
        assert!(agent.flows.is_empty());
        assert!(agent.display_name.is_none());
    }

    #[test]
    fn agent_takes_every_collected_part() {
        let parts = AgentParts {
            display_name: Some("Bot".into()),
            flows: vec![AstFactory.flow_section("Main", Vec::new(), loc())],
            ..AgentParts::default()
        };
        let agent = AstFactory.agent_definition("Bot", parts, loc());
        assert_eq!(agent.display_name.as_deref(), Some("Bot"));
        assert_eq!(agent.flows.len(), 1);
        assert!(agent.messages.is_none());
    }

    #[test]
    fn rich_card_takes_every_collected_part() {
        let parts = CardParts {
            orientation: Some(CardOrientation::Vertical),
            image_url: Some("https://x/a.png".into()),
            description: Some("More".into()),
            ..CardParts::default()
        };
        let traffic = Some(MessageTrafficType::Promotional);
        let card = AstFactory.rich_card(None, traffic, "Title".into(), parts, loc());
        assert_eq!(card.orientation, Some(CardOrientation::Vertical));
        assert_eq!(card.image_url.as_deref(), Some("https://x/a.png"));
        assert_eq!(card.description.as_deref(), Some("More"));
        assert_eq!(card.traffic_type, traffic);
        assert!(card.alignment.is_none());
    }

    #[test]
    fn invalid_number_is_an_error() {
        let err = AstFactory.number(&tok(TokenKind::Number, "1.2.3")).unwrap_err();
        assert_eq!(err, FactoryError::InvalidNumber("1.2.3".into()));
        assert!(AstFactory.number(&tok(TokenKind::Number, "-4.5e2")).is_ok());
    }
}
