//! Values: scalars, type tags, embedded code, multi-line strings and
//! inline or indented collections.

use super::{PResult, Parser};
use crate::ast::{StringChomping, TypeTag, Value};
use crate::token::TokenKind;

impl<'a> Parser<'a> {
    /// Any value, including the forms that span several lines: an indented
    /// list or dictionary after the line break, a `|`-style string body, or
    /// a `$lang>>>` code block.
    pub(super) fn parse_value(&mut self) -> PResult<Value> {
        let kind = self.kind();
        if kind == TokenKind::Newline && self.check_at(1, TokenKind::Indent) {
            self.advance();
            self.advance();
            return if self.check(TokenKind::Dash) {
                self.parse_block_list()
            } else {
                self.parse_block_dictionary()
            };
        }
        if let Some(chomping) = StringChomping::from_marker(kind) {
            let start = self.advance().start;
            let lines = self.collect_content(TokenKind::StringContent);
            let location = self.span_from(start);
            return Ok(self.factory.multiline_string(chomping, &lines, location));
        }
        if kind == TokenKind::EmbeddedBlockMarker {
            let marker = self.advance();
            let lines = self.collect_content(TokenKind::EmbeddedCodeContent);
            let location = self.span_from(marker.start);
            return Ok(self.factory.embedded_code_block(&marker, &lines, location));
        }
        self.parse_inline_value()
    }

    /// A value that fits on the current line.
    pub(super) fn parse_inline_value(&mut self) -> PResult<Value> {
        match self.kind() {
            TokenKind::String => {
                let tok = self.advance();
                Ok(self.factory.string_literal(&tok))
            }
            TokenKind::Number => {
                let tok = self.advance();
                self.factory
                    .number(&tok)
                    .map_err(|e| self.factory_error(e, tok.location()))
            }
            TokenKind::True | TokenKind::False | TokenKind::Null => {
                let tok = self.advance();
                match self.factory.literal_word(&tok) {
                    Some(value) => Ok(value),
                    None => Err(self.unexpected("value")),
                }
            }
            TokenKind::Atom => {
                let tok = self.advance();
                Ok(self.factory.atom(&tok))
            }
            TokenKind::Lt => Ok(Value::TypeTag(self.parse_type_tag()?)),
            TokenKind::EmbeddedMarker => {
                let marker = self.advance();
                let content = if self.check(TokenKind::EmbeddedCodeContent) {
                    Some(self.advance())
                } else {
                    None
                };
                Ok(self.factory.embedded_expression(&marker, content.as_ref()))
            }
            TokenKind::LParen | TokenKind::LBracket => self.parse_inline_list(),
            TokenKind::LBrace => self.parse_inline_dictionary(),
            TokenKind::ProperWord | TokenKind::CommonNoun => self.parse_identifier(),
            _ => Err(self.unexpected("value")),
        }
    }

    /// `< name? value (| modifier)? >`
    pub(super) fn parse_type_tag(&mut self) -> PResult<TypeTag> {
        let start = self.expect(TokenKind::Lt, "'<'")?.start;
        let type_name = if self.check(TokenKind::TypeTagName) {
            Some(self.advance().text)
        } else {
            None
        };
        let value = if self.check(TokenKind::TypeTagValue) {
            self.advance().text
        } else {
            String::new()
        };
        let modifier = if self.eat(TokenKind::Pipe) && self.check(TokenKind::TypeTagModifier) {
            Some(self.advance().text)
        } else {
            None
        };
        self.expect(TokenKind::Gt, "'>' closing type tag")?;
        let location = self.span_from(start);
        Ok(self.factory.type_tag(type_name, value, modifier, location))
    }

    /// `Name(.member)*`
    fn parse_identifier(&mut self) -> PResult<Value> {
        let first = self.advance();
        let mut name = first.text;
        while self.check(TokenKind::Dot)
            && (self.check_at(1, TokenKind::CommonNoun) || self.check_at(1, TokenKind::ProperWord))
        {
            self.advance();
            name.push('.');
            name.push_str(&self.advance().text);
        }
        let location = self.span_from(first.start);
        Ok(self.factory.identifier(name, location))
    }

    fn collect_content(&mut self, kind: TokenKind) -> Vec<String> {
        let mut lines = Vec::new();
        while self.check(kind) {
            lines.push(self.advance().text);
        }
        lines
    }

    // -- Collections ---------------------------------------------

    /// `( a, b )` or `[ a, b ]`, trailing comma allowed.
    fn parse_inline_list(&mut self) -> PResult<Value> {
        let open = self.advance();
        let close = if open.kind == TokenKind::LParen {
            TokenKind::RParen
        } else {
            TokenKind::RBracket
        };
        let mut items = Vec::new();
        while !self.check(close) {
            items.push(self.parse_inline_value()?);
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        let what = if close == TokenKind::RParen { "')'" } else { "']'" };
        self.expect(close, what)?;
        let location = self.span_from(open.start);
        Ok(self.factory.list(Some(open.kind), items, location))
    }

    /// `{ key: value, ... }`, keys may be names or strings.
    fn parse_inline_dictionary(&mut self) -> PResult<Value> {
        let open = self.advance();
        let mut entries = Vec::new();
        while !self.check(TokenKind::RBrace) {
            let start = self.peek().start;
            let key = if self.check(TokenKind::String) {
                self.take_string("dictionary key")?
            } else {
                self.take_name("dictionary key")?
            };
            self.expect(TokenKind::Colon, "':' after dictionary key")?;
            let value = self.parse_inline_value()?;
            let location = self.span_from(start);
            entries.push(self.factory.dictionary_entry(key, value, location));
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RBrace, "'}'")?;
        let location = self.span_from(open.start);
        Ok(self.factory.dictionary(Some(open.kind), entries, location))
    }

    /// `- value` lines of an already opened block.
    fn parse_block_list(&mut self) -> PResult<Value> {
        let start = self.peek().start;
        let mut items = Vec::new();
        self.parse_indented(|p| {
            p.expect(TokenKind::Dash, "'-' list item")?;
            items.push(p.parse_value()?);
            p.finish_line()
        });
        let location = self.span_from(start);
        Ok(self.factory.list(None, items, location))
    }

    /// `key: value` lines of an already opened block.
    fn parse_block_dictionary(&mut self) -> PResult<Value> {
        let start = self.peek().start;
        let mut entries = Vec::new();
        self.parse_indented(|p| {
            let entry_start = p.peek().start;
            let key = p.take_name("dictionary key")?;
            p.expect(TokenKind::Colon, "':' after dictionary key")?;
            let value = p.parse_value()?;
            let location = p.span_from(entry_start);
            p.finish_line()?;
            entries.push(p.factory.dictionary_entry(key, value, location));
            Ok(())
        });
        let location = self.span_from(start);
        Ok(self.factory.dictionary(None, entries, location))
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::parse_src;
    use crate::ast::*;
    use pretty_assertions::assert_eq;

    /// Parse `src` as the body of an `agentConfig` section and return the
    /// value of its first attribute.
    fn value_of(body: &str) -> Value {
        let src = format!("agent A:\n  agentConfig:\n    {}\n", body);
        let result = parse_src(&src);
        assert!(result.errors.is_empty(), "{:?}", result.errors);
        let config = result.ast.unwrap().agent_section.unwrap().config.unwrap();
        config.attributes.into_iter().next().unwrap().value
    }

    #[test]
    fn scalars() {
        assert_eq!(value_of("a: \"hi\"").as_str(), Some("hi"));
        assert!(matches!(value_of("a: -2.5"), Value::Number(n) if n.value == -2.5));
        assert!(matches!(value_of("a: True"), Value::Boolean(b) if b.value));
        assert!(matches!(value_of("a: false"), Value::Boolean(b) if !b.value));
        assert!(matches!(value_of("a: None"), Value::Null(_)));
        assert!(matches!(value_of("a: :express"), Value::Atom(a) if a.name == "express"));
    }

    #[test]
    fn dotted_identifier() {
        match value_of("a: Config.primary") {
            Value::Identifier(id) => {
                assert_eq!(id.name, "Config.primary");
                assert!(!id.is_space_separated);
            }
            other => panic!("expected identifier, got {:?}", other),
        }
    }

    #[test]
    fn type_tag_with_modifier() {
        match value_of("a: <time 4pm | UTC>") {
            Value::TypeTag(tag) => {
                assert_eq!(tag.type_name.as_deref(), Some("time"));
                assert_eq!(tag.value, "4pm");
                assert_eq!(tag.modifier.as_deref(), Some("UTC"));
            }
            other => panic!("expected type tag, got {:?}", other),
        }
    }

    #[test]
    fn inline_collections() {
        match value_of("a: (1, \"two\", :three,)") {
            Value::List(list) => {
                assert!(list.is_inline);
                assert_eq!(list.items.len(), 3);
            }
            other => panic!("expected list, got {:?}", other),
        }
        match value_of("a: {size: \"L\", \"count\": 2}") {
            Value::Dictionary(dict) => {
                assert!(dict.is_inline);
                assert_eq!(dict.get("size").and_then(Value::as_str), Some("L"));
                assert!(dict.get("count").is_some());
            }
            other => panic!("expected dictionary, got {:?}", other),
        }
    }

    #[test]
    fn block_list_and_dictionary() {
        let src = "\
agent A:
  agentConfig:
    tags:
      - \"a\"
      - \"b\"
    contact:
      email: \"x@y.z\"
      phone: <phone 555>
    after: 1
";
        let result = parse_src(src);
        assert!(result.errors.is_empty(), "{:?}", result.errors);
        let config = result.ast.unwrap().agent_section.unwrap().config.unwrap();
        assert_eq!(config.attributes.len(), 3);
        match config.attribute("tags") {
            Some(Value::List(list)) => {
                assert!(!list.is_inline);
                assert_eq!(list.items.len(), 2);
            }
            other => panic!("expected block list, got {:?}", other),
        }
        match config.attribute("contact") {
            Some(Value::Dictionary(dict)) => {
                assert!(!dict.is_inline);
                assert_eq!(dict.entries.len(), 2);
            }
            other => panic!("expected block dictionary, got {:?}", other),
        }
    }

    #[test]
    fn multiline_string_body() {
        let src = concat!(
            "agent A:\n",
            "  agentConfig:\n",
            "    note: |-\n",
            "      Hello\n",
            "        world\n",
            "    after: 1\n",
        );
        let result = parse_src(src);
        assert!(result.errors.is_empty(), "{:?}", result.errors);
        let config = result.ast.unwrap().agent_section.unwrap().config.unwrap();
        match config.attribute("note") {
            Some(Value::String(s)) => {
                assert!(s.is_multiline);
                assert_eq!(s.chomping, Some(StringChomping::Strip));
                assert_eq!(s.value, "Hello\n  world");
            }
            other => panic!("expected multiline string, got {:?}", other),
        }
        assert!(config.attribute("after").is_some());
    }

    #[test]
    fn embedded_code() {
        match value_of("a: $ts> user.name") {
            Value::EmbeddedExpression(e) => {
                assert_eq!(e.language, EmbeddedLanguage::TypeScript);
                assert_eq!(e.content, "user.name");
            }
            other => panic!("expected embedded expression, got {:?}", other),
        }
        let src = "agent A:\n  agentConfig:\n    code: $js>>>\n      let x = 1;\n      return x;\n";
        let result = parse_src(src);
        assert!(result.errors.is_empty(), "{:?}", result.errors);
        let config = result.ast.unwrap().agent_section.unwrap().config.unwrap();
        match config.attribute("code") {
            Some(Value::EmbeddedCodeBlock(b)) => {
                assert_eq!(b.language, EmbeddedLanguage::JavaScript);
                assert_eq!(b.content, vec!["let x = 1;", "return x;"]);
            }
            other => panic!("expected code block, got {:?}", other),
        }
    }

    #[test]
    fn missing_value_is_an_error() {
        let result = parse_src("agent A:\n  agentConfig:\n    a:\n    b: 1\n");
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].message.starts_with("expected value"));
        let config = result.ast.unwrap().agent_section.unwrap().config.unwrap();
        assert!(config.attribute("b").is_some());
    }
}
