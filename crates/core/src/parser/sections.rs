//! Imports, the agent definition and its settings sections.

use super::{PResult, Parser};
use crate::ast::{AgentDefinition, Attribute, ImportStatement, MappedType, SettingsSection};
use crate::error::ParseError;
use crate::factory::AgentParts;
use crate::token::TokenKind;
use tracing::trace;

impl<'a> Parser<'a> {
    /// `import A/B/C (as Alias)? (from "source")?`
    pub(super) fn parse_import(&mut self) -> PResult<ImportStatement> {
        let start = self.advance().start;
        let mut import_path = vec![self.take_name("import path")?];
        while self.eat(TokenKind::Slash) {
            import_path.push(self.take_name("import path segment")?);
        }
        let alias = if self.eat(TokenKind::As) {
            Some(self.take_name("import alias")?)
        } else {
            None
        };
        let source = if self.eat(TokenKind::From) {
            Some(self.take_string("import source")?)
        } else {
            None
        };
        let location = self.span_from(start);
        self.finish_line()?;
        Ok(self
            .factory
            .import_statement(import_path, alias, source, location))
    }

    pub(super) fn parse_agent(&mut self) -> PResult<AgentDefinition> {
        let start = self.advance().start;
        let name = self.take_name("agent name")?;
        trace!(%name, "agent");
        self.expect(TokenKind::Colon, "':' after agent name")?;

        let mut parts = AgentParts::default();
        self.parse_block(|p| p.parse_agent_item(&mut parts))?;
        let location = self.span_from(start);
        Ok(self.factory.agent_definition(name, parts, location))
    }

    fn parse_agent_item(&mut self, agent: &mut AgentParts) -> PResult<()> {
        let at = self.peek().location();
        match self.kind() {
            TokenKind::AgentConfig => {
                let section = self.parse_settings("agentConfig")?;
                if agent.config.is_some() {
                    self.report(ParseError::at("duplicate agentConfig section", at));
                } else {
                    agent.config = Some(section);
                }
            }
            TokenKind::AgentDefaults => {
                let section = self.parse_settings("agentDefaults")?;
                if agent.defaults.is_some() {
                    self.report(ParseError::at("duplicate agentDefaults section", at));
                } else {
                    agent.defaults = Some(section);
                }
            }
            TokenKind::Flow => {
                let flow = self.parse_flow_section()?;
                agent.flows.push(flow);
            }
            TokenKind::Messages => {
                let messages = self.parse_messages_section()?;
                if agent.messages.is_some() {
                    self.report(ParseError::at("duplicate messages section", at));
                } else {
                    agent.messages = Some(messages);
                }
            }
            TokenKind::Agent => {
                return Err(ParseError::at("agent definitions cannot be nested", at))
            }
            kind if kind.is_wordlike() && self.check_at(1, TokenKind::Colon) => {
                let key = self.peek().text.clone();
                let slot = match key.as_str() {
                    "displayName" => &mut agent.display_name,
                    "brandName" => &mut agent.brand_name,
                    _ => {
                        return Err(ParseError::at(
                            format!("unknown agent attribute '{}'", key),
                            at,
                        ))
                    }
                };
                self.advance();
                self.advance();
                let value = self.take_string(&format!("string value for {}", key))?;
                self.finish_line()?;
                if slot.is_some() {
                    self.report(ParseError::at(format!("duplicate {} attribute", key), at));
                } else {
                    *slot = Some(value);
                }
            }
            _ => return Err(self.unexpected("agent attribute or section")),
        }
        Ok(())
    }

    /// `agentConfig Name?:` / `agentDefaults Name?:` and their attributes.
    fn parse_settings(&mut self, keyword: &str) -> PResult<SettingsSection> {
        let start = self.advance().start;
        trace!(keyword, "settings section");
        let name = if self.check(TokenKind::Colon) {
            None
        } else {
            Some(self.take_name("section name")?)
        };
        self.expect(TokenKind::Colon, "':'")?;

        let mut attributes = Vec::new();
        let mut mapped_types = Vec::new();
        self.parse_block(|p| {
            if p.at_mapped_type() {
                mapped_types.push(p.parse_mapped_type()?);
            } else {
                attributes.push(p.parse_attribute()?);
            }
            Ok(())
        })?;
        let location = self.span_from(start);
        Ok(self
            .factory
            .settings_section(name, attributes, mapped_types, location))
    }

    /// `key: value`, where the value may open its own indented block.
    pub(super) fn parse_attribute(&mut self) -> PResult<Attribute> {
        let start = self.peek().start;
        let key = self.take_name("attribute name")?;
        self.expect(TokenKind::Colon, "':' after attribute name")?;
        let value = self.parse_value()?;
        let location = self.span_from(start);
        self.finish_line()?;
        Ok(self.factory.attribute(key, value, location))
    }

    fn at_mapped_type(&self) -> bool {
        self.kind().is_wordlike()
            && self.check_at(1, TokenKind::List)
            && self.check_at(2, TokenKind::Of)
    }

    /// `Name list of (T1, T2):` then one comma-separated row per line.
    fn parse_mapped_type(&mut self) -> PResult<MappedType> {
        let start = self.peek().start;
        let name = self.take_name("mapped type name")?;
        self.expect(TokenKind::List, "'list'")?;
        self.expect(TokenKind::Of, "'of'")?;
        self.expect(TokenKind::LParen, "'('")?;
        let mut schema = vec![self.take_name("column type")?];
        while self.eat(TokenKind::Comma) {
            schema.push(self.take_name("column type")?);
        }
        self.expect(TokenKind::RParen, "')'")?;
        self.expect(TokenKind::Colon, "':'")?;

        let mut items = Vec::new();
        self.parse_block(|p| {
            let row_start = p.peek().start;
            let mut values = vec![p.parse_inline_value()?];
            while p.eat(TokenKind::Comma) {
                values.push(p.parse_inline_value()?);
            }
            let location = p.span_from(row_start);
            p.finish_line()?;
            items.push(p.factory.mapped_type_item(values, location));
            Ok(())
        })?;
        let location = self.span_from(start);
        Ok(self.factory.mapped_type(name, schema, items, location))
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::parse_src;
    use crate::ast::Value;
    use pretty_assertions::assert_eq;

    #[test]
    fn import_with_alias_and_source() {
        let src = "import Shared/Common Utils as Utils from \"./lib.rcl\"\nagent A:\n";
        let result = parse_src(src);
        assert!(result.errors.is_empty(), "{:?}", result.errors);
        let import = &result.ast.unwrap().imports[0];
        assert_eq!(import.import_path, vec!["Shared", "Common Utils"]);
        assert_eq!(import.alias.as_deref(), Some("Utils"));
        assert_eq!(import.source.as_deref(), Some("./lib.rcl"));
    }

    #[test]
    fn agent_attributes_and_settings() {
        let src = "\
agent Coffee Shop:
  displayName: \"Coffee\"
  brandName: \"Beans\"
  agentConfig Config:
    description: \"Orders coffee\"
    color: <color #336699>
  agentDefaults Defaults:
    fallback_message: \"Sorry\"
    messageTrafficType: :transactional
";
        let result = parse_src(src);
        assert!(result.errors.is_empty(), "{:?}", result.errors);
        let agent = result.ast.unwrap().agent_section.unwrap();
        assert_eq!(agent.name, "Coffee Shop");
        assert_eq!(agent.display_name.as_deref(), Some("Coffee"));
        assert_eq!(agent.brand_name.as_deref(), Some("Beans"));

        let config = agent.config.unwrap();
        assert_eq!(config.name.as_deref(), Some("Config"));
        assert_eq!(
            config.attribute("description").and_then(Value::as_str),
            Some("Orders coffee")
        );
        match config.attribute("color") {
            Some(Value::TypeTag(tag)) => {
                assert_eq!(tag.type_name.as_deref(), Some("color"));
                assert_eq!(tag.value, "#336699");
            }
            other => panic!("expected type tag, got {:?}", other),
        }

        let defaults = agent.defaults.unwrap();
        assert!(matches!(
            defaults.attribute("messageTrafficType"),
            Some(Value::Atom(a)) if a.name == "transactional"
        ));
    }

    #[test]
    fn missing_display_name_is_not_a_parse_error() {
        let result = parse_src("agent Bot:\n  brandName: \"B\"\n");
        assert!(result.errors.is_empty());
        assert!(result.ast.unwrap().agent_section.unwrap().display_name.is_none());
    }

    #[test]
    fn duplicate_sections_keep_the_first() {
        let src = "agent Bot:\n  messages A:\n    text \"a\"\n  messages B:\n    text \"b\"\n";
        let result = parse_src(src);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].message, "duplicate messages section");
        let messages = result.ast.unwrap().agent_section.unwrap().messages.unwrap();
        assert_eq!(messages.name.as_deref(), Some("A"));
    }

    #[test]
    fn unknown_agent_attribute_is_reported() {
        let result = parse_src("agent Bot:\n  colour: \"red\"\n  displayName: \"Bot\"\n");
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].message, "unknown agent attribute 'colour'");
        let agent = result.ast.unwrap().agent_section.unwrap();
        assert_eq!(agent.display_name.as_deref(), Some("Bot"));
    }

    #[test]
    fn mapped_type_rows() {
        let src = "\
agent Bot:
  agentConfig:
    Phone Numbers list of (label, number):
      \"Support\", <phone +1-555-0100>
      \"Sales\", <phone +1-555-0101>
";
        let result = parse_src(src);
        assert!(result.errors.is_empty(), "{:?}", result.errors);
        let config = result.ast.unwrap().agent_section.unwrap().config.unwrap();
        assert!(config.name.is_none());
        let mapped = &config.mapped_types[0];
        assert_eq!(mapped.name, "Phone Numbers");
        assert_eq!(mapped.schema, vec!["label", "number"]);
        assert_eq!(mapped.items.len(), 2);
        assert_eq!(mapped.items[1].values.len(), 2);
        assert_eq!(mapped.items[1].values[0].as_str(), Some("Sales"));
    }
}
