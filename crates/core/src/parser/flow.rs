//! Flow sections: transition rules, `with` parameters and `when` branches.

use super::{PResult, Parser};
use crate::ast::{Attribute, FlowOperand, FlowRule, FlowSection, WhenClause, WithClause};
use crate::token::TokenKind;
use tracing::trace;

impl<'a> Parser<'a> {
    pub(super) fn parse_flow_section(&mut self) -> PResult<FlowSection> {
        let start = self.advance().start;
        let name = self.take_name("flow name")?;
        trace!(%name, "flow");
        self.expect(TokenKind::Colon, "':' after flow name")?;

        let mut rules = Vec::new();
        self.parse_block(|p| {
            rules.push(p.parse_flow_rule()?);
            Ok(())
        })?;
        let location = self.span_from(start);
        Ok(self.factory.flow_section(name, rules, location))
    }

    /// `A -> B (-> C)* (with ...)?`, optionally followed by an indented
    /// block of `when` clauses.
    fn parse_flow_rule(&mut self) -> PResult<FlowRule> {
        let start = self.peek().start;
        let mut operands = vec![self.parse_operand()?];
        while self.eat(TokenKind::Arrow) {
            operands.push(self.parse_operand()?);
        }
        let header = self.span_from(start);
        if operands.len() < 2 {
            return Err(self.unexpected("'->'"));
        }
        let with_clause = self.parse_optional_with()?;

        let mut when_clauses = Vec::new();
        self.parse_block(|p| {
            when_clauses.push(p.parse_when_clause()?);
            Ok(())
        })?;
        let location = self.span_from(start);
        self.factory
            .flow_rule(operands, with_clause, when_clauses, location)
            .map_err(|e| self.factory_error(e, header))
    }

    /// Atom first, then proper noun, then common noun. The token kind
    /// already carries the distinction, so one token decides.
    fn parse_operand(&mut self) -> PResult<FlowOperand> {
        match self.factory.flow_operand(self.peek()) {
            Some(operand) => {
                self.advance();
                Ok(operand)
            }
            None => Err(self.unexpected("flow operand")),
        }
    }

    fn parse_optional_with(&mut self) -> PResult<Option<WithClause>> {
        if !self.check(TokenKind::With) {
            return Ok(None);
        }
        let start = self.advance().start;
        let mut parameters = vec![self.parse_parameter()?];
        while self.eat(TokenKind::Comma) {
            parameters.push(self.parse_parameter()?);
        }
        let location = self.span_from(start);
        Ok(Some(self.factory.with_clause(parameters, location)))
    }

    fn parse_parameter(&mut self) -> PResult<Attribute> {
        let start = self.peek().start;
        let key = self.take_name("parameter name")?;
        self.expect(TokenKind::Colon, "':' after parameter name")?;
        let value = self.parse_inline_value()?;
        let location = self.span_from(start);
        Ok(self.factory.attribute(key, value, location))
    }

    /// `when <condition> -> Dest (-> Dest)* (with ...)?`
    fn parse_when_clause(&mut self) -> PResult<WhenClause> {
        let start = self.expect(TokenKind::When, "'when'")?.start;
        let condition = self.parse_inline_value()?;
        let mut operands = Vec::new();
        while self.eat(TokenKind::Arrow) {
            operands.push(self.parse_operand()?);
        }
        let with_clause = self.parse_optional_with()?;
        let location = self.span_from(start);
        let clause = self
            .factory
            .when_clause(condition, operands, with_clause, location)
            .map_err(|e| self.factory_error(e, location))?;
        self.finish_line()?;
        Ok(clause)
    }
}
