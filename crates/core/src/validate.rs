//! Semantic checks over a completed [`RclFile`].
//!
//! The parser accepts anything it can shape into an AST; this pass flags
//! the shapes that parse but cannot describe a working agent. It never
//! mutates the tree and never stops early, so callers get every issue at
//! once.

use crate::ast::*;
use crate::position::Location;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use tracing::debug;

/// Allowed number of cards in a carousel.
pub const CAROUSEL_CARDS: std::ops::RangeInclusive<usize> = 2..=10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub severity: Severity,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

impl ValidationIssue {
    fn error(message: impl Into<String>, location: Option<Location>) -> Self {
        ValidationIssue {
            severity: Severity::Error,
            message: message.into(),
            location,
        }
    }

    fn warning(message: impl Into<String>, location: Option<Location>) -> Self {
        ValidationIssue {
            severity: Severity::Warning,
            message: message.into(),
            location,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        match self.location {
            Some(loc) => write!(
                f,
                "{}:{}: {}: {}",
                loc.start.line, loc.start.column, label, self.message
            ),
            None => write!(f, "{}: {}", label, self.message),
        }
    }
}

pub fn validate(file: &RclFile) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    match &file.agent_section {
        Some(agent) => validate_agent(agent, &mut issues),
        None => issues.push(ValidationIssue::error(
            "missing agent definition",
            file.location,
        )),
    }
    debug!(issues = issues.len(), "validated document");
    issues
}

fn validate_agent(agent: &AgentDefinition, issues: &mut Vec<ValidationIssue>) {
    if agent.display_name.is_none() {
        issues.push(ValidationIssue::error(
            format!("agent '{}' is missing displayName", agent.name),
            agent.location,
        ));
    }
    if agent.flows.is_empty() {
        issues.push(ValidationIssue::error(
            format!("agent '{}' has no flow", agent.name),
            agent.location,
        ));
    }
    if agent.messages.is_none() {
        issues.push(ValidationIssue::error(
            format!("agent '{}' is missing a messages section", agent.name),
            agent.location,
        ));
    }

    for section in agent.config.iter().chain(agent.defaults.iter()) {
        for mapped in &section.mapped_types {
            validate_mapped_type(mapped, issues);
        }
    }

    let mut flow_names = HashSet::new();
    for flow in &agent.flows {
        if !flow_names.insert(flow.name.as_str()) {
            issues.push(ValidationIssue::error(
                format!("duplicate flow '{}'", flow.name),
                flow.location,
            ));
        }
    }

    let mut message_names = HashSet::new();
    if let Some(messages) = &agent.messages {
        for entry in &messages.messages {
            if let Some(name) = entry.name() {
                if !message_names.insert(name) {
                    issues.push(ValidationIssue::error(
                        format!("duplicate message '{}'", name),
                        entry.location(),
                    ));
                }
            }
            if let MessageEntry::Carousel(carousel) = entry {
                validate_carousel(carousel, issues);
            }
        }
    }

    for flow in &agent.flows {
        validate_flow_references(flow, &message_names, issues);
    }
}

fn validate_mapped_type(mapped: &MappedType, issues: &mut Vec<ValidationIssue>) {
    let expected = mapped.schema.len();
    for row in &mapped.items {
        if row.values.len() != expected {
            issues.push(ValidationIssue::error(
                format!(
                    "row of '{}' has {} values, expected {}",
                    mapped.name,
                    row.values.len(),
                    expected
                ),
                row.location,
            ));
        }
    }
}

fn validate_carousel(carousel: &CarouselShortcut, issues: &mut Vec<ValidationIssue>) {
    let count = carousel.cards.len();
    if !CAROUSEL_CARDS.contains(&count) {
        issues.push(ValidationIssue::error(
            format!(
                "carousel needs between {} and {} cards, found {}",
                CAROUSEL_CARDS.start(),
                CAROUSEL_CARDS.end(),
                count
            ),
            carousel.location,
        ));
    }
}

/// Identifier operands must name a message or a state that some rule of
/// the same flow starts from.
fn validate_flow_references(
    flow: &FlowSection,
    messages: &HashSet<&str>,
    issues: &mut Vec<ValidationIssue>,
) {
    let sources: HashSet<&str> = flow
        .rules
        .iter()
        .filter_map(FlowRule::source)
        .filter(|op| op.operand_type == FlowOperandType::Identifier)
        .map(|op| op.value.as_str())
        .collect();

    let mut reported = HashSet::new();
    for rule in &flow.rules {
        let destinations = rule
            .operands
            .iter()
            .skip(1)
            .chain(rule.when_clauses.iter().flat_map(|w| w.operands.iter()));
        for operand in destinations {
            if operand.operand_type != FlowOperandType::Identifier {
                continue;
            }
            let name = operand.value.as_str();
            if messages.contains(name) || sources.contains(name) {
                continue;
            }
            if reported.insert(name) {
                issues.push(ValidationIssue::warning(
                    format!(
                        "'{}' in flow '{}' is neither a message nor a flow state",
                        name, flow.name
                    ),
                    rule.location,
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer;
    use crate::parser::{parse, ParseOptions};
    use pretty_assertions::assert_eq;

    fn issues(src: &str) -> Vec<String> {
        let lexed = lexer::lex(src);
        let result = parse(&lexed.tokens, &ParseOptions::default());
        assert!(result.errors.is_empty(), "{:?}", result.errors);
        validate(&result.ast.unwrap())
            .into_iter()
            .map(|i| match i.severity {
                Severity::Error => i.message,
                Severity::Warning => format!("warning: {}", i.message),
            })
            .collect()
    }

    #[test]
    fn complete_agent_is_clean() {
        let src = "\
agent Bot:
  displayName: \"Bot\"
  flow Main:
    :start -> Welcome
    Welcome -> Goodbye
  messages Messages:
    text Welcome \"Hi\"
    text Goodbye \"Bye\"
";
        assert!(issues(src).is_empty());
    }

    #[test]
    fn missing_pieces_are_errors() {
        assert_eq!(
            issues("agent Bot:\n  brandName: \"B\"\n"),
            vec![
                "agent 'Bot' is missing displayName".to_string(),
                "agent 'Bot' has no flow".to_string(),
                "agent 'Bot' is missing a messages section".to_string(),
            ]
        );
    }

    #[test]
    fn missing_agent_is_an_error() {
        let lexed = lexer::lex("import Shared\n");
        let result = parse(&lexed.tokens, &ParseOptions::default());
        let issues = validate(&result.ast.unwrap());
        assert_eq!(issues.len(), 1);
        assert!(issues[0].is_error());
    }

    #[test]
    fn duplicates_and_unknown_destinations() {
        let src = "\
agent Bot:
  displayName: \"Bot\"
  flow Main:
    :start -> Hello
    Hello -> Nowhere
  flow Main:
    :start -> Hello
  messages Messages:
    text Hello \"Hi\"
    text Hello \"Again\"
";
        assert_eq!(
            issues(src),
            vec![
                "duplicate flow 'Main'".to_string(),
                "duplicate message 'Hello'".to_string(),
                "warning: 'Nowhere' in flow 'Main' is neither a message nor a flow state"
                    .to_string(),
            ]
        );
    }

    #[test]
    fn carousel_size_and_mapped_type_arity() {
        let src = "\
agent Bot:
  displayName: \"Bot\"
  agentConfig:
    Hours list of (day, open, close):
      \"Mon\", 9, 17
      \"Sun\", 10
  flow Main:
    :start -> Deals
  messages Messages:
    carousel Deals
      richCard \"Only one\"
";
        assert_eq!(
            issues(src),
            vec![
                "row of 'Hours' has 2 values, expected 3".to_string(),
                "carousel needs between 2 and 10 cards, found 1".to_string(),
            ]
        );
    }
}
