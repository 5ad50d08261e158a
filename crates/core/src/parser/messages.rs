//! Messages section: block-form messages, message shortcuts and
//! suggestion shortcuts.

use super::{PResult, Parser};
use crate::ast::{
    CardOrientation, CardWidth, CarouselShortcut, FileShortcut, ImageAlignment, MediaHeight,
    MessageEntry, MessageTrafficType, MessagesSection, OpenUrlApplication, RbmFileShortcut,
    RichCardShortcut, SuggestionShortcut, TextShortcut, WebviewMode,
};
use crate::error::ParseError;
use crate::factory::CardParts;
use crate::token::{decode_string_literal, Token, TokenKind};
use tracing::trace;

impl<'a> Parser<'a> {
    pub(super) fn parse_messages_section(&mut self) -> PResult<MessagesSection> {
        let start = self.advance().start;
        let name = if self.check(TokenKind::Colon) {
            None
        } else {
            Some(self.take_name("messages section name")?)
        };
        trace!(name = ?name, "messages");
        self.expect(TokenKind::Colon, "':'")?;

        let mut messages = Vec::new();
        self.parse_block(|p| {
            messages.push(p.parse_message_entry()?);
            Ok(())
        })?;
        let location = self.span_from(start);
        Ok(self.factory.messages_section(name, messages, location))
    }

    fn parse_message_entry(&mut self) -> PResult<MessageEntry> {
        let traffic = MessageTrafficType::from_token(self.kind());
        if traffic.is_some() {
            self.advance();
        }
        let kind = self.kind();
        let entry = match kind {
            TokenKind::Text => MessageEntry::Text(self.parse_text_shortcut(traffic)?),
            TokenKind::RichCard => MessageEntry::RichCard(self.parse_rich_card(traffic)?),
            TokenKind::Carousel => MessageEntry::Carousel(self.parse_carousel(traffic)?),
            TokenKind::RbmFile => MessageEntry::RbmFile(self.parse_rbm_file(traffic)?),
            TokenKind::File => MessageEntry::File(self.parse_file_shortcut(traffic)?),
            TokenKind::Message => {
                self.advance();
                self.parse_message_definition(traffic)?
            }
            k if k.is_suggestion_shortcut() => {
                return Err(self.error_here(format!(
                    "suggestion '{}' must belong to a message",
                    self.peek().text
                )))
            }
            k if k.is_wordlike() && self.check_at(1, TokenKind::Colon) => {
                self.parse_message_definition(traffic)?
            }
            TokenKind::CommonNoun => {
                return Err(self.error_here(format!(
                    "unknown message shortcut '{}'",
                    self.peek().text
                )))
            }
            _ => return Err(self.unexpected("message")),
        };
        Ok(entry)
    }

    /// `Name:` followed by attributes, suggestions and an optional
    /// `suggestions:` block.
    fn parse_message_definition(
        &mut self,
        traffic: Option<MessageTrafficType>,
    ) -> PResult<MessageEntry> {
        let start = self.peek().start;
        let name = self.take_name("message name")?;
        self.expect(TokenKind::Colon, "':' after message name")?;

        let mut attributes = Vec::new();
        let mut suggestions = Vec::new();
        self.parse_block(|p| {
            if p.kind().is_suggestion_shortcut() && !p.check_at(1, TokenKind::Colon) {
                suggestions.push(p.parse_suggestion()?);
            } else if p.peek().text == "suggestions" && p.check_at(1, TokenKind::Colon) {
                p.advance();
                p.advance();
                p.parse_block(|q| {
                    suggestions.push(q.parse_suggestion()?);
                    Ok(())
                })?;
            } else {
                attributes.push(p.parse_attribute()?);
            }
            Ok(())
        })?;
        let location = self.span_from(start);
        Ok(self
            .factory
            .message_definition(name, traffic, attributes, suggestions, location))
    }

    fn parse_suggestion_block(&mut self) -> PResult<Vec<SuggestionShortcut>> {
        let mut suggestions = Vec::new();
        self.parse_block(|p| {
            suggestions.push(p.parse_suggestion()?);
            Ok(())
        })?;
        Ok(suggestions)
    }

    /// A URL argument: a type tag's value or a plain string.
    fn parse_url(&mut self, what: &str) -> PResult<String> {
        match self.kind() {
            TokenKind::Lt => Ok(self.parse_type_tag()?.value),
            TokenKind::String => Ok(decode_string_literal(&self.advance().text)),
            _ => Err(self.unexpected(what)),
        }
    }

    fn at_url(&self) -> bool {
        matches!(self.kind(), TokenKind::Lt | TokenKind::String)
    }

    // -- Message shortcuts ---------------------------------------

    fn parse_text_shortcut(
        &mut self,
        traffic: Option<MessageTrafficType>,
    ) -> PResult<TextShortcut> {
        let start = self.advance().start;
        let name = self.take_optional_name();
        let text = self.take_string("message text")?;
        let suggestions = self.parse_suggestion_block()?;
        let location = self.span_from(start);
        Ok(self
            .factory
            .text_shortcut(name, traffic, text, suggestions, location))
    }

    /// `richCard Name? "Title" (:option | <url> | "url")*` with an optional
    /// block of `description:` and suggestions.
    fn parse_rich_card(
        &mut self,
        traffic: Option<MessageTrafficType>,
    ) -> PResult<RichCardShortcut> {
        let start = self.expect(TokenKind::RichCard, "'richCard'")?.start;
        let name = self.take_optional_name();
        let title = self.take_string("rich card title")?;
        let mut card = CardParts::default();

        loop {
            match self.kind() {
                TokenKind::Atom => {
                    let atom = self.advance();
                    self.apply_card_option(&mut card, &atom);
                }
                TokenKind::Lt | TokenKind::String => {
                    card.image_url = Some(self.parse_url("image URL")?);
                }
                _ => break,
            }
        }

        self.parse_block(|p| {
            if p.peek().text == "description" && p.check_at(1, TokenKind::Colon) {
                p.advance();
                p.advance();
                card.description = Some(p.take_string("card description")?);
                p.finish_line()
            } else {
                card.suggestions.push(p.parse_suggestion()?);
                Ok(())
            }
        })?;
        let location = self.span_from(start);
        Ok(self.factory.rich_card(name, traffic, title, card, location))
    }

    fn apply_card_option(&mut self, card: &mut CardParts, atom: &Token) {
        match atom.text.trim_start_matches(':') {
            "horizontal" => card.orientation = Some(CardOrientation::Horizontal),
            "vertical" => card.orientation = Some(CardOrientation::Vertical),
            "left" => card.alignment = Some(ImageAlignment::Left),
            "right" => card.alignment = Some(ImageAlignment::Right),
            "short" => card.height = Some(MediaHeight::Short),
            "medium" => card.height = Some(MediaHeight::Medium),
            "tall" => card.height = Some(MediaHeight::Tall),
            other => self.report(ParseError::at(
                format!("unknown rich card option ':{}'", other),
                atom.location(),
            )),
        }
    }

    fn parse_carousel(&mut self, traffic: Option<MessageTrafficType>) -> PResult<CarouselShortcut> {
        let start = self.advance().start;
        let name = self.take_optional_name();
        let mut card_width = None;
        while self.check(TokenKind::Atom) {
            let atom = self.advance();
            match atom.text.trim_start_matches(':') {
                "small" => card_width = Some(CardWidth::Small),
                "medium" => card_width = Some(CardWidth::Medium),
                other => self.report(ParseError::at(
                    format!("unknown carousel option ':{}'", other),
                    atom.location(),
                )),
            }
        }

        let mut cards = Vec::new();
        let mut suggestions = Vec::new();
        self.parse_block(|p| {
            if p.check(TokenKind::RichCard) {
                cards.push(p.parse_rich_card(None)?);
            } else {
                suggestions.push(p.parse_suggestion()?);
            }
            Ok(())
        })?;
        let location = self.span_from(start);
        Ok(self
            .factory
            .carousel(name, traffic, card_width, cards, suggestions, location))
    }

    fn parse_rbm_file(&mut self, traffic: Option<MessageTrafficType>) -> PResult<RbmFileShortcut> {
        let start = self.advance().start;
        let name = self.take_optional_name();
        let file_url = self.parse_url("file URL")?;
        let thumbnail_url = if self.at_url() {
            Some(self.parse_url("thumbnail URL")?)
        } else {
            None
        };
        let suggestions = self.parse_suggestion_block()?;
        let location = self.span_from(start);
        Ok(self
            .factory
            .rbm_file(name, traffic, file_url, thumbnail_url, suggestions, location))
    }

    fn parse_file_shortcut(
        &mut self,
        traffic: Option<MessageTrafficType>,
    ) -> PResult<FileShortcut> {
        let start = self.advance().start;
        let name = self.take_optional_name();
        let url = self.parse_url("file URL")?;
        let suggestions = self.parse_suggestion_block()?;
        let location = self.span_from(start);
        Ok(self
            .factory
            .file(name, traffic, url, suggestions, location))
    }

    // -- Suggestions ---------------------------------------------

    pub(super) fn parse_suggestion(&mut self) -> PResult<SuggestionShortcut> {
        if !self.kind().is_suggestion_shortcut() {
            return Err(match self.kind() {
                TokenKind::CommonNoun => self.error_here(format!(
                    "unknown suggestion shortcut '{}'",
                    self.peek().text
                )),
                _ => self.unexpected("suggestion"),
            });
        }
        let keyword = self.advance();
        let start = keyword.start;
        let text = self.take_string("suggestion text")?;

        let suggestion = match keyword.kind {
            TokenKind::Reply => {
                let postback = if self.check(TokenKind::String) {
                    Some(self.take_string("postback data")?)
                } else {
                    None
                };
                self.factory.reply(text, postback, self.span_from(start))
            }
            TokenKind::Dial => {
                let number = self.parse_url("phone number")?;
                self.factory.dial(text, number, self.span_from(start))
            }
            TokenKind::OpenUrl => {
                let url = self.parse_url("URL")?;
                let mut application = None;
                let mut webview_mode = None;
                while self.check(TokenKind::Atom) {
                    let atom = self.advance();
                    match atom.text.trim_start_matches(':') {
                        "browser" => application = Some(OpenUrlApplication::Browser),
                        "webview" => application = Some(OpenUrlApplication::Webview),
                        "full" => webview_mode = Some(WebviewMode::Full),
                        "half" => webview_mode = Some(WebviewMode::Half),
                        "tall" => webview_mode = Some(WebviewMode::Tall),
                        other => self.report(ParseError::at(
                            format!("unknown openUrl option ':{}'", other),
                            atom.location(),
                        )),
                    }
                }
                self.factory
                    .open_url(text, url, application, webview_mode, self.span_from(start))
            }
            TokenKind::ShareLocation => self.factory.share_location(text, self.span_from(start)),
            TokenKind::ViewLocation => {
                let query = if self.at_url() {
                    Some(self.parse_url("location query")?)
                } else {
                    None
                };
                self.factory.view_location(text, query, self.span_from(start))
            }
            _ => {
                let title = self.take_string("event title")?;
                if !self.check(TokenKind::Lt) {
                    return Err(self.unexpected("event start time"));
                }
                let start_time = self.parse_type_tag()?;
                if !self.check(TokenKind::Lt) {
                    return Err(self.unexpected("event end time"));
                }
                let end_time = self.parse_type_tag()?;
                let description = if self.check(TokenKind::String) {
                    Some(self.take_string("event description")?)
                } else {
                    None
                };
                self.factory.save_event(
                    text,
                    title,
                    start_time,
                    end_time,
                    description,
                    self.span_from(start),
                )
            }
        };
        self.finish_line()?;
        Ok(suggestion)
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::parse_src;
    use crate::ast::*;
    use pretty_assertions::assert_eq;

    fn messages(body: &str) -> (Vec<MessageEntry>, Vec<String>) {
        let src = format!("agent A:\n  messages Messages:\n{}", body);
        let result = parse_src(&src);
        let errors = result.errors.iter().map(|e| e.message.clone()).collect();
        let entries = result
            .ast
            .and_then(|a| a.agent_section)
            .and_then(|a| a.messages)
            .map(|m| m.messages)
            .unwrap_or_default();
        (entries, errors)
    }

    #[test]
    fn block_message_with_text_attribute() {
        let (entries, errors) = messages("    Hi:\n      text: \"Hello\"\n      reply \"Ok\"\n");
        assert!(errors.is_empty(), "{:?}", errors);
        match &entries[0] {
            MessageEntry::Definition(m) => {
                assert_eq!(m.name, "Hi");
                assert_eq!(m.attributes[0].key, "text");
                assert_eq!(m.attributes[0].value.as_str(), Some("Hello"));
                assert_eq!(m.suggestions.len(), 1);
            }
            other => panic!("expected definition, got {:?}", other),
        }
    }

    #[test]
    fn suggestions_block_inside_definition() {
        let body = concat!(
            "    message Menu:\n",
            "      text: \"Pick\"\n",
            "      suggestions:\n",
            "        reply \"A\" \"a\"\n",
            "        dial \"Call\" <phone +15550100>\n",
        );
        let (entries, errors) = messages(body);
        assert!(errors.is_empty(), "{:?}", errors);
        let suggestions = entries[0].suggestions();
        assert_eq!(suggestions.len(), 2);
        match &suggestions[0] {
            SuggestionShortcut::Reply(r) => assert_eq!(r.postback_data.as_deref(), Some("a")),
            other => panic!("expected reply, got {:?}", other),
        }
        match &suggestions[1] {
            SuggestionShortcut::Dial(d) => assert_eq!(d.phone_number, "+15550100"),
            other => panic!("expected dial, got {:?}", other),
        }
    }

    #[test]
    fn text_shortcut_with_name_traffic_type_and_suggestions() {
        let body = concat!(
            "    promotional text Welcome \"Hello\"\n",
            "      reply \"Hi\"\n",
            "      openUrl \"Site\" <url https://example.com> :webview :tall\n",
        );
        let (entries, errors) = messages(body);
        assert!(errors.is_empty(), "{:?}", errors);
        match &entries[0] {
            MessageEntry::Text(t) => {
                assert_eq!(t.name.as_deref(), Some("Welcome"));
                assert_eq!(t.text, "Hello");
                assert_eq!(t.traffic_type, Some(MessageTrafficType::Promotional));
                match &t.suggestions[1] {
                    SuggestionShortcut::OpenUrl(o) => {
                        assert_eq!(o.url, "https://example.com");
                        assert_eq!(o.application, Some(OpenUrlApplication::Webview));
                        assert_eq!(o.webview_mode, Some(WebviewMode::Tall));
                    }
                    other => panic!("expected openUrl, got {:?}", other),
                }
            }
            other => panic!("expected text shortcut, got {:?}", other),
        }
    }

    #[test]
    fn rich_card_options_and_description() {
        let body = concat!(
            "    richCard Promo \"Title\" :vertical :right :medium <https://x/img.png>\n",
            "      description: \"Details\"\n",
            "      shareLocation \"Where?\"\n",
        );
        let (entries, errors) = messages(body);
        assert!(errors.is_empty(), "{:?}", errors);
        match &entries[0] {
            MessageEntry::RichCard(c) => {
                assert_eq!(c.name.as_deref(), Some("Promo"));
                assert_eq!(c.orientation, Some(CardOrientation::Vertical));
                assert_eq!(c.alignment, Some(ImageAlignment::Right));
                assert_eq!(c.height, Some(MediaHeight::Medium));
                assert_eq!(c.image_url.as_deref(), Some("https://x/img.png"));
                assert_eq!(c.description.as_deref(), Some("Details"));
                assert_eq!(c.suggestions.len(), 1);
            }
            other => panic!("expected rich card, got {:?}", other),
        }
    }

    #[test]
    fn carousel_collects_cards() {
        let body = concat!(
            "    carousel Deals :small\n",
            "      richCard \"One\" <https://x/1.png>\n",
            "      richCard \"Two\" <https://x/2.png>\n",
            "      reply \"More\"\n",
        );
        let (entries, errors) = messages(body);
        assert!(errors.is_empty(), "{:?}", errors);
        match &entries[0] {
            MessageEntry::Carousel(c) => {
                assert_eq!(c.card_width, Some(CardWidth::Small));
                assert_eq!(c.cards.len(), 2);
                assert_eq!(c.cards[1].title, "Two");
                assert_eq!(c.suggestions.len(), 1);
            }
            other => panic!("expected carousel, got {:?}", other),
        }
    }

    #[test]
    fn file_shortcuts() {
        let body = concat!(
            "    rbmFile Brochure <url https://x/a.pdf> <url https://x/a.png>\n",
            "    file Menu \"https://x/menu.pdf\"\n",
        );
        let (entries, errors) = messages(body);
        assert!(errors.is_empty(), "{:?}", errors);
        match &entries[0] {
            MessageEntry::RbmFile(f) => {
                assert_eq!(f.file_url, "https://x/a.pdf");
                assert_eq!(f.thumbnail_url.as_deref(), Some("https://x/a.png"));
            }
            other => panic!("expected rbmFile, got {:?}", other),
        }
        match &entries[1] {
            MessageEntry::File(f) => assert_eq!(f.url, "https://x/menu.pdf"),
            other => panic!("expected file, got {:?}", other),
        }
    }

    #[test]
    fn save_event_and_view_location() {
        let body = concat!(
            "    text \"When?\"\n",
            "      saveEvent \"Save\" \"Launch\" <datetime 2025-07-01T10:00> ",
            "<datetime 2025-07-01T11:00> \"Party\"\n",
            "      viewLocation \"Map\" \"Main St\"\n",
        );
        let (entries, errors) = messages(body);
        assert!(errors.is_empty(), "{:?}", errors);
        let suggestions = entries[0].suggestions();
        match &suggestions[0] {
            SuggestionShortcut::SaveEvent(e) => {
                assert_eq!(e.title, "Launch");
                assert_eq!(e.start_time.type_name.as_deref(), Some("datetime"));
                assert_eq!(e.end_time.value, "2025-07-01T11:00");
                assert_eq!(e.description.as_deref(), Some("Party"));
            }
            other => panic!("expected saveEvent, got {:?}", other),
        }
        match &suggestions[1] {
            SuggestionShortcut::ViewLocation(v) => assert_eq!(v.query.as_deref(), Some("Main St")),
            other => panic!("expected viewLocation, got {:?}", other),
        }
    }

    #[test]
    fn unknown_shortcut_is_an_error() {
        let (entries, errors) = messages("    video \"x\"\n    text \"ok\"\n");
        assert_eq!(errors, vec!["unknown message shortcut 'video'".to_string()]);
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn suggestion_at_messages_root_is_an_error() {
        let (entries, errors) = messages("    reply \"x\"\n");
        assert_eq!(errors, vec!["suggestion 'reply' must belong to a message".to_string()]);
        assert!(entries.is_empty());
    }

    #[test]
    fn traffic_type_reaches_every_shortcut_kind() {
        let body = concat!(
            "    promotional richCard \"Sale\" :horizontal\n",
            "    transactional carousel Deals\n",
            "      richCard \"One\"\n",
            "      richCard \"Two\"\n",
            "    authentication file Receipt \"https://x/r.pdf\"\n",
        );
        let (entries, errors) = messages(body);
        assert!(errors.is_empty(), "{:?}", errors);
        match &entries[0] {
            MessageEntry::RichCard(c) => {
                assert_eq!(c.traffic_type, Some(MessageTrafficType::Promotional));
                assert_eq!(c.orientation, Some(CardOrientation::Horizontal));
            }
            other => panic!("expected rich card, got {:?}", other),
        }
        match &entries[1] {
            MessageEntry::Carousel(c) => {
                assert_eq!(c.traffic_type, Some(MessageTrafficType::Transactional));
                assert!(c.cards.iter().all(|card| card.traffic_type.is_none()));
            }
            other => panic!("expected carousel, got {:?}", other),
        }
        match &entries[2] {
            MessageEntry::File(f) => {
                assert_eq!(f.traffic_type, Some(MessageTrafficType::Authentication))
            }
            other => panic!("expected file, got {:?}", other),
        }
    }

    #[test]
    fn unknown_card_option_is_reported_but_card_is_kept() {
        let (entries, errors) = messages("    richCard \"T\" :diagonal\n");
        assert_eq!(errors, vec!["unknown rich card option ':diagonal'".to_string()]);
        assert_eq!(entries.len(), 1);
    }
}
