//! The editor-owned stylesheet holding synthesized rules.
//!
//! The store keeps no state of its own: every upsert reads the `<style>`
//! element's text, edits the parsed model and writes canonical text back, so
//! the sheet survives snapshot and restore like any other markup.

use std::fmt;

use cssparser::{ParseError, Parser, ParserInput, Token};
use log::{debug, warn};

use crate::dom::dom_tree::{
    self, parse_inline_style, serialize_inline_style, Document, InlineDeclaration, NodeRef,
};
use crate::style::css_matcher::split_top_level;

/// One style rule of the editor sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRule {
    pub selector: String,
    pub declarations: Vec<InlineDeclaration>,
}

impl StoredRule {
    pub fn get(&self, property: &str) -> Option<&str> {
        self.declarations
            .iter()
            .find(|d| d.property == property)
            .map(|d| d.value.as_str())
    }

    fn set(&mut self, property: &str, value: &str) {
        let property = property.trim().to_ascii_lowercase();
        let value = value.trim().to_string();
        match self.declarations.iter_mut().find(|d| d.property == property) {
            Some(existing) => {
                existing.value = value;
                existing.important = true;
            }
            None => self.declarations.push(InlineDeclaration {
                property,
                value,
                important: true,
            }),
        }
    }
}

/// Top-level entry of the editor sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetItem {
    Rule(StoredRule),
    Media {
        condition: String,
        items: Vec<SheetItem>,
    },
    /// Any other at-rule or unparsable chunk, written back verbatim.
    Raw(String),
}

impl fmt::Display for SheetItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SheetItem::Rule(rule) => write!(
                f,
                "{} {{ {} }}",
                rule.selector,
                serialize_inline_style(&rule.declarations)
            ),
            SheetItem::Media { condition, items } => {
                writeln!(f, "@media {} {{", condition)?;
                for item in items {
                    writeln!(f, "  {}", item)?;
                }
                write!(f, "}}")
            }
            SheetItem::Raw(text) => f.write_str(text),
        }
    }
}

/// Accessor for the single `<style>` element the editor writes rules into.
#[derive(Debug, Clone)]
pub struct RuleStore {
    sheet_id: String,
}

impl RuleStore {
    pub fn new(sheet_id: impl Into<String>) -> Self {
        RuleStore {
            sheet_id: sheet_id.into(),
        }
    }

    pub fn sheet_id(&self) -> &str {
        &self.sheet_id
    }

    /// The store's `<style>` element, created at the end of `<head>` on first use.
    pub fn stylesheet(&self, document: &Document) -> Option<NodeRef> {
        if let Some(existing) = document.get_element_by_id(&self.sheet_id) {
            return Some(existing);
        }
        let head = document.head()?;
        let style = dom_tree::new_element("style");
        dom_tree::with_element_mut(&style, |el| el.set_attr("id", self.sheet_id.as_str()));
        dom_tree::append_child(&head, &style);
        debug!("created rule store <style id=\"{}\">", self.sheet_id);
        Some(style)
    }

    /// Parsed contents of the sheet; empty when it does not exist yet.
    pub fn items(&self, document: &Document) -> Vec<SheetItem> {
        document
            .get_element_by_id(&self.sheet_id)
            .map(|style| parse_sheet(&dom_tree::text_content(&style)))
            .unwrap_or_default()
    }

    /// Sets `property: value !important` on the rule for `selector` (with
    /// `pseudo` appended to every selector of the list), inside the
    /// `max-width` media block when `max_width` is given.
    ///
    /// At most one rule exists per selector and block: an existing rule is
    /// updated in place, otherwise a new one is appended. Returns false when
    /// there is no document or no `<head>` to hold the sheet.
    pub fn upsert_rule(
        &self,
        document: Option<&Document>,
        selector: &str,
        max_width: Option<&str>,
        pseudo: Option<&str>,
        property: &str,
        value: &str,
    ) -> bool {
        let Some(document) = document else {
            warn!("rule upsert for `{}` skipped: no document loaded", selector);
            return false;
        };
        let Some(style) = self.stylesheet(document) else {
            warn!("rule upsert for `{}` skipped: document has no <head>", selector);
            return false;
        };
        let full_selector = with_pseudo(selector, pseudo);
        let mut items = parse_sheet(&dom_tree::text_content(&style));

        let scope: &mut Vec<SheetItem> = match max_width {
            None => &mut items,
            Some(width) => {
                match media_block(&mut items, &format!("(max-width: {})", width.trim())) {
                    Some(block) => block,
                    None => return false,
                }
            }
        };
        upsert_in(scope, &full_selector, property, value);

        let text = items
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n");
        dom_tree::set_text_content(&style, &text);
        debug!(
            "rule store: {} {{ {}: {} }} in {}",
            full_selector,
            property,
            value,
            max_width.unwrap_or("all widths")
        );
        true
    }

    /// The rule for exactly this selector, block and pseudo-class, if stored.
    pub fn find_rule(
        &self,
        document: &Document,
        selector: &str,
        max_width: Option<&str>,
        pseudo: Option<&str>,
    ) -> Option<StoredRule> {
        let wanted = canonical_selector(&with_pseudo(selector, pseudo));
        let items = self.items(document);
        let scope: Vec<SheetItem> = match max_width {
            None => items,
            Some(width) => {
                let condition = canonical_condition(&format!("(max-width: {})", width.trim()));
                items
                    .into_iter()
                    .find_map(|item| match item {
                        SheetItem::Media { condition: c, items } if canonical_condition(&c) == condition => {
                            Some(items)
                        }
                        _ => None,
                    })
                    .unwrap_or_default()
            }
        };
        scope.into_iter().find_map(|item| match item {
            SheetItem::Rule(rule) if canonical_selector(&rule.selector) == wanted => Some(rule),
            _ => None,
        })
    }
}

/// `.a, .b` + `:hover` gives `.a:hover, .b:hover`.
pub fn with_pseudo(selector: &str, pseudo: Option<&str>) -> String {
    let Some(pseudo) = pseudo.map(str::trim).filter(|p| !p.is_empty()) else {
        return selector.trim().to_string();
    };
    let pseudo = if pseudo.starts_with(':') {
        pseudo.to_string()
    } else {
        format!(":{}", pseudo)
    };
    split_top_level(selector, ',')
        .into_iter()
        .map(|part| format!("{}{}", part, pseudo))
        .collect::<Vec<_>>()
        .join(", ")
}

fn media_block<'a>(items: &'a mut Vec<SheetItem>, condition: &str) -> Option<&'a mut Vec<SheetItem>> {
    let wanted = canonical_condition(condition);
    let is_wanted =
        |item: &SheetItem| matches!(item, SheetItem::Media { condition: c, .. } if canonical_condition(c) == wanted);
    if !items.iter().any(is_wanted) {
        items.push(SheetItem::Media {
            condition: condition.to_string(),
            items: Vec::new(),
        });
    }
    items.iter_mut().find_map(|item| match item {
        SheetItem::Media { condition: c, items } if canonical_condition(c) == wanted => Some(items),
        _ => None,
    })
}

fn upsert_in(scope: &mut Vec<SheetItem>, selector: &str, property: &str, value: &str) {
    let wanted = canonical_selector(selector);
    let existing = scope.iter_mut().find_map(|item| match item {
        SheetItem::Rule(rule) if canonical_selector(&rule.selector) == wanted => Some(rule),
        _ => None,
    });
    match existing {
        Some(rule) => rule.set(property, value),
        None => {
            let mut rule = StoredRule {
                selector: selector.to_string(),
                declarations: Vec::new(),
            };
            rule.set(property, value);
            scope.push(SheetItem::Rule(rule));
        }
    }
}

/// Whitespace-insensitive form used to compare selector texts.
fn canonical_selector(selector: &str) -> String {
    split_top_level(selector, ',')
        .into_iter()
        .map(|part| {
            let mut out = String::new();
            let mut quote: Option<char> = None;
            let mut pending_space = false;
            for ch in part.chars() {
                match quote {
                    Some(q) => {
                        out.push(ch);
                        if ch == q {
                            quote = None;
                        }
                    }
                    None if ch.is_whitespace() => pending_space = true,
                    None => {
                        let is_combinator = matches!(ch, '>' | '+' | '~');
                        let after_combinator = out.ends_with(|c: char| matches!(c, '>' | '+' | '~'));
                        if pending_space && !is_combinator && !after_combinator && !out.is_empty() {
                            out.push(' ');
                        }
                        pending_space = false;
                        if ch == '"' || ch == '\'' {
                            quote = Some(ch);
                            out.push('"');
                        } else {
                            out.push(ch);
                        }
                    }
                }
            }
            out
        })
        .collect::<Vec<_>>()
        .join(",")
}

fn canonical_condition(condition: &str) -> String {
    condition
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase()
}

/// True when `value` can sit inside a declaration without ending it, its
/// rule or the `<style>` element around it.
pub fn is_safe_value(value: &str) -> bool {
    if value.contains("</") || value.contains("<!--") {
        return false;
    }
    let mut input = ParserInput::new(value);
    let mut parser = Parser::new(&mut input);
    tokens_are_safe(&mut parser)
}

enum Step {
    Unsafe,
    Nested,
    Plain,
}

fn tokens_are_safe<'i>(parser: &mut Parser<'i, '_>) -> bool {
    loop {
        let step = match parser.next_including_whitespace_and_comments() {
            Err(_) => return true,
            Ok(Token::Semicolon)
            | Ok(Token::CloseCurlyBracket)
            | Ok(Token::CurlyBracketBlock)
            | Ok(Token::BadString(_))
            | Ok(Token::BadUrl(_)) => Step::Unsafe,
            Ok(Token::Function(_))
            | Ok(Token::ParenthesisBlock)
            | Ok(Token::SquareBracketBlock) => Step::Nested,
            Ok(_) => Step::Plain,
        };
        match step {
            Step::Unsafe => return false,
            Step::Nested => {
                let nested = parser
                    .parse_nested_block(|inner| Ok::<_, ParseError<'i, ()>>(tokens_are_safe(inner)));
                if !matches!(nested, Ok(true)) {
                    return false;
                }
            }
            Step::Plain => {}
        }
    }
}

/// Parses the sheet text into rules, media blocks and raw chunks.
pub fn parse_sheet(css: &str) -> Vec<SheetItem> {
    let mut input = ParserInput::new(css);
    let mut parser = Parser::new(&mut input);
    parse_items(&mut parser)
}

fn parse_items(parser: &mut Parser<'_, '_>) -> Vec<SheetItem> {
    let mut items = Vec::new();
    while !parser.is_exhausted() {
        let start = parser.position();
        match parse_item(parser) {
            Ok(Some(item)) => items.push(item),
            Ok(None) => {}
            Err(_) => {
                let raw = parser.slice_from(start).trim();
                if !raw.is_empty() {
                    items.push(SheetItem::Raw(raw.to_string()));
                }
            }
        }
    }
    items
}

fn drain<'i>(parser: &mut Parser<'i, '_>) -> Result<(), ParseError<'i, ()>> {
    while parser.next().is_ok() {}
    Ok(())
}

enum Lead {
    AtRule(String),
    Block,
    Other,
}

fn parse_item<'i>(parser: &mut Parser<'i, '_>) -> Result<Option<SheetItem>, ParseError<'i, ()>> {
    let start = parser.position();
    let lead = match parser.next()? {
        Token::AtKeyword(name) => Lead::AtRule(name.to_string()),
        Token::CurlyBracketBlock => Lead::Block,
        _ => Lead::Other,
    };
    if let Lead::Block = lead {
        // A block with no prelude carries nothing addressable.
        parser.parse_nested_block(|nested| drain(nested))?;
        return Ok(None);
    }
    let prelude_start = parser.position();

    loop {
        let before = parser.position();
        let (is_block, is_semicolon) = match parser.next()? {
            Token::CurlyBracketBlock => (true, false),
            Token::Semicolon => (false, true),
            _ => (false, false),
        };
        if is_semicolon {
            return Ok(Some(SheetItem::Raw(parser.slice_from(start).trim().to_string())));
        }
        if !is_block {
            continue;
        }

        return match lead {
            Lead::AtRule(name) if name.eq_ignore_ascii_case("media") => {
                let condition = parser.slice(prelude_start..before).trim().to_string();
                let items = parser.parse_nested_block(|nested| {
                    Ok::<_, ParseError<'i, ()>>(parse_items(nested))
                })?;
                Ok(Some(SheetItem::Media { condition, items }))
            }
            Lead::AtRule(_) => {
                parser.parse_nested_block(|nested| drain(nested))?;
                Ok(Some(SheetItem::Raw(parser.slice_from(start).trim().to_string())))
            }
            Lead::Block | Lead::Other => {
                let selector = parser.slice(start..before).trim().to_string();
                let body = parser.parse_nested_block(
                    |nested| -> Result<String, ParseError<'i, ()>> {
                        let body_start = nested.position();
                        drain(nested)?;
                        Ok(nested.slice_from(body_start).to_string())
                    },
                )?;
                Ok(Some(SheetItem::Rule(StoredRule {
                    selector,
                    declarations: parse_inline_style(&body),
                })))
            }
        };
    }
}
