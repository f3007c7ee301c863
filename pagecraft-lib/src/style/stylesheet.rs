//! Author stylesheets of the edited page, parsed with LightningCSS into owned rules.

use crate::dom::dom_tree::{self, Document};
use lightningcss::error::{Error as LcssError, ParserError};
use lightningcss::printer::PrinterOptions;
use lightningcss::rules::{style::StyleRule, CssRule, CssRuleList};
use lightningcss::stylesheet::{ParserOptions, StyleSheet as LightningStyleSheet};
use lightningcss::traits::ToCss;
use log::warn;
use std::fmt;

/// A fully-owned stylesheet: style rules only, with `@media` rules flattened.
#[derive(Debug, Default, Clone)]
pub struct OwnedStylesheet {
    pub rules: Vec<OwnedRule>,
}

#[derive(Debug, Clone)]
pub struct OwnedRule {
    /// e.g. "div", ".red", "#header"
    pub selectors: Vec<String>,
    pub declarations: Vec<OwnedDeclaration>,
    /// Conditions of the enclosing `@media` blocks, outermost first.
    pub media: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnedDeclaration {
    pub property: String,
    pub value: String,
    pub important: bool,
}

impl fmt::Display for OwnedRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.media.is_empty() {
            writeln!(f, "@media {}", self.media.join(" and "))?;
        }
        writeln!(f, "Selectors: {:?}", self.selectors)?;
        for decl in &self.declarations {
            let marker = if decl.important { " !important" } else { "" };
            writeln!(f, "  {}: {}{}", decl.property, decl.value, marker)?;
        }
        Ok(())
    }
}

/// Parse a raw CSS string (LightningCSS) and convert it to a fully-owned stylesheet.
///
/// Invalid rules are skipped rather than failing the whole sheet, the way a
/// browser drops what it cannot parse.
pub fn parse_and_own_css(css_text: &str) -> Result<OwnedStylesheet, ParserError<'_>> {
    let parser_opts = ParserOptions {
        error_recovery: true,
        ..ParserOptions::default()
    };
    let sheet = LightningStyleSheet::parse(css_text, parser_opts)
        .map_err(|e: LcssError<ParserError<'_>>| e.kind)?;

    let mut owned_rules = Vec::new();
    collect_rules(&sheet.rules, &mut Vec::new(), &mut owned_rules);
    Ok(OwnedStylesheet { rules: owned_rules })
}

fn collect_rules(rules: &CssRuleList<'_>, media: &mut Vec<String>, out: &mut Vec<OwnedRule>) {
    for rule in &rules.0 {
        match rule {
            CssRule::Style(style_rule) => {
                let mut owned = convert_style_rule(style_rule);
                owned.media = media.clone();
                out.push(owned);
            }
            CssRule::Media(media_rule) => {
                let condition = media_rule
                    .query
                    .to_css_string(PrinterOptions::default())
                    .unwrap_or_default();
                media.push(condition);
                collect_rules(&media_rule.rules, media, out);
                media.pop();
            }
            // @font-face, @keyframes and friends carry nothing an inspector reads.
            _ => {}
        }
    }
}

/// Copies a single StyleRule's selectors + declarations into an OwnedRule.
fn convert_style_rule(style_rule: &StyleRule<'_>) -> OwnedRule {
    let mut selectors_vec = Vec::new();
    for selector in &style_rule.selectors.0 {
        if let Ok(sel_str) = selector.to_css_string(PrinterOptions::default()) {
            selectors_vec.push(sel_str);
        }
    }

    let block = &style_rule.declarations;
    let mut decls_vec = Vec::new();
    let tagged = block
        .declarations
        .iter()
        .map(|p| (p, false))
        .chain(block.important_declarations.iter().map(|p| (p, true)));
    for (property, important) in tagged {
        let property_name = property.property_id().name().to_string();
        match property.value_to_css_string(PrinterOptions::default()) {
            Ok(value) => decls_vec.push(OwnedDeclaration {
                property: property_name,
                value,
                important,
            }),
            Err(err) => warn!("dropping unprintable value of `{}`: {:?}", property_name, err),
        }
    }

    OwnedRule {
        selectors: selectors_vec,
        declarations: decls_vec,
        media: Vec::new(),
    }
}

/// Parses every `<style>` element of the document, in document order.
pub fn document_stylesheets(document: &Document) -> Vec<OwnedStylesheet> {
    let mut sheets = Vec::new();
    for element in document.elements() {
        if dom_tree::tag_of(&element).as_deref() != Some("style") {
            continue;
        }
        let css = dom_tree::text_content(&element);
        match parse_and_own_css(&css) {
            Ok(sheet) => sheets.push(sheet),
            Err(err) => warn!("skipping unparsable <style> block: {}", err),
        };
    }
    sheets
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owns_rules_with_media_and_priority() {
        let sheet = parse_and_own_css(
            r#"
            .red, #blue { color: red; }
            @media (max-width: 767px) {
                p { margin-top: 4px !important; }
            }
            @font-face { font-family: X; src: url(x.woff); }
            "#,
        )
        .unwrap();
        assert_eq!(sheet.rules.len(), 2);
        assert_eq!(sheet.rules[0].selectors.len(), 2);
        assert!(sheet.rules[0].media.is_empty());

        let responsive = &sheet.rules[1];
        assert_eq!(responsive.media.len(), 1);
        assert!(responsive.media[0].contains("767px"));
        assert_eq!(responsive.declarations[0].property, "margin-top");
        assert!(responsive.declarations[0].important);
    }

    #[test]
    fn reads_style_elements_of_a_document() {
        let document = crate::parser::html::create_dom_tree(
            "<html><head><style>h1 { color: blue; }</style></head><body><style>p { color: green; }</style></body></html>",
        );
        let sheets = document_stylesheets(&document);
        assert_eq!(sheets.len(), 2);
        assert_eq!(sheets[1].rules[0].selectors, vec!["p".to_string()]);
    }
}
