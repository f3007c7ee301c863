//! Computed-style resolution over the page's own stylesheets.
//!
//! There is no rendering engine behind the editor, so "computed" here means
//! cascaded: matching author rules, the inline `style` attribute, inheritance
//! and a handful of user-agent defaults the inspector relies on.

use std::collections::HashMap;

use log::debug;

use crate::dom::dom_tree::{self, Document, NodeRef};
use crate::style::css_matcher::{
    compute_computed_style, matches_complex_selector, parse_complex_selector, CssRule,
};
use crate::style::stylesheet::document_stylesheets;

/// Fallback of the hex conversion for anything that is not an opaque colour.
pub const DEFAULT_HEX: &str = "#FFFFFF";

/// Glow used when no usable base colour is found.
pub const DEFAULT_GLOW: &str = "rgba(59, 130, 246, 0.3)";

const BLOCK_TAGS: [&str; 30] = [
    "html", "body", "div", "section", "article", "aside", "header", "footer", "nav", "main",
    "p", "h1", "h2", "h3", "h4", "h5", "h6", "ul", "ol", "form", "figure", "blockquote",
    "pre", "hr", "address", "fieldset", "details", "summary", "dl", "table",
];

/// Resolved property map of one element.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComputedStyle {
    properties: HashMap<String, String>,
}

impl ComputedStyle {
    pub fn get(&self, property: &str) -> Option<&str> {
        self.properties.get(property).map(String::as_str)
    }

    pub fn get_or<'a>(&'a self, property: &str, default: &'a str) -> &'a str {
        self.get(property).unwrap_or(default)
    }

    /// Leading number of the value, as `parseFloat` reads it.
    pub fn number(&self, property: &str) -> Option<f64> {
        self.get(property).and_then(numeric_value)
    }

    /// The value as uppercase `#RRGGBB`, or the white fallback.
    pub fn hex(&self, property: &str) -> String {
        color_to_hex(self.get(property).unwrap_or(""))
    }

    pub fn properties(&self) -> &HashMap<String, String> {
        &self.properties
    }

    /// Properties in name order, for deterministic iteration.
    pub fn sorted(&self) -> Vec<(&str, &str)> {
        let mut pairs: Vec<(&str, &str)> = self
            .properties
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        pairs.sort_unstable();
        pairs
    }
}

/// Author rules of one document, filtered to the media of one viewport width.
#[derive(Debug)]
pub struct StyleResolver {
    rules: Vec<CssRule>,
}

impl StyleResolver {
    pub fn new(document: &Document, viewport_width: u32) -> Self {
        let mut rules = Vec::new();
        let mut source_order = 0u32;
        for sheet in document_stylesheets(document) {
            for owned in sheet.rules {
                source_order += 1;
                if !owned
                    .media
                    .iter()
                    .all(|condition| media_matches(condition, viewport_width))
                {
                    continue;
                }
                let (important, normal): (Vec<_>, Vec<_>) =
                    owned.declarations.into_iter().partition(|d| d.important);
                let declarations: HashMap<String, String> =
                    normal.into_iter().map(|d| (d.property, d.value)).collect();
                let important_declarations: HashMap<String, String> =
                    important.into_iter().map(|d| (d.property, d.value)).collect();
                for selector in &owned.selectors {
                    let Some(parsed) = parse_complex_selector(selector) else {
                        continue;
                    };
                    rules.push(CssRule {
                        selector: parsed,
                        declarations: declarations.clone(),
                        important_declarations: important_declarations.clone(),
                        source_order,
                    });
                }
            }
        }
        debug!("style resolver holds {} rules at {}px", rules.len(), viewport_width);
        StyleResolver { rules }
    }

    /// Style of `node`, optionally under an interaction state such as `hover`.
    pub fn computed_style(&self, node: &NodeRef, state: Option<&str>) -> ComputedStyle {
        let state = state.map(|s| s.trim_start_matches(':'));
        ComputedStyle {
            properties: self.cascade(node, state),
        }
    }

    fn cascade(&self, node: &NodeRef, state: Option<&str>) -> HashMap<String, String> {
        let parent_style = dom_tree::parent_element(node).map(|p| self.cascade(&p, None));
        let matched: Vec<CssRule> = self
            .rules
            .iter()
            .filter(|rule| matches_complex_selector(node, &rule.selector, state))
            .cloned()
            .collect();
        let inline = dom_tree::with_element(node, |el| el.inline_style()).unwrap_or_default();
        let mut computed = compute_computed_style(matched, &inline, parent_style.as_ref());

        if !computed.contains_key("display") {
            let tag = dom_tree::tag_of(node).unwrap_or_default();
            let display = match tag.as_str() {
                "li" => "list-item",
                "head" | "style" | "script" | "link" | "meta" | "title" => "none",
                t if BLOCK_TAGS.contains(&t) => "block",
                _ => "inline",
            };
            computed.insert("display".to_string(), display.to_string());
        }
        computed
    }
}

/// Evaluates a media query list against a viewport width in pixels.
///
/// Understands media types, `min-width`/`max-width` features and the range
/// syntax (`width <= 767px`). Unknown features are treated as matching.
pub fn media_matches(condition: &str, viewport_width: u32) -> bool {
    let width = f64::from(viewport_width);
    condition.split(',').any(|query| {
        let query = query.trim().to_ascii_lowercase();
        let (negated, query) = match query.strip_prefix("not ") {
            Some(rest) => (true, rest.to_string()),
            None => (false, query.trim_start_matches("only ").to_string()),
        };
        let matched = query
            .split(" and ")
            .all(|part| media_part_matches(part.trim(), width));
        matched != negated
    })
}

fn media_part_matches(part: &str, width: f64) -> bool {
    let Some(feature) = part.strip_prefix('(').and_then(|p| p.strip_suffix(')')) else {
        return matches!(part, "" | "all" | "screen");
    };
    if let Some((name, value)) = feature.split_once(':') {
        let Some(limit) = length_in_px(value) else {
            return true;
        };
        return match name.trim() {
            "max-width" => width <= limit,
            "min-width" => width >= limit,
            _ => true,
        };
    }
    range_matches(feature, width)
}

fn range_matches(feature: &str, width: f64) -> bool {
    // Longest operators first so "<=" is not read as "<".
    for op in ["<=", ">=", "<", ">"] {
        let Some((lhs, rhs)) = feature.split_once(op) else {
            continue;
        };
        let (lhs, rhs) = (lhs.trim(), rhs.trim());
        return if lhs == "width" {
            length_in_px(rhs).map_or(true, |v| compare(width, op, v))
        } else if rhs == "width" {
            length_in_px(lhs).map_or(true, |v| compare(v, op, width))
        } else {
            true
        };
    }
    true
}

fn compare(a: f64, op: &str, b: f64) -> bool {
    match op {
        "<=" => a <= b,
        ">=" => a >= b,
        "<" => a < b,
        _ => a > b,
    }
}

fn length_in_px(value: &str) -> Option<f64> {
    let value = value.trim();
    let number = numeric_value(value)?;
    if value.ends_with("rem") || value.ends_with("em") {
        Some(number * 16.0)
    } else {
        Some(number)
    }
}

/// Leading-number parse: `"12.5px"` is 12.5, `"auto"` is `None`.
pub fn numeric_value(value: &str) -> Option<f64> {
    let value = value.trim_start();
    let mut end = 0;
    let mut seen_digit = false;
    let mut seen_dot = false;
    for (i, ch) in value.char_indices() {
        match ch {
            '+' | '-' if i == 0 => {}
            '0'..='9' => seen_digit = true,
            '.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        end = i + ch.len_utf8();
    }
    if !seen_digit {
        return None;
    }
    value[..end].trim_end_matches('.').parse().ok()
}

/// Any CSS colour as uppercase `#RRGGBB`. Malformed, transparent or fully
/// transparent input yields [`DEFAULT_HEX`].
pub fn color_to_hex(value: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        return DEFAULT_HEX.to_string();
    }
    match csscolorparser::parse(value) {
        Ok(color) if color.a > 0.0 => {
            let [r, g, b, _] = color.to_rgba8();
            format!("#{:02X}{:02X}{:02X}", r, g, b)
        }
        _ => DEFAULT_HEX.to_string(),
    }
}

/// Luma test deciding whether white text reads better on `color`.
pub fn is_color_dark(color: &str) -> bool {
    match csscolorparser::parse(color.trim()) {
        Ok(parsed) => {
            let [r, g, b, _] = parsed.to_rgba8();
            f64::from(r) * 0.299 + f64::from(g) * 0.587 + f64::from(b) * 0.114 < 186.0
        }
        Err(_) => false,
    }
}

/// 30% opaque variant of `base`, used for the focus/hover glow ring.
pub fn glow_color(base: &str) -> String {
    match csscolorparser::parse(base.trim()) {
        Ok(color) if color.a > 0.0 => {
            let [r, g, b, _] = color.to_rgba8();
            format!("rgba({}, {}, {}, 0.3)", r, g, b)
        }
        _ => DEFAULT_GLOW.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::html::create_dom_tree;
    use crate::style::css_matcher::query_selector;

    #[test]
    fn converts_colors_to_hex() {
        assert_eq!(color_to_hex("rgb(255, 0, 0)"), "#FF0000");
        assert_eq!(color_to_hex("#0d6efd"), "#0D6EFD");
        assert_eq!(color_to_hex("navy"), "#000080");
        assert_eq!(color_to_hex("transparent"), DEFAULT_HEX);
        assert_eq!(color_to_hex("rgba(0, 0, 0, 0)"), DEFAULT_HEX);
        assert_eq!(color_to_hex("not-a-color"), DEFAULT_HEX);
        assert_eq!(color_to_hex(""), DEFAULT_HEX);
    }

    #[test]
    fn darkness_and_glow() {
        assert!(is_color_dark("#112233"));
        assert!(!is_color_dark("#FFFFFF"));
        assert!(!is_color_dark("garbage"));
        assert_eq!(glow_color("rgb(13, 110, 253)"), "rgba(13, 110, 253, 0.3)");
        assert_eq!(glow_color(""), DEFAULT_GLOW);
    }

    #[test]
    fn numeric_values_parse_like_parse_float() {
        assert_eq!(numeric_value("12.5px"), Some(12.5));
        assert_eq!(numeric_value(" -3em"), Some(-3.0));
        assert_eq!(numeric_value("1."), Some(1.0));
        assert_eq!(numeric_value("auto"), None);
    }

    #[test]
    fn media_queries_follow_viewport() {
        assert!(media_matches("(max-width: 767px)", 375));
        assert!(!media_matches("(max-width: 767px)", 1280));
        assert!(media_matches("(width <= 1024px)", 768));
        assert!(media_matches("screen and (min-width: 40em)", 1280));
        assert!(!media_matches("print", 1280));
        assert!(media_matches("print, (max-width: 500px)", 375));
    }

    #[test]
    fn resolves_cascade_media_state_and_inheritance() {
        let document = create_dom_tree(concat!(
            "<html><head><style>",
            "body { color: rgb(10, 20, 30); font-size: 18px; }",
            ".btn { background-color: #0d6efd; padding: 4px 8px; }",
            ".btn:hover { background-color: #112233; }",
            "@media (max-width: 767px) { .btn { padding-top: 2px; } }",
            "</style></head><body><section><button class=\"btn\" style=\"border-width: 3px\">Go</button></section></body></html>",
        ));
        let button = query_selector(&document, "button").unwrap();

        let desktop = StyleResolver::new(&document, 1280);
        let style = desktop.computed_style(&button, None);
        assert_eq!(style.hex("background-color"), "#0D6EFD");
        assert_eq!(style.hex("color"), "#0A141E");
        assert_eq!(style.number("font-size"), Some(18.0));
        assert_eq!(style.number("padding-top"), Some(4.0));
        assert_eq!(style.number("padding-left"), Some(8.0));
        assert_eq!(style.number("border-width"), Some(3.0));
        assert_eq!(style.get("display"), Some("inline"));

        let hovered = desktop.computed_style(&button, Some(":hover"));
        assert_eq!(hovered.hex("background-color"), "#112233");

        let mobile = StyleResolver::new(&document, 375);
        assert_eq!(
            mobile.computed_style(&button, None).number("padding-top"),
            Some(2.0)
        );
    }
}
