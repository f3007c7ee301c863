use crate::dom::dom_tree::{self, Document, ElementNode, InlineDeclaration, NodeRef};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

/// ------------------------------
/// 1. Selector Parsing
/// ------------------------------

/// Supported attribute selector operators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeOperator {
    /// [attr="value"]
    Exact,
    /// [attr~="value"]
    Includes,
    /// [attr|="value"]
    DashMatch,
    /// [attr^="value"]
    Prefix,
    /// [attr$="value"]
    Suffix,
    /// [attr*="value"]
    Substring,
}

/// Represents one attribute condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeSelector {
    pub name: String,
    pub operator: Option<AttributeOperator>, // None means only existence check
    pub value: Option<String>,
}

/// Tag, id, classes, attribute conditions and pseudo-classes of one compound.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CompoundSelector {
    pub tag: Option<String>,
    pub id: Option<String>,
    pub classes: HashSet<String>,
    pub attributes: Vec<AttributeSelector>,
    /// Lowercase pseudo-class names without the colon, e.g. "hover", "first-child".
    pub pseudo_classes: Vec<String>,
    /// `::before` and friends; a compound carrying one never matches an element.
    pub pseudo_element: Option<String>,
}

/// A complex selector composed of a key compound selector and a list of ancestor parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplexSelector {
    pub key: CompoundSelector,
    /// Ancestors with their combinators, in right-to-left order.
    pub ancestors: Vec<(Combinator, CompoundSelector)>,
}

/// Supported combinators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Combinator {
    /// Descendant combinator (a space).
    Descendant,
    /// Child combinator (`>`).
    Child,
    /// Adjacent sibling combinator (`+`).
    AdjacentSibling,
    /// General sibling combinator (`~`).
    GeneralSibling,
}

/// Interaction states a pseudo-class can select on.
pub const STATE_PSEUDO_CLASSES: [&str; 6] = [
    "hover",
    "focus",
    "active",
    "visited",
    "focus-within",
    "focus-visible",
];

/// A helper that returns a parsed selector; if parsing fails, returns a fallback.
pub fn parse_selector(selector: &str) -> ComplexSelector {
    parse_complex_selector(selector).unwrap_or_else(|| ComplexSelector {
        key: parse_compound_selector(selector.trim()),
        ancestors: Vec::new(),
    })
}

/// Parses a comma-separated selector list such as `.cta-btn1, .btn-primary-custom`.
pub fn parse_selector_list(selector: &str) -> Vec<ComplexSelector> {
    split_top_level(selector, ',')
        .into_iter()
        .filter_map(parse_complex_selector)
        .collect()
}

/// Splits on `separator` outside brackets, parentheses and quotes.
pub fn split_top_level(text: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;
    for (i, ch) in text.char_indices() {
        match (quote, ch) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"') | (None, '\'') => quote = Some(ch),
            (None, '(') | (None, '[') => depth += 1,
            (None, ')') | (None, ']') => depth = depth.saturating_sub(1),
            (None, c) if c == separator && depth == 0 => {
                parts.push(text[start..i].trim());
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(text[start..].trim());
    parts.into_iter().filter(|p| !p.is_empty()).collect()
}

fn is_compound_boundary(ch: char) -> bool {
    matches!(ch, '#' | '.' | '[' | ':')
}

/// Parse a compound selector string, e.g. "div.red#header[disabled][data-type~=\"main\"]:hover"
pub fn parse_compound_selector(selector: &str) -> CompoundSelector {
    let mut compound = CompoundSelector::default();
    let mut chars = selector.chars().peekable();
    let mut buffer = String::new();

    // If first char is alphabetic or '*' assume tag.
    if let Some(&ch) = chars.peek() {
        if ch.is_alphabetic() || ch == '*' {
            while let Some(&ch) = chars.peek() {
                if is_compound_boundary(ch) {
                    break;
                }
                buffer.push(ch);
                chars.next();
            }
            if !buffer.is_empty() && buffer != "*" {
                compound.tag = Some(buffer.to_ascii_lowercase());
            }
            buffer.clear();
        }
    }

    while let Some(ch) = chars.next() {
        match ch {
            '#' | '.' => {
                while let Some(&next) = chars.peek() {
                    if is_compound_boundary(next) {
                        break;
                    }
                    buffer.push(next);
                    chars.next();
                }
                if !buffer.is_empty() {
                    if ch == '#' {
                        compound.id = Some(buffer.clone());
                    } else {
                        compound.classes.insert(buffer.clone());
                    }
                }
                buffer.clear();
            }
            ':' => {
                let is_element = chars.peek() == Some(&':');
                if is_element {
                    chars.next();
                }
                // Functional pseudo-classes keep their argument, e.g. "nth-child(2)".
                let mut depth = 0usize;
                while let Some(&next) = chars.peek() {
                    if depth == 0 && is_compound_boundary(next) {
                        break;
                    }
                    match next {
                        '(' => depth += 1,
                        ')' => depth = depth.saturating_sub(1),
                        _ => {}
                    }
                    buffer.push(next);
                    chars.next();
                }
                let name = buffer.to_ascii_lowercase();
                buffer.clear();
                // The legacy single-colon spellings still name pseudo-elements.
                let legacy_element = matches!(
                    name.as_str(),
                    "before" | "after" | "first-line" | "first-letter"
                );
                if is_element || legacy_element {
                    compound.pseudo_element = Some(name);
                } else if !name.is_empty() {
                    compound.pseudo_classes.push(name);
                }
            }
            '[' => {
                if let Some(attribute) = parse_attribute_selector(&mut chars) {
                    compound.attributes.push(attribute);
                }
            }
            _ => {}
        }
    }

    compound
}

fn skip_whitespace(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) {
    while let Some(&ch) = chars.peek() {
        if ch.is_whitespace() {
            chars.next();
        } else {
            break;
        }
    }
}

/// Parses the inside of `[...]`; the opening bracket is already consumed.
fn parse_attribute_selector(
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
) -> Option<AttributeSelector> {
    let mut attr_name = String::new();
    let mut operator: Option<AttributeOperator> = None;
    let mut attr_value: Option<String> = None;

    skip_whitespace(chars);
    while let Some(&ch) = chars.peek() {
        if matches!(ch, '=' | ']' | '~' | '|' | '^' | '$' | '*') || ch.is_whitespace() {
            break;
        }
        attr_name.push(ch);
        chars.next();
    }
    skip_whitespace(chars);

    if let Some(&ch) = chars.peek() {
        if matches!(ch, '=' | '~' | '|' | '^' | '$' | '*') {
            let mut op_str = String::new();
            op_str.push(ch);
            chars.next();
            if ch != '=' && chars.peek() == Some(&'=') {
                op_str.push('=');
                chars.next();
            }
            operator = match op_str.as_str() {
                "=" => Some(AttributeOperator::Exact),
                "~=" => Some(AttributeOperator::Includes),
                "|=" => Some(AttributeOperator::DashMatch),
                "^=" => Some(AttributeOperator::Prefix),
                "$=" => Some(AttributeOperator::Suffix),
                "*=" => Some(AttributeOperator::Substring),
                _ => None,
            };
            skip_whitespace(chars);

            let mut value_buf = String::new();
            match chars.peek().copied() {
                Some(q) if q == '"' || q == '\'' => {
                    chars.next();
                    for ch in chars.by_ref() {
                        if ch == q {
                            break;
                        }
                        value_buf.push(ch);
                    }
                }
                _ => {
                    while let Some(&ch) = chars.peek() {
                        if ch.is_whitespace() || ch == ']' {
                            break;
                        }
                        value_buf.push(ch);
                        chars.next();
                    }
                }
            }
            attr_value = Some(value_buf);
        }
    }
    // Skip until ']', which also drops an ` i` case flag.
    for ch in chars.by_ref() {
        if ch == ']' {
            break;
        }
    }
    if attr_name.is_empty() {
        return None;
    }
    Some(AttributeSelector {
        name: attr_name.to_ascii_lowercase(),
        operator,
        value: attr_value,
    })
}

/// Splits a complex selector into compounds and the combinators between them.
/// Combinators need not be surrounded by spaces: `ul>li+li` works.
fn tokenize_complex(selector: &str) -> Vec<(Option<Combinator>, String)> {
    let mut tokens: Vec<(Option<Combinator>, String)> = Vec::new();
    let mut current = String::new();
    let mut pending: Option<Combinator> = None;
    let mut depth = 0usize;
    let mut quote: Option<char> = None;

    let flush = |current: &mut String,
                 pending: &mut Option<Combinator>,
                 tokens: &mut Vec<(Option<Combinator>, String)>| {
        if !current.is_empty() {
            let combinator = if tokens.is_empty() {
                None
            } else {
                Some(pending.take().unwrap_or(Combinator::Descendant))
            };
            tokens.push((combinator, std::mem::take(current)));
        }
    };

    for ch in selector.chars() {
        if let Some(q) = quote {
            current.push(ch);
            if ch == q {
                quote = None;
            }
            continue;
        }
        match ch {
            '"' | '\'' => {
                quote = Some(ch);
                current.push(ch);
            }
            '[' | '(' => {
                depth += 1;
                current.push(ch);
            }
            ']' | ')' => {
                depth = depth.saturating_sub(1);
                current.push(ch);
            }
            '>' | '+' | '~' if depth == 0 => {
                flush(&mut current, &mut pending, &mut tokens);
                pending = Some(match ch {
                    '>' => Combinator::Child,
                    '+' => Combinator::AdjacentSibling,
                    _ => Combinator::GeneralSibling,
                });
            }
            c if c.is_whitespace() && depth == 0 => {
                flush(&mut current, &mut pending, &mut tokens);
            }
            _ => current.push(ch),
        }
    }
    flush(&mut current, &mut pending, &mut tokens);
    tokens
}

/// Parse a complex selector string (e.g. "div.red > p#header + span.foo") into a ComplexSelector.
pub fn parse_complex_selector(selector: &str) -> Option<ComplexSelector> {
    let mut tokens = tokenize_complex(selector).into_iter();
    let (_, first) = tokens.next()?;
    let mut key = parse_compound_selector(&first);
    let mut ancestors = Vec::new();

    for (combinator, compound_token) in tokens {
        ancestors.push((combinator.unwrap_or(Combinator::Descendant), key));
        key = parse_compound_selector(&compound_token);
    }
    ancestors.reverse();
    Some(ComplexSelector { key, ancestors })
}

/// ------------------------------
/// 2. Specificity, Merging & Inheritance
/// ------------------------------

/// Compute specificity for a compound selector as (id_count, class+attribute+pseudo_count, tag_count)
pub fn compute_specificity(compound: &CompoundSelector) -> (u32, u32, u32) {
    let id_count = if compound.id.is_some() { 1 } else { 0 };
    let class_count = compound.classes.len() as u32;
    // Attributes and pseudo-classes count as class-level selectors.
    let attr_count = compound.attributes.len() as u32 + compound.pseudo_classes.len() as u32;
    let tag_count = compound.tag.is_some() as u32 + compound.pseudo_element.is_some() as u32;
    (id_count, class_count + attr_count, tag_count)
}

/// Compute specificity for a complex selector by summing key and ancestors.
pub fn compute_complex_specificity(selector: &ComplexSelector) -> (u32, u32, u32) {
    let mut spec = compute_specificity(&selector.key);
    for (_, comp) in &selector.ancestors {
        let anc_spec = compute_specificity(comp);
        spec.0 += anc_spec.0;
        spec.1 += anc_spec.1;
        spec.2 += anc_spec.2;
    }
    spec
}

/// Represents a CSS rule.
#[derive(Debug, Clone)]
pub struct CssRule {
    pub selector: ComplexSelector,
    /// Declarations: property -> value
    pub declarations: HashMap<String, String>,
    /// Declarations flagged `!important`
    pub important_declarations: HashMap<String, String>,
    pub source_order: u32,
}

const SIDES: [&str; 4] = ["top", "right", "bottom", "left"];

/// Expands the 1 to 4 value box shorthand (`margin: 4px 8px`) onto its four sides.
fn expand_box(declarations: &mut HashMap<String, String>, shorthand: &str) {
    let Some(value) = declarations.remove(shorthand) else {
        return;
    };
    let parts = split_top_level(&value, ' ');
    let picked: [&str; 4] = match parts.as_slice() {
        [all] => [*all, *all, *all, *all],
        [vertical, horizontal] => [*vertical, *horizontal, *vertical, *horizontal],
        [top, horizontal, bottom] => [*top, *horizontal, *bottom, *horizontal],
        [top, right, bottom, left, ..] => [*top, *right, *bottom, *left],
        [] => return,
    };
    for (side, side_value) in SIDES.iter().zip(picked) {
        declarations
            .entry(format!("{}-{}", shorthand, side))
            .or_insert_with(|| side_value.to_string());
    }
}

fn looks_like_border_style(token: &str) -> bool {
    matches!(
        token,
        "none" | "hidden" | "dotted" | "dashed" | "solid" | "double" | "groove" | "ridge" | "inset"
            | "outset"
    )
}

fn looks_like_length(token: &str) -> bool {
    token
        .chars()
        .next()
        .map(|c| c.is_ascii_digit() || c == '.')
        .unwrap_or(false)
        || matches!(token, "thin" | "medium" | "thick")
}

/// Expand shorthand properties into longhand properties.
/// Covers margin, padding, border and a colour-only background.
/// Longhands already declared in the same rule are left alone.
fn expand_shorthand_properties(declarations: &mut HashMap<String, String>) {
    expand_box(declarations, "margin");
    expand_box(declarations, "padding");

    if let Some(border_val) = declarations.remove("border") {
        // Components may come in any order; classify each token.
        for token in split_top_level(&border_val, ' ') {
            let longhand = if looks_like_border_style(token) {
                "border-style"
            } else if looks_like_length(token) {
                "border-width"
            } else {
                "border-color"
            };
            declarations
                .entry(longhand.to_string())
                .or_insert_with(|| token.to_string());
        }
    }

    if let Some(background) = declarations.remove("background") {
        let tokens = split_top_level(&background, ' ');
        if let [single] = tokens.as_slice() {
            if !single.contains("url(") && !single.contains("gradient(") {
                declarations
                    .entry("background-color".to_string())
                    .or_insert_with(|| single.to_string());
            }
        }
        declarations.insert("background".to_string(), background);
    }
}

/// Properties a child takes from its parent when it declares nothing itself.
pub const INHERITABLE: [&str; 12] = [
    "color",
    "font-size",
    "font-family",
    "line-height",
    "font-weight",
    "font-style",
    "text-align",
    "visibility",
    "cursor",
    "letter-spacing",
    "word-spacing",
    "direction",
];

fn sort_by_specificity(rules: &mut [CssRule]) {
    rules.sort_by(|a, b| {
        let spec_a = compute_complex_specificity(&a.selector);
        let spec_b = compute_complex_specificity(&b.selector);
        let cmp_spec = spec_a.cmp(&spec_b);
        if cmp_spec == Ordering::Equal {
            a.source_order.cmp(&b.source_order)
        } else {
            cmp_spec
        }
    });
}

fn layer(computed: &mut HashMap<String, String>, mut declarations: HashMap<String, String>) {
    expand_shorthand_properties(&mut declarations);
    computed.extend(declarations);
}

/// Compute the final computed style for an element by merging matched rules,
/// sorting by specificity and source order, expanding shorthands, and then applying inheritance.
///
/// Layers apply in cascade order: normal rule declarations, the inline `style`
/// attribute, important rule declarations, then important inline declarations.
/// `parent_style` is the computed style of the parent, if any.
pub fn compute_computed_style(
    matched_rules: Vec<CssRule>,
    inline: &[InlineDeclaration],
    parent_style: Option<&HashMap<String, String>>,
) -> HashMap<String, String> {
    let mut rules = matched_rules;
    sort_by_specificity(&mut rules);

    let mut computed: HashMap<String, String> = HashMap::new();
    let mut important_layers = Vec::with_capacity(rules.len());
    for rule in rules {
        layer(&mut computed, rule.declarations);
        important_layers.push(rule.important_declarations);
    }
    let inline_layer = |important: bool| -> HashMap<String, String> {
        inline
            .iter()
            .filter(|d| d.important == important)
            .map(|d| (d.property.clone(), d.value.clone()))
            .collect()
    };
    layer(&mut computed, inline_layer(false));
    for important in important_layers {
        layer(&mut computed, important);
    }
    layer(&mut computed, inline_layer(true));

    // `inherit` resolves to the parent's value before implicit inheritance.
    if let Some(parent) = parent_style {
        for (prop, value) in computed.iter_mut() {
            if value == "inherit" {
                if let Some(inherited) = parent.get(prop) {
                    *value = inherited.clone();
                }
            }
        }
        for prop in INHERITABLE.iter() {
            if !computed.contains_key(*prop) {
                if let Some(val) = parent.get(*prop) {
                    computed.insert((*prop).to_string(), val.clone());
                }
            }
        }
    }
    computed
}

/// ------------------------------
/// 3. Selector Matching
/// ------------------------------

/// Returns true if the given ElementNode matches the CompoundSelector.
/// Checks tag, id, classes, and attribute conditions; pseudo-classes are
/// checked against the tree by `matches_pseudo_classes`.
pub fn matches_compound(elem: &ElementNode, compound: &CompoundSelector) -> bool {
    if compound.pseudo_element.is_some() {
        return false;
    }
    if let Some(ref tag) = compound.tag {
        if !elem.tag.eq_ignore_ascii_case(tag) {
            return false;
        }
    }
    if let Some(ref id_val) = compound.id {
        if elem.id() != Some(id_val.as_str()) {
            return false;
        }
    }
    if !compound.classes.iter().all(|class| elem.has_class(class)) {
        return false;
    }
    compound
        .attributes
        .iter()
        .all(|attr_sel| matches_attribute(elem, attr_sel))
}

fn matches_attribute(elem: &ElementNode, attr_sel: &AttributeSelector) -> bool {
    let Some(actual_val) = elem.attr(&attr_sel.name) else {
        return false;
    };
    let Some(expected) = attr_sel.value.as_deref() else {
        return true;
    };
    match attr_sel.operator {
        Some(AttributeOperator::Exact) => actual_val == expected,
        Some(AttributeOperator::Includes) => actual_val.split_whitespace().any(|w| w == expected),
        Some(AttributeOperator::DashMatch) => {
            actual_val == expected || actual_val.starts_with(&format!("{}-", expected))
        }
        Some(AttributeOperator::Prefix) => !expected.is_empty() && actual_val.starts_with(expected),
        Some(AttributeOperator::Suffix) => !expected.is_empty() && actual_val.ends_with(expected),
        Some(AttributeOperator::Substring) => !expected.is_empty() && actual_val.contains(expected),
        None => true,
    }
}

/// Structural and state pseudo-classes. `state` is the interaction state being
/// resolved (e.g. "hover"); state pseudo-classes match only that state.
/// Unknown pseudo-classes never match.
fn matches_pseudo_classes(node: &NodeRef, compound: &CompoundSelector, state: Option<&str>) -> bool {
    compound.pseudo_classes.iter().all(|pseudo| {
        if STATE_PSEUDO_CLASSES.contains(&pseudo.as_str()) {
            return state == Some(pseudo.as_str());
        }
        match pseudo.as_str() {
            "first-child" => dom_tree::previous_element_sibling(node).is_none(),
            "last-child" => dom_tree::next_element_sibling(node).is_none(),
            "only-child" => {
                dom_tree::previous_element_sibling(node).is_none()
                    && dom_tree::next_element_sibling(node).is_none()
            }
            "root" => dom_tree::parent_element(node).is_none(),
            "empty" => dom_tree::children(node).is_empty(),
            "link" | "any-link" => {
                dom_tree::tag_of(node).as_deref() == Some("a")
                    && dom_tree::with_element(node, |e| e.has_attr("href")).unwrap_or(false)
            }
            _ => false,
        }
    })
}

fn matches_node(node: &NodeRef, compound: &CompoundSelector, state: Option<&str>) -> bool {
    dom_tree::with_element(node, |elem| matches_compound(elem, compound)).unwrap_or(false)
        && matches_pseudo_classes(node, compound, state)
}

/// Matches a ComplexSelector against a candidate element.
/// The matching proceeds right-to-left, using parent and sibling pointers.
pub fn matches_complex_selector(
    candidate: &NodeRef,
    complex: &ComplexSelector,
    state: Option<&str>,
) -> bool {
    if !matches_node(candidate, &complex.key, state) {
        return false;
    }
    let mut current_node = Rc::clone(candidate);
    for (combinator, compound) in &complex.ancestors {
        let found = match combinator {
            Combinator::Child => {
                dom_tree::parent_element(&current_node).filter(|p| matches_node(p, compound, state))
            }
            Combinator::Descendant => {
                let mut ancestor = dom_tree::parent_element(&current_node);
                while let Some(candidate) = ancestor.take() {
                    if matches_node(&candidate, compound, state) {
                        ancestor = Some(candidate);
                        break;
                    }
                    ancestor = dom_tree::parent_element(&candidate);
                }
                ancestor
            }
            Combinator::AdjacentSibling => dom_tree::previous_element_sibling(&current_node)
                .filter(|s| matches_node(s, compound, state)),
            Combinator::GeneralSibling => {
                let mut sibling = dom_tree::previous_element_sibling(&current_node);
                while let Some(candidate) = sibling.take() {
                    if matches_node(&candidate, compound, state) {
                        sibling = Some(candidate);
                        break;
                    }
                    sibling = dom_tree::previous_element_sibling(&candidate);
                }
                sibling
            }
        };
        match found {
            Some(next) => current_node = next,
            None => return false,
        }
    }
    true
}

/// True when any selector of a comma-separated list matches.
pub fn matches_selector_list(node: &NodeRef, selectors: &[ComplexSelector], state: Option<&str>) -> bool {
    selectors
        .iter()
        .any(|selector| matches_complex_selector(node, selector, state))
}

/// Every element of the document matching `selector`, in document order.
pub fn query_selector_all(document: &Document, selector: &str) -> Vec<NodeRef> {
    let selectors = parse_selector_list(selector);
    if selectors.is_empty() {
        return Vec::new();
    }
    document
        .elements()
        .into_iter()
        .filter(|node| matches_selector_list(node, &selectors, None))
        .collect()
}

/// First element of the document matching `selector`.
pub fn query_selector(document: &Document, selector: &str) -> Option<NodeRef> {
    let selectors = parse_selector_list(selector);
    if selectors.is_empty() {
        return None;
    }
    document
        .elements()
        .into_iter()
        .find(|node| matches_selector_list(node, &selectors, None))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::html::create_dom_tree;
    use std::collections::{HashMap, HashSet};

    // Helper to create a CompoundSelector easily.
    fn make_compound(tag: Option<&str>, id: Option<&str>, classes: &[&str]) -> CompoundSelector {
        CompoundSelector {
            tag: tag.map(|t| t.to_string()),
            id: id.map(|i| i.to_string()),
            classes: classes.iter().map(|s| s.to_string()).collect::<HashSet<_>>(),
            ..Default::default()
        }
    }

    // Helper to create a ComplexSelector from a CompoundSelector.
    fn make_complex(compound: CompoundSelector) -> ComplexSelector {
        ComplexSelector {
            key: compound,
            ancestors: vec![],
        }
    }

    fn rule(selector: ComplexSelector, decls: &[(&str, &str)], order: u32) -> CssRule {
        CssRule {
            selector,
            declarations: decls
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            important_declarations: HashMap::new(),
            source_order: order,
        }
    }

    // Test that a rule with higher specificity (ID selector) wins.
    #[test]
    fn test_specificity_wins() {
        let rule1 = rule(make_complex(make_compound(Some("div"), None, &[])), &[("color", "blue")], 2);
        let rule2 = rule(make_complex(make_compound(None, Some("blue"), &[])), &[("color", "green")], 1);
        let computed = compute_computed_style(vec![rule1, rule2], &[], None);
        assert_eq!(computed.get("color"), Some(&"green".to_string()));
    }

    // Test that when specificity is equal, source order wins.
    #[test]
    fn test_source_order() {
        let complex = make_complex(make_compound(Some("p"), None, &[]));
        let rule_a = rule(complex.clone(), &[("font-size", "12px")], 1);
        let rule_b = rule(complex, &[("font-size", "14px")], 2);
        let computed = compute_computed_style(vec![rule_a, rule_b], &[], None);
        assert_eq!(computed.get("font-size"), Some(&"14px".to_string()));
    }

    #[test]
    fn test_inheritance() {
        let parent_style: HashMap<String, String> =
            [("color".to_string(), "red".to_string())].into_iter().collect();
        let computed = compute_computed_style(vec![], &[], Some(&parent_style));
        assert_eq!(computed.get("color"), Some(&"red".to_string()));
    }

    #[test]
    fn test_shorthand_margin_expansion() {
        let complex = make_complex(make_compound(Some("div"), None, &[]));
        let computed =
            compute_computed_style(vec![rule(complex, &[("margin", "10px 20px")], 1)], &[], None);
        assert_eq!(computed.get("margin-top"), Some(&"10px".to_string()));
        assert_eq!(computed.get("margin-right"), Some(&"20px".to_string()));
        assert_eq!(computed.get("margin-bottom"), Some(&"10px".to_string()));
        assert_eq!(computed.get("margin-left"), Some(&"20px".to_string()));
    }

    #[test]
    fn important_beats_inline_and_important_inline_beats_all() {
        let mut shouted = rule(make_complex(make_compound(Some("p"), None, &[])), &[], 1);
        shouted
            .important_declarations
            .insert("color".into(), "blue".into());
        shouted
            .important_declarations
            .insert("padding-top".into(), "1px".into());
        let inline = vec![
            InlineDeclaration {
                property: "color".into(),
                value: "red".into(),
                important: false,
            },
            InlineDeclaration {
                property: "padding-top".into(),
                value: "9px".into(),
                important: true,
            },
        ];
        let computed = compute_computed_style(vec![shouted], &inline, None);
        assert_eq!(computed["color"], "blue");
        assert_eq!(computed["padding-top"], "9px");
    }

    #[test]
    fn parses_combinators_without_spaces_and_pseudo_classes() {
        let selector = parse_selector("ul>li.item+li:hover");
        assert_eq!(selector.key.tag.as_deref(), Some("li"));
        assert_eq!(selector.key.pseudo_classes, vec!["hover".to_string()]);
        assert_eq!(selector.ancestors[0].0, Combinator::Child);
        assert_eq!(selector.ancestors[1].0, Combinator::AdjacentSibling);
        assert_eq!(compute_complex_specificity(&selector), (0, 2, 3));

        let attr = parse_selector(r#"[data-editor-id="editor-el-3"]"#);
        assert_eq!(attr.key.attributes[0].value.as_deref(), Some("editor-el-3"));
        assert!(attr.ancestors.is_empty());
    }

    #[test]
    fn queries_a_parsed_document() {
        let document = create_dom_tree(concat!(
            r##"<div id="hero"><a class="cta-btn1" href="#">A</a><button class="btn-primary-custom">B</button></div>"##,
            r#"<p id="weird id">x</p><ul><li>1</li><li>2</li></ul>"#,
        ));
        assert_eq!(
            query_selector_all(&document, ".cta-btn1, .btn-primary-custom").len(),
            2
        );
        assert!(query_selector(&document, r#"[id="weird id"]"#).is_some());
        assert!(query_selector(&document, "#hero > a + button").is_some());
        assert_eq!(query_selector_all(&document, "ul li:first-child").len(), 1);
        assert!(query_selector(&document, "a:hover").is_none());

        let a = query_selector(&document, "a").unwrap();
        let hover = parse_selector_list("#hero a:hover");
        assert!(matches_selector_list(&a, &hover, Some("hover")));
        assert!(!matches_selector_list(&a, &hover, Some("focus")));
    }
}
