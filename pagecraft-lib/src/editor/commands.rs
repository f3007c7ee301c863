//! Element commands driven by the inspector: text, attributes, links, tag
//! swaps, moves, deletion, duplication, layout flips and section inserts.

use std::fmt;
use std::rc::Rc;
use std::time::Instant;

use log::{debug, info};

use super::applicator::{SharedRole, StyleRoute};
use super::surface::DocumentSurface;
use super::{is_root, Confirm, Editor};
use crate::dom::dom_tree::{self, NodeRef};
use crate::error::{EditorError, Result};
use crate::parser::html::parse_body_fragment;
use crate::style::css_matcher::query_selector_all;
use crate::style::resolver::{glow_color, is_color_dark, StyleResolver, DEFAULT_GLOW};

/// Value written for the box shadow toggle.
pub const BOX_SHADOW: &str =
    "0 10px 15px -3px rgba(0,0,0,0.1), 0 4px 6px -2px rgba(0,0,0,0.05)";

/// Class that reverses a two-column flex row.
pub const FLIPPED_CLASS: &str = "flipped";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "up" => Some(Direction::Up),
            "down" => Some(Direction::Down),
            "left" => Some(Direction::Left),
            "right" => Some(Direction::Right),
            _ => None,
        }
    }

    fn is_horizontal(self) -> bool {
        matches!(self, Direction::Left | Direction::Right)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        })
    }
}

/// An edit applied to the selected element, or to the document for `InsertSection`.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SetStyle {
        property: String,
        value: String,
        pseudo_class: Option<String>,
    },
    SetAttribute {
        name: String,
        value: String,
    },
    SetText(String),
    /// An empty url unwraps the surrounding link.
    SetLink {
        url: String,
        new_window: bool,
    },
    ReplaceTag(String),
    MoveElement(Direction),
    DeleteElement,
    DuplicateElement,
    FlipLayout,
    InsertSection(String),
    /// Hover background; dark colours also get white hover text.
    HoverBackground(String),
    /// Border colour for both `:hover` and `:focus`.
    HoverBorderColor(String),
    BoxShadow(bool),
    Glow(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Success,
    Info,
    Error,
}

/// User-facing outcome of a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub kind: StatusKind,
    pub message: String,
}

impl Status {
    pub fn success(message: impl Into<String>) -> Self {
        Status {
            kind: StatusKind::Success,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Status {
            kind: StatusKind::Info,
            message: message.into(),
        }
    }

    pub fn from_error(error: &EditorError) -> Self {
        Status {
            kind: StatusKind::Error,
            message: error.to_string(),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Result of applying a command before any history bookkeeping.
struct Outcome {
    status: Status,
    changed: bool,
}

impl Outcome {
    fn changed(status: Status) -> Self {
        Outcome {
            status,
            changed: true,
        }
    }

    fn unchanged(status: Status) -> Self {
        Outcome {
            status,
            changed: false,
        }
    }
}

/// Outcome of a style write; a skipped write leaves nothing to record.
fn styled(route: StyleRoute, message: &str) -> Outcome {
    match route {
        StyleRoute::Skipped => Outcome::unchanged(Status::info("Style not applied.")),
        _ => Outcome::changed(Status::success(message)),
    }
}

/// Template elements whose resolved style a replacement tag inherits.
fn style_template(tag: &str) -> Option<&'static str> {
    match tag {
        "h1" => Some("h1"),
        "h2" => Some("h2"),
        "p" => Some("p"),
        "button" => Some("button, .btn, [type=\"submit\"]"),
        "section" => Some("section"),
        _ => None,
    }
}

fn is_valid_tag(tag: &str) -> bool {
    let mut chars = tag.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '-')
}

/// Nearest ancestor-or-self below `<body>` whose parent lays out flex or grid items.
pub fn movable_column(node: &NodeRef, resolver: &StyleResolver) -> Option<NodeRef> {
    let mut child = Rc::clone(node);
    let mut parent = dom_tree::parent_element(node);
    while let Some(current) = parent {
        if dom_tree::tag_of(&current).as_deref() == Some("body") {
            return None;
        }
        let display = resolver.computed_style(&current, None).get_or("display", "").to_string();
        if display.contains("flex") || display.contains("grid") {
            return Some(child);
        }
        parent = dom_tree::parent_element(&current);
        child = current;
    }
    None
}

/// A flex container with exactly two element children.
pub fn is_flippable(node: &NodeRef, resolver: &StyleResolver) -> bool {
    dom_tree::tag_of(node).as_deref() != Some("body")
        && resolver.computed_style(node, None).get("display") == Some("flex")
        && dom_tree::element_children(node).len() == 2
}

impl<S: DocumentSurface> Editor<S> {
    /// Applies `command` and records one history entry when it changed the document.
    pub fn execute(&mut self, command: Command, confirm: &mut dyn Confirm) -> Result<Status> {
        let outcome = self.apply_command(command, confirm)?;
        if outcome.changed {
            self.record();
        }
        Ok(outcome.status)
    }

    /// Applies `command` from a continuous control (slider, colour drag).
    ///
    /// The snapshot is debounced: it is recorded by [`Editor::tick`] once the
    /// control has been quiet for the configured period. Commands that ask
    /// for confirmation are declined.
    pub fn execute_continuous(&mut self, command: Command, now: Instant) -> Result<Status> {
        let outcome = self.apply_command(command, &mut |_: &str| false)?;
        if outcome.changed {
            self.debouncer.schedule(now);
        }
        Ok(outcome.status)
    }

    fn apply_command(&mut self, command: Command, confirm: &mut dyn Confirm) -> Result<Outcome> {
        debug!("command {:?}", command);
        match command {
            Command::InsertSection(html) => self.insert_section(&html),
            Command::SetStyle {
                property,
                value,
                pseudo_class,
            } => {
                let route = self.apply_style(&property, &value, pseudo_class.as_deref())?;
                Ok(styled(route, "Style updated."))
            }
            Command::HoverBackground(color) => {
                let selected = self.selected().ok_or(EditorError::NoSelection)?;
                let route = self.apply_style("background-color", &color, Some(":hover"))?;
                if SharedRole::detect(&selected) == Some(SharedRole::FormField) {
                    self.apply_style("background-color", &color, Some(":focus"))?;
                } else if is_color_dark(&color) {
                    self.apply_style("color", "#FFFFFF", Some(":hover"))?;
                }
                Ok(styled(route, "Hover style updated."))
            }
            Command::HoverBorderColor(color) => {
                let route = self.apply_style("border-color", &color, Some(":hover"))?;
                self.apply_style("border-color", &color, Some(":focus"))?;
                Ok(styled(route, "Hover style updated."))
            }
            Command::BoxShadow(on) => {
                let route =
                    self.apply_style("box-shadow", if on { BOX_SHADOW } else { "none" }, None)?;
                Ok(styled(route, "Style updated."))
            }
            Command::Glow(on) => self.set_glow(on),
            other => {
                let node = self.selected().ok_or(EditorError::NoSelection)?;
                self.apply_element_command(other, &node, confirm)
            }
        }
    }

    fn apply_element_command(
        &mut self,
        command: Command,
        node: &NodeRef,
        confirm: &mut dyn Confirm,
    ) -> Result<Outcome> {
        match command {
            Command::SetAttribute { name, value } => {
                dom_tree::with_element_mut(node, |el| el.set_attr(name.trim(), value));
                Ok(Outcome::changed(Status::success("Attribute updated.")))
            }
            Command::SetText(text) => {
                dom_tree::set_text_content(node, &text);
                Ok(Outcome::changed(Status::success("Text updated.")))
            }
            Command::SetLink { url, new_window } => self.set_link(node, url.trim(), new_window),
            Command::ReplaceTag(tag) => self.replace_tag(node, &tag),
            Command::MoveElement(direction) => self.move_element(node, direction),
            Command::DeleteElement => {
                if is_root(node) {
                    return Err(EditorError::RootElement { action: "delete" });
                }
                if !confirm.confirm("Are you sure you want to delete this element?") {
                    return Ok(Outcome::unchanged(Status::info("Delete cancelled.")));
                }
                dom_tree::detach(node);
                self.selection = None;
                info!("element deleted");
                Ok(Outcome::changed(Status::success("Element deleted.")))
            }
            Command::DuplicateElement => {
                if is_root(node) {
                    return Err(EditorError::RootElement { action: "copy" });
                }
                let parent = dom_tree::parent(node).ok_or(EditorError::NoSelection)?;
                let copy = dom_tree::deep_clone(node);
                let marker = self.config.marker_attribute.clone();
                let highlight = self.config.highlight_class.clone();
                dom_tree::with_element_mut(&copy, |el| {
                    el.remove_class(&highlight);
                    el.remove_attr(&marker);
                });
                // Copies get markers of their own on first use.
                for descendant in dom_tree::descendant_elements(&copy) {
                    dom_tree::with_element_mut(&descendant, |el| el.remove_attr(&marker));
                }
                dom_tree::insert_after(&parent, &copy, node);
                Ok(Outcome::changed(Status::success("Element copied.")))
            }
            Command::FlipLayout => {
                let resolver = self.resolver().ok_or(EditorError::NotReady)?;
                if !is_flippable(node, &resolver) {
                    return Err(EditorError::NotFlippable);
                }
                dom_tree::with_element_mut(node, |el| el.toggle_class(FLIPPED_CLASS));
                Ok(Outcome::changed(Status::success("Layout flipped.")))
            }
            // Handled before an element is required.
            Command::InsertSection(_)
            | Command::SetStyle { .. }
            | Command::HoverBackground(_)
            | Command::HoverBorderColor(_)
            | Command::BoxShadow(_)
            | Command::Glow(_) => Ok(Outcome::unchanged(Status::info("Nothing to do."))),
        }
    }

    fn insert_section(&mut self, html: &str) -> Result<Outcome> {
        let body = self
            .surface
            .document()
            .and_then(|document| document.body())
            .ok_or(EditorError::NotReady)?;
        let nodes = parse_body_fragment(html);
        if nodes.is_empty() {
            return Ok(Outcome::unchanged(Status::info("Nothing to insert.")));
        }
        for node in &nodes {
            dom_tree::append_child(&body, node);
        }
        info!("inserted {} node(s) at the end of <body>", nodes.len());
        Ok(Outcome::changed(Status::success("Section added.")))
    }

    fn set_glow(&mut self, on: bool) -> Result<Outcome> {
        let node = self.selected().ok_or(EditorError::NoSelection)?;
        let value = if on {
            let style = self
                .resolver()
                .map(|resolver| resolver.computed_style(&node, None));
            let base = style
                .as_ref()
                .and_then(|s| s.get("border-color").or_else(|| s.get("background-color")))
                .map(glow_color)
                .unwrap_or_else(|| DEFAULT_GLOW.to_string());
            format!("0 0 0 4px {}", base)
        } else {
            "none".to_string()
        };
        let route = self.apply_style("box-shadow", &value, Some(":hover"))?;
        self.apply_style("box-shadow", &value, Some(":focus"))?;
        Ok(styled(route, "Glow updated."))
    }

    fn set_link(&mut self, node: &NodeRef, url: &str, new_window: bool) -> Result<Outcome> {
        let existing = dom_tree::closest(node, "a");
        if url.is_empty() {
            let Some(link) = existing else {
                return Ok(Outcome::unchanged(Status::info("No link to remove.")));
            };
            let parent = dom_tree::parent(&link).ok_or(EditorError::NoSelection)?;
            let children = dom_tree::children(&link);
            for child in &children {
                dom_tree::insert_before(&parent, child, &link);
            }
            dom_tree::detach(&link);
            if Rc::ptr_eq(&link, node) {
                match children.iter().find(|c| dom_tree::is_element(c)) {
                    Some(first) => self.adopt_selection(first),
                    None => self.selection = None,
                }
            }
            return Ok(Outcome::changed(Status::success("Link removed.")));
        }

        let link = match existing {
            Some(link) => link,
            None => {
                if is_root(node) {
                    return Err(EditorError::RootElement { action: "link" });
                }
                let parent = dom_tree::parent(node).ok_or(EditorError::NoSelection)?;
                let link = dom_tree::new_element("a");
                dom_tree::insert_before(&parent, &link, node);
                dom_tree::append_child(&link, node);
                self.adopt_selection(&link);
                link
            }
        };
        dom_tree::with_element_mut(&link, |el| {
            el.set_attr("href", url);
            if new_window {
                el.set_attr("target", "_blank");
            } else {
                el.remove_attr("target");
            }
        });
        Ok(Outcome::changed(Status::success("Link updated.")))
    }

    fn replace_tag(&mut self, node: &NodeRef, tag: &str) -> Result<Outcome> {
        let tag = tag.trim().to_ascii_lowercase();
        if !is_valid_tag(&tag) {
            return Err(EditorError::InvalidTag(tag));
        }
        if is_root(node) {
            return Err(EditorError::RootElement { action: "change" });
        }
        if dom_tree::tag_of(node).as_deref() == Some(tag.as_str()) {
            return Ok(Outcome::unchanged(Status::info("Tag unchanged.")));
        }

        let inherited: Vec<(String, String)> = match (style_template(&tag), self.surface.document())
        {
            (Some(template), Some(document)) => query_selector_all(document, template)
                .into_iter()
                .find(|candidate| !Rc::ptr_eq(candidate, node))
                .and_then(|source| {
                    self.resolver()
                        .map(|resolver| resolver.computed_style(&source, None))
                })
                .map(|style| {
                    style
                        .sorted()
                        .into_iter()
                        .map(|(k, v)| (k.to_string(), v.to_string()))
                        .collect()
                })
                .unwrap_or_default(),
            _ => Vec::new(),
        };

        let replacement = dom_tree::new_element(&tag);
        let attributes = dom_tree::with_element(node, |el| el.attributes.clone()).unwrap_or_default();
        dom_tree::with_element_mut(&replacement, |el| {
            el.attributes = attributes
                .into_iter()
                .filter(|attr| &*attr.name.local != "style")
                .collect();
            for (property, value) in &inherited {
                el.set_style_property(property, value, true);
            }
        });
        for child in dom_tree::children(node) {
            dom_tree::append_child(&replacement, &child);
        }
        dom_tree::replace_with(node, &replacement);
        self.adopt_selection(&replacement);
        info!("element changed to <{}>", tag);
        Ok(Outcome::changed(Status::success(format!("Element changed to <{}>.", tag))))
    }

    fn move_element(&mut self, node: &NodeRef, direction: Direction) -> Result<Outcome> {
        let target = if direction.is_horizontal() {
            let resolver = self.resolver().ok_or(EditorError::NotReady)?;
            movable_column(node, &resolver).ok_or(EditorError::CannotMove(direction))?
        } else {
            Rc::clone(node)
        };
        let parent = dom_tree::parent(&target).ok_or(EditorError::CannotMove(direction))?;
        match direction {
            Direction::Up | Direction::Left => {
                let previous = dom_tree::previous_element_sibling(&target)
                    .ok_or(EditorError::CannotMove(direction))?;
                dom_tree::insert_before(&parent, &target, &previous);
            }
            Direction::Down | Direction::Right => {
                let next = dom_tree::next_element_sibling(&target)
                    .ok_or(EditorError::CannotMove(direction))?;
                dom_tree::insert_before(&parent, &next, &target);
            }
        }
        Ok(Outcome::changed(Status::success(format!("Element moved {}.", direction))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EditorConfig;
    use crate::editor::Editor;
    use crate::parser::serialize::inner_html;
    use pretty_assertions::assert_eq;

    fn editor_with(html: &str) -> Editor {
        let mut editor = Editor::headless(EditorConfig::default());
        editor.load(html);
        editor
    }

    fn yes() -> impl FnMut(&str) -> bool {
        |_: &str| true
    }

    fn body_tags(editor: &Editor) -> Vec<String> {
        let body = editor.document().unwrap().body().unwrap();
        dom_tree::element_children(&body)
            .iter()
            .filter_map(|n| dom_tree::with_element(n, |el| el.id().unwrap_or("").to_string()))
            .collect()
    }

    #[test]
    fn each_command_records_one_entry() {
        let mut editor = editor_with(r#"<h1 id="t">Hi</h1>"#);
        editor.select("#t").unwrap();
        editor
            .execute(
                Command::SetStyle {
                    property: "color".into(),
                    value: "red".into(),
                    pseudo_class: None,
                },
                &mut yes(),
            )
            .unwrap();
        assert_eq!(editor.history_len(), 2);
        assert_eq!(editor.history_position(), Some(1));
    }

    #[test]
    fn moves_vertically_between_siblings() {
        let mut editor = editor_with(r#"<p id="a">A</p><p id="b">B</p>"#);
        editor.select("#b").unwrap();
        editor.execute(Command::MoveElement(Direction::Up), &mut yes()).unwrap();
        assert_eq!(body_tags(&editor), vec!["b", "a"]);
        let err = editor
            .execute(Command::MoveElement(Direction::Up), &mut yes())
            .unwrap_err();
        assert_eq!(err.to_string(), "Element cannot be moved up.");
    }

    #[test]
    fn moves_columns_of_flex_rows() {
        let mut editor = editor_with(concat!(
            r#"<style>.row { display: flex; }</style>"#,
            r#"<div class="row"><div id="left"><p id="txt">L</p></div><div id="right">R</div></div>"#,
        ));
        editor.select("#txt").unwrap();
        editor.execute(Command::MoveElement(Direction::Right), &mut yes()).unwrap();
        let row = editor.document().unwrap().body().unwrap();
        let row = dom_tree::element_children(&row)
            .into_iter()
            .find(|n| dom_tree::with_element(n, |el| el.has_class("row")).unwrap_or(false))
            .unwrap();
        let order: Vec<String> = dom_tree::element_children(&row)
            .iter()
            .filter_map(|n| dom_tree::with_element(n, |el| el.id().unwrap_or("").to_string()))
            .collect();
        assert_eq!(order, vec!["right", "left"]);
    }

    #[test]
    fn horizontal_move_needs_a_flex_or_grid_parent() {
        let mut editor = editor_with(r#"<div><p id="x">x</p></div>"#);
        editor.select("#x").unwrap();
        assert!(matches!(
            editor.execute(Command::MoveElement(Direction::Left), &mut yes()),
            Err(EditorError::CannotMove(Direction::Left))
        ));
        assert_eq!(editor.history_len(), 1);
    }

    #[test]
    fn delete_asks_first_and_refuses_body() {
        let mut editor = editor_with(r#"<p id="a">A</p>"#);
        editor.select("#a").unwrap();
        let status = editor
            .execute(Command::DeleteElement, &mut |_: &str| false)
            .unwrap();
        assert_eq!(status.kind, StatusKind::Info);
        assert_eq!(editor.history_len(), 1);

        editor.execute(Command::DeleteElement, &mut yes()).unwrap();
        assert!(editor.selected().is_none());
        assert!(editor.document().unwrap().get_element_by_id("a").is_none());

        editor.select("body").unwrap();
        let err = editor.execute(Command::DeleteElement, &mut yes()).unwrap_err();
        assert_eq!(err.to_string(), "Cannot delete this element.");
        let err = editor.execute(Command::DuplicateElement, &mut yes()).unwrap_err();
        assert_eq!(err.to_string(), "Cannot copy this element.");
    }

    #[test]
    fn duplicate_inserts_an_unhighlighted_copy_without_markers() {
        let mut editor = editor_with(r#"<p class="lead">A</p>"#);
        editor.select("p").unwrap();
        editor
            .execute(
                Command::SetStyle {
                    property: "color".into(),
                    value: "red".into(),
                    pseudo_class: Some(":hover".into()),
                },
                &mut yes(),
            )
            .unwrap();
        editor.execute(Command::DuplicateElement, &mut yes()).unwrap();
        let body = editor.document().unwrap().body().unwrap();
        let paragraphs = dom_tree::element_children(&body);
        assert_eq!(paragraphs.len(), 2);
        dom_tree::with_element(&paragraphs[1], |el| {
            assert_eq!(el.attr("class"), Some("lead"));
            assert!(!el.has_attr("data-editor-id"));
        });
        let copy = paragraphs[1].clone();
        assert_eq!(
            editor.selector_for(&copy).as_deref(),
            Some("[data-editor-id=\"editor-el-2\"]")
        );
    }

    #[test]
    fn flip_toggles_two_column_flex_rows_only() {
        let mut editor = editor_with(concat!(
            r#"<div id="row" style="display: flex"><div>1</div><div>2</div></div>"#,
            r#"<div id="plain"><div>1</div><div>2</div></div>"#,
        ));
        editor.select("#row").unwrap();
        editor.execute(Command::FlipLayout, &mut yes()).unwrap();
        let row = editor.selected().unwrap();
        assert_eq!(dom_tree::with_element(&row, |el| el.has_class("flipped")), Some(true));

        editor.select("#plain").unwrap();
        let err = editor.execute(Command::FlipLayout, &mut yes()).unwrap_err();
        assert_eq!(err.to_string(), "This is not a 2-column flex container.");
    }

    #[test]
    fn link_wraps_and_unwraps() {
        let mut editor = editor_with(r#"<img id="pic" src="a.png">"#);
        editor.select("#pic").unwrap();
        editor
            .execute(
                Command::SetLink {
                    url: "https://example.com".into(),
                    new_window: true,
                },
                &mut yes(),
            )
            .unwrap();
        let link = editor.selected().unwrap();
        assert_eq!(dom_tree::tag_of(&link).as_deref(), Some("a"));
        dom_tree::with_element(&link, |el| {
            assert_eq!(el.attr("href"), Some("https://example.com"));
            assert_eq!(el.attr("target"), Some("_blank"));
        });

        editor
            .execute(
                Command::SetLink {
                    url: String::new(),
                    new_window: false,
                },
                &mut yes(),
            )
            .unwrap();
        let body = editor.document().unwrap().body().unwrap();
        assert_eq!(dom_tree::tag_of(&dom_tree::element_children(&body)[0]).as_deref(), Some("img"));
        assert_eq!(dom_tree::tag_of(&editor.selected().unwrap()).as_deref(), Some("img"));
    }

    #[test]
    fn replace_tag_keeps_children_and_inherits_template_style() {
        let mut editor = editor_with(concat!(
            r#"<h2 style="color: rgb(1, 2, 3)">Template</h2>"#,
            r#"<p id="p" class="x" style="color: red">Hello <b>you</b></p>"#,
        ));
        editor.select("#p").unwrap();
        editor.execute(Command::ReplaceTag("h2".into()), &mut yes()).unwrap();
        let replaced = editor.document().unwrap().get_element_by_id("p").unwrap();
        assert_eq!(dom_tree::tag_of(&replaced).as_deref(), Some("h2"));
        assert_eq!(inner_html(&replaced).unwrap(), "Hello <b>you</b>");
        dom_tree::with_element(&replaced, |el| {
            assert!(el.has_class("x"));
            assert_eq!(el.style_property("color").as_deref(), Some("rgb(1, 2, 3)"));
        });
        assert!(matches!(
            editor.execute(Command::ReplaceTag("1bad".into()), &mut yes()),
            Err(EditorError::InvalidTag(_))
        ));
    }

    #[test]
    fn insert_section_appends_to_body() {
        let mut editor = editor_with(r#"<p id="a">A</p>"#);
        editor
            .execute(
                Command::InsertSection(r#"<section id="s"><h2>New</h2></section>"#.into()),
                &mut yes(),
            )
            .unwrap();
        assert_eq!(body_tags(&editor), vec!["a", "s"]);
        assert_eq!(editor.history_len(), 2);
    }

    #[test]
    fn hover_background_adds_white_text_for_dark_colors() {
        let mut editor = editor_with(r#"<a id="go" href="a">Go</a>"#);
        editor.select("#go").unwrap();
        editor
            .execute(Command::HoverBackground("#111111".into()), &mut yes())
            .unwrap();
        let document = editor.document().unwrap();
        let rule = editor
            .rule_store()
            .find_rule(document, "#go", None, Some(":hover"))
            .unwrap();
        assert_eq!(rule.get("background-color"), Some("#111111"));
        assert_eq!(rule.get("color"), Some("#FFFFFF"));
        assert_eq!(editor.history_len(), 2);
    }

    #[test]
    fn form_field_hover_background_also_covers_focus() {
        let mut editor = editor_with(r#"<input id="f" class="form-control-generated">"#);
        editor.select("#f").unwrap();
        editor
            .execute(Command::HoverBackground("#111111".into()), &mut yes())
            .unwrap();
        let document = editor.document().unwrap();
        let store = editor.rule_store();
        let hover = store
            .find_rule(document, ".form-control-generated", None, Some(":hover"))
            .unwrap();
        let focus = store
            .find_rule(document, ".form-control-generated", None, Some(":focus"))
            .unwrap();
        assert_eq!(hover.get("background-color"), Some("#111111"));
        assert_eq!(focus.get("background-color"), Some("#111111"));
        assert_eq!(hover.get("color"), None);
        assert_eq!(editor.history_len(), 2);
    }

    #[test]
    fn style_without_a_head_is_not_recorded() {
        let mut editor = editor_with(r#"<a id="go" href="a">Go</a>"#);
        editor.select("#go").unwrap();
        let head = editor.document().unwrap().head().unwrap();
        dom_tree::detach(&head);
        let status = editor
            .execute(Command::HoverBackground("#111111".into()), &mut yes())
            .unwrap();
        assert_eq!(status.kind, StatusKind::Info);
        assert_eq!(editor.history_len(), 1);
    }

    #[test]
    fn glow_derives_from_border_color() {
        let mut editor = editor_with(r#"<button id="b" style="border-color: rgb(10, 20, 30)">B</button>"#);
        editor.select("#b").unwrap();
        editor.execute(Command::Glow(true), &mut yes()).unwrap();
        let document = editor.document().unwrap();
        let rule = editor
            .rule_store()
            .find_rule(document, "#b", None, Some(":focus"))
            .unwrap();
        assert_eq!(rule.get("box-shadow"), Some("0 0 0 4px rgba(10, 20, 30, 0.3)"));
    }

    #[test]
    fn continuous_edits_record_once_after_quiet_period() {
        let start = Instant::now();
        let mut editor = editor_with(r#"<p id="a">A</p>"#);
        editor.select("#a").unwrap();
        for (i, size) in ["10px", "11px", "12px"].iter().enumerate() {
            editor
                .execute_continuous(
                    Command::SetStyle {
                        property: "font-size".into(),
                        value: size.to_string(),
                        pseudo_class: None,
                    },
                    start + std::time::Duration::from_millis(i as u64 * 100),
                )
                .unwrap();
        }
        editor.tick(start + std::time::Duration::from_millis(500));
        assert_eq!(editor.history_len(), 1);
        editor.tick(start + std::time::Duration::from_millis(600));
        assert_eq!(editor.history_len(), 2);
    }

    #[test]
    fn commands_need_a_selection() {
        let mut editor = editor_with("<p>x</p>");
        let err = editor.execute(Command::SetText("y".into()), &mut yes()).unwrap_err();
        assert_eq!(err.to_string(), "No element selected.");
    }
}
