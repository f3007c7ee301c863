//! Read-only view of the selection: which controls apply to it and the
//! values they start from.

use std::rc::Rc;

use super::applicator::SharedRole;
use super::commands::{is_flippable, movable_column};
use super::surface::DocumentSurface;
use super::{is_root, Editor};
use crate::dom::dom_tree::{self, NodeRef};
use crate::style::resolver::{color_to_hex, numeric_value, ComputedStyle};

const TEXT_TAGS: [&str; 12] = [
    "button", "a", "p", "h1", "h2", "h3", "h4", "h5", "h6", "span", "li", "td",
];
const HOVERABLE_TAGS: [&str; 4] = ["a", "button", "input", "textarea"];
const FORM_FIELD_TAGS: [&str; 2] = ["input", "textarea"];

/// Control groups that apply to the selected element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Affordances {
    pub text: bool,
    pub image: bool,
    pub icon: bool,
    pub link: bool,
    /// Hover colours for links and buttons.
    pub hover: bool,
    /// Hover/focus border and size controls for inputs.
    pub form_field: bool,
}

impl Affordances {
    pub fn for_tag(tag: &str) -> Self {
        let form_field = FORM_FIELD_TAGS.contains(&tag);
        Affordances {
            text: TEXT_TAGS.contains(&tag),
            image: tag == "img",
            icon: tag == "svg",
            link: tag == "a" || tag == "button",
            hover: HOVERABLE_TAGS.contains(&tag) && !form_field,
            form_field,
        }
    }
}

/// Four box sides in top, right, bottom, left order.
pub type Sides = [f64; 4];

/// Starting values of the inspector controls.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InspectorFields {
    pub text: String,
    pub image_src: String,
    pub image_alt: String,
    pub link_url: String,
    pub link_new_window: bool,
    pub width: String,
    pub height: String,
    pub display: String,
    pub opacity: f64,
    pub background_color: String,
    pub hover_background_color: String,
    pub hover_text_color: String,
    pub hover_border_color: String,
    pub border_width: f64,
    pub border_style: String,
    pub border_color: String,
    pub border_radius: f64,
    pub box_shadow: bool,
    pub glow: bool,
    pub line_height: f64,
    pub letter_spacing: f64,
    pub text_transform: String,
    pub icon_size: f64,
    pub icon_color: String,
    pub padding: Sides,
    pub margin: Sides,
    pub font_family: String,
    pub font_size: f64,
    pub text_color: String,
    pub text_align: String,
}

/// Which element actions are currently possible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ActionAvailability {
    pub delete: bool,
    pub duplicate: bool,
    pub flip: bool,
    pub move_up: bool,
    pub move_down: bool,
    pub move_left: bool,
    pub move_right: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Inspection {
    pub tag: String,
    pub affordances: Affordances,
    pub shared_role: Option<SharedRole>,
    pub apply_all_label: Option<&'static str>,
    pub fields: InspectorFields,
    pub actions: ActionAvailability,
}

fn sides(style: &ComputedStyle, property: &str) -> Sides {
    ["top", "right", "bottom", "left"]
        .map(|side| style.number(&format!("{}-{}", property, side)).unwrap_or(0.0))
}

fn first_family(value: &str) -> String {
    value
        .split(',')
        .next()
        .unwrap_or("")
        .replace(['"', '\''], "")
        .trim()
        .to_string()
}

/// The `<a>` owning a link: the element itself, or the parent of a button.
fn link_element(node: &NodeRef, tag: &str) -> Option<NodeRef> {
    match tag {
        "a" => Some(Rc::clone(node)),
        "button" => dom_tree::parent_element(node)
            .filter(|parent| dom_tree::tag_of(parent).as_deref() == Some("a")),
        _ => None,
    }
}

impl<S: DocumentSurface> Editor<S> {
    /// Inspector state for the current selection, `None` when nothing is selected.
    pub fn inspect(&self) -> Option<Inspection> {
        let node = self.selected()?;
        let resolver = self.resolver()?;
        let tag = dom_tree::tag_of(&node)?;
        let affordances = Affordances::for_tag(&tag);
        let shared_role = SharedRole::detect(&node);

        let style = resolver.computed_style(&node, None);
        let hover = resolver.computed_style(&node, Some("hover"));
        let attr = |name: &str| {
            dom_tree::with_element(&node, |el| el.attr(name).unwrap_or("").to_string())
                .unwrap_or_default()
        };
        let link = link_element(&node, &tag);
        let shadow = style.get_or("box-shadow", "none").to_string();

        let fields = InspectorFields {
            text: dom_tree::text_content(&node),
            image_src: attr("src"),
            image_alt: attr("alt"),
            link_url: link
                .as_ref()
                .and_then(|l| dom_tree::with_element(l, |el| el.attr("href").unwrap_or("").to_string()))
                .unwrap_or_default(),
            link_new_window: link
                .as_ref()
                .and_then(|l| dom_tree::with_element(l, |el| el.attr("target") == Some("_blank")))
                .unwrap_or(false),
            width: style.get_or("width", "auto").to_string(),
            height: style.get_or("height", "auto").to_string(),
            display: style.get_or("display", "").to_string(),
            opacity: style.number("opacity").unwrap_or(1.0),
            background_color: style.hex("background-color"),
            hover_background_color: hover.hex("background-color"),
            hover_text_color: hover.hex("color"),
            hover_border_color: hover.hex("border-color"),
            border_width: style.number("border-width").unwrap_or(0.0),
            border_style: style.get_or("border-style", "none").to_string(),
            border_color: style.hex("border-color"),
            border_radius: style.number("border-radius").unwrap_or(0.0),
            box_shadow: shadow != "none" && !shadow.contains("rgba"),
            glow: shadow.contains("rgba"),
            line_height: style.number("line-height").unwrap_or(1.5),
            letter_spacing: style.number("letter-spacing").unwrap_or(0.0),
            text_transform: style.get_or("text-transform", "none").to_string(),
            icon_size: style.number("width").unwrap_or(24.0),
            icon_color: style.hex("color"),
            padding: sides(&style, "padding"),
            margin: sides(&style, "margin"),
            font_family: first_family(style.get_or("font-family", "")),
            font_size: style
                .get("font-size")
                .and_then(numeric_value)
                .map(f64::trunc)
                .unwrap_or(16.0),
            text_color: color_to_hex(style.get_or("color", "")),
            text_align: style.get_or("text-align", "").to_string(),
        };

        let column = movable_column(&node, &resolver);
        let root = is_root(&node);
        let actions = ActionAvailability {
            delete: !root,
            duplicate: !root,
            flip: is_flippable(&node, &resolver),
            move_up: dom_tree::previous_element_sibling(&node).is_some(),
            move_down: dom_tree::next_element_sibling(&node).is_some(),
            move_left: column
                .as_ref()
                .and_then(dom_tree::previous_element_sibling)
                .is_some(),
            move_right: column
                .as_ref()
                .and_then(dom_tree::next_element_sibling)
                .is_some(),
        };

        Some(Inspection {
            tag,
            affordances,
            shared_role,
            apply_all_label: shared_role.map(SharedRole::label),
            fields,
            actions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EditorConfig;
    use pretty_assertions::assert_eq;

    fn editor_with(html: &str) -> Editor {
        let mut editor = Editor::headless(EditorConfig::default());
        editor.load(html);
        editor
    }

    #[test]
    fn affordances_follow_the_tag() {
        let button = Affordances::for_tag("button");
        assert!(button.text && button.link && button.hover && !button.form_field);
        let input = Affordances::for_tag("input");
        assert!(input.form_field && !input.hover && !input.text);
        assert!(Affordances::for_tag("svg").icon);
        assert!(Affordances::for_tag("img").image);
    }

    #[test]
    fn nothing_selected_means_no_inspection() {
        let editor = editor_with("<p>x</p>");
        assert!(editor.inspect().is_none());
    }

    #[test]
    fn reads_resolved_values_of_the_selection() {
        let mut editor = editor_with(concat!(
            r#"<style>.card { padding: 4px 8px; } .card:hover { background-color: #000; }</style>"#,
            r#"<a href="/go" target="_blank" class="card cta-btn1" style="color: rgb(255, 0, 0); font-family: 'Open Sans', sans-serif; font-size: 18.7px">Go</a>"#,
            r#"<p>after</p>"#,
        ));
        editor.select("a").unwrap();
        let inspection = editor.inspect().unwrap();
        assert_eq!(inspection.tag, "a");
        assert_eq!(inspection.shared_role, Some(SharedRole::PrimaryCta));
        assert_eq!(inspection.apply_all_label, Some("Apply to all .cta-btn1"));

        let fields = &inspection.fields;
        assert_eq!(fields.text, "Go");
        assert_eq!(fields.link_url, "/go");
        assert!(fields.link_new_window);
        assert_eq!(fields.text_color, "#FF0000");
        assert_eq!(fields.font_family, "Open Sans");
        assert_eq!(fields.font_size, 18.0);
        assert_eq!(fields.padding, [4.0, 8.0, 4.0, 8.0]);
        assert_eq!(fields.hover_background_color, "#000000");
        assert_eq!(fields.background_color, "#FFFFFF");

        assert!(inspection.actions.delete);
        assert!(!inspection.actions.move_up);
        assert!(inspection.actions.move_down);
        assert!(!inspection.actions.move_left);
        assert!(!inspection.actions.flip);
    }

    #[test]
    fn body_cannot_be_deleted() {
        let mut editor = editor_with("<p>x</p>");
        editor.select("body").unwrap();
        let actions = editor.inspect().unwrap().actions;
        assert!(!actions.delete && !actions.duplicate);
    }
}
