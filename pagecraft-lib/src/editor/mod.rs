//! The editing session: one loaded document plus everything the editor keeps
//! about it (selection, view mode, rule store, history).

pub mod applicator;
pub mod commands;
pub mod debounce;
pub mod history;
pub mod inspector;
pub mod rule_store;
pub mod selector;
pub mod surface;

use std::rc::Rc;
use std::time::Instant;

use log::{debug, info, warn};

use crate::config::{Breakpoint, EditorConfig};
use crate::dom::dom_tree::{self, Document, NodeRef, WeakNodeRef};
use crate::error::{EditorError, Result};
use crate::parser::dom_indices::DomIndices;
use crate::parser::serialize::{document_markup, export_document, EditorArtifacts};
use crate::style::css_matcher::query_selector;
use crate::style::resolver::StyleResolver;

use applicator::SharedRole;
use debounce::Debouncer;
use history::History;
use rule_store::RuleStore;
use selector::SelectorAssigner;
use surface::{DocumentSurface, FontLoad, HeadlessSurface};

pub use commands::{Command, Direction, Status, StatusKind};

/// Markup loaded when the editor starts and after "clear all".
pub const BLANK_DOCUMENT: &str = "<!DOCTYPE html><html><head><style>.flipped { flex-direction: row-reverse !important; }</style></head><body></body></html>";

/// Elements whose text is edited in place once selected.
const INLINE_TEXT_TAGS: [&str; 8] = ["p", "h1", "h2", "h3", "h4", "h5", "h6", "span"];

/// Elements that cannot be deleted or duplicated.
const ROOT_TAGS: [&str; 3] = ["html", "head", "body"];

/// Asks the user to confirm a destructive action.
pub trait Confirm {
    fn confirm(&mut self, message: &str) -> bool;
}

impl<F: FnMut(&str) -> bool> Confirm for F {
    fn confirm(&mut self, message: &str) -> bool {
        self(message)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    /// Keep the rule store stylesheet and the markers its selectors target.
    pub keep_rule_store: bool,
}

/// Work that has to wait for the surface (font load, settle delay).
#[derive(Debug, Clone)]
enum Pending {
    /// Fresh load waiting for fonts before affordances are attached.
    Load,
    /// History restore; `settle_at` is unknown until fonts have loaded.
    Restore {
        selector: Option<String>,
        settle_at: Option<Instant>,
    },
}

/// A headless WYSIWYG editing session.
pub struct Editor<S: DocumentSurface = HeadlessSurface> {
    surface: S,
    config: EditorConfig,
    selectors: SelectorAssigner,
    rules: RuleStore,
    history: History,
    debouncer: Debouncer,
    selection: Option<WeakNodeRef>,
    view: Breakpoint,
    responsive: bool,
    apply_to_all: bool,
    editing: bool,
    pending: Option<Pending>,
}

impl Editor<HeadlessSurface> {
    pub fn headless(config: EditorConfig) -> Self {
        Editor::new(HeadlessSurface::new(), config)
    }
}

impl<S: DocumentSurface> Editor<S> {
    /// Starts a session on the blank document, recorded as the first history entry.
    pub fn new(surface: S, config: EditorConfig) -> Self {
        let mut editor = Editor {
            selectors: SelectorAssigner::new(&config.marker_attribute, &config.marker_prefix),
            rules: RuleStore::new(&config.rule_sheet_id),
            history: History::new(config.max_history),
            debouncer: Debouncer::new(config.debounce()),
            surface,
            config,
            selection: None,
            view: Breakpoint::Desktop,
            responsive: false,
            apply_to_all: false,
            editing: false,
            pending: None,
        };
        editor.surface.replace_markup(BLANK_DOCUMENT);
        editor.record();
        editor
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn document(&self) -> Option<&Document> {
        self.surface.document()
    }

    /// Replaces the document with `html` and starts a fresh session on it.
    ///
    /// History, selection and the marker counter are reset. Editing is enabled
    /// and the first snapshot recorded once the font stylesheet is ready.
    pub fn load(&mut self, html: &str) {
        self.surface.replace_markup(html);
        self.history.clear();
        self.debouncer.cancel();
        self.selection = None;
        self.editing = false;
        self.selectors.reset();
        if let Some(document) = self.surface.document() {
            let indices = DomIndices::build(document, &self.config.marker_attribute);
            self.selectors
                .seed(indices.max_marker_suffix(&self.config.marker_prefix));
        }
        info!("loaded document ({} bytes)", html.len());
        match self.request_fonts() {
            FontLoad::Ready => self.finish_load(),
            FontLoad::Pending => self.pending = Some(Pending::Load),
        }
    }

    fn finish_load(&mut self) {
        self.pending = None;
        self.enable_editing();
        self.record();
    }

    fn request_fonts(&mut self) -> FontLoad {
        let href = self.config.font_stylesheet_url();
        self.surface
            .ensure_font_stylesheet(&href, &self.config.font_link_id)
    }

    /// Reports that a font load returned `Pending` has completed.
    pub fn on_fonts_loaded(&mut self, now: Instant) {
        match self.pending.take() {
            Some(Pending::Load) => self.finish_load(),
            Some(Pending::Restore { selector, .. }) => {
                self.pending = Some(Pending::Restore {
                    selector,
                    settle_at: Some(now + self.config.settle_delay()),
                });
            }
            None => {}
        }
    }

    /// Advances timers: commits a due debounced snapshot and finishes a
    /// settled history restore.
    pub fn tick(&mut self, now: Instant) {
        if self.debouncer.poll(now) {
            self.record();
        }
        let settled = matches!(
            &self.pending,
            Some(Pending::Restore { settle_at: Some(at), .. }) if now >= *at
        );
        if settled {
            if let Some(Pending::Restore { selector, .. }) = self.pending.take() {
                self.finish_restore(selector);
            }
        }
    }

    /// True when no load or restore is waiting on the surface.
    pub fn is_settled(&self) -> bool {
        self.pending.is_none()
    }

    /// Earliest instant at which `tick` has work to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        let settle = match &self.pending {
            Some(Pending::Restore { settle_at, .. }) => *settle_at,
            _ => None,
        };
        match (self.debouncer.deadline(), settle) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    // ---- editing affordances -------------------------------------------------

    pub fn editing_enabled(&self) -> bool {
        self.editing
    }

    /// Makes the document editable. Returns false when nothing is loaded.
    pub fn enable_editing(&mut self) -> bool {
        if !self.attach_affordances() {
            return false;
        }
        self.editing = true;
        true
    }

    pub fn disable_editing(&mut self) {
        self.editing = false;
        self.selection = None;
        let Some(document) = self.surface.document() else {
            return;
        };
        for element in document.elements() {
            dom_tree::with_element_mut(&element, |el| {
                el.remove_class(&self.config.highlight_class);
            });
        }
        if let Some(body) = document.body() {
            dom_tree::with_element_mut(&body, |el| el.set_attr("contenteditable", "false"));
        }
    }

    fn highlight_css(&self) -> String {
        format!(
            ".{} {{ outline: 2px dashed #0d6efd !important; outline-offset: 2px; cursor: pointer; }}\n.flipped {{ flex-direction: row-reverse !important; }}",
            self.config.highlight_class
        )
    }

    /// Injects the highlight stylesheet and the contenteditable flags.
    fn attach_affordances(&self) -> bool {
        let Some(document) = self.surface.document() else {
            warn!("cannot enable editing: no document loaded");
            return false;
        };
        let Some(body) = document.body() else {
            return false;
        };
        if document
            .get_element_by_id(&self.config.highlight_sheet_id)
            .is_none()
        {
            if let Some(head) = document.head() {
                let style = dom_tree::new_element("style");
                dom_tree::with_element_mut(&style, |el| {
                    el.set_attr("id", self.config.highlight_sheet_id.as_str())
                });
                dom_tree::set_text_content(&style, &self.highlight_css());
                dom_tree::append_child(&head, &style);
            }
        }
        dom_tree::with_element_mut(&body, |el| el.set_attr("contenteditable", "true"));
        for element in dom_tree::descendant_elements(&body) {
            dom_tree::with_element_mut(&element, |el| el.set_attr("contenteditable", "false"));
        }
        true
    }

    // ---- selection -----------------------------------------------------------

    /// The selected element, if it is still alive.
    pub fn selected(&self) -> Option<NodeRef> {
        self.selection.as_ref().and_then(|weak| weak.upgrade())
    }

    /// Selects the first element matching `selector`.
    pub fn select(&mut self, selector: &str) -> Result<()> {
        let document = self.surface.document().ok_or(EditorError::NotReady)?;
        let node = query_selector(document, selector)
            .ok_or_else(|| EditorError::NoMatch(selector.to_string()))?;
        self.select_node(&node)
    }

    /// Selects `node`, moving the highlight onto it. Icon paths select their `<svg>`.
    pub fn select_node(&mut self, node: &NodeRef) -> Result<()> {
        if !self.editing {
            return Err(EditorError::EditingDisabled);
        }
        let target = match dom_tree::tag_of(node).as_deref() {
            Some("path") => dom_tree::closest(node, "svg").unwrap_or_else(|| Rc::clone(node)),
            Some(_) => Rc::clone(node),
            None => return Err(EditorError::NoSelection),
        };

        if let Some(previous) = self.selected() {
            if is_inline_text(&previous) {
                dom_tree::with_element_mut(&previous, |el| el.set_attr("contenteditable", "false"));
            }
        }
        self.clear_highlights();
        dom_tree::with_element_mut(&target, |el| {
            el.add_class(&self.config.highlight_class);
            if INLINE_TEXT_TAGS.contains(&el.tag.to_ascii_lowercase().as_str()) {
                el.set_attr("contenteditable", "true");
            }
        });
        self.apply_to_all = SharedRole::detect(&target)
            .map(|role| role.apply_all_default())
            .unwrap_or(false);
        debug!(
            "selected <{}>",
            dom_tree::tag_of(&target).unwrap_or_default()
        );
        self.selection = Some(Rc::downgrade(&target));
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.clear_highlights();
        self.selection = None;
    }

    /// Points the selection at `node` without touching contenteditable flags.
    fn adopt_selection(&mut self, node: &NodeRef) {
        self.clear_highlights();
        dom_tree::with_element_mut(node, |el| el.add_class(&self.config.highlight_class));
        self.apply_to_all = SharedRole::detect(node)
            .map(|role| role.apply_all_default())
            .unwrap_or(false);
        self.selection = Some(Rc::downgrade(node));
    }

    fn clear_highlights(&self) {
        let Some(document) = self.surface.document() else {
            return;
        };
        for element in document.elements() {
            dom_tree::with_element_mut(&element, |el| {
                el.remove_class(&self.config.highlight_class);
            });
        }
    }

    /// Stable selector for `node`, minting a marker when it has no id.
    pub fn selector_for(&mut self, node: &NodeRef) -> Option<String> {
        self.selectors.selector_for(node)
    }

    // ---- view state ----------------------------------------------------------

    pub fn view(&self) -> Breakpoint {
        self.view
    }

    /// Switches the preview width. Desktop turns responsive mode off.
    pub fn set_view(&mut self, view: Breakpoint) {
        self.view = view;
        if view == Breakpoint::Desktop {
            self.responsive = false;
        }
        debug!("view switched to {}", view);
    }

    pub fn responsive(&self) -> bool {
        self.responsive
    }

    /// Scopes style edits to the current breakpoint. Has no effect on desktop.
    pub fn set_responsive(&mut self, on: bool) -> bool {
        self.responsive = on && self.view != Breakpoint::Desktop;
        self.responsive
    }

    pub fn apply_to_all(&self) -> bool {
        self.apply_to_all
    }

    pub fn set_apply_to_all(&mut self, on: bool) {
        self.apply_to_all = on;
    }

    /// `max-width` threshold style edits are scoped to, if any.
    pub fn active_max_width(&self) -> Option<&str> {
        if self.responsive && self.view != Breakpoint::Desktop {
            self.config.breakpoints.max_width(self.view)
        } else {
            None
        }
    }

    /// Resolver over the author styles as seen at the current preview width.
    pub fn resolver(&self) -> Option<StyleResolver> {
        let document = self.surface.document()?;
        Some(StyleResolver::new(
            document,
            self.config.breakpoints.viewport_width(self.view),
        ))
    }

    // ---- history -------------------------------------------------------------

    /// Snapshots the current document into history. Returns false when
    /// nothing was recorded.
    pub fn record(&mut self) -> bool {
        let Some(document) = self.surface.document() else {
            return false;
        };
        if document.body().is_none() {
            return false;
        }
        match document_markup(document) {
            Ok(markup) => self.history.record(markup),
            Err(e) => {
                warn!("snapshot failed: {}", e);
                false
            }
        }
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn history_position(&self) -> Option<usize> {
        self.history.position()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Restores the previous snapshot. The selection comes back once the
    /// restore settles (see [`Editor::tick`]).
    pub fn undo(&mut self, now: Instant) -> bool {
        match self.history.undo().map(str::to_string) {
            Some(snapshot) => {
                self.restore(&snapshot, now);
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self, now: Instant) -> bool {
        match self.history.redo().map(str::to_string) {
            Some(snapshot) => {
                self.restore(&snapshot, now);
                true
            }
            None => false,
        }
    }

    fn restore(&mut self, snapshot: &str, now: Instant) {
        let selector = match self.selected() {
            Some(node) => self.selectors.selector_for(&node),
            None => match self.pending.take() {
                Some(Pending::Restore { selector, .. }) => selector,
                _ => None,
            },
        };
        self.debouncer.cancel();
        self.surface.replace_markup(snapshot);
        self.selection = None;
        let settle_at = match self.request_fonts() {
            FontLoad::Ready => Some(now + self.config.settle_delay()),
            FontLoad::Pending => None,
        };
        self.pending = Some(Pending::Restore {
            selector,
            settle_at,
        });
        info!(
            "restored snapshot {}/{}",
            self.history.position().map(|p| p + 1).unwrap_or(0),
            self.history.len()
        );
    }

    fn finish_restore(&mut self, selector: Option<String>) {
        self.attach_affordances();
        self.clear_highlights();
        let found = match (selector.as_deref(), self.surface.document()) {
            (Some(selector), Some(document)) => query_selector(document, selector),
            _ => None,
        };
        match found {
            Some(node) => self.adopt_selection(&node),
            None => self.selection = None,
        }
    }

    /// Drops the document, history and rule store after confirmation.
    ///
    /// Editing stays off until the next [`Editor::load`].
    pub fn clear_all(&mut self, confirm: &mut dyn Confirm) -> bool {
        if !confirm.confirm("Are you sure you want to clear everything? This cannot be undone.") {
            return false;
        }
        self.surface.replace_markup(BLANK_DOCUMENT);
        self.history.clear();
        self.debouncer.cancel();
        self.pending = None;
        self.selection = None;
        self.editing = false;
        self.selectors.reset();
        self.record();
        info!("editor cleared");
        true
    }

    // ---- export --------------------------------------------------------------

    /// Clean HTML of the current document with the editor's own markup removed.
    pub fn export(&self, options: &ExportOptions) -> Result<String> {
        let document = self.surface.document().ok_or(EditorError::NotReady)?;
        let mut injected_ids = vec![
            self.config.highlight_sheet_id.as_str(),
            self.config.font_link_id.as_str(),
        ];
        if !options.keep_rule_store {
            injected_ids.push(self.config.rule_sheet_id.as_str());
        }
        let artifacts = EditorArtifacts {
            highlight_class: &self.config.highlight_class,
            marker_attribute: if options.keep_rule_store {
                None
            } else {
                Some(self.config.marker_attribute.as_str())
            },
            injected_ids,
        };
        export_document(document, &artifacts)
    }

    /// Current document markup, as a history snapshot would hold it.
    pub fn markup(&self) -> Result<String> {
        let document = self.surface.document().ok_or(EditorError::NotReady)?;
        document_markup(document)
    }

    pub fn rule_store(&self) -> &RuleStore {
        &self.rules
    }
}

fn is_inline_text(node: &NodeRef) -> bool {
    dom_tree::tag_of(node)
        .map(|tag| INLINE_TEXT_TAGS.contains(&tag.as_str()))
        .unwrap_or(false)
}

fn is_root(node: &NodeRef) -> bool {
    dom_tree::tag_of(node)
        .map(|tag| ROOT_TAGS.contains(&tag.as_str()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn editor_with(html: &str) -> Editor {
        let mut editor = Editor::headless(EditorConfig::default());
        editor.load(html);
        editor
    }

    #[test]
    fn new_session_records_blank_document() {
        let editor = Editor::headless(EditorConfig::default());
        assert_eq!(editor.history_len(), 1);
        assert!(!editor.editing_enabled());
    }

    #[test]
    fn load_resets_history_and_enables_editing() {
        let editor = editor_with(r#"<body><h1 id="t">Hi</h1></body>"#);
        assert_eq!(editor.history_len(), 1);
        assert!(editor.editing_enabled());
        let document = editor.document().unwrap();
        assert!(document.get_element_by_id("editor-styles").is_some());
        assert!(document.get_element_by_id("google-fonts").is_some());
        let body = document.body().unwrap();
        dom_tree::with_element(&body, |el| assert_eq!(el.attr("contenteditable"), Some("true")));
    }

    #[test]
    fn selection_moves_highlight_and_text_editability() {
        let mut editor = editor_with(r#"<p id="a">A</p><div id="b"><p id="c">C</p></div>"#);
        editor.select("#a").unwrap();
        editor.select("#b").unwrap();
        let document = editor.document().unwrap();
        let a = document.get_element_by_id("a").unwrap();
        let b = document.get_element_by_id("b").unwrap();
        dom_tree::with_element(&a, |el| {
            assert!(!el.has_class("editable-highlight"));
            assert_eq!(el.attr("contenteditable"), Some("false"));
        });
        dom_tree::with_element(&b, |el| {
            assert!(el.has_class("editable-highlight"));
            assert_eq!(el.attr("contenteditable"), Some("false"));
        });
    }

    #[test]
    fn icon_paths_select_their_svg() {
        let mut editor = editor_with(r#"<svg id="icon"><path d="M0 0"></path></svg>"#);
        editor.select("path").unwrap();
        assert_eq!(dom_tree::tag_of(&editor.selected().unwrap()).as_deref(), Some("svg"));
    }

    #[test]
    fn selection_requires_editing() {
        let mut editor = editor_with("<p>x</p>");
        editor.disable_editing();
        assert!(matches!(editor.select("p"), Err(EditorError::EditingDisabled)));
    }

    #[test]
    fn desktop_forces_responsive_off() {
        let mut editor = editor_with("<p>x</p>");
        assert!(!editor.set_responsive(true));
        editor.set_view(Breakpoint::Mobile);
        assert!(editor.set_responsive(true));
        assert_eq!(editor.active_max_width(), Some("767px"));
        editor.set_view(Breakpoint::Desktop);
        assert!(!editor.responsive());
        assert_eq!(editor.active_max_width(), None);
    }

    #[test]
    fn deferred_fonts_hold_back_the_first_snapshot() {
        let mut editor = Editor::new(HeadlessSurface::with_deferred_fonts(), EditorConfig::default());
        editor.load("<p>x</p>");
        assert_eq!(editor.history_len(), 0);
        assert!(!editor.is_settled());
        editor.on_fonts_loaded(Instant::now());
        assert_eq!(editor.history_len(), 1);
        assert!(editor.editing_enabled());
    }

    #[test]
    fn clear_all_needs_confirmation() {
        let mut editor = editor_with("<p>x</p>");
        assert!(!editor.clear_all(&mut |_: &str| false));
        assert!(editor.document().unwrap().get_element_by_id("editor-styles").is_some());

        assert!(editor.clear_all(&mut |_: &str| true));
        assert_eq!(editor.history_len(), 1);
        assert!(!editor.editing_enabled());
        let body = editor.document().unwrap().body().unwrap();
        assert!(dom_tree::element_children(&body).is_empty());
    }

    #[test]
    fn restore_reselects_after_settle_delay() {
        let start = Instant::now();
        let mut editor = editor_with(r#"<h1 id="t">Hi</h1>"#);
        editor.select("#t").unwrap();
        editor
            .execute(Command::SetText("Hello".into()), &mut |_: &str| true)
            .unwrap();
        assert!(editor.undo(start));
        assert!(editor.selected().is_none());
        editor.tick(start + Duration::from_millis(50));
        assert!(editor.selected().is_none());
        editor.tick(start + Duration::from_millis(100));
        let selected = editor.selected().unwrap();
        assert_eq!(dom_tree::text_content(&selected), "Hi");
    }

    #[test]
    fn export_keeps_rule_store_on_request() {
        let mut editor = editor_with("<p>x</p>");
        editor.select("p").unwrap();
        editor
            .execute(
                Command::SetStyle {
                    property: "color".into(),
                    value: "red".into(),
                    pseudo_class: Some(":hover".into()),
                },
                &mut |_: &str| true,
            )
            .unwrap();
        let clean = editor.export(&ExportOptions::default()).unwrap();
        assert!(!clean.contains("editor-responsive-styles"));
        assert!(!clean.contains("data-editor-id"));
        let kept = editor
            .export(&ExportOptions {
                keep_rule_store: true,
            })
            .unwrap();
        assert!(kept.contains("[data-editor-id=\"editor-el-1\"]:hover"));
        assert!(kept.contains("data-editor-id=\"editor-el-1\""));
        assert!(!kept.contains("editable-highlight"));
    }
}
