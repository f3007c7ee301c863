//! The document surface: where the edited page lives.

use log::{debug, info};

use crate::dom::dom_tree::{self, Document};
use crate::parser::html::create_dom_tree;

/// Outcome of asking the surface for the web font stylesheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontLoad {
    /// Already present, or finished loading synchronously.
    Ready,
    /// Loading; the owner must call `Editor::on_fonts_loaded` when it completes.
    Pending,
}

/// Host of the live document.
///
/// A browser frame is one possible implementation; [`HeadlessSurface`] keeps
/// the tree in process so the editing engine runs without a renderer.
pub trait DocumentSurface {
    /// The loaded document, `None` until something has been loaded.
    fn document(&self) -> Option<&Document>;

    /// Replaces the whole document with freshly parsed `markup`.
    fn replace_markup(&mut self, markup: &str);

    /// Adds the font stylesheet `<link>` unless an element with `link_id`
    /// already exists.
    fn ensure_font_stylesheet(&mut self, href: &str, link_id: &str) -> FontLoad;
}

/// In-process surface backed by the html5ever tree.
#[derive(Debug, Default)]
pub struct HeadlessSurface {
    document: Option<Document>,
    defer_font_loads: bool,
}

impl HeadlessSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// A surface whose font loads stay pending until the owner reports them done.
    pub fn with_deferred_fonts() -> Self {
        HeadlessSurface {
            document: None,
            defer_font_loads: true,
        }
    }
}

impl DocumentSurface for HeadlessSurface {
    fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    fn replace_markup(&mut self, markup: &str) {
        let document = create_dom_tree(markup);
        info!(
            "document replaced ({} bytes, {} elements)",
            markup.len(),
            document.elements().len()
        );
        self.document = Some(document);
    }

    fn ensure_font_stylesheet(&mut self, href: &str, link_id: &str) -> FontLoad {
        let Some(document) = self.document.as_ref() else {
            return FontLoad::Ready;
        };
        if document.get_element_by_id(link_id).is_some() {
            return FontLoad::Ready;
        }
        let Some(head) = document.head() else {
            return FontLoad::Ready;
        };
        let link = dom_tree::new_element("link");
        dom_tree::with_element_mut(&link, |el| {
            el.set_attr("id", link_id);
            el.set_attr("rel", "stylesheet");
            el.set_attr("href", href);
        });
        dom_tree::append_child(&head, &link);
        debug!("font stylesheet requested: {}", href);
        if self.defer_font_loads {
            FontLoad::Pending
        } else {
            FontLoad::Ready
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn font_link_is_added_once() {
        let mut surface = HeadlessSurface::new();
        assert_eq!(surface.ensure_font_stylesheet("x", "google-fonts"), FontLoad::Ready);

        surface.replace_markup("<html><head></head><body></body></html>");
        assert_eq!(surface.ensure_font_stylesheet("x", "google-fonts"), FontLoad::Ready);
        assert_eq!(surface.ensure_font_stylesheet("x", "google-fonts"), FontLoad::Ready);
        let head = surface.document().and_then(|d| d.head()).unwrap();
        assert_eq!(dom_tree::element_children(&head).len(), 1);
    }

    #[test]
    fn deferred_surface_reports_pending_until_marker_exists() {
        let mut surface = HeadlessSurface::with_deferred_fonts();
        surface.replace_markup("<p>x</p>");
        assert_eq!(surface.ensure_font_stylesheet("x", "f"), FontLoad::Pending);
        assert_eq!(surface.ensure_font_stylesheet("x", "f"), FontLoad::Ready);
    }
}
