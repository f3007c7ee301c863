use std::collections::HashMap;
use std::rc::Rc;

use crate::dom::dom_tree::{self, Document, NodeRef};

/// Lookup tables over one snapshot of a document.
///
/// The indexes are not kept in sync with later mutations; rebuild after edits.
#[derive(Debug, Default)]
pub struct DomIndices {
    /// Maps an element's "id" attribute to the corresponding node.
    pub id_map: HashMap<String, NodeRef>,
    /// Maps a class name to all nodes that have that class.
    pub class_map: HashMap<String, Vec<NodeRef>>,
    /// Maps a lowercase tag name (e.g., "div") to all nodes with that tag.
    pub tag_map: HashMap<String, Vec<NodeRef>>,
    /// Maps a synthetic selector marker value to its element.
    pub marker_map: HashMap<String, NodeRef>,
}

impl DomIndices {
    /// Build the indices for the entire document.
    pub fn build(document: &Document, marker_attribute: &str) -> Self {
        let mut indices = DomIndices::default();
        for element in document.elements() {
            indices.index_element(&element, marker_attribute);
        }
        indices
    }

    fn index_element(&mut self, node: &NodeRef, marker_attribute: &str) {
        dom_tree::with_element(node, |elem| {
            self.tag_map
                .entry(elem.tag.to_lowercase())
                .or_default()
                .push(Rc::clone(node));

            if let Some(id_value) = elem.id() {
                // First occurrence wins, as with getElementById.
                self.id_map
                    .entry(id_value.to_string())
                    .or_insert_with(|| Rc::clone(node));
            }
            for class in elem.classes() {
                self.class_map
                    .entry(class.to_string())
                    .or_default()
                    .push(Rc::clone(node));
            }
            if let Some(marker) = elem.attr(marker_attribute) {
                self.marker_map.insert(marker.to_string(), Rc::clone(node));
            }
        });
    }

    /// Elements carrying at least one of `classes`, each listed once.
    pub fn elements_with_any_class(&self, classes: &[&str]) -> Vec<NodeRef> {
        let mut out: Vec<NodeRef> = Vec::new();
        for class in classes {
            for node in self.class_map.get(*class).into_iter().flatten() {
                if !out.iter().any(|seen| Rc::ptr_eq(seen, node)) {
                    out.push(Rc::clone(node));
                }
            }
        }
        out
    }

    /// Highest numeric suffix among markers that start with `prefix`.
    pub fn max_marker_suffix(&self, prefix: &str) -> u64 {
        self.marker_map
            .keys()
            .filter_map(|marker| marker.strip_prefix(prefix))
            .filter_map(|suffix| suffix.parse::<u64>().ok())
            .max()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::html::create_dom_tree;

    #[test]
    fn indexes_ids_classes_tags_and_markers() {
        let document = create_dom_tree(concat!(
            r#"<a id="go" class="cta-btn1">A</a><button class="btn-primary-custom cta-btn1">B</button>"#,
            r#"<p data-editor-id="editor-el-7">C</p><p data-editor-id="editor-el-12">D</p>"#,
        ));
        let indices = DomIndices::build(&document, "data-editor-id");
        assert!(indices.id_map.contains_key("go"));
        assert_eq!(indices.tag_map["p"].len(), 2);
        assert_eq!(
            indices
                .elements_with_any_class(&["cta-btn1", "btn-primary-custom"])
                .len(),
            2
        );
        assert_eq!(indices.max_marker_suffix("editor-el-"), 12);
        assert_eq!(indices.max_marker_suffix("other-"), 0);
    }
}
