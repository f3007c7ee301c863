//! Writing the DOM tree back out as HTML through html5ever's serializer.

use crate::dom::dom_tree::{self, Document, Node, NodeRef};
use crate::error::{EditorError, Result};
use html5ever::serialize::{serialize, Serialize, SerializeOpts, Serializer, TraversalScope};
use std::io;

/// Adapter implementing html5ever's `Serialize` for a node handle.
struct SerializableNode<'a>(&'a NodeRef);

impl Serialize for SerializableNode<'_> {
    fn serialize<S>(&self, serializer: &mut S, traversal_scope: TraversalScope) -> io::Result<()>
    where
        S: Serializer,
    {
        let node = self.0.borrow();
        match (&traversal_scope, &*node) {
            (_, Node::Element(elem)) => {
                let include_self = matches!(traversal_scope, TraversalScope::IncludeNode);
                if include_self {
                    serializer.start_elem(
                        elem.qual_name.clone(),
                        elem.attributes.iter().map(|a| (&a.name, a.value.as_str())),
                    )?;
                }
                for child in &elem.children {
                    SerializableNode(child).serialize(serializer, TraversalScope::IncludeNode)?;
                }
                if include_self {
                    serializer.end_elem(elem.qual_name.clone())?;
                }
                Ok(())
            }
            (_, Node::DocumentRoot(root)) => {
                for child in &root.children {
                    SerializableNode(child).serialize(serializer, TraversalScope::IncludeNode)?;
                }
                Ok(())
            }
            (TraversalScope::ChildrenOnly(_), _) => Ok(()),
            (TraversalScope::IncludeNode, Node::Text(text)) => serializer.write_text(&text.content),
            (TraversalScope::IncludeNode, Node::Comment(text)) => {
                serializer.write_comment(&text.content)
            }
        }
    }
}

fn to_html(node: &NodeRef, scope: TraversalScope) -> Result<String> {
    let mut bytes = Vec::new();
    let opts = SerializeOpts {
        traversal_scope: scope,
        ..Default::default()
    };
    serialize(&mut bytes, &SerializableNode(node), opts)?;
    String::from_utf8(bytes).map_err(|e| EditorError::Serialize(e.to_string()))
}

/// `outerHTML` of a node.
pub fn outer_html(node: &NodeRef) -> Result<String> {
    to_html(node, TraversalScope::IncludeNode)
}

/// `innerHTML` of a node.
pub fn inner_html(node: &NodeRef) -> Result<String> {
    to_html(node, TraversalScope::ChildrenOnly(None))
}

/// Markup of the document element, which is what a history snapshot holds.
pub fn document_markup(document: &Document) -> Result<String> {
    match document.document_element() {
        Some(html) => outer_html(&html),
        None => Ok(String::new()),
    }
}

/// Identifiers and markers the editor injects into a document it is editing.
#[derive(Debug, Clone)]
pub struct EditorArtifacts<'a> {
    pub highlight_class: &'a str,
    /// Marker attribute to strip; `None` keeps markers so retained rules still match.
    pub marker_attribute: Option<&'a str>,
    /// Ids of injected elements (stylesheets, font links) that are removed wholesale.
    pub injected_ids: Vec<&'a str>,
}

/// Clean copy of the document for download: editor markers stripped, doctype prefixed.
pub fn export_document(document: &Document, artifacts: &EditorArtifacts<'_>) -> Result<String> {
    let copy = document.deep_clone();
    for element in copy.elements() {
        let injected = dom_tree::with_element(&element, |el| {
            el.id()
                .map(|id| artifacts.injected_ids.contains(&id))
                .unwrap_or(false)
        })
        .unwrap_or(false);
        if injected {
            dom_tree::detach(&element);
            continue;
        }
        dom_tree::with_element_mut(&element, |el| {
            el.remove_class(artifacts.highlight_class);
            if let Some(marker) = artifacts.marker_attribute {
                el.remove_attr(marker);
            }
            el.remove_attr("contenteditable");
        });
    }
    Ok(format!("<!DOCTYPE html>\n{}", document_markup(&copy)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::html::create_dom_tree;
    use pretty_assertions::assert_eq;

    #[test]
    fn round_trips_document_markup() {
        let html = r#"<html><head><style>a > b { color: red; }</style></head><body><p class="x">A &amp; B<br></p><!-- note --></body></html>"#;
        let document = create_dom_tree(html);
        assert_eq!(document_markup(&document).unwrap(), html);
    }

    #[test]
    fn export_strips_editor_state() {
        let document = create_dom_tree(concat!(
            r#"<html><head><style id="editor-styles">.editable-highlight{}</style>"#,
            r#"<link id="google-fonts" rel="stylesheet" href="x"></head>"#,
            r#"<body contenteditable="true"><h1 data-editor-id="editor-el-1" class="title editable-highlight" contenteditable="false">Hi</h1></body></html>"#,
        ));
        let artifacts = EditorArtifacts {
            highlight_class: "editable-highlight",
            marker_attribute: Some("data-editor-id"),
            injected_ids: vec!["editor-styles", "google-fonts"],
        };
        let exported = export_document(&document, &artifacts).unwrap();
        assert_eq!(
            exported,
            "<!DOCTYPE html>\n<html><head></head><body><h1 class=\"title\">Hi</h1></body></html>"
        );
        // The live document is untouched.
        assert!(document.get_element_by_id("editor-styles").is_some());
    }
}
