//! Parsing HTML into the editor's DOM tree.
//!
//! html5ever drives tree construction; `PageTreeSink` builds the
//! `crate::dom::dom_tree` representation, including the repair hooks
//! (foster parenting, adoption agency) that browsers apply to mis-nested markup.

use crate::dom::dom_tree::{self, Node, NodeRef, TextNode};
use html5ever::tendril::{StrTendril, TendrilSink};
use html5ever::{
    interface::{ElemName, ElementFlags, NodeOrText, QuirksMode, TreeSink},
    LocalName, Namespace, QualName,
};
use log::debug;
use std::cell::RefCell;
use std::rc::Rc;

/// Parses a complete HTML document.
///
/// Missing `<html>`, `<head>` and `<body>` elements are synthesized, so the
/// result always has the three of them.
pub fn create_dom_tree(html_content: &str) -> dom_tree::Document {
    let tree_sink = PageTreeSink::new();
    html5ever::parse_document(tree_sink, Default::default()).one(html_content.to_string())
}

/// Parses a markup fragment as body content and returns its top-level nodes, detached.
pub fn parse_body_fragment(html: &str) -> Vec<NodeRef> {
    let document = create_dom_tree(&format!("<body>{}</body>", html));
    let Some(body) = document.body() else {
        return Vec::new();
    };
    let nodes = dom_tree::children(&body);
    for node in &nodes {
        dom_tree::detach(node);
    }
    nodes
}

/// A `TreeSink` producing a `dom_tree::Document`.
pub struct PageTreeSink {
    document: dom_tree::Document,
    quirks_mode: RefCell<QuirksMode>,
}

impl Default for PageTreeSink {
    fn default() -> Self {
        Self::new()
    }
}

impl PageTreeSink {
    pub fn new() -> Self {
        Self {
            document: dom_tree::new_document(),
            quirks_mode: RefCell::new(QuirksMode::NoQuirks),
        }
    }

    fn text_or_node(child: NodeOrText<NodeRef>) -> NodeRef {
        match child {
            NodeOrText::AppendNode(node) => node,
            NodeOrText::AppendText(text) => {
                Rc::new(RefCell::new(Node::Text(TextNode::new(text.to_string()))))
            }
        }
    }

    /// Merges `text` into a neighbouring text node when html5ever splits a run.
    fn merge_text(target: Option<NodeRef>, text: &str) -> bool {
        let Some(target) = target else {
            return false;
        };
        let mut borrowed = target.borrow_mut();
        if let Node::Text(existing) = &mut *borrowed {
            existing.content.push_str(text);
            true
        } else {
            false
        }
    }
}

/// Element name handed back to html5ever during tree construction.
#[derive(Debug)]
pub struct PageElemName {
    ns: Namespace,
    local: LocalName,
}

impl ElemName for PageElemName {
    fn local_name(&self) -> &LocalName {
        &self.local
    }

    fn ns(&self) -> &Namespace {
        &self.ns
    }
}

impl TreeSink for PageTreeSink {
    type Handle = NodeRef;
    type Output = dom_tree::Document;
    type ElemName<'a>
        = PageElemName
    where
        Self: 'a;

    fn finish(self) -> Self::Output {
        self.document
    }

    fn parse_error(&self, msg: std::borrow::Cow<'static, str>) {
        debug!("html parse error: {}", msg);
    }

    fn get_document(&self) -> Self::Handle {
        self.document.root.clone()
    }

    fn elem_name<'a>(&'a self, target: &'a Self::Handle) -> Self::ElemName<'a> {
        match &*target.borrow() {
            Node::Element(elem) => PageElemName {
                ns: elem.qual_name.ns.clone(),
                local: elem.qual_name.local.clone(),
            },
            _ => PageElemName {
                ns: Namespace::from(""),
                local: LocalName::from(""),
            },
        }
    }

    fn create_element(
        &self,
        name: QualName,
        attrs: Vec<html5ever::Attribute>,
        _flags: ElementFlags,
    ) -> Self::Handle {
        let mut element = dom_tree::ElementNode::new(name.local.to_string(), name.clone());
        element.attributes = attrs
            .into_iter()
            .map(|attr| dom_tree::Attribute {
                name: attr.name,
                value: attr.value.to_string(),
            })
            .collect();
        Rc::new(RefCell::new(Node::Element(element)))
    }

    fn create_comment(&self, text: StrTendril) -> Self::Handle {
        Rc::new(RefCell::new(Node::Comment(TextNode::new(text.to_string()))))
    }

    /// Processing instructions do not occur in HTML documents; keep them as comments.
    fn create_pi(&self, target: StrTendril, data: StrTendril) -> Self::Handle {
        let combined = format!("?{} {}", target, data);
        Rc::new(RefCell::new(Node::Comment(TextNode::new(combined))))
    }

    fn append(&self, parent: &Self::Handle, child: NodeOrText<Self::Handle>) {
        if let NodeOrText::AppendText(text) = &child {
            let last = dom_tree::children(parent).last().cloned();
            if Self::merge_text(last, text) {
                return;
            }
        }
        let child_node = Self::text_or_node(child);
        dom_tree::append_child(parent, &child_node);
    }

    fn append_based_on_parent_node(
        &self,
        element: &Self::Handle,
        prev_element: &Self::Handle,
        child: NodeOrText<Self::Handle>,
    ) {
        if dom_tree::parent(element).is_some() {
            self.append_before_sibling(element, child);
        } else {
            self.append(prev_element, child);
        }
    }

    fn append_doctype_to_document(
        &self,
        name: StrTendril,
        public_id: StrTendril,
        system_id: StrTendril,
    ) {
        *self.document.doctype.borrow_mut() = Some(dom_tree::Doctype {
            name: name.to_string(),
            public_id: public_id.to_string(),
            system_id: system_id.to_string(),
        });
    }

    fn mark_script_already_started(&self, _node: &Self::Handle) {}

    fn get_template_contents(&self, target: &Self::Handle) -> Self::Handle {
        target.clone()
    }

    fn same_node(&self, x: &Self::Handle, y: &Self::Handle) -> bool {
        Rc::ptr_eq(x, y)
    }

    fn set_quirks_mode(&self, mode: QuirksMode) {
        *self.quirks_mode.borrow_mut() = mode;
    }

    fn append_before_sibling(&self, sibling: &Self::Handle, child: NodeOrText<Self::Handle>) {
        let Some(parent) = dom_tree::parent(sibling) else {
            return;
        };
        if let NodeOrText::AppendText(text) = &child {
            let siblings = dom_tree::children(&parent);
            let previous = siblings
                .iter()
                .position(|s| Rc::ptr_eq(s, sibling))
                .and_then(|i| i.checked_sub(1))
                .and_then(|i| siblings.get(i).cloned());
            if Self::merge_text(previous, text) {
                return;
            }
        }
        let child_node = Self::text_or_node(child);
        dom_tree::insert_before(&parent, &child_node, sibling);
    }

    fn add_attrs_if_missing(&self, target: &Self::Handle, attrs: Vec<html5ever::Attribute>) {
        dom_tree::with_element_mut(target, |elem| {
            for attr in attrs {
                let key = attr.name.local.to_string();
                if !elem.has_attr(&key) {
                    elem.attributes.push(dom_tree::Attribute {
                        name: attr.name,
                        value: attr.value.to_string(),
                    });
                }
            }
        });
    }

    fn remove_from_parent(&self, target: &Self::Handle) {
        dom_tree::detach(target);
    }

    fn reparent_children(&self, node: &Self::Handle, new_parent: &Self::Handle) {
        for child in dom_tree::children(node) {
            dom_tree::append_child(new_parent, &child);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::dom_tree::{element_children, tag_of, text_content};

    fn structure(node: &NodeRef, depth: usize, out: &mut String) {
        for child in element_children(node) {
            out.push_str(&format!("{}<{}>\n", "  ".repeat(depth), tag_of(&child).unwrap()));
            structure(&child, depth + 1, out);
        }
    }

    #[test]
    fn synthesizes_document_skeleton() {
        let document = create_dom_tree(r#"<h1 id="t">Hi</h1>"#);
        let mut out = String::new();
        structure(&document.root, 0, &mut out);
        assert_eq!(out, "<html>\n  <head>\n  <body>\n    <h1>\n");
        let h1 = document.get_element_by_id("t").unwrap();
        assert_eq!(text_content(&h1), "Hi");
    }

    #[test]
    fn keeps_doctype_and_attributes() {
        let document = create_dom_tree(
            r#"<!DOCTYPE html><html><body><a href="https://example.com" data-x="1">Link</a></body></html>"#,
        );
        assert_eq!(document.doctype.borrow().as_ref().unwrap().name, "html");
        let body = document.body().unwrap();
        let link = element_children(&body).remove(0);
        dom_tree::with_element(&link, |a| {
            assert_eq!(a.attr("href"), Some("https://example.com"));
            assert_eq!(a.attr("data-x"), Some("1"));
        });
    }

    #[test]
    fn foster_parents_misplaced_table_content() {
        let document = create_dom_tree("<table><tr><td>1</td></tr>stray</table>");
        let body = document.body().unwrap();
        // "stray" is moved in front of the table, as browsers do.
        assert!(text_content(&body).starts_with("stray"));
    }

    #[test]
    fn fragments_come_back_detached() {
        let nodes = parse_body_fragment("<section><p>One</p></section><p>Two</p>");
        assert_eq!(nodes.len(), 2);
        assert!(nodes.iter().all(|n| dom_tree::parent(n).is_none()));
    }
}
