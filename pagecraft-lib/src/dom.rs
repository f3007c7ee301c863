use html5ever::{LocalName, Namespace, QualName};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

pub mod dom_tree {
    use super::*;

    pub type NodeRef = Rc<RefCell<Node>>;
    pub type WeakNodeRef = Weak<RefCell<Node>>;

    pub const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

    #[derive(Debug, Clone)]
    pub enum Node {
        DocumentRoot(DocumentRootNode),
        Element(ElementNode),
        Text(TextNode),
        Comment(TextNode),
    }

    #[derive(Debug, Clone, Default)]
    pub struct DocumentRootNode {
        pub children: Vec<NodeRef>,
    }

    #[derive(Debug, Clone)]
    pub struct Attribute {
        pub name: QualName,
        pub value: String,
    }

    #[derive(Debug, Clone)]
    pub struct ElementNode {
        pub tag: String,
        pub qual_name: QualName,
        pub attributes: Vec<Attribute>,
        pub children: Vec<NodeRef>,
        pub parent: Option<WeakNodeRef>,
    }

    /// Character data (text or comment) with a link back to its parent.
    #[derive(Debug, Clone)]
    pub struct TextNode {
        pub content: String,
        pub parent: Option<WeakNodeRef>,
    }

    #[derive(Debug)]
    pub struct Document {
        pub root: NodeRef,
        pub doctype: RefCell<Option<Doctype>>,
    }

    #[derive(Debug, Clone)]
    pub struct Doctype {
        pub name: String,
        pub public_id: String,
        pub system_id: String,
    }

    impl DocumentRootNode {
        pub fn new() -> Self {
            DocumentRootNode {
                children: Vec::new(),
            }
        }
    }

    impl TextNode {
        pub fn new(content: impl Into<String>) -> Self {
            TextNode {
                content: content.into(),
                parent: None,
            }
        }
    }

    /// Builds an attribute or element name in the null namespace.
    pub fn attr_name(local: &str) -> QualName {
        QualName::new(None, Namespace::from(""), LocalName::from(local))
    }

    /// Builds an element name in the HTML namespace.
    pub fn html_name(local: &str) -> QualName {
        QualName::new(None, Namespace::from(HTML_NAMESPACE), LocalName::from(local))
    }

    impl ElementNode {
        pub fn new(tag: String, qual_name: QualName) -> Self {
            ElementNode {
                tag,
                qual_name,
                attributes: Vec::new(),
                children: Vec::new(),
                parent: None,
            }
        }

        pub fn attr(&self, name: &str) -> Option<&str> {
            self.attributes
                .iter()
                .find(|a| (*a.name.local).eq_ignore_ascii_case(name))
                .map(|a| a.value.as_str())
        }

        pub fn has_attr(&self, name: &str) -> bool {
            self.attr(name).is_some()
        }

        /// Sets an attribute, keeping its position when it already exists.
        pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
            let value = value.into();
            match self
                .attributes
                .iter_mut()
                .find(|a| (*a.name.local).eq_ignore_ascii_case(name))
            {
                Some(existing) => existing.value = value,
                None => self.attributes.push(Attribute {
                    name: attr_name(name),
                    value,
                }),
            }
        }

        pub fn remove_attr(&mut self, name: &str) -> bool {
            let before = self.attributes.len();
            self.attributes
                .retain(|a| !(*a.name.local).eq_ignore_ascii_case(name));
            before != self.attributes.len()
        }

        pub fn id(&self) -> Option<&str> {
            self.attr("id").filter(|id| !id.is_empty())
        }

        pub fn classes(&self) -> Vec<&str> {
            self.attr("class")
                .map(|c| c.split_whitespace().collect())
                .unwrap_or_default()
        }

        pub fn has_class(&self, class_name: &str) -> bool {
            self.classes().contains(&class_name)
        }

        pub fn add_class(&mut self, class_name: &str) {
            if self.has_class(class_name) {
                return;
            }
            let mut classes: Vec<String> = self.classes().iter().map(|c| c.to_string()).collect();
            classes.push(class_name.to_string());
            self.set_attr("class", classes.join(" "));
        }

        /// Removes a class; an emptied `class` attribute is dropped entirely.
        pub fn remove_class(&mut self, class_name: &str) -> bool {
            if !self.has_class(class_name) {
                return false;
            }
            let remaining: Vec<String> = self
                .classes()
                .into_iter()
                .filter(|c| *c != class_name)
                .map(str::to_string)
                .collect();
            if remaining.is_empty() {
                self.remove_attr("class");
            } else {
                self.set_attr("class", remaining.join(" "));
            }
            true
        }

        /// Returns the new state of the class.
        pub fn toggle_class(&mut self, class_name: &str) -> bool {
            if self.remove_class(class_name) {
                false
            } else {
                self.add_class(class_name);
                true
            }
        }

        pub fn inline_style(&self) -> Vec<InlineDeclaration> {
            self.attr("style").map(parse_inline_style).unwrap_or_default()
        }

        pub fn style_property(&self, property: &str) -> Option<String> {
            self.inline_style()
                .into_iter()
                .find(|d| d.property == property)
                .map(|d| d.value)
        }

        /// Equivalent of `style.setProperty(property, value, priority)`.
        pub fn set_style_property(&mut self, property: &str, value: &str, important: bool) {
            let mut declarations = self.inline_style();
            let property = property.trim().to_ascii_lowercase();
            match declarations.iter_mut().find(|d| d.property == property) {
                Some(existing) => {
                    existing.value = value.trim().to_string();
                    existing.important = important;
                }
                None => declarations.push(InlineDeclaration {
                    property,
                    value: value.trim().to_string(),
                    important,
                }),
            }
            self.set_attr("style", serialize_inline_style(&declarations));
        }
    }

    /// One `property: value` pair of a `style` attribute.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct InlineDeclaration {
        pub property: String,
        pub value: String,
        pub important: bool,
    }

    pub fn parse_inline_style(style: &str) -> Vec<InlineDeclaration> {
        let mut out = Vec::new();
        for chunk in split_declarations(style) {
            let Some((property, value)) = chunk.split_once(':') else {
                continue;
            };
            let property = property.trim().to_ascii_lowercase();
            if property.is_empty() {
                continue;
            }
            let mut value = value.trim();
            let mut important = false;
            if let Some(stripped) = strip_important(value) {
                value = stripped;
                important = true;
            }
            out.push(InlineDeclaration {
                property,
                value: value.to_string(),
                important,
            });
        }
        out
    }

    pub fn serialize_inline_style(declarations: &[InlineDeclaration]) -> String {
        declarations
            .iter()
            .map(|d| {
                if d.important {
                    format!("{}: {} !important;", d.property, d.value)
                } else {
                    format!("{}: {};", d.property, d.value)
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Strips a trailing `!important` marker, if any.
    pub fn strip_important(value: &str) -> Option<&str> {
        let trimmed = value.trim_end();
        let bang = trimmed.rfind('!')?;
        if trimmed[bang + 1..].trim().eq_ignore_ascii_case("important") {
            Some(trimmed[..bang].trim_end())
        } else {
            None
        }
    }

    // Splits on `;` outside parentheses and quotes, so `url(a;b)` survives.
    fn split_declarations(style: &str) -> Vec<&str> {
        let mut parts = Vec::new();
        let mut depth = 0usize;
        let mut quote: Option<char> = None;
        let mut start = 0;
        for (i, ch) in style.char_indices() {
            match (quote, ch) {
                (Some(q), c) if c == q => quote = None,
                (Some(_), _) => {}
                (None, '"') | (None, '\'') => quote = Some(ch),
                (None, '(') => depth += 1,
                (None, ')') => depth = depth.saturating_sub(1),
                (None, ';') if depth == 0 => {
                    parts.push(&style[start..i]);
                    start = i + 1;
                }
                _ => {}
            }
        }
        parts.push(&style[start..]);
        parts.into_iter().filter(|p| !p.trim().is_empty()).collect()
    }

    impl Document {
        pub fn document_element(&self) -> Option<NodeRef> {
            element_children(&self.root).into_iter().next()
        }

        pub fn head(&self) -> Option<NodeRef> {
            self.document_element()
                .and_then(|html| child_element_by_tag(&html, "head"))
        }

        pub fn body(&self) -> Option<NodeRef> {
            self.document_element()
                .and_then(|html| child_element_by_tag(&html, "body"))
        }

        pub fn get_element_by_id(&self, id: &str) -> Option<NodeRef> {
            find_element(&self.root, &|elem| elem.attr("id") == Some(id))
        }

        /// Every element in document order.
        pub fn elements(&self) -> Vec<NodeRef> {
            descendant_elements(&self.root)
        }

        /// Deep copy of the whole document, sharing nothing with `self`.
        pub fn deep_clone(&self) -> Document {
            Document {
                root: deep_clone(&self.root),
                doctype: RefCell::new(self.doctype.borrow().clone()),
            }
        }
    }

    pub fn new_document() -> Document {
        Document {
            root: Rc::new(RefCell::new(Node::DocumentRoot(DocumentRootNode::new()))),
            doctype: RefCell::new(None),
        }
    }

    pub fn new_element(tag: &str) -> NodeRef {
        let tag = tag.to_ascii_lowercase();
        Rc::new(RefCell::new(Node::Element(ElementNode::new(
            tag.clone(),
            html_name(&tag),
        ))))
    }

    pub fn new_text(text: &str) -> NodeRef {
        Rc::new(RefCell::new(Node::Text(TextNode::new(text))))
    }

    pub fn is_element(node: &NodeRef) -> bool {
        matches!(*node.borrow(), Node::Element(_))
    }

    /// Lowercase tag name, `None` for non-elements.
    pub fn tag_of(node: &NodeRef) -> Option<String> {
        match &*node.borrow() {
            Node::Element(elem) => Some(elem.tag.to_ascii_lowercase()),
            _ => None,
        }
    }

    /// Runs `f` against the element payload of `node`.
    pub fn with_element<R>(node: &NodeRef, f: impl FnOnce(&ElementNode) -> R) -> Option<R> {
        match &*node.borrow() {
            Node::Element(elem) => Some(f(elem)),
            _ => None,
        }
    }

    pub fn with_element_mut<R>(
        node: &NodeRef,
        f: impl FnOnce(&mut ElementNode) -> R,
    ) -> Option<R> {
        match &mut *node.borrow_mut() {
            Node::Element(elem) => Some(f(elem)),
            _ => None,
        }
    }

    pub fn children(node: &NodeRef) -> Vec<NodeRef> {
        match &*node.borrow() {
            Node::DocumentRoot(root) => root.children.clone(),
            Node::Element(elem) => elem.children.clone(),
            _ => Vec::new(),
        }
    }

    pub fn element_children(node: &NodeRef) -> Vec<NodeRef> {
        children(node).into_iter().filter(is_element).collect()
    }

    fn child_element_by_tag(node: &NodeRef, tag: &str) -> Option<NodeRef> {
        element_children(node)
            .into_iter()
            .find(|child| tag_of(child).as_deref() == Some(tag))
    }

    pub fn parent(node: &NodeRef) -> Option<NodeRef> {
        let weak = match &*node.borrow() {
            Node::Element(elem) => elem.parent.clone(),
            Node::Text(text) | Node::Comment(text) => text.parent.clone(),
            Node::DocumentRoot(_) => None,
        };
        weak.and_then(|w| w.upgrade())
    }

    /// Parent, but only if it is an element.
    pub fn parent_element(node: &NodeRef) -> Option<NodeRef> {
        parent(node).filter(is_element)
    }

    fn set_parent(node: &NodeRef, new_parent: Option<&NodeRef>) {
        let weak = new_parent.map(Rc::downgrade);
        match &mut *node.borrow_mut() {
            Node::Element(elem) => elem.parent = weak,
            Node::Text(text) | Node::Comment(text) => text.parent = weak,
            Node::DocumentRoot(_) => {}
        }
    }

    fn with_children_mut<R>(node: &NodeRef, f: impl FnOnce(&mut Vec<NodeRef>) -> R) -> Option<R> {
        match &mut *node.borrow_mut() {
            Node::DocumentRoot(root) => Some(f(&mut root.children)),
            Node::Element(elem) => Some(f(&mut elem.children)),
            _ => None,
        }
    }

    /// Removes `node` from its parent's child list. Returns false when detached already.
    pub fn detach(node: &NodeRef) -> bool {
        let Some(parent) = parent(node) else {
            return false;
        };
        let removed = with_children_mut(&parent, |kids| {
            let before = kids.len();
            kids.retain(|k| !Rc::ptr_eq(k, node));
            before != kids.len()
        })
        .unwrap_or(false);
        set_parent(node, None);
        removed
    }

    pub fn append_child(parent: &NodeRef, child: &NodeRef) {
        detach(child);
        if with_children_mut(parent, |kids| kids.push(Rc::clone(child))).is_some() {
            set_parent(child, Some(parent));
        }
    }

    /// Inserts `child` before `reference` under `parent`; appends when `reference` is not a child.
    pub fn insert_before(parent: &NodeRef, child: &NodeRef, reference: &NodeRef) {
        if Rc::ptr_eq(child, reference) {
            return;
        }
        detach(child);
        let inserted = with_children_mut(parent, |kids| {
            let index = kids
                .iter()
                .position(|k| Rc::ptr_eq(k, reference))
                .unwrap_or(kids.len());
            kids.insert(index, Rc::clone(child));
        });
        if inserted.is_some() {
            set_parent(child, Some(parent));
        }
    }

    pub fn insert_after(parent: &NodeRef, child: &NodeRef, reference: &NodeRef) {
        match next_sibling(reference) {
            Some(next) => insert_before(parent, child, &next),
            None => append_child(parent, child),
        }
    }

    /// Swaps `old` for `new` at the same position.
    pub fn replace_with(old: &NodeRef, new: &NodeRef) {
        if let Some(parent) = parent(old) {
            insert_before(&parent, new, old);
            detach(old);
        }
    }

    fn sibling_at(node: &NodeRef, offset: isize, elements_only: bool) -> Option<NodeRef> {
        let parent = parent(node)?;
        let siblings = if elements_only {
            element_children(&parent)
        } else {
            children(&parent)
        };
        let index = siblings.iter().position(|s| Rc::ptr_eq(s, node))? as isize;
        let target = index + offset;
        if target < 0 {
            return None;
        }
        siblings.get(target as usize).cloned()
    }

    pub fn next_sibling(node: &NodeRef) -> Option<NodeRef> {
        sibling_at(node, 1, false)
    }

    pub fn previous_element_sibling(node: &NodeRef) -> Option<NodeRef> {
        sibling_at(node, -1, true)
    }

    pub fn next_element_sibling(node: &NodeRef) -> Option<NodeRef> {
        sibling_at(node, 1, true)
    }

    /// Recursive copy; the copy has no parent.
    pub fn deep_clone(node: &NodeRef) -> NodeRef {
        let (shallow, kids) = {
            let borrowed = node.borrow();
            match &*borrowed {
                Node::DocumentRoot(root) => (
                    Node::DocumentRoot(DocumentRootNode::new()),
                    root.children.clone(),
                ),
                Node::Element(elem) => {
                    let mut copy = ElementNode::new(elem.tag.clone(), elem.qual_name.clone());
                    copy.attributes = elem.attributes.clone();
                    (Node::Element(copy), elem.children.clone())
                }
                Node::Text(text) => (Node::Text(TextNode::new(text.content.clone())), Vec::new()),
                Node::Comment(text) => {
                    (Node::Comment(TextNode::new(text.content.clone())), Vec::new())
                }
            }
        };
        let copy = Rc::new(RefCell::new(shallow));
        for kid in &kids {
            append_child(&copy, &deep_clone(kid));
        }
        copy
    }

    /// Pre-order list of element descendants (excluding `node` itself).
    pub fn descendant_elements(node: &NodeRef) -> Vec<NodeRef> {
        let mut out = Vec::new();
        collect_elements(node, &mut out);
        out
    }

    fn collect_elements(node: &NodeRef, out: &mut Vec<NodeRef>) {
        for child in children(node) {
            if is_element(&child) {
                out.push(Rc::clone(&child));
                collect_elements(&child, out);
            }
        }
    }

    pub fn find_element(node: &NodeRef, pred: &dyn Fn(&ElementNode) -> bool) -> Option<NodeRef> {
        descendant_elements(node)
            .into_iter()
            .find(|el| with_element(el, |e| pred(e)).unwrap_or(false))
    }

    /// Nearest inclusive ancestor element with the given tag.
    pub fn closest(node: &NodeRef, tag: &str) -> Option<NodeRef> {
        let mut current = Some(Rc::clone(node));
        while let Some(candidate) = current {
            if tag_of(&candidate).as_deref() == Some(tag) {
                return Some(candidate);
            }
            current = parent_element(&candidate);
        }
        None
    }

    pub fn text_content(node: &NodeRef) -> String {
        match &*node.borrow() {
            Node::Text(text) => text.content.clone(),
            Node::Comment(_) => String::new(),
            Node::DocumentRoot(root) => root.children.iter().map(text_content).collect(),
            Node::Element(elem) => elem.children.iter().map(text_content).collect(),
        }
    }

    /// Replaces all children with a single text node.
    pub fn set_text_content(node: &NodeRef, text: &str) {
        for child in children(node) {
            detach(&child);
        }
        if !text.is_empty() {
            append_child(node, &new_text(text));
        }
    }
}
