use log::debug;

use crate::dom::dom_tree::{self, NodeRef};

/// Derives stable selectors for elements, minting marker attributes on demand.
///
/// The counter lives as long as the loaded document and only moves forward.
#[derive(Debug, Clone)]
pub struct SelectorAssigner {
    attribute: String,
    prefix: String,
    counter: u64,
}

impl SelectorAssigner {
    pub fn new(attribute: impl Into<String>, prefix: impl Into<String>) -> Self {
        SelectorAssigner {
            attribute: attribute.into(),
            prefix: prefix.into(),
            counter: 0,
        }
    }

    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    /// Selector for `node`: id-based when it has an id, otherwise its marker,
    /// which is written on first use.
    pub fn selector_for(&mut self, node: &NodeRef) -> Option<String> {
        let (id, marker) = dom_tree::with_element(node, |el| {
            (
                el.id().filter(|id| !id.trim().is_empty()).map(str::to_string),
                el.attr(&self.attribute).map(str::to_string),
            )
        })?;

        if let Some(id) = id {
            return Some(id_selector(&id));
        }
        let marker = match marker {
            Some(marker) => marker,
            None => {
                self.counter += 1;
                let minted = format!("{}{}", self.prefix, self.counter);
                dom_tree::with_element_mut(node, |el| el.set_attr(&self.attribute, minted.clone()));
                debug!("minted selector marker {}", minted);
                minted
            }
        };
        Some(attribute_selector(&self.attribute, &marker))
    }

    /// Continues numbering after the highest marker already in the document.
    pub fn seed(&mut self, highest_existing: u64) {
        self.counter = self.counter.max(highest_existing);
    }

    pub fn reset(&mut self) {
        self.counter = 0;
    }

    pub fn counter(&self) -> u64 {
        self.counter
    }
}

/// `#id` for plain identifiers, otherwise an attribute selector that needs no escaping.
pub fn id_selector(id: &str) -> String {
    if is_plain_identifier(id) {
        format!("#{}", id)
    } else {
        attribute_selector("id", id)
    }
}

pub fn attribute_selector(attribute: &str, value: &str) -> String {
    format!("[{}=\"{}\"]", attribute, value.replace('\\', "\\\\").replace('"', "\\\""))
}

fn is_plain_identifier(id: &str) -> bool {
    let bytes = id.as_bytes();
    let starts_ok = match bytes {
        [b'-', b'-', ..] => true,
        [b'-', second, ..] => second.is_ascii_alphabetic() || *second == b'_',
        [first, ..] => first.is_ascii_alphabetic() || *first == b'_',
        [] => false,
    };
    starts_ok
        && bytes
            .iter()
            .all(|b| b.is_ascii_alphanumeric() || *b == b'-' || *b == b'_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::dom_tree::{new_element, with_element_mut};

    fn assigner() -> SelectorAssigner {
        SelectorAssigner::new("data-editor-id", "editor-el-")
    }

    #[test]
    fn mints_sequential_markers_once_per_element() {
        let mut selectors = assigner();
        let first = new_element("div");
        let second = new_element("p");
        assert_eq!(
            selectors.selector_for(&first).as_deref(),
            Some("[data-editor-id=\"editor-el-1\"]")
        );
        assert_eq!(
            selectors.selector_for(&first).as_deref(),
            Some("[data-editor-id=\"editor-el-1\"]")
        );
        assert_eq!(
            selectors.selector_for(&second).as_deref(),
            Some("[data-editor-id=\"editor-el-2\"]")
        );
    }

    #[test]
    fn prefers_ids() {
        let mut selectors = assigner();
        let plain = new_element("h1");
        with_element_mut(&plain, |el| el.set_attr("id", "t"));
        assert_eq!(selectors.selector_for(&plain).as_deref(), Some("#t"));

        let odd = new_element("h1");
        with_element_mut(&odd, |el| el.set_attr("id", "1st.title"));
        assert_eq!(
            selectors.selector_for(&odd).as_deref(),
            Some("[id=\"1st.title\"]")
        );
        assert_eq!(selectors.counter(), 0);
    }

    #[test]
    fn seeding_skips_existing_markers() {
        let mut selectors = assigner();
        selectors.seed(7);
        let node = new_element("span");
        assert_eq!(
            selectors.selector_for(&node).as_deref(),
            Some("[data-editor-id=\"editor-el-8\"]")
        );
        selectors.reset();
        assert_eq!(selectors.counter(), 0);
    }
}
