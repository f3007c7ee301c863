//! Decides where a style edit lands: a shared rule, an element rule, a
//! breakpoint rule, or the element's own `style` attribute.

use std::fmt;

use log::{debug, warn};

use super::rule_store::is_safe_value;
use super::surface::DocumentSurface;
use super::Editor;
use crate::dom::dom_tree::{self, NodeRef};
use crate::error::{EditorError, Result};
use crate::parser::dom_indices::DomIndices;

/// Groups of elements that are styled together when "apply to all" is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SharedRole {
    PrimaryCta,
    SecondaryCta,
    FormField,
}

impl SharedRole {
    /// Role of `node`. A form field class wins over the secondary CTA
    /// classes, which win over the primary ones.
    pub fn detect(node: &NodeRef) -> Option<SharedRole> {
        dom_tree::with_element(node, |el| {
            [SharedRole::FormField, SharedRole::SecondaryCta, SharedRole::PrimaryCta]
                .into_iter()
                .find(|role| role.classes().iter().any(|class| el.has_class(class)))
        })
        .flatten()
    }

    pub fn classes(self) -> &'static [&'static str] {
        match self {
            SharedRole::PrimaryCta => &["cta-btn1", "btn-primary-custom"],
            SharedRole::SecondaryCta => &["cta-btn2", "btn-secondary-custom"],
            SharedRole::FormField => &["form-control-generated"],
        }
    }

    /// Selector list matching every member of the group.
    pub fn selector_list(self) -> String {
        self.classes()
            .iter()
            .map(|class| format!(".{}", class))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Whether "apply to all" starts checked when such an element is selected.
    pub fn apply_all_default(self) -> bool {
        matches!(self, SharedRole::FormField)
    }

    /// Label of the "apply to all" toggle.
    pub fn label(self) -> &'static str {
        match self {
            SharedRole::PrimaryCta => "Apply to all .cta-btn1",
            SharedRole::SecondaryCta => "Apply to all .cta-btn2",
            SharedRole::FormField => "Apply to all fields",
        }
    }
}

impl fmt::Display for SharedRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.selector_list())
    }
}

/// Where a style edit was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StyleRoute {
    /// A rule store entry; `max_width` names the media block, if any.
    Rule {
        selector: String,
        pseudo: Option<String>,
        max_width: Option<String>,
    },
    /// The element's `style` attribute, as an `!important` declaration.
    Inline,
    /// No sheet could be written (no document or no `<head>`); nothing changed.
    Skipped,
}

impl<S: DocumentSurface> Editor<S> {
    /// Applies `property: value` to the selection, optionally under a
    /// pseudo-class such as `:hover`.
    ///
    /// Shared roles with "apply to all" on go to the role's selector list;
    /// pseudo-class and breakpoint edits go to a rule for the element's own
    /// selector; everything else is written inline.
    pub fn apply_style(
        &mut self,
        property: &str,
        value: &str,
        pseudo: Option<&str>,
    ) -> Result<StyleRoute> {
        let node = self.selected().ok_or(EditorError::NoSelection)?;
        if !is_safe_value(value) {
            return Err(EditorError::InvalidValue(value.trim().to_string()));
        }
        let pseudo = pseudo.map(str::trim).filter(|p| !p.is_empty());
        let max_width = self.active_max_width().map(str::to_string);
        let shared = if self.apply_to_all {
            SharedRole::detect(&node)
        } else {
            None
        };

        let selector = match shared {
            Some(role) => {
                if let Some(document) = self.surface.document() {
                    let indices = DomIndices::build(document, &self.config.marker_attribute);
                    debug!(
                        "shared edit reaches {} element(s) via {}",
                        indices.elements_with_any_class(role.classes()).len(),
                        role
                    );
                }
                Some(role.selector_list())
            }
            None if pseudo.is_some() || max_width.is_some() => {
                Some(self.selectors.selector_for(&node).ok_or(EditorError::NoSelection)?)
            }
            None => None,
        };

        let Some(selector) = selector else {
            dom_tree::with_element_mut(&node, |el| el.set_style_property(property, value, true));
            return Ok(StyleRoute::Inline);
        };
        if !self.rules.upsert_rule(
            self.surface.document(),
            &selector,
            max_width.as_deref(),
            pseudo,
            property,
            value,
        ) {
            warn!("style edit `{}: {}` on {} dropped", property, value, selector);
            return Ok(StyleRoute::Skipped);
        }
        Ok(StyleRoute::Rule {
            selector,
            pseudo: pseudo.map(str::to_string),
            max_width,
        })
    }
}
