//! Custom Elements
//!
//! A [`CustomElementDefinition`] is registered under a tag name on a
//! document. Every element with that tag is constructed through it, both when
//! it is created and, for elements that existed before the definition, when
//! the definition is registered. Construction yields the element's
//! [`ElementReactions`], which the tree calls back into synchronously.

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::node::{CustomState, Node};

/// Whether a shadow root is reachable through its host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShadowRootMode {
    Open,
    #[default]
    Closed,
}

/// How slottables are assigned to slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotAssignment {
    #[default]
    Named,
    Manual,
}

/// Options for attaching a shadow root.
///
/// Deserializes from the usual camel-cased object, so a component can carry
/// its shadow configuration as data:
///
/// ```rust
/// use toys_core::dom::{ShadowRootInit, ShadowRootMode};
///
/// let init: ShadowRootInit = serde_json::from_str(r#"{"mode":"open"}"#).unwrap();
/// assert_eq!(init.mode, ShadowRootMode::Open);
/// assert!(!init.delegates_focus);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShadowRootInit {
    pub mode: ShadowRootMode,
    pub delegates_focus: bool,
    pub slot_assignment: SlotAssignment,
}

impl ShadowRootInit {
    pub fn open() -> Self {
        Self {
            mode: ShadowRootMode::Open,
            ..Self::default()
        }
    }

    pub fn closed() -> Self {
        Self::default()
    }
}

/// Lifecycle callbacks of a constructed custom element.
pub trait ElementReactions: 'static {
    /// The element became connected to a document.
    fn connected(&self, _element: &Node) {}

    /// The element was removed from a document.
    fn disconnected(&self, _element: &Node) {}

    /// The element moved to a different owner document.
    fn adopted(&self, _element: &Node) {}

    /// An observed attribute was set or removed.
    fn attribute_changed(
        &self,
        _element: &Node,
        _name: &str,
        _old: Option<&str>,
        _new: Option<&str>,
    ) {
    }

    /// Recover the concrete type behind a `dyn ElementReactions`.
    fn into_any(self: Rc<Self>) -> Rc<dyn Any>;
}

/// A custom element class.
pub trait CustomElementDefinition: 'static {
    /// Attribute names whose changes reach [`ElementReactions::attribute_changed`].
    fn observed_attributes(&self) -> Vec<String> {
        Vec::new()
    }

    /// Construct the per-element state. `None` leaves the element plain.
    fn construct(&self, element: &Node) -> Option<Rc<dyn ElementReactions>>;
}

/// Per-document table of definitions, shared by documents created from it.
#[derive(Default)]
pub(crate) struct CustomElementRegistry {
    definitions: RefCell<IndexMap<String, Rc<dyn CustomElementDefinition>>>,
}

impl CustomElementRegistry {
    pub(crate) fn get(&self, name: &str) -> Option<Rc<dyn CustomElementDefinition>> {
        self.definitions.borrow().get(name).cloned()
    }

    pub(crate) fn contains(&self, name: &str) -> bool {
        self.definitions.borrow().contains_key(name)
    }

    pub(crate) fn insert(&self, name: String, definition: Rc<dyn CustomElementDefinition>) {
        self.definitions.borrow_mut().insert(name, definition);
    }

    pub(crate) fn len(&self) -> usize {
        self.definitions.borrow().len()
    }
}

const RESERVED_NAMES: &[&str] = &[
    "annotation-xml",
    "color-profile",
    "font-face",
    "font-face-src",
    "font-face-uri",
    "font-face-format",
    "font-face-name",
    "missing-glyph",
];

/// Lowercase ASCII start, a hyphen somewhere, no uppercase, not reserved.
pub(crate) fn is_valid_custom_element_name(name: &str) -> bool {
    let starts_lower = name.chars().next().is_some_and(|c| c.is_ascii_lowercase());
    starts_lower
        && name.contains('-')
        && !name.chars().any(|c| c.is_ascii_uppercase() || c.is_whitespace())
        && super::node::is_valid_element_name(name)
        && !RESERVED_NAMES.contains(&name)
}

/// Construct `element` through `definition`.
///
/// Observed attributes already present are replayed as changes from `None`,
/// then `connected` fires if the element is already in a document.
pub(crate) fn upgrade(element: &Node, definition: &Rc<dyn CustomElementDefinition>) {
    if element.custom_state().is_some() {
        return;
    }
    let observed: Rc<[String]> = definition.observed_attributes().into();
    let Some(reactions) = definition.construct(element) else {
        return;
    };
    element.set_custom_state(CustomState {
        reactions: reactions.clone(),
        observed: observed.clone(),
    });
    tracing::debug!(element = ?element, "custom element constructed");

    let present: Vec<(String, String)> = element
        .attributes()
        .into_iter()
        .filter(|(name, _)| observed.iter().any(|o| o == name))
        .collect();
    for (name, value) in present {
        reactions.attribute_changed(element, &name, None, Some(&value));
    }

    if element.is_connected() {
        reactions.connected(element);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn custom_element_names() {
        assert!(is_valid_custom_element_name("x-counter"));
        assert!(is_valid_custom_element_name("my-app-2"));
        assert!(!is_valid_custom_element_name("counter"));
        assert!(!is_valid_custom_element_name("X-counter"));
        assert!(!is_valid_custom_element_name("x-Counter"));
        assert!(!is_valid_custom_element_name("-x"));
        assert!(!is_valid_custom_element_name("font-face"));
    }

    #[test]
    fn shadow_root_init_defaults_to_closed() {
        let init: ShadowRootInit = serde_json::from_str("{}").unwrap();
        assert_eq!(init, ShadowRootInit::closed());
    }

    #[test]
    fn shadow_root_init_reads_camel_case() {
        let init: ShadowRootInit = serde_json::from_str(
            r#"{"mode":"open","delegatesFocus":true,"slotAssignment":"manual"}"#,
        )
        .unwrap();
        assert_eq!(init.mode, ShadowRootMode::Open);
        assert!(init.delegates_focus);
        assert_eq!(init.slot_assignment, SlotAssignment::Manual);
    }
}
