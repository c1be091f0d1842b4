//! Host Document Model
//!
//! A single-threaded DOM with just enough surface for components: documents,
//! elements with attributes, text, comments, fragments, shadow roots, markup
//! parsing and serialization, and custom elements whose lifecycle reactions
//! fire synchronously as the tree changes.
//!
//! # Lifecycle reactions
//!
//! | Event                 | Fires when                                          |
//! |-----------------------|-----------------------------------------------------|
//! | `connected`           | the element's shadow-including root becomes a document |
//! | `disconnected`        | the element leaves a document                       |
//! | `adopted`             | the element's owner document changes                |
//! | `attribute_changed`   | an observed attribute is set or removed             |
//!
//! Reactions for a subtree fire in shadow-including tree order: an element,
//! then its shadow tree, then its children.

mod custom;
mod document;
mod markup;
mod node;

pub use custom::{
    CustomElementDefinition, ElementReactions, ShadowRootInit, ShadowRootMode, SlotAssignment,
};
pub use document::Document;
pub use node::{Node, NodeId, NodeType, WeakNode};
