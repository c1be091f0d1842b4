//! Error types shared across the runtime.
//!
//! Reactive propagation itself is infallible: a panic inside an effect body
//! unwinds through the `set` call that triggered it. The types here cover the
//! operations that can fail for ordinary reasons (stale handles, invalid tree
//! mutations, components rendered without an element).

use thiserror::Error;

use crate::reactive::SignalId;

/// Errors raised by the signal engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReactiveError {
    /// The signal was disposed and its slot released.
    #[error("signal {0:?} has been disposed")]
    SignalDisposed(SignalId),

    /// The slot holds a value of a different type than the handle expects.
    #[error("signal {0:?} holds a value of an unexpected type")]
    TypeMismatch(SignalId),
}

/// Errors raised by document and tree operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomError {
    /// The insertion would produce an invalid tree (cycle, wrong parent kind).
    #[error("hierarchy request error: {0}")]
    HierarchyRequest(&'static str),

    /// The referenced node is not a child of the target.
    #[error("node is not a child of this parent")]
    NotFound,

    /// An element-only operation was called on another kind of node.
    #[error("operation requires an element node")]
    NotAnElement,

    /// An element or attribute name is empty or contains forbidden characters.
    #[error("invalid name `{0}`")]
    InvalidName(String),

    /// The name is not a valid custom element name.
    #[error("`{0}` is not a valid custom element name")]
    InvalidCustomElementName(String),

    /// A definition for this name already exists in the registry.
    #[error("custom element `{0}` is already defined")]
    AlreadyDefined(String),

    /// The element already hosts a shadow root.
    #[error("element `{0}` already has a shadow root")]
    ShadowRootExists(String),

    /// The node is detached from any document.
    #[error("node has no owner document")]
    NoOwnerDocument,
}

/// Errors raised while constructing or driving a component.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ComponentError {
    /// A hook that needs an element was called during the definition probe.
    #[error("no component instance is being rendered")]
    NoInstance,

    /// The element does not carry component metadata.
    #[error("element is not a constructed component")]
    NotAComponent,

    /// The property is not one of the component's declared props.
    #[error("unknown property `{0}`")]
    UnknownProperty(String),

    /// The render function reported a failure.
    #[error("render failed: {0}")]
    Render(String),

    #[error(transparent)]
    Dom(#[from] DomError),

    #[error(transparent)]
    Reactive(#[from] ReactiveError),
}

/// Errors raised by list mutations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ListError {
    /// The index does not address an existing entry.
    #[error("index {index} out of bounds for list of length {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error(transparent)]
    Dom(#[from] DomError),
}
