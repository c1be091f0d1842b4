//! Toys Core
//!
//! This crate provides the runtime for Toys, a minimal reactive component
//! library. It implements:
//!
//! - Fine-grained reactive primitives (signals and effects)
//! - Function components compiled into custom elements
//! - Tree-scoped context propagation and shared stores
//! - Positional list reconciliation
//!
//! Everything is single-threaded and synchronous: a signal write re-runs its
//! dependents, and a tree mutation fires its lifecycle reactions, before the
//! call returns.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `reactive`: Signals, effects and dependency tracking
//! - `dom`: The host document model components live in
//! - `component`: Component definitions, props and lifecycle routing
//! - `context`: Ancestor-chain context and store contexts
//! - `list`: List diffing and imperative list mutations
//!
//! # Example
//!
//! ```rust
//! use toys_core::prelude::*;
//!
//! let greeting = define_component(|cx| {
//!     let root = cx.use_shadow_root(ShadowRootInit::open());
//!     let props = cx.use_props(&[("name", coerce::string)]);
//!     cx.use_watch(move |_| {
//!         if let Some(root) = &root {
//!             root.set_text_content(&format!("Hello, {}!", props.get("name")));
//!         }
//!     });
//!     Ok(String::new())
//! });
//!
//! let doc = Document::new();
//! doc.define("x-greeting", greeting).unwrap();
//!
//! let el = doc.create_element("x-greeting").unwrap();
//! el.set_attribute("name", "world").unwrap();
//! assert_eq!(el.shadow_root().unwrap().text_content(), "Hello, world!");
//! ```

pub mod component;
pub mod context;
pub mod dom;
pub mod error;
pub mod list;
pub mod reactive;

pub use error::{ComponentError, DomError, ListError, ReactiveError};

/// The commonly used types and functions.
pub mod prelude {
    pub use crate::component::{
        coerce, define_component, ComponentClass, ComponentElement, Props, RenderContext, Value,
    };
    pub use crate::context::{
        create_context, create_store_context, Context, Record, Store, StoreContext,
        StoreProviderProps,
    };
    pub use crate::dom::{Document, Node, ShadowRootInit, ShadowRootMode};
    pub use crate::error::{ComponentError, DomError, ListError, ReactiveError};
    pub use crate::list::{diff, use_dynamic_list, DiffOptions, DynamicList, ListBinding};
    pub use crate::reactive::{
        create_effect, create_signal, untrack, Cleanup, Effect, ReadSignal, Signal, StrictEq,
        WriteSignal,
    };
}
