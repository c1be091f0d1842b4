//! Component Runtime
//!
//! Turns a render function into a custom element class.
//!
//! # Concepts
//!
//! ## Render functions
//!
//! A component is a function from a [`RenderContext`] to markup. It declares
//! its shadow-root options and reactive props through hooks on the context
//! and registers lifecycle callbacks the same way. The returned markup is
//! fixed per component: it is captured once by the definition-time probe,
//! and dynamic content is written into the shadow root from
//! [`RenderContext::use_watch`] effects.
//!
//! ## Props
//!
//! Each declared prop is a `Signal<Value>`. It is seeded from the element's
//! attribute, and updated both by [`ComponentElement::set_property`] (which
//! also reflects the value back to the attribute) and by attribute changes.
//! Both paths write the same signal, so watchers see either.
//!
//! ## Lifecycle
//!
//! Connected callbacks may return a [`Cleanup`](crate::reactive::Cleanup).
//! On disconnect the explicit disconnected callbacks run first, then those
//! cleanups, which are consumed. The metadata itself stays with the element,
//! so moving an element runs its connected callbacks again.
//!
//! # Example
//!
//! ```rust
//! use toys_core::component::{coerce, define_component, ComponentElement, Value};
//! use toys_core::dom::{Document, ShadowRootInit};
//!
//! let counter = define_component(|cx| {
//!     let root = cx.use_shadow_root(ShadowRootInit::open());
//!     let props = cx.use_props(&[("count", coerce::number)]);
//!     cx.use_watch(move |_| {
//!         if let Some(root) = &root {
//!             root.set_text_content(&format!("count: {}", props.get("count")));
//!         }
//!     });
//!     Ok(String::new())
//! });
//!
//! let doc = Document::new();
//! doc.define("x-counter", counter).unwrap();
//!
//! let el = doc.create_element("x-counter").unwrap();
//! el.set_property("count", 2).unwrap();
//! assert_eq!(el.shadow_root().unwrap().text_content(), "count: 2");
//! assert_eq!(el.property("count"), Some(Value::from(2)));
//! ```

mod define;
mod instance;
mod props;
mod render;
mod value;

pub use define::{define_component, ComponentClass, ComponentElement};
pub use instance::Instance;
pub use props::Props;
pub use render::RenderContext;
pub use value::{coerce, coerce_attribute, Coercer, Value};
