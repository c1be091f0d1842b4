//! Render Context
//!
//! Every render invocation receives a [`RenderContext`]. Hooks called on it
//! either declare something about the component (shadow-root options,
//! reactive properties) or register per-instance behavior (watchers,
//! lifecycle callbacks).
//!
//! The same render function runs in two modes:
//!
//! - **probe**: once, when the component is defined, with no element.
//!   Declarations are recorded; hooks that need an element do nothing and
//!   [`RenderContext::element`] fails with [`ComponentError::NoInstance`].
//! - **instance**: once per constructed element. Lifecycle callbacks and
//!   owned reactive state are handed over to the element's metadata.

use indexmap::IndexMap;

use super::instance::{AdoptedFn, ConnectedFn, DisconnectedFn, Lifecycle};
use super::props::Props;
use super::value::Coercer;
use crate::dom::{Node, ShadowRootInit};
use crate::error::ComponentError;
use crate::reactive::{create_effect, Cleanup, Effect, IntoCleanup, Signal};
use std::rc::Rc;

/// Handle passed to a component's render function.
pub struct RenderContext<'a> {
    element: Option<&'a Node>,
    shadow_root: Option<Node>,
    props: Props,
    shadow_init: ShadowRootInit,
    declared: IndexMap<String, Coercer>,
    lifecycle: Lifecycle,
    owned: Vec<Cleanup>,
}

impl<'a> RenderContext<'a> {
    pub(crate) fn probe() -> Self {
        Self {
            element: None,
            shadow_root: None,
            props: Props::default(),
            shadow_init: ShadowRootInit::default(),
            declared: IndexMap::new(),
            lifecycle: Lifecycle::default(),
            owned: Vec::new(),
        }
    }

    pub(crate) fn instance(element: &'a Node, shadow_root: Node, props: Props) -> Self {
        Self {
            element: Some(element),
            shadow_root: Some(shadow_root),
            props,
            shadow_init: ShadowRootInit::default(),
            declared: IndexMap::new(),
            lifecycle: Lifecycle::default(),
            owned: Vec::new(),
        }
    }

    /// Whether this is the definition-time probe.
    pub fn is_probe(&self) -> bool {
        self.element.is_none()
    }

    /// The element being constructed.
    pub fn element(&self) -> Result<&'a Node, ComponentError> {
        self.element.ok_or(ComponentError::NoInstance)
    }

    /// Declare the shadow-root options and get the instance's shadow root.
    pub fn use_shadow_root(&mut self, init: ShadowRootInit) -> Option<Node> {
        self.shadow_init = init;
        self.shadow_root.clone()
    }

    /// Declare reactive properties with their coercions. Props keep the
    /// declared name; the matching attribute is its lowercase form. Later
    /// declarations of the same name win. Returns the instance's props
    /// (empty in probe mode).
    pub fn use_props(&mut self, props: &[(&str, Coercer)]) -> Props {
        for (name, coercer) in props {
            self.declared.insert(name.to_string(), *coercer);
        }
        self.props.clone()
    }

    /// Create a signal owned by the instance; it is disposed with it.
    pub fn use_state<T: 'static>(&mut self, initial: T) -> Signal<T> {
        let signal = Signal::new(initial);
        self.owned.push(Cleanup::new(move || signal.dispose()));
        signal
    }

    /// Run an effect bound to the element. It is disposed with the instance.
    pub fn use_watch<F, R>(&mut self, f: F)
    where
        F: Fn(&Node) -> R + 'static,
        R: IntoCleanup,
    {
        let Some(element) = self.element else {
            return;
        };
        let element = element.downgrade();
        let effect = create_effect(move || match element.upgrade() {
            Some(node) => f(&node).into_cleanup(),
            None => None,
        });
        self.own_effect(effect);
    }

    /// Hand an effect to the instance so it is disposed with it.
    pub fn own_effect(&mut self, effect: Effect) {
        self.owned.push(Cleanup::new(move || effect.dispose()));
    }

    /// Run `f` right away with the element, once per instance.
    pub fn use_created(&mut self, f: impl FnOnce(&Node)) {
        if let Some(element) = self.element {
            f(element);
        }
    }

    pub fn on_adopted(&mut self, f: impl Fn(&Node) + 'static) {
        let callback: AdoptedFn = Rc::new(f);
        self.lifecycle.adopted.push(callback);
    }

    /// Register a connected callback. A returned [`Cleanup`] runs at the
    /// next disconnect, after the disconnected callbacks.
    pub fn on_connected<F, R>(&mut self, f: F)
    where
        F: Fn(&Node) -> R + 'static,
        R: IntoCleanup,
    {
        let callback: ConnectedFn = Rc::new(move |node: &Node| f(node).into_cleanup());
        self.lifecycle.connected.push(callback);
    }

    pub fn on_disconnected(&mut self, f: impl Fn(&Node) + 'static) {
        let callback: DisconnectedFn = Rc::new(f);
        self.lifecycle.disconnected.push(callback);
    }

    pub(crate) fn into_declarations(mut self) -> (ShadowRootInit, IndexMap<String, Coercer>) {
        (
            std::mem::take(&mut self.shadow_init),
            std::mem::take(&mut self.declared),
        )
    }

    pub(crate) fn into_registrations(mut self) -> (Lifecycle, Vec<Cleanup>) {
        (
            std::mem::take(&mut self.lifecycle),
            std::mem::take(&mut self.owned),
        )
    }
}

impl Drop for RenderContext<'_> {
    fn drop(&mut self) {
        for owned in self.owned.drain(..).rev() {
            owned.run();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::coerce;
    use crate::dom::{Document, ShadowRootMode};
    use std::cell::Cell;

    #[test]
    fn probe_records_declarations() {
        let mut cx = RenderContext::probe();
        assert!(cx.is_probe());
        assert!(cx.use_shadow_root(ShadowRootInit::open()).is_none());
        let props = cx.use_props(&[("maxCount", coerce::number), ("label", coerce::string)]);
        assert!(props.is_empty());
        assert_eq!(cx.element(), Err(ComponentError::NoInstance));

        let (init, declared) = cx.into_declarations();
        assert_eq!(init.mode, ShadowRootMode::Open);
        assert_eq!(declared.keys().collect::<Vec<_>>(), vec!["maxCount", "label"]);
    }

    #[test]
    fn probe_skips_element_hooks() {
        let mut cx = RenderContext::probe();
        let ran = Rc::new(Cell::new(false));
        let flag = ran.clone();
        cx.use_created(|_| flag.set(true));
        let flag = ran.clone();
        cx.use_watch(move |_| flag.set(true));
        assert!(!ran.get());
    }

    #[test]
    fn owned_state_is_released_with_the_context() {
        let doc = Document::new();
        let el = doc.create_element("div").unwrap();
        let root = el.attach_shadow(ShadowRootInit::open()).unwrap();
        let state;
        {
            let mut cx = RenderContext::instance(&el, root, Props::default());
            state = cx.use_state(3);
            assert_eq!(state.get(), 3);
        }
        assert!(!state.is_alive());
    }

    #[test]
    fn registrations_move_out() {
        let doc = Document::new();
        let el = doc.create_element("div").unwrap();
        let root = el.attach_shadow(ShadowRootInit::open()).unwrap();
        let mut cx = RenderContext::instance(&el, root, Props::default());
        let state = cx.use_state(0);
        cx.on_connected(|_| {});
        cx.on_disconnected(|_| {});

        let (lifecycle, owned) = cx.into_registrations();
        assert_eq!(lifecycle.connected.len(), 1);
        assert_eq!(lifecycle.disconnected.len(), 1);
        assert!(state.is_alive());
        for cleanup in owned {
            cleanup.run();
        }
        assert!(!state.is_alive());
    }
}
