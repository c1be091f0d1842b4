//! Instance Metadata
//!
//! One [`Instance`] per constructed component element. It holds the props
//! bag, the shadow root and the lifecycle callbacks, and routes the
//! element's reactions to them.
//!
//! The instance is owned by the element and lives exactly as long as it.
//! Disconnecting does not release it, so a reconnected element runs its
//! connected callbacks again.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use super::props::Props;
use super::value::{coerce_attribute, Coercer};
use crate::dom::{ElementReactions, Node};
use crate::reactive::Cleanup;

pub(crate) type AdoptedFn = Rc<dyn Fn(&Node)>;
pub(crate) type ConnectedFn = Rc<dyn Fn(&Node) -> Option<Cleanup>>;
pub(crate) type DisconnectedFn = Rc<dyn Fn(&Node)>;

#[derive(Default)]
pub(crate) struct Lifecycle {
    pub(crate) adopted: Vec<AdoptedFn>,
    pub(crate) connected: Vec<ConnectedFn>,
    pub(crate) disconnected: Vec<DisconnectedFn>,
}

/// Per-element component metadata.
pub struct Instance {
    props: Props,
    shadow_root: Node,
    /// Observed attribute name to the prop it feeds.
    attributes: IndexMap<String, (String, Coercer)>,
    lifecycle: RefCell<Lifecycle>,
    /// Cleanups returned by connected callbacks, consumed at disconnect.
    teardowns: RefCell<Vec<Cleanup>>,
    owned: RefCell<Vec<Cleanup>>,
}

impl Instance {
    pub(crate) fn new(
        props: Props,
        shadow_root: Node,
        attributes: IndexMap<String, (String, Coercer)>,
    ) -> Self {
        Self {
            props,
            shadow_root,
            attributes,
            lifecycle: RefCell::default(),
            teardowns: RefCell::default(),
            owned: RefCell::default(),
        }
    }

    /// Take over what the instance render pass registered.
    pub(crate) fn install(&self, lifecycle: Lifecycle, owned: Vec<Cleanup>) {
        *self.lifecycle.borrow_mut() = lifecycle;
        self.owned.borrow_mut().extend(owned);
    }

    pub fn props(&self) -> &Props {
        &self.props
    }

    /// The shadow root, whatever its mode.
    pub fn shadow_root(&self) -> &Node {
        &self.shadow_root
    }

    /// Number of registered (adopted, connected, disconnected) callbacks.
    pub fn callback_counts(&self) -> (usize, usize, usize) {
        let lifecycle = self.lifecycle.borrow();
        (
            lifecycle.adopted.len(),
            lifecycle.connected.len(),
            lifecycle.disconnected.len(),
        )
    }

    /// Number of teardowns waiting for the next disconnect.
    pub fn pending_teardowns(&self) -> usize {
        self.teardowns.borrow().len()
    }
}

impl ElementReactions for Instance {
    fn adopted(&self, element: &Node) {
        let callbacks = self.lifecycle.borrow().adopted.clone();
        for callback in callbacks {
            callback(element);
        }
    }

    fn connected(&self, element: &Node) {
        let callbacks = self.lifecycle.borrow().connected.clone();
        for callback in callbacks {
            if let Some(teardown) = callback(element) {
                self.teardowns.borrow_mut().push(teardown);
            }
        }
    }

    /// Explicit disconnected callbacks first, then the teardowns returned by
    /// this connection's connected callbacks.
    fn disconnected(&self, element: &Node) {
        let callbacks = self.lifecycle.borrow().disconnected.clone();
        for callback in callbacks {
            callback(element);
        }
        let teardowns = std::mem::take(&mut *self.teardowns.borrow_mut());
        for teardown in teardowns {
            teardown.run();
        }
    }

    fn attribute_changed(&self, element: &Node, name: &str, _old: Option<&str>, new: Option<&str>) {
        let Some((prop, coerce)) = self.attributes.get(name) else {
            return;
        };
        let value = coerce(coerce_attribute(new));
        tracing::trace!(element = ?element, name, prop = prop.as_str(), %value, "attribute changed");
        if let Some(signal) = self.props.signal(prop) {
            signal.set(value);
        }
    }

    fn into_any(self: Rc<Self>) -> Rc<dyn Any> {
        self
    }
}

impl Drop for Instance {
    fn drop(&mut self) {
        for owned in self.owned.get_mut().drain(..).rev() {
            owned.run();
        }
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("props", &self.props)
            .field("shadow_root", &self.shadow_root)
            .field("callbacks", &self.callback_counts())
            .finish()
    }
}
