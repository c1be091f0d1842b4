//! Ancestor-chain context.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::component::RenderContext;
use crate::dom::{Node, NodeId};
use crate::reactive::{ReadSignal, StrictEq};

/// Process-unique identity of a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextId(u64);

impl ContextId {
    fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

struct ContextInner<T> {
    id: ContextId,
    default: T,
    /// At most one entry per provider element.
    providers: RefCell<Vec<(NodeId, T)>>,
}

/// A tree-scoped value with a static default.
///
/// Components provide a value for their subtree with [`Context::provide`];
/// descendants, including those inside nested shadow trees, read the nearest
/// provided value with [`Context::use_context`].
pub struct Context<T> {
    inner: Rc<ContextInner<T>>,
}

impl<T> Clone for Context<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

/// Create a context whose lookups fall back to `default`.
pub fn create_context<T: Clone + StrictEq + 'static>(default: T) -> Context<T> {
    Context {
        inner: Rc::new(ContextInner {
            id: ContextId::new(),
            default,
            providers: RefCell::new(Vec::new()),
        }),
    }
}

impl<T: Clone + StrictEq + 'static> Context<T> {
    pub fn id(&self) -> ContextId {
        self.inner.id
    }

    pub fn default_value(&self) -> &T {
        &self.inner.default
    }

    /// Number of elements currently providing a value.
    pub fn provider_count(&self) -> usize {
        self.inner.providers.borrow().len()
    }

    /// Provide `value` (or the default) to the rendering element's subtree.
    ///
    /// The entry is registered immediately, removed when the element
    /// disconnects and registered again when it reconnects. Does nothing in
    /// probe mode.
    pub fn provide(&self, cx: &mut RenderContext<'_>, value: Option<T>) {
        let Ok(element) = cx.element() else {
            return;
        };
        let key = element.id();
        let value = value.unwrap_or_else(|| self.inner.default.clone());
        self.register(key, value.clone());

        let context = self.clone();
        cx.on_connected(move |_| context.register(key, value.clone()));
        let context = self.clone();
        cx.on_disconnected(move |_| context.unregister(key));
    }

    fn register(&self, key: NodeId, value: T) {
        let mut providers = self.inner.providers.borrow_mut();
        match providers.iter_mut().find(|(id, _)| *id == key) {
            Some(entry) => entry.1 = value,
            None => providers.push((key, value)),
        }
    }

    fn unregister(&self, key: NodeId) {
        self.inner.providers.borrow_mut().retain(|(id, _)| *id != key);
    }

    /// Resolve the value visible from `element`: the nearest providing
    /// ancestor, stepping from shadow roots to their hosts, or the default.
    pub fn lookup(&self, element: &Node) -> T {
        let providers: HashMap<NodeId, T> = self.inner.providers.borrow().iter().cloned().collect();

        let mut current = element.parent_node().or_else(|| element.host());
        while let Some(node) = current {
            if let Some(value) = providers.get(&node.id()) {
                tracing::trace!(context = ?self.inner.id, provider = ?node, "context resolved");
                return value.clone();
            }
            current = node.parent_node().or_else(|| node.host());
        }
        self.inner.default.clone()
    }

    /// A signal holding the context value for the rendering element.
    ///
    /// The value is resolved every time the element connects; later changes
    /// to providers are not observed until the next connection. In probe mode
    /// the signal holds the default.
    pub fn use_context(&self, cx: &mut RenderContext<'_>) -> ReadSignal<T> {
        let value = cx.use_state(self.inner.default.clone());
        if cx.is_probe() {
            return value.read_only();
        }
        let context = self.clone();
        cx.on_connected(move |element| value.set(context.lookup(element)));
        value.read_only()
    }
}

impl<T: fmt::Debug> fmt::Debug for Context<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("id", &self.inner.id)
            .field("default", &self.inner.default)
            .field("providers", &self.inner.providers.borrow().len())
            .finish()
    }
}
