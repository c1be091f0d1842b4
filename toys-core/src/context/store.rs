//! Store Context
//!
//! A [`Store`] is a shared value with watchers. `set_values` shallow-merges a
//! patch into the current value and notifies every watcher synchronously
//! with the result. A [`StoreContext`] hands one store down the tree through
//! an ordinary [`Context`], and the `use_store_watch*` hooks mirror the
//! store into a signal while the consuming element is connected.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;

use super::provider::{create_context, Context};
use crate::component::{RenderContext, Value};
use crate::reactive::{Cleanup, IntoCleanup, ReadSignal, StrictEq};

/// Shallow merge of a partial value into a full one.
pub trait Merge {
    fn merge(&self, patch: Self) -> Self;
}

/// A loosely typed record: the usual store value.
pub type Record = IndexMap<String, Value>;

impl Merge for Record {
    fn merge(&self, patch: Self) -> Self {
        let mut next = self.clone();
        next.extend(patch);
        next
    }
}

type Watcher<T> = Rc<dyn Fn(&T)>;

struct StoreInner<T> {
    value: RefCell<Rc<T>>,
    watchers: RefCell<Vec<(u64, Watcher<T>)>>,
    next_watch: Cell<u64>,
}

/// Shared mutable value with watcher notification.
///
/// Handles compare by identity.
pub struct Store<T>(Rc<StoreInner<T>>);

impl<T> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T> PartialEq for Store<T> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl<T> StrictEq for Store<T> {
    fn strict_eq(&self, other: &Self) -> bool {
        self == other
    }
}

impl<T: Merge + Clone + 'static> Store<T> {
    pub fn new(value: T) -> Self {
        Self(Rc::new(StoreInner {
            value: RefCell::new(Rc::new(value)),
            watchers: RefCell::new(Vec::new()),
            next_watch: Cell::new(0),
        }))
    }

    pub fn get_values(&self) -> T {
        T::clone(&self.0.value.borrow())
    }

    pub fn with_values<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        let value = self.0.value.borrow().clone();
        f(&value)
    }

    /// Merge `patch` into the value, then notify every watcher registered
    /// at this moment. A panicking watcher stops the pass.
    pub fn set_values(&self, patch: T) {
        let next = Rc::new(self.0.value.borrow().merge(patch));
        *self.0.value.borrow_mut() = next.clone();

        let watchers: Vec<Watcher<T>> = self
            .0
            .watchers
            .borrow()
            .iter()
            .map(|(_, watcher)| watcher.clone())
            .collect();
        for watcher in watchers {
            watcher(&next);
        }
    }

    /// Call `f` with the merged value after every `set_values` until the
    /// handle is cancelled. Dropping the handle does not cancel.
    pub fn register_watch(&self, f: impl Fn(&T) + 'static) -> WatchHandle {
        let key = self.0.next_watch.get();
        self.0.next_watch.set(key + 1);
        self.0.watchers.borrow_mut().push((key, Rc::new(f)));

        let store: Weak<StoreInner<T>> = Rc::downgrade(&self.0);
        WatchHandle {
            cancel: Cleanup::new(move || {
                if let Some(store) = store.upgrade() {
                    store.watchers.borrow_mut().retain(|(k, _)| *k != key);
                }
            }),
        }
    }

    pub fn watcher_count(&self) -> usize {
        self.0.watchers.borrow().len()
    }
}

impl<T: fmt::Debug> fmt::Debug for Store<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("value", &self.0.value.borrow())
            .field("watchers", &self.0.watchers.borrow().len())
            .finish()
    }
}

/// Deregisters a store watcher.
#[must_use = "a watch stays registered until the handle is cancelled"]
pub struct WatchHandle {
    cancel: Cleanup,
}

impl WatchHandle {
    pub fn cancel(self) {
        self.cancel.run();
    }
}

impl IntoCleanup for WatchHandle {
    fn into_cleanup(self) -> Option<Cleanup> {
        Some(self.cancel)
    }
}

impl fmt::Debug for WatchHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("WatchHandle")
    }
}

/// What a store provider hands down: an existing store, or a fresh one
/// seeded with `value` (or the context default).
pub struct StoreProviderProps<T> {
    pub value: Option<T>,
    pub store: Option<Store<T>>,
}

impl<T> Default for StoreProviderProps<T> {
    fn default() -> Self {
        Self {
            value: None,
            store: None,
        }
    }
}

/// A context carrying a [`Store`].
pub struct StoreContext<T> {
    context: Context<Store<T>>,
    default: T,
}

impl<T: Clone> Clone for StoreContext<T> {
    fn clone(&self) -> Self {
        Self {
            context: self.context.clone(),
            default: self.default.clone(),
        }
    }
}

/// Create a store context. Consumers without a provider see a shared store
/// seeded with `default`.
pub fn create_store_context<T>(default: T) -> StoreContext<T>
where
    T: Merge + Clone + StrictEq + 'static,
{
    StoreContext {
        context: create_context(Store::new(default.clone())),
        default,
    }
}

impl<T: Merge + Clone + StrictEq + 'static> StoreContext<T> {
    /// Provide a store to the rendering element's subtree and return it.
    pub fn provider(&self, cx: &mut RenderContext<'_>, props: StoreProviderProps<T>) -> Store<T> {
        let store = props
            .store
            .unwrap_or_else(|| Store::new(props.value.unwrap_or_else(|| self.default.clone())));
        self.context.provide(cx, Some(store.clone()));
        store
    }

    /// The store visible from the rendering element.
    pub fn use_context(&self, cx: &mut RenderContext<'_>) -> ReadSignal<Store<T>> {
        self.context.use_context(cx)
    }

    /// Mirror the whole store value into a signal.
    pub fn use_store_watch(&self, cx: &mut RenderContext<'_>) -> ReadSignal<T> {
        self.use_store_watch_with(cx, T::clone)
    }

    /// Mirror a projection of the store value into a signal.
    ///
    /// On every connection the store is resolved, the projection seeded and
    /// a watch registered; the watch is cancelled at disconnect.
    pub fn use_store_watch_with<U, F>(&self, cx: &mut RenderContext<'_>, select: F) -> ReadSignal<U>
    where
        U: Clone + StrictEq + 'static,
        F: Fn(&T) -> U + 'static,
    {
        let value = cx.use_state(select(&self.default));
        let store = self.use_context(cx);
        let select = Rc::new(select);

        cx.on_connected(move |_| {
            let store = store.get_untracked();
            let project = select.clone();
            let handle = store.register_watch(move |values| value.set(project(values)));
            value.set(store.with_values(|values| select(values)));
            handle
        });
        value.read_only()
    }
}

impl StoreContext<Record> {
    /// Mirror one key of a record store into a signal. Missing keys read
    /// as `Undefined`.
    pub fn use_store_key(&self, cx: &mut RenderContext<'_>, key: &str) -> ReadSignal<Value> {
        let key = key.to_string();
        self.use_store_watch_with(cx, move |record| record.get(&key).cloned().unwrap_or_default())
    }
}

impl<T: fmt::Debug> fmt::Debug for StoreContext<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreContext")
            .field("context", &self.context)
            .field("default", &self.default)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pairs: &[(&str, Value)]) -> Record {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn set_values_merges_shallowly() {
        let store = Store::new(record(&[("a", Value::from(1)), ("b", Value::from(2))]));
        store.set_values(record(&[("b", Value::from(3)), ("c", Value::from(4))]));

        let values = store.get_values();
        assert_eq!(values.get("a"), Some(&Value::from(1)));
        assert_eq!(values.get("b"), Some(&Value::from(3)));
        assert_eq!(values.get("c"), Some(&Value::from(4)));
    }

    #[test]
    fn watchers_see_merged_value_until_cancelled() {
        let store = Store::new(record(&[("n", Value::from(0))]));
        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = seen.clone();
        let handle = store.register_watch(move |values: &Record| {
            log.borrow_mut().push(values.get("n").cloned().unwrap_or_default());
        });
        assert_eq!(store.watcher_count(), 1);

        store.set_values(record(&[("n", Value::from(1))]));
        handle.cancel();
        store.set_values(record(&[("n", Value::from(2))]));

        assert_eq!(*seen.borrow(), vec![Value::from(1)]);
        assert_eq!(store.watcher_count(), 0);
    }

    #[test]
    fn watcher_may_write_back() {
        let store = Store::new(record(&[("n", Value::from(0))]));
        let writer = store.clone();
        let _handle = store.register_watch(move |values: &Record| {
            if values.get("n") == Some(&Value::from(1)) {
                writer.set_values(record(&[("n", Value::from(2))]));
            }
        });

        store.set_values(record(&[("n", Value::from(1))]));
        assert_eq!(store.get_values().get("n"), Some(&Value::from(2)));
    }

    #[test]
    fn stores_compare_by_identity() {
        let a = Store::new(Record::new());
        let b = Store::new(Record::new());
        assert!(a == a.clone());
        assert!(a != b);
    }
}
