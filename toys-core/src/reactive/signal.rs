//! Signal Implementation
//!
//! A Signal is the fundamental reactive primitive. It holds a value and
//! tracks which effects depend on it.
//!
//! # How Signals Work
//!
//! 1. When a signal is read while an effect is executing, the effect is
//!    subscribed to the signal (and the signal recorded as one of the
//!    effect's sources).
//!
//! 2. When a signal is written with a value that differs from the current
//!    one, every subscribed effect is re-executed synchronously, in
//!    subscription order, over a snapshot taken before the first one runs.
//!
//! 3. Writing a strictly equal value does nothing. Scalars and strings
//!    compare by value; shared and collection values by identity (see
//!    [`StrictEq`]), so a freshly built `Vec` is always a change.
//!
//! # Handles
//!
//! `Signal<T>` is a `Copy` handle into the thread-local arena. The value
//! lives until [`Signal::dispose`] is called; reads after that fail with
//! [`ReactiveError::SignalDisposed`].

use std::any::Any;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::rc::Rc;

use super::context::ReactiveContext;
use super::effect::run_effect;
use super::runtime::{try_with_runtime, with_runtime, SignalId};
use super::strict_eq::StrictEq;
use crate::error::ReactiveError;

/// A reactive cell holding a value of type `T`.
///
/// # Example
///
/// ```rust
/// use toys_core::reactive::{create_effect, Signal};
///
/// let count = Signal::new(0);
/// create_effect(move || println!("count is {}", count.get()));
///
/// count.set(5); // prints "count is 5"
/// count.set(5); // equal value, nothing runs
/// ```
pub struct Signal<T> {
    id: SignalId,
    _phantom: PhantomData<fn() -> T>,
}

impl<T> Copy for Signal<T> {}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> PartialEq for Signal<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for Signal<T> {}

impl<T> Hash for Signal<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<T: 'static> Signal<T> {
    /// Create a new signal with the given initial value.
    pub fn new(value: T) -> Self {
        let id = with_runtime(|rt| rt.insert_signal(Rc::new(value)));
        Self {
            id,
            _phantom: PhantomData,
        }
    }

    /// Get the signal's arena handle.
    pub fn id(&self) -> SignalId {
        self.id
    }

    /// Split into a read half and a write half.
    pub fn split(self) -> (ReadSignal<T>, WriteSignal<T>) {
        (ReadSignal { inner: self }, WriteSignal { inner: self })
    }

    /// A read-only view of this signal.
    pub fn read_only(self) -> ReadSignal<T> {
        ReadSignal { inner: self }
    }

    fn load(&self, track: bool) -> Result<Rc<T>, ReactiveError> {
        let observer = if track {
            ReactiveContext::current_effect()
        } else {
            None
        };
        let value = with_runtime(|rt| rt.read(self.id, observer))
            .ok_or(ReactiveError::SignalDisposed(self.id))?;
        downcast(self.id, value)
    }

    /// Read the value with a closure, tracking the read.
    ///
    /// The closure runs without the arena borrowed, so it may read other
    /// signals.
    pub fn try_with<R>(&self, f: impl FnOnce(&T) -> R) -> Result<R, ReactiveError> {
        let value = self.load(true)?;
        Ok(f(&value))
    }

    /// Read the value with a closure, tracking the read.
    ///
    /// # Panics
    ///
    /// Panics if the signal has been disposed.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.try_with(f).unwrap_or_else(|err| panic!("{err}"))
    }

    /// Read the value with a closure without subscribing the current effect.
    pub fn with_untracked<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        let value = self.load(false).unwrap_or_else(|err| panic!("{err}"));
        f(&value)
    }

    /// Get a clone of the current value, tracking the read.
    pub fn try_get(&self) -> Result<T, ReactiveError>
    where
        T: Clone,
    {
        self.try_with(T::clone)
    }

    /// Get a clone of the current value, tracking the read.
    ///
    /// # Panics
    ///
    /// Panics if the signal has been disposed.
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.with(T::clone)
    }

    /// Get a clone of the current value without tracking the read.
    pub fn get_untracked(&self) -> T
    where
        T: Clone,
    {
        self.with_untracked(T::clone)
    }

    /// Set a new value and notify subscribers.
    ///
    /// Does nothing when the new value is strictly equal to the current one
    /// (see [`StrictEq`]). Otherwise
    /// every effect subscribed at this moment re-executes before `set`
    /// returns. A panic in one of them unwinds out of `set` and the
    /// remaining effects of this pass do not run.
    pub fn set(&self, value: T)
    where
        T: StrictEq,
    {
        let Some(current) = with_runtime(|rt| rt.read(self.id, None)) else {
            tracing::warn!(signal = ?self.id, "write to a disposed signal ignored");
            return;
        };
        if current
            .downcast_ref::<T>()
            .is_some_and(|current| current.strict_eq(&value))
        {
            return;
        }
        drop(current);

        let Some((previous, subscribers)) =
            with_runtime(|rt| rt.replace_value(self.id, Rc::new(value)))
        else {
            return;
        };
        drop(previous);

        for effect in subscribers {
            run_effect(effect);
        }
    }

    /// Update the value from a clone of the current one.
    ///
    /// The write goes through [`Signal::set`], so an update that leaves a
    /// scalar unchanged notifies nobody.
    pub fn update(&self, f: impl FnOnce(&mut T))
    where
        T: Clone + StrictEq,
    {
        let mut next = self.get_untracked();
        f(&mut next);
        self.set(next);
    }

    /// Number of effects currently subscribed.
    pub fn subscriber_count(&self) -> usize {
        with_runtime(|rt| rt.subscriber_count(self.id))
    }

    /// Whether the slot still exists.
    pub fn is_alive(&self) -> bool {
        with_runtime(|rt| rt.contains_signal(self.id))
    }

    /// Release the slot and detach every subscriber.
    pub fn dispose(self) {
        let released = try_with_runtime(|rt| rt.remove_signal(self.id));
        drop(released);
    }
}

impl Signal<bool> {
    /// Flip a boolean signal.
    pub fn toggle(&self) {
        self.update(|v| *v = !*v);
    }
}

fn downcast<T: 'static>(id: SignalId, value: Rc<dyn Any>) -> Result<Rc<T>, ReactiveError> {
    value
        .downcast::<T>()
        .map_err(|_| ReactiveError::TypeMismatch(id))
}

impl<T: 'static + fmt::Debug> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("Signal");
        debug.field("id", &self.id);
        match self.load(false) {
            Ok(value) => debug.field("value", &*value),
            Err(_) => debug.field("value", &"<disposed>"),
        };
        debug.finish()
    }
}

/// The read half of a signal.
pub struct ReadSignal<T> {
    inner: Signal<T>,
}

impl<T> Copy for ReadSignal<T> {}

impl<T> Clone for ReadSignal<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> PartialEq for ReadSignal<T> {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl<T> Eq for ReadSignal<T> {}

impl<T: 'static> ReadSignal<T> {
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.inner.get()
    }

    pub fn try_get(&self) -> Result<T, ReactiveError>
    where
        T: Clone,
    {
        self.inner.try_get()
    }

    pub fn get_untracked(&self) -> T
    where
        T: Clone,
    {
        self.inner.get_untracked()
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.inner.with(f)
    }

    pub fn with_untracked<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.inner.with_untracked(f)
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscriber_count()
    }

    pub fn id(&self) -> SignalId {
        self.inner.id
    }
}

impl<T: 'static + fmt::Debug> fmt::Debug for ReadSignal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.inner.fmt(f)
    }
}

/// The write half of a signal.
pub struct WriteSignal<T> {
    inner: Signal<T>,
}

impl<T> Copy for WriteSignal<T> {}

impl<T> Clone for WriteSignal<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: 'static + StrictEq> WriteSignal<T> {
    pub fn set(&self, value: T) {
        self.inner.set(value);
    }

    pub fn update(&self, f: impl FnOnce(&mut T))
    where
        T: Clone,
    {
        self.inner.update(f);
    }
}

/// Create a signal and return its read and write halves.
pub fn create_signal<T: 'static>(initial: T) -> (ReadSignal<T>, WriteSignal<T>) {
    Signal::new(initial).split()
}
