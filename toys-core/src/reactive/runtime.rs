//! Reactive Runtime
//!
//! The runtime owns every signal and effect on the current thread. Both live
//! in generational arenas and refer to each other only through stable
//! handles, so the observer graph (signals know their effects, effects know
//! their signals) never forms reference cycles.
//!
//! # Edges
//!
//! A subscription is a two-way edge:
//!
//! - the signal's subscriber set gains the effect
//! - the effect's source list gains the signal
//!
//! Keeping both ends lets an effect detach itself from every signal it read
//! before it re-runs, which is what makes conditional dependencies work.
//!
//! # Borrowing
//!
//! The runtime sits behind a thread-local `RefCell`. Every method here is a
//! short, non-reentrant bookkeeping step. User code (effect bodies, cleanups,
//! value destructors) always runs after the borrow has been released; methods
//! that remove something hand it back to the caller so it is dropped outside.

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexSet;
use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;

use super::effect::Cleanup;

new_key_type! {
    /// Stable handle to a signal slot.
    pub struct SignalId;

    /// Stable handle to an effect slot.
    pub struct EffectId;
}

/// The body of an effect, type-erased.
pub(crate) type EffectFn = Rc<dyn Fn() -> Option<Cleanup>>;

/// A signal's value and the effects subscribed to it.
pub(crate) struct SignalSlot {
    pub(crate) value: Rc<dyn Any>,
    /// Insertion-ordered, like the `Set` it mirrors.
    subscribers: IndexSet<EffectId>,
}

/// An effect's body, its current sources and the cleanup from its last run.
pub(crate) struct EffectSlot {
    run: EffectFn,
    sources: SmallVec<[SignalId; 4]>,
    cleanup: Option<Cleanup>,
    runs: usize,
}

/// Everything released when a slot is disposed. Dropped by the caller.
pub(crate) struct Released {
    _value: Option<Rc<dyn Any>>,
    _run: Option<EffectFn>,
    pub(crate) cleanup: Option<Cleanup>,
}

/// The thread-local reactive arena.
pub(crate) struct Runtime {
    signals: SlotMap<SignalId, SignalSlot>,
    effects: SlotMap<EffectId, EffectSlot>,
}

impl Runtime {
    fn new() -> Self {
        Self {
            signals: SlotMap::with_key(),
            effects: SlotMap::with_key(),
        }
    }

    // ------------------------------------------------------------------
    // Signals
    // ------------------------------------------------------------------

    pub(crate) fn insert_signal(&mut self, value: Rc<dyn Any>) -> SignalId {
        self.signals.insert(SignalSlot {
            value,
            subscribers: IndexSet::new(),
        })
    }

    /// Read a signal's value, subscribing `observer` if one is running.
    pub(crate) fn read(&mut self, id: SignalId, observer: Option<EffectId>) -> Option<Rc<dyn Any>> {
        let value = self.signals.get(id).map(|slot| Rc::clone(&slot.value))?;
        if let Some(effect) = observer {
            self.add_edge(id, effect);
        }
        Some(value)
    }

    /// Swap in a new value, returning the old one and a snapshot of the
    /// subscribers to notify.
    pub(crate) fn replace_value(
        &mut self,
        id: SignalId,
        value: Rc<dyn Any>,
    ) -> Option<(Rc<dyn Any>, Vec<EffectId>)> {
        let slot = self.signals.get_mut(id)?;
        let previous = std::mem::replace(&mut slot.value, value);
        let snapshot = slot.subscribers.iter().copied().collect();
        Some((previous, snapshot))
    }

    pub(crate) fn contains_signal(&self, id: SignalId) -> bool {
        self.signals.contains_key(id)
    }

    pub(crate) fn subscriber_count(&self, id: SignalId) -> usize {
        self.signals
            .get(id)
            .map(|slot| slot.subscribers.len())
            .unwrap_or(0)
    }

    /// Remove a signal and every edge pointing at it.
    pub(crate) fn remove_signal(&mut self, id: SignalId) -> Option<Released> {
        let slot = self.signals.remove(id)?;
        for effect in &slot.subscribers {
            if let Some(effect) = self.effects.get_mut(*effect) {
                effect.sources.retain(|source| *source != id);
            }
        }
        Some(Released {
            _value: Some(slot.value),
            _run: None,
            cleanup: None,
        })
    }

    // ------------------------------------------------------------------
    // Edges
    // ------------------------------------------------------------------

    /// Subscribe `effect` to `signal`. Idempotent.
    pub(crate) fn add_edge(&mut self, signal: SignalId, effect: EffectId) {
        let Some(effect_slot) = self.effects.get_mut(effect) else {
            return;
        };
        let Some(signal_slot) = self.signals.get_mut(signal) else {
            return;
        };
        if signal_slot.subscribers.insert(effect) {
            effect_slot.sources.push(signal);
        }
    }

    /// Remove a single subscription edge.
    pub(crate) fn remove_edge(&mut self, signal: SignalId, effect: EffectId) {
        if let Some(slot) = self.signals.get_mut(signal) {
            slot.subscribers.shift_remove(&effect);
        }
        if let Some(slot) = self.effects.get_mut(effect) {
            slot.sources.retain(|source| *source != signal);
        }
    }

    /// Detach an effect from every signal it currently depends on.
    pub(crate) fn detach(&mut self, effect: EffectId) {
        let sources = match self.effects.get_mut(effect) {
            Some(slot) => std::mem::take(&mut slot.sources),
            None => return,
        };
        for signal in sources {
            if let Some(slot) = self.signals.get_mut(signal) {
                slot.subscribers.shift_remove(&effect);
            }
        }
    }

    // ------------------------------------------------------------------
    // Effects
    // ------------------------------------------------------------------

    pub(crate) fn insert_effect(&mut self, run: EffectFn) -> EffectId {
        self.effects.insert(EffectSlot {
            run,
            sources: SmallVec::new(),
            cleanup: None,
            runs: 0,
        })
    }

    /// First half of an execution: detach from all sources, hand out the body
    /// and the previous cleanup.
    pub(crate) fn begin_run(&mut self, id: EffectId) -> Option<(EffectFn, Option<Cleanup>)> {
        self.detach(id);
        let slot = self.effects.get_mut(id)?;
        slot.runs += 1;
        Some((Rc::clone(&slot.run), slot.cleanup.take()))
    }

    /// Second half of an execution: store the cleanup for next time.
    ///
    /// If the effect was disposed while it ran, the cleanup is handed back so
    /// the caller can run it immediately.
    pub(crate) fn finish_run(&mut self, id: EffectId, cleanup: Option<Cleanup>) -> Option<Cleanup> {
        match self.effects.get_mut(id) {
            Some(slot) => {
                slot.cleanup = cleanup;
                None
            }
            None => cleanup,
        }
    }

    pub(crate) fn contains_effect(&self, id: EffectId) -> bool {
        self.effects.contains_key(id)
    }

    pub(crate) fn run_count(&self, id: EffectId) -> usize {
        self.effects.get(id).map(|slot| slot.runs).unwrap_or(0)
    }

    pub(crate) fn dependency_count(&self, id: EffectId) -> usize {
        self.effects.get(id).map(|slot| slot.sources.len()).unwrap_or(0)
    }

    /// Remove an effect and every edge pointing at it.
    pub(crate) fn remove_effect(&mut self, id: EffectId) -> Option<Released> {
        self.detach(id);
        let slot = self.effects.remove(id)?;
        Some(Released {
            _value: None,
            _run: Some(slot.run),
            cleanup: slot.cleanup,
        })
    }

    /// Number of live signals and effects.
    pub(crate) fn len(&self) -> (usize, usize) {
        (self.signals.len(), self.effects.len())
    }
}

thread_local! {
    static RUNTIME: RefCell<Runtime> = RefCell::new(Runtime::new());
}

/// Access the thread-local runtime.
pub(crate) fn with_runtime<R>(f: impl FnOnce(&mut Runtime) -> R) -> R {
    RUNTIME.with(|runtime| f(&mut runtime.borrow_mut()))
}

/// Access the runtime from destructors, which may run during thread teardown.
pub(crate) fn try_with_runtime<R>(f: impl FnOnce(&mut Runtime) -> R) -> Option<R> {
    RUNTIME
        .try_with(|runtime| runtime.try_borrow_mut().ok().map(|mut rt| f(&mut rt)))
        .ok()
        .flatten()
}

/// Live `(signals, effects)` on this thread.
pub fn arena_len() -> (usize, usize) {
    with_runtime(|rt| rt.len())
}
