//! Reactive Context
//!
//! The effect stack records which effect is currently executing so that a
//! signal read can be attributed to it.
//!
//! # Implementation
//!
//! A thread-local stack of frames. Running an effect pushes a frame holding
//! its id; `untrack` pushes an empty frame so reads inside it subscribe
//! nothing. The innermost frame is the current one, which is what makes
//! nested effects attribute reads correctly.
//!
//! Frames are popped by a guard's `Drop`, so the stack unwinds correctly even
//! when an effect body panics.

use std::cell::RefCell;

use super::runtime::EffectId;

thread_local! {
    static EFFECT_STACK: RefCell<Vec<Option<EffectId>>> = const { RefCell::new(Vec::new()) };
}

/// Guard that pops its frame when dropped.
pub struct ReactiveContext {
    frame: Option<EffectId>,
}

impl ReactiveContext {
    /// Make `effect` the current effect until the guard drops.
    pub fn enter(effect: EffectId) -> Self {
        Self::push(Some(effect))
    }

    /// Suspend tracking until the guard drops.
    pub fn suspend() -> Self {
        Self::push(None)
    }

    fn push(frame: Option<EffectId>) -> Self {
        EFFECT_STACK.with(|stack| stack.borrow_mut().push(frame));
        Self { frame }
    }

    /// The effect a signal read should be attributed to, if any.
    pub fn current_effect() -> Option<EffectId> {
        EFFECT_STACK.with(|stack| stack.borrow().last().copied().flatten())
    }

    /// Whether a read right now would be tracked.
    pub fn is_active() -> bool {
        Self::current_effect().is_some()
    }

    /// Number of frames on the stack.
    pub fn depth() -> usize {
        EFFECT_STACK.with(|stack| stack.borrow().len())
    }
}

impl Drop for ReactiveContext {
    fn drop(&mut self) {
        let _ = EFFECT_STACK.try_with(|stack| {
            let popped = stack.borrow_mut().pop();
            debug_assert_eq!(
                popped,
                Some(self.frame),
                "ReactiveContext mismatch: expected {:?}, got {:?}",
                self.frame,
                popped
            );
        });
    }
}

/// Run `f` without attributing any signal reads to the current effect.
pub fn untrack<R>(f: impl FnOnce() -> R) -> R {
    let _frame = ReactiveContext::suspend();
    f()
}
