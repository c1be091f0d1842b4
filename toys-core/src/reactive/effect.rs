//! Effect Implementation
//!
//! An Effect is a side-effecting computation that re-runs whenever a signal
//! it read during its last run changes.
//!
//! # How Effects Work
//!
//! Every execution, including the first one (which happens synchronously
//! inside [`create_effect`]):
//!
//! 1. detaches the effect from every signal it is subscribed to, so the
//!    dependency set is rebuilt from scratch
//! 2. pushes the effect onto the effect stack
//! 3. runs the cleanup returned by the previous execution, if any
//! 4. runs the body, keeping whatever cleanup it returns for next time
//! 5. pops the effect stack, also when the body panics
//!
//! # Re-entrancy
//!
//! Propagation is synchronous and depth-first. A body that writes a signal
//! re-enters every dependent effect immediately, including itself. Nothing
//! guards against cycles: an effect that unconditionally writes a signal it
//! reads recurses until the stack overflows, so breaking such loops is the
//! caller's job.

use std::fmt;
use std::rc::Rc;

use super::context::ReactiveContext;
use super::runtime::{try_with_runtime, with_runtime, EffectFn, EffectId};

/// Teardown returned by an effect body or a connected callback.
pub struct Cleanup(Box<dyn FnOnce()>);

impl Cleanup {
    pub fn new(f: impl FnOnce() + 'static) -> Self {
        Self(Box::new(f))
    }

    /// Consume and run the teardown.
    pub fn run(self) {
        (self.0)()
    }
}

impl fmt::Debug for Cleanup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Cleanup")
    }
}

/// What an effect body may return.
pub trait IntoCleanup {
    fn into_cleanup(self) -> Option<Cleanup>;
}

impl IntoCleanup for () {
    fn into_cleanup(self) -> Option<Cleanup> {
        None
    }
}

impl IntoCleanup for Cleanup {
    fn into_cleanup(self) -> Option<Cleanup> {
        Some(self)
    }
}

impl IntoCleanup for Option<Cleanup> {
    fn into_cleanup(self) -> Option<Cleanup> {
        self
    }
}

/// Handle to a live effect.
///
/// Effects are not tied to the handle's lifetime: dropping an `Effect` leaves
/// the computation subscribed. Call [`Effect::dispose`] (typically from a
/// disconnected callback) to release it.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Effect {
    id: EffectId,
}

impl Effect {
    /// Create an effect and run it once, synchronously.
    pub fn new<F, R>(f: F) -> Self
    where
        F: Fn() -> R + 'static,
        R: IntoCleanup,
    {
        let run: EffectFn = Rc::new(move || f().into_cleanup());
        let id = with_runtime(|rt| rt.insert_effect(run));
        run_effect(id);
        Self { id }
    }

    /// Get the effect's arena handle.
    pub fn id(&self) -> EffectId {
        self.id
    }

    /// Re-run the effect now, as if one of its sources had changed.
    pub fn execute(&self) {
        run_effect(self.id);
    }

    /// Detach from every source, release the slot and run the pending
    /// cleanup. Later notifications skip the effect.
    pub fn dispose(self) {
        let released = try_with_runtime(|rt| rt.remove_effect(self.id)).flatten();
        if let Some(released) = released {
            if let Some(cleanup) = released.cleanup {
                cleanup.run();
            }
        }
    }

    /// Whether the effect has not been disposed.
    pub fn is_alive(&self) -> bool {
        with_runtime(|rt| rt.contains_effect(self.id))
    }

    /// Number of times the body has run.
    pub fn run_count(&self) -> usize {
        with_runtime(|rt| rt.run_count(self.id))
    }

    /// Number of signals the last run subscribed to.
    pub fn dependency_count(&self) -> usize {
        with_runtime(|rt| rt.dependency_count(self.id))
    }
}

impl fmt::Debug for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Effect")
            .field("id", &self.id)
            .field("run_count", &self.run_count())
            .field("dependency_count", &self.dependency_count())
            .field("alive", &self.is_alive())
            .finish()
    }
}

/// Create an effect and run it once, synchronously.
///
/// ```rust
/// use toys_core::reactive::{create_effect, create_signal, Cleanup};
///
/// let (count, set_count) = create_signal(0);
/// create_effect(move || {
///     let value = count.get();
///     Cleanup::new(move || println!("leaving {value}"))
/// });
/// set_count.set(1); // prints "leaving 0"
/// ```
pub fn create_effect<F, R>(f: F) -> Effect
where
    F: Fn() -> R + 'static,
    R: IntoCleanup,
{
    Effect::new(f)
}

/// Execute one effect: detach, push, previous cleanup, body, pop.
pub(crate) fn run_effect(id: EffectId) {
    let Some((run, previous)) = with_runtime(|rt| rt.begin_run(id)) else {
        return;
    };
    tracing::trace!(effect = ?id, "running effect");

    let _frame = ReactiveContext::enter(id);
    if let Some(cleanup) = previous {
        cleanup.run();
    }
    let next = run();
    drop(run);

    if let Some(orphaned) = with_runtime(|rt| rt.finish_run(id, next)) {
        orphaned.run();
    }
}
