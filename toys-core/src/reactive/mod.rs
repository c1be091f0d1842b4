//! Reactive Primitives
//!
//! This module implements the signal engine: signals, effects and the effect
//! stack that connects them.
//!
//! # Concepts
//!
//! ## Signals
//!
//! A Signal is a container for mutable state. When a signal is read while an
//! effect is executing, the signal records that effect as a dependent. When
//! the value changes, all dependents re-run immediately.
//!
//! ## Effects
//!
//! An Effect is a side-effecting computation. It runs once when created and
//! again whenever a signal it read on its last run changes. Its dependency
//! set is rebuilt on every run, so branches that stop reading a signal stop
//! being notified by it.
//!
//! # Implementation Notes
//!
//! Signals and effects live in a thread-local generational arena and are
//! addressed by `Copy` handles. There is no batching and no scheduler: a
//! write notifies its subscribers before it returns.

mod context;
mod effect;
mod runtime;
mod signal;
mod strict_eq;

pub use context::{untrack, ReactiveContext};
pub use effect::{create_effect, Cleanup, Effect, IntoCleanup};
pub use runtime::{arena_len, EffectId, SignalId};
pub use signal::{create_signal, ReadSignal, Signal, WriteSignal};
pub use strict_eq::StrictEq;
