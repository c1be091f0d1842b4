//! Integration Tests for the Signal Engine
//!
//! These tests verify that signals and effects work together correctly:
//! change detection, dynamic dependencies, nesting and failure behavior.

use std::cell::{Cell, RefCell};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::rc::Rc;

use toys_core::reactive::{
    arena_len, create_effect, create_signal, untrack, Cleanup, ReactiveContext, Signal,
};

fn counter() -> (Rc<Cell<usize>>, Rc<Cell<usize>>) {
    let count = Rc::new(Cell::new(0));
    (count.clone(), count)
}

/// Test that an effect re-runs exactly once per differing write.
#[test]
fn effect_runs_once_per_change() {
    let (read, write) = create_signal(0);
    let (runs, inc) = counter();
    create_effect(move || {
        read.get();
        inc.set(inc.get() + 1);
    });

    for value in [1, 1, 2, 2, 2, 3, 1] {
        write.set(value);
    }
    // Initial run plus the writes 1, 2, 3, 1.
    assert_eq!(runs.get(), 5);
}

/// Test that writes compare references by identity, not by contents.
#[test]
fn same_reference_is_not_a_change() {
    let shared = Rc::new(vec![1, 2, 3]);
    let signal = Signal::new(shared.clone());
    let (runs, inc) = counter();
    create_effect(move || {
        signal.with(|_| ());
        inc.set(inc.get() + 1);
    });

    signal.set(shared.clone());
    signal.set(shared);
    assert_eq!(runs.get(), 1);

    // Equal contents in a new allocation.
    signal.set(Rc::new(vec![1, 2, 3]));
    assert_eq!(runs.get(), 2);
}

/// Test that dependencies are recomputed on every run.
#[test]
fn dependencies_follow_the_last_run() {
    let use_a = Signal::new(true);
    let a = Signal::new(0);
    let b = Signal::new(0);
    let (runs, inc) = counter();
    let effect = create_effect(move || {
        inc.set(inc.get() + 1);
        if use_a.get() {
            a.get();
        } else {
            b.get();
        }
    });
    assert_eq!(effect.dependency_count(), 2);

    use_a.set(false);
    assert_eq!(runs.get(), 2);
    assert_eq!(a.subscriber_count(), 0);

    // Only the branch read last retriggers.
    a.set(1);
    assert_eq!(runs.get(), 2);
    b.set(1);
    assert_eq!(runs.get(), 3);

    use_a.set(true);
    b.set(2);
    assert_eq!(runs.get(), 4);
    a.set(2);
    assert_eq!(runs.get(), 5);
}

/// Test that the outer effect is current again after a nested effect's
/// first run, even when that run panics.
#[test]
fn nested_effect_restores_outer_after_panic() {
    let after = Signal::new(0);
    let (runs, inc) = counter();
    let outer = create_effect(move || {
        inc.set(inc.get() + 1);
        let depth = ReactiveContext::depth();
        let result = catch_unwind(AssertUnwindSafe(|| {
            create_effect::<_, ()>(|| panic!("inner effect failed"));
        }));
        assert!(result.is_err());
        assert_eq!(ReactiveContext::depth(), depth);
        // Attributed to the outer effect.
        after.get();
    });

    assert_eq!(after.subscriber_count(), 1);
    after.set(1);
    assert_eq!(runs.get(), 2);
    assert_eq!(outer.run_count(), 2);
    assert_eq!(ReactiveContext::depth(), 0);
}

/// Test that a nested effect subscribes itself, not its parent.
#[test]
fn nested_effect_reads_are_its_own() {
    let inner_source = Signal::new(0);
    let (outer_runs, outer_inc) = counter();
    let (inner_runs, inner_inc) = counter();
    create_effect(move || {
        outer_inc.set(outer_inc.get() + 1);
        let inner_inc = inner_inc.clone();
        create_effect(move || {
            inner_source.get();
            inner_inc.set(inner_inc.get() + 1);
        });
    });

    inner_source.set(1);
    assert_eq!(outer_runs.get(), 1);
    assert_eq!(inner_runs.get(), 2);
}

/// Test that a panicking effect aborts the rest of the notification pass
/// and leaves the engine usable.
#[test]
fn panic_aborts_the_notification_pass() {
    let source = Signal::new(0);
    let log = Rc::new(RefCell::new(Vec::new()));

    let first = log.clone();
    create_effect(move || {
        source.get();
        first.borrow_mut().push("first");
    });
    let second = log.clone();
    create_effect(move || {
        if source.get() == 1 {
            panic!("second effect failed");
        }
        second.borrow_mut().push("second");
    });
    let third = log.clone();
    create_effect(move || {
        source.get();
        third.borrow_mut().push("third");
    });
    log.borrow_mut().clear();

    let result = catch_unwind(AssertUnwindSafe(|| source.set(1)));
    assert!(result.is_err());
    assert_eq!(*log.borrow(), vec!["first"]);
    assert_eq!(ReactiveContext::depth(), 0);

    log.borrow_mut().clear();
    source.set(2);
    assert_eq!(*log.borrow(), vec!["first", "second", "third"]);
}

/// Test that subscribers added during a notification pass wait for the
/// next write.
#[test]
fn notification_uses_a_snapshot() {
    let source = Signal::new(0);
    let (late_runs, late_inc) = counter();
    let spawned = Rc::new(Cell::new(false));
    let flag = spawned.clone();
    create_effect(move || {
        if source.get() == 1 && !flag.get() {
            flag.set(true);
            let late_inc = late_inc.clone();
            create_effect(move || {
                source.get();
                late_inc.set(late_inc.get() + 1);
            });
        }
    });

    source.set(1);
    // Only the creation run, not a second one from the same pass.
    assert_eq!(late_runs.get(), 1);
    source.set(2);
    assert_eq!(late_runs.get(), 2);
}

/// Test that a write inside an effect re-enters dependents immediately.
#[test]
fn writes_inside_effects_propagate_synchronously() {
    let input = Signal::new(1);
    let doubled = Signal::new(0);
    let seen = Rc::new(RefCell::new(Vec::new()));

    create_effect(move || doubled.set(input.get() * 2));
    let log = seen.clone();
    create_effect(move || log.borrow_mut().push(doubled.get()));

    input.set(5);
    assert_eq!(*seen.borrow(), vec![2, 10]);
}

/// Test that untracked reads do not subscribe.
#[test]
fn untracked_reads_do_not_subscribe() {
    let tracked = Signal::new(0);
    let ignored = Signal::new(0);
    let (runs, inc) = counter();
    create_effect(move || {
        tracked.get();
        untrack(|| ignored.get());
        ignored.get_untracked();
        inc.set(inc.get() + 1);
    });

    ignored.set(1);
    assert_eq!(runs.get(), 1);
    tracked.set(1);
    assert_eq!(runs.get(), 2);
}

/// Test that disposal releases arena slots and runs the last cleanup.
#[test]
fn dispose_releases_slots() {
    let (signals, effects) = arena_len();
    let source = Signal::new(0);
    let cleaned = Rc::new(Cell::new(false));
    let flag = cleaned.clone();
    let effect = create_effect(move || {
        source.get();
        let flag = flag.clone();
        Cleanup::new(move || flag.set(true))
    });
    assert_eq!(arena_len(), (signals + 1, effects + 1));

    effect.dispose();
    source.dispose();
    assert!(cleaned.get());
    assert_eq!(arena_len(), (signals, effects));
}
