//! Write Equality
//!
//! A signal write is skipped only when the new value is strictly equal to
//! the current one. Strict equality is value equality for scalars and
//! strings and identity for everything shared by reference:
//!
//! | Type                                   | Strictly equal when              |
//! |----------------------------------------|----------------------------------|
//! | numbers, `bool`, `char`, `()`          | `==` (so `NaN` never is)         |
//! | `String`, `&str`                       | same contents                    |
//! | `Rc<T>`                                | same allocation                  |
//! | `Vec<T>`, `IndexMap<K, V>`             | never; a new collection is a change |
//! | `Option<T>`                            | both `None`, or both `Some` and strictly equal |
//! | `Signal<T>`, `ReadSignal<T>`           | same slot                        |

use std::rc::Rc;

use indexmap::IndexMap;

use super::signal::{ReadSignal, Signal};

/// Equality used to decide whether a signal write is a change.
pub trait StrictEq {
    fn strict_eq(&self, other: &Self) -> bool;
}

macro_rules! strict_eq_by_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl StrictEq for $ty {
                #[inline]
                fn strict_eq(&self, other: &Self) -> bool {
                    self == other
                }
            }
        )*
    };
}

strict_eq_by_value!(
    (),
    bool,
    char,
    i8,
    i16,
    i32,
    i64,
    i128,
    isize,
    u8,
    u16,
    u32,
    u64,
    u128,
    usize,
    f32,
    f64,
    String,
);

impl StrictEq for &str {
    fn strict_eq(&self, other: &Self) -> bool {
        self == other
    }
}

impl<T: ?Sized> StrictEq for Rc<T> {
    fn strict_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(self, other)
    }
}

impl<T> StrictEq for Vec<T> {
    fn strict_eq(&self, _other: &Self) -> bool {
        false
    }
}

impl<K, V> StrictEq for IndexMap<K, V> {
    fn strict_eq(&self, _other: &Self) -> bool {
        false
    }
}

impl<T: StrictEq> StrictEq for Option<T> {
    fn strict_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Some(a), Some(b)) => a.strict_eq(b),
            (None, None) => true,
            _ => false,
        }
    }
}

impl<T> StrictEq for Signal<T> {
    fn strict_eq(&self, other: &Self) -> bool {
        self == other
    }
}

impl<T> StrictEq for ReadSignal<T> {
    fn strict_eq(&self, other: &Self) -> bool {
        self == other
    }
}
