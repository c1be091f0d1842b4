//! List Reconciliation
//!
//! Keyless, index-aligned rendering of a list into a container's children.
//!
//! - [`diff`] drives a container from a list signal with an effect.
//! - [`DynamicList`] owns a list signal and mirrors each imperative
//!   mutation (`push`, `remove`, `move_item`, ...) onto the container
//!   directly.
//!
//! Nodes are matched to entries by position only. Reorders re-render rather
//! than relocate, so node identity is not preserved across a move.

mod diff;
mod dynamic;

pub use diff::{diff, reconcile, DiffOptions, ListBinding, RenderItem, UpdateItem};
pub use dynamic::{use_dynamic_list, DynamicList};
