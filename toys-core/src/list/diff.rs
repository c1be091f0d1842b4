//! Positional reconciliation.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use crate::dom::Node;
use crate::error::DomError;
use crate::reactive::{create_effect, Effect, ReadSignal};

/// Builds the node for one entry: `(record, index, list)`.
pub type RenderItem<T> = Rc<dyn Fn(&T, usize, &[T]) -> Result<Node, DomError>>;

/// Updates an existing node in place: `(node, record, index, list)`.
pub type UpdateItem<T> = Rc<dyn Fn(&Node, &T, usize, &[T]) -> Result<(), DomError>>;

/// A container plus the functions that keep its children in step with a
/// list.
pub struct ListBinding<T> {
    pub container: Node,
    pub render: RenderItem<T>,
    pub update: Option<UpdateItem<T>>,
}

impl<T> Clone for ListBinding<T> {
    fn clone(&self) -> Self {
        Self {
            container: self.container.clone(),
            render: self.render.clone(),
            update: self.update.clone(),
        }
    }
}

impl<T> ListBinding<T> {
    pub fn new(
        container: Node,
        render: impl Fn(&T, usize, &[T]) -> Result<Node, DomError> + 'static,
    ) -> Self {
        Self {
            container,
            render: Rc::new(render),
            update: None,
        }
    }

    /// Update existing nodes in place instead of re-rendering everything.
    pub fn with_update(
        mut self,
        update: impl Fn(&Node, &T, usize, &[T]) -> Result<(), DomError> + 'static,
    ) -> Self {
        self.update = Some(Rc::new(update));
        self
    }
}

impl<T> fmt::Debug for ListBinding<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListBinding")
            .field("container", &self.container)
            .field("update", &self.update.is_some())
            .finish()
    }
}

/// Bring the container's children from a list of `previous_len` entries to
/// `current`, by position.
///
/// Without an update function every child is removed and every entry
/// rendered again. With one, index `i` is updated in place when both lists
/// have it, rendered when only `current` has it, and removed when only the
/// previous list had it. New nodes are appended together at the end.
pub fn reconcile<T>(binding: &ListBinding<T>, previous_len: usize, current: &[T]) -> Result<(), DomError> {
    let container = &binding.container;
    let document = container.owner_document().ok_or(DomError::NoOwnerDocument)?;
    let fragment = document.create_document_fragment();

    match &binding.update {
        None => {
            container.clear_children();
            for (index, record) in current.iter().enumerate() {
                fragment.append_child(&(binding.render)(record, index, current)?)?;
            }
        }
        Some(update) => {
            let children = container.child_nodes();
            for index in 0..previous_len.max(current.len()) {
                let node = children.get(index);
                if index < previous_len && index < current.len() {
                    if let Some(node) = node {
                        update(node, &current[index], index, current)?;
                    }
                } else if index < current.len() {
                    fragment.append_child(&(binding.render)(&current[index], index, current)?)?;
                } else if let Some(node) = node {
                    node.remove();
                }
            }
        }
    }

    tracing::trace!(
        container = ?container,
        previous_len,
        current_len = current.len(),
        "list reconciled"
    );
    container.append_child(&fragment)
}

/// Options for [`diff`].
pub struct DiffOptions<T> {
    pub binding: ListBinding<T>,
    pub data: ReadSignal<Vec<T>>,
}

/// Keep the binding's container in step with `data`.
///
/// The returned effect renders the initial list right away and reconciles
/// after every change. Dispose it to stop.
pub fn diff<T: 'static>(options: DiffOptions<T>) -> Effect {
    let DiffOptions { binding, data } = options;
    let previous_len = Cell::new(0);

    create_effect(move || {
        let result = data.with(|current| {
            let result = reconcile(&binding, previous_len.get(), current);
            previous_len.set(current.len());
            result
        });
        if let Err(error) = result {
            tracing::error!(%error, "list reconciliation failed");
        }
    })
}
