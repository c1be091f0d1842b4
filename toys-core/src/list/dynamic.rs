//! Imperative list mutations with direct DOM side effects.

use std::fmt;

use super::diff::{reconcile, ListBinding};
use crate::dom::Node;
use crate::error::{DomError, ListError};
use crate::reactive::{ReadSignal, Signal};

/// A list signal plus an optional bound container.
///
/// Every operation copies the current list, applies the change, performs
/// the matching DOM mutation on the container, then writes the copy back to
/// the signal. The copy is a new list, so every successful operation
/// notifies subscribers, even when the contents end up equal. Reorders re-render: `move_item` discards the node at the old
/// position and renders a fresh one at the new position.
pub struct DynamicList<T> {
    list: Signal<Vec<T>>,
    binding: Option<ListBinding<T>>,
}

impl<T> Clone for DynamicList<T> {
    fn clone(&self) -> Self {
        Self {
            list: self.list,
            binding: self.binding.clone(),
        }
    }
}

/// Create a dynamic list, optionally bound to a container.
pub fn use_dynamic_list<T>(initial: Vec<T>, binding: Option<ListBinding<T>>) -> DynamicList<T>
where
    T: Clone + 'static,
{
    DynamicList::new(initial, binding)
}

impl<T: Clone + 'static> DynamicList<T> {
    pub fn new(initial: Vec<T>, binding: Option<ListBinding<T>>) -> Self {
        Self {
            list: Signal::new(initial),
            binding,
        }
    }

    /// The backing signal.
    pub fn value(&self) -> ReadSignal<Vec<T>> {
        self.list.read_only()
    }

    pub fn len(&self) -> usize {
        self.list.with_untracked(Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn binding(&self) -> Option<&ListBinding<T>> {
        self.binding.as_ref()
    }

    fn snapshot(&self) -> Vec<T> {
        self.list.get_untracked()
    }

    /// `index` must address an entry, or one past the end when `append` is set.
    fn check(index: usize, len: usize, append: bool) -> Result<(), ListError> {
        if index < len || (append && index == len) {
            Ok(())
        } else {
            Err(ListError::IndexOutOfBounds { index, len })
        }
    }

    fn render(binding: &ListBinding<T>, list: &[T], index: usize) -> Result<Node, DomError> {
        (binding.render)(&list[index], index, list)
    }

    /// Append an entry.
    pub fn push(&self, item: T) -> Result<(), ListError> {
        let mut next = self.snapshot();
        next.push(item);
        if let Some(binding) = &self.binding {
            let node = Self::render(binding, &next, next.len() - 1)?;
            binding.container.append_child(&node)?;
        }
        self.list.set(next);
        Ok(())
    }

    /// Remove the last entry. Empty lists are left alone.
    pub fn pop(&self) -> Result<(), ListError> {
        let mut next = self.snapshot();
        if next.pop().is_none() {
            return Ok(());
        }
        if let Some(binding) = &self.binding {
            if let Some(node) = binding.container.last_child() {
                node.remove();
            }
        }
        self.list.set(next);
        Ok(())
    }

    /// Remove the first entry. Empty lists are left alone.
    pub fn shift(&self) -> Result<(), ListError> {
        if self.is_empty() {
            return Ok(());
        }
        self.remove(0)
    }

    /// Prepend an entry.
    pub fn unshift(&self, item: T) -> Result<(), ListError> {
        self.insert(0, item)
    }

    /// Insert at `index`, which may equal the length.
    pub fn insert(&self, index: usize, item: T) -> Result<(), ListError> {
        let mut next = self.snapshot();
        Self::check(index, next.len(), true)?;
        next.insert(index, item);
        if let Some(binding) = &self.binding {
            let node = Self::render(binding, &next, index)?;
            let reference = binding.container.child_at(index);
            binding.container.insert_before(&node, reference.as_ref())?;
        }
        self.list.set(next);
        Ok(())
    }

    pub fn remove(&self, index: usize) -> Result<(), ListError> {
        let mut next = self.snapshot();
        Self::check(index, next.len(), false)?;
        next.remove(index);
        if let Some(binding) = &self.binding {
            if let Some(node) = binding.container.child_at(index) {
                node.remove();
            }
        }
        self.list.set(next);
        Ok(())
    }

    /// Replace the entry at `index`, updating its node in place when an
    /// update function exists and swapping in a fresh node otherwise.
    ///
    /// Fails with [`DomError::NotFound`] when the container has no node at
    /// `index`, leaving the list untouched.
    pub fn replace(&self, index: usize, item: T) -> Result<(), ListError> {
        let mut next = self.snapshot();
        Self::check(index, next.len(), false)?;
        next[index] = item;
        if let Some(binding) = &self.binding {
            let Some(node) = binding.container.child_at(index) else {
                tracing::warn!(
                    container = ?binding.container,
                    index,
                    children = binding.container.child_count(),
                    "list container out of step"
                );
                return Err(DomError::NotFound.into());
            };
            match &binding.update {
                Some(update) => update(&node, &next[index], index, &next)?,
                None => {
                    let fresh = Self::render(binding, &next, index)?;
                    binding.container.replace_child(&fresh, &node)?;
                }
            }
        }
        self.list.set(next);
        Ok(())
    }

    /// Insert several entries starting at `index`.
    pub fn merge(&self, index: usize, items: Vec<T>) -> Result<(), ListError> {
        let mut next = self.snapshot();
        Self::check(index, next.len(), true)?;
        let count = items.len();
        next.splice(index..index, items);
        if let Some(binding) = &self.binding {
            let document = binding
                .container
                .owner_document()
                .ok_or(DomError::NoOwnerDocument)?;
            let fragment = document.create_document_fragment();
            for offset in 0..count {
                fragment.append_child(&Self::render(binding, &next, index + offset)?)?;
            }
            let reference = binding.container.child_at(index);
            binding.container.insert_before(&fragment, reference.as_ref())?;
        }
        self.list.set(next);
        Ok(())
    }

    /// Move the entry at `from` so that it ends up at `to`.
    pub fn move_item(&self, from: usize, to: usize) -> Result<(), ListError> {
        let mut next = self.snapshot();
        Self::check(from, next.len(), false)?;
        Self::check(to, next.len(), false)?;
        let item = next.remove(from);
        next.insert(to, item);
        if let Some(binding) = &self.binding {
            let fresh = Self::render(binding, &next, to)?;
            if let Some(old) = binding.container.child_at(from) {
                old.remove();
            }
            let reference = binding.container.child_at(to);
            binding.container.insert_before(&fresh, reference.as_ref())?;
        }
        self.list.set(next);
        Ok(())
    }

    pub fn clear(&self) -> Result<(), ListError> {
        if let Some(binding) = &self.binding {
            binding.container.clear_children();
        }
        self.list.set(Vec::new());
        Ok(())
    }

    /// Replace the whole list, reconciling the container by position.
    pub fn reset_list(&self, value: Vec<T>) -> Result<(), ListError> {
        if let Some(binding) = &self.binding {
            reconcile(binding, self.len(), &value)?;
        }
        self.list.set(value);
        Ok(())
    }
}

impl<T: fmt::Debug + 'static> fmt::Debug for DynamicList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicList")
            .field("list", &self.list)
            .field("binding", &self.binding)
            .finish()
    }
}
