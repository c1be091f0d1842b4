//! Integration Tests for List Reconciliation
//!
//! These tests verify that list mutations keep the backing signal and the
//! container's children in step.

use std::cell::Cell;
use std::rc::Rc;

use toys_core::component::define_component;
use toys_core::dom::{Document, Node, ShadowRootInit};
use toys_core::list::{diff, use_dynamic_list, DiffOptions, DynamicList, ListBinding};
use toys_core::reactive::Signal;
use toys_core::{DomError, ListError};

fn binding<T: ToString + 'static>(doc: &Document) -> ListBinding<T> {
    let document = doc.clone();
    let container = doc.create_element("ul").unwrap();
    ListBinding::new(container, move |record: &T, _, _| {
        let li = document.create_element("li")?;
        li.set_text_content(&record.to_string());
        Ok(li)
    })
}

fn texts(container: &Node) -> Vec<String> {
    container.child_nodes().iter().map(Node::text_content).collect()
}

fn rendered<T: Clone + ToString + 'static>(doc: &Document, items: Vec<T>) -> DynamicList<T> {
    let list = use_dynamic_list(Vec::new(), Some(binding(doc)));
    list.reset_list(items).unwrap();
    list
}

/// Test that removing an entry removes exactly its node.
#[test]
fn remove_keeps_list_and_dom_aligned() {
    let doc = Document::new();
    let list = rendered(&doc, vec!["a", "b", "c"]);
    let container = list.binding().unwrap().container.clone();
    assert_eq!(container.child_count(), 3);

    list.remove(1).unwrap();
    assert_eq!(container.child_count(), 2);
    assert_eq!(texts(&container), vec!["a", "c"]);
    assert_eq!(list.value().get(), vec!["a", "c"]);
}

/// Test that a move re-renders the moved entry at its new position.
#[test]
fn move_recreates_the_moved_node() {
    let doc = Document::new();
    let list = rendered(&doc, vec![1, 2, 3]);
    let container = list.binding().unwrap().container.clone();
    let original = container.first_child().unwrap();

    list.move_item(0, 2).unwrap();
    assert_eq!(list.value().get(), vec![2, 3, 1]);
    assert_eq!(texts(&container), vec!["2", "3", "1"]);

    // Recreated, not relocated.
    assert!(original.parent_node().is_none());
    assert_ne!(container.last_child(), Some(original));
}

/// Test that out-of-range indices are rejected without side effects.
#[test]
fn out_of_range_operations_fail_cleanly() {
    let doc = Document::new();
    let list = rendered(&doc, vec![1, 2]);
    assert!(list.remove(2).is_err());
    assert!(list.move_item(0, 5).is_err());
    assert!(list.merge(3, vec![9]).is_err());
    assert_eq!(list.value().get(), vec![1, 2]);
    assert_eq!(texts(&list.binding().unwrap().container), vec!["1", "2"]);
}

/// Test that every mutation notifies the backing signal's subscribers.
#[test]
fn mutations_notify_the_backing_signal() {
    let list = use_dynamic_list(vec![1], None);
    let runs = Rc::new(Cell::new(0));
    let counter = runs.clone();
    let value = list.value();
    toys_core::reactive::create_effect(move || {
        value.get();
        counter.set(counter.get() + 1);
    });

    list.push(2).unwrap();
    list.unshift(0).unwrap();
    assert_eq!(runs.get(), 3);

    // Each write is a fresh list, even when its contents are unchanged.
    list.replace(1, 1).unwrap();
    list.reset_list(vec![0, 1, 2]).unwrap();
    list.merge(0, Vec::new()).unwrap();
    assert_eq!(list.value().get(), vec![0, 1, 2]);
    assert_eq!(runs.get(), 6);
}

/// Test that replacing an entry whose node has gone missing is an error.
#[test]
fn replace_reports_a_missing_node() {
    let doc = Document::new();
    let list = rendered(&doc, vec![1, 2, 3]);
    let container = list.binding().unwrap().container.clone();
    container.clear_children();

    assert_eq!(
        list.replace(0, 9),
        Err(ListError::Dom(DomError::NotFound))
    );
    assert_eq!(list.value().get(), vec![1, 2, 3]);
    assert_eq!(container.child_count(), 0);
}

/// Test that a declarative diff follows a list signal with in-place updates.
#[test]
fn diff_follows_a_list_signal() {
    let doc = Document::new();
    let data = Signal::new(vec!["a".to_string(), "b".to_string()]);
    let updates = Rc::new(Cell::new(0));
    let counter = updates.clone();
    let binding = binding::<String>(&doc).with_update(move |node, record: &String, _, _| {
        counter.set(counter.get() + 1);
        node.set_text_content(record);
        Ok(())
    });
    let container = binding.container.clone();

    let effect = diff(DiffOptions {
        binding,
        data: data.read_only(),
    });
    assert_eq!(texts(&container), vec!["a", "b"]);
    assert_eq!(updates.get(), 0);
    let first = container.first_child().unwrap();

    data.set(vec!["x".to_string(), "b".to_string(), "c".to_string()]);
    assert_eq!(texts(&container), vec!["x", "b", "c"]);
    assert_eq!(updates.get(), 2);
    assert_eq!(container.first_child(), Some(first));

    data.set(vec!["x".to_string()]);
    assert_eq!(texts(&container), vec!["x"]);
    effect.dispose();
}

/// Test a list rendered inside a component's shadow tree.
#[test]
fn component_owned_list() {
    let doc = Document::new();
    let items = Signal::new(vec![1, 2]);
    let document = doc.clone();
    doc.define(
        "x-list",
        define_component(move |cx| {
            let Some(root) = cx.use_shadow_root(ShadowRootInit::open()) else {
                return Ok(String::new());
            };
            let document = document.clone();
            let binding = ListBinding::new(root, move |n: &i32, index, _| {
                let li = document.create_element("li")?;
                li.set_text_content(&format!("{index}:{n}"));
                Ok(li)
            });
            let effect = diff(DiffOptions {
                binding,
                data: items.read_only(),
            });
            cx.own_effect(effect);
            Ok(String::new())
        }),
    )
    .unwrap();

    let el = doc.create_element("x-list").unwrap();
    let root = el.shadow_root().unwrap();
    assert_eq!(texts(&root), vec!["0:1", "1:2"]);

    items.set(vec![3]);
    assert_eq!(texts(&root), vec!["0:3"]);

    drop(root);
    drop(el);
    assert_eq!(items.subscriber_count(), 0);
}
