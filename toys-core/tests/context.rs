//! Integration Tests for Context Propagation
//!
//! These tests verify provider resolution across the light tree and shadow
//! boundaries, and store contexts feeding consumers.

use toys_core::component::{define_component, Value};
use toys_core::context::{create_context, create_store_context, Record, Store, StoreProviderProps};
use toys_core::dom::{Document, Node, ShadowRootInit};

fn shadow_text(el: &Node) -> String {
    el.shadow_root().map(|root| root.text_content()).unwrap_or_default()
}

/// Define `x-provider` (provides "dark", optionally wrapping a consumer in
/// its shadow tree) and `x-consumer` (prints the resolved theme).
fn define_theme(doc: &Document, provider_template: &'static str) -> toys_core::context::Context<&'static str> {
    let theme = create_context("light");

    let context = theme.clone();
    doc.define(
        "x-provider",
        define_component(move |cx| {
            cx.use_shadow_root(ShadowRootInit::open());
            context.provide(cx, Some("dark"));
            Ok(provider_template.to_string())
        }),
    )
    .unwrap();

    let context = theme.clone();
    doc.define(
        "x-consumer",
        define_component(move |cx| {
            let root = cx.use_shadow_root(ShadowRootInit::open());
            let value = context.use_context(cx);
            cx.use_watch(move |_| {
                if let Some(root) = &root {
                    root.set_text_content(value.get());
                }
            });
            Ok(String::new())
        }),
    )
    .unwrap();

    theme
}

/// Test that a consumer reads the default until it is relocated under a
/// provider and reconnected.
#[test]
fn consumer_resolves_on_reconnect() {
    let doc = Document::new();
    let theme = define_theme(&doc, "<slot></slot>");
    let body = doc.body().unwrap();

    let consumer = doc.create_element("x-consumer").unwrap();
    body.append_child(&consumer).unwrap();
    assert_eq!(shadow_text(&consumer), "light");

    let provider = doc.create_element("x-provider").unwrap();
    body.append_child(&provider).unwrap();
    assert_eq!(theme.provider_count(), 1);
    // Providers are not observed until the consumer reconnects.
    assert_eq!(shadow_text(&consumer), "light");

    provider.append_child(&consumer).unwrap();
    assert_eq!(shadow_text(&consumer), "dark");

    body.append_child(&consumer).unwrap();
    assert_eq!(shadow_text(&consumer), "light");
}

/// Test that resolution crosses shadow-root boundaries through the host.
#[test]
fn consumer_inside_provider_shadow_tree() {
    let doc = Document::new();
    define_theme(&doc, "<div><x-consumer></x-consumer></div>");

    let provider = doc.create_element("x-provider").unwrap();
    doc.body().unwrap().append_child(&provider).unwrap();

    let consumer = provider.shadow_root().unwrap().get_elements_by_tag_name("x-consumer")[0].clone();
    assert_eq!(shadow_text(&consumer), "dark");
}

/// Test that a disconnected provider stops providing and re-registers when
/// it comes back.
#[test]
fn provider_entries_follow_connection() {
    let doc = Document::new();
    let theme = define_theme(&doc, "");
    let body = doc.body().unwrap();
    let provider = doc.create_element("x-provider").unwrap();
    let consumer = doc.create_element("x-consumer").unwrap();
    provider.append_child(&consumer).unwrap();

    body.append_child(&provider).unwrap();
    assert_eq!(shadow_text(&consumer), "dark");

    provider.remove();
    assert_eq!(theme.provider_count(), 0);
    assert_eq!(theme.lookup(&consumer), "light");

    body.append_child(&provider).unwrap();
    assert_eq!(theme.provider_count(), 1);
    assert_eq!(shadow_text(&consumer), "dark");
}

fn record(pairs: &[(&str, Value)]) -> Record {
    pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
}

/// Test that store consumers follow `set_values` while connected.
#[test]
fn store_context_feeds_consumers() {
    let doc = Document::new();
    let counter = create_store_context(record(&[("count", Value::from(0))]));
    let store = Store::new(record(&[("count", Value::from(1)), ("step", Value::from(2))]));

    let context = counter.clone();
    let shared = store.clone();
    doc.define(
        "x-store",
        define_component(move |cx| {
            context.provider(
                cx,
                StoreProviderProps {
                    value: None,
                    store: Some(shared.clone()),
                },
            );
            Ok(String::new())
        }),
    )
    .unwrap();

    let context = counter.clone();
    doc.define(
        "x-count",
        define_component(move |cx| {
            let root = cx.use_shadow_root(ShadowRootInit::open());
            let count = context.use_store_key(cx, "count");
            cx.use_watch(move |_| {
                if let Some(root) = &root {
                    root.set_text_content(&count.get().to_string());
                }
            });
            Ok(String::new())
        }),
    )
    .unwrap();

    let body = doc.body().unwrap();
    body.set_inner_html("<x-store><x-count></x-count></x-store>").unwrap();
    let consumer = body.get_elements_by_tag_name("x-count")[0].clone();

    // Seeded synchronously at connect.
    assert_eq!(shadow_text(&consumer), "1");
    assert_eq!(store.watcher_count(), 1);

    store.set_values(record(&[("count", Value::from(5))]));
    assert_eq!(shadow_text(&consumer), "5");
    assert_eq!(store.get_values().get("step"), Some(&Value::from(2)));

    consumer.remove();
    assert_eq!(store.watcher_count(), 0);
    store.set_values(record(&[("count", Value::from(6))]));
    assert_eq!(shadow_text(&consumer), "5");
}

/// Test that a store consumer without a provider watches the default store.
#[test]
fn store_consumer_without_provider_uses_default() {
    let doc = Document::new();
    let settings = create_store_context(record(&[("mode", Value::from("auto"))]));

    let context = settings.clone();
    doc.define(
        "x-mode",
        define_component(move |cx| {
            let root = cx.use_shadow_root(ShadowRootInit::open());
            let values = context.use_store_watch(cx);
            cx.use_watch(move |_| {
                let mode = values.with(|v| v.get("mode").cloned().unwrap_or_default());
                if let Some(root) = &root {
                    root.set_text_content(&mode.to_string());
                }
            });
            Ok(String::new())
        }),
    )
    .unwrap();

    let el = doc.create_element("x-mode").unwrap();
    doc.body().unwrap().append_child(&el).unwrap();
    assert_eq!(shadow_text(&el), "auto");
}
