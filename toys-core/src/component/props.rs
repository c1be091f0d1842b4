//! The reactive props bag.

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use super::value::Value;
use crate::error::ComponentError;
use crate::reactive::Signal;

struct PropsInner {
    signals: IndexMap<String, Signal<Value>>,
}

impl Drop for PropsInner {
    fn drop(&mut self) {
        for (_, signal) in self.signals.drain(..) {
            signal.dispose();
        }
    }
}

/// Declared reactive properties of one component instance, each backed by a
/// `Signal<Value>`.
///
/// Handles are cheap to clone. The signals are disposed when the last handle
/// goes away.
#[derive(Clone)]
pub struct Props(Rc<PropsInner>);

impl Props {
    pub(crate) fn new(signals: IndexMap<String, Signal<Value>>) -> Self {
        Self(Rc::new(PropsInner { signals }))
    }

    /// Tracked read. Undeclared names read as `Undefined`.
    pub fn get(&self, name: &str) -> Value {
        self.signal(name)
            .and_then(|signal| signal.try_get().ok())
            .unwrap_or_default()
    }

    pub fn signal(&self, name: &str) -> Option<Signal<Value>> {
        self.0.signals.get(name).copied()
    }

    /// Write a property without reflecting it to the attribute.
    pub fn set(&self, name: &str, value: impl Into<Value>) -> Result<(), ComponentError> {
        let signal = self
            .signal(name)
            .ok_or_else(|| ComponentError::UnknownProperty(name.to_string()))?;
        signal.set(value.into());
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.signals.contains_key(name)
    }

    /// Declared names, in declaration order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.signals.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.signals.is_empty()
    }
}

impl Default for Props {
    fn default() -> Self {
        Self::new(IndexMap::new())
    }
}

impl fmt::Debug for Props {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (name, signal) in &self.0.signals {
            map.entry(name, &signal.try_with(Value::clone).unwrap_or_default());
        }
        map.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props() -> Props {
        let mut signals = IndexMap::new();
        signals.insert("count".to_string(), Signal::new(Value::from(1)));
        signals.insert("label".to_string(), Signal::new(Value::from("a")));
        Props::new(signals)
    }

    #[test]
    fn reads_and_writes() {
        let props = props();
        assert_eq!(props.get("count"), Value::from(1));
        props.set("count", 2).unwrap();
        assert_eq!(props.get("count"), Value::from(2));
        assert_eq!(props.get("missing"), Value::Undefined);
        assert_eq!(
            props.set("missing", 1),
            Err(ComponentError::UnknownProperty("missing".to_string()))
        );
    }

    #[test]
    fn keys_keep_declaration_order() {
        let props = props();
        assert_eq!(props.keys().collect::<Vec<_>>(), vec!["count", "label"]);
        assert_eq!(props.len(), 2);
    }

    #[test]
    fn last_handle_disposes_signals() {
        let props = props();
        let signal = props.signal("count").unwrap();
        let copy = props.clone();
        drop(props);
        assert!(signal.is_alive());
        drop(copy);
        assert!(!signal.is_alive());
    }
}
