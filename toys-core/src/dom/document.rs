//! Documents
//!
//! A [`Document`] owns the custom element registry and is the factory for
//! every other kind of node.

use std::fmt;
use std::rc::Rc;

use super::custom::{self, CustomElementDefinition, CustomElementRegistry};
use super::node::{is_valid_element_name, Node, NodeData, NodeType};
use crate::error::DomError;

/// Handle to a document node.
#[derive(Clone, PartialEq, Eq)]
pub struct Document {
    node: Node,
}

impl Document {
    /// Create an empty `<html><head></head><body></body></html>` document
    /// with its own registry.
    pub fn new() -> Self {
        Self::with_registry(Rc::default())
    }

    fn with_registry(registry: Rc<CustomElementRegistry>) -> Self {
        let node = Node::new_document(registry);
        let html = Node::new_element("html".to_string(), &node);
        let head = Node::new_element("head".to_string(), &node);
        let body = Node::new_element("body".to_string(), &node);
        // Fresh, unconnected plain elements.
        let _ = html.append_child(&head);
        let _ = html.append_child(&body);
        let _ = node.append_child(&html);
        Self { node }
    }

    pub(crate) fn from_node(node: Node) -> Self {
        debug_assert_eq!(node.node_type(), NodeType::Document);
        Self { node }
    }

    /// Create a second document sharing this one's definitions.
    pub fn create_document(&self) -> Document {
        Self::with_registry(self.registry())
    }

    fn registry(&self) -> Rc<CustomElementRegistry> {
        match self.node.node_data() {
            NodeData::Document(data) => data.registry.clone(),
            _ => Rc::default(),
        }
    }

    pub fn as_node(&self) -> &Node {
        &self.node
    }

    pub fn document_element(&self) -> Option<Node> {
        self.node.child_nodes().into_iter().find(Node::is_element)
    }

    pub fn head(&self) -> Option<Node> {
        self.document_element()?
            .child_nodes()
            .into_iter()
            .find(|node| node.local_name() == Some("head"))
    }

    pub fn body(&self) -> Option<Node> {
        self.document_element()?
            .child_nodes()
            .into_iter()
            .find(|node| node.local_name() == Some("body"))
    }

    /// Create an element, constructing it if its tag is a defined custom
    /// element.
    pub fn create_element(&self, local_name: &str) -> Result<Node, DomError> {
        self.create_element_with_attributes(local_name, Vec::new())
    }

    /// Create an element whose attributes exist before construction, the way
    /// parsed markup produces them.
    pub fn create_element_with_attributes(
        &self,
        local_name: &str,
        attributes: Vec<(String, String)>,
    ) -> Result<Node, DomError> {
        if !is_valid_element_name(local_name) {
            return Err(DomError::InvalidName(local_name.to_string()));
        }
        let local_name = local_name.to_ascii_lowercase();
        let element = Node::new_element(local_name.clone(), &self.node);
        element.set_attributes_silently(attributes);

        if let Some(definition) = self.registry().get(&local_name) {
            custom::upgrade(&element, &definition);
        }
        Ok(element)
    }

    pub fn create_text_node(&self, data: &str) -> Node {
        Node::new_text(data, self.node.owner_weak())
    }

    pub fn create_comment(&self, data: &str) -> Node {
        Node::new_comment(data, self.node.owner_weak())
    }

    pub fn create_document_fragment(&self) -> Node {
        Node::new_fragment(self.node.owner_weak())
    }

    /// Detach `node` from wherever it is and make this its owner document.
    pub fn adopt_node(&self, node: &Node) -> Result<(), DomError> {
        match node.node_type() {
            NodeType::Document => Err(DomError::HierarchyRequest("documents cannot be adopted")),
            NodeType::ShadowRoot => Err(DomError::HierarchyRequest("shadow roots cannot be adopted")),
            _ => {
                node.adopt_into(&self.node.owner_weak());
                Ok(())
            }
        }
    }

    /// Register a custom element and upgrade matching elements already in
    /// the document, in shadow-including tree order.
    pub fn define(
        &self,
        name: &str,
        definition: impl CustomElementDefinition,
    ) -> Result<(), DomError> {
        if !custom::is_valid_custom_element_name(name) {
            return Err(DomError::InvalidCustomElementName(name.to_string()));
        }
        let registry = self.registry();
        if registry.contains(name) {
            return Err(DomError::AlreadyDefined(name.to_string()));
        }
        let definition: Rc<dyn CustomElementDefinition> = Rc::new(definition);
        registry.insert(name.to_string(), definition.clone());
        tracing::debug!(name, definitions = registry.len(), "custom element defined");

        let candidates: Vec<Node> = self
            .node
            .shadow_including_inclusive_descendants()
            .into_iter()
            .filter(|node| node.local_name() == Some(name) && node.custom_state().is_none())
            .collect();
        for element in candidates {
            custom::upgrade(&element, &definition);
        }
        Ok(())
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.registry().contains(name)
    }

    pub fn get_element_by_id(&self, id: &str) -> Option<Node> {
        self.node.get_element_by_id(id)
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document").field("node", &self.node).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::ElementReactions;
    use std::any::Any;
    use std::cell::RefCell;

    type Log = Rc<RefCell<Vec<String>>>;

    struct Recorder {
        log: Log,
    }

    impl ElementReactions for Recorder {
        fn connected(&self, element: &Node) {
            self.log.borrow_mut().push(format!("connected {}", element.node_name()));
        }

        fn disconnected(&self, _element: &Node) {
            self.log.borrow_mut().push("disconnected".to_string());
        }

        fn adopted(&self, _element: &Node) {
            self.log.borrow_mut().push("adopted".to_string());
        }

        fn attribute_changed(&self, _: &Node, name: &str, old: Option<&str>, new: Option<&str>) {
            self.log
                .borrow_mut()
                .push(format!("{name}: {old:?} -> {new:?}"));
        }

        fn into_any(self: Rc<Self>) -> Rc<dyn Any> {
            self
        }
    }

    struct RecorderClass {
        log: Log,
    }

    impl CustomElementDefinition for RecorderClass {
        fn observed_attributes(&self) -> Vec<String> {
            vec!["label".to_string()]
        }

        fn construct(&self, _element: &Node) -> Option<Rc<dyn ElementReactions>> {
            self.log.borrow_mut().push("constructed".to_string());
            Some(Rc::new(Recorder {
                log: self.log.clone(),
            }))
        }
    }

    fn define_recorder(doc: &Document) -> Log {
        let log = Log::default();
        doc.define("x-rec", RecorderClass { log: log.clone() }).unwrap();
        log
    }

    #[test]
    fn new_document_has_body() {
        let doc = Document::new();
        assert_eq!(doc.document_element().unwrap().local_name(), Some("html"));
        assert!(doc.head().is_some());
        assert!(doc.body().unwrap().is_connected());
    }

    #[test]
    fn element_names_are_validated_and_lowercased() {
        let doc = Document::new();
        assert_eq!(doc.create_element("DIV").unwrap().local_name(), Some("div"));
        assert!(doc.create_element("").is_err());
        assert!(doc.create_element("1a").is_err());
    }

    #[test]
    fn define_rejects_bad_and_duplicate_names() {
        let doc = Document::new();
        let log = Log::default();
        assert_eq!(
            doc.define("plain", RecorderClass { log: log.clone() }),
            Err(DomError::InvalidCustomElementName("plain".to_string()))
        );
        doc.define("x-one", RecorderClass { log: log.clone() }).unwrap();
        assert!(doc.is_defined("x-one"));
        assert_eq!(
            doc.define("x-one", RecorderClass { log }),
            Err(DomError::AlreadyDefined("x-one".to_string()))
        );
    }

    #[test]
    fn lifecycle_reactions_fire_in_order() {
        let doc = Document::new();
        let log = define_recorder(&doc);
        let body = doc.body().unwrap();

        let el = doc.create_element("x-rec").unwrap();
        body.append_child(&el).unwrap();
        el.set_attribute("label", "a").unwrap();
        el.set_attribute("ignored", "b").unwrap();
        el.remove();

        assert_eq!(
            *log.borrow(),
            vec![
                "constructed",
                "connected X-REC",
                "label: None -> Some(\"a\")",
                "disconnected",
            ]
        );
    }

    #[test]
    fn define_upgrades_existing_elements() {
        let doc = Document::new();
        let body = doc.body().unwrap();
        let el = doc.create_element("x-rec").unwrap();
        el.set_attribute("label", "hi").unwrap();
        body.append_child(&el).unwrap();
        assert!(el.custom_element().is_none());

        let log = define_recorder(&doc);
        assert!(el.custom_element().is_some());
        assert_eq!(
            *log.borrow(),
            vec!["constructed", "label: None -> Some(\"hi\")", "connected X-REC"]
        );
    }

    #[test]
    fn parsed_attributes_are_replayed_after_construction() {
        let doc = Document::new();
        let log = define_recorder(&doc);
        let host = doc.create_element("div").unwrap();
        host.set_inner_html("<x-rec label=\"go\"></x-rec>").unwrap();

        assert_eq!(
            *log.borrow(),
            vec!["constructed", "label: None -> Some(\"go\")"]
        );
    }

    #[test]
    fn adopt_fires_for_other_documents() {
        let doc = Document::new();
        let log = define_recorder(&doc);
        let other = doc.create_document();
        let el = doc.create_element("x-rec").unwrap();

        other.adopt_node(&el).unwrap();
        assert_eq!(el.owner_document(), Some(other.clone()));
        other.adopt_node(&el).unwrap();
        assert_eq!(*log.borrow(), vec!["constructed", "adopted"]);

        assert!(other.is_defined("x-rec"));
    }

    #[test]
    fn moving_between_documents_adopts_then_connects() {
        let doc = Document::new();
        let log = define_recorder(&doc);
        let other = doc.create_document();
        let el = doc.create_element("x-rec").unwrap();
        doc.body().unwrap().append_child(&el).unwrap();
        log.borrow_mut().clear();

        other.body().unwrap().append_child(&el).unwrap();
        assert_eq!(
            *log.borrow(),
            vec!["disconnected", "adopted", "connected X-REC"]
        );
    }

    #[test]
    fn shadow_contents_connect_with_their_host() {
        let doc = Document::new();
        let log = define_recorder(&doc);
        let host = doc.create_element("div").unwrap();
        let root = host.attach_shadow(crate::dom::ShadowRootInit::open()).unwrap();
        root.append_child(&doc.create_element("x-rec").unwrap()).unwrap();
        log.borrow_mut().clear();

        doc.body().unwrap().append_child(&host).unwrap();
        assert_eq!(*log.borrow(), vec!["connected X-REC"]);
    }
}
