//! Nodes
//!
//! A node is a shared handle (`Rc`) to its data. Children are owned by their
//! parent; parents, owner documents and shadow-root hosts are weak
//! back-references, so a detached subtree is freed as soon as the last
//! handle to it goes away.

use std::cell::{Ref, RefCell};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexMap;

use super::custom::{CustomElementRegistry, ElementReactions, ShadowRootInit, ShadowRootMode};
use super::document::Document;
use super::markup;
use crate::error::DomError;
use crate::reactive::StrictEq;

/// Process-unique identity of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    /// Generate a new unique node ID.
    fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// The kind of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    Document,
    DocumentFragment,
    ShadowRoot,
    Element,
    Text,
    Comment,
}

pub(crate) struct DocumentData {
    pub(crate) registry: Rc<CustomElementRegistry>,
}

pub(crate) struct ShadowRootData {
    host: Weak<NodeInner>,
    init: ShadowRootInit,
}

/// Constructed custom-element state attached to an element.
#[derive(Clone)]
pub(crate) struct CustomState {
    pub(crate) reactions: Rc<dyn ElementReactions>,
    pub(crate) observed: Rc<[String]>,
}

pub(crate) struct ElementData {
    local_name: String,
    attributes: RefCell<IndexMap<String, String>>,
    shadow_root: RefCell<Option<Node>>,
    custom: RefCell<Option<CustomState>>,
}

pub(crate) enum NodeData {
    Document(DocumentData),
    Fragment,
    ShadowRoot(ShadowRootData),
    Element(ElementData),
    Text(RefCell<String>),
    Comment(RefCell<String>),
}

pub(crate) struct NodeInner {
    id: NodeId,
    data: NodeData,
    parent: RefCell<Weak<NodeInner>>,
    children: RefCell<Vec<Node>>,
    owner: RefCell<Weak<NodeInner>>,
}

/// A shared handle to a DOM node.
///
/// Cloning a `Node` clones the handle, not the node. Equality is identity.
#[derive(Clone)]
pub struct Node(pub(crate) Rc<NodeInner>);

/// A non-owning handle to a node.
#[derive(Clone, Default)]
pub struct WeakNode(Weak<NodeInner>);

impl WeakNode {
    pub fn upgrade(&self) -> Option<Node> {
        self.0.upgrade().map(Node)
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Node {}

impl StrictEq for Node {
    fn strict_eq(&self, other: &Self) -> bool {
        self == other
    }
}

impl Hash for Node {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}

impl Node {
    fn with_data(data: NodeData, owner: Weak<NodeInner>) -> Self {
        Node(Rc::new(NodeInner {
            id: NodeId::new(),
            data,
            parent: RefCell::new(Weak::new()),
            children: RefCell::new(Vec::new()),
            owner: RefCell::new(owner),
        }))
    }

    pub(crate) fn new_document(registry: Rc<CustomElementRegistry>) -> Self {
        Self::with_data(NodeData::Document(DocumentData { registry }), Weak::new())
    }

    pub(crate) fn new_element(local_name: String, owner: &Node) -> Self {
        Self::with_data(
            NodeData::Element(ElementData {
                local_name,
                attributes: RefCell::new(IndexMap::new()),
                shadow_root: RefCell::new(None),
                custom: RefCell::new(None),
            }),
            Rc::downgrade(&owner.0),
        )
    }

    pub(crate) fn new_text(data: &str, owner: Weak<NodeInner>) -> Self {
        Self::with_data(NodeData::Text(RefCell::new(data.to_string())), owner)
    }

    pub(crate) fn new_comment(data: &str, owner: Weak<NodeInner>) -> Self {
        Self::with_data(NodeData::Comment(RefCell::new(data.to_string())), owner)
    }

    pub(crate) fn new_fragment(owner: Weak<NodeInner>) -> Self {
        Self::with_data(NodeData::Fragment, owner)
    }

    pub(crate) fn node_data(&self) -> &NodeData {
        &self.0.data
    }

    pub(crate) fn owner_weak(&self) -> Weak<NodeInner> {
        match self.0.data {
            NodeData::Document(_) => Rc::downgrade(&self.0),
            _ => self.0.owner.borrow().clone(),
        }
    }

    pub(crate) fn element_data(&self) -> Option<&ElementData> {
        match &self.0.data {
            NodeData::Element(element) => Some(element),
            _ => None,
        }
    }

    // ------------------------------------------------------------------
    // Identity and kind
    // ------------------------------------------------------------------

    pub fn id(&self) -> NodeId {
        self.0.id
    }

    pub fn downgrade(&self) -> WeakNode {
        WeakNode(Rc::downgrade(&self.0))
    }

    pub fn node_type(&self) -> NodeType {
        match self.0.data {
            NodeData::Document(_) => NodeType::Document,
            NodeData::Fragment => NodeType::DocumentFragment,
            NodeData::ShadowRoot(_) => NodeType::ShadowRoot,
            NodeData::Element(_) => NodeType::Element,
            NodeData::Text(_) => NodeType::Text,
            NodeData::Comment(_) => NodeType::Comment,
        }
    }

    pub fn is_element(&self) -> bool {
        self.node_type() == NodeType::Element
    }

    /// The element's lowercase tag name.
    pub fn local_name(&self) -> Option<&str> {
        self.element_data().map(|element| element.local_name.as_str())
    }

    /// `#document`, `#text`, the tag name, and so on.
    pub fn node_name(&self) -> String {
        match &self.0.data {
            NodeData::Document(_) => "#document".to_string(),
            NodeData::Fragment | NodeData::ShadowRoot(_) => "#document-fragment".to_string(),
            NodeData::Element(element) => element.local_name.to_ascii_uppercase(),
            NodeData::Text(_) => "#text".to_string(),
            NodeData::Comment(_) => "#comment".to_string(),
        }
    }

    fn can_have_children(&self) -> bool {
        matches!(
            self.0.data,
            NodeData::Document(_) | NodeData::Fragment | NodeData::ShadowRoot(_) | NodeData::Element(_)
        )
    }

    // ------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------

    pub fn parent_node(&self) -> Option<Node> {
        self.0.parent.borrow().upgrade().map(Node)
    }

    /// The element a shadow root is attached to.
    pub fn host(&self) -> Option<Node> {
        match &self.0.data {
            NodeData::ShadowRoot(root) => root.host.upgrade().map(Node),
            _ => None,
        }
    }

    pub fn owner_document(&self) -> Option<Document> {
        self.owner_weak().upgrade().map(|inner| Document::from_node(Node(inner)))
    }

    /// Snapshot of the children at this moment.
    pub fn child_nodes(&self) -> Vec<Node> {
        self.0.children.borrow().clone()
    }

    pub fn child_count(&self) -> usize {
        self.0.children.borrow().len()
    }

    pub fn child_at(&self, index: usize) -> Option<Node> {
        self.0.children.borrow().get(index).cloned()
    }

    pub fn first_child(&self) -> Option<Node> {
        self.0.children.borrow().first().cloned()
    }

    pub fn last_child(&self) -> Option<Node> {
        self.0.children.borrow().last().cloned()
    }

    /// Position among the parent's children.
    pub fn index(&self) -> Option<usize> {
        let parent = self.parent_node()?;
        let children = parent.0.children.borrow();
        children.iter().position(|child| child == self)
    }

    pub fn next_sibling(&self) -> Option<Node> {
        let parent = self.parent_node()?;
        let index = self.index()?;
        parent.child_at(index + 1)
    }

    pub fn previous_sibling(&self) -> Option<Node> {
        let parent = self.parent_node()?;
        let index = self.index()?;
        index.checked_sub(1).and_then(|i| parent.child_at(i))
    }

    /// Step from a parentless shadow root to its host, otherwise to the parent.
    fn shadow_including_parent(&self) -> Option<Node> {
        self.parent_node().or_else(|| self.host())
    }

    /// Whether the node's shadow-including root is a document.
    pub fn is_connected(&self) -> bool {
        let mut node = self.clone();
        while let Some(next) = node.shadow_including_parent() {
            node = next;
        }
        node.node_type() == NodeType::Document
    }

    fn is_host_including_inclusive_ancestor_of(&self, other: &Node) -> bool {
        let mut current = Some(other.clone());
        while let Some(node) = current {
            if &node == self {
                return true;
            }
            current = node.shadow_including_parent();
        }
        false
    }

    /// The node, then its shadow tree, then its children, recursively.
    pub(crate) fn shadow_including_inclusive_descendants(&self) -> Vec<Node> {
        let mut out = Vec::new();
        self.collect_shadow_including(&mut out);
        out
    }

    fn collect_shadow_including(&self, out: &mut Vec<Node>) {
        out.push(self.clone());
        if let Some(root) = self.shadow_root_unchecked() {
            root.collect_shadow_including(out);
        }
        for child in self.child_nodes() {
            child.collect_shadow_including(out);
        }
    }

    /// Light-tree descendants in tree order, excluding the node itself.
    pub(crate) fn descendants(&self) -> Vec<Node> {
        let mut out = Vec::new();
        for child in self.child_nodes() {
            out.push(child.clone());
            out.extend(child.descendants());
        }
        out
    }

    // ------------------------------------------------------------------
    // Mutation
    // ------------------------------------------------------------------

    pub fn append_child(&self, child: &Node) -> Result<(), DomError> {
        self.insert_before(child, None)
    }

    /// Insert `node` before `reference`, or at the end when `reference` is
    /// `None`. A fragment inserts its children and is left empty.
    pub fn insert_before(&self, node: &Node, reference: Option<&Node>) -> Result<(), DomError> {
        self.ensure_pre_insert(node, reference)?;

        let mut reference = reference.cloned();
        if reference.as_ref() == Some(node) {
            reference = node.next_sibling();
        }

        let document = self.owner_weak();
        let nodes = if node.node_type() == NodeType::DocumentFragment {
            node.take_children()
        } else {
            node.remove_from_parent();
            vec![node.clone()]
        };
        for inserted in &nodes {
            inserted.adopt_into(&document);
        }

        {
            let mut children = self.0.children.borrow_mut();
            let index = reference
                .as_ref()
                .and_then(|r| children.iter().position(|child| child == r))
                .unwrap_or(children.len());
            for (offset, inserted) in nodes.iter().enumerate() {
                *inserted.0.parent.borrow_mut() = Rc::downgrade(&self.0);
                children.insert(index + offset, inserted.clone());
            }
        }

        if self.is_connected() {
            for inserted in &nodes {
                fire_connected(inserted);
            }
        }
        Ok(())
    }

    fn ensure_pre_insert(&self, node: &Node, reference: Option<&Node>) -> Result<(), DomError> {
        if !self.can_have_children() {
            return Err(DomError::HierarchyRequest("parent cannot have children"));
        }
        if matches!(node.node_type(), NodeType::Document | NodeType::ShadowRoot) {
            return Err(DomError::HierarchyRequest("node cannot be inserted"));
        }
        if node.is_host_including_inclusive_ancestor_of(self) {
            return Err(DomError::HierarchyRequest("node is an ancestor of the parent"));
        }
        if self.node_type() == NodeType::Document && node.node_type() == NodeType::Text {
            return Err(DomError::HierarchyRequest("documents cannot hold text"));
        }
        if let Some(reference) = reference {
            if reference.parent_node().as_ref() != Some(self) {
                return Err(DomError::NotFound);
            }
        }
        Ok(())
    }

    pub fn remove_child(&self, child: &Node) -> Result<(), DomError> {
        if child.parent_node().as_ref() != Some(self) {
            return Err(DomError::NotFound);
        }
        child.remove_from_parent();
        Ok(())
    }

    /// Replace `old` with `new` in place.
    pub fn replace_child(&self, new: &Node, old: &Node) -> Result<(), DomError> {
        if old.parent_node().as_ref() != Some(self) {
            return Err(DomError::NotFound);
        }
        if new == old {
            return Ok(());
        }
        self.ensure_pre_insert(new, None)?;
        let reference = old.next_sibling();
        old.remove_from_parent();
        self.insert_before(new, reference.as_ref())
    }

    /// Detach from the parent, if any.
    pub fn remove(&self) {
        self.remove_from_parent();
    }

    fn remove_from_parent(&self) {
        let Some(parent) = self.parent_node() else {
            return;
        };
        let was_connected = parent.is_connected();
        let removed = {
            let mut children = parent.0.children.borrow_mut();
            children
                .iter()
                .position(|child| child == self)
                .map(|index| children.remove(index))
        };
        *self.0.parent.borrow_mut() = Weak::new();
        drop(removed);

        if was_connected {
            fire_disconnected(self);
        }
    }

    fn take_children(&self) -> Vec<Node> {
        let children = std::mem::take(&mut *self.0.children.borrow_mut());
        for child in &children {
            *child.0.parent.borrow_mut() = Weak::new();
        }
        children
    }

    /// Remove every child.
    pub fn clear_children(&self) {
        for child in self.child_nodes() {
            child.remove_from_parent();
        }
    }

    /// Move this subtree into `document`, firing adopted reactions when the
    /// owner document changes.
    pub(crate) fn adopt_into(&self, document: &Weak<NodeInner>) {
        self.remove_from_parent();
        let previous = self.owner_weak();
        if Weak::ptr_eq(&previous, document) {
            return;
        }
        let subtree = self.shadow_including_inclusive_descendants();
        for node in &subtree {
            *node.0.owner.borrow_mut() = document.clone();
        }
        for node in &subtree {
            if let Some(state) = node.custom_state() {
                tracing::trace!(element = ?node, "adopted reaction");
                state.reactions.adopted(node);
            }
        }
    }

    // ------------------------------------------------------------------
    // Attributes
    // ------------------------------------------------------------------

    pub fn get_attribute(&self, name: &str) -> Option<String> {
        let element = self.element_data()?;
        let attributes = element.attributes.borrow();
        attributes.get(&name.to_ascii_lowercase()).cloned()
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.get_attribute(name).is_some()
    }

    /// Attribute names and values in insertion order.
    pub fn attributes(&self) -> Vec<(String, String)> {
        self.element_data()
            .map(|element| {
                element
                    .attributes
                    .borrow()
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn set_attribute(&self, name: &str, value: &str) -> Result<(), DomError> {
        let element = self.element_data().ok_or(DomError::NotAnElement)?;
        if !is_valid_attribute_name(name) {
            return Err(DomError::InvalidName(name.to_string()));
        }
        let name = name.to_ascii_lowercase();
        let old = element
            .attributes
            .borrow_mut()
            .insert(name.clone(), value.to_string());
        self.attribute_changed(&name, old.as_deref(), Some(value));
        Ok(())
    }

    pub fn remove_attribute(&self, name: &str) -> Result<(), DomError> {
        let element = self.element_data().ok_or(DomError::NotAnElement)?;
        let name = name.to_ascii_lowercase();
        let old = element.attributes.borrow_mut().shift_remove(&name);
        if let Some(old) = old {
            self.attribute_changed(&name, Some(&old), None);
        }
        Ok(())
    }

    /// Set attributes without reactions; used before an element is upgraded.
    pub(crate) fn set_attributes_silently(&self, attributes: Vec<(String, String)>) {
        if let Some(element) = self.element_data() {
            let mut map = element.attributes.borrow_mut();
            for (name, value) in attributes {
                map.entry(name.to_ascii_lowercase()).or_insert(value);
            }
        }
    }

    fn attribute_changed(&self, name: &str, old: Option<&str>, new: Option<&str>) {
        let Some(state) = self.custom_state() else {
            return;
        };
        if state.observed.iter().any(|observed| observed == name) {
            state.reactions.attribute_changed(self, name, old, new);
        }
    }

    // ------------------------------------------------------------------
    // Shadow roots and custom elements
    // ------------------------------------------------------------------

    /// Attach a shadow root. An element hosts at most one.
    pub fn attach_shadow(&self, init: ShadowRootInit) -> Result<Node, DomError> {
        let element = self.element_data().ok_or(DomError::NotAnElement)?;
        if element.shadow_root.borrow().is_some() {
            return Err(DomError::ShadowRootExists(element.local_name.clone()));
        }
        let root = Node::with_data(
            NodeData::ShadowRoot(ShadowRootData {
                host: Rc::downgrade(&self.0),
                init,
            }),
            self.owner_weak(),
        );
        *element.shadow_root.borrow_mut() = Some(root.clone());
        Ok(root)
    }

    /// The shadow root, if one is attached in open mode.
    pub fn shadow_root(&self) -> Option<Node> {
        self.shadow_root_unchecked()
            .filter(|root| root.shadow_root_init().map(|init| init.mode) == Some(ShadowRootMode::Open))
    }

    pub(crate) fn shadow_root_unchecked(&self) -> Option<Node> {
        self.element_data()
            .and_then(|element| element.shadow_root.borrow().clone())
    }

    /// The options a shadow root was attached with.
    pub fn shadow_root_init(&self) -> Option<ShadowRootInit> {
        match &self.0.data {
            NodeData::ShadowRoot(root) => Some(root.init.clone()),
            _ => None,
        }
    }

    pub(crate) fn custom_state(&self) -> Option<CustomState> {
        self.element_data()
            .and_then(|element| element.custom.borrow().clone())
    }

    pub(crate) fn set_custom_state(&self, state: CustomState) {
        if let Some(element) = self.element_data() {
            *element.custom.borrow_mut() = Some(state);
        }
    }

    /// The reactions of a constructed custom element.
    pub fn custom_element(&self) -> Option<Rc<dyn ElementReactions>> {
        self.custom_state().map(|state| state.reactions)
    }

    // ------------------------------------------------------------------
    // Content
    // ------------------------------------------------------------------

    /// Character data of a text or comment node.
    pub fn data(&self) -> Option<Ref<'_, String>> {
        match &self.0.data {
            NodeData::Text(data) | NodeData::Comment(data) => Some(data.borrow()),
            _ => None,
        }
    }

    pub fn text_content(&self) -> String {
        match &self.0.data {
            NodeData::Text(data) | NodeData::Comment(data) => data.borrow().clone(),
            NodeData::Document(_) => String::new(),
            _ => self
                .descendants()
                .iter()
                .filter_map(|node| match &node.0.data {
                    NodeData::Text(data) => Some(data.borrow().clone()),
                    _ => None,
                })
                .collect(),
        }
    }

    pub fn set_text_content(&self, text: &str) {
        match &self.0.data {
            NodeData::Text(data) | NodeData::Comment(data) => *data.borrow_mut() = text.to_string(),
            NodeData::Document(_) => {}
            _ => {
                self.clear_children();
                if !text.is_empty() {
                    let node = Node::new_text(text, self.owner_weak());
                    let _ = self.append_child(&node);
                }
            }
        }
    }

    /// Serialize the children as markup.
    pub fn inner_html(&self) -> String {
        markup::serialize_children(self)
    }

    /// Replace the children with nodes parsed from `markup`.
    ///
    /// Custom element tags are constructed through the owner document's
    /// registry as they are created.
    pub fn set_inner_html(&self, markup: &str) -> Result<(), DomError> {
        if !self.can_have_children() || self.node_type() == NodeType::Document {
            return Err(DomError::HierarchyRequest("node cannot hold markup"));
        }
        let document = self.owner_document().ok_or(DomError::NoOwnerDocument)?;
        let fragment = markup::parse_fragment(&document, markup)?;
        self.clear_children();
        self.append_child(&fragment)
    }

    /// First descendant element whose `id` attribute matches.
    pub fn get_element_by_id(&self, id: &str) -> Option<Node> {
        self.descendants()
            .into_iter()
            .find(|node| node.get_attribute("id").as_deref() == Some(id))
    }

    /// Descendant elements with the given tag name, in tree order.
    pub fn get_elements_by_tag_name(&self, local_name: &str) -> Vec<Node> {
        let local_name = local_name.to_ascii_lowercase();
        self.descendants()
            .into_iter()
            .filter(|node| node.local_name() == Some(local_name.as_str()))
            .collect()
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0.data {
            NodeData::Element(element) => write!(f, "<{}>#{}", element.local_name, self.0.id.0),
            NodeData::Text(data) => write!(f, "{:?}#{}", data.borrow(), self.0.id.0),
            _ => write!(f, "{}#{}", self.node_name(), self.0.id.0),
        }
    }
}

/// Fire connected reactions for a freshly inserted subtree.
fn fire_connected(root: &Node) {
    for node in root.shadow_including_inclusive_descendants() {
        if let Some(state) = node.custom_state() {
            if node.is_connected() {
                tracing::trace!(element = ?node, "connected reaction");
                state.reactions.connected(&node);
            }
        }
    }
}

/// Fire disconnected reactions for a freshly removed subtree.
fn fire_disconnected(root: &Node) {
    for node in root.shadow_including_inclusive_descendants() {
        if let Some(state) = node.custom_state() {
            if !node.is_connected() {
                tracing::trace!(element = ?node, "disconnected reaction");
                state.reactions.disconnected(&node);
            }
        }
    }
}

pub(crate) fn is_valid_element_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| !c.is_whitespace() && !matches!(c, '<' | '>' | '/' | '"' | '\'' | '=' | '\0'))
}

fn is_valid_attribute_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| !c.is_whitespace() && !matches!(c, '<' | '>' | '/' | '"' | '\'' | '=' | '\0'))
}
