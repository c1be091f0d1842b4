//! Markup
//!
//! Parsing goes through html5ever's fragment parser into a small scratch
//! tree, which is then rebuilt node by node through the owning document so
//! that custom elements are constructed with their parsed attributes.
//! Serialization is the inverse for the subset of the DOM modelled here.

use std::borrow::Cow;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

use html5ever::tendril::{StrTendril, TendrilSink};
use html5ever::tree_builder::{ElementFlags, NodeOrText, QuirksMode, TreeSink};
use html5ever::{local_name, namespace_url, ns, parse_fragment as html5ever_parse_fragment};
use html5ever::{Attribute, ExpandedName, ParseOpts, QualName};

use super::document::Document;
use super::node::{Node, NodeData};
use crate::error::DomError;

type Handle = Rc<ScratchNode>;

enum ScratchKind {
    Document,
    Element {
        name: QualName,
        attrs: RefCell<Vec<Attribute>>,
        template_contents: Option<Handle>,
    },
    Text(RefCell<StrTendril>),
    Comment(StrTendril),
}

struct ScratchNode {
    kind: ScratchKind,
    parent: RefCell<Weak<ScratchNode>>,
    children: RefCell<Vec<Handle>>,
}

impl ScratchNode {
    fn new(kind: ScratchKind) -> Handle {
        Rc::new(Self {
            kind,
            parent: RefCell::new(Weak::new()),
            children: RefCell::new(Vec::new()),
        })
    }

    fn parent(&self) -> Option<Handle> {
        self.parent.borrow().upgrade()
    }
}

fn detach(target: &Handle) {
    if let Some(parent) = target.parent() {
        parent
            .children
            .borrow_mut()
            .retain(|child| !Rc::ptr_eq(child, target));
    }
    *target.parent.borrow_mut() = Weak::new();
}

fn append_handle(parent: &Handle, child: Handle) {
    detach(&child);
    *child.parent.borrow_mut() = Rc::downgrade(parent);
    parent.children.borrow_mut().push(child);
}

/// Try to merge text into an existing text node.
fn merge_text(target: Option<&Handle>, text: &StrTendril) -> bool {
    match target.map(|node| &node.kind) {
        Some(ScratchKind::Text(existing)) => {
            existing.borrow_mut().push_tendril(text);
            true
        }
        _ => false,
    }
}

struct ScratchSink {
    document: Handle,
}

impl TreeSink for ScratchSink {
    type Handle = Handle;
    type Output = Handle;

    fn finish(self) -> Handle {
        self.document
    }

    fn parse_error(&mut self, msg: Cow<'static, str>) {
        tracing::trace!(%msg, "markup parse error");
    }

    fn get_document(&mut self) -> Handle {
        self.document.clone()
    }

    fn elem_name<'a>(&'a self, target: &'a Handle) -> ExpandedName<'a> {
        match &target.kind {
            ScratchKind::Element { name, .. } => name.expanded(),
            _ => unreachable!("html5ever asked for the name of a non-element"),
        }
    }

    fn create_element(&mut self, name: QualName, attrs: Vec<Attribute>, flags: ElementFlags) -> Handle {
        let template_contents = flags
            .template
            .then(|| ScratchNode::new(ScratchKind::Document));
        ScratchNode::new(ScratchKind::Element {
            name,
            attrs: RefCell::new(attrs),
            template_contents,
        })
    }

    fn create_comment(&mut self, text: StrTendril) -> Handle {
        ScratchNode::new(ScratchKind::Comment(text))
    }

    fn create_pi(&mut self, _target: StrTendril, data: StrTendril) -> Handle {
        ScratchNode::new(ScratchKind::Comment(data))
    }

    fn append(&mut self, parent: &Handle, child: NodeOrText<Handle>) {
        match child {
            NodeOrText::AppendNode(node) => append_handle(parent, node),
            NodeOrText::AppendText(text) => {
                let last = parent.children.borrow().last().cloned();
                if !merge_text(last.as_ref(), &text) {
                    append_handle(parent, ScratchNode::new(ScratchKind::Text(RefCell::new(text))));
                }
            }
        }
    }

    fn append_based_on_parent_node(
        &mut self,
        element: &Handle,
        prev_element: &Handle,
        child: NodeOrText<Handle>,
    ) {
        if element.parent().is_some() {
            self.append_before_sibling(element, child);
        } else {
            self.append(prev_element, child);
        }
    }

    fn append_doctype_to_document(&mut self, _: StrTendril, _: StrTendril, _: StrTendril) {}

    fn get_template_contents(&mut self, target: &Handle) -> Handle {
        match &target.kind {
            ScratchKind::Element {
                template_contents: Some(contents),
                ..
            } => contents.clone(),
            _ => target.clone(),
        }
    }

    fn same_node(&self, x: &Handle, y: &Handle) -> bool {
        Rc::ptr_eq(x, y)
    }

    fn set_quirks_mode(&mut self, _mode: QuirksMode) {}

    fn append_before_sibling(&mut self, sibling: &Handle, new_node: NodeOrText<Handle>) {
        let Some(parent) = sibling.parent() else {
            return;
        };
        let index = parent
            .children
            .borrow()
            .iter()
            .position(|child| Rc::ptr_eq(child, sibling))
            .unwrap_or(0);

        let child = match new_node {
            NodeOrText::AppendText(text) => {
                let previous = index
                    .checked_sub(1)
                    .and_then(|i| parent.children.borrow().get(i).cloned());
                if merge_text(previous.as_ref(), &text) {
                    return;
                }
                ScratchNode::new(ScratchKind::Text(RefCell::new(text)))
            }
            NodeOrText::AppendNode(node) => {
                detach(&node);
                node
            }
        };
        let index = parent
            .children
            .borrow()
            .iter()
            .position(|c| Rc::ptr_eq(c, sibling))
            .unwrap_or(index);
        *child.parent.borrow_mut() = Rc::downgrade(&parent);
        parent.children.borrow_mut().insert(index, child);
    }

    fn add_attrs_if_missing(&mut self, target: &Handle, attrs: Vec<Attribute>) {
        if let ScratchKind::Element { attrs: existing, .. } = &target.kind {
            let mut existing = existing.borrow_mut();
            for attr in attrs {
                if !existing.iter().any(|e| e.name == attr.name) {
                    existing.push(attr);
                }
            }
        }
    }

    fn remove_from_parent(&mut self, target: &Handle) {
        detach(target);
    }

    fn reparent_children(&mut self, node: &Handle, new_parent: &Handle) {
        let children = std::mem::take(&mut *node.children.borrow_mut());
        for child in children {
            *child.parent.borrow_mut() = Rc::downgrade(new_parent);
            new_parent.children.borrow_mut().push(child);
        }
    }
}

/// Parse `markup` as the contents of a `<body>` into a detached fragment
/// owned by `document`.
pub(crate) fn parse_fragment(document: &Document, markup: &str) -> Result<Node, DomError> {
    let sink = ScratchSink {
        document: ScratchNode::new(ScratchKind::Document),
    };
    let context = QualName::new(None, ns!(html), local_name!("body"));
    let scratch = html5ever_parse_fragment(sink, ParseOpts::default(), context, Vec::new()).one(markup);

    let fragment = document.create_document_fragment();
    // The fragment parser wraps its output in a single <html> element.
    let root = scratch.children.borrow().first().cloned();
    if let Some(root) = root {
        build_children(document, &root, &fragment)?;
    }
    Ok(fragment)
}

fn build_children(document: &Document, scratch: &Handle, parent: &Node) -> Result<(), DomError> {
    let children = scratch.children.borrow().clone();
    for child in &children {
        let node = match &child.kind {
            ScratchKind::Element {
                name,
                attrs,
                template_contents,
            } => {
                let attributes = attrs
                    .borrow()
                    .iter()
                    .map(|attr| (attribute_name(&attr.name), attr.value.to_string()))
                    .collect();
                let element = document.create_element_with_attributes(&name.local, attributes)?;
                build_children(document, template_contents.as_ref().unwrap_or(child), &element)?;
                element
            }
            ScratchKind::Text(text) => document.create_text_node(&text.borrow()),
            ScratchKind::Comment(text) => document.create_comment(text),
            ScratchKind::Document => continue,
        };
        parent.append_child(&node)?;
    }
    Ok(())
}

fn attribute_name(name: &QualName) -> String {
    match &name.prefix {
        Some(prefix) => format!("{}:{}", prefix, name.local),
        None => name.local.to_string(),
    }
}

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &[
    "style", "script", "xmp", "iframe", "noembed", "noframes", "plaintext",
];

/// Serialize the children of `node`.
pub(crate) fn serialize_children(node: &Node) -> String {
    let mut out = String::new();
    let raw = node
        .local_name()
        .is_some_and(|name| RAW_TEXT_ELEMENTS.contains(&name));
    for child in node.child_nodes() {
        serialize_node(&child, raw, &mut out);
    }
    out
}

fn serialize_node(node: &Node, raw_text: bool, out: &mut String) {
    match node.node_data() {
        NodeData::Element(_) => {
            let name = node.local_name().unwrap_or_default();
            out.push('<');
            out.push_str(name);
            for (attr, value) in node.attributes() {
                out.push(' ');
                out.push_str(&attr);
                out.push_str("=\"");
                escape(&value, true, out);
                out.push('"');
            }
            out.push('>');
            if VOID_ELEMENTS.contains(&name) {
                return;
            }
            out.push_str(&serialize_children(node));
            out.push_str("</");
            out.push_str(name);
            out.push('>');
        }
        NodeData::Text(data) => {
            if raw_text {
                out.push_str(&data.borrow());
            } else {
                escape(&data.borrow(), false, out);
            }
        }
        NodeData::Comment(data) => {
            out.push_str("<!--");
            out.push_str(&data.borrow());
            out.push_str("-->");
        }
        NodeData::Document(_) | NodeData::Fragment | NodeData::ShadowRoot(_) => {
            out.push_str(&serialize_children(node));
        }
    }
}

fn escape(text: &str, attribute: bool, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            '"' if attribute => out.push_str("&quot;"),
            '<' if !attribute => out.push_str("&lt;"),
            '>' if !attribute => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(markup: &str) -> String {
        let doc = Document::new();
        let el = doc.create_element("div").unwrap();
        el.set_inner_html(markup).unwrap();
        el.inner_html()
    }

    #[test]
    fn parses_nested_elements() {
        let doc = Document::new();
        let fragment = parse_fragment(&doc, "<p class=\"a\">one <b>two</b></p><hr>").unwrap();

        assert_eq!(fragment.child_count(), 2);
        let p = fragment.first_child().unwrap();
        assert_eq!(p.local_name(), Some("p"));
        assert_eq!(p.get_attribute("class").as_deref(), Some("a"));
        assert_eq!(p.text_content(), "one two");
    }

    #[test]
    fn serializes_back_to_markup() {
        assert_eq!(
            round_trip("<ul><li>a</li><li>b</li></ul>"),
            "<ul><li>a</li><li>b</li></ul>"
        );
        assert_eq!(round_trip("<br><img src=\"x.png\">"), "<br><img src=\"x.png\">");
    }

    #[test]
    fn text_is_escaped() {
        let doc = Document::new();
        let el = doc.create_element("div").unwrap();
        el.set_text_content("1 < 2 & \"3\"");
        assert_eq!(el.inner_html(), "1 &lt; 2 &amp; \"3\"");

        el.set_attribute("title", "a\"b").unwrap();
        let wrapper = doc.create_element("section").unwrap();
        wrapper.append_child(&el).unwrap();
        assert_eq!(
            wrapper.inner_html(),
            "<div title=\"a&quot;b\">1 &lt; 2 &amp; \"3\"</div>"
        );
    }

    #[test]
    fn malformed_markup_is_repaired() {
        assert_eq!(round_trip("<p>open<p>next"), "<p>open</p><p>next</p>");
        assert_eq!(round_trip("<b><i>x</b></i>"), "<b><i>x</i></b>");
    }

    #[test]
    fn raw_text_is_not_escaped() {
        assert_eq!(
            round_trip("<style>a > b { color: red }</style>"),
            "<style>a > b { color: red }</style>"
        );
    }

    #[test]
    fn comments_survive() {
        assert_eq!(round_trip("<!-- note -->x"), "<!-- note -->x");
    }

    #[test]
    fn empty_markup_clears_children() {
        let doc = Document::new();
        let el = doc.create_element("div").unwrap();
        el.set_inner_html("<span></span>").unwrap();
        el.set_inner_html("").unwrap();
        assert_eq!(el.child_count(), 0);
    }
}
