use std::borrow::Cow;
use std::collections::VecDeque;

use tracing::{debug, trace};

use crate::dom::{DOMElement, DOMNode, DOMNodeType, Namespace, NodeId};
use crate::observer::{Microtask, MutationRecord, Registration};
use crate::parsing::{self, Fragment};
use crate::style::StyleDeclaration;

/// Errors from tree mutations that the DOM would reject
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    #[error("node {0:?} does not exist")]
    NotFound(NodeId),
    #[error("the operation would yield an incorrect node tree")]
    HierarchyRequest,
    #[error("node {0:?} is not a child of this node")]
    NotAChild(NodeId),
}

pub struct Document {
    nodes: Vec<DOMNode>,
    root: NodeId,
    html: NodeId,
    head: NodeId,
    body: NodeId,
    pub(crate) observers: Vec<Registration>,
    pub(crate) next_observer: usize,
    pub(crate) microtasks: VecDeque<Microtask>,
    pub(crate) delivering: bool,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create a document containing `<html><head></head><body></body></html>`
    pub fn new() -> Self {
        let mut document = Self {
            nodes: vec![DOMNode::new(DOMNodeType::Document)],
            root: NodeId(0),
            html: NodeId(0),
            head: NodeId(0),
            body: NodeId(0),
            observers: Vec::new(),
            next_observer: 0,
            microtasks: VecDeque::new(),
            delivering: false,
        };
        document.html = document.create_element("html");
        document.head = document.create_element("head");
        document.body = document.create_element("body");
        document.link(document.root, document.html, None);
        document.link(document.html, document.head, None);
        document.link(document.html, document.body, None);
        document
    }

    /// Build a document from markup. An `<html>` root is unwrapped into the
    /// document's own head and body; anything else lands in the body.
    pub fn from_html(markup: &str) -> Self {
        let mut document = Self::new();
        let (head, body) = (document.head, document.body);
        for fragment in parsing::fragment(markup) {
            match fragment {
                Fragment::Element {
                    name,
                    attributes,
                    children,
                } if name.eq_ignore_ascii_case("html") => {
                    document.copy_attributes(document.html, attributes);
                    for child in children {
                        match child {
                            Fragment::Element {
                                name,
                                attributes,
                                children,
                            } if name.eq_ignore_ascii_case("head")
                                || name.eq_ignore_ascii_case("body") =>
                            {
                                let target = if name.eq_ignore_ascii_case("head") {
                                    head
                                } else {
                                    body
                                };
                                document.copy_attributes(target, attributes);
                                for grandchild in children {
                                    document.insert_fragment(target, grandchild);
                                }
                            }
                            Fragment::Text(text) if text.trim().is_empty() => {}
                            other => document.insert_fragment(body, other),
                        }
                    }
                }
                Fragment::Text(text) if text.trim().is_empty() => {}
                other => document.insert_fragment(body, other),
            }
        }
        document
    }

    /// Names are case-insensitive on HTML elements only, so foreign elements
    /// keep names like `viewBox` as written
    fn copy_attributes(&mut self, node: NodeId, attributes: Vec<(String, String)>) {
        let fold = self.element(node).map(|e| e.namespace) == Some(Namespace::Html);
        for (name, value) in attributes {
            if fold {
                self.set_attribute(node, &name.to_ascii_lowercase(), &value);
            } else {
                self.set_attribute(node, &name, &value);
            }
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn document_element(&self) -> NodeId {
        self.html
    }

    pub fn head(&self) -> NodeId {
        self.head
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> Option<&DOMNode> {
        self.nodes.get(id.0)
    }

    pub fn element(&self, id: NodeId) -> Option<&DOMElement> {
        self.node(id).and_then(DOMNode::as_element)
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut DOMElement> {
        self.nodes.get_mut(id.0).and_then(DOMNode::as_element_mut)
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        self.element(id).is_some()
    }

    pub fn style(&self, id: NodeId) -> Option<&StyleDeclaration> {
        self.element(id).map(|e| &e.style)
    }

    pub fn style_mut(&mut self, id: NodeId) -> Option<&mut StyleDeclaration> {
        self.element_mut(id).map(|e| &mut e.style)
    }

    fn alloc(&mut self, node_type: DOMNodeType) -> NodeId {
        self.nodes.push(DOMNode::new(node_type));
        NodeId(self.nodes.len() - 1)
    }

    /// Create a detached HTML element
    pub fn create_element(&mut self, tag_name: &str) -> NodeId {
        self.create_element_ns(Namespace::Html, tag_name)
    }

    /// Create a detached element in `namespace`
    pub fn create_element_ns(&mut self, namespace: Namespace, tag_name: &str) -> NodeId {
        self.alloc(DOMNodeType::Element(DOMElement::new(tag_name, namespace)))
    }

    /// Create a detached text node
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.alloc(DOMNodeType::Text(text.to_string()))
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|n| n.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).first().copied()
    }

    fn sibling_index(&self, id: NodeId) -> Option<(NodeId, usize)> {
        let parent = self.parent(id)?;
        let index = self.children(parent).iter().position(|&c| c == id)?;
        Some((parent, index))
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let (parent, index) = self.sibling_index(id)?;
        self.children(parent).get(index + 1).copied()
    }

    /// Element siblings before `id`, nearest first
    pub fn preceding_element_siblings(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let before: &[NodeId] = match self.sibling_index(id) {
            Some((parent, index)) => &self.children(parent)[..index],
            None => &[],
        };
        before
            .iter()
            .rev()
            .copied()
            .filter(move |&n| self.is_element(n))
    }

    /// Ancestors of `id`, nearest first
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |&n| self.parent(n))
    }

    /// Whether `id` is in the document tree
    pub fn is_connected(&self, id: NodeId) -> bool {
        id == self.root || self.ancestors(id).any(|n| n == self.root)
    }

    /// All nodes below `id` in document order, excluding `id`
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    fn check_exists(&self, id: NodeId) -> Result<(), DomError> {
        match self.node(id) {
            Some(_) => Ok(()),
            None => Err(DomError::NotFound(id)),
        }
    }

    /// Append `child` as the last child of `parent`, moving it if it is
    /// already in the tree
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<NodeId, DomError> {
        self.insert_before(parent, child, None)
    }

    /// Insert `child` into `parent` before `reference`, or at the end if
    /// `reference` is `None`
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<NodeId, DomError> {
        self.check_exists(parent)?;
        self.check_exists(child)?;
        let accepts_children = matches!(
            self.nodes[parent.0].node_type,
            DOMNodeType::Document | DOMNodeType::Element(_)
        );
        let is_document = matches!(self.nodes[child.0].node_type, DOMNodeType::Document);
        if !accepts_children
            || is_document
            || child == parent
            || self.ancestors(parent).any(|a| a == child)
        {
            return Err(DomError::HierarchyRequest);
        }
        if let Some(reference) = reference {
            if self.parent(reference) != Some(parent) {
                return Err(DomError::NotAChild(reference));
            }
        }
        // Inserting a node before itself means inserting before its next sibling
        let reference = match reference {
            Some(r) if r == child => self.next_sibling(child),
            other => other,
        };
        if let Some(old_parent) = self.parent(child) {
            self.unlink(old_parent, child);
        }
        self.link(parent, child, reference);
        trace!(?parent, ?child, "inserted node");
        if self.is_connected(parent) {
            self.queue_record(MutationRecord {
                target: parent,
                added_nodes: vec![child],
                removed_nodes: Vec::new(),
            });
        }
        Ok(child)
    }

    /// Remove `child` from `parent`
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<NodeId, DomError> {
        self.check_exists(parent)?;
        self.check_exists(child)?;
        if self.parent(child) != Some(parent) {
            return Err(DomError::NotAChild(child));
        }
        self.unlink(parent, child);
        Ok(child)
    }

    /// Remove `id` from its parent, if it has one
    pub fn remove(&mut self, id: NodeId) {
        if let Some(parent) = self.parent(id) {
            self.unlink(parent, id);
        }
    }

    pub fn remove_all_children(&mut self, id: NodeId) {
        while let Some(child) = self.first_child(id) {
            self.unlink(id, child);
        }
    }

    fn link(&mut self, parent: NodeId, child: NodeId, reference: Option<NodeId>) {
        let index = reference
            .and_then(|r| self.nodes[parent.0].children.iter().position(|&c| c == r))
            .unwrap_or(self.nodes[parent.0].children.len());
        self.nodes[parent.0].children.insert(index, child);
        self.nodes[child.0].parent = Some(parent);
    }

    fn unlink(&mut self, parent: NodeId, child: NodeId) {
        let connected = self.is_connected(parent);
        self.nodes[parent.0].children.retain(|&c| c != child);
        self.nodes[child.0].parent = None;
        trace!(?parent, ?child, "removed node");
        if connected {
            self.queue_record(MutationRecord {
                target: parent,
                added_nodes: Vec::new(),
                removed_nodes: vec![child],
            });
        }
    }

    pub fn get_attribute(&self, id: NodeId, name: &str) -> Option<String> {
        self.element(id)?.attribute(name).map(Cow::into_owned)
    }

    /// Set an attribute. `style` is routed to the element's style declaration.
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) {
        let element = match self.element_mut(id) {
            Some(e) => e,
            None => return,
        };
        if name.eq_ignore_ascii_case("style") {
            element.style.set_css_text(value);
        } else {
            element
                .attributes
                .0
                .insert(name.to_string(), value.to_string());
        }
    }

    pub fn remove_attribute(&mut self, id: NodeId, name: &str) {
        if let Some(element) = self.element_mut(id) {
            if name.eq_ignore_ascii_case("style") {
                element.style.set_css_text("");
            }
            element.attributes.0.remove(name);
        }
    }

    /// Concatenated text of `id` and its descendants
    pub fn text_content(&self, id: NodeId) -> String {
        let own = self.node(id).into_iter();
        let below = self.descendants(id).into_iter().filter_map(|n| self.node(n));
        own.chain(below)
            .filter_map(|n| match &n.node_type {
                DOMNodeType::Text(t) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Replace the children of `id` with a single text node
    pub fn set_text_content(&mut self, id: NodeId, text: &str) {
        if let Some(DOMNodeType::Text(t)) = self.nodes.get_mut(id.0).map(|n| &mut n.node_type) {
            *t = text.to_string();
            return;
        }
        self.remove_all_children(id);
        if !text.is_empty() {
            let node = self.create_text(text);
            self.link_and_record(id, node);
        }
    }

    /// Replace the children of `id` with parsed markup
    pub fn set_inner_html(&mut self, id: NodeId, markup: &str) {
        if !self.is_element(id) {
            return;
        }
        self.remove_all_children(id);
        for fragment in parsing::fragment(markup) {
            self.insert_fragment(id, fragment);
        }
    }

    fn link_and_record(&mut self, parent: NodeId, child: NodeId) {
        if let Err(err) = self.append_child(parent, child) {
            debug!(%err, "could not append node");
        }
    }

    fn insert_fragment(&mut self, parent: NodeId, fragment: Fragment) {
        let namespace = self.element(parent).map(|e| e.namespace).unwrap_or(Namespace::Html);
        match fragment {
            Fragment::Text(text) => {
                let node = self.create_text(&text);
                self.link_and_record(parent, node);
            }
            Fragment::Element {
                name,
                attributes,
                children,
            } => {
                let namespace = match name.to_ascii_lowercase().as_str() {
                    "svg" => Namespace::Svg,
                    "math" => Namespace::MathMl,
                    _ => namespace,
                };
                let node = self.create_element_ns(namespace, &name);
                self.copy_attributes(node, attributes);
                for child in children {
                    self.insert_fragment(node, child);
                }
                self.link_and_record(parent, node);
            }
        }
    }

    /// Serialize `id` and its descendants
    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.serialize(id, &mut out);
        out
    }

    /// Serialize the descendants of `id`
    pub fn inner_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        for &child in self.children(id) {
            self.serialize(child, &mut out);
        }
        out
    }

    fn serialize(&self, id: NodeId, out: &mut String) {
        let node = match self.node(id) {
            Some(n) => n,
            None => return,
        };
        match &node.node_type {
            DOMNodeType::Document => {
                for &child in &node.children {
                    self.serialize(child, out);
                }
            }
            DOMNodeType::Text(text) => out.push_str(&parsing::escape_text(text)),
            DOMNodeType::Element(element) => {
                out.push('<');
                out.push_str(&element.tag_name);
                for (name, value) in element.attributes.sorted() {
                    out.push_str(&format!(" {}=\"{}\"", name, parsing::escape_attribute(value)));
                }
                if !element.style.is_empty() {
                    out.push_str(&format!(
                        " style=\"{}\"",
                        parsing::escape_attribute(&element.style.css_text())
                    ));
                }
                out.push('>');
                if element.namespace == Namespace::Html && parsing::is_void(&element.tag_name) {
                    return;
                }
                for &child in &node.children {
                    self.serialize(child, out);
                }
                out.push_str("</");
                out.push_str(&element.tag_name);
                out.push('>');
            }
        }
    }
}
