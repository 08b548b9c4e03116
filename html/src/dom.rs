use std::borrow::Cow;
use std::collections::HashMap;

use crate::style::StyleDeclaration;

/// Index of a node in its document. Nodes are never freed, so an id keeps
/// referring to the same node after it is removed and re-inserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Namespace {
    Html,
    Svg,
    MathMl,
}

impl Namespace {
    pub fn uri(&self) -> &'static str {
        match self {
            Namespace::Html => "http://www.w3.org/1999/xhtml",
            Namespace::Svg => "http://www.w3.org/2000/svg",
            Namespace::MathMl => "http://www.w3.org/1998/Math/MathML",
        }
    }
}

#[derive(Debug)]
pub struct DOMNode {
    pub node_type: DOMNodeType,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
}

impl DOMNode {
    pub(crate) fn new(node_type: DOMNodeType) -> Self {
        Self {
            node_type,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn as_element(&self) -> Option<&DOMElement> {
        match &self.node_type {
            DOMNodeType::Element(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut DOMElement> {
        match &mut self.node_type {
            DOMNodeType::Element(e) => Some(e),
            _ => None,
        }
    }

    pub fn is_element(&self) -> bool {
        matches!(self.node_type, DOMNodeType::Element(_))
    }
}

#[derive(Debug)]
pub enum DOMNodeType {
    Document,
    Element(DOMElement),
    Text(String),
}

#[derive(Debug)]
pub struct DOMElement {
    pub tag_name: String,
    pub namespace: Namespace,
    pub attributes: DOMAttributes,
    pub style: StyleDeclaration,
}

impl DOMElement {
    pub fn new(tag_name: &str, namespace: Namespace) -> Self {
        // HTML tag names are case-insensitive and stored lowercase
        let tag_name = match namespace {
            Namespace::Html => tag_name.to_ascii_lowercase(),
            _ => tag_name.to_string(),
        };
        Self {
            tag_name,
            namespace,
            attributes: DOMAttributes::empty(),
            style: StyleDeclaration::default(),
        }
    }

    pub fn get_attribute(&self, name: &str) -> Option<&str> {
        self.attributes.0.get(name).map(String::as_str)
    }

    /// Attribute value as the document reports it, with `style` serialized
    /// from the style declaration
    pub fn attribute(&self, name: &str) -> Option<Cow<'_, str>> {
        if name.eq_ignore_ascii_case("style") && !self.style.is_empty() {
            return Some(Cow::Owned(self.style.css_text()));
        }
        self.get_attribute(name).map(Cow::Borrowed)
    }

    pub fn id(&self) -> Option<&str> {
        self.get_attribute("id")
    }

    pub fn class_list(&self) -> impl Iterator<Item = &str> {
        self.get_attribute("class")
            .unwrap_or_default()
            .split_whitespace()
    }

    /// Check if the `class` attribute is present and contains the specified class
    pub fn has_class(&self, class: &str) -> bool {
        self.class_list().any(|c| c == class)
    }

    /// Check if the `id` attribute exists and is an exact match for the provided ID
    pub fn id_is(&self, id: &str) -> bool {
        self.id() == Some(id)
    }

    /// Type selectors match HTML elements case-insensitively
    pub fn has_tag(&self, name: &str) -> bool {
        match self.namespace {
            Namespace::Html => self.tag_name.eq_ignore_ascii_case(name),
            _ => self.tag_name == name,
        }
    }
}

#[derive(Debug, Default, Clone, Eq, PartialEq)]
pub struct DOMAttributes(pub HashMap<String, String>);

impl DOMAttributes {
    pub fn empty() -> Self {
        Self(HashMap::new())
    }

    /// Attributes sorted by name, for stable output
    pub fn sorted(&self) -> Vec<(&str, &str)> {
        let mut attrs: Vec<(&str, &str)> = self
            .0
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        attrs.sort_unstable();
        attrs
    }
}
