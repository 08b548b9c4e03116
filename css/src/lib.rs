use std::collections::HashMap;
use std::fmt;

/// Tag used when an element definition does not name one
pub const DEFAULT_TAG: &str = "div";

/// The structured form of `tag#id.class[attr=value]`
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct ElementDefinition {
    pub tag_name: String,
    pub id: Option<String>,
    pub class_list: Vec<String>,
    pub attributes: HashMap<String, String>,
}

impl Default for ElementDefinition {
    fn default() -> Self {
        Self {
            tag_name: DEFAULT_TAG.to_string(),
            id: None,
            class_list: Vec::new(),
            attributes: HashMap::new(),
        }
    }
}

impl ElementDefinition {
    /// Parse an element definition. Never fails: anything that is not tag, id,
    /// class or attribute syntax is dropped.
    pub fn parse(selector: &str) -> Self {
        selector_to_components(selector)
    }

    /// Merge attributes supplied outside the selector. Later writes win.
    pub fn with_attributes<K, V>(mut self, extra: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.attributes
            .extend(extra.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }
}

/// Where a new element should be attached relative to an existing one
#[derive(PartialEq, Eq, Clone, Debug)]
pub enum Relation {
    // (>)
    Parent(String),
    // (+)
    Sibling(String),
}

/// An element definition split from its optional `parent >` / `sibling +` prefix
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct RelativeSelector {
    pub element_definition: String,
    pub relation: Option<Relation>,
}

impl RelativeSelector {
    pub fn parse(input: &str) -> Self {
        resolve_relative_element(input)
    }

    pub fn parent_selector(&self) -> Option<&str> {
        match &self.relation {
            Some(Relation::Parent(s)) => Some(s),
            _ => None,
        }
    }

    pub fn sibling_selector(&self) -> Option<&str> {
        match &self.relation {
            Some(Relation::Sibling(s)) => Some(s),
            _ => None,
        }
    }
}

/// A parsed query selector list (`a, b > c`)
#[derive(PartialEq, Clone, Debug)]
pub struct SelectorList(pub Vec<Selector>);

impl SelectorList {
    pub fn parse(input: &str) -> Result<Self, SelectorError> {
        parse_selector_list(input)
    }
}

#[derive(PartialEq, Clone, Debug)]
pub enum Selector {
    Simple(SimpleSelector),
    Compound(Vec<SimpleSelector>),
    Combinator(Box<Selector>, Combinator, Box<Selector>),
}

#[derive(PartialEq, Clone, Copy, Debug)]
pub enum Combinator {
    // ( )
    Descendant,
    // (>)
    Child,
    // (+)
    NextSibling,
    // (~)
    SubsequentSibling,
}

#[derive(PartialEq, Clone, Debug)]
pub enum SimpleSelector {
    Type(String),
    Universal,
    Attribute(AttributeSelector),
    Class(String),
    ID(String),
}

#[derive(PartialEq, Clone, Debug)]
pub enum AttributeSelector {
    // [att]
    Has(String),
    // [att=val]
    Equals(String, String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectorError {
    #[error("empty selector")]
    Empty,
    #[error("'{0}' is not a valid selector")]
    Invalid(String),
}

/// A style value as written by the caller, either text or a bare number
#[derive(PartialEq, Clone, Debug)]
pub enum StyleValue {
    Text(String),
    Number(f64),
}

impl fmt::Display for StyleValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StyleValue::Text(s) => f.write_str(s),
            StyleValue::Number(n) => write!(f, "{}", n),
        }
    }
}

impl From<&str> for StyleValue {
    fn from(s: &str) -> Self {
        StyleValue::Text(s.to_string())
    }
}

impl From<String> for StyleValue {
    fn from(s: String) -> Self {
        StyleValue::Text(s)
    }
}

impl From<f64> for StyleValue {
    fn from(n: f64) -> Self {
        StyleValue::Number(n)
    }
}

impl From<i32> for StyleValue {
    fn from(n: i32) -> Self {
        StyleValue::Number(n.into())
    }
}

impl From<u32> for StyleValue {
    fn from(n: u32) -> Self {
        StyleValue::Number(n.into())
    }
}

/// Property name -> value pairs, applied in order. Names may be custom
/// properties (`--gap`), CSS notation (`margin-left`) or JS notation (`marginLeft`).
#[derive(PartialEq, Clone, Debug, Default)]
pub struct StyleAssignment(pub Vec<(String, StyleValue)>);

impl StyleAssignment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, name: impl Into<String>, value: impl Into<StyleValue>) -> Self {
        self.0.push((name.into(), value.into()));
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &StyleValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn extend(&mut self, other: &StyleAssignment) {
        self.0.extend(other.0.iter().cloned());
    }
}

impl<K: Into<String>, V: Into<StyleValue>> FromIterator<(K, V)> for StyleAssignment {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

#[macro_export]
macro_rules! styles {
    ($($k:expr => $v:expr),* $(,)?) => {
        $crate::StyleAssignment(vec![$(($k.to_string(), $crate::StyleValue::from($v))),*])
    };
}

#[macro_export]
macro_rules! attributes {
    ($($k:expr => $v:expr),* $(,)?) => {
        ::std::collections::HashMap::<String, String>::from([$(($k.to_string(), $v.to_string())),*])
    };
}

mod definition;
mod properties;
mod selectors;
#[cfg(test)]
mod tests;

pub use definition::{
    attribute_tokens, extract_attributes, resolve_relative_element, selector_to_components,
    AttributeToken,
};
pub use properties::{camel_to_kebab, has_css_notation, is_known_property, kebab_to_camel};
pub use selectors::parse_selector_list;
