use css::{AttributeSelector, Combinator, Selector, SelectorError, SelectorList, SimpleSelector};

use crate::document::Document;
use crate::dom::{DOMElement, NodeId};

impl Document {
    /// Check if `node` is selected by `selector`
    pub fn matches(&self, node: NodeId, selector: &str) -> Result<bool, SelectorError> {
        let list = SelectorList::parse(selector)?;
        Ok(self.matches_selector(node, &list))
    }

    /// Check if `node` is selected by any selector in `list`
    pub fn matches_selector(&self, node: NodeId, list: &SelectorList) -> bool {
        list.0.iter().any(|s| self.does_rule_apply(node, s))
    }

    /// First element in document order selected by `selector`
    pub fn query_selector(&self, selector: &str) -> Result<Option<NodeId>, SelectorError> {
        let list = SelectorList::parse(selector)?;
        Ok(self.query_selector_parsed(&list))
    }

    pub fn query_selector_parsed(&self, list: &SelectorList) -> Option<NodeId> {
        self.descendants(self.root())
            .into_iter()
            .find(|&n| self.matches_selector(n, list))
    }

    /// Every element selected by `selector`, in document order
    pub fn query_selector_all(&self, selector: &str) -> Result<Vec<NodeId>, SelectorError> {
        let list = SelectorList::parse(selector)?;
        Ok(self.query_selector_all_parsed(&list))
    }

    pub fn query_selector_all_parsed(&self, list: &SelectorList) -> Vec<NodeId> {
        self.descendants(self.root())
            .into_iter()
            .filter(|&n| self.matches_selector(n, list))
            .collect()
    }

    /// Check if the provided [`Selector`] selects this node
    fn does_rule_apply(&self, node: NodeId, selector: &Selector) -> bool {
        let element = match self.element(node) {
            Some(e) => e,
            None => return false,
        };
        match selector {
            Selector::Simple(s) => does_simple_selector_apply(element, s),
            Selector::Compound(sels) => sels.iter().all(|s| does_simple_selector_apply(element, s)),
            Selector::Combinator(left, combinator, right) => {
                if !self.does_rule_apply(node, right) {
                    return false;
                }
                match combinator {
                    Combinator::Descendant => self
                        .ancestors(node)
                        .any(|a| self.does_rule_apply(a, left)),
                    Combinator::Child => self
                        .parent(node)
                        .map_or(false, |p| self.does_rule_apply(p, left)),
                    Combinator::NextSibling => self
                        .preceding_element_siblings(node)
                        .next()
                        .map_or(false, |s| self.does_rule_apply(s, left)),
                    Combinator::SubsequentSibling => self
                        .preceding_element_siblings(node)
                        .any(|s| self.does_rule_apply(s, left)),
                }
            }
        }
    }
}

/// Check if the provided [`SimpleSelector`] selects this element
fn does_simple_selector_apply(element: &DOMElement, selector: &SimpleSelector) -> bool {
    match selector {
        SimpleSelector::Type(name) => element.has_tag(name),
        SimpleSelector::Universal => true,
        SimpleSelector::Attribute(AttributeSelector::Has(name)) => {
            element.attribute(name).is_some()
        }
        SimpleSelector::Attribute(AttributeSelector::Equals(name, value)) => {
            element.attribute(name).as_deref() == Some(value.as_str())
        }
        SimpleSelector::Class(name) => element.has_class(name),
        SimpleSelector::ID(id) => element.id_is(id),
    }
}
