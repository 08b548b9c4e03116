//! An in-memory document: arena-allocated nodes, query selectors, per-element
//! style declarations and batched mutation observation.

mod document;
mod dom;
mod observer;
mod parsing;
mod query;
mod style;
#[cfg(test)]
mod tests;

pub use document::{Document, DomError};
pub use dom::{DOMAttributes, DOMElement, DOMNode, DOMNodeType, Namespace, NodeId};
pub use observer::{MutationObserver, MutationRecord, ObserverId};
pub use style::StyleDeclaration;
