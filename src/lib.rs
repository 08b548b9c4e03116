//! Build DOM and SVG elements from compact selector strings, and run queued
//! operations on every element that comes to match a selector.
//!
//! ```
//! use elkit::builder::make;
//! use html::Document;
//!
//! let mut doc = Document::from_html(r#"<ul id="menu"></ul>"#);
//! let item = make(&mut doc, "#menu > li.item[data-k=1]", "first", None);
//! assert_eq!(
//!     doc.outer_html(item),
//!     r#"<li class="item" data-k="1">first</li>"#
//! );
//! ```

pub mod builder;
pub mod perpetual;
pub mod style;

pub use builder::{draw, make, make_spec, math, Content, ElementSpec};
pub use perpetual::{
    query_selector_perpetual, Operation, OperationKind, Outcome, PerpetualOptions, PerpetualQuery,
};
pub use style::apply_styles;
