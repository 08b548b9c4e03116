use css::{has_css_notation, kebab_to_camel, StyleAssignment};
use html::{Document, NodeId};
use tracing::trace;

/// Apply a set of style assignments to an element, in order.
///
/// Custom properties (`--name`) are set verbatim, CSS notation (`margin-left`)
/// is converted to its JS name first, and anything else is assigned as given.
/// Names the style engine does not know are ignored by it.
pub fn apply_styles(doc: &mut Document, element: NodeId, styles: &StyleAssignment) {
    let style = match doc.style_mut(element) {
        Some(s) => s,
        None => return,
    };
    for (name, value) in styles.iter() {
        let value = value.to_string();
        if name.starts_with("--") {
            style.set_property(name, &value);
        } else if has_css_notation(name) {
            style.set(&kebab_to_camel(name), &value);
        } else {
            style.set(name, &value);
        }
        trace!(property = name, value = value.as_str(), "applied style");
    }
}
