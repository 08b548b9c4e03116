use lazy_static::lazy_static;
use std::collections::HashSet;

/// Check whether a property name is in CSS notation, i.e. has a `-` followed
/// by another character (`margin-left`, `-webkit-transition`)
pub fn has_css_notation(name: &str) -> bool {
    name.char_indices()
        .any(|(i, c)| c == '-' && name[i + 1..].chars().next().is_some())
}

/// Convert CSS notation to JS notation: every `-x` becomes `X`.
/// A trailing `-` has nothing to uppercase and is kept.
pub fn kebab_to_camel(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut chars = name.chars();
    while let Some(c) = chars.next() {
        if c == '-' {
            match chars.next() {
                Some(next) => out.extend(next.to_uppercase()),
                None => out.push(c),
            }
        } else {
            out.push(c);
        }
    }
    out
}
#[cfg(test)]
#[test]
fn test_kebab_to_camel() {
    assert_eq!(kebab_to_camel("margin-left"), "marginLeft");
    assert_eq!(kebab_to_camel("-webkit-transition"), "WebkitTransition");
    assert_eq!(kebab_to_camel("border-top-left-radius"), "borderTopLeftRadius");
    assert_eq!(kebab_to_camel("a--b"), "a-b");
    assert_eq!(kebab_to_camel("color"), "color");
    assert_eq!(kebab_to_camel("trailing-"), "trailing-");
}

/// Convert JS notation back to the CSS property name. A leading capital marks a
/// vendor prefix (`WebkitTransition` -> `-webkit-transition`).
pub fn camel_to_kebab(name: &str) -> String {
    if name == "cssFloat" {
        return "float".to_string();
    }
    let mut out = String::with_capacity(name.len() + 4);
    for c in name.chars() {
        if c.is_ascii_uppercase() {
            out.push('-');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}
#[cfg(test)]
#[test]
fn test_camel_to_kebab() {
    assert_eq!(camel_to_kebab("marginLeft"), "margin-left");
    assert_eq!(camel_to_kebab("WebkitTransition"), "-webkit-transition");
    assert_eq!(camel_to_kebab("cssFloat"), "float");
    assert_eq!(camel_to_kebab("color"), "color");
}

/// Whether the style engine recognises a (CSS notation) property name
pub fn is_known_property(name: &str) -> bool {
    KNOWN.contains(name)
}

lazy_static! {
    static ref KNOWN: HashSet<&'static str> = KNOWN_PROPERTIES.iter().copied().collect();
}

static KNOWN_PROPERTIES: &[&str] = &[
    "align-content",
    "align-items",
    "align-self",
    "all",
    "animation",
    "animation-delay",
    "animation-direction",
    "animation-duration",
    "animation-fill-mode",
    "animation-iteration-count",
    "animation-name",
    "animation-play-state",
    "animation-timing-function",
    "appearance",
    "aspect-ratio",
    "backdrop-filter",
    "backface-visibility",
    "background",
    "background-attachment",
    "background-blend-mode",
    "background-clip",
    "background-color",
    "background-image",
    "background-origin",
    "background-position",
    "background-repeat",
    "background-size",
    "border",
    "border-bottom",
    "border-bottom-color",
    "border-bottom-left-radius",
    "border-bottom-right-radius",
    "border-bottom-style",
    "border-bottom-width",
    "border-collapse",
    "border-color",
    "border-image",
    "border-left",
    "border-left-color",
    "border-left-style",
    "border-left-width",
    "border-radius",
    "border-right",
    "border-right-color",
    "border-right-style",
    "border-right-width",
    "border-spacing",
    "border-style",
    "border-top",
    "border-top-color",
    "border-top-left-radius",
    "border-top-right-radius",
    "border-top-style",
    "border-top-width",
    "border-width",
    "bottom",
    "box-shadow",
    "box-sizing",
    "caption-side",
    "clear",
    "clip-path",
    "color",
    "column-count",
    "column-gap",
    "columns",
    "content",
    "cursor",
    "cx",
    "cy",
    "d",
    "direction",
    "display",
    "empty-cells",
    "fill",
    "fill-opacity",
    "fill-rule",
    "filter",
    "flex",
    "flex-basis",
    "flex-direction",
    "flex-flow",
    "flex-grow",
    "flex-shrink",
    "flex-wrap",
    "float",
    "font",
    "font-family",
    "font-size",
    "font-style",
    "font-variant",
    "font-weight",
    "gap",
    "grid",
    "grid-area",
    "grid-auto-columns",
    "grid-auto-flow",
    "grid-auto-rows",
    "grid-column",
    "grid-row",
    "grid-template",
    "grid-template-areas",
    "grid-template-columns",
    "grid-template-rows",
    "height",
    "inset",
    "justify-content",
    "justify-items",
    "justify-self",
    "left",
    "letter-spacing",
    "line-height",
    "list-style",
    "list-style-image",
    "list-style-position",
    "list-style-type",
    "margin",
    "margin-bottom",
    "margin-left",
    "margin-right",
    "margin-top",
    "mask",
    "max-height",
    "max-width",
    "min-height",
    "min-width",
    "mix-blend-mode",
    "object-fit",
    "object-position",
    "opacity",
    "order",
    "outline",
    "outline-color",
    "outline-offset",
    "outline-style",
    "outline-width",
    "overflow",
    "overflow-x",
    "overflow-y",
    "padding",
    "padding-bottom",
    "padding-left",
    "padding-right",
    "padding-top",
    "perspective",
    "pointer-events",
    "position",
    "r",
    "resize",
    "right",
    "row-gap",
    "rx",
    "ry",
    "scroll-behavior",
    "stop-color",
    "stop-opacity",
    "stroke",
    "stroke-dasharray",
    "stroke-dashoffset",
    "stroke-linecap",
    "stroke-linejoin",
    "stroke-opacity",
    "stroke-width",
    "table-layout",
    "text-align",
    "text-anchor",
    "text-decoration",
    "text-indent",
    "text-overflow",
    "text-shadow",
    "text-transform",
    "top",
    "transform",
    "transform-origin",
    "transition",
    "transition-delay",
    "transition-duration",
    "transition-property",
    "transition-timing-function",
    "user-select",
    "vertical-align",
    "visibility",
    "white-space",
    "width",
    "will-change",
    "word-break",
    "word-spacing",
    "word-wrap",
    "writing-mode",
    "x",
    "y",
    "z-index",
    "-webkit-appearance",
    "-webkit-transition",
    "-webkit-transform",
    "-webkit-user-select",
    "-moz-appearance",
    "-moz-user-select",
];
