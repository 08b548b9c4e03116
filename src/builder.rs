//! Build elements from selector strings such as `ul#menu > li.item[data-k=v]`
//! and attach them to the document.

use std::collections::HashMap;

use css::{ElementDefinition, Relation, RelativeSelector, SelectorError, StyleAssignment};
use html::{Document, Namespace, NodeId};
use tracing::{debug, span, trace, warn, Level};

use crate::style::apply_styles;

/// What to put inside a newly built element
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Content {
    #[default]
    None,
    Text(String),
    /// Markup, parsed into child nodes
    Html(String),
    Node(NodeId),
    /// Non-element nodes in the list are skipped
    Nodes(Vec<NodeId>),
}

impl From<&str> for Content {
    fn from(s: &str) -> Self {
        Content::Text(s.to_string())
    }
}

impl From<String> for Content {
    fn from(s: String) -> Self {
        Content::Text(s)
    }
}

impl From<f64> for Content {
    fn from(n: f64) -> Self {
        Content::Text(n.to_string())
    }
}

impl From<i32> for Content {
    fn from(n: i32) -> Self {
        Content::Text(n.to_string())
    }
}

impl From<NodeId> for Content {
    fn from(node: NodeId) -> Self {
        Content::Node(node)
    }
}

impl From<Vec<NodeId>> for Content {
    fn from(nodes: Vec<NodeId>) -> Self {
        Content::Nodes(nodes)
    }
}

impl<T: Into<Content>> From<Option<T>> for Content {
    fn from(content: Option<T>) -> Self {
        content.map_or(Content::None, Into::into)
    }
}

/// Build an HTML element from `selector` and attach it where its
/// `parent >` or `sibling +` prefix says. Returns the element even when it
/// could not be attached.
pub fn make(
    doc: &mut Document,
    selector: &str,
    content: impl Into<Content>,
    styles: Option<&StyleAssignment>,
) -> NodeId {
    build(doc, Namespace::Html, selector, content.into(), styles)
}

/// [`make`] for SVG elements
pub fn draw(
    doc: &mut Document,
    selector: &str,
    content: impl Into<Content>,
    styles: Option<&StyleAssignment>,
) -> NodeId {
    build(doc, Namespace::Svg, selector, content.into(), styles)
}

/// [`make`] for MathML elements
pub fn math(
    doc: &mut Document,
    selector: &str,
    content: impl Into<Content>,
    styles: Option<&StyleAssignment>,
) -> NodeId {
    build(doc, Namespace::MathMl, selector, content.into(), styles)
}

fn build(
    doc: &mut Document,
    namespace: Namespace,
    selector: &str,
    content: Content,
    styles: Option<&StyleAssignment>,
) -> NodeId {
    let span = span!(Level::DEBUG, "build", selector, ?namespace);
    let _enter = span.enter();
    let relative = RelativeSelector::parse(selector);
    let definition = ElementDefinition::parse(&relative.element_definition);
    let element = create(doc, namespace, &definition);
    fill(doc, element, content);
    if let Some(styles) = styles {
        apply_styles(doc, element, styles);
    }
    attach(doc, element, relative.relation.as_ref());
    element
}

/// Create a detached element carrying the definition's id, classes and attributes
fn create(doc: &mut Document, namespace: Namespace, definition: &ElementDefinition) -> NodeId {
    let element = doc.create_element_ns(namespace, &definition.tag_name);
    if let Some(id) = &definition.id {
        doc.set_attribute(element, "id", id);
    }
    if !definition.class_list.is_empty() {
        doc.set_attribute(element, "class", &definition.class_list.join(" "));
    }
    for (name, value) in &definition.attributes {
        doc.set_attribute(element, name, value);
    }
    trace!(?element, ?definition, "created element");
    element
}

fn fill(doc: &mut Document, element: NodeId, content: Content) {
    match content {
        Content::None => {}
        Content::Text(text) => doc.set_text_content(element, &text),
        Content::Html(markup) => doc.set_inner_html(element, &markup),
        Content::Node(node) => append(doc, element, &[node]),
        Content::Nodes(nodes) => append(doc, element, &nodes),
    }
}

/// First element matching `selector`. Empty and invalid selectors match nothing.
fn find(doc: &Document, selector: &str) -> Option<NodeId> {
    if selector.is_empty() {
        return None;
    }
    match doc.query_selector(selector) {
        Ok(found) => found,
        Err(err) => {
            warn!(%err, "ignoring relation");
            None
        }
    }
}

fn attach(doc: &mut Document, element: NodeId, relation: Option<&Relation>) {
    let result = match relation {
        Some(Relation::Parent(selector)) => match find(doc, selector) {
            Some(parent) => doc.append_child(parent, element),
            None => {
                debug!(parent = selector.as_str(), "no parent to attach to");
                return;
            }
        },
        Some(Relation::Sibling(selector)) => {
            let sibling = find(doc, selector);
            match sibling.and_then(|s| doc.parent(s).map(|p| (p, s))) {
                Some((parent, sibling)) => {
                    let next = doc.next_sibling(sibling);
                    doc.insert_before(parent, element, next)
                }
                None => {
                    debug!(sibling = selector.as_str(), "no sibling to attach after");
                    return;
                }
            }
        }
        None => return,
    };
    if let Err(err) = result {
        warn!(%err, "could not attach element");
    }
}

/// The object form of an element definition. Fields that are set override or
/// extend what `selector` describes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementSpec {
    pub selector: String,
    pub tag_name: Option<String>,
    pub id: Option<String>,
    pub class_list: Vec<String>,
    pub attributes: HashMap<String, String>,
    pub text: Option<String>,
    pub html: Option<String>,
    pub children: Vec<ElementSpec>,
    pub style: StyleAssignment,
    /// Each becomes a `--name` custom property
    pub css_variables: Vec<(String, String)>,
}

impl ElementSpec {
    pub fn new(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            ..Default::default()
        }
    }

    pub fn child(mut self, child: ElementSpec) -> Self {
        self.children.push(child);
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }
}

/// Build an element (and its children) from an [`ElementSpec`]
pub fn make_spec(doc: &mut Document, spec: &ElementSpec, namespace: Namespace) -> NodeId {
    let span = span!(Level::DEBUG, "make_spec", selector = spec.selector.as_str());
    let _enter = span.enter();
    let relative = RelativeSelector::parse(&spec.selector);
    let mut definition = ElementDefinition::parse(&relative.element_definition)
        .with_attributes(spec.attributes.clone());
    if let Some(tag_name) = &spec.tag_name {
        definition.tag_name = tag_name.clone();
    }
    if spec.id.is_some() {
        definition.id = spec.id.clone();
    }
    definition.class_list.extend(spec.class_list.iter().cloned());

    let element = create(doc, namespace, &definition);
    if let Some(text) = &spec.text {
        doc.set_text_content(element, text);
    }
    if let Some(markup) = &spec.html {
        doc.set_inner_html(element, markup);
    }
    for child in &spec.children {
        let node = make_spec(doc, child, namespace);
        // A child with its own relation has already been placed
        if doc.parent(node).is_none() {
            append(doc, element, &[node]);
        }
    }

    let mut styles = spec.style.clone();
    for (name, value) in &spec.css_variables {
        let name = if name.starts_with("--") {
            name.clone()
        } else {
            format!("--{}", name)
        };
        styles.0.push((name, value.as_str().into()));
    }
    if !styles.is_empty() {
        apply_styles(doc, element, &styles);
    }
    attach(doc, element, relative.relation.as_ref());
    element
}

/// Append `node` to the first element matching `parent_selector`.
/// Returns the parent it was appended to.
pub fn append_to(doc: &mut Document, node: NodeId, parent_selector: &str) -> Option<NodeId> {
    let parent = find(doc, parent_selector)?;
    match doc.append_child(parent, node) {
        Ok(_) => Some(parent),
        Err(err) => {
            warn!(%err, "could not append");
            None
        }
    }
}

/// Append each element of `children` to `parent`, in order. Other nodes are
/// skipped.
pub fn append(doc: &mut Document, parent: NodeId, children: &[NodeId]) {
    for &child in children {
        if !doc.is_element(child) {
            trace!(?child, "skipping non-element");
            continue;
        }
        if let Err(err) = doc.append_child(parent, child) {
            warn!(%err, ?child, "could not append");
        }
    }
}

/// Detach every element matching `selector`. Returns how many were removed.
pub fn remove(doc: &mut Document, selector: &str) -> Result<usize, SelectorError> {
    let nodes = doc.query_selector_all(selector)?;
    for &node in &nodes {
        doc.remove(node);
    }
    Ok(nodes.len())
}

/// Empty every element matching `selector`
pub fn remove_all_children(doc: &mut Document, selector: &str) -> Result<usize, SelectorError> {
    let nodes = doc.query_selector_all(selector)?;
    for &node in &nodes {
        doc.remove_all_children(node);
    }
    Ok(nodes.len())
}

/// Apply `styles` to every element matching `selector`
pub fn apply_style(
    doc: &mut Document,
    selector: &str,
    styles: &StyleAssignment,
) -> Result<usize, SelectorError> {
    let nodes = doc.query_selector_all(selector)?;
    for &node in &nodes {
        apply_styles(doc, node, styles);
    }
    Ok(nodes.len())
}

/// Replace the content of every element matching `selector` with `text`
pub fn text(doc: &mut Document, selector: &str, text: &str) -> Result<usize, SelectorError> {
    let nodes = doc.query_selector_all(selector)?;
    for &node in &nodes {
        doc.set_text_content(node, text);
    }
    Ok(nodes.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use css::{attributes, styles};

    #[test]
    fn test_make_unattached() {
        let mut doc = Document::new();
        let el = make(&mut doc, "a#home.nav.active[href=/][title='Go home']", "Home", None);
        assert_eq!(
            doc.outer_html(el),
            r#"<a class="nav active" href="/" id="home" title="Go home">Home</a>"#
        );
        assert_eq!(doc.parent(el), None);
    }

    #[test]
    fn test_make_defaults() {
        let mut doc = Document::new();
        let el = make(&mut doc, "", Content::None, None);
        assert_eq!(doc.outer_html(el), "<div></div>");
        let el = make(&mut doc, ".x", 4.5, None);
        assert_eq!(doc.outer_html(el), r#"<div class="x">4.5</div>"#);
    }

    #[test]
    fn test_make_with_parent() {
        let mut doc = Document::from_html(r#"<ul id="menu"></ul>"#);
        let first = make(&mut doc, "#menu > li.item", "one", None);
        let second = make(&mut doc, "ul > li.item", "two", None);
        let menu = doc.query_selector("#menu").unwrap().unwrap();
        assert_eq!(doc.children(menu), &[first, second]);
    }

    #[test]
    fn test_make_with_sibling() {
        let mut doc = Document::from_html(r#"<p id="a"></p><p id="c"></p>"#);
        let b = make(&mut doc, "#a + p#b", Content::None, None);
        let ids: Vec<String> = doc
            .children(doc.body())
            .iter()
            .filter_map(|&n| doc.get_attribute(n, "id"))
            .collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(doc.parent(b), Some(doc.body()));
    }

    #[test]
    fn test_unmatched_or_invalid_relations_leave_element_detached() {
        let mut doc = Document::new();
        for selector in ["#missing > p", "> p", "+ p", "p:: > p"] {
            let el = make(&mut doc, selector, Content::None, None);
            assert_eq!(doc.parent(el), None, "{}", selector);
        }
    }

    #[test]
    fn test_attribute_values_are_not_relations() {
        let mut doc = Document::new();
        let el = make(&mut doc, "a[href='/x>y']", Content::None, None);
        assert_eq!(doc.get_attribute(el, "href").as_deref(), Some("/x>y"));
        assert_eq!(doc.parent(el), None);
    }

    #[test]
    fn test_content_kinds() {
        let mut doc = Document::new();
        let el = make(&mut doc, "div", Content::Html("<b>bold</b> text".into()), None);
        assert_eq!(doc.inner_html(el), "<b>bold</b> text");

        let child = doc.create_element("span");
        let text = doc.create_text("skipped");
        let list = make(&mut doc, "div", vec![child, text], None);
        assert_eq!(doc.children(list), &[child]);

        let single = make(&mut doc, "div", text, None);
        assert!(doc.children(single).is_empty());
        assert_eq!(doc.parent(text), None);

        let none = make(&mut doc, "div", None::<&str>, None);
        assert!(doc.children(none).is_empty());
    }

    #[test]
    fn test_styles() {
        let mut doc = Document::new();
        let el = make(
            &mut doc,
            "div",
            Content::None,
            Some(&styles! { "--size" => "2em", "font-size" => "var(--size)", "zIndex" => 2 }),
        );
        assert_eq!(
            doc.get_attribute(el, "style").as_deref(),
            Some("--size: 2em; font-size: var(--size); z-index: 2;")
        );
    }

    #[test]
    fn test_draw_and_math() {
        let mut doc = Document::from_html(r#"<svg id="canvas"></svg>"#);
        let circle = draw(&mut doc, "#canvas > circle.dot[r=4]", Content::None, None);
        let element = doc.element(circle).unwrap();
        assert_eq!(element.namespace, Namespace::Svg);
        assert_eq!(element.get_attribute("r"), Some("4"));
        assert!(doc.matches(circle, "svg > circle.dot").unwrap());

        let gradient = draw(&mut doc, "linearGradient", Content::None, None);
        assert_eq!(doc.element(gradient).unwrap().tag_name, "linearGradient");

        let mi = math(&mut doc, "mi", "x", None);
        assert_eq!(doc.element(mi).unwrap().namespace, Namespace::MathMl);
    }

    #[test]
    fn test_make_spec() {
        let mut doc = Document::from_html(r#"<main></main>"#);
        let spec = ElementSpec {
            selector: "main > section.card[data-k=1]".into(),
            id: Some("first".into()),
            class_list: vec!["wide".into()],
            attributes: attributes! { "data-k" => "2", "role" => "note" },
            style: styles! { "marginTop" => "1px" },
            css_variables: vec![("accent".into(), "red".into())],
            ..Default::default()
        }
        .child(ElementSpec::new("h2").text("Title"))
        .child(ElementSpec {
            html: Some("<em>body</em>".into()),
            ..ElementSpec::new("p")
        });

        let section = make_spec(&mut doc, &spec, Namespace::Html);
        let main = doc.query_selector("main").unwrap().unwrap();
        assert_eq!(doc.parent(section), Some(main));
        assert_eq!(
            doc.outer_html(section),
            concat!(
                r#"<section class="card wide" data-k="2" id="first" role="note" "#,
                r#"style="margin-top: 1px; --accent: red;">"#,
                "<h2>Title</h2><p><em>body</em></p></section>"
            )
        );
    }

    #[test]
    fn test_helpers() {
        let mut doc = Document::from_html(r#"<ul><li>a</li><li>b</li></ul><ol></ol>"#);
        let li = doc.create_element("li");
        let ol = doc.query_selector("ol").unwrap().unwrap();
        assert_eq!(append_to(&mut doc, li, "ol"), Some(ol));
        assert_eq!(append_to(&mut doc, li, "table"), None);

        assert_eq!(text(&mut doc, "li", "x"), Ok(3));
        assert_eq!(doc.text_content(doc.body()), "xxx");

        assert_eq!(apply_style(&mut doc, "li", &styles! { "color" => "red" }), Ok(3));
        assert_eq!(doc.get_attribute(li, "style").as_deref(), Some("color: red;"));

        assert_eq!(remove_all_children(&mut doc, "ul"), Ok(1));
        assert_eq!(doc.query_selector_all("li").unwrap(), vec![li]);

        assert_eq!(remove(&mut doc, "ol"), Ok(1));
        assert_eq!(doc.inner_html(doc.body()), "<ul></ul>");
        assert!(remove(&mut doc, "ol >").is_err());

        let parent = doc.create_element("div");
        let (a, b) = (doc.create_element("i"), doc.create_element("b"));
        let text = doc.create_text("t");
        append(&mut doc, parent, &[a, text, b]);
        assert_eq!(doc.children(parent), &[a, b]);
    }

    #[test]
    fn test_built_elements_reach_perpetual_queries() {
        use crate::perpetual::{query_selector_perpetual, PerpetualOptions};
        use std::cell::Cell;
        use std::rc::Rc;

        let mut doc = Document::new();
        let seen = Rc::new(Cell::new(0));
        let sink = seen.clone();
        let _query = query_selector_perpetual(&mut doc, ".toast", PerpetualOptions::default())
            .unwrap()
            .for_each(move |_, _| sink.set(sink.get() + 1));
        make(&mut doc, "body > div.toast", "saved", None);
        make(&mut doc, "div.toast", "never attached", None);
        doc.checkpoint();
        assert_eq!(seen.get(), 1);
    }
}
