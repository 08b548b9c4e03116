use super::*;

#[test]
fn test_document() {
    let i = r#"<!DOCTYPE html>
<html lang="en">
    <head>
        <meta charset="utf-8"/>
        <title>The minimal, valid HTML5 document</title>
    </head>
    <body class="main">
        <!-- User-visible content goes in the body -->
        <p>Some paragraph</p>
        Some untagged text
    </body>
</html>"#;
    let doc = Document::from_html(i);
    let html = doc.document_element();
    assert_eq!(doc.get_attribute(html, "lang").as_deref(), Some("en"));
    assert_eq!(doc.get_attribute(doc.body(), "class").as_deref(), Some("main"));

    let meta = doc.query_selector("meta").unwrap().unwrap();
    assert_eq!(doc.parent(meta), Some(doc.head()));
    assert_eq!(doc.get_attribute(meta, "charset").as_deref(), Some("utf-8"));

    let title = doc.query_selector("head > title").unwrap().unwrap();
    assert_eq!(doc.text_content(title), "The minimal, valid HTML5 document");

    let p = doc.query_selector("body p").unwrap().unwrap();
    assert_eq!(doc.text_content(p), "Some paragraph");
    assert!(doc.text_content(doc.body()).contains("Some untagged text"));
}

#[test]
fn test_fragment_outside_html_lands_in_body() {
    let doc = Document::from_html("<p id=a>one</p><p id=b>two</p>");
    assert_eq!(
        doc.inner_html(doc.body()),
        r#"<p id="a">one</p><p id="b">two</p>"#
    );
    assert_eq!(doc.children(doc.head()).len(), 0);
}

#[test]
fn test_serialize() {
    let mut doc = Document::new();
    let body = doc.body();
    let div = doc.create_element("DIV");
    doc.set_attribute(div, "title", "a \"quoted\" & b");
    doc.set_attribute(div, "style", "color: red");
    doc.set_text_content(div, "1 < 2");
    let img = doc.create_element("img");
    doc.append_child(div, img).unwrap();
    doc.append_child(body, div).unwrap();
    assert_eq!(
        doc.outer_html(div),
        r#"<div title="a &quot;quoted&quot; &amp; b" style="color: red;">1 &lt; 2<img></div>"#
    );
    assert_eq!(
        doc.outer_html(doc.root()),
        format!("<html><head></head><body>{}</body></html>", doc.outer_html(div))
    );
}

#[test]
fn test_svg_namespace() {
    let doc = Document::from_html(r#"<svg viewBox="0 0 10 10"><linearGradient id="g"/></svg>"#);
    let gradient = doc.query_selector("#g").unwrap().unwrap();
    let element = doc.element(gradient).unwrap();
    assert_eq!(element.namespace, Namespace::Svg);
    assert_eq!(element.tag_name, "linearGradient");
    assert!(doc.matches(gradient, "svg > linearGradient").unwrap());
    assert!(!doc.matches(gradient, "lineargradient").unwrap());
}

#[test]
fn test_query_selector() {
    let doc = Document::from_html(
        r#"<ul id="list">
            <li class="item first" data-k="1">a</li>
            <li class="item">b</li>
            <li class="item last" data-k>c</li>
        </ul>
        <ol><li>d</li></ol>"#,
    );
    let items = doc.query_selector_all("li.item").unwrap();
    assert_eq!(items.len(), 3);
    assert_eq!(doc.query_selector_all("li").unwrap().len(), 4);
    assert_eq!(doc.query_selector_all("#list > li").unwrap(), items);
    assert_eq!(doc.query_selector_all("ul li, ol li").unwrap().len(), 4);

    assert_eq!(doc.query_selector_all("[data-k]").unwrap(), vec![items[0], items[2]]);
    assert_eq!(doc.query_selector_all("[data-k='1']").unwrap(), vec![items[0]]);

    assert_eq!(doc.query_selector(".first + li").unwrap(), Some(items[1]));
    assert_eq!(doc.query_selector_all(".first ~ li").unwrap(), vec![items[1], items[2]]);
    assert_eq!(doc.query_selector(".last + li").unwrap(), None);
    assert_eq!(doc.query_selector("ol > .item").unwrap(), None);

    assert_eq!(doc.query_selector(""), Err(css::SelectorError::Empty));
    assert!(matches!(
        doc.query_selector("li >"),
        Err(css::SelectorError::Invalid(_))
    ));
}

#[test]
fn test_detached_nodes_are_not_queried() {
    let mut doc = Document::new();
    let p = doc.create_element("p");
    assert_eq!(doc.query_selector("p").unwrap(), None);
    assert!(doc.matches(p, "p").unwrap());
    assert!(!doc.is_connected(p));
    doc.append_child(doc.body(), p).unwrap();
    assert!(doc.is_connected(p));
    assert_eq!(doc.query_selector("p").unwrap(), Some(p));
}

#[test]
fn test_insert_before() {
    let mut doc = Document::new();
    let body = doc.body();
    let a = doc.create_element("a");
    let b = doc.create_element("b");
    let c = doc.create_element("i");
    doc.append_child(body, a).unwrap();
    doc.append_child(body, c).unwrap();
    doc.insert_before(body, b, Some(c)).unwrap();
    assert_eq!(doc.children(body), &[a, b, c]);
    assert_eq!(doc.next_sibling(a), Some(b));

    // Moving a node detaches it from its old position
    doc.insert_before(body, c, Some(a)).unwrap();
    assert_eq!(doc.children(body), &[c, a, b]);
    doc.insert_before(body, c, Some(c)).unwrap();
    assert_eq!(doc.children(body), &[c, a, b]);
}

#[test]
fn test_hierarchy_errors() {
    let mut doc = Document::new();
    let body = doc.body();
    let outer = doc.create_element("div");
    let inner = doc.create_element("div");
    let text = doc.create_text("t");
    doc.append_child(outer, inner).unwrap();

    assert_eq!(doc.append_child(inner, outer), Err(DomError::HierarchyRequest));
    assert_eq!(doc.append_child(outer, outer), Err(DomError::HierarchyRequest));
    assert_eq!(doc.append_child(text, inner), Err(DomError::HierarchyRequest));
    assert_eq!(doc.append_child(body, doc.root()), Err(DomError::HierarchyRequest));
    assert_eq!(
        doc.insert_before(body, inner, Some(outer)),
        Err(DomError::NotAChild(outer))
    );
    assert_eq!(doc.remove_child(body, inner), Err(DomError::NotAChild(inner)));
}

#[test]
fn test_inner_html_replaces_children() {
    let mut doc = Document::new();
    let body = doc.body();
    let records = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
    let sink = records.clone();
    doc.observe_with(move |_: &mut Document, batch: &[MutationRecord]| {
        sink.borrow_mut().extend(batch.iter().cloned());
    });
    doc.set_inner_html(body, "<p>one</p>");
    doc.set_inner_html(body, "<p>two</p><p>three</p>");
    doc.checkpoint();

    assert_eq!(doc.inner_html(body), "<p>two</p><p>three</p>");
    let records = records.borrow();
    let added: usize = records.iter().map(|r| r.added_nodes.len()).sum();
    let removed: usize = records.iter().map(|r| r.removed_nodes.len()).sum();
    assert_eq!((added, removed), (3, 1));
}

#[test]
fn test_attribute_name_case() {
    let doc = Document::from_html(
        r#"<DIV DATA-X=1></DIV><svg viewBox="0 0 10 10"><rect fillOpacity="1"></rect></svg>"#,
    );
    let div = doc.query_selector("div").unwrap().unwrap();
    assert_eq!(doc.get_attribute(div, "data-x").as_deref(), Some("1"));
    assert_eq!(doc.get_attribute(div, "DATA-X"), None);

    let svg = doc.query_selector("svg").unwrap().unwrap();
    assert_eq!(doc.element(svg).unwrap().namespace, Namespace::Svg);
    assert_eq!(doc.get_attribute(svg, "viewBox").as_deref(), Some("0 0 10 10"));
    assert_eq!(doc.get_attribute(svg, "viewbox"), None);
    let rect = doc.children(svg)[0];
    assert_eq!(doc.get_attribute(rect, "fillOpacity").as_deref(), Some("1"));
}

#[test]
fn test_style_attribute() {
    let mut doc = Document::new();
    let p = doc.create_element("p");
    doc.append_child(doc.body(), p).unwrap();
    assert_eq!(doc.query_selector("[style]").unwrap(), None);

    doc.set_attribute(p, "STYLE", "color: red");
    assert_eq!(doc.get_attribute(p, "style").as_deref(), Some("color: red;"));
    assert_eq!(doc.get_attribute(p, "STYLE").as_deref(), Some("color: red;"));
    assert_eq!(doc.query_selector("[style]").unwrap(), Some(p));
    assert_eq!(doc.query_selector("p[style='color: red;']").unwrap(), Some(p));
    assert!(!doc.matches(p, "[style='color: blue;']").unwrap());

    doc.remove_attribute(p, "style");
    assert_eq!(doc.get_attribute(p, "style"), None);
    assert_eq!(doc.query_selector("[style]").unwrap(), None);
}
