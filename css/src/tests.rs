use super::*;

#[test]
fn test_full_definition() {
    let target = ElementDefinition {
        tag_name: "div".to_string(),
        id: Some("x".to_string()),
        class_list: vec!["a".to_string(), "b".to_string()],
        attributes: attributes! {"data-k" => "v"},
    };
    assert_eq!(ElementDefinition::parse("div.a.b#x[data-k=v]"), target);
}

#[test]
fn test_definition_defaults() {
    assert_eq!(ElementDefinition::parse(""), ElementDefinition::default());
    let def = ElementDefinition::parse(".note");
    assert_eq!(def.tag_name, "div");
    assert_eq!(def.class_list, vec!["note".to_string()]);
    assert_eq!(def.id, None);
}

#[test]
fn test_definition_is_permissive() {
    // The second id is ignored, duplicate classes are kept, junk is dropped
    let def = ElementDefinition::parse("my-tag#one#two.c.c%$ .d");
    assert_eq!(def.tag_name, "my-tag");
    assert_eq!(def.id.as_deref(), Some("one"));
    assert_eq!(def.class_list, vec!["c", "c", "d"]);
    assert!(def.attributes.is_empty());
}

#[test]
fn test_attribute_values_hide_selector_syntax() {
    let def = ElementDefinition::parse(r#"a[href="https://x.org/#top"][title='v.2'].link"#);
    assert_eq!(def.tag_name, "a");
    assert_eq!(def.id, None);
    assert_eq!(def.class_list, vec!["link"]);
    assert_eq!(
        def.attributes,
        attributes! {"href" => "https://x.org/#top", "title" => "v.2"}
    );
}

#[test]
fn test_with_attributes() {
    let def = ElementDefinition::parse("input[type=text][name=q]")
        .with_attributes([("type", "search"), ("autofocus", "")]);
    assert_eq!(
        def.attributes,
        attributes! {"type" => "search", "name" => "q", "autofocus" => ""}
    );
}

#[test]
fn test_plain_relative() {
    for s in ["div", "  p.a[x=1]  ", "svg#logo", ""] {
        let resolved = RelativeSelector::parse(s);
        assert_eq!(resolved.element_definition, s.trim());
        assert_eq!(resolved.relation, None);
    }
}

#[test]
fn test_parent_relative() {
    let resolved = RelativeSelector::parse("ul > li.item");
    assert_eq!(resolved.parent_selector(), Some("ul"));
    assert_eq!(resolved.sibling_selector(), None);
    assert_eq!(resolved.element_definition, "li.item");
}

#[test]
fn test_sibling_relative() {
    let resolved = RelativeSelector::parse("span + .tooltip");
    assert_eq!(
        resolved,
        RelativeSelector {
            element_definition: ".tooltip".to_string(),
            relation: Some(Relation::Sibling("span".to_string())),
        }
    );
}

#[test]
fn test_last_combinator_wins() {
    let resolved = RelativeSelector::parse("main > section + p.lead");
    assert_eq!(resolved.sibling_selector(), Some("main > section"));
    assert_eq!(resolved.element_definition, "p.lead");

    let resolved = RelativeSelector::parse("h1 + p > em");
    assert_eq!(resolved.parent_selector(), Some("h1 + p"));
    assert_eq!(resolved.element_definition, "em");
}

#[test]
fn test_combinators_inside_attributes() {
    let resolved = RelativeSelector::parse("a[href='/x>y']");
    assert_eq!(resolved.relation, None);
    assert_eq!(resolved.element_definition, "a[href='/x>y']");

    let resolved = RelativeSelector::parse(r#"form[action="/a+b"] > input[value="1>0"]"#);
    assert_eq!(resolved.parent_selector(), Some(r#"form[action="/a+b"]"#));
    assert_eq!(resolved.element_definition, r#"input[value="1>0"]"#);
    let def = ElementDefinition::parse(&resolved.element_definition);
    assert_eq!(def.attributes, attributes! {"value" => "1>0"});

    // A quoted `]` does not end the protected span
    let resolved = RelativeSelector::parse(r#"b[data-x="]>"]"#);
    assert_eq!(resolved.relation, None);
}

#[test]
fn test_empty_relation() {
    let resolved = RelativeSelector::parse("> li");
    assert_eq!(resolved.parent_selector(), Some(""));
    assert_eq!(resolved.element_definition, "li");
}

#[test]
fn test_parsing_is_pure() {
    let input = r#"nav.main > a#home.active[href="/"][data-n=1]"#;
    assert_eq!(RelativeSelector::parse(input), RelativeSelector::parse(input));
    let first = RelativeSelector::parse(input);
    assert_eq!(
        ElementDefinition::parse(&first.element_definition),
        ElementDefinition::parse(&first.element_definition)
    );
}

#[test]
fn test_styles_macro() {
    let styles = styles! {"margin-left" => "4px", "--gap" => 2, "zIndex" => 1.5};
    let collected: Vec<(&str, String)> = styles.iter().map(|(k, v)| (k, v.to_string())).collect();
    assert_eq!(
        collected,
        vec![
            ("margin-left", "4px".to_string()),
            ("--gap", "2".to_string()),
            ("zIndex", "1.5".to_string()),
        ]
    );
}

#[test]
fn test_known_properties() {
    assert!(is_known_property("margin-left"));
    assert!(is_known_property("-webkit-transition"));
    assert!(!is_known_property("marginLeft"));
    assert!(!is_known_property("not-a-property"));
}
