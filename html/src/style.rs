use css::{camel_to_kebab, is_known_property};
use tracing::trace;

/// An element's inline style. Properties keep the order they were first set in.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct StyleDeclaration {
    properties: Vec<(String, String)>,
}

impl StyleDeclaration {
    /// Set a property by its CSS name. Custom properties (`--name`) are stored
    /// verbatim; other names must be known properties or the call is ignored.
    /// An empty value removes the property.
    pub fn set_property(&mut self, name: &str, value: &str) {
        let name = if name.starts_with("--") {
            name.to_string()
        } else {
            name.to_ascii_lowercase()
        };
        if !name.starts_with("--") && !is_known_property(&name) {
            trace!(property = name.as_str(), "ignoring unknown style property");
            return;
        }
        let value = value.trim();
        if value.is_empty() {
            self.remove_property(&name);
            return;
        }
        match self.properties.iter_mut().find(|(k, _)| *k == name) {
            Some((_, existing)) => *existing = value.to_string(),
            None => self.properties.push((name, value.to_string())),
        }
    }

    /// Set a property by its JS name (`marginLeft`, `WebkitTransition`)
    pub fn set(&mut self, js_name: &str, value: &str) {
        // Dashed names are not valid JS property names
        if js_name.contains('-') {
            trace!(property = js_name, "ignoring style assignment to non-property");
            return;
        }
        self.set_property(&camel_to_kebab(js_name), value);
    }

    pub fn get_property_value(&self, name: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn get(&self, js_name: &str) -> Option<&str> {
        self.get_property_value(&camel_to_kebab(js_name))
    }

    pub fn remove_property(&mut self, name: &str) -> Option<String> {
        let index = self.properties.iter().position(|(k, _)| k == name)?;
        Some(self.properties.remove(index).1)
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn css_text(&self) -> String {
        self.properties
            .iter()
            .map(|(k, v)| format!("{}: {};", k, v))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Replace every property with the declarations in `text`
    pub fn set_css_text(&mut self, text: &str) {
        self.properties.clear();
        for declaration in text.split(';') {
            if let Some((name, value)) = declaration.split_once(':') {
                self.set_property(name.trim(), value);
            }
        }
    }
}

#[cfg(test)]
#[test]
fn test_style_declaration() {
    let mut style = StyleDeclaration::default();
    style.set("marginLeft", "4px");
    style.set_property("--accent", " #f00 ");
    style.set("WebkitTransition", "all 1s");
    style.set("notAProperty", "1");
    style.set("margin-left", "9px");
    assert_eq!(style.len(), 3);
    assert_eq!(style.get("marginLeft"), Some("4px"));
    assert_eq!(style.get_property_value("--accent"), Some("#f00"));
    assert_eq!(style.get_property_value("-webkit-transition"), Some("all 1s"));
    assert_eq!(
        style.css_text(),
        "margin-left: 4px; --accent: #f00; -webkit-transition: all 1s;"
    );

    style.set("marginLeft", "");
    assert_eq!(style.get("marginLeft"), None);

    style.set_css_text("color: red; bogus: 1; --x: y");
    assert_eq!(style.css_text(), "color: red; --x: y;");
}
