use nom::{
    branch::alt,
    bytes::complete::{is_not, tag, take, take_until, take_while},
    character::complete::{alpha1, char, digit1, hex_digit1, multispace0, multispace1, one_of},
    combinator::{map, map_opt, map_res, opt, recognize},
    multi::many0,
    sequence::{delimited, pair, preceded, tuple},
    IResult,
};

/// A parsed piece of markup, before it is placed in a document
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Fragment {
    Element {
        name: String,
        attributes: Vec<(String, String)>,
        children: Vec<Fragment>,
    },
    Text(String),
}

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Elements whose content is taken verbatim up to their closing tag
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "textarea", "title"];

pub(crate) fn is_void(tag_name: &str) -> bool {
    VOID_ELEMENTS
        .iter()
        .any(|v| v.eq_ignore_ascii_case(tag_name))
}

#[derive(Debug, PartialEq)]
enum Token<'a> {
    Open {
        name: &'a str,
        attributes: Vec<(String, String)>,
        self_closing: bool,
    },
    Close(&'a str),
    Text(&'a str),
    Skip,
}

/// Attempt to parse a string as a valid tag name
fn tag_name(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        alpha1,
        take_while(|c: char| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':' | '.')),
    ))(input)
}

/// Parse a tag in the form `</name>`, returning `name`
fn close_tag(input: &str) -> IResult<&str, &str> {
    delimited(tag("</"), tag_name, pair(multispace0, char('>')))(input)
}

/// Parse a tag in the form `<name attr=value ...>` or `<name ... />`
fn open_tag(input: &str) -> IResult<&str, Token> {
    let (input, (_, name, attributes, _, slash, _)) = tuple((
        char('<'),
        tag_name,
        many0(preceded(multispace1, attribute)),
        multispace0,
        opt(char('/')),
        char('>'),
    ))(input)?;
    Ok((
        input,
        Token::Open {
            name,
            attributes,
            self_closing: slash.is_some(),
        },
    ))
}

fn comment(input: &str) -> IResult<&str, &str> {
    delimited(tag("<!--"), take_until("-->"), tag("-->"))(input)
}

/// `<!DOCTYPE ...>` and similar declarations
fn declaration(input: &str) -> IResult<&str, &str> {
    delimited(alt((tag("<!"), tag("<?"))), is_not(">"), char('>'))(input)
}

fn token(input: &str) -> IResult<&str, Token> {
    alt((
        map(comment, |_| Token::Skip),
        map(declaration, |_| Token::Skip),
        map(close_tag, Token::Close),
        open_tag,
        map(is_not("<"), Token::Text),
        // A `<` that starts no tag is text
        map(take(1usize), Token::Text),
    ))(input)
}

// Attribute parsing below

fn double_quoted(input: &str) -> IResult<&str, &str> {
    delimited(char('"'), take_until("\""), char('"'))(input)
}

fn single_quoted(input: &str) -> IResult<&str, &str> {
    delimited(char('\''), take_until("'"), char('\''))(input)
}

fn unquoted(input: &str) -> IResult<&str, &str> {
    is_not(" \t\r\n\"'=<>`")(input)
}

fn attribute_name(input: &str) -> IResult<&str, &str> {
    is_not(" \t\r\n\"'>/=")(input)
}

/// `name`, `name=value`, `name='value'` or `name="value"`
fn attribute(input: &str) -> IResult<&str, (String, String)> {
    let (input, name) = attribute_name(input)?;
    let (input, value) = opt(preceded(
        tuple((multispace0, char('='), multispace0)),
        alt((double_quoted, single_quoted, unquoted)),
    ))(input)?;
    Ok((
        input,
        (name.to_string(), decode_entities(value.unwrap_or_default())),
    ))
}

// Character references

fn numeric_reference(input: &str) -> IResult<&str, char> {
    map_opt(
        preceded(
            char('#'),
            alt((
                map_res(preceded(one_of("xX"), hex_digit1), |h: &str| {
                    u32::from_str_radix(h, 16)
                }),
                map_res(digit1, |d: &str| d.parse::<u32>()),
            )),
        ),
        char::from_u32,
    )(input)
}

fn named_reference(input: &str) -> IResult<&str, char> {
    map_opt(alpha1, |name: &str| match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => None,
    })(input)
}

fn reference(input: &str) -> IResult<&str, char> {
    delimited(char('&'), alt((numeric_reference, named_reference)), char(';'))(input)
}

/// Replace character references; unknown ones are kept as written
fn decode_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        rest = &rest[start..];
        match reference(rest) {
            Ok((after, c)) => {
                out.push(c);
                rest = after;
            }
            Err(_) => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

pub(crate) fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

pub(crate) fn escape_attribute(value: &str) -> String {
    value.replace('&', "&amp;").replace('"', "&quot;")
}

struct OpenElement {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Fragment>,
}

#[derive(Default)]
struct TreeBuilder {
    roots: Vec<Fragment>,
    open: Vec<OpenElement>,
}

impl TreeBuilder {
    fn children(&mut self) -> &mut Vec<Fragment> {
        match self.open.last_mut() {
            Some(element) => &mut element.children,
            None => &mut self.roots,
        }
    }

    fn text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        let children = self.children();
        if let Some(Fragment::Text(last)) = children.last_mut() {
            last.push_str(text);
        } else {
            children.push(Fragment::Text(text.to_string()));
        }
    }

    fn open(&mut self, name: &str, attributes: Vec<(String, String)>) {
        self.open.push(OpenElement {
            name: name.to_string(),
            attributes,
            children: Vec::new(),
        });
    }

    fn leaf(&mut self, name: &str, attributes: Vec<(String, String)>) {
        self.children().push(Fragment::Element {
            name: name.to_string(),
            attributes,
            children: Vec::new(),
        });
    }

    /// Close the nearest open element named `name` and everything opened
    /// inside it. Stray close tags are dropped.
    fn close(&mut self, name: &str) {
        if let Some(position) = self
            .open
            .iter()
            .rposition(|e| e.name.eq_ignore_ascii_case(name))
        {
            while self.open.len() > position {
                self.pop();
            }
        }
    }

    fn pop(&mut self) {
        if let Some(element) = self.open.pop() {
            let fragment = Fragment::Element {
                name: element.name,
                attributes: element.attributes,
                children: element.children,
            };
            self.children().push(fragment);
        }
    }

    fn finish(mut self) -> Vec<Fragment> {
        while !self.open.is_empty() {
            self.pop();
        }
        self.roots
    }
}

/// Parse markup into a forest of fragments. Parsing never fails: missing
/// close tags are implied and anything unrecognised is kept as text.
pub(crate) fn fragment(markup: &str) -> Vec<Fragment> {
    let mut builder = TreeBuilder::default();
    let mut input = markup;
    while !input.is_empty() {
        let (rest, token) = match token(input) {
            Ok(parsed) => parsed,
            Err(_) => break,
        };
        input = rest;
        match token {
            Token::Skip => {}
            Token::Text(text) => builder.text(&decode_entities(text)),
            Token::Close(name) => builder.close(name),
            Token::Open {
                name,
                attributes,
                self_closing,
            } => {
                if self_closing || is_void(name) {
                    builder.leaf(name, attributes);
                } else if RAW_TEXT_ELEMENTS
                    .iter()
                    .any(|r| r.eq_ignore_ascii_case(name))
                {
                    builder.open(name, attributes);
                    let closing = format!("</{}", name.to_ascii_lowercase());
                    let end = input
                        .to_ascii_lowercase()
                        .find(&closing)
                        .unwrap_or(input.len());
                    builder.text(&input[..end]);
                    input = &input[end..];
                } else {
                    builder.open(name, attributes);
                }
            }
        }
    }
    builder.finish()
}

#[cfg(test)]
fn element(name: &str, attributes: &[(&str, &str)], children: Vec<Fragment>) -> Fragment {
    Fragment::Element {
        name: name.to_string(),
        attributes: attributes
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        children,
    }
}

#[cfg(test)]
fn text(data: &str) -> Fragment {
    Fragment::Text(data.to_string())
}

#[cfg(test)]
#[test]
fn test_node_parse() {
    let data = r#"<html><div class=nothing><h1></h1></div></html>"#;
    let target = vec![element(
        "html",
        &[],
        vec![element(
            "div",
            &[("class", "nothing")],
            vec![element("h1", &[], vec![])],
        )],
    )];
    assert_eq!(fragment(data), target);

    let data = r#"<html><h1>Hello, world</h1></html>"#;
    let target = vec![element(
        "html",
        &[],
        vec![element("h1", &[], vec![text("Hello, world")])],
    )];
    assert_eq!(fragment(data), target);
}

#[cfg(test)]
#[test]
fn test_parse_malformed() {
    let data = r#"<div></closing><span>a < b"#;
    assert_eq!(
        fragment(data),
        vec![element(
            "div",
            &[],
            vec![element("span", &[], vec![text("a < b")])]
        )]
    );

    let data = r#"<ul><li>one<li>two</ul>after"#;
    assert_eq!(
        fragment(data),
        vec![
            element(
                "ul",
                &[],
                vec![element(
                    "li",
                    &[],
                    vec![text("one"), element("li", &[], vec![text("two")])]
                )]
            ),
            text("after"),
        ]
    );
}

#[cfg(test)]
#[test]
fn test_tag_parse() {
    assert_eq!(
        open_tag("<div>"),
        Ok((
            "",
            Token::Open {
                name: "div",
                attributes: vec![],
                self_closing: false
            }
        ))
    );

    let data = r#"<div attr1 attr2=two attr3='three' attr4="number four" >"#;
    assert_eq!(
        open_tag(data),
        Ok((
            "",
            Token::Open {
                name: "div",
                attributes: vec![
                    ("attr1".to_string(), "".to_string()),
                    ("attr2".to_string(), "two".to_string()),
                    ("attr3".to_string(), "three".to_string()),
                    ("attr4".to_string(), "number four".to_string()),
                ],
                self_closing: false
            }
        ))
    );

    assert!(matches!(
        open_tag("<circle r=\"4\"/>"),
        Ok(("", Token::Open { self_closing: true, .. }))
    ));
    assert!(open_tag("<---></--->").is_err());
}

#[cfg(test)]
#[test]
fn test_void_comments_and_raw_text() {
    let data = "<!DOCTYPE html><!-- note --><p>a<br>b</p><script>if (a < b) {}</script>";
    assert_eq!(
        fragment(data),
        vec![
            element(
                "p",
                &[],
                vec![text("a"), element("br", &[], vec![]), text("b")]
            ),
            element("script", &[], vec![text("if (a < b) {}")]),
        ]
    );
}

#[cfg(test)]
#[test]
fn test_entities() {
    assert_eq!(decode_entities("a &amp; b &lt;&#65;&#x42;&gt;"), "a & b <AB>");
    assert_eq!(decode_entities("fish & chips &bogus;"), "fish & chips &bogus;");
    assert_eq!(
        fragment(r#"<a title="&quot;hi&quot;">x &gt; y</a>"#),
        vec![element("a", &[("title", "\"hi\"")], vec![text("x > y")])]
    );
    assert_eq!(escape_text("<a & b>"), "&lt;a &amp; b&gt;");
    assert_eq!(escape_attribute("say \"&\""), "say &quot;&amp;&quot;");
}
