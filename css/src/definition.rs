use nom::branch::alt;
use nom::bytes::complete::{is_not, take_while1};
use nom::character::complete::{char, one_of};
use nom::combinator::opt;
use nom::error::{Error, ErrorKind};
use nom::sequence::{delimited, pair, preceded};
use nom::IResult;
use std::collections::HashMap;
use std::ops::Range;
use tracing::{span, trace, Level};

use super::{ElementDefinition, Relation, RelativeSelector, DEFAULT_TAG};

/// `[\w-]`
fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

fn is_line_terminator(c: char) -> bool {
    matches!(c, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

/// Parse a tag, id, class or attribute name
fn word(input: &str) -> IResult<&str, &str> {
    take_while1(is_word_char)(input)
}

/// Parse `prefix` immediately followed by a word, returning the word
fn prefixed_word(input: &str, prefix: char) -> IResult<&str, &str> {
    preceded(char(prefix), word)(input)
}

/// Parse a quoted attribute value, returning the text between the quotes.
/// The value is the shortest non-empty run followed by a quote and `]`, and
/// either quote character may close it.
fn quoted_value(input: &str) -> IResult<&str, &str> {
    let (rest, _) = one_of("'\"")(input)?;
    for (i, c) in rest.char_indices() {
        if i > 0 && (c == '\'' || c == '"') && rest[i + 1..].starts_with(']') {
            return Ok((&rest[i + 1..], &rest[..i]));
        }
        if is_line_terminator(c) {
            break;
        }
    }
    Err(nom::Err::Error(Error::new(input, ErrorKind::Verify)))
}
#[cfg(test)]
#[test]
fn test_quoted_value() {
    assert_eq!(quoted_value(r#""v 2"]"#), Ok(("]", "v 2")));
    assert_eq!(quoted_value("'/x>y']"), Ok(("]", "/x>y")));
    assert_eq!(quoted_value(r#""a]b"]"#), Ok(("]", "a]b")));
    // Stops at the first quote that is followed by `]`
    assert_eq!(quoted_value(r#""a"]"b"]"#), Ok((r#"]"b"]"#, "a")));
    assert!(quoted_value("''").is_err());
    assert!(quoted_value("\"a\nb\"]").is_err());
}

/// Parse `[name]`, `[name=value]` or `[name="quoted value"]`
fn attribute(input: &str) -> IResult<&str, (&str, &str)> {
    let value = preceded(char('='), alt((quoted_value, is_not("]"))));
    let (input, (name, value)) = delimited(char('['), pair(word, opt(value)), char(']'))(input)?;
    Ok((input, (name, value.unwrap_or(""))))
}
#[cfg(test)]
#[test]
fn test_attribute() {
    assert_eq!(attribute("[hidden]"), Ok(("", ("hidden", ""))));
    assert_eq!(attribute("[data-k=v].x"), Ok((".x", ("data-k", "v"))));
    assert_eq!(attribute(r#"[title="a.b#c"]"#), Ok(("", ("title", "a.b#c"))));
    // An unterminated quote is just part of an unquoted value
    assert_eq!(attribute(r#"[alt="x]"#), Ok(("", ("alt", "\"x"))));
    assert!(attribute("[=v]").is_err());
    assert!(attribute("[a=]").is_err());
    assert!(attribute("[a b]").is_err());
}

/// An attribute token found in a selector, with its byte span
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeToken<'a> {
    pub span: Range<usize>,
    pub name: &'a str,
    pub value: &'a str,
}

/// Find every attribute token in `input`, left to right, without overlap
pub fn attribute_tokens(input: &str) -> Vec<AttributeToken<'_>> {
    let mut tokens = Vec::new();
    let mut offset = 0;
    while let Some(found) = input[offset..].find('[') {
        let start = offset + found;
        match attribute(&input[start..]) {
            Ok((rest, (name, value))) => {
                let end = input.len() - rest.len();
                tokens.push(AttributeToken {
                    span: start..end,
                    name,
                    value,
                });
                offset = end;
            }
            Err(_) => offset = start + 1,
        }
    }
    tokens
}

/// Pull the attribute tokens out of a selector. Returns the attributes and the
/// selector with exactly those tokens removed.
pub fn extract_attributes(selector: &str) -> (HashMap<String, String>, String) {
    let mut attributes = HashMap::new();
    let mut residual = String::with_capacity(selector.len());
    let mut last = 0;
    for token in attribute_tokens(selector) {
        attributes.insert(token.name.to_string(), token.value.to_string());
        residual.push_str(&selector[last..token.span.start]);
        last = token.span.end;
    }
    residual.push_str(&selector[last..]);
    (attributes, residual)
}
#[cfg(test)]
#[test]
fn test_extract_attributes() {
    let (attrs, rest) = extract_attributes(r#"a.link[href="x.y#z"][target=_blank]"#);
    assert_eq!(rest, "a.link");
    assert_eq!(attrs, crate::attributes! {"href" => "x.y#z", "target" => "_blank"});

    // Later duplicates overwrite
    let (attrs, rest) = extract_attributes("[k=1]p[k=2]");
    assert_eq!(rest, "p");
    assert_eq!(attrs, crate::attributes! {"k" => "2"});

    // Identical tokens are each removed exactly once
    let (attrs, rest) = extract_attributes("[a]x[a]");
    assert_eq!(rest, "x");
    assert_eq!(attrs.len(), 1);
}

/// Take a single element selector and turn it into an [`ElementDefinition`]
pub fn selector_to_components(selector: &str) -> ElementDefinition {
    let span = span!(Level::TRACE, "selector_to_components", selector);
    let _enter = span.enter();
    let (attributes, residual) = extract_attributes(selector);
    let (rest, tag_name) = match word(&residual) {
        Ok((rest, tag)) => (rest, tag),
        Err(_) => (residual.as_str(), DEFAULT_TAG),
    };
    let id = prefixed_words(rest, '#').next().map(str::to_string);
    let class_list = prefixed_words(rest, '.').map(str::to_string).collect();
    let definition = ElementDefinition {
        tag_name: tag_name.to_string(),
        id,
        class_list,
        attributes,
    };
    trace!(?definition);
    definition
}

/// Every word introduced by `prefix`, in order
fn prefixed_words(input: &str, prefix: char) -> impl Iterator<Item = &str> {
    input
        .match_indices(prefix)
        .filter_map(move |(i, _)| prefixed_word(&input[i..], prefix).ok())
        .map(|(_, word)| word)
}
#[cfg(test)]
#[test]
fn test_prefixed_words() {
    let words: Vec<&str> = prefixed_words(".a..b.c-d.", '.').collect();
    assert_eq!(words, vec!["a", "b", "c-d"]);
    let words: Vec<&str> = prefixed_words("#x#y", '#').collect();
    assert_eq!(words, vec!["x", "y"]);
}

/// Byte ranges of bracketed text. Well-formed attribute tokens span their full
/// extent (so a quoted `]` stays inside), anything else runs to the next `]`.
fn bracket_spans(input: &str) -> Vec<Range<usize>> {
    let mut spans = Vec::new();
    let mut offset = 0;
    while let Some(found) = input[offset..].find('[') {
        let start = offset + found;
        let end = match attribute(&input[start..]) {
            Ok((rest, _)) => input.len() - rest.len(),
            Err(_) => match input[start..].find(']') {
                Some(close) => start + close + 1,
                None => break,
            },
        };
        spans.push(start..end);
        offset = end;
    }
    spans
}

/// Split an input on its last `>` or `+` outside brackets. The text after the
/// combinator is the element definition, the text before it is the parent
/// (`>`) or sibling (`+`) selector.
pub fn resolve_relative_element(input: &str) -> RelativeSelector {
    let spans = bracket_spans(input);
    let combinator = input
        .char_indices()
        .filter(|&(i, c)| (c == '>' || c == '+') && !spans.iter().any(|s| s.contains(&i)))
        .last();
    let resolved = match combinator {
        Some((i, c)) => {
            let head = input[..i].trim().to_string();
            RelativeSelector {
                element_definition: input[i + 1..].trim().to_string(),
                relation: Some(if c == '>' {
                    Relation::Parent(head)
                } else {
                    Relation::Sibling(head)
                }),
            }
        }
        None => RelativeSelector {
            element_definition: input.trim().to_string(),
            relation: None,
        },
    };
    trace!(input, ?resolved, "resolved relative element");
    resolved
}
#[cfg(test)]
#[test]
fn test_bracket_spans() {
    assert_eq!(bracket_spans("a[x=1]b[y]"), vec![1..6, 7..10]);
    // Not an attribute token, masked up to the first `]`
    assert_eq!(bracket_spans("a[> b]c"), vec![1..6]);
    assert!(bracket_spans("a[b").is_empty());
}
