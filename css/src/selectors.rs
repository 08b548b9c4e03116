use nom::branch::alt;
use nom::bytes::complete::{is_not, tag};
use nom::character::complete::{alphanumeric1, char, multispace0, multispace1, one_of};
use nom::combinator::{map, opt, recognize, value};
use nom::multi::{many0, many1};
use nom::sequence::{delimited, pair, preceded, tuple};
use nom::IResult;

use super::{AttributeSelector, Combinator, Selector, SelectorError, SelectorList, SimpleSelector};

/// Parse a complete selector list such as `ul > li.item, a[href]`
pub fn parse_selector_list(input: &str) -> Result<SelectorList, SelectorError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(SelectorError::Empty);
    }
    match selector_group(trimmed) {
        Ok(("", selectors)) => Ok(SelectorList(selectors)),
        _ => Err(SelectorError::Invalid(input.to_string())),
    }
}

/// Parse comma seperated groups of selectors
fn selector_group(input: &str) -> IResult<&str, Vec<Selector>> {
    let (input, (first, rest)) = pair(
        selector,
        many0(preceded(
            delimited(multispace0, char(','), multispace0),
            selector,
        )),
    )(input)?;
    Ok((input, [first].into_iter().chain(rest).collect()))
}

/// Parse a selector: compound selectors joined by combinators, left-associative
fn selector(input: &str) -> IResult<&str, Selector> {
    let (mut input, mut left) = compound(input)?;
    loop {
        match pair(combinator, compound)(input) {
            Ok((rest, (c, right))) => {
                left = Selector::Combinator(Box::new(left), c, Box::new(right));
                input = rest;
            }
            Err(nom::Err::Error(_)) => break,
            Err(e) => return Err(e),
        }
    }
    Ok((input, left))
}
#[cfg(test)]
#[test]
fn test_selector() {
    let i = "ul > li.item";
    let target = Selector::Combinator(
        Box::new(Selector::Simple(SimpleSelector::Type("ul".into()))),
        Combinator::Child,
        Box::new(Selector::Compound(vec![
            SimpleSelector::Type("li".into()),
            SimpleSelector::Class("item".into()),
        ])),
    );
    assert_eq!(selector(i), Ok(("", target)));

    let i = "a b+c";
    let target = Selector::Combinator(
        Box::new(Selector::Combinator(
            Box::new(Selector::Simple(SimpleSelector::Type("a".into()))),
            Combinator::Descendant,
            Box::new(Selector::Simple(SimpleSelector::Type("b".into()))),
        )),
        Combinator::NextSibling,
        Box::new(Selector::Simple(SimpleSelector::Type("c".into()))),
    );
    assert_eq!(selector(i), Ok(("", target)));

    // Trailing whitespace is left for the caller
    assert_eq!(
        selector("p ,"),
        Ok((" ,", Selector::Simple(SimpleSelector::Type("p".into()))))
    );
}

fn combinator(input: &str) -> IResult<&str, Combinator> {
    let explicit = map(delimited(multispace0, one_of(">+~"), multispace0), |c| match c {
        '>' => Combinator::Child,
        '+' => Combinator::NextSibling,
        _ => Combinator::SubsequentSibling,
    });
    alt((explicit, value(Combinator::Descendant, multispace1)))(input)
}

/// Parse an optional type or universal selector followed by any number of
/// id, class and attribute selectors
fn compound(input: &str) -> IResult<&str, Selector> {
    let element_or_universal = alt((
        map(ident, SimpleSelector::Type),
        value(SimpleSelector::Universal, char('*')),
    ));
    let hash = map(preceded(char('#'), name), SimpleSelector::ID);
    let class = map(preceded(char('.'), ident), SimpleSelector::Class);
    let (input, (first, rest)) = pair(
        opt(element_or_universal),
        many0(alt((hash, class, attribute))),
    )(input)?;
    let mut simple: Vec<SimpleSelector> = first.into_iter().chain(rest).collect();
    match simple.len() {
        0 => Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Many1,
        ))),
        1 => Ok((input, Selector::Simple(simple.remove(0)))),
        _ => Ok((input, Selector::Compound(simple))),
    }
}
#[cfg(test)]
#[test]
fn test_compound() {
    assert_eq!(
        compound("*"),
        Ok(("", Selector::Simple(SimpleSelector::Universal)))
    );
    assert_eq!(
        compound("#id-name"),
        Ok(("", Selector::Simple(SimpleSelector::ID("id-name".into()))))
    );
    assert_eq!(
        compound("div.a[data-k=v]"),
        Ok((
            "",
            Selector::Compound(vec![
                SimpleSelector::Type("div".into()),
                SimpleSelector::Class("a".into()),
                SimpleSelector::Attribute(AttributeSelector::Equals("data-k".into(), "v".into())),
            ])
        ))
    );
    assert!(compound(">").is_err());
}

/// Parse `[att]` or `[att=val]`
fn attribute(input: &str) -> IResult<&str, SimpleSelector> {
    let (input, (_, _, key, _, val, _)) = tuple((
        char('['),
        multispace0,
        name,
        multispace0,
        opt(delimited(
            pair(char('='), multispace0),
            alt((string, ident)),
            multispace0,
        )),
        char(']'),
    ))(input)?;
    let selector = match val {
        Some(val) => AttributeSelector::Equals(key, val),
        None => AttributeSelector::Has(key),
    };
    Ok((input, SimpleSelector::Attribute(selector)))
}
#[cfg(test)]
#[test]
fn test_attribute() {
    assert_eq!(
        attribute("[hidden]"),
        Ok(("", SimpleSelector::Attribute(AttributeSelector::Has("hidden".into()))))
    );
    assert_eq!(
        attribute(r#"[ title = "a b" ]"#),
        Ok((
            "",
            SimpleSelector::Attribute(AttributeSelector::Equals("title".into(), "a b".into()))
        ))
    );
    assert!(attribute("[a~=b]").is_err());
}

/// Parse quoted string
fn string(input: &str) -> IResult<&str, String> {
    let double = delimited(char('"'), opt(is_not("\"\n\r")), char('"'));
    let single = delimited(char('\''), opt(is_not("'\n\r")), char('\''));
    map(alt((double, single)), |s: Option<&str>| {
        s.unwrap_or_default().to_string()
    })(input)
}

/// Parse name
fn name(input: &str) -> IResult<&str, String> {
    let nmchar = alt((alphanumeric1, tag("_"), tag("-")));
    map(recognize(many1(nmchar)), str::to_string)(input)
}

/// Parse ident
fn ident(input: &str) -> IResult<&str, String> {
    let nmstart = alt((alphanumeric1, tag("_")));
    let nmchar = alt((alphanumeric1, tag("_"), tag("-")));
    map(
        recognize(tuple((many0(char('-')), nmstart, many0(nmchar)))),
        str::to_string,
    )(input)
}
#[cfg(test)]
#[test]
fn test_name() {
    assert_eq!(name("hello"), Ok(("", "hello".to_string())));
    assert!(name("~hello").is_err());
    assert_eq!(ident("-webkit-box x"), Ok((" x", "-webkit-box".to_string())));
    assert!(ident("-").is_err());
}

#[cfg(test)]
#[test]
fn test_parse_selector_list() {
    let list = parse_selector_list(" h1, .title ").unwrap();
    assert_eq!(
        list,
        SelectorList(vec![
            Selector::Simple(SimpleSelector::Type("h1".into())),
            Selector::Simple(SimpleSelector::Class("title".into())),
        ])
    );
    assert_eq!(parse_selector_list("   "), Err(SelectorError::Empty));
    assert_eq!(
        parse_selector_list("a >"),
        Err(SelectorError::Invalid("a >".into()))
    );
    assert!(parse_selector_list("p:hover").is_err());
}
