use std::path::PathBuf;

use css::{ElementDefinition, Relation, RelativeSelector};
use elkit::builder::{draw, make, Content};
use html::Document;
use tracing::{info, span, Level};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: elkit [--trace] [--html FILE] [--svg] SELECTOR...";

struct Args {
    pub selectors: Vec<String>,
    pub html: Option<PathBuf>,
    pub svg: bool,
    pub trace: bool,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Args(#[from] pico_args::Error),
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("no selectors given")]
    NoSelectors,
}

fn main() {
    let args = match parse_args() {
        Ok(args) => args,
        Err(err) => {
            eprintln!("elkit: {}\n{}", err, USAGE);
            std::process::exit(2);
        }
    };
    if args.trace {
        tracing_subscriber::fmt::fmt()
            .with_span_events(FmtSpan::ACTIVE)
            .with_max_level(Level::DEBUG)
            .with_env_filter(EnvFilter::from_default_env())
            .finish()
            .init();
        info!("Logger initialized");
    }

    match run(&args) {
        Ok(output) => print!("{}", output),
        Err(err) => {
            eprintln!("elkit: {}", err);
            std::process::exit(1);
        }
    }
}

fn parse_args() -> Result<Args, CliError> {
    let mut pargs = pico_args::Arguments::from_env();
    if pargs.contains(["--help", "-h"]) {
        println!("{}", USAGE);
        std::process::exit(0);
    }
    let trace = pargs.contains(["--trace", "-t"]);
    let svg = pargs.contains("--svg");
    let html: Option<PathBuf> = pargs.opt_value_from_str("--html")?;
    let selectors = pargs
        .finish()
        .into_iter()
        .map(|s| s.into_string().map_err(|_| pico_args::Error::NonUtf8Argument))
        .collect::<Result<Vec<_>, _>>()?;
    if selectors.is_empty() {
        return Err(CliError::NoSelectors);
    }
    Ok(Args {
        selectors,
        html,
        svg,
        trace,
    })
}

fn run(args: &Args) -> Result<String, CliError> {
    let path = match &args.html {
        Some(path) => path,
        None => return Ok(args.selectors.iter().map(|s| describe(s)).collect()),
    };
    let markup = std::fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.clone(),
        source,
    })?;
    let span = span!(Level::DEBUG, "Building document");
    let _enter = span.enter();
    let mut doc = Document::from_html(&markup);
    for selector in &args.selectors {
        if args.svg {
            draw(&mut doc, selector, Content::None, None);
        } else {
            make(&mut doc, selector, Content::None, None);
        }
    }
    doc.checkpoint();
    Ok(format!("{}\n", doc.outer_html(doc.document_element())))
}

/// Describe how a selector is resolved into a relation and an element definition
fn describe(selector: &str) -> String {
    let relative = RelativeSelector::parse(selector);
    let definition = ElementDefinition::parse(&relative.element_definition);
    let relation = match &relative.relation {
        Some(Relation::Parent(s)) => format!("parent {:?}", s),
        Some(Relation::Sibling(s)) => format!("sibling {:?}", s),
        None => "none".to_string(),
    };
    let mut attributes: Vec<_> = definition.attributes.iter().collect();
    attributes.sort();
    let attributes: Vec<String> = attributes
        .into_iter()
        .map(|(k, v)| format!("{}={:?}", k, v))
        .collect();
    format!(
        "{}\n  relation:   {}\n  tag:        {}\n  id:         {}\n  classes:    {}\n  attributes: {}\n",
        selector,
        relation,
        definition.tag_name,
        definition.id.as_deref().unwrap_or("-"),
        definition.class_list.join(" "),
        attributes.join(" "),
    )
}
