//! Load a shared fragment into a page and print the resulting document
//!
//! The page stays usable when the fragment cannot be loaded: the untouched document is printed
//! and the process still exits successfully. Only an unreadable page is an error.

mod common;

use anyhow::{bail, Context};
use clap::Parser;
use common::args::{init_logging, FetchArgs};
use fragload::debug::runtime::RuntimeToggles;
use fragload::dom::{parse_html, DomNode};
use fragload::{FragmentApi, PageLocation, ResourceFetcher};
use std::process::ExitCode;
use std::sync::Arc;

/// Load a shared HTML fragment into a page container
#[derive(Parser, Debug)]
#[command(name = "load_fragment", version, about)]
struct Args {
  /// Page URL or file path
  page: String,

  /// Fragment path, resolved relative to the page over its path candidates
  fragment: String,

  /// Id of the element that receives the fragment
  container: String,

  /// Print the path candidates instead of loading
  #[arg(long)]
  candidates: bool,

  /// Cap on climb/root candidates (overrides FRAGLOAD_VARIANTS_LIMIT)
  #[arg(long = "variants-limit")]
  variants_limit: Option<usize>,

  /// Write the load report as JSON to stderr
  #[arg(long)]
  report: bool,

  #[command(flatten)]
  fetch: FetchArgs,
}

fn main() -> ExitCode {
  init_logging();
  let args = Args::parse();
  match run(&args) {
    Ok(()) => ExitCode::SUCCESS,
    Err(err) => {
      eprintln!("load_fragment: {err:#}");
      ExitCode::FAILURE
    }
  }
}

fn run(args: &Args) -> anyhow::Result<()> {
  let toggles = RuntimeToggles::from_env();
  let location = PageLocation::parse(&args.page)?;
  let fetcher: Arc<dyn ResourceFetcher> = Arc::new(args.fetch.http_fetcher(&toggles));

  let mut builder = FragmentApi::builder(location.clone())
    .fetcher(Arc::clone(&fetcher))
    .toggles(Arc::new(toggles));
  if let Some(limit) = args.variants_limit {
    builder = builder.variants_limit(limit);
  }
  let api = builder.build();

  if args.candidates {
    for candidate in api.candidates(&args.fragment) {
      println!("{candidate}");
    }
    return Ok(());
  }

  let mut document = load_page(fetcher.as_ref(), &location)?;
  let report = api.load_fragment(&mut document, &args.fragment, &args.container, None);
  if !report.is_injected() {
    eprintln!(
      "warning: fragment '{}' not loaded into #{}: {}",
      args.fragment,
      args.container,
      report.error.as_deref().unwrap_or("unknown error")
    );
  }
  if args.report {
    eprintln!("{}", serde_json::to_string_pretty(&report)?);
  }

  println!("{}", document.to_html());
  Ok(())
}

fn load_page(fetcher: &dyn ResourceFetcher, location: &PageLocation) -> anyhow::Result<DomNode> {
  let resource = fetcher
    .fetch(location.href())
    .with_context(|| format!("failed to read page {}", location.href()))?;
  if !resource.is_ok() {
    bail!(
      "page {} answered with status {}",
      location.href(),
      resource.status.unwrap_or_default()
    );
  }
  parse_html(&resource.text()).with_context(|| format!("failed to parse page {}", location.href()))
}
