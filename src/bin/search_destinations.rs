//! Rank destinations from a dataset for a search term

mod common;

use anyhow::Context;
use clap::Parser;
use common::args::{init_logging, FetchArgs};
use fragload::debug::runtime::RuntimeToggles;
use fragload::search::render::{render_cards, EMPTY_HTML};
use fragload::search::{rank, Dataset, Recommendation, MIN_TERM_CHARS};
use fragload::PageLocation;
use serde_json::json;
use std::process::ExitCode;

/// Search a destination dataset
#[derive(Parser, Debug)]
#[command(name = "search_destinations", version, about)]
struct Args {
  /// Dataset URL or file path
  dataset: String,

  /// Search term
  term: String,

  /// Print results as JSON
  #[arg(long, conflicts_with = "html")]
  json: bool,

  /// Print the recommendation card markup
  #[arg(long)]
  html: bool,

  /// Maximum fuzzy match score (overrides FRAGLOAD_SEARCH_THRESHOLD)
  #[arg(long)]
  threshold: Option<f64>,

  #[command(flatten)]
  fetch: FetchArgs,
}

fn main() -> ExitCode {
  init_logging();
  let args = Args::parse();
  match run(&args) {
    Ok(()) => ExitCode::SUCCESS,
    Err(err) => {
      eprintln!("search_destinations: {err:#}");
      ExitCode::FAILURE
    }
  }
}

fn run(args: &Args) -> anyhow::Result<()> {
  let toggles = RuntimeToggles::from_env();
  let location = PageLocation::parse(&args.dataset)?;
  let fetcher = args.fetch.http_fetcher(&toggles);
  let dataset = Dataset::load(&fetcher, location.href())
    .with_context(|| format!("failed to load dataset {}", location.href()))?;
  let threshold = args
    .threshold
    .unwrap_or_else(|| toggles.search_threshold());

  let term = args.term.trim();
  let items = dataset.items();
  let results = if term.chars().count() < MIN_TERM_CHARS {
    tracing::warn!(term, min = MIN_TERM_CHARS, "search term too short");
    Vec::new()
  } else {
    rank(&items, term, threshold)
  };

  if args.json {
    let rows: Vec<_> = results.iter().map(to_json).collect();
    println!("{}", serde_json::to_string_pretty(&rows)?);
  } else if args.html {
    if results.is_empty() {
      println!("{EMPTY_HTML}");
    } else {
      println!("{}", render_cards(&results));
    }
  } else if results.is_empty() {
    println!("No destinations found");
  } else {
    for result in &results {
      println!(
        "{:>4}%  {}  [{}]",
        result.percent(),
        result.destination.name,
        result.destination.categories.join(", ")
      );
    }
  }
  Ok(())
}

fn to_json(result: &Recommendation<'_>) -> serde_json::Value {
  json!({
    "destination": result.destination,
    "matchScore": result.match_score,
    "score": result.score,
    "percent": result.percent(),
  })
}
