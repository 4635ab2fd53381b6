//! Search input wiring
//!
//! [`SearchController`] owns what the page-level widget used to keep in globals: whether the
//! header has been wired, which element holds the results and the pending debounced input.
//! Time is passed in explicitly, so the controller never spawns timers.

use super::dataset::Dataset;
use super::debounce::Debouncer;
use super::render::{self, Placement, RESULTS_ID};
use super::scoring::rank;
use super::{DATASET_PATH, DEBOUNCE_DELAY, MIN_TERM_CHARS, SEARCH_INPUT_ID};
use crate::debug::runtime::runtime_toggles;
use crate::dom::DomNode;
use crate::error::Result;
use crate::location::PageLocation;
use crate::resource::ResourceFetcher;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// What a fired input did to the page.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
  /// The term was too short (or nothing searches), so the results were emptied.
  Cleared,
  Rendered {
    term: String,
    results: usize,
    placement: Placement,
  },
  /// The error state is shown.
  Failed { term: String, error: String },
}

/// Runs a search for a term that passed the length check.
pub trait SearchHandler {
  fn search(&mut self, document: &mut DomNode, term: &str) -> SearchOutcome;
}

impl<F> SearchHandler for F
where
  F: FnMut(&mut DomNode, &str) -> SearchOutcome,
{
  fn search(&mut self, document: &mut DomNode, term: &str) -> SearchOutcome {
    self(document, term)
  }
}

/// Loads the destination dataset, ranks it and renders the best cards.
///
/// The dataset is fetched on every search.
pub struct DestinationSearch {
  fetcher: Arc<dyn ResourceFetcher>,
  dataset_url: String,
  threshold: f64,
  results_id: String,
}

impl DestinationSearch {
  /// Search the dataset next to the page at `location`.
  pub fn new(fetcher: Arc<dyn ResourceFetcher>, location: &PageLocation) -> Self {
    let dataset_url = location
      .resolve(DATASET_PATH)
      .unwrap_or_else(|_| DATASET_PATH.to_string());
    Self {
      fetcher,
      dataset_url,
      threshold: runtime_toggles().search_threshold(),
      results_id: RESULTS_ID.to_string(),
    }
  }

  pub fn with_dataset_url(mut self, url: impl Into<String>) -> Self {
    self.dataset_url = url.into();
    self
  }

  pub fn with_threshold(mut self, threshold: f64) -> Self {
    self.threshold = threshold;
    self
  }

  pub fn with_results_id(mut self, id: impl Into<String>) -> Self {
    self.results_id = id.into();
    self
  }

  pub fn dataset_url(&self) -> &str {
    &self.dataset_url
  }

  /// Show the loading state, then the cards, the empty state or the error state.
  pub fn run(&self, document: &mut DomNode, term: &str) -> SearchOutcome {
    tracing::debug!(term, dataset = %self.dataset_url, "searching destinations");
    if let Err(err) = render::show_state(document, &self.results_id, render::LOADING_HTML) {
      tracing::warn!(error = %err, "no results container");
      return SearchOutcome::Failed {
        term: term.to_string(),
        error: err.to_string(),
      };
    }

    match self.rank_and_render(document, term) {
      Ok((results, placement)) => {
        tracing::debug!(term, results, ?placement, "rendered recommendations");
        SearchOutcome::Rendered {
          term: term.to_string(),
          results,
          placement,
        }
      }
      Err(err) => {
        tracing::error!(term, error = %err, "search failed");
        if let Err(render_err) = render::show_state(document, &self.results_id, render::ERROR_HTML) {
          tracing::warn!(error = %render_err, "could not show error state");
        }
        SearchOutcome::Failed {
          term: term.to_string(),
          error: err.to_string(),
        }
      }
    }
  }

  fn rank_and_render(&self, document: &mut DomNode, term: &str) -> Result<(usize, Placement)> {
    let dataset = Dataset::load(self.fetcher.as_ref(), &self.dataset_url)?;
    let items = dataset.items();
    let recommendations = rank(&items, term, self.threshold);
    let placement = render::show_recommendations(document, &self.results_id, &recommendations)?;
    Ok((recommendations.len(), placement))
  }
}

impl SearchHandler for DestinationSearch {
  fn search(&mut self, document: &mut DomNode, term: &str) -> SearchOutcome {
    self.run(document, term)
  }
}

/// Which lookup found the search input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchInput {
  /// `#Research`
  Research,
  /// `.nav-right input[type="text"]`
  NavRight,
  /// `#more-informations`
  MoreInformations,
}

/// Locate the header search input.
pub fn find_search_input(document: &DomNode) -> Option<SearchInput> {
  if document.find_element_by_id(SEARCH_INPUT_ID).is_some() {
    return Some(SearchInput::Research);
  }
  let text_input = |node: &DomNode| {
    node.is_tag("input")
      && node
        .get_attribute_ref("type")
        .is_some_and(|kind| kind.eq_ignore_ascii_case("text"))
  };
  let mut in_nav_right = false;
  document.walk_tree(&mut |node| {
    if !in_nav_right && node.has_class("nav-right") {
      in_nav_right = node.children.iter().any(|child| child.find(&text_input).is_some());
    }
  });
  if in_nav_right {
    return Some(SearchInput::NavRight);
  }
  document
    .find_element_by_id("more-informations")
    .map(|_| SearchInput::MoreInformations)
}

/// Debounced search box state.
pub struct SearchController {
  results_id: String,
  initialized: bool,
  input: Option<SearchInput>,
  debouncer: Debouncer<String>,
  handler: Option<Box<dyn SearchHandler>>,
}

impl Default for SearchController {
  fn default() -> Self {
    Self::new()
  }
}

impl SearchController {
  pub fn new() -> Self {
    Self {
      results_id: RESULTS_ID.to_string(),
      initialized: false,
      input: None,
      debouncer: Debouncer::new(DEBOUNCE_DELAY),
      handler: None,
    }
  }

  /// Without a handler every fired input just clears the results.
  pub fn with_handler(mut self, handler: impl SearchHandler + 'static) -> Self {
    self.handler = Some(Box::new(handler));
    self
  }

  pub fn with_results_id(mut self, id: impl Into<String>) -> Self {
    self.results_id = id.into();
    self
  }

  pub fn with_delay(mut self, delay: Duration) -> Self {
    self.debouncer = Debouncer::new(delay);
    self
  }

  pub fn results_id(&self) -> &str {
    &self.results_id
  }

  pub fn is_initialized(&self) -> bool {
    self.initialized
  }

  /// The input found by the last successful [`setup`](Self::setup).
  pub fn search_input(&self) -> Option<SearchInput> {
    self.input
  }

  /// Wire the controller to the page. Returns whether the controller is wired; a second call
  /// after success does nothing.
  pub fn setup(&mut self, document: &mut DomNode) -> bool {
    if self.initialized {
      tracing::debug!("search already initialized, skipping");
      return true;
    }
    let Some(input) = find_search_input(document) else {
      tracing::debug!("search input not found");
      return false;
    };
    if let Err(err) = render::ensure_results_container(document, &self.results_id) {
      tracing::warn!(error = %err, "results container unavailable");
    }
    self.input = Some(input);
    self.initialized = true;
    tracing::debug!(?input, "search controller initialized");
    true
  }

  /// Forget the wiring and any pending input.
  pub fn reset(&mut self) {
    self.initialized = false;
    self.input = None;
    self.debouncer.cancel();
  }

  /// Record the input's current value at `now`. Ignored until set up.
  pub fn input(&mut self, now: Instant, value: &str) {
    if !self.initialized {
      return;
    }
    self.debouncer.push(now, value.to_string());
  }

  /// When the pending input fires, if any.
  pub fn deadline(&self) -> Option<Instant> {
    self.debouncer.deadline()
  }

  /// Fire the pending input if its quiet period is over.
  pub fn tick(&mut self, now: Instant, document: &mut DomNode) -> Option<SearchOutcome> {
    let value = self.debouncer.poll(now)?;
    Some(self.fire(document, &value))
  }

  /// Fire the pending input immediately.
  pub fn flush(&mut self, document: &mut DomNode) -> Option<SearchOutcome> {
    let deadline = self.debouncer.deadline()?;
    self.tick(deadline, document)
  }

  fn fire(&mut self, document: &mut DomNode, value: &str) -> SearchOutcome {
    let term = value.trim();
    tracing::debug!(term, "search input fired");
    match self.handler.as_mut() {
      Some(handler) if term.chars().count() >= MIN_TERM_CHARS => handler.search(document, term),
      _ => {
        if let Some(results) = document.find_element_by_id_mut(&self.results_id) {
          results.children.clear();
        }
        SearchOutcome::Cleared
      }
    }
  }
}
