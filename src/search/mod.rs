//! Destination search widget
//!
//! The consumer that shares the page with the fragment loader: a header search box that ranks
//! destinations from a static JSON dataset and renders the two best matches as cards.
//!
//! It depends on the fragment API only optionally. [`bootstrap::bootstrap_header`] uses a
//! [`FragmentApi`](crate::api::FragmentApi) when one is supplied and falls back to a plain
//! single-URL fetch otherwise.

pub mod bootstrap;
pub mod controller;
pub mod dataset;
pub mod debounce;
pub mod normalize;
pub mod render;
pub mod scoring;

pub use bootstrap::{bootstrap_header, HeaderBootstrap, HeaderSource};
pub use controller::{DestinationSearch, SearchController, SearchHandler, SearchOutcome};
pub use dataset::{Dataset, Destination};
pub use debounce::Debouncer;
pub use normalize::normalize_text;
pub use scoring::{calculate_score, rank, Recommendation};

use std::time::Duration;

/// Fuzzy match scores above this are discarded.
pub const DEFAULT_THRESHOLD: f64 = 0.4;

/// Terms shorter than this (after trimming) clear the results instead of searching.
pub const MIN_TERM_CHARS: usize = 3;

/// Quiet period before an input triggers a search.
pub const DEBOUNCE_DELAY: Duration = Duration::from_millis(300);

/// Dataset location relative to the page.
pub const DATASET_PATH: &str = "./database.json";

pub const HEADER_FRAGMENT: &str = "fragments/header.html";
pub const HEADER_CONTAINER_ID: &str = "shared-header";
pub const SEARCH_INPUT_ID: &str = "Research";
