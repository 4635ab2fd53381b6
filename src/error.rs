//! Error types for fragload
//!
//! This module provides error types for every subsystem:
//! - Parse errors (fragment and page markup, page URLs)
//! - Fetch errors (exhausted path resolution)
//! - DOM errors (missing containers)
//! - Script errors (reactivation of injected scripts)
//! - Search errors (dataset loading and decoding)
//!
//! All errors use the `thiserror` crate for minimal boilerplate and
//! proper error trait implementations.

use crate::fragment::fetch::AttemptLog;
use thiserror::Error;

/// Result type alias for fragload operations
///
/// # Examples
///
/// ```
/// use fragload::Result;
///
/// fn parse_markup(html: &str) -> Result<()> {
///     Ok(())
/// }
/// ```
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for fragload
///
/// Each variant wraps a more specific error type for that subsystem.
///
/// # Examples
///
/// ```
/// use fragload::Error;
/// use fragload::error::DomError;
///
/// fn locate() -> Result<(), Error> {
///     Err(Error::Dom(DomError::ContainerMissing {
///         id: "shared-header".to_string(),
///     }))
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
  /// Markup or URL parsing error
  #[error("Parse error: {0}")]
  Parse(#[from] ParseError),

  /// Fragment resolution error
  #[error("Fetch error: {0}")]
  Fetch(#[from] FetchError),

  /// DOM lookup or mutation error
  #[error("DOM error: {0}")]
  Dom(#[from] DomError),

  /// Script reactivation error
  #[error("Script error: {0}")]
  Script(#[from] ScriptError),

  /// Search widget error
  #[error("Search error: {0}")]
  Search(#[from] SearchError),

  /// I/O error (file reading, network, etc.)
  #[error("I/O error: {0}")]
  Io(#[from] std::io::Error),

  /// Generic error for miscellaneous issues
  #[error("{0}")]
  Other(String),
}

/// Errors that occur while parsing markup or URLs
#[derive(Error, Debug, Clone)]
pub enum ParseError {
  /// Invalid HTML structure
  #[error("Invalid HTML: {message}")]
  InvalidHtml { message: String },

  /// A page location that is not an absolute URL
  #[error("Invalid page URL '{url}': {reason}")]
  InvalidUrl { url: String, reason: String },

  /// Invalid data URL
  #[error("Invalid data URL: {reason}")]
  InvalidDataUrl { reason: String },
}

/// Errors that occur while resolving a fragment over its path candidates
#[derive(Error, Debug, Clone)]
pub enum FetchError {
  /// Every path candidate failed with a network error or a non-ok status
  #[error("All fetch attempts failed for '{resource}' ({} attempts)", .attempts.len())]
  ResolutionExhausted {
    resource: String,
    attempts: AttemptLog,
  },

  /// A single resource could not be retrieved
  #[error("Failed to fetch '{url}': {reason}")]
  RequestFailed { url: String, reason: String },

  /// A resource was retrieved but the server answered with a non-ok status
  #[error("Network response was not ok for '{url}': {status}")]
  BadStatus { url: String, status: u16 },
}

impl FetchError {
  /// The attempt log attached to an exhausted resolution, if any.
  pub fn attempts(&self) -> Option<&AttemptLog> {
    match self {
      FetchError::ResolutionExhausted { attempts, .. } => Some(attempts),
      _ => None,
    }
  }
}

/// Errors that occur while locating or mutating DOM nodes
#[derive(Error, Debug, Clone)]
pub enum DomError {
  /// No element with the requested id exists in the document
  #[error("Container not found: '{id}'")]
  ContainerMissing { id: String },

  /// An index path no longer points at a node
  #[error("Node path {path:?} does not exist")]
  StalePath { path: Vec<usize> },
}

/// Errors that occur while reactivating scripts
#[derive(Error, Debug, Clone)]
pub enum ScriptError {
  /// A script element that cannot be cloned into an executable script
  #[error("Script #{index} is a placeholder: {reason}")]
  Placeholder { index: usize, reason: String },

  /// The script host reported an execution failure for inline code
  #[error("Inline script '{source_name}' failed: {reason}")]
  ExecutionFailed { source_name: String, reason: String },

  /// The script host could not load an external script
  #[error("Failed to load script '{src}': {reason}")]
  LoadFailed { src: String, reason: String },
}

/// Errors raised by the search widget
#[derive(Error, Debug)]
pub enum SearchError {
  /// The dataset could not be decoded
  #[error("Invalid dataset '{source_url}': {source}")]
  InvalidDataset {
    source_url: String,
    #[source]
    source: serde_json::Error,
  },

  /// No results container could be found or created
  #[error("No results container available")]
  NoResultsContainer,
}
