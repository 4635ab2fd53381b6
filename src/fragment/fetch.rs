//! Fetching a fragment over its path candidates
//!
//! Candidates are tried strictly in resolver order and each one exactly once. The first `ok`
//! response wins; 4xx/5xx answers and transport failures are written to the [`AttemptLog`] and
//! resolution moves on. There is no retry and no per-attempt timeout beyond whatever the
//! underlying [`ResourceFetcher`] imposes.

use super::variants::PathVariantResolver;
use crate::error::{Error, FetchError, Result};
use crate::location::PageLocation;
use crate::resource::{FetchedResource, ResourceFetcher};
use serde::Serialize;
use std::fmt;

/// What happened when one candidate was requested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum AttemptOutcome {
  /// An ok response. `None` for sources without an HTTP status.
  Success(Option<u16>),
  /// A response arrived with a non-ok status.
  Status(u16),
  /// No response at all.
  NetworkError(String),
}

impl fmt::Display for AttemptOutcome {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      AttemptOutcome::Success(Some(status)) => write!(f, "ok ({status})"),
      AttemptOutcome::Success(None) => f.write_str("ok"),
      AttemptOutcome::Status(status) => write!(f, "status {status}"),
      AttemptOutcome::NetworkError(reason) => write!(f, "error: {reason}"),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchAttempt {
  /// The candidate spelling produced by the resolver.
  pub candidate: String,
  /// The URL actually requested after resolving against the page location.
  pub url: String,
  pub outcome: AttemptOutcome,
}

/// Ordered record of every candidate tried during one resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AttemptLog {
  attempts: Vec<FetchAttempt>,
}

impl AttemptLog {
  pub fn push(&mut self, attempt: FetchAttempt) {
    self.attempts.push(attempt);
  }

  pub fn len(&self) -> usize {
    self.attempts.len()
  }

  pub fn is_empty(&self) -> bool {
    self.attempts.is_empty()
  }

  pub fn iter(&self) -> std::slice::Iter<'_, FetchAttempt> {
    self.attempts.iter()
  }

  pub fn last(&self) -> Option<&FetchAttempt> {
    self.attempts.last()
  }

  /// Candidates in the order they were tried.
  pub fn candidates(&self) -> Vec<&str> {
    self.attempts.iter().map(|a| a.candidate.as_str()).collect()
  }
}

impl<'a> IntoIterator for &'a AttemptLog {
  type Item = &'a FetchAttempt;
  type IntoIter = std::slice::Iter<'a, FetchAttempt>;

  fn into_iter(self) -> Self::IntoIter {
    self.attempts.iter()
  }
}

/// The winning response of a resolution.
#[derive(Debug, Clone)]
pub struct FetchedFragment {
  pub candidate: String,
  pub url: String,
  pub resource: FetchedResource,
  /// Every attempt up to and including the successful one.
  pub attempts: AttemptLog,
}

impl FetchedFragment {
  pub fn text(&self) -> String {
    self.resource.text()
  }
}

/// Tries path candidates against a [`ResourceFetcher`] until one answers ok.
pub struct FragmentFetcher<'a> {
  fetcher: &'a dyn ResourceFetcher,
  location: &'a PageLocation,
  resolver: PathVariantResolver,
}

impl<'a> FragmentFetcher<'a> {
  pub fn new(fetcher: &'a dyn ResourceFetcher, location: &'a PageLocation) -> Self {
    Self {
      fetcher,
      location,
      resolver: PathVariantResolver::default(),
    }
  }

  pub fn with_resolver(mut self, resolver: PathVariantResolver) -> Self {
    self.resolver = resolver;
    self
  }

  pub fn candidates(&self, resource_path: &str) -> Vec<String> {
    self
      .resolver
      .candidates(resource_path, &self.location.pathname())
  }

  /// Fetch `resource_path`, returning the first ok response.
  ///
  /// Candidates are deduplicated by spelling, not by resolved URL, so spellings such as
  /// `fragments/x.html` and `./fragments/x.html` that resolve to the same URL are each requested.
  ///
  /// Fails with [`FetchError::ResolutionExhausted`] carrying one log entry per candidate when
  /// none of them answers ok.
  pub fn fetch(&self, resource_path: &str) -> Result<FetchedFragment> {
    tracing::debug!(resource = resource_path, "trying path variants");
    let mut attempts = AttemptLog::default();

    for candidate in self.candidates(resource_path) {
      let url = self
        .location
        .resolve(&candidate)
        .unwrap_or_else(|_| candidate.clone());
      tracing::debug!(%candidate, %url, "attempting");

      match self.fetcher.fetch(&url) {
        Ok(resource) if resource.is_ok() => {
          tracing::debug!(%candidate, status = ?resource.status, "fetched fragment");
          attempts.push(FetchAttempt {
            candidate: candidate.clone(),
            url: url.clone(),
            outcome: AttemptOutcome::Success(resource.status),
          });
          return Ok(FetchedFragment {
            candidate,
            url,
            resource,
            attempts,
          });
        }
        Ok(resource) => {
          let status = resource.status.unwrap_or_default();
          tracing::debug!(%candidate, status, "candidate answered with non-ok status");
          attempts.push(FetchAttempt {
            candidate,
            url,
            outcome: AttemptOutcome::Status(status),
          });
        }
        Err(err) => {
          tracing::warn!(%candidate, error = %err, "attempt failed");
          attempts.push(FetchAttempt {
            candidate,
            url,
            outcome: AttemptOutcome::NetworkError(err.to_string()),
          });
        }
      }
    }

    tracing::error!(
      resource = resource_path,
      attempts = attempts.len(),
      "all fetch attempts failed"
    );
    Err(Error::Fetch(FetchError::ResolutionExhausted {
      resource: resource_path.to_string(),
      attempts,
    }))
  }
}
