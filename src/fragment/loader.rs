//! Fragment loading pipeline
//!
//! [`FragmentLoader::load`] never fails outward. Whatever goes wrong (every candidate missing,
//! no container with the requested id, a broken script, a panicking callback) is logged and
//! written to the returned [`LoadReport`], and the page carries on without the fragment.
//!
//! The three post-injection steps run behind independent boundaries: an error or panic in one
//! of them is recorded as a [`StepFailure`] and the next step still runs.

use super::catch_panic;
use super::fetch::{AttemptLog, FragmentFetcher};
use super::links::{ActiveLinkMarker, LinkScope};
use super::scripts::{ReactivationReport, ScriptHost, ScriptReactivator};
use super::variants::PathVariantResolver;
use crate::dom::DomNode;
use crate::error::{Error, Result};
use crate::location::PageLocation;
use crate::resource::ResourceFetcher;
use serde::Serialize;
use std::fmt;

/// Error type completion callbacks may return.
pub type CallbackError = Box<dyn std::error::Error + Send + Sync>;

/// Invoked with the container once the fragment is injected.
pub type CompletionCallback<'c> =
  Box<dyn FnOnce(&mut DomNode) -> std::result::Result<(), CallbackError> + 'c>;

/// Box a closure as a completion callback.
pub fn on_complete<'c, F>(f: F) -> Option<CompletionCallback<'c>>
where
  F: FnOnce(&mut DomNode) -> std::result::Result<(), CallbackError> + 'c,
{
  Some(Box::new(f))
}

/// A post-injection step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
  MarkActiveLink,
  RunScripts,
  Callback,
}

impl fmt::Display for Step {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Step::MarkActiveLink => "markActiveLink",
      Step::RunScripts => "runFragmentScripts",
      Step::Callback => "callback",
    })
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepFailure {
  pub step: Step,
  pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StepOutcome {
  Completed,
  /// No callback was supplied.
  Skipped,
  Failed(StepFailure),
}

/// How far a load got.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadStatus {
  /// The markup is in the container; see the step outcomes for the rest.
  Injected,
  /// No candidate answered ok. The document is untouched.
  FetchFailed,
  /// The fragment arrived but the document has no element with the container id.
  ContainerMissing,
  /// The fragment markup could not be parsed.
  InjectionFailed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadReport {
  pub resource_path: String,
  pub container_id: String,
  pub status: LoadStatus,
  /// Candidate that answered ok.
  pub candidate: Option<String>,
  pub url: Option<String>,
  pub attempts: AttemptLog,
  pub active_links: Option<usize>,
  pub scripts: Option<ReactivationReport>,
  pub steps: Vec<(Step, StepOutcome)>,
  /// Message of the error that ended the load early.
  pub error: Option<String>,
}

impl LoadReport {
  fn new(resource_path: &str, container_id: &str) -> Self {
    Self {
      resource_path: resource_path.to_string(),
      container_id: container_id.to_string(),
      status: LoadStatus::FetchFailed,
      candidate: None,
      url: None,
      attempts: AttemptLog::default(),
      active_links: None,
      scripts: None,
      steps: Vec::new(),
      error: None,
    }
  }

  pub fn is_injected(&self) -> bool {
    self.status == LoadStatus::Injected
  }

  pub fn step(&self, step: Step) -> Option<&StepOutcome> {
    self
      .steps
      .iter()
      .find(|(s, _)| *s == step)
      .map(|(_, outcome)| outcome)
  }

  pub fn failures(&self) -> Vec<&StepFailure> {
    self
      .steps
      .iter()
      .filter_map(|(_, outcome)| match outcome {
        StepOutcome::Failed(failure) => Some(failure),
        _ => None,
      })
      .collect()
  }
}

/// Fetch, inject, mark links, reactivate scripts, call back.
pub struct FragmentLoader<'a> {
  fetcher: &'a dyn ResourceFetcher,
  location: &'a PageLocation,
  host: &'a dyn ScriptHost,
  resolver: PathVariantResolver,
}

impl<'a> FragmentLoader<'a> {
  pub fn new(
    fetcher: &'a dyn ResourceFetcher,
    location: &'a PageLocation,
    host: &'a dyn ScriptHost,
  ) -> Self {
    Self {
      fetcher,
      location,
      host,
      resolver: PathVariantResolver::default(),
    }
  }

  pub fn with_resolver(mut self, resolver: PathVariantResolver) -> Self {
    self.resolver = resolver;
    self
  }

  /// Load `resource_path` into the element of `document` whose id is `container_id`.
  pub fn load(
    &self,
    document: &mut DomNode,
    resource_path: &str,
    container_id: &str,
    callback: Option<CompletionCallback<'_>>,
  ) -> LoadReport {
    let mut report = LoadReport::new(resource_path, container_id);
    tracing::debug!(resource = resource_path, container = container_id, "loading fragment");

    let fetched = match FragmentFetcher::new(self.fetcher, self.location)
      .with_resolver(self.resolver)
      .fetch(resource_path)
    {
      Ok(fetched) => fetched,
      Err(err) => {
        tracing::error!(
          resource = resource_path,
          container = container_id,
          error = %err,
          "failed to load fragment"
        );
        if let Error::Fetch(fetch_err) = &err {
          if let Some(attempts) = fetch_err.attempts() {
            report.attempts = attempts.clone();
          }
        }
        report.error = Some(err.to_string());
        return report;
      }
    };
    report.candidate = Some(fetched.candidate.clone());
    report.url = Some(fetched.url.clone());
    report.attempts = fetched.attempts.clone();
    let html = fetched.text();

    let Some(container) = document.find_element_by_id_mut(container_id) else {
      tracing::warn!(container = container_id, "container not found");
      report.status = LoadStatus::ContainerMissing;
      report.error = Some(format!("Container not found: '{container_id}'"));
      return report;
    };

    if let Err(err) = container.set_inner_html(&html) {
      tracing::error!(container = container_id, error = %err, "failed to inject fragment");
      report.status = LoadStatus::InjectionFailed;
      report.error = Some(err.to_string());
      return report;
    }
    report.status = LoadStatus::Injected;
    tracing::debug!(container = container_id, candidate = %fetched.candidate, "fragment injected");

    let marker = ActiveLinkMarker::new(self.location);
    report.active_links = isolate(&mut report, Step::MarkActiveLink, || {
      marker.try_mark(LinkScope::Element(&mut *container))
    });

    let reactivator = ScriptReactivator::new(self.host, self.location);
    report.scripts = isolate(&mut report, Step::RunScripts, || {
      Ok(reactivator.reactivate(Some(&mut *container)))
    });

    match callback {
      Some(callback) => {
        let done = isolate(&mut report, Step::Callback, || {
          callback(&mut *container).map_err(|e| Error::Other(e.to_string()))
        });
        if done.is_some() {
          tracing::debug!(container = container_id, "callback executed");
        }
      }
      None => report.steps.push((Step::Callback, StepOutcome::Skipped)),
    }

    report
  }
}

/// Run one post-injection step behind its own error and panic boundary.
fn isolate<T>(report: &mut LoadReport, step: Step, f: impl FnOnce() -> Result<T>) -> Option<T> {
  match catch_panic(f) {
    Ok(value) => {
      report.steps.push((step, StepOutcome::Completed));
      Some(value)
    }
    Err(err) => {
      let message = err.to_string();
      if step == Step::Callback {
        tracing::error!(container = %report.container_id, error = %message, "callback error");
      } else {
        tracing::warn!(container = %report.container_id, %step, error = %message, "step failed");
      }
      report
        .steps
        .push((step, StepOutcome::Failed(StepFailure { step, message })));
      None
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::dom::parse_html;
  use crate::fragment::scripts::RecordingScriptHost;
  use crate::resource::FetchedResource;

  struct SingleFetcher {
    url: &'static str,
    body: &'static str,
  }

  impl ResourceFetcher for SingleFetcher {
    fn fetch(&self, url: &str) -> Result<FetchedResource> {
      if url == self.url {
        Ok(FetchedResource::new(self.body.as_bytes().to_vec(), None).with_status(200))
      } else {
        Ok(FetchedResource::new(Vec::new(), None).with_status(404))
      }
    }
  }

  fn page() -> (PageLocation, DomNode) {
    (
      PageLocation::parse("https://example.com/about.html").unwrap(),
      parse_html(r#"<body><div id="shared-header"></div></body>"#).unwrap(),
    )
  }

  #[test]
  fn callback_failure_is_isolated() {
    let (location, mut document) = page();
    let fetcher = SingleFetcher {
      url: "https://example.com/header.html",
      body: r#"<a href="about.html">About</a><script>init()</script>"#,
    };
    let host = RecordingScriptHost::new();
    let report = FragmentLoader::new(&fetcher, &location, &host).load(
      &mut document,
      "header.html",
      "shared-header",
      on_complete(|_container| Err("callback exploded".into())),
    );

    assert!(report.is_injected());
    assert_eq!(report.active_links, Some(1));
    assert_eq!(report.step(Step::MarkActiveLink), Some(&StepOutcome::Completed));
    assert_eq!(report.step(Step::RunScripts), Some(&StepOutcome::Completed));
    assert_eq!(report.failures().len(), 1);
    assert_eq!(report.failures()[0].step, Step::Callback);
    assert_eq!(host.inline_codes().len(), 1);
  }

  #[test]
  fn panicking_callback_is_contained() {
    let (location, mut document) = page();
    let fetcher = SingleFetcher {
      url: "https://example.com/header.html",
      body: "<p>x</p>",
    };
    let host = RecordingScriptHost::new();
    let report = FragmentLoader::new(&fetcher, &location, &host).load(
      &mut document,
      "header.html",
      "shared-header",
      on_complete(|_container| panic!("bad callback")),
    );
    assert!(report.is_injected());
    assert!(report.failures()[0].message.contains("bad callback"));
  }

  #[test]
  fn missing_container_leaves_document_untouched() {
    let (location, mut document) = page();
    let before = document.clone();
    let fetcher = SingleFetcher {
      url: "https://example.com/header.html",
      body: "<p>x</p>",
    };
    let host = RecordingScriptHost::new();
    let report = FragmentLoader::new(&fetcher, &location, &host).load(
      &mut document,
      "header.html",
      "nope",
      None,
    );
    assert_eq!(report.status, LoadStatus::ContainerMissing);
    assert!(report.steps.is_empty());
    assert_eq!(document, before);
  }

  #[test]
  fn exhausted_fetch_keeps_attempts() {
    let (location, mut document) = page();
    let fetcher = SingleFetcher {
      url: "https://example.com/never.html",
      body: "",
    };
    let host = RecordingScriptHost::new();
    let loader = FragmentLoader::new(&fetcher, &location, &host);
    let expected = FragmentFetcher::new(&fetcher, &location).candidates("missing.html");
    let report = loader.load(&mut document, "missing.html", "shared-header", None);

    assert_eq!(report.status, LoadStatus::FetchFailed);
    assert_eq!(report.attempts.len(), expected.len());
    assert!(report.error.is_some());
    assert!(report.steps.is_empty());
  }
}
