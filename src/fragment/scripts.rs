//! Script reactivation
//!
//! Markup assigned through [`DomNode::set_inner_html`] is inert: the parser never runs the
//! scripts it creates. A fragment that ships behavior has to have each `<script>` replaced by a
//! fresh clone, which is what makes a browser execute it. [`ScriptReactivator`] performs that
//! clone-and-substitute step in document order and hands the result to a [`ScriptHost`], the
//! seam to whatever actually runs code in page context.

use super::catch_panic;
use crate::dom::DomNode;
use crate::error::{Error, FetchError, Result, ScriptError};
use crate::location::PageLocation;
use crate::resource::ResourceFetcher;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

const SRC_ATTRIBUTE: &str = "src";
const DEFAULT_FRAGMENT_NAME: &str = "fragment";

/// The parts of an injected script element needed to build its replacement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptDescriptor {
  /// Attributes in source order, including `src`.
  pub attributes: Vec<(String, String)>,
  /// Raw `src` attribute value, if the attribute exists.
  pub src: Option<String>,
  /// `textContent` of the element.
  pub text: String,
}

impl ScriptDescriptor {
  pub fn from_element(node: &DomNode) -> Self {
    Self {
      attributes: node
        .attributes_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect(),
      src: node.get_attribute(SRC_ATTRIBUTE),
      text: node.descendant_text(),
    }
  }

  /// A `src` attribute that is present but blank marks a script whose source was lost upstream.
  pub fn is_placeholder(&self) -> bool {
    matches!(&self.src, Some(src) if src.trim().is_empty())
  }

  /// Every attribute except `src`, in source order.
  pub fn copied_attributes(&self) -> Vec<(String, String)> {
    self
      .attributes
      .iter()
      .filter(|(name, _)| !name.eq_ignore_ascii_case(SRC_ATTRIBUTE))
      .cloned()
      .collect()
  }
}

/// Inline code ready to run, already carrying its `sourceURL` annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineScript {
  pub index: usize,
  pub source_name: String,
  pub code: String,
  pub attributes: Vec<(String, String)>,
}

/// An external script whose `src` was resolved against the page location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalScript {
  pub index: usize,
  /// Absolute URL, or the raw attribute value when it could not be resolved.
  pub src: String,
  pub raw_src: String,
  pub attributes: Vec<(String, String)>,
}

/// Executes reactivated scripts in page context.
///
/// `execute_inline` errors are per-script failures. `load_external` plays the role of the
/// element's load/error observers: its result is only ever logged and recorded.
pub trait ScriptHost: Send + Sync {
  fn execute_inline(&self, script: &InlineScript) -> Result<()>;

  fn load_external(&self, script: &ExternalScript) -> Result<()>;
}

impl<T: ScriptHost + ?Sized> ScriptHost for Arc<T> {
  fn execute_inline(&self, script: &InlineScript) -> Result<()> {
    (**self).execute_inline(script)
  }

  fn load_external(&self, script: &ExternalScript) -> Result<()> {
    (**self).load_external(script)
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", content = "reason", rename_all = "snake_case")]
pub enum ExternalLoad {
  Loaded,
  Failed(String),
}

/// What happened to one script of the container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScriptOutcome {
  Executed { source_name: String },
  ExecutionFailed { source_name: String, reason: String },
  External { src: String, load: ExternalLoad },
  Skipped { reason: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReactivationReport {
  /// One entry per script, indexed by document position.
  pub scripts: Vec<(usize, ScriptOutcome)>,
}

impl ReactivationReport {
  pub fn len(&self) -> usize {
    self.scripts.len()
  }

  pub fn is_empty(&self) -> bool {
    self.scripts.is_empty()
  }

  /// Scripts that were substituted into the document.
  pub fn reactivated(&self) -> usize {
    self
      .scripts
      .iter()
      .filter(|(_, outcome)| !matches!(outcome, ScriptOutcome::Skipped { .. }))
      .count()
  }

  /// Per-script problems as errors, for callers that want to surface them.
  pub fn errors(&self) -> Vec<ScriptError> {
    self
      .scripts
      .iter()
      .filter_map(|(index, outcome)| match outcome {
        ScriptOutcome::Skipped { reason } => Some(ScriptError::Placeholder {
          index: *index,
          reason: reason.clone(),
        }),
        ScriptOutcome::ExecutionFailed {
          source_name,
          reason,
        } => Some(ScriptError::ExecutionFailed {
          source_name: source_name.clone(),
          reason: reason.clone(),
        }),
        ScriptOutcome::External {
          src,
          load: ExternalLoad::Failed(reason),
        } => Some(ScriptError::LoadFailed {
          src: src.clone(),
          reason: reason.clone(),
        }),
        _ => None,
      })
      .collect()
  }
}

/// Name used in the `sourceURL` annotation: container id, then `data-fragment`, then
/// `fragment`.
pub fn fragment_name(container: &DomNode) -> String {
  ["id", "data-fragment"]
    .iter()
    .filter_map(|attr| container.get_attribute_ref(attr))
    .find(|value| !value.is_empty())
    .unwrap_or(DEFAULT_FRAGMENT_NAME)
    .to_string()
}

/// Trimmed inline code followed by the `sourceURL` annotation.
pub fn annotate_inline(text: &str, source_name: &str) -> String {
  format!("{}\n//# sourceURL={}", text.trim(), source_name)
}

/// Replaces every script under a container with an executable clone.
pub struct ScriptReactivator<'a> {
  host: &'a dyn ScriptHost,
  location: &'a PageLocation,
}

impl<'a> ScriptReactivator<'a> {
  pub fn new(host: &'a dyn ScriptHost, location: &'a PageLocation) -> Self {
    Self { host, location }
  }

  /// Reactivate the scripts currently under `container`. An absent container is a no-op.
  pub fn reactivate(&self, container: Option<&mut DomNode>) -> ReactivationReport {
    let mut report = ReactivationReport::default();
    let Some(container) = container else {
      return report;
    };
    let name = fragment_name(container);
    let paths = container.descendant_paths(&|node: &DomNode| node.is_tag("script"));
    tracing::debug!(container = %name, scripts = paths.len(), "reactivating scripts");

    for (index, path) in paths.iter().enumerate() {
      let outcome = match self.reactivate_one(container, path, index, &name) {
        Ok(outcome) => outcome,
        Err(err) => {
          tracing::warn!(container = %name, index, error = %err, "script skipped");
          ScriptOutcome::Skipped {
            reason: err.to_string(),
          }
        }
      };
      report.scripts.push((index, outcome));
    }
    report
  }

  fn reactivate_one(
    &self,
    container: &mut DomNode,
    path: &[usize],
    index: usize,
    fragment: &str,
  ) -> Result<ScriptOutcome> {
    let descriptor = container
      .node_at_path(path)
      .map(ScriptDescriptor::from_element)
      .ok_or_else(|| Error::Other(format!("script #{index} vanished from the container")))?;

    if descriptor.is_placeholder() {
      return Err(Error::Script(ScriptError::Placeholder {
        index,
        reason: "empty src attribute".to_string(),
      }));
    }

    let mut replacement = DomNode::element("script", descriptor.copied_attributes());

    match &descriptor.src {
      Some(raw_src) => {
        let src = self
          .location
          .resolve(raw_src)
          .unwrap_or_else(|_| raw_src.clone());
        replacement.set_attribute(SRC_ATTRIBUTE, &src);
        container.replace_at_path(path, replacement)?;

        let script = ExternalScript {
          index,
          src: src.clone(),
          raw_src: raw_src.clone(),
          attributes: descriptor.copied_attributes(),
        };
        let load = match catch_panic(|| self.host.load_external(&script)) {
          Ok(()) => {
            tracing::debug!(%src, "loaded");
            ExternalLoad::Loaded
          }
          Err(err) => {
            tracing::warn!(%src, error = %err, "failed to load");
            ExternalLoad::Failed(err.to_string())
          }
        };
        Ok(ScriptOutcome::External { src, load })
      }
      None => {
        let source_name = format!("{fragment}::inline-{index}.js");
        let code = annotate_inline(&descriptor.text, &source_name);
        replacement.children.push(DomNode::text(code.clone()));
        container.replace_at_path(path, replacement)?;

        let script = InlineScript {
          index,
          source_name: source_name.clone(),
          code,
          attributes: descriptor.copied_attributes(),
        };
        match catch_panic(|| self.host.execute_inline(&script)) {
          Ok(()) => {
            tracing::debug!(%source_name, "executed inline");
            Ok(ScriptOutcome::Executed { source_name })
          }
          Err(err) => {
            tracing::error!(%source_name, error = %err, "error re-running script");
            Ok(ScriptOutcome::ExecutionFailed {
              source_name,
              reason: err.to_string(),
            })
          }
        }
      }
    }
  }
}

/// A script the host was asked to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptEvent {
  Inline { source_name: String, code: String },
  External { src: String },
}

/// Records every script handed to it instead of running anything.
///
/// Sources registered through [`fail_on`](Self::fail_on) (an inline `source_name` or an
/// external `src`) report an error after being recorded.
#[derive(Debug, Default)]
pub struct RecordingScriptHost {
  events: Mutex<Vec<ScriptEvent>>,
  failing: HashSet<String>,
}

impl RecordingScriptHost {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn fail_on(mut self, source: impl Into<String>) -> Self {
    self.failing.insert(source.into());
    self
  }

  pub fn events(&self) -> Vec<ScriptEvent> {
    self
      .events
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .clone()
  }

  pub fn inline_codes(&self) -> Vec<String> {
    self
      .events()
      .into_iter()
      .filter_map(|event| match event {
        ScriptEvent::Inline { code, .. } => Some(code),
        ScriptEvent::External { .. } => None,
      })
      .collect()
  }

  pub fn external_sources(&self) -> Vec<String> {
    self
      .events()
      .into_iter()
      .filter_map(|event| match event {
        ScriptEvent::External { src } => Some(src),
        ScriptEvent::Inline { .. } => None,
      })
      .collect()
  }

  fn record(&self, event: ScriptEvent) {
    self
      .events
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .push(event);
  }
}

impl ScriptHost for RecordingScriptHost {
  fn execute_inline(&self, script: &InlineScript) -> Result<()> {
    self.record(ScriptEvent::Inline {
      source_name: script.source_name.clone(),
      code: script.code.clone(),
    });
    if self.failing.contains(&script.source_name) {
      return Err(Error::Script(ScriptError::ExecutionFailed {
        source_name: script.source_name.clone(),
        reason: "configured to fail".to_string(),
      }));
    }
    Ok(())
  }

  fn load_external(&self, script: &ExternalScript) -> Result<()> {
    self.record(ScriptEvent::External {
      src: script.src.clone(),
    });
    if self.failing.contains(&script.src) {
      return Err(Error::Script(ScriptError::LoadFailed {
        src: script.src.clone(),
        reason: "configured to fail".to_string(),
      }));
    }
    Ok(())
  }
}

/// Retrieves external scripts through a [`ResourceFetcher`] so load and error observers reflect
/// whether the source actually exists. Inline code is recorded as-is.
pub struct FetchingScriptHost {
  fetcher: Arc<dyn ResourceFetcher>,
  recorder: RecordingScriptHost,
}

impl FetchingScriptHost {
  pub fn new(fetcher: Arc<dyn ResourceFetcher>) -> Self {
    Self {
      fetcher,
      recorder: RecordingScriptHost::new(),
    }
  }

  pub fn events(&self) -> Vec<ScriptEvent> {
    self.recorder.events()
  }
}

impl ScriptHost for FetchingScriptHost {
  fn execute_inline(&self, script: &InlineScript) -> Result<()> {
    self.recorder.execute_inline(script)
  }

  fn load_external(&self, script: &ExternalScript) -> Result<()> {
    self.recorder.load_external(script)?;
    let resource = self.fetcher.fetch(&script.src)?;
    match resource.status {
      Some(status) if !resource.is_ok() => Err(Error::Fetch(FetchError::BadStatus {
        url: script.src.clone(),
        status,
      })),
      _ => Ok(()),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::dom::parse_fragment;

  fn container(id: Option<&str>, markup: &str) -> DomNode {
    let attrs = id
      .map(|id| vec![("id".to_string(), id.to_string())])
      .unwrap_or_default();
    let mut node = DomNode::element("div", attrs);
    node.children = parse_fragment(markup).unwrap();
    node
  }

  fn location() -> PageLocation {
    PageLocation::parse("https://example.com/site/index.html").unwrap()
  }

  #[test]
  fn inline_and_external_scripts_are_reactivated() {
    let host = RecordingScriptHost::new();
    let location = location();
    let mut root = container(
      Some("nav"),
      "<script>  console.log('hi');  </script><script src=\"js/menu.js\" defer></script>",
    );

    let report = ScriptReactivator::new(&host, &location).reactivate(Some(&mut root));

    assert_eq!(report.reactivated(), 2);
    assert_eq!(
      host.events(),
      vec![
        ScriptEvent::Inline {
          source_name: "nav::inline-0.js".into(),
          code: "console.log('hi');\n//# sourceURL=nav::inline-0.js".into(),
        },
        ScriptEvent::External {
          src: "https://example.com/site/js/menu.js".into(),
        },
      ]
    );
    let external = &root.children[1];
    assert_eq!(
      external.attributes_iter().collect::<Vec<_>>(),
      vec![("defer", ""), ("src", "https://example.com/site/js/menu.js")]
    );
  }

  #[test]
  fn absent_container_is_a_no_op() {
    let host = RecordingScriptHost::new();
    let location = location();
    let report = ScriptReactivator::new(&host, &location).reactivate(None);
    assert!(report.is_empty());
    assert!(host.events().is_empty());
  }

  #[test]
  fn fragment_name_fallbacks() {
    let mut node = DomNode::element("div", vec![("data-fragment".into(), "footer".into())]);
    assert_eq!(fragment_name(&node), "footer");
    node.set_attribute("id", "");
    assert_eq!(fragment_name(&node), "footer");
    assert_eq!(fragment_name(&DomNode::element("div", Vec::new())), "fragment");
  }

  #[test]
  fn placeholder_is_skipped_and_left_in_place() {
    let host = RecordingScriptHost::new();
    let location = location();
    let mut root = container(None, "<script src=\" \"></script><script>run()</script>");

    let report = ScriptReactivator::new(&host, &location).reactivate(Some(&mut root));

    assert!(matches!(report.scripts[0], (0, ScriptOutcome::Skipped { .. })));
    assert_eq!(root.children[0].get_attribute_ref("src"), Some(" "));
    assert_eq!(host.inline_codes(), vec!["run()\n//# sourceURL=fragment::inline-1.js"]);
    assert!(matches!(
      report.errors().as_slice(),
      [ScriptError::Placeholder { index: 0, .. }]
    ));
  }

  #[test]
  fn failing_script_does_not_stop_the_rest() {
    let host = RecordingScriptHost::new().fail_on("c::inline-0.js");
    let location = location();
    let mut root = container(Some("c"), "<script>a()</script><script>b()</script>");

    let report = ScriptReactivator::new(&host, &location).reactivate(Some(&mut root));

    assert!(matches!(
      &report.scripts[0].1,
      ScriptOutcome::ExecutionFailed { source_name, .. } if source_name == "c::inline-0.js"
    ));
    assert!(matches!(&report.scripts[1].1, ScriptOutcome::Executed { .. }));
    assert_eq!(host.inline_codes().len(), 2);
  }

  #[test]
  fn external_load_failure_is_recorded_not_propagated() {
    let host = RecordingScriptHost::new().fail_on("https://example.com/broken.js");
    let location = location();
    let mut root = container(Some("c"), "<script src=\"/broken.js\"></script>");

    let report = ScriptReactivator::new(&host, &location).reactivate(Some(&mut root));

    assert_eq!(report.reactivated(), 1);
    assert!(matches!(
      &report.scripts[0].1,
      ScriptOutcome::External { load: ExternalLoad::Failed(_), .. }
    ));
  }

  #[test]
  fn panicking_host_is_contained() {
    struct PanickingHost;
    impl ScriptHost for PanickingHost {
      fn execute_inline(&self, _script: &InlineScript) -> Result<()> {
        panic!("engine crashed")
      }
      fn load_external(&self, _script: &ExternalScript) -> Result<()> {
        Ok(())
      }
    }

    let location = location();
    let mut root = container(Some("c"), "<script>x()</script><script src=\"a.js\"></script>");
    let report = ScriptReactivator::new(&PanickingHost, &location).reactivate(Some(&mut root));

    assert!(matches!(&report.scripts[0].1, ScriptOutcome::ExecutionFailed { reason, .. } if reason.contains("engine crashed")));
    assert!(matches!(
      &report.scripts[1].1,
      ScriptOutcome::External { load: ExternalLoad::Loaded, .. }
    ));
  }

  #[test]
  fn nested_scripts_follow_document_order() {
    let host = RecordingScriptHost::new();
    let location = location();
    let mut root = container(
      Some("n"),
      "<div><script>first()</script></div><script>second()</script>",
    );

    ScriptReactivator::new(&host, &location).reactivate(Some(&mut root));

    assert_eq!(
      host.inline_codes(),
      vec![
        "first()\n//# sourceURL=n::inline-0.js",
        "second()\n//# sourceURL=n::inline-1.js",
      ]
    );
  }

  #[test]
  fn unresolvable_src_falls_back_to_raw_value() {
    let host = RecordingScriptHost::new();
    let location = PageLocation::parse("about:blank").unwrap();
    let mut root = container(
      Some("c"),
      "<script src=\"js/app.js\"></script><script>after()</script>",
    );

    let report = ScriptReactivator::new(&host, &location).reactivate(Some(&mut root));

    assert_eq!(report.reactivated(), 2);
    assert_eq!(host.external_sources(), vec!["js/app.js"]);
    assert_eq!(root.children[0].get_attribute_ref("src"), Some("js/app.js"));
    assert_eq!(host.inline_codes(), vec!["after()\n//# sourceURL=c::inline-1.js"]);
  }

  #[test]
  fn template_scripts_stay_inert() {
    let host = RecordingScriptHost::new();
    let location = location();
    let mut root = container(
      Some("c"),
      "<template><script>tpl()</script></template><script>real()</script>",
    );

    let report = ScriptReactivator::new(&host, &location).reactivate(Some(&mut root));

    assert_eq!(report.len(), 1);
    assert_eq!(host.inline_codes(), vec!["real()\n//# sourceURL=c::inline-0.js"]);
    let inert = &root.children[0].children[0];
    assert!(inert.is_tag("script"));
    assert_eq!(inert.descendant_text(), "tpl()");
  }
}
