//! Public API for fragload
//!
//! [`FragmentApi`] is the registration surface other page code talks to. It bundles the page
//! location, a resource fetcher and a script host, and exposes the four fragment capabilities:
//!
//! - [`load_fragment`](FragmentApi::load_fragment)
//! - [`run_fragment_scripts`](FragmentApi::run_fragment_scripts)
//! - [`mark_active_link`](FragmentApi::mark_active_link)
//! - [`fetch_with_variants`](FragmentApi::fetch_with_variants)
//!
//! # Example
//!
//! ```rust,no_run
//! use fragload::api::FragmentApi;
//! use fragload::dom::parse_html;
//! use fragload::PageLocation;
//!
//! let location = PageLocation::parse("https://example.com/docs/about.html")?;
//! let api = FragmentApi::builder(location).variants_limit(4).build();
//!
//! let mut document = parse_html(r#"<body><div id="shared-header"></div></body>"#)?;
//! let report = api.load_fragment(&mut document, "fragments/header.html", "shared-header", None);
//! if report.is_injected() {
//!     println!("{}", document.to_html());
//! }
//! # Ok::<(), fragload::Error>(())
//! ```

use crate::debug::runtime::{runtime_toggles, RuntimeToggles};
use crate::dom::DomNode;
use crate::error::Result;
use crate::fragment::fetch::{FetchedFragment, FragmentFetcher};
use crate::fragment::links::{ActiveLinkMarker, LinkScope};
use crate::fragment::loader::{CompletionCallback, FragmentLoader, LoadReport};
use crate::fragment::scripts::{FetchingScriptHost, ReactivationReport, ScriptHost, ScriptReactivator};
use crate::fragment::variants::PathVariantResolver;
use crate::location::PageLocation;
use crate::resource::{HttpFetcher, ResourceFetcher};
use std::sync::Arc;

/// Fragment loading capabilities bound to one page.
///
/// Loads into the same container are not coordinated: each call replaces the container's
/// content, so the load that finishes last wins.
pub struct FragmentApi {
  location: PageLocation,
  fetcher: Arc<dyn ResourceFetcher>,
  host: Arc<dyn ScriptHost>,
  variants_limit: usize,
}

impl std::fmt::Debug for FragmentApi {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("FragmentApi")
      .field("location", &self.location.href())
      .field("variants_limit", &self.variants_limit)
      .finish_non_exhaustive()
  }
}

/// Builder for [`FragmentApi`]
///
/// Unset values come from the active [`RuntimeToggles`]: the HTTP fetcher picks up
/// `FRAGLOAD_FETCH_TIMEOUT_MS` and `FRAGLOAD_USER_AGENT`, the variants limit
/// `FRAGLOAD_VARIANTS_LIMIT`. Values set on the builder always win.
pub struct FragmentApiBuilder {
  location: PageLocation,
  fetcher: Option<Arc<dyn ResourceFetcher>>,
  host: Option<Arc<dyn ScriptHost>>,
  variants_limit: Option<usize>,
  toggles: Option<Arc<RuntimeToggles>>,
}

impl FragmentApiBuilder {
  pub fn new(location: PageLocation) -> Self {
    Self {
      location,
      fetcher: None,
      host: None,
      variants_limit: None,
      toggles: None,
    }
  }

  /// Sets the fetcher used for fragments (and, by default, external scripts)
  pub fn fetcher(mut self, fetcher: Arc<dyn ResourceFetcher>) -> Self {
    self.fetcher = Some(fetcher);
    self
  }

  /// Sets the host that runs reactivated scripts
  pub fn script_host(mut self, host: Arc<dyn ScriptHost>) -> Self {
    self.host = Some(host);
    self
  }

  /// Sets the cap on climb/root path candidates
  pub fn variants_limit(mut self, limit: usize) -> Self {
    self.variants_limit = Some(limit);
    self
  }

  /// Uses these toggles instead of the process-wide ones
  pub fn toggles(mut self, toggles: Arc<RuntimeToggles>) -> Self {
    self.toggles = Some(toggles);
    self
  }

  pub fn build(self) -> FragmentApi {
    let toggles = self.toggles.unwrap_or_else(runtime_toggles);
    let fetcher = self.fetcher.unwrap_or_else(|| {
      let mut http = HttpFetcher::new().with_timeout(toggles.fetch_timeout());
      if let Some(user_agent) = toggles.user_agent() {
        http = http.with_user_agent(user_agent);
      }
      Arc::new(http) as Arc<dyn ResourceFetcher>
    });
    let host = self.host.unwrap_or_else(|| {
      Arc::new(FetchingScriptHost::new(Arc::clone(&fetcher))) as Arc<dyn ScriptHost>
    });
    FragmentApi {
      location: self.location,
      fetcher,
      host,
      variants_limit: self.variants_limit.unwrap_or_else(|| toggles.variants_limit()),
    }
  }
}

impl FragmentApi {
  /// Creates an API with default fetcher, script host and limits for `location`
  pub fn new(location: PageLocation) -> Self {
    Self::builder(location).build()
  }

  pub fn builder(location: PageLocation) -> FragmentApiBuilder {
    FragmentApiBuilder::new(location)
  }

  pub fn location(&self) -> &PageLocation {
    &self.location
  }

  pub fn fetcher(&self) -> &Arc<dyn ResourceFetcher> {
    &self.fetcher
  }

  pub fn variants_limit(&self) -> usize {
    self.variants_limit
  }

  /// Fetch `resource_path` into the element with id `container_id`, then mark the active link,
  /// reactivate scripts and invoke `callback` with the container.
  ///
  /// Never fails: problems are logged and described by the returned [`LoadReport`].
  pub fn load_fragment(
    &self,
    document: &mut DomNode,
    resource_path: &str,
    container_id: &str,
    callback: Option<CompletionCallback<'_>>,
  ) -> LoadReport {
    FragmentLoader::new(self.fetcher.as_ref(), &self.location, self.host.as_ref())
      .with_resolver(PathVariantResolver::new(self.variants_limit))
      .load(document, resource_path, container_id, callback)
  }

  /// Reactivate the scripts under `container`. `None` is a no-op.
  pub fn run_fragment_scripts(&self, container: Option<&mut DomNode>) -> ReactivationReport {
    ScriptReactivator::new(self.host.as_ref(), &self.location).reactivate(container)
  }

  /// Flag the anchor pointing at the current page. Failures are logged and yield 0.
  pub fn mark_active_link(&self, target: LinkScope<'_>) -> usize {
    ActiveLinkMarker::new(&self.location).mark(target)
  }

  /// Resolve `resource_path` over its path candidates. `variants_limit` defaults to the limit
  /// this API was built with.
  pub fn fetch_with_variants(
    &self,
    resource_path: &str,
    variants_limit: Option<usize>,
  ) -> Result<FetchedFragment> {
    let limit = variants_limit.unwrap_or(self.variants_limit);
    FragmentFetcher::new(self.fetcher.as_ref(), &self.location)
      .with_resolver(PathVariantResolver::new(limit))
      .fetch(resource_path)
  }

  /// The candidates [`fetch_with_variants`](Self::fetch_with_variants) would try, in order.
  pub fn candidates(&self, resource_path: &str) -> Vec<String> {
    PathVariantResolver::new(self.variants_limit)
      .candidates(resource_path, &self.location.pathname())
  }
}
