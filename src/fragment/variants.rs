//! Path candidate generation
//!
//! Static sites get served from many roots: a dev server at the repository root, a `docs/`
//! subfolder on GitHub Pages, a file opened straight from disk. A fragment referenced as
//! `fragments/header.html` may therefore live next to the page, at the server root, or a few
//! directories up. [`PathVariantResolver`] turns one requested path into an ordered, duplicate
//! free list of spellings to try.

use crate::location::directory_of;
use std::collections::HashSet;

/// Default cap on "climb" and "root" candidates.
pub const DEFAULT_VARIANTS_LIMIT: usize = 8;

/// Generates the ordered candidate list for a resource path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathVariantResolver {
  limit: usize,
}

impl Default for PathVariantResolver {
  fn default() -> Self {
    Self::new(DEFAULT_VARIANTS_LIMIT)
  }
}

impl PathVariantResolver {
  pub fn new(limit: usize) -> Self {
    Self { limit }
  }

  pub fn limit(&self) -> usize {
    self.limit
  }

  /// Candidates for `resource` requested from a page whose path is `page_path`.
  ///
  /// The order is fixed:
  ///
  /// 1. `resource`
  /// 2. `./resource`
  /// 3. `resource` without leading slashes
  /// 4. page directory + `resource`
  /// 5. `/` + `resource` without leading slashes
  /// 6. `../resource`, `../../resource`, ... up to `min(depth + 2, limit)` levels
  /// 7. `/<seg1>/.../<segN>/resource` for each truncation of the page directory, longest
  ///    first, up to `min(depth, limit)` entries
  ///
  /// Backslashes become forward slashes and a spelling seen earlier is never repeated.
  pub fn candidates(&self, resource: &str, page_path: &str) -> Vec<String> {
    let dir = directory_of(&normalize(page_path));
    let stripped = resource.trim_start_matches('/');
    let parts: Vec<&str> = dir.split('/').filter(|s| !s.is_empty()).collect();

    let mut raw = vec![
      resource.to_string(),
      format!("./{resource}"),
      stripped.to_string(),
      format!("{dir}{resource}"),
      format!("/{stripped}"),
    ];

    for depth in 1..=(parts.len() + 2).min(self.limit) {
      raw.push(format!("{}{resource}", "../".repeat(depth)));
    }

    for cut in 0..parts.len().min(self.limit) {
      let kept = &parts[..parts.len() - cut];
      raw.push(format!("/{}/{resource}", kept.join("/")));
    }

    let mut seen = HashSet::with_capacity(raw.len());
    raw
      .into_iter()
      .map(|candidate| normalize(&candidate))
      .filter(|candidate| seen.insert(candidate.clone()))
      .collect()
  }
}

/// Convert backslash separators to forward slashes.
pub fn normalize(path: &str) -> String {
  path.replace('\\', "/")
}
