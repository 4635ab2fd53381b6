//! The current page's location
//!
//! [`PageLocation`] plays the role of `document.location` for the loader: it is the base that
//! relative candidates and script sources resolve against, and the source of the directory and
//! file name used by path variants and active link marking.

use crate::error::{ParseError, Result};
use std::fmt;
use url::Url;

/// File name assumed when the page path ends with `/`.
pub const DEFAULT_FILE_NAME: &str = "index.html";

/// Absolute URL of the page a fragment is loaded into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLocation {
  url: Url,
}

impl PageLocation {
  /// Parse an absolute page URL.
  ///
  /// Bare filesystem paths are accepted and converted to `file://` URLs so that the CLI can be
  /// pointed at a checkout of a static site.
  pub fn parse(href: &str) -> Result<Self> {
    let trimmed = href.trim();
    match Url::parse(trimmed) {
      Ok(url) => Ok(Self { url }),
      Err(url::ParseError::RelativeUrlWithoutBase) => {
        let path = std::path::Path::new(trimmed);
        let absolute = if path.is_absolute() {
          path.to_path_buf()
        } else {
          std::env::current_dir()?.join(path)
        };
        Url::from_file_path(&absolute)
          .map(|url| Self { url })
          .map_err(|_| {
            ParseError::InvalidUrl {
              url: trimmed.to_string(),
              reason: "not an absolute path".to_string(),
            }
            .into()
          })
      }
      Err(err) => Err(
        ParseError::InvalidUrl {
          url: trimmed.to_string(),
          reason: err.to_string(),
        }
        .into(),
      ),
    }
  }

  /// Wrap an already parsed URL.
  pub fn from_url(url: Url) -> Self {
    Self { url }
  }

  pub fn url(&self) -> &Url {
    &self.url
  }

  /// The full serialized URL (`location.href`).
  pub fn href(&self) -> &str {
    self.url.as_str()
  }

  /// The path component with backslashes normalized to forward slashes (`location.pathname`).
  pub fn pathname(&self) -> String {
    self.url.path().replace('\\', "/")
  }

  /// The directory portion of the path, including its trailing `/`.
  ///
  /// Paths without any `/` yield `./`.
  pub fn directory(&self) -> String {
    directory_of(&self.pathname())
  }

  /// Last path segment, or [`DEFAULT_FILE_NAME`] when the path ends in `/`.
  pub fn file_name(&self) -> String {
    file_name_of(&self.pathname())
  }

  /// Resolve `href` against this location, as `new URL(href, location.href)` would.
  pub fn resolve(&self, href: &str) -> std::result::Result<String, url::ParseError> {
    self.url.join(href).map(|url| url.to_string())
  }
}

impl fmt::Display for PageLocation {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.href())
  }
}

pub(crate) fn directory_of(path: &str) -> String {
  match path.rfind('/') {
    Some(idx) => path[..=idx].to_string(),
    None => "./".to_string(),
  }
}

pub(crate) fn file_name_of(path: &str) -> String {
  match path.rsplit('/').next() {
    Some(last) if !last.is_empty() => last.to_string(),
    _ => DEFAULT_FILE_NAME.to_string(),
  }
}
