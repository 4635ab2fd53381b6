//! Resource fetching abstraction
//!
//! Fragments, scripts and search datasets are all retrieved through [`ResourceFetcher`]. The
//! loader only needs "bytes plus a status" from a URL, so the transport stays swappable:
//!
//! - [`HttpFetcher`] for real pages (`http(s)://`, `file://`, `data:`)
//! - in-memory maps in tests
//! - wrappers that count or log requests
//!
//! Unlike a plain download helper, an HTTP answer with a non-ok status is still a successful
//! fetch here. The caller decides whether a 404 means "try the next path variant".
//!
//! # Example
//!
//! ```rust,no_run
//! use fragload::resource::{HttpFetcher, ResourceFetcher};
//!
//! let fetcher = HttpFetcher::new();
//! let resource = fetcher.fetch("https://example.com/fragments/header.html")?;
//! if resource.is_ok() {
//!     println!("Got {} bytes", resource.bytes.len());
//! }
//! # Ok::<(), fragload::Error>(())
//! ```

pub(crate) mod data_url;

use crate::error::{Error, FetchError, Result};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Default User-Agent string used by HTTP fetchers
pub const DEFAULT_USER_AGENT: &str = concat!("fragload/", env!("CARGO_PKG_VERSION"));

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default response size cap (16MB)
pub const DEFAULT_MAX_SIZE: usize = 16 * 1024 * 1024;

const MAX_REDIRECTS: usize = 10;

// ============================================================================
// Core types
// ============================================================================

/// Result of fetching an external resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedResource {
    /// Raw bytes of the resource
    pub bytes: Vec<u8>,
    /// Content-Type header value, if available (e.g., "text/html")
    pub content_type: Option<String>,
    /// HTTP status code. `None` for schemes without one (`file:`, `data:`)
    pub status: Option<u16>,
    /// The URL the bytes were served from after redirects, when known
    pub final_url: Option<String>,
}

impl FetchedResource {
    /// Create a new FetchedResource without a status (always ok)
    pub fn new(bytes: Vec<u8>, content_type: Option<String>) -> Self {
        Self {
            bytes,
            content_type,
            status: None,
            final_url: None,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_final_url(mut self, url: impl Into<String>) -> Self {
        self.final_url = Some(url.into());
        self
    }

    /// `Response.ok`: no status at all, or a 2xx status.
    pub fn is_ok(&self) -> bool {
        self.status.map(|s| (200..300).contains(&s)).unwrap_or(true)
    }

    /// Body decoded as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}

// ============================================================================
// ResourceFetcher trait
// ============================================================================

/// Trait for fetching external resources
///
/// URLs can be:
/// - `http://` or `https://` - fetch over network
/// - `file://` - read from filesystem
/// - `data:` - decode data URL inline
///
/// Implementations return `Err` only when no response exists at all (connection refused,
/// missing file, malformed URL). Any HTTP answer is returned as `Ok` with its status set.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` to allow sharing across threads.
pub trait ResourceFetcher: Send + Sync {
    /// Fetch a resource from the given absolute URL
    fn fetch(&self, url: &str) -> Result<FetchedResource>;
}

// Allow Arc<dyn ResourceFetcher> to be used as ResourceFetcher
impl<T: ResourceFetcher + ?Sized> ResourceFetcher for Arc<T> {
    fn fetch(&self, url: &str) -> Result<FetchedResource> {
        (**self).fetch(url)
    }
}

impl<T: ResourceFetcher + ?Sized> ResourceFetcher for &T {
    fn fetch(&self, url: &str) -> Result<FetchedResource> {
        (**self).fetch(url)
    }
}

// ============================================================================
// HttpFetcher - Default implementation
// ============================================================================

/// Default HTTP resource fetcher
///
/// Fetches resources over HTTP/HTTPS with configurable timeouts and user agent.
/// Also handles `file://` URLs, `data:` URLs and bare filesystem paths.
///
/// # Example
///
/// ```rust,no_run
/// use fragload::resource::HttpFetcher;
/// use std::time::Duration;
///
/// let fetcher = HttpFetcher::new()
///     .with_timeout(Duration::from_secs(60))
///     .with_user_agent("MyApp/1.0");
/// ```
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    timeout: Duration,
    user_agent: String,
    max_size: usize,
}

impl HttpFetcher {
    /// Create a new HttpFetcher with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the User-Agent header
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the maximum response size in bytes
    pub fn with_max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size;
        self
    }

    fn request_failed(url: &str, reason: impl ToString) -> Error {
        Error::Fetch(FetchError::RequestFailed {
            url: url.to_string(),
            reason: reason.to_string(),
        })
    }

    /// Fetch from an HTTP/HTTPS URL
    fn fetch_http(&self, url: &str) -> Result<FetchedResource> {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(self.timeout))
            .http_status_as_error(false)
            .max_redirects(0)
            .build();
        let agent: ureq::Agent = config.into();

        let mut current = url.to_string();
        for _ in 0..MAX_REDIRECTS {
            let mut response = agent
                .get(&current)
                .header("User-Agent", &self.user_agent)
                .call()
                .map_err(|e| Self::request_failed(&current, e))?;

            let status = response.status().as_u16();
            if (300..400).contains(&status) {
                if let Some(loc) = response
                    .headers()
                    .get("location")
                    .and_then(|h| h.to_str().ok())
                {
                    current = Url::parse(&current)
                        .ok()
                        .and_then(|base| base.join(loc).ok())
                        .map(|u| u.to_string())
                        .unwrap_or_else(|| loc.to_string());
                    tracing::debug!(%url, redirect = %current, "following redirect");
                    continue;
                }
            }

            let content_type = response
                .headers()
                .get("content-type")
                .and_then(|h| h.to_str().ok())
                .map(|s| s.to_string());

            let bytes = response
                .body_mut()
                .with_config()
                .limit(self.max_size as u64)
                .read_to_vec()
                .map_err(|e| Self::request_failed(&current, e))?;

            return Ok(FetchedResource::new(bytes, content_type)
                .with_status(status)
                .with_final_url(current));
        }

        Err(Self::request_failed(url, "too many redirects"))
    }

    /// Fetch from a file:// URL
    fn fetch_file(&self, url: &str) -> Result<FetchedResource> {
        let path = Url::parse(url)
            .ok()
            .and_then(|u| u.to_file_path().ok())
            .unwrap_or_else(|| url.strip_prefix("file://").unwrap_or(url).into());
        let bytes = std::fs::read(&path).map_err(|e| Self::request_failed(url, e))?;
        if bytes.len() > self.max_size {
            return Err(Self::request_failed(url, "file exceeds maximum size"));
        }

        let content_type = guess_content_type_from_path(&path);
        Ok(FetchedResource::new(bytes, content_type).with_final_url(url))
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_size: DEFAULT_MAX_SIZE,
        }
    }
}

impl ResourceFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<FetchedResource> {
        let scheme_is = |scheme: &str| {
            url.get(..scheme.len())
                .map(|s| s.eq_ignore_ascii_case(scheme))
                .unwrap_or(false)
        };
        if scheme_is("data:") {
            data_url::decode_data_url(url)
        } else if scheme_is("file:") {
            self.fetch_file(url)
        } else if scheme_is("http://") || scheme_is("https://") {
            self.fetch_http(url)
        } else {
            // Treat as local file path
            self.fetch_file(&format!("file://{}", url))
        }
    }
}

// ============================================================================
// Helper functions
// ============================================================================

/// Guess content-type from file path extension
pub fn guess_content_type_from_path(path: impl AsRef<Path>) -> Option<String> {
    let ext = path
        .as_ref()
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())?;

    let mime = match ext.as_str() {
        "html" | "htm" => "text/html",
        "js" | "mjs" => "application/javascript",
        "json" => "application/json",
        "css" => "text/css",
        "svg" => "image/svg+xml",
        "txt" => "text/plain",
        _ => return None,
    };

    Some(mime.to_string())
}

// ============================================================================
// Tests
// ============================================================================
