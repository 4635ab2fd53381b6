use crate::fragment::variants::DEFAULT_VARIANTS_LIMIT;
use crate::resource::DEFAULT_TIMEOUT;
use crate::search::DEFAULT_THRESHOLD;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::OnceLock;
use std::sync::PoisonError;
use std::sync::RwLock;
use std::time::Duration;

/// Prefix shared by every toggle.
pub const ENV_PREFIX: &str = "FRAGLOAD_";

/// Cap on climb/root path candidates.
pub const VARIANTS_LIMIT: &str = "FRAGLOAD_VARIANTS_LIMIT";
/// Per-request timeout of the HTTP fetcher, in milliseconds.
pub const FETCH_TIMEOUT_MS: &str = "FRAGLOAD_FETCH_TIMEOUT_MS";
/// User-Agent sent by the HTTP fetcher.
pub const USER_AGENT: &str = "FRAGLOAD_USER_AGENT";
/// Maximum fuzzy match score accepted by the search widget.
pub const SEARCH_THRESHOLD: &str = "FRAGLOAD_SEARCH_THRESHOLD";

/// Parsed runtime configuration toggles sourced from `FRAGLOAD_*` environment variables.
///
/// Values are captured once (via [`RuntimeToggles::from_env`]) and then reused. Callers can also
/// construct instances manually to override environment-derived behavior when embedding the
/// library; explicit builder settings always win over toggles.
#[derive(Debug, Clone, Default)]
pub struct RuntimeToggles {
  raw: HashMap<String, String>,
}

impl RuntimeToggles {
  /// Parse all `FRAGLOAD_*` environment variables into a toggle map.
  pub fn from_env() -> Self {
    let raw = std::env::vars()
      .filter(|(k, _)| k.starts_with(ENV_PREFIX))
      .collect::<HashMap<_, _>>();
    Self { raw }
  }

  /// Construct a toggle set from a provided map of key/value pairs.
  pub fn from_map(raw: HashMap<String, String>) -> Self {
    Self { raw }
  }

  /// Returns the raw string value for a toggle, if set.
  pub fn get(&self, key: &str) -> Option<&str> {
    self.raw.get(key).map(String::as_str)
  }

  /// Parse a toggle as `usize`, returning `None` when unset or unparseable.
  pub fn usize(&self, key: &str) -> Option<usize> {
    self.get(key).and_then(|v| v.trim().parse::<usize>().ok())
  }

  /// Parse a toggle as `u64`, returning `None` when unset or unparseable.
  pub fn u64(&self, key: &str) -> Option<u64> {
    self.get(key).and_then(|v| v.trim().parse::<u64>().ok())
  }

  /// Parse a toggle as `f64`, returning `None` when unset, unparseable or not finite.
  pub fn f64(&self, key: &str) -> Option<f64> {
    self
      .get(key)
      .and_then(|v| v.trim().parse::<f64>().ok())
      .filter(|v| v.is_finite())
  }

  pub fn variants_limit(&self) -> usize {
    self.usize(VARIANTS_LIMIT).unwrap_or(DEFAULT_VARIANTS_LIMIT)
  }

  /// Zero is treated as unset.
  pub fn fetch_timeout(&self) -> Duration {
    self
      .u64(FETCH_TIMEOUT_MS)
      .filter(|ms| *ms > 0)
      .map(Duration::from_millis)
      .unwrap_or(DEFAULT_TIMEOUT)
  }

  pub fn user_agent(&self) -> Option<&str> {
    self.get(USER_AGENT).map(str::trim).filter(|ua| !ua.is_empty())
  }

  /// Clamped to `0.0..=1.0`.
  pub fn search_threshold(&self) -> f64 {
    self
      .f64(SEARCH_THRESHOLD)
      .map(|t| t.clamp(0.0, 1.0))
      .unwrap_or(DEFAULT_THRESHOLD)
  }
}

static DEFAULT_TOGGLES: OnceLock<Arc<RuntimeToggles>> = OnceLock::new();
static ACTIVE_TOGGLES: OnceLock<RwLock<Arc<RuntimeToggles>>> = OnceLock::new();

/// Returns the currently active runtime toggles.
///
/// Defaults to `RuntimeToggles::from_env()` if no overrides are installed.
pub fn runtime_toggles() -> Arc<RuntimeToggles> {
  ACTIVE_TOGGLES
    .get_or_init(|| RwLock::new(default_toggles()))
    .read()
    .unwrap_or_else(PoisonError::into_inner)
    .clone()
}

fn default_toggles() -> Arc<RuntimeToggles> {
  DEFAULT_TOGGLES
    .get_or_init(|| Arc::new(RuntimeToggles::from_env()))
    .clone()
}

/// Guard that restores the previous active toggles when dropped.
pub struct RuntimeTogglesGuard {
  previous: Arc<RuntimeToggles>,
}

impl Drop for RuntimeTogglesGuard {
  fn drop(&mut self) {
    if let Some(lock) = ACTIVE_TOGGLES.get() {
      let mut guard = lock.write().unwrap_or_else(PoisonError::into_inner);
      *guard = self.previous.clone();
    }
  }
}

/// Install the provided toggles as the active set for the duration of the returned guard.
pub fn set_runtime_toggles(toggles: Arc<RuntimeToggles>) -> RuntimeTogglesGuard {
  let lock = ACTIVE_TOGGLES.get_or_init(|| RwLock::new(default_toggles()));
  let mut guard = lock.write().unwrap_or_else(PoisonError::into_inner);
  let previous = std::mem::replace(&mut *guard, toggles);
  RuntimeTogglesGuard { previous }
}

/// Convenience helper to run a closure with a temporary toggles override.
pub fn with_runtime_toggles<T>(toggles: Arc<RuntimeToggles>, f: impl FnOnce() -> T) -> T {
  let guard = set_runtime_toggles(toggles);
  let result = f();
  drop(guard);
  result
}
