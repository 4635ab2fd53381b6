use clap::Args;
use fragload::debug::runtime::RuntimeToggles;
use fragload::resource::HttpFetcher;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Environment variable read for the log filter before `RUST_LOG`.
pub const LOG_ENV: &str = "FRAGLOAD_LOG";

#[derive(Debug, Clone, Args, Default)]
pub struct FetchArgs {
  /// Per-request timeout in milliseconds (overrides FRAGLOAD_FETCH_TIMEOUT_MS)
  #[arg(long = "timeout-ms")]
  pub timeout_ms: Option<u64>,

  /// User-Agent header for HTTP requests (overrides FRAGLOAD_USER_AGENT)
  #[arg(long = "user-agent")]
  pub user_agent: Option<String>,
}

impl FetchArgs {
  /// HTTP fetcher configured from these arguments, falling back to `toggles`.
  pub fn http_fetcher(&self, toggles: &RuntimeToggles) -> HttpFetcher {
    let timeout = self
      .timeout_ms
      .filter(|ms| *ms > 0)
      .map(Duration::from_millis)
      .unwrap_or_else(|| toggles.fetch_timeout());
    let user_agent = self
      .user_agent
      .as_deref()
      .or_else(|| toggles.user_agent());

    let fetcher = HttpFetcher::new().with_timeout(timeout);
    match user_agent {
      Some(user_agent) => fetcher.with_user_agent(user_agent),
      None => fetcher,
    }
  }
}

/// Install a stderr subscriber filtered by `FRAGLOAD_LOG`, then `RUST_LOG`, else `warn`.
pub fn init_logging() {
  let filter = EnvFilter::try_from_env(LOG_ENV)
    .or_else(|_| EnvFilter::try_from_default_env())
    .unwrap_or_else(|_| EnvFilter::new("warn"));
  let _ = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .try_init();
}
