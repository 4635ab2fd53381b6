//! Shared page fragments
//!
//! Loading a fragment is a pipeline over a single container element:
//!
//! ```text
//! resource path ──► variants ──► fetch ──► inject ──► links ──► scripts ──► callback
//! ```
//!
//! - [`variants`] turns a resource path into ordered path candidates
//! - [`fetch`] walks the candidates until one answers ok
//! - [`links`] flags the anchor that points at the current page
//! - [`scripts`] swaps inert injected `<script>` elements for executable clones
//! - [`loader`] runs the whole sequence with every post-injection step isolated

pub mod fetch;
pub mod links;
pub mod loader;
pub mod scripts;
pub mod variants;

pub use fetch::{AttemptLog, AttemptOutcome, FetchAttempt, FetchedFragment, FragmentFetcher};
pub use links::{ActiveLinkMarker, LinkScope, ACTIVE_CLASS};
pub use loader::{FragmentLoader, LoadReport, LoadStatus, Step, StepFailure, StepOutcome};
pub use scripts::{
  ExternalLoad, ExternalScript, FetchingScriptHost, InlineScript, ReactivationReport,
  RecordingScriptHost, ScriptDescriptor, ScriptEvent, ScriptHost, ScriptOutcome,
  ScriptReactivator,
};
pub use variants::{PathVariantResolver, DEFAULT_VARIANTS_LIMIT};

use crate::error::{Error, Result};
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Run caller-provided code, turning a panic into an error.
pub(crate) fn catch_panic<T>(f: impl FnOnce() -> Result<T>) -> Result<T> {
  catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|panic| Err(Error::Other(panic_to_string(panic))))
}

fn panic_to_string(panic: Box<dyn std::any::Any + Send + 'static>) -> String {
  panic
    .downcast_ref::<&str>()
    .map(|s| format!("panicked: {s}"))
    .or_else(|| panic.downcast_ref::<String>().map(|s| format!("panicked: {s}")))
    .unwrap_or_else(|| "panicked".to_string())
}
