pub mod api;
pub mod debug;
pub mod dom;
pub mod error;
pub mod fragment;
pub mod location;
pub mod resource;
pub mod search;

pub use api::{FragmentApi, FragmentApiBuilder};
pub use error::{Error, Result};
pub use location::PageLocation;
pub use resource::{FetchedResource, HttpFetcher, ResourceFetcher};

// Re-export the fragment pipeline types most callers need
pub use fragment::{
  LinkScope, LoadReport, LoadStatus, PathVariantResolver, ReactivationReport, ScriptHost,
  DEFAULT_VARIANTS_LIMIT,
};
