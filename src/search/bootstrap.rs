//! Shared header bootstrap

use super::{HEADER_CONTAINER_ID, HEADER_FRAGMENT, SEARCH_INPUT_ID};
use crate::api::FragmentApi;
use crate::dom::DomNode;
use crate::error::{Error, FetchError, Result};
use crate::location::PageLocation;
use crate::resource::ResourceFetcher;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaderSource {
  /// Loaded through [`FragmentApi::load_fragment`] with full path resolution.
  Api,
  /// Fetched from the single page-relative URL.
  DirectFetch,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeaderBootstrap {
  pub source: HeaderSource,
  pub injected: bool,
  /// `#Research` exists after injection.
  pub search_input_found: bool,
  pub error: Option<String>,
}

/// Load `fragments/header.html` into the page header.
///
/// With an API the header goes into `#shared-header` through the fragment loader. Without one it
/// is fetched directly and injected into the first `<header>` (or `#shared-header`), creating
/// `header#shared-header` at the top of `<body>` when neither exists.
pub fn bootstrap_header(
  document: &mut DomNode,
  location: &PageLocation,
  api: Option<&FragmentApi>,
  fetcher: &dyn ResourceFetcher,
) -> HeaderBootstrap {
  let (source, result) = match api {
    Some(api) => {
      tracing::debug!("loading header through the fragment api");
      let report = api.load_fragment(document, HEADER_FRAGMENT, HEADER_CONTAINER_ID, None);
      let result = if report.is_injected() {
        Ok(())
      } else {
        Err(Error::Other(
          report
            .error
            .unwrap_or_else(|| "header fragment was not injected".to_string()),
        ))
      };
      (HeaderSource::Api, result)
    }
    None => {
      tracing::debug!("fetching header directly");
      (
        HeaderSource::DirectFetch,
        inject_direct(document, location, fetcher),
      )
    }
  };

  let search_input_found = document.find_element_by_id(SEARCH_INPUT_ID).is_some();
  match &result {
    Ok(()) if !search_input_found => {
      tracing::warn!(input = SEARCH_INPUT_ID, "search input not found in injected header")
    }
    Ok(()) => tracing::debug!(?source, "header injected"),
    Err(err) => tracing::error!(?source, error = %err, "failed to load header"),
  }

  HeaderBootstrap {
    source,
    injected: result.is_ok(),
    search_input_found,
    error: result.err().map(|err| err.to_string()),
  }
}

fn inject_direct(
  document: &mut DomNode,
  location: &PageLocation,
  fetcher: &dyn ResourceFetcher,
) -> Result<()> {
  let url = location
    .resolve(HEADER_FRAGMENT)
    .unwrap_or_else(|_| HEADER_FRAGMENT.to_string());
  let resource = fetcher.fetch(&url)?;
  if !resource.is_ok() {
    return Err(Error::Fetch(FetchError::BadStatus {
      url,
      status: resource.status.unwrap_or_default(),
    }));
  }
  let html = resource.text();

  let is_header = |node: &DomNode| node.is_tag("header");
  if document.find(&is_header).is_none()
    && document.find_element_by_id(HEADER_CONTAINER_ID).is_none()
  {
    let body = document
      .find_mut(&|node: &DomNode| node.is_tag("body"))
      .ok_or_else(|| Error::Other("document has no body".to_string()))?;
    body.children.insert(
      0,
      DomNode::element("header", vec![("id".to_string(), HEADER_CONTAINER_ID.to_string())]),
    );
  }

  let target = if document.find(&is_header).is_some() {
    document.find_mut(&is_header)
  } else {
    document.find_element_by_id_mut(HEADER_CONTAINER_ID)
  };
  target
    .ok_or_else(|| Error::Other("header container disappeared".to_string()))?
    .set_inner_html(&html)
}
