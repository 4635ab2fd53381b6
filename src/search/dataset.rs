//! Static destination dataset
//!
//! ```json
//! {
//!   "countries": [{ "name": "Japan", "description": "...", "categories": ["culture"] }],
//!   "temples": [],
//!   "beaches": [{ "name": "Copacabana", "imageUrl": "images/copacabana.jpg" }]
//! }
//! ```

use crate::error::{Error, FetchError, Result, SearchError};
use crate::resource::ResourceFetcher;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Destination {
  pub name: String,
  #[serde(default)]
  pub description: Option<String>,
  #[serde(default)]
  pub categories: Vec<String>,
  #[serde(default)]
  pub image_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Dataset {
  #[serde(default)]
  pub countries: Vec<Destination>,
  #[serde(default)]
  pub temples: Vec<Destination>,
  #[serde(default)]
  pub beaches: Vec<Destination>,
}

impl Dataset {
  /// Decode a dataset. `source_url` only labels errors.
  pub fn from_json(bytes: &[u8], source_url: &str) -> Result<Self> {
    serde_json::from_slice(bytes).map_err(|source| {
      Error::Search(SearchError::InvalidDataset {
        source_url: source_url.to_string(),
        source,
      })
    })
  }

  /// Fetch and decode the dataset at `url` with a single request.
  pub fn load(fetcher: &dyn ResourceFetcher, url: &str) -> Result<Self> {
    let resource = fetcher.fetch(url)?;
    if let Some(status) = resource.status.filter(|_| !resource.is_ok()) {
      return Err(Error::Fetch(FetchError::BadStatus {
        url: url.to_string(),
        status,
      }));
    }
    let dataset = Self::from_json(&resource.bytes, url)?;
    tracing::debug!(%url, items = dataset.len(), "dataset loaded");
    Ok(dataset)
  }

  /// Countries, then temples, then beaches.
  pub fn items(&self) -> Vec<&Destination> {
    self
      .countries
      .iter()
      .chain(&self.temples)
      .chain(&self.beaches)
      .collect()
  }

  pub fn len(&self) -> usize {
    self.countries.len() + self.temples.len() + self.beaches.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}
