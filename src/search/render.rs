//! Result card markup and placement

use super::scoring::Recommendation;
use crate::dom::{escape_html, DomNode};
use crate::error::{Error, Result, SearchError};

pub const RESULTS_ID: &str = "results";
pub const RESULTS_CLASS: &str = "search-results";
pub const STATIC_LIST_ID: &str = "cities-recommendation-list-static";
pub const PLACEHOLDER_IMAGE: &str = "images/placeholder.svg";
pub const NO_DESCRIPTION: &str = "Sem descrição disponível";

/// Cards rendered per search.
pub const MAX_CARDS: usize = 2;

pub const LOADING_HTML: &str = r#"
    <div class="loading-state">
      <div class="loading-spinner"></div>
      <p>Buscando os melhores destinos...</p>
    </div>"#;

pub const EMPTY_HTML: &str = r#"<p class="empty">Nenhum destino encontrado</p>"#;

pub const ERROR_HTML: &str = r#"
      <div class="error-state">
        <p>Erro ao buscar destinos. Tente novamente.</p>
      </div>"#;

/// Where the cards ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
  /// Replaced the content of the static recommendations list.
  Static,
  /// Appended as a new `div.cities-recommendation` in the results container.
  Appended,
  /// No results; the empty state is shown.
  Empty,
}

pub fn render_card(recommendation: &Recommendation<'_>) -> String {
  let destination = recommendation.destination;
  let image = destination
    .image_url
    .as_deref()
    .filter(|url| !url.is_empty())
    .unwrap_or(PLACEHOLDER_IMAGE);
  let description = destination
    .description
    .as_deref()
    .filter(|d| !d.is_empty())
    .unwrap_or(NO_DESCRIPTION);
  format!(
    r#"
      <div class="recommendation-card">
        <img src="{image}" alt="{name}" onerror="this.src='{placeholder}'">
        <div class="recommendation-card-content">
          <h3>{name}</h3>
          <p class="score">Match: {percent}%</p>
          <p>{description}</p>
        </div>
      </div>"#,
    image = escape_html(image),
    name = escape_html(&destination.name),
    placeholder = PLACEHOLDER_IMAGE,
    percent = recommendation.percent(),
    description = escape_html(description),
  )
}

/// Markup for the best [`MAX_CARDS`] recommendations.
pub fn render_cards(recommendations: &[Recommendation<'_>]) -> String {
  recommendations
    .iter()
    .take(MAX_CARDS)
    .map(render_card)
    .collect()
}

/// The element with id `id`, created as `div#id.search-results` at the end of `<main>` when
/// missing.
pub fn ensure_results_container<'d>(document: &'d mut DomNode, id: &str) -> Result<&'d mut DomNode> {
  if document.find_element_by_id(id).is_none() {
    let main = document
      .find_mut(&|node: &DomNode| node.is_tag("main"))
      .ok_or(Error::Search(SearchError::NoResultsContainer))?;
    main.children.push(DomNode::element(
      "div",
      vec![
        ("id".to_string(), id.to_string()),
        ("class".to_string(), RESULTS_CLASS.to_string()),
      ],
    ));
    tracing::debug!(container = id, "created results container");
  }
  document
    .find_element_by_id_mut(id)
    .ok_or(Error::Search(SearchError::NoResultsContainer))
}

/// Replace the results container content with fixed state markup.
pub fn show_state(document: &mut DomNode, results_id: &str, html: &str) -> Result<()> {
  ensure_results_container(document, results_id)?.set_inner_html(html)
}

/// Clear the results and place the cards for `recommendations`.
pub fn show_recommendations(
  document: &mut DomNode,
  results_id: &str,
  recommendations: &[Recommendation<'_>],
) -> Result<Placement> {
  let results = ensure_results_container(document, results_id)?;
  if recommendations.is_empty() {
    results.set_inner_html(EMPTY_HTML)?;
    return Ok(Placement::Empty);
  }
  results.children.clear();

  let cards = render_cards(recommendations);
  if let Some(list) = document.find_element_by_id_mut(STATIC_LIST_ID) {
    list.set_inner_html(&cards)?;
    return Ok(Placement::Static);
  }

  let mut section = DomNode::element(
    "div",
    vec![("class".to_string(), "cities-recommendation".to_string())],
  );
  section.set_inner_html(&cards)?;
  ensure_results_container(document, results_id)?
    .children
    .push(section);
  Ok(Placement::Appended)
}
