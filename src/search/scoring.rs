//! Fuzzy matching and ranking
//!
//! Matching looks at `name`, `description` and every category. Each field is compared to the
//! term as a whole, word by word and through every term-sized window, keeping the best
//! normalized Levenshtein similarity. A match score of 0 is perfect and 1 is no match at all.

use super::dataset::Destination;
use super::normalize::normalize_text;
use strsim::normalized_levenshtein;

const CATEGORY_WEIGHTS: &[(&str, f64)] = &[
  ("culture", 0.30),
  ("nature", 0.25),
  ("adventure", 0.20),
  ("relaxation", 0.15),
  ("gastronomy", 0.10),
];

#[derive(Debug, Clone, PartialEq)]
pub struct Recommendation<'a> {
  pub destination: &'a Destination,
  /// 0 is a perfect match.
  pub match_score: f64,
  /// Ranking score: match quality plus category weights.
  pub score: f64,
}

impl Recommendation<'_> {
  /// `score` as a rounded percentage.
  pub fn percent(&self) -> i64 {
    (self.score * 100.0).round() as i64
  }
}

/// `(1 - match_score)` plus the weight of every known category.
pub fn calculate_score(destination: &Destination, match_score: f64) -> f64 {
  destination
    .categories
    .iter()
    .filter_map(|category| {
      CATEGORY_WEIGHTS
        .iter()
        .find(|(name, _)| *name == category.as_str())
        .map(|(_, weight)| *weight)
    })
    .fold(1.0 - match_score, |acc, weight| acc + weight)
}

/// Best match score of `destination` for an already normalized term.
pub fn match_score(term: &str, destination: &Destination) -> f64 {
  let fields = std::iter::once(destination.name.as_str())
    .chain(destination.description.as_deref())
    .chain(destination.categories.iter().map(String::as_str));
  let best = fields
    .map(|field| similarity(term, &normalize_text(field)))
    .fold(0.0_f64, f64::max);
  1.0 - best
}

fn similarity(term: &str, field: &str) -> f64 {
  if term.is_empty() || field.is_empty() {
    return 0.0;
  }
  if field.contains(term) {
    return 1.0;
  }

  let mut best = normalized_levenshtein(term, field);
  for word in field.split_whitespace() {
    best = best.max(normalized_levenshtein(term, word));
  }

  let chars: Vec<char> = field.chars().collect();
  let width = term.chars().count();
  if chars.len() > width {
    for window in chars.windows(width) {
      let candidate: String = window.iter().collect();
      best = best.max(normalized_levenshtein(term, &candidate));
    }
  }
  best
}

/// Match `term` against `items`, drop matches worse than `threshold` and sort by descending
/// score. Ties keep dataset order.
pub fn rank<'a>(items: &[&'a Destination], term: &str, threshold: f64) -> Vec<Recommendation<'a>> {
  let term = normalize_text(term);
  let mut results: Vec<Recommendation<'a>> = items
    .iter()
    .copied()
    .filter_map(|destination| {
      let match_score = match_score(&term, destination);
      (match_score <= threshold).then(|| Recommendation {
        destination,
        match_score,
        score: calculate_score(destination, match_score),
      })
    })
    .collect();
  results.sort_by(|a, b| b.score.total_cmp(&a.score));
  tracing::debug!(term = %term, matches = results.len(), "ranked destinations");
  results
}

#[cfg(test)]
mod tests {
  use super::*;

  fn destination(name: &str, description: Option<&str>, categories: &[&str]) -> Destination {
    Destination {
      name: name.to_string(),
      description: description.map(str::to_string),
      categories: categories.iter().map(|c| c.to_string()).collect(),
      image_url: None,
    }
  }

  #[test]
  fn category_weights_are_added() {
    let d = destination("Kyoto", None, &["culture", "nature", "shopping"]);
    assert!((calculate_score(&d, 0.0) - 1.55).abs() < 1e-9);
    assert!((calculate_score(&d, 1.0) - 0.55).abs() < 1e-9);
  }

  #[test]
  fn exact_and_accented_matches_are_perfect() {
    let d = destination("São Paulo", None, &[]);
    assert_eq!(match_score("sao", &d), 0.0);
    assert_eq!(match_score(&normalize_text("SÃO PAULO"), &d), 0.0);
  }

  #[test]
  fn typos_still_match() {
    let d = destination("Kyoto", None, &[]);
    let score = match_score("kyotto", &d);
    assert!(score > 0.0 && score <= 0.4, "{score}");
  }

  #[test]
  fn unrelated_terms_are_dropped() {
    let japan = destination("Japan", Some("Island country"), &[]);
    assert!(rank(&[&japan], "zzz", 0.4).is_empty());
  }

  #[test]
  fn description_and_categories_are_searched() {
    let temple = destination("Angkor Wat", Some("Khmer temple complex"), &["culture"]);
    let beach = destination("Bora Bora", None, &["relaxation"]);
    let results = rank(&[&beach, &temple], "temple", 0.4);
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].destination.name, "Angkor Wat");

    let by_category = rank(&[&beach, &temple], "relax", 0.4);
    assert_eq!(by_category[0].destination.name, "Bora Bora");
  }

  #[test]
  fn ranking_prefers_weighted_categories() {
    let plain = destination("Rio Beach", None, &[]);
    let cultural = destination("Rio Museum", None, &["culture"]);
    let results = rank(&[&plain, &cultural], "rio", 0.4);
    assert_eq!(results[0].destination.name, "Rio Museum");
    assert_eq!(results[0].percent(), 130);
    assert_eq!(results[1].percent(), 100);
  }
}
