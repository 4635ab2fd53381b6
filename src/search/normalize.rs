use unicode_normalization::UnicodeNormalization;

/// Lowercase, trim, decompose (NFD) and drop combining diacritical marks (U+0300..=U+036F).
///
/// ```
/// use fragload::search::normalize_text;
///
/// assert_eq!(normalize_text("  São Paulo "), "sao paulo");
/// ```
pub fn normalize_text(text: &str) -> String {
  text
    .to_lowercase()
    .trim()
    .nfd()
    .filter(|c| !('\u{0300}'..='\u{036f}').contains(c))
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn strips_accents_and_case() {
    assert_eq!(normalize_text("Kyoto"), "kyoto");
    assert_eq!(normalize_text("Jericoacoara Ceará"), "jericoacoara ceara");
    assert_eq!(normalize_text("MÜNCHEN"), "munchen");
  }

  #[test]
  fn empty_and_blank_inputs() {
    assert_eq!(normalize_text(""), "");
    assert_eq!(normalize_text("   "), "");
  }

  #[test]
  fn keeps_non_latin_marks_outside_the_combining_block() {
    // Katakana voiced mark decomposes to U+3099, which is kept.
    assert_eq!(normalize_text("ガ"), "カ\u{3099}");
  }
}
