//! Title normalization for duplicate grouping
//!
//! Two titles that normalize to the same key are duplicates of each other
//! regardless of casing or spacing.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Normalize a pull request title into a grouping key.
///
/// Trims the title, collapses interior whitespace runs to a single space,
/// and lower-cases the result. Empty titles normalize to the empty string.
///
/// # Examples
///
/// ```
/// use prmaint_common::normalize::normalize_title;
///
/// assert_eq!(normalize_title("  Improve   search accuracy  "), "improve search accuracy");
/// assert_eq!(normalize_title("FIX\tNightly\nDeployment"), "fix nightly deployment");
/// assert_eq!(normalize_title(""), "");
/// ```
pub fn normalize_title(title: &str) -> String {
    title
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Normalize a title and additionally strip diacritical marks.
///
/// The title is decomposed (NFD) and combining marks are dropped before the
/// regular [`normalize_title`] pass, so `"Añadir"` and `"Anadir"` share a key.
///
/// ```
/// use prmaint_common::normalize::normalize_title_folded;
///
/// assert_eq!(normalize_title_folded("Añadir informe de costos"), "anadir informe de costos");
/// ```
pub fn normalize_title_folded(title: &str) -> String {
    let stripped: String = title.nfd().filter(|c| !is_combining_mark(*c)).collect();
    normalize_title(&stripped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trims_and_lowercases() {
        assert_eq!(normalize_title("  Free Legal Clinic  "), "free legal clinic");
    }

    #[test]
    fn test_collapses_interior_whitespace() {
        assert_eq!(
            normalize_title("Track  ABACO \t runtime\n\nexport directories"),
            "track abaco runtime export directories"
        );
    }

    #[test]
    fn test_empty_and_blank() {
        assert_eq!(normalize_title(""), "");
        assert_eq!(normalize_title("   \t "), "");
    }

    #[test]
    fn test_already_normalized() {
        assert_eq!(normalize_title("food distribution"), "food distribution");
    }

    #[test]
    fn test_plain_normalization_keeps_diacritics() {
        assert_eq!(normalize_title("Añadir"), "añadir");
    }

    #[test]
    fn test_folded_strips_diacritics() {
        assert_eq!(normalize_title_folded("  Café   Crème "), "cafe creme");
        assert_eq!(
            normalize_title_folded("Añadir informe de costos"),
            normalize_title_folded("ANADIR informe  de costos")
        );
    }
}
