// 🏷️ Canonical Fee Heads - Slug normalization + fixed head vocabulary
// Collapses free-text component names ("Tution Fee ", "TUITION  FEE") to one stable slug

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// SLUG NORMALIZATION
// ============================================================================

/// Known misspellings seen in imported fee sheets, fixed word-by-word
/// before hyphenation so "Tution Fee" and "Tuition Fee" share one slug.
const SPELLING_FIXES: &[(&str, &str)] = &[
    ("tution", "tuition"),
    ("amenitys", "amenities"),
    ("amenity", "amenities"),
    ("libary", "library"),
    ("examinaton", "examination"),
    ("laboratry", "laboratory"),
    ("enrolment", "enrollment"),
];

/// Normalize a free-text component name to its canonical slug.
///
/// Lowercase, trim, collapse every run of non-alphanumeric characters to a
/// single hyphen, and apply the fixed misspelling corrections. The same raw
/// name always yields the same slug; an empty or punctuation-only name yields
/// an empty slug, which is never canonical.
pub fn normalize_to_slug(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    if lowered.is_empty() {
        return String::new();
    }

    let mut words: Vec<&str> = Vec::new();
    for word in lowered.split(|c: char| !c.is_alphanumeric()) {
        if word.is_empty() {
            continue;
        }
        let fixed = SPELLING_FIXES
            .iter()
            .find(|(wrong, _)| *wrong == word)
            .map(|(_, right)| *right)
            .unwrap_or(word);
        words.push(fixed);
    }

    words.join("-")
}

// ============================================================================
// CANONICAL SLUG TABLE
// ============================================================================

/// Immutable lookup table of recognized fee heads: slug → canonical display name.
///
/// This is explicit configuration handed to the freeze engine at construction
/// time, not process-wide state. Slugs not present here are program-specific
/// extra heads and are never frozen or deactivated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalSlugTable {
    display_by_slug: BTreeMap<String, String>,
}

/// The fee-head vocabulary used across all university-affiliated programs.
pub const DEFAULT_FEE_HEADS: &[&str] = &[
    "Tuition Fee",
    "Caution Money (Deposit)",
    "Gymkhana Cultural Activity Fee",
    "Library Fee",
    "Examination Fee",
    "Admission Fee",
    "Student Aid Fee",
    "University Sport Fee",
    "University Enrollment Fee",
    "Magazine Fee",
    "I Card Fee",
    "Laboratory Fee",
    "Campus Fund",
    "University Amenities Fee",
];

impl CanonicalSlugTable {
    /// Create an empty table
    pub fn new() -> Self {
        CanonicalSlugTable {
            display_by_slug: BTreeMap::new(),
        }
    }

    /// Create a table pre-loaded with the standard fee-head vocabulary
    pub fn with_defaults() -> Self {
        Self::from_display_names(DEFAULT_FEE_HEADS.iter().copied())
    }

    /// Build a table from canonical display names (slugs are derived)
    pub fn from_display_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut table = Self::new();
        for name in names {
            table.insert(name.into());
        }
        table
    }

    /// Register a canonical display name. Returns the derived slug.
    /// Names that normalize to an empty slug are rejected (empty is never canonical).
    pub fn insert(&mut self, display_name: String) -> Option<String> {
        let slug = normalize_to_slug(&display_name);
        if slug.is_empty() {
            return None;
        }
        self.display_by_slug
            .insert(slug.clone(), display_name.trim().to_string());
        Some(slug)
    }

    /// Check whether a slug is a recognized canonical head
    pub fn contains(&self, slug: &str) -> bool {
        self.display_by_slug.contains_key(slug)
    }

    /// Canonical display name for a slug, if recognized
    pub fn display_name(&self, slug: &str) -> Option<&str> {
        self.display_by_slug.get(slug).map(String::as_str)
    }

    /// All recognized slugs, in sorted order
    pub fn slugs(&self) -> impl Iterator<Item = &str> {
        self.display_by_slug.keys().map(String::as_str)
    }

    /// Display names for every recognized head, in slug order
    pub fn display_names(&self) -> impl Iterator<Item = &str> {
        self.display_by_slug.values().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.display_by_slug.len()
    }

    pub fn is_empty(&self) -> bool {
        self.display_by_slug.is_empty()
    }
}

impl Default for CanonicalSlugTable {
    fn default() -> Self {
        Self::with_defaults()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_equivalence_classes() {
        assert_eq!(normalize_to_slug("Tuition Fee"), "tuition-fee");
        assert_eq!(normalize_to_slug("TUITION   FEE"), "tuition-fee");
        assert_eq!(normalize_to_slug("Tution Fee "), "tuition-fee");
        assert_eq!(normalize_to_slug("  tuition_fee"), "tuition-fee");
    }

    #[test]
    fn test_slug_punctuation_collapse() {
        assert_eq!(
            normalize_to_slug("Caution Money (Deposit)"),
            "caution-money-deposit"
        );
        assert_eq!(normalize_to_slug("I Card Fee"), "i-card-fee");
        assert_eq!(
            normalize_to_slug("University Amenitys Fee"),
            "university-amenities-fee"
        );
    }

    #[test]
    fn test_slug_empty_input() {
        assert_eq!(normalize_to_slug(""), "");
        assert_eq!(normalize_to_slug("   "), "");
        assert_eq!(normalize_to_slug("()---"), "");
    }

    #[test]
    fn test_slug_determinism() {
        let raw = "  GYMKHANA  cultural (activity) FEE ";
        assert_eq!(normalize_to_slug(raw), normalize_to_slug(raw));
        assert_eq!(normalize_to_slug(raw), "gymkhana-cultural-activity-fee");
    }

    #[test]
    fn test_slug_stable_through_display_form() {
        // Slugging the canonical display name of any head yields the head's slug
        let table = CanonicalSlugTable::with_defaults();
        for slug in table.slugs() {
            let display = table.display_name(slug).unwrap();
            assert_eq!(normalize_to_slug(display), slug);
        }
    }

    #[test]
    fn test_default_vocabulary() {
        let table = CanonicalSlugTable::with_defaults();
        assert_eq!(table.len(), 14);
        assert!(table.contains("tuition-fee"));
        assert!(table.contains("library-fee"));
        assert!(table.contains("caution-money-deposit"));
        assert_eq!(table.display_name("tuition-fee"), Some("Tuition Fee"));
        assert!(!table.contains(""));
        assert!(!table.contains("hostel-fee"));
    }

    #[test]
    fn test_empty_display_name_rejected() {
        let mut table = CanonicalSlugTable::new();
        assert_eq!(table.insert("   ".to_string()), None);
        assert!(table.is_empty());
        assert_eq!(
            table.insert("Hostel Fee".to_string()),
            Some("hostel-fee".to_string())
        );
        assert_eq!(table.len(), 1);
    }
}
