//! Matching extracted document types against requirement names.
//!
//! The backend classifier returns free-form labels such as `"passport"` or
//! `"bank statement (3 months)"`. Requirement names are curated by staff,
//! e.g. `"Passport"` or `"Bank Statement"`. Comparison is always on the
//! normalised form: trimmed and lowercased.

/// How a requirement name relates to an extracted type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchKind {
    /// Names are equal after normalisation.
    Exact,
    /// The requirement name appears inside the extracted type.
    Contained,
}

/// Normalise a document type label for comparison.
pub fn normalize_type(s: &str) -> String {
    s.trim().to_lowercase()
}

/// Single-upload rule: case-insensitive equality.
pub fn exact_match(extracted: &str, requirement_name: &str) -> bool {
    let name = normalize_type(requirement_name);
    !name.is_empty() && normalize_type(extracted) == name
}

/// Batch rule: the requirement name equals or is a substring of the extracted type.
///
/// Blank names never match anything.
pub fn classify(extracted: &str, requirement_name: &str) -> Option<MatchKind> {
    let name = normalize_type(requirement_name);
    if name.is_empty() {
        return None;
    }
    let extracted = normalize_type(extracted);
    if extracted == name {
        Some(MatchKind::Exact)
    } else if extracted.contains(&name) {
        Some(MatchKind::Contained)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_is_case_insensitive() {
        assert!(exact_match("passport", "Passport"));
        assert!(exact_match("  PASSPORT ", "passport"));
    }

    #[test]
    fn exact_rejects_substrings() {
        assert!(!exact_match("passport copy", "Passport"));
        assert!(!exact_match("pass", "Passport"));
    }

    #[test]
    fn blank_names_never_match() {
        assert!(!exact_match("", ""));
        assert_eq!(classify("passport", "   "), None);
    }

    #[test]
    fn classify_kinds() {
        assert_eq!(classify("Bank Statement", "bank statement"), Some(MatchKind::Exact));
        assert_eq!(
            classify("bank statement (3 months)", "Bank Statement"),
            Some(MatchKind::Contained)
        );
        assert_eq!(classify("statement", "Bank Statement"), None);
    }

    #[test]
    fn exact_orders_before_contained() {
        assert!(MatchKind::Exact < MatchKind::Contained);
    }
}
