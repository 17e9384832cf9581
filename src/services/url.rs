// SPDX-License-Identifier: MIT

//! Canonical public-path derivation for cards.
//!
//! The resolved path is stored as a denormalized field on the card, so
//! every mutation of `is_primary` must call [`resolve`] and persist the
//! result in the same transaction. No other code writes the URL field.

/// Resolve the canonical public path for a card.
///
/// The primary card lives at the bare username path; secondary cards
/// get their slug appended.
pub fn resolve(username: &str, slug: &str, is_primary: bool) -> String {
    if is_primary {
        format!("/c/{}", username)
    } else {
        format!("/c/{}/{}", username, slug)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_path_omits_slug() {
        assert_eq!(resolve("ab12cd", "ab12cd", true), "/c/ab12cd");
    }

    #[test]
    fn test_secondary_path_includes_slug() {
        assert_eq!(resolve("ab12cd", "x7q", false), "/c/ab12cd/x7q");
    }

    #[test]
    fn test_demoted_original_card_keeps_its_slug() {
        // A demoted first card keeps its username-equal slug; only the
        // path changes.
        assert_eq!(resolve("ab12cd", "ab12cd", false), "/c/ab12cd/ab12cd");
    }
}
