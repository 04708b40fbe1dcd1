//! Canonical identity keys shared by discovery, the shortlist and dismissals.
//!
//! Every identity comparison in litradar goes through [`normalize_key`]; raw
//! DOI or title strings are never compared directly.

use serde::{Deserialize, Serialize};

/// Trim and lowercase. Absent input yields an empty key.
pub fn normalize_key(value: Option<&str>) -> String {
    value.map(|v| v.trim().to_lowercase()).unwrap_or_default()
}

/// Percent-decode an identifier that may have travelled in a URL path, then
/// normalize it. Malformed escapes fall back to the raw text.
pub fn decode_identifier(raw: &str) -> String {
    let decoded = urlencoding::decode(raw)
        .map(|cow| cow.into_owned())
        .unwrap_or_else(|_| raw.to_string());
    normalize_key(Some(&decoded))
}

/// The normalized `(doi_key, title_key)` pair of an article-like record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdentityKeys {
    pub doi_key: String,
    pub title_key: String,
}

impl IdentityKeys {
    pub fn new(doi: Option<&str>, title: Option<&str>) -> Self {
        Self {
            doi_key: normalize_key(doi),
            title_key: normalize_key(title),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.doi_key.is_empty() && self.title_key.is_empty()
    }

    /// OR-match: equal non-empty DOI keys or equal non-empty title keys.
    pub fn overlaps(&self, other: &IdentityKeys) -> bool {
        self.matches(&other.doi_key, &other.title_key)
    }

    pub fn matches(&self, doi_key: &str, title_key: &str) -> bool {
        (!doi_key.is_empty() && self.doi_key == doi_key)
            || (!title_key.is_empty() && self.title_key == title_key)
    }

    /// True if either key equals `identifier`. Empty identifiers match nothing.
    pub fn matches_identifier(&self, identifier: &str) -> bool {
        !identifier.is_empty() && (self.doi_key == identifier || self.title_key == identifier)
    }
}

/// Anything carrying a DOI and a title can be keyed.
pub trait Keyed {
    fn doi(&self) -> Option<&str>;
    fn title(&self) -> Option<&str>;

    fn keys(&self) -> IdentityKeys {
        keys_of(self)
    }
}

pub fn keys_of<T: Keyed + ?Sized>(item: &T) -> IdentityKeys {
    IdentityKeys::new(item.doi(), item.title())
}

/// Treat whitespace-only strings as absent.
pub(crate) fn non_blank(value: &str) -> Option<&str> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_is_case_and_whitespace_insensitive() {
        assert_eq!(normalize_key(Some(" DOI/ABC ")), normalize_key(Some("doi/abc")));
        assert_eq!(normalize_key(Some(" DOI/ABC ")), "doi/abc");
    }

    #[test]
    fn normalize_is_idempotent() {
        let once = normalize_key(Some("  Generative AI\t"));
        assert_eq!(normalize_key(Some(&once)), once);
    }

    #[test]
    fn absent_value_is_empty_key() {
        assert_eq!(normalize_key(None), "");
    }

    #[test]
    fn decode_identifier_handles_url_encoding() {
        assert_eq!(decode_identifier("10.1000%2FABC"), "10.1000/abc");
        assert_eq!(
            decode_identifier("Creative%20Labor%20Now"),
            "creative labor now"
        );
        assert_eq!(decode_identifier("%E0%A4%A"), "%e0%a4%a");
    }

    #[test]
    fn empty_keys_never_overlap() {
        let a = IdentityKeys::new(None, Some("One Title"));
        let b = IdentityKeys::new(None, Some("Other Title"));
        assert!(!a.overlaps(&b));

        let c = IdentityKeys::new(Some("10.1/x"), Some("other title"));
        assert!(!a.overlaps(&c));
        assert!(a.overlaps(&IdentityKeys::new(Some("10.9/z"), Some("ONE TITLE "))));
    }

    #[test]
    fn empty_identifier_matches_nothing() {
        let keys = IdentityKeys::new(None, Some("Title"));
        assert!(!keys.matches_identifier(""));
        assert!(keys.matches_identifier("title"));
    }
}
