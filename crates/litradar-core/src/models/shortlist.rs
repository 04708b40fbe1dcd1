use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::CandidateArticle;
use crate::keys::IdentityKeys;

/// A curated candidate. Carries every article field plus when it was added;
/// the identity keys are computed once at insertion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShortlistEntry {
    #[serde(flatten)]
    pub article: CandidateArticle,
    pub added_at: DateTime<Utc>,
}

impl ShortlistEntry {
    pub fn new(mut article: CandidateArticle, added_at: DateTime<Utc>) -> Self {
        article.refresh_keys();
        article.is_new = false;
        Self { article, added_at }
    }

    pub fn identity(&self) -> IdentityKeys {
        self.article.identity()
    }
}

/// The single shortlist document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShortlistAggregate {
    #[serde(default)]
    pub entries: Vec<ShortlistEntry>,
}

impl ShortlistAggregate {
    pub const COLLECTION: &'static str = "shortlist";
    pub const DOCUMENT_ID: &'static str = "shortlist";

    pub fn contains(&self, keys: &IdentityKeys) -> bool {
        self.entries.iter().any(|e| e.identity().overlaps(keys))
    }

    /// Drop entries matching either key. Returns how many were removed.
    pub fn retain_not_matching(&mut self, doi_key: &str, title_key: &str) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|e| !e.identity().matches(doi_key, title_key));
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
