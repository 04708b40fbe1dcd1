use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{CandidateArticle, SourceKind};
use crate::keys::{IdentityKeys, Keyed};

const UNKNOWN_IDENTITY: &str = "unknown";

/// A permanently rejected work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DismissedRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default)]
    pub source: SourceKind,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    pub doi_key: String,
    pub title_key: String,
    pub date_dismissed: DateTime<Utc>,
}

impl DismissedRecord {
    pub const COLLECTION: &'static str = "dismissed";

    pub fn from_article(article: &CandidateArticle, date_dismissed: DateTime<Utc>) -> Self {
        let IdentityKeys { doi_key, title_key } = article.keys();
        Self {
            doi: article.doi.clone(),
            title: article.title.clone(),
            url: article.url.clone(),
            source: article.source,
            authors: article.authors.clone(),
            year: article.year,
            doi_key,
            title_key,
            date_dismissed,
        }
    }

    pub fn identity(&self) -> IdentityKeys {
        IdentityKeys {
            doi_key: self.doi_key.clone(),
            title_key: self.title_key.clone(),
        }
    }

    /// Storage key: a stable hash of the DOI key, else the title key, else
    /// `"unknown"`.
    pub fn record_id(keys: &IdentityKeys) -> String {
        let basis = if !keys.doi_key.is_empty() {
            keys.doi_key.as_str()
        } else if !keys.title_key.is_empty() {
            keys.title_key.as_str()
        } else {
            UNKNOWN_IDENTITY
        };
        Uuid::new_v5(&Uuid::NAMESPACE_URL, format!("litradar:dismissed:{basis}").as_bytes())
            .simple()
            .to_string()
    }

    pub fn id(&self) -> String {
        Self::record_id(&self.identity())
    }
}
