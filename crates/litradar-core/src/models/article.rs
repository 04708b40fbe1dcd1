use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::keys::{IdentityKeys, Keyed, non_blank};

/// Upstream provider a candidate was fetched from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    OpenAlex,
    CrossRef,
    SemanticScholar,
    Arxiv,
    Core,
    #[default]
    Manual,
}

impl SourceKind {
    pub const DISCOVERY_ORDER: [SourceKind; 5] = [
        SourceKind::OpenAlex,
        SourceKind::CrossRef,
        SourceKind::SemanticScholar,
        SourceKind::Arxiv,
        SourceKind::Core,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAlex => "openalex",
            Self::CrossRef => "crossref",
            Self::SemanticScholar => "semantic_scholar",
            Self::Arxiv => "arxiv",
            Self::Core => "core",
            Self::Manual => "manual",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "openalex" => Some(Self::OpenAlex),
            "crossref" => Some(Self::CrossRef),
            "semantic_scholar" | "semanticscholar" | "s2" => Some(Self::SemanticScholar),
            "arxiv" => Some(Self::Arxiv),
            "core" => Some(Self::Core),
            "manual" => Some(Self::Manual),
            _ => None,
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A freshly fetched article. Built by a source adapter, filtered, ranked and
/// returned within a single discovery call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateArticle {
    pub title: String,
    /// DOI, or the provider's stable id when the work has no DOI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(
        default,
        rename = "abstract",
        skip_serializing_if = "Option::is_none"
    )]
    pub abstract_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_date: Option<NaiveDate>,
    #[serde(default)]
    pub source: SourceKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub doi_key: String,
    #[serde(default)]
    pub title_key: String,
    #[serde(default)]
    pub is_new: bool,
}

impl CandidateArticle {
    pub fn new(title: impl Into<String>, source: SourceKind) -> Self {
        let mut article = Self {
            title: title.into(),
            source,
            ..Default::default()
        };
        article.refresh_keys();
        article
    }

    pub fn with_doi(mut self, doi: impl Into<String>) -> Self {
        self.doi = Some(doi.into());
        self.refresh_keys();
        self
    }

    pub fn with_abstract(mut self, text: impl Into<String>) -> Self {
        self.abstract_text = Some(text.into());
        self
    }

    pub fn with_published(mut self, date: NaiveDate) -> Self {
        self.year = Some(date.year());
        self.published_date = Some(date);
        self
    }

    pub fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    /// Recompute `doi_key`/`title_key` from the current DOI and title.
    pub fn refresh_keys(&mut self) {
        let IdentityKeys { doi_key, title_key } = self.keys();
        self.doi_key = doi_key;
        self.title_key = title_key;
    }

    pub fn identity(&self) -> IdentityKeys {
        IdentityKeys {
            doi_key: self.doi_key.clone(),
            title_key: self.title_key.clone(),
        }
    }

    /// Exact publication date, else January 1st of the reported year.
    pub fn best_date(&self) -> Option<NaiveDate> {
        self.published_date
            .or_else(|| self.year.and_then(|y| NaiveDate::from_ymd_opt(y, 1, 1)))
    }

    pub fn has_exact_date(&self) -> bool {
        self.published_date.is_some()
    }
}

impl Keyed for CandidateArticle {
    fn doi(&self) -> Option<&str> {
        self.doi.as_deref().and_then(non_blank)
    }

    fn title(&self) -> Option<&str> {
        non_blank(&self.title)
    }
}
