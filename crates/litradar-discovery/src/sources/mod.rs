//! Upstream bibliographic providers. Each adapter turns its provider's record
//! shape into [`CandidateArticle`] so nothing downstream looks at provenance
//! beyond the `source` tag.

pub mod arxiv;
pub mod core_ac;
pub mod crossref;
pub mod openalex;
pub mod semantic_scholar;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use litradar_core::{CandidateArticle, SourceKind, SourcesConfig};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::Result;

pub use arxiv::ArxivSource;
pub use core_ac::CoreSource;
pub use crossref::CrossRefSource;
pub use openalex::OpenAlexSource;
pub use semantic_scholar::SemanticScholarSource;

static MARKUP_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<[^>]+>").expect("valid regex"));

#[async_trait]
pub trait SourceAdapter: Send + Sync {
    fn kind(&self) -> SourceKind;

    /// Optional providers that lack credentials report `false` and are
    /// skipped by the engine instead of being called.
    fn is_configured(&self) -> bool {
        true
    }

    /// Works matching `query` published on or after `from`, at most `limit`.
    async fn fetch(
        &self,
        query: &str,
        from: NaiveDate,
        limit: u32,
    ) -> Result<Vec<CandidateArticle>>;
}

/// Build the adapters named in `config.enabled`, in that order. Unknown names
/// are ignored with a warning.
pub fn build_adapters(config: &SourcesConfig) -> Result<Vec<Arc<dyn SourceAdapter>>> {
    let timeout = Duration::from_secs(config.request_timeout_secs.max(1));
    let mut adapters: Vec<Arc<dyn SourceAdapter>> = Vec::new();

    for name in &config.enabled {
        let Some(kind) = SourceKind::parse(name) else {
            tracing::warn!(source = %name, "unknown source in config, ignoring");
            continue;
        };
        let adapter: Arc<dyn SourceAdapter> = match kind {
            SourceKind::OpenAlex => Arc::new(OpenAlexSource::new(
                config.polite_pool_email.clone(),
                timeout,
            )?),
            SourceKind::CrossRef => Arc::new(CrossRefSource::new(
                config.polite_pool_email.clone(),
                timeout,
            )?),
            SourceKind::SemanticScholar => Arc::new(SemanticScholarSource::new(
                config.semantic_scholar_api_key.clone(),
                timeout,
            )?),
            SourceKind::Arxiv => Arc::new(ArxivSource::new(timeout)?),
            SourceKind::Core => Arc::new(CoreSource::new(config.core_api_key.clone(), timeout)?),
            SourceKind::Manual => {
                tracing::warn!("\"manual\" is not a discovery source, ignoring");
                continue;
            }
        };
        adapters.push(adapter);
    }

    Ok(adapters)
}

/// Collapse runs of whitespace.
pub(crate) fn clean_text(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Strip XML/HTML tags (CrossRef abstracts arrive as JATS) and collapse
/// whitespace. Empty results become `None`.
pub(crate) fn strip_markup(input: &str) -> Option<String> {
    let text = clean_text(&MARKUP_RE.replace_all(input, " "));
    if text.is_empty() { None } else { Some(text) }
}

/// Leading `YYYY-MM-DD` of an ISO date or datetime.
pub(crate) fn parse_iso_date(value: &str) -> Option<NaiveDate> {
    let head = value.trim().get(..10)?;
    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}

pub(crate) fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(clean_text)
        .filter(|v| !v.is_empty())
}
