use std::time::Duration;

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use litradar_core::{CandidateArticle, SourceKind};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Deserialize;

use super::{SourceAdapter, clean_text, non_empty, parse_iso_date};
use crate::error::{DiscoveryError, Result};
use crate::http::{RateLimitedClient, USER_AGENT};
use crate::identifiers::canonical_doi;

const BASE_URL: &str = "https://api.core.ac.uk/v3";

#[derive(Debug, Deserialize)]
struct CoreSearchResponse {
    #[serde(default)]
    results: Vec<CoreWork>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CoreWork {
    id: Option<serde_json::Value>,
    title: Option<String>,
    doi: Option<String>,
    #[serde(default)]
    authors: Vec<CoreAuthor>,
    #[serde(rename = "abstract")]
    abstract_text: Option<String>,
    year_published: Option<i32>,
    published_date: Option<String>,
    download_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CoreAuthor {
    name: Option<String>,
}

/// CORE requires an API key. Without one the adapter reports itself as
/// unconfigured and the engine skips it.
pub struct CoreSource {
    client: RateLimitedClient,
    api_key: Option<String>,
    base_url: String,
}

impl CoreSource {
    pub fn new(api_key: Option<String>, timeout: Duration) -> Result<Self> {
        Self::with_params(BASE_URL, Duration::from_millis(500), api_key, timeout)
    }

    pub fn with_params(
        base_url: &str,
        min_interval: Duration,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            client: RateLimitedClient::with_timeout(min_interval, 2, USER_AGENT, timeout)?,
            api_key: api_key
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty()),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn auth_headers(&self) -> Result<HeaderMap> {
        let key = self
            .api_key
            .as_deref()
            .ok_or_else(|| DiscoveryError::NotConfigured("CORE API key".to_string()))?;
        let mut headers = HeaderMap::new();
        let value = HeaderValue::from_str(&format!("Bearer {key}"))
            .map_err(|e| DiscoveryError::Parse(e.to_string()))?;
        headers.insert(AUTHORIZATION, value);
        Ok(headers)
    }
}

#[async_trait]
impl SourceAdapter for CoreSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Core
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn fetch(
        &self,
        query: &str,
        from: NaiveDate,
        limit: u32,
    ) -> Result<Vec<CandidateArticle>> {
        let headers = self.auth_headers()?;
        let q = format!("({query}) AND yearPublished>={}", from.year());
        let url = format!(
            "{}/search/works?q={}&limit={}",
            self.base_url,
            urlencoding::encode(&q),
            limit.clamp(1, 100)
        );
        let response: CoreSearchResponse = self.client.get_json_with_headers(&url, headers).await?;
        Ok(response.results.into_iter().map(into_candidate).collect())
    }
}

fn into_candidate(work: CoreWork) -> CandidateArticle {
    let title = work.title.as_deref().map(clean_text).unwrap_or_default();
    let core_id = work.id.as_ref().and_then(|id| match id {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    });

    let mut article = CandidateArticle::new(title, SourceKind::Core);
    article.doi = canonical_doi(work.doi.as_deref())
        .or_else(|| core_id.as_ref().map(|id| format!("core:{id}")));
    article.authors = work
        .authors
        .into_iter()
        .filter_map(|a| non_empty(a.name.as_deref()))
        .collect();
    article.abstract_text = non_empty(work.abstract_text.as_deref());
    article.year = work.year_published;
    article.published_date = work.published_date.as_deref().and_then(parse_iso_date);
    article.url = work
        .download_url
        .filter(|u| !u.trim().is_empty())
        .or_else(|| core_id.map(|id| format!("https://core.ac.uk/works/{id}")));
    article.refresh_keys();
    article
}
