use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use litradar_core::{CandidateArticle, SourceKind};
use reqwest::Url;
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::Value;

use super::{SourceAdapter, clean_text, non_empty, parse_iso_date};
use crate::error::{DiscoveryError, Result};
use crate::http::{RateLimitedClient, USER_AGENT};
use crate::identifiers::{arxiv_base_id, arxiv_doi, canonical_doi};

const BASE_URL: &str = "https://api.semanticscholar.org/graph/v1";
const API_KEY_HEADER: &str = "x-api-key";
const SEARCH_FIELDS: &str = "title,abstract,year,authors,externalIds,url,publicationDate";

/// Works without a key on the shared public rate limit; a key only raises it.
pub struct SemanticScholarSource {
    client: RateLimitedClient,
    base_url: String,
    api_key: Option<String>,
}

impl SemanticScholarSource {
    pub fn new(api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let min_interval = if api_key.is_some() {
            Duration::from_millis(100)
        } else {
            Duration::from_secs(1)
        };
        Self::with_params(BASE_URL, min_interval, api_key, timeout)
    }

    pub fn with_params(
        base_url: &str,
        min_interval: Duration,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            client: RateLimitedClient::with_timeout(min_interval, 2, USER_AGENT, timeout)?,
            base_url: base_url.to_string(),
            api_key,
        })
    }

    fn auth_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        if let Some(key) = self
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            let value =
                HeaderValue::from_str(key).map_err(|e| DiscoveryError::Parse(e.to_string()))?;
            headers.insert(API_KEY_HEADER, value);
        }
        Ok(headers)
    }

    fn search_url(&self, query: &str, from: NaiveDate, limit: u32) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| DiscoveryError::Parse(format!("invalid URL {}: {e}", self.base_url)))?;
        url.path_segments_mut()
            .map_err(|_| DiscoveryError::Parse("invalid Semantic Scholar base URL".to_string()))?
            .pop_if_empty()
            .extend(["paper", "search"]);
        url.query_pairs_mut()
            .append_pair("query", query)
            .append_pair("limit", &limit.clamp(1, 100).to_string())
            .append_pair("fields", SEARCH_FIELDS)
            .append_pair(
                "publicationDateOrYear",
                &format!("{}:", from.format("%Y-%m-%d")),
            );
        Ok(url)
    }
}

#[async_trait]
impl SourceAdapter for SemanticScholarSource {
    fn kind(&self) -> SourceKind {
        SourceKind::SemanticScholar
    }

    async fn fetch(
        &self,
        query: &str,
        from: NaiveDate,
        limit: u32,
    ) -> Result<Vec<CandidateArticle>> {
        let url = self.search_url(query, from, limit)?;
        let val: Value = self
            .client
            .get_json_with_headers(url.as_str(), self.auth_headers()?)
            .await?;
        Ok(val
            .get("data")
            .and_then(Value::as_array)
            .map(|papers| papers.iter().map(parse_paper).collect())
            .unwrap_or_default())
    }
}

fn parse_paper(v: &Value) -> CandidateArticle {
    let title = v
        .get("title")
        .and_then(Value::as_str)
        .map(clean_text)
        .unwrap_or_default();

    let external = v.get("externalIds");
    let doi = canonical_doi(
        external
            .and_then(|ids| ids.get("DOI"))
            .and_then(Value::as_str),
    )
    .or_else(|| {
        external
            .and_then(|ids| ids.get("ArXiv"))
            .and_then(Value::as_str)
            .and_then(arxiv_base_id)
            .map(|id| arxiv_doi(&id))
    })
    .or_else(|| {
        v.get("paperId")
            .and_then(Value::as_str)
            .map(|id| format!("s2:{id}"))
    });

    let mut article = CandidateArticle::new(title, SourceKind::SemanticScholar);
    article.doi = doi;
    article.authors = v
        .get("authors")
        .and_then(Value::as_array)
        .map(|arr| {
            arr.iter()
                .filter_map(|a| a.get("name").and_then(Value::as_str))
                .map(ToOwned::to_owned)
                .collect()
        })
        .unwrap_or_default();
    article.abstract_text = non_empty(v.get("abstract").and_then(Value::as_str));
    article.year = v
        .get("year")
        .and_then(Value::as_i64)
        .and_then(|n| i32::try_from(n).ok());
    article.published_date = v
        .get("publicationDate")
        .and_then(Value::as_str)
        .and_then(parse_iso_date);
    article.url = v.get("url").and_then(Value::as_str).map(ToOwned::to_owned);
    article.refresh_keys();
    article
}
