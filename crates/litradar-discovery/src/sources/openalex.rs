use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use litradar_core::{CandidateArticle, SourceKind};
use reqwest::Url;
use serde_json::Value;

use super::{SourceAdapter, clean_text, non_empty, parse_iso_date};
use crate::error::{DiscoveryError, Result};
use crate::http::{RateLimitedClient, USER_AGENT};
use crate::identifiers::canonical_doi;

const BASE_URL: &str = "https://api.openalex.org";

pub struct OpenAlexSource {
    client: RateLimitedClient,
    base_url: String,
    polite_email: Option<String>,
}

impl OpenAlexSource {
    pub fn new(polite_email: Option<String>, timeout: Duration) -> Result<Self> {
        Self::with_params(BASE_URL, Duration::from_millis(100), polite_email, timeout)
    }

    pub fn with_params(
        base_url: &str,
        min_interval: Duration,
        polite_email: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            client: RateLimitedClient::with_timeout(min_interval, 2, USER_AGENT, timeout)?,
            base_url: base_url.to_string(),
            polite_email,
        })
    }

    fn search_url(&self, query: &str, from: NaiveDate, limit: u32) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| DiscoveryError::Parse(format!("invalid URL {}: {e}", self.base_url)))?;
        url.path_segments_mut()
            .map_err(|_| DiscoveryError::Parse("invalid OpenAlex base URL".to_string()))?
            .pop_if_empty()
            .push("works");
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("search", query)
                .append_pair(
                    "filter",
                    &format!("from_publication_date:{}", from.format("%Y-%m-%d")),
                )
                .append_pair("per-page", &limit.clamp(1, 200).to_string())
                .append_pair("sort", "publication_date:desc");
            if let Some(email) = &self.polite_email {
                pairs.append_pair("mailto", email);
            }
        }
        Ok(url)
    }
}

#[async_trait]
impl SourceAdapter for OpenAlexSource {
    fn kind(&self) -> SourceKind {
        SourceKind::OpenAlex
    }

    async fn fetch(
        &self,
        query: &str,
        from: NaiveDate,
        limit: u32,
    ) -> Result<Vec<CandidateArticle>> {
        let url = self.search_url(query, from, limit)?;
        let json: Value = self.client.get_json(url.as_str()).await?;
        Ok(json
            .get("results")
            .and_then(Value::as_array)
            .map(|results| results.iter().map(parse_work).collect())
            .unwrap_or_default())
    }
}

fn parse_work(v: &Value) -> CandidateArticle {
    let title = v
        .get("title")
        .or_else(|| v.get("display_name"))
        .and_then(Value::as_str)
        .map(clean_text)
        .unwrap_or_default();

    let id = v.get("id").and_then(Value::as_str);
    let doi_url = v.get("doi").and_then(Value::as_str);
    let doi = canonical_doi(doi_url).or_else(|| id.map(|id| format!("openalex:{}", short_id(id))));

    let authors = v
        .get("authorships")
        .and_then(Value::as_array)
        .map(|arr| {
            arr.iter()
                .filter_map(|a| a.pointer("/author/display_name").and_then(Value::as_str))
                .map(ToOwned::to_owned)
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    let url = v
        .pointer("/primary_location/landing_page_url")
        .and_then(Value::as_str)
        .or(doi_url)
        .or(id)
        .map(ToOwned::to_owned);

    let mut article = CandidateArticle::new(title, SourceKind::OpenAlex);
    article.doi = doi;
    article.authors = authors;
    article.year = v
        .get("publication_year")
        .and_then(Value::as_i64)
        .and_then(|n| i32::try_from(n).ok());
    article.published_date = v
        .get("publication_date")
        .and_then(Value::as_str)
        .and_then(parse_iso_date);
    article.abstract_text = v
        .get("abstract_inverted_index")
        .and_then(reconstruct_abstract);
    article.url = url;
    article.refresh_keys();
    article
}

fn short_id(id: &str) -> &str {
    id.rsplit('/').next().unwrap_or(id)
}

/// OpenAlex ships abstracts as `{word: [positions]}`.
fn reconstruct_abstract(index: &Value) -> Option<String> {
    let obj = index.as_object()?;
    let positions: HashMap<usize, &str> = obj
        .iter()
        .flat_map(|(word, pos)| {
            pos.as_array()
                .into_iter()
                .flatten()
                .filter_map(Value::as_u64)
                .map(move |p| (p as usize, word.as_str()))
        })
        .collect();
    let max = *positions.keys().max()?;

    let text = (0..=max)
        .filter_map(|i| positions.get(&i).copied())
        .collect::<Vec<_>>()
        .join(" ");
    non_empty(Some(&text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;

    #[test]
    fn reconstruct_abstract_from_inverted_index() {
        let index = json!({
            "attention": [0],
            "is": [1],
            "all": [2, 5],
            "you": [3],
            "need": [4]
        });
        assert_eq!(
            reconstruct_abstract(&index).as_deref(),
            Some("attention is all you need all")
        );
        assert_eq!(reconstruct_abstract(&json!({})), None);
    }

    #[test]
    fn work_without_doi_falls_back_to_openalex_id() {
        let work = json!({
            "id": "https://openalex.org/W42",
            "display_name": "Design  studios and AI",
            "publication_year": 2024
        });
        let article = parse_work(&work);
        assert_eq!(article.title, "Design studios and AI");
        assert_eq!(article.doi.as_deref(), Some("openalex:W42"));
        assert_eq!(article.doi_key, "openalex:w42");
        assert_eq!(article.url.as_deref(), Some("https://openalex.org/W42"));
    }

    #[tokio::test]
    async fn fetch_maps_results_to_candidates() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/works")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("search".into(), "generative ai".into()),
                Matcher::UrlEncoded("filter".into(), "from_publication_date:2024-01-01".into()),
                Matcher::UrlEncoded("per-page".into(), "5".into()),
            ]))
            .with_status(200)
            .with_body(
                json!({
                    "results": [{
                        "id": "https://openalex.org/W1",
                        "doi": "https://doi.org/10.1234/ABC",
                        "title": "Generative AI and creative labor",
                        "publication_year": 2024,
                        "publication_date": "2024-05-02",
                        "authorships": [
                            {"author": {"display_name": "Ada Lovelace"}},
                            {"author": {"display_name": "Alan Turing"}}
                        ],
                        "primary_location": {"landing_page_url": "https://example.org/w1"},
                        "abstract_inverted_index": {"creative": [1], "machine": [0]}
                    }]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let source = OpenAlexSource::with_params(
            &server.url(),
            Duration::from_millis(0),
            None,
            Duration::from_secs(5),
        )
        .unwrap();
        let from = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let items = source.fetch("generative ai", from, 5).await.unwrap();

        assert_eq!(items.len(), 1);
        let a = &items[0];
        assert_eq!(a.doi.as_deref(), Some("10.1234/abc"));
        assert_eq!(a.doi_key, "10.1234/abc");
        assert_eq!(a.authors, vec!["Ada Lovelace", "Alan Turing"]);
        assert_eq!(a.published_date, NaiveDate::from_ymd_opt(2024, 5, 2));
        assert_eq!(a.abstract_text.as_deref(), Some("machine creative"));
        assert_eq!(a.url.as_deref(), Some("https://example.org/w1"));
        assert_eq!(a.source, SourceKind::OpenAlex);
    }
}
