use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use litradar_core::{CandidateArticle, SourceKind};
use serde_json::Value;

use super::{SourceAdapter, clean_text, strip_markup};
use crate::error::Result;
use crate::http::{RateLimitedClient, USER_AGENT};
use crate::identifiers::canonical_doi;

const BASE_URL: &str = "https://api.crossref.org";
const DATE_FIELDS: [&str; 4] = ["published", "published-online", "published-print", "issued"];

pub struct CrossRefSource {
    client: RateLimitedClient,
    base_url: String,
    polite_email: Option<String>,
}

impl CrossRefSource {
    pub fn new(polite_email: Option<String>, timeout: Duration) -> Result<Self> {
        Self::with_params(BASE_URL, Duration::from_millis(100), polite_email, timeout)
    }

    pub fn with_params(
        base_url: &str,
        min_interval: Duration,
        polite_email: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        // CrossRef routes requests carrying a mailto to its polite pool.
        let user_agent = match &polite_email {
            Some(email) => format!("{USER_AGENT} (mailto:{email})"),
            None => USER_AGENT.to_string(),
        };
        Ok(Self {
            client: RateLimitedClient::with_timeout(min_interval, 2, &user_agent, timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            polite_email,
        })
    }
}

#[async_trait]
impl SourceAdapter for CrossRefSource {
    fn kind(&self) -> SourceKind {
        SourceKind::CrossRef
    }

    async fn fetch(
        &self,
        query: &str,
        from: NaiveDate,
        limit: u32,
    ) -> Result<Vec<CandidateArticle>> {
        let mut url = format!(
            "{}/works?query={}&filter={}&rows={}&sort=published&order=desc",
            self.base_url,
            urlencoding::encode(query),
            urlencoding::encode(&format!(
                "from-pub-date:{},type:journal-article",
                from.format("%Y-%m-%d")
            )),
            limit.clamp(1, 1000),
        );
        if let Some(email) = &self.polite_email {
            url.push_str(&format!("&mailto={}", urlencoding::encode(email)));
        }

        let val: Value = self.client.get_json(&url).await?;
        Ok(val
            .pointer("/message/items")
            .and_then(Value::as_array)
            .map(|items| items.iter().map(parse_item).collect())
            .unwrap_or_default())
    }
}

fn parse_item(item: &Value) -> CandidateArticle {
    let title = item
        .get("title")
        .and_then(|t| t.get(0))
        .and_then(Value::as_str)
        .map(clean_text)
        .unwrap_or_default();

    let mut article = CandidateArticle::new(title, SourceKind::CrossRef);
    article.doi = canonical_doi(item.get("DOI").and_then(Value::as_str));
    article.authors = parse_authors(item);
    article.abstract_text = item
        .get("abstract")
        .and_then(Value::as_str)
        .and_then(strip_markup);
    article.url = item
        .get("URL")
        .and_then(Value::as_str)
        .map(ToOwned::to_owned);

    let (year, date) = parse_published(item);
    article.year = year;
    article.published_date = date;
    article.refresh_keys();
    article
}

fn parse_authors(item: &Value) -> Vec<String> {
    item.get("author")
        .and_then(Value::as_array)
        .map(|arr| {
            arr.iter()
                .filter_map(|a| {
                    let given = a.get("given").and_then(Value::as_str).unwrap_or("");
                    let family = a.get("family").and_then(Value::as_str);
                    match family {
                        Some(family) => Some(clean_text(&format!("{given} {family}"))),
                        None => a.get("name").and_then(Value::as_str).map(clean_text),
                    }
                })
                .filter(|name| !name.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

/// First populated `date-parts` among the publication date fields. A full
/// `[y, m, d]` triple yields an exact date, anything shorter only a year.
fn parse_published(item: &Value) -> (Option<i32>, Option<NaiveDate>) {
    for field in DATE_FIELDS {
        let Some(parts) = item
            .get(field)
            .and_then(|d| d.pointer("/date-parts/0"))
            .and_then(Value::as_array)
        else {
            continue;
        };
        let nums: Vec<i64> = parts.iter().filter_map(Value::as_i64).collect();
        let Some(year) = nums.first().and_then(|y| i32::try_from(*y).ok()) else {
            continue;
        };
        let date = match nums.as_slice() {
            [_, m, d, ..] => NaiveDate::from_ymd_opt(year, *m as u32, *d as u32),
            _ => None,
        };
        return (Some(year), date);
    }
    (None, None)
}
