use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use litradar_core::{CandidateArticle, SourceKind};
use quick_xml::de::from_str;
use serde::Deserialize;

use super::{SourceAdapter, clean_text, non_empty};
use crate::error::{DiscoveryError, Result};
use crate::http::{RateLimitedClient, USER_AGENT};
use crate::identifiers::{arxiv_base_id, arxiv_doi, canonical_doi};

const BASE_URL: &str = "https://export.arxiv.org/api/query";

/// arXiv asks clients to keep at least three seconds between calls.
const MIN_INTERVAL: Duration = Duration::from_secs(3);

#[derive(Debug, Deserialize)]
struct AtomFeed {
    #[serde(rename = "entry", default)]
    entries: Vec<AtomEntry>,
}

#[derive(Debug, Deserialize)]
struct AtomEntry {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    published: Option<String>,
    #[serde(rename = "author", default)]
    authors: Vec<AtomAuthor>,
    #[serde(rename = "arxiv:doi", alias = "doi")]
    doi: Option<String>,
    #[serde(rename = "link", default)]
    links: Vec<AtomLink>,
}

#[derive(Debug, Deserialize)]
struct AtomAuthor {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(rename = "@href")]
    href: Option<String>,
    #[serde(rename = "@rel")]
    rel: Option<String>,
}

pub struct ArxivSource {
    client: RateLimitedClient,
    base_url: String,
}

impl ArxivSource {
    pub fn new(timeout: Duration) -> Result<Self> {
        Self::with_params(BASE_URL, MIN_INTERVAL, timeout)
    }

    pub fn with_params(base_url: &str, min_interval: Duration, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: RateLimitedClient::with_timeout(min_interval, 2, USER_AGENT, timeout)?,
            base_url: base_url.to_string(),
        })
    }
}

#[async_trait]
impl SourceAdapter for ArxivSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Arxiv
    }

    async fn fetch(
        &self,
        query: &str,
        from: NaiveDate,
        limit: u32,
    ) -> Result<Vec<CandidateArticle>> {
        let url = format!(
            "{}?search_query={}&start=0&max_results={}&sortBy=submittedDate&sortOrder=descending",
            self.base_url,
            urlencoding::encode(&search_query(query)),
            limit.clamp(1, 200),
        );
        let xml = self.client.get(&url).await?;
        let entries = parse_atom_response(&xml)?;

        // The API has no date filter that combines cleanly with free text,
        // so entries older than `from` are dropped here.
        Ok(entries
            .into_iter()
            .filter(|a| a.published_date.is_none_or(|d| d >= from))
            .collect())
    }
}

/// `all:` clause per term, joined with AND.
fn search_query(query: &str) -> String {
    query
        .split_whitespace()
        .map(|term| format!("all:{term}"))
        .collect::<Vec<_>>()
        .join(" AND ")
}

pub fn parse_atom_response(xml: &str) -> Result<Vec<CandidateArticle>> {
    let feed: AtomFeed =
        from_str(xml).map_err(|e| DiscoveryError::Parse(format!("invalid atom xml: {e}")))?;
    Ok(feed.entries.into_iter().filter_map(parse_entry).collect())
}

fn parse_entry(entry: AtomEntry) -> Option<CandidateArticle> {
    let id = entry.id.as_deref().unwrap_or_default();
    let Some(base_id) = arxiv_base_id(id) else {
        tracing::debug!(id, "skipping arXiv entry with unrecognised id");
        return None;
    };
    let Some(title) = non_empty(entry.title.as_deref()) else {
        tracing::debug!(id, "skipping arXiv entry without a title");
        return None;
    };

    let published = entry
        .published
        .as_deref()
        .and_then(|p| DateTime::parse_from_rfc3339(p.trim()).ok())
        .map(|dt| dt.date_naive());

    let abs_url = entry
        .links
        .iter()
        .find(|link| link.rel.as_deref() == Some("alternate"))
        .and_then(|link| link.href.clone())
        .unwrap_or_else(|| format!("https://arxiv.org/abs/{base_id}"));

    let mut article = CandidateArticle::new(title, SourceKind::Arxiv);
    // Entries without a journal DOI still carry arXiv's own DataCite DOI.
    article.doi = canonical_doi(entry.doi.as_deref()).or_else(|| Some(arxiv_doi(&base_id)));
    article.authors = entry
        .authors
        .into_iter()
        .map(|a| clean_text(&a.name))
        .filter(|name| !name.is_empty())
        .collect();
    article.abstract_text = non_empty(entry.summary.as_deref());
    article.published_date = published;
    article.url = Some(abs_url.replacen("http://", "https://", 1));
    article.refresh_keys();
    Some(article)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;
    use mockito::{Matcher, Server};

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom" xmlns:arxiv="http://arxiv.org/schemas/atom">
  <id>http://arxiv.org/api/query</id>
  <entry>
    <id>http://arxiv.org/abs/2405.01234v2</id>
    <published>2024-05-02T17:57:40Z</published>
    <title>
      Generative Design
      Assistants
    </title>
    <summary>  We study generative AI in design studios. </summary>
    <author><name>Ada Lovelace</name></author>
    <author><name>Alan Turing</name></author>
    <link rel="alternate" type="text/html" href="http://arxiv.org/abs/2405.01234v2" />
    <link title="pdf" rel="related" type="application/pdf" href="http://arxiv.org/pdf/2405.01234v2" />
  </entry>
  <entry>
    <id>http://arxiv.org/abs/2001.00001v1</id>
    <published>2020-01-01T00:00:00Z</published>
    <title>Old paper</title>
    <summary>Old.</summary>
    <arxiv:doi>10.1145/OLD.1</arxiv:doi>
    <author><name>Someone</name></author>
  </entry>
</feed>
"#;

    #[test]
    fn parses_entries_and_assigns_dois() {
        let items = parse_atom_response(FEED).unwrap();
        assert_eq!(items.len(), 2);

        let first = &items[0];
        assert_eq!(first.title, "Generative Design Assistants");
        assert_eq!(first.doi.as_deref(), Some("10.48550/arxiv.2405.01234"));
        assert_eq!(first.authors, vec!["Ada Lovelace", "Alan Turing"]);
        assert_eq!(
            first.abstract_text.as_deref(),
            Some("We study generative AI in design studios.")
        );
        assert_eq!(first.published_date.map(|d| d.month()), Some(5));
        assert_eq!(first.url.as_deref(), Some("https://arxiv.org/abs/2405.01234v2"));

        assert_eq!(items[1].doi.as_deref(), Some("10.1145/old.1"));
    }

    #[test]
    fn empty_feed_has_no_entries() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom"><id>x</id></feed>"#;
        assert!(parse_atom_response(xml).unwrap().is_empty());
    }

    #[test]
    fn incomplete_entries_do_not_sink_the_feed() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom">
  <entry>
    <id>http://arxiv.org/abs/2405.00001v1</id>
    <published>2024-05-01T00:00:00Z</published>
    <title>Creative labor and generative tools</title>
  </entry>
  <entry>
    <id>http://arxiv.org/abs/2405.00002v1</id>
    <published>2024-05-01T00:00:00Z</published>
    <summary>This entry lost its title.</summary>
  </entry>
  <entry>
    <id>http://arxiv.org/abs/2405.00003v1</id>
    <title>Undated design study</title>
  </entry>
</feed>"#;
        let items = parse_atom_response(xml).unwrap();
        let titles: Vec<_> = items.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(
            titles,
            vec!["Creative labor and generative tools", "Undated design study"]
        );
        assert!(items[1].published_date.is_none());
    }

    #[test]
    fn query_terms_become_all_clauses() {
        assert_eq!(search_query("generative  ai"), "all:generative AND all:ai");
    }

    #[tokio::test]
    async fn fetch_drops_entries_before_window() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/api/query")
            .match_query(Matcher::UrlEncoded(
                "search_query".into(),
                "all:generative AND all:design".into(),
            ))
            .with_status(200)
            .with_body(FEED)
            .create_async()
            .await;

        let source = ArxivSource::with_params(
            &format!("{}/api/query", server.url()),
            Duration::from_millis(0),
            Duration::from_secs(5),
        )
        .unwrap();
        let items = source
            .fetch("generative design", NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), 10)
            .await
            .unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].source, SourceKind::Arxiv);
    }
}
