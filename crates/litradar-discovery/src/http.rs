use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::header::{HeaderMap, RETRY_AFTER};
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tokio::time::sleep;

use crate::error::{DiscoveryError, Result};

pub const USER_AGENT: &str = "litradar/0.1";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

// ─── RateLimitedClient ────────────────────────────────────────────────────────

/// One client per upstream provider: spaces requests by `min_interval`,
/// honours `Retry-After` on 429 and retries transport errors with a short
/// exponential backoff.
pub struct RateLimitedClient {
    client: reqwest::Client,
    min_interval: Duration,
    last_request: Arc<Mutex<Option<Instant>>>,
    max_retries: u32,
}

impl RateLimitedClient {
    pub fn new(min_interval: Duration, max_retries: u32, user_agent: &str) -> Result<Self> {
        Self::with_timeout(min_interval, max_retries, user_agent, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(
        min_interval: Duration,
        max_retries: u32,
        user_agent: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .gzip(true)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            min_interval,
            last_request: Arc::new(Mutex::new(None)),
            max_retries,
        })
    }

    async fn wait_for_rate_limit(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(t) = *last {
            let elapsed = t.elapsed();
            if elapsed < self.min_interval {
                sleep(self.min_interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }

    pub async fn get(&self, url: &str) -> Result<String> {
        self.get_with_headers(url, HeaderMap::new()).await
    }

    pub async fn get_with_headers(&self, url: &str, headers: HeaderMap) -> Result<String> {
        let mut attempt = 0u32;
        loop {
            self.wait_for_rate_limit().await;
            let resp = self.client.get(url).headers(headers.clone()).send().await;
            match resp {
                Ok(r) if r.status() == 429 => {
                    let wait = r
                        .headers()
                        .get(RETRY_AFTER)
                        .and_then(|v| v.to_str().ok())
                        .and_then(|s| s.parse::<u64>().ok())
                        .unwrap_or(60);
                    if attempt >= self.max_retries {
                        return Err(DiscoveryError::RateLimit(host_of(url), wait));
                    }
                    tracing::debug!(url, wait, "rate limited, backing off");
                    sleep(Duration::from_secs(wait)).await;
                    attempt += 1;
                }
                Ok(r) if r.status().is_server_error() => {
                    return Err(DiscoveryError::SourceUnavailable(format!(
                        "{} answered HTTP {}",
                        host_of(url),
                        r.status().as_u16()
                    )));
                }
                Ok(r) if !r.status().is_success() => {
                    let status = r.status().as_u16();
                    let body = r.text().await.unwrap_or_default();
                    return Err(DiscoveryError::ApiError(
                        host_of(url),
                        format!("HTTP {status}: {}", truncate(&body, 200)),
                    ));
                }
                Ok(r) => return r.text().await.map_err(DiscoveryError::Http),
                Err(e) => {
                    if attempt >= self.max_retries {
                        return Err(DiscoveryError::Http(e));
                    }
                    let backoff = 2u64.pow(attempt);
                    sleep(Duration::from_secs(backoff)).await;
                    attempt += 1;
                }
            }
        }
    }

    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let text = self.get(url).await?;
        serde_json::from_str(&text).map_err(|e| DiscoveryError::Parse(e.to_string()))
    }

    pub async fn get_json_with_headers<T: DeserializeOwned>(
        &self,
        url: &str,
        headers: HeaderMap,
    ) -> Result<T> {
        let text = self.get_with_headers(url, headers).await?;
        serde_json::from_str(&text).map_err(|e| DiscoveryError::Parse(e.to_string()))
    }
}

fn host_of(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(ToOwned::to_owned))
        .unwrap_or_else(|| url.to_string())
}

fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    #[tokio::test]
    async fn client_error_status_is_api_error() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/works")
            .with_status(400)
            .with_body("bad filter")
            .create_async()
            .await;

        let client = RateLimitedClient::new(Duration::from_millis(0), 0, USER_AGENT).unwrap();
        let err = client
            .get(&format!("{}/works", server.url()))
            .await
            .unwrap_err();
        match err {
            DiscoveryError::ApiError(_, msg) => {
                assert!(msg.contains("400"));
                assert!(msg.contains("bad filter"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn server_error_status_is_source_unavailable() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/works")
            .with_status(503)
            .with_body("maintenance")
            .create_async()
            .await;

        let client = RateLimitedClient::new(Duration::from_millis(0), 0, USER_AGENT).unwrap();
        let err = client
            .get(&format!("{}/works", server.url()))
            .await
            .unwrap_err();
        match err {
            DiscoveryError::SourceUnavailable(msg) => assert!(msg.contains("503")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn rate_limit_without_retries_reports_wait() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/search")
            .with_status(429)
            .with_header("retry-after", "7")
            .create_async()
            .await;

        let client = RateLimitedClient::new(Duration::from_millis(0), 0, USER_AGENT).unwrap();
        let err = client
            .get(&format!("{}/search", server.url()))
            .await
            .unwrap_err();
        assert!(matches!(err, DiscoveryError::RateLimit(_, 7)));
    }

    #[tokio::test]
    async fn get_json_parses_body() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/ok")
            .with_status(200)
            .with_body(r#"{"n": 3}"#)
            .create_async()
            .await;

        let client = RateLimitedClient::new(Duration::from_millis(0), 0, USER_AGENT).unwrap();
        let v: serde_json::Value = client.get_json(&format!("{}/ok", server.url())).await.unwrap();
        assert_eq!(v["n"], 3);
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("héllo", 2), "hé");
        assert_eq!(truncate("hi", 10), "hi");
    }
}
