//! Canonical DOI and arXiv id forms. Providers report DOIs as bare strings,
//! `doi:` prefixes or resolver URLs; everything is reduced to the bare
//! lowercase `10.x/...` form before it reaches the key normalizer.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{DiscoveryError, Result};

static ARXIV_NEW_FORMAT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{4}\.\d{4,5})(?:v\d+)?$").expect("valid regex"));

static ARXIV_OLD_FORMAT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([a-zA-Z\-]+(?:\.[A-Z]{2})?/\d{7})(?:v\d+)?$").expect("valid regex")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Doi {
    pub normalized: String,
}

impl Doi {
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();

        let lower = input.to_lowercase();
        let prefixes = [
            "https://doi.org/",
            "http://doi.org/",
            "https://dx.doi.org/",
            "http://dx.doi.org/",
            "doi:",
        ];
        let stripped = prefixes
            .iter()
            .find(|p| lower.starts_with(*p))
            .and_then(|p| input.get(p.len()..))
            .map(str::trim_start)
            .unwrap_or(input);

        // Must start with "10.", contain "/", and have a non-empty suffix
        if !stripped.starts_with("10.") {
            return Err(DiscoveryError::InvalidDoi(input.to_string()));
        }
        let slash_pos = stripped
            .find('/')
            .ok_or_else(|| DiscoveryError::InvalidDoi(input.to_string()))?;
        if stripped[slash_pos + 1..].is_empty() {
            return Err(DiscoveryError::InvalidDoi(input.to_string()));
        }

        Ok(Self {
            normalized: stripped.to_lowercase(),
        })
    }
}

/// Bare lowercase DOI, or `None` when the value isn't a DOI.
pub fn canonical_doi(raw: Option<&str>) -> Option<String> {
    raw.and_then(|value| Doi::parse(value).ok())
        .map(|doi| doi.normalized)
}

/// arXiv id without version suffix, from a bare id or an abs/pdf URL.
pub fn arxiv_base_id(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_end_matches(".pdf");
    ARXIV_NEW_FORMAT
        .captures(trimmed)
        .or_else(|| ARXIV_OLD_FORMAT.captures(trimmed))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// The DataCite DOI arXiv registers for every preprint.
pub fn arxiv_doi(base_id: &str) -> String {
    format!("10.48550/arxiv.{}", base_id.to_lowercase())
}
