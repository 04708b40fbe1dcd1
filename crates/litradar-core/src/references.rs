//! The read-only identity feed of everything already catalogued.

use std::path::{Path, PathBuf};

use crate::config::AppConfig;
use crate::error::{LitradarError, Result};
use crate::models::ExistingReference;

pub trait ReferenceFeed: Send + Sync {
    fn references(&self) -> Result<Vec<ExistingReference>>;
}

/// Reads a JSON array of `{title, doi, url}` objects exported by the catalogue.
/// Unknown fields are ignored.
pub struct JsonReferenceFeed {
    path: PathBuf,
}

impl JsonReferenceFeed {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        config
            .reference_feed_path()
            .map(Self::new)
            .ok_or_else(|| {
                LitradarError::NotConfigured(
                    "references.feed_path is not set; the catalogue identity feed is required"
                        .to_string(),
                )
            })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ReferenceFeed for JsonReferenceFeed {
    fn references(&self) -> Result<Vec<ExistingReference>> {
        if !self.path.exists() {
            return Err(LitradarError::NotConfigured(format!(
                "reference feed not found at {}",
                self.path.display()
            )));
        }
        let contents = std::fs::read_to_string(&self.path)?;
        let refs: Vec<ExistingReference> = serde_json::from_str(&contents)?;
        tracing::debug!(count = refs.len(), path = %self.path.display(), "loaded reference feed");
        Ok(refs)
    }
}

/// A fixed list, for tests and embedding callers that already hold the
/// catalogue in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticReferenceFeed {
    refs: Vec<ExistingReference>,
}

impl StaticReferenceFeed {
    pub fn new(refs: Vec<ExistingReference>) -> Self {
        Self { refs }
    }
}

impl ReferenceFeed for StaticReferenceFeed {
    fn references(&self) -> Result<Vec<ExistingReference>> {
        Ok(self.refs.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn unset_feed_is_not_configured() {
        let cfg = AppConfig::default();
        assert!(matches!(
            JsonReferenceFeed::from_config(&cfg),
            Err(LitradarError::NotConfigured(_))
        ));
    }

    #[test]
    fn reads_catalogue_export_ignoring_extra_fields() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("refs.json");
        std::fs::write(
            &path,
            r#"[{"title": "Known Paper", "doi": "10.1/a", "notes": "x"}, {"url": "https://e.org"}]"#,
        )
        .unwrap();

        let refs = JsonReferenceFeed::new(&path).references().unwrap();
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].doi.as_deref(), Some("10.1/a"));
        assert_eq!(refs[1].title, None);
    }

    #[test]
    fn missing_file_is_not_configured() {
        let feed = JsonReferenceFeed::new("/tmp/litradar-missing-feed.json");
        assert!(matches!(
            feed.references(),
            Err(LitradarError::NotConfigured(_))
        ));
    }
}
