use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Root application configuration, loaded from `~/.config/litradar/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub storage: StorageConfig,
    pub references: ReferencesConfig,
    pub discovery: DiscoveryConfig,
    pub sources: SourcesConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: String,
    /// Retries for a compare-and-swap write before reporting a conflict.
    pub max_write_attempts: u32,
}

/// Where the catalogue's identity feed lives. Discovery refuses to run
/// without it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferencesConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feed_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueryConfig {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    pub queries: Vec<QueryConfig>,
    pub max_queries: usize,
    pub max_results_per_query: u32,
    pub max_candidates: usize,
    pub new_window_days: i64,
    pub lookback_months: u32,
    pub only_new_lookback_months: u32,
    pub max_concurrent_fetches: usize,
    /// Replaces the built-in relevance vocabulary when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    /// Adapters to query, in enumeration order.
    pub enabled: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub polite_pool_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub semantic_scholar_api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub core_api_key: Option<String>,
    pub request_timeout_secs: u64,
}

// ─── Defaults ──────────────────────────────────────────────

impl Default for StorageConfig {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("~/.local/share"))
            .join("litradar");
        Self {
            data_dir: data_dir.to_string_lossy().to_string(),
            max_write_attempts: 5,
        }
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        let query = |text: &str, category: &str| QueryConfig {
            text: text.to_string(),
            category: Some(category.to_string()),
        };
        Self {
            queries: vec![
                query("generative AI creativity", "AI & Creativity"),
                query("AI creative labor", "Creative Labor"),
                query("human-AI co-creation design", "HCI"),
                query("AI authorship copyright", "Authorship"),
                query("large language models creative writing", "AI & Creativity"),
            ],
            max_queries: 4,
            max_results_per_query: 10,
            max_candidates: 30,
            new_window_days: 90,
            lookback_months: 12,
            only_new_lookback_months: 6,
            max_concurrent_fetches: 4,
            keywords: None,
        }
    }
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            enabled: vec![
                "openalex".to_string(),
                "crossref".to_string(),
                "semantic_scholar".to_string(),
                "arxiv".to_string(),
                "core".to_string(),
            ],
            polite_pool_email: None,
            semantic_scholar_api_key: None,
            core_api_key: None,
            request_timeout_secs: 30,
        }
    }
}

// ─── Load / Save ───────────────────────────────────────────

impl AppConfig {
    /// Standard config file path: `~/.config/litradar/config.toml`
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("LITRADAR_CONFIG") {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("litradar")
            .join("config.toml")
    }

    /// Load config from disk, falling back to defaults if file doesn't exist.
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let toml_str = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_str)?;
        Ok(())
    }

    // ─── Derived paths ─────────────────────────────────────

    /// Path to the SQLite database file.
    pub fn database_path(&self) -> PathBuf {
        PathBuf::from(&self.storage.data_dir).join("litradar.db")
    }

    pub fn reference_feed_path(&self) -> Option<PathBuf> {
        self.references
            .feed_path
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_is_valid() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.discovery.max_candidates, 30);
        assert_eq!(cfg.discovery.new_window_days, 90);
        assert_eq!(cfg.discovery.only_new_lookback_months, 6);
        assert_eq!(cfg.sources.enabled.len(), 5);
        assert!(cfg.reference_feed_path().is_none());
    }

    #[test]
    fn test_config_toml_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        let mut cfg = AppConfig::default();
        cfg.references.feed_path = Some("/tmp/refs.json".to_string());
        cfg.sources.core_api_key = Some("secret".to_string());
        cfg.save_to(&path).unwrap();

        let loaded = AppConfig::load_from(&path).unwrap();
        assert_eq!(loaded.discovery.queries, cfg.discovery.queries);
        assert_eq!(loaded.sources.core_api_key.as_deref(), Some("secret"));
        assert_eq!(
            loaded.reference_feed_path(),
            Some(PathBuf::from("/tmp/refs.json"))
        );
    }

    #[test]
    fn test_partial_file_keeps_section_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[discovery]\nmax_queries = 2\n\n[references]\nfeed_path = \"refs.json\"\n",
        )
        .unwrap();

        let cfg = AppConfig::load_from(&path).unwrap();
        assert_eq!(cfg.discovery.max_queries, 2);
        assert_eq!(cfg.discovery.max_candidates, 30);
        assert_eq!(cfg.storage.max_write_attempts, 5);
    }

    #[test]
    fn test_custom_keywords_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[discovery]\nkeywords = [\"typography\", \"co-creation\"]\n",
        )
        .unwrap();

        let cfg = AppConfig::load_from(&path).unwrap();
        assert_eq!(
            cfg.discovery.keywords,
            Some(vec!["typography".to_string(), "co-creation".to_string()])
        );
        assert!(AppConfig::default().discovery.keywords.is_none());
    }

    #[test]
    fn test_load_nonexistent_returns_default() {
        let cfg = AppConfig::load_from(Path::new("/tmp/nonexistent_litradar_config.toml")).unwrap();
        assert_eq!(cfg.discovery.max_results_per_query, 10);
    }

    #[test]
    fn test_derived_paths() {
        let cfg = AppConfig::default();
        assert!(cfg.database_path().to_string_lossy().ends_with("litradar.db"));
    }
}
