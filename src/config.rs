use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const APP_DIR_NAME: &str = "altsource-catalog";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CatalogConfig {
    /// Base for short source references: `<base>/<ref>.json`
    #[serde(default = "default_repo_base_url")]
    pub repo_base_url: String,
    /// Used when the saved source list is missing or unusable
    #[serde(default = "default_source")]
    pub default_source: String,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_search_limit")]
    pub search_limit: usize,
    /// Per-request bound in seconds; unset means fetches wait indefinitely
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_repo_base_url() -> String {
    "https://repos.altsource.app".to_string()
}

fn default_source() -> String {
    "https://apps.altstore.io".to_string()
}

fn default_batch_size() -> usize {
    24
}

fn default_search_limit() -> usize {
    crate::search_index::DEFAULT_LIMIT
}

fn default_user_agent() -> String {
    format!("AltSourceCatalog/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            repo_base_url: default_repo_base_url(),
            default_source: default_source(),
            batch_size: default_batch_size(),
            search_limit: default_search_limit(),
            request_timeout_secs: None,
            user_agent: default_user_agent(),
        }
    }
}

pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
}

impl CatalogConfig {
    /// Reads `config.json` from the user config directory.
    pub fn load() -> Self {
        Self::load_from(&config_dir().join("config.json"))
    }

    /// Missing or unreadable files yield the defaults.
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        let parsed = std::fs::File::open(path)
            .map_err(|e| e.to_string())
            .and_then(|file| {
                serde_json::from_reader::<_, CatalogConfig>(std::io::BufReader::new(file))
                    .map_err(|e| e.to_string())
            });
        match parsed {
            Ok(mut config) => {
                config.batch_size = config.batch_size.max(1);
                config
            }
            Err(e) => {
                log::warn!("Ignoring unreadable config {}: {}", path.display(), e);
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = CatalogConfig::load_from(&dir.path().join("config.json"));
        assert_eq!(config, CatalogConfig::default());
        assert_eq!(config.search_limit, 50);
        assert_eq!(config.request_timeout_secs, None);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"batch_size": 0, "repo_base_url": "https://mirror.test"}"#)
            .unwrap();

        let config = CatalogConfig::load_from(&path);
        assert_eq!(config.repo_base_url, "https://mirror.test");
        assert_eq!(config.batch_size, 1);
        assert_eq!(config.default_source, "https://apps.altstore.io");
        assert_eq!(config.request_timeout_secs, None);
    }

    #[test]
    fn test_timeout_only_when_configured() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"request_timeout_secs": 120}"#).unwrap();
        assert_eq!(CatalogConfig::load_from(&path).request_timeout_secs, Some(120));
    }

    #[test]
    fn test_garbage_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "not json").unwrap();
        assert_eq!(CatalogConfig::load_from(&path), CatalogConfig::default());
    }
}
