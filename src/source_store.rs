use crate::config::config_dir;
use crate::error::CatalogError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, Serialize, Deserialize, Default)]
struct StoredSources {
    #[serde(default)]
    sources: Vec<String>,
}

/// Ordered list of source references persisted as JSON.
pub struct SourceStore {
    path: PathBuf,
    default_source: String,
}

impl SourceStore {
    pub fn new(default_source: &str) -> Self {
        Self::at(config_dir().join("sources.json"), default_source)
    }

    pub fn at(path: PathBuf, default_source: &str) -> Self {
        Self {
            path,
            default_source: default_source.to_string(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Saved sources, or just the default source when nothing usable is saved.
    pub fn load(&self) -> Vec<String> {
        let saved = std::fs::read_to_string(&self.path)
            .ok()
            .and_then(|raw| serde_json::from_str::<StoredSources>(&raw).ok())
            .map(|stored| {
                stored
                    .sources
                    .into_iter()
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();

        if saved.is_empty() {
            vec![self.default_source.clone()]
        } else {
            saved
        }
    }

    pub fn save(&self, sources: &[String]) -> Result<(), CatalogError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let stored = StoredSources {
            sources: sources.to_vec(),
        };
        let file = std::fs::File::create(&self.path)?;
        serde_json::to_writer_pretty(file, &stored)?;
        Ok(())
    }

    /// Appends `source` unless it is blank or already listed. Returns whether
    /// the list changed.
    pub fn add(&self, source: &str) -> Result<bool, CatalogError> {
        let source = source.trim();
        if source.is_empty() {
            return Ok(false);
        }
        let mut sources = self.load();
        if sources.iter().any(|s| s == source) {
            return Ok(false);
        }
        sources.push(source.to_string());
        self.save(&sources)?;
        Ok(true)
    }

    pub fn remove(&self, source: &str) -> Result<bool, CatalogError> {
        let source = source.trim();
        let mut sources = self.load();
        let before = sources.len();
        sources.retain(|s| s != source);
        if sources.len() == before {
            return Ok(false);
        }
        self.save(&sources)?;
        Ok(true)
    }
}
