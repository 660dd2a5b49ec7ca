use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct Version {
    pub version: String,
    pub date: String,
    pub download_url: String,
    pub notes: String,
    pub size: Option<u64>,
    /// Source URL that reported this release
    pub source: String,
}

impl Version {
    /// Releases without a version string are shown as the latest build.
    pub fn display_version(&self) -> &str {
        if self.version.trim().is_empty() {
            "latest"
        } else {
            &self.version
        }
    }

    pub fn display_size(&self) -> Option<String> {
        let bytes = self.size?;
        const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
        if bytes < 1024 {
            return Some(format!("{} B", bytes));
        }
        let mut value = bytes as f64;
        let mut unit = 0;
        while value >= 1024.0 && unit < UNITS.len() - 1 {
            value /= 1024.0;
            unit += 1;
        }
        Some(format!("{:.1} {}", value, UNITS[unit]))
    }

    /// Duplicate check within one app: same version string and same download URL.
    pub fn dedup_key(&self) -> (&str, &str) {
        (self.version.as_str(), self.download_url.as_str())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct App {
    pub bundle_id: String,
    pub name: String,
    pub developer: String,
    pub icon_url: String,
    pub description: String,
    /// Originating source URL (first contributor after a merge)
    pub source: String,
    /// Every source URL that contributed to this entry, in encounter order
    pub sources: Vec<String>,
    pub versions: Vec<Version>,
}

impl App {
    pub fn leading_version(&self) -> Option<&Version> {
        self.versions.first()
    }

    pub fn has_bundle_id(&self) -> bool {
        !self.bundle_id.trim().is_empty()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordKind {
    #[default]
    #[serde(rename = "version")]
    Version,
}

/// One (app, version) pair flattened for searching. Apps without versions
/// get a single record with empty version fields.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct SearchRecord {
    #[serde(rename = "type")]
    pub kind: RecordKind,
    pub bundle_id: String,
    pub name: String,
    pub developer: String,
    pub icon_url: String,
    pub description: String,
    pub source: String,
    pub version: String,
    pub date: String,
    pub download_url: String,
    pub notes: String,
    pub size: Option<u64>,
}

impl SearchRecord {
    pub fn from_app(app: &App) -> Vec<SearchRecord> {
        let base = SearchRecord {
            kind: RecordKind::Version,
            bundle_id: app.bundle_id.clone(),
            name: app.name.clone(),
            developer: app.developer.clone(),
            icon_url: app.icon_url.clone(),
            description: app.description.clone(),
            source: app.source.clone(),
            ..Default::default()
        };

        if app.versions.is_empty() {
            return vec![base];
        }

        app.versions
            .iter()
            .map(|v| SearchRecord {
                version: v.version.clone(),
                date: v.date.clone(),
                download_url: v.download_url.clone(),
                notes: v.notes.clone(),
                size: v.size,
                ..base.clone()
            })
            .collect()
    }

    pub fn flatten(apps: &[App]) -> Vec<SearchRecord> {
        apps.iter().flat_map(SearchRecord::from_app).collect()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortMode {
    #[default]
    #[serde(rename = "name-asc")]
    NameAsc,
    #[serde(rename = "name-desc")]
    NameDesc,
    #[serde(rename = "version-desc")]
    VersionDesc,
    #[serde(rename = "version-asc")]
    VersionAsc,
}

impl SortMode {
    /// Unknown names fall back to the default mode.
    pub fn from_name(name: &str) -> Self {
        match name.trim() {
            "name-desc" => SortMode::NameDesc,
            "version-desc" => SortMode::VersionDesc,
            "version-asc" => SortMode::VersionAsc,
            _ => SortMode::NameAsc,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortMode::NameAsc => "name-asc",
            SortMode::NameDesc => "name-desc",
            SortMode::VersionDesc => "version-desc",
            SortMode::VersionAsc => "version-asc",
        }
    }

    pub fn is_version_based(&self) -> bool {
        matches!(self, SortMode::VersionDesc | SortMode::VersionAsc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_app(versions: Vec<Version>) -> App {
        App {
            bundle_id: "com.example.app".to_string(),
            name: "Example".to_string(),
            source: "https://example.com/repo.json".to_string(),
            versions,
            ..Default::default()
        }
    }

    #[test]
    fn test_flatten_one_record_per_version() {
        let app = make_app(vec![
            Version {
                version: "2.0".to_string(),
                notes: "Dark mode".to_string(),
                ..Default::default()
            },
            Version {
                version: "1.0".to_string(),
                ..Default::default()
            },
        ]);

        let records = SearchRecord::from_app(&app);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].version, "2.0");
        assert_eq!(records[0].notes, "Dark mode");
        assert_eq!(records[1].name, "Example");
        assert!(records.iter().all(|r| r.kind == RecordKind::Version));
    }

    #[test]
    fn test_flatten_app_without_versions() {
        let records = SearchRecord::from_app(&make_app(vec![]));
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].bundle_id, "com.example.app");
        assert!(records[0].version.is_empty());
    }

    #[test]
    fn test_record_serializes_type_tag() {
        let records = SearchRecord::from_app(&make_app(vec![]));
        let json = serde_json::to_value(&records[0]).unwrap();
        assert_eq!(json["type"], "version");
    }

    #[test]
    fn test_display_helpers() {
        let v = Version {
            size: Some(5 * 1024 * 1024 + 512 * 1024),
            ..Default::default()
        };
        assert_eq!(v.display_version(), "latest");
        assert_eq!(v.display_size().as_deref(), Some("5.5 MB"));
        assert_eq!(Version::default().display_size(), None);
    }

    #[test]
    fn test_sort_mode_names() {
        assert_eq!(SortMode::from_name("version-desc"), SortMode::VersionDesc);
        assert_eq!(SortMode::from_name("bogus"), SortMode::NameAsc);
        assert_eq!(SortMode::VersionAsc.as_str(), "version-asc");
        assert!(SortMode::VersionAsc.is_version_based());
        assert!(!SortMode::NameDesc.is_version_based());
    }
}
