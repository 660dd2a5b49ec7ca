//! Query-string links that reopen one app's detail view.
use crate::models::{App, Version};
use reqwest::Url;

const LINK_BASE: &str = "altsource://detail";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailLink {
    pub bundle_id: String,
    pub version: Option<String>,
    pub source: String,
}

impl DetailLink {
    /// Reads `bundleId`, `version` and `source` from a query string (leading
    /// `?` optional). Returns `None` when the bundle id or source is missing.
    pub fn parse(query: &str) -> Option<Self> {
        let url = Url::parse(&format!("{}?{}", LINK_BASE, query.trim().trim_start_matches('?'))).ok()?;

        let mut bundle_id = String::new();
        let mut version = None;
        let mut source = String::new();
        for (key, value) in url.query_pairs() {
            let value = value.trim().to_string();
            match key.as_ref() {
                "bundleId" => bundle_id = value,
                "version" if !value.is_empty() => version = Some(value),
                "source" => source = value,
                _ => {}
            }
        }

        if bundle_id.is_empty() || source.is_empty() {
            return None;
        }
        Some(Self {
            bundle_id,
            version,
            source,
        })
    }

    pub fn to_query_string(&self) -> String {
        let mut params = vec![("bundleId", self.bundle_id.as_str())];
        if let Some(version) = &self.version {
            params.push(("version", version.as_str()));
        }
        params.push(("source", self.source.as_str()));

        Url::parse_with_params(LINK_BASE, &params)
            .ok()
            .and_then(|url| url.query().map(|q| format!("?{}", q)))
            .unwrap_or_default()
    }
}

/// One app with a selected release, as shown on its detail page.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailView {
    pub app: App,
    selected: usize,
}

impl DetailView {
    /// Selects `version` when the app has it, else the newest release.
    pub fn new(app: App, version: Option<&str>) -> Self {
        let mut view = Self { app, selected: 0 };
        if let Some(v) = version {
            view.select_version(v);
        }
        view
    }

    pub fn versions(&self) -> &[Version] {
        &self.app.versions
    }

    pub fn selected_version(&self) -> Option<&Version> {
        self.app.versions.get(self.selected)
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    /// Returns false and keeps the current selection when `version` is unknown.
    pub fn select_version(&mut self, version: &str) -> bool {
        match self.app.versions.iter().position(|v| v.version == version) {
            Some(idx) => {
                self.selected = idx;
                true
            }
            None => false,
        }
    }

    pub fn link(&self) -> DetailLink {
        DetailLink {
            bundle_id: self.app.bundle_id.clone(),
            version: self.selected_version().map(|v| v.version.clone()),
            source: self.app.source.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_app() -> App {
        App {
            bundle_id: "com.example.app".to_string(),
            source: "https://example.com/repo.json".to_string(),
            versions: ["2.0", "1.0"]
                .iter()
                .map(|v| Version {
                    version: v.to_string(),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_link() {
        let link = DetailLink::parse(
            "?bundleId=com.example.app&version=1.0&source=https%3A%2F%2Fexample.com%2Frepo.json",
        )
        .unwrap();
        assert_eq!(link.bundle_id, "com.example.app");
        assert_eq!(link.version.as_deref(), Some("1.0"));
        assert_eq!(link.source, "https://example.com/repo.json");
    }

    #[test]
    fn test_parse_requires_bundle_and_source() {
        assert!(DetailLink::parse("bundleId=com.example.app").is_none());
        assert!(DetailLink::parse("source=quantum&version=1").is_none());
        let link = DetailLink::parse("bundleId=a.b&source=quantum&version=").unwrap();
        assert_eq!(link.version, None);
    }

    #[test]
    fn test_query_string_round_trip() {
        let link = DetailLink {
            bundle_id: "com.example.app".to_string(),
            version: Some("1.0 beta".to_string()),
            source: "https://example.com/repo.json".to_string(),
        };
        assert_eq!(DetailLink::parse(&link.to_query_string()), Some(link));
    }

    #[test]
    fn test_version_selection() {
        let mut view = DetailView::new(make_app(), Some("1.0"));
        assert_eq!(view.selected_index(), 1);

        assert!(!view.select_version("9.9"));
        assert_eq!(view.selected_version().unwrap().version, "1.0");

        let view = DetailView::new(make_app(), Some("missing"));
        assert_eq!(view.selected_version().unwrap().version, "2.0");
        assert_eq!(view.link().version.as_deref(), Some("2.0"));
    }
}
