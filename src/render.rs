use crate::models::{App, SearchRecord};
use crate::version_cmp::parse_release_date;
use chrono::{DateTime, Utc};

pub const UNKNOWN_DATE_LABEL: &str = "Unknown date";

/// One visual unit in the result grid: a merged app when browsing, or a
/// single version record when a query is active.
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogItem {
    App(App),
    Version(SearchRecord),
}

impl CatalogItem {
    pub fn name(&self) -> &str {
        match self {
            CatalogItem::App(app) => &app.name,
            CatalogItem::Version(record) => &record.name,
        }
    }

    pub fn bundle_id(&self) -> &str {
        match self {
            CatalogItem::App(app) => &app.bundle_id,
            CatalogItem::Version(record) => &record.bundle_id,
        }
    }

    pub fn source(&self) -> &str {
        match self {
            CatalogItem::App(app) => &app.source,
            CatalogItem::Version(record) => &record.source,
        }
    }

    pub fn version(&self) -> &str {
        match self {
            CatalogItem::App(app) => app.leading_version().map_or("", |v| v.version.as_str()),
            CatalogItem::Version(record) => &record.version,
        }
    }

    /// Raw date of the leading version (apps) or of the record itself.
    pub fn date(&self) -> &str {
        match self {
            CatalogItem::App(app) => app.leading_version().map_or("", |v| v.date.as_str()),
            CatalogItem::Version(record) => &record.date,
        }
    }

    pub fn release_date(&self) -> Option<DateTime<Utc>> {
        parse_release_date(self.date())
    }

    pub fn date_label(&self) -> String {
        self.release_date()
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| UNKNOWN_DATE_LABEL.to_string())
    }
}

/// Receives drawing directives from the catalog; consumes plain data only.
pub trait RenderSink {
    /// Clear everything drawn so far.
    fn reset(&mut self);

    fn render_item(&mut self, item: &CatalogItem);

    fn append(&mut self, items: &[CatalogItem]) {
        for item in items {
            self.render_item(item);
        }
    }
}

/// Prints one line per item to stdout.
#[derive(Debug, Default)]
pub struct ConsoleRenderer {
    pub rendered: usize,
}

impl RenderSink for ConsoleRenderer {
    fn reset(&mut self) {
        self.rendered = 0;
    }

    fn render_item(&mut self, item: &CatalogItem) {
        self.rendered += 1;
        let version = if item.version().is_empty() {
            "latest"
        } else {
            item.version()
        };
        println!(
            "{:>4}. {} ({}) {} [{}] {}",
            self.rendered,
            item.name(),
            item.bundle_id(),
            version,
            item.date_label(),
            item.source()
        );
    }
}

/// Discards every directive.
#[derive(Debug, Default)]
pub struct NullRenderer;

impl RenderSink for NullRenderer {
    fn reset(&mut self) {}

    fn render_item(&mut self, _item: &CatalogItem) {}
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderEvent {
    Reset,
    Append(Vec<CatalogItem>),
}

/// Records every directive; used to observe the catalog in tests.
#[derive(Debug, Default)]
pub struct CollectingRenderer {
    pub events: Vec<RenderEvent>,
    pub items: Vec<CatalogItem>,
}

impl CollectingRenderer {
    pub fn names(&self) -> Vec<&str> {
        self.items.iter().map(|i| i.name()).collect()
    }

    pub fn reset_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, RenderEvent::Reset))
            .count()
    }
}

impl RenderSink for CollectingRenderer {
    fn reset(&mut self) {
        self.events.push(RenderEvent::Reset);
        self.items.clear();
    }

    fn render_item(&mut self, item: &CatalogItem) {
        self.items.push(item.clone());
    }

    fn append(&mut self, items: &[CatalogItem]) {
        self.events.push(RenderEvent::Append(items.to_vec()));
        self.items.extend(items.iter().cloned());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Version;

    #[test]
    fn test_app_item_uses_leading_version() {
        let item = CatalogItem::App(App {
            name: "Delta".to_string(),
            versions: vec![
                Version {
                    version: "1.5".to_string(),
                    date: "2023-06-15".to_string(),
                    ..Default::default()
                },
                Version {
                    version: "1.4".to_string(),
                    ..Default::default()
                },
            ],
            ..Default::default()
        });
        assert_eq!(item.version(), "1.5");
        assert_eq!(item.date_label(), "2023-06-15");
    }

    #[test]
    fn test_missing_date_gets_fallback_label() {
        let item = CatalogItem::Version(SearchRecord::default());
        assert!(item.release_date().is_none());
        assert_eq!(item.date_label(), UNKNOWN_DATE_LABEL);
    }

    #[test]
    fn test_collecting_renderer_tracks_directives() {
        let mut sink = CollectingRenderer::default();
        let item = CatalogItem::Version(SearchRecord {
            name: "X".to_string(),
            ..Default::default()
        });
        sink.append(&[item.clone()]);
        sink.reset();
        sink.append(&[item]);
        assert_eq!(sink.names(), vec!["X"]);
        assert_eq!(sink.reset_count(), 1);
        assert_eq!(sink.events.len(), 3);
    }
}
